// server/src/cli/handlers_user.rs

use std::fmt::Write as FmtWrite;
use std::fs::File;

use models::errors::{ClinicError, ClinicResult};
use models::users::{NewUser, User};
use services::ImportSummary;

use crate::cli::cli::CliContext;
use crate::cli::commands::UserCommand;

pub async fn handle_user_command(
    context: &CliContext,
    caller: Option<&str>,
    action: UserCommand,
) -> ClinicResult<String> {
    match action {
        UserCommand::Create {
            key,
            email,
            first_names,
            paternal_surname,
            maternal_surname,
            birth_date,
            sex,
            role,
            area,
            staff,
            password,
        } => {
            let user = context
                .identity
                .create_user(NewUser {
                    key,
                    email,
                    first_names,
                    paternal_surname,
                    maternal_surname,
                    birth_date,
                    sex,
                    role,
                    area,
                    is_staff: staff,
                    password,
                })
                .await?;
            let with_history = context.identity.ensure_history_for(&user).await?;
            if with_history {
                Ok(format!(
                    "Created user {} ({}) with a new medical history",
                    user.key, user.role
                ))
            } else {
                Ok(format!("Created user {} ({})", user.key, user.role))
            }
        }
        UserCommand::Authenticate { login, password } => {
            match context.identity.authenticate(&login, &password).await? {
                Some(user) => Ok(format!("Authenticated {} ({})", user.key, user.role)),
                None => Ok("Authentication failed".to_string()),
            }
        }
        UserCommand::ChangePassword {
            current,
            new,
            confirm,
        } => {
            let user = context.resolve_caller(caller).await?;
            context
                .identity
                .change_password(&user.key, &current, &new, &confirm)
                .await?;
            Ok(format!("Password changed for {}", user.key))
        }
        UserCommand::Import { file } => {
            let reader = File::open(&file)?;
            let summary = context.imports.import_users(reader).await?;
            Ok(format_import_summary(&summary))
        }
        UserCommand::BackfillHistories => {
            let created = context.identity.backfill_histories().await?;
            Ok(format!("Created {} missing medical histories", created))
        }
        UserCommand::View { key } => {
            let user = context
                .identity
                .find_user(&key)
                .await?
                .ok_or_else(|| ClinicError::NotFound(format!("User {}", key)))?;
            Ok(format_user(&user))
        }
    }
}

fn format_user(user: &User) -> String {
    let mut out = format!("{} <{}>\n", user.key, user.email);
    let surnames = match &user.maternal_surname {
        Some(maternal) => format!("{} {}", user.paternal_surname, maternal),
        None => user.paternal_surname.clone(),
    };
    let _ = writeln!(out, "  Name: {} {}", user.first_names, surnames);
    let _ = writeln!(out, "  Role: {}  Area: {}", user.role, user.area);
    if let Some(birth) = &user.birth_date {
        let _ = writeln!(out, "  Born: {}", birth);
    }
    if let Some(sex) = &user.sex {
        let _ = writeln!(out, "  Sex: {}", sex);
    }
    let _ = write!(
        out,
        "  Active: {}  Staff: {}",
        yes_no(user.is_active),
        yes_no(user.is_staff)
    );
    out
}

fn format_import_summary(summary: &ImportSummary) -> String {
    let mut out = format!(
        "Imported users: {} created, {} updated, {} failed",
        summary.created, summary.updated, summary.failed
    );
    for error in &summary.errors {
        let _ = write!(out, "\nFila {}: {}", error.row, error.message);
    }
    if summary.failed > summary.errors.len() {
        let _ = write!(
            out,
            "\n({} further rows failed; raise import.max_errors to see them)",
            summary.failed - summary.errors.len()
        );
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
