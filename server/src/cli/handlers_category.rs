// server/src/cli/handlers_category.rs

use std::fmt::Write as FmtWrite;

use models::errors::{ClinicError, ClinicResult};
use models::users::Role;

use crate::cli::cli::CliContext;
use crate::cli::commands::CategoryCommand;

pub async fn handle_category_command(
    context: &CliContext,
    caller: Option<&str>,
    action: CategoryCommand,
) -> ClinicResult<String> {
    match action {
        CategoryCommand::List => {
            let mut categories = context.storage.get_all_categories().await?;
            categories.sort_by_key(|c| c.id);
            let mut out = format!("{} complaint categories", categories.len());
            for category in categories {
                let _ = write!(out, "\n{}: {}", category.id, category.name);
            }
            Ok(out)
        }
        CategoryCommand::Remove { id } => {
            let admin = context.resolve_caller(caller).await?;
            if admin.role != Role::Administrator {
                return Err(ClinicError::PermissionDenied(
                    "Only administrators can remove complaint categories".to_string(),
                ));
            }
            context.storage.delete_category(id).await?;
            Ok(format!("Removed complaint category {}", id))
        }
    }
}
