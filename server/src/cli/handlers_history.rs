// server/src/cli/handlers_history.rs

use std::fmt::Write as FmtWrite;

use models::errors::ClinicResult;
use models::history::{HistoryUpdate, MedicalHistory};
use models::pagination::Page;
use models::UserKey;

use crate::cli::cli::CliContext;
use crate::cli::commands::HistoryCommand;

pub async fn handle_history_command(
    context: &CliContext,
    caller: Option<&str>,
    action: HistoryCommand,
) -> ClinicResult<String> {
    match action {
        HistoryCommand::List { search, page } => {
            let viewer = context.resolve_caller(caller).await?;
            let listing = context
                .histories
                .list_histories(&viewer, search.as_deref(), page.as_deref())
                .await?;
            Ok(format_listing(&listing))
        }
        HistoryCommand::View { patient } => {
            let viewer = context.resolve_caller(caller).await?;
            let key = UserKey::new(&patient)?;
            let history = context.histories.view_history(&viewer, &key).await?;
            Ok(format_history(&history))
        }
        HistoryCommand::Edit {
            patient,
            chronic_conditions,
            allergies,
            current_medication,
            pregnant,
            uses_drugs,
            smokes,
            drinks_alcohol,
            wears_glasses,
            sexually_active,
            uses_contraceptives,
        } => {
            let editor = context.resolve_caller(caller).await?;
            let key = UserKey::new(&patient)?;
            let history = context
                .histories
                .edit_history(
                    &editor,
                    &key,
                    HistoryUpdate {
                        chronic_conditions,
                        allergies,
                        current_medication,
                        pregnant,
                        uses_drugs,
                        smokes,
                        drinks_alcohol,
                        wears_glasses,
                        sexually_active,
                        uses_contraceptives,
                    },
                )
                .await?;
            Ok(format!("Updated medical history {}", history.id))
        }
    }
}

fn format_listing(listing: &Page<MedicalHistory>) -> String {
    if listing.total_items == 0 {
        return "No medical histories found".to_string();
    }
    let mut out = format!(
        "Page {} of {} ({} histories)",
        listing.number, listing.total_pages, listing.total_items
    );
    for history in &listing.items {
        let _ = write!(out, "\nHistorial {}", history.id);
    }
    out
}

fn format_history(history: &MedicalHistory) -> String {
    let mut out = format!("Historial {}\n", history.id);
    let _ = writeln!(
        out,
        "  Enfermedades cronicas: {}",
        text_or_dash(&history.chronic_conditions)
    );
    let _ = writeln!(out, "  Alergias: {}", text_or_dash(&history.allergies));
    let _ = writeln!(
        out,
        "  Medicamento usado: {}",
        text_or_dash(&history.current_medication)
    );
    let _ = writeln!(out, "  Embarazada: {}", si_no(history.pregnant));
    let _ = writeln!(out, "  Usa drogas: {}", si_no(history.uses_drugs));
    let _ = writeln!(out, "  Usa cigarro: {}", si_no(history.smokes));
    let _ = writeln!(out, "  Ingiere alcohol: {}", si_no(history.drinks_alcohol));
    let _ = writeln!(out, "  Usa lentes: {}", si_no(history.wears_glasses));
    let _ = writeln!(
        out,
        "  Vida sexual activa: {}",
        si_no(history.sexually_active)
    );
    let _ = write!(
        out,
        "  Usa metodos anticonceptivos: {}",
        si_no(history.uses_contraceptives)
    );
    out
}

fn text_or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn si_no(value: bool) -> &'static str {
    if value {
        "Si"
    } else {
        "No"
    }
}
