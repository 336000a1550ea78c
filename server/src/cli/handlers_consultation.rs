// server/src/cli/handlers_consultation.rs

use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

use models::consultations::{ConsultationFilter, ConsultationView, NewConsultation};
use models::errors::{ClinicError, ClinicResult, ValidationError};
use models::pagination::Page;
use models::vitals::VitalSignsInput;
use services::export_file_name;

use crate::cli::cli::CliContext;
use crate::cli::commands::ConsultCommand;

pub async fn handle_consult_command(
    context: &CliContext,
    caller: Option<&str>,
    action: ConsultCommand,
) -> ClinicResult<String> {
    match action {
        ConsultCommand::Create {
            patient,
            complaint,
            non_drug_treatment,
            prescribed_treatment,
            category,
            weight,
            height,
            temperature,
            heart_rate,
            respiratory_rate,
            blood_pressure,
        } => {
            let doctor = context.resolve_caller(caller).await?;
            let consultation = context
                .consultations
                .create_consultation(
                    &doctor,
                    NewConsultation {
                        patient_display: patient,
                        complaint,
                        non_drug_treatment,
                        prescribed_treatment,
                        category_id: category,
                        vitals: VitalSignsInput {
                            weight,
                            height,
                            temperature,
                            heart_rate,
                            respiratory_rate,
                            blood_pressure,
                        },
                    },
                )
                .await?;
            let vitals = context
                .storage
                .get_vitals_for_consultation(consultation.id)
                .await?;
            let mut out = format!(
                "Recorded consultation {} for patient {}",
                consultation.id, consultation.patient_key
            );
            if let Some(bmi) = vitals.and_then(|v| v.bmi) {
                let _ = write!(out, " (IMC {:.2})", bmi);
            }
            Ok(out)
        }
        ConsultCommand::List {
            patient_contains,
            from,
            to,
            show_all,
            page,
        } => {
            let viewer = context.resolve_caller(caller).await?;
            let filter = ConsultationFilter {
                patient_contains,
                from: parse_filter_date(from.as_deref())?,
                to: parse_filter_date(to.as_deref())?,
                show_all,
                page,
            };
            let listing = context.consultations.list_consultations(&viewer, filter).await?;
            Ok(format_listing(&listing))
        }
        ConsultCommand::FindPatient { key } => {
            let doctor = context.resolve_caller(caller).await?;
            match context.consultations.find_patient(&doctor, &key).await? {
                Some(probe) => Ok(format!("{} - {}", probe.key, probe.first_names)),
                None => Ok(format!("No active patient with key {}", key)),
            }
        }
        ConsultCommand::Export { output } => {
            let doctor = context.resolve_caller(caller).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now())));
            let file = File::create(&path)?;
            let count = context.consultations.export_csv(&doctor, file).await?;
            Ok(format!(
                "Exported {} consultations to {}",
                count,
                path.display()
            ))
        }
    }
}

fn parse_filter_date(raw: Option<&str>) -> ClinicResult<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y")
            .map(Some)
            .map_err(|_| {
                ClinicError::from(ValidationError::InvalidDateFormat(text.to_string()))
            }),
    }
}

fn format_listing(listing: &Page<ConsultationView>) -> String {
    if listing.total_items == 0 {
        return "No consultations found".to_string();
    }
    let mut out = format!(
        "Page {} of {} ({} consultations)",
        listing.number, listing.total_pages, listing.total_items
    );
    for view in &listing.items {
        let _ = write!(
            out,
            "\n#{} {} | {} | {}",
            view.id, view.created_at, view.patient, view.doctor
        );
        if let Some(category) = &view.category {
            let _ = write!(out, " | {}", category);
        }
        let _ = write!(out, "\n    {}", view.complaint);
        if let Some(bmi) = view.vitals.as_ref().and_then(|v| v.bmi) {
            let _ = write!(out, "\n    IMC: {:.2}", bmi);
        }
    }
    out
}
