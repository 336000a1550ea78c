use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode};

use crate::errors::{ValidationError, ValidationReport};
use crate::identifiers::UserKey;
use crate::timestamp::BincodeDateTime;
use crate::vitals::{VitalSigns, VitalSignsInput};

/// Upper bound for the two treatment text fields.
pub const TREATMENT_TEXT_LIMIT: usize = 300;

/// Complaint classification. Categories are ordinary records: they can be
/// removed, and consultations that referenced a removed one simply read as
/// uncategorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ComplaintCategory {
    #[serde(rename = "id_padecimiento")]
    pub id: u64,
    #[serde(rename = "padecimiento")]
    pub name: String,
}

impl ComplaintCategory {
    /// Initial catalog written at storage bootstrap.
    pub fn default_catalog() -> Vec<ComplaintCategory> {
        [
            "Respiratorio",
            "Gastrointestinal",
            "Cardiovascular",
            "Dermatológico",
            "Musculoesquelético",
            "Neurológico",
            "Odontológico",
            "Psicológico",
            "Otro",
        ]
        .iter()
        .enumerate()
        .map(|(index, name)| ComplaintCategory {
            id: index as u64 + 1,
            name: name.to_string(),
        })
        .collect()
    }
}

impl fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One clinical encounter. The paired [`VitalSigns`] record is created in
/// the same write, so a consultation is never observable without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Consultation {
    #[serde(rename = "id_consulta")]
    pub id: u64,
    #[serde(rename = "fecha")]
    pub created_at: BincodeDateTime,
    #[serde(rename = "padecimiento_actual")]
    pub complaint: String,
    #[serde(rename = "tratamiento_no_farmacologico")]
    pub non_drug_treatment: Option<String>,
    #[serde(rename = "tratamiento_farmacologico_recetado")]
    pub prescribed_treatment: Option<String>,
    #[serde(rename = "categoria_de_padecimiento")]
    pub category_id: Option<u64>,
    #[serde(rename = "clave_paciente")]
    pub patient_key: UserKey,
    #[serde(rename = "clave_medico")]
    pub doctor_key: UserKey,
}

/// Raw consultation input as captured from the intake form.
#[derive(Debug, Clone, Default)]
pub struct NewConsultation {
    /// Either a bare patient key or the "KEY - NAME" string a picker returns.
    pub patient_display: String,
    pub complaint: String,
    pub non_drug_treatment: Option<String>,
    pub prescribed_treatment: Option<String>,
    pub category_id: Option<u64>,
    pub vitals: VitalSignsInput,
}

impl NewConsultation {
    /// Checks the text fields; vitals are validated separately so both
    /// reports can be merged into one.
    pub fn validate_texts(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.complaint.trim().is_empty() {
            report.push(
                "padecimiento_actual",
                ValidationError::MissingField("padecimiento_actual".to_string()),
            );
        }
        check_treatment("tratamiento_no_farmacologico", &self.non_drug_treatment, &mut report);
        check_treatment(
            "tratamiento_farmacologico_recetado",
            &self.prescribed_treatment,
            &mut report,
        );
        report
    }
}

fn check_treatment(field: &str, value: &Option<String>, report: &mut ValidationReport) {
    if let Some(text) = value {
        if text.trim().chars().count() > TREATMENT_TEXT_LIMIT {
            report.push(field, ValidationError::TooLong(field.to_string(), TREATMENT_TEXT_LIMIT));
        }
    }
}

/// Extracts the patient key from a picker display string, which holds the
/// key before the first dash.
pub fn patient_key_from_display(display: &str) -> &str {
    match display.split_once('-') {
        Some((key, _)) => key.trim(),
        None => display.trim(),
    }
}

/// Filters for consultation listings. Dates are whole days; `to` is
/// inclusive of the named day.
#[derive(Debug, Clone, Default)]
pub struct ConsultationFilter {
    pub patient_contains: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Doctors may widen their listing from "own consultations" to all.
    pub show_all: bool,
    /// Raw page parameter, forgiving of junk input.
    pub page: Option<String>,
}

/// A consultation joined with everything a listing shows: resolved names,
/// category label and the paired vitals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultationView {
    pub id: u64,
    pub created_at: BincodeDateTime,
    pub patient: String,
    pub doctor: String,
    pub category: Option<String>,
    pub complaint: String,
    pub non_drug_treatment: Option<String>,
    pub prescribed_treatment: Option<String>,
    pub vitals: Option<VitalSigns>,
}
