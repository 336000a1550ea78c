use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode};

use crate::errors::{ValidationError, ValidationReport};
use crate::identifiers::UserKey;
use crate::users::Sex;

/// Upper bound for the free-text clinical fields.
pub const HISTORY_TEXT_LIMIT: usize = 150;

/// One medical history per patient, created empty when the patient account
/// appears and kept for the life of the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct MedicalHistory {
    #[serde(rename = "id_historial")]
    pub id: String,
    #[serde(rename = "paciente")]
    pub patient_key: UserKey,
    #[serde(rename = "enfermedades_cronicas")]
    pub chronic_conditions: Option<String>,
    #[serde(rename = "alergias")]
    pub allergies: Option<String>,
    #[serde(rename = "medicamento_usado")]
    pub current_medication: Option<String>,
    #[serde(rename = "es_embarazada")]
    pub pregnant: bool,
    #[serde(rename = "usa_drogas")]
    pub uses_drugs: bool,
    #[serde(rename = "usa_cigarro")]
    pub smokes: bool,
    #[serde(rename = "ingiere_alcohol")]
    pub drinks_alcohol: bool,
    #[serde(rename = "usa_lentes")]
    pub wears_glasses: bool,
    #[serde(rename = "vida_sexual_activa")]
    pub sexually_active: bool,
    #[serde(rename = "usa_metodos_anticonceptivos")]
    pub uses_contraceptives: bool,
}

/// Partial edit of a history. `None` leaves a field untouched; a blank
/// string clears a text field.
#[derive(Debug, Clone, Default)]
pub struct HistoryUpdate {
    pub chronic_conditions: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub pregnant: Option<bool>,
    pub uses_drugs: Option<bool>,
    pub smokes: Option<bool>,
    pub drinks_alcohol: Option<bool>,
    pub wears_glasses: Option<bool>,
    pub sexually_active: Option<bool>,
    pub uses_contraceptives: Option<bool>,
}

impl MedicalHistory {
    /// History ids are the uppercased patient key.
    pub fn id_for(key: &UserKey) -> String {
        key.as_str().to_uppercase()
    }

    pub fn empty_for(key: &UserKey) -> Self {
        MedicalHistory {
            id: Self::id_for(key),
            patient_key: key.clone(),
            chronic_conditions: None,
            allergies: None,
            current_medication: None,
            pregnant: false,
            uses_drugs: false,
            smokes: false,
            drinks_alcohol: false,
            wears_glasses: false,
            sexually_active: false,
            uses_contraceptives: false,
        }
    }

    /// Pregnancy as it should be shown: the stored flag only counts for
    /// female patients.
    pub fn effective_pregnant(&self, sex: Option<Sex>) -> bool {
        self.pregnant && sex == Some(Sex::Female)
    }

    /// Validates an edit and applies it atomically; either every field is
    /// written or none is.
    pub fn apply_update(
        &mut self,
        update: &HistoryUpdate,
        patient_sex: Option<Sex>,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::new();

        let chronic =
            normalized_text("enfermedades_cronicas", &update.chronic_conditions, &mut report);
        let allergies = normalized_text("alergias", &update.allergies, &mut report);
        let medication =
            normalized_text("medicamento_usado", &update.current_medication, &mut report);

        if update.pregnant == Some(true) && patient_sex != Some(Sex::Female) {
            report.push("es_embarazada", ValidationError::PregnancyNotApplicable);
        }

        if !report.is_empty() {
            return Err(report);
        }

        if let Some(value) = chronic {
            self.chronic_conditions = value;
        }
        if let Some(value) = allergies {
            self.allergies = value;
        }
        if let Some(value) = medication {
            self.current_medication = value;
        }
        if let Some(value) = update.pregnant {
            self.pregnant = value;
        }
        if let Some(value) = update.uses_drugs {
            self.uses_drugs = value;
        }
        if let Some(value) = update.smokes {
            self.smokes = value;
        }
        if let Some(value) = update.drinks_alcohol {
            self.drinks_alcohol = value;
        }
        if let Some(value) = update.wears_glasses {
            self.wears_glasses = value;
        }
        if let Some(value) = update.sexually_active {
            self.sexually_active = value;
        }
        if let Some(value) = update.uses_contraceptives {
            self.uses_contraceptives = value;
        }
        Ok(())
    }
}

// Outer None means "leave unchanged", inner None means "clear".
fn normalized_text(
    field: &str,
    value: &Option<String>,
    report: &mut ValidationReport,
) -> Option<Option<String>> {
    let raw = value.as_ref()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    if trimmed.chars().count() > HISTORY_TEXT_LIMIT {
        report.push(field, ValidationError::TooLong(field.to_string(), HISTORY_TEXT_LIMIT));
        return None;
    }
    Some(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> MedicalHistory {
        MedicalHistory::empty_for(&UserKey::new("ISC221733").unwrap())
    }

    #[test]
    fn should_derive_id_from_uppercased_key() {
        let admin = UserKey::new("admin1").unwrap();
        assert_eq!(MedicalHistory::id_for(&admin), "ADMIN1");
        assert_eq!(history().id, "ISC221733");
    }

    #[test]
    fn should_reject_text_over_limit() {
        let mut h = history();
        let update = HistoryUpdate {
            allergies: Some("a".repeat(151)),
            ..HistoryUpdate::default()
        };
        let report = h.apply_update(&update, Some(Sex::Female)).unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(h.allergies, None);
    }

    #[test]
    fn should_trim_and_clear_blank_text() {
        let mut h = history();
        let set = HistoryUpdate {
            allergies: Some("  penicilina  ".to_string()),
            ..HistoryUpdate::default()
        };
        h.apply_update(&set, Some(Sex::Female)).unwrap();
        assert_eq!(h.allergies.as_deref(), Some("penicilina"));

        let clear = HistoryUpdate {
            allergies: Some("   ".to_string()),
            ..HistoryUpdate::default()
        };
        h.apply_update(&clear, Some(Sex::Female)).unwrap();
        assert_eq!(h.allergies, None);
    }

    #[test]
    fn should_block_pregnancy_for_non_female_patients() {
        let mut h = history();
        let update = HistoryUpdate { pregnant: Some(true), ..HistoryUpdate::default() };
        assert!(h.apply_update(&update, Some(Sex::Male)).is_err());
        assert!(h.apply_update(&update, None).is_err());
        assert!(!h.pregnant);

        assert!(h.apply_update(&update, Some(Sex::Female)).is_ok());
        assert!(h.pregnant);
    }

    #[test]
    fn should_always_allow_clearing_pregnancy() {
        let mut h = history();
        h.pregnant = true;
        let update = HistoryUpdate { pregnant: Some(false), ..HistoryUpdate::default() };
        assert!(h.apply_update(&update, Some(Sex::Male)).is_ok());
        assert!(!h.pregnant);
    }

    #[test]
    fn should_read_pregnancy_through_sex_gate() {
        let mut h = history();
        h.pregnant = true;
        assert!(h.effective_pregnant(Some(Sex::Female)));
        assert!(!h.effective_pregnant(Some(Sex::Male)));
        assert!(!h.effective_pregnant(None));
    }

    #[test]
    fn should_leave_untouched_fields_alone() {
        let mut h = history();
        h.smokes = true;
        let update = HistoryUpdate {
            uses_drugs: Some(true),
            ..HistoryUpdate::default()
        };
        h.apply_update(&update, Some(Sex::Male)).unwrap();
        assert!(h.smokes);
        assert!(h.uses_drugs);
    }
}
