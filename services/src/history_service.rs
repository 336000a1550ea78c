// services/src/history_service.rs

use std::collections::HashSet;
use std::sync::Arc;

use log::info;

use models::errors::{ClinicError, ClinicResult};
use models::history::{HistoryUpdate, MedicalHistory};
use models::pagination::{Page, Paginator};
use models::users::{Role, User};
use models::UserKey;
use storage::config::PaginationConfig;
use storage::ClinicStorageEngine;

/// Medical-history browsing and editing. Listings and edits are a doctor
/// concern; a patient may only read their own record.
#[derive(Clone)]
pub struct HistoryService {
    storage: Arc<dyn ClinicStorageEngine>,
    pagination: PaginationConfig,
}

impl HistoryService {
    pub fn new(storage: Arc<dyn ClinicStorageEngine>, pagination: PaginationConfig) -> Self {
        HistoryService { storage, pagination }
    }

    /// Histories of active patients outside the medical-staff area, sorted
    /// ascending by id. The search term matches as an uppercase substring
    /// of the history id.
    pub async fn list_histories(
        &self,
        caller: &User,
        search: Option<&str>,
        page: Option<&str>,
    ) -> ClinicResult<Page<MedicalHistory>> {
        if caller.role != Role::Doctor {
            return Err(ClinicError::PermissionDenied(
                "Only doctors can browse medical histories".to_string(),
            ));
        }
        let qualifying: HashSet<String> = self
            .storage
            .get_all_users()
            .await?
            .into_iter()
            .filter(|u| u.role == Role::Patient && u.is_active && !u.area.is_medical())
            .map(|u| MedicalHistory::id_for(&u.key))
            .collect();

        let mut histories: Vec<MedicalHistory> = self
            .storage
            .get_all_histories()
            .await?
            .into_iter()
            .filter(|h| qualifying.contains(&h.id))
            .collect();

        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let needle = term.to_uppercase();
            histories.retain(|h| h.id.contains(&needle));
        }
        histories.sort_by(|a, b| a.id.cmp(&b.id));

        let paginator = Paginator::new(self.pagination.histories_per_page);
        Ok(paginator.page(histories, page))
    }

    /// A single history, readable by any doctor or by the patient it
    /// belongs to. The pregnancy flag reads as false for non-female
    /// patients.
    pub async fn view_history(
        &self,
        caller: &User,
        patient_key: &UserKey,
    ) -> ClinicResult<MedicalHistory> {
        if caller.role != Role::Doctor && caller.key != *patient_key {
            return Err(ClinicError::PermissionDenied(
                "Only doctors or the patient may read this history".to_string(),
            ));
        }
        let id = MedicalHistory::id_for(patient_key);
        let mut history = self
            .storage
            .get_history(&id)
            .await?
            .ok_or_else(|| ClinicError::NotFound(format!("Medical history {}", id)))?;
        let patient = self.storage.get_user(patient_key).await?;
        history.pregnant = history.effective_pregnant(patient.and_then(|p| p.sex));
        Ok(history)
    }

    /// Applies a partial edit. The update only lands when every field
    /// passes, so a history is never left half-written.
    pub async fn edit_history(
        &self,
        caller: &User,
        patient_key: &UserKey,
        update: HistoryUpdate,
    ) -> ClinicResult<MedicalHistory> {
        if caller.role != Role::Doctor {
            return Err(ClinicError::PermissionDenied(
                "Only doctors can edit medical histories".to_string(),
            ));
        }
        let patient = self
            .storage
            .get_user(patient_key)
            .await?
            .ok_or_else(|| ClinicError::NotFound(format!("User {}", patient_key)))?;
        let id = MedicalHistory::id_for(patient_key);
        let mut history = self
            .storage
            .get_history(&id)
            .await?
            .ok_or_else(|| ClinicError::NotFound(format!("Medical history {}", id)))?;

        history.apply_update(&update, patient.sex)?;
        self.storage.upsert_history(history.clone()).await?;
        info!("Doctor {} edited medical history {}", caller.key, id);
        Ok(history)
    }
}
