// storage/src/storage_engine/inmemory_storage.rs

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex as TokioMutex;

use models::errors::{ClinicError, ClinicResult};
use models::{
    Area, ComplaintCategory, Consultation, MedicalHistory, Publication, User, UserKey, VitalSigns,
};

use crate::config::StorageEngineType;
use crate::storage_engine::storage_engine::ClinicStorageEngine;

/// Volatile engine used by tests and one-off runs. Every record family lives
/// in its own map behind a tokio mutex.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    users: TokioMutex<HashMap<String, User>>,
    areas: TokioMutex<HashMap<String, Area>>,
    histories: TokioMutex<HashMap<String, MedicalHistory>>,
    categories: TokioMutex<HashMap<u64, ComplaintCategory>>,
    consultations: TokioMutex<HashMap<u64, (Consultation, VitalSigns)>>,
    publications: TokioMutex<HashMap<u64, Publication>>,
    next_consultation_id: TokioMutex<u64>,
    next_publication_id: TokioMutex<u64>,
    seeded: TokioMutex<bool>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

#[async_trait]
impl ClinicStorageEngine for InMemoryStorage {
    fn engine_type(&self) -> StorageEngineType {
        StorageEngineType::InMemory
    }

    async fn bootstrap(&self) -> ClinicResult<()> {
        let mut seeded = self.seeded.lock().await;
        if *seeded {
            return Ok(());
        }
        let mut areas = self.areas.lock().await;
        for area in Area::default_catalog() {
            areas.entry(area.name.clone()).or_insert(area);
        }
        let mut categories = self.categories.lock().await;
        for category in ComplaintCategory::default_catalog() {
            categories.entry(category.id).or_insert(category);
        }
        *seeded = true;
        debug!("Seeded in-memory area and category catalogs");
        Ok(())
    }

    async fn flush(&self) -> ClinicResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: User) -> ClinicResult<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(user.key.as_str()) {
            return Err(ClinicError::AlreadyExists(format!(
                "User with key {} already exists",
                user.key
            )));
        }
        users.insert(user.key.as_str().to_string(), user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> ClinicResult<()> {
        let mut users = self.users.lock().await;
        if !users.contains_key(user.key.as_str()) {
            return Err(ClinicError::NotFound(format!("User {}", user.key)));
        }
        users.insert(user.key.as_str().to_string(), user);
        Ok(())
    }

    async fn get_user(&self, key: &UserKey) -> ClinicResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.get(key.as_str()).cloned())
    }

    async fn find_user_by_key_ci(&self, raw_key: &str) -> ClinicResult<Option<User>> {
        let needle = raw_key.trim();
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.key.as_str().eq_ignore_ascii_case(needle))
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ClinicResult<Option<User>> {
        let needle = email.trim();
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(needle))
            .cloned())
    }

    async fn get_all_users(&self) -> ClinicResult<Vec<User>> {
        let users = self.users.lock().await;
        Ok(users.values().cloned().collect())
    }

    async fn create_users(&self, new_users: Vec<User>) -> ClinicResult<()> {
        let mut users = self.users.lock().await;
        for user in &new_users {
            if users.contains_key(user.key.as_str()) {
                return Err(ClinicError::AlreadyExists(format!(
                    "User with key {} already exists",
                    user.key
                )));
            }
        }
        for user in new_users {
            users.insert(user.key.as_str().to_string(), user);
        }
        Ok(())
    }

    async fn update_users(&self, changed_users: Vec<User>) -> ClinicResult<()> {
        let mut users = self.users.lock().await;
        for user in &changed_users {
            if !users.contains_key(user.key.as_str()) {
                return Err(ClinicError::NotFound(format!("User {}", user.key)));
            }
        }
        for user in changed_users {
            users.insert(user.key.as_str().to_string(), user);
        }
        Ok(())
    }

    async fn get_area(&self, name: &str) -> ClinicResult<Option<Area>> {
        let areas = self.areas.lock().await;
        Ok(areas.get(name).cloned())
    }

    async fn get_all_areas(&self) -> ClinicResult<Vec<Area>> {
        let areas = self.areas.lock().await;
        Ok(areas.values().cloned().collect())
    }

    async fn upsert_history(&self, history: MedicalHistory) -> ClinicResult<()> {
        let mut histories = self.histories.lock().await;
        histories.insert(history.id.clone(), history);
        Ok(())
    }

    async fn get_history(&self, id: &str) -> ClinicResult<Option<MedicalHistory>> {
        let histories = self.histories.lock().await;
        Ok(histories.get(id).cloned())
    }

    async fn get_all_histories(&self) -> ClinicResult<Vec<MedicalHistory>> {
        let histories = self.histories.lock().await;
        Ok(histories.values().cloned().collect())
    }

    async fn get_category(&self, id: u64) -> ClinicResult<Option<ComplaintCategory>> {
        let categories = self.categories.lock().await;
        Ok(categories.get(&id).cloned())
    }

    async fn get_all_categories(&self) -> ClinicResult<Vec<ComplaintCategory>> {
        let categories = self.categories.lock().await;
        Ok(categories.values().cloned().collect())
    }

    async fn delete_category(&self, id: u64) -> ClinicResult<()> {
        let mut categories = self.categories.lock().await;
        if categories.remove(&id).is_none() {
            return Err(ClinicError::NotFound(format!("Category {}", id)));
        }
        Ok(())
    }

    async fn create_consultation_with_vitals(
        &self,
        mut consultation: Consultation,
        mut vitals: VitalSigns,
    ) -> ClinicResult<(Consultation, VitalSigns)> {
        let mut next_id = self.next_consultation_id.lock().await;
        *next_id += 1;
        let id = *next_id;
        consultation.id = id;
        vitals.id = id;
        vitals.consultation_id = id;
        let mut consultations = self.consultations.lock().await;
        consultations.insert(id, (consultation.clone(), vitals.clone()));
        Ok((consultation, vitals))
    }

    async fn get_consultation(&self, id: u64) -> ClinicResult<Option<Consultation>> {
        let consultations = self.consultations.lock().await;
        Ok(consultations.get(&id).map(|(c, _)| c.clone()))
    }

    async fn get_vitals_for_consultation(
        &self,
        consultation_id: u64,
    ) -> ClinicResult<Option<VitalSigns>> {
        let consultations = self.consultations.lock().await;
        Ok(consultations.get(&consultation_id).map(|(_, v)| v.clone()))
    }

    async fn get_all_consultations(&self) -> ClinicResult<Vec<Consultation>> {
        let consultations = self.consultations.lock().await;
        Ok(consultations.values().map(|(c, _)| c.clone()).collect())
    }

    async fn create_publication(&self, mut publication: Publication) -> ClinicResult<Publication> {
        let mut next_id = self.next_publication_id.lock().await;
        *next_id += 1;
        publication.id = *next_id;
        let mut publications = self.publications.lock().await;
        publications.insert(publication.id, publication.clone());
        Ok(publication)
    }

    async fn get_all_publications(&self) -> ClinicResult<Vec<Publication>> {
        let publications = self.publications.lock().await;
        Ok(publications.values().cloned().collect())
    }
}
