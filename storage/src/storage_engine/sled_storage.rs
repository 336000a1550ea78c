// storage/src/storage_engine/sled_storage.rs

use std::path::Path;

use async_trait::async_trait;
use bincode::{config, decode_from_slice, encode_to_vec, Decode, Encode};
use log::{debug, info};
use sled::{Db, Tree};

use models::errors::{ClinicError, ClinicResult};
use models::{
    Area, ComplaintCategory, Consultation, MedicalHistory, Publication, User, UserKey, VitalSigns,
};

use crate::config::StorageEngineType;
use crate::storage_engine::storage_engine::ClinicStorageEngine;

const USERS_TREE: &str = "users";
const AREAS_TREE: &str = "areas";
const HISTORIES_TREE: &str = "histories";
const CATEGORIES_TREE: &str = "categories";
const CONSULTATIONS_TREE: &str = "consultations";
const PUBLICATIONS_TREE: &str = "publications";
const META_TREE: &str = "meta";

const SEEDED_KEY: &str = "catalogs_seeded";
const NEXT_CONSULTATION_ID_KEY: &str = "next_consultation_id";
const NEXT_PUBLICATION_ID_KEY: &str = "next_publication_id";

fn to_bytes<T: Encode>(value: &T) -> ClinicResult<Vec<u8>> {
    Ok(encode_to_vec(value, config::standard())?)
}

fn from_bytes<T: Decode<()>>(bytes: &[u8]) -> ClinicResult<T> {
    Ok(decode_from_slice(bytes, config::standard())?.0)
}

fn read_counter(bytes: &[u8]) -> u64 {
    bytes.try_into().map(u64::from_be_bytes).unwrap_or(0)
}

/// Persistent engine backed by one sled database, one tree per record
/// family. A consultation and its vitals are encoded as a single record so
/// the pair is written in one atomic insert.
#[derive(Debug)]
pub struct SledStorage {
    db: Db,
    users: Tree,
    areas: Tree,
    histories: Tree,
    categories: Tree,
    consultations: Tree,
    publications: Tree,
    meta: Tree,
}

impl SledStorage {
    pub fn new(path: &Path) -> ClinicResult<Self> {
        info!("Opening sled database at {:?}", path);
        let db = sled::open(path)?;
        let users = db.open_tree(USERS_TREE)?;
        let areas = db.open_tree(AREAS_TREE)?;
        let histories = db.open_tree(HISTORIES_TREE)?;
        let categories = db.open_tree(CATEGORIES_TREE)?;
        let consultations = db.open_tree(CONSULTATIONS_TREE)?;
        let publications = db.open_tree(PUBLICATIONS_TREE)?;
        let meta = db.open_tree(META_TREE)?;
        Ok(SledStorage {
            db,
            users,
            areas,
            histories,
            categories,
            consultations,
            publications,
            meta,
        })
    }

    fn next_id(&self, counter_key: &str) -> ClinicResult<u64> {
        let updated = self.meta.update_and_fetch(counter_key, |old| {
            let next = old.map(read_counter).unwrap_or(0) + 1;
            Some(next.to_be_bytes().to_vec())
        })?;
        updated
            .as_deref()
            .map(read_counter)
            .ok_or_else(|| ClinicError::StorageError("id counter missing after update".to_string()))
    }

    fn decode_all<T: Decode<()>>(tree: &Tree) -> ClinicResult<Vec<T>> {
        let mut records = Vec::new();
        for item in tree.iter() {
            let (_key, value) = item?;
            records.push(from_bytes(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl ClinicStorageEngine for SledStorage {
    fn engine_type(&self) -> StorageEngineType {
        StorageEngineType::Sled
    }

    async fn bootstrap(&self) -> ClinicResult<()> {
        if self.meta.get(SEEDED_KEY)?.is_some() {
            return Ok(());
        }
        for area in Area::default_catalog() {
            self.areas.insert(area.name.as_bytes(), to_bytes(&area)?)?;
        }
        for category in ComplaintCategory::default_catalog() {
            self.categories
                .insert(category.id.to_be_bytes(), to_bytes(&category)?)?;
        }
        self.meta.insert(SEEDED_KEY, &[1u8])?;
        self.db.flush_async().await?;
        debug!("Seeded sled area and category catalogs");
        Ok(())
    }

    async fn flush(&self) -> ClinicResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    async fn create_user(&self, user: User) -> ClinicResult<()> {
        if self.users.get(user.key.as_str().as_bytes())?.is_some() {
            return Err(ClinicError::AlreadyExists(format!(
                "User with key {} already exists",
                user.key
            )));
        }
        self.users
            .insert(user.key.as_str().as_bytes(), to_bytes(&user)?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn update_user(&self, user: User) -> ClinicResult<()> {
        if self.users.get(user.key.as_str().as_bytes())?.is_none() {
            return Err(ClinicError::NotFound(format!("User {}", user.key)));
        }
        self.users
            .insert(user.key.as_str().as_bytes(), to_bytes(&user)?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn get_user(&self, key: &UserKey) -> ClinicResult<Option<User>> {
        self.users
            .get(key.as_str().as_bytes())?
            .map(|ivec| from_bytes(&ivec))
            .transpose()
    }

    async fn find_user_by_key_ci(&self, raw_key: &str) -> ClinicResult<Option<User>> {
        let needle = raw_key.trim();
        for item in self.users.iter() {
            let (_key, value) = item?;
            let user: User = from_bytes(&value)?;
            if user.key.as_str().eq_ignore_ascii_case(needle) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    async fn find_user_by_email(&self, email: &str) -> ClinicResult<Option<User>> {
        let needle = email.trim();
        for item in self.users.iter() {
            let (_key, value) = item?;
            let user: User = from_bytes(&value)?;
            if user.email.eq_ignore_ascii_case(needle) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    async fn get_all_users(&self) -> ClinicResult<Vec<User>> {
        Self::decode_all(&self.users)
    }

    async fn create_users(&self, new_users: Vec<User>) -> ClinicResult<()> {
        for user in &new_users {
            if self.users.get(user.key.as_str().as_bytes())?.is_some() {
                return Err(ClinicError::AlreadyExists(format!(
                    "User with key {} already exists",
                    user.key
                )));
            }
        }
        let mut batch = sled::Batch::default();
        for user in &new_users {
            batch.insert(user.key.as_str().as_bytes(), to_bytes(user)?);
        }
        self.users.apply_batch(batch)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn update_users(&self, changed_users: Vec<User>) -> ClinicResult<()> {
        for user in &changed_users {
            if self.users.get(user.key.as_str().as_bytes())?.is_none() {
                return Err(ClinicError::NotFound(format!("User {}", user.key)));
            }
        }
        let mut batch = sled::Batch::default();
        for user in &changed_users {
            batch.insert(user.key.as_str().as_bytes(), to_bytes(user)?);
        }
        self.users.apply_batch(batch)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn get_area(&self, name: &str) -> ClinicResult<Option<Area>> {
        self.areas
            .get(name.as_bytes())?
            .map(|ivec| from_bytes(&ivec))
            .transpose()
    }

    async fn get_all_areas(&self) -> ClinicResult<Vec<Area>> {
        Self::decode_all(&self.areas)
    }

    async fn upsert_history(&self, history: MedicalHistory) -> ClinicResult<()> {
        self.histories
            .insert(history.id.as_bytes(), to_bytes(&history)?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn get_history(&self, id: &str) -> ClinicResult<Option<MedicalHistory>> {
        self.histories
            .get(id.as_bytes())?
            .map(|ivec| from_bytes(&ivec))
            .transpose()
    }

    async fn get_all_histories(&self) -> ClinicResult<Vec<MedicalHistory>> {
        Self::decode_all(&self.histories)
    }

    async fn get_category(&self, id: u64) -> ClinicResult<Option<ComplaintCategory>> {
        self.categories
            .get(id.to_be_bytes())?
            .map(|ivec| from_bytes(&ivec))
            .transpose()
    }

    async fn get_all_categories(&self) -> ClinicResult<Vec<ComplaintCategory>> {
        Self::decode_all(&self.categories)
    }

    async fn delete_category(&self, id: u64) -> ClinicResult<()> {
        if self.categories.remove(id.to_be_bytes())?.is_none() {
            return Err(ClinicError::NotFound(format!("Category {}", id)));
        }
        self.db.flush_async().await?;
        Ok(())
    }

    async fn create_consultation_with_vitals(
        &self,
        mut consultation: Consultation,
        mut vitals: VitalSigns,
    ) -> ClinicResult<(Consultation, VitalSigns)> {
        let id = self.next_id(NEXT_CONSULTATION_ID_KEY)?;
        consultation.id = id;
        vitals.id = id;
        vitals.consultation_id = id;
        let record = (consultation.clone(), vitals.clone());
        self.consultations
            .insert(id.to_be_bytes(), to_bytes(&record)?)?;
        self.db.flush_async().await?;
        Ok((consultation, vitals))
    }

    async fn get_consultation(&self, id: u64) -> ClinicResult<Option<Consultation>> {
        self.consultations
            .get(id.to_be_bytes())?
            .map(|ivec| from_bytes::<(Consultation, VitalSigns)>(&ivec).map(|(c, _)| c))
            .transpose()
    }

    async fn get_vitals_for_consultation(
        &self,
        consultation_id: u64,
    ) -> ClinicResult<Option<VitalSigns>> {
        self.consultations
            .get(consultation_id.to_be_bytes())?
            .map(|ivec| from_bytes::<(Consultation, VitalSigns)>(&ivec).map(|(_, v)| v))
            .transpose()
    }

    async fn get_all_consultations(&self) -> ClinicResult<Vec<Consultation>> {
        let records: Vec<(Consultation, VitalSigns)> = Self::decode_all(&self.consultations)?;
        Ok(records.into_iter().map(|(c, _)| c).collect())
    }

    async fn create_publication(&self, mut publication: Publication) -> ClinicResult<Publication> {
        publication.id = self.next_id(NEXT_PUBLICATION_ID_KEY)?;
        self.publications
            .insert(publication.id.to_be_bytes(), to_bytes(&publication)?)?;
        self.db.flush_async().await?;
        Ok(publication)
    }

    async fn get_all_publications(&self) -> ClinicResult<Vec<Publication>> {
        Self::decode_all(&self.publications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::timestamp::{BincodeDate, BincodeDateTime};
    use models::users::{Role, Sex};
    use models::vitals::VitalSignsInput;
    use chrono::NaiveDate;

    fn sample_user(key: &str) -> User {
        let now = BincodeDateTime::now();
        User {
            key: UserKey::new(key).expect("valid key"),
            email: format!("{}@itsatlixco.edu.mx", key.to_lowercase()),
            first_names: "MARIA".to_string(),
            paternal_surname: "LOPEZ".to_string(),
            maternal_surname: Some("RIVERA".to_string()),
            birth_date: NaiveDate::from_ymd_opt(2000, 5, 1).map(BincodeDate),
            sex: Some(Sex::Female),
            role: Role::Patient,
            area: Area::new("Ingeniería en Sistemas Computacionales"),
            is_active: true,
            is_staff: false,
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_pair(patient: &str, doctor: &str) -> (Consultation, VitalSigns) {
        let consultation = Consultation {
            id: 0,
            created_at: BincodeDateTime::now(),
            complaint: "Tos persistente".to_string(),
            non_drug_treatment: Some("Reposo".to_string()),
            prescribed_treatment: None,
            category_id: Some(1),
            patient_key: UserKey::new(patient).expect("valid key"),
            doctor_key: UserKey::new(doctor).expect("valid key"),
        };
        let vitals = VitalSignsInput {
            weight: Some("70.5".to_string()),
            height: Some("1.75".to_string()),
            ..VitalSignsInput::default()
        }
        .validate()
        .expect("valid vitals")
        .into_vital_signs(0, 0);
        (consultation, vitals)
    }

    #[tokio::test]
    async fn should_persist_users_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let storage = SledStorage::new(dir.path()).expect("open");
            storage.create_user(sample_user("ISC210345")).await.expect("insert");
        }
        let storage = SledStorage::new(dir.path()).expect("reopen");
        let found = storage
            .get_user(&UserKey::new("ISC210345").expect("valid key"))
            .await
            .expect("lookup");
        assert_eq!(found.map(|u| u.email), Some("isc210345@itsatlixco.edu.mx".to_string()));
    }

    #[tokio::test]
    async fn should_store_consultation_and_vitals_in_one_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = SledStorage::new(dir.path()).expect("open");
        let (consultation, vitals) = sample_pair("ISC210345", "admin1");
        let (stored, stored_vitals) = storage
            .create_consultation_with_vitals(consultation, vitals)
            .await
            .expect("create");
        assert_eq!(stored.id, 1);
        assert_eq!(stored_vitals.consultation_id, 1);
        assert_eq!(stored_vitals.bmi, Some(23.02));
        let fetched = storage
            .get_vitals_for_consultation(stored.id)
            .await
            .expect("vitals lookup")
            .expect("vitals present");
        assert_eq!(fetched, stored_vitals);
    }

    #[tokio::test]
    async fn should_keep_ids_monotonic_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let storage = SledStorage::new(dir.path()).expect("open");
            let (consultation, vitals) = sample_pair("ISC210345", "admin1");
            let (stored, _) = storage
                .create_consultation_with_vitals(consultation, vitals)
                .await
                .expect("create");
            assert_eq!(stored.id, 1);
        }
        let storage = SledStorage::new(dir.path()).expect("reopen");
        let (consultation, vitals) = sample_pair("II210001", "admin1");
        let (stored, _) = storage
            .create_consultation_with_vitals(consultation, vitals)
            .await
            .expect("create after reopen");
        assert_eq!(stored.id, 2);
    }

    #[tokio::test]
    async fn should_not_reseed_deleted_category() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let storage = SledStorage::new(dir.path()).expect("open");
            storage.bootstrap().await.expect("bootstrap");
            storage.delete_category(9).await.expect("delete");
        }
        let storage = SledStorage::new(dir.path()).expect("reopen");
        storage.bootstrap().await.expect("bootstrap again");
        assert!(storage.get_category(9).await.expect("lookup").is_none());
        assert_eq!(storage.get_all_categories().await.expect("list").len(), 8);
    }

    #[tokio::test]
    async fn should_apply_user_batches_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = SledStorage::new(dir.path()).expect("open");
        storage.create_user(sample_user("ISC210345")).await.expect("insert");
        let result = storage
            .create_users(vec![sample_user("II210001"), sample_user("ISC210345")])
            .await;
        assert!(matches!(result, Err(ClinicError::AlreadyExists(_))));
        assert!(storage
            .get_user(&UserKey::new("II210001").expect("valid key"))
            .await
            .expect("lookup")
            .is_none());
    }
}
