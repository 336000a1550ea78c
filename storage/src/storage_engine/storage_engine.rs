// storage/src/storage_engine/storage_engine.rs

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use models::errors::ClinicResult;
use models::{
    Area, ComplaintCategory, Consultation, MedicalHistory, Publication, User, UserKey, VitalSigns,
};

use crate::config::{ClinicConfig, StorageEngineType};
use crate::storage_engine::inmemory_storage::InMemoryStorage;
use crate::storage_engine::sled_storage::SledStorage;

/// Persistence surface for the clinic record system.
///
/// Implementations assign record identifiers themselves and must keep a
/// consultation and its vital-signs record in the same write, so a stored
/// consultation can never be observed without its vitals.
#[async_trait]
pub trait ClinicStorageEngine: Send + Sync + Debug + 'static {
    fn engine_type(&self) -> StorageEngineType;

    /// Seeds the area and complaint-category catalogs on first open.
    async fn bootstrap(&self) -> ClinicResult<()>;

    async fn flush(&self) -> ClinicResult<()>;

    async fn create_user(&self, user: User) -> ClinicResult<()>;

    async fn update_user(&self, user: User) -> ClinicResult<()>;

    async fn get_user(&self, key: &UserKey) -> ClinicResult<Option<User>>;

    /// Looks a user up by key, ignoring case of the raw input.
    async fn find_user_by_key_ci(&self, raw_key: &str) -> ClinicResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> ClinicResult<Option<User>>;

    async fn get_all_users(&self) -> ClinicResult<Vec<User>>;

    /// Inserts a batch of new users. Fails without writing anything when any
    /// key is already taken.
    async fn create_users(&self, users: Vec<User>) -> ClinicResult<()>;

    /// Rewrites a batch of existing users. Fails without writing anything
    /// when any key is unknown.
    async fn update_users(&self, users: Vec<User>) -> ClinicResult<()>;

    async fn get_area(&self, name: &str) -> ClinicResult<Option<Area>>;

    async fn get_all_areas(&self) -> ClinicResult<Vec<Area>>;

    async fn upsert_history(&self, history: MedicalHistory) -> ClinicResult<()>;

    async fn get_history(&self, id: &str) -> ClinicResult<Option<MedicalHistory>>;

    async fn get_all_histories(&self) -> ClinicResult<Vec<MedicalHistory>>;

    async fn get_category(&self, id: u64) -> ClinicResult<Option<ComplaintCategory>>;

    async fn get_all_categories(&self) -> ClinicResult<Vec<ComplaintCategory>>;

    async fn delete_category(&self, id: u64) -> ClinicResult<()>;

    /// Stores a consultation and its vitals atomically, assigning both ids.
    /// The `id` and `consultation_id` fields of the inputs are ignored.
    async fn create_consultation_with_vitals(
        &self,
        consultation: Consultation,
        vitals: VitalSigns,
    ) -> ClinicResult<(Consultation, VitalSigns)>;

    async fn get_consultation(&self, id: u64) -> ClinicResult<Option<Consultation>>;

    async fn get_vitals_for_consultation(
        &self,
        consultation_id: u64,
    ) -> ClinicResult<Option<VitalSigns>>;

    async fn get_all_consultations(&self) -> ClinicResult<Vec<Consultation>>;

    /// Stores a publication, assigning its id.
    async fn create_publication(&self, publication: Publication) -> ClinicResult<Publication>;

    async fn get_all_publications(&self) -> ClinicResult<Vec<Publication>>;
}

/// Opens the storage engine named by `config` and bootstraps its catalogs.
pub async fn open_storage(config: &ClinicConfig) -> ClinicResult<Arc<dyn ClinicStorageEngine>> {
    let engine: Arc<dyn ClinicStorageEngine> = match config.storage.engine {
        StorageEngineType::Sled => Arc::new(SledStorage::new(&config.storage.data_directory)?),
        StorageEngineType::InMemory => Arc::new(InMemoryStorage::new()),
    };
    info!("Opened {} storage engine", engine.engine_type());
    engine.bootstrap().await?;
    Ok(engine)
}
