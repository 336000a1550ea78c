// storage/src/lib.rs

pub mod config;
pub mod storage_engine;

pub use config::{
    ClinicConfig, IdentityConfig, ImportConfig, LoginField, PaginationConfig,
    ReadingsCacheConfig, StorageConfig, StorageEngineType, load_clinic_config,
    DEFAULT_CONFIG_PATH,
};
pub use storage_engine::inmemory_storage::InMemoryStorage;
pub use storage_engine::sled_storage::SledStorage;
pub use storage_engine::storage_engine::{open_storage, ClinicStorageEngine};
