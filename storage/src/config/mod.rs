// storage/src/config/mod.rs

pub mod config_helpers;
pub mod config_structs;

pub use config_helpers::load_clinic_config;
pub use config_structs::{
    ClinicConfig, IdentityConfig, ImportConfig, LoginField, PaginationConfig,
    ReadingsCacheConfig, StorageConfig, StorageEngineType, DEFAULT_CONFIG_PATH,
};
