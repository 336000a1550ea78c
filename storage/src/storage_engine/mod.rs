// storage/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::SledStorage;
pub use storage_engine::{open_storage, ClinicStorageEngine};
