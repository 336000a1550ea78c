// storage/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default location of the clinic configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/opt/clinicdb/clinic_config.yaml";

/// Default directory for persistent storage data.
pub const DEFAULT_DATA_DIRECTORY: &str = "/opt/clinicdb/data";

/// Which storage backend the daemon runs against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngineType {
    Sled,
    InMemory,
}

impl StorageEngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageEngineType::Sled => "sled",
            StorageEngineType::InMemory => "inmemory",
        }
    }
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageEngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "inmemory" | "in-memory" | "memory" => Ok(StorageEngineType::InMemory),
            other => Err(format!("unknown storage engine type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_engine_type")]
    pub engine: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
}

fn default_engine_type() -> StorageEngineType {
    StorageEngineType::Sled
}

fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine: default_engine_type(),
            data_directory: default_data_directory(),
        }
    }
}

/// Which user field a login attempt is matched against first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginField {
    Key,
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    /// Password assigned when an account is created without one.
    #[serde(default = "default_password")]
    pub default_password: String,
    #[serde(default = "default_login_field")]
    pub login_field: LoginField,
}

fn default_password() -> String {
    "P@ssword123".to_string()
}

fn default_login_field() -> LoginField {
    LoginField::Key
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            default_password: default_password(),
            login_field: default_login_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Row errors reported per import run before the rest are dropped.
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
}

fn default_batch_size() -> usize {
    500
}

fn default_max_errors() -> usize {
    50
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            batch_size: default_batch_size(),
            max_errors: default_max_errors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginationConfig {
    #[serde(default = "default_consultations_per_page")]
    pub consultations_per_page: usize,
    #[serde(default = "default_histories_per_page")]
    pub histories_per_page: usize,
}

fn default_consultations_per_page() -> usize {
    20
}

fn default_histories_per_page() -> usize {
    10
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            consultations_per_page: default_consultations_per_page(),
            histories_per_page: default_histories_per_page(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingsCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

impl Default for ReadingsCacheConfig {
    fn default() -> Self {
        ReadingsCacheConfig {
            capacity: default_cache_capacity(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

/// Top-level configuration for the clinic daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClinicConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub readings_cache: ReadingsCacheConfig,
}
