// storage/src/config/config_helpers.rs

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde_yaml2 as serde_yaml;

use models::errors::{ClinicError, ClinicResult};

use crate::config::config_structs::{ClinicConfig, DEFAULT_CONFIG_PATH};

/// Loads the clinic configuration from `config_file_path`, falling back to
/// [`DEFAULT_CONFIG_PATH`] and then to built-in defaults when no file exists.
pub fn load_clinic_config(config_file_path: Option<&str>) -> ClinicResult<ClinicConfig> {
    let path_to_use = config_file_path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    info!("Attempting to load clinic config from {:?}", path_to_use);

    if !path_to_use.exists() {
        warn!(
            "Config file not found at {}. Using default clinic config.",
            path_to_use.display()
        );
        return Ok(ClinicConfig::default());
    }

    let config_content = fs::read_to_string(&path_to_use).map_err(|e| {
        ClinicError::ConfigurationError(format!(
            "Failed to read config file {}: {}",
            path_to_use.display(),
            e
        ))
    })?;
    debug!("Clinic config content: {}", config_content);

    let config: ClinicConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        ClinicError::ConfigurationError(format!(
            "Failed to parse config YAML {}: {}",
            path_to_use.display(),
            e
        ))
    })?;
    info!("Successfully loaded clinic config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_structs::StorageEngineType;
    use std::io::Write;

    #[test]
    fn should_fall_back_to_defaults_when_file_missing() {
        let config = load_clinic_config(Some("/nonexistent/clinic_config.yaml"))
            .expect("missing file should fall back to defaults");
        assert_eq!(config, ClinicConfig::default());
    }

    #[test]
    fn should_load_config_from_yaml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clinic_config.yaml");
        let mut file = fs::File::create(&path).expect("create config file");
        writeln!(file, "storage:").expect("write");
        writeln!(file, "  engine: inmemory").expect("write");
        writeln!(file, "pagination:").expect("write");
        writeln!(file, "  consultations_per_page: 5").expect("write");

        let config = load_clinic_config(path.to_str()).expect("config should load");
        assert_eq!(config.storage.engine, StorageEngineType::InMemory);
        assert_eq!(config.pagination.consultations_per_page, 5);
        assert_eq!(config.pagination.histories_per_page, 10);
    }

    #[test]
    fn should_reject_malformed_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clinic_config.yaml");
        fs::write(&path, "storage: [not, a, mapping").expect("write config file");

        let result = load_clinic_config(path.to_str());
        assert!(matches!(result, Err(ClinicError::ConfigurationError(_))));
    }
}
