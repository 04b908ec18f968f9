//! Loading and saving of [`ManagerConfig`].

use backdrop_types::{ConfigError, ManagerConfig};
use std::fs;
use std::path::Path;

/// Load configuration from a JSON file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ManagerConfig, ConfigError> {
    if !path.exists() {
        return Ok(ManagerConfig::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let config: ManagerConfig = serde_json::from_str(&content).map_err(|e| ConfigError::parse(&e))?;
    validate(&config)?;
    Ok(config)
}

/// Save configuration atomically: write a sibling temp file, then rename.
pub fn save_config(path: &Path, config: &ManagerConfig) -> Result<(), ConfigError> {
    validate(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::from_io_error(&e))?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::WriteError {
        message: format!("failed to serialize config: {}", e),
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::from_io_error(&e))?;

    tracing::debug!(path = %path.display(), "Saved manager config");
    Ok(())
}

fn validate(config: &ManagerConfig) -> Result<(), ConfigError> {
    if !config.link_base_url.ends_with('/') {
        return Err(ConfigError::ValidationError {
            field: "link_base_url".to_string(),
            message: "must end with '/'".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ManagerConfig::default());
        assert!(config.use_file_database);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("backdrop.json");
        let config = ManagerConfig {
            use_file_database: false,
            is_bot: true,
            link_base_url: "https://example.org/".to_string(),
            database_path: Some(dir.path().join("bg.sqlite")),
        };

        save_config(&path, &config).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backdrop.json");
        fs::write(&path, r#"{"is_bot": true}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.is_bot);
        assert!(config.use_file_database);
        assert_eq!(config.link_base_url, "https://t.me/");
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backdrop.json");

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::ParseError { .. })));

        fs::write(&path, r#"{"link_base_url": "https://t.me"}"#).unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::ValidationError { .. })));
    }
}
