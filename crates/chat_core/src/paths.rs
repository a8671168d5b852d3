use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Configuration directory (~/.context-pipeline)
pub fn config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".context-pipeline")
}

/// Path of settings.json
pub fn settings_json_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load a JSON or TOML config file, picking the format from the extension
pub fn load_config_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        bail!("Config file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::UserProfile;

    #[test]
    fn test_json_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.json");

        let profile = UserProfile::new("u1", "Ada");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(&profile).unwrap()).unwrap();

        let loaded: UserProfile = load_config_file(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "id = \"u2\"\ndisplay_name = \"Grace\"\n").unwrap();

        let loaded: UserProfile = load_config_file(&path).unwrap();
        assert_eq!(loaded.display_name, "Grace");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<UserProfile> = load_config_file(&dir.path().join("nope.json"));
        assert!(result.is_err());
    }
}
