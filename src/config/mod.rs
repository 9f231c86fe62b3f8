//! Configuration loading and management.

mod config_data;
mod config_update;
mod language;
mod markers;

use std::fs;
use std::path::{Path, PathBuf};

pub use config_data::{BackendsConfig, CommandSpec, Config};
pub use config_update::{BackendsUpdate, ConfigUpdate};
pub use language::{builtin_languages, language_for_path, Language};
pub use markers::Markers;

use crate::errors::{LitweaveError, Result};

/// Standard configuration file names to search for.
const CONFIG_FILES: &[&str] = &["litweave.toml", ".litweave.toml"];

/// Finds the configuration file in the given directory or its parents.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for name in CONFIG_FILES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Reads configuration from a TOML file.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let update: ConfigUpdate = toml::from_str(&content)?;
    let config = update.merge_into(&Config::default());
    config.markers.validate().map_err(LitweaveError::Config)?;
    Ok(config)
}

/// Reads configuration, searching from the given directory.
///
/// If no config file is found, returns the default configuration.
pub fn read_config(start_dir: &Path) -> Result<Config> {
    match find_config_file(start_dir) {
        Some(path) => {
            tracing::debug!("Using configuration {}", path.display());
            read_config_file(&path)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("litweave.toml");
        fs::write(&config_path, "echo = true").unwrap();

        let found = find_config_file(dir.path()).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_config_file_parent() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".litweave.toml");
        fs::write(&config_path, "echo = true").unwrap();

        let subdir = dir.path().join("chapters");
        fs::create_dir(&subdir).unwrap();

        let found = find_config_file(&subdir).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("litweave.toml");
        fs::write(
            &config_path,
            r#"
echo = true
figure_dir = "img"

[markers]
template_open = "<%"
template_close = "%>"

[backends.diagram]
command = ["dot", "-Tpng", "{input}", "-o", "{output}"]
extension = "png"

[[languages]]
name = "cython"
identifiers = ["pyx"]
"#,
        )
        .unwrap();

        let config = read_config_file(&config_path).unwrap();
        assert!(config.echo);
        assert_eq!(config.figure_dir, PathBuf::from("img"));
        assert_eq!(config.markers.template_open, "<%");
        assert_eq!(config.markers.text, "#'");
        assert_eq!(config.backends.diagram.extension, "png");
        assert_eq!(config.languages[0].name, "cython");
    }

    #[test]
    fn test_read_config_rejects_ambiguous_markers() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("litweave.toml");
        fs::write(&config_path, "[markers]\noutput = \"#'\"\n").unwrap();

        let err = read_config_file(&config_path).unwrap_err();
        assert!(matches!(err, LitweaveError::Config(_)));
    }

    #[test]
    fn test_read_config_default() {
        let dir = tempdir().unwrap();
        let config = read_config(dir.path()).unwrap();
        assert!(!config.echo);
    }
}
