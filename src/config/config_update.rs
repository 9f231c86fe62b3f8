//! Configuration update and merging.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config_data::{BackendsConfig, CommandSpec, Config};
use super::language::Language;
use super::markers::Markers;

/// Partial configuration, as read from `litweave.toml`.
///
/// All fields are optional. Only specified fields override the base config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub markers: Option<Markers>,

    #[serde(default)]
    pub echo: Option<bool>,

    #[serde(default)]
    pub host_language: Option<String>,

    #[serde(default)]
    pub figure_dir: Option<PathBuf>,

    #[serde(default)]
    pub backends: Option<BackendsUpdate>,

    #[serde(default)]
    pub languages: Option<Vec<Language>>,
}

/// Partial backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsUpdate {
    #[serde(default)]
    pub diagram: Option<CommandSpec>,

    #[serde(default)]
    pub schematic: Option<CommandSpec>,
}

impl ConfigUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges this update into a base configuration, returning a new Config.
    pub fn merge_into(self, base: &Config) -> Config {
        Config {
            markers: self.markers.unwrap_or_else(|| base.markers.clone()),
            echo: self.echo.unwrap_or(base.echo),
            host_language: self
                .host_language
                .unwrap_or_else(|| base.host_language.clone()),
            figure_dir: self.figure_dir.unwrap_or_else(|| base.figure_dir.clone()),
            backends: merge_backends(&base.backends, self.backends),
            languages: merge_languages(
                &base.languages,
                self.languages.as_deref().unwrap_or_default(),
            ),
        }
    }
}

fn merge_backends(base: &BackendsConfig, update: Option<BackendsUpdate>) -> BackendsConfig {
    match update {
        Some(u) => BackendsConfig {
            diagram: u.diagram.unwrap_or_else(|| base.diagram.clone()),
            schematic: u.schematic.unwrap_or_else(|| base.schematic.clone()),
        },
        None => base.clone(),
    }
}

/// Merge language lists, with update languages overriding base languages of the same name.
fn merge_languages(base: &[Language], update: &[Language]) -> Vec<Language> {
    let mut result = base.to_vec();

    for lang in update {
        result.retain(|l| l.name != lang.name);
        result.push(lang.clone());
    }

    result
}

impl From<ConfigUpdate> for Config {
    fn from(update: ConfigUpdate) -> Self {
        update.merge_into(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update() {
        let base = Config::default();
        let merged = ConfigUpdate::new().merge_into(&base);

        assert_eq!(merged.markers, base.markers);
        assert_eq!(merged.echo, base.echo);
    }

    #[test]
    fn test_partial_update() {
        let update = ConfigUpdate {
            echo: Some(true),
            backends: Some(BackendsUpdate {
                diagram: Some(CommandSpec::new(&["mmdc", "-i", "{input}", "-o", "{output}"], "svg")),
                schematic: None,
            }),
            ..Default::default()
        };
        let config: Config = update.into();

        assert!(config.echo);
        assert_eq!(config.backends.diagram.command[0], "mmdc");
        assert_eq!(config.backends.schematic, BackendsConfig::default().schematic);
    }

    #[test]
    fn test_merge_languages() {
        let base_langs = vec![Language::new("python").with_identifiers(&["py"])];
        let update_langs = vec![
            Language::new("python").with_identifiers(&["py", "pyi"]),
            Language::new("nim"),
        ];

        let merged = merge_languages(&base_langs, &update_langs);
        assert_eq!(merged.len(), 2);

        let python = merged.iter().find(|l| l.name == "python").unwrap();
        assert!(python.matches("pyi"));
    }
}
