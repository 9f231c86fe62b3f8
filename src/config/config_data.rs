//! Configuration data structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::language::Language;
use super::markers::Markers;

/// Main configuration structure for litweave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directive and template markers.
    #[serde(default)]
    pub markers: Markers,

    /// Emit the code executed before each directive as a code echo segment.
    #[serde(default)]
    pub echo: bool,

    /// Fence tag used for echoed host code.
    #[serde(default = "default_host_language")]
    pub host_language: String,

    /// Directory (relative to the source file) where command backends write figures.
    #[serde(default = "default_figure_dir")]
    pub figure_dir: PathBuf,

    /// External figure backends.
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Extra listing languages (consulted before the built-ins).
    #[serde(default)]
    pub languages: Vec<Language>,
}

fn default_host_language() -> String {
    "python".to_string()
}

fn default_figure_dir() -> PathBuf {
    PathBuf::from("figures")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            echo: false,
            host_language: default_host_language(),
            figure_dir: default_figure_dir(),
            backends: BackendsConfig::default(),
            languages: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Commands used by the subprocess figure backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Diagram compiler (Graphviz by default).
    #[serde(default = "default_diagram")]
    pub diagram: CommandSpec,

    /// Schematic/vector renderer.
    #[serde(default = "default_schematic")]
    pub schematic: CommandSpec,
}

fn default_diagram() -> CommandSpec {
    CommandSpec::new(&["dot", "-Tsvg", "{input}", "-o", "{output}"], "svg")
}

fn default_schematic() -> CommandSpec {
    CommandSpec::new(&["inkscape", "{input}", "--export-filename={output}"], "png")
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            diagram: default_diagram(),
            schematic: default_schematic(),
        }
    }
}

/// An external program invocation.
///
/// `{input}` and `{output}` in arguments are replaced with the source path and
/// the artifact path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program followed by its arguments.
    pub command: Vec<String>,

    /// Extension of the produced artifact.
    pub extension: String,
}

impl CommandSpec {
    /// Creates a command spec.
    pub fn new(command: &[&str], extension: &str) -> Self {
        Self {
            command: command.iter().map(|s| s.to_string()).collect(),
            extension: extension.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.echo);
        assert_eq!(config.figure_dir, PathBuf::from("figures"));
        assert_eq!(config.backends.diagram.command[0], "dot");
        assert_eq!(config.backends.diagram.extension, "svg");
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.markers, config.markers);
        assert_eq!(parsed.backends, config.backends);
    }
}
