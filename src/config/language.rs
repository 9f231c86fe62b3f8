//! Language table used to type included listings.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A listing language, matched by name or file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Fence tag emitted for listings (e.g., "python", "rust").
    pub name: String,

    /// File extensions that map to this language.
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl Language {
    /// Creates a language with no extra identifiers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifiers: Vec::new(),
        }
    }

    /// Adds file extensions/identifiers.
    pub fn with_identifiers(mut self, identifiers: &[&str]) -> Self {
        self.identifiers = identifiers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Checks if this language matches a given identifier.
    pub fn matches(&self, identifier: &str) -> bool {
        self.name == identifier || self.identifiers.iter().any(|id| id == identifier)
    }
}

static BUILTIN_LANGUAGES: Lazy<Vec<Language>> = Lazy::new(|| {
    vec![
        Language::new("python").with_identifiers(&["py", "pyw"]),
        Language::new("rust").with_identifiers(&["rs"]),
        Language::new("c").with_identifiers(&["h"]),
        Language::new("cpp").with_identifiers(&["cc", "cxx", "hpp"]),
        Language::new("javascript").with_identifiers(&["js", "mjs"]),
        Language::new("typescript").with_identifiers(&["ts"]),
        Language::new("bash").with_identifiers(&["sh", "zsh"]),
        Language::new("julia").with_identifiers(&["jl"]),
        Language::new("r").with_identifiers(&["R"]),
        Language::new("toml"),
        Language::new("yaml").with_identifiers(&["yml"]),
        Language::new("json"),
        Language::new("sql"),
        Language::new("html").with_identifiers(&["htm"]),
        Language::new("css"),
        Language::new("tex").with_identifiers(&["latex", "sty"]),
        Language::new("dot").with_identifiers(&["gv"]),
        Language::new("markdown").with_identifiers(&["md"]),
    ]
});

/// Returns the built-in language table.
pub fn builtin_languages() -> &'static [Language] {
    &BUILTIN_LANGUAGES
}

/// Guesses the listing language for a path from its extension.
///
/// `custom` entries are consulted before the built-in table.
pub fn language_for_path(path: &Path, custom: &[Language]) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    custom
        .iter()
        .chain(builtin_languages())
        .find(|lang| lang.matches(ext))
        .map(|lang| lang.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_matches() {
        let lang = Language::new("python").with_identifiers(&["py"]);
        assert!(lang.matches("python"));
        assert!(lang.matches("py"));
        assert!(!lang.matches("rs"));
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(
            language_for_path(Path::new("src/model.py"), &[]),
            Some("python".to_string())
        );
        assert_eq!(
            language_for_path(Path::new("lib.rs"), &[]),
            Some("rust".to_string())
        );
        assert_eq!(language_for_path(Path::new("notes"), &[]), None);
        assert_eq!(language_for_path(Path::new("data.xyz"), &[]), None);
    }

    #[test]
    fn test_custom_language_wins() {
        let custom = vec![Language::new("python3").with_identifiers(&["py"])];
        assert_eq!(
            language_for_path(Path::new("a.py"), &custom),
            Some("python3".to_string())
        );
    }
}
