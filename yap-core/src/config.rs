#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, DEFAULT_PROVENANCE_CAP};

/// Elaboration switches, usually read from the `[elaboration]` table of a
/// `yap.toml` manifest.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ElabConfig {
    /// Provenance frames shown when rendering an error.
    pub provenance_cap: usize,

    /// Require the body of a `reset` to have the handler's answer type.
    pub strict_reset_answer: bool,

    /// Abstract unsolved metas of top-level `let` bindings.
    pub generalize: bool,
}

impl Default for ElabConfig {
    fn default() -> Self {
        Self {
            provenance_cap: DEFAULT_PROVENANCE_CAP,
            strict_reset_answer: false,
            generalize: true,
        }
    }
}

impl ElabConfig {
    /// Accepts either the bare table or a manifest with an `[elaboration]`
    /// section.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(src)?;
        match table.remove("elaboration") {
            Some(section) => Ok(section.try_into()?),
            None => Ok(toml::from_str(src)?),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("loading elaboration config from {}", path.display());
        let src = fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ElabConfig::from_toml_str("").unwrap();
        assert_eq!(config, ElabConfig::default());
        assert_eq!(config.provenance_cap, 10);
        assert!(!config.strict_reset_answer);
        assert!(config.generalize);
    }

    #[test]
    fn bare_table() {
        let config = ElabConfig::from_toml_str("strict_reset_answer = true\nprovenance_cap = 3\n").unwrap();
        assert!(config.strict_reset_answer);
        assert_eq!(config.provenance_cap, 3);
        assert!(config.generalize);
    }

    #[test]
    fn manifest_section() {
        let src = r#"
[project]
name = "demo"

[elaboration]
generalize = false
"#;
        let config = ElabConfig::from_toml_str(src).unwrap();
        assert!(!config.generalize);
        assert_eq!(config.provenance_cap, 10);
    }

    #[test]
    fn bad_types_are_parse_errors() {
        let err = ElabConfig::from_toml_str("provenance_cap = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = ElabConfig::load("/definitely/not/here/yap.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
