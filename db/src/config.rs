//! Parser configuration files.
//!
//! Defines the YAML-serializable configuration that names where usage
//! documents come from and which type-list policy applies by default.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! policy: first_match
//! sources:
//!   - kind: dir
//!     path: usage/
//!   - kind: bundle
//!     path: dist/usage.json
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use usage_schema_core::{ArgumentParser, TypeListPolicy};

use crate::error::Result;
use crate::loader::{DatabaseSource, UsageDatabase};

/// Top-level parser configuration.
///
/// Relative source paths are resolved against the directory containing the
/// configuration file when it is [`load`](Self::load)ed.
///
/// # Examples
///
/// ```
/// # let yaml = r#"
/// # version: "1.0"
/// # policy: last_attempted
/// # sources:
/// #   - kind: dir
/// #     path: /opt/usage
/// # "#;
/// # let config: usage_schema_db::ParserConfig = serde_yaml::from_str(yaml).unwrap();
/// use usage_schema_core::TypeListPolicy;
///
/// assert_eq!(config.policy, TypeListPolicy::LastAttempted);
/// assert_eq!(config.sources.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Default type-list policy for documents without their own.
    #[serde(default)]
    pub policy: TypeListPolicy,
    /// Usage sources, tried in order.
    #[serde(default)]
    pub sources: Vec<DatabaseSource>,
}

impl ParserConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DatabaseError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Rewrites relative source paths to be relative to `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for source in &mut self.sources {
            if let DatabaseSource::Dir(path) | DatabaseSource::Bundle(path) = source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Opens the configured sources as a database.
    ///
    /// The first source that loads wins. The database parses with the
    /// configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`NoSourcesAvailable`](crate::DatabaseError::NoSourcesAvailable)
    /// if no source is configured or none loads.
    pub fn open_database(&self) -> Result<UsageDatabase> {
        let builder = self
            .sources
            .iter()
            .cloned()
            .fold(UsageDatabase::builder(), |builder, source| builder.source(source));
        let db = builder.build()?;
        Ok(db.with_parser(ArgumentParser::new().with_policy(self.policy)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
policy: last_attempted
sources:
  - kind: dir
    path: usage
  - kind: bundle
    path: /opt/usage.json
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: ParserConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.policy, TypeListPolicy::LastAttempted);
        assert_eq!(
            config.sources,
            vec![
                DatabaseSource::Dir(PathBuf::from("usage")),
                DatabaseSource::Bundle(PathBuf::from("/opt/usage.json")),
            ]
        );
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: ParserConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert_eq!(config.policy, TypeListPolicy::FirstMatch);
        assert!(config.sources.is_empty());
        assert!(config.open_database().is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut config: ParserConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.resolve_relative_to(Path::new("/etc/app"));
        assert_eq!(
            config.sources[0],
            DatabaseSource::Dir(PathBuf::from("/etc/app/usage"))
        );
        assert_eq!(
            config.sources[1],
            DatabaseSource::Bundle(PathBuf::from("/opt/usage.json"))
        );
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = std::env::temp_dir().join("us_db_test_config_rt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");

        let original: ParserConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = ParserConfig::load(&path).unwrap();
        assert_eq!(loaded.version, original.version);
        assert_eq!(loaded.policy, original.policy);
        assert_eq!(loaded.sources[0], DatabaseSource::Dir(dir.join("usage")));

        std::fs::remove_dir_all(&dir).ok();
    }
}
