//! Usage database loading with builder pattern and fallback chains.
//!
//! Provides [`UsageDatabase`] for in-memory lookup of usage documents by
//! command name and [`DatabaseBuilder`] for constructing a database from
//! multiple sources with automatic fallback.
//!
//! # Loading patterns
//!
//! ```no_run
//! use usage_schema_db::UsageDatabase;
//!
//! // Load from a directory of JSON/YAML usage files
//! let db = UsageDatabase::from_dir("usage/").unwrap();
//! assert!(db.get("resize").is_some());
//!
//! // Load from a single UsagePackage JSON bundle
//! let db = UsageDatabase::from_bundle("usage.json").unwrap();
//!
//! // Use the builder for a fallback chain
//! let db = UsageDatabase::builder()
//!     .from_dir("usage/")
//!     .from_bundle("usage.json")
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use usage_schema_core::{ArgumentParser, ParsedValue, UsageDocument, UsagePackage};

use crate::bundle::verify_bundle;
use crate::document::{DocumentFormat, load_document};
use crate::error::{DatabaseError, Result};

/// Describes where a [`UsageDatabase`] was loaded from.
///
/// File-backed sources serialize as `{kind: dir, path: ...}` or
/// `{kind: bundle, path: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum DatabaseSource {
    /// A directory of individual usage files.
    Dir(PathBuf),
    /// A single [`UsagePackage`] JSON file.
    Bundle(PathBuf),
    /// Built in memory.
    #[serde(skip)]
    Memory,
    /// A fallback chain of multiple sources.
    #[serde(skip)]
    Multiple(Vec<DatabaseSource>),
}

/// In-memory collection of usage documents with O(1) lookup by command.
///
/// The database also carries the [`ArgumentParser`] used by
/// [`parse`](Self::parse); a document's own policy overrides the parser's.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use usage_schema_core::*;
/// use usage_schema_db::UsageDatabase;
///
/// let mut db = UsageDatabase::new();
/// db.insert(UsageDocument::new("add").with_argument(UsageEntry::new(NUMBER).with_count(2)));
///
/// let parsed = db.parse("add", &[json!("1"), json!("2")]).unwrap();
/// assert_eq!(parsed[0], ParsedValue::Many(vec![json!(1), json!(2)]));
/// ```
#[derive(Debug)]
pub struct UsageDatabase {
    documents: HashMap<String, UsageDocument>,
    source: DatabaseSource,
    parser: ArgumentParser,
}

impl UsageDatabase {
    /// Creates an empty in-memory database.
    pub fn new() -> Self {
        Self::with_documents(Vec::new(), DatabaseSource::Memory)
    }

    /// Returns a new [`DatabaseBuilder`] for configuring a fallback chain.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Loads documents from a directory of `*.json`, `*.yaml` and `*.yml`
    /// files. Other files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the directory cannot be read,
    /// or the first load error of any usage file.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut documents = Vec::new();

        let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        for file_path in paths {
            if DocumentFormat::from_path(&file_path).is_none() {
                debug!(path = %file_path.display(), "Skipping non-usage file");
                continue;
            }
            documents.push(load_document(&file_path)?);
        }

        info!(path = %path.display(), count = documents.len(), "Loaded usage directory");
        Ok(Self::with_documents(
            documents,
            DatabaseSource::Dir(path.to_path_buf()),
        ))
    }

    /// Loads documents from a single [`UsagePackage`] JSON file.
    ///
    /// A package that carries a `bundle_hash` is verified first.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the file cannot be read,
    /// [`DatabaseError::JsonError`] if parsing fails, or
    /// [`DatabaseError::InvalidChecksum`] on a hash mismatch.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let package: UsagePackage = serde_json::from_reader(reader)?;
        Self::from_package(package, DatabaseSource::Bundle(path.to_path_buf()))
    }

    /// Builds a database from an already decoded package.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidChecksum`] on a hash mismatch or
    /// [`DatabaseError::InvalidDocument`] if the package fails validation.
    pub fn from_package(package: UsagePackage, source: DatabaseSource) -> Result<Self> {
        if package.bundle_hash.is_some() {
            verify_bundle(&package)?;
        }
        if let Some(err) = usage_schema_core::validate_package(&package).into_iter().next() {
            return Err(DatabaseError::InvalidDocument(err.to_string()));
        }

        info!(count = package.documents.len(), "Loaded usage bundle");
        Ok(Self::with_documents(package.documents, source))
    }

    fn with_documents(documents: Vec<UsageDocument>, source: DatabaseSource) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|d| (d.command.clone(), d))
                .collect(),
            source,
            parser: ArgumentParser::new(),
        }
    }

    /// Replaces the parser used by [`parse`](Self::parse).
    pub fn with_parser(mut self, parser: ArgumentParser) -> Self {
        self.parser = parser;
        self
    }

    /// Looks up a document by command name.
    pub fn get(&self, command: &str) -> Option<&UsageDocument> {
        self.documents.get(command)
    }

    /// Inserts a document, replacing any existing one for the same command.
    pub fn insert(&mut self, document: UsageDocument) {
        self.documents.insert(document.command.clone(), document);
    }

    /// Returns `true` if the database contains a document for `command`.
    pub fn contains(&self, command: &str) -> bool {
        self.documents.contains_key(command)
    }

    /// Returns the number of documents in the database.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the database contains no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns an iterator over command names.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(|s| s.as_str())
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DatabaseSource {
        &self.source
    }

    /// Returns the parser configured for `document`.
    pub fn parser_for(&self, document: &UsageDocument) -> ArgumentParser {
        match document.policy {
            Some(policy) => self.parser.clone().with_policy(policy),
            None => self.parser.clone(),
        }
    }

    /// Parses `args` against the usage registered for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnknownCommand`] if no document matches, or
    /// [`DatabaseError::Parser`] if the arguments do not fit the usage.
    pub fn parse(&self, command: &str, args: &[Value]) -> Result<Vec<ParsedValue>> {
        let document = self
            .get(command)
            .ok_or_else(|| DatabaseError::UnknownCommand(command.to_string()))?;
        let parsed = self
            .parser_for(document)
            .parse(args, &document.arguments)?;
        Ok(parsed)
    }
}

impl Default for UsageDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a [`UsageDatabase`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`DatabaseError::NoSourcesAvailable`] is returned.
pub struct DatabaseBuilder {
    sources: Vec<DatabaseSource>,
}

impl DatabaseBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of usage files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DatabaseSource::Dir(path.into()));
        self
    }

    /// Adds a [`UsagePackage`] bundle file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DatabaseSource::Bundle(path.into()));
        self
    }

    /// Adds an already described source.
    pub fn source(mut self, source: DatabaseSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Attempts to load documents from configured sources in order.
    pub fn build(self) -> Result<UsageDatabase> {
        if self.sources.is_empty() {
            return Err(DatabaseError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                DatabaseSource::Dir(path) => UsageDatabase::from_dir(path),
                DatabaseSource::Bundle(path) => UsageDatabase::from_bundle(path),
                DatabaseSource::Memory | DatabaseSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut db) => {
                    db.source = DatabaseSource::Multiple(all_sources);
                    return Ok(db);
                }
                Err(err) => debug!(source = ?source, error = %err, "Usage source failed"),
            }
        }

        Err(DatabaseError::NoSourcesAvailable)
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
