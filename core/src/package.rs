use serde::{Deserialize, Serialize};

use crate::engine::TypeListPolicy;
use crate::usage::UsageEntry;

/// Version of the usage document contract (semver).
pub const USAGE_CONTRACT_VERSION: &str = "1.0.0";

/// A named usage schema, as stored in a file.
///
/// # Examples
///
/// ```
/// use usage_schema_core::*;
///
/// let document = UsageDocument::new("resize")
///     .with_description("Resize an image")
///     .with_argument(UsageEntry::new(NUMBER).with_count(2))
///     .with_argument(UsageEntry::new(BOOLEAN).optional());
///
/// assert_eq!(document.arguments.len(), 2);
/// assert!(validate_document(&document).is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageDocument {
    /// Command the usage belongs to.
    pub command: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type-list policy override for this command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<TypeListPolicy>,
    /// Positional entries in order.
    #[serde(default)]
    pub arguments: Vec<UsageEntry>,
}

impl UsageDocument {
    /// Creates an empty document for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: None,
            policy: None,
            arguments: Vec::new(),
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the type-list policy override.
    pub fn with_policy(mut self, policy: TypeListPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Appends a positional entry.
    pub fn with_argument(mut self, entry: UsageEntry) -> Self {
        self.arguments.push(entry);
        self
    }
}

/// Serializable bundle of usage documents for distribution.
///
/// # Examples
///
/// ```
/// use usage_schema_core::*;
///
/// let mut package = UsagePackage::new("1.0.0", "2024-01-15T10:30:00Z");
/// package.documents.push(UsageDocument::new("copy"));
/// package.documents.push(UsageDocument::new("move"));
///
/// assert_eq!(package.document_count(), 2);
/// assert!(package.find("move").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePackage {
    /// Contract version (populated from [`USAGE_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Package format version (semver string).
    pub version: String,
    /// Optional package name.
    pub name: Option<String>,
    /// Optional package description.
    pub description: Option<String>,
    /// ISO-8601 timestamp for package creation.
    pub generated_at: String,
    /// SHA-256 over the canonical JSON of `documents`.
    pub bundle_hash: Option<String>,
    /// Usage documents included in this package.
    pub documents: Vec<UsageDocument>,
}

impl UsagePackage {
    /// Creates a package with required fields.
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: Some(USAGE_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            generated_at: generated_at.into(),
            bundle_hash: None,
            documents: Vec::new(),
        }
    }

    /// Returns the number of documents in this package.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Finds a document by command name.
    pub fn find(&self, command: &str) -> Option<&UsageDocument> {
        self.documents.iter().find(|d| d.command == command)
    }
}
