//! Reading and writing single usage documents.
//!
//! Documents are stored as JSON (`*.json`) or YAML (`*.yaml`, `*.yml`); the
//! format is chosen from the file extension. Every loaded document is
//! validated before it is returned.
//!
//! # Example YAML
//!
//! ```yaml
//! command: resize
//! description: Resize an image
//! arguments:
//!   - type: string
//!     explicit: true
//!   - type: number
//!     count: 2
//!   - type: boolean
//!     required: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;
use usage_schema_core::{UsageDocument, validate_document};

use crate::error::{DatabaseError, Result};

/// On-disk encoding of a usage document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `*.json`
    Json,
    /// `*.yaml` / `*.yml`
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a path's extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use usage_schema_db::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("cp.yml"), Some(DocumentFormat::Yaml));
    /// assert_eq!(DocumentFormat::from_path("cp.json"), Some(DocumentFormat::Json));
    /// assert_eq!(DocumentFormat::from_path("README.md"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Decodes and validates a document from text.
///
/// # Errors
///
/// Returns [`DatabaseError::JsonError`] / [`DatabaseError::YamlError`] on
/// malformed input and [`DatabaseError::InvalidDocument`] when the usage
/// breaks the requiredness rule.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<UsageDocument> {
    let document: UsageDocument = match format {
        DocumentFormat::Json => serde_json::from_str(text)?,
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
    };
    check_document(&document)?;
    Ok(document)
}

/// Loads and validates a document file.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidDocument`] for unsupported extensions or
/// invalid usage, [`DatabaseError::IoError`] if the file cannot be read, or
/// a serialization error if decoding fails.
pub fn load_document(path: impl AsRef<Path>) -> Result<UsageDocument> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        DatabaseError::InvalidDocument(format!("unsupported file type: {}", path.display()))
    })?;

    let reader = BufReader::new(std::fs::File::open(path)?);
    let document: UsageDocument = match format {
        DocumentFormat::Json => serde_json::from_reader(reader)?,
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    check_document(&document)?;

    debug!(path = %path.display(), command = %document.command, "Loaded usage document");
    Ok(document)
}

/// Writes a document, choosing the format from the extension.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidDocument`] for unsupported extensions,
/// [`DatabaseError::IoError`] if the file cannot be written, or a
/// serialization error.
pub fn save_document(document: &UsageDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        DatabaseError::InvalidDocument(format!("unsupported file type: {}", path.display()))
    })?;

    let writer = BufWriter::new(std::fs::File::create(path)?);
    match format {
        DocumentFormat::Json => serde_json::to_writer_pretty(writer, document)?,
        DocumentFormat::Yaml => serde_yaml::to_writer(writer, document)?,
    }
    Ok(())
}

fn check_document(document: &UsageDocument) -> Result<()> {
    match validate_document(document).into_iter().next() {
        Some(err) => Err(DatabaseError::InvalidDocument(err.to_string())),
        None => Ok(()),
    }
}
