//! Bundling usage documents into hashed packages.
//!
//! The `bundle_hash` of a [`UsagePackage`] is the SHA-256 hex digest of the
//! canonical JSON encoding of its documents, sorted by command name. Object
//! keys are sorted before encoding, so the digest does not depend on how
//! `serde_json` orders maps. Loaders recompute it with [`verify_bundle`]
//! before trusting a package.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use usage_schema_core::{UsageDocument, UsagePackage, validate_package};

use crate::error::{DatabaseError, Result};

/// Computes the SHA-256 hex digest over `documents`.
///
/// # Errors
///
/// Returns [`DatabaseError::JsonError`] if the documents cannot be encoded.
pub fn compute_bundle_hash(documents: &[UsageDocument]) -> Result<String> {
    let canonical = canonicalize(serde_json::to_value(documents)?);
    let bytes = serde_json::to_vec(&canonical)?;
    let hash = Sha256::digest(&bytes);
    Ok(format!("{:x}", hash))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        other => other,
    }
}

/// Builds a validated, hashed package from `documents`.
///
/// Documents are sorted by command name so the hash does not depend on
/// input order.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidDocument`] if the package fails
/// validation (e.g., duplicate commands).
///
/// # Examples
///
/// ```
/// use usage_schema_core::{NUMBER, UsageDocument, UsageEntry};
/// use usage_schema_db::{bundle_documents, verify_bundle};
///
/// let documents = vec![
///     UsageDocument::new("move").with_argument(UsageEntry::new(NUMBER)),
///     UsageDocument::new("copy"),
/// ];
/// let package = bundle_documents(documents, "1.0.0", "2024-01-01T00:00:00Z").unwrap();
///
/// assert_eq!(package.documents[0].command, "copy");
/// assert!(package.bundle_hash.is_some());
/// assert!(verify_bundle(&package).is_ok());
/// ```
pub fn bundle_documents(
    mut documents: Vec<UsageDocument>,
    version: &str,
    generated_at: &str,
) -> Result<UsagePackage> {
    documents.sort_by(|a, b| a.command.cmp(&b.command));

    let mut package = UsagePackage::new(version, generated_at);
    package.documents = documents;

    if let Some(first) = validate_package(&package).first() {
        return Err(DatabaseError::InvalidDocument(format!(
            "usage package validation failed: {first}"
        )));
    }

    package.bundle_hash = Some(compute_bundle_hash(&package.documents)?);
    Ok(package)
}

/// Recomputes a package's hash and compares it to the stored one.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidChecksum`] if the package has no hash or
/// the hashes differ.
pub fn verify_bundle(package: &UsagePackage) -> Result<()> {
    let Some(expected) = package.bundle_hash.as_deref() else {
        return Err(DatabaseError::InvalidChecksum(
            "package has no bundle hash".to_string(),
        ));
    };

    let actual = compute_bundle_hash(&package.documents)?;
    if actual != expected {
        return Err(DatabaseError::InvalidChecksum(format!(
            "expected {expected}, found {actual}"
        )));
    }
    Ok(())
}
