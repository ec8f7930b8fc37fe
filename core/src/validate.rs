//! Usage schema and package validation.
//!
//! [`validate_usage`] enforces the requiredness ordering rule before any
//! input is consumed: at most one entry may be optional, and it must be the
//! last one. [`validate_package`] additionally checks package metadata and
//! command names.
//!
//! # Examples
//!
//! ```
//! use usage_schema_core::*;
//!
//! let usage = vec![UsageEntry::new(NUMBER), UsageEntry::new(STRING).optional()];
//! assert!(validate_usage(&usage).is_ok());
//!
//! // Invalid: optional entry before a required one
//! let bad = vec![UsageEntry::new(STRING).optional(), UsageEntry::new(NUMBER)];
//! let err = validate_usage(&bad).unwrap_err();
//! assert_eq!(err.kind, ArgumentErrorKind::NonRequiredArgumentAtEnd);
//! assert_eq!(err.index, Some(0));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::error::{ArgumentError, ArgumentErrorKind};
use crate::package::{UsageDocument, UsagePackage};
use crate::usage::UsageEntry;

/// Document/package validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Package version string is empty.
    #[error("package version cannot be empty")]
    EmptyPackageVersion,
    /// Command name is empty or whitespace-only.
    #[error("usage command cannot be empty")]
    EmptyCommandName,
    /// Two documents in the same package share a command name.
    #[error("duplicate command in package: {0}")]
    DuplicateCommand(String),
    /// A document's usage breaks the requiredness rule.
    #[error("invalid usage for {command}: {source}")]
    InvalidUsage {
        command: String,
        source: ArgumentError,
    },
}

/// Checks the requiredness ordering rule of a usage schema.
///
/// Fails with [`NonRequiredArgumentMustBeOne`] carrying the index of the
/// last optional entry when more than one entry is optional, or with
/// [`NonRequiredArgumentAtEnd`] carrying the optional entry's index when it
/// is not last.
///
/// [`NonRequiredArgumentMustBeOne`]: ArgumentErrorKind::NonRequiredArgumentMustBeOne
/// [`NonRequiredArgumentAtEnd`]: ArgumentErrorKind::NonRequiredArgumentAtEnd
pub fn validate_usage(usage: &[UsageEntry]) -> Result<(), ArgumentError> {
    let optional: Vec<usize> = usage
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.required)
        .map(|(index, _)| index)
        .collect();

    let Some(&last) = optional.last() else {
        return Ok(());
    };

    if optional.len() > 1 {
        return Err(
            ArgumentError::new(ArgumentErrorKind::NonRequiredArgumentMustBeOne).with_index(last),
        );
    }

    if last != usage.len() - 1 {
        return Err(ArgumentError::new(ArgumentErrorKind::NonRequiredArgumentAtEnd).with_index(last));
    }

    Ok(())
}

/// Validates a single usage document.
pub fn validate_document(document: &UsageDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if document.command.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    if let Err(source) = validate_usage(&document.arguments) {
        errors.push(ValidationError::InvalidUsage {
            command: document.command.clone(),
            source,
        });
    }

    errors
}

/// Validates a full usage package.
///
/// Checks for an empty version string, duplicate command names, and
/// validates each document individually. Stops at the first problem.
///
/// # Examples
///
/// ```
/// use usage_schema_core::*;
///
/// let mut package = UsagePackage::new("1.0.0", "2024-01-01T00:00:00Z");
/// package.documents.push(UsageDocument::new("copy"));
/// assert!(validate_package(&package).is_empty());
///
/// package.documents.push(UsageDocument::new("copy"));
/// let errors = validate_package(&package);
/// assert!(matches!(errors[0], ValidationError::DuplicateCommand(_)));
/// ```
pub fn validate_package(package: &UsagePackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package.version.trim().is_empty() {
        errors.push(ValidationError::EmptyPackageVersion);
        return errors;
    }

    let mut seen_commands: HashSet<&str> = HashSet::new();
    for document in &package.documents {
        let command = document.command.as_str();
        if !seen_commands.insert(command) {
            errors.push(ValidationError::DuplicateCommand(command.to_string()));
            return errors;
        }
        errors.extend(validate_document(document));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BOOLEAN, NUMBER, STRING};

    #[test]
    fn test_validate_usage_accepts_all_required() {
        let usage = vec![UsageEntry::new(NUMBER), UsageEntry::new(STRING)];
        assert!(validate_usage(&usage).is_ok());
        assert!(validate_usage(&[]).is_ok());
    }

    #[test]
    fn test_validate_usage_rejects_two_optional_entries() {
        let usage = vec![
            UsageEntry::new(STRING).optional(),
            UsageEntry::new(NUMBER),
            UsageEntry::new(BOOLEAN).optional(),
        ];
        let err = validate_usage(&usage).unwrap_err();
        assert_eq!(err.kind, ArgumentErrorKind::NonRequiredArgumentMustBeOne);
        assert_eq!(err.index, Some(2));
    }

    #[test]
    fn test_validate_usage_rejects_optional_in_the_middle() {
        let usage = vec![
            UsageEntry::new(NUMBER),
            UsageEntry::new(STRING).optional(),
            UsageEntry::new(BOOLEAN),
        ];
        let err = validate_usage(&usage).unwrap_err();
        assert_eq!(err.kind, ArgumentErrorKind::NonRequiredArgumentAtEnd);
        assert_eq!(err.index, Some(1));
    }

    #[test]
    fn test_validate_document_reports_command() {
        let document = UsageDocument::new("cp")
            .with_argument(UsageEntry::new(STRING).optional())
            .with_argument(UsageEntry::new(STRING));

        let errors = validate_document(&document);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("invalid usage for cp:"));
    }

    #[test]
    fn test_validate_package_rejects_empty_version() {
        let package = UsagePackage::new(" ", "2026-02-07T00:00:00Z");
        assert_eq!(
            validate_package(&package),
            vec![ValidationError::EmptyPackageVersion]
        );
    }

    #[test]
    fn test_validate_package_rejects_empty_command() {
        let mut package = UsagePackage::new("1.0.0", "2026-02-07T00:00:00Z");
        package.documents.push(UsageDocument::new(""));
        assert_eq!(
            validate_package(&package),
            vec![ValidationError::EmptyCommandName]
        );
    }
}
