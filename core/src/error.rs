//! Error taxonomy for usage parsing.
//!
//! Every failure raised by the engine is a [`ParserError`]. Errors that have
//! no positional context (a malformed schema shape) are [`MessageError`]s;
//! everything tied to a schema entry or an input value is an
//! [`ArgumentError`] with a stable [`ArgumentErrorKind`] identifier.
//!
//! # Examples
//!
//! ```
//! use usage_schema_core::{ArgumentError, ArgumentErrorKind, ParserError};
//!
//! let err: ParserError = ArgumentError::new(ArgumentErrorKind::NoRequiredArgument)
//!     .with_index(2)
//!     .into();
//! assert_eq!(err.id(), "NO_REQUIRED_ARGUMENT");
//! assert_eq!(err.index(), Some(2));
//! ```

use serde_json::Value;
use thiserror::Error;

/// Stable identifiers for argument-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentErrorKind {
    /// More than one entry is declared with `required: false`.
    NonRequiredArgumentMustBeOne,
    /// The single optional entry is not the last entry of the schema.
    NonRequiredArgumentAtEnd,
    /// A declared type does not resolve to a parser type.
    TypeIsNotParserType,
    /// An element inside a counted slice failed validation.
    RequiredArgumentUndefined,
    /// A counted slice holds fewer values than its declared count.
    ArgumentsCountMismatch,
    /// A required entry produced no valid result.
    NoRequiredArgument,
}

impl ArgumentErrorKind {
    /// Returns the stable identifier string for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use usage_schema_core::ArgumentErrorKind;
    ///
    /// assert_eq!(
    ///     ArgumentErrorKind::ArgumentsCountMismatch.id(),
    ///     "ARGUMENTS_COUNT_IS_NOT_EQUAL_TYPE_COUNT"
    /// );
    /// ```
    pub fn id(self) -> &'static str {
        match self {
            Self::NonRequiredArgumentMustBeOne => "NON_REQUIRED_ARGUMENT_MUST_BE_ONE",
            Self::NonRequiredArgumentAtEnd => "NON_REQUIRED_ARGUMENT_AT_THE_END",
            Self::TypeIsNotParserType => "TYPE_IS_NOT_PARSER_TYPE",
            Self::RequiredArgumentUndefined => "REQUIRED_ARGUMENT_UNDEFINED",
            Self::ArgumentsCountMismatch => "ARGUMENTS_COUNT_IS_NOT_EQUAL_TYPE_COUNT",
            Self::NoRequiredArgument => "NO_REQUIRED_ARGUMENT",
        }
    }

    /// Returns the human-readable message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::NonRequiredArgumentMustBeOne => "non-required argument must be only one",
            Self::NonRequiredArgumentAtEnd => {
                "non-required argument must be at the end of the arguments array"
            }
            Self::TypeIsNotParserType => "type does not resolve to a registered parser type",
            Self::RequiredArgumentUndefined => "required argument is undefined",
            Self::ArgumentsCountMismatch => "passed arguments count is not equal to type count",
            Self::NoRequiredArgument => "required argument is missing or invalid",
        }
    }
}

/// An argument-level failure with positional context.
///
/// `value` is the raw input (scalar or slice) that caused the failure,
/// `index` the schema entry or absolute input position, and `type_name` the
/// declared type. Each context field is present only where it applies.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "{message} ({id}{at})",
    message = .kind.message(),
    id = .kind.id(),
    at = .index.map(|i| format!(" at index {i}")).unwrap_or_default()
)]
pub struct ArgumentError {
    /// Which rule was violated.
    pub kind: ArgumentErrorKind,
    /// Offending raw value, if any.
    pub value: Option<Value>,
    /// Entry index or absolute input index.
    pub index: Option<usize>,
    /// Declared type name(s).
    pub type_name: Option<String>,
}

impl ArgumentError {
    /// Creates an error of `kind` with no context.
    pub fn new(kind: ArgumentErrorKind) -> Self {
        Self {
            kind,
            value: None,
            index: None,
            type_name: None,
        }
    }

    /// Attaches the offending raw value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches the entry or input index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches the declared type name.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// A failure without positional context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The supplied schema is not array-shaped.
    #[error("parser arguments must be an array")]
    SchemaNotSequence,
    /// A schema entry could not be decoded into a usage entry.
    #[error("invalid usage entry at index {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

impl MessageError {
    /// Returns the stable identifier string for this error.
    pub fn id(&self) -> &'static str {
        match self {
            Self::SchemaNotSequence => "SCHEMA_NOT_SEQUENCE",
            Self::InvalidEntry { .. } => "INVALID_ENTRY",
        }
    }
}

/// Any failure raised while checking a schema or parsing arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    /// Schema shape problem.
    #[error(transparent)]
    Message(#[from] MessageError),
    /// Schema rule or argument problem.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

impl ParserError {
    /// Returns the stable identifier of the underlying error.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Message(err) => err.id(),
            Self::Argument(err) => err.kind.id(),
        }
    }

    /// Returns the argument error kind, if this is an argument error.
    pub fn kind(&self) -> Option<ArgumentErrorKind> {
        match self {
            Self::Argument(err) => Some(err.kind),
            Self::Message(_) => None,
        }
    }

    /// Returns the index context, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Argument(err) => err.index,
            Self::Message(MessageError::InvalidEntry { index, .. }) => Some(*index),
            Self::Message(MessageError::SchemaNotSequence) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_display_includes_id_and_index() {
        let err = ArgumentError::new(ArgumentErrorKind::NonRequiredArgumentAtEnd).with_index(0);
        assert_eq!(
            err.to_string(),
            "non-required argument must be at the end of the arguments array \
             (NON_REQUIRED_ARGUMENT_AT_THE_END at index 0)"
        );
    }

    #[test]
    fn test_argument_error_display_without_index() {
        let err = ArgumentError::new(ArgumentErrorKind::TypeIsNotParserType);
        assert_eq!(
            err.to_string(),
            "type does not resolve to a registered parser type (TYPE_IS_NOT_PARSER_TYPE)"
        );
    }

    #[test]
    fn test_parser_error_accessors() {
        let err: ParserError = MessageError::SchemaNotSequence.into();
        assert_eq!(err.id(), "SCHEMA_NOT_SEQUENCE");
        assert_eq!(err.kind(), None);
        assert_eq!(err.index(), None);

        let err: ParserError = ArgumentError::new(ArgumentErrorKind::ArgumentsCountMismatch)
            .with_index(3)
            .with_type("number")
            .into();
        assert_eq!(err.kind(), Some(ArgumentErrorKind::ArgumentsCountMismatch));
        assert_eq!(err.index(), Some(3));
    }
}
