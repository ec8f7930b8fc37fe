//! Schema-driven validation and transformation of positional arguments.
//!
//! This crate turns an ordered list of raw values into a parallel list of
//! validated, type-transformed values according to a declarative usage
//! schema:
//!
//! - [`UsageEntry`] — one positional slot: type(s), requiredness,
//!   cardinality ([`Count`]) and extra options.
//! - [`ParserType`] — the validate+transform capability. [`STRING`],
//!   [`NUMBER`] and [`BOOLEAN`] are built in; [`CustomType`] builds one from
//!   closures.
//! - [`ArgumentParser`] — the engine. Resolves named types through a
//!   [`TypeRegistry`] and picks type-list results by [`TypeListPolicy`].
//! - [`UsageDocument`] / [`UsagePackage`] — serializable, named schemas and
//!   bundles of them.
//!
//! Failures are [`ParserError`]s carrying a stable identifier and, for
//! argument errors, the offending value, index and type.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use usage_schema_core::*;
//!
//! let usage = vec![
//!     UsageEntry::new(NUMBER),
//!     UsageEntry::new(STRING).optional(),
//! ];
//!
//! let parsed = parse(&[json!("42")], &usage).unwrap();
//! assert_eq!(parsed[0].as_single(), Some(&json!(42)));
//! assert!(parsed[1].is_absent());
//!
//! let err = parse(&[json!("forty-two")], &usage).unwrap_err();
//! assert_eq!(err.id(), "NO_REQUIRED_ARGUMENT");
//! ```

mod engine;
mod error;
mod package;
mod parser_type;
mod registry;
mod usage;
mod validate;

pub use engine::{ArgumentParser, TypeListPolicy, parse};
pub use error::{ArgumentError, ArgumentErrorKind, MessageError, ParserError};
pub use package::{USAGE_CONTRACT_VERSION, UsageDocument, UsagePackage};
pub use parser_type::{
    BOOLEAN, BooleanType, CustomType, NUMBER, NumberType, Options, ParserType, STRING,
    StringType, is_truthy, string_form,
};
pub use registry::TypeRegistry;
pub use usage::{Count, ParsedValue, TypeRef, TypeSpec, UsageEntry};
pub use validate::{ValidationError, validate_document, validate_package, validate_usage};
