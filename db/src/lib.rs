//! Loading, bundling and configuration for usage schema documents.
//!
//! This crate provides infrastructure around the `usage-schema-core` engine:
//! reading and writing usage documents as JSON or YAML, collecting them into
//! an in-memory [`UsageDatabase`], bundling them into hashed packages, and
//! loading a [`ParserConfig`] that names the sources to use.
//!
//! # Quick start
//!
//! ```no_run
//! use serde_json::json;
//! use usage_schema_db::{ParserConfig, UsageDatabase};
//!
//! // Load usage documents from a directory
//! let db = UsageDatabase::from_dir("usage/").unwrap();
//! let parsed = db.parse("resize", &[json!("800"), json!("600")]).unwrap();
//!
//! // Or let a configuration file pick the sources
//! let config = ParserConfig::load("usage-schema.yml").unwrap();
//! let db = config.open_database().unwrap();
//! ```

mod bundle;
mod config;
mod document;
mod error;
mod loader;

pub use bundle::{bundle_documents, compute_bundle_hash, verify_bundle};
pub use config::ParserConfig;
pub use document::{DocumentFormat, load_document, parse_document, save_document};
pub use error::{DatabaseError, Result};
pub use loader::{DatabaseBuilder, DatabaseSource, UsageDatabase};
