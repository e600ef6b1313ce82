//! # sgct-migrate
//!
//! Upgrades SGCT cluster configurations to the current JSON format.
//!
//! ## Features
//!
//! - **Version migration**: legacy XML (and legacy-shaped JSON) files are
//!   rewritten field by field through declarative rule tables
//! - **MPCDI import**: multi-projector calibration descriptors become a fresh
//!   configuration with one node per projector buffer
//! - **Validation**: every result is checked against the schema derived from
//!   [`sgct_config::Config`], either best-effort or strictly
//!
//! ## Modules
//!
//! - [`tree`] - Untyped document tree produced by the parsers
//! - [`xml`] - XML text to tree parsing
//! - [`coerce`] - Field-level coercion primitives
//! - [`rules`] - Rule tables and the walker applying them
//! - [`version`] - Legacy to current migration
//! - [`mpcdi`] - MPCDI descriptor conversion
//! - [`options`] - Conversion options
//! - [`convert`] - Conversion entry points
//!
//! ## Example
//!
//! ```rust,no_run
//! let legacy = std::fs::read_to_string("single.xml").unwrap();
//! let json = sgct_migrate::migrate_version(&legacy, "xml").unwrap();
//! println!("{json}");
//! ```

#[macro_use]
extern crate log;

/// Field-level coercion primitives.
pub mod coerce;

/// Conversion entry points.
pub mod convert;

/// Error types.
pub mod error;

/// MPCDI descriptor conversion.
pub mod mpcdi;

/// Conversion options.
pub mod options;

/// Declarative rule tables.
pub mod rules;

/// Untyped document tree.
pub mod tree;

/// Legacy configuration migration.
pub mod version;

/// XML parsing.
pub mod xml;

pub use convert::{Conversion, Converter, migrate_foreign, migrate_version};
pub use error::{MigrateError, Result, ShapeError, ShapeErrorKind};
pub use options::{ConvertOptions, ForeignDefaults, ValidationPolicy};
pub use tree::Tree;
