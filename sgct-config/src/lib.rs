//! # sgct-config
//!
//! Strictly typed model of the current SGCT cluster configuration format and
//! the JSON Schema derived from it.
//!
//! ## Features
//!
//! - Typed structures for nodes, windows, viewports and every projection kind
//! - `Projection` modeled as an internally tagged enum (`type` discriminator)
//! - Schema generation with [schemars](https://docs.rs/schemars)
//! - Best-effort validation reports with one diagnostic per violation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sgct_config::SchemaValidator;
//!
//! let validator = SchemaValidator::new().unwrap();
//! let doc = serde_json::json!({ "version": 1, "nodes": [] });
//! let report = validator.validate(&doc);
//! println!("{report}");
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Configuration types
//! - [`validate`] - Schema generation and validation

#[macro_use]
extern crate log;

/// Configuration types of the current file format.
pub mod model;

/// JSON Schema generation and validation.
pub mod validate;

pub use model::*;
pub use validate::{SchemaError, SchemaValidator, ValidationReport, schema};
