//! verdict - A strict, deterministic JSON Schema validator
//!
//! Validates JSON instances against Draft 6, Draft 7, 2019-09 and 2020-12
//! schemas, covering the core, applicator, validation and format-annotation
//! vocabularies, and produces a structured evaluation tree with per-location
//! errors and annotations.
//!
//! # Quick start
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json!({"type": "string", "minLength": 2, "maxLength": 4});
//! assert!(verdict::is_valid(&schema, &json!("ab")).unwrap());
//! assert!(!verdict::is_valid(&schema, &json!("a")).unwrap());
//! ```
//!
//! For multi-document setups, register each schema in a
//! [`SchemaRegistry`] and drive a [`Validator`] over it; `$ref` resolves
//! through the registry without any network access.

pub mod keywords;
pub mod observability;
pub mod pointer;
pub mod schema;
pub mod validation;
pub mod value;

use serde_json::Value;

pub use keywords::{KeywordDescriptor, KeywordRegistry};
pub use pointer::JsonPointer;
pub use schema::{SchemaError, SchemaLoader, SchemaRegistry, SchemaResult};
pub use validation::{Draft, Evaluation, EvaluationNode, OutputFormat, ValidationOptions, Validator};

/// URI that one-shot schemas register under.
pub const INLINE_SCHEMA_URI: &str = "https://schemas.verdict.invalid/inline.schema.json";

/// One-shot validation with explicit options. Builds a private registry,
/// registers the schema under [`INLINE_SCHEMA_URI`] and evaluates.
pub fn validate_with(
    schema: &Value,
    instance: &Value,
    options: ValidationOptions,
) -> SchemaResult<Evaluation> {
    let keywords = KeywordRegistry::global_read();
    let mut registry = SchemaRegistry::new();
    let root = registry.register(INLINE_SCHEMA_URI, schema, &keywords)?;
    Ok(Validator::with_options(&registry, options).validate(root, INLINE_SCHEMA_URI, instance))
}

/// One-shot validation with default options (draft 2020-12, detailed
/// output, no short-circuiting).
pub fn validate(schema: &Value, instance: &Value) -> SchemaResult<Evaluation> {
    validate_with(schema, instance, ValidationOptions::default())
}

/// One-shot validity check.
pub fn is_valid(schema: &Value, instance: &Value) -> SchemaResult<bool> {
    validate(schema, instance).map(|report| report.valid())
}
