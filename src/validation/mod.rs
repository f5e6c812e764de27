//! Validation engine: context, driver, options and output
//!
//! # Design principles
//!
//! - Single-threaded and synchronous per run; no I/O on the hot path.
//! - Deterministic: keyword order is priority then name, sub-schema order is
//!   source order.
//! - Failures are data, not errors; the result is always a full tree.

mod context;
mod driver;
mod options;
mod output;

pub use context::{AnnotationValue, ValidationContext};
pub use driver::Validator;
pub use options::{Draft, OutputFormat, ValidationOptions};
pub use output::{Evaluation, EvaluationNode};

pub(crate) use driver::Driver;
