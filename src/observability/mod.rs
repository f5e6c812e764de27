//! Diagnostic logging for the validation engine
//!
//! Validation itself never logs on the hot path unless the `VERDICT_LOG`
//! threshold admits TRACE; registry and loader operations log at INFO/WARN.

mod logger;

pub use logger::{Logger, Severity};
