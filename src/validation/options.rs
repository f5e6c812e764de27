//! Validation options: target draft, optimizations, output format
//!
//! Options are plain data carried by every validation context. A validation
//! run is a pure function of (schema, instance, options).

use serde::{Deserialize, Serialize};

/// JSON Schema drafts the engine can validate as.
///
/// Ordered oldest to newest so draft-conditional behavior can compare
/// (`<= Draft7` selects the legacy `$ref` semantics).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Draft {
    /// draft-06
    Draft6,
    /// draft-07
    Draft7,
    /// draft 2019-09
    Draft2019_09,
    /// draft 2020-12
    #[default]
    Draft2020_12,
}

impl Draft {
    /// Returns the draft name as published.
    pub fn as_str(&self) -> &'static str {
        match self {
            Draft::Draft6 => "draft-06",
            Draft::Draft7 => "draft-07",
            Draft::Draft2019_09 => "2019-09",
            Draft::Draft2020_12 => "2020-12",
        }
    }
}

/// How the evaluation tree is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Validity boolean only
    Flag,
    /// Flat list of failing nodes
    Basic,
    /// Tree pruned to failing branches
    #[default]
    Detailed,
    /// The full context tree, annotations included
    Verbose,
}

/// Options recognized by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Draft whose rules gate keyword availability and behavior
    pub validating_as: Draft,
    /// Allow short-circuiting in `oneOf`/`anyOf`/`allOf`/`items`
    pub apply_optimizations: bool,
    /// Rendering mode for the final report
    pub output_format: OutputFormat,
    /// Starting indent for diagnostic logging
    pub log_indent_level: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validating_as: Draft::default(),
            apply_optimizations: false,
            output_format: OutputFormat::default(),
            log_indent_level: 0,
        }
    }
}

impl ValidationOptions {
    /// Options targeting a specific draft, defaults otherwise.
    pub fn for_draft(draft: Draft) -> Self {
        Self {
            validating_as: draft,
            ..Self::default()
        }
    }

    /// Enables short-circuit optimizations.
    pub fn optimized(mut self) -> Self {
        self.apply_optimizations = true;
        self
    }

    /// Selects the output format.
    pub fn with_output(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_ordering() {
        assert!(Draft::Draft6 < Draft::Draft7);
        assert!(Draft::Draft7 < Draft::Draft2019_09);
        assert!(Draft::Draft2019_09 < Draft::Draft2020_12);
    }

    #[test]
    fn test_defaults() {
        let opts = ValidationOptions::default();
        assert_eq!(opts.validating_as, Draft::Draft2020_12);
        assert!(!opts.apply_optimizations);
        assert_eq!(opts.output_format, OutputFormat::Detailed);
        assert_eq!(opts.log_indent_level, 0);
    }

    #[test]
    fn test_draft_serializes() {
        let json = serde_json::to_string(&Draft::Draft2019_09).unwrap();
        assert_eq!(json, "\"Draft2019_09\"");
    }

    #[test]
    fn test_builder_style_options() {
        let opts = ValidationOptions::for_draft(Draft::Draft7)
            .optimized()
            .with_output(OutputFormat::Basic);
        assert_eq!(opts.validating_as, Draft::Draft7);
        assert!(opts.apply_optimizations);
        assert_eq!(opts.output_format, OutputFormat::Basic);
    }
}
