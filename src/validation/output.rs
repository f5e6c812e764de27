//! Evaluation output tree and its rendering modes
//!
//! The node tree mirrors the context tree one-to-one. Rendering prunes or
//! flattens it: `Flag` keeps the validity bit, `Basic` lists failing nodes,
//! `Detailed` keeps the tree but only failing branches, `Verbose` keeps
//! everything including annotations.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::context::ValidationContext;
use super::options::OutputFormat;

/// One node of the evaluation result.
#[derive(Debug, Clone)]
pub struct EvaluationNode {
    /// Outcome at this node
    pub valid: bool,
    /// JSON Pointer into the instance
    pub instance_location: String,
    /// JSON Pointer into the schema as written, growing through references
    pub keyword_location: String,
    /// Base URI plus pointer within the referenced document
    pub absolute_keyword_location: String,
    /// Failure message, when invalid
    pub error: Option<String>,
    /// Annotations produced at this node, rendered to JSON
    pub annotations: BTreeMap<String, Value>,
    /// Child nodes in evaluation order
    pub nested: Vec<EvaluationNode>,
}

impl EvaluationNode {
    pub(crate) fn from_context(ctx: &ValidationContext<'_>) -> Self {
        Self {
            valid: ctx.is_valid,
            instance_location: ctx.instance_location.to_string(),
            keyword_location: ctx.schema_location.to_string(),
            absolute_keyword_location: format!(
                "{}#{}",
                ctx.current_uri, ctx.absolute_location
            ),
            error: ctx.message.clone(),
            annotations: ctx
                .own_annotations()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
            nested: ctx.nested.iter().map(Self::from_context).collect(),
        }
    }

    /// Depth-first traversal, this node included.
    pub fn flatten(&self) -> Vec<&EvaluationNode> {
        let mut out = vec![self];
        for child in &self.nested {
            out.extend(child.flatten());
        }
        out
    }

    /// Every invalid node carrying a message, depth-first.
    pub fn failures(&self) -> Vec<&EvaluationNode> {
        self.flatten()
            .into_iter()
            .filter(|node| !node.valid && node.error.is_some())
            .collect()
    }

    fn header(&self, with_annotations: bool) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("valid".to_string(), Value::Bool(self.valid));
        out.insert(
            "instanceLocation".to_string(),
            Value::String(self.instance_location.clone()),
        );
        out.insert(
            "keywordLocation".to_string(),
            Value::String(self.keyword_location.clone()),
        );
        out.insert(
            "absoluteKeywordLocation".to_string(),
            Value::String(self.absolute_keyword_location.clone()),
        );
        if let Some(error) = &self.error {
            out.insert("error".to_string(), Value::String(error.clone()));
        }
        if with_annotations && !self.annotations.is_empty() {
            out.insert(
                "annotations".to_string(),
                Value::Object(
                    self.annotations
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            );
        }
        out
    }

    fn verbose(&self) -> Value {
        let mut out = self.header(true);
        if !self.nested.is_empty() {
            out.insert(
                "nested".to_string(),
                Value::Array(self.nested.iter().map(Self::verbose).collect()),
            );
        }
        Value::Object(out)
    }

    fn detailed(&self) -> Value {
        let mut out = self.header(false);
        let failing: Vec<Value> = self
            .nested
            .iter()
            .filter(|child| !child.valid)
            .map(Self::detailed)
            .collect();
        if !failing.is_empty() {
            out.insert("errors".to_string(), Value::Array(failing));
        }
        Value::Object(out)
    }
}

/// The result of one validation run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    root: EvaluationNode,
    format: OutputFormat,
}

impl Evaluation {
    pub(crate) fn new(root: EvaluationNode, format: OutputFormat) -> Self {
        Self { root, format }
    }

    /// Overall validity.
    pub fn valid(&self) -> bool {
        self.root.valid
    }

    /// The full node tree, regardless of the configured format.
    pub fn root(&self) -> &EvaluationNode {
        &self.root
    }

    /// Renders with the format the run was configured with.
    pub fn to_json(&self) -> Value {
        self.render(self.format)
    }

    /// Renders with an explicit format.
    pub fn render(&self, format: OutputFormat) -> Value {
        match format {
            OutputFormat::Flag => json!({ "valid": self.root.valid }),
            OutputFormat::Basic => {
                let errors: Vec<Value> = self
                    .root
                    .failures()
                    .iter()
                    .map(|node| Value::Object(node.header(false)))
                    .collect();
                json!({ "valid": self.root.valid, "errors": errors })
            }
            OutputFormat::Detailed => self.root.detailed(),
            OutputFormat::Verbose => self.root.verbose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate;
    use crate::validation::OutputFormat;
    use serde_json::json;

    fn report() -> crate::validation::Evaluation {
        validate(
            &json!({
                "properties": {"a": {"type": "number"}},
                "additionalProperties": false
            }),
            &json!({"a": "wrong", "b": 2}),
        )
        .unwrap()
    }

    #[test]
    fn test_flag_output() {
        let rendered = report().render(OutputFormat::Flag);
        assert_eq!(rendered, json!({"valid": false}));
    }

    #[test]
    fn test_basic_output_lists_failing_nodes() {
        let rendered = report().render(OutputFormat::Basic);
        assert_eq!(rendered["valid"], json!(false));
        let errors = rendered["errors"].as_array().unwrap();
        assert!(!errors.is_empty());
        assert!(errors.iter().all(|e| e["valid"] == json!(false)));
        assert!(errors
            .iter()
            .any(|e| e["keywordLocation"].as_str().unwrap().contains("additionalProperties")));
    }

    #[test]
    fn test_detailed_output_prunes_valid_branches() {
        let rendered = report().render(OutputFormat::Detailed);
        fn assert_all_invalid(node: &serde_json::Value) {
            assert_eq!(node["valid"], json!(false));
            if let Some(children) = node["errors"].as_array() {
                for child in children {
                    assert_all_invalid(child);
                }
            }
        }
        assert_all_invalid(&rendered);
    }

    #[test]
    fn test_verbose_output_keeps_annotations() {
        let report = validate(
            &json!({"properties": {"a": true}}),
            &json!({"a": 1}),
        )
        .unwrap();
        let rendered = report.render(OutputFormat::Verbose);
        let text = rendered.to_string();
        assert!(text.contains("annotations"));
        assert!(text.contains("properties"));
    }

    #[test]
    fn test_failure_locations_point_at_the_instance() {
        let failures_hold = report();
        let failures = failures_hold.root().failures();
        assert!(failures
            .iter()
            .any(|n| n.instance_location == "/a"));
    }

    #[test]
    fn test_absolute_location_carries_the_registration_uri() {
        let nodes_hold = report();
        let nodes = nodes_hold.root().flatten();
        assert!(nodes
            .iter()
            .all(|n| n.absolute_keyword_location.starts_with("https://")));
    }
}
