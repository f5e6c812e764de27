//! Validation driver
//!
//! Owns the recursion: builds keyword frames in priority order, applies
//! consolidation, merges annotations forward so later keywords see what
//! earlier ones produced, tracks active reference frames for cycle
//! detection, and assembles the evaluation tree.

use std::collections::HashSet;

use serde_json::Value;

use super::context::ValidationContext;
use super::options::{Draft, ValidationOptions};
use super::output::{Evaluation, EvaluationNode};
use crate::keywords::Keyword;
use crate::observability::Logger;
use crate::schema::{registry, Schema, SchemaError, SchemaId, SchemaObject, SchemaRegistry, SchemaResult};

/// Public validation entry point over an immutable registry.
pub struct Validator<'r> {
    registry: &'r SchemaRegistry,
    options: ValidationOptions,
}

impl<'r> Validator<'r> {
    /// A validator with default options.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_options(registry, ValidationOptions::default())
    }

    /// A validator with explicit options.
    pub fn with_options(registry: &'r SchemaRegistry, options: ValidationOptions) -> Self {
        Self { registry, options }
    }

    /// The active options.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates an instance against the schema registered under `uri`.
    pub fn validate_uri(&self, uri: &str, instance: &Value) -> SchemaResult<Evaluation> {
        let root = self
            .registry
            .lookup(uri)
            .ok_or_else(|| SchemaError::unresolved(uri))?;
        Ok(self.validate(root, uri, instance))
    }

    /// Validates an instance against a schema node, with `base_uri` as the
    /// starting base for reference resolution.
    pub fn validate(&self, root: SchemaId, base_uri: &str, instance: &Value) -> Evaluation {
        let base = registry::split_fragment(base_uri).0.to_string();
        let mut ctx =
            ValidationContext::root(instance, root, base, self.options, self.registry);
        let mut driver = Driver::new(self.registry, self.options.log_indent_level);
        Logger::trace_at("VALIDATE_BEGIN", driver.depth, &[("uri", base_uri)]);
        driver.evaluate(root, &mut ctx);
        Logger::trace_at(
            "VALIDATE_END",
            driver.depth,
            &[("valid", if ctx.is_valid { "true" } else { "false" })],
        );
        Evaluation::new(EvaluationNode::from_context(&ctx), self.options.output_format)
    }
}

/// Per-run recursion state shared by every keyword frame.
pub struct Driver<'e> {
    registry: &'e SchemaRegistry,
    active_refs: HashSet<(String, String)>,
    depth: usize,
}

impl<'e> Driver<'e> {
    fn new(registry: &'e SchemaRegistry, depth: usize) -> Self {
        Self {
            registry,
            active_refs: HashSet::new(),
            depth,
        }
    }

    /// Marks a (reference target, instance location) frame active. Returns
    /// false when the frame is already active, i.e. a cycle.
    pub(crate) fn enter_ref(&mut self, frame: &(String, String)) -> bool {
        self.active_refs.insert(frame.clone())
    }

    /// Clears an active reference frame on the way out.
    pub(crate) fn exit_ref(&mut self, frame: &(String, String)) {
        self.active_refs.remove(frame);
    }

    /// Evaluates one schema node against the context.
    pub(crate) fn evaluate(&mut self, id: SchemaId, ctx: &mut ValidationContext<'e>) {
        self.depth += 1;
        let registry = self.registry;
        match registry.schema(id) {
            Schema::Bool(true) => {}
            Schema::Bool(false) => {
                ctx.fail("All values fail against the false schema");
            }
            Schema::Object(obj) => self.evaluate_object(obj, ctx),
        }
        self.depth -= 1;
    }

    fn evaluate_object(&mut self, obj: &'e SchemaObject, ctx: &mut ValidationContext<'e>) {
        // An embedded $id re-bases reference resolution for this subtree.
        if let Some(identifier) = obj.identifier() {
            if !identifier.starts_with('#') {
                let (rebased, _) = registry::resolve_reference(&ctx.current_uri, identifier);
                ctx.current_uri = rebased;
            }
        }

        let draft = ctx.options.validating_as;
        let mut keywords: Vec<&'e Keyword> = obj
            .keywords()
            .iter()
            .filter(|keyword| keyword.drafts().contains(draft))
            .collect();
        keywords.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });

        // Through draft-07 a present $ref shadows every sibling keyword.
        if draft <= Draft::Draft7 && keywords.iter().any(|k| matches!(k, Keyword::Ref(_))) {
            keywords.retain(|k| matches!(k, Keyword::Ref(_)));
        }

        let mut failures = 0usize;
        for keyword in keywords {
            let location = ctx.instance_location.to_string();
            Logger::trace_at(
                "KEYWORD_EVALUATE",
                self.depth,
                &[("keyword", keyword.name()), ("instance", &location)],
            );
            let mut frame = ctx.keyword_child(keyword.name());
            keyword.evaluate(self, &mut frame);
            keyword.consolidate(&mut frame);
            if frame.is_valid {
                // Prior-keyword annotations become visible to later
                // keywords and to the parent; failed frames contribute none.
                let own = frame.own_annotations().clone();
                ctx.absorb(&own);
            } else {
                failures += 1;
            }
            ctx.nested.push(frame);
        }

        if failures > 0 {
            ctx.fail(format!("{failures} keyword(s) failed"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordRegistry;
    use serde_json::json;

    fn setup(raw: Value) -> (SchemaRegistry, SchemaId) {
        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let id = registry
            .register("https://schemas.invalid/test.json", &raw, &keywords)
            .unwrap();
        (registry, id)
    }

    #[test]
    fn test_boolean_schema_laws() {
        let (registry, top) = setup(json!(true));
        let validator = Validator::new(&registry);
        for instance in [json!(null), json!(0), json!("x"), json!({"a": []})] {
            assert!(validator
                .validate(top, "https://schemas.invalid/test.json", &instance)
                .valid());
        }

        let (registry, bottom) = setup(json!(false));
        let validator = Validator::new(&registry);
        let report = validator.validate(bottom, "https://schemas.invalid/test.json", &json!(1));
        assert!(!report.valid());
        assert_eq!(
            report.root().error.as_deref(),
            Some("All values fail against the false schema")
        );
    }

    #[test]
    fn test_validate_uri_misses_are_unresolved() {
        let (registry, _) = setup(json!(true));
        let validator = Validator::new(&registry);
        let err = validator
            .validate_uri("https://schemas.invalid/other.json", &json!(1))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedRef { .. }));
    }

    #[test]
    fn test_keyword_frames_are_recorded_in_priority_order() {
        let (registry, id) = setup(json!({
            "additionalProperties": false,
            "properties": {"a": true}
        }));
        let validator = Validator::new(&registry);
        let report = validator.validate(id, "https://schemas.invalid/test.json", &json!({"a": 1}));
        let frames: Vec<&str> = report
            .root()
            .nested
            .iter()
            .map(|n| n.keyword_location.as_str())
            .collect();
        assert_eq!(frames, ["/properties", "/additionalProperties"]);
    }

    #[test]
    fn test_draft7_ref_shadows_siblings() {
        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let raw = json!({
            "definitions": {"n": {"type": "number"}},
            "$ref": "#/definitions/n",
            "type": "string"
        });
        let id = registry
            .register("https://schemas.invalid/test.json", &raw, &keywords)
            .unwrap();

        let d7 = Validator::with_options(
            &registry,
            ValidationOptions::for_draft(Draft::Draft7),
        );
        assert!(d7
            .validate(id, "https://schemas.invalid/test.json", &json!(5))
            .valid());

        let d2020 = Validator::with_options(
            &registry,
            ValidationOptions::for_draft(Draft::Draft2020_12),
        );
        assert!(!d2020
            .validate(id, "https://schemas.invalid/test.json", &json!(5))
            .valid());
    }

    #[test]
    fn test_inactive_draft_keywords_are_skipped() {
        let (registry, id) = setup(json!({
            "dependentRequired": {"a": ["b"]}
        }));
        let d7 = Validator::with_options(
            &registry,
            ValidationOptions::for_draft(Draft::Draft7),
        );
        // dependentRequired is 2019-09+; under draft-07 it is inert.
        assert!(d7
            .validate(id, "https://schemas.invalid/test.json", &json!({"a": 1}))
            .valid());
    }
}
