//! Annotation propagation and consolidation tests
//!
//! - `properties`/`patternProperties` publish evaluated names that
//!   `additionalProperties` reads from the same context
//! - `prefixItems` publishes its covered count; `items` resumes there
//! - in-place applicators consolidate child annotations by union / max /
//!   `true`-absorbs

use serde_json::json;
use verdict::{validate, EvaluationNode};

fn frame<'a>(root: &'a EvaluationNode, keyword_location: &str) -> &'a EvaluationNode {
    root.flatten()
        .into_iter()
        .find(|n| n.keyword_location == keyword_location)
        .unwrap_or_else(|| panic!("no node at {keyword_location}"))
}

// =============================================================================
// Evaluated-names coupling
// =============================================================================

#[test]
fn test_properties_annotation_visible_next_to_additional_properties_failure() {
    let schema = json!({
        "properties": {"a": {"type": "number"}},
        "additionalProperties": false
    });
    let report = validate(&schema, &json!({"a": 1, "b": 2})).unwrap();
    assert!(!report.valid());

    // `properties` evaluated {"a"} and says so on its own frame.
    let properties = frame(report.root(), "/properties");
    assert!(properties.valid);
    assert_eq!(properties.annotations.get("properties"), Some(&json!(["a"])));

    // The failing sibling is `additionalProperties`, on member "b" only.
    let additional = frame(report.root(), "/additionalProperties");
    assert!(!additional.valid);
    assert!(additional.nested.iter().all(|n| n.instance_location == "/b"));
}

#[test]
fn test_union_of_properties_and_pattern_properties_guards_additional() {
    let schema = json!({
        "properties": {"name": true},
        "patternProperties": {"^x-": true},
        "additionalProperties": false
    });
    assert!(validate(&schema, &json!({"name": 1, "x-a": 2}))
        .unwrap()
        .valid());
    let report = validate(&schema, &json!({"name": 1, "other": 2})).unwrap();
    assert!(!report.valid());
}

#[test]
fn test_additional_properties_annotation_names_what_it_took() {
    let schema = json!({
        "properties": {"a": true},
        "additionalProperties": {"type": "number"}
    });
    let report = validate(&schema, &json!({"a": 1, "b": 2, "c": 3})).unwrap();
    assert!(report.valid());
    let additional = frame(report.root(), "/additionalProperties");
    assert_eq!(
        additional.annotations.get("additionalProperties"),
        Some(&json!(["b", "c"]))
    );
}

// =============================================================================
// Positional coupling
// =============================================================================

#[test]
fn test_prefix_items_hands_off_to_items() {
    let schema = json!({
        "prefixItems": [{"type": "number"}],
        "items": {"type": "string"}
    });

    let report = validate(&schema, &json!([1, "x", "y"])).unwrap();
    assert!(report.valid());
    assert_eq!(
        report.root().annotations.get("prefixItems"),
        Some(&json!(1))
    );
    assert_eq!(report.root().annotations.get("items"), Some(&json!(true)));

    let report = validate(&schema, &json!([1, 2])).unwrap();
    assert!(!report.valid());
    let items = frame(report.root(), "/items");
    assert!(items.nested.iter().any(|n| n.instance_location == "/1"));
}

#[test]
fn test_items_skips_entirely_when_prefix_covered_the_array() {
    let schema = json!({
        "prefixItems": [{"type": "number"}, {"type": "number"}],
        "items": false
    });
    // Both items are prefix-covered; `items: false` never fires.
    assert!(validate(&schema, &json!([1, 2])).unwrap().valid());
    // A third item reaches `items: false` and dies there.
    assert!(!validate(&schema, &json!([1, 2, 3])).unwrap().valid());
}

// =============================================================================
// Consolidation
// =============================================================================

#[test]
fn test_all_of_consolidates_name_sets_by_union() {
    let schema = json!({
        "allOf": [
            {"properties": {"a": true}},
            {"properties": {"b": true}}
        ]
    });
    let report = validate(&schema, &json!({"a": 1, "b": 2})).unwrap();
    assert!(report.valid());
    let all_of = frame(report.root(), "/allOf");
    assert_eq!(all_of.annotations.get("properties"), Some(&json!(["a", "b"])));
    // The consolidated value also lands on the schema node itself.
    assert_eq!(
        report.root().annotations.get("properties"),
        Some(&json!(["a", "b"]))
    );
}

#[test]
fn test_all_of_consolidates_counts_by_maximum() {
    let schema = json!({
        "allOf": [
            {"prefixItems": [true]},
            {"prefixItems": [true, true]}
        ]
    });
    let report = validate(&schema, &json!([1, 2, 3])).unwrap();
    assert!(report.valid());
    let all_of = frame(report.root(), "/allOf");
    assert_eq!(all_of.annotations.get("prefixItems"), Some(&json!(2)));
}

#[test]
fn test_true_absorbs_counts_during_consolidation() {
    let schema = json!({
        "allOf": [
            {"prefixItems": [true]},
            {"prefixItems": [true, true]}
        ]
    });
    // The second branch covers the whole array, so `true` wins over 1.
    let report = validate(&schema, &json!([1, 2])).unwrap();
    let all_of = frame(report.root(), "/allOf");
    assert_eq!(all_of.annotations.get("prefixItems"), Some(&json!(true)));
}

#[test]
fn test_failed_branch_annotations_do_not_merge() {
    let schema = json!({
        "anyOf": [
            {"properties": {"a": true}, "required": ["missing"]},
            {"properties": {"b": true}}
        ]
    });
    let report = validate(&schema, &json!({"a": 1, "b": 2})).unwrap();
    assert!(report.valid());
    let any_of = frame(report.root(), "/anyOf");
    // Only the valid branch's evaluated names survive.
    assert_eq!(any_of.annotations.get("properties"), Some(&json!(["b"])));
}

#[test]
fn test_if_annotations_flow_to_the_chosen_branch_only() {
    let schema = json!({
        "if": {"properties": {"kind": {"const": "tagged"}}, "required": ["kind"]},
        "then": {"required": ["tag"]},
        "else": {"required": ["plain"]}
    });
    // if matched: then runs (and fails), else never fires.
    let report = validate(&schema, &json!({"kind": "tagged"})).unwrap();
    assert!(!report.valid());
    let failing: Vec<&str> = report
        .root()
        .failures()
        .iter()
        .map(|n| n.keyword_location.as_str())
        .collect();
    assert!(failing.contains(&"/then"));
    assert!(!failing.iter().any(|l| l.starts_with("/else")));

    // The if frame carries the evaluated-names annotation it consolidated.
    let if_frame = frame(report.root(), "/if");
    assert_eq!(if_frame.annotations.get("properties"), Some(&json!(["kind"])));
}

#[test]
fn test_contains_counts_matches() {
    let schema = json!({"contains": {"type": "number"}});
    let report = validate(&schema, &json!(["a", 1, 2, "b", 3])).unwrap();
    assert!(report.valid());
    let contains = frame(report.root(), "/contains");
    assert_eq!(contains.annotations.get("contains"), Some(&json!(3)));
}

#[test]
fn test_annotations_are_scoped_per_instance_location() {
    // The inner object's `properties` annotation must not leak up to the
    // outer schema node, which has its own.
    let schema = json!({
        "properties": {
            "outer": {"properties": {"inner": true}}
        }
    });
    let report = validate(&schema, &json!({"outer": {"inner": 1}})).unwrap();
    assert_eq!(
        report.root().annotations.get("properties"),
        Some(&json!(["outer"]))
    );
}
