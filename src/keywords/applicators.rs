//! Applicator keyword parsers and evaluators
//!
//! Applicators spawn child contexts for their sub-schemas and recurse
//! through the driver. The ordering contract matters here: `properties` and
//! `patternProperties` publish the names they evaluated before
//! `additionalProperties` runs; `prefixItems` publishes its covered count
//! before `items`; `if` publishes its outcome before `then`/`else`.

use serde_json::Value;

use super::{kind_name, ItemsForm, Keyword, PatternProperty};
use crate::schema::{ParseCtx, SchemaId};
use crate::validation::{AnnotationValue, Draft, Driver, ValidationContext};
use crate::value::{self, NameSet};

// ==================
// Parsers
// ==================

fn subschema(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<SchemaId, String> {
    ctx.subschema(raw).map_err(|e| e.to_string())
}

fn subschema_list(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Vec<SchemaId>, String> {
    let entries = raw
        .as_array()
        .ok_or_else(|| format!("must be an array of schemas, got {}", kind_name(raw)))?;
    if entries.is_empty() {
        return Err("must be a non-empty array".to_string());
    }
    entries.iter().map(|entry| subschema(entry, ctx)).collect()
}

fn subschema_map(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Vec<(String, SchemaId)>, String> {
    let members = raw
        .as_object()
        .ok_or_else(|| format!("must be an object of schemas, got {}", kind_name(raw)))?;
    let mut out = Vec::with_capacity(members.len());
    for (name, entry) in members {
        out.push((name.clone(), subschema(entry, ctx)?));
    }
    Ok(out)
}

pub(crate) fn parse_all_of(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::AllOf(subschema_list(raw, ctx)?))
}

pub(crate) fn parse_any_of(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::AnyOf(subschema_list(raw, ctx)?))
}

pub(crate) fn parse_one_of(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::OneOf(subschema_list(raw, ctx)?))
}

pub(crate) fn parse_not(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Not(subschema(raw, ctx)?))
}

pub(crate) fn parse_if(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::If(subschema(raw, ctx)?))
}

pub(crate) fn parse_then(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Then(subschema(raw, ctx)?))
}

pub(crate) fn parse_else(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Else(subschema(raw, ctx)?))
}

pub(crate) fn parse_dependent_schemas(
    raw: &Value,
    ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::DependentSchemas(subschema_map(raw, ctx)?))
}

pub(crate) fn parse_properties(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Properties(subschema_map(raw, ctx)?))
}

pub(crate) fn parse_pattern_properties(
    raw: &Value,
    ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    let members = raw
        .as_object()
        .ok_or_else(|| format!("must be an object of schemas, got {}", kind_name(raw)))?;
    let mut out = Vec::with_capacity(members.len());
    for (source, entry) in members {
        let pattern = super::CompiledPattern::compile(source)
            .map_err(|e| format!("pattern '{source}': {e}"))?;
        out.push(PatternProperty {
            pattern,
            schema: subschema(entry, ctx)?,
        });
    }
    Ok(Keyword::PatternProperties(out))
}

pub(crate) fn parse_additional_properties(
    raw: &Value,
    ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::AdditionalProperties(subschema(raw, ctx)?))
}

pub(crate) fn parse_prefix_items(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::PrefixItems(subschema_list(raw, ctx)?))
}

pub(crate) fn parse_items(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    match raw {
        Value::Array(entries) => {
            let mut subs = Vec::with_capacity(entries.len());
            for entry in entries {
                subs.push(subschema(entry, ctx)?);
            }
            Ok(Keyword::Items(ItemsForm::Positional(subs)))
        }
        Value::Bool(_) | Value::Object(_) => {
            Ok(Keyword::Items(ItemsForm::Single(subschema(raw, ctx)?)))
        }
        other => Err(format!(
            "must be a schema or an array of schemas, got {}",
            kind_name(other)
        )),
    }
}

pub(crate) fn parse_additional_items(
    raw: &Value,
    ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::AdditionalItems(subschema(raw, ctx)?))
}

pub(crate) fn parse_contains(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Contains(subschema(raw, ctx)?))
}

// ==================
// Evaluators: object applicators
// ==================

pub(crate) fn eval_properties<'e>(
    props: &'e [(String, SchemaId)],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    let mut evaluated = NameSet::new();
    let mut failed = 0usize;
    for (name, sub) in props {
        let Some(member) = members.get(name) else {
            continue;
        };
        evaluated.insert(name.clone());
        let mut child = ctx.member_child(member, name, Some(name));
        driver.evaluate(*sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    // Evaluated names are recorded whether or not their values validated.
    ctx.annotate("properties", AnnotationValue::Names(evaluated));
    if failed > 0 {
        ctx.fail(format!("{failed} property value(s) failed validation"));
    }
}

pub(crate) fn eval_pattern_properties<'e>(
    patterns: &'e [PatternProperty],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    let mut evaluated = NameSet::new();
    let mut failed = 0usize;
    for entry in patterns {
        for (name, member) in members {
            if !entry.pattern.is_match(name) {
                continue;
            }
            evaluated.insert(name.clone());
            let mut child = ctx.member_child(member, name, Some(entry.pattern.source()));
            driver.evaluate(entry.schema, &mut child);
            if !child.is_valid {
                failed += 1;
            }
            ctx.nested.push(child);
        }
    }
    ctx.annotate("patternProperties", AnnotationValue::Names(evaluated));
    if failed > 0 {
        ctx.fail(format!(
            "{failed} pattern-matched property value(s) failed validation"
        ));
    }
}

pub(crate) fn eval_additional_properties<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    let mut covered = NameSet::new();
    for key in ["properties", "patternProperties"] {
        if let Some(AnnotationValue::Names(names)) = ctx.annotations.get(key) {
            covered.extend(names.iter().cloned());
        }
    }
    let mut evaluated = NameSet::new();
    let mut failed = 0usize;
    for (name, member) in members {
        if covered.contains(name) {
            continue;
        }
        evaluated.insert(name.clone());
        let mut child = ctx.member_child(member, name, None);
        driver.evaluate(sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    ctx.annotate("additionalProperties", AnnotationValue::Names(evaluated));
    if failed > 0 {
        ctx.fail(format!(
            "{failed} additional property value(s) failed validation"
        ));
    }
}

pub(crate) fn eval_dependent_schemas<'e>(
    deps: &'e [(String, SchemaId)],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    let mut failed = 0usize;
    for (name, sub) in deps {
        if !members.contains_key(name.as_str()) {
            continue;
        }
        let mut child = ctx.in_place_child(Some(name));
        driver.evaluate(*sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    if failed > 0 {
        ctx.fail(format!("{failed} dependent schema(s) failed"));
    }
}

// ==================
// Evaluators: array applicators
// ==================

pub(crate) fn eval_prefix_items<'e>(
    subs: &'e [SchemaId],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    let covered = subs.len().min(items.len());
    let mut failed = 0usize;
    for (index, (sub, item)) in subs.iter().zip(items).enumerate() {
        let mut child = ctx.item_child(item, index, Some(&index.to_string()));
        driver.evaluate(*sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    let annotation = if covered == items.len() {
        AnnotationValue::Bool(true)
    } else {
        AnnotationValue::Count(covered as u64)
    };
    ctx.annotate("prefixItems", annotation);
    if failed > 0 {
        ctx.fail(format!("{failed} prefix item(s) failed validation"));
    }
}

pub(crate) fn eval_items<'e>(
    form: &'e ItemsForm,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    match form {
        ItemsForm::Single(sub) => eval_items_single(*sub, driver, ctx),
        ItemsForm::Positional(subs) => eval_items_positional(subs, driver, ctx),
    }
}

fn eval_items_single<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    // Pick up where prefixItems left off; None means it covered everything.
    let resume_at = match ctx.annotations.get("prefixItems") {
        Some(AnnotationValue::Bool(true)) => None,
        Some(AnnotationValue::Count(n)) => Some(*n as usize),
        _ => Some(0),
    };
    let Some(start) = resume_at else {
        ctx.annotate("items", AnnotationValue::Bool(true));
        return;
    };
    let mut failed = 0usize;
    for (index, item) in items.iter().enumerate().skip(start) {
        let mut child = ctx.item_child(item, index, None);
        driver.evaluate(sub, &mut child);
        let ok = child.is_valid;
        ctx.nested.push(child);
        if !ok {
            failed += 1;
            if ctx.options.apply_optimizations {
                break;
            }
        }
    }
    if failed > 0 {
        ctx.fail(format!("{failed} item(s) failed validation"));
    } else {
        ctx.annotate("items", AnnotationValue::Bool(true));
    }
}

fn eval_items_positional<'e>(
    subs: &'e [SchemaId],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    if ctx.options.validating_as == Draft::Draft2020_12 {
        ctx.fail(
            "array form of \"items\" was removed in draft 2020-12; use \"prefixItems\""
                .to_string(),
        );
        return;
    }
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    let covered = subs.len().min(items.len());
    let mut failed = 0usize;
    for (index, (sub, item)) in subs.iter().zip(items).enumerate() {
        let mut child = ctx.item_child(item, index, Some(&index.to_string()));
        driver.evaluate(*sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    let annotation = if covered == items.len() {
        AnnotationValue::Bool(true)
    } else {
        AnnotationValue::Count(covered as u64)
    };
    ctx.annotate("items", annotation);
    if failed > 0 {
        ctx.fail(format!("{failed} positional item(s) failed validation"));
    }
}

pub(crate) fn eval_additional_items<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    // Applies only after the positional form of `items` left a tail.
    let start = match ctx.annotations.get("items") {
        Some(AnnotationValue::Count(n)) => *n as usize,
        _ => return,
    };
    let mut failed = 0usize;
    for (index, item) in items.iter().enumerate().skip(start) {
        let mut child = ctx.item_child(item, index, None);
        driver.evaluate(sub, &mut child);
        if !child.is_valid {
            failed += 1;
        }
        ctx.nested.push(child);
    }
    ctx.annotate("additionalItems", AnnotationValue::Bool(true));
    if failed > 0 {
        ctx.fail(format!("{failed} additional item(s) failed validation"));
    }
}

pub(crate) fn eval_contains<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    let mut matched = 0u64;
    for (index, item) in items.iter().enumerate() {
        let mut child = ctx.item_child(item, index, None);
        driver.evaluate(sub, &mut child);
        let ok = child.is_valid;
        ctx.nested.push(child);
        if ok {
            matched += 1;
            if ctx.options.apply_optimizations {
                break;
            }
        }
    }
    ctx.annotate("contains", AnnotationValue::Count(matched));
    if matched == 0 {
        ctx.fail("no array item matches the contains subschema".to_string());
    }
}

// ==================
// Evaluators: in-place combinators
// ==================

pub(crate) fn eval_all_of<'e>(
    subs: &'e [SchemaId],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let mut failed = 0usize;
    for (index, sub) in subs.iter().enumerate() {
        let mut child = ctx.in_place_child(Some(&index.to_string()));
        driver.evaluate(*sub, &mut child);
        let ok = child.is_valid;
        ctx.nested.push(child);
        if !ok {
            failed += 1;
            if ctx.options.apply_optimizations {
                break;
            }
        }
    }
    if failed > 0 {
        ctx.fail(format!("{failed} subschema(s) failed"));
    }
}

pub(crate) fn eval_any_of<'e>(
    subs: &'e [SchemaId],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let mut matched = false;
    for (index, sub) in subs.iter().enumerate() {
        let mut child = ctx.in_place_child(Some(&index.to_string()));
        driver.evaluate(*sub, &mut child);
        let ok = child.is_valid;
        ctx.nested.push(child);
        if ok {
            matched = true;
            if ctx.options.apply_optimizations {
                break;
            }
        }
    }
    if !matched {
        ctx.fail("no subschema matched".to_string());
    }
}

pub(crate) fn eval_one_of<'e>(
    subs: &'e [SchemaId],
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let mut matched = 0usize;
    for (index, sub) in subs.iter().enumerate() {
        let mut child = ctx.in_place_child(Some(&index.to_string()));
        driver.evaluate(*sub, &mut child);
        let ok = child.is_valid;
        ctx.nested.push(child);
        if ok {
            matched += 1;
            // A second match already decides the outcome.
            if matched > 1 && ctx.options.apply_optimizations {
                break;
            }
        }
    }
    if matched != 1 {
        ctx.fail(format!(
            "Expected 1 matching subschema but found {matched}"
        ));
    }
}

pub(crate) fn eval_not<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let mut child = ctx.in_place_child(None);
    driver.evaluate(sub, &mut child);
    let ok = child.is_valid;
    ctx.nested.push(child);
    if ok {
        ctx.fail("value must not match the subschema".to_string());
    }
}

pub(crate) fn eval_if<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let mut child = ctx.in_place_child(None);
    driver.evaluate(sub, &mut child);
    // The outcome routes `then`/`else`; `if` itself never fails the parent.
    ctx.annotate("if", AnnotationValue::Bool(child.is_valid));
    ctx.nested.push(child);
}

pub(crate) fn eval_then<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Some(AnnotationValue::Bool(true)) = ctx.annotations.get("if") else {
        return;
    };
    let mut child = ctx.in_place_child(None);
    driver.evaluate(sub, &mut child);
    let ok = child.is_valid;
    ctx.nested.push(child);
    if !ok {
        ctx.fail("then branch failed".to_string());
    }
}

pub(crate) fn eval_else<'e>(
    sub: SchemaId,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let Some(AnnotationValue::Bool(false)) = ctx.annotations.get("if") else {
        return;
    };
    let mut child = ctx.in_place_child(None);
    driver.evaluate(sub, &mut child);
    let ok = child.is_valid;
    ctx.nested.push(child);
    if !ok {
        ctx.fail("else branch failed".to_string());
    }
}

#[cfg(test)]
mod tests {
    use crate::{is_valid, validate};
    use serde_json::json;

    #[test]
    fn test_properties_validate_present_members_only() {
        let schema = json!({"properties": {"a": {"type": "number"}}});
        assert!(is_valid(&schema, &json!({"a": 1})).unwrap());
        assert!(is_valid(&schema, &json!({"b": "anything"})).unwrap());
        assert!(!is_valid(&schema, &json!({"a": "x"})).unwrap());
    }

    #[test]
    fn test_additional_properties_sees_what_properties_matched() {
        let schema = json!({
            "properties": {"a": {"type": "number"}},
            "additionalProperties": false
        });
        assert!(is_valid(&schema, &json!({"a": 1})).unwrap());
        assert!(!is_valid(&schema, &json!({"a": 1, "b": 2})).unwrap());
    }

    #[test]
    fn test_additional_properties_sees_pattern_matches_too() {
        let schema = json!({
            "patternProperties": {"^x-": true},
            "additionalProperties": false
        });
        assert!(is_valid(&schema, &json!({"x-vendor": 1})).unwrap());
        assert!(!is_valid(&schema, &json!({"x-vendor": 1, "other": 2})).unwrap());
    }

    #[test]
    fn test_pattern_properties_validates_matching_members() {
        let schema = json!({"patternProperties": {"^n_": {"type": "number"}}});
        assert!(is_valid(&schema, &json!({"n_a": 1, "s": "x"})).unwrap());
        assert!(!is_valid(&schema, &json!({"n_a": "not a number"})).unwrap());
    }

    #[test]
    fn test_prefix_items_then_items() {
        let schema = json!({
            "prefixItems": [{"type": "number"}],
            "items": {"type": "string"}
        });
        assert!(is_valid(&schema, &json!([1, "x", "y"])).unwrap());
        assert!(!is_valid(&schema, &json!([1, 2])).unwrap());
        assert!(!is_valid(&schema, &json!(["x"])).unwrap());
    }

    #[test]
    fn test_items_alone_covers_every_item() {
        let schema = json!({"items": {"type": "number"}});
        assert!(is_valid(&schema, &json!([1, 2, 3])).unwrap());
        assert!(!is_valid(&schema, &json!([1, "x"])).unwrap());
        assert!(is_valid(&schema, &json!([])).unwrap());
    }

    #[test]
    fn test_contains() {
        let schema = json!({"contains": {"type": "string"}});
        assert!(is_valid(&schema, &json!([1, "x"])).unwrap());
        assert!(!is_valid(&schema, &json!([1, 2])).unwrap());
    }

    #[test]
    fn test_all_of() {
        let schema = json!({"allOf": [{"minimum": 0}, {"maximum": 10}]});
        assert!(is_valid(&schema, &json!(5)).unwrap());
        assert!(!is_valid(&schema, &json!(11)).unwrap());
    }

    #[test]
    fn test_any_of() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 10}]});
        assert!(is_valid(&schema, &json!("x")).unwrap());
        assert!(is_valid(&schema, &json!(12)).unwrap());
        assert!(!is_valid(&schema, &json!(3)).unwrap());
    }

    #[test]
    fn test_one_of_reports_match_count() {
        let schema = json!({"oneOf": [{"type": "number"}, {"type": "integer"}]});
        let report = validate(&schema, &json!(3)).unwrap();
        assert!(!report.valid());
        let failures = report.root().failures();
        let message = failures
            .iter()
            .find_map(|n| n.error.as_deref())
            .unwrap_or_default();
        assert_eq!(message, "Expected 1 matching subschema but found 2");
        assert!(is_valid(&schema, &json!(3.5)).unwrap());
    }

    #[test]
    fn test_not() {
        let schema = json!({"not": {"type": "string"}});
        assert!(is_valid(&schema, &json!(1)).unwrap());
        assert!(!is_valid(&schema, &json!("x")).unwrap());
    }

    #[test]
    fn test_if_then_else_routing() {
        let schema = json!({
            "if": {"type": "number"},
            "then": {"minimum": 0},
            "else": {"type": "string"}
        });
        assert!(is_valid(&schema, &json!(5)).unwrap());
        assert!(!is_valid(&schema, &json!(-1)).unwrap());
        assert!(is_valid(&schema, &json!("hi")).unwrap());
        assert!(!is_valid(&schema, &json!(false)).unwrap());
    }

    #[test]
    fn test_then_without_if_is_inert() {
        let schema = json!({"then": {"type": "string"}});
        assert!(is_valid(&schema, &json!(5)).unwrap());
    }

    #[test]
    fn test_dependent_schemas() {
        let schema = json!({
            "dependentSchemas": {
                "credit_card": {"required": ["billing_address"]}
            }
        });
        assert!(is_valid(&schema, &json!({"credit_card": 1, "billing_address": "x"})).unwrap());
        assert!(!is_valid(&schema, &json!({"credit_card": 1})).unwrap());
        assert!(is_valid(&schema, &json!({"name": "n"})).unwrap());
    }

    #[test]
    fn test_applicators_skip_wrong_kinds() {
        let schema = json!({
            "properties": {"a": {"type": "number"}},
            "items": {"type": "string"},
            "contains": {"type": "string"}
        });
        assert!(is_valid(&schema, &json!(42)).unwrap());
    }

    #[test]
    fn test_empty_subschema_list_is_a_parse_error() {
        assert!(validate(&json!({"allOf": []}), &json!(1)).is_err());
        assert!(validate(&json!({"oneOf": []}), &json!(1)).is_err());
    }
}
