//! Assertion keyword parsers and evaluators
//!
//! Assertions never recurse into sub-schemas. Each evaluator checks the
//! instance kind first and treats a mismatch as vacuously valid; kind
//! enforcement is `type`'s job alone.

use std::collections::BTreeSet;

use serde_json::{Number, Value};

use super::{kind_name, CompiledPattern, Keyword, PrimitiveType, TypeSet};
use crate::schema::ParseCtx;
use crate::validation::ValidationContext;
use crate::value;

// ==================
// Parsers
// ==================

fn expect_u64(raw: &Value) -> Result<u64, String> {
    raw.as_u64()
        .ok_or_else(|| format!("must be a non-negative integer, got {}", kind_name(raw)))
}

fn expect_number(raw: &Value) -> Result<Number, String> {
    match raw {
        Value::Number(n) => Ok(n.clone()),
        other => Err(format!("must be a number, got {}", kind_name(other))),
    }
}

fn expect_string_array(raw: &Value) -> Result<Vec<String>, String> {
    let items = raw
        .as_array()
        .ok_or_else(|| format!("must be an array of strings, got {}", kind_name(raw)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("array entries must be strings, got {}", kind_name(item)))
        })
        .collect()
}

pub(crate) fn parse_type(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let mut tags = BTreeSet::new();
    match raw {
        Value::String(name) => {
            let tag = PrimitiveType::from_name(name)
                .ok_or_else(|| format!("unknown type tag '{name}'"))?;
            tags.insert(tag);
        }
        Value::Array(names) => {
            for entry in names {
                let name = entry
                    .as_str()
                    .ok_or_else(|| format!("type tags must be strings, got {}", kind_name(entry)))?;
                let tag = PrimitiveType::from_name(name)
                    .ok_or_else(|| format!("unknown type tag '{name}'"))?;
                tags.insert(tag);
            }
        }
        other => {
            return Err(format!(
                "must be a type tag or array of type tags, got {}",
                kind_name(other)
            ))
        }
    }
    if tags.is_empty() {
        return Err("must name at least one type".to_string());
    }
    Ok(Keyword::Type(TypeSet::new(tags)))
}

pub(crate) fn parse_enum(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let candidates = raw
        .as_array()
        .ok_or_else(|| format!("must be an array, got {}", kind_name(raw)))?;
    if candidates.is_empty() {
        return Err("must list at least one candidate".to_string());
    }
    Ok(Keyword::Enum(candidates.clone()))
}

pub(crate) fn parse_const(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Const(raw.clone()))
}

pub(crate) fn parse_multiple_of(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let divisor = expect_number(raw)?;
    if divisor.as_f64().is_some_and(|d| d <= 0.0) {
        return Err("must be a positive number".to_string());
    }
    Ok(Keyword::MultipleOf(divisor))
}

pub(crate) fn parse_maximum(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Maximum(expect_number(raw)?))
}

pub(crate) fn parse_exclusive_maximum(
    raw: &Value,
    _ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::ExclusiveMaximum(expect_number(raw)?))
}

pub(crate) fn parse_minimum(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Minimum(expect_number(raw)?))
}

pub(crate) fn parse_exclusive_minimum(
    raw: &Value,
    _ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::ExclusiveMinimum(expect_number(raw)?))
}

pub(crate) fn parse_max_length(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::MaxLength(expect_u64(raw)?))
}

pub(crate) fn parse_min_length(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::MinLength(expect_u64(raw)?))
}

pub(crate) fn parse_pattern(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let source = raw
        .as_str()
        .ok_or_else(|| format!("must be a string, got {}", kind_name(raw)))?;
    Ok(Keyword::Pattern(CompiledPattern::compile(source)?))
}

pub(crate) fn parse_max_items(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::MaxItems(expect_u64(raw)?))
}

pub(crate) fn parse_min_items(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::MinItems(expect_u64(raw)?))
}

pub(crate) fn parse_unique_items(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    raw.as_bool()
        .map(Keyword::UniqueItems)
        .ok_or_else(|| format!("must be a boolean, got {}", kind_name(raw)))
}

pub(crate) fn parse_max_properties(
    raw: &Value,
    _ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::MaxProperties(expect_u64(raw)?))
}

pub(crate) fn parse_min_properties(
    raw: &Value,
    _ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    Ok(Keyword::MinProperties(expect_u64(raw)?))
}

pub(crate) fn parse_required(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Required(expect_string_array(raw)?))
}

pub(crate) fn parse_dependent_required(
    raw: &Value,
    _ctx: &mut ParseCtx<'_>,
) -> Result<Keyword, String> {
    let members = raw
        .as_object()
        .ok_or_else(|| format!("must be an object, got {}", kind_name(raw)))?;
    let mut deps = Vec::with_capacity(members.len());
    for (name, needed) in members {
        deps.push((name.clone(), expect_string_array(needed)?));
    }
    Ok(Keyword::DependentRequired(deps))
}

pub(crate) fn parse_format(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    raw.as_str()
        .map(|s| Keyword::Format(s.to_string()))
        .ok_or_else(|| format!("must be a string, got {}", kind_name(raw)))
}

// ==================
// Evaluators
// ==================

pub(crate) fn eval_type(types: &TypeSet, ctx: &mut ValidationContext<'_>) {
    if !types.matches(ctx.local_instance) {
        ctx.fail(format!(
            "value is {}, expected {}",
            kind_name(ctx.local_instance),
            types.describe()
        ));
    }
}

pub(crate) fn eval_enum(candidates: &[Value], ctx: &mut ValidationContext<'_>) {
    if !candidates
        .iter()
        .any(|candidate| value::json_equal(candidate, ctx.local_instance))
    {
        ctx.fail("value matches none of the enum candidates".to_string());
    }
}

pub(crate) fn eval_const(expected: &Value, ctx: &mut ValidationContext<'_>) {
    if !value::json_equal(expected, ctx.local_instance) {
        ctx.fail("value does not equal the const value".to_string());
    }
}

pub(crate) fn eval_multiple_of(divisor: &Number, ctx: &mut ValidationContext<'_>) {
    let Ok(n) = value::as_number(ctx.local_instance) else {
        return;
    };
    if !value::is_multiple_of(n, divisor) {
        ctx.fail(format!("value is not a multiple of {divisor}"));
    }
}

pub(crate) fn eval_maximum(bound: &Number, ctx: &mut ValidationContext<'_>) {
    let Ok(n) = value::as_number(ctx.local_instance) else {
        return;
    };
    if value::number_cmp(n, bound) == std::cmp::Ordering::Greater {
        ctx.fail(format!("value exceeds the maximum of {bound}"));
    }
}

pub(crate) fn eval_exclusive_maximum(bound: &Number, ctx: &mut ValidationContext<'_>) {
    let Ok(n) = value::as_number(ctx.local_instance) else {
        return;
    };
    if value::number_cmp(n, bound) != std::cmp::Ordering::Less {
        ctx.fail(format!("value must be strictly less than {bound}"));
    }
}

pub(crate) fn eval_minimum(bound: &Number, ctx: &mut ValidationContext<'_>) {
    let Ok(n) = value::as_number(ctx.local_instance) else {
        return;
    };
    if value::number_cmp(n, bound) == std::cmp::Ordering::Less {
        ctx.fail(format!("value is below the minimum of {bound}"));
    }
}

pub(crate) fn eval_exclusive_minimum(bound: &Number, ctx: &mut ValidationContext<'_>) {
    let Ok(n) = value::as_number(ctx.local_instance) else {
        return;
    };
    if value::number_cmp(n, bound) != std::cmp::Ordering::Greater {
        ctx.fail(format!("value must be strictly greater than {bound}"));
    }
}

pub(crate) fn eval_max_length(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(s) = value::as_str(ctx.local_instance) else {
        return;
    };
    let len = value::utf16_length(s);
    if len > limit {
        ctx.fail(format!("string length {len} exceeds maxLength {limit}"));
    }
}

pub(crate) fn eval_min_length(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(s) = value::as_str(ctx.local_instance) else {
        return;
    };
    let len = value::utf16_length(s);
    if len < limit {
        ctx.fail(format!("string length {len} is below minLength {limit}"));
    }
}

pub(crate) fn eval_pattern(pattern: &CompiledPattern, ctx: &mut ValidationContext<'_>) {
    let Ok(s) = value::as_str(ctx.local_instance) else {
        return;
    };
    if !pattern.is_match(s) {
        ctx.fail(format!(
            "string does not match pattern \"{}\"",
            pattern.source()
        ));
    }
}

pub(crate) fn eval_max_items(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    if items.len() as u64 > limit {
        ctx.fail(format!(
            "array has {} items, more than maxItems {limit}",
            items.len()
        ));
    }
}

pub(crate) fn eval_min_items(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    if (items.len() as u64) < limit {
        ctx.fail(format!(
            "array has {} items, fewer than minItems {limit}",
            items.len()
        ));
    }
}

pub(crate) fn eval_unique_items(unique: bool, ctx: &mut ValidationContext<'_>) {
    if !unique {
        return;
    }
    let Ok(items) = value::as_array(ctx.local_instance) else {
        return;
    };
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if value::json_equal(&items[i], &items[j]) {
                ctx.fail(format!("items at indices {i} and {j} are equal"));
                return;
            }
        }
    }
}

pub(crate) fn eval_max_properties(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    if members.len() as u64 > limit {
        ctx.fail(format!(
            "object has {} properties, more than maxProperties {limit}",
            members.len()
        ));
    }
}

pub(crate) fn eval_min_properties(limit: u64, ctx: &mut ValidationContext<'_>) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    if (members.len() as u64) < limit {
        ctx.fail(format!(
            "object has {} properties, fewer than minProperties {limit}",
            members.len()
        ));
    }
}

pub(crate) fn eval_required(names: &[String], ctx: &mut ValidationContext<'_>) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    let missing: Vec<&str> = names
        .iter()
        .filter(|name| !members.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        ctx.fail(format!("required properties missing: {}", missing.join(", ")));
    }
}

pub(crate) fn eval_dependent_required(
    deps: &[(String, Vec<String>)],
    ctx: &mut ValidationContext<'_>,
) {
    let Ok(members) = value::as_object(ctx.local_instance) else {
        return;
    };
    for (trigger, needed) in deps {
        if !members.contains_key(trigger.as_str()) {
            continue;
        }
        for name in needed {
            if !members.contains_key(name.as_str()) {
                ctx.fail(format!("property '{trigger}' requires '{name}'"));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{is_valid, validate};
    use serde_json::json;

    #[test]
    fn test_type_single_tag() {
        let schema = json!({"type": "string"});
        assert!(is_valid(&schema, &json!("x")).unwrap());
        assert!(!is_valid(&schema, &json!(42)).unwrap());
    }

    #[test]
    fn test_type_integer_accepts_integral_floats() {
        let schema = json!({"type": "integer"});
        assert!(is_valid(&schema, &json!(3)).unwrap());
        assert!(is_valid(&schema, &json!(3.0)).unwrap());
        assert!(!is_valid(&schema, &json!(3.5)).unwrap());
    }

    #[test]
    fn test_type_union() {
        let schema = json!({"type": ["string", "null"]});
        assert!(is_valid(&schema, &json!("x")).unwrap());
        assert!(is_valid(&schema, &json!(null)).unwrap());
        assert!(!is_valid(&schema, &json!([])).unwrap());
    }

    #[test]
    fn test_type_rejects_unknown_tag() {
        let err = validate(&json!({"type": "decimal"}), &json!(1)).unwrap_err();
        assert!(err.to_string().contains("decimal"));
    }

    #[test]
    fn test_enum_uses_structural_equality() {
        let schema = json!({"enum": [{"a": 1, "b": 2}, 7]});
        assert!(is_valid(&schema, &json!({"b": 2, "a": 1})).unwrap());
        assert!(is_valid(&schema, &json!(7.0)).unwrap());
        assert!(!is_valid(&schema, &json!({"a": 1})).unwrap());
    }

    #[test]
    fn test_const_null_via_singleton() {
        let schema = json!({"const": null});
        assert!(is_valid(&schema, &json!(null)).unwrap());
        assert!(!is_valid(&schema, &json!(0)).unwrap());
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = json!({"minimum": 0, "exclusiveMaximum": 10});
        assert!(is_valid(&schema, &json!(0)).unwrap());
        assert!(is_valid(&schema, &json!(9.5)).unwrap());
        assert!(!is_valid(&schema, &json!(10)).unwrap());
        assert!(!is_valid(&schema, &json!(-0.5)).unwrap());
    }

    #[test]
    fn test_bounds_compare_across_lexical_forms() {
        let schema = json!({"maximum": 5});
        assert!(is_valid(&schema, &json!(5.0)).unwrap());
        assert!(!is_valid(&schema, &json!(5.00001)).unwrap());
    }

    #[test]
    fn test_multiple_of() {
        let schema = json!({"multipleOf": 1.5});
        assert!(is_valid(&schema, &json!(4.5)).unwrap());
        assert!(is_valid(&schema, &json!(3)).unwrap());
        assert!(!is_valid(&schema, &json!(4)).unwrap());
    }

    #[test]
    fn test_multiple_of_rejects_non_positive_divisor() {
        assert!(validate(&json!({"multipleOf": 0}), &json!(1)).is_err());
        assert!(validate(&json!({"multipleOf": -2}), &json!(1)).is_err());
    }

    #[test]
    fn test_string_lengths_in_utf16_units() {
        let schema = json!({"minLength": 2, "maxLength": 2});
        assert!(is_valid(&schema, &json!("ab")).unwrap());
        // One astral code point occupies two UTF-16 units.
        assert!(is_valid(&schema, &json!("\u{1F600}")).unwrap());
        assert!(!is_valid(&schema, &json!("a")).unwrap());
    }

    #[test]
    fn test_assertions_skip_other_kinds() {
        let schema = json!({"minLength": 2, "minimum": 10, "minItems": 3});
        // Wrong-kind instances are vacuously valid for every assertion.
        assert!(is_valid(&schema, &json!(true)).unwrap());
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let schema = json!({"pattern": "b+c"});
        assert!(is_valid(&schema, &json!("abbbcd")).unwrap());
        assert!(!is_valid(&schema, &json!("abd")).unwrap());
    }

    #[test]
    fn test_unique_items_structural() {
        let schema = json!({"uniqueItems": true});
        assert!(!is_valid(&schema, &json!([1, 1.0])).unwrap());
        assert!(!is_valid(&schema, &json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}])).unwrap());
        assert!(is_valid(&schema, &json!([1, 2, "1"])).unwrap());
    }

    #[test]
    fn test_required_lists_all_missing() {
        let report = validate(
            &json!({"required": ["a", "b", "c"]}),
            &json!({"b": 1}),
        )
        .unwrap();
        assert!(!report.valid());
        let failures = report.root().failures();
        let message = failures
            .iter()
            .find_map(|n| n.error.as_deref())
            .unwrap_or_default();
        assert!(message.contains('a') && message.contains('c'));
    }

    #[test]
    fn test_dependent_required() {
        let schema = json!({"dependentRequired": {"credit_card": ["billing_address"]}});
        assert!(is_valid(&schema, &json!({"credit_card": 1, "billing_address": "x"})).unwrap());
        assert!(!is_valid(&schema, &json!({"credit_card": 1})).unwrap());
        assert!(is_valid(&schema, &json!({"name": "n"})).unwrap());
    }

    #[test]
    fn test_format_is_annotation_only() {
        let schema = json!({"format": "email"});
        assert!(is_valid(&schema, &json!("not-an-email")).unwrap());
    }
}
