//! Reference and identifier keyword parsers and the `$ref` evaluator
//!
//! `$id`, `$anchor` and the definition containers are lexical: they shape
//! registration and URI re-basing but assert nothing at validation time.
//! `$ref` is the only keyword here that recurses.

use serde_json::Value;

use super::{kind_name, Keyword};
use crate::observability::Logger;
use crate::pointer::JsonPointer;
use crate::schema::{registry, ParseCtx, SchemaId};
use crate::validation::{AnnotationValue, Driver, ValidationContext};

// ==================
// Parsers
// ==================

fn expect_string(raw: &Value) -> Result<String, String> {
    raw.as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("must be a string, got {}", kind_name(raw)))
}

fn named_schemas(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Vec<(String, SchemaId)>, String> {
    let members = raw
        .as_object()
        .ok_or_else(|| format!("must be an object of schemas, got {}", kind_name(raw)))?;
    let mut out = Vec::with_capacity(members.len());
    for (name, entry) in members {
        out.push((name.clone(), ctx.subschema(entry).map_err(|e| e.to_string())?));
    }
    Ok(out)
}

pub(crate) fn parse_schema_uri(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::SchemaUri(expect_string(raw)?))
}

pub(crate) fn parse_id(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let id = expect_string(raw)?;
    if id.is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(Keyword::Id(id))
}

pub(crate) fn parse_anchor(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    let anchor = expect_string(raw)?;
    if anchor.is_empty() || anchor.contains('#') {
        return Err("must be a plain name without '#'".to_string());
    }
    Ok(Keyword::Anchor(anchor))
}

pub(crate) fn parse_comment(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Comment(expect_string(raw)?))
}

pub(crate) fn parse_defs(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Defs(named_schemas(raw, ctx)?))
}

pub(crate) fn parse_definitions(raw: &Value, ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Definitions(named_schemas(raw, ctx)?))
}

pub(crate) fn parse_ref(raw: &Value, _ctx: &mut ParseCtx<'_>) -> Result<Keyword, String> {
    Ok(Keyword::Ref(expect_string(raw)?))
}

// ==================
// Evaluators
// ==================

pub(crate) fn eval_format(format: &str, ctx: &mut ValidationContext<'_>) {
    ctx.annotate("format", AnnotationValue::Text(format.to_string()));
}

/// Resolves the reference against the context's base URI and evaluates the
/// target against the same instance node. Unresolvable targets fail the
/// context; re-entering an active (target, instance location) frame
/// short-circuits to valid so recursive schemas terminate.
pub(crate) fn eval_ref<'e>(
    reference: &str,
    driver: &mut Driver<'e>,
    ctx: &mut ValidationContext<'e>,
) {
    let (target_uri, fragment) = registry::resolve_reference(&ctx.current_uri, reference);

    let unresolved = |ctx: &mut ValidationContext<'e>| {
        Logger::warn(
            "REF_UNRESOLVED",
            &[
                ("reference", reference),
                ("base", &ctx.current_uri),
            ],
        );
        ctx.fail(format!(
            "reference '{target_uri}{}' cannot be resolved",
            fragment
                .as_deref()
                .map(|f| format!("#{f}"))
                .unwrap_or_default()
        ));
    };

    let Some(root) = ctx.registry.lookup(&target_uri) else {
        unresolved(ctx);
        return;
    };

    let mut target_location = JsonPointer::root();
    let target = match fragment.as_deref() {
        None | Some("") => root,
        Some(frag) if frag.starts_with('/') => {
            let Ok(pointer) = JsonPointer::parse(frag) else {
                unresolved(ctx);
                return;
            };
            match ctx.registry.resolve_pointer(root, &pointer) {
                Some(id) => {
                    target_location = pointer;
                    id
                }
                None => {
                    unresolved(ctx);
                    return;
                }
            }
        }
        Some(anchor) => match ctx.registry.lookup_anchor(&target_uri, anchor) {
            Some(id) => id,
            None => {
                unresolved(ctx);
                return;
            }
        },
    };

    let frame = (
        format!(
            "{target_uri}#{}",
            fragment.as_deref().unwrap_or_default()
        ),
        ctx.instance_location.to_string(),
    );
    if !driver.enter_ref(&frame) {
        // Active frame re-entered: the recursion bottoms out as valid.
        return;
    }

    let mut child = ctx.in_place_child(None);
    child.current_uri = target_uri;
    child.schema_root = root;
    child.absolute_location = target_location;
    driver.evaluate(target, &mut child);
    driver.exit_ref(&frame);

    let ok = child.is_valid;
    ctx.nested.push(child);
    if !ok {
        ctx.fail(format!("reference '{reference}' failed validation"));
    }
}
