//! Schema registry and reference resolution
//!
//! Maps absolute URIs to schema nodes. Registration parses the document into
//! the shared arena and walks keyword interiors, re-basing and indexing every
//! embedded `$id` and recording every `$anchor`. The registry is immutable
//! during validation; populating it from external sources is the caller's
//! responsibility.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::SchemaResult;
use super::model::{Schema, SchemaArena, SchemaId};
use crate::keywords::KeywordRegistry;
use crate::observability::Logger;
use crate::pointer::JsonPointer;

/// URI → schema mapping plus the anchor table.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    arena: SchemaArena,
    by_uri: HashMap<String, SchemaId>,
    anchors: HashMap<(String, String), SchemaId>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The arena holding every parsed node.
    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    /// Borrows a schema node.
    pub fn schema(&self, id: SchemaId) -> &Schema {
        self.arena.get(id)
    }

    /// Parses and indexes a schema document under `uri` (any fragment is
    /// dropped). Embedded `$id`s are registered against the enclosing base;
    /// `$anchor`s land in the anchor table. Re-registering a URI replaces
    /// the binding.
    pub fn register(
        &mut self,
        uri: &str,
        raw: &Value,
        keywords: &KeywordRegistry,
    ) -> SchemaResult<SchemaId> {
        let root = Schema::parse_into(raw, &mut self.arena, keywords)?;
        let (base, _) = split_fragment(uri);
        self.by_uri.insert(base.to_string(), root);
        self.scan_identifiers(root, base);
        Logger::info("SCHEMA_REGISTERED", &[("uri", base)]);
        Ok(root)
    }

    /// Finds the schema registered under a fragment-less URI.
    pub fn lookup(&self, uri: &str) -> Option<SchemaId> {
        self.by_uri.get(split_fragment(uri).0).copied()
    }

    /// Finds a `$anchor` target within the document registered at `base`.
    pub fn lookup_anchor(&self, base: &str, anchor: &str) -> Option<SchemaId> {
        self.anchors
            .get(&(base.to_string(), anchor.to_string()))
            .copied()
    }

    /// Number of registered URIs.
    pub fn len(&self) -> usize {
        self.by_uri.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_uri.is_empty()
    }

    /// Walks a JSON Pointer through keyword interiors one segment at a time.
    ///
    /// A segment first selects a keyword by name; keywords with a single
    /// sub-schema resolve directly, map- and list-valued keywords consume
    /// the following segment (strict integer parsing, no leading zeros).
    /// Returns `None` as soon as any segment fails to resolve.
    pub fn resolve_pointer(&self, root: SchemaId, pointer: &JsonPointer) -> Option<SchemaId> {
        let mut node = root;
        let mut segments = pointer.segments().iter();
        while let Some(segment) = segments.next() {
            let Schema::Object(obj) = self.arena.get(node) else {
                return None;
            };
            let keyword = obj.keyword(segment)?;
            node = match keyword.direct_subschema() {
                Some(direct) => direct,
                None => keyword.resolve_segment(segments.next()?)?,
            };
        }
        Some(node)
    }

    fn scan_identifiers(&mut self, root: SchemaId, base: &str) {
        let mut stack = vec![(root, base.to_string())];
        while let Some((id, base)) = stack.pop() {
            let Schema::Object(obj) = self.arena.get(id) else {
                continue;
            };
            let mut current = base;
            if let Some(identifier) = obj.identifier() {
                if let Some(anchor) = identifier.strip_prefix('#') {
                    // Pre-2019 drafts spell anchors as fragment-only $ids.
                    self.anchors
                        .insert((current.clone(), anchor.to_string()), id);
                } else {
                    let (rebased, _) = resolve_reference(&current, identifier);
                    self.by_uri.insert(rebased.clone(), id);
                    current = rebased;
                }
            }
            if let Some(anchor) = obj.anchor() {
                self.anchors
                    .insert((current.clone(), anchor.to_string()), id);
            }
            for child in obj.subschema_ids() {
                stack.push((child, current.clone()));
            }
        }
    }
}

/// Splits a URI reference at its fragment marker.
pub(crate) fn split_fragment(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (reference, None),
    }
}

fn is_absolute(reference: &str) -> bool {
    reference.contains("://") || reference.starts_with("urn:")
}

/// Resolves a (possibly relative) reference against a base URI, returning
/// the absolute fragment-less target plus the fragment.
pub(crate) fn resolve_reference(base: &str, reference: &str) -> (String, Option<String>) {
    let (head, fragment) = split_fragment(reference);
    let fragment = fragment.map(str::to_string);
    let (base_head, _) = split_fragment(base);
    if head.is_empty() {
        return (base_head.to_string(), fragment);
    }
    if is_absolute(head) {
        return (head.to_string(), fragment);
    }
    (join(base_head, head), fragment)
}

fn join(base: &str, relative: &str) -> String {
    if let Some(rest) = relative.strip_prefix('/') {
        // Authority-relative: keep scheme and authority, replace the path.
        if let Some(scheme_end) = base.find("://") {
            let authority = &base[scheme_end + 3..];
            let authority_end = authority
                .find('/')
                .map(|i| scheme_end + 3 + i)
                .unwrap_or(base.len());
            return normalize(&format!("{}/{}", &base[..authority_end], rest));
        }
        return relative.to_string();
    }
    let cut = match base.rfind('/') {
        Some(i) if base.find("://").map_or(true, |s| i > s + 2) => i,
        _ => base.len(),
    };
    normalize(&format!("{}/{}", &base[..cut], relative))
}

fn normalize(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let after = &uri[scheme_end + 3..];
    let Some(path_start) = after.find('/') else {
        return uri.to_string();
    };
    let split_at = scheme_end + 3 + path_start;
    let (prefix, path) = uri.split_at(split_at);
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            s => segments.push(s),
        }
    }
    format!("{}{}", prefix, segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with(uri: &str, raw: Value) -> (SchemaRegistry, SchemaId) {
        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let id = registry.register(uri, &raw, &keywords).unwrap();
        (registry, id)
    }

    #[test]
    fn test_register_and_lookup() {
        let (registry, id) =
            registry_with("https://schemas.invalid/a.json", json!({"type": "string"}));
        assert_eq!(registry.lookup("https://schemas.invalid/a.json"), Some(id));
        assert_eq!(registry.lookup("https://schemas.invalid/a.json#"), Some(id));
        assert_eq!(registry.lookup("https://schemas.invalid/other.json"), None);
    }

    #[test]
    fn test_embedded_id_is_registered_against_base() {
        let (registry, root) = registry_with(
            "https://schemas.invalid/root.json",
            json!({
                "properties": {
                    "leaf": {"$id": "leaf.json", "type": "number"}
                }
            }),
        );
        let leaf = registry.lookup("https://schemas.invalid/leaf.json").unwrap();
        assert_ne!(leaf, root);
        let pointed = registry
            .resolve_pointer(root, &JsonPointer::parse("/properties/leaf").unwrap())
            .unwrap();
        assert_eq!(pointed, leaf);
    }

    #[test]
    fn test_anchor_table() {
        let (registry, _) = registry_with(
            "https://schemas.invalid/root.json",
            json!({
                "$defs": {
                    "name": {"$anchor": "name", "type": "string"}
                }
            }),
        );
        assert!(registry
            .lookup_anchor("https://schemas.invalid/root.json", "name")
            .is_some());
        assert!(registry
            .lookup_anchor("https://schemas.invalid/root.json", "missing")
            .is_none());
    }

    #[test]
    fn test_fragment_only_id_acts_as_anchor() {
        let (registry, _) = registry_with(
            "https://schemas.invalid/root.json",
            json!({
                "definitions": {
                    "name": {"$id": "#name", "type": "string"}
                }
            }),
        );
        assert!(registry
            .lookup_anchor("https://schemas.invalid/root.json", "name")
            .is_some());
    }

    #[test]
    fn test_pointer_walk_through_keyword_interiors() {
        let (registry, root) = registry_with(
            "https://schemas.invalid/root.json",
            json!({
                "oneOf": [
                    {"items": {"type": "string"}},
                    {"properties": {"a": {"type": "number"}}}
                ]
            }),
        );
        let items = registry
            .resolve_pointer(root, &JsonPointer::parse("/oneOf/0/items").unwrap())
            .unwrap();
        assert!(matches!(registry.schema(items), Schema::Object(_)));
        let a = registry
            .resolve_pointer(root, &JsonPointer::parse("/oneOf/1/properties/a").unwrap());
        assert!(a.is_some());
        assert!(registry
            .resolve_pointer(root, &JsonPointer::parse("/oneOf/2").unwrap())
            .is_none());
        assert!(registry
            .resolve_pointer(root, &JsonPointer::parse("/oneOf/01").unwrap())
            .is_none());
        assert!(registry
            .resolve_pointer(root, &JsonPointer::parse("/nope").unwrap())
            .is_none());
    }

    #[test]
    fn test_replacing_a_binding() {
        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let first = registry
            .register("https://schemas.invalid/a.json", &json!(true), &keywords)
            .unwrap();
        let second = registry
            .register("https://schemas.invalid/a.json", &json!(false), &keywords)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.lookup("https://schemas.invalid/a.json"), Some(second));
    }

    #[test]
    fn test_resolve_reference_rules() {
        let base = "https://schemas.invalid/dir/main.json";
        assert_eq!(
            resolve_reference(base, "#/$defs/x"),
            (
                "https://schemas.invalid/dir/main.json".to_string(),
                Some("/$defs/x".to_string())
            )
        );
        assert_eq!(
            resolve_reference(base, "other.json"),
            ("https://schemas.invalid/dir/other.json".to_string(), None)
        );
        assert_eq!(
            resolve_reference(base, "../top.json#frag"),
            (
                "https://schemas.invalid/top.json".to_string(),
                Some("frag".to_string())
            )
        );
        assert_eq!(
            resolve_reference(base, "/rooted.json"),
            ("https://schemas.invalid/rooted.json".to_string(), None)
        );
        assert_eq!(
            resolve_reference(base, "https://elsewhere.invalid/s.json"),
            ("https://elsewhere.invalid/s.json".to_string(), None)
        );
    }
}
