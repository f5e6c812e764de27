//! Validation context tree
//!
//! A context is one node of the tree built during validation. Children
//! inherit the roots, the registry and (unless a reference re-bases it) the
//! current URI. A child's validity never leaks upward on its own; the parent
//! keyword aggregates explicitly. `instance_location` always addresses
//! `local_instance` from `instance_root`.

use std::collections::BTreeMap;

use serde_json::Value;

use super::options::ValidationOptions;
use crate::pointer::JsonPointer;
use crate::schema::{SchemaId, SchemaRegistry};
use crate::value::NameSet;

/// A value produced by a keyword, readable by later keywords in the same
/// context and mergeable into parents.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// Coverage flag (`items`, `if` outcome)
    Bool(bool),
    /// Covered-item count (`prefixItems`, `contains`)
    Count(u64),
    /// Evaluated property names (`properties` family)
    Names(NameSet),
    /// Free text (`format`)
    Text(String),
}

impl AnnotationValue {
    /// Merge rule: sets union, counts take the maximum, `true` absorbs
    /// counts, text is write-once. Merging is idempotent.
    pub fn merge(&mut self, other: &AnnotationValue) {
        match (&mut *self, other) {
            (AnnotationValue::Names(mine), AnnotationValue::Names(theirs)) => {
                mine.extend(theirs.iter().cloned());
            }
            (AnnotationValue::Count(mine), AnnotationValue::Count(theirs)) => {
                *mine = (*mine).max(*theirs);
            }
            (AnnotationValue::Count(_), AnnotationValue::Bool(true)) => {
                *self = AnnotationValue::Bool(true);
            }
            (AnnotationValue::Bool(mine), AnnotationValue::Bool(theirs)) => {
                *mine = *mine || *theirs;
            }
            // Bool(true) already absorbs counts; everything else keeps the
            // first write.
            _ => {}
        }
    }

    /// Renders the annotation for the output tree.
    pub fn to_value(&self) -> Value {
        match self {
            AnnotationValue::Bool(b) => Value::Bool(*b),
            AnnotationValue::Count(n) => Value::Number((*n).into()),
            AnnotationValue::Names(names) => Value::Array(
                names
                    .iter()
                    .map(|n| Value::String(n.clone()))
                    .collect(),
            ),
            AnnotationValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// One node of the validation tree.
#[derive(Debug)]
pub struct ValidationContext<'e> {
    /// The whole instance document
    pub instance_root: &'e Value,
    /// The node currently being evaluated
    pub local_instance: &'e Value,
    /// Location of `local_instance` within `instance_root`
    pub instance_location: JsonPointer,
    /// Root of the schema document being applied
    pub schema_root: SchemaId,
    /// Location within the schema as the caller wrote it (grows through
    /// references)
    pub schema_location: JsonPointer,
    /// Location within the document named by `current_uri` (resets at
    /// reference targets)
    pub absolute_location: JsonPointer,
    /// Base URI for resolving references from here
    pub current_uri: String,
    /// The run's options
    pub options: ValidationOptions,
    /// The schema registry, shared across the run
    pub registry: &'e SchemaRegistry,
    /// Annotations visible here: inherited from prior keywords plus own
    pub annotations: BTreeMap<String, AnnotationValue>,
    /// Child contexts in evaluation order
    pub nested: Vec<ValidationContext<'e>>,
    /// Outcome; starts valid, failures are explicit
    pub is_valid: bool,
    /// Failure message, when invalid
    pub message: Option<String>,
    own_annotations: BTreeMap<String, AnnotationValue>,
}

impl<'e> ValidationContext<'e> {
    /// The root context for one validation run.
    pub fn root(
        instance: &'e Value,
        schema_root: SchemaId,
        current_uri: String,
        options: ValidationOptions,
        registry: &'e SchemaRegistry,
    ) -> Self {
        Self {
            instance_root: instance,
            local_instance: instance,
            instance_location: JsonPointer::root(),
            schema_root,
            schema_location: JsonPointer::root(),
            absolute_location: JsonPointer::root(),
            current_uri,
            options,
            registry,
            annotations: BTreeMap::new(),
            nested: Vec::new(),
            is_valid: true,
            message: None,
            own_annotations: BTreeMap::new(),
        }
    }

    fn child(
        &self,
        local_instance: &'e Value,
        instance_location: JsonPointer,
        schema_location: JsonPointer,
        absolute_location: JsonPointer,
        annotations: BTreeMap<String, AnnotationValue>,
    ) -> Self {
        Self {
            instance_root: self.instance_root,
            local_instance,
            instance_location,
            schema_root: self.schema_root,
            schema_location,
            absolute_location,
            current_uri: self.current_uri.clone(),
            options: self.options,
            registry: self.registry,
            annotations,
            nested: Vec::new(),
            is_valid: true,
            message: None,
            own_annotations: BTreeMap::new(),
        }
    }

    /// Frame for one keyword of this schema object. Prior-keyword
    /// annotations are visible in it.
    pub fn keyword_child(&self, keyword: &str) -> Self {
        self.child(
            self.local_instance,
            self.instance_location.clone(),
            self.schema_location.push(keyword),
            self.absolute_location.push(keyword),
            self.annotations.clone(),
        )
    }

    /// Sub-schema frame against the same instance node (`allOf/0`, `not`,
    /// a reference target, ...). Annotation scope starts fresh.
    pub fn in_place_child(&self, schema_segment: Option<&str>) -> Self {
        let (schema_location, absolute_location) = match schema_segment {
            Some(seg) => (self.schema_location.push(seg), self.absolute_location.push(seg)),
            None => (self.schema_location.clone(), self.absolute_location.clone()),
        };
        self.child(
            self.local_instance,
            self.instance_location.clone(),
            schema_location,
            absolute_location,
            BTreeMap::new(),
        )
    }

    /// Sub-schema frame for an array item.
    pub fn item_child(
        &self,
        item: &'e Value,
        index: usize,
        schema_segment: Option<&str>,
    ) -> Self {
        let (schema_location, absolute_location) = match schema_segment {
            Some(seg) => (self.schema_location.push(seg), self.absolute_location.push(seg)),
            None => (self.schema_location.clone(), self.absolute_location.clone()),
        };
        self.child(
            item,
            self.instance_location.push_index(index),
            schema_location,
            absolute_location,
            BTreeMap::new(),
        )
    }

    /// Sub-schema frame for an object member.
    pub fn member_child(
        &self,
        member: &'e Value,
        name: &str,
        schema_segment: Option<&str>,
    ) -> Self {
        let (schema_location, absolute_location) = match schema_segment {
            Some(seg) => (self.schema_location.push(seg), self.absolute_location.push(seg)),
            None => (self.schema_location.clone(), self.absolute_location.clone()),
        };
        self.child(
            member,
            self.instance_location.push(name),
            schema_location,
            absolute_location,
            BTreeMap::new(),
        )
    }

    /// Marks this context invalid with a message. The first message wins.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        if self.message.is_none() {
            self.message = Some(message.into());
        }
    }

    /// Records an annotation, write-once per keyword name with idempotent
    /// merging on repeats.
    pub fn annotate(&mut self, keyword: &str, value: AnnotationValue) {
        match self.own_annotations.get_mut(keyword) {
            Some(existing) => existing.merge(&value),
            None => {
                self.own_annotations.insert(keyword.to_string(), value.clone());
            }
        }
        match self.annotations.get_mut(keyword) {
            Some(existing) => existing.merge(&value),
            None => {
                self.annotations.insert(keyword.to_string(), value);
            }
        }
    }

    /// Annotations this node itself produced (inherited ones excluded).
    pub fn own_annotations(&self) -> &BTreeMap<String, AnnotationValue> {
        &self.own_annotations
    }

    /// Merges the annotations a valid child produced into this context.
    pub fn absorb(&mut self, child_annotations: &BTreeMap<String, AnnotationValue>) {
        let collected: Vec<(String, AnnotationValue)> = child_annotations
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (keyword, value) in collected {
            self.annotate(&keyword, value);
        }
    }

    /// Consolidation for in-place applicators: pull every valid child's own
    /// annotations up onto this frame.
    pub fn absorb_valid_children(&mut self) {
        let collected: Vec<(String, AnnotationValue)> = self
            .nested
            .iter()
            .filter(|child| child.is_valid)
            .flat_map(|child| {
                child
                    .own_annotations
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect();
        for (keyword, value) in collected {
            self.annotate(&keyword, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> AnnotationValue {
        AnnotationValue::Names(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_merge_unions_name_sets() {
        let mut a = names(&["a"]);
        a.merge(&names(&["b", "a"]));
        assert_eq!(a, names(&["a", "b"]));
    }

    #[test]
    fn test_merge_takes_count_maximum() {
        let mut a = AnnotationValue::Count(2);
        a.merge(&AnnotationValue::Count(5));
        assert_eq!(a, AnnotationValue::Count(5));
        a.merge(&AnnotationValue::Count(1));
        assert_eq!(a, AnnotationValue::Count(5));
    }

    #[test]
    fn test_true_absorbs_counts() {
        let mut a = AnnotationValue::Count(3);
        a.merge(&AnnotationValue::Bool(true));
        assert_eq!(a, AnnotationValue::Bool(true));
        // Once true, counts no longer lower it.
        a.merge(&AnnotationValue::Count(1));
        assert_eq!(a, AnnotationValue::Bool(true));
    }

    #[test]
    fn test_text_is_write_once() {
        let mut a = AnnotationValue::Text("email".to_string());
        a.merge(&AnnotationValue::Text("uri".to_string()));
        assert_eq!(a, AnnotationValue::Text("email".to_string()));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut a = names(&["a", "b"]);
        let snapshot = a.clone();
        a.merge(&snapshot.clone());
        assert_eq!(a, snapshot);
    }

    #[test]
    fn test_first_failure_message_wins() {
        let registry = SchemaRegistry::new();
        let instance = serde_json::json!(null);
        let mut arena_holder = crate::schema::SchemaArena::new();
        let id = arena_holder.alloc(crate::schema::Schema::Bool(true));
        let mut ctx = ValidationContext::root(
            &instance,
            id,
            "https://schemas.invalid/x.json".to_string(),
            ValidationOptions::default(),
            &registry,
        );
        ctx.fail("first");
        ctx.fail("second");
        assert!(!ctx.is_valid);
        assert_eq!(ctx.message.as_deref(), Some("first"));
    }
}
