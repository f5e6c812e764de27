//! In-memory schema representation
//!
//! A schema is either a boolean or an ordered collection of parsed keyword
//! instances plus verbatim pass-through for unrecognized members. Every node
//! lives in a [`SchemaArena`]; keyword payloads hold [`SchemaId`] indices, so
//! the same node can appear in several places and recursive reference graphs
//! cycle only through URI indirection, never through ownership.

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use crate::keywords::{ItemsForm, Keyword, KeywordRegistry};
use crate::value::{self, ValueKind};

/// Arena index of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(u32);

impl SchemaId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owning store for every schema node parsed into a registry.
#[derive(Debug, Default)]
pub struct SchemaArena {
    nodes: Vec<Schema>,
}

impl SchemaArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a node and returns its index.
    pub fn alloc(&mut self, schema: Schema) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(schema);
        id
    }

    /// Borrows a node.
    ///
    /// Ids are only minted by `alloc`, so an out-of-range index is an
    /// internal invariant violation and panics.
    pub fn get(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.index()]
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been parsed yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Semantic equality: boolean schemas by value, structured schemas by
    /// multiset of keyword instances (order irrelevant) plus identical
    /// unrecognized-property mappings.
    pub fn schema_eq(&self, a: SchemaId, b: SchemaId) -> bool {
        match (self.get(a), self.get(b)) {
            (Schema::Bool(x), Schema::Bool(y)) => x == y,
            (Schema::Object(x), Schema::Object(y)) => self.object_eq(x, y),
            _ => false,
        }
    }

    fn object_eq(&self, x: &SchemaObject, y: &SchemaObject) -> bool {
        if x.keywords.len() != y.keywords.len() || x.extras.len() != y.extras.len() {
            return false;
        }
        for (name, raw) in &x.extras {
            let Some((_, other)) = y.extras.iter().find(|(n, _)| n == name) else {
                return false;
            };
            if !value::json_equal(raw, other) {
                return false;
            }
        }
        let mut used = vec![false; y.keywords.len()];
        'outer: for keyword in &x.keywords {
            for (i, candidate) in y.keywords.iter().enumerate() {
                if !used[i] && self.keyword_eq(keyword, candidate) {
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }

    fn list_eq(&self, a: &[SchemaId], b: &[SchemaId]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.schema_eq(*x, *y))
    }

    fn named_eq(&self, a: &[(String, SchemaId)], b: &[(String, SchemaId)]) -> bool {
        a.len() == b.len()
            && a.iter().all(|(name, id)| {
                b.iter()
                    .any(|(n, other)| n == name && self.schema_eq(*id, *other))
            })
    }

    fn keyword_eq(&self, x: &Keyword, y: &Keyword) -> bool {
        use Keyword::*;
        match (x, y) {
            (SchemaUri(a), SchemaUri(b))
            | (Id(a), Id(b))
            | (Anchor(a), Anchor(b))
            | (Comment(a), Comment(b))
            | (Ref(a), Ref(b))
            | (Format(a), Format(b)) => a == b,
            (Defs(a), Defs(b))
            | (Definitions(a), Definitions(b))
            | (DependentSchemas(a), DependentSchemas(b))
            | (Properties(a), Properties(b)) => self.named_eq(a, b),
            (PatternProperties(a), PatternProperties(b)) => {
                a.len() == b.len()
                    && a.iter().all(|p| {
                        b.iter()
                            .any(|q| p.pattern == q.pattern && self.schema_eq(p.schema, q.schema))
                    })
            }
            (AllOf(a), AllOf(b))
            | (AnyOf(a), AnyOf(b))
            | (OneOf(a), OneOf(b))
            | (PrefixItems(a), PrefixItems(b)) => self.list_eq(a, b),
            (Not(a), Not(b))
            | (If(a), If(b))
            | (Then(a), Then(b))
            | (Else(a), Else(b))
            | (AdditionalProperties(a), AdditionalProperties(b))
            | (AdditionalItems(a), AdditionalItems(b))
            | (Contains(a), Contains(b)) => self.schema_eq(*a, *b),
            (Items(ItemsForm::Single(a)), Items(ItemsForm::Single(b))) => self.schema_eq(*a, *b),
            (Items(ItemsForm::Positional(a)), Items(ItemsForm::Positional(b))) => {
                self.list_eq(a, b)
            }
            (Type(a), Type(b)) => a == b,
            (Enum(a), Enum(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(u, v)| value::json_equal(u, v))
            }
            (Const(a), Const(b)) => value::json_equal(a, b),
            (MultipleOf(a), MultipleOf(b))
            | (Maximum(a), Maximum(b))
            | (ExclusiveMaximum(a), ExclusiveMaximum(b))
            | (Minimum(a), Minimum(b))
            | (ExclusiveMinimum(a), ExclusiveMinimum(b)) => value::number_eq(a, b),
            (MaxLength(a), MaxLength(b))
            | (MinLength(a), MinLength(b))
            | (MaxItems(a), MaxItems(b))
            | (MinItems(a), MinItems(b))
            | (MaxProperties(a), MaxProperties(b))
            | (MinProperties(a), MinProperties(b)) => a == b,
            (UniqueItems(a), UniqueItems(b)) => a == b,
            (Required(a), Required(b)) => a == b,
            (DependentRequired(a), DependentRequired(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, needed)| b.iter().any(|(n, o)| n == name && o == needed))
            }
            (Custom(a), Custom(b)) => a == b,
            _ => false,
        }
    }
}

/// Structured schema body: parsed keywords in source order plus unrecognized
/// members kept verbatim for round-tripping and custom vocabularies.
#[derive(Debug, Clone, Default)]
pub struct SchemaObject {
    keywords: Vec<Keyword>,
    extras: Vec<(String, Value)>,
}

impl SchemaObject {
    /// Parsed keyword instances in source order.
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Unrecognized members, verbatim, in source order.
    pub fn extras(&self) -> &[(String, Value)] {
        &self.extras
    }

    /// Finds a keyword by its document name.
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.name() == name)
    }

    /// The `$id` payload, when present.
    pub fn identifier(&self) -> Option<&str> {
        self.keywords.iter().find_map(|k| match k {
            Keyword::Id(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// The `$anchor` payload, when present.
    pub fn anchor(&self) -> Option<&str> {
        self.keywords.iter().find_map(|k| match k {
            Keyword::Anchor(a) => Some(a.as_str()),
            _ => None,
        })
    }

    /// Every directly embedded sub-schema, for registration scans.
    pub fn subschema_ids(&self) -> Vec<SchemaId> {
        self.keywords.iter().flat_map(|k| k.subschemas()).collect()
    }

    /// True when there are no keywords and no extras (equivalent to `true`).
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.extras.is_empty()
    }
}

/// A schema node: boolean or structured.
#[derive(Debug, Clone)]
pub enum Schema {
    /// `true` accepts everything, `false` rejects everything
    Bool(bool),
    /// Keyword collection plus pass-through members
    Object(SchemaObject),
}

impl Schema {
    /// Parses a raw JSON schema document into the arena, returning the root
    /// node's id. Member names are resolved through the keyword registry;
    /// unrecognized members become pass-through data.
    pub fn parse_into(
        raw: &Value,
        arena: &mut SchemaArena,
        keywords: &KeywordRegistry,
    ) -> SchemaResult<SchemaId> {
        match raw {
            Value::Bool(b) => Ok(arena.alloc(Schema::Bool(*b))),
            Value::Object(members) => {
                let mut parsed = Vec::new();
                let mut extras = Vec::new();
                for (name, entry) in members {
                    let Some(descriptor) = keywords.lookup(name) else {
                        extras.push((name.clone(), entry.clone()));
                        continue;
                    };
                    let keyword = if entry.is_null() {
                        match descriptor.null_instance {
                            Some(singleton) => singleton(),
                            None => run_parser(descriptor, entry, arena, keywords, name)?,
                        }
                    } else {
                        run_parser(descriptor, entry, arena, keywords, name)?
                    };
                    parsed.push(keyword);
                }
                Ok(arena.alloc(Schema::Object(SchemaObject {
                    keywords: parsed,
                    extras,
                })))
            }
            other => Err(SchemaError::InvalidDocument {
                kind: ValueKind::of(other).as_str(),
            }),
        }
    }

    /// True for a boolean schema.
    pub fn is_bool(&self) -> bool {
        matches!(self, Schema::Bool(_))
    }

    /// Reconstructs the raw JSON document: parsed keywords first in stored
    /// order, then pass-through members.
    pub fn to_value(&self, arena: &SchemaArena) -> Value {
        match self {
            Schema::Bool(b) => Value::Bool(*b),
            Schema::Object(obj) => {
                let mut out = serde_json::Map::new();
                for keyword in &obj.keywords {
                    out.insert(keyword.name().to_string(), keyword.to_raw(arena));
                }
                for (name, raw) in &obj.extras {
                    out.insert(name.clone(), raw.clone());
                }
                Value::Object(out)
            }
        }
    }
}

fn run_parser(
    descriptor: &crate::keywords::KeywordDescriptor,
    entry: &Value,
    arena: &mut SchemaArena,
    keywords: &KeywordRegistry,
    name: &str,
) -> SchemaResult<Keyword> {
    let parser = descriptor.parser.clone();
    let mut ctx = ParseCtx { arena, keywords };
    parser(entry, &mut ctx).map_err(|cause| SchemaError::parse(name, cause))
}

/// Parser context handed to keyword parsers so payloads can embed
/// sub-schemas.
pub struct ParseCtx<'a> {
    arena: &'a mut SchemaArena,
    keywords: &'a KeywordRegistry,
}

impl<'a> ParseCtx<'a> {
    /// Parses an embedded sub-schema into the arena.
    pub fn subschema(&mut self, raw: &Value) -> SchemaResult<SchemaId> {
        Schema::parse_into(raw, self.arena, self.keywords)
    }
}
