//! Keyword variants and their static metadata
//!
//! Every recognized keyword is a variant of [`Keyword`], a closed enum whose
//! payloads are immutable after parsing. Sub-schemas are held as
//! [`SchemaId`] arena indices, never as owning pointers, so the same node can
//! be referenced from several places without ownership cycles.
//!
//! Per-variant metadata (name, priority, supported drafts, vocabulary) is
//! derived constants on the variant, not runtime attribute lookup. Custom
//! vocabularies plug in through [`Keyword::Custom`] without touching the
//! closed set.

mod applicators;
mod assertions;
mod references;
mod registry;

pub use registry::{
    priority, DraftSet, KeywordDescriptor, KeywordParser, KeywordRegistry, Vocabulary,
};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Number, Value};

use crate::schema::{SchemaArena, SchemaId};
use crate::validation::{Driver, ValidationContext};
use crate::value::{self, ValueKind};

/// Primitive type tags accepted by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl PrimitiveType {
    /// Parses a type tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "array" => Some(PrimitiveType::Array),
            "boolean" => Some(PrimitiveType::Boolean),
            "integer" => Some(PrimitiveType::Integer),
            "null" => Some(PrimitiveType::Null),
            "number" => Some(PrimitiveType::Number),
            "object" => Some(PrimitiveType::Object),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }

    /// Returns the published tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Array => "array",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Null => "null",
            PrimitiveType::Number => "number",
            PrimitiveType::Object => "object",
            PrimitiveType::String => "string",
        }
    }

    /// True when the instance satisfies this tag. `integer` accepts any
    /// mathematically integral number regardless of lexical form.
    pub fn matches(&self, instance: &Value) -> bool {
        match self {
            PrimitiveType::Array => instance.is_array(),
            PrimitiveType::Boolean => instance.is_boolean(),
            PrimitiveType::Null => instance.is_null(),
            PrimitiveType::Number => instance.is_number(),
            PrimitiveType::Object => instance.is_object(),
            PrimitiveType::String => instance.is_string(),
            PrimitiveType::Integer => match instance {
                Value::Number(n) => value::is_integral(n),
                _ => false,
            },
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-empty set of primitive type tags, the `type` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSet {
    tags: BTreeSet<PrimitiveType>,
}

impl TypeSet {
    /// Builds a set from tags; empty sets are rejected by the parser.
    pub fn new(tags: BTreeSet<PrimitiveType>) -> Self {
        Self { tags }
    }

    /// True when any tag matches the instance.
    pub fn matches(&self, instance: &Value) -> bool {
        self.tags.iter().any(|t| t.matches(instance))
    }

    /// Tag list for messages, alphabetical.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.tags.iter().map(|t| t.as_str()).collect();
        names.join(" or ")
    }

    /// The tags, ordered.
    pub fn tags(&self) -> impl Iterator<Item = &PrimitiveType> {
        self.tags.iter()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True when no tags are present.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A regex payload that remembers its source text.
///
/// Compiled once at parse time; equality and serialization go through the
/// source so `Regex`'s lack of `PartialEq` never leaks out.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles a pattern, reporting the engine's message on failure.
    pub fn compile(source: &str) -> Result<Self, String> {
        let regex = Regex::new(source).map_err(|e| e.to_string())?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The original pattern text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Unanchored match, as the drafts require.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// One `patternProperties` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    /// The member-name pattern
    pub pattern: CompiledPattern,
    /// Schema applied to matching member values
    pub schema: SchemaId,
}

/// The two historical shapes of `items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemsForm {
    /// One schema applied to every (remaining) item
    Single(SchemaId),
    /// Positional schemas; removed in draft 2020-12 in favor of `prefixItems`
    Positional(Vec<SchemaId>),
}

/// Validator function supplied with a custom keyword: (payload, instance).
pub type CustomCheck = dyn Fn(&Value, &Value) -> Result<(), String> + Send + Sync;

/// An implementer-provided keyword carrying its payload as raw JSON and its
/// validator as a function, so custom vocabularies need no new variants.
#[derive(Clone)]
pub struct CustomKeyword {
    /// The keyword name as it appears in schemas
    pub name: String,
    /// The raw payload, kept verbatim
    pub payload: Value,
    priority: u32,
    check: Arc<CustomCheck>,
}

impl CustomKeyword {
    /// Builds a custom keyword instance.
    pub fn new(
        name: impl Into<String>,
        payload: Value,
        priority: u32,
        check: Arc<CustomCheck>,
    ) -> Self {
        Self {
            name: name.into(),
            payload,
            priority,
            check,
        }
    }

    fn evaluate(&self, ctx: &mut ValidationContext<'_>) {
        if let Err(message) = (self.check)(&self.payload, ctx.local_instance) {
            ctx.fail(message);
        }
    }
}

impl fmt::Debug for CustomKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomKeyword")
            .field("name", &self.name)
            .field("payload", &self.payload)
            .field("priority", &self.priority)
            .finish()
    }
}

impl PartialEq for CustomKeyword {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.payload == other.payload
    }
}

/// A parsed keyword instance. Payloads are immutable after construction.
#[derive(Debug, Clone)]
pub enum Keyword {
    // ==================
    // Core / reference vocabulary
    // ==================
    /// `$schema` meta-schema URI, lexical only
    SchemaUri(String),
    /// `$id` base URI re-binding
    Id(String),
    /// `$anchor` plain-name fragment
    Anchor(String),
    /// `$comment`, carried but inert
    Comment(String),
    /// `$defs` named schema definitions (2019-09+)
    Defs(Vec<(String, SchemaId)>),
    /// `definitions`, the historical spelling
    Definitions(Vec<(String, SchemaId)>),
    /// `$ref` URI reference
    Ref(String),

    // ==================
    // Applicator vocabulary
    // ==================
    AllOf(Vec<SchemaId>),
    AnyOf(Vec<SchemaId>),
    OneOf(Vec<SchemaId>),
    Not(SchemaId),
    If(SchemaId),
    Then(SchemaId),
    Else(SchemaId),
    DependentSchemas(Vec<(String, SchemaId)>),
    Properties(Vec<(String, SchemaId)>),
    PatternProperties(Vec<PatternProperty>),
    AdditionalProperties(SchemaId),
    PrefixItems(Vec<SchemaId>),
    Items(ItemsForm),
    AdditionalItems(SchemaId),
    Contains(SchemaId),

    // ==================
    // Validation vocabulary
    // ==================
    Type(TypeSet),
    Enum(Vec<Value>),
    Const(Value),
    MultipleOf(Number),
    Maximum(Number),
    ExclusiveMaximum(Number),
    Minimum(Number),
    ExclusiveMinimum(Number),
    MaxLength(u64),
    MinLength(u64),
    Pattern(CompiledPattern),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(Vec<(String, Vec<String>)>),

    // ==================
    // Annotation-only
    // ==================
    Format(String),

    /// Implementer extension
    Custom(CustomKeyword),
}

impl Keyword {
    /// The keyword name as it appears in schema documents.
    pub fn name(&self) -> &str {
        match self {
            Keyword::SchemaUri(_) => "$schema",
            Keyword::Id(_) => "$id",
            Keyword::Anchor(_) => "$anchor",
            Keyword::Comment(_) => "$comment",
            Keyword::Defs(_) => "$defs",
            Keyword::Definitions(_) => "definitions",
            Keyword::Ref(_) => "$ref",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::If(_) => "if",
            Keyword::Then(_) => "then",
            Keyword::Else(_) => "else",
            Keyword::DependentSchemas(_) => "dependentSchemas",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::PrefixItems(_) => "prefixItems",
            Keyword::Items(_) => "items",
            Keyword::AdditionalItems(_) => "additionalItems",
            Keyword::Contains(_) => "contains",
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::Minimum(_) => "minimum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::MinLength(_) => "minLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::MinItems(_) => "minItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::Required(_) => "required",
            Keyword::DependentRequired(_) => "dependentRequired",
            Keyword::Format(_) => "format",
            Keyword::Custom(c) => &c.name,
        }
    }

    /// Evaluation priority; lower runs first, ties break on name.
    pub fn priority(&self) -> u32 {
        match self {
            Keyword::SchemaUri(_)
            | Keyword::Id(_)
            | Keyword::Anchor(_)
            | Keyword::Comment(_)
            | Keyword::Defs(_)
            | Keyword::Definitions(_) => priority::IDENTIFIER,
            Keyword::Ref(_) => priority::REFERENCE,
            Keyword::Type(_)
            | Keyword::Enum(_)
            | Keyword::Const(_)
            | Keyword::MultipleOf(_)
            | Keyword::Maximum(_)
            | Keyword::ExclusiveMaximum(_)
            | Keyword::Minimum(_)
            | Keyword::ExclusiveMinimum(_)
            | Keyword::MaxLength(_)
            | Keyword::MinLength(_)
            | Keyword::Pattern(_)
            | Keyword::MaxItems(_)
            | Keyword::MinItems(_)
            | Keyword::UniqueItems(_)
            | Keyword::MaxProperties(_)
            | Keyword::MinProperties(_)
            | Keyword::Required(_)
            | Keyword::DependentRequired(_)
            | Keyword::Format(_) => priority::ASSERTION,
            Keyword::Properties(_) | Keyword::PatternProperties(_) | Keyword::PrefixItems(_) => {
                priority::STRUCTURAL
            }
            Keyword::AdditionalProperties(_) | Keyword::Items(_) | Keyword::Contains(_) => {
                priority::GATED
            }
            Keyword::AdditionalItems(_) => priority::GATED_TAIL,
            Keyword::If(_) => priority::CONDITIONAL,
            Keyword::Then(_) | Keyword::Else(_) => priority::CONDITIONAL_BRANCH,
            Keyword::AllOf(_)
            | Keyword::AnyOf(_)
            | Keyword::OneOf(_)
            | Keyword::Not(_)
            | Keyword::DependentSchemas(_) => priority::COMBINATOR,
            Keyword::Custom(c) => c.priority,
        }
    }

    /// Drafts in which this keyword is active; inactive keywords are skipped
    /// during evaluation, not rejected at parse time.
    pub fn drafts(&self) -> DraftSet {
        match self {
            Keyword::Defs(_) | Keyword::Anchor(_) => DraftSet::SINCE_2019,
            Keyword::DependentSchemas(_) | Keyword::DependentRequired(_) => DraftSet::SINCE_2019,
            Keyword::PrefixItems(_) => DraftSet::ONLY_2020,
            Keyword::AdditionalItems(_) => DraftSet::UNTIL_2019,
            _ => DraftSet::ALL,
        }
    }

    /// The vocabulary this keyword belongs to.
    pub fn vocabulary(&self) -> Vocabulary {
        match self {
            Keyword::SchemaUri(_)
            | Keyword::Id(_)
            | Keyword::Anchor(_)
            | Keyword::Comment(_)
            | Keyword::Defs(_)
            | Keyword::Definitions(_)
            | Keyword::Ref(_) => Vocabulary::Core,
            Keyword::AllOf(_)
            | Keyword::AnyOf(_)
            | Keyword::OneOf(_)
            | Keyword::Not(_)
            | Keyword::If(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::DependentSchemas(_)
            | Keyword::Properties(_)
            | Keyword::PatternProperties(_)
            | Keyword::AdditionalProperties(_)
            | Keyword::PrefixItems(_)
            | Keyword::Items(_)
            | Keyword::AdditionalItems(_)
            | Keyword::Contains(_) => Vocabulary::Applicator,
            Keyword::Format(_) => Vocabulary::FormatAnnotation,
            Keyword::Custom(_) => Vocabulary::Custom,
            _ => Vocabulary::Validation,
        }
    }

    /// Every sub-schema this keyword's payload holds, for registry scans.
    pub fn subschemas(&self) -> Vec<SchemaId> {
        match self {
            Keyword::Defs(m)
            | Keyword::Definitions(m)
            | Keyword::DependentSchemas(m)
            | Keyword::Properties(m) => m.iter().map(|(_, id)| *id).collect(),
            Keyword::PatternProperties(v) => v.iter().map(|p| p.schema).collect(),
            Keyword::AllOf(v) | Keyword::AnyOf(v) | Keyword::OneOf(v) | Keyword::PrefixItems(v) => {
                v.clone()
            }
            Keyword::Items(ItemsForm::Single(id)) => vec![*id],
            Keyword::Items(ItemsForm::Positional(v)) => v.clone(),
            Keyword::Not(id)
            | Keyword::If(id)
            | Keyword::Then(id)
            | Keyword::Else(id)
            | Keyword::AdditionalProperties(id)
            | Keyword::AdditionalItems(id)
            | Keyword::Contains(id) => vec![*id],
            _ => Vec::new(),
        }
    }

    /// Sub-schema reached by the bare keyword name in a JSON Pointer
    /// (`/not`, `/items` in single form, ...). `None` for payloads that need
    /// a further segment.
    pub fn direct_subschema(&self) -> Option<SchemaId> {
        match self {
            Keyword::Not(id)
            | Keyword::If(id)
            | Keyword::Then(id)
            | Keyword::Else(id)
            | Keyword::AdditionalProperties(id)
            | Keyword::AdditionalItems(id)
            | Keyword::Contains(id) => Some(*id),
            Keyword::Items(ItemsForm::Single(id)) => Some(*id),
            _ => None,
        }
    }

    /// Resolves one pointer segment through this keyword's interior: by name
    /// for maps, by strict integer index for sequences.
    pub fn resolve_segment(&self, segment: &str) -> Option<SchemaId> {
        match self {
            Keyword::Defs(m)
            | Keyword::Definitions(m)
            | Keyword::DependentSchemas(m)
            | Keyword::Properties(m) => {
                m.iter().find(|(name, _)| name == segment).map(|(_, id)| *id)
            }
            Keyword::PatternProperties(v) => v
                .iter()
                .find(|p| p.pattern.source() == segment)
                .map(|p| p.schema),
            Keyword::AllOf(v) | Keyword::AnyOf(v) | Keyword::OneOf(v) | Keyword::PrefixItems(v) => {
                crate::pointer::JsonPointer::parse_index(segment).and_then(|i| v.get(i).copied())
            }
            Keyword::Items(ItemsForm::Positional(v)) => {
                crate::pointer::JsonPointer::parse_index(segment).and_then(|i| v.get(i).copied())
            }
            _ => None,
        }
    }

    /// Runs the keyword against its context; sub-schema evaluation recurses
    /// through the driver.
    pub(crate) fn evaluate<'e>(&'e self, driver: &mut Driver<'e>, ctx: &mut ValidationContext<'e>) {
        match self {
            // Identifiers are handled at parse/registration time.
            Keyword::SchemaUri(_)
            | Keyword::Id(_)
            | Keyword::Anchor(_)
            | Keyword::Comment(_)
            | Keyword::Defs(_)
            | Keyword::Definitions(_) => {}
            Keyword::Ref(reference) => references::eval_ref(reference, driver, ctx),
            Keyword::Format(format) => references::eval_format(format, ctx),

            Keyword::AllOf(subs) => applicators::eval_all_of(subs, driver, ctx),
            Keyword::AnyOf(subs) => applicators::eval_any_of(subs, driver, ctx),
            Keyword::OneOf(subs) => applicators::eval_one_of(subs, driver, ctx),
            Keyword::Not(sub) => applicators::eval_not(*sub, driver, ctx),
            Keyword::If(sub) => applicators::eval_if(*sub, driver, ctx),
            Keyword::Then(sub) => applicators::eval_then(*sub, driver, ctx),
            Keyword::Else(sub) => applicators::eval_else(*sub, driver, ctx),
            Keyword::DependentSchemas(deps) => {
                applicators::eval_dependent_schemas(deps, driver, ctx)
            }
            Keyword::Properties(props) => applicators::eval_properties(props, driver, ctx),
            Keyword::PatternProperties(patterns) => {
                applicators::eval_pattern_properties(patterns, driver, ctx)
            }
            Keyword::AdditionalProperties(sub) => {
                applicators::eval_additional_properties(*sub, driver, ctx)
            }
            Keyword::PrefixItems(subs) => applicators::eval_prefix_items(subs, driver, ctx),
            Keyword::Items(form) => applicators::eval_items(form, driver, ctx),
            Keyword::AdditionalItems(sub) => applicators::eval_additional_items(*sub, driver, ctx),
            Keyword::Contains(sub) => applicators::eval_contains(*sub, driver, ctx),

            Keyword::Type(types) => assertions::eval_type(types, ctx),
            Keyword::Enum(candidates) => assertions::eval_enum(candidates, ctx),
            Keyword::Const(expected) => assertions::eval_const(expected, ctx),
            Keyword::MultipleOf(divisor) => assertions::eval_multiple_of(divisor, ctx),
            Keyword::Maximum(bound) => assertions::eval_maximum(bound, ctx),
            Keyword::ExclusiveMaximum(bound) => assertions::eval_exclusive_maximum(bound, ctx),
            Keyword::Minimum(bound) => assertions::eval_minimum(bound, ctx),
            Keyword::ExclusiveMinimum(bound) => assertions::eval_exclusive_minimum(bound, ctx),
            Keyword::MaxLength(limit) => assertions::eval_max_length(*limit, ctx),
            Keyword::MinLength(limit) => assertions::eval_min_length(*limit, ctx),
            Keyword::Pattern(pattern) => assertions::eval_pattern(pattern, ctx),
            Keyword::MaxItems(limit) => assertions::eval_max_items(*limit, ctx),
            Keyword::MinItems(limit) => assertions::eval_min_items(*limit, ctx),
            Keyword::UniqueItems(unique) => assertions::eval_unique_items(*unique, ctx),
            Keyword::MaxProperties(limit) => assertions::eval_max_properties(*limit, ctx),
            Keyword::MinProperties(limit) => assertions::eval_min_properties(*limit, ctx),
            Keyword::Required(names) => assertions::eval_required(names, ctx),
            Keyword::DependentRequired(deps) => assertions::eval_dependent_required(deps, ctx),

            Keyword::Custom(custom) => custom.evaluate(ctx),
        }
    }

    /// Consolidates child annotations onto this keyword's context.
    ///
    /// Only in-place applicators consolidate: their children evaluate the
    /// same instance node, so annotations merge by name (sets union,
    /// integers take the max, `true` absorbs). Everything else is a no-op.
    pub(crate) fn consolidate(&self, ctx: &mut ValidationContext<'_>) {
        match self {
            Keyword::Ref(_)
            | Keyword::AllOf(_)
            | Keyword::AnyOf(_)
            | Keyword::OneOf(_)
            | Keyword::If(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::DependentSchemas(_) => ctx.absorb_valid_children(),
            _ => {}
        }
    }

    /// Reconstructs the raw JSON payload, resolving arena indices back to
    /// schema values. `(name, payload)` pairs reassemble a schema document.
    pub fn to_raw(&self, arena: &SchemaArena) -> Value {
        match self {
            Keyword::SchemaUri(s)
            | Keyword::Id(s)
            | Keyword::Anchor(s)
            | Keyword::Comment(s)
            | Keyword::Ref(s)
            | Keyword::Format(s) => Value::String(s.clone()),
            Keyword::Pattern(p) => Value::String(p.source().to_string()),
            Keyword::Defs(m)
            | Keyword::Definitions(m)
            | Keyword::DependentSchemas(m)
            | Keyword::Properties(m) => {
                let mut out = serde_json::Map::new();
                for (name, id) in m {
                    out.insert(name.clone(), arena.get(*id).to_value(arena));
                }
                Value::Object(out)
            }
            Keyword::PatternProperties(v) => {
                let mut out = serde_json::Map::new();
                for entry in v {
                    out.insert(
                        entry.pattern.source().to_string(),
                        arena.get(entry.schema).to_value(arena),
                    );
                }
                Value::Object(out)
            }
            Keyword::AllOf(v) | Keyword::AnyOf(v) | Keyword::OneOf(v) | Keyword::PrefixItems(v) => {
                Value::Array(v.iter().map(|id| arena.get(*id).to_value(arena)).collect())
            }
            Keyword::Not(id)
            | Keyword::If(id)
            | Keyword::Then(id)
            | Keyword::Else(id)
            | Keyword::AdditionalProperties(id)
            | Keyword::AdditionalItems(id)
            | Keyword::Contains(id) => arena.get(*id).to_value(arena),
            Keyword::Items(ItemsForm::Single(id)) => arena.get(*id).to_value(arena),
            Keyword::Items(ItemsForm::Positional(v)) => {
                Value::Array(v.iter().map(|id| arena.get(*id).to_value(arena)).collect())
            }
            Keyword::Type(set) => {
                if set.len() == 1 {
                    Value::String(set.tags().next().map(|t| t.as_str()).unwrap_or("").into())
                } else {
                    Value::Array(
                        set.tags()
                            .map(|t| Value::String(t.as_str().to_string()))
                            .collect(),
                    )
                }
            }
            Keyword::Enum(candidates) => Value::Array(candidates.clone()),
            Keyword::Const(v) => v.clone(),
            Keyword::MultipleOf(n)
            | Keyword::Maximum(n)
            | Keyword::ExclusiveMaximum(n)
            | Keyword::Minimum(n)
            | Keyword::ExclusiveMinimum(n) => Value::Number(n.clone()),
            Keyword::MaxLength(n)
            | Keyword::MinLength(n)
            | Keyword::MaxItems(n)
            | Keyword::MinItems(n)
            | Keyword::MaxProperties(n)
            | Keyword::MinProperties(n) => Value::Number((*n).into()),
            Keyword::UniqueItems(b) => Value::Bool(*b),
            Keyword::Required(names) => Value::Array(
                names
                    .iter()
                    .map(|n| Value::String(n.clone()))
                    .collect(),
            ),
            Keyword::DependentRequired(deps) => {
                let mut out = serde_json::Map::new();
                for (name, needed) in deps {
                    out.insert(
                        name.clone(),
                        Value::Array(needed.iter().map(|n| Value::String(n.clone())).collect()),
                    );
                }
                Value::Object(out)
            }
            Keyword::Custom(c) => c.payload.clone(),
        }
    }
}

/// Shared skip helper: non-matching instance kinds make assertion keywords
/// vacuously valid and applicators silent.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    ValueKind::of(value).as_str()
}
