//! Keyword descriptor table
//!
//! Maps keyword names to their parser, priority, draft coverage and
//! vocabulary. The table is hand-written; there is no runtime reflection.
//! Registration is idempotent and later registration of a name replaces the
//! earlier binding. Lookup misses mean "unrecognized keyword" and the schema
//! parser keeps the raw member as pass-through data.
//!
//! A lazily initialized process-wide default registry is provided for
//! convenience; callers that need isolation construct their own.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard};

use serde_json::Value;

use super::{applicators, assertions, references, CustomCheck, CustomKeyword, Keyword};
use crate::schema::ParseCtx;
use crate::validation::Draft;

/// Evaluation priorities; lower runs first. Annotation producers must run
/// before the keywords that read them.
pub mod priority {
    /// `$id`, `$anchor`, `$defs` and other lexical identifiers
    pub const IDENTIFIER: u32 = 0;
    /// `$ref`
    pub const REFERENCE: u32 = 5;
    /// Plain assertions (`type`, bounds, lengths, `required`, ...)
    pub const ASSERTION: u32 = 10;
    /// `properties`, `patternProperties`, `prefixItems`
    pub const STRUCTURAL: u32 = 20;
    /// `additionalProperties`, `items`, `contains` (read STRUCTURAL output)
    pub const GATED: u32 = 30;
    /// `additionalItems` (reads `items` output)
    pub const GATED_TAIL: u32 = 35;
    /// `if`
    pub const CONDITIONAL: u32 = 40;
    /// `then` / `else` (read the `if` annotation)
    pub const CONDITIONAL_BRANCH: u32 = 45;
    /// `allOf` / `anyOf` / `oneOf` / `not` / `dependentSchemas`
    pub const COMBINATOR: u32 = 50;
}

/// Set of drafts a keyword is active in, one bit per draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSet(u8);

impl DraftSet {
    /// Every supported draft.
    pub const ALL: DraftSet = DraftSet(0b1111);
    /// 2019-09 and 2020-12.
    pub const SINCE_2019: DraftSet = DraftSet(0b1100);
    /// 2020-12 only.
    pub const ONLY_2020: DraftSet = DraftSet(0b1000);
    /// Draft 6 through 2019-09.
    pub const UNTIL_2019: DraftSet = DraftSet(0b0111);

    /// True when the draft is in the set.
    pub fn contains(self, draft: Draft) -> bool {
        self.0 & (1 << draft as u8) != 0
    }
}

/// Named keyword groupings enabled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Identifiers and references
    Core,
    /// Keywords whose payloads are sub-schemas
    Applicator,
    /// Assertion keywords
    Validation,
    /// `format` and other annotation-only keywords
    FormatAnnotation,
    /// Implementer extensions
    Custom,
}

/// Parser from a raw keyword payload to a keyword instance. The error string
/// becomes the `cause` of a `SchemaError::Parse`.
pub type KeywordParser =
    Arc<dyn Fn(&Value, &mut ParseCtx<'_>) -> Result<Keyword, String> + Send + Sync>;

/// Everything the engine knows about one keyword name.
#[derive(Clone)]
pub struct KeywordDescriptor {
    /// The name as it appears in schema documents
    pub name: String,
    /// Payload parser
    pub parser: KeywordParser,
    /// Prebuilt instance used when the payload is JSON `null`, for keywords
    /// whose value may legally be `null`
    pub null_instance: Option<fn() -> Keyword>,
    /// Evaluation priority
    pub priority: u32,
    /// Drafts the keyword is active in
    pub drafts: DraftSet,
    /// Owning vocabulary
    pub vocabulary: Vocabulary,
}

impl KeywordDescriptor {
    fn builtin(
        name: &str,
        parser: fn(&Value, &mut ParseCtx<'_>) -> Result<Keyword, String>,
        priority: u32,
        drafts: DraftSet,
        vocabulary: Vocabulary,
    ) -> Self {
        Self {
            name: name.to_string(),
            parser: Arc::new(parser),
            null_instance: None,
            priority,
            drafts,
            vocabulary,
        }
    }

    /// Descriptor for an implementer-supplied keyword. The payload is kept
    /// verbatim and handed to `check` along with each instance node.
    pub fn custom(name: impl Into<String>, priority: u32, check: Arc<CustomCheck>) -> Self {
        let name = name.into();
        let parser_name = name.clone();
        let parser: KeywordParser = Arc::new(move |raw: &Value, _ctx: &mut ParseCtx<'_>| {
            Ok(Keyword::Custom(CustomKeyword::new(
                parser_name.clone(),
                raw.clone(),
                priority,
                check.clone(),
            )))
        });
        Self {
            name,
            parser,
            null_instance: None,
            priority,
            drafts: DraftSet::ALL,
            vocabulary: Vocabulary::Custom,
        }
    }
}

impl fmt::Debug for KeywordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("drafts", &self.drafts)
            .field("vocabulary", &self.vocabulary)
            .finish()
    }
}

/// The keyword name → descriptor table.
#[derive(Debug, Default)]
pub struct KeywordRegistry {
    descriptors: HashMap<String, KeywordDescriptor>,
}

impl KeywordRegistry {
    /// An empty table; every keyword becomes pass-through data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table covering the core, applicator, validation and
    /// format vocabularies.
    pub fn with_defaults() -> Self {
        use priority::*;
        use Vocabulary::*;

        let mut registry = Self::empty();
        let table = [
            // name, parser, priority, drafts, vocabulary
            KeywordDescriptor::builtin("$schema", references::parse_schema_uri, IDENTIFIER, DraftSet::ALL, Core),
            KeywordDescriptor::builtin("$id", references::parse_id, IDENTIFIER, DraftSet::ALL, Core),
            KeywordDescriptor::builtin("$anchor", references::parse_anchor, IDENTIFIER, DraftSet::SINCE_2019, Core),
            KeywordDescriptor::builtin("$comment", references::parse_comment, IDENTIFIER, DraftSet::ALL, Core),
            KeywordDescriptor::builtin("$defs", references::parse_defs, IDENTIFIER, DraftSet::SINCE_2019, Core),
            KeywordDescriptor::builtin("definitions", references::parse_definitions, IDENTIFIER, DraftSet::ALL, Core),
            KeywordDescriptor::builtin("$ref", references::parse_ref, REFERENCE, DraftSet::ALL, Core),
            KeywordDescriptor::builtin("allOf", applicators::parse_all_of, COMBINATOR, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("anyOf", applicators::parse_any_of, COMBINATOR, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("oneOf", applicators::parse_one_of, COMBINATOR, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("not", applicators::parse_not, COMBINATOR, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("if", applicators::parse_if, CONDITIONAL, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("then", applicators::parse_then, CONDITIONAL_BRANCH, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("else", applicators::parse_else, CONDITIONAL_BRANCH, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("dependentSchemas", applicators::parse_dependent_schemas, COMBINATOR, DraftSet::SINCE_2019, Applicator),
            KeywordDescriptor::builtin("properties", applicators::parse_properties, STRUCTURAL, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("patternProperties", applicators::parse_pattern_properties, STRUCTURAL, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("additionalProperties", applicators::parse_additional_properties, GATED, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("prefixItems", applicators::parse_prefix_items, STRUCTURAL, DraftSet::ONLY_2020, Applicator),
            KeywordDescriptor::builtin("items", applicators::parse_items, GATED, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("additionalItems", applicators::parse_additional_items, GATED_TAIL, DraftSet::UNTIL_2019, Applicator),
            KeywordDescriptor::builtin("contains", applicators::parse_contains, GATED, DraftSet::ALL, Applicator),
            KeywordDescriptor::builtin("type", assertions::parse_type, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("enum", assertions::parse_enum, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("const", assertions::parse_const, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("multipleOf", assertions::parse_multiple_of, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("maximum", assertions::parse_maximum, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("exclusiveMaximum", assertions::parse_exclusive_maximum, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("minimum", assertions::parse_minimum, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("exclusiveMinimum", assertions::parse_exclusive_minimum, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("maxLength", assertions::parse_max_length, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("minLength", assertions::parse_min_length, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("pattern", assertions::parse_pattern, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("maxItems", assertions::parse_max_items, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("minItems", assertions::parse_min_items, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("uniqueItems", assertions::parse_unique_items, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("maxProperties", assertions::parse_max_properties, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("minProperties", assertions::parse_min_properties, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("required", assertions::parse_required, ASSERTION, DraftSet::ALL, Validation),
            KeywordDescriptor::builtin("dependentRequired", assertions::parse_dependent_required, ASSERTION, DraftSet::SINCE_2019, Validation),
            KeywordDescriptor::builtin("format", assertions::parse_format, ASSERTION, DraftSet::ALL, FormatAnnotation),
        ];
        for descriptor in table {
            registry.register(descriptor);
        }

        // `const: null` is legal; route the null payload to a singleton.
        if let Some(d) = registry.descriptors.get_mut("const") {
            d.null_instance = Some(|| Keyword::Const(Value::Null));
        }

        registry
    }

    /// Installs or replaces a descriptor.
    pub fn register(&mut self, descriptor: KeywordDescriptor) {
        self.descriptors
            .insert(descriptor.name.clone(), descriptor);
    }

    /// Finds the descriptor for a keyword name, `None` when unrecognized.
    pub fn lookup(&self, name: &str) -> Option<&KeywordDescriptor> {
        self.descriptors.get(name)
    }

    /// Number of registered keywords.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when no keywords are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The process-wide default registry, created lazily on first use.
    pub fn global() -> &'static RwLock<KeywordRegistry> {
        static GLOBAL: OnceLock<RwLock<KeywordRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| RwLock::new(KeywordRegistry::with_defaults()))
    }

    /// Read access to the global registry, recovering from poisoning.
    pub fn global_read() -> RwLockReadGuard<'static, KeywordRegistry> {
        match Self::global().read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
