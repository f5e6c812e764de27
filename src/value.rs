//! Uniform read-only view over JSON instance nodes
//!
//! Keywords never touch `serde_json::Value` shapes directly; they go through
//! the kind-checked accessors here. An accessor applied to the wrong shape
//! returns [`KindMismatch`], which assertion keywords treat as vacuously valid
//! and applicator keywords skip silently (`type` alone enforces kinds).
//!
//! Equality and numeric comparison rules:
//! - object equality is independent of member order
//! - numbers compare by mathematical value (`1` equals `1.0`)
//! - string length is counted in UTF-16 code units

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Number, Value};

/// The six JSON kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl ValueKind {
    /// Classifies a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
        }
    }

    /// Returns the kind name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A keyword asked for one shape and the instance has another.
///
/// Never propagated as an error: the consuming keyword decides to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    /// The shape the keyword needed
    pub expected: ValueKind,
    /// The shape the instance actually has
    pub actual: ValueKind,
}

impl fmt::Display for KindMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.actual)
    }
}

fn mismatch(expected: ValueKind, value: &Value) -> KindMismatch {
    KindMismatch {
        expected,
        actual: ValueKind::of(value),
    }
}

/// Object member view, source order preserved by `serde_json`'s map.
pub fn as_object(value: &Value) -> Result<&Map<String, Value>, KindMismatch> {
    value
        .as_object()
        .ok_or_else(|| mismatch(ValueKind::Object, value))
}

/// Array item view.
pub fn as_array(value: &Value) -> Result<&Vec<Value>, KindMismatch> {
    value
        .as_array()
        .ok_or_else(|| mismatch(ValueKind::Array, value))
}

/// Scalar string view.
pub fn as_str(value: &Value) -> Result<&str, KindMismatch> {
    value
        .as_str()
        .ok_or_else(|| mismatch(ValueKind::String, value))
}

/// Scalar number view.
pub fn as_number(value: &Value) -> Result<&Number, KindMismatch> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(mismatch(ValueKind::Number, other)),
    }
}

/// Structural equality: objects compare member-order-insensitively, numbers
/// compare by mathematical value. Used by `enum`, `const`, `uniqueItems` and
/// schema equality.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(u, v)| json_equal(u, v))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, u)| y.get(k).is_some_and(|v| json_equal(u, v)))
        }
        _ => false,
    }
}

/// Total order over JSON numbers by mathematical value.
///
/// Integer representations compare exactly (no f64 round-trip for i64/u64
/// pairs); mixed integer/float comparisons go through f64.
pub fn number_cmp(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    // One side is a large u64, the other a negative i64.
    if a.is_u64() && b.is_i64() {
        return Ordering::Greater;
    }
    if a.is_i64() && b.is_u64() {
        return Ordering::Less;
    }
    let x = a.as_f64().unwrap_or(0.0);
    let y = b.as_f64().unwrap_or(0.0);
    // JSON numbers are finite, so partial_cmp cannot fail.
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

/// Numeric equality across trailing-zero variants (`1` equals `1.0`).
pub fn number_eq(a: &Number, b: &Number) -> bool {
    number_cmp(a, b) == Ordering::Equal
}

/// True when the number is mathematically integral, whatever its lexical form.
pub fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

/// Exact divisibility for `multipleOf`.
///
/// Integer pairs divide with integer arithmetic; any float operand divides
/// through f64 and requires the quotient to be exactly integral.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        if d != 0 {
            return v % d == 0;
        }
    }
    if let (Some(v), Some(d)) = (value.as_u64(), divisor.as_u64()) {
        if d != 0 {
            return v % d == 0;
        }
    }
    let v = value.as_f64().unwrap_or(0.0);
    let d = divisor.as_f64().unwrap_or(0.0);
    if d == 0.0 {
        return false;
    }
    let quotient = v / d;
    quotient.is_finite() && quotient.fract() == 0.0
}

/// String length in UTF-16 code units, the unit `minLength`/`maxLength`
/// count in.
pub fn utf16_length(s: &str) -> u64 {
    s.encode_utf16().count() as u64
}

/// Set of distinct property names, used by the evaluated-names annotations.
pub type NameSet = BTreeSet<String>;
