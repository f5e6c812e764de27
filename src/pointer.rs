//! JSON Pointer (RFC 6901) used for instance and schema locations
//!
//! Pointers are strictly immutable: `push` and `push_index` return a new
//! pointer. Segments are stored unescaped; escaping (`~0`, `~1`) happens at
//! the parse/serialize boundary. Integer segments serialize without leading
//! zeros.

use std::fmt;

/// Immutable JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    segments: Vec<String>,
}

/// A pointer string that does not follow RFC 6901.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid JSON pointer '{pointer}': {reason}")]
pub struct InvalidPointer {
    /// The offending pointer text
    pub pointer: String,
    /// What was wrong with it
    pub reason: String,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// True for the empty pointer.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Unescaped segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns a new pointer with `segment` appended.
    pub fn push(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Returns a new pointer with an array index appended.
    pub fn push_index(&self, index: usize) -> Self {
        self.push(&index.to_string())
    }

    /// Parses an RFC 6901 pointer string.
    ///
    /// The empty string is the root pointer; any other pointer must start
    /// with `/`. `~` must be followed by `0` or `1`.
    pub fn parse(text: &str) -> Result<Self, InvalidPointer> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        if !text.starts_with('/') {
            return Err(InvalidPointer {
                pointer: text.to_string(),
                reason: "must be empty or start with '/'".to_string(),
            });
        }
        let mut segments = Vec::new();
        for token in text[1..].split('/') {
            segments.push(unescape(token).map_err(|reason| InvalidPointer {
                pointer: text.to_string(),
                reason,
            })?);
        }
        Ok(Self { segments })
    }

    /// Parses a segment as an array index: digits only, no leading zeros.
    pub fn parse_index(segment: &str) -> Option<usize> {
        if segment.is_empty() {
            return None;
        }
        if segment.len() > 1 && segment.starts_with('0') {
            return None;
        }
        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok()
    }
}

fn unescape(token: &str) -> Result<String, String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            other => {
                return Err(format!(
                    "'~' must be followed by '0' or '1', found {:?}",
                    other
                ))
            }
        }
    }
    Ok(out)
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}
