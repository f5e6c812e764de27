//! Schema subsystem error types
//!
//! Only schema construction and reference plumbing produce `Err` values.
//! An instance failing its assertions is a normal outcome and surfaces as a
//! `valid = false` node in the evaluation tree, never as a `SchemaError`.
//! Kind mismatches stay inside the value view (see `crate::value`).

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building schemas or resolving references.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A recognized keyword's parser rejected its payload.
    #[error("keyword '{keyword}' rejected its payload: {cause}")]
    Parse {
        /// The keyword whose parser failed
        keyword: String,
        /// Why the payload was rejected
        cause: String,
    },

    /// A schema document was neither a boolean nor an object.
    #[error("schema must be a boolean or an object, got {kind}")]
    InvalidDocument {
        /// The kind of the offending JSON value
        kind: &'static str,
    },

    /// A `$ref` target or registry URI cannot be located.
    #[error("reference '{uri}' cannot be resolved")]
    UnresolvedRef {
        /// The reference as resolved against the base URI
        uri: String,
    },

    /// A schema file on disk could not be read or parsed.
    #[error("malformed schema file '{path}': {reason}")]
    Malformed {
        /// Path of the offending file
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// IO error while loading schema files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A construction invariant was violated; fatal.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl SchemaError {
    /// Builds a keyword parse error.
    pub fn parse(keyword: impl Into<String>, cause: impl Into<String>) -> Self {
        SchemaError::Parse {
            keyword: keyword.into(),
            cause: cause.into(),
        }
    }

    /// Builds an unresolved-reference error.
    pub fn unresolved(uri: impl Into<String>) -> Self {
        SchemaError::UnresolvedRef { uri: uri.into() }
    }
}
