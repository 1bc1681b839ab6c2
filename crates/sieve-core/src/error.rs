//! Core error types for Sieve
//!
//! Only trusted configuration can fail. Untrusted request input is never
//! reported as an error; it is dropped by the resolver instead.

use thiserror::Error;

/// Errors raised while declaring a schema or wiring it to a registry.
///
/// These are programmer mistakes and surface at startup (or at the latest
/// when a caller passes a malformed default sort override).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("multi-valued filter '{0}' is not a declared filter")]
    UnknownMultiValuedFilter(String),

    #[error("explicit reverse ordering declared for unknown sort '{0}'")]
    UnknownReverseSort(String),

    #[error("default sort refers to unknown sort '{0}'")]
    UnknownDefaultSort(String),

    #[error("invalid default sort: expected a sort name or a [name, direction] pair, got {0}")]
    InvalidDefaultSort(String),

    #[error("filter '{filter}' refers to predicate '{predicate}' which is not registered")]
    UnknownPredicate { filter: String, predicate: String },

    #[error("sort '{sort}' refers to ordering '{ordering}' which is not registered")]
    UnknownOrdering { sort: String, ordering: String },

    #[error("max per page must be at least 1")]
    InvalidMaxPerPage,
}

impl SchemaError {
    /// Stable machine-readable code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::UnknownMultiValuedFilter(_) => "unknown_multi_valued_filter",
            SchemaError::UnknownReverseSort(_) => "unknown_reverse_sort",
            SchemaError::UnknownDefaultSort(_) => "unknown_default_sort",
            SchemaError::InvalidDefaultSort(_) => "invalid_default_sort",
            SchemaError::UnknownPredicate { .. } => "unknown_predicate",
            SchemaError::UnknownOrdering { .. } => "unknown_ordering",
            SchemaError::InvalidMaxPerPage => "invalid_max_per_page",
        }
    }
}

/// Result type for schema declaration and compilation
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchemaError::UnknownPredicate {
            filter: "name".into(),
            predicate: "filter_by_name".into(),
        };
        assert_eq!(
            err.to_string(),
            "filter 'name' refers to predicate 'filter_by_name' which is not registered"
        );
        assert_eq!(err.error_code(), "unknown_predicate");
    }

    #[test]
    fn test_invalid_default_sort_message() {
        let err = SchemaError::InvalidDefaultSort("42".into());
        assert!(err.to_string().contains("got 42"));
    }
}
