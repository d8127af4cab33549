//! Unified error types for the strata workspace.
//!
//! Every failure in the construction and synthesis pipeline is structural:
//! nothing here is transient or retryable, so a single error aborts the
//! pipeline of the environment it was raised in and nothing else.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Two sibling constructs, or two resources of one construct, share an identity.
    #[error("duplicate name \"{name}\" in scope \"{scope}\"")]
    DuplicateName {
        /// Scope path of the construct the name was declared in.
        scope: String,
        /// The conflicting local name or logical id.
        name: String,
    },

    /// A reference or explicit dependency names a logical id that does not exist.
    #[error("resource \"{from}\" refers to unknown resource \"{target}\"")]
    UnknownReference {
        /// Logical id of the resource holding the reference.
        from: String,
        /// Logical id that could not be found.
        target: String,
    },

    /// Two resources in the flattened tree resolved to the same logical id.
    #[error("duplicate logical id \"{logical_id}\"")]
    DuplicateLogicalId {
        /// The colliding logical id.
        logical_id: String,
    },

    /// Dependency edges form a cycle.
    #[error("cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Cycle in depends-on order; the last element repeats the first.
        cycle: Vec<String>,
    },

    /// Serialization met a value that is neither a literal nor a reference.
    #[error("unresolved placeholder \"{placeholder}\" in {logical_id}.{attribute}")]
    UnresolvedPlaceholder {
        /// Resource that carries the placeholder.
        logical_id: String,
        /// Top-level attribute the placeholder sits under.
        attribute: String,
        /// Name of the missing value.
        placeholder: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A handle or named entity was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing entity.
        kind: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// A content hash did not match the expected value.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Resource that failed validation.
        resource: String,
        /// Expected hash value.
        expected: String,
        /// Actual computed hash value.
        actual: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_joins_path() {
        let err = StrataError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn unresolved_placeholder_names_attribute() {
        let err = StrataError::UnresolvedPlaceholder {
            logical_id: "fn".into(),
            attribute: "filename".into(),
            placeholder: "function archive".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fn.filename"), "got: {msg}");
        assert!(msg.contains("function archive"), "got: {msg}");
    }
}
