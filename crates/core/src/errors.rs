//! Error types for the team mention core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! An unresolvable mention is never an error: it is the normal pass-through
//! outcome and has no variant here.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    DirectoryFile(#[from] DirectoryFileError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Identity store errors
// ---------------------------------------------------------------------------

/// Infrastructure failures raised by an identity store.
///
/// A lookup that simply finds nothing returns `Ok(None)`; these variants are
/// reserved for a store that could not answer at all.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying rusqlite error.
    #[error("identity store database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// A migration failed.
    #[error("identity store migration failed (version {version}): {detail}")]
    MigrationFailed {
        version: u32,
        detail: String,
    },

    /// Inserting a record would violate a uniqueness rule.
    #[error("{entity} already exists: {key}")]
    Duplicate {
        entity: String,
        key: String,
    },

    /// A record referenced by an insert was not found.
    #[error("{entity} not found: {key}")]
    NotFound {
        entity: String,
        key: String,
    },

    /// The store could not be reached.
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Directory file errors
// ---------------------------------------------------------------------------

/// Errors from reading a TOML organization/team directory file.
#[derive(Debug, Error)]
pub enum DirectoryFileError {
    /// The file could not be found.
    #[error("directory file error at '{path}': {detail}")]
    FileError {
        path: String,
        detail: String,
    },

    /// TOML parse error.
    #[error("directory file parse error: {0}")]
    ParseError(String),

    /// The file parsed but describes an impossible directory.
    #[error("invalid directory entry '{entry}': {detail}")]
    InvalidEntry {
        entry: String,
        detail: String,
    },

    /// Generic I/O error.
    #[error("directory file I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

/// Structural failures while reading or rewriting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A node handle no longer refers to a node in the tree.
    #[error("document node {0} no longer exists")]
    NodeMissing(String),

    /// The node exists but is not a text node.
    #[error("document node {0} is not a text node")]
    NotText(String),

    /// The replacement node has no parent to attach the new markup to.
    #[error("document node {0} is detached from the tree")]
    Detached(String),
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a filter pass. Both are propagated unmodified from the
/// collaborator that raised them.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The identity store failed during resolution.
    #[error("mention filter store error: {0}")]
    Store(#[from] StoreError),

    /// The document could not be rewritten.
    #[error("mention filter document error: {0}")]
    Document(#[from] DocumentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ConfigError::InvalidValue {
            field: "filter.base_url".into(),
            detail: "must not be empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration value for 'filter.base_url': must not be empty"
        );

        let err = StoreError::Duplicate {
            entity: "team".into(),
            key: "acme/frontend".into(),
        };
        assert_eq!(err.to_string(), "team already exists: acme/frontend");

        let err = DocumentError::NodeMissing("NodeId(4)".into());
        assert!(err.to_string().contains("no longer exists"));
    }

    #[test]
    fn test_filter_error_wraps_store_error() {
        let err: FilterError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, FilterError::Store(StoreError::Unavailable(_))));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let core_err: CoreError = ConfigError::FileNotFound("/tmp/x.toml".into()).into();
        assert!(matches!(core_err, CoreError::Config(_)));

        let core_err: CoreError = FilterError::Document(DocumentError::Detached("n".into())).into();
        assert!(matches!(core_err, CoreError::Filter(_)));
    }
}
