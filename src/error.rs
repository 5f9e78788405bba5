//! Error types for the snapshot/restore engine.
//!
//! This module provides the error taxonomy used by the dumper, loader and
//! fix-up pass: missing handles, unsupported value tags, codec failures,
//! structural impossibilities and resource exhaustion.

use std::fmt;

use thiserror::Error;

use crate::identity::Handle;

/// Errors produced while dumping or loading a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// A field referenced a handle that is not present in its bucket.
    #[error(
        "missing handle: {path} references {handle:?} which is not present in the {bucket} bucket"
    )]
    MissingHandle {
        /// The bucket the handle was expected to resolve in.
        bucket: &'static str,
        /// The handle that failed to resolve.
        handle: Handle,
        /// The handle path that reached this field, e.g. `mainThread.env.[3].value`.
        path: String,
    },

    /// A `Value.Type` tag was not one of the recognized scalar/pointer kinds.
    #[error("unsupported value type tag {tag} at {path}")]
    UnsupportedValueType {
        /// The raw tag found in the document.
        tag: i64,
        /// The handle path that reached this value.
        path: String,
    },

    /// A user-supplied codec (user data or native callback) failed.
    #[error("codec failure at {path}: {reason}")]
    CodecFailure {
        /// What the codec was asked to do.
        reason: String,
        /// The handle path that reached this value.
        path: String,
        /// The underlying cause returned by the codec, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The document describes a graph shape that cannot exist, e.g. a
    /// Thread with no Global, or a Table whose metatable is a scalar.
    #[error("structural impossibility at {path}: {reason}")]
    StructuralImpossibility {
        /// What invariant was violated.
        reason: String,
        /// The handle path that reached this value.
        path: String,
    },

    /// Allocation failure while building shells or filling them.
    #[error("resource exhausted: {reason}")]
    ResourceExhausted {
        /// Description of what ran out.
        reason: String,
    },
}

impl SnapshotError {
    /// Creates a new missing-handle error.
    pub fn missing_handle(bucket: &'static str, handle: Handle, path: impl Into<String>) -> Self {
        Self::MissingHandle {
            bucket,
            handle,
            path: path.into(),
        }
    }

    /// Creates a new unsupported-value-type error.
    pub fn unsupported_value_type(tag: i64, path: impl Into<String>) -> Self {
        Self::UnsupportedValueType {
            tag,
            path: path.into(),
        }
    }

    /// Creates a new codec-failure error with no underlying cause.
    pub fn codec_failure(reason: impl Into<String>, path: impl Into<String>) -> Self {
        Self::CodecFailure {
            reason: reason.into(),
            path: path.into(),
            source: None,
        }
    }

    /// Creates a new codec-failure error wrapping an underlying cause.
    pub fn codec_failure_with_source(
        reason: impl Into<String>,
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CodecFailure {
            reason: reason.into(),
            path: path.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new structural-impossibility error.
    pub fn structural(reason: impl Into<String>, path: impl Into<String>) -> Self {
        Self::StructuralImpossibility {
            reason: reason.into(),
            path: path.into(),
        }
    }

    /// Creates a new resource-exhaustion error.
    pub fn resource_exhausted(reason: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            reason: reason.into(),
        }
    }

    /// Prefixes the handle path carried by this error. Used as phase B
    /// unwinds back up the traversal so the final error names the full
    /// path from the root rather than just the leaf field.
    pub fn with_path_prefix(self, prefix: impl fmt::Display) -> Self {
        match self {
            Self::MissingHandle {
                bucket,
                handle,
                path,
            } => Self::MissingHandle {
                bucket,
                handle,
                path: format!("{prefix}.{path}"),
            },
            Self::UnsupportedValueType { tag, path } => Self::UnsupportedValueType {
                tag,
                path: format!("{prefix}.{path}"),
            },
            Self::CodecFailure {
                reason,
                path,
                source,
            } => Self::CodecFailure {
                reason,
                path: format!("{prefix}.{path}"),
                source,
            },
            Self::StructuralImpossibility { reason, path } => Self::StructuralImpossibility {
                reason,
                path: format!("{prefix}.{path}"),
            },
            other @ Self::ResourceExhausted { .. } => other,
        }
    }

    /// Classifies the error for logging/metrics, mirroring the five kinds
    /// named in the error taxonomy.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingHandle { .. } => "missing-handle",
            Self::UnsupportedValueType { .. } => "unsupported-value-type",
            Self::CodecFailure { .. } => "codec-failure",
            Self::StructuralImpossibility { .. } => "structural-impossibility",
            Self::ResourceExhausted { .. } => "resource-exhaustion",
        }
    }
}

/// Result alias used throughout the crate.
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_handle_message() {
        let err = SnapshotError::missing_handle("Tables", Handle::from("t-1"), "mainThread.env");
        assert_eq!(
            err.to_string(),
            "missing handle: mainThread.env references \"t-1\" which is not present in the Tables bucket"
        );
        assert_eq!(err.category(), "missing-handle");
    }

    #[test]
    fn path_prefix_accumulates_from_leaf_to_root() {
        let err = SnapshotError::unsupported_value_type(42, "value");
        let err = err.with_path_prefix("mainThread.env.[3]");
        assert_eq!(
            err.to_string(),
            "unsupported value type tag 42 at mainThread.env.[3].value"
        );
    }

    #[test]
    fn codec_failure_chains_source() {
        #[derive(Debug)]
        struct Inner;
        impl fmt::Display for Inner {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "inner cause")
            }
        }
        impl std::error::Error for Inner {}

        let err = SnapshotError::codec_failure_with_source("load_user_data", "userData-1", Inner);
        assert_eq!(err.category(), "codec-failure");
        assert!(std::error::Error::source(&err).is_some());
    }
}
