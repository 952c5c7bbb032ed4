//! Error types for voxel cleanup operations.

use thiserror::Error;
use voxel_types::GridError;

/// Result type for cleanup operations.
pub type CleanupResult<T> = Result<T, CleanupError>;

/// Errors that can occur during voxel cleanup.
///
/// Every variant is raised while validating inputs, before any array has
/// been modified. Stalled or cancelled convergence is not an error; see
/// [`Outcome`](crate::Outcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupError {
    /// Grid or attribute-array failure.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A per-voxel or per-feature slice has the wrong length.
    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Which input was wrong.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// A parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A voxel label has no row in the feature table.
    #[error("feature id {id} exceeds the feature table ({num_features} rows)")]
    FeatureOutOfRange {
        /// The offending label.
        id: i32,
        /// Rows in the feature table.
        num_features: usize,
    },

    /// Every feature failed the removal criterion.
    ///
    /// Neither the labels nor the feature table are touched.
    #[error("all {num_features} features would be removed")]
    AllFeaturesRemoved {
        /// Number of candidate features (excluding row 0).
        num_features: usize,
    },
}

/// Checks that a slice covers the grid (or table) exactly.
pub(crate) fn check_len(what: &'static str, actual: usize, expected: usize) -> CleanupResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(CleanupError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Shorthand for an [`CleanupError::InvalidParameter`] result.
pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> CleanupError {
    CleanupError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}
