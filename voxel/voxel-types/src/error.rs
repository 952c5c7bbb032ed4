//! Error types for grid and attribute-array operations.

/// Errors that can occur while building grids or manipulating attribute arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// Every grid dimension must be at least one voxel.
    #[error("invalid grid dimensions: {x}x{y}x{z}")]
    InvalidDimensions {
        /// Extent along X.
        x: usize,
        /// Extent along Y.
        y: usize,
        /// Extent along Z.
        z: usize,
    },

    /// The voxel count does not fit in `usize`.
    #[error("integer overflow computing the voxel count of a {x}x{y}x{z} grid")]
    IntegerOverflow {
        /// Extent along X.
        x: usize,
        /// Extent along Y.
        y: usize,
        /// Extent along Z.
        z: usize,
    },

    /// A tuple index is outside the array.
    #[error("tuple index {index} is out of range for `{name}` ({len} tuples)")]
    IndexOutOfRange {
        /// Name of the array.
        name: String,
        /// The offending index.
        index: usize,
        /// Number of tuples in the array.
        len: usize,
    },

    /// An array has a different tuple count than its owner expects.
    #[error("array `{name}` has {actual} tuples, expected {expected}")]
    TupleCountMismatch {
        /// Name of the array.
        name: String,
        /// Tuple count required by the owner.
        expected: usize,
        /// Tuple count of the array.
        actual: usize,
    },

    /// Flat storage is not a whole number of tuples.
    #[error("array `{name}` holds {len} values, not a multiple of {components} components")]
    RaggedStorage {
        /// Name of the array.
        name: String,
        /// Number of stored values.
        len: usize,
        /// Components per tuple.
        components: usize,
    },

    /// Arrays need at least one component per tuple.
    #[error("array `{name}` must have at least one component per tuple")]
    ZeroComponents {
        /// Name of the array.
        name: String,
    },

    /// An array with the same name is already present.
    #[error("array `{name}` already exists")]
    DuplicateArray {
        /// Name of the array.
        name: String,
    },

    /// No array with this name.
    #[error("array `{name}` not found")]
    MissingArray {
        /// Name of the array.
        name: String,
    },

    /// The array exists but stores a different element type.
    #[error("array `{name}` stores `{actual}`, not `{expected}`")]
    TypeMismatch {
        /// Name of the array.
        name: String,
        /// Requested element type.
        expected: &'static str,
        /// Stored element type.
        actual: &'static str,
    },

    /// A per-tuple mask does not match the tuple count.
    #[error("mask has {actual} entries, expected {expected}")]
    MaskLengthMismatch {
        /// Tuple count of the owner.
        expected: usize,
        /// Length of the mask.
        actual: usize,
    },

    /// A label refers to a feature row that does not exist.
    #[error("label {label} has no row in a table of {rows} features")]
    LabelOutOfRange {
        /// The offending label.
        label: i32,
        /// Number of feature rows.
        rows: usize,
    },
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
