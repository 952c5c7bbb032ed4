//! Neighbor-connectivity cleanup for labeled voxel volumes.
//!
//! This crate provides tools for:
//! - Face-connected component labeling with boundary tracking
//! - Neighbor-majority voting with first-wins tie breaking
//! - Sweeping to a fixpoint with progress, cancellation and stall detection
//! - Copying cell attributes from donors to recipients in bulk
//! - Removing features and compacting the feature table
//! - The cleanup filters built on top of these (fill bad data,
//!   erode/dilate, coordination number smoothing, sample identification,
//!   minimum size, minimum neighbours, flagged removal, surface cells,
//!   neighbour orientation check)
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Labels
//!
//! Voxel labels are `i32` feature ids. `0` is background ("bad" data),
//! positive values are features, and negative values (see [`PENDING`]) mark
//! voxels waiting to be filled. A fill that cannot reach some voxels leaves
//! them negative and reports them as `residual`; this is not an error.
//!
//! # Example
//!
//! ```
//! use voxel_cleanup::{FillBadDataParams, Outcome, SweepConfig, fill_bad_data};
//! use voxel_types::{AttributeMatrix, DataArray, GridDims};
//!
//! let grid = GridDims::new(5, 5, 1).unwrap();
//! let mut labels = vec![1; 25];
//! labels[12] = 0;
//!
//! let mut cells = AttributeMatrix::new(25);
//! cells
//!     .insert(DataArray::<f32>::filled("Confidence", 25, 1, 0.9).unwrap())
//!     .unwrap();
//!
//! let params = FillBadDataParams::default()
//!     .with_min_defect_size(1)
//!     .with_sweep(SweepConfig::serial());
//! let report = fill_bad_data(&grid, &mut labels, &mut cells, &params, &mut ()).unwrap();
//!
//! assert_eq!(labels[12], 1);
//! assert_eq!(report.convergence.outcome, Outcome::Converged);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod components;
mod converge;
mod error;
pub mod features;
mod filters;
mod propagate;
mod sweep;
pub mod vote;

pub use converge::{ConvergenceReport, Outcome, PENDING, Termination, drive, resolve_pending};
pub use error::{CleanupError, CleanupResult};
pub use propagate::{LabelUpdate, Propagation, propagate};
pub use sweep::{CancelFlag, SweepConfig, SweepLog, SweepObserver, SweepStats};

// Re-export commonly used items from submodules
pub use components::{Component, fill_interior_holes, find_components, largest_component};
pub use features::{
    RemovalOptions, RemovalReport, feature_sizes, find_num_neighbors, mark_inactive_voxels,
    remove_features,
};
pub use filters::{
    CoordinationParams, ErodeDilateParams, ErodeDilateReport, FillBadDataParams,
    FillBadDataReport, IdentifySampleParams, IdentifySampleReport, MinNeighborsParams,
    MinSizeParams, NeighborCheckParams, NeighborCheckReport, Operation, RemoveFlaggedParams,
    erode_dilate_bad_data, erode_dilate_coordination_number, fill_bad_data, find_surface_cells,
    identify_sample, min_neighbors, min_size, neighbor_orientation_check,
    remove_flagged_features,
};
pub use vote::{NeighborMap, VoteRule, VoteTally};
