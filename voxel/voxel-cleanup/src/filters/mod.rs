//! Cleanup filters built from the engine primitives.
//!
//! Each filter is a free function taking the grid, borrowed arrays and a
//! params struct. Parameters and array lengths are validated before any
//! array is touched.

mod coordination;
mod erode_dilate;
mod fill_bad_data;
mod identify_sample;
mod min_neighbors;
mod min_size;
mod neighbor_check;
mod remove_flagged;
mod surface_cells;

pub use coordination::{CoordinationParams, erode_dilate_coordination_number};
pub use erode_dilate::{ErodeDilateParams, ErodeDilateReport, Operation, erode_dilate_bad_data};
pub use fill_bad_data::{FillBadDataParams, FillBadDataReport, fill_bad_data};
pub use identify_sample::{IdentifySampleParams, IdentifySampleReport, identify_sample};
pub use min_neighbors::{MinNeighborsParams, min_neighbors};
pub use min_size::{MinSizeParams, min_size};
pub use neighbor_check::{NeighborCheckParams, NeighborCheckReport, neighbor_orientation_check};
pub use remove_flagged::{RemoveFlaggedParams, remove_flagged_features};
pub use surface_cells::find_surface_cells;

use voxel_types::{AttributeArray, AttributeMatrix};

use crate::error::{CleanupResult, check_len, invalid};

/// Checks the per-voxel inputs shared by the label-based filters.
fn check_cells(voxels: usize, labels: &[i32], cells: &AttributeMatrix) -> CleanupResult<()> {
    check_len("labels", labels.len(), voxels)?;
    check_len("cell attribute matrix", cells.num_tuples(), voxels)
}

/// Feature phases used to restrict a removal criterion to one phase.
///
/// Returns `None` when no restriction is set.
fn phase_filter<'a>(
    features: &'a AttributeMatrix,
    single_phase: Option<i32>,
    array: &str,
) -> CleanupResult<Option<(&'a [i32], i32)>> {
    let Some(phase) = single_phase else {
        return Ok(None);
    };
    let phases = phase_ids(features, array, "feature_phases_array")?;
    Ok(Some((phases, phase)))
}

/// A one-component `i32` phase array, as a flat slice.
fn phase_ids<'a>(
    matrix: &'a AttributeMatrix,
    array: &str,
    param: &'static str,
) -> CleanupResult<&'a [i32]> {
    let phases = matrix.get::<i32>(array)?;
    if phases.components() != 1 {
        return Err(invalid(param, format!("`{array}` must have one component")));
    }
    Ok(phases.as_slice())
}

fn check_single_phase(single_phase: Option<i32>) -> CleanupResult<()> {
    match single_phase {
        Some(phase) if phase < 1 => Err(invalid("single_phase", "phase ids start at 1")),
        _ => Ok(()),
    }
}
