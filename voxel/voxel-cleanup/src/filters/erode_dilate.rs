//! Growing or shrinking the background by whole-voxel layers.

use hashbrown::HashSet;
use tracing::info;
use voxel_types::{AttributeMatrix, FaceMask, GridDims};

use super::check_cells;
use crate::converge::{ConvergenceReport, Outcome, Termination, drive};
use crate::error::{CleanupResult, invalid};
use crate::propagate::{LabelUpdate, Propagation, propagate};
use crate::sweep::{SweepConfig, SweepObserver, SweepStats};
use crate::vote::{BackgroundRule, NeighborMap, VoteTally, sweep_votes};

/// Direction of an erode/dilate pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    /// Background voxels take the majority neighbouring feature.
    #[default]
    Dilate,
    /// Labeled voxels touching background become background.
    Erode,
}

/// Parameters for [`erode_dilate_bad_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErodeDilateParams {
    /// Grow or shrink the background.
    ///
    /// Default: [`Operation::Dilate`]
    pub operation: Operation,

    /// Number of passes.
    ///
    /// Default: `2`
    pub iterations: usize,

    /// Axes along which neighbours are considered.
    ///
    /// Default: all three
    pub faces: FaceMask,

    /// Cell arrays that are not copied.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings.
    pub sweep: SweepConfig,
}

impl Default for ErodeDilateParams {
    fn default() -> Self {
        Self {
            operation: Operation::Dilate,
            iterations: 2,
            faces: FaceMask::ALL,
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl ErodeDilateParams {
    /// Params for eroding `iterations` times.
    #[must_use]
    pub fn erode(iterations: usize) -> Self {
        Self {
            operation: Operation::Erode,
            iterations,
            ..Default::default()
        }
    }

    /// Params for dilating `iterations` times.
    #[must_use]
    pub fn dilate(iterations: usize) -> Self {
        Self {
            operation: Operation::Dilate,
            iterations,
            ..Default::default()
        }
    }

    /// Set the number of passes.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Enable or disable neighbours per axis.
    #[must_use]
    pub fn with_faces(mut self, faces: FaceMask) -> Self {
        self.faces = faces;
        self
    }

    /// Exclude a cell array from copying.
    #[must_use]
    pub fn with_ignored_array(mut self, name: impl Into<String>) -> Self {
        self.ignored_arrays.insert(name.into());
        self
    }

    /// Set the sweep settings.
    #[must_use]
    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::InvalidParameter`](crate::CleanupError::InvalidParameter)
    /// if `iterations` is zero or every axis is disabled.
    pub fn validate(&self) -> CleanupResult<()> {
        if self.iterations == 0 {
            return Err(invalid("iterations", "must be at least 1"));
        }
        if self.faces.is_empty() {
            return Err(invalid("faces", "at least one axis must be enabled"));
        }
        Ok(())
    }
}

/// What [`erode_dilate_bad_data`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErodeDilateReport {
    /// The operation applied.
    pub operation: Operation,
    /// Voxels changed per pass, summed.
    pub changed: usize,
    /// The pass loop. Running all requested passes counts as converged, and
    /// so does stopping early because a pass found nothing to change.
    pub convergence: ConvergenceReport,
}

/// Grows or shrinks the background (label 0) by whole-voxel layers.
///
/// Dilation gives each background voxel the majority neighbouring feature.
/// Erosion turns each labeled voxel touching background into background,
/// copying that background voxel's cell data; when several background
/// voxels touch it, the one with the highest index donates. Each pass sees
/// the labels as they were when it started.
///
/// # Errors
///
/// Returns an error for invalid parameters or mismatched lengths, before any
/// array is modified.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{ErodeDilateParams, erode_dilate_bad_data};
/// use voxel_types::{AttributeMatrix, GridDims};
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let mut labels = vec![0, 0, 4, 0, 0];
/// let mut cells = AttributeMatrix::new(5);
///
/// erode_dilate_bad_data(&grid, &mut labels, &mut cells, &ErodeDilateParams::dilate(1), &mut ())
///     .unwrap();
/// assert_eq!(labels, vec![0, 4, 4, 4, 0]);
/// ```
pub fn erode_dilate_bad_data(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    params: &ErodeDilateParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<ErodeDilateReport> {
    params.validate()?;
    let voxels = grid.voxel_count();
    check_cells(voxels, labels, cells)?;

    let parallel = params.sweep.use_parallel(voxels);
    let faces = params.faces;
    let mut tally = VoteTally::for_labels(labels);
    let mut map = NeighborMap::new(voxels);

    let label_update = match params.operation {
        Operation::Dilate => LabelUpdate::Donor,
        Operation::Erode => LabelUpdate::Zero,
    };
    let policy = Propagation::new(label_update, &params.ignored_arrays);

    let mut convergence = drive(
        Termination::Graduated { repeat: true },
        params.iterations,
        observer,
        |sweep| {
            match params.operation {
                Operation::Dilate => {
                    sweep_votes(
                        grid,
                        labels,
                        faces,
                        &mut tally,
                        &mut map,
                        &BackgroundRule,
                        parallel,
                    );
                }
                Operation::Erode => claim_for_erosion(grid, labels, faces, &mut map),
            }
            let pending = map.resolved_count();
            let resolved = if pending == 0 {
                0
            } else {
                propagate(labels, cells, &map, &policy)?
            };
            Ok(SweepStats {
                sweep,
                pending,
                resolved,
            })
        },
    )?;
    if convergence.outcome == Outcome::IterationLimit {
        convergence.outcome = Outcome::Converged;
    }

    info!(
        operation = ?params.operation,
        passes = convergence.sweeps,
        changed = convergence.resolved,
        "erode/dilate complete"
    );
    Ok(ErodeDilateReport {
        operation: params.operation,
        changed: convergence.resolved,
        convergence,
    })
}

/// Lets every background voxel claim its labeled neighbours, in scan order.
fn claim_for_erosion(grid: &GridDims, labels: &[i32], faces: FaceMask, map: &mut NeighborMap) {
    map.reset();
    for (i, _) in labels.iter().enumerate().filter(|&(_, &label)| label == 0) {
        for n in faces.apply(grid.face_neighbors(i)).into_iter().flatten() {
            if labels[n] > 0 {
                map.set(n, Some(i));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use voxel_types::DataArray;

    #[test]
    fn test_dilate_two_passes() {
        let grid = GridDims::new(7, 1, 1).unwrap();
        let mut labels = vec![0, 0, 0, 5, 0, 0, 0];
        let mut cells = AttributeMatrix::new(7);
        let report = erode_dilate_bad_data(
            &grid,
            &mut labels,
            &mut cells,
            &ErodeDilateParams::dilate(2),
            &mut (),
        )
        .unwrap();
        assert_eq!(labels, vec![0, 5, 5, 5, 5, 5, 0]);
        assert_eq!(report.changed, 4);
        assert_eq!(report.convergence.sweeps, 2);
        assert_eq!(report.convergence.outcome, Outcome::Converged);
    }

    #[test]
    fn test_erode_copies_background_data() {
        let grid = GridDims::new(4, 1, 1).unwrap();
        let mut labels = vec![0, 3, 3, 0];
        let mut cells = AttributeMatrix::new(4);
        cells
            .insert(DataArray::from_vec("Confidence", 1, vec![0.1f32, 0.9, 0.8, 0.2]).unwrap())
            .unwrap();
        erode_dilate_bad_data(
            &grid,
            &mut labels,
            &mut cells,
            &ErodeDilateParams::erode(1),
            &mut (),
        )
        .unwrap();
        assert_eq!(labels, vec![0, 0, 0, 0]);
        assert_eq!(
            cells.get::<f32>("Confidence").unwrap().as_slice(),
            &[0.1, 0.1, 0.2, 0.2]
        );
    }

    #[test]
    fn test_erode_highest_index_background_wins() {
        let grid = GridDims::new(3, 1, 1).unwrap();
        let mut labels = vec![0, 3, 0];
        let mut cells = AttributeMatrix::new(3);
        cells
            .insert(DataArray::from_vec("Id", 1, vec![10, 11, 12]).unwrap())
            .unwrap();
        erode_dilate_bad_data(
            &grid,
            &mut labels,
            &mut cells,
            &ErodeDilateParams::erode(1),
            &mut (),
        )
        .unwrap();
        assert_eq!(cells.get::<i32>("Id").unwrap().as_slice(), &[10, 12, 12]);
    }

    #[test]
    fn test_face_mask_restricts_axes() {
        let grid = GridDims::new(3, 3, 1).unwrap();
        let mut labels = vec![0; 9];
        labels[4] = 2;
        let mut cells = AttributeMatrix::new(9);
        let params = ErodeDilateParams::dilate(1).with_faces(FaceMask::new(true, false, false));
        erode_dilate_bad_data(&grid, &mut labels, &mut cells, &params, &mut ()).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 2, 2, 2, 0, 0, 0]);
    }

    #[test]
    fn test_nothing_to_do_stops_early() {
        let grid = GridDims::new(3, 1, 1).unwrap();
        let mut labels = vec![1, 1, 1];
        let mut cells = AttributeMatrix::new(3);
        let report = erode_dilate_bad_data(
            &grid,
            &mut labels,
            &mut cells,
            &ErodeDilateParams::dilate(5),
            &mut (),
        )
        .unwrap();
        assert_eq!(report.convergence.sweeps, 0);
        assert_eq!(labels, vec![1, 1, 1]);
    }

    #[test]
    fn test_erode_stops_once_nothing_touches_background() {
        let grid = GridDims::new(4, 1, 1).unwrap();
        let mut labels = vec![0, 3, 3, 0];
        let mut cells = AttributeMatrix::new(4);
        let report = erode_dilate_bad_data(
            &grid,
            &mut labels,
            &mut cells,
            &ErodeDilateParams::erode(3),
            &mut (),
        )
        .unwrap();
        assert_eq!(labels, vec![0; 4]);
        assert_eq!(report.convergence.sweeps, 1);
        assert_eq!(report.convergence.outcome, Outcome::Converged);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let grid = GridDims::new(3, 1, 1).unwrap();
        let mut labels = vec![1, 0, 1];
        let mut cells = AttributeMatrix::new(3);
        assert!(
            erode_dilate_bad_data(
                &grid,
                &mut labels,
                &mut cells,
                &ErodeDilateParams::dilate(0),
                &mut (),
            )
            .is_err()
        );
    }
}
