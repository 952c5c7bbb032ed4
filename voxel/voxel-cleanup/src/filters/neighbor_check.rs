//! Reclaiming bad voxels that agree with enough good face neighbors.

use tracing::info;
use voxel_types::GridDims;

use crate::converge::{ConvergenceReport, Outcome, Termination, drive};
use crate::error::{CleanupResult, check_len, invalid};
use crate::sweep::{SweepConfig, SweepObserver, SweepStats};

/// Parameters for [`neighbor_orientation_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborCheckParams {
    /// Lowest number of similar good neighbours (1..=6) that reclaims a bad voxel.
    ///
    /// Levels are processed from 6 down to this value.
    /// Default: `6`
    pub min_neighbors: u8,

    /// Sweep settings. `max_sweeps` bounds the passes per level.
    pub sweep: SweepConfig,
}

impl Default for NeighborCheckParams {
    fn default() -> Self {
        Self {
            min_neighbors: 6,
            sweep: SweepConfig::default(),
        }
    }
}

impl NeighborCheckParams {
    /// Set the lowest level.
    #[must_use]
    pub fn with_min_neighbors(mut self, n: u8) -> Self {
        self.min_neighbors = n;
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
    /// if `min_neighbors` is outside 1..=6.
    pub fn validate(&self) -> CleanupResult<()> {
        if !(1..=6).contains(&self.min_neighbors) {
            return Err(invalid(
                "min_neighbors",
                format!("{} is outside 1..=6", self.min_neighbors),
            ));
        }
        Ok(())
    }
}

/// What [`neighbor_orientation_check`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborCheckReport {
    /// Levels processed.
    pub levels: u8,
    /// Bad voxels that became good.
    pub reclaimed: usize,
    /// All passes over all levels; `residual` is unused.
    pub convergence: ConvergenceReport,
}

/// Reclaims bad voxels that agree with enough of their good neighbours.
///
/// `similar(a, b)` decides whether voxels `a` and `b` belong together, for
/// example by misorientation. Each bad voxel counts its good, similar face
/// neighbours. Starting at level 6 and stepping down to `min_neighbors`, every
/// bad voxel whose count reaches the level becomes good; its bad neighbours
/// that are similar to it gain one count. A level repeats until a pass
/// reclaims nothing. Each pass decides from the mask as it was when the pass
/// started.
///
/// # Errors
///
/// Returns an error for invalid parameters or a mask that does not cover the
/// grid, before the mask is modified.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{NeighborCheckParams, neighbor_orientation_check};
/// use voxel_types::GridDims;
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let mut mask = vec![true, false, false, false, true];
/// let params = NeighborCheckParams::default().with_min_neighbors(1);
///
/// let report = neighbor_orientation_check(&grid, &mut mask, &params, |_, _| true, &mut ()).unwrap();
///
/// assert_eq!(report.reclaimed, 3);
/// assert!(mask.iter().all(|&m| m));
/// ```
pub fn neighbor_orientation_check<F>(
    grid: &GridDims,
    mask: &mut [bool],
    params: &NeighborCheckParams,
    similar: F,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<NeighborCheckReport>
where
    F: Fn(usize, usize) -> bool,
{
    params.validate()?;
    let voxels = grid.voxel_count();
    check_len("mask", mask.len(), voxels)?;

    let mut counts = vec![0usize; voxels];
    for i in grid.indices().filter(|&i| !mask[i]) {
        counts[i] = grid
            .face_neighbors(i)
            .into_iter()
            .flatten()
            .filter(|&n| mask[n] && similar(i, n))
            .count();
    }

    let mut report = NeighborCheckReport::default();
    let mut flips = Vec::new();

    for level in (params.min_neighbors..=6).rev() {
        let threshold = usize::from(level);
        let pass = drive(
            Termination::Graduated { repeat: true },
            params.sweep.sweep_limit(voxels),
            observer,
            |sweep| {
                flips.clear();
                flips.extend(grid.indices().filter(|&i| !mask[i] && counts[i] >= threshold));
                for &i in &flips {
                    mask[i] = true;
                }
                for &i in &flips {
                    for n in grid.face_neighbors(i).into_iter().flatten() {
                        if !mask[n] && similar(i, n) {
                            counts[n] += 1;
                        }
                    }
                }
                Ok(SweepStats {
                    sweep,
                    pending: flips.len(),
                    resolved: flips.len(),
                })
            },
        )?;

        report.levels += 1;
        report.reclaimed += pass.resolved;
        report.convergence.absorb(&pass);
        if pass.outcome == Outcome::Cancelled {
            break;
        }
    }
    report.convergence.residual = 0;

    info!(
        levels = report.levels,
        reclaimed = report.reclaimed,
        outcome = ?report.convergence.outcome,
        "neighbor check complete"
    );
    Ok(report)
}
