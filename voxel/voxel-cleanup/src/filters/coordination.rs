//! Filling background voxels by face-neighbor coordination count.

use std::hash::BuildHasher;

use hashbrown::{DefaultHashBuilder, HashSet};
use tracing::{info, warn};
use voxel_types::{AttributeMatrix, FaceMask, GridDims};

use super::check_cells;
use crate::converge::{ConvergenceReport, Outcome, Termination, drive};
use crate::error::{CleanupResult, invalid};
use crate::propagate::{LabelUpdate, Propagation, propagate};
use crate::sweep::{SweepConfig, SweepObserver, SweepStats};
use crate::vote::{CoordinationRule, NeighborMap, VoteTally, sweep_votes};

/// Parameters for [`erode_dilate_coordination_number`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinationParams {
    /// Opposite-status neighbours (0..=6) a voxel needs before it flips.
    ///
    /// Default: `6`
    pub coordination_number: u8,

    /// Keep passing until no voxel qualifies; otherwise run one pass.
    /// Looping stops early if the labels cycle back to an earlier pass.
    ///
    /// Default: `false`
    pub loop_until_gone: bool,

    /// Cell arrays that are not copied.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings. `max_sweeps` bounds the passes.
    pub sweep: SweepConfig,
}

impl Default for CoordinationParams {
    fn default() -> Self {
        Self {
            coordination_number: 6,
            loop_until_gone: false,
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl CoordinationParams {
    /// Set the coordination threshold.
    #[must_use]
    pub fn with_coordination_number(mut self, n: u8) -> Self {
        self.coordination_number = n;
        self
    }

    /// Set whether to loop until no voxel qualifies.
    #[must_use]
    pub fn with_loop_until_gone(mut self, repeat: bool) -> Self {
        self.loop_until_gone = repeat;
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
    /// if the coordination number exceeds 6.
    pub fn validate(&self) -> CleanupResult<()> {
        if self.coordination_number > 6 {
            return Err(invalid(
                "coordination_number",
                format!("{} is outside 0..=6", self.coordination_number),
            ));
        }
        Ok(())
    }
}

/// Smooths the good/background boundary by coordination number.
///
/// A voxel flips when at least `coordination_number` of its face neighbours
/// have the opposite status (labeled vs. background). It then copies the
/// label and cell data of the majority such neighbour, so background voxels
/// become the most common neighbouring feature and labeled voxels become
/// background. Each pass sees the labels as they were when it started.
///
/// The report counts qualifying voxels as pending. A pass that changes
/// nothing ends the loop as stalled. When looping, a pass that would start
/// from a labeling already seen is not run: the report ends as
/// [`Outcome::Oscillating`] with the qualifying voxels as residual.
///
/// # Errors
///
/// Returns an error for invalid parameters or mismatched lengths, before any
/// array is modified.
pub fn erode_dilate_coordination_number(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    params: &CoordinationParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<ConvergenceReport> {
    params.validate()?;
    let voxels = grid.voxel_count();
    check_cells(voxels, labels, cells)?;

    let rule = CoordinationRule {
        threshold: params.coordination_number,
    };
    let parallel = params.sweep.use_parallel(voxels);
    let policy = Propagation::new(LabelUpdate::Donor, &params.ignored_arrays);
    let mut tally = VoteTally::for_labels(labels);
    let mut map = NeighborMap::new(voxels);
    let states = DefaultHashBuilder::default();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut cycle: Option<usize> = None;

    let mut report = drive(
        Termination::Graduated {
            repeat: params.loop_until_gone,
        },
        params.sweep.sweep_limit(voxels),
        observer,
        |sweep| {
            let pending = sweep_votes(
                grid,
                labels,
                FaceMask::ALL,
                &mut tally,
                &mut map,
                &rule,
                parallel,
            );
            if pending > 0 && params.loop_until_gone && !seen.insert(states.hash_one(&*labels)) {
                cycle = Some(pending);
                return Ok(SweepStats {
                    sweep,
                    pending: 0,
                    resolved: 0,
                });
            }
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
    if let Some(pending) = cycle {
        warn!(
            passes = report.sweeps,
            pending = pending,
            "coordination passes cycle, stopping"
        );
        report.outcome = Outcome::Oscillating;
        report.residual = pending;
    }

    info!(
        coordination_number = params.coordination_number,
        passes = report.sweeps,
        changed = report.resolved,
        outcome = ?report.outcome,
        "coordination smoothing complete"
    );
    Ok(report)
}
