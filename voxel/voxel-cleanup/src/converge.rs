//! Iterating sweeps to a fixpoint.
//!
//! [`drive`] owns the loop and its termination rules; callers supply one
//! sweep as a closure. [`resolve_pending`] is the fixpoint fill shared by every
//! filter that marks voxels with [`PENDING`].

use hashbrown::HashSet;
use tracing::{debug, warn};
use voxel_types::{AttributeMatrix, FaceMask, GridDims};

use crate::error::{CleanupResult, check_len};
use crate::propagate::{LabelUpdate, Propagation, propagate};
use crate::sweep::{SweepConfig, SweepObserver, SweepStats};
use crate::vote::{NeighborMap, SentinelRule, VoteTally, sweep_votes};

/// Label of a voxel waiting for a donor.
pub const PENDING: i32 = -1;

/// How a convergence loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// Nothing is left to do.
    #[default]
    Converged,
    /// A sweep changed nothing while work remained.
    Stalled,
    /// The observer asked to stop between sweeps.
    Cancelled,
    /// The sweep cap was reached.
    IterationLimit,
    /// A sweep would restore an earlier labeling, so sweeping would repeat
    /// forever.
    Oscillating,
}

/// Summary of one convergence loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceReport {
    /// Sweeps that had work to do.
    pub sweeps: usize,
    /// Voxels changed over all sweeps.
    pub resolved: usize,
    /// Voxels still waiting when the loop ended.
    pub residual: usize,
    /// Why the loop ended.
    pub outcome: Outcome,
}

impl ConvergenceReport {
    /// Whether the loop finished with nothing left over.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Converged && self.residual == 0
    }

    /// Folds a later loop into this one. The later outcome wins unless this
    /// one already stopped early.
    pub fn absorb(&mut self, later: &Self) {
        self.sweeps += later.sweeps;
        self.resolved += later.resolved;
        self.residual = later.residual;
        if self.outcome == Outcome::Converged {
            self.outcome = later.outcome;
        }
    }
}

/// When a convergence loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Repeat until no voxel is pending.
    UntilEmpty,
    /// Repeat while some voxel meets the threshold, or run a single pass
    /// when `repeat` is false.
    Graduated {
        /// Keep looping until no voxel qualifies.
        repeat: bool,
    },
}

/// Runs `sweep` until the termination rule, the observer or `limit` stops it.
///
/// The closure receives the zero-based sweep number and reports how many
/// voxels were eligible (`pending`) and how many it changed (`resolved`). A
/// sweep reporting `pending == 0` ends the loop as converged and is not
/// counted. A counted sweep that resolves nothing ends it as stalled.
/// Cancellation is checked before every sweep, never during one.
///
/// The returned `residual` is `pending - resolved` of the last counted sweep;
/// callers that can count leftovers directly should overwrite it.
///
/// # Errors
///
/// Propagates the first error returned by `sweep`.
pub fn drive<F>(
    termination: Termination,
    limit: usize,
    observer: &mut dyn SweepObserver,
    mut sweep: F,
) -> CleanupResult<ConvergenceReport>
where
    F: FnMut(usize) -> CleanupResult<SweepStats>,
{
    let mut report = ConvergenceReport::default();

    loop {
        if observer.is_cancelled() {
            report.outcome = Outcome::Cancelled;
            break;
        }
        if report.sweeps >= limit {
            report.outcome = Outcome::IterationLimit;
            break;
        }

        let stats = sweep(report.sweeps)?;
        if stats.pending == 0 {
            report.outcome = Outcome::Converged;
            report.residual = 0;
            break;
        }

        report.sweeps += 1;
        report.resolved += stats.resolved;
        report.residual = stats.pending.saturating_sub(stats.resolved);
        debug!(
            sweep = stats.sweep,
            pending = stats.pending,
            resolved = stats.resolved,
            "sweep complete"
        );
        observer.on_sweep(&stats);

        if stats.resolved == 0 {
            warn!(
                sweep = stats.sweep,
                pending = stats.pending,
                "sweep made no progress, stopping"
            );
            report.outcome = Outcome::Stalled;
            break;
        }

        match termination {
            Termination::UntilEmpty if report.residual == 0 => {
                report.outcome = Outcome::Converged;
                break;
            }
            Termination::Graduated { repeat: false } => {
                report.outcome = Outcome::Converged;
                break;
            }
            _ => {}
        }
    }

    Ok(report)
}

/// Fills every [`PENDING`] (negative) voxel from its neighbors until none is left.
///
/// Each sweep lets a pending voxel with at least one labeled (> 0) neighbor
/// take the majority neighbor's label and cell attributes, so enclosed regions
/// fill inward ring by ring. Voxels that can never be reached keep their
/// negative label; the report's `residual` counts them.
///
/// # Errors
///
/// Returns [`CleanupError::LengthMismatch`](crate::CleanupError::LengthMismatch)
/// if `labels` or `cells` do not cover the grid. Nothing is modified then.
///
/// # Example
///
/// ```
/// use hashbrown::HashSet;
/// use voxel_cleanup::{Outcome, PENDING, SweepConfig, resolve_pending};
/// use voxel_types::{AttributeMatrix, GridDims};
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let mut labels = vec![2, PENDING, PENDING, PENDING, 3];
/// let mut cells = AttributeMatrix::new(5);
///
/// let report = resolve_pending(
///     &grid,
///     &mut labels,
///     &mut cells,
///     &HashSet::new(),
///     &SweepConfig::serial(),
///     &mut (),
/// )
/// .unwrap();
///
/// assert_eq!(labels, vec![2, 2, 2, 3, 3]);
/// assert_eq!(report.sweeps, 2);
/// assert_eq!(report.outcome, Outcome::Converged);
/// ```
pub fn resolve_pending(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    ignored: &HashSet<String>,
    config: &SweepConfig,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<ConvergenceReport> {
    let voxels = grid.voxel_count();
    check_len("labels", labels.len(), voxels)?;
    check_len("cell attribute matrix", cells.num_tuples(), voxels)?;

    let parallel = config.use_parallel(voxels);
    let policy = Propagation::new(LabelUpdate::Donor, ignored);
    let mut tally = VoteTally::for_labels(labels);
    let mut map = NeighborMap::new(voxels);

    let mut report = drive(
        Termination::UntilEmpty,
        config.sweep_limit(voxels),
        observer,
        |sweep| {
            let pending = labels.iter().filter(|&&l| l < 0).count();
            if pending == 0 {
                return Ok(SweepStats {
                    sweep,
                    pending,
                    resolved: 0,
                });
            }
            sweep_votes(
                grid,
                labels,
                FaceMask::ALL,
                &mut tally,
                &mut map,
                &SentinelRule,
                parallel,
            );
            let resolved = propagate(labels, cells, &map, &policy)?;
            Ok(SweepStats {
                sweep,
                pending,
                resolved,
            })
        },
    )?;

    report.residual = labels.iter().filter(|&&l| l < 0).count();
    if report.residual > 0 {
        warn!(
            residual = report.residual,
            outcome = ?report.outcome,
            "pending voxels left unresolved"
        );
    }
    Ok(report)
}
