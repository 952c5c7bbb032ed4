//! Sweep configuration, progress reporting and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Settings shared by every multi-sweep operation.
///
/// # Example
///
/// ```
/// use voxel_cleanup::SweepConfig;
///
/// let config = SweepConfig::default()
///     .with_parallel(false)
///     .with_max_sweeps(Some(50));
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepConfig {
    /// Whether donor discovery may run on the rayon thread pool.
    ///
    /// Results are identical to the serial path.
    /// Default: `true`
    pub parallel: bool,

    /// Minimum voxel count before the parallel path is used.
    ///
    /// Default: `262_144` (a 64³ volume)
    pub parallel_threshold: usize,

    /// Upper bound on the number of sweeps.
    ///
    /// `None` bounds fixpoint loops by the voxel count, which a converging
    /// fill can never exceed.
    /// Default: `None`
    pub max_sweeps: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 262_144,
            max_sweeps: None,
        }
    }
}

impl SweepConfig {
    /// Serial execution, no sweep cap.
    #[must_use]
    pub fn serial() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Set whether donor discovery may run in parallel.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the voxel count above which the parallel path is used.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the sweep cap.
    #[must_use]
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Whether a grid of `voxel_count` voxels takes the parallel path.
    #[must_use]
    pub fn use_parallel(&self, voxel_count: usize) -> bool {
        self.parallel && voxel_count >= self.parallel_threshold
    }

    /// The effective sweep cap for a grid of `voxel_count` voxels.
    #[must_use]
    pub fn sweep_limit(&self, voxel_count: usize) -> usize {
        self.max_sweeps.unwrap_or(voxel_count.max(1))
    }
}

/// Counters for one completed sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepStats {
    /// Zero-based sweep number.
    pub sweep: usize,
    /// Voxels eligible for change at the start of the sweep.
    pub pending: usize,
    /// Voxels actually changed by the sweep.
    pub resolved: usize,
}

/// Receives progress and answers cancellation queries between sweeps.
///
/// Both methods are called only at sweep boundaries, never mid-sweep. The
/// unit type is a no-op observer.
pub trait SweepObserver {
    /// Called after every sweep that had pending voxels.
    fn on_sweep(&mut self, _stats: &SweepStats) {}

    /// Whether the caller asked to stop. Checked before each sweep.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl SweepObserver for () {}

/// A shareable cancellation switch.
///
/// Clones share the same flag, so one clone can be handed to the running
/// operation while another is cancelled from a different thread.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{CancelFlag, SweepObserver};
///
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
/// assert!(!flag.is_cancelled());
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl SweepObserver for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Records every sweep; handy for tests and progress bars.
#[derive(Debug, Clone, Default)]
pub struct SweepLog {
    /// Stats of each sweep in order.
    pub sweeps: Vec<SweepStats>,
}

impl SweepObserver for SweepLog {
    fn on_sweep(&mut self, stats: &SweepStats) {
        self.sweeps.push(*stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert!(config.parallel);
        assert_eq!(config.max_sweeps, None);
        assert!(!config.use_parallel(1000));
        assert!(config.use_parallel(1 << 20));
    }

    #[test]
    fn test_serial_never_parallel() {
        assert!(!SweepConfig::serial().use_parallel(usize::MAX));
    }

    #[test]
    fn test_sweep_limit() {
        let config = SweepConfig::default();
        assert_eq!(config.sweep_limit(27), 27);
        assert_eq!(config.sweep_limit(0), 1);
        assert_eq!(config.with_max_sweeps(Some(3)).sweep_limit(27), 3);
    }

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_sweep_log_records() {
        let mut log = SweepLog::default();
        log.on_sweep(&SweepStats {
            sweep: 0,
            pending: 4,
            resolved: 3,
        });
        assert_eq!(log.sweeps.len(), 1);
        assert!(!log.is_cancelled());
    }
}
