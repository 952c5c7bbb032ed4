//! Filling small background regions from neighboring features.
//!
//! Regions at or below the size limit are marked pending and filled by the
//! shared fixpoint loop; larger ones stay background, optionally as a new phase.

use hashbrown::HashSet;
use tracing::info;
use voxel_types::{AttributeMatrix, GridDims};

use super::{check_cells, phase_ids};
use crate::components::find_components;
use crate::converge::{ConvergenceReport, PENDING, resolve_pending};
use crate::error::{CleanupResult, invalid};
use crate::sweep::{SweepConfig, SweepObserver};

/// Parameters for [`fill_bad_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillBadDataParams {
    /// Largest unlabeled region that is filled from its neighbours.
    ///
    /// Regions with more voxels are left as background.
    /// Default: `1000`
    pub min_defect_size: usize,

    /// Give every region that is too large to fill a fresh phase id.
    ///
    /// The new id is one past the largest value in the phases array.
    /// Default: `false`
    pub store_as_new_phase: bool,

    /// Cell array holding per-voxel phase ids.
    ///
    /// Only read when `store_as_new_phase` is set.
    /// Default: `"Phases"`
    pub phases_array: String,

    /// Cell arrays that are not copied into filled voxels.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings for the fill.
    pub sweep: SweepConfig,
}

impl Default for FillBadDataParams {
    fn default() -> Self {
        Self {
            min_defect_size: 1000,
            store_as_new_phase: false,
            phases_array: "Phases".to_string(),
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl FillBadDataParams {
    /// Set the largest region size that is filled.
    #[must_use]
    pub fn with_min_defect_size(mut self, size: usize) -> Self {
        self.min_defect_size = size;
        self
    }

    /// Set whether large regions get a new phase id.
    #[must_use]
    pub fn with_store_as_new_phase(mut self, store: bool) -> Self {
        self.store_as_new_phase = store;
        self
    }

    /// Set the name of the cell phases array.
    #[must_use]
    pub fn with_phases_array(mut self, name: impl Into<String>) -> Self {
        self.phases_array = name.into();
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
    /// if a new phase is requested without a phases array name.
    pub fn validate(&self) -> CleanupResult<()> {
        if self.store_as_new_phase && self.phases_array.is_empty() {
            return Err(invalid("phases_array", "required with store_as_new_phase"));
        }
        Ok(())
    }
}

/// What [`fill_bad_data`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillBadDataReport {
    /// Unlabeled regions small enough to fill.
    pub small_regions: usize,
    /// Unlabeled regions left in place.
    pub large_regions: usize,
    /// Voxels marked for filling.
    pub pending_voxels: usize,
    /// Phase id written into the large regions, if any.
    pub new_phase: Option<i32>,
    /// The fill loop.
    pub convergence: ConvergenceReport,
}

/// Fills small unlabeled (0) regions from the surrounding features.
///
/// Every face-connected region of label 0 with at most `min_defect_size`
/// voxels is grown over by its labeled neighbours, copying their label and all
/// cell arrays except the ignored ones. Larger regions stay background; with
/// `store_as_new_phase` their phase becomes a new id. Voxels the fill cannot
/// reach keep [`PENDING`](crate::PENDING).
///
/// # Errors
///
/// Returns an error for invalid parameters, mismatched lengths, a missing,
/// non-`i32` or multi-component phases array, or a phases array whose largest
/// id has no successor. No array is modified in those cases.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{FillBadDataParams, fill_bad_data};
/// use voxel_types::{AttributeMatrix, GridDims};
///
/// let grid = GridDims::new(5, 5, 1).unwrap();
/// let mut labels = vec![1; 25];
/// labels[12] = 0;
/// let mut cells = AttributeMatrix::new(25);
///
/// let params = FillBadDataParams::default().with_min_defect_size(1);
/// let report = fill_bad_data(&grid, &mut labels, &mut cells, &params, &mut ()).unwrap();
///
/// assert_eq!(labels[12], 1);
/// assert_eq!(report.convergence.sweeps, 1);
/// ```
pub fn fill_bad_data(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    params: &FillBadDataParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<FillBadDataReport> {
    params.validate()?;
    check_cells(grid.voxel_count(), labels, cells)?;

    let new_phase = if params.store_as_new_phase {
        let phases = phase_ids(cells, &params.phases_array, "phases_array")?;
        let max = phases.iter().copied().max().unwrap_or(0);
        let next = max.checked_add(1).ok_or_else(|| {
            invalid(
                "phases_array",
                format!("`{}` already holds phase {max}", params.phases_array),
            )
        })?;
        Some(next)
    } else {
        None
    };

    let regions = find_components(grid, |i| labels[i] == 0);
    let mut report = FillBadDataReport {
        new_phase,
        ..Default::default()
    };

    for region in &regions {
        if region.len() <= params.min_defect_size {
            report.small_regions += 1;
            report.pending_voxels += region.len();
            for &v in &region.voxels {
                labels[v] = PENDING;
            }
        } else {
            report.large_regions += 1;
            if let Some(phase) = new_phase {
                let phases = cells.get_mut::<i32>(&params.phases_array)?;
                let data = phases.as_mut_slice();
                for &v in &region.voxels {
                    data[v] = phase;
                }
            }
        }
    }
    if report.large_regions == 0 {
        report.new_phase = None;
    }

    report.convergence = resolve_pending(
        grid,
        labels,
        cells,
        &params.ignored_arrays,
        &params.sweep,
        observer,
    )?;

    info!(
        small_regions = report.small_regions,
        large_regions = report.large_regions,
        filled = report.convergence.resolved,
        residual = report.convergence.residual,
        "fill bad data complete"
    );
    Ok(report)
}
