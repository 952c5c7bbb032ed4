//! Keeping the largest foreground component as the sample.

use tracing::info;
use voxel_types::GridDims;

use crate::components::{fill_interior_holes, find_components, largest_component};
use crate::error::{CleanupResult, check_len};

/// Parameters for [`identify_sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentifySampleParams {
    /// Mark enclosed bad regions as good after selecting the sample.
    ///
    /// Default: `true`
    pub fill_holes: bool,
}

impl Default for IdentifySampleParams {
    fn default() -> Self {
        Self { fill_holes: true }
    }
}

impl IdentifySampleParams {
    /// Set whether interior holes are filled.
    #[must_use]
    pub fn with_fill_holes(mut self, fill: bool) -> Self {
        self.fill_holes = fill;
        self
    }
}

/// What [`identify_sample`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentifySampleReport {
    /// Good components found.
    pub components: usize,
    /// Voxels in the retained sample before hole filling.
    pub sample_voxels: usize,
    /// Good voxels outside the sample that became bad.
    pub removed_voxels: usize,
    /// Bad voxels inside the sample that became good.
    pub filled_voxels: usize,
}

/// Keeps the largest connected good region of `mask` as the sample.
///
/// Every other good voxel becomes bad; ties go to the region found first in
/// scan order. With `fill_holes`, bad regions that do not reach the grid's
/// exterior are then marked good.
///
/// # Errors
///
/// Returns an error if `mask` does not cover the grid.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{IdentifySampleParams, identify_sample};
/// use voxel_types::GridDims;
///
/// let grid = GridDims::new(4, 3, 1).unwrap();
/// let mut mask = vec![false; 12];
/// for i in [0, 1, 2, 10] {
///     mask[i] = true;
/// }
///
/// let report = identify_sample(&grid, &mut mask, &IdentifySampleParams::default()).unwrap();
/// assert_eq!(report.components, 2);
/// assert!(mask[0] && mask[1] && mask[2]);
/// assert!(!mask[10]);
/// ```
pub fn identify_sample(
    grid: &GridDims,
    mask: &mut [bool],
    params: &IdentifySampleParams,
) -> CleanupResult<IdentifySampleReport> {
    check_len("mask", mask.len(), grid.voxel_count())?;

    let components = find_components(grid, |i| mask[i]);
    let mut report = IdentifySampleReport {
        components: components.len(),
        ..Default::default()
    };

    if let Some(keep) = largest_component(&components) {
        report.sample_voxels = components[keep].len();
        for (i, component) in components.iter().enumerate() {
            if i == keep {
                continue;
            }
            for &v in &component.voxels {
                mask[v] = false;
            }
            report.removed_voxels += component.len();
        }
    }

    if params.fill_holes {
        report.filled_voxels = fill_interior_holes(grid, mask)?;
    }

    info!(
        components = report.components,
        sample = report.sample_voxels,
        removed = report.removed_voxels,
        filled = report.filled_voxels,
        "sample identified"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_keeps_first_component() {
        let grid = GridDims::new(5, 1, 1).unwrap();
        let mut mask = vec![true, true, false, true, true];
        let report = identify_sample(&grid, &mut mask, &IdentifySampleParams::default()).unwrap();
        assert_eq!(mask, vec![true, true, false, false, false]);
        assert_eq!(report.removed_voxels, 2);
        assert_eq!(report.filled_voxels, 0);
    }

    #[test]
    fn test_hole_filled_after_selection() {
        let grid = GridDims::new(5, 5, 1).unwrap();
        let mut mask = vec![true; 25];
        mask[12] = false;
        mask[0] = false;
        let report = identify_sample(&grid, &mut mask, &IdentifySampleParams::default()).unwrap();
        assert!(mask[12]);
        assert!(!mask[0]);
        assert_eq!(report.filled_voxels, 1);
    }

    #[test]
    fn test_without_hole_filling() {
        let grid = GridDims::new(5, 5, 1).unwrap();
        let mut mask = vec![true; 25];
        mask[12] = false;
        let params = IdentifySampleParams::default().with_fill_holes(false);
        identify_sample(&grid, &mut mask, &params).unwrap();
        assert!(!mask[12]);
    }

    #[test]
    fn test_all_bad_mask() {
        let grid = GridDims::new(2, 2, 2).unwrap();
        let mut mask = vec![false; 8];
        let report = identify_sample(&grid, &mut mask, &IdentifySampleParams::default()).unwrap();
        assert_eq!(report.components, 0);
        assert!(mask.iter().all(|&m| !m));
    }
}
