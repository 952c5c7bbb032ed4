//! Per-feature bookkeeping and feature removal.
//!
//! Removing features follows one path for every criterion: pick the inactive
//! rows, mark their voxels [`PENDING`], let surviving neighbours grow into them
//! and finally compact the feature table so ids stay dense.

use hashbrown::HashSet;
use tracing::{debug, info};
use voxel_types::{AttributeMatrix, GridDims};

use crate::converge::{ConvergenceReport, PENDING, resolve_pending};
use crate::error::{CleanupError, CleanupResult, check_len};
use crate::sweep::{SweepConfig, SweepObserver};

/// Counts the voxels of every feature id in `0..num_features`.
///
/// Negative labels are skipped.
///
/// # Errors
///
/// Returns [`CleanupError::FeatureOutOfRange`] if a label is `>= num_features`.
///
/// # Example
///
/// ```
/// use voxel_cleanup::feature_sizes;
///
/// let sizes = feature_sizes(&[0, 1, 1, 2, -1], 3).unwrap();
/// assert_eq!(sizes, vec![1, 2, 1]);
/// ```
pub fn feature_sizes(labels: &[i32], num_features: usize) -> CleanupResult<Vec<usize>> {
    let mut sizes = vec![0usize; num_features];
    for &label in labels {
        let Ok(id) = usize::try_from(label) else {
            continue;
        };
        let slot = sizes.get_mut(id).ok_or(CleanupError::FeatureOutOfRange {
            id: label,
            num_features,
        })?;
        *slot += 1;
    }
    Ok(sizes)
}

/// Counts, for each feature, the distinct other features it shares a face with.
///
/// Background (0) and negative labels are neither counted nor counted for.
///
/// # Errors
///
/// Returns an error if `labels` does not cover the grid or a label is
/// `>= num_features`.
pub fn find_num_neighbors(
    grid: &GridDims,
    labels: &[i32],
    num_features: usize,
) -> CleanupResult<Vec<usize>> {
    check_len("labels", labels.len(), grid.voxel_count())?;
    check_labels(labels, num_features)?;

    let mut contacts: Vec<HashSet<i32>> = vec![HashSet::new(); num_features];
    for (i, &label) in labels.iter().enumerate() {
        let Ok(id) = usize::try_from(label) else {
            continue;
        };
        if id == 0 {
            continue;
        }
        for n in grid.face_neighbors(i).into_iter().flatten() {
            let other = labels[n];
            if other > 0 && other != label {
                contacts[id].insert(other);
            }
        }
    }
    Ok(contacts.iter().map(HashSet::len).collect())
}

/// Rejects labels without a row in a table of `num_features` rows.
pub(crate) fn check_labels(labels: &[i32], num_features: usize) -> CleanupResult<()> {
    match labels
        .iter()
        .find(|&&l| usize::try_from(l).is_ok_and(|id| id >= num_features))
    {
        Some(&id) => Err(CleanupError::FeatureOutOfRange { id, num_features }),
        None => Ok(()),
    }
}

/// Rewrites every voxel of an inactive feature to `marker`.
///
/// Returns the number of voxels rewritten. Background and negative labels
/// are never touched.
pub fn mark_inactive_voxels(labels: &mut [i32], active: &[bool], marker: i32) -> usize {
    let mut marked = 0;
    for label in labels.iter_mut() {
        let Ok(id) = usize::try_from(*label) else {
            continue;
        };
        if id > 0 && !active.get(id).copied().unwrap_or(true) {
            *label = marker;
            marked += 1;
        }
    }
    marked
}

/// What a feature-removal pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemovalReport {
    /// Activity of every original feature row; row 0 is always active.
    pub active: Vec<bool>,
    /// Features deleted from the table.
    pub removed_features: usize,
    /// Feature rows left, including row 0.
    pub remaining_features: usize,
    /// Voxels that belonged to removed features.
    pub released_voxels: usize,
    /// Convergence of the fill, when one ran.
    pub fill: Option<ConvergenceReport>,
}

impl RemovalReport {
    /// Voxels still pending after the fill.
    #[must_use]
    pub fn residual(&self) -> usize {
        self.fill.map_or(0, |f| f.residual)
    }
}

/// Shared inputs of [`remove_features`].
#[derive(Debug, Clone, Copy)]
pub struct RemovalOptions<'a> {
    /// Grow surviving features into the released voxels.
    pub fill: bool,
    /// Cell arrays that are never copied during the fill.
    pub ignored: &'a HashSet<String>,
    /// Sweep settings for the fill.
    pub config: &'a SweepConfig,
}

/// Removes every feature whose `active` flag is false.
///
/// With `fill`, the released voxels become [`PENDING`] and are grown over by
/// their surviving neighbours before the table is compacted; voxels the fill
/// cannot reach stay negative. Without it they become background. The
/// feature table is then compacted and voxel labels renumbered to `1..=N`.
///
/// # Errors
///
/// Returns [`CleanupError::AllFeaturesRemoved`] if no feature besides row 0
/// would survive, and a length or range error for mismatched inputs. In every
/// error case no array has been modified.
pub fn remove_features(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    features: &mut AttributeMatrix,
    active: &[bool],
    options: &RemovalOptions<'_>,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<RemovalReport> {
    let num_features = features.num_tuples();
    check_len("labels", labels.len(), grid.voxel_count())?;
    check_len("cell attribute matrix", cells.num_tuples(), grid.voxel_count())?;
    check_len("active features", active.len(), num_features)?;
    check_labels(labels, num_features)?;

    let mut active = active.to_vec();
    if let Some(first) = active.first_mut() {
        *first = true;
    }
    let candidates = num_features.saturating_sub(1);
    let survivors = active.iter().skip(1).filter(|&&a| a).count();
    if candidates > 0 && survivors == 0 {
        return Err(CleanupError::AllFeaturesRemoved {
            num_features: candidates,
        });
    }

    let removed_features = candidates - survivors;
    if removed_features == 0 {
        debug!(num_features, "no features to remove");
        return Ok(RemovalReport {
            active,
            remaining_features: num_features,
            ..Default::default()
        });
    }

    let marker = if options.fill { PENDING } else { 0 };
    let released_voxels = mark_inactive_voxels(labels, &active, marker);

    let fill = if options.fill {
        Some(resolve_pending(
            grid,
            labels,
            cells,
            options.ignored,
            options.config,
            observer,
        )?)
    } else {
        None
    };

    features.remove_inactive_objects(&active, labels)?;

    info!(
        removed_features,
        remaining = features.num_tuples(),
        released_voxels,
        "removed features"
    );

    Ok(RemovalReport {
        active,
        removed_features,
        remaining_features: features.num_tuples(),
        released_voxels,
        fill,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::converge::Outcome;
    use voxel_types::DataArray;

    fn feature_table(rows: usize) -> AttributeMatrix {
        let mut m = AttributeMatrix::new(rows);
        let ids: Vec<i32> = (0..rows as i32).collect();
        m.insert(DataArray::from_vec("OriginalId", 1, ids).unwrap())
            .unwrap();
        m
    }

    #[test]
    fn test_feature_sizes_out_of_range() {
        let err = feature_sizes(&[0, 3], 3).unwrap_err();
        assert_eq!(
            err,
            CleanupError::FeatureOutOfRange {
                id: 3,
                num_features: 3
            }
        );
    }

    #[test]
    fn test_find_num_neighbors() {
        let grid = GridDims::new(4, 1, 1).unwrap();
        let labels = [1, 2, 3, 0];
        let counts = find_num_neighbors(&grid, &labels, 4).unwrap();
        assert_eq!(counts, vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_mark_inactive_voxels() {
        let mut labels = vec![0, 1, 2, -1, 2];
        let marked = mark_inactive_voxels(&mut labels, &[true, true, false], PENDING);
        assert_eq!(marked, 2);
        assert_eq!(labels, vec![0, 1, PENDING, -1, PENDING]);
    }

    #[test]
    fn test_remove_with_fill() {
        let grid = GridDims::new(4, 1, 1).unwrap();
        let mut labels = vec![1, 2, 3, 3];
        let mut cells = AttributeMatrix::new(4);
        let mut features = feature_table(4);
        let ignored = HashSet::new();
        let config = SweepConfig::serial();
        let options = RemovalOptions {
            fill: true,
            ignored: &ignored,
            config: &config,
        };

        let report = remove_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &[true, true, false, true],
            &options,
            &mut (),
        )
        .unwrap();

        // Voxel 1 ties between feature 1 (NegX) and 3 (PosX); NegX wins,
        // then ids are compacted (3 -> 2).
        assert_eq!(labels, vec![1, 1, 2, 2]);
        assert_eq!(report.removed_features, 1);
        assert_eq!(report.remaining_features, 3);
        assert_eq!(report.released_voxels, 1);
        assert_eq!(report.fill.unwrap().outcome, Outcome::Converged);
        assert_eq!(
            features.get::<i32>("OriginalId").unwrap().as_slice(),
            &[0, 1, 3]
        );
    }

    #[test]
    fn test_remove_without_fill() {
        let grid = GridDims::new(3, 1, 1).unwrap();
        let mut labels = vec![1, 2, 2];
        let mut cells = AttributeMatrix::new(3);
        let mut features = feature_table(3);
        let ignored = HashSet::new();
        let config = SweepConfig::serial();
        let options = RemovalOptions {
            fill: false,
            ignored: &ignored,
            config: &config,
        };

        let report = remove_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &[true, true, false],
            &options,
            &mut (),
        )
        .unwrap();

        assert_eq!(labels, vec![1, 0, 0]);
        assert!(report.fill.is_none());
        assert_eq!(report.residual(), 0);
    }

    #[test]
    fn test_all_removed_is_error_without_mutation() {
        let grid = GridDims::new(2, 1, 1).unwrap();
        let mut labels = vec![1, 2];
        let mut cells = AttributeMatrix::new(2);
        let mut features = feature_table(3);
        let ignored = HashSet::new();
        let config = SweepConfig::serial();
        let options = RemovalOptions {
            fill: true,
            ignored: &ignored,
            config: &config,
        };

        let err = remove_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &[true, false, false],
            &options,
            &mut (),
        )
        .unwrap_err();

        assert_eq!(err, CleanupError::AllFeaturesRemoved { num_features: 2 });
        assert_eq!(labels, vec![1, 2]);
        assert_eq!(features.num_tuples(), 3);
    }
}
