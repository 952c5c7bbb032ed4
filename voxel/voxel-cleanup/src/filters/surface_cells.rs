//! Surface-cell detection.

use voxel_types::GridDims;

use crate::error::{CleanupResult, check_len};

/// Flags the labeled voxels that lie on the sample surface.
///
/// A voxel is a surface voxel when its label is positive and it either sits
/// on the grid's exterior or has a face neighbour labeled 0. Flat axes of a
/// 2D slice do not count as exterior.
///
/// # Errors
///
/// Returns an error if `labels` does not cover the grid.
///
/// # Example
///
/// ```
/// use voxel_cleanup::find_surface_cells;
/// use voxel_types::GridDims;
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let surface = find_surface_cells(&grid, &[1, 1, 1, 0, 2]).unwrap();
/// assert_eq!(surface, vec![true, false, true, false, true]);
/// ```
pub fn find_surface_cells(grid: &GridDims, labels: &[i32]) -> CleanupResult<Vec<bool>> {
    check_len("labels", labels.len(), grid.voxel_count())?;

    Ok(grid
        .indices()
        .map(|i| {
            labels[i] > 0
                && (grid.is_exterior(i)
                    || grid
                        .face_neighbors(i)
                        .into_iter()
                        .flatten()
                        .any(|n| labels[n] == 0))
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_voxel_is_not_surface() {
        let grid = GridDims::new(3, 3, 3).unwrap();
        let labels = vec![1; 27];
        let surface = find_surface_cells(&grid, &labels).unwrap();
        assert!(!surface[13]);
        assert_eq!(surface.iter().filter(|&&s| s).count(), 26);
    }

    #[test]
    fn test_background_neighbor_makes_surface() {
        let grid = GridDims::new(3, 3, 3).unwrap();
        let mut labels = vec![1; 27];
        labels[4] = 0;
        let surface = find_surface_cells(&grid, &labels).unwrap();
        assert!(surface[13]);
        assert!(!surface[4]);
    }

    #[test]
    fn test_slice_uses_in_plane_edges() {
        let grid = GridDims::new(3, 3, 1).unwrap();
        let surface = find_surface_cells(&grid, &[2; 9]).unwrap();
        assert!(!surface[4]);
        assert!(surface[0]);
    }
}
