//! Face-connected component labeling.

use std::collections::VecDeque;

use tracing::debug;
use voxel_types::GridDims;

use crate::error::{CleanupResult, check_len};

/// A maximal face-connected set of member voxels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Member voxels in discovery order; the first entry is the seed.
    pub voxels: Vec<usize>,
    /// Whether any member lies on the grid boundary.
    ///
    /// Axes with a single layer do not count, see [`GridDims::is_exterior`].
    pub touches_boundary: bool,
}

impl Component {
    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Whether the component is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Partitions the member voxels into face-connected components.
///
/// Seeds are taken in scan order, so components are ordered by their lowest
/// voxel index. A voxel is marked visited when it is queued.
///
/// # Example
///
/// ```
/// use voxel_cleanup::find_components;
/// use voxel_types::GridDims;
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let labels = [0, 0, 3, 0, 3];
/// let components = find_components(&grid, |i| labels[i] == 0);
///
/// assert_eq!(components.len(), 2);
/// assert_eq!(components[0].voxels, vec![0, 1]);
/// assert_eq!(components[1].voxels, vec![3]);
/// ```
pub fn find_components<F>(grid: &GridDims, is_member: F) -> Vec<Component>
where
    F: Fn(usize) -> bool,
{
    let mut visited = vec![false; grid.voxel_count()];
    let mut queue = VecDeque::new();
    let mut components = Vec::new();

    for seed in grid.indices() {
        if visited[seed] || !is_member(seed) {
            continue;
        }

        let mut component = Component::default();
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            component.voxels.push(current);
            component.touches_boundary |= grid.is_exterior(current);

            for n in grid.face_neighbors(current).into_iter().flatten() {
                if !visited[n] && is_member(n) {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }

        components.push(component);
    }

    components
}

/// Index of the largest component; ties keep the earlier one.
#[must_use]
pub fn largest_component(components: &[Component]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, c) in components.iter().enumerate() {
        if best.is_none_or(|(_, size)| c.len() > size) {
            best = Some((i, c.len()));
        }
    }
    best.map(|(i, _)| i)
}

/// Sets every `false` component that does not reach the grid boundary to `true`.
///
/// Returns the number of voxels flipped.
///
/// # Errors
///
/// Returns an error if `mask` does not cover the grid.
pub fn fill_interior_holes(grid: &GridDims, mask: &mut [bool]) -> CleanupResult<usize> {
    check_len("mask", mask.len(), grid.voxel_count())?;

    let holes: Vec<Component> = find_components(grid, |i| !mask[i])
        .into_iter()
        .filter(|c| !c.touches_boundary)
        .collect();

    let mut flipped = 0;
    for hole in &holes {
        for &v in &hole.voxels {
            mask[v] = true;
        }
        flipped += hole.len();
    }
    debug!(holes = holes.len(), voxels = flipped, "filled interior holes");
    Ok(flipped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_components_partition_members() {
        let grid = GridDims::new(4, 4, 1).unwrap();
        let labels = [
            0, 0, 1, 0, //
            1, 0, 1, 0, //
            1, 1, 1, 0, //
            0, 1, 0, 0,
        ];
        let components = find_components(&grid, |i| labels[i] == 0);
        let mut all: Vec<usize> = components.iter().flat_map(|c| c.voxels.clone()).collect();
        all.sort_unstable();
        let expected: Vec<usize> = (0..16).filter(|&i| labels[i] == 0).collect();
        assert_eq!(all, expected);
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].voxels, vec![0, 1, 5]);
    }

    #[test]
    fn test_boundary_flag() {
        let grid = GridDims::new(3, 3, 3).unwrap();
        let components = find_components(&grid, |i| i == 13);
        assert_eq!(components.len(), 1);
        assert!(!components[0].touches_boundary);

        let corner = find_components(&grid, |i| i == 0);
        assert!(corner[0].touches_boundary);
    }

    #[test]
    fn test_largest_first_wins() {
        let a = Component {
            voxels: vec![0, 1],
            touches_boundary: true,
        };
        let b = Component {
            voxels: vec![5, 6],
            touches_boundary: true,
        };
        assert_eq!(largest_component(&[a, b]), Some(0));
        assert_eq!(largest_component(&[]), None);
    }

    #[test]
    fn test_fill_interior_holes_only() {
        let grid = GridDims::new(5, 5, 1).unwrap();
        let mut mask = vec![true; 25];
        mask[12] = false;
        mask[0] = false;
        let flipped = fill_interior_holes(&grid, &mut mask).unwrap();
        assert_eq!(flipped, 1);
        assert!(mask[12]);
        assert!(!mask[0]);
    }

    #[test]
    fn test_hole_touching_z_face_is_kept() {
        let grid = GridDims::new(3, 3, 3).unwrap();
        let mut mask = vec![true; 27];
        // Center column through all three layers reaches both Z faces.
        for i in [4, 13, 22] {
            mask[i] = false;
        }
        assert_eq!(fill_interior_holes(&grid, &mut mask).unwrap(), 0);

        mask[4] = true;
        mask[22] = true;
        assert_eq!(fill_interior_holes(&grid, &mut mask).unwrap(), 1);
        assert!(mask[13]);
    }

    #[test]
    fn test_mask_length_checked() {
        let grid = GridDims::new(2, 2, 1).unwrap();
        let mut mask = vec![true; 3];
        assert!(fill_interior_holes(&grid, &mut mask).is_err());
    }
}
