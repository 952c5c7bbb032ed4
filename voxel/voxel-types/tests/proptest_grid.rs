//! Property-based tests for grid topology and attribute arrays.
//!
//! Run with: cargo test -p voxel-types -- proptest

use proptest::prelude::*;
use voxel_types::{AttributeArray, DataArray, Face, GridDims};

/// Generate a grid together with one of its voxel indices.
fn arb_grid_and_index() -> impl Strategy<Value = (GridDims, usize)> {
    (1usize..9, 1usize..9, 1usize..9).prop_flat_map(|(x, y, z)| {
        let grid = GridDims::new(x, y, z).unwrap_or_else(|e| panic!("valid dims: {e}"));
        (Just(grid), 0..grid.voxel_count())
    })
}

proptest! {
    /// Valid neighbours are in range and exactly one unit step away.
    #[test]
    fn neighbors_are_face_adjacent((grid, index) in arb_grid_and_index()) {
        let c = grid.coord_of(index);
        for face in Face::ALL {
            let (dx, dy, dz) = face.step();
            let target = (
                c.x as i64 + i64::from(dx),
                c.y as i64 + i64::from(dy),
                c.z as i64 + i64::from(dz),
            );
            let inside = target.0 >= 0
                && target.1 >= 0
                && target.2 >= 0
                && target.0 < grid.x() as i64
                && target.1 < grid.y() as i64
                && target.2 < grid.z() as i64;

            match grid.neighbor(index, face) {
                Some(n) => {
                    prop_assert!(inside);
                    prop_assert!(n < grid.voxel_count());
                    let nc = grid.coord_of(n);
                    prop_assert_eq!(
                        (nc.x as i64, nc.y as i64, nc.z as i64),
                        target
                    );
                    let offset = grid.linear_offsets()[face.index()];
                    prop_assert_eq!(n as isize - index as isize, offset);
                }
                None => prop_assert!(!inside),
            }
        }
    }

    /// Neighbour relation is symmetric through the opposite face.
    #[test]
    fn neighbors_are_symmetric((grid, index) in arb_grid_and_index()) {
        for (face, n) in grid.neighbors(index) {
            prop_assert_eq!(grid.neighbor(n, face.opposite()), Some(index));
        }
    }

    /// Index and coordinate conversions invert each other.
    #[test]
    fn coord_round_trip((grid, index) in arb_grid_and_index()) {
        let coord = grid.coord_of(index);
        prop_assert_eq!(grid.index_of(coord), Some(index));
    }

    /// A batch copy reads every source before any write.
    #[test]
    fn batch_copy_uses_snapshot(
        values in prop::collection::vec(any::<i16>(), 2..40),
        seed in any::<u64>(),
    ) {
        let n = values.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .map(|i| (((seed as usize).wrapping_add(i * 7)) % n, i))
            .collect();
        let mut array = DataArray::from_vec("Values", 1, values.clone())
            .unwrap_or_else(|e| panic!("valid array: {e}"));
        array.copy_tuples(&pairs).unwrap_or_else(|e| panic!("in range: {e}"));

        for &(src, dst) in &pairs {
            prop_assert_eq!(array.as_slice()[dst], values[src]);
        }
    }
}
