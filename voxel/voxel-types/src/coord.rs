//! Voxel coordinate types.

/// A discrete 3D coordinate in grid space.
///
/// Coordinates are unsigned: the grid origin is always voxel `(0, 0, 0)` and
/// linear indices run X fastest, then Y, then Z.
///
/// # Example
///
/// ```
/// use voxel_types::VoxelCoord;
///
/// let coord = VoxelCoord::new(1, 2, 3);
/// assert_eq!(coord.x, 1);
/// assert_eq!(coord.y, 2);
/// assert_eq!(coord.z, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCoord {
    /// X coordinate (column).
    pub x: usize,
    /// Y coordinate (row).
    pub y: usize,
    /// Z coordinate (plane).
    pub z: usize,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Creates a coordinate at the origin (0, 0, 0).
    ///
    /// # Example
    ///
    /// ```
    /// use voxel_types::VoxelCoord;
    ///
    /// assert_eq!(VoxelCoord::origin(), VoxelCoord::new(0, 0, 0));
    /// ```
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the coordinate as a tuple.
    #[must_use]
    pub const fn as_tuple(self) -> (usize, usize, usize) {
        (self.x, self.y, self.z)
    }

    /// Returns the coordinate as an array.
    #[must_use]
    pub const fn as_array(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Computes the Manhattan distance to another coordinate.
    ///
    /// Face-adjacent voxels are exactly one step apart.
    ///
    /// # Example
    ///
    /// ```
    /// use voxel_types::VoxelCoord;
    ///
    /// let a = VoxelCoord::new(0, 0, 0);
    /// let b = VoxelCoord::new(3, 4, 5);
    /// assert_eq!(a.manhattan_distance(b), 12);
    /// ```
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }
}

impl From<(usize, usize, usize)> for VoxelCoord {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[usize; 3]> for VoxelCoord {
    fn from([x, y, z]: [usize; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
