//! Regular grid topology: dimensions, index mapping and face neighbors.

use crate::coord::VoxelCoord;
use crate::error::{GridError, GridResult};

/// One of the six faces of a voxel.
///
/// The declaration order is the canonical neighbor scan order used by every
/// traversal in this workspace: `-Z, -Y, -X, +X, +Y, +Z`. Tie-breaking rules
/// that depend on "the first neighbor found" follow this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Face {
    /// Previous plane (`z - 1`).
    NegZ,
    /// Previous row (`y - 1`).
    NegY,
    /// Previous column (`x - 1`).
    NegX,
    /// Next column (`x + 1`).
    PosX,
    /// Next row (`y + 1`).
    PosY,
    /// Next plane (`z + 1`).
    PosZ,
}

impl Face {
    /// All faces in canonical scan order.
    pub const ALL: [Self; 6] = [
        Self::NegZ,
        Self::NegY,
        Self::NegX,
        Self::PosX,
        Self::PosY,
        Self::PosZ,
    ];

    /// Position of this face in the canonical order (0..6).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The axis this face is perpendicular to.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::NegX | Self::PosX => Axis::X,
            Self::NegY | Self::PosY => Axis::Y,
            Self::NegZ | Self::PosZ => Axis::Z,
        }
    }

    /// The face on the other side of the voxel.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::NegZ => Self::PosZ,
            Self::NegY => Self::PosY,
            Self::NegX => Self::PosX,
            Self::PosX => Self::NegX,
            Self::PosY => Self::NegY,
            Self::PosZ => Self::NegZ,
        }
    }

    /// Unit step `(dx, dy, dz)` across this face.
    #[must_use]
    pub const fn step(self) -> (i8, i8, i8) {
        match self {
            Self::NegZ => (0, 0, -1),
            Self::NegY => (0, -1, 0),
            Self::NegX => (-1, 0, 0),
            Self::PosX => (1, 0, 0),
            Self::PosY => (0, 1, 0),
            Self::PosZ => (0, 0, 1),
        }
    }
}

/// A grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Columns.
    X,
    /// Rows.
    Y,
    /// Planes.
    Z,
}

/// Per-axis switch restricting which faces take part in a traversal.
///
/// # Example
///
/// ```
/// use voxel_types::{Face, FaceMask};
///
/// let in_plane = FaceMask::new(true, true, false);
/// assert!(in_plane.allows(Face::PosX));
/// assert!(!in_plane.allows(Face::NegZ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceMask {
    /// Include the `-X`/`+X` faces.
    pub x: bool,
    /// Include the `-Y`/`+Y` faces.
    pub y: bool,
    /// Include the `-Z`/`+Z` faces.
    pub z: bool,
}

impl FaceMask {
    /// Every face enabled.
    pub const ALL: Self = Self::new(true, true, true);

    /// Creates a mask from per-axis switches.
    #[must_use]
    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Whether `face` is enabled.
    #[must_use]
    pub const fn allows(self, face: Face) -> bool {
        match face.axis() {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Whether every axis is disabled.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !(self.x || self.y || self.z)
    }

    /// Drops the neighbors of disabled faces.
    #[must_use]
    pub fn apply(self, neighbors: [Option<usize>; 6]) -> [Option<usize>; 6] {
        let mut out = neighbors;
        for face in Face::ALL {
            if !self.allows(face) {
                out[face.index()] = None;
            }
        }
        out
    }
}

impl Default for FaceMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Dimensions of a regular voxel grid.
///
/// Voxels are addressed by a linear index `z * dx * dy + y * dx + x`. The
/// dimensions are validated once at construction and are immutable afterwards,
/// so every index-mapping method is a cheap pure function.
///
/// # Example
///
/// ```
/// use voxel_types::{GridDims, VoxelCoord};
///
/// let grid = GridDims::new(4, 3, 2).unwrap();
/// assert_eq!(grid.voxel_count(), 24);
///
/// let index = grid.index_of(VoxelCoord::new(1, 2, 1)).unwrap();
/// assert_eq!(index, 12 + 8 + 1);
/// assert_eq!(grid.coord_of(index), VoxelCoord::new(1, 2, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDims", into = "RawDims"))]
pub struct GridDims {
    x: usize,
    y: usize,
    z: usize,
}

/// Unvalidated wire form of [`GridDims`]; deserialization goes through [`GridDims::new`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawDims {
    x: usize,
    y: usize,
    z: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDims> for GridDims {
    type Error = GridError;

    fn try_from(raw: RawDims) -> GridResult<Self> {
        Self::new(raw.x, raw.y, raw.z)
    }
}

#[cfg(feature = "serde")]
impl From<GridDims> for RawDims {
    fn from(dims: GridDims) -> Self {
        Self {
            x: dims.x,
            y: dims.y,
            z: dims.z,
        }
    }
}

impl GridDims {
    /// Creates grid dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if any extent is zero and
    /// [`GridError::IntegerOverflow`] if the voxel count does not fit in `usize`.
    pub fn new(x: usize, y: usize, z: usize) -> GridResult<Self> {
        if x == 0 || y == 0 || z == 0 {
            return Err(GridError::InvalidDimensions { x, y, z });
        }
        x.checked_mul(y)
            .and_then(|xy| xy.checked_mul(z))
            .ok_or(GridError::IntegerOverflow { x, y, z })?;
        Ok(Self { x, y, z })
    }

    /// Creates grid dimensions from signed extents, as stored by most image headers.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if any extent is zero or negative.
    pub fn from_signed(x: i64, y: i64, z: i64) -> GridResult<Self> {
        let convert = |v: i64| usize::try_from(v).unwrap_or(0);
        let (ux, uy, uz) = (convert(x), convert(y), convert(z));
        if ux == 0 || uy == 0 || uz == 0 {
            return Err(GridError::InvalidDimensions {
                x: ux,
                y: uy,
                z: uz,
            });
        }
        Self::new(ux, uy, uz)
    }

    /// Extent along X.
    #[must_use]
    pub const fn x(&self) -> usize {
        self.x
    }

    /// Extent along Y.
    #[must_use]
    pub const fn y(&self) -> usize {
        self.y
    }

    /// Extent along Z.
    #[must_use]
    pub const fn z(&self) -> usize {
        self.z
    }

    /// Extents as `(x, y, z)`.
    #[must_use]
    pub const fn extents(&self) -> (usize, usize, usize) {
        (self.x, self.y, self.z)
    }

    /// Total number of voxels.
    #[must_use]
    pub const fn voxel_count(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Number of voxels in one Z plane.
    #[must_use]
    pub const fn plane_stride(&self) -> usize {
        self.x * self.y
    }

    /// Linear index of a coordinate, or `None` if it lies outside the grid.
    #[must_use]
    pub const fn index_of(&self, coord: VoxelCoord) -> Option<usize> {
        if coord.x < self.x && coord.y < self.y && coord.z < self.z {
            Some(coord.z * self.plane_stride() + coord.y * self.x + coord.x)
        } else {
            None
        }
    }

    /// Coordinate of a linear index.
    ///
    /// The index is not range-checked; use [`contains_index`](Self::contains_index)
    /// first for untrusted input.
    #[must_use]
    pub const fn coord_of(&self, index: usize) -> VoxelCoord {
        VoxelCoord::new(
            index % self.x,
            (index / self.x) % self.y,
            index / self.plane_stride(),
        )
    }

    /// Whether a linear index addresses a voxel of this grid.
    #[must_use]
    pub const fn contains_index(&self, index: usize) -> bool {
        index < self.voxel_count()
    }

    /// Signed linear offsets of the six faces in canonical order.
    ///
    /// The offsets ignore boundaries; [`face_neighbors`](Self::face_neighbors)
    /// applies the boundary masking.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn linear_offsets(&self) -> [isize; 6] {
        let dx = self.x as isize;
        let dxy = self.plane_stride() as isize;
        [-dxy, -dx, -1, 1, dx, dxy]
    }

    /// Linear index of the neighbor across `face`, or `None` at the grid boundary.
    #[must_use]
    pub const fn neighbor(&self, index: usize, face: Face) -> Option<usize> {
        let c = self.coord_of(index);
        match face {
            Face::NegZ if c.z > 0 => Some(index - self.plane_stride()),
            Face::NegY if c.y > 0 => Some(index - self.x),
            Face::NegX if c.x > 0 => Some(index - 1),
            Face::PosX if c.x + 1 < self.x => Some(index + 1),
            Face::PosY if c.y + 1 < self.y => Some(index + self.x),
            Face::PosZ if c.z + 1 < self.z => Some(index + self.plane_stride()),
            _ => None,
        }
    }

    /// The six face neighbors of a voxel in canonical order.
    ///
    /// Entries are `None` where the neighbor would cross the grid boundary.
    ///
    /// # Example
    ///
    /// ```
    /// use voxel_types::{Face, GridDims};
    ///
    /// let grid = GridDims::new(3, 3, 1).unwrap();
    /// let neighbors = grid.face_neighbors(0);
    /// assert_eq!(neighbors[Face::NegX.index()], None);
    /// assert_eq!(neighbors[Face::PosX.index()], Some(1));
    /// assert_eq!(neighbors[Face::PosY.index()], Some(3));
    /// assert_eq!(neighbors[Face::PosZ.index()], None);
    /// ```
    #[must_use]
    pub const fn face_neighbors(&self, index: usize) -> [Option<usize>; 6] {
        let c = self.coord_of(index);
        let stride = self.plane_stride();
        [
            if c.z > 0 { Some(index - stride) } else { None },
            if c.y > 0 { Some(index - self.x) } else { None },
            if c.x > 0 { Some(index - 1) } else { None },
            if c.x + 1 < self.x { Some(index + 1) } else { None },
            if c.y + 1 < self.y { Some(index + self.x) } else { None },
            if c.z + 1 < self.z { Some(index + stride) } else { None },
        ]
    }

    /// Iterates over the valid face neighbors of a voxel with their face.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = (Face, usize)> {
        let neighbors = self.face_neighbors(index);
        Face::ALL
            .into_iter()
            .filter_map(move |face| neighbors[face.index()].map(|n| (face, n)))
    }

    /// Whether a voxel touches one of the six outer faces of the grid.
    #[must_use]
    pub const fn is_boundary(&self, index: usize) -> bool {
        let c = self.coord_of(index);
        c.x == 0
            || c.y == 0
            || c.z == 0
            || c.x + 1 == self.x
            || c.y + 1 == self.y
            || c.z + 1 == self.z
    }

    /// Whether a voxel touches an outer face along an axis with more than one layer.
    ///
    /// Flat axes are ignored, so a 2D slice only has its in-plane edges as
    /// exterior. A 1x1x1 grid has no exterior voxel.
    #[must_use]
    pub const fn is_exterior(&self, index: usize) -> bool {
        let c = self.coord_of(index);
        (self.x > 1 && (c.x == 0 || c.x + 1 == self.x))
            || (self.y > 1 && (c.y == 0 || c.y + 1 == self.y))
            || (self.z > 1 && (c.z == 0 || c.z + 1 == self.z))
    }

    /// Iterates over every linear index in storage order.
    pub fn indices(&self) -> std::ops::Range<usize> {
        0..self.voxel_count()
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}
