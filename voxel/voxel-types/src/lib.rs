//! Core data types for labeled voxel volumes.
//!
//! This crate provides the data model shared by the voxel cleanup algorithms:
//!
//! - [`GridDims`] - Regular grid dimensions with linear index <-> coordinate mapping
//! - [`Face`] and [`FaceMask`] - The six face neighbors in canonical scan order
//! - [`VoxelCoord`] - Unsigned voxel coordinates
//! - [`DataArray`] and [`AttributeArray`] - Named arrays of fixed-width tuples
//! - [`AttributeMatrix`] - Named collection of arrays sharing a tuple count
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It holds no
//! algorithms beyond index arithmetic and tuple bookkeeping.
//!
//! # Indexing
//!
//! Voxels are stored X fastest, then Y, then Z:
//! `index = z * dx * dy + y * dx + x`. Face neighbors are always reported in the
//! order `-Z, -Y, -X, +X, +Y, +Z`, with `None` where a neighbor would cross the
//! grid boundary.
//!
//! # Example
//!
//! ```
//! use voxel_types::{AttributeMatrix, DataArray, Face, GridDims};
//!
//! let grid = GridDims::new(5, 5, 1).unwrap();
//! let center = 12;
//! let valid: Vec<usize> = grid.face_neighbors(center).into_iter().flatten().collect();
//! assert_eq!(valid, vec![7, 11, 13, 17]);
//!
//! let mut cells = AttributeMatrix::new(grid.voxel_count());
//! cells
//!     .insert(DataArray::<f32>::new("Confidence", grid.voxel_count(), 1).unwrap())
//!     .unwrap();
//! cells.get_mut::<f32>("Confidence").unwrap().as_mut_slice()[7] = 0.8;
//!
//! // Copy the neighbor's tuple into the center voxel.
//! let donor = grid.neighbor(center, Face::NegY).unwrap();
//! cells
//!     .copy_tuple_except(donor, center, &Default::default())
//!     .unwrap();
//! assert_eq!(cells.get::<f32>("Confidence").unwrap().as_slice()[center], 0.8);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod array;
mod coord;
mod error;
mod grid;
mod matrix;

pub use array::{AttributeArray, DataArray, Element};
pub use coord::VoxelCoord;
pub use error::{GridError, GridResult};
pub use grid::{Axis, Face, FaceMask, GridDims};
pub use matrix::AttributeMatrix;
