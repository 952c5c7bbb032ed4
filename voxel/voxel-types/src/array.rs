//! Typed per-tuple data arrays and the object-safe [`AttributeArray`] trait.
//!
//! An array stores `num_tuples * components` values in one flat `Vec`. A
//! "tuple" is the group of components belonging to one voxel or one feature,
//! e.g. the four floats of a quaternion. Algorithms that only need to move
//! tuples around work through [`AttributeArray`] and never see the element type.

use std::any::Any;
use std::fmt::Debug;

use crate::error::{GridError, GridResult};

/// Element types storable in a [`DataArray`].
pub trait Element: Copy + Default + Debug + Send + Sync + 'static {}

impl<T: Copy + Default + Debug + Send + Sync + 'static> Element for T {}

/// Type-erased view of a named per-tuple array.
pub trait AttributeArray: Any + Debug + Send + Sync {
    /// Array name, unique within its [`AttributeMatrix`](crate::AttributeMatrix).
    fn name(&self) -> &str;

    /// Number of tuples.
    fn num_tuples(&self) -> usize;

    /// Components per tuple.
    fn components(&self) -> usize;

    /// Name of the element type, for diagnostics.
    fn element_type(&self) -> &'static str;

    /// Copies tuple `src` over tuple `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::IndexOutOfRange`] if either index is outside the array.
    fn copy_tuple(&mut self, src: usize, dst: usize) -> GridResult<()>;

    /// Applies a batch of `(src, dst)` copies.
    ///
    /// Every copy reads the value `src` held before the batch started, so a
    /// tuple that is both a source and a destination in the same batch does
    /// not leak its new value into other destinations.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::IndexOutOfRange`] if any index is outside the
    /// array; the array is left untouched in that case.
    fn copy_tuples(&mut self, pairs: &[(usize, usize)]) -> GridResult<()>;

    /// Keeps the tuples whose `keep` flag is set, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MaskLengthMismatch`] if `keep` does not have one
    /// entry per tuple.
    fn retain_tuples(&mut self, keep: &[bool]) -> GridResult<()>;

    /// Upcast for downcasting to the concrete [`DataArray`].
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete [`DataArray`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A named, typed array of fixed-width tuples.
///
/// # Example
///
/// ```
/// use voxel_types::{AttributeArray, DataArray};
///
/// let mut phases = DataArray::from_vec("Phases", 1, vec![1, 1, 2, 2]).unwrap();
/// phases.copy_tuple(0, 3).unwrap();
/// assert_eq!(phases.as_slice(), &[1, 1, 2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray<T> {
    name: String,
    components: usize,
    data: Vec<T>,
}

impl<T: Element> DataArray<T> {
    /// Creates an array of `num_tuples` default-valued tuples.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroComponents`] if `components` is zero.
    pub fn new(name: impl Into<String>, num_tuples: usize, components: usize) -> GridResult<Self> {
        Self::filled(name, num_tuples, components, T::default())
    }

    /// Creates an array with every component set to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroComponents`] if `components` is zero.
    pub fn filled(
        name: impl Into<String>,
        num_tuples: usize,
        components: usize,
        value: T,
    ) -> GridResult<Self> {
        let name = name.into();
        if components == 0 {
            return Err(GridError::ZeroComponents { name });
        }
        Ok(Self {
            name,
            components,
            data: vec![value; num_tuples * components],
        })
    }

    /// Wraps existing flat storage.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroComponents`] if `components` is zero and
    /// [`GridError::RaggedStorage`] if `data` is not a whole number of tuples.
    pub fn from_vec(name: impl Into<String>, components: usize, data: Vec<T>) -> GridResult<Self> {
        let name = name.into();
        if components == 0 {
            return Err(GridError::ZeroComponents { name });
        }
        if data.len() % components != 0 {
            return Err(GridError::RaggedStorage {
                name,
                len: data.len(),
                components,
            });
        }
        Ok(Self {
            name,
            components,
            data,
        })
    }

    /// Number of tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.components
    }

    /// Whether the array holds no tuples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One tuple, or `None` if out of range.
    #[must_use]
    pub fn tuple(&self, index: usize) -> Option<&[T]> {
        let start = index.checked_mul(self.components)?;
        self.data.get(start..start + self.components)
    }

    /// One tuple, mutably, or `None` if out of range.
    pub fn tuple_mut(&mut self, index: usize) -> Option<&mut [T]> {
        let start = index.checked_mul(self.components)?;
        self.data.get_mut(start..start + self.components)
    }

    /// Flat view of all components.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat view of all components.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the array, returning its flat storage.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn check_index(&self, index: usize) -> GridResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(GridError::IndexOutOfRange {
                name: self.name.clone(),
                index,
                len: self.len(),
            })
        }
    }
}

impl<T: Element> AttributeArray for DataArray<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_tuples(&self) -> usize {
        self.len()
    }

    fn components(&self) -> usize {
        self.components
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn copy_tuple(&mut self, src: usize, dst: usize) -> GridResult<()> {
        self.check_index(src)?;
        self.check_index(dst)?;
        let c = self.components;
        self.data.copy_within(src * c..(src + 1) * c, dst * c);
        Ok(())
    }

    fn copy_tuples(&mut self, pairs: &[(usize, usize)]) -> GridResult<()> {
        for &(src, dst) in pairs {
            self.check_index(src)?;
            self.check_index(dst)?;
        }
        let c = self.components;
        let gathered: Vec<T> = pairs
            .iter()
            .flat_map(|&(src, _)| self.data[src * c..(src + 1) * c].iter().copied())
            .collect();
        for (values, &(_, dst)) in gathered.chunks_exact(c).zip(pairs) {
            self.data[dst * c..(dst + 1) * c].copy_from_slice(values);
        }
        Ok(())
    }

    fn retain_tuples(&mut self, keep: &[bool]) -> GridResult<()> {
        if keep.len() != self.len() {
            return Err(GridError::MaskLengthMismatch {
                expected: self.len(),
                actual: keep.len(),
            });
        }
        let c = self.components;
        let mut write = 0;
        for (read, &kept) in keep.iter().enumerate() {
            if kept {
                if read != write {
                    self.data.copy_within(read * c..(read + 1) * c, write * c);
                }
                write += 1;
            }
        }
        self.data.truncate(write * c);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
