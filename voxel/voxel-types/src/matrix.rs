//! Named collections of equally sized attribute arrays.

use hashbrown::HashSet;

use crate::array::{AttributeArray, DataArray, Element};
use crate::error::{GridError, GridResult};

/// An ordered set of named arrays sharing one tuple count.
///
/// A cell matrix holds one tuple per voxel; a feature matrix holds one tuple
/// per feature id, with row 0 reserved for "no feature".
///
/// # Example
///
/// ```
/// use voxel_types::{AttributeMatrix, DataArray};
///
/// let mut cells = AttributeMatrix::new(4);
/// cells.insert(DataArray::from_vec("Phases", 1, vec![1, 1, 2, 2]).unwrap()).unwrap();
/// cells.insert(DataArray::<f32>::new("Confidence", 4, 1).unwrap()).unwrap();
///
/// assert_eq!(cells.names().collect::<Vec<_>>(), ["Phases", "Confidence"]);
/// assert_eq!(cells.get::<i32>("Phases").unwrap().as_slice(), &[1, 1, 2, 2]);
/// ```
#[derive(Debug, Default)]
pub struct AttributeMatrix {
    num_tuples: usize,
    arrays: Vec<Box<dyn AttributeArray>>,
}

impl AttributeMatrix {
    /// Creates an empty matrix for `num_tuples` tuples.
    #[must_use]
    pub fn new(num_tuples: usize) -> Self {
        Self {
            num_tuples,
            arrays: Vec::new(),
        }
    }

    /// Tuple count shared by every array.
    #[must_use]
    pub fn num_tuples(&self) -> usize {
        self.num_tuples
    }

    /// Number of arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Whether the matrix holds no arrays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Array names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|a| a.name())
    }

    /// Whether an array with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.arrays.iter().any(|a| a.name() == name)
    }

    /// Adds an array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TupleCountMismatch`] if the array has a different
    /// tuple count and [`GridError::DuplicateArray`] if the name is taken.
    pub fn insert<A: AttributeArray>(&mut self, array: A) -> GridResult<()> {
        self.insert_boxed(Box::new(array))
    }

    /// Adds an already boxed array.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn insert_boxed(&mut self, array: Box<dyn AttributeArray>) -> GridResult<()> {
        if array.num_tuples() != self.num_tuples {
            return Err(GridError::TupleCountMismatch {
                name: array.name().to_string(),
                expected: self.num_tuples,
                actual: array.num_tuples(),
            });
        }
        if self.contains(array.name()) {
            return Err(GridError::DuplicateArray {
                name: array.name().to_string(),
            });
        }
        self.arrays.push(array);
        Ok(())
    }

    /// Removes and returns an array.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn AttributeArray>> {
        let pos = self.arrays.iter().position(|a| a.name() == name)?;
        Some(self.arrays.remove(pos))
    }

    /// Type-erased access to an array.
    #[must_use]
    pub fn array(&self, name: &str) -> Option<&dyn AttributeArray> {
        self.arrays
            .iter()
            .find(|a| a.name() == name)
            .map(|a| &**a)
    }

    /// Typed access to an array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MissingArray`] or [`GridError::TypeMismatch`].
    pub fn get<T: Element>(&self, name: &str) -> GridResult<&DataArray<T>> {
        let array = self.array(name).ok_or_else(|| GridError::MissingArray {
            name: name.to_string(),
        })?;
        let actual = array.element_type();
        array
            .as_any()
            .downcast_ref::<DataArray<T>>()
            .ok_or_else(|| GridError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Typed mutable access to an array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MissingArray`] or [`GridError::TypeMismatch`].
    pub fn get_mut<T: Element>(&mut self, name: &str) -> GridResult<&mut DataArray<T>> {
        let array = self
            .arrays
            .iter_mut()
            .find(|a| a.name() == name)
            .ok_or_else(|| GridError::MissingArray {
                name: name.to_string(),
            })?;
        let actual = array.element_type();
        array
            .as_any_mut()
            .downcast_mut::<DataArray<T>>()
            .ok_or_else(|| GridError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Copies tuple `src` over `dst` in every array not named in `ignored`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::IndexOutOfRange`] if either index is outside the matrix.
    pub fn copy_tuple_except(
        &mut self,
        src: usize,
        dst: usize,
        ignored: &HashSet<String>,
    ) -> GridResult<()> {
        self.copy_tuples_except(&[(src, dst)], ignored)
    }

    /// Applies a batch of `(src, dst)` copies to every array not named in `ignored`.
    ///
    /// Each array reads its pre-batch values, see [`AttributeArray::copy_tuples`].
    ///
    /// # Errors
    ///
    /// Returns [`GridError::IndexOutOfRange`] if any index is outside the
    /// matrix; no array is modified in that case.
    pub fn copy_tuples_except(
        &mut self,
        pairs: &[(usize, usize)],
        ignored: &HashSet<String>,
    ) -> GridResult<()> {
        if let Some(&(src, dst)) = pairs
            .iter()
            .find(|&&(src, dst)| src >= self.num_tuples || dst >= self.num_tuples)
        {
            return Err(GridError::IndexOutOfRange {
                name: "<matrix>".to_string(),
                index: src.max(dst),
                len: self.num_tuples,
            });
        }
        for array in self
            .arrays
            .iter_mut()
            .filter(|a| !ignored.contains(a.name()))
        {
            array.copy_tuples(pairs)?;
        }
        Ok(())
    }

    /// Keeps the tuples whose `keep` flag is set in every array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MaskLengthMismatch`] if `keep` does not have one
    /// entry per tuple.
    pub fn retain_tuples(&mut self, keep: &[bool]) -> GridResult<()> {
        if keep.len() != self.num_tuples {
            return Err(GridError::MaskLengthMismatch {
                expected: self.num_tuples,
                actual: keep.len(),
            });
        }
        for array in &mut self.arrays {
            array.retain_tuples(keep)?;
        }
        self.num_tuples = keep.iter().filter(|&&k| k).count();
        Ok(())
    }

    /// Deletes inactive feature rows and renumbers voxel labels densely.
    ///
    /// Row 0 is always kept. Surviving features keep their relative order and
    /// are renumbered to `1..=N`. Voxels labeled with a removed feature become
    /// 0; negative labels are left untouched. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MaskLengthMismatch`] if `active` does not have one
    /// entry per row and [`GridError::LabelOutOfRange`] if a label has no row.
    /// Nothing is modified when an error is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use voxel_types::{AttributeMatrix, DataArray};
    ///
    /// let mut features = AttributeMatrix::new(4);
    /// features.insert(DataArray::from_vec("Size", 1, vec![0, 5, 1, 7]).unwrap()).unwrap();
    ///
    /// let mut labels = vec![1, 2, 3, 3, 0];
    /// let removed = features
    ///     .remove_inactive_objects(&[true, true, false, true], &mut labels)
    ///     .unwrap();
    ///
    /// assert_eq!(removed, 1);
    /// assert_eq!(labels, vec![1, 0, 2, 2, 0]);
    /// assert_eq!(features.get::<i32>("Size").unwrap().as_slice(), &[0, 5, 7]);
    /// ```
    pub fn remove_inactive_objects(
        &mut self,
        active: &[bool],
        labels: &mut [i32],
    ) -> GridResult<usize> {
        if active.len() != self.num_tuples {
            return Err(GridError::MaskLengthMismatch {
                expected: self.num_tuples,
                actual: active.len(),
            });
        }
        if let Some(&label) = labels
            .iter()
            .find(|&&l| usize::try_from(l).is_ok_and(|row| row >= self.num_tuples))
        {
            return Err(GridError::LabelOutOfRange {
                label,
                rows: self.num_tuples,
            });
        }

        let mut keep = active.to_vec();
        if let Some(first) = keep.first_mut() {
            *first = true;
        }
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return Ok(0);
        }

        let mut new_ids = vec![0i32; keep.len()];
        let mut next = 0i32;
        for (row, &kept) in keep.iter().enumerate().skip(1) {
            if kept {
                next += 1;
                new_ids[row] = next;
            }
        }
        for label in labels.iter_mut() {
            if let Ok(row) = usize::try_from(*label) {
                *label = new_ids[row];
            }
        }

        self.retain_tuples(&keep)?;
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cells() -> AttributeMatrix {
        let mut m = AttributeMatrix::new(3);
        m.insert(DataArray::from_vec("Phases", 1, vec![1, 2, 3]).unwrap())
            .unwrap();
        m.insert(DataArray::from_vec("Euler", 3, vec![0.1f32; 9]).unwrap())
            .unwrap();
        m
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut m = cells();
        let err = m
            .insert(DataArray::<u8>::new("Mask", 2, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, GridError::TupleCountMismatch { actual: 2, .. }));
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut m = cells();
        let err = m
            .insert(DataArray::<i32>::new("Phases", 3, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, GridError::DuplicateArray { .. }));
    }

    #[test]
    fn test_get_type_mismatch() {
        let m = cells();
        let err = m.get::<f32>("Phases").unwrap_err();
        assert!(matches!(err, GridError::TypeMismatch { .. }));
        assert!(matches!(
            m.get::<i32>("Nope").unwrap_err(),
            GridError::MissingArray { .. }
        ));
    }

    #[test]
    fn test_copy_tuple_except_skips_ignored() {
        let mut m = cells();
        m.get_mut::<f32>("Euler").unwrap().as_mut_slice()[6] = 0.9;
        let ignored: HashSet<String> = ["Phases".to_string()].into_iter().collect();
        m.copy_tuple_except(2, 0, &ignored).unwrap();

        assert_eq!(m.get::<i32>("Phases").unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(m.get::<f32>("Euler").unwrap().as_slice()[0], 0.9);
    }

    #[test]
    fn test_copy_out_of_range_leaves_arrays() {
        let mut m = cells();
        let err = m
            .copy_tuples_except(&[(0, 1), (0, 7)], &HashSet::new())
            .unwrap_err();
        assert!(matches!(err, GridError::IndexOutOfRange { index: 7, .. }));
        assert_eq!(m.get::<i32>("Phases").unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_remove_and_array() {
        let mut m = cells();
        assert!(m.array("Euler").is_some());
        assert!(m.remove("Euler").is_some());
        assert!(m.remove("Euler").is_none());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_remove_inactive_keeps_row_zero() {
        let mut features = AttributeMatrix::new(3);
        features
            .insert(DataArray::from_vec("Id", 1, vec![0, 1, 2]).unwrap())
            .unwrap();
        let mut labels = vec![-1, 1, 2, 0];
        let removed = features
            .remove_inactive_objects(&[false, false, true], &mut labels)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(labels, vec![-1, 0, 1, 0]);
        assert_eq!(features.get::<i32>("Id").unwrap().as_slice(), &[0, 2]);
        assert_eq!(features.num_tuples(), 2);
    }

    #[test]
    fn test_remove_inactive_label_out_of_range() {
        let mut features = AttributeMatrix::new(2);
        let mut labels = vec![1, 5];
        let err = features
            .remove_inactive_objects(&[true, false], &mut labels)
            .unwrap_err();
        assert_eq!(err, GridError::LabelOutOfRange { label: 5, rows: 2 });
        assert_eq!(labels, vec![1, 5]);
    }
}
