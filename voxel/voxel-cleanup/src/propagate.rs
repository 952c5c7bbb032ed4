//! Bulk attribute propagation from donors to recipients.

use hashbrown::HashSet;
use voxel_types::AttributeMatrix;

use crate::error::{CleanupResult, check_len};
use crate::vote::NeighborMap;

/// What happens to a recipient's label when it receives a donor's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelUpdate {
    /// The recipient takes the donor's label.
    #[default]
    Donor,
    /// The recipient becomes background (label 0).
    Zero,
}

/// How a sweep's donor map is applied.
#[derive(Debug, Clone, Copy)]
pub struct Propagation<'a> {
    /// Label policy for recipients.
    pub label_update: LabelUpdate,
    /// Cell arrays that are never copied.
    pub ignored: &'a HashSet<String>,
}

impl<'a> Propagation<'a> {
    /// Creates a propagation policy.
    #[must_use]
    pub fn new(label_update: LabelUpdate, ignored: &'a HashSet<String>) -> Self {
        Self {
            label_update,
            ignored,
        }
    }
}

/// Applies every `(recipient, donor)` pair of `map`.
///
/// All cell arrays except the ignored ones receive the donor's tuple, reading
/// the values as they were before this call, so a voxel that is both donor and
/// recipient in the same sweep donates its old value. Labels follow
/// `policy.label_update` with the same snapshot semantics. If the label array
/// is also stored in `cells`, name it in the ignore list.
///
/// Returns the number of recipients.
///
/// # Errors
///
/// Returns an error if `labels`, `cells` and `map` do not all cover the same
/// voxel count; nothing is modified in that case.
pub fn propagate(
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    map: &NeighborMap,
    policy: &Propagation<'_>,
) -> CleanupResult<usize> {
    check_len("neighbor map", map.len(), labels.len())?;
    check_len("cell attribute matrix", cells.num_tuples(), labels.len())?;

    let pairs: Vec<(usize, usize)> = map.pairs().map(|(dst, src)| (src, dst)).collect();
    if pairs.is_empty() {
        return Ok(0);
    }

    cells.copy_tuples_except(&pairs, policy.ignored)?;

    match policy.label_update {
        LabelUpdate::Donor => {
            let donated: Vec<i32> = pairs.iter().map(|&(src, _)| labels[src]).collect();
            for (&(_, dst), label) in pairs.iter().zip(donated) {
                labels[dst] = label;
            }
        }
        LabelUpdate::Zero => {
            for &(_, dst) in &pairs {
                labels[dst] = 0;
            }
        }
    }

    Ok(pairs.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use voxel_types::DataArray;

    fn cells(n: usize) -> AttributeMatrix {
        let mut m = AttributeMatrix::new(n);
        let values: Vec<f32> = (0..n).map(|i| i as f32).collect();
        m.insert(DataArray::from_vec("Confidence", 1, values).unwrap())
            .unwrap();
        m.insert(DataArray::from_vec("Phases", 1, vec![1i32; n]).unwrap())
            .unwrap();
        m
    }

    #[test]
    fn test_donor_label_and_attributes() {
        let mut labels = vec![3, -1, 4];
        let mut m = cells(3);
        let mut map = NeighborMap::new(3);
        map.set(1, Some(2));
        let ignored = HashSet::new();

        let n = propagate(&mut labels, &mut m, &map, &Propagation::new(LabelUpdate::Donor, &ignored))
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(labels, vec![3, 4, 4]);
        assert_eq!(m.get::<f32>("Confidence").unwrap().as_slice(), &[0.0, 2.0, 2.0]);
    }

    #[test]
    fn test_zero_policy() {
        let mut labels = vec![0, 5, 5];
        let mut m = cells(3);
        let mut map = NeighborMap::new(3);
        map.set(1, Some(0));
        let ignored = HashSet::new();

        propagate(&mut labels, &mut m, &map, &Propagation::new(LabelUpdate::Zero, &ignored)).unwrap();

        assert_eq!(labels, vec![0, 0, 5]);
    }

    #[test]
    fn test_chained_pairs_read_snapshot() {
        // 2 <- 1 and 1 <- 0 in the same sweep: 2 gets 1's old value.
        let mut labels = vec![7, 8, -1];
        let mut m = cells(3);
        let mut map = NeighborMap::new(3);
        map.set(1, Some(0));
        map.set(2, Some(1));
        let ignored = HashSet::new();

        propagate(&mut labels, &mut m, &map, &Propagation::new(LabelUpdate::Donor, &ignored))
            .unwrap();

        assert_eq!(labels, vec![7, 7, 8]);
        assert_eq!(m.get::<f32>("Confidence").unwrap().as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ignored_arrays_untouched() {
        let mut labels = vec![1, -1];
        let mut m = cells(2);
        m.get_mut::<i32>("Phases").unwrap().as_mut_slice()[0] = 9;
        let mut map = NeighborMap::new(2);
        map.set(1, Some(0));
        let ignored: HashSet<String> = ["Phases".to_string()].into_iter().collect();

        propagate(&mut labels, &mut m, &map, &Propagation::new(LabelUpdate::Donor, &ignored))
            .unwrap();

        assert_eq!(m.get::<i32>("Phases").unwrap().as_slice(), &[9, 1]);
        assert_eq!(m.get::<f32>("Confidence").unwrap().as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let mut labels = vec![1, -1];
        let mut m = cells(3);
        let map = NeighborMap::new(2);
        let ignored = HashSet::new();
        assert!(
            propagate(&mut labels, &mut m, &map, &Propagation::new(LabelUpdate::Donor, &ignored))
                .is_err()
        );
    }
}
