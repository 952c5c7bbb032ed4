//! Neighbor-majority voting.
//!
//! For every pending voxel, the labels of its valid face neighbors are tallied
//! in canonical face order. The donor is the neighbor whose label first reaches
//! a new strict maximum count, so ties keep the earlier face. Donors are
//! collected for the whole grid into a [`NeighborMap`] before anything is
//! written back.

use rayon::prelude::*;
use voxel_types::{FaceMask, GridDims};

/// Per-feature vote counters shared by every voxel of a sweep.
///
/// After each voxel is voted on, the counters it touched are zeroed again,
/// so the tally is all zeros between voxels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    counts: Vec<u32>,
}

impl VoteTally {
    /// Creates a tally covering feature ids `0..=max_feature`.
    #[must_use]
    pub fn new(max_feature: usize) -> Self {
        Self {
            counts: vec![0; max_feature + 1],
        }
    }

    /// Creates a tally covering every non-negative label present.
    #[must_use]
    pub fn for_labels(labels: &[i32]) -> Self {
        let max = labels
            .iter()
            .filter_map(|&l| usize::try_from(l).ok())
            .max()
            .unwrap_or(0);
        Self::new(max)
    }

    /// Number of feature ids covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the tally covers no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Current count for a feature id.
    #[must_use]
    pub fn count(&self, feature: usize) -> u32 {
        self.counts.get(feature).copied().unwrap_or(0)
    }

    /// Whether every counter is zero.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    fn bump(&mut self, feature: usize) -> u32 {
        if feature >= self.counts.len() {
            self.counts.resize(feature + 1, 0);
        }
        self.counts[feature] += 1;
        self.counts[feature]
    }

    fn clear(&mut self, feature: usize) {
        if let Some(c) = self.counts.get_mut(feature) {
            *c = 0;
        }
    }
}

/// The donor chosen for each voxel during one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborMap {
    donors: Vec<Option<usize>>,
}

impl NeighborMap {
    /// Creates an empty map for `voxel_count` voxels.
    #[must_use]
    pub fn new(voxel_count: usize) -> Self {
        Self {
            donors: vec![None; voxel_count],
        }
    }

    /// Forgets every donor.
    pub fn reset(&mut self) {
        self.donors.fill(None);
    }

    /// Donor recorded for a voxel.
    #[must_use]
    pub fn donor(&self, voxel: usize) -> Option<usize> {
        self.donors.get(voxel).copied().flatten()
    }

    /// Records a donor for a voxel.
    pub fn set(&mut self, voxel: usize, donor: Option<usize>) {
        self.donors[voxel] = donor;
    }

    /// Iterates over `(recipient, donor)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.donors
            .iter()
            .enumerate()
            .filter_map(|(voxel, donor)| donor.map(|d| (voxel, d)))
    }

    /// Number of voxels with a donor.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.donors.iter().filter(|d| d.is_some()).count()
    }

    /// Number of voxels covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.donors.len()
    }

    /// Whether the map covers no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.donors.is_empty()
    }
}

/// Result of voting on one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vote {
    /// The winning neighbor, if any neighbor was a candidate.
    pub donor: Option<usize>,
    /// How many valid neighbors were candidates.
    pub candidates: u8,
}

/// Decides which voxels vote and which neighbors may donate.
///
/// Only non-negative neighbor labels are ever tallied, whatever
/// [`is_candidate`](Self::is_candidate) says.
pub trait VoteRule: Sync {
    /// Whether a voxel with this label looks for a donor.
    fn is_pending(&self, label: i32) -> bool;

    /// Whether a neighbor labeled `neighbor` may donate to a voxel labeled `own`.
    fn is_candidate(&self, own: i32, neighbor: i32) -> bool;

    /// Whether a finished vote counts toward the sweep. Default: always.
    fn qualifies(&self, _vote: &Vote) -> bool {
        true
    }
}

/// Pending voxels carry a negative label and take any real feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelRule;

impl VoteRule for SentinelRule {
    fn is_pending(&self, label: i32) -> bool {
        label < 0
    }

    fn is_candidate(&self, _own: i32, neighbor: i32) -> bool {
        neighbor > 0
    }
}

/// Background voxels (label 0) take any real feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundRule;

impl VoteRule for BackgroundRule {
    fn is_pending(&self, label: i32) -> bool {
        label == 0
    }

    fn is_candidate(&self, _own: i32, neighbor: i32) -> bool {
        neighbor > 0
    }
}

/// Voxels whose count of opposite-status neighbors reaches a threshold.
///
/// A good voxel (label > 0) counts background neighbors; a background voxel
/// counts good neighbors. The voxel qualifies when that count is positive and
/// at least `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CoordinationRule {
    /// Required opposite-status neighbors (0..=6).
    pub threshold: u8,
}

impl VoteRule for CoordinationRule {
    fn is_pending(&self, label: i32) -> bool {
        label >= 0
    }

    fn is_candidate(&self, own: i32, neighbor: i32) -> bool {
        (own > 0 && neighbor == 0) || (own == 0 && neighbor > 0)
    }

    fn qualifies(&self, vote: &Vote) -> bool {
        vote.candidates > 0 && vote.candidates >= self.threshold
    }
}

/// Votes on one voxel using the shared tally.
///
/// The tally must be clear on entry and is clear again on return: the second
/// pass zeroes the counter of every valid neighbor's label.
#[must_use]
pub fn cast_vote<R: VoteRule + ?Sized>(
    grid: &GridDims,
    labels: &[i32],
    index: usize,
    faces: FaceMask,
    tally: &mut VoteTally,
    rule: &R,
) -> Vote {
    let own = labels[index];
    let neighbors = faces.apply(grid.face_neighbors(index));
    let mut vote = Vote::default();
    let mut most = 0;

    for n in neighbors.into_iter().flatten() {
        let label = labels[n];
        if !rule.is_candidate(own, label) {
            continue;
        }
        let Ok(feature) = usize::try_from(label) else {
            continue;
        };
        vote.candidates += 1;
        let current = tally.bump(feature);
        if current > most {
            most = current;
            vote.donor = Some(n);
        }
    }

    for n in neighbors.into_iter().flatten() {
        if let Ok(feature) = usize::try_from(labels[n]) {
            tally.clear(feature);
        }
    }

    vote
}

/// Votes on one voxel with a stack-local tally.
///
/// Produces exactly the same result as [`cast_vote`]; used by the parallel
/// sweep where a shared tally is not available.
#[must_use]
pub fn cast_vote_local<R: VoteRule + ?Sized>(
    grid: &GridDims,
    labels: &[i32],
    index: usize,
    faces: FaceMask,
    rule: &R,
) -> Vote {
    let own = labels[index];
    let mut seen = [(0i32, 0u32); 6];
    let mut distinct = 0;
    let mut vote = Vote::default();
    let mut most = 0;

    for n in faces.apply(grid.face_neighbors(index)).into_iter().flatten() {
        let label = labels[n];
        if label < 0 || !rule.is_candidate(own, label) {
            continue;
        }
        vote.candidates += 1;
        let current = if let Some(slot) = seen[..distinct].iter_mut().find(|(l, _)| *l == label) {
            slot.1 += 1;
            slot.1
        } else {
            seen[distinct] = (label, 1);
            distinct += 1;
            1
        };
        if current > most {
            most = current;
            vote.donor = Some(n);
        }
    }

    vote
}

/// Runs donor discovery over the whole grid.
///
/// `map` is reset and then filled with the donor of every pending voxel whose
/// vote qualifies. Labels are only read, so the result reflects one snapshot
/// of the grid. Returns the number of qualifying voxels, which includes
/// voxels that found no donor.
pub fn sweep_votes<R: VoteRule + ?Sized>(
    grid: &GridDims,
    labels: &[i32],
    faces: FaceMask,
    tally: &mut VoteTally,
    map: &mut NeighborMap,
    rule: &R,
    parallel: bool,
) -> usize {
    map.reset();

    if parallel {
        let votes: Vec<Option<Option<usize>>> = (0..labels.len())
            .into_par_iter()
            .map(|i| {
                if !rule.is_pending(labels[i]) {
                    return None;
                }
                let vote = cast_vote_local(grid, labels, i, faces, rule);
                rule.qualifies(&vote).then_some(vote.donor)
            })
            .collect();
        let mut qualifying = 0;
        for (i, vote) in votes.into_iter().enumerate() {
            if let Some(donor) = vote {
                qualifying += 1;
                map.set(i, donor);
            }
        }
        return qualifying;
    }

    tally.reset();
    let mut qualifying = 0;
    for i in 0..labels.len() {
        if !rule.is_pending(labels[i]) {
            continue;
        }
        let vote = cast_vote(grid, labels, i, faces, tally, rule);
        if rule.qualifies(&vote) {
            qualifying += 1;
            map.set(i, vote.donor);
        }
    }
    qualifying
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid_3x3() -> GridDims {
        GridDims::new(3, 3, 1).unwrap()
    }

    #[test]
    fn test_tally_for_labels() {
        let tally = VoteTally::for_labels(&[-1, 0, 7, 3]);
        assert_eq!(tally.len(), 8);
        assert!(tally.is_clear());
    }

    #[test]
    fn test_majority_wins() {
        // Center 4: neighbors 1 (NegY), 3 (NegX), 5 (PosX), 7 (PosY).
        let labels = vec![0, 2, 0, 1, -1, 2, 0, 2, 0];
        let mut tally = VoteTally::for_labels(&labels);
        let vote = cast_vote(&grid_3x3(), &labels, 4, FaceMask::ALL, &mut tally, &SentinelRule);
        assert_eq!(vote.candidates, 4);
        // Feature 2 first reaches count 2 at neighbor 5.
        assert_eq!(vote.donor, Some(5));
        assert!(tally.is_clear());
    }

    #[test]
    fn test_first_wins_on_tie() {
        let labels = vec![0, 3, 0, 0, -1, 5, 0, 0, 0];
        let mut tally = VoteTally::for_labels(&labels);
        let vote = cast_vote(&grid_3x3(), &labels, 4, FaceMask::ALL, &mut tally, &SentinelRule);
        assert_eq!(vote.donor, Some(1));
    }

    #[test]
    fn test_no_candidates() {
        let labels = vec![0, 0, 0, 0, -1, 0, 0, 0, 0];
        let mut tally = VoteTally::for_labels(&labels);
        let vote = cast_vote(&grid_3x3(), &labels, 4, FaceMask::ALL, &mut tally, &SentinelRule);
        assert_eq!(vote, Vote::default());
    }

    #[test]
    fn test_face_mask_limits_candidates() {
        let labels = vec![0, 3, 0, 4, -1, 4, 0, 3, 0];
        let x_only = FaceMask::new(true, false, false);
        let mut tally = VoteTally::for_labels(&labels);
        let vote = cast_vote(&grid_3x3(), &labels, 4, x_only, &mut tally, &SentinelRule);
        assert_eq!(vote.candidates, 2);
        assert_eq!(vote.donor, Some(3));
    }

    #[test]
    fn test_local_matches_shared() {
        let labels = vec![1, 2, 2, 1, -1, 3, 3, 2, -1];
        let grid = grid_3x3();
        let mut tally = VoteTally::for_labels(&labels);
        for i in 0..labels.len() {
            let shared = cast_vote(&grid, &labels, i, FaceMask::ALL, &mut tally, &SentinelRule);
            let local = cast_vote_local(&grid, &labels, i, FaceMask::ALL, &SentinelRule);
            assert_eq!(shared, local, "voxel {i}");
        }
    }

    #[test]
    fn test_coordination_rule_counts_opposites() {
        // Good voxel 4 surrounded by background on three sides.
        let labels = vec![0, 0, 0, 0, 2, 0, 0, 2, 0];
        let rule = CoordinationRule { threshold: 3 };
        let vote = cast_vote_local(&grid_3x3(), &labels, 4, FaceMask::ALL, &rule);
        assert_eq!(vote.candidates, 3);
        assert_eq!(vote.donor, Some(1));
        assert!(rule.qualifies(&vote));
        assert!(!CoordinationRule { threshold: 4 }.qualifies(&vote));
    }

    #[test]
    fn test_sweep_votes_serial_and_parallel_agree() {
        let grid = GridDims::new(4, 4, 2).unwrap();
        let labels: Vec<i32> = (0..32).map(|i| if i % 5 == 0 { -1 } else { i % 3 }).collect();
        let mut tally = VoteTally::for_labels(&labels);
        let mut serial = NeighborMap::new(labels.len());
        let mut parallel = NeighborMap::new(labels.len());

        let a = sweep_votes(&grid, &labels, FaceMask::ALL, &mut tally, &mut serial, &SentinelRule, false);
        let b = sweep_votes(&grid, &labels, FaceMask::ALL, &mut tally, &mut parallel, &SentinelRule, true);

        assert_eq!(a, b);
        assert_eq!(serial, parallel);
        assert_eq!(a, labels.iter().filter(|&&l| l < 0).count());
    }

    #[test]
    fn test_neighbor_map_pairs() {
        let mut map = NeighborMap::new(4);
        map.set(1, Some(0));
        map.set(3, Some(2));
        assert_eq!(map.pairs().collect::<Vec<_>>(), vec![(1, 0), (3, 2)]);
        assert_eq!(map.resolved_count(), 2);
        map.reset();
        assert_eq!(map.donor(1), None);
    }
}
