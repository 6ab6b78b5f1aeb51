//! Broadphase collision detection: sweep-and-prune over world-space bounds.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::bounds::Bounds;
use super::collider::ColliderId;

/// Candidate partners per collider.
pub type CandidateMap = HashMap<ColliderId, HashSet<ColliderId>>;

/// One end of a collider's interval on a single axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub id: ColliderId,
    pub value: f32,
    pub is_min: bool,
}

impl Endpoint {
    /// Ascending coordinate; at equal coordinates opening endpoints come first
    /// so that touching intervals overlap.
    fn sort_order(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.is_min.cmp(&self.is_min))
    }
}

/// Sweep-and-prune broadphase, rebuilt from scratch every tick.
///
/// Keeps its per-axis endpoint buffers between ticks to reuse their
/// allocations; no ordering is carried over.
#[derive(Debug, Default)]
pub struct SweepAndPrune {
    axes: [Vec<Endpoint>; 3],
}

impl SweepAndPrune {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find every pair of colliders whose bounds overlap on all three axes.
    ///
    /// The result is symmetric: if `b` is in `a`'s set, `a` is in `b`'s.
    /// Colliders without any partner are absent from the map.
    pub fn find_candidates(
        &mut self,
        entries: impl IntoIterator<Item = (ColliderId, Bounds)>,
    ) -> CandidateMap {
        for axis in &mut self.axes {
            axis.clear();
        }

        for (id, bounds) in entries {
            for (axis, points) in self.axes.iter_mut().enumerate() {
                points.push(Endpoint {
                    id,
                    value: bounds.min[axis],
                    is_min: true,
                });
                points.push(Endpoint {
                    id,
                    value: bounds.max[axis],
                    is_min: false,
                });
            }
        }

        for points in &mut self.axes {
            points.sort_by(Endpoint::sort_order);
        }

        let [x, y, z] = &self.axes;
        let mut candidates = sweep_axis(x);
        for other in [sweep_axis(y), sweep_axis(z)] {
            candidates.retain(|id, set| {
                match other.get(id) {
                    Some(other_set) => set.retain(|partner| other_set.contains(partner)),
                    None => set.clear(),
                }
                !set.is_empty()
            });
        }
        candidates
    }

    /// All candidate pairs with `a < b`, sorted.
    pub fn pairs(candidates: &CandidateMap) -> Vec<(ColliderId, ColliderId)> {
        let mut pairs: Vec<_> = candidates
            .iter()
            .flat_map(|(&a, set)| set.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Sweep sorted endpoints of a single axis and record every pair of
/// intervals that are open at the same time.
pub fn sweep_axis(points: &[Endpoint]) -> CandidateMap {
    let mut open: Vec<ColliderId> = Vec::new();
    let mut overlaps = CandidateMap::new();

    for point in points {
        if point.is_min {
            for &other in &open {
                overlaps.entry(point.id).or_default().insert(other);
                overlaps.entry(other).or_default().insert(point.id);
            }
            open.push(point.id);
        } else if let Some(pos) = open.iter().position(|&id| id == point.id) {
            open.swap_remove(pos);
        }
    }

    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ColliderId> {
        let mut map = SlotMap::<ColliderId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn unit_box(min: Vec3) -> Bounds {
        Bounds::new(min, min + Vec3::ONE)
    }

    fn partners(candidates: &CandidateMap, id: ColliderId) -> HashSet<ColliderId> {
        candidates.get(&id).cloned().unwrap_or_default()
    }

    #[test]
    fn test_broadphase_axis_separated() {
        let id = ids(2);
        let mut sap = SweepAndPrune::new();
        // Overlap on X and Y, separated on Z
        let candidates = sap.find_candidates([
            (id[0], unit_box(Vec3::ZERO)),
            (id[1], unit_box(Vec3::new(0.5, 0.5, 1.5))),
        ]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_broadphase_corner_touching() {
        let id = ids(2);
        let mut sap = SweepAndPrune::new();
        let candidates = sap.find_candidates([
            (id[0], unit_box(Vec3::ZERO)),
            (id[1], unit_box(Vec3::ONE)),
        ]);
        assert!(partners(&candidates, id[0]).contains(&id[1]));
        assert!(partners(&candidates, id[1]).contains(&id[0]));
    }

    #[test]
    fn test_broadphase_fully_contained() {
        let id = ids(2);
        let mut sap = SweepAndPrune::new();
        let candidates = sap.find_candidates([
            (id[0], Bounds::new(Vec3::splat(-5.0), Vec3::splat(5.0))),
            (id[1], Bounds::new(Vec3::splat(-0.1), Vec3::splat(0.1))),
        ]);
        assert_eq!(partners(&candidates, id[0]), HashSet::from([id[1]]));
        assert_eq!(partners(&candidates, id[1]), HashSet::from([id[0]]));
    }

    #[test]
    fn test_broadphase_sweep_scenario() {
        let id = ids(3);
        let along_x = |lo: f32, hi: f32| Bounds::new(Vec3::new(lo, 0.0, 0.0), Vec3::new(hi, 1.0, 1.0));
        let mut sap = SweepAndPrune::new();
        let candidates = sap.find_candidates([
            (id[0], along_x(0.0, 1.0)),
            (id[1], along_x(0.5, 1.5)),
            (id[2], along_x(2.0, 3.0)),
        ]);

        assert_eq!(partners(&candidates, id[0]), HashSet::from([id[1]]));
        assert_eq!(partners(&candidates, id[1]), HashSet::from([id[0]]));
        assert!(partners(&candidates, id[2]).is_empty());
        assert_eq!(SweepAndPrune::pairs(&candidates).len(), 1);
    }

    #[test]
    fn test_sweep_axis_single_axis() {
        let id = ids(2);
        let points = [
            Endpoint { id: id[0], value: 0.0, is_min: true },
            Endpoint { id: id[1], value: 0.5, is_min: true },
            Endpoint { id: id[0], value: 1.0, is_min: false },
            Endpoint { id: id[1], value: 1.5, is_min: false },
        ];
        let overlaps = sweep_axis(&points);
        assert!(overlaps[&id[0]].contains(&id[1]));
        assert!(overlaps[&id[1]].contains(&id[0]));
    }

    #[test]
    fn test_broadphase_matches_brute_force() {
        // Deterministic jittered grid with plenty of near misses and touches
        let n = 40;
        let id = ids(n);
        let boxes: Vec<Bounds> = (0..n)
            .map(|i| {
                let f = i as f32;
                let min = Vec3::new(
                    (i % 5) as f32 * 0.9,
                    ((i / 5) % 4) as f32 * 1.1,
                    (f * 0.37).sin() * 1.5,
                );
                let size = Vec3::new(1.0, 0.5 + (f * 0.13).cos().abs(), 0.75);
                Bounds::new(min, min + size)
            })
            .collect();

        let mut sap = SweepAndPrune::new();
        let candidates = sap.find_candidates(id.iter().copied().zip(boxes.iter().copied()));

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let expected = boxes[i].overlaps(&boxes[j]);
                let got = partners(&candidates, id[i]).contains(&id[j]);
                assert_eq!(expected, got, "pair ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_pairs_are_ordered() {
        let id = ids(3);
        let mut sap = SweepAndPrune::new();
        let candidates = sap.find_candidates(id.iter().map(|&i| (i, unit_box(Vec3::ZERO))));
        let pairs = SweepAndPrune::pairs(&candidates);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|(a, b)| a < b));
    }
}
