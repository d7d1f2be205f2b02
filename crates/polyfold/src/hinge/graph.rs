//! Hinge storage with per-panel adjacency and generation-tagged handles.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::types::{Hinge, HingeId};
use crate::assembly::PolyformId;

/// Arena of hinges plus the panel → hinge-slot index.
///
/// Invariants:
/// - Between compactions, `adjacency[p]` lists exactly the slots whose hinge
///   has `p` as an endpoint, in insertion order.
/// - Removal only flags a hinge inactive; slots move only in `compact()`.
#[derive(Clone, Debug, Default)]
pub struct HingeGraph {
    hinges: Vec<Hinge>,
    adjacency: HashMap<PolyformId, Vec<usize>>,
    generation: u32,
}

impl HingeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of stored hinges, active or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.hinges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hinges.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.hinges.iter().filter(|h| h.active).count()
    }

    #[inline]
    fn handle(&self, index: usize) -> HingeId {
        HingeId {
            index,
            generation: self.generation,
        }
    }

    fn slot(&self, id: HingeId) -> Option<usize> {
        (id.generation == self.generation && id.index < self.hinges.len()).then_some(id.index)
    }

    pub fn add_hinge(&mut self, hinge: Hinge) -> HingeId {
        let index = self.hinges.len();
        self.link(index, &hinge);
        self.hinges.push(hinge);
        self.handle(index)
    }

    fn link(&mut self, index: usize, hinge: &Hinge) {
        self.adjacency
            .entry(hinge.poly1_id.clone())
            .or_default()
            .push(index);
        if hinge.poly2_id != hinge.poly1_id {
            self.adjacency
                .entry(hinge.poly2_id.clone())
                .or_default()
                .push(index);
        }
    }

    /// `None` for out-of-range or stale handles.
    pub fn get_hinge(&self, id: HingeId) -> Option<&Hinge> {
        self.slot(id).map(|i| &self.hinges[i])
    }

    pub fn get_hinge_mut(&mut self, id: HingeId) -> Option<&mut Hinge> {
        self.slot(id).map(move |i| &mut self.hinges[i])
    }

    /// Flag the hinge inactive. Returns `false` for an invalid handle.
    pub fn remove_hinge(&mut self, id: HingeId) -> bool {
        match self.get_hinge_mut(id) {
            Some(h) => {
                h.active = false;
                true
            }
            None => false,
        }
    }

    /// All hinges touching `poly` (including inactive ones), in insertion order.
    pub fn hinges_for_poly(&self, poly: &PolyformId) -> Vec<(HingeId, &Hinge)> {
        self.adjacency
            .get(poly)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|&i| self.hinges.get(i).map(|h| (self.handle(i), h)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Active hinges with handles, in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (HingeId, &Hinge)> + '_ {
        self.hinges
            .iter()
            .enumerate()
            .filter(|(_, h)| h.active)
            .map(move |(i, h)| (self.handle(i), h))
    }

    /// Panels reachable from `start` over active hinges, `start` included, sorted.
    pub fn connected_component(&self, start: &PolyformId) -> Vec<PolyformId> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for (_, hinge) in self.hinges_for_poly(&current) {
                if !hinge.active {
                    continue;
                }
                if let Some(other) = hinge.other(&current) {
                    if !visited.contains(other) {
                        queue.push_back(other.clone());
                    }
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Drop inactive hinges and start a new generation.
    ///
    /// Returns the old → new handle map for surviving hinges. When nothing is
    /// inactive the graph is untouched, the generation stays, and the map is
    /// the identity.
    pub fn compact(&mut self) -> BTreeMap<HingeId, HingeId> {
        if self.hinges.iter().all(|h| h.active) {
            return (0..self.hinges.len())
                .map(|i| (self.handle(i), self.handle(i)))
                .collect();
        }
        let old_generation = self.generation;
        let old = std::mem::take(&mut self.hinges);
        self.adjacency.clear();
        self.generation = self.generation.wrapping_add(1);

        let mut remap = BTreeMap::new();
        for (old_index, hinge) in old.into_iter().enumerate() {
            if !hinge.active {
                continue;
            }
            let new_id = self.add_hinge(hinge);
            remap.insert(
                HingeId {
                    index: old_index,
                    generation: old_generation,
                },
                new_id,
            );
        }
        tracing::debug!(
            kept = remap.len(),
            generation = self.generation,
            "compacted hinge graph"
        );
        remap
    }

    /// True when the inactive fraction exceeds `threshold` (never for an empty graph).
    pub fn should_compact(&self, threshold: f64) -> bool {
        if self.hinges.is_empty() {
            return false;
        }
        let inactive = self.hinges.len() - self.active_count();
        inactive as f64 / self.hinges.len() as f64 > threshold
    }

    /// Remove every hinge; outstanding handles become stale.
    pub fn clear(&mut self) {
        self.hinges.clear();
        self.adjacency.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
