//! Local neighbor deduction.
//!
//! When a pair of vertices matches across the graphs, their pending
//! neighbors often pair up too: a neighbor reachable through a terminal
//! of some class on one side must correspond to a neighbor with the same
//! value behind the same class on the other. A small open-addressed probe
//! table keyed by (value, class) finds those pairs without another full
//! refinement pass.
//!
//! The table is allocated once per engine and "cleared" by bumping a
//! version stamp; entries from older rounds are simply stale.

use crate::error::{internal, Result};
use crate::graph::Graph;
use crate::options::DEDUCE_TABLE_SIZE;
use crate::refine::values::increment_value;
use crate::refine::RunState;
use crate::vertex::{VertexFlag, VertexRef};

const PROBE_CAPACITY: usize = 10 * DEDUCE_TABLE_SIZE;

#[derive(Debug, Clone, Copy)]
struct ProbeEntry {
    vertex: VertexRef,
    key: u32,
    /// Number of first-side neighbors with this key.
    count: u16,
    /// Set once the entry was consumed (or duplicated) — a used entry can
    /// no longer produce a deduced pair.
    used: bool,
    version: u32,
}

/// Outcome of probing the table with a second-side neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// No first-side neighbor carries this key.
    Unmatched,
    /// The key exists but is ambiguous or already consumed.
    Ambiguous,
    /// Exactly one unconsumed first-side neighbor: a deduced pair.
    Pair(VertexRef),
}

#[derive(Debug)]
pub(crate) struct DeduceTable {
    entries: Vec<ProbeEntry>,
    version: u32,
    size: usize,
}

impl DeduceTable {
    pub(crate) fn new() -> Self {
        DeduceTable {
            entries: vec![
                ProbeEntry {
                    vertex: VertexRef::net(0),
                    key: 0,
                    count: 0,
                    used: false,
                    version: 0,
                };
                PROBE_CAPACITY
            ],
            version: 0,
            size: 0,
        }
    }

    /// Start a fresh round sized for `neighbors` first-side entries.
    pub(crate) fn start_round(&mut self, neighbors: usize) {
        self.size = if neighbors < 2 * DEDUCE_TABLE_SIZE / 3 - 1 {
            3 * neighbors / 2 + 1
        } else {
            DEDUCE_TABLE_SIZE
        };
        if self.version == u32::MAX {
            // Version stamp wrapped; invalidate everything the slow way.
            for entry in &mut self.entries {
                entry.version = 0;
            }
            self.version = 0;
        }
        self.version += 1;
    }

    /// Insert a first-side neighbor. Returns true when the table filled
    /// up and insertion must stop.
    pub(crate) fn insert(&mut self, vertex: VertexRef, key: u32) -> bool {
        let mut index = key as usize % self.size;
        for _ in 0..self.size {
            let entry = &mut self.entries[index];
            if entry.version != self.version {
                *entry = ProbeEntry {
                    vertex,
                    key,
                    count: 1,
                    used: false,
                    version: self.version,
                };
                return false;
            }
            if entry.key == key {
                // Duplicate key on the first side: ambiguous forever.
                entry.count += 1;
                entry.used = true;
                return false;
            }
            index = if index == self.size - 1 { 0 } else { index + 1 };
        }
        log::debug!("neighbor probe table full");
        true
    }

    /// Probe with a second-side neighbor's key.
    pub(crate) fn probe(&mut self, key: u32) -> Result<Probe> {
        let mut index = key as usize % self.size;
        for _ in 0..self.size {
            let entry = &mut self.entries[index];
            if entry.version != self.version {
                return Ok(Probe::Unmatched);
            }
            if entry.key == key {
                if entry.used {
                    return Ok(Probe::Ambiguous);
                }
                entry.used = true;
                return Ok(if entry.count == 1 {
                    Probe::Pair(entry.vertex)
                } else {
                    Probe::Ambiguous
                });
            }
            index = if index == self.size - 1 { 0 } else { index + 1 };
        }
        Err(internal("neighbor probe table scan did not terminate"))
    }

    /// First-side entries never consumed by the second side.
    fn leftovers(&self) -> Vec<VertexRef> {
        self.entries[..self.size]
            .iter()
            .filter(|e| e.version == self.version && !e.used)
            .map(|e| e.vertex)
            .collect()
    }
}

/// Try to pair the pending neighbors of a freshly matched pair
/// `(v1, v2)`. Deduced pairs get a common fresh value, are flagged as
/// matching, and are queued for the next pass. Neighbors present on only
/// one side are re-randomized so they cannot shadow their siblings.
pub(crate) fn match_neighbors(
    st: &mut RunState,
    g1: &mut Graph,
    v1: VertexRef,
    g2: &mut Graph,
    v2: VertexRef,
) -> Result<()> {
    let num_neighbors = g1.vertex(v1).num_links();
    if num_neighbors >= st.opts.deduce_neighbors {
        return Ok(());
    }

    st.deduce.start_round(num_neighbors);

    let value1 = g1.value_of(v1);
    for (n, class) in g1.neighbor_classes(v1, &st.defs) {
        if !g1.vertex(n).is_pending() {
            continue;
        }
        increment_value(g1.vertex_mut(n), value1, class);
        let key = g1.value_of(n).wrapping_add(class as u32);
        if st.deduce.insert(n, key) {
            break;
        }
    }

    let value2 = g2.value_of(v2);
    for (n, class) in g2.neighbor_classes(v2, &st.defs) {
        if !g2.vertex(n).is_pending() {
            continue;
        }
        increment_value(g2.vertex_mut(n), value2, class);
        let key = g2.value_of(n).wrapping_add(class as u32);
        match st.deduce.probe(key)? {
            Probe::Unmatched => {
                g2.vertex_mut(n).value = st.rng.next_value();
            }
            Probe::Ambiguous => {}
            Probe::Pair(partner) => {
                let fresh = st.rng.next_value();
                {
                    let v = g1.vertex_mut(partner);
                    v.value = fresh;
                    v.flag = VertexFlag::Matching;
                }
                {
                    let v = g2.vertex_mut(n);
                    v.value = fresh;
                    v.flag = VertexFlag::Matching;
                }
                g1.evaluation.push(partner);
                g2.evaluation.push(n);
            }
        }
    }

    for r in st.deduce.leftovers() {
        if g1.vertex(r).is_pending() {
            g1.vertex_mut(r).value = st.rng.next_value();
        }
    }
    Ok(())
}
