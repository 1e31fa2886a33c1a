//! The refinement engine.
//!
//! Matching alternates passes over nets and devices. Each pass recomputes
//! vertex colors from neighbor colors, buckets them, extracts vertices
//! whose color is unique on their side, and matches those across the two
//! graphs in value order. When pure refinement stalls, neighbor deduction
//! and finally forced (guessed) matches keep it moving.

pub(crate) mod buckets;
pub(crate) mod deduce;
pub(crate) mod driver;
pub(crate) mod guess;
pub(crate) mod sections;
pub(crate) mod values;

use crate::event::EventSink;
use crate::ingest::equate::EquateTable;
use crate::ingest::masters::MasterTable;
use crate::options::Options;
use crate::rng::ValueRng;
use crate::vertex::VertexKind;
use self::deduce::DeduceTable;

/// Elements per bucket aimed for when sizing the value hash table.
pub(crate) const HASH_RATIO: usize = 4;

/// Everything a pass needs besides the two graphs themselves. Keeping
/// this separate from the graphs lets a pass borrow one or both graphs
/// mutably alongside the shared state.
pub(crate) struct RunState {
    pub opts: Options,
    pub sink: Box<dyn EventSink>,
    pub rng: ValueRng,
    pub defs: MasterTable,
    pub equates: EquateTable,
    pub deduce: DeduceTable,
    /// Current pass number; also the stamp written into vertex `pass`
    /// fields.
    pub pass: i32,
    /// Kind being recharacterized this pass.
    pub pass_type: VertexKind,
    /// Bucket count shared by both graphs for the current pass; 0 means
    /// "recompute from the first graph entered".
    pub hash_size: usize,
    pub max_hash_size: usize,
    /// Suspect/bad markings so far.
    pub errors: u32,
    /// Vertices matched through local neighbor deduction (both graphs).
    pub deduced_matches: usize,
    pub forced_match: bool,
    /// The "circuits are different" notice fires once per run.
    pub errors_reported: bool,
}

impl std::fmt::Debug for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunState")
            .field("pass", &self.pass)
            .field("pass_type", &self.pass_type)
            .field("hash_size", &self.hash_size)
            .field("errors", &self.errors)
            .field("forced_match", &self.forced_match)
            .finish()
    }
}

impl RunState {
    pub(crate) fn new(sink: Box<dyn EventSink>) -> Self {
        RunState {
            opts: Options::default(),
            sink,
            rng: ValueRng::new(1),
            defs: MasterTable::new(),
            equates: EquateTable::new(),
            deduce: DeduceTable::new(),
            pass: 0,
            pass_type: VertexKind::Net,
            hash_size: 0,
            max_hash_size: 0,
            errors: 0,
            deduced_matches: 0,
            forced_match: false,
            errors_reported: false,
        }
    }

    /// Normalize a net or equivalence name for the configured case mode.
    pub(crate) fn name_key(&self, name: &str) -> String {
        if self.opts.ignore_case {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub(crate) fn progress(&mut self, message: &str) {
        self.sink.progress(message);
    }

    pub(crate) fn warning(&mut self, message: &str) {
        self.sink.warning(message);
    }
}
