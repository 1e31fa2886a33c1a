//! The public engine API.
//!
//! A comparison is driven imperatively: register device masters, insert
//! device instances (nets are created on demand), optionally alias nets
//! and pre-match names across the graphs, then call [`Engine::execute`].
//! Results flow out through the [`EventSink`] and the returned
//! [`CompareOutcome`]. A completed engine must be [`reset`] before it
//! accepts new work; the arena stays intact in between for inspection.
//!
//! [`EventSink`]: crate::event::EventSink
//! [`reset`]: Engine::reset

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};
use crate::event::{EventSink, NullSink};
use crate::graph::Graph;
use crate::ingest::nets::Netlist;
use crate::options::{Opt, DEDUCE_TABLE_SIZE, DEFAULT_DEDUCE_NEIGHBORS};
use crate::refine::{driver, RunState};
use crate::report::report_status;
use crate::vertex::VertexKind;

/// Summary of one comparison run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOutcome {
    /// Every vertex of both graphs was uniquely matched.
    pub matched: bool,
    /// Refinement passes run.
    pub passes: u32,
    /// Suspect/bad markings accumulated (a vertex redeemed and
    /// re-condemned counts each time).
    pub errors: u32,
    /// At least one match was guessed rather than derived.
    pub forced_match: bool,
    /// Vertex pairs matched by local neighbor deduction.
    pub deduced_pairs: usize,
    /// Vertices per graph that never became unique.
    pub vertices_left: [usize; 2],
}

/// The netlist comparison engine.
pub struct Engine {
    state: RunState,
    netlists: [Netlist; 2],
    graphs: Option<[Graph; 2]>,
    run_complete: bool,
    ingestion_started: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("run_complete", &self.run_complete)
            .finish()
    }
}

impl Engine {
    /// A fresh engine with default options and a discarding sink.
    pub fn new() -> Self {
        Engine {
            state: RunState::new(Box::new(NullSink)),
            netlists: [Netlist::new("Graph1"), Netlist::new("Graph2")],
            graphs: None,
            run_complete: false,
            ingestion_started: false,
        }
    }

    /// Drop all ingested data, results, and options; keep the sink.
    pub fn reset(&mut self) {
        let sink = std::mem::replace(&mut self.state.sink, Box::new(NullSink));
        self.state = RunState::new(sink);
        self.netlists = [Netlist::new("Graph1"), Netlist::new("Graph2")];
        self.graphs = None;
        self.run_complete = false;
        self.ingestion_started = false;
    }

    /// Install the event sink receiving progress, warnings, and status
    /// reports.
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.state.sink = sink;
    }

    fn check_open(&self) -> Result<()> {
        if self.run_complete {
            Err(CompareError::NeedReinitialize)
        } else {
            Ok(())
        }
    }

    fn check_graph(&self, graph: usize) -> Result<()> {
        if graph > 1 {
            Err(CompareError::GraphOutOfRange(graph))
        } else {
            Ok(())
        }
    }

    /// Adjust one option.
    pub fn set_option(&mut self, opt: Opt) -> Result<()> {
        self.check_open()?;
        let opts = &mut self.state.opts;
        match opt {
            Opt::Trace(v) => opts.trace = v,
            Opt::IgnoreCase(v) => {
                if self.ingestion_started {
                    return Err(CompareError::IgnoreCaseTooLate);
                }
                opts.ignore_case = v;
            }
            Opt::UseSuffix(v) => opts.use_suffix = v,
            Opt::DeduceNeighbors(n) => {
                if n > DEDUCE_TABLE_SIZE {
                    let message = format!(
                        "Deduce neighborhood value too large, using default value: {}",
                        DEFAULT_DEDUCE_NEIGHBORS
                    );
                    self.state.progress(&message);
                    self.state.opts.deduce_neighbors = DEFAULT_DEDUCE_NEIGHBORS;
                } else {
                    self.state.opts.deduce_neighbors = n;
                }
            }
            Opt::ErrorCutoff(n) => opts.error_cutoff = n,
            Opt::SuspectCutoff(n) => opts.suspect_cutoff = n,
            Opt::NoProgressCutoff(n) => opts.no_progress_cutoff = n,
            Opt::FindMatch(v) => opts.find_match = v,
            Opt::NoOpt(v) => opts.no_opt = v,
            Opt::PrintZeroNets(v) => opts.print_zero_nets = v,
            Opt::NetPrintLimit(n) => opts.net_print_limit = n,
            Opt::Verbose(v) => opts.verbose = v,
        }
        Ok(())
    }

    /// Current options (read-only).
    pub fn options(&self) -> &crate::options::Options {
        &self.state.opts
    }

    /// Register a device master with its pin labels.
    pub fn define_device_master(&mut self, name: &str, pin_labels: &[&str]) -> Result<()> {
        self.check_open()?;
        let created = self.state.defs.define(name, pin_labels)?;
        if created {
            let pins = pin_labels.len();
            let message = format!(
                "Defined device master cell '{}', {} {}",
                name,
                pins,
                if pins == 1 { "pin" } else { "pins" }
            );
            self.state.progress(&message);
        }
        Ok(())
    }

    /// Instantiate a device in one graph, wiring each terminal to the
    /// named net (created on demand). `user_tag` is echoed back in status
    /// reports for this device.
    pub fn define_device_vertex(
        &mut self,
        graph: usize,
        master: &str,
        user_tag: &str,
        net_names: &[&str],
    ) -> Result<()> {
        self.check_open()?;
        self.check_graph(graph)?;
        let def = self
            .state
            .defs
            .lookup(master)
            .ok_or_else(|| CompareError::UndefinedMaster(master.to_string()))?;
        let expected = self.state.defs.def(def).num_terminals();
        if net_names.len() != expected {
            return Err(CompareError::PinCountMismatch {
                master: master.to_string(),
                expected,
                got: net_names.len(),
            });
        }
        self.ingestion_started = true;

        let ignore_case = self.state.opts.ignore_case;
        let list = &mut self.netlists[graph];
        let ids: Vec<usize> = net_names
            .iter()
            .map(|&name| {
                let key = if ignore_case {
                    name.to_ascii_lowercase()
                } else {
                    name.to_string()
                };
                list.find_or_alloc(key, name)
            })
            .collect();
        list.add_device(def, user_tag, &ids);
        Ok(())
    }

    /// Merge `aliases` into the net `canonical` within one graph.
    pub fn define_net_alias(
        &mut self,
        graph: usize,
        canonical: &str,
        aliases: &[&str],
    ) -> Result<()> {
        self.check_open()?;
        self.check_graph(graph)?;
        self.ingestion_started = true;

        let circuit = graph as u8 + 1;
        let ignore_case = self.state.opts.ignore_case;
        let equates = &mut self.state.equates;
        let list = &mut self.netlists[graph];

        let key = if ignore_case {
            canonical.to_ascii_lowercase()
        } else {
            canonical.to_string()
        };
        let canonical_id = list.find_or_alloc(key, canonical);
        for &alias in aliases {
            let key = if ignore_case {
                alias.to_ascii_lowercase()
            } else {
                alias.to_string()
            };
            let alias_id = list.find_or_alloc(key, alias);
            let mut pinned = |name: &str| {
                let key = if ignore_case {
                    name.to_ascii_lowercase()
                } else {
                    name.to_string()
                };
                equates.find(&key, circuit).is_some()
            };
            list.equate(canonical_id, alias_id, &mut pinned);
        }
        Ok(())
    }

    /// Pre-match `name1` of graph 0 with `name2` of graph 1. Both names
    /// receive the same fresh tag; duplicates warn and keep the first tag.
    pub fn define_equate(&mut self, name1: &str, name2: &str) -> Result<()> {
        self.check_open()?;
        let value = self.state.rng.next_value();
        let key1 = self.state.name_key(name1);
        if !self.state.equates.insert(key1, name1, 1, value) {
            let message = format!("Duplicate equivalence name for circuit 1: {}", name1);
            self.state.warning(&message);
        }
        let key2 = self.state.name_key(name2);
        if !self.state.equates.insert(key2, name2, 2, value) {
            let message = format!("Duplicate equivalence name for circuit 2: {}", name2);
            self.state.warning(&message);
        }
        Ok(())
    }

    /// Name a graph for events and reports.
    pub fn set_graph_name(&mut self, graph: usize, name: &str) -> Result<()> {
        self.check_open()?;
        self.check_graph(graph)?;
        self.netlists[graph].name = name.to_string();
        Ok(())
    }

    /// The graph's current name.
    pub fn graph_name(&self, graph: usize) -> Result<&str> {
        self.check_graph(graph)?;
        Ok(&self.netlists[graph].name)
    }

    /// Matched pairs of one kind after a run, as (graph 0 tag, graph 1
    /// tag) in match order. Tags are user tags for devices and net names
    /// for nets. Empty before [`execute`](Engine::execute) completes.
    pub fn matched_pairs(&self, kind: VertexKind) -> Vec<(String, String)> {
        let (g1, g2) = match &self.graphs {
            Some([g1, g2]) => (g1, g2),
            None => return Vec::new(),
        };
        let queue = match kind {
            VertexKind::Net => &g1.unique_nets,
            VertexKind::Device => &g1.unique_devices,
        };
        queue
            .iter()
            .filter_map(|r| {
                let mate = g1.vertex(r).mate?;
                Some((g1.tag_of(r), g2.tag_of(mate)))
            })
            .collect()
    }

    /// Run the comparison. Fatal errors surface here; a mismatch between
    /// the graphs does not — it is reported through the sink and in the
    /// outcome.
    pub fn execute(&mut self) -> Result<CompareOutcome> {
        self.check_open()?;
        if self.state.opts.find_match && self.state.opts.no_opt {
            return Err(CompareError::ConflictingOptions);
        }

        let st = &mut self.state;
        st.rng.reseed(1);
        st.pass = 0;
        st.pass_type = VertexKind::Net;
        st.hash_size = 0;
        st.max_hash_size = 0;
        st.errors = 0;
        st.deduced_matches = 0;
        st.forced_match = false;
        st.errors_reported = false;

        let mut graphs = {
            let RunState {
                defs, opts, sink, ..
            } = &mut *st;
            [
                Graph::build(1, &self.netlists[0], defs, opts, sink.as_mut()),
                Graph::build(2, &self.netlists[1], defs, opts, sink.as_mut()),
            ]
        };

        {
            let [g1, g2] = &mut graphs;
            driver::match_graphs(st, g1, g2)?;

            if g1.num_nets() > 0 && st.opts.find_match {
                let total = 2 * (g1.num_devices() + g1.num_nets());
                let message = format!(
                    "{} ({}%) matches were found by local matching.",
                    st.deduced_matches / 2,
                    100 * st.deduced_matches / total
                );
                st.progress(&message);
            }

            if g1.done() && g2.done() {
                let message = format!("All vertices were matched in {} passes", st.pass);
                st.progress(&message);
            } else {
                if !g1.done() {
                    report_status(st, g1)?;
                }
                if !g2.done() {
                    report_status(st, g2)?;
                }
            }
        }

        let outcome = CompareOutcome {
            matched: graphs[0].done() && graphs[1].done(),
            passes: st.pass.max(0) as u32,
            errors: st.errors,
            forced_match: st.forced_match,
            deduced_pairs: st.deduced_matches / 2,
            vertices_left: [graphs[0].vertices_left(), graphs[1].vertices_left()],
        };
        self.graphs = Some(graphs);
        self.run_complete = true;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemorySink;

    fn inverter_pair() -> Engine {
        let mut engine = Engine::new();
        engine.define_device_master("inv", &["in", "out"]).unwrap();
        for g in 0..2 {
            engine
                .define_device_vertex(g, "inv", "u1", &["a", "b"])
                .unwrap();
            engine
                .define_device_vertex(g, "inv", "u2", &["b", "a"])
                .unwrap();
        }
        engine
    }

    #[test]
    fn identical_rings_match() {
        let mut engine = inverter_pair();
        let outcome = engine.execute().unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.errors, 0);
        assert_eq!(outcome.vertices_left, [0, 0]);
    }

    #[test]
    fn completed_engine_requires_reset() {
        let mut engine = inverter_pair();
        engine.execute().unwrap();
        assert_eq!(engine.execute(), Err(CompareError::NeedReinitialize));
        assert_eq!(
            engine.define_device_master("nor2", &["a", "b", "o"]),
            Err(CompareError::NeedReinitialize)
        );
        engine.reset();
        engine.define_device_master("inv", &["in", "out"]).unwrap();
    }

    #[test]
    fn conflicting_options_are_fatal() {
        let mut engine = inverter_pair();
        engine.set_option(Opt::NoOpt(true)).unwrap();
        assert_eq!(engine.execute(), Err(CompareError::ConflictingOptions));
    }

    #[test]
    fn unknown_master_is_fatal() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.define_device_vertex(0, "ghost", "u1", &["a"]),
            Err(CompareError::UndefinedMaster("ghost".to_string()))
        );
    }

    #[test]
    fn graph_ids_are_checked() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.set_graph_name(2, "x"),
            Err(CompareError::GraphOutOfRange(2))
        );
    }

    #[test]
    fn oversize_deduce_neighbors_falls_back() {
        let sink = MemorySink::new();
        let mut engine = Engine::new();
        engine.set_sink(Box::new(sink.clone()));
        engine.set_option(Opt::DeduceNeighbors(100_000)).unwrap();
        assert_eq!(engine.options().deduce_neighbors, 31);
        assert_eq!(sink.progress_messages().len(), 1);
    }

    #[test]
    fn graph_names_round_trip() {
        let mut engine = Engine::new();
        assert_eq!(engine.graph_name(0).unwrap(), "Graph1");
        assert_eq!(engine.graph_name(1).unwrap(), "Graph2");
        engine.set_graph_name(0, "reference").unwrap();
        assert_eq!(engine.graph_name(0).unwrap(), "reference");
    }

    #[test]
    fn ignore_case_is_locked_after_ingestion() {
        let mut engine = Engine::new();
        engine.define_device_master("inv", &["in", "out"]).unwrap();
        engine
            .define_device_vertex(0, "inv", "u1", &["a", "b"])
            .unwrap();
        assert_eq!(
            engine.set_option(Opt::IgnoreCase(true)),
            Err(CompareError::IgnoreCaseTooLate)
        );
    }
}
