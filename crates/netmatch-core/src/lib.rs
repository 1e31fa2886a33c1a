//! netmatch-core - Netlist isomorphism engine
//!
//! This crate decides whether two circuits — bipartite graphs of typed,
//! multi-terminal *devices* and connecting *nets* — are isomorphic under a
//! terminal-class equivariant matching, and classifies every vertex
//! (matched, suspect, or bad) for diagnostics when they are not.
//!
//! # Overview
//!
//! The core is an iterative **refinement engine**: every vertex carries a
//! 32-bit value summarizing its neighborhood, recomputed pass by pass from
//! neighbor values weighted by terminal class. Values are bucketed per
//! graph; a value unique on both sides pairs the two vertices, and the
//! pair's neighbors are deduced, queued, and refined in turn. When
//! refinement stalls on genuine symmetry, the engine guesses a pair from
//! the smallest ambiguous section and restarts.
//!
//! # Quick Start
//!
//! ```rust
//! use netmatch_core::Engine;
//!
//! let mut engine = Engine::new();
//! engine.define_device_master("inv", &["in", "out"])?;
//!
//! // Two identical rings of two inverters.
//! for graph in 0..2 {
//!     engine.define_device_vertex(graph, "inv", "u1", &["a", "b"])?;
//!     engine.define_device_vertex(graph, "inv", "u2", &["b", "a"])?;
//! }
//!
//! let outcome = engine.execute()?;
//! assert!(outcome.matched);
//! # Ok::<(), netmatch_core::CompareError>(())
//! ```
//!
//! # Events
//!
//! Progress, warnings, and the final per-vertex classification flow
//! through an [`EventSink`] installed with [`Engine::set_sink`]; the
//! engine itself never touches stdout or the filesystem. Runs are
//! deterministic: identical inputs and options produce identical event
//! sequences.

pub mod engine;
pub mod error;
pub mod event;
pub mod options;
pub mod vertex;

mod graph;
mod ingest;
mod queue;
mod refine;
mod report;
mod rng;

pub use engine::{CompareOutcome, Engine};
pub use error::{CompareError, Result, MAX_DEVICE_MASTERS};
pub use event::{Event, EventSink, MemorySink, NullSink, ReportKind, StatusReport};
pub use options::{Opt, Options, DEDUCE_TABLE_SIZE, DEFAULT_DEDUCE_NEIGHBORS};
pub use vertex::{TermClass, VertexKind};
