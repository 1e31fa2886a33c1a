//! Ingestion: everything that happens before the graphs are built.
//!
//! Device masters, per-graph net tables with alias forwarding, and the
//! cross-graph equivalence table. Ingestion is linear; the builder in
//! [`crate::graph`] materializes vertex arenas from it once matching
//! starts.

pub(crate) mod equate;
pub(crate) mod masters;
pub(crate) mod nets;
