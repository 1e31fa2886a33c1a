//! Vertex model shared by both circuit graphs.
//!
//! A vertex is either a device (typed, with ordered terminals) or a net
//! (hyperedge connecting one terminal of each touching device). Both kinds
//! share a header — name, hash value, status flag, pass stamp, cross-graph
//! mate — and carry a kind-specific neighbor list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal class: a small integer canonicalizing equivalent terminals of a
/// device master (two symmetric inputs get the same class).
pub type TermClass = u16;

/// The two vertex kinds of the bipartite circuit graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    /// A device instance with typed, ordered terminals.
    Device,
    /// A net connecting device terminals.
    Net,
}

impl VertexKind {
    /// The other kind. Refinement passes alternate between the two.
    pub(crate) fn toggled(self) -> Self {
        match self {
            VertexKind::Device => VertexKind::Net,
            VertexKind::Net => VertexKind::Device,
        }
    }

    pub(crate) fn noun(self) -> &'static str {
        match self {
            VertexKind::Device => "devices",
            VertexKind::Net => "nets",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKind::Device => write!(f, "device"),
            VertexKind::Net => write!(f, "net"),
        }
    }
}

/// Classification state of a vertex. Progresses monotonically to `Unique`
/// on success or `Bad` on cross-graph disagreement; `Suspect` is redeemable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexFlag {
    /// Not yet classified; participates in refinement.
    Pending,
    /// Distinct value within its graph, matched (or matchable) across graphs.
    Unique,
    /// Ambiguous across graphs; reset to pending when refinement stalls.
    Suspect,
    /// No counterpart across graphs.
    Bad,
    /// Locally deduced pair; becomes unique on the next pass.
    Matching,
    /// Removed by the builder (never enters refinement).
    Deleted,
}

/// Handle to a vertex inside one graph's arenas. The graph side is implied
/// by context; cross-graph mates always point into the other graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VertexRef {
    pub kind: VertexKind,
    pub index: u32,
}

impl VertexRef {
    pub(crate) fn device(index: usize) -> Self {
        VertexRef {
            kind: VertexKind::Device,
            index: index as u32,
        }
    }

    pub(crate) fn net(index: usize) -> Self {
        VertexRef {
            kind: VertexKind::Net,
            index: index as u32,
        }
    }
}

/// A net's view of one attached device terminal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeviceConn {
    /// Index of the device vertex.
    pub device: u32,
    /// Terminal index on that device.
    pub terminal: u16,
    /// Terminal class of that terminal, copied from the master definition.
    pub class: TermClass,
}

/// Kind-specific neighbor payload.
#[derive(Debug, Clone)]
pub(crate) enum Links {
    /// Device: master definition index plus one net per terminal, in
    /// terminal order.
    Device { def: usize, nets: Vec<u32> },
    /// Net: attached device terminals, each with its terminal class.
    Net { conns: Vec<DeviceConn> },
}

/// One device or net of a circuit graph.
#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    /// Net name, or `"*"` for (synthetic) device names.
    pub name: String,
    /// Opaque user tag supplied at device insertion; reported back in
    /// status events. Empty for nets.
    pub tag: String,
    /// Current color: a 32-bit hash of the neighborhood up to the current
    /// refinement depth.
    pub value: u32,
    /// Pass in which the vertex was last queued (or became unique);
    /// `-1` before the first pass. Guards double insertion.
    pub pass: i32,
    pub flag: VertexFlag,
    /// Size of the non-singleton equivalence class the vertex lies in.
    pub section_size: u32,
    /// Cross-graph pair, set when matched. Non-owning.
    pub mate: Option<VertexRef>,
    pub links: Links,
}

impl Vertex {
    pub(crate) fn kind(&self) -> VertexKind {
        match self.links {
            Links::Device { .. } => VertexKind::Device,
            Links::Net { .. } => VertexKind::Net,
        }
    }

    /// Number of neighbors: terminals for a device, connections for a net.
    pub(crate) fn num_links(&self) -> usize {
        match &self.links {
            Links::Device { nets, .. } => nets.len(),
            Links::Net { conns } => conns.len(),
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.flag == VertexFlag::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_toggles() {
        assert_eq!(VertexKind::Device.toggled(), VertexKind::Net);
        assert_eq!(VertexKind::Net.toggled(), VertexKind::Device);
    }

    #[test]
    fn vertex_kind_follows_links() {
        let v = Vertex {
            name: "*".to_string(),
            tag: String::new(),
            value: 0,
            pass: -1,
            flag: VertexFlag::Pending,
            section_size: 0,
            mate: None,
            links: Links::Device {
                def: 0,
                nets: vec![0, 1],
            },
        };
        assert_eq!(v.kind(), VertexKind::Device);
        assert_eq!(v.num_links(), 2);
    }
}
