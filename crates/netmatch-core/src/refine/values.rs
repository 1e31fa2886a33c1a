//! Vertex value assignment.
//!
//! The initial value seeds a vertex from its local shape alone: the
//! definition index for a device, the connection count for a net, both
//! scrambled so that counts close together land far apart. Equated names
//! start from their shared tag instead and are queued as already
//! matching. Recomputation then folds neighbor values in, weighted by a
//! prime per terminal class, with explicit u32 wraparound.

use crate::graph::Graph;
use crate::refine::RunState;
use crate::rng::{prime_factor, prime_factor2};
use crate::vertex::{Links, TermClass, Vertex, VertexFlag, VertexRef};

fn scramble_device(x: u32) -> u32 {
    x.wrapping_mul(1_103_515_245).wrapping_add(12_345)
}

fn scramble_net(x: u32) -> u32 {
    x.wrapping_mul(1_015_351_425).wrapping_add(12_435)
}

/// Seed one vertex. A name found in the equivalence table takes its tag
/// and is flagged as matching.
pub(crate) fn assign_initial_value(st: &mut RunState, circuit: u8, vertex: &mut Vertex) {
    let key = st.name_key(&vertex.name);
    if let Some(tag) = st.equates.find(&key, circuit) {
        vertex.value = tag;
        vertex.flag = VertexFlag::Matching;
        return;
    }
    vertex.value = match &vertex.links {
        Links::Device { def, .. } => scramble_device(*def as u32 + 1),
        Links::Net { conns } => scramble_net(conns.len() as u32),
    };
}

/// Seed every pending device. Devices never start as matching, even when
/// their (synthetic) name carries an equivalence tag.
pub(crate) fn initial_device_values(st: &mut RunState, g: &mut Graph) {
    let number = g.number;
    for i in 0..g.pending_devices.len() {
        let r = g.pending_devices[i];
        let v = g.vertex_mut(r);
        v.pass = -1;
        assign_initial_value(st, number, v);
        v.flag = VertexFlag::Pending;
    }
}

/// Seed every pending net. Equated nets enter the evaluation queue so the
/// first pass can match them locally.
pub(crate) fn initial_net_values(st: &mut RunState, g: &mut Graph) {
    let number = g.number;
    for i in 0..g.pending_nets.len() {
        let r = g.pending_nets[i];
        let v = g.vertex_mut(r);
        v.flag = VertexFlag::Pending;
        v.pass = -1;
        assign_initial_value(st, number, v);
        if g.vertex(r).flag == VertexFlag::Matching {
            g.vertex_mut(r).pass = 0;
            g.evaluation.push(r);
        }
    }
}

/// Fold the neighbor values into a vertex. For a device the weight is the
/// prime of its own terminal class per terminal; for a net it is the
/// second prime table over the class of the device terminal touching it.
pub(crate) fn compute_value(st: &RunState, g: &mut Graph, r: VertexRef) {
    let added = match &g.vertex(r).links {
        Links::Device { def, nets } => {
            let classes = &st.defs.def(*def).terminals;
            nets.iter()
                .enumerate()
                .map(|(i, &n)| {
                    g.nets[n as usize]
                        .value
                        .wrapping_mul(prime_factor(classes[i]))
                })
                .fold(0u32, u32::wrapping_add)
        }
        Links::Net { conns } => conns
            .iter()
            .map(|c| {
                g.devices[c.device as usize]
                    .value
                    .wrapping_mul(prime_factor2(c.class))
            })
            .fold(0u32, u32::wrapping_add),
    };
    let v = g.vertex_mut(r);
    v.value = v.value.wrapping_add(added);
}

/// Mix a matched vertex's value into one neighbor, weighted by class.
pub(crate) fn increment_value(vertex: &mut Vertex, value: u32, class: TermClass) {
    vertex.value = vertex
        .value
        .wrapping_add(value.wrapping_mul(prime_factor(class)));
}
