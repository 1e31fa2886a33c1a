//! Built graphs: vertex arenas, status queues, and the value hash table.
//!
//! The builder turns one ingested netlist into dense device and net
//! arenas, back-links every net to the device terminals touching it
//! (annotated with the terminal class), and drops nets with no
//! connections. After every pass each vertex sits in exactly one of
//! pending / suspect / bad / unique, and the conservation checks below
//! verify that nothing was lost or gained.

use crate::event::EventSink;
use crate::ingest::masters::MasterTable;
use crate::ingest::nets::Netlist;
use crate::options::Options;
use crate::queue::VertexQueue;
use crate::vertex::{DeviceConn, Links, Vertex, VertexFlag, VertexKind, VertexRef};

/// One bucket of the value hash table.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bucket {
    /// Sum of the values of all non-unique entries.
    pub sum: u32,
    /// Smallest non-singleton section size seen, `u32::MAX` when unknown.
    pub min_part: u32,
    pub unique: VertexQueue,
    pub not_unique: VertexQueue,
    pub overflow: VertexQueue,
}

impl Bucket {
    pub(crate) fn reset(&mut self) {
        self.sum = 0;
        self.min_part = u32::MAX;
        self.unique.clear();
        self.not_unique.clear();
        self.overflow.clear();
    }
}

/// One side of the comparison.
#[derive(Debug)]
pub(crate) struct Graph {
    /// 1 or 2; also the circuit id in the equivalence table.
    pub number: u8,
    pub name: String,
    pub devices: Vec<Vertex>,
    pub nets: Vec<Vertex>,
    /// Compacted working set of still-pending vertices.
    pub pending_devices: Vec<VertexRef>,
    pub pending_nets: Vec<VertexRef>,
    /// Vertices that became unique in the current pass.
    pub new_uniques: VertexQueue,
    /// Vertices to recompute next pass.
    pub evaluation: VertexQueue,
    pub unique_devices: VertexQueue,
    pub unique_nets: VertexQueue,
    pub suspect_devices: VertexQueue,
    pub suspect_nets: VertexQueue,
    pub bad_devices: VertexQueue,
    pub bad_nets: VertexQueue,
    pub buckets: Vec<Bucket>,
    /// Sum of all bucket sums for the current pass.
    pub check_sum: u32,
}

impl Graph {
    /// Materialize a graph from an ingested netlist.
    pub(crate) fn build(
        number: u8,
        netlist: &Netlist,
        defs: &MasterTable,
        opts: &Options,
        sink: &mut dyn EventSink,
    ) -> Graph {
        sink.progress(&format!("Graph \"{}\"", netlist.name));

        let mut devices: Vec<Vertex> = netlist
            .devices
            .iter()
            .map(|raw| Vertex {
                name: "*".to_string(),
                tag: raw.tag.clone(),
                value: 0,
                pass: -1,
                flag: VertexFlag::Pending,
                section_size: 0,
                mate: None,
                links: Links::Device {
                    def: raw.def,
                    nets: raw
                        .nets
                        .iter()
                        .map(|&id| netlist.dense_index(id) as u32)
                        .collect(),
                },
            })
            .collect();

        let mut nets: Vec<Vertex> = Vec::with_capacity(netlist.num_nets());
        for raw in netlist.raw_nets() {
            if raw.index < 0 {
                sink.progress(&format!("Aliased net: {}", raw.name));
                continue;
            }
            debug_assert_eq!(raw.index as usize, nets.len());
            nets.push(Vertex {
                name: raw.name.clone(),
                tag: String::new(),
                value: 0,
                pass: -1,
                flag: VertexFlag::Pending,
                section_size: 0,
                mate: None,
                links: Links::Net {
                    conns: raw
                        .conns
                        .iter()
                        .map(|c| DeviceConn {
                            device: c.device,
                            terminal: c.terminal,
                            class: defs.def(netlist.devices[c.device as usize].def).terminals
                                [c.terminal as usize],
                        })
                        .collect(),
                },
            });
        }

        // Drop nets nothing connects to. The last net slides into the
        // hole, so the device back-references to it must be repointed.
        let mut i = 0;
        while i < nets.len() {
            if nets[i].num_links() > 0 {
                i += 1;
                continue;
            }
            if opts.print_zero_nets {
                sink.progress(&format!("Ignoring {} -- no connection.", nets[i].name));
            }
            nets[i].flag = VertexFlag::Deleted;
            let last = nets.len() - 1;
            if i != last {
                if let Links::Net { conns } = &nets[last].links {
                    let moved: Vec<u32> = conns.iter().map(|c| c.device).collect();
                    for device in moved {
                        if let Links::Device { nets: dev_nets, .. } =
                            &mut devices[device as usize].links
                        {
                            for slot in dev_nets.iter_mut() {
                                if *slot == last as u32 {
                                    *slot = i as u32;
                                }
                            }
                        }
                    }
                }
            }
            nets.swap_remove(i);
        }

        let pending_devices: Vec<VertexRef> = devices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.flag != VertexFlag::Deleted)
            .map(|(i, _)| VertexRef::device(i))
            .collect();
        let pending_nets: Vec<VertexRef> = (0..nets.len()).map(VertexRef::net).collect();

        sink.progress(&format!("Devices count: {}", devices.len()));
        sink.progress(&format!("Nets count: {}", nets.len()));

        Graph {
            number,
            name: netlist.name.clone(),
            devices,
            nets,
            pending_devices,
            pending_nets,
            new_uniques: VertexQueue::new(),
            evaluation: VertexQueue::new(),
            unique_devices: VertexQueue::new(),
            unique_nets: VertexQueue::new(),
            suspect_devices: VertexQueue::new(),
            suspect_nets: VertexQueue::new(),
            bad_devices: VertexQueue::new(),
            bad_nets: VertexQueue::new(),
            buckets: Vec::new(),
            check_sum: 0,
        }
    }

    pub(crate) fn vertex(&self, r: VertexRef) -> &Vertex {
        let v = match r.kind {
            VertexKind::Device => &self.devices[r.index as usize],
            VertexKind::Net => &self.nets[r.index as usize],
        };
        debug_assert_eq!(v.kind(), r.kind);
        v
    }

    pub(crate) fn vertex_mut(&mut self, r: VertexRef) -> &mut Vertex {
        match r.kind {
            VertexKind::Device => &mut self.devices[r.index as usize],
            VertexKind::Net => &mut self.nets[r.index as usize],
        }
    }

    pub(crate) fn value_of(&self, r: VertexRef) -> u32 {
        self.vertex(r).value
    }

    pub(crate) fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub(crate) fn num_nets(&self) -> usize {
        self.nets.len()
    }

    /// Neighbors of a vertex with the terminal class of each link.
    pub(crate) fn neighbor_classes(
        &self,
        r: VertexRef,
        defs: &MasterTable,
    ) -> Vec<(VertexRef, crate::vertex::TermClass)> {
        match &self.vertex(r).links {
            Links::Device { def, nets } => {
                let classes = &defs.def(*def).terminals;
                nets.iter()
                    .enumerate()
                    .map(|(i, &n)| (VertexRef::net(n as usize), classes[i]))
                    .collect()
            }
            Links::Net { conns } => conns
                .iter()
                .map(|c| (VertexRef::device(c.device as usize), c.class))
                .collect(),
        }
    }

    pub(crate) fn pending_mut(&mut self, kind: VertexKind) -> &mut Vec<VertexRef> {
        match kind {
            VertexKind::Device => &mut self.pending_devices,
            VertexKind::Net => &mut self.pending_nets,
        }
    }

    pub(crate) fn unique_queue_mut(&mut self, kind: VertexKind) -> &mut VertexQueue {
        match kind {
            VertexKind::Device => &mut self.unique_devices,
            VertexKind::Net => &mut self.unique_nets,
        }
    }

    pub(crate) fn suspect_queue_mut(&mut self, kind: VertexKind) -> &mut VertexQueue {
        match kind {
            VertexKind::Device => &mut self.suspect_devices,
            VertexKind::Net => &mut self.suspect_nets,
        }
    }

    pub(crate) fn bad_queue_mut(&mut self, kind: VertexKind) -> &mut VertexQueue {
        match kind {
            VertexKind::Device => &mut self.bad_devices,
            VertexKind::Net => &mut self.bad_nets,
        }
    }

    /// Conservation identity for nets.
    pub(crate) fn nets_clean(&self) -> bool {
        self.num_nets()
            == self.pending_nets.len()
                + self.suspect_nets.len()
                + self.bad_nets.len()
                + self.unique_nets.len()
    }

    /// Conservation identity for devices.
    pub(crate) fn devices_clean(&self) -> bool {
        self.num_devices()
            == self.pending_devices.len()
                + self.suspect_devices.len()
                + self.bad_devices.len()
                + self.unique_devices.len()
    }

    pub(crate) fn done_nets(&self) -> bool {
        self.unique_nets.len() == self.num_nets()
    }

    pub(crate) fn done_devices(&self) -> bool {
        self.unique_devices.len() == self.num_devices()
    }

    /// Whether every vertex has been uniquely labelled.
    pub(crate) fn done(&self) -> bool {
        self.done_nets() && self.done_devices()
    }

    /// Vertices not yet uniquely labelled.
    pub(crate) fn vertices_left(&self) -> usize {
        (self.num_devices() - self.unique_devices.len()) + (self.num_nets() - self.unique_nets.len())
    }

    /// Reporting tag for a vertex: the user tag for devices, the net name
    /// for nets.
    pub(crate) fn tag_of(&self, r: VertexRef) -> String {
        let v = self.vertex(r);
        match r.kind {
            VertexKind::Device => v.tag.clone(),
            VertexKind::Net => v.name.clone(),
        }
    }

    /// Trace description of a vertex. With `verbose`, small nets also
    /// list their device connections (bounded by `net_print_limit`).
    pub(crate) fn describe(&self, r: VertexRef, opts: &Options) -> String {
        let v = self.vertex(r);
        let mut out = format!(
            "{} {} value {} flag {:?}",
            r.kind,
            self.tag_of(r),
            v.value,
            v.flag
        );
        if opts.verbose {
            if let Links::Net { conns } = &v.links {
                if conns.len() <= opts.net_print_limit {
                    let list: Vec<String> = conns
                        .iter()
                        .map(|c| format!("{}:{}", self.devices[c.device as usize].tag, c.terminal))
                        .collect();
                    out.push_str(&format!(" [{}]", list.join(", ")));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NullSink;

    fn build_simple() -> (Graph, MasterTable) {
        let mut defs = MasterTable::new();
        defs.define("inv", &["in", "out"]).unwrap();
        let mut list = Netlist::new("g");
        let a = list.find_or_alloc("a".to_string(), "a");
        let b = list.find_or_alloc("b".to_string(), "b");
        list.add_device(0, "u1", &[a, b]);
        list.add_device(0, "u2", &[b, a]);
        let graph = Graph::build(1, &list, &defs, &Options::default(), &mut NullSink);
        (graph, defs)
    }

    #[test]
    fn builder_wires_both_directions() {
        let (graph, defs) = build_simple();
        assert_eq!(graph.num_devices(), 2);
        assert_eq!(graph.num_nets(), 2);

        // u1 drives a→b; net a sees u1 terminal 0 and u2 terminal 1.
        let net_a = graph.vertex(VertexRef::net(0));
        match &net_a.links {
            Links::Net { conns } => {
                assert_eq!(conns.len(), 2);
                assert_eq!(conns[0].device, 0);
                assert_eq!(conns[0].terminal, 0);
                assert_eq!(conns[1].device, 1);
                assert_eq!(conns[1].terminal, 1);
            }
            _ => panic!("expected net links"),
        }
        let neighbors = graph.neighbor_classes(VertexRef::device(0), &defs);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].0, VertexRef::net(0));
    }

    #[test]
    fn zero_connection_nets_are_dropped() {
        let mut defs = MasterTable::new();
        defs.define("inv", &["in", "out"]).unwrap();
        let mut list = Netlist::new("g");
        let a = list.find_or_alloc("a".to_string(), "a");
        let _dangling = list.find_or_alloc("nc".to_string(), "nc");
        let b = list.find_or_alloc("b".to_string(), "b");
        list.add_device(0, "u1", &[a, b]);

        let graph = Graph::build(1, &list, &defs, &Options::default(), &mut NullSink);
        assert_eq!(graph.num_nets(), 2);
        assert!(graph.nets.iter().all(|n| n.name != "nc"));
        // The device still points at valid net slots after the swap.
        for v in &graph.devices {
            if let Links::Device { nets, .. } = &v.links {
                for &n in nets {
                    assert!((n as usize) < graph.num_nets());
                    let net = graph.vertex(VertexRef::net(n as usize));
                    assert!(net.num_links() > 0);
                }
            }
        }
        assert!(graph.nets_clean());
        assert!(graph.devices_clean());
    }

    #[test]
    fn conservation_holds_after_build() {
        let (graph, _) = build_simple();
        assert!(graph.nets_clean());
        assert!(graph.devices_clean());
        assert_eq!(graph.vertices_left(), 4);
        assert!(!graph.done());
    }
}
