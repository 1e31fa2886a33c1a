//! Per-graph net table and device instances.
//!
//! Nets are created on demand when a device terminal names them. Aliasing
//! merges one net into another: the alias keeps a forwarding reference,
//! its connections move to the canonical net, and every later net's dense
//! index shifts down by one so the surviving indices stay dense. Alias
//! chains are short in practice and are walked, not compressed.

use std::collections::HashMap;

/// One terminal attachment recorded during ingestion. The terminal class
/// is looked up from the master when the graph is built.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawConn {
    pub device: u32,
    pub terminal: u16,
}

/// A net as the ingestion API sees it.
#[derive(Debug, Clone)]
pub(crate) struct RawNet {
    pub name: String,
    /// Dense index of the net, or -1 once it has been aliased away.
    pub index: i32,
    pub conns: Vec<RawConn>,
    /// Forwarding reference; set exactly when `index == -1`.
    pub alias_of: Option<usize>,
}

/// A device instance as the ingestion API sees it.
#[derive(Debug, Clone)]
pub(crate) struct RawDevice {
    /// Master definition index.
    pub def: usize,
    /// Opaque user tag reported back in status events.
    pub tag: String,
    /// Net table id per terminal, as resolved at insertion time. Aliases
    /// created later are chased again at graph build.
    pub nets: Vec<usize>,
}

/// Everything ingested for one graph before it is built.
#[derive(Debug, Clone)]
pub(crate) struct Netlist {
    pub name: String,
    nets: Vec<RawNet>,
    by_name: HashMap<String, usize>,
    next_index: i32,
    pub devices: Vec<RawDevice>,
}

impl Netlist {
    pub(crate) fn new(name: &str) -> Self {
        Netlist {
            name: name.to_string(),
            nets: Vec::new(),
            by_name: HashMap::new(),
            next_index: 0,
            devices: Vec::new(),
        }
    }

    /// Number of live (unaliased) nets.
    pub(crate) fn num_nets(&self) -> usize {
        self.next_index as usize
    }

    pub(crate) fn raw_nets(&self) -> &[RawNet] {
        &self.nets
    }

    /// Chase the alias chain to the net that actually owns connections.
    pub(crate) fn resolve(&self, mut id: usize) -> usize {
        while self.nets[id].index == -1 {
            id = self.nets[id].alias_of.expect("aliased net has a target");
        }
        id
    }

    /// Dense index of the net `id` forwards to.
    pub(crate) fn dense_index(&self, id: usize) -> usize {
        self.nets[self.resolve(id)].index as usize
    }

    /// Find a net or create it with the next dense index.
    pub(crate) fn find_or_alloc(&mut self, key: String, name: &str) -> usize {
        if let Some(&id) = self.by_name.get(&key) {
            return self.resolve(id);
        }
        let id = self.nets.len();
        self.nets.push(RawNet {
            name: name.to_string(),
            index: self.next_index,
            conns: Vec::new(),
            alias_of: None,
        });
        self.next_index += 1;
        self.by_name.insert(key, id);
        id
    }

    /// Merge `alias` into `canonical`. `prefer_canonical` reports whether a
    /// net name is pinned by the equivalence table; a pinned alias swaps
    /// roles so the user-visible name survives.
    pub(crate) fn equate(
        &mut self,
        canonical: usize,
        alias: usize,
        prefer_canonical: &mut dyn FnMut(&str) -> bool,
    ) {
        let mut keep = self.resolve(canonical);
        let mut gone = self.resolve(alias);
        if keep == gone {
            return;
        }
        if prefer_canonical(&self.nets[gone].name) {
            std::mem::swap(&mut keep, &mut gone);
        }

        let moved = std::mem::take(&mut self.nets[gone].conns);
        self.nets[keep].conns.extend(moved);

        let freed_index = self.nets[gone].index;
        self.nets[gone].index = -1;
        self.nets[gone].alias_of = Some(keep);
        for net in &mut self.nets {
            if net.index > freed_index {
                net.index -= 1;
            }
        }
        self.next_index -= 1;
    }

    /// Record a device instance and attach each terminal to its net.
    pub(crate) fn add_device(&mut self, def: usize, tag: &str, net_ids: &[usize]) {
        let device = self.devices.len() as u32;
        for (terminal, &net_id) in net_ids.iter().enumerate() {
            let real = self.resolve(net_id);
            self.nets[real].conns.push(RawConn {
                device,
                terminal: terminal as u16,
            });
        }
        self.devices.push(RawDevice {
            def,
            tag: tag.to_string(),
            nets: net_ids.to_vec(),
        });
    }
}
