//! Cross-graph equivalence table.
//!
//! `define_equate(a, b)` pre-matches net `a` of circuit 1 with net `b` of
//! circuit 2 by giving both names the same tag. During initial value
//! assignment a vertex whose name carries a tag starts from that tag
//! instead of its structural seed, so pre-matched nets land in the same
//! bucket on the first pass.

use std::collections::HashMap;

#[derive(Debug, Clone)]
struct EquateEntry {
    /// Display name as the caller wrote it (keys may be case folded).
    name: String,
    value: u32,
    used: bool,
}

/// Mapping (name key, circuit) → tag.
#[derive(Debug, Clone, Default)]
pub(crate) struct EquateTable {
    entries: HashMap<(String, u8), EquateEntry>,
}

impl EquateTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a name under a circuit. Returns false on duplicate
    /// (the caller warns; the first tag stands).
    pub(crate) fn insert(&mut self, key: String, name: &str, circuit: u8, value: u32) -> bool {
        match self.entries.entry((key, circuit)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(EquateEntry {
                    name: name.to_string(),
                    value,
                    used: false,
                });
                true
            }
        }
    }

    /// Look up the tag for a name in a circuit, marking the entry used.
    pub(crate) fn find(&mut self, key: &str, circuit: u8) -> Option<u32> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries
            .get_mut(&(key.to_string(), circuit))
            .map(|entry| {
                entry.used = true;
                entry.value
            })
    }

    /// Names that were never looked up, as (display name, circuit), in a
    /// deterministic order.
    pub(crate) fn unused(&self) -> Vec<(String, u8)> {
        let mut names: Vec<(String, u8)> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.used)
            .map(|((_, circuit), entry)| (entry.name.clone(), *circuit))
            .collect();
        names.sort();
        names
    }
}
