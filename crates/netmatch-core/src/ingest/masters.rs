//! Device master registry.
//!
//! A master defines the terminal shape of a device type. Terminal labels
//! that compare equal (case folded) collapse to one terminal class, so two
//! symmetric inputs of a nand gate are interchangeable during matching.
//! Master names and pin labels always fold case, independently of the
//! `ignore_case` option, which governs net names only.

use crate::error::{CompareError, Result, MAX_DEVICE_MASTERS};
use crate::vertex::TermClass;

/// One registered device type.
#[derive(Debug, Clone)]
pub(crate) struct DeviceDef {
    pub name: String,
    /// Terminal class per terminal, in terminal order.
    pub terminals: Vec<TermClass>,
}

impl DeviceDef {
    pub(crate) fn num_terminals(&self) -> usize {
        self.terminals.len()
    }
}

/// Registry of device masters. The definition index doubles as the device
/// type identifier inside the graphs.
#[derive(Debug, Clone, Default)]
pub(crate) struct MasterTable {
    defs: Vec<DeviceDef>,
}

/// Assign a class to every pin label: the index of the first label equal
/// to it (case folded). Labels that appear once get their own class;
/// repeated labels share the class of the first occurrence.
fn canonical_classes(labels: &[&str]) -> Vec<TermClass> {
    let mut classes = Vec::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        let class = labels[..i]
            .iter()
            .position(|prior| prior.eq_ignore_ascii_case(label))
            .unwrap_or(i);
        classes.push(class as TermClass);
    }
    classes
}

impl MasterTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a master. Re-registering with the identical shape is a
    /// no-op; any difference is fatal. Returns whether a new definition
    /// was created.
    pub(crate) fn define(&mut self, name: &str, pin_labels: &[&str]) -> Result<bool> {
        if self.defs.len() >= MAX_DEVICE_MASTERS {
            return Err(CompareError::TooManyMasters);
        }
        if name.len() < 2 {
            return Err(CompareError::MasterNameTooShort(name.to_string()));
        }
        if pin_labels.is_empty() {
            return Err(CompareError::MasterWithoutPins(name.to_string()));
        }

        let classes = canonical_classes(pin_labels);

        if let Some(existing) = self.lookup(name) {
            let def = &self.defs[existing];
            if def.num_terminals() != classes.len() {
                return Err(CompareError::InconsistentPinCount(name.to_string()));
            }
            if def.terminals != classes {
                return Err(CompareError::InconsistentPinNames(name.to_string()));
            }
            return Ok(false);
        }

        self.defs.push(DeviceDef {
            name: name.to_string(),
            terminals: classes,
        });
        Ok(true)
    }

    /// Find a definition index by master name, case folded.
    pub(crate) fn lookup(&self, name: &str) -> Option<usize> {
        self.defs
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn def(&self, index: usize) -> &DeviceDef {
        &self.defs[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_labels_get_index_classes() {
        assert_eq!(canonical_classes(&["a", "b", "c"]), vec![0, 1, 2]);
    }

    #[test]
    fn equal_labels_share_a_class() {
        // Symmetric inputs collapse onto the first occurrence.
        assert_eq!(canonical_classes(&["in", "in", "out"]), vec![0, 0, 2]);
        assert_eq!(canonical_classes(&["a", "b", "A", "B"]), vec![0, 1, 0, 1]);
    }

    #[test]
    fn define_and_lookup_fold_case() {
        let mut table = MasterTable::new();
        assert!(table.define("NAND2", &["a", "b", "out"]).unwrap());
        assert_eq!(table.lookup("nand2"), Some(0));
        assert_eq!(table.def(0).num_terminals(), 3);
    }

    #[test]
    fn identical_redefinition_is_idempotent() {
        let mut table = MasterTable::new();
        table.define("inv", &["in", "out"]).unwrap();
        assert!(!table.define("INV", &["IN", "OUT"]).unwrap());
        assert_eq!(table.lookup("inv"), Some(0));
    }

    #[test]
    fn mismatched_redefinition_fails() {
        let mut table = MasterTable::new();
        table.define("inv", &["in", "out"]).unwrap();
        assert_eq!(
            table.define("inv", &["in", "out", "en"]),
            Err(CompareError::InconsistentPinCount("inv".to_string()))
        );
        assert_eq!(
            table.define("inv", &["in", "in"]),
            Err(CompareError::InconsistentPinNames("inv".to_string()))
        );
    }

    #[test]
    fn short_names_and_empty_pins_are_rejected() {
        let mut table = MasterTable::new();
        assert_eq!(
            table.define("x", &["a"]),
            Err(CompareError::MasterNameTooShort("x".to_string()))
        );
        assert_eq!(
            table.define("ok", &[]),
            Err(CompareError::MasterWithoutPins("ok".to_string()))
        );
    }
}
