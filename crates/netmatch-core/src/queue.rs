//! Vertex queues.
//!
//! The refinement engine shuffles vertices between many FIFO queues: the
//! evaluation queue, the per-bucket queues of the value hash, and the
//! unique/suspect/bad status queues. A queue holds handles, not vertices;
//! a vertex belongs to at most one queue at a time, which holds by
//! construction because moves always pop from one queue before pushing to
//! another.
//!
//! Sorting is by vertex value, ascending, and stable: ties keep input
//! order, so identical inputs always produce identical queue orders.

use std::collections::VecDeque;

use crate::vertex::VertexRef;

/// Queues below this length are insertion-sorted directly.
const INSERT_SORT_SIZE: usize = 7;

/// FIFO of vertex handles.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexQueue {
    items: VecDeque<VertexRef>,
}

impl VertexQueue {
    pub(crate) fn new() -> Self {
        VertexQueue {
            items: VecDeque::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn push(&mut self, vertex: VertexRef) {
        self.items.push_back(vertex);
    }

    pub(crate) fn pop(&mut self) -> Option<VertexRef> {
        self.items.pop_front()
    }

    pub(crate) fn front(&self) -> Option<VertexRef> {
        self.items.front().copied()
    }

    /// Move every element of `other` onto the end of `self`. O(len(other)).
    pub(crate) fn append(&mut self, other: &mut VertexQueue) {
        self.items.append(&mut other.items);
    }

    /// Take the whole queue, leaving `self` empty.
    pub(crate) fn take(&mut self) -> VertexQueue {
        VertexQueue {
            items: std::mem::take(&mut self.items),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = VertexRef> + '_ {
        self.items.iter().copied()
    }

    /// Remove `vertex` from anywhere in the queue. Returns whether it was
    /// present.
    pub(crate) fn remove(&mut self, vertex: VertexRef) -> bool {
        if let Some(pos) = self.items.iter().position(|&v| v == vertex) {
            self.items.remove(pos);
            true
        } else {
            false
        }
    }

    /// Move `vertex` to the front of the queue if present.
    pub(crate) fn rotate_to_front(&mut self, vertex: VertexRef) {
        if let Some(pos) = self.items.iter().position(|&v| v == vertex) {
            self.items.remove(pos);
            self.items.push_front(vertex);
        }
    }

    /// Sort ascending by `value_of`. Small queues use insertion sort; larger
    /// ones a quicksort sectioning on the mean of the end values, which
    /// copes with the almost-sorted queues the refinement loop produces.
    pub(crate) fn sort_by_value(&mut self, value_of: &dyn Fn(VertexRef) -> u32) {
        if self.items.len() <= 1 {
            return;
        }
        let items: Vec<VertexRef> = self.items.drain(..).collect();
        let sorted = sort_run(items, value_of);
        self.items = sorted.into();
    }

    /// Straight stable insertion sort, used directly on small sections.
    pub(crate) fn insertion_sort_by_value(&mut self, value_of: &dyn Fn(VertexRef) -> u32) {
        if self.items.len() <= 1 {
            return;
        }
        let items: Vec<VertexRef> = self.items.drain(..).collect();
        self.items = insertion_sort(items, value_of).into();
    }
}

impl FromIterator<VertexRef> for VertexQueue {
    fn from_iter<I: IntoIterator<Item = VertexRef>>(iter: I) -> Self {
        VertexQueue {
            items: iter.into_iter().collect(),
        }
    }
}

fn insertion_sort(items: Vec<VertexRef>, value_of: &dyn Fn(VertexRef) -> u32) -> Vec<VertexRef> {
    let mut out: Vec<VertexRef> = Vec::with_capacity(items.len());
    for item in items {
        let key = value_of(item);
        // Insert after any run of equal keys to keep ties in input order.
        let mut pos = out.len();
        while pos > 0 && value_of(out[pos - 1]) > key {
            pos -= 1;
        }
        out.insert(pos, item);
    }
    out
}

fn sort_run(items: Vec<VertexRef>, value_of: &dyn Fn(VertexRef) -> u32) -> Vec<VertexRef> {
    if items.len() <= INSERT_SORT_SIZE {
        return insertion_sort(items, value_of);
    }

    let first = value_of(items[0]);
    let last = value_of(*items.last().expect("non-empty run"));

    // Section on the mean of the end values rather than the head alone;
    // an almost-sorted queue would otherwise degenerate the recursion.
    // Equal end values give no usable pivot, so fall back to the extremes
    // of the whole run; an all-equal run is already sorted.
    let section_value = if first != last {
        first / 2 + last / 2
    } else {
        let min = items.iter().map(|&r| value_of(r)).min().expect("non-empty");
        let max = items.iter().map(|&r| value_of(r)).max().expect("non-empty");
        if min == max {
            return items;
        }
        min / 2 + max / 2
    };

    let mut less: Vec<VertexRef> = Vec::new();
    let mut more: Vec<VertexRef> = Vec::new();
    let mut sorted_less = true;
    let mut sorted_more = true;
    let mut last_less = 0u32;
    let mut last_more = 0u32;

    for item in items {
        let v = value_of(item);
        if v <= section_value {
            if v < last_less {
                sorted_less = false;
            }
            last_less = v;
            less.push(item);
        } else {
            if v < last_more {
                sorted_more = false;
            }
            last_more = v;
            more.push(item);
        }
    }

    let mut less = if sorted_less || less.len() <= 1 {
        less
    } else {
        sort_run(less, value_of)
    };
    let more = if sorted_more || more.len() <= 1 {
        more
    } else {
        sort_run(more, value_of)
    };

    less.extend(more);
    less
}

/// Compare two names right to left, folding case and skipping characters
/// that are not alphanumeric. The names match when the significant
/// characters agree until one name runs out; suffixes of nets tend to
/// survive renaming between netlists.
pub(crate) fn suffix_matches(a: &str, b: &str) -> bool {
    let mut ai = a
        .chars()
        .rev()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase());
    let mut bi = b
        .chars()
        .rev()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase());
    loop {
        match (ai.next(), bi.next()) {
            (Some(x), Some(y)) => {
                if x != y {
                    return false;
                }
            }
            // Matched to the end of one name.
            _ => return true,
        }
    }
}

/// Scan the two queues for a pair of vertices whose names match by suffix;
/// on the first hit, rotate both to the front of their queues and report
/// success. Quadratic in the queue lengths, so callers bound the sizes.
pub(crate) fn match_by_suffix(
    queue1: &mut VertexQueue,
    name_of1: &dyn Fn(VertexRef) -> String,
    queue2: &mut VertexQueue,
    name_of2: &dyn Fn(VertexRef) -> String,
) -> bool {
    let mut hit: Option<(VertexRef, VertexRef)> = None;
    'scan: for v1 in queue1.iter() {
        let n1 = name_of1(v1);
        for v2 in queue2.iter() {
            if suffix_matches(&n1, &name_of2(v2)) {
                hit = Some((v1, v2));
                break 'scan;
            }
        }
    }
    match hit {
        Some((v1, v2)) => {
            queue1.rotate_to_front(v1);
            queue2.rotate_to_front(v2);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::VertexRef;

    fn refs(n: usize) -> Vec<VertexRef> {
        (0..n).map(VertexRef::net).collect()
    }

    #[test]
    fn fifo_order() {
        let mut q = VertexQueue::new();
        for r in refs(3) {
            q.push(r);
        }
        assert_eq!(q.pop(), Some(VertexRef::net(0)));
        assert_eq!(q.pop(), Some(VertexRef::net(1)));
        assert_eq!(q.pop(), Some(VertexRef::net(2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn append_is_in_order() {
        let mut a: VertexQueue = refs(2).into_iter().collect();
        let mut b: VertexQueue = vec![VertexRef::net(7)].into_iter().collect();
        a.append(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        let collected: Vec<_> = a.iter().collect();
        assert_eq!(collected[2], VertexRef::net(7));
    }

    #[test]
    fn sort_small_queue() {
        let values = [5u32, 1, 4, 2, 3];
        let mut q: VertexQueue = refs(5).into_iter().collect();
        q.sort_by_value(&|r| values[r.index as usize]);
        let order: Vec<u32> = q.iter().map(|r| values[r.index as usize]).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sort_large_queue() {
        let values: Vec<u32> = (0..100).map(|i| (i * 7919) % 101).collect();
        let mut q: VertexQueue = refs(100).into_iter().collect();
        q.sort_by_value(&|r| values[r.index as usize]);
        let order: Vec<u32> = q.iter().map(|r| values[r.index as usize]).collect();
        let mut expected = order.clone();
        expected.sort();
        assert_eq!(order, expected);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        // Values with runs of ties; ties must keep input order.
        let values = [2u32, 1, 2, 1, 2, 1, 2, 1, 2, 1, 3, 3];
        let mut q: VertexQueue = refs(values.len()).into_iter().collect();
        q.sort_by_value(&|r| values[r.index as usize]);
        let order: Vec<usize> = q.iter().map(|r| r.index as usize).collect();
        assert_eq!(order, vec![1, 3, 5, 7, 9, 0, 2, 4, 6, 8, 10, 11]);
    }

    #[test]
    fn sort_all_equal_values() {
        let values = [9u32; 20];
        let mut q: VertexQueue = refs(20).into_iter().collect();
        q.sort_by_value(&|r| values[r.index as usize]);
        assert_eq!(q.len(), 20);
        let order: Vec<usize> = q.iter().map(|r| r.index as usize).collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn sort_already_sorted() {
        let values: Vec<u32> = (0..50).collect();
        let mut q: VertexQueue = refs(50).into_iter().collect();
        q.sort_by_value(&|r| values[r.index as usize]);
        let order: Vec<usize> = q.iter().map(|r| r.index as usize).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn suffix_comparison_folds_case_and_punctuation() {
        assert!(suffix_matches("Vdd_core", "x/vddCORE"));
        assert!(suffix_matches("n1", "net.1"));
        assert!(!suffix_matches("out2", "out3"));
        // One name exhausting its significant characters counts as a match.
        assert!(suffix_matches("clk", "core_clk"));
        assert!(suffix_matches("__", "anything"));
    }

    #[test]
    fn suffix_match_rotates_hits_to_front() {
        let names1 = ["aa", "bb", "cc"];
        let names2 = ["xbb", "ycc"];
        let mut q1: VertexQueue = refs(3).into_iter().collect();
        let mut q2: VertexQueue = (0..2).map(VertexRef::device).collect();
        let hit = match_by_suffix(
            &mut q1,
            &|r| names1[r.index as usize].to_string(),
            &mut q2,
            &|r| names2[r.index as usize].to_string(),
        );
        assert!(hit);
        assert_eq!(q1.front(), Some(VertexRef::net(1)));
        assert_eq!(q2.front(), Some(VertexRef::device(0)));
    }
}
