//! Cross-graph section matching.
//!
//! A section is a maximal run of same-value vertices inside one bucket.
//! Buckets whose sums agree across the graphs need no attention; for the
//! rest, the sections are paired up in value order. Sections that cannot
//! be reconciled mark all their vertices suspect — a redeemable state,
//! unlike bad.

use crate::graph::Graph;
use crate::queue::VertexQueue;
use crate::refine::RunState;
use crate::vertex::{VertexFlag, VertexRef};

/// Pop the leading run of equal-valued vertices off `queue`.
/// `queue` must be sorted by value.
pub(crate) fn extract_section(g: &Graph, queue: &mut VertexQueue) -> VertexQueue {
    let mut section = VertexQueue::new();
    let value = match queue.front() {
        Some(r) => g.value_of(r),
        None => return section,
    };
    while let Some(r) = queue.front() {
        if g.value_of(r) != value {
            break;
        }
        queue.pop();
        section.push(r);
    }
    section
}

/// Mark every vertex of `queue` suspect and move them onto the graph's
/// suspect queue. Suspect values are zeroed so they cannot pollute
/// neighbor recomputation.
pub(crate) fn set_suspect_queue(st: &mut RunState, g: &mut Graph, queue: &mut VertexQueue) {
    let kind = match queue.front() {
        Some(r) => r.kind,
        None => return,
    };
    for r in queue.iter() {
        st.errors += 1;
        let v = g.vertex_mut(r);
        v.flag = VertexFlag::Suspect;
        v.value = 0;
    }
    g.suspect_queue_mut(kind).append(queue);
}

fn note_min_part(g: &mut Graph, index: usize, rep: VertexRef, section_size: u32) {
    g.vertex_mut(rep).section_size = section_size;
    if section_size < g.buckets[index].min_part {
        g.buckets[index].min_part = section_size;
    }
}

/// Pair the non-singleton sections of every bucket whose sums disagree.
///
/// Matching sections go back into the bucket (representative in
/// `not_unique`, the rest in `overflow`) with refreshed section sizes;
/// everything else becomes suspect.
pub(crate) fn match_sections(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) {
    for index in 0..st.hash_size {
        if g1.buckets[index].sum == g2.buckets[index].sum {
            continue;
        }

        // Everything non-unique in this bucket, sorted, so sections come
        // off the front in value order.
        let mut pool1 = g1.buckets[index].not_unique.take();
        let mut spill1 = g1.buckets[index].overflow.take();
        pool1.append(&mut spill1);
        pool1.sort_by_value(&|r| g1.value_of(r));

        let mut pool2 = g2.buckets[index].not_unique.take();
        let mut spill2 = g2.buckets[index].overflow.take();
        pool2.append(&mut spill2);
        pool2.sort_by_value(&|r| g2.value_of(r));

        let mut keep1 = VertexQueue::new();
        let mut keep2 = VertexQueue::new();

        g1.buckets[index].min_part = u32::MAX;
        g2.buckets[index].min_part = u32::MAX;

        let mut section1 = extract_section(g1, &mut pool1);
        let mut section2 = extract_section(g2, &mut pool2);
        loop {
            let (front1, front2) = match (section1.front(), section2.front()) {
                (Some(a), Some(b)) => (a, b),
                _ => break,
            };
            let value1 = g1.value_of(front1);
            let value2 = g2.value_of(front2);
            if value1 == value2 {
                if section1.len() != section2.len() {
                    // Same value, different multiplicity: nothing in
                    // either section can be trusted.
                    set_suspect_queue(st, g1, &mut section1);
                    set_suspect_queue(st, g2, &mut section2);
                } else {
                    // The sections agree: the front vertex becomes the
                    // representative, the rest go back to overflow.
                    let size = section1.len() as u32;
                    section1.pop();
                    note_min_part(g1, index, front1, size);
                    keep1.push(front1);
                    g1.buckets[index].overflow.append(&mut section1);

                    section2.pop();
                    note_min_part(g2, index, front2, size);
                    keep2.push(front2);
                    g2.buckets[index].overflow.append(&mut section2);
                }
                section1 = extract_section(g1, &mut pool1);
                section2 = extract_section(g2, &mut pool2);
            } else if value1 < value2 {
                set_suspect_queue(st, g1, &mut section1);
                section1 = extract_section(g1, &mut pool1);
            } else {
                set_suspect_queue(st, g2, &mut section2);
                section2 = extract_section(g2, &mut pool2);
            }
        }

        // One side ran dry: whatever is left anywhere has no counterpart.
        set_suspect_queue(st, g1, &mut section1);
        set_suspect_queue(st, g2, &mut section2);
        set_suspect_queue(st, g1, &mut pool1);
        set_suspect_queue(st, g2, &mut pool2);

        g1.buckets[index].not_unique = keep1;
        g2.buckets[index].not_unique = keep2;
    }
}
