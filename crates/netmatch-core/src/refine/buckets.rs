//! The per-pass value hash table.
//!
//! Every recomputed vertex is entered into its graph's bucket table.
//! Within a bucket, vertices whose value nobody else shares sit in the
//! `unique` queue; the first vertex of a shared value represents the
//! section in `not_unique` and the rest pile up in `overflow`. Non-unique
//! values feed the bucket sum and the graph checksum, which is what the
//! section matcher later compares across graphs.

use crate::graph::Graph;
use crate::refine::{RunState, HASH_RATIO};
use crate::vertex::VertexRef;

/// Size and clear the bucket table for this pass. The first graph entered
/// fixes the shared table size; the second reuses it so bucket indices
/// correspond across graphs.
pub(crate) fn init_hash_table(st: &mut RunState, g: &mut Graph, vertices: usize) {
    g.check_sum = 0;
    if st.hash_size == 0 {
        st.hash_size = vertices / HASH_RATIO + 1;
        if st.hash_size > st.max_hash_size {
            let message = format!(
                "Maximum hash size exceeded: {} > {} - defaulting to {}.",
                st.hash_size, st.max_hash_size, st.max_hash_size
            );
            st.warning(&message);
            st.hash_size = st.max_hash_size;
        }
    }

    if g.buckets.len() < st.hash_size {
        g.buckets.resize_with(st.hash_size, Default::default);
    } else {
        g.buckets.truncate(st.hash_size);
    }
    for bucket in &mut g.buckets {
        bucket.reset();
    }
}

/// Enter one vertex. Entering a value already represented in `not_unique`
/// grows that section; colliding with a `unique` entry demotes it to a
/// two-element section.
pub(crate) fn enter_hash(st: &RunState, g: &mut Graph, r: VertexRef) {
    let value = g.value_of(r);
    let index = value as usize % st.hash_size;

    let in_not_unique = g.buckets[index]
        .not_unique
        .iter()
        .find(|&c| g.value_of(c) == value);
    if let Some(rep) = in_not_unique {
        g.check_sum = g.check_sum.wrapping_add(value);
        g.buckets[index].sum = g.buckets[index].sum.wrapping_add(value);
        g.vertex_mut(rep).section_size += 1;
        g.buckets[index].overflow.push(r);
        return;
    }

    let in_unique = g.buckets[index]
        .unique
        .iter()
        .find(|&c| g.value_of(c) == value);
    match in_unique {
        None => g.buckets[index].unique.push(r),
        Some(prior) => {
            // The value was unique until now; both vertices form a new
            // two-element section.
            g.buckets[index].unique.remove(prior);
            g.check_sum = g.check_sum.wrapping_add(value.wrapping_mul(2));
            g.buckets[index].sum = g.buckets[index].sum.wrapping_add(value.wrapping_mul(2));
            g.buckets[index].overflow.push(r);
            g.buckets[index].not_unique.push(prior);
            g.vertex_mut(prior).section_size = 2;
        }
    }
}

/// Gather every bucket's `unique` queue into the graph's `new_uniques`.
pub(crate) fn append_uniques(g: &mut Graph) {
    let mut gathered = g.new_uniques.take();
    gathered.clear();
    for bucket in &mut g.buckets {
        gathered.append(&mut bucket.unique);
    }
    g.new_uniques = gathered;
}
