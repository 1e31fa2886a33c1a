//! Forced matching.
//!
//! When refinement and redemption both stall, the graphs still contain
//! ambiguous sections — usually genuine symmetry. The engine then guesses:
//! it picks the smallest section whose value and size agree on both
//! sides, pairs one vertex from each (by name suffix when allowed, else
//! arbitrarily), gives the pair a fresh common value, and lets refinement
//! run again from that seed. A wrong guess surfaces later as bad
//! vertices; a right one unravels the symmetry.

use crate::error::{internal, Result};
use crate::graph::Graph;
use crate::queue::{match_by_suffix, VertexQueue};
use crate::refine::deduce::match_neighbors;
use crate::refine::driver::{bank_uniques, characterize, local_match_uniques, process_uniques};
use crate::refine::RunState;
use crate::vertex::{Vertex, VertexKind, VertexRef};

/// Sections this small may be paired by name suffix.
const SUFFIX_SECTION_LIMIT: u32 = 20;

/// Compute (and cache) the smallest section size in one bucket, or `None`
/// when the bucket holds no sections.
fn ensure_min_part(g: &mut Graph, index: usize) -> Option<u32> {
    if g.buckets[index].min_part != u32::MAX {
        return Some(g.buckets[index].min_part);
    }
    if g.buckets[index].not_unique.is_empty() {
        return None;
    }
    let mut min = u32::MAX;
    for r in g.buckets[index].not_unique.iter() {
        let size = g.vertex(r).section_size;
        if size < min {
            min = size;
            if size == 2 {
                break;
            }
        }
    }
    g.buckets[index].min_part = min;
    Some(min)
}

/// Rotate through a bucket's `not_unique` queue until `pred` accepts a
/// vertex, and take it. The queue is left rotated but complete.
fn take_section_rep(
    g: &mut Graph,
    index: usize,
    pred: &dyn Fn(&Vertex) -> bool,
) -> Result<VertexRef> {
    let first = match g.buckets[index].not_unique.pop() {
        Some(r) => r,
        None => return Err(internal("forced match: section queue empty")),
    };
    let mut current = first;
    loop {
        if pred(g.vertex(current)) {
            return Ok(current);
        }
        g.buckets[index].not_unique.push(current);
        current = match g.buckets[index].not_unique.pop() {
            Some(r) => r,
            None => return Err(internal("forced match: section queue drained")),
        };
        if current == first {
            return Err(internal("forced match: no section of the expected size"));
        }
    }
}

/// Pull every overflow vertex with `value` into `section`; the rest stay.
fn extract_overflow_by_value(g: &mut Graph, index: usize, value: u32, section: &mut VertexQueue) {
    let mut rest = VertexQueue::new();
    let mut overflow = g.buckets[index].overflow.take();
    while let Some(r) = overflow.pop() {
        if g.value_of(r) == value {
            section.push(r);
        } else {
            rest.push(r);
        }
    }
    g.buckets[index].overflow = rest;
}

fn pair_vertices(
    st: &mut RunState,
    g1: &mut Graph,
    r1: VertexRef,
    g2: &mut Graph,
    r2: VertexRef,
) -> Result<()> {
    let fresh = st.rng.next_value();
    g1.vertex_mut(r1).value = fresh;
    g2.vertex_mut(r2).value = fresh;
    g1.vertex_mut(r1).mate = Some(r2);
    g2.vertex_mut(r2).mate = Some(r1);
    g1.new_uniques.push(r1);
    g2.new_uniques.push(r2);
    match_neighbors(st, g1, r1, g2, r2)?;
    if st.opts.trace {
        st.progress("Successful local match.");
    }
    Ok(())
}

/// Guess a pair of vertices to match. Returns the number of pairs forced,
/// 0 when nothing was left to force.
pub(crate) fn force_match(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<i32> {
    // One more refinement step first; a real match beats a guess.
    let found = characterize(st, g1, g2)?;
    if found < 0 {
        return Ok(0);
    }
    if found > 0 {
        if st.opts.trace {
            st.progress("Recalculating before guessing found matching vertices -- matching aborted");
        }
        return Ok(found);
    }

    let mut success = 0;
    let mut min_index = 0usize;
    loop {
        let hash_size = st.hash_size;
        if hash_size == 0 {
            return Ok(success);
        }

        // Find the smallest ambiguous section, resuming the scan at the
        // bucket that supplied the last one.
        let mut min_size = u32::MAX;
        let first_index = min_index;
        let mut index = first_index;
        loop {
            if let Some(m1) = ensure_min_part(g1, index) {
                if let Some(m2) = ensure_min_part(g2, index) {
                    if m1 != m2 {
                        return Err(internal("forced match: section sizes disagree"));
                    }
                    if m1 < min_size {
                        min_size = m1;
                        min_index = index;
                        if min_size == 2 {
                            break;
                        }
                    }
                }
            }
            index = (index + 1) % hash_size;
            if index == first_index {
                break;
            }
        }

        // No sections anywhere: everything left was matched or condemned.
        if min_size == u32::MAX {
            return Ok(success);
        }

        if st.opts.trace {
            let message = format!("Matching vertices from sections of size {}:", min_size);
            st.progress(&message);
        }
        g1.new_uniques.clear();
        g2.new_uniques.clear();

        // One vertex of the smallest section on side 1, then the section
        // with the same value on side 2.
        let rep1 = take_section_rep(g1, min_index, &|v| v.section_size == min_size)?;
        let min_value = g1.value_of(rep1);
        let mut section1 = VertexQueue::new();
        section1.push(rep1);
        let rep2 = take_section_rep(g2, min_index, &|v| v.value == min_value)?;
        let mut section2 = VertexQueue::new();
        section2.push(rep2);

        extract_overflow_by_value(g1, min_index, min_value, &mut section1);
        extract_overflow_by_value(g2, min_index, min_value, &mut section2);

        // Suffix pairing is quadratic, so only small net sections get it.
        let suffixed = st.opts.use_suffix
            && st.pass_type == VertexKind::Net
            && min_size < SUFFIX_SECTION_LIMIT
            && match_by_suffix(
                &mut section1,
                &|r| g1.vertex(r).name.clone(),
                &mut section2,
                &|r| g2.vertex(r).name.clone(),
            );
        if suffixed {
            if st.opts.trace {
                st.progress("Successfully matched by suffix.");
            }
        } else {
            section1.insertion_sort_by_value(&|r| g1.value_of(r));
            section2.insertion_sort_by_value(&|r| g2.value_of(r));
        }

        let first1 = match section1.pop() {
            Some(r) => r,
            None => return Err(internal("forced match: empty section")),
        };
        let first2 = match section2.pop() {
            Some(r) => r,
            None => return Err(internal("forced match: empty section")),
        };
        pair_vertices(st, g1, first1, g2, first2)?;
        success += 1;

        let next1 = section1.pop();
        let next2 = section2.pop();
        match (next1, next2) {
            (Some(r1), Some(r2)) if min_size == 2 => {
                // A two-element section leaves exactly one possible pair.
                pair_vertices(st, g1, r1, g2, r2)?;
                success += 1;
            }
            (Some(r1), Some(r2)) => {
                g1.vertex_mut(r1).section_size = min_size - 1;
                g2.vertex_mut(r2).section_size = min_size - 1;
                g1.buckets[min_index].not_unique.push(r1);
                g2.buckets[min_index].not_unique.push(r2);
                g1.buckets[min_index].overflow.append(&mut section1);
                g2.buckets[min_index].overflow.append(&mut section2);
            }
            _ => return Err(internal("forced match: sections out of step")),
        }

        g1.buckets[min_index].min_part = u32::MAX;
        g2.buckets[min_index].min_part = u32::MAX;

        process_uniques(st, g1);
        process_uniques(st, g2);
        bank_uniques(st, g1);
        bank_uniques(st, g2);

        // The guess may have deduced matches of the opposite kind; chase
        // them right away rather than waiting out a full pass.
        let deduced_waiting = g1
            .evaluation
            .front()
            .map_or(false, |r| g1.vertex(r).flag == crate::vertex::VertexFlag::Matching);
        if deduced_waiting {
            st.pass_type = st.pass_type.toggled();
            local_match_uniques(st, g1, g2)?;
            process_uniques(st, g1);
            process_uniques(st, g2);
            bank_uniques(st, g1);
            bank_uniques(st, g2);
            if g1.evaluation.len() + g2.evaluation.len() == 0 {
                // Nothing came of it; fall back to section matching.
                st.pass_type = st.pass_type.toggled();
            }
        }

        // Neighbors queued for evaluation mean the normal algorithm can
        // take over again.
        if g1.evaluation.len() + g2.evaluation.len() > 0 {
            return Ok(success);
        }
    }
}
