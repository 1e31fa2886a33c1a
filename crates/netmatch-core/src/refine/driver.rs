//! The refinement driver.
//!
//! One characterization step recomputes the current pass type's frontier,
//! extracts new uniques, matches them across the graphs, and reconciles
//! ambiguous sections. Distillation repeats steps until progress dies
//! down; the outer loop redeems suspects and, when even that stalls,
//! hands over to the forced matcher.

use crate::error::{internal, Result};
use crate::graph::Graph;
use crate::queue::VertexQueue;
use crate::refine::buckets::{append_uniques, enter_hash, init_hash_table};
use crate::refine::deduce::match_neighbors;
use crate::refine::sections::match_sections;
use crate::refine::values::{
    assign_initial_value, compute_value, initial_device_values, initial_net_values,
};
use crate::refine::{guess, RunState, HASH_RATIO};
use crate::vertex::{VertexFlag, VertexKind, VertexRef};

/// Mark a vertex bad: it has no counterpart in the other graph.
pub(crate) fn set_bad(st: &mut RunState, g: &mut Graph, r: VertexRef) {
    st.errors += 1;
    {
        let v = g.vertex_mut(r);
        v.flag = VertexFlag::Bad;
        v.value = 0;
    }
    g.bad_queue_mut(r.kind).push(r);
}

/// Push every pending neighbor of a newly unique vertex onto the
/// evaluation queue, folding the unique value into it. The pass stamp
/// keeps a vertex from being queued twice when it neighbors several
/// uniques.
fn queue_neighbors(st: &RunState, g: &mut Graph, unique: VertexRef) {
    let value = g.value_of(unique);
    for (n, _class) in g.neighbor_classes(unique, &st.defs) {
        let wanted = {
            let v = g.vertex(n);
            v.pass != st.pass && v.flag == VertexFlag::Pending
        };
        if wanted {
            {
                let v = g.vertex_mut(n);
                v.pass = st.pass;
                v.value = v.value.wrapping_add(value);
            }
            g.evaluation.push(n);
        }
    }
}

/// Promote this pass's new uniques and seed the next frontier. When local
/// deduction already queued matching vertices, the frontier is left to
/// them instead.
pub(crate) fn process_uniques(st: &mut RunState, g: &mut Graph) {
    let no_matches = g.evaluation.is_empty();
    if !no_matches {
        st.deduced_matches += g.evaluation.len();
    }
    if st.opts.trace {
        let message = format!("{}: {} new unique vertices", g.name, g.new_uniques.len());
        st.progress(&message);
        if !no_matches {
            let message = format!("{}: {} all ready to be matched", g.name, g.evaluation.len());
            st.progress(&message);
        }
    }
    let uniques: Vec<VertexRef> = g.new_uniques.iter().collect();
    for r in uniques {
        {
            let v = g.vertex_mut(r);
            v.flag = VertexFlag::Unique;
            v.pass = st.pass;
        }
        if no_matches {
            queue_neighbors(st, g, r);
        }
    }
}

/// Compact a pending array down to genuinely pending vertices, moving the
/// non-pending tail-first into the hole. With `build_queue`, also
/// recompute every survivor and hand them back as an evaluation queue.
pub(crate) fn clean_pending(
    st: &mut RunState,
    g: &mut Graph,
    kind: VertexKind,
    build_queue: bool,
) -> Result<Option<VertexQueue>> {
    if !build_queue {
        let already_clean = match kind {
            VertexKind::Net => g.nets_clean(),
            VertexKind::Device => g.devices_clean(),
        };
        if already_clean {
            return Ok(None);
        }
    }

    let mut array = std::mem::take(g.pending_mut(kind));
    let mut queue = if build_queue {
        Some(VertexQueue::new())
    } else {
        None
    };

    let mut i = 0;
    let mut size = array.len();
    while i < size {
        let r = array[i];
        let mut flag = g.vertex(r).flag;
        if flag == VertexFlag::Matching {
            log::trace!(
                "reverting matching vertex to pending: {}",
                g.describe(r, &st.opts)
            );
            g.vertex_mut(r).flag = VertexFlag::Pending;
            flag = VertexFlag::Pending;
        }
        if flag == VertexFlag::Pending {
            if let Some(q) = queue.as_mut() {
                compute_value(st, g, r);
                q.push(r);
            }
            i += 1;
        } else {
            array[i] = array[size - 1];
            size -= 1;
        }
    }
    array.truncate(size);
    *g.pending_mut(kind) = array;

    let clean = match kind {
        VertexKind::Net => g.nets_clean(),
        VertexKind::Device => g.devices_clean(),
    };
    if !clean {
        return Err(internal(format!(
            "clean pending: {} lost or gained",
            kind.noun()
        )));
    }
    Ok(queue)
}

/// Move one status queue's vertices back into the pending array with
/// fresh initial values.
fn redeem_queue(st: &mut RunState, g: &mut Graph, kind: VertexKind, suspects: bool) -> Result<()> {
    clean_pending(st, g, kind, false)?;
    let mut queue = if suspects {
        g.suspect_queue_mut(kind).take()
    } else {
        g.bad_queue_mut(kind).take()
    };
    let number = g.number;
    while let Some(r) = queue.pop() {
        g.pending_mut(kind).push(r);
        let v = g.vertex_mut(r);
        assign_initial_value(st, number, v);
        // Equated names come back as matching; force them pending here.
        g.vertex_mut(r).flag = VertexFlag::Pending;
    }
    Ok(())
}

/// Redeem all suspect vertices: back to pending with initial values.
pub(crate) fn reset_suspects(st: &mut RunState, g: &mut Graph) -> Result<()> {
    redeem_queue(st, g, VertexKind::Net, true)?;
    redeem_queue(st, g, VertexKind::Device, true)?;
    if !(g.nets_clean() && g.devices_clean()) {
        return Err(internal("reset suspects: nets/devices lost or gained"));
    }
    Ok(())
}

/// Redeem all bad vertices, same way.
pub(crate) fn reset_bad(st: &mut RunState, g: &mut Graph) -> Result<()> {
    redeem_queue(st, g, VertexKind::Net, false)?;
    redeem_queue(st, g, VertexKind::Device, false)?;
    if !(g.nets_clean() && g.devices_clean()) {
        return Err(internal("reset bad: nets/devices lost or gained"));
    }
    Ok(())
}

/// Recharacterize one graph's frontier: enter every evaluation-queue
/// vertex into a fresh bucket table, then pull out and sort the new
/// uniques.
pub(crate) fn assign_new_values(st: &mut RunState, g: &mut Graph) -> Result<()> {
    if st.opts.trace {
        let message = format!(
            "Pass #{}, {} vertices left in {}",
            st.pass,
            g.vertices_left(),
            g.name
        );
        st.progress(&message);
    }

    let mut recompute = false;
    if st.opts.no_opt {
        g.evaluation.clear();
        recompute = true;
    }

    if let Some(front) = g.evaluation.front() {
        if front.kind != st.pass_type {
            return Err(internal("wrong type of vertices in evaluation queue"));
        }
    }

    if g.evaluation.is_empty() {
        // No frontier: fall back to recomputing every pending vertex.
        recompute = false;
        let kind = st.pass_type;
        let queue = clean_pending(st, g, kind, true)?;
        if let Some(queue) = queue {
            g.evaluation = queue;
        }
        if st.opts.trace {
            let message = format!(
                "Inserted {} vertices into the evaluation queue",
                g.evaluation.len()
            );
            st.progress(&message);
        }
    }

    let frontier = g.evaluation.len();
    init_hash_table(st, g, frontier);
    let mut eval = g.evaluation.take();
    while let Some(r) = eval.pop() {
        let flag = g.vertex(r).flag;
        if flag == VertexFlag::Matching {
            // Deduced earlier; keep the assigned value as is.
            g.vertex_mut(r).flag = VertexFlag::Pending;
        } else {
            if flag != VertexFlag::Pending {
                return Err(internal("assign values: vertex not pending"));
            }
            if recompute {
                compute_value(st, g, r);
            }
        }
        enter_hash(st, g, r);
    }

    log::trace!("{}: checksum {}", g.name, g.check_sum);
    append_uniques(g);
    let mut uniques = g.new_uniques.take();
    uniques.sort_by_value(&|r| g.value_of(r));
    g.new_uniques = uniques;
    Ok(())
}

/// Merge-match the two sorted new-unique queues. Equal values pair up and
/// get a fresh common value; the lesser side of a mismatch is bad.
pub(crate) fn match_uniques(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<()> {
    let mut queue1 = g1.new_uniques.take();
    let mut queue2 = g2.new_uniques.take();
    g1.evaluation.clear();
    g2.evaluation.clear();

    let mut cur1 = queue1.pop();
    let mut cur2 = queue2.pop();
    while let (Some(r1), Some(r2)) = (cur1, cur2) {
        g1.vertex_mut(r1).mate = Some(r2);
        g2.vertex_mut(r2).mate = Some(r1);
        let value1 = g1.value_of(r1);
        let value2 = g2.value_of(r2);
        if value1 == value2 {
            let fresh = st.rng.next_value();
            g1.vertex_mut(r1).value = fresh;
            g2.vertex_mut(r2).value = fresh;
            if st.opts.find_match {
                match_neighbors(st, g1, r1, g2, r2)?;
            }
            g1.new_uniques.push(r1);
            g2.new_uniques.push(r2);
            cur1 = queue1.pop();
            cur2 = queue2.pop();
        } else if value1 < value2 {
            set_bad(st, g1, r1);
            cur1 = queue1.pop();
        } else {
            set_bad(st, g2, r2);
            cur2 = queue2.pop();
        }
    }
    while let Some(r1) = cur1 {
        set_bad(st, g1, r1);
        cur1 = queue1.pop();
    }
    while let Some(r2) = cur2 {
        set_bad(st, g2, r2);
        cur2 = queue2.pop();
    }
    Ok(())
}

/// Pair off the locally deduced matching vertices sitting in the two
/// evaluation queues. They were queued pairwise, so a mismatch here is an
/// engine bug.
pub(crate) fn local_match_uniques(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<()> {
    if st.opts.trace {
        st.progress("Matching local unique vertices.");
    }
    let mut queue1 = g1.evaluation.take();
    let mut queue2 = g2.evaluation.take();
    g1.new_uniques.clear();
    g2.new_uniques.clear();

    loop {
        match (queue1.pop(), queue2.pop()) {
            (Some(r1), Some(r2)) => {
                if g1.value_of(r1) != g2.value_of(r2) {
                    return Err(internal("local match: vertices do not match"));
                }
                let fresh = st.rng.next_value();
                g1.vertex_mut(r1).value = fresh;
                g2.vertex_mut(r2).value = fresh;
                g1.vertex_mut(r1).mate = Some(r2);
                g2.vertex_mut(r2).mate = Some(r1);
                if st.opts.find_match {
                    match_neighbors(st, g1, r1, g2, r2)?;
                }
                g1.new_uniques.push(r1);
                g2.new_uniques.push(r2);
            }
            (None, None) => break,
            _ => return Err(internal("local match: queues are not empty")),
        }
    }
    Ok(())
}

/// Fold this pass's new uniques into the graph's permanent unique queue.
pub(crate) fn bank_uniques(st: &RunState, g: &mut Graph) {
    let mut fresh = g.new_uniques.take();
    g.unique_queue_mut(st.pass_type).append(&mut fresh);
}

/// One recharacterizing step over both graphs. Returns the number of
/// vertices that became unique (measured on graph 1), or 1 when locally
/// matched vertices guarantee progress next pass.
pub(crate) fn characterize(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<i32> {
    let left_before = g1.vertices_left();
    st.pass += 1;

    if st.opts.trace {
        let message = format!(
            "Pass {}: recalculating {}: {} in evaluation queue",
            st.pass,
            st.pass_type.noun(),
            g1.evaluation.len()
        );
        st.progress(&message);
    }

    let local = st.opts.find_match
        && g1
            .evaluation
            .front()
            .map_or(false, |r| g1.vertex(r).flag == VertexFlag::Matching);
    if local {
        local_match_uniques(st, g1, g2)?;
    } else {
        // Fresh table size, fixed by whichever graph enters first.
        st.hash_size = 0;
        assign_new_values(st, g1)?;
        assign_new_values(st, g2)?;
        match_uniques(st, g1, g2)?;
        match_sections(st, g1, g2);
    }

    process_uniques(st, g1);
    process_uniques(st, g2);
    bank_uniques(st, g1);
    bank_uniques(st, g2);

    let progressed = (left_before - g1.vertices_left()) as i32;
    if progressed == 0
        && g1
            .evaluation
            .front()
            .map_or(false, |r| g1.vertex(r).flag == VertexFlag::Matching)
    {
        st.progress("Matching vertices found");
        return Ok(1);
    }
    Ok(progressed)
}

/// Run characterization passes, alternating the pass type, until the
/// configured number of consecutive passes make no progress. Returns the
/// number of vertices distilled out, or -1 when both graphs finished.
pub(crate) fn distill_sections(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<i32> {
    let mut no_progress = 0u32;
    let num_left = g1.vertices_left();

    while !g1.done() || !g2.done() {
        let new_uniques = characterize(st, g1, g2)?;
        if new_uniques > 0 {
            no_progress = 0;
        } else {
            no_progress += 1;
        }

        if st.errors > 0 && !st.errors_reported {
            st.errors_reported = true;
            if st.forced_match {
                st.progress("Forced a match, the circuits are probably different.");
            } else {
                st.progress("The circuits are different.");
            }
        }

        if no_progress >= st.opts.no_progress_cutoff {
            return Ok((num_left - g1.vertices_left()) as i32);
        }
        st.pass_type = st.pass_type.toggled();
    }
    Ok(-1)
}

/// Prepare both graphs: shared maximum table size, initial values, sorted
/// evaluation queues, and the unused-equate audit.
pub(crate) fn init_graphs(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) {
    let largest = g1
        .num_nets()
        .max(g1.num_devices())
        .max(g2.num_nets().max(g2.num_devices()));
    st.max_hash_size = largest / HASH_RATIO + 1;

    initial_device_values(st, g1);
    initial_device_values(st, g2);
    initial_net_values(st, g1);
    initial_net_values(st, g2);

    let mut eval1 = g1.evaluation.take();
    eval1.sort_by_value(&|r| g1.value_of(r));
    g1.evaluation = eval1;
    let mut eval2 = g2.evaluation.take();
    eval2.sort_by_value(&|r| g2.value_of(r));
    g2.evaluation = eval2;

    for (name, circuit) in st.equates.unused() {
        let message = format!(
            "Equivalence name \"{}\" from circuit {} not used",
            name, circuit
        );
        st.warning(&message);
    }
}

/// The outer matching loop.
pub(crate) fn match_graphs(st: &mut RunState, g1: &mut Graph, g2: &mut Graph) -> Result<()> {
    st.pass = 0;
    g1.evaluation.clear();
    g2.evaluation.clear();
    init_graphs(st, g1, g2);

    // Start with the nets; a badly seeded net spreads harm further than
    // a badly seeded device.
    st.pass_type = VertexKind::Net;
    // -1: no progress seen yet; 0: progress this round; >0: stalled rounds.
    let mut suspect_try: i32 = -1;

    while !(g1.done() && g2.done()) {
        let progress = distill_sections(st, g1, g2)?;
        if progress < 0 {
            break;
        } else if progress > 0 {
            suspect_try = 0;
        } else if suspect_try < 0 {
            suspect_try = st.opts.suspect_cutoff;
        } else {
            suspect_try += 1;
        }

        if g1.vertices_left() < st.opts.error_cutoff {
            break;
        }

        let any_flagged = g1.suspect_nets.len()
            + g1.suspect_devices.len()
            + g2.suspect_nets.len()
            + g2.suspect_devices.len()
            + g1.bad_nets.len()
            + g1.bad_devices.len()
            + g2.bad_nets.len()
            + g2.bad_devices.len()
            != 0;
        if any_flagged {
            g1.evaluation.clear();
            g2.evaluation.clear();
            reset_suspects(st, g1)?;
            reset_suspects(st, g2)?;
            reset_bad(st, g1)?;
            reset_bad(st, g2)?;
            if st.opts.trace {
                let message = format!("Releasing suspects in try number {}", suspect_try);
                st.progress(&message);
            }
            // The toggle below flips this back to nets for the restart.
            st.pass_type = VertexKind::Device;
        }

        if suspect_try >= st.opts.suspect_cutoff {
            let total = g1.num_nets() + g1.num_devices();
            let percent = if total > 0 {
                g1.vertices_left() * 100 / total
            } else {
                0
            };
            if st.opts.trace {
                let message = format!(
                    "{} of {} ({}%) vertices left to be matched",
                    g1.vertices_left(),
                    total,
                    percent
                );
                st.progress(&message);
            }
            let message = format!(
                "Some symmetry discovered in the circuits ({}% vertices not yet matched).",
                percent
            );
            st.progress(&message);
            if st.opts.trace {
                st.progress("Attempting to guess vertices that match.");
            }

            // Guess among the nets first; a wrong net guess does less
            // damage than a wrong device guess.
            st.pass_type = VertexKind::Net;
            let mut forced = guess::force_match(st, g1, g2)?;
            if forced <= 0 {
                st.pass_type = st.pass_type.toggled();
                forced = guess::force_match(st, g1, g2)?;
                if forced <= 0 {
                    if st.opts.trace {
                        st.progress(" none found.");
                    }
                    return Ok(());
                }
            }
            suspect_try = -1;
            st.forced_match = true;
            if st.opts.trace {
                st.progress(" success.");
            }
        }
        st.pass_type = st.pass_type.toggled();
    }
    Ok(())
}
