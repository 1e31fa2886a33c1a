//! Final classification reporting.
//!
//! After matching stops short of a full match, each graph's vertices are
//! reported in four groups per kind: bad (definite mismatch), suspect
//! (could not be disambiguated), still pending (typically stranded by
//! symmetry), and matched. Afterwards the suspect and bad queues are
//! redeemed so the arena is consistent again.

use crate::error::Result;
use crate::event::{ReportKind, StatusReport};
use crate::graph::Graph;
use crate::queue::VertexQueue;
use crate::refine::driver::{clean_pending, reset_bad, reset_suspects};
use crate::refine::RunState;
use crate::vertex::VertexKind;

fn emit(
    st: &mut RunState,
    g: &Graph,
    queue: &VertexQueue,
    report: ReportKind,
    kind: VertexKind,
    message: String,
) {
    let tags: Vec<String> = queue.iter().map(|r| g.tag_of(r)).collect();
    st.sink.status(StatusReport {
        kind,
        report,
        graph: (g.number - 1) as usize,
        message,
        tags,
    });
}

fn report_kind(st: &mut RunState, g: &mut Graph, kind: VertexKind) -> Result<()> {
    let noun = kind.noun();

    let bad = match kind {
        VertexKind::Net => &g.bad_nets,
        VertexKind::Device => &g.bad_devices,
    };
    if !bad.is_empty() {
        let message = format!("{} {} do not match", bad.len(), noun);
        emit(st, g, bad, ReportKind::Bad, kind, message);
    }

    let suspect = match kind {
        VertexKind::Net => &g.suspect_nets,
        VertexKind::Device => &g.suspect_devices,
    };
    if !suspect.is_empty() {
        let message = format!("{} {} could not be matched", suspect.len(), noun);
        emit(st, g, suspect, ReportKind::NoMatchOther, kind, message);
    }

    let pending = clean_pending(st, g, kind, true)?.unwrap_or_default();
    if !pending.is_empty() {
        let message = format!("{} {} were not matched", pending.len(), noun);
        emit(st, g, &pending, ReportKind::NoMatchSymmetry, kind, message);
    }

    let unique = match kind {
        VertexKind::Net => &g.unique_nets,
        VertexKind::Device => &g.unique_devices,
    };
    if !unique.is_empty() {
        let message = format!("{} {} matched", unique.len(), noun);
        emit(st, g, unique, ReportKind::Match, kind, message);
    }
    Ok(())
}

/// Report one graph's classification, then redeem suspect and bad
/// vertices so a caller inspecting the arena sees a consistent state.
pub(crate) fn report_status(st: &mut RunState, g: &mut Graph) -> Result<()> {
    let message = format!("Graph: {}", g.name);
    st.progress(&message);

    report_kind(st, g, VertexKind::Net)?;
    report_kind(st, g, VertexKind::Device)?;

    reset_suspects(st, g)?;
    reset_bad(st, g)?;
    clean_pending(st, g, VertexKind::Net, true)?;
    clean_pending(st, g, VertexKind::Device, true)?;
    Ok(())
}
