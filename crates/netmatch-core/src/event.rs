//! Event sink: the engine's only output channel besides the final outcome.
//!
//! Three event categories flow out of a run: free-form progress messages,
//! warnings, and structured status reports carrying the per-vertex
//! classification. The host supplies an [`EventSink`]; the engine never
//! writes to stdout or a file on its own.

use serde::{Deserialize, Serialize};

use crate::vertex::VertexKind;

/// Classification category attached to a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    /// Informational.
    General,
    /// Vertices matched across the two graphs.
    Match,
    /// Vertices with no counterpart across graphs.
    Bad,
    /// Vertices that could not be disambiguated against the other graph.
    NoMatchOther,
    /// Vertices left pending, typically stranded by symmetry.
    NoMatchSymmetry,
}

/// One structured classification report.
///
/// `tags` identifies the vertices involved: the user tag supplied at
/// insertion for devices, the net name for nets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub kind: VertexKind,
    pub report: ReportKind,
    /// 0 or 1: which graph the report describes.
    pub graph: usize,
    pub message: String,
    pub tags: Vec<String>,
}

/// Receiver for engine events. All methods default to no-ops so a sink
/// may observe only the categories it cares about.
pub trait EventSink {
    /// Progress of the matching process.
    fn progress(&mut self, _message: &str) {}

    /// Recoverable oddities (duplicate equivalence names, oversized
    /// options, unused equate entries).
    fn warning(&mut self, _message: &str) {}

    /// Per-vertex classification after matching finished.
    fn status(&mut self, _report: StatusReport) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}

/// One recorded event, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Progress(String),
    Warning(String),
    Status(StatusReport),
}

/// Sink that records every event, mainly for tests and diagnostics.
///
/// Clones share the same buffer, so a handle kept by the caller still sees
/// everything recorded after the engine took ownership of its clone:
///
/// ```rust
/// use netmatch_core::{EventSink, MemorySink};
///
/// let sink = MemorySink::new();
/// let mut handle: Box<dyn EventSink> = Box::new(sink.clone());
/// handle.progress("building");
/// assert_eq!(sink.events().len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: std::rc::Rc<std::cell::RefCell<Vec<Event>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in emission order.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// All recorded status reports.
    pub fn statuses(&self) -> Vec<StatusReport> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Status(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// All recorded warning messages.
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Warning(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// All recorded progress messages.
    pub fn progress_messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Progress(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn progress(&mut self, message: &str) {
        self.events
            .borrow_mut()
            .push(Event::Progress(message.to_string()));
    }

    fn warning(&mut self, message: &str) {
        self.events
            .borrow_mut()
            .push(Event::Warning(message.to_string()));
    }

    fn status(&mut self, report: StatusReport) {
        self.events.borrow_mut().push(Event::Status(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        sink.progress("one");
        sink.warning("two");
        sink.status(StatusReport {
            kind: VertexKind::Net,
            report: ReportKind::Match,
            graph: 0,
            message: "3 nets matched".to_string(),
            tags: vec!["a".to_string()],
        });
        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.statuses().len(), 1);
        assert_eq!(sink.warnings(), vec!["two".to_string()]);
    }

    #[test]
    fn clones_share_the_buffer() {
        let sink = MemorySink::new();
        let mut clone = sink.clone();
        clone.progress("from the clone");
        assert_eq!(sink.events().len(), 1);
    }
}
