use std::cell::{Cell, RefCell};
use std::rc::Rc;

use foundation::SectionId;

/// Classification of a reported event.
///
/// Every failure mode of section loading and mounting ends up here instead of
/// propagating to the host page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Registration / load bookkeeping; recorded only in debug mode.
    Info,
    TargetNotFound,
    InvalidDescriptor,
    LoadFailure,
    CapabilityMissing,
    PathDataFailure,
    UnmountFailure,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::Info => "info",
            DiagnosticKind::TargetNotFound => "target-not-found",
            DiagnosticKind::InvalidDescriptor => "invalid-descriptor",
            DiagnosticKind::LoadFailure => "load-failure",
            DiagnosticKind::CapabilityMissing => "capability-missing",
            DiagnosticKind::PathDataFailure => "path-data-failure",
            DiagnosticKind::UnmountFailure => "unmount-failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Monotonic per-sink sequence number.
    pub sequence: u64,
    pub kind: DiagnosticKind,
    pub section: Option<SectionId>,
    pub message: String,
}

#[derive(Debug, Default)]
struct Sink {
    debug: Cell<bool>,
    next_sequence: Cell<u64>,
    events: RefCell<Vec<Diagnostic>>,
}

/// Shared diagnostics sink.
///
/// Cloning yields another handle onto the same record. Every report is also
/// emitted through `tracing` at a level matching its kind.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    sink: Rc<Sink>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_debug(&self, debug: bool) {
        self.sink.debug.set(debug);
    }

    pub fn debug_enabled(&self) -> bool {
        self.sink.debug.get()
    }

    pub fn report(
        &self,
        kind: DiagnosticKind,
        section: Option<&SectionId>,
        message: impl Into<String>,
    ) {
        if kind == DiagnosticKind::Info && !self.debug_enabled() {
            return;
        }

        let message = message.into();
        let section_label = section.map(SectionId::as_str).unwrap_or("-");
        match kind {
            DiagnosticKind::Info => {
                tracing::debug!(section = section_label, "{message}");
            }
            DiagnosticKind::TargetNotFound
            | DiagnosticKind::InvalidDescriptor
            | DiagnosticKind::CapabilityMissing
            | DiagnosticKind::PathDataFailure => {
                tracing::warn!(section = section_label, kind = kind.as_str(), "{message}");
            }
            DiagnosticKind::LoadFailure | DiagnosticKind::UnmountFailure => {
                tracing::error!(section = section_label, kind = kind.as_str(), "{message}");
            }
        }

        let sequence = self.sink.next_sequence.get();
        self.sink.next_sequence.set(sequence.wrapping_add(1));
        self.sink.events.borrow_mut().push(Diagnostic {
            sequence,
            kind,
            section: section.cloned(),
            message,
        });
    }

    pub fn info(&self, section: Option<&SectionId>, message: impl Into<String>) {
        self.report(DiagnosticKind::Info, section, message);
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.sink.events.borrow().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.sink
            .events
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

}
