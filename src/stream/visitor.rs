//! Visitor contract driven by the streaming parser.

use std::ops::BitOr;

use crate::model::{Dump, SourceFile, Thread, ThreadState};

/// Outcome returned by every visitor call.
///
/// `keep` asks the parser to retain the object materialized for the current
/// element. `skip` asks it to pass over the element's nested content without
/// interpreting it. The flags are independent: keep with skip retains an
/// empty shell, and discard without skip still walks children, whose
/// visitors run even though nothing is accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Retention {
    pub keep: bool,
    pub skip: bool,
}

impl Retention {
    /// Neither keep nor skip; children are still visited.
    pub const DISCARD: Retention = Retention {
        keep: false,
        skip: false,
    };

    /// Retain the materialized object and visit its children.
    pub const KEEP: Retention = Retention {
        keep: true,
        skip: false,
    };

    /// Pass over nested content without interpreting it.
    pub const SKIP: Retention = Retention {
        keep: false,
        skip: true,
    };
}

impl BitOr for Retention {
    type Output = Retention;

    /// Combine outcomes, e.g. `Retention::KEEP | Retention::SKIP` to retain
    /// an element while ignoring everything nested in it.
    fn bitor(self, rhs: Retention) -> Retention {
        Retention {
            keep: self.keep || rhs.keep,
            skip: self.skip || rhs.skip,
        }
    }
}

/// Callbacks invoked at each structural boundary of the canonical stream.
///
/// Every method has a default: enter and frame visitors keep everything and
/// exit visitors echo the inbound outcome, so an empty impl reproduces the
/// input in full.
///
/// Exit visitors receive the materialized object only when the matching
/// enter call kept it, together with that call's outcome; their return value
/// has the final say over retention. Once an element is being skipped, the
/// visitors for everything nested in it are not called at all.
pub trait DumpVisitor {
    /// A dump opened.
    fn enter_dump(&mut self, _id: &str) -> Retention {
        Retention::KEEP
    }

    /// A dump closed. `dump` is `None` when [`enter_dump`](Self::enter_dump)
    /// did not keep it.
    fn leave_dump(&mut self, _dump: Option<&Dump>, inbound: Retention) -> Retention {
        inbound
    }

    /// A thread opened. Not called under a skipped dump.
    fn enter_thread(
        &mut self,
        _name: &str,
        _native_id: &str,
        _java_id: &str,
        _state: ThreadState,
    ) -> Retention {
        Retention::KEEP
    }

    /// A thread closed. Not called under a skipped dump.
    fn leave_thread(&mut self, _thread: Option<&Thread>, inbound: Retention) -> Retention {
        inbound
    }

    /// A call frame. Not called under a skipped dump or thread.
    fn visit_code(&mut self, _class: &str, _source: &SourceFile, _line: i32) -> Retention {
        Retention::KEEP
    }

    /// A constructor frame. Not called under a skipped dump or thread.
    fn visit_constructor(&mut self, _class: &str, _source: &SourceFile, _line: i32) -> Retention {
        Retention::KEEP
    }

    /// A lock frame. Not called under a skipped dump or thread.
    fn visit_lock(&mut self, _id: &str, _class: &str, _owner: bool) -> Retention {
        Retention::KEEP
    }
}

/// Visitor that keeps every dump, thread, and frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl DumpVisitor for KeepAll {}
