//! Canonical thread dump model.
//!
//! A parsed input is a sequence of [`Dump`]s, each holding the [`Thread`]s
//! retained from it, each thread holding its stack as a sequence of
//! [`Frame`]s in call order (outermost first). The model mirrors the
//! canonical stream one to one:
//!
//! ```text
//! <dumps>
//!   <dump id="...">
//!     <thread name="..." state="..." native_id="..." java_id="...">
//!       <code class="..." file="..." line="..."/>
//!       <constructor class="..." file="..." line="..."/>
//!       <lock id="..." class="..." isOwner="0|1"/>
//!     </thread>
//!   </dump>
//! </dumps>
//! ```

use std::fmt;

use crate::list::List;

/// Reserved file token for frames without a source location.
pub const NATIVE_FILE: &str = "NATIVE";

/// Line number written for frames without a source location.
pub const NATIVE_LINE: i32 = -1;

// ============================================================================
// Source files
// ============================================================================

/// Source location of a call frame, either a named file or the native marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    /// No source available; the frame runs native code.
    Native,
    /// A source file name as reported by the runtime.
    Named(String),
}

impl SourceFile {
    /// Create a named source file.
    pub fn named(name: impl Into<String>) -> Self {
        SourceFile::Named(name.into())
    }

    /// Parse a wire token, mapping the reserved native marker.
    pub fn from_token(token: &str) -> Self {
        if token == NATIVE_FILE {
            SourceFile::Native
        } else {
            SourceFile::Named(token.to_string())
        }
    }

    /// Wire token for this source file.
    pub fn as_token(&self) -> &str {
        match self {
            SourceFile::Native => NATIVE_FILE,
            SourceFile::Named(name) => name,
        }
    }

    /// True for the native marker.
    pub fn is_native(&self) -> bool {
        matches!(self, SourceFile::Native)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

// ============================================================================
// Thread states
// ============================================================================

/// Execution state of a thread at dump time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadState {
    Running,
    ObjectWait,
    WaitingOnCondition,
    WaitingForMonitorEntry,
    Sleeping,
    #[default]
    Unknown,
}

impl ThreadState {
    /// Canonical wire token.
    pub fn as_token(&self) -> &'static str {
        match self {
            ThreadState::Running => "RUN",
            ThreadState::ObjectWait => "OBJ_WAIT",
            ThreadState::WaitingOnCondition => "WAIT_COND",
            ThreadState::WaitingForMonitorEntry => "WAIT_MON",
            ThreadState::Sleeping => "SLEEP",
            ThreadState::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire token by prefix; unrecognized tokens map to `Unknown`.
    pub fn from_token(token: &str) -> Self {
        const TOKENS: [(&str, ThreadState); 5] = [
            ("RUN", ThreadState::Running),
            ("OBJ_WAIT", ThreadState::ObjectWait),
            ("WAIT_COND", ThreadState::WaitingOnCondition),
            ("WAIT_MON", ThreadState::WaitingForMonitorEntry),
            ("SLEEP", ThreadState::Sleeping),
        ];
        for (prefix, state) in TOKENS {
            if token.starts_with(prefix) {
                return state;
            }
        }
        ThreadState::Unknown
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

// ============================================================================
// Frames
// ============================================================================

/// A single stack entry of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An ordinary call frame.
    Code {
        class: String,
        source: SourceFile,
        line: i32,
    },
    /// A constructor invocation.
    Constructor {
        class: String,
        source: SourceFile,
        line: i32,
    },
    /// A lock the thread holds or waits for.
    Lock {
        id: String,
        class: String,
        owner: bool,
    },
}

impl Frame {
    /// Create an ordinary call frame.
    pub fn code(class: impl Into<String>, source: SourceFile, line: i32) -> Self {
        Frame::Code {
            class: class.into(),
            source,
            line,
        }
    }

    /// Create a constructor frame.
    pub fn constructor(class: impl Into<String>, source: SourceFile, line: i32) -> Self {
        Frame::Constructor {
            class: class.into(),
            source,
            line,
        }
    }

    /// Create a lock frame. `owner` is true when the thread holds the lock
    /// rather than waiting for it.
    pub fn lock(id: impl Into<String>, class: impl Into<String>, owner: bool) -> Self {
        Frame::Lock {
            id: id.into(),
            class: class.into(),
            owner,
        }
    }

    /// Fully qualified class of this frame. For call and constructor frames
    /// this is the called symbol, for lock frames the lock object's class.
    pub fn class(&self) -> &str {
        match self {
            Frame::Code { class, .. } => class,
            Frame::Constructor { class, .. } => class,
            Frame::Lock { class, .. } => class,
        }
    }

    /// Called symbol, present for call and constructor frames only.
    pub fn call_symbol(&self) -> Option<&str> {
        match self {
            Frame::Code { class, .. } | Frame::Constructor { class, .. } => Some(class),
            Frame::Lock { .. } => None,
        }
    }

    /// True for call and constructor frames without a source location.
    pub fn is_native(&self) -> bool {
        match self {
            Frame::Code { source, .. } | Frame::Constructor { source, .. } => source.is_native(),
            Frame::Lock { .. } => false,
        }
    }
}

// ============================================================================
// Threads and dumps
// ============================================================================

/// A single thread with its stack, as recorded in one dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub name: String,
    pub native_id: String,
    pub java_id: String,
    pub state: ThreadState,
    /// Stack frames in call order, outermost first.
    pub frames: List<Frame>,
}

impl Thread {
    /// Create a thread with an empty stack.
    pub fn new(
        name: impl Into<String>,
        native_id: impl Into<String>,
        java_id: impl Into<String>,
        state: ThreadState,
    ) -> Self {
        Thread {
            name: name.into(),
            native_id: native_id.into(),
            java_id: java_id.into(),
            state,
            frames: List::new(),
        }
    }
}

/// One complete thread dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub id: String,
    /// Threads in encounter order.
    pub threads: List<Thread>,
}

impl Dump {
    /// Create a dump with no threads.
    pub fn new(id: impl Into<String>) -> Self {
        Dump {
            id: id.into(),
            threads: List::new(),
        }
    }

    /// Thread with the given name, if present.
    pub fn thread_by_name(&self, name: &str) -> Option<&Thread> {
        self.threads.find(|thread| thread.name == name)
    }

    /// Thread holding the lock with the given identifier, if any.
    ///
    /// A thread holds a lock when its stack carries a lock frame for that
    /// identifier with the owner flag set.
    pub fn find_lock_owner(&self, lock_id: &str) -> Option<&Thread> {
        self.threads.find(|thread| {
            thread.frames.iter().any(
                |frame| matches!(frame, Frame::Lock { id, owner: true, .. } if id == lock_id),
            )
        })
    }
}
