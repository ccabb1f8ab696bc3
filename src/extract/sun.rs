//! Extractor for Sun/Oracle HotSpot text dumps (the 1.4 through 1.6 era).
//!
//! A dump starts with a banner line, usually preceded by a timestamp, and
//! lists one block per thread: a quoted header line followed by
//! tab-indented stack lines.
//!
//! ```text
//! 2009-04-30 14:02:41
//! Full thread dump Java HotSpot(TM) Server VM (11.0-b15 mixed mode):
//!
//! "main" prio=10 tid=0x0814a768 nid=0x68c runnable [0xb7e4c000..0xb7e4d288]
//!     at com.example.Task.run(Task.java:42)
//!     at com.example.Task.<init>(Task.java:7)
//!     - locked <0x712a4c30> (a java.lang.Object)
//! ```
//!
//! The timestamp line becomes the dump id; when none precedes the banner a
//! monotonically increasing ordinal is used instead. Any other unindented
//! line ends the dump.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::extract::{read_line, source_location, ExtractError, Extractor};
use crate::model::ThreadState;
use crate::stream::DumpWriter;

/// Banner marking the start of a HotSpot dump.
const DUMP_BANNER: &str = "Full thread dump";

/// Shape of the timestamp line preceding the banner; `?` stands for a digit.
const DATE_SHAPE: &str = "????-??-?? ??:??:??";

pub struct SunExtractor;

impl Extractor for SunExtractor {
    fn name(&self) -> &'static str {
        "sun"
    }

    fn extract(&self, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<(), ExtractError> {
        let mut writer = DumpWriter::new(out);
        let mut raw = Vec::new();
        let mut prev_line = String::new();
        let mut dump_index = 0u32;
        let mut dump_open = false;
        let mut thread_open = false;

        writer.open_dumps()?;
        while read_line(input, &mut raw)? {
            let line = String::from_utf8_lossy(&raw);

            if !dump_open {
                dump_open = open_on_banner(&mut writer, &line, &mut prev_line, &mut dump_index)?;
                thread_open = false;
            } else if line.starts_with('"') {
                if thread_open {
                    writer.close_thread()?;
                }
                thread_open = open_thread(&mut writer, &line)?;
            } else if line.starts_with('\t') {
                if thread_open {
                    stack_line(&mut writer, &line)?;
                } else {
                    warn!(line = %line, "stack line outside a thread");
                }
            } else if !line.is_empty() && !line.starts_with(' ') {
                // Any other unindented line ends the dump; it may itself
                // open the next one.
                if thread_open {
                    writer.close_thread()?;
                    thread_open = false;
                }
                writer.close_dump()?;
                dump_open = open_on_banner(&mut writer, &line, &mut prev_line, &mut dump_index)?;
            }
        }
        // Input clipped inside a dump still yields a closed document.
        if dump_open {
            if thread_open {
                writer.close_thread()?;
            }
            writer.close_dump()?;
        }
        writer.close_dumps()?;
        Ok(())
    }
}

/// Open a dump if `line` is the banner, deriving the id from the line seen
/// before it. Non-banner lines are remembered for that purpose.
fn open_on_banner<W: Write>(
    writer: &mut DumpWriter<W>,
    line: &str,
    prev_line: &mut String,
    dump_index: &mut u32,
) -> Result<bool, ExtractError> {
    if !line.starts_with(DUMP_BANNER) {
        prev_line.clear();
        prev_line.push_str(line);
        return Ok(false);
    }
    let id = match leading_timestamp(prev_line) {
        Some(stamp) => stamp.to_string(),
        None => {
            *dump_index += 1;
            dump_index.to_string()
        }
    };
    writer.open_dump(&id)?;
    Ok(true)
}

/// Timestamp prefix of `line` matching [`DATE_SHAPE`], if present.
fn leading_timestamp(line: &str) -> Option<&str> {
    let shape = DATE_SHAPE.as_bytes();
    let bytes = line.as_bytes();
    if bytes.len() < shape.len() {
        return None;
    }
    for (b, s) in bytes.iter().zip(shape) {
        let matches = if *s == b'?' {
            b.is_ascii_digit()
        } else {
            b == s
        };
        if !matches {
            return None;
        }
    }
    Some(&line[..shape.len()])
}

struct ThreadHeader {
    name: String,
    native_id: String,
    java_id: String,
    state: ThreadState,
}

fn open_thread<W: Write>(writer: &mut DumpWriter<W>, line: &str) -> Result<bool, ExtractError> {
    match parse_thread_header(line) {
        Some(h) => {
            writer.open_thread(&h.name, h.state, &h.native_id, &h.java_id)?;
            Ok(true)
        }
        None => {
            warn!(line, "unparseable thread header");
            Ok(false)
        }
    }
}

/// Parse a thread header line:
///
/// ```text
/// "NAME" prio=PRIO tid=JAVA_ID nid=NATIVE_ID STATE [MEMRANGE]
/// ```
fn parse_thread_header(line: &str) -> Option<ThreadHeader> {
    let rest = line.strip_prefix('"')?;
    let (name, rest) = rest.split_once('"')?;
    let (_, rest) = rest.split_once("tid=")?;
    let (java_id, rest) = rest.split_once(' ')?;
    let (_, rest) = rest.split_once("nid=")?;
    let (native_id, state_text) = rest.split_once(' ').unwrap_or((rest, ""));
    Some(ThreadHeader {
        name: name.to_string(),
        native_id: native_id.to_string(),
        java_id: java_id.to_string(),
        state: sun_state(state_text, line),
    })
}

/// Probe the free-text state portion of a thread header. Unrecognized
/// vocabulary maps to `Unknown`.
fn sun_state(text: &str, header: &str) -> ThreadState {
    const PROBES: [(&str, ThreadState); 5] = [
        ("runnable", ThreadState::Running),
        ("Object", ThreadState::ObjectWait),
        ("condition", ThreadState::WaitingOnCondition),
        ("monitor", ThreadState::WaitingForMonitorEntry),
        ("sleep", ThreadState::Sleeping),
    ];
    for (probe, state) in PROBES {
        if text.contains(probe) {
            return state;
        }
    }
    warn!(header, "unknown thread state");
    ThreadState::Unknown
}

/// Dispatch one tab-indented stack line.
fn stack_line<W: Write>(writer: &mut DumpWriter<W>, line: &str) -> Result<(), ExtractError> {
    let body = &line[1..];
    if let Some(call) = body.strip_prefix("at ") {
        if !emit_call(writer, call)? {
            warn!(line, "unparseable call frame");
        }
    } else if let Some(monitor) = body.strip_prefix("- ") {
        if !emit_monitor(writer, monitor)? {
            warn!(line, "unhandled stacktrace line");
        }
    } else {
        warn!(line, "unhandled stacktrace line");
    }
    Ok(())
}

/// Emit a call or constructor frame, e.g.
/// `com.example.Task.<init>(Task.java:7)` or `sun.misc.Unsafe.park(Native Method)`.
/// Constructors are recognized by the `<` marker inside the symbol.
fn emit_call<W: Write>(writer: &mut DumpWriter<W>, call: &str) -> Result<bool, ExtractError> {
    let Some((symbol, inner)) = call.split_once('(') else {
        return Ok(false);
    };
    let (file, line) = source_location(inner);
    match symbol.find('<') {
        Some(lt) => {
            let before = &symbol[..lt];
            let class = before.strip_suffix('.').unwrap_or(before);
            writer.constructor(class, file, line)?;
        }
        None => writer.code(symbol, file, line)?,
    }
    Ok(true)
}

/// Emit a lock frame, e.g. `locked <0x712a4c30> (a java.lang.Object)` or
/// `waiting to lock <0x712a4c30> (a java.lang.Object)`.
fn emit_monitor<W: Write>(writer: &mut DumpWriter<W>, monitor: &str) -> Result<bool, ExtractError> {
    let owner = monitor.starts_with("locked");
    let Some((_, rest)) = monitor.split_once('<') else {
        return Ok(false);
    };
    let Some((id, rest)) = rest.split_once('>') else {
        return Ok(false);
    };
    let Some((_, rest)) = rest.split_once("(a ") else {
        return Ok(false);
    };
    let Some((class, _)) = rest.split_once(')') else {
        return Ok(false);
    };
    writer.lock(id, class, owner)?;
    Ok(true)
}
