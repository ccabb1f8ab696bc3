//! Extractor for IBM javacore dumps.
//!
//! javacore files tag every line; only a handful of tags matter here:
//!
//! ```text
//! 1TIDATETIME    Date:                 2010/02/27 at 13:12:25
//! 2XMFULLTHDDUMP Full thread dump of all threads:
//! 3XMTHREADINFO      "main" (TID:0x00FDCF00, sys_thread_t:0x00FC4FF0, state:CW, native ID:0x3CA8) prio=5
//! 4XESTACKTRACE          at com/example/Main.run(Main.java:12)
//! NULL           ------------------------------------------------------------------------
//! ```
//!
//! The timestamp line precedes the dump and supplies its id; a `NULL`
//! separator line ends it. Qualified names use `/` separators and are
//! rewritten with dots. Locks live in a separate javacore section with no
//! stack position, and constructors are not distinguishable, so every stack
//! line becomes a plain call frame. Lines with any other tag are ignored.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::extract::{read_line, source_location, ExtractError, Extractor};
use crate::model::ThreadState;
use crate::stream::DumpWriter;

pub struct IbmExtractor;

impl Extractor for IbmExtractor {
    fn name(&self) -> &'static str {
        "ibm"
    }

    fn extract(&self, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<(), ExtractError> {
        let mut writer = DumpWriter::new(out);
        let mut raw = Vec::new();
        let mut pending_id: Option<String> = None;
        let mut dump_index = 0u32;
        let mut dump_open = false;
        let mut thread_open = false;

        writer.open_dumps()?;
        while read_line(input, &mut raw)? {
            let line = String::from_utf8_lossy(&raw);

            if let Some(rest) = line.strip_prefix("1TIDATETIME") {
                // The timestamp gets its own tag ahead of the dump itself.
                if let Some(at) = rest.find("20") {
                    pending_id = Some(rest[at..].to_string());
                }
            } else if line.starts_with("2XMFULLTHDDUMP") {
                if dump_open {
                    close_dump(&mut writer, &mut thread_open)?;
                }
                let id = pending_id.take().unwrap_or_else(|| {
                    dump_index += 1;
                    dump_index.to_string()
                });
                writer.open_dump(&id)?;
                dump_open = true;
            } else if dump_open && line.starts_with("3XMTHREADINFO") {
                if thread_open {
                    writer.close_thread()?;
                }
                thread_open = open_thread(&mut writer, &line)?;
            } else if thread_open && line.starts_with("4XESTACKTRACE") {
                if !emit_call(&mut writer, &line)? {
                    warn!(line = %line, "unparseable stack line");
                }
            } else if dump_open && line.starts_with("NULL") {
                close_dump(&mut writer, &mut thread_open)?;
                dump_open = false;
            }
        }
        // javacore files are rarely clipped, but a closed document is
        // guaranteed either way.
        if dump_open {
            close_dump(&mut writer, &mut thread_open)?;
        }
        writer.close_dumps()?;
        Ok(())
    }
}

fn close_dump<W: Write>(
    writer: &mut DumpWriter<W>,
    thread_open: &mut bool,
) -> Result<(), ExtractError> {
    if *thread_open {
        writer.close_thread()?;
        *thread_open = false;
    }
    writer.close_dump()?;
    Ok(())
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

/// Parse a `3XMTHREADINFO` line: the name sits in quotes, the identifiers
/// and state inside the parenthesized list after it.
fn parse_thread_header(line: &str) -> Option<ThreadHeader> {
    let (_, rest) = line.split_once('"')?;
    let (name, rest) = rest.split_once('"')?;
    let (_, rest) = rest.split_once("TID:")?;
    let (java_id, rest) = rest.split_once(',')?;
    let state = match rest.split_once("state:") {
        Some((_, value)) => ibm_state(value),
        None => ThreadState::Unknown,
    };
    let (_, rest) = rest.split_once("native ID:")?;
    let (native_id, _) = rest.split_once(')')?;
    Some(ThreadHeader {
        name: name.to_string(),
        native_id: native_id.to_string(),
        java_id: java_id.to_string(),
        state,
    })
}

/// Map the javacore state code: `R` is runnable, `CW` condition wait.
/// javacore does not separate the waiting flavors any further.
fn ibm_state(value: &str) -> ThreadState {
    if value.starts_with("CW") {
        ThreadState::WaitingOnCondition
    } else if value.starts_with('R') {
        ThreadState::Running
    } else {
        ThreadState::Unknown
    }
}

/// Emit a `4XESTACKTRACE` line as a call frame, rewriting the `/` package
/// separators javacore uses in qualified names.
fn emit_call<W: Write>(writer: &mut DumpWriter<W>, line: &str) -> Result<bool, ExtractError> {
    let Some((_, call)) = line.split_once("at ") else {
        return Ok(false);
    };
    let Some((symbol, inner)) = call.split_once('(') else {
        return Ok(false);
    };
    let class = symbol.replace('/', ".");
    let (file, line_no) = source_location(inner);
    writer.code(&class, file, line_no)?;
    Ok(true)
}
