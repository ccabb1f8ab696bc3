//! Incremental parser for the canonical dump format.

use std::io::{self, BufRead};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, trace};

use crate::list::List;
use crate::model::{Dump, Frame, SourceFile, Thread, ThreadState, NATIVE_LINE};
use crate::stream::visitor::{DumpVisitor, KeepAll, Retention};

/// Parse failure raised by [`DumpParser::parse`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// The input violates the dump stream's structure.
    #[error("malformed dump stream at byte {offset}: {detail}")]
    Malformed { detail: String, offset: u64 },

    /// The underlying XML reader rejected the input.
    #[error("invalid markup at byte {offset}")]
    Markup {
        offset: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// The input could not be read.
    #[error("failed to read dump stream")]
    Io(#[from] io::Error),
}

impl StreamError {
    /// Byte offset the failure was detected at, when known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            StreamError::Malformed { offset, .. } | StreamError::Markup { offset, .. } => {
                Some(*offset)
            }
            StreamError::Io(_) => None,
        }
    }
}

/// Where in the element nesting the parser currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    /// Before the root element.
    Idle,
    /// Inside `<dumps>`.
    Dumps,
    /// Inside a `<dump>`.
    Dump,
    /// Inside a `<thread>`.
    Thread,
    /// Inside a non-empty frame element, waiting for its close.
    Frame,
    /// After `</dumps>`.
    Done,
}

/// Mutable state of one `parse` call.
struct ParseState {
    ctx: Ctx,
    /// Depth inside an unknown element's subtree; positive means everything
    /// is passed over untouched.
    ignore_depth: usize,
    cur_dump: Option<Dump>,
    cur_thread: Option<Thread>,
    dump_res: Retention,
    thread_res: Retention,
}

impl ParseState {
    fn new() -> Self {
        ParseState {
            ctx: Ctx::Idle,
            ignore_depth: 0,
            cur_dump: None,
            cur_thread: None,
            dump_res: Retention::DISCARD,
            thread_res: Retention::DISCARD,
        }
    }
}

/// Streaming parser for the canonical format, driving a [`DumpVisitor`].
///
/// The input is read incrementally through a bounded buffer; whole documents
/// are never held in memory unless the visitor keeps them. Dumps retained
/// across [`parse`](DumpParser::parse) calls accumulate, and a parse that
/// fails part-way leaves the dumps collected before the failure intact.
pub struct DumpParser<V: DumpVisitor> {
    visitor: V,
    dumps: List<Dump>,
}

impl Default for DumpParser<KeepAll> {
    fn default() -> Self {
        DumpParser::new(KeepAll)
    }
}

impl<V: DumpVisitor> DumpParser<V> {
    /// Parser driven by the given visitor.
    pub fn new(visitor: V) -> Self {
        DumpParser {
            visitor,
            dumps: List::new(),
        }
    }

    /// Dumps retained so far.
    pub fn dumps(&self) -> &List<Dump> {
        &self.dumps
    }

    /// Consume the parser, returning the retained dumps.
    pub fn into_dumps(self) -> List<Dump> {
        self.dumps
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    /// Mutable access to the visitor, e.g. to read out collected state.
    pub fn visitor_mut(&mut self) -> &mut V {
        &mut self.visitor
    }

    /// Parse one canonical document from `input`.
    ///
    /// Returns once the root element closes and end of input is reached.
    /// Unknown elements and attributes inside the document are tolerated;
    /// anything that breaks the dump/thread/frame nesting, and end of input
    /// with elements still open, is a [`StreamError`].
    pub fn parse<R: BufRead>(&mut self, input: R) -> Result<(), StreamError> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::new();
        let mut st = ParseState::new();

        loop {
            buf.clear();
            let offset = reader.buffer_position();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|err| read_error(err, reader.buffer_position()))?;

            match event {
                Event::Start(e) => {
                    if st.ignore_depth > 0 {
                        st.ignore_depth += 1;
                    } else {
                        self.handle_open(&mut st, &e, offset, false)?;
                    }
                }
                Event::Empty(e) => {
                    if st.ignore_depth == 0 {
                        self.handle_open(&mut st, &e, offset, true)?;
                    }
                }
                // End tags are validated against their start tags by the
                // reader, so closes can be dispatched on context alone.
                Event::End(_) => {
                    if st.ignore_depth > 0 {
                        st.ignore_depth -= 1;
                    } else {
                        match st.ctx {
                            Ctx::Frame => st.ctx = Ctx::Thread,
                            Ctx::Thread => {
                                self.close_thread(&mut st);
                                st.ctx = Ctx::Dump;
                            }
                            Ctx::Dump => {
                                self.close_dump(&mut st);
                                st.ctx = Ctx::Dumps;
                            }
                            Ctx::Dumps => st.ctx = Ctx::Done,
                            Ctx::Idle | Ctx::Done => {
                                return Err(StreamError::Malformed {
                                    detail: "unexpected closing tag".into(),
                                    offset,
                                });
                            }
                        }
                    }
                }
                Event::Eof => {
                    if st.ctx != Ctx::Done {
                        return Err(StreamError::Malformed {
                            detail: "unexpected end of input".into(),
                            offset,
                        });
                    }
                    debug!(dumps = self.dumps.len(), "dump stream parsed");
                    return Ok(());
                }
                // Text, declarations, comments and the like carry no dump
                // structure.
                _ => {}
            }
        }
    }

    /// Dispatch an opening tag. `self_closing` elements run their close
    /// handling immediately and leave the context unchanged.
    fn handle_open(
        &mut self,
        st: &mut ParseState,
        e: &BytesStart<'_>,
        offset: u64,
        self_closing: bool,
    ) -> Result<(), StreamError> {
        match e.name().as_ref() {
            b"dumps" => {
                self.open_root(st, offset)?;
                st.ctx = if self_closing { Ctx::Done } else { Ctx::Dumps };
            }
            name if st.ctx == Ctx::Idle => {
                return Err(StreamError::Malformed {
                    detail: format!(
                        "expected <dumps> root, found <{}>",
                        String::from_utf8_lossy(name)
                    ),
                    offset,
                });
            }
            name if st.ctx == Ctx::Done => {
                return Err(StreamError::Malformed {
                    detail: format!(
                        "content after </dumps>: <{}>",
                        String::from_utf8_lossy(name)
                    ),
                    offset,
                });
            }
            b"dump" => {
                self.open_dump(st, e, offset)?;
                if self_closing {
                    self.close_dump(st);
                } else {
                    st.ctx = Ctx::Dump;
                }
            }
            b"thread" => {
                self.open_thread(st, e, offset)?;
                if self_closing {
                    self.close_thread(st);
                } else {
                    st.ctx = Ctx::Thread;
                }
            }
            b"code" | b"constructor" | b"lock" => {
                self.visit_frame(st, e, offset)?;
                if !self_closing {
                    st.ctx = Ctx::Frame;
                }
            }
            // Unknown elements inside the document are passed over.
            _ => {
                if !self_closing {
                    st.ignore_depth = 1;
                }
            }
        }
        Ok(())
    }

    fn open_root(&self, st: &ParseState, offset: u64) -> Result<(), StreamError> {
        match st.ctx {
            Ctx::Idle => Ok(()),
            Ctx::Done => Err(StreamError::Malformed {
                detail: "content after document end".into(),
                offset,
            }),
            _ => Err(StreamError::Malformed {
                detail: "unexpected nested <dumps>".into(),
                offset,
            }),
        }
    }

    fn open_dump(
        &mut self,
        st: &mut ParseState,
        e: &BytesStart<'_>,
        offset: u64,
    ) -> Result<(), StreamError> {
        if st.ctx != Ctx::Dumps {
            return Err(StreamError::Malformed {
                detail: "unexpected <dump>".into(),
                offset,
            });
        }
        let id = attr_string(e, b"id", offset)?.unwrap_or_default();
        st.dump_res = self.visitor.enter_dump(&id);
        trace!(
            dump = %id,
            keep = st.dump_res.keep,
            skip = st.dump_res.skip,
            "dump opened"
        );
        st.cur_dump = st.dump_res.keep.then(|| Dump::new(id));
        Ok(())
    }

    fn open_thread(
        &mut self,
        st: &mut ParseState,
        e: &BytesStart<'_>,
        offset: u64,
    ) -> Result<(), StreamError> {
        if st.ctx != Ctx::Dump {
            return Err(StreamError::Malformed {
                detail: "unexpected <thread>".into(),
                offset,
            });
        }
        if st.dump_res.skip {
            st.thread_res = Retention::DISCARD;
            st.cur_thread = None;
            return Ok(());
        }
        let name = attr_string(e, b"name", offset)?.unwrap_or_default();
        let native_id = attr_string(e, b"native_id", offset)?.unwrap_or_default();
        let java_id = attr_string(e, b"java_id", offset)?.unwrap_or_default();
        let state = attr_string(e, b"state", offset)?
            .map(|token| ThreadState::from_token(&token))
            .unwrap_or_default();
        st.thread_res = self.visitor.enter_thread(&name, &native_id, &java_id, state);
        st.cur_thread = st
            .thread_res
            .keep
            .then(|| Thread::new(name, native_id, java_id, state));
        Ok(())
    }

    fn visit_frame(
        &mut self,
        st: &mut ParseState,
        e: &BytesStart<'_>,
        offset: u64,
    ) -> Result<(), StreamError> {
        if st.ctx != Ctx::Thread {
            return Err(StreamError::Malformed {
                detail: format!(
                    "unexpected <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                ),
                offset,
            });
        }
        if st.dump_res.skip || st.thread_res.skip {
            return Ok(());
        }

        let outcome;
        let frame = if e.name().as_ref() == b"lock" {
            let id = attr_string(e, b"id", offset)?.unwrap_or_default();
            let class = attr_string(e, b"class", offset)?.unwrap_or_default();
            let owner = attr_string(e, b"isOwner", offset)?
                .and_then(|v| v.trim().parse::<i32>().ok())
                .map(|v| v != 0)
                .unwrap_or(false);
            outcome = self.visitor.visit_lock(&id, &class, owner);
            Frame::lock(id, class, owner)
        } else {
            let class = attr_string(e, b"class", offset)?.unwrap_or_default();
            let source = attr_string(e, b"file", offset)?
                .map(|token| SourceFile::from_token(&token))
                .unwrap_or_else(|| SourceFile::named(""));
            let line = attr_string(e, b"line", offset)?
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or(NATIVE_LINE);
            if e.name().as_ref() == b"constructor" {
                outcome = self.visitor.visit_constructor(&class, &source, line);
                Frame::constructor(class, source, line)
            } else {
                outcome = self.visitor.visit_code(&class, &source, line);
                Frame::code(class, source, line)
            }
        };

        if outcome.keep {
            if let Some(thread) = st.cur_thread.as_mut() {
                thread.frames.push_back(frame);
            }
        }
        Ok(())
    }

    fn close_thread(&mut self, st: &mut ParseState) {
        // Under a skipped dump the thread was never materialized and its
        // exit visitor must stay silent.
        if st.dump_res.skip {
            return;
        }
        let outcome = self.visitor.leave_thread(st.cur_thread.as_ref(), st.thread_res);
        if let Some(thread) = st.cur_thread.take() {
            if outcome.keep {
                if let Some(dump) = st.cur_dump.as_mut() {
                    dump.threads.push_back(thread);
                }
            }
        }
    }

    fn close_dump(&mut self, st: &mut ParseState) {
        // The dump exit visitor always runs, skip or not; it has the final
        // say over a materialized dump.
        let outcome = self.visitor.leave_dump(st.cur_dump.as_ref(), st.dump_res);
        if let Some(dump) = st.cur_dump.take() {
            if outcome.keep {
                self.dumps.push_back(dump);
            }
        }
    }
}

/// Parse one canonical document, keeping everything.
pub fn parse_dumps<R: BufRead>(input: R) -> Result<List<Dump>, StreamError> {
    let mut parser = DumpParser::new(KeepAll);
    parser.parse(input)?;
    Ok(parser.into_dumps())
}

/// Look up one attribute by name, decoded and unescaped. Missing attributes
/// are `None`; unknown attributes are skipped over.
fn attr_string(
    e: &BytesStart<'_>,
    key: &[u8],
    offset: u64,
) -> Result<Option<String>, StreamError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| StreamError::Malformed {
            detail: format!("bad attribute: {err}"),
            offset,
        })?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value).map_err(|err| StreamError::Malformed {
                detail: format!("attribute value is not UTF-8: {err}"),
                offset,
            })?;
            let value = unescape(raw).map_err(|err| StreamError::Malformed {
                detail: format!("bad attribute escape: {err}"),
                offset,
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn read_error(err: quick_xml::Error, offset: u64) -> StreamError {
    match err {
        quick_xml::Error::Io(source) => {
            StreamError::Io(io::Error::new(source.kind(), source.to_string()))
        }
        source => StreamError::Markup { offset, source },
    }
}
