//! Serialization of the canonical dump format.

use std::io::{self, Write};

use quick_xml::escape::escape;

use crate::model::{Dump, Frame, Thread, ThreadState};

/// Streaming writer for the canonical format.
///
/// The primitive methods emit one markup line each and may be freely
/// interleaved, so a producer can emit filtered output without materializing
/// dumps first. The composite methods ([`frame`](DumpWriter::frame),
/// [`thread`](DumpWriter::thread), [`dump`](DumpWriter::dump),
/// [`dumps`](DumpWriter::dumps)) write a whole model object including its
/// open and close tags. Nothing is buffered beyond the underlying sink.
///
/// String values are XML-escaped on the way out; the matching parser
/// unescapes them, so any thread or class name round-trips.
pub struct DumpWriter<W: Write> {
    out: W,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        DumpWriter { out }
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    // ========================================================================
    // Primitives, one markup line each
    // ========================================================================

    /// XML declaration and the `<dumps>` root opener.
    pub fn open_dumps(&mut self) -> io::Result<()> {
        self.out.write_all(b"<?xml version=\"1.0\"?>\n<dumps>\n")
    }

    pub fn close_dumps(&mut self) -> io::Result<()> {
        self.out.write_all(b"</dumps>\n")
    }

    pub fn open_dump(&mut self, id: &str) -> io::Result<()> {
        writeln!(self.out, "<dump id=\"{}\">", escape(id))
    }

    pub fn close_dump(&mut self) -> io::Result<()> {
        self.out.write_all(b"</dump>\n")
    }

    pub fn open_thread(
        &mut self,
        name: &str,
        state: ThreadState,
        native_id: &str,
        java_id: &str,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "<thread name=\"{}\" state=\"{}\" native_id=\"{}\" java_id=\"{}\">",
            escape(name),
            state.as_token(),
            escape(native_id),
            escape(java_id),
        )
    }

    pub fn close_thread(&mut self) -> io::Result<()> {
        self.out.write_all(b"</thread>\n")
    }

    /// Call frame. `file` is the wire token, so native frames pass
    /// [`NATIVE_FILE`](crate::model::NATIVE_FILE).
    pub fn code(&mut self, class: &str, file: &str, line: i32) -> io::Result<()> {
        writeln!(
            self.out,
            "<code class=\"{}\" file=\"{}\" line=\"{}\"/>",
            escape(class),
            escape(file),
            line,
        )
    }

    /// Constructor frame, same shape as [`code`](DumpWriter::code).
    pub fn constructor(&mut self, class: &str, file: &str, line: i32) -> io::Result<()> {
        writeln!(
            self.out,
            "<constructor class=\"{}\" file=\"{}\" line=\"{}\"/>",
            escape(class),
            escape(file),
            line,
        )
    }

    pub fn lock(&mut self, id: &str, class: &str, owner: bool) -> io::Result<()> {
        writeln!(
            self.out,
            "<lock id=\"{}\" class=\"{}\" isOwner=\"{}\"/>",
            escape(id),
            escape(class),
            owner as i32,
        )
    }

    // ========================================================================
    // Composites over model objects
    // ========================================================================

    pub fn frame(&mut self, frame: &Frame) -> io::Result<()> {
        match frame {
            Frame::Code {
                class,
                source,
                line,
            } => self.code(class, source.as_token(), *line),
            Frame::Constructor {
                class,
                source,
                line,
            } => self.constructor(class, source.as_token(), *line),
            Frame::Lock { id, class, owner } => self.lock(id, class, *owner),
        }
    }

    pub fn thread(&mut self, thread: &Thread) -> io::Result<()> {
        self.open_thread(
            &thread.name,
            thread.state,
            &thread.native_id,
            &thread.java_id,
        )?;
        for frame in &thread.frames {
            self.frame(frame)?;
        }
        self.close_thread()
    }

    pub fn dump(&mut self, dump: &Dump) -> io::Result<()> {
        self.open_dump(&dump.id)?;
        for thread in &dump.threads {
            self.thread(thread)?;
        }
        self.close_dump()
    }

    /// Write a complete document: root opener, every dump, root closer.
    pub fn dumps<'a, I>(&mut self, dumps: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a Dump>,
    {
        self.open_dumps()?;
        for dump in dumps {
            self.dump(dump)?;
        }
        self.close_dumps()
    }
}
