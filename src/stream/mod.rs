//! Streaming parse and serialize engine for the canonical dump format.
//!
//! The canonical format is a line-oriented XML stream:
//!
//! ```text
//! <?xml version="1.0"?>
//! <dumps>
//! <dump id="2009-04-30 14:02:41">
//! <thread name="main" state="RUN" native_id="0x7f01" java_id="0x1">
//! <code class="com.example.Task.run" file="Task.java" line="42"/>
//! <lock id="0xcafe" class="java.lang.Object" isOwner="1"/>
//! </thread>
//! </dump>
//! </dumps>
//! ```
//!
//! [`DumpParser`] reads it incrementally and hands every structural boundary
//! to a [`DumpVisitor`], whose [`Retention`] outcomes decide what ends up in
//! memory. [`DumpWriter`] is the inverse: it emits the format token by token
//! or whole model objects at a time. Producers and consumers can be chained
//! through the writer without ever materializing a full document.

mod reader;
mod visitor;
mod writer;

pub use reader::{parse_dumps, DumpParser, StreamError};
pub use visitor::{DumpVisitor, KeepAll, Retention};
pub use writer::DumpWriter;
