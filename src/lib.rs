//! Thread Dump Stream (tdstream) Library
//!
//! A Rust library for converting vendor-specific Java thread dumps into a
//! canonical XML stream and reading that stream back with visitor-driven
//! retention.

pub mod extract;
pub mod filter;
pub mod list;
pub mod model;
pub mod stream;

pub use extract::{ExtractError, Extractor, IbmExtractor, SunExtractor, Vendor};
pub use filter::{Filter, FilterField, Matcher};
pub use list::List;
pub use model::{Dump, Frame, SourceFile, Thread, ThreadState};
pub use stream::{
    parse_dumps, DumpParser, DumpVisitor, DumpWriter, KeepAll, Retention, StreamError,
};
