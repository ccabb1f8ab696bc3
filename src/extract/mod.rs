//! Vendor thread dump extraction.
//!
//! Each vendor format gets a single-pass, line-buffered scanner that drives
//! the canonical [`DumpWriter`](crate::stream::DumpWriter) directly instead
//! of building model objects. Extraction is best-effort: lines that cannot
//! be interpreted are logged and skipped, unknown state vocabulary maps to
//! `UNKNOWN`, and input truncated inside an open thread or dump is closed
//! out so the emitted document is always well formed.

mod ibm;
mod sun;

pub use ibm::IbmExtractor;
pub use sun::SunExtractor;

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;

use crate::model::{NATIVE_FILE, NATIVE_LINE};

/// Failure of an extraction run.
///
/// Everything recoverable is handled inside the extractor; only the byte
/// streams themselves can fail it.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the vendor text or writing the canonical stream failed.
    #[error("extraction failed: {0}")]
    Io(#[from] io::Error),
}

/// A vendor format scanner.
pub trait Extractor: Send + Sync {
    /// Short vendor tag, e.g. for diagnostics.
    fn name(&self) -> &'static str;

    /// Scan `input` line by line and emit one canonical document to `out`.
    fn extract(&self, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<(), ExtractError>;
}

/// Vendor formats with a bundled extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// Sun/Oracle HotSpot text dumps.
    Sun,
    /// IBM javacore dumps.
    Ibm,
}

impl Vendor {
    pub const ALL: [Vendor; 2] = [Vendor::Sun, Vendor::Ibm];

    /// Tag used to select the vendor on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Sun => "sun",
            Vendor::Ibm => "ibm",
        }
    }

    /// Create the extractor for this vendor.
    pub fn create_extractor(&self) -> Box<dyn Extractor> {
        match self {
            Vendor::Sun => Box::new(SunExtractor),
            Vendor::Ibm => Box::new(IbmExtractor),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sun" => Ok(Vendor::Sun),
            "ibm" => Ok(Vendor::Ibm),
            other => Err(format!("unknown dump format '{other}' (expected sun or ibm)")),
        }
    }
}

// ============================================================================
// Line scanning helpers shared by the extractors
// ============================================================================

/// Read one line into `buf` with the trailing newline (and any carriage
/// return) removed. Returns false at end of input.
pub(crate) fn read_line<R: BufRead + ?Sized>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(true)
}

/// Split the source location a frame line carries after its opening paren,
/// e.g. `Task.java:42)` or `Native Method)`. Frames without a `file:line`
/// pair map to the native sentinel.
pub(crate) fn source_location(inner: &str) -> (&str, i32) {
    match inner.split_once(':') {
        Some((file, rest)) => (file, leading_number(rest)),
        None => (NATIVE_FILE, NATIVE_LINE),
    }
}

/// Numeric prefix of `s`, ignoring whatever follows it. No digits parse as 0.
pub(crate) fn leading_number(s: &str) -> i32 {
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    s[..digits].parse().unwrap_or(0)
}
