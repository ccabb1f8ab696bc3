//! tdstrip - CLI entry point
//!
//! Extracts java thread dumps from vendor log files and prints them in the
//! canonical XML format on standard output.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use tdstream::Vendor;

#[derive(Parser)]
#[command(name = "tdstrip")]
#[command(about = "Extract java thread dumps from vendor log files")]
#[command(version)]
struct Cli {
    /// Dump format to extract (sun or ibm)
    #[arg(short = 't', long = "type", value_name = "FORMAT", default_value = "sun")]
    format: Vendor,

    /// Log file to read (standard input when omitted)
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();
    cmd_extract(cli.format, cli.file.as_deref())
}

fn cmd_extract(format: Vendor, file: Option<&Path>) -> Result<()> {
    let mut input: Box<dyn BufRead> = match file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let extractor = format.create_extractor();
    extractor.extract(&mut *input, &mut out)?;
    out.flush()?;

    Ok(())
}

/// Diagnostics go to stderr so the canonical stream on stdout stays clean.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
