//! dumpops - Run a PDF content stream and dump the builder notifications
//!
//! The content stream is interpreted on its own, without page resources, and
//! every notification the interpreter raises is printed as a JSON record.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pigment_core::model::objects::dict;
use pigment_core::model::{PDFDict, PDFObject, PDFStream};
use pigment_core::{GroupBy, Interpreter, InterpreterConfig, RecordingBuilder};
use tracing_subscriber::EnvFilter;

/// A command line tool for tracing what a PDF content stream draws.
#[derive(Parser, Debug)]
#[command(name = "dumpops")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a raw content stream, or "-" for stdin
    #[arg(default_value = "-")]
    file: String,

    /// The content stream is FlateDecode compressed
    #[arg(short = 'z', long, action = ArgAction::SetTrue)]
    deflate: bool,

    /// Page width in points
    #[arg(long, default_value = "612")]
    width: f64,

    /// Page height in points
    #[arg(long, default_value = "792")]
    height: f64,

    /// Shading subdivision stops when neighbouring colors differ by at most this
    #[arg(long = "color-delta", default_value = "0.5")]
    color_delta: f64,

    /// Maximum shading subdivision depth
    #[arg(long = "max-depth", default_value = "6")]
    max_depth: u32,

    /// Layer grouping: none, xobject or ocg
    #[arg(long = "group-by", default_value = "none", value_parser = parse_group_by)]
    group_by: GroupBy,

    /// Pretty-print a single JSON array instead of one record per line
    #[arg(short = 'p', long, action = ArgAction::SetTrue)]
    pretty: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Exit with an error status when the interpreter reported errors
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_group_by(s: &str) -> std::result::Result<GroupBy, String> {
    GroupBy::from_name(s).ok_or_else(|| format!("expected none, xobject or ocg, got '{s}'"))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: &str) -> Result<Vec<u8>> {
    if file == "-" {
        let mut data = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Failed to read content stream from stdin")?;
        return Ok(data);
    }
    let path = PathBuf::from(file);
    fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.width <= 0.0 || args.height <= 0.0 {
        bail!("Page size must be positive, got {}x{}", args.width, args.height);
    }

    let data = read_input(&args.file)?;
    let attrs = if args.deflate {
        dict([("Filter", PDFObject::name("FlateDecode"))])
    } else {
        PDFDict::new()
    };
    let contents = PDFObject::from(PDFStream::new(attrs, data));

    let config = InterpreterConfig::default()
        .with_precision(args.color_delta, args.max_depth)
        .with_group_by(args.group_by);
    let store = pigment_core::model::NoStore;
    let mut builder = RecordingBuilder::new();
    let diagnostics = {
        let mut interp = Interpreter::new_sub_page(
            &mut builder,
            &store,
            PDFDict::new(),
            (0.0, 0.0, args.width, args.height),
            config,
        );
        interp.parse(&contents)?;
        interp.finish()
    };

    let writer: Box<dyn Write> = if args.outfile == "-" {
        Box::new(io::stdout().lock())
    } else {
        let file = fs::File::create(&args.outfile)
            .with_context(|| format!("Failed to create {}", args.outfile))?;
        Box::new(file)
    };
    let mut out = BufWriter::new(writer);
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &builder.events)?;
        writeln!(out)?;
    } else {
        for event in &builder.events {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    tracing::info!(
        events = builder.events.len(),
        errors = diagnostics.errors,
        warnings = diagnostics.warnings,
        "content stream interpreted"
    );
    if args.strict && diagnostics.errors > 0 {
        bail!("{} errors while interpreting {}", diagnostics.errors, args.file);
    }
    Ok(())
}
