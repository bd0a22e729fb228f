//! colorconv - Parse, convert and gamut-map CSS colors
//!
//! Reads CSS color strings from the command line (or stdin, one per line),
//! converts them to a target color space and prints them back as CSS.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use pigment_core::colors::utils::rgba_to_hex;
use pigment_core::colors::{AnySpace, Traits, to_gamut_css};
use pigment_core::{Color, Manager};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Output format for converted colors.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// CSS color text (default)
    #[default]
    Css,
    /// `#RRGGBBAA` hex
    Hex,
    /// One JSON object per color
    Json,
}

/// A command line tool for converting CSS colors between color spaces.
#[derive(Parser, Debug)]
#[command(name = "colorconv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSS colors to convert; read from stdin when omitted
    colors: Vec<String>,

    /// Target color space, by CSS name (`oklch`, `device-cmyk`) or space name
    #[arg(short = 't', long = "to")]
    to: Option<String>,

    /// Map out-of-gamut colors into the target space instead of clipping
    #[arg(short = 'g', long, action = ArgAction::SetTrue)]
    gamut: bool,

    /// Include the opacity channel in the output
    #[arg(short = 'a', long, action = ArgAction::SetTrue)]
    alpha: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "css")]
    format: OutputFormat,

    /// List the known color spaces and exit
    #[arg(short = 'l', long, action = ArgAction::SetTrue)]
    list: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct ConvertedColor<'a> {
    input: &'a str,
    space: &'a str,
    values: &'a [f64],
    css: String,
    out_of_gamut: bool,
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

fn find_space(manager: &Manager, name: &str) -> Option<Arc<AnySpace>> {
    manager.find_svg_color_space(name).or_else(|| {
        manager
            .spaces(Traits::PICKER | Traits::INTERNAL | Traits::CMS)
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name) || s.short_name().eq_ignore_ascii_case(name))
    })
}

fn convert(args: &Args, target: Option<&Arc<AnySpace>>, input: &str) -> Result<Color> {
    let color = Color::parse(input).with_context(|| format!("Not a color: '{input}'"))?;
    let Some(target) = target else {
        return Ok(color);
    };
    let converted = if args.gamut {
        to_gamut_css(&color, target)
    } else {
        color.converted_space(target.clone())
    };
    converted.with_context(|| format!("Cannot convert '{input}' to {}", target.name()))
}

fn print_color(out: &mut impl Write, args: &Args, input: &str, color: &Color) -> Result<()> {
    match args.format {
        OutputFormat::Css => writeln!(out, "{}", color.to_css(args.alpha))?,
        OutputFormat::Hex => {
            let rgba = color
                .to_rgba(1.0)
                .with_context(|| format!("No sRGB value for '{input}'"))?;
            writeln!(out, "{}", rgba_to_hex(rgba, args.alpha))?;
        }
        OutputFormat::Json => {
            let record = ConvertedColor {
                input,
                space: color.space().name(),
                values: color.values(),
                css: color.to_css(args.alpha),
                out_of_gamut: color.is_out_of_gamut(&Manager::get().rgb()),
            };
            serde_json::to_writer(&mut *out, &record)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let manager = Manager::get();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.list {
        for space in manager.spaces(Traits::PICKER | Traits::INTERNAL | Traits::CMS) {
            let names = space.svg_names().join(", ");
            writeln!(out, "{}\t{}\t{}", space.name(), space.short_name(), names)?;
        }
        return Ok(());
    }

    let target = match &args.to {
        Some(name) => match find_space(manager, name) {
            Some(space) => Some(space),
            None => bail!("Unknown color space '{name}'"),
        },
        None => None,
    };

    let inputs: Vec<String> = if args.colors.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read colors from stdin")?
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    } else {
        args.colors.clone()
    };

    let mut failures = 0;
    for input in &inputs {
        match convert(&args, target.as_ref(), input) {
            Ok(color) => print_color(&mut out, &args, input, &color)?,
            Err(e) => {
                tracing::error!("{e:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} colors could not be converted", inputs.len());
    }
    Ok(())
}
