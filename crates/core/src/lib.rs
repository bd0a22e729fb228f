//! pigment - color spaces, CSS gamut mapping and a PDF content-stream interpreter.
//!
//! The crate is split in two halves:
//! - [`colors`]: color spaces, conversions, CSS parsing/printing, gamut mapping
//!   and edited color sets.
//! - [`model`] and [`interp`]: the PDF object model and the content-stream
//!   interpreter that drives a [`interp::SceneBuilder`].

pub mod colors;
pub mod config;
pub mod error;
pub mod interp;
pub mod model;
pub mod utils;

pub use colors::{Color, ColorSet, Manager};
pub use config::{GroupBy, InterpreterConfig};
pub use error::{ColorError, ColorResult, PdfError, Result};
pub use interp::{Diagnostics, Interpreter, RecordingBuilder, SceneBuilder, interpret_page};
