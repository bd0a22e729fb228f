//! PDF content stream interpretation.
//!
//! This module contains:
//! - `lexer`: Tokenizer turning content bytes into operands and operators
//! - `optable`: The operator table with arity and operand type checks
//! - `interpreter`: The driver loop, graphics state stack and page setup
//! - `ops`: Operator implementations by category
//! - `clip`: The clip history kept alongside the state stack
//! - `resources`: Nested resource dictionaries of pages and forms
//! - `builder`: The output trait and a recording implementation

pub mod builder;
pub mod clip;
pub mod interpreter;
pub mod lexer;
pub mod ops;
pub mod optable;
pub mod resources;

pub use builder::{BuilderEvent, CharInfo, GroupParams, ImageData, RecordingBuilder, SceneBuilder};
pub use clip::{ClipHistory, ClipPath, FillRule};
pub use interpreter::{Diagnostics, Interpreter, interpret_page, page_ctm};
pub use lexer::{ContentParser, ContentToken, InlineImage};
pub use optable::{ArgType, MAX_ARGS, OP_TABLE, Op, OpSpec, find_op};
pub use resources::ResourceStack;
