//! Error types for the color engine and the content-stream interpreter.

use thiserror::Error;

/// Error raised by the color engine.
///
/// Conversions never produce this error; they report failure through
/// `Option`/`bool` returns instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ColorError(pub String);

impl ColorError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result alias for color engine operations.
pub type ColorResult<T> = std::result::Result<T, ColorError>;

/// Error raised while reading or interpreting PDF content.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("syntax error at byte {pos}: {msg}")]
    SyntaxError { pos: usize, msg: String },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("missing key /{0}")]
    MissingKey(String),

    #[error("unknown resource {kind} /{name}")]
    MissingResource { kind: &'static str, name: String },

    #[error("unresolved reference {objid} {genno} R")]
    UnresolvedRef { objid: u32, genno: u32 },

    #[error("bad content: {0}")]
    BadContent(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("form nesting deeper than {0}")]
    RecursionLimit(u32),

    #[error("stream decode failed: {0}")]
    DecodeError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Color(#[from] ColorError),
}

/// Result alias for interpreter operations.
pub type Result<T> = std::result::Result<T, PdfError>;
