//! Interpreter configuration.

/// Default per-channel color difference below which shading subdivision stops.
pub const DEFAULT_SHADING_COLOR_DELTA: f64 = 0.5;

/// Default maximum recursion depth for shading subdivision.
pub const DEFAULT_SHADING_MAX_DEPTH: u32 = 6;

/// Default maximum nesting of form XObjects and soft masks.
pub const DEFAULT_MAX_FORM_DEPTH: u32 = 20;

/// Default maximum number of operands accepted before an operator.
pub const DEFAULT_MAX_ARGS: usize = 33;

/// How the output is expected to be grouped into layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// No grouping; marked content is always forwarded.
    #[default]
    None,
    /// One layer per top-level XObject; marked content inside forms is dropped.
    XObject,
    /// One layer per optional content group.
    OptionalContent,
}

impl GroupBy {
    /// Parses the CLI spelling (`none`, `xobject`, `ocg`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "xobject" | "by-xobject" => Some(Self::XObject),
            "ocg" | "optional-content" | "by-ocgs" => Some(Self::OptionalContent),
            _ => None,
        }
    }
}

/// Parameters controlling content-stream interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// Shading subdivision stops once every channel of neighbouring samples
    /// differs by at most this amount.
    pub color_delta: f64,

    /// Hard bound on shading subdivision depth.
    pub max_depth: u32,

    /// Forms and soft masks nested deeper than this are skipped.
    pub max_form_depth: u32,

    /// Operands beyond this count are reported and discarded.
    pub max_args: usize,

    /// Layer grouping expected by the builder.
    pub group_by: GroupBy,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            color_delta: DEFAULT_SHADING_COLOR_DELTA,
            max_depth: DEFAULT_SHADING_MAX_DEPTH,
            max_form_depth: DEFAULT_MAX_FORM_DEPTH,
            max_args: DEFAULT_MAX_ARGS,
            group_by: GroupBy::None,
        }
    }
}

impl InterpreterConfig {
    /// Returns a copy with different shading precision.
    pub fn with_precision(mut self, color_delta: f64, max_depth: u32) -> Self {
        self.color_delta = color_delta;
        self.max_depth = max_depth;
        self
    }

    /// Returns a copy with a different grouping mode.
    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }
}
