//! Color engine: spaces, conversions, CSS parsing and printing.

pub mod cms;
pub mod color;
pub mod color_set;
pub mod components;
pub mod gamut;
pub mod manager;
pub mod parser;
pub mod printer;
pub mod space;
pub mod utils;

pub use cms::{BuiltinCms, CmsBackend, ColorTransform, GamutChecker, Profile, RenderingIntent};
pub use color::{COLOR_EPSILON, Color};
pub use color_set::{ColorSet, ColorSetEvent, ObserverId};
pub use components::{Component, Components, Traits, Unit};
pub use gamut::{JND, to_gamut_css, to_gamut_css_in};
pub use manager::Manager;
pub use parser::{ColorParser, ParsedColor, Parsers};
pub use space::{AnySpace, SpaceModel, SpaceType};
