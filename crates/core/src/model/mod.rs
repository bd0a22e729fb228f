//! PDF model types - objects, functions, color spaces, shadings and state.
//!
//! This module contains the data the content-stream interpreter works on:
//! - `objects` - PDF object types and the `ObjectStore` resolver
//! - `colorspace` / `function` / `shading` - color definitions
//! - `font` - character decoding for text operators
//! - `page` - page boxes, resources and contents
//! - `path` / `state` - the graphics state and path under construction

pub mod bits;
pub mod colorspace;
pub mod font;
pub mod function;
pub mod objects;
pub mod page;
pub mod path;
pub mod shading;
pub mod state;

use smallvec::SmallVec;

/// Color component values in the units of their color space.
pub type GfxColor = SmallVec<[f64; 8]>;

// Re-export main types for convenience
pub use colorspace::PdfColorSpace;
pub use font::{DecodedChar, GfxFont, IdentityFont, SimpleFont, load_font};
pub use function::PdfFunction;
pub use objects::{MemoryStore, NoStore, ObjectStore, PDFDict, PDFObjRef, PDFObject, PDFStream};
pub use page::PageInfo;
pub use path::{GfxPath, PathSegment};
pub use shading::{MeshVertex, Patch, Pattern, Shading, ShadingKind};
pub use state::GfxState;
