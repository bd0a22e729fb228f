//! Fonts as seen by the text operators: byte decoding and glyph advances.
//!
//! Glyph outlines are out of scope; a font only has to split a string into
//! character codes and report how far each one moves the pen.

use std::fmt::Debug;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjectStore, PDFDict, PDFObject};

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    pub code: u32,
    /// Bytes consumed from the string.
    pub len: usize,
    /// Advance in text space, before font size scaling.
    pub dx: f64,
    pub dy: f64,
    /// Glyph origin offset, vertical fonts only.
    pub origin_x: f64,
    pub origin_y: f64,
    pub unicode: Option<String>,
}

pub trait GfxFont: Debug + Send + Sync {
    /// Resource or base font name.
    fn name(&self) -> &str;

    /// 0 for horizontal writing, 1 for vertical.
    fn wmode(&self) -> u8 {
        0
    }

    /// Decodes the character at the start of `bytes`.
    ///
    /// Returns `None` only when `bytes` is empty.
    fn next_char(&self, bytes: &[u8]) -> Option<DecodedChar>;
}

/// Single-byte font with a `Widths` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFont {
    name: String,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    /// Glyph space to text space, `FontMatrix[0]` for Type3 fonts.
    scale: f64,
}

impl SimpleFont {
    pub fn new(name: impl Into<String>, first_char: u32, widths: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            first_char,
            widths,
            missing_width: 0.0,
            scale: 0.001,
        }
    }

    pub fn from_dict(dict: &PDFDict, store: &dyn ObjectStore) -> Result<Self> {
        let name = store
            .lookup(dict, "BaseFont")
            .as_name()
            .unwrap_or("unnamed")
            .to_string();
        let first_char = store.lookup(dict, "FirstChar").as_int().unwrap_or(0).max(0) as u32;
        let widths = store.lookup(dict, "Widths").as_num_array().unwrap_or_default();
        let missing_width = match store.lookup(dict, "FontDescriptor") {
            PDFObject::Dict(desc) => store.lookup(&desc, "MissingWidth").as_num().unwrap_or(0.0),
            _ => 0.0,
        };
        let scale = match store.lookup(dict, "FontMatrix").as_num_array() {
            Ok(m) if m.len() == 6 => m[0],
            _ => 0.001,
        };
        Ok(Self {
            name,
            first_char,
            widths,
            missing_width,
            scale,
        })
    }

    fn width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }
}

impl GfxFont for SimpleFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_char(&self, bytes: &[u8]) -> Option<DecodedChar> {
        let &b = bytes.first()?;
        let code = b as u32;
        Some(DecodedChar {
            code,
            len: 1,
            dx: self.width(code) * self.scale,
            dy: 0.0,
            origin_x: 0.0,
            origin_y: 0.0,
            unicode: char::from_u32(code).map(String::from),
        })
    }
}

/// Two-byte Type0 font with an `Identity-H` or `Identity-V` encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFont {
    name: String,
    vertical: bool,
    default_width: f64,
    widths: FxHashMap<u32, f64>,
}

/// Vertical displacement and origin from the default `DW2` of `[880 -1000]`.
const DEFAULT_VERTICAL_ORIGIN: f64 = 0.88;
const DEFAULT_VERTICAL_ADVANCE: f64 = -1.0;

impl IdentityFont {
    pub fn new(name: impl Into<String>, vertical: bool, default_width: f64) -> Self {
        Self {
            name: name.into(),
            vertical,
            default_width,
            widths: FxHashMap::default(),
        }
    }

    pub fn set_width(&mut self, cid: u32, width: f64) {
        self.widths.insert(cid, width);
    }

    pub fn from_dict(dict: &PDFDict, store: &dyn ObjectStore, vertical: bool) -> Result<Self> {
        let name = store
            .lookup(dict, "BaseFont")
            .as_name()
            .unwrap_or("unnamed")
            .to_string();
        let descendant = match store.lookup(dict, "DescendantFonts") {
            PDFObject::Array(a) => a
                .first()
                .map(|d| store.resolve(d))
                .unwrap_or(PDFObject::Null),
            _ => PDFObject::Null,
        };
        let mut font = Self::new(name, vertical, 1000.0);
        let Some(desc) = descendant.dict() else {
            return Ok(font);
        };
        if let Ok(dw) = store.lookup(desc, "DW").as_num() {
            font.default_width = dw;
        }
        if let PDFObject::Array(w) = store.lookup(desc, "W") {
            font.load_widths(&w, store)?;
        }
        Ok(font)
    }

    /// Reads a `W` array: `c [w1 w2 ...]` or `c_first c_last w` runs.
    fn load_widths(&mut self, w: &[PDFObject], store: &dyn ObjectStore) -> Result<()> {
        let mut i = 0;
        while i < w.len() {
            let first = w[i].as_int()? as u32;
            match w.get(i + 1).map(|o| store.resolve(o)) {
                Some(PDFObject::Array(run)) => {
                    for (k, v) in run.iter().enumerate() {
                        self.widths.insert(first + k as u32, v.as_num()?);
                    }
                    i += 2;
                }
                Some(last) => {
                    let last = last.as_int()? as u32;
                    let width = w
                        .get(i + 2)
                        .ok_or(PdfError::BadContent("truncated W array".into()))?
                        .as_num()?;
                    for cid in first..=last {
                        self.widths.insert(cid, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
        Ok(())
    }
}

impl GfxFont for IdentityFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn wmode(&self) -> u8 {
        u8::from(self.vertical)
    }

    fn next_char(&self, bytes: &[u8]) -> Option<DecodedChar> {
        let (&hi, rest) = bytes.split_first()?;
        // A trailing odd byte decodes as a one-byte code.
        let (code, len) = match rest.first() {
            Some(&lo) => ((u32::from(hi) << 8) | u32::from(lo), 2),
            None => (u32::from(hi), 1),
        };
        let w = self.widths.get(&code).copied().unwrap_or(self.default_width) * 0.001;
        let decoded = if self.vertical {
            DecodedChar {
                code,
                len,
                dx: 0.0,
                dy: DEFAULT_VERTICAL_ADVANCE,
                origin_x: w / 2.0,
                origin_y: DEFAULT_VERTICAL_ORIGIN,
                unicode: None,
            }
        } else {
            DecodedChar {
                code,
                len,
                dx: w,
                dy: 0.0,
                origin_x: 0.0,
                origin_y: 0.0,
                unicode: None,
            }
        };
        Some(decoded)
    }
}

/// Builds a font from a font resource dictionary.
pub fn load_font(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Arc<dyn GfxFont>> {
    let obj = store.resolve(obj);
    let dict = obj.dict().ok_or(PdfError::TypeError {
        expected: "font",
        got: obj.type_name(),
    })?;
    let subtype = store.lookup(dict, "Subtype");
    match subtype.as_name().unwrap_or("Type1") {
        "Type0" => {
            let encoding = store.lookup(dict, "Encoding");
            match encoding.as_name() {
                Ok("Identity-H") => Ok(Arc::new(IdentityFont::from_dict(dict, store, false)?)),
                Ok("Identity-V") => Ok(Arc::new(IdentityFont::from_dict(dict, store, true)?)),
                _ => Err(PdfError::Unsupported("Type0 font with an embedded CMap".into())),
            }
        }
        _ => Ok(Arc::new(SimpleFont::from_dict(dict, store)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{NoStore, dict};

    #[test]
    fn test_simple_widths() {
        let font = SimpleFont::new("F", 32, vec![250.0, 500.0]);
        let c = font.next_char(b" !").unwrap();
        assert_eq!(c.len, 1);
        assert!((c.dx - 0.25).abs() < 1e-12);
        assert_eq!(c.unicode.as_deref(), Some(" "));
        assert_eq!(font.next_char(b"z").unwrap().dx, 0.0);
        assert!(font.next_char(b"").is_none());
    }

    #[test]
    fn test_identity_w_array() {
        let w = PDFObject::Array(vec![
            PDFObject::Int(1),
            PDFObject::Array(vec![PDFObject::Int(500), PDFObject::Int(600)]),
            PDFObject::Int(10),
            PDFObject::Int(12),
            PDFObject::Int(300),
        ]);
        let desc = PDFObject::Dict(dict([("DW", PDFObject::Int(900)), ("W", w)]));
        let font_dict = dict([
            ("Subtype", PDFObject::name("Type0")),
            ("Encoding", PDFObject::name("Identity-H")),
            ("DescendantFonts", PDFObject::Array(vec![desc])),
        ]);
        let font = load_font(&PDFObject::Dict(font_dict), &NoStore).unwrap();
        assert_eq!(font.wmode(), 0);
        let c = font.next_char(&[0, 2, 0, 11]).unwrap();
        assert_eq!((c.code, c.len), (2, 2));
        assert!((c.dx - 0.6).abs() < 1e-12);
        assert!((font.next_char(&[0, 11]).unwrap().dx - 0.3).abs() < 1e-12);
        assert!((font.next_char(&[0, 99]).unwrap().dx - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_identity_vertical() {
        let font = IdentityFont::new("V", true, 1000.0);
        let c = font.next_char(&[0, 1]).unwrap();
        assert_eq!(font.wmode(), 1);
        assert_eq!(c.dx, 0.0);
        assert_eq!(c.dy, -1.0);
        assert!((c.origin_x - 0.5).abs() < 1e-12);
    }
}
