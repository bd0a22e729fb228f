//! Page dictionaries: boxes, rotation, resources and contents.

use crate::error::Result;
use crate::model::objects::{ObjectStore, PDFDict, PDFObject};
use crate::utils::{Rect, normalize_rect};

/// US Letter, used when no `MediaBox` is found.
const DEFAULT_MEDIA_BOX: Rect = (0.0, 0.0, 612.0, 792.0);

/// Bound on `Parent` hops when resolving inherited attributes.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Everything the interpreter needs to start a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub label: String,
    /// 1-based page number, used to name annotation layers.
    pub number: u32,
    pub media_box: Rect,
    pub crop_box: Rect,
    pub trim_box: Rect,
    pub art_box: Rect,
    /// Normalized to 0, 90, 180 or 270.
    pub rotate: i64,
    pub resources: PDFDict,
    pub contents: PDFObject,
    pub annots: Vec<PDFObject>,
    /// Document information dictionary.
    pub info: PDFDict,
    /// Box the output is cropped to, if the caller asked for one.
    pub clip_to: Option<Rect>,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            label: String::new(),
            number: 1,
            media_box: DEFAULT_MEDIA_BOX,
            crop_box: DEFAULT_MEDIA_BOX,
            trim_box: DEFAULT_MEDIA_BOX,
            art_box: DEFAULT_MEDIA_BOX,
            rotate: 0,
            resources: PDFDict::new(),
            contents: PDFObject::Null,
            annots: Vec::new(),
            info: PDFDict::new(),
            clip_to: None,
        }
    }
}

impl PageInfo {
    /// Page of the given size with `contents` and `resources`.
    pub fn with_contents(media_box: Rect, contents: PDFObject, resources: PDFDict) -> Self {
        Self {
            media_box,
            crop_box: media_box,
            trim_box: media_box,
            art_box: media_box,
            resources,
            contents,
            ..Self::default()
        }
    }

    /// Reads a page dictionary, following `Parent` for inherited entries.
    pub fn from_dict(page: &PDFDict, store: &dyn ObjectStore, number: u32) -> Result<Self> {
        let inherited = |key: &str| -> PDFObject {
            let mut node = page.clone();
            for _ in 0..MAX_PAGE_TREE_DEPTH {
                let value = store.lookup(&node, key);
                if !value.is_null() {
                    return value;
                }
                match store.lookup(&node, "Parent") {
                    PDFObject::Dict(parent) => node = parent,
                    _ => break,
                }
            }
            PDFObject::Null
        };
        let media_box = read_box(&inherited("MediaBox")).unwrap_or(DEFAULT_MEDIA_BOX);
        let crop_box = read_box(&inherited("CropBox")).unwrap_or(media_box);
        let own_box = |key: &str| read_box(&store.lookup(page, key)).unwrap_or(crop_box);
        let rotate = inherited("Rotate").as_int().unwrap_or(0).rem_euclid(360) / 90 * 90;
        let annots = match store.lookup(page, "Annots") {
            PDFObject::Array(a) => a.iter().map(|o| store.resolve(o)).collect(),
            _ => Vec::new(),
        };
        let resources = match inherited("Resources") {
            PDFObject::Dict(d) => d,
            _ => PDFDict::new(),
        };
        Ok(Self {
            label: number.to_string(),
            number,
            media_box,
            crop_box,
            trim_box: own_box("TrimBox"),
            art_box: own_box("ArtBox"),
            rotate,
            resources,
            contents: store.lookup(page, "Contents"),
            annots,
            info: PDFDict::new(),
            clip_to: None,
        })
    }

    /// Text string entry of the info dictionary, empty when missing.
    pub fn info_string(&self, key: &str) -> String {
        match self.info.get(key) {
            Some(PDFObject::String(bytes)) => decode_text_string(bytes),
            _ => String::new(),
        }
    }
}

fn read_box(obj: &PDFObject) -> Option<Rect> {
    let v = obj.as_num_array().ok()?;
    if v.len() != 4 {
        return None;
    }
    Some(normalize_rect((v[0], v[1], v[2], v[3])))
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, else Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{MemoryStore, dict};

    fn rect(r: [i64; 4]) -> PDFObject {
        PDFObject::Array(r.iter().map(|&v| PDFObject::Int(v)).collect())
    }

    #[test]
    fn test_inherits_from_parent() {
        let mut store = MemoryStore::new();
        let parent = store.add(PDFObject::Dict(dict([
            ("MediaBox", rect([0, 0, 200, 100])),
            ("Rotate", PDFObject::Int(-90)),
        ])));
        let page = dict([
            ("Parent", PDFObject::Ref(parent)),
            ("TrimBox", rect([10, 10, 190, 90])),
        ]);
        let info = PageInfo::from_dict(&page, &store, 3).unwrap();
        assert_eq!(info.media_box, (0.0, 0.0, 200.0, 100.0));
        assert_eq!(info.crop_box, info.media_box);
        assert_eq!(info.trim_box, (10.0, 10.0, 190.0, 90.0));
        assert_eq!(info.art_box, info.crop_box);
        assert_eq!(info.rotate, 270);
        assert_eq!(info.label, "3");
    }

    #[test]
    fn test_text_strings() {
        assert_eq!(decode_text_string(b"caf\xe9"), "café");
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x41, 0x26, 0x3A]), "A☺");
    }
}
