//! PDF object types and indirect object resolution.
//!
//! The interpreter never parses a whole file; it receives resource
//! dictionaries and content streams that may still hold references, and
//! resolves them through an [`ObjectStore`].

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::{PdfError, Result};

/// Dictionary with insertion order preserved.
///
/// Order matters for a few lookups such as "the first appearance state".
pub type PDFDict = IndexMap<String, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PDFObject {
    /// Null object
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Font)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data), shared between resource scopes
    Stream(Arc<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Shorthand for a name object.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for ints and reals.
    pub const fn is_num(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Real(_))
    }

    /// True when this is the name `name`.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Self::Name(n) if n == name)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub const fn as_stream(&self) -> Result<&Arc<PDFStream>> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Looks up `key` in a dictionary or in a stream's dictionary.
    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        match self {
            Self::Dict(d) => d.get(key),
            Self::Stream(s) => s.get(key),
            _ => None,
        }
    }

    /// Dictionary of a dict or stream object.
    pub fn dict(&self) -> Option<&PDFDict> {
        match self {
            Self::Dict(d) => Some(d),
            Self::Stream(s) => Some(&s.attrs),
            _ => None,
        }
    }

    /// Numbers of an array, failing on the first non-number.
    pub fn as_num_array(&self) -> Result<Vec<f64>> {
        self.as_array()?.iter().map(Self::as_num).collect()
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

impl From<PDFDict> for PDFObject {
    fn from(dict: PDFDict) -> Self {
        Self::Dict(dict)
    }
}

impl From<PDFStream> for PDFObject {
    fn from(stream: PDFStream) -> Self {
        Self::Stream(Arc::new(stream))
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// PDF Stream - dictionary attributes + binary data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    /// Raw (possibly encoded) data
    rawdata: Bytes,
    /// Object ID (set when stream is part of document)
    pub objid: Option<u32>,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            objid: None,
        }
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Get raw data as shared bytes.
    pub fn rawdata_bytes(&self) -> Bytes {
        self.rawdata.clone()
    }

    /// Check if stream contains a key.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// Get attribute, trying multiple names.
    pub fn get_any(&self, names: &[&str]) -> Option<&PDFObject> {
        names.iter().find_map(|name| self.attrs.get(*name))
    }

    /// Filter names in application order.
    pub fn filters(&self) -> Vec<&str> {
        match self.get_any(&["Filter", "F"]) {
            Some(PDFObject::Name(name)) => vec![name.as_str()],
            Some(PDFObject::Array(arr)) => arr.iter().filter_map(|f| f.as_name().ok()).collect(),
            _ => Vec::new(),
        }
    }

    /// Decodes the stream data.
    ///
    /// FlateDecode (with PNG predictors) and ASCIIHexDecode are applied in
    /// order. Any other filter is reported as unsupported.
    pub fn decode(&self) -> Result<Bytes> {
        let filters = self.filters();
        if filters.is_empty() {
            return Ok(self.rawdata.clone());
        }
        let parms = match self.get_any(&["DecodeParms", "DP"]) {
            Some(PDFObject::Array(arr)) => arr.clone(),
            Some(obj) => vec![obj.clone()],
            None => Vec::new(),
        };
        let mut data = self.rawdata.to_vec();
        for (i, filter) in filters.iter().enumerate() {
            data = match *filter {
                "FlateDecode" | "Fl" => {
                    let out = flate_decode(&data)?;
                    match parms.get(i).and_then(PDFObject::dict) {
                        Some(p) => apply_predictor(out, p)?,
                        None => out,
                    }
                }
                "ASCIIHexDecode" | "AHx" => ascii_hex_decode(&data),
                other => return Err(PdfError::Unsupported(format!("filter /{other}"))),
            };
        }
        Ok(Bytes::from(data))
    }
}

fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(_) if !out.is_empty() => Ok(out),
        Err(e) => Err(PdfError::DecodeError(format!("FlateDecode error: {e}"))),
    }
}

fn ascii_hex_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;
    for &c in data {
        if c == b'>' {
            break;
        }
        let Some(nibble) = (c as char).to_digit(16) else {
            continue;
        };
        match pending.take() {
            Some(high) => out.push((high << 4) | nibble as u8),
            None => pending = Some(nibble as u8),
        }
    }
    if let Some(high) = pending {
        out.push(high << 4);
    }
    out
}

/// Reverses PNG row prediction.
fn apply_predictor(data: Vec<u8>, parms: &PDFDict) -> Result<Vec<u8>> {
    let int = |key: &str, default: i64| parms.get(key).and_then(|v| v.as_int().ok()).unwrap_or(default);
    let predictor = int("Predictor", 1);
    if predictor < 10 {
        if predictor == 2 {
            return Err(PdfError::Unsupported("TIFF predictor".into()));
        }
        return Ok(data);
    }
    let colors = int("Colors", 1).max(1) as usize;
    let bits = int("BitsPerComponent", 8).max(1) as usize;
    let columns = int("Columns", 1).max(1) as usize;
    let row_bytes = (colors * bits * columns).div_ceil(8);
    let bpp = (colors * bits).div_ceil(8).max(1);

    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];
    for chunk in data.chunks(row_bytes + 1) {
        if chunk.len() < row_bytes + 1 {
            break;
        }
        let filter = chunk[0];
        let mut row = chunk[1..].to_vec();
        for i in 0..row_bytes {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let upper_left = if i >= bpp { prev[i - bpp] } else { 0 };
            row[i] = match filter {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, upper_left)),
                other => {
                    return Err(PdfError::DecodeError(format!("bad PNG filter type {other}")));
                }
            };
        }
        out.extend_from_slice(&row);
        prev = row;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Maximum chain of references followed by [`ObjectStore::resolve`].
const MAX_REF_CHAIN: usize = 32;

/// Source of indirect objects.
pub trait ObjectStore {
    /// Object stored under `r`, if any.
    fn get_object(&self, r: &PDFObjRef) -> Option<PDFObject>;

    /// Document catalog, used for optional content and output intents.
    fn catalog(&self) -> Option<PDFDict> {
        None
    }

    /// Follows references until a direct object is reached.
    ///
    /// Dangling references resolve to `Null`.
    fn resolve(&self, obj: &PDFObject) -> PDFObject {
        let mut current = obj.clone();
        for _ in 0..MAX_REF_CHAIN {
            match current {
                PDFObject::Ref(r) => match self.get_object(&r) {
                    Some(next) => current = next,
                    None => {
                        tracing::debug!(objid = r.objid, genno = r.genno, "unresolved reference");
                        return PDFObject::Null;
                    }
                },
                direct => return direct,
            }
        }
        PDFObject::Null
    }

    /// Resolves `key` in `dict`.
    fn lookup(&self, dict: &PDFDict, key: &str) -> PDFObject {
        dict.get(key).map(|v| self.resolve(v)).unwrap_or_default()
    }
}

/// Store that never resolves anything; every object is direct.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStore;

impl ObjectStore for NoStore {
    fn get_object(&self, _r: &PDFObjRef) -> Option<PDFObject> {
        None
    }
}

/// In-memory object table.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: FxHashMap<PDFObjRef, PDFObject>,
    catalog: Option<PDFDict>,
    next_id: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Stores `obj` under a fresh object number.
    pub fn add(&mut self, obj: impl Into<PDFObject>) -> PDFObjRef {
        let r = PDFObjRef::new(self.next_id.max(1), 0);
        self.next_id = r.objid + 1;
        self.objects.insert(r, obj.into());
        r
    }

    /// Stores `obj` under `objid`, replacing any previous object.
    pub fn insert(&mut self, objid: u32, obj: impl Into<PDFObject>) -> PDFObjRef {
        let r = PDFObjRef::new(objid, 0);
        self.objects.insert(r, obj.into());
        self.next_id = self.next_id.max(objid + 1);
        r
    }

    pub fn set_catalog(&mut self, catalog: PDFDict) {
        self.catalog = Some(catalog);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, r: &PDFObjRef) -> Option<PDFObject> {
        self.objects.get(r).cloned()
    }

    fn catalog(&self) -> Option<PDFDict> {
        self.catalog.clone()
    }
}

/// Builds a dictionary from `(key, value)` pairs.
pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, PDFObject)>) -> PDFDict {
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
