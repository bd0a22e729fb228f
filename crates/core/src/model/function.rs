//! PDF functions: sampled (type 0), exponential (type 2) and stitching (type 3).
//!
//! PostScript calculator functions (type 4) are reported as unsupported.

use crate::error::{PdfError, Result};
use crate::model::GfxColor;
use crate::model::bits::BitReader;
use crate::model::objects::{ObjectStore, PDFDict, PDFObject};

/// Maps `x` from `[x0, x1]` onto `[y0, y1]`.
#[inline]
fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if (x1 - x0).abs() < f64::EPSILON {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

fn pairs(values: &[f64]) -> Vec<(f64, f64)> {
    values.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    domain: Vec<(f64, f64)>,
    range: Vec<(f64, f64)>,
    size: Vec<usize>,
    encode: Vec<(f64, f64)>,
    decode: Vec<(f64, f64)>,
    samples: Vec<f64>,
}

impl SampledFunction {
    fn parse(dict: &PDFDict, data: &[u8], store: &dyn ObjectStore) -> Result<Self> {
        let nums = |key: &str| store.lookup(dict, key).as_num_array();
        let domain = pairs(&nums("Domain")?);
        let range = pairs(&nums("Range")?);
        let size: Vec<usize> = nums("Size")?.into_iter().map(|s| s.max(1.0) as usize).collect();
        if domain.is_empty() || range.is_empty() || size.len() != domain.len() {
            return Err(PdfError::BadContent("sampled function dimensions".into()));
        }
        let bits = store.lookup(dict, "BitsPerSample").as_int()? as u32;
        if !matches!(bits, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32) {
            return Err(PdfError::BadContent(format!("BitsPerSample {bits}")));
        }
        let encode = match nums("Encode") {
            Ok(v) if v.len() == 2 * size.len() => pairs(&v),
            _ => size.iter().map(|&s| (0.0, (s - 1) as f64)).collect(),
        };
        let decode = match nums("Decode") {
            Ok(v) if v.len() == 2 * range.len() => pairs(&v),
            _ => range.clone(),
        };

        let count = size.iter().product::<usize>() * range.len();
        let mut reader = BitReader::new(data);
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            let v = reader
                .read_scaled(bits, 0.0, 1.0)
                .ok_or_else(|| PdfError::BadContent("sampled function data too short".into()))?;
            samples.push(v);
        }
        Ok(Self {
            domain,
            range,
            size,
            encode,
            decode,
            samples,
        })
    }

    fn eval(&self, input: &[f64]) -> GfxColor {
        let m = self.domain.len();
        let n = self.range.len();
        // Per input dimension: lower sample index and fraction towards the next.
        let mut lower = Vec::with_capacity(m);
        let mut frac = Vec::with_capacity(m);
        for i in 0..m {
            let (d0, d1) = self.domain[i];
            let x = input.get(i).copied().unwrap_or(d0).clamp(d0.min(d1), d0.max(d1));
            let (e0, e1) = self.encode[i];
            let max = (self.size[i] - 1) as f64;
            let e = interpolate(x, d0, d1, e0, e1).clamp(0.0, max);
            let lo = e.floor().min((max - 1.0).max(0.0));
            lower.push(lo as usize);
            frac.push(e - lo);
        }

        let mut out = GfxColor::new();
        for j in 0..n {
            let mut acc = 0.0;
            for corner in 0..(1usize << m) {
                let mut weight = 1.0;
                let mut index = 0;
                let mut stride = 1;
                for i in 0..m {
                    let up = (corner >> i) & 1 == 1;
                    let idx = (lower[i] + usize::from(up)).min(self.size[i] - 1);
                    weight *= if up { frac[i] } else { 1.0 - frac[i] };
                    index += idx * stride;
                    stride *= self.size[i];
                }
                if weight != 0.0 {
                    acc += weight * self.samples[index * n + j];
                }
            }
            let (dec0, dec1) = self.decode[j];
            let (r0, r1) = self.range[j];
            out.push(interpolate(acc, 0.0, 1.0, dec0, dec1).clamp(r0.min(r1), r0.max(r1)));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFunction {
    domain: (f64, f64),
    range: Option<Vec<(f64, f64)>>,
    c0: Vec<f64>,
    c1: Vec<f64>,
    n: f64,
}

impl ExponentialFunction {
    fn parse(dict: &PDFDict, store: &dyn ObjectStore) -> Result<Self> {
        let domain = store.lookup(dict, "Domain").as_num_array()?;
        if domain.len() < 2 {
            return Err(PdfError::BadContent("exponential function domain".into()));
        }
        let c0 = store.lookup(dict, "C0").as_num_array().unwrap_or_else(|_| vec![0.0]);
        let c1 = store.lookup(dict, "C1").as_num_array().unwrap_or_else(|_| vec![1.0]);
        if c0.len() != c1.len() {
            return Err(PdfError::BadContent("exponential function C0/C1 size".into()));
        }
        Ok(Self {
            domain: (domain[0], domain[1]),
            range: store.lookup(dict, "Range").as_num_array().ok().map(|r| pairs(&r)),
            c0,
            c1,
            n: store.lookup(dict, "N").as_num()?,
        })
    }

    fn eval(&self, input: &[f64]) -> GfxColor {
        let (d0, d1) = self.domain;
        let x = input.first().copied().unwrap_or(d0).clamp(d0.min(d1), d0.max(d1));
        let t = x.powf(self.n);
        self.c0
            .iter()
            .zip(&self.c1)
            .enumerate()
            .map(|(i, (&a, &b))| {
                let v = a + t * (b - a);
                match self.range.as_ref().and_then(|r| r.get(i)) {
                    Some(&(r0, r1)) => v.clamp(r0.min(r1), r0.max(r1)),
                    None => v,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StitchingFunction {
    domain: (f64, f64),
    functions: Vec<PdfFunction>,
    bounds: Vec<f64>,
    encode: Vec<(f64, f64)>,
}

impl StitchingFunction {
    fn parse(dict: &PDFDict, store: &dyn ObjectStore, depth: u32) -> Result<Self> {
        let domain = store.lookup(dict, "Domain").as_num_array()?;
        if domain.len() < 2 {
            return Err(PdfError::BadContent("stitching function domain".into()));
        }
        let functions = store
            .lookup(dict, "Functions")
            .as_array()?
            .iter()
            .map(|f| PdfFunction::parse_nested(f, store, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        let k = functions.len();
        let bounds = store.lookup(dict, "Bounds").as_num_array()?;
        let encode = pairs(&store.lookup(dict, "Encode").as_num_array()?);
        if k == 0 || bounds.len() + 1 != k || encode.len() != k {
            return Err(PdfError::BadContent("stitching function sizes".into()));
        }
        Ok(Self {
            domain: (domain[0], domain[1]),
            functions,
            bounds,
            encode,
        })
    }

    fn eval(&self, input: &[f64]) -> GfxColor {
        let (d0, d1) = self.domain;
        let x = input.first().copied().unwrap_or(d0).clamp(d0.min(d1), d0.max(d1));
        let i = self.bounds.iter().take_while(|&&b| x >= b).count();
        let lo = if i == 0 { d0 } else { self.bounds[i - 1] };
        let hi = if i == self.bounds.len() { d1 } else { self.bounds[i] };
        let (e0, e1) = self.encode[i];
        self.functions[i].eval(&[interpolate(x, lo, hi, e0, e1)])
    }
}

/// A parsed PDF function.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfFunction {
    /// `/Identity`, used by transfer functions.
    Identity,
    Sampled(SampledFunction),
    Exponential(ExponentialFunction),
    Stitching(StitchingFunction),
}

impl PdfFunction {
    /// Parses a function dictionary, stream or the name `/Identity`.
    pub fn parse(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Self> {
        Self::parse_nested(obj, store, 0)
    }

    fn parse_nested(obj: &PDFObject, store: &dyn ObjectStore, depth: u32) -> Result<Self> {
        if depth > 8 {
            return Err(PdfError::BadContent("functions nested too deep".into()));
        }
        let obj = store.resolve(obj);
        if obj.is_name("Identity") {
            return Ok(Self::Identity);
        }
        let dict = obj.dict().ok_or(PdfError::TypeError {
            expected: "function",
            got: obj.type_name(),
        })?;
        match store.lookup(dict, "FunctionType").as_int()? {
            0 => {
                let stream = obj.as_stream()?;
                let data = stream.decode()?;
                Ok(Self::Sampled(SampledFunction::parse(dict, &data, store)?))
            }
            2 => Ok(Self::Exponential(ExponentialFunction::parse(dict, store)?)),
            3 => Ok(Self::Stitching(StitchingFunction::parse(dict, store, depth)?)),
            4 => Err(PdfError::Unsupported("PostScript calculator function".into())),
            other => Err(PdfError::BadContent(format!("unknown function type {other}"))),
        }
    }

    /// Number of inputs; `None` for the identity.
    pub fn input_size(&self) -> Option<usize> {
        match self {
            Self::Identity => None,
            Self::Sampled(f) => Some(f.domain.len()),
            Self::Exponential(_) | Self::Stitching(_) => Some(1),
        }
    }

    /// Number of outputs; `None` for the identity.
    pub fn output_size(&self) -> Option<usize> {
        match self {
            Self::Identity => None,
            Self::Sampled(f) => Some(f.range.len()),
            Self::Exponential(f) => Some(f.c0.len()),
            Self::Stitching(f) => f.functions.first().and_then(Self::output_size),
        }
    }

    pub fn eval(&self, input: &[f64]) -> GfxColor {
        match self {
            Self::Identity => input.iter().copied().collect(),
            Self::Sampled(f) => f.eval(input),
            Self::Exponential(f) => f.eval(input),
            Self::Stitching(f) => f.eval(input),
        }
    }
}

/// Parses either one function or an array of single-output functions.
pub fn parse_functions(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Vec<PdfFunction>> {
    match store.resolve(obj) {
        PDFObject::Array(items) => items.iter().map(|f| PdfFunction::parse(f, store)).collect(),
        single => Ok(vec![PdfFunction::parse(&single, store)?]),
    }
}

/// Evaluates a function list, concatenating the outputs.
pub fn eval_functions(functions: &[PdfFunction], input: &[f64]) -> GfxColor {
    if let [single] = functions {
        return single.eval(input);
    }
    functions.iter().flat_map(|f| f.eval(input)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{NoStore, PDFStream, dict};

    fn nums(v: &[f64]) -> PDFObject {
        PDFObject::Array(v.iter().map(|&x| PDFObject::Real(x)).collect())
    }

    #[test]
    fn test_exponential_linear() {
        let f = PDFObject::Dict(dict([
            ("FunctionType", PDFObject::Int(2)),
            ("Domain", nums(&[0.0, 1.0])),
            ("C0", nums(&[0.0, 0.0, 1.0])),
            ("C1", nums(&[1.0, 0.0, 0.0])),
            ("N", PDFObject::Int(1)),
        ]));
        let f = PdfFunction::parse(&f, &NoStore).unwrap();
        assert_eq!(f.output_size(), Some(3));
        assert_eq!(f.eval(&[0.25]).as_slice(), &[0.25, 0.0, 0.75]);
        assert_eq!(f.eval(&[2.0]).as_slice(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stitching_picks_subdomain() {
        let half = |c0: f64, c1: f64| {
            PDFObject::Dict(dict([
                ("FunctionType", PDFObject::Int(2)),
                ("Domain", nums(&[0.0, 1.0])),
                ("C0", nums(&[c0])),
                ("C1", nums(&[c1])),
                ("N", PDFObject::Int(1)),
            ]))
        };
        let f = PDFObject::Dict(dict([
            ("FunctionType", PDFObject::Int(3)),
            ("Domain", nums(&[0.0, 1.0])),
            ("Functions", PDFObject::Array(vec![half(0.0, 1.0), half(1.0, 0.0)])),
            ("Bounds", nums(&[0.5])),
            ("Encode", nums(&[0.0, 1.0, 0.0, 1.0])),
        ]));
        let f = PdfFunction::parse(&f, &NoStore).unwrap();
        assert!((f.eval(&[0.25])[0] - 0.5).abs() < 1e-12);
        assert!((f.eval(&[0.5])[0] - 1.0).abs() < 1e-12);
        assert!((f.eval(&[1.0])[0]).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_interpolates() {
        let attrs = dict([
            ("FunctionType", PDFObject::Int(0)),
            ("Domain", nums(&[0.0, 1.0])),
            ("Range", nums(&[0.0, 1.0])),
            ("Size", PDFObject::Array(vec![PDFObject::Int(2)])),
            ("BitsPerSample", PDFObject::Int(8)),
        ]);
        let obj = PDFObject::from(PDFStream::new(attrs, vec![0u8, 255]));
        let f = PdfFunction::parse(&obj, &NoStore).unwrap();
        assert!((f.eval(&[0.5])[0] - 0.5).abs() < 1e-9);
        assert!((f.eval(&[1.0])[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_type4_unsupported() {
        let obj = PDFObject::Dict(dict([("FunctionType", PDFObject::Int(4))]));
        assert!(matches!(
            PdfFunction::parse(&obj, &NoStore),
            Err(PdfError::Unsupported(_))
        ));
    }
}
