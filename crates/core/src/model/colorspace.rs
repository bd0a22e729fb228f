//! PDF color spaces and their mapping onto the color engine.

use std::sync::Arc;

use crate::colors::space::Lab as LabModel;
use crate::colors::{Color, Manager, SpaceType};
use crate::error::{PdfError, Result};
use crate::model::GfxColor;
use crate::model::function::{PdfFunction, eval_functions, parse_functions};
use crate::model::objects::{ObjectStore, PDFObject, PDFStream};

/// Nesting bound for base/alternate spaces.
const MAX_NESTING: u32 = 8;

/// A PDF color space.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray,
    CalRgb,
    Lab {
        white_point: [f64; 3],
        /// `[amin, amax, bmin, bmax]`
        range: [f64; 4],
    },
    IccBased {
        n: usize,
        alt: Option<Box<PdfColorSpace>>,
        range: Vec<(f64, f64)>,
        profile: Option<Arc<PDFStream>>,
    },
    Indexed {
        base: Box<PdfColorSpace>,
        hival: usize,
        lookup: Vec<u8>,
    },
    Separation {
        name: String,
        alt: Box<PdfColorSpace>,
        tint: Vec<PdfFunction>,
    },
    DeviceN {
        names: Vec<String>,
        alt: Box<PdfColorSpace>,
        tint: Vec<PdfFunction>,
    },
    Pattern {
        under: Option<Box<PdfColorSpace>>,
    },
}

impl PdfColorSpace {
    /// Device spaces and their inline image abbreviations.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "G" => Some(Self::DeviceGray),
            "DeviceRGB" | "RGB" => Some(Self::DeviceRgb),
            "DeviceCMYK" | "CMYK" => Some(Self::DeviceCmyk),
            "CalGray" => Some(Self::CalGray),
            "CalRGB" => Some(Self::CalRgb),
            "Pattern" => Some(Self::Pattern { under: None }),
            _ => None,
        }
    }

    /// Parses a color space name or array.
    pub fn parse(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Self> {
        Self::parse_nested(obj, store, 0)
    }

    fn parse_nested(obj: &PDFObject, store: &dyn ObjectStore, depth: u32) -> Result<Self> {
        if depth > MAX_NESTING {
            return Err(PdfError::BadContent("color space nested too deep".into()));
        }
        let obj = store.resolve(obj);
        let items = match &obj {
            PDFObject::Name(name) => {
                return Self::from_name(name)
                    .ok_or_else(|| PdfError::BadContent(format!("bad color space /{name}")));
            }
            PDFObject::Array(items) if !items.is_empty() => items,
            other => {
                return Err(PdfError::TypeError {
                    expected: "color space",
                    got: other.type_name(),
                });
            }
        };
        let family = store.resolve(&items[0]);
        let family = family.as_name()?;
        let arg = |i: usize| items.get(i).map(|o| store.resolve(o)).unwrap_or_default();
        let nested = |o: &PDFObject| Self::parse_nested(o, store, depth + 1).map(Box::new);

        match family {
            "Lab" => {
                let params = arg(1);
                let white = params
                    .get("WhitePoint")
                    .and_then(|w| store.resolve(w).as_num_array().ok())
                    .filter(|w| w.len() == 3)
                    .map_or([0.9505, 1.0, 1.089], |w| [w[0], w[1], w[2]]);
                let range = params
                    .get("Range")
                    .and_then(|r| store.resolve(r).as_num_array().ok())
                    .filter(|r| r.len() == 4)
                    .map_or([-100.0, 100.0, -100.0, 100.0], |r| [r[0], r[1], r[2], r[3]]);
                Ok(Self::Lab {
                    white_point: white,
                    range,
                })
            }
            "ICCBased" => {
                let stream = arg(1);
                let stream = stream.as_stream()?;
                let n = stream
                    .get("N")
                    .map(|n| store.resolve(n))
                    .and_then(|n| n.as_int().ok())
                    .ok_or_else(|| PdfError::MissingKey("N".into()))? as usize;
                if !matches!(n, 1 | 3 | 4) {
                    return Err(PdfError::BadContent(format!("ICCBased with {n} components")));
                }
                let alt = match stream.get("Alternate") {
                    Some(a) => Some(nested(a)?),
                    None => None,
                };
                let range = stream
                    .get("Range")
                    .and_then(|r| store.resolve(r).as_num_array().ok())
                    .filter(|r| r.len() == 2 * n)
                    .map_or_else(
                        || vec![(0.0, 1.0); n],
                        |r| r.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
                    );
                Ok(Self::IccBased {
                    n,
                    alt,
                    range,
                    profile: Some(stream.clone()),
                })
            }
            "Indexed" | "I" => {
                let base = nested(&arg(1))?;
                let hival = arg(2).as_int()?.clamp(0, 255) as usize;
                let lookup = match arg(3) {
                    PDFObject::String(bytes) => bytes,
                    PDFObject::Stream(s) => s.decode()?.to_vec(),
                    other => {
                        return Err(PdfError::TypeError {
                            expected: "lookup table",
                            got: other.type_name(),
                        });
                    }
                };
                if lookup.len() < (hival + 1) * base.n_comps() {
                    return Err(PdfError::BadContent("Indexed lookup table too short".into()));
                }
                Ok(Self::Indexed {
                    base,
                    hival,
                    lookup,
                })
            }
            "Separation" => Ok(Self::Separation {
                name: arg(1).as_name()?.to_string(),
                alt: nested(&arg(2))?,
                tint: parse_functions(&arg(3), store)?,
            }),
            "DeviceN" => {
                let names = arg(1)
                    .as_array()?
                    .iter()
                    .map(|n| n.as_name().map(str::to_string))
                    .collect::<Result<Vec<_>>>()?;
                if names.is_empty() {
                    return Err(PdfError::BadContent("DeviceN without colorants".into()));
                }
                Ok(Self::DeviceN {
                    names,
                    alt: nested(&arg(2))?,
                    tint: parse_functions(&arg(3), store)?,
                })
            }
            "Pattern" => {
                let under = match items.get(1) {
                    Some(u) => Some(nested(u)?),
                    None => None,
                };
                Ok(Self::Pattern { under })
            }
            name => Self::from_name(name)
                .ok_or_else(|| PdfError::BadContent(format!("bad color space /{name}"))),
        }
    }

    /// PDF family name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRgb => "CalRGB",
            Self::Lab { .. } => "Lab",
            Self::IccBased { .. } => "ICCBased",
            Self::Indexed { .. } => "Indexed",
            Self::Separation { .. } => "Separation",
            Self::DeviceN { .. } => "DeviceN",
            Self::Pattern { .. } => "Pattern",
        }
    }

    pub fn n_comps(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray | Self::Indexed { .. } | Self::Separation { .. } => 1,
            Self::Pattern { .. } => 1,
            Self::DeviceRgb | Self::CalRgb | Self::Lab { .. } => 3,
            Self::DeviceCmyk => 4,
            Self::IccBased { n, .. } => *n,
            Self::DeviceN { names, .. } => names.len(),
        }
    }

    pub const fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// Underlying space of a pattern space.
    pub fn pattern_under(&self) -> Option<&PdfColorSpace> {
        match self {
            Self::Pattern { under } => under.as_deref(),
            _ => None,
        }
    }

    /// Initial color selected together with the space.
    pub fn default_color(&self) -> GfxColor {
        match self {
            Self::DeviceCmyk => GfxColor::from_slice(&[0.0, 0.0, 0.0, 1.0]),
            Self::Lab { range, .. } => GfxColor::from_slice(&[
                0.0,
                0.0_f64.clamp(range[0].min(range[1]), range[0].max(range[1])),
                0.0_f64.clamp(range[2].min(range[3]), range[2].max(range[3])),
            ]),
            Self::IccBased { range, .. } => range
                .iter()
                .map(|&(lo, hi)| 0.0_f64.clamp(lo.min(hi), lo.max(hi)))
                .collect(),
            Self::Separation { .. } | Self::DeviceN { .. } => {
                std::iter::repeat_n(1.0, self.n_comps()).collect()
            }
            _ => std::iter::repeat_n(0.0, self.n_comps()).collect(),
        }
    }

    /// Per component value range used by Indexed lookups.
    fn component_range(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Lab { range, .. } => match i {
                0 => (0.0, 100.0),
                1 => (range[0], range[1]),
                _ => (range[2], range[3]),
            },
            Self::IccBased { range, .. } => range.get(i).copied().unwrap_or((0.0, 1.0)),
            _ => (0.0, 1.0),
        }
    }

    /// Converts `values` into a color of the engine's registered spaces.
    ///
    /// Indexed, Separation and DeviceN colors are first resolved through
    /// their base or alternate space. Pattern spaces yield the color of
    /// their underlying space, if any.
    pub fn to_color(&self, values: &[f64], manager: &Manager) -> Option<Color> {
        let with = |space_type: SpaceType, n: usize| -> Option<Color> {
            if values.len() < n {
                return None;
            }
            let space = manager.find(space_type)?;
            let vals = values[..n].iter().map(|v| v.clamp(0.0, 1.0)).collect();
            Some(Color::new(space, vals))
        };
        match self {
            Self::DeviceGray | Self::CalGray => with(SpaceType::Gray, 1),
            Self::DeviceRgb | Self::CalRgb => with(SpaceType::Rgb, 3),
            Self::DeviceCmyk => with(SpaceType::Cmyk, 4),
            Self::Lab { .. } => {
                if values.len() < 3 {
                    return None;
                }
                let space = manager.find(SpaceType::Lab)?;
                let scaled = LabModel::scale_down([values[0], values[1], values[2]]);
                Some(Color::new(space, scaled.to_vec()))
            }
            Self::IccBased { n, alt, .. } => match alt {
                Some(alt) => alt.to_color(values, manager),
                None => match n {
                    1 => with(SpaceType::Gray, 1),
                    3 => with(SpaceType::Rgb, 3),
                    _ => with(SpaceType::Cmyk, 4),
                },
            },
            Self::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (values.first()?.round().max(0.0) as usize).min(*hival);
                let n = base.n_comps();
                let entry = lookup.get(index * n..(index + 1) * n)?;
                let base_values: Vec<f64> = entry
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| {
                        let (lo, hi) = base.component_range(i);
                        lo + (b as f64 / 255.0) * (hi - lo)
                    })
                    .collect();
                base.to_color(&base_values, manager)
            }
            Self::Separation { alt, tint, .. } | Self::DeviceN { alt, tint, .. } => {
                alt.to_color(&eval_functions(tint, values), manager)
            }
            Self::Pattern { under } => under.as_ref()?.to_color(values, manager),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{NoStore, dict};

    #[test]
    fn test_device_defaults() {
        assert_eq!(PdfColorSpace::DeviceCmyk.default_color().as_slice(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(PdfColorSpace::DeviceRgb.n_comps(), 3);
        assert_eq!(PdfColorSpace::from_name("G"), Some(PdfColorSpace::DeviceGray));
        assert!(PdfColorSpace::from_name("Indexed").is_none());
    }

    #[test]
    fn test_indexed_lookup_to_rgb() {
        let obj = PDFObject::Array(vec![
            PDFObject::name("Indexed"),
            PDFObject::name("DeviceRGB"),
            PDFObject::Int(1),
            PDFObject::String(vec![255, 0, 0, 0, 0, 255]),
        ]);
        let cs = PdfColorSpace::parse(&obj, &NoStore).unwrap();
        assert_eq!(cs.n_comps(), 1);
        let color = cs.to_color(&[1.0], Manager::get()).unwrap();
        assert_eq!(color.space().space_type(), SpaceType::Rgb);
        assert_eq!(color.values(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pattern_with_under_space() {
        let obj = PDFObject::Array(vec![PDFObject::name("Pattern"), PDFObject::name("DeviceGray")]);
        let cs = PdfColorSpace::parse(&obj, &NoStore).unwrap();
        assert!(cs.is_pattern());
        assert_eq!(cs.pattern_under(), Some(&PdfColorSpace::DeviceGray));
    }

    #[test]
    fn test_lab_default_clamped_into_range() {
        let obj = PDFObject::Array(vec![
            PDFObject::name("Lab"),
            PDFObject::Dict(dict([(
                "Range",
                PDFObject::Array(vec![
                    PDFObject::Int(10),
                    PDFObject::Int(20),
                    PDFObject::Int(-5),
                    PDFObject::Int(5),
                ]),
            )])),
        ]);
        let cs = PdfColorSpace::parse(&obj, &NoStore).unwrap();
        assert_eq!(cs.default_color().as_slice(), &[0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_bad_family_rejected() {
        let obj = PDFObject::Array(vec![PDFObject::name("Bogus")]);
        assert!(PdfColorSpace::parse(&obj, &NoStore).is_err());
    }
}
