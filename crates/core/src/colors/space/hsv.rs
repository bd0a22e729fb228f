use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::{CssFuncPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType};

/// Hue, saturation, value over sRGB. Printed as CSS `hwb()`.
#[derive(Debug, Default)]
pub struct Hsv;

impl Hsv {
    /// Converts whiteness and blackness into HSV saturation and value.
    ///
    /// When `w + b` exceeds one both are scaled down to fit.
    pub fn from_hwb(h: f64, w: f64, b: f64) -> [f64; 3] {
        let (mut w, mut b) = (w, b);
        let sum = w + b;
        if sum > 1.0 {
            w /= sum;
            b /= sum;
        }
        let s = if b == 1.0 { 0.0 } else { 1.0 - w / (1.0 - b) };
        [h, s, 1.0 - b]
    }
}

impl SpaceModel for Hsv {
    fn space_type(&self) -> SpaceType {
        SpaceType::Hsv
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "HSV"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["hwb".into()]
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let (h, s, v) = (io[0], io[1], io[2]);
        let hf = (h - h.floor()) * 5.99999999;
        let sextant = hf.floor();
        let f = hf - sextant;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sextant as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        io[0] = r;
        io[1] = g;
        io[2] = b;
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let (r, g, b) = (io[0], io[1], io[2]);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let v = max;
        let s = if max > 0.0 { delta / max } else { 0.0 };
        let mut h = 0.0;
        if s > 0.0 {
            h = if r == max {
                (g - b) / delta
            } else if g == max {
                2.0 + (b - r) / delta
            } else {
                4.0 + (r - g) / delta
            };
            h /= 6.0;
            if h < 0.0 {
                h += 1.0;
            }
        }
        io[0] = h;
        io[1] = s;
        io[2] = v;
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let (h, s, v) = (values[0], values[1], values[2]);
        CssFuncPrinter::new("hwb")
            .int(h * 360.0)
            .value((1.0 - s) * v * 100.0)
            .value((1.0 - v) * 100.0)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}
