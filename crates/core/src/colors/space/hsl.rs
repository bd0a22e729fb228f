use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::{CssLegacyPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType};

/// Hue, saturation, lightness over sRGB.
#[derive(Debug, Default)]
pub struct Hsl;

/// Converts normalized HSL into sRGB in place.
pub fn hsl_to_rgb(io: &mut [f64]) {
    let (h, s, l) = (io[0], io[1], io[2]);
    if s == 0.0 {
        io[0] = l;
        io[1] = l;
        io[2] = l;
        return;
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    io[0] = hue_to_channel(p, q, h + 1.0 / 3.0);
    io[1] = hue_to_channel(p, q, h);
    io[2] = hue_to_channel(p, q, h - 1.0 / 3.0);
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t - t.floor();
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Converts sRGB into normalized HSL in place.
pub fn rgb_to_hsl(io: &mut [f64]) {
    let (r, g, b) = (io[0], io[1], io[2]);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;
    if delta == 0.0 {
        io[0] = 0.0;
        io[1] = 0.0;
        io[2] = l;
        return;
    }
    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let mut h = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    h /= 6.0;
    io[0] = h;
    io[1] = s;
    io[2] = l;
}

impl SpaceModel for Hsl {
    fn space_type(&self) -> SpaceType {
        SpaceType::Hsl
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "HSL"
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() >= 3 {
            hsl_to_rgb(io);
        }
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() >= 3 {
            rgb_to_hsl(io);
        }
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssLegacyPrinter::new("hsl")
            .int(values[0] * 360.0)
            .value(values[1] * 100.0)
            .value(values[2] * 100.0)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}
