//! CIE L*u*v* and the HSLuv picker space built on it, relative to D65.

use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::{CssFuncPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, scale_down, scale_up};

const REF_U: f64 = 0.19783000664283680764;
const REF_V: f64 = 0.46831999493879100370;
const EPSILON: f64 = 216.0 / 24389.0;
const KAPPA: f64 = 24389.0 / 27.0;

pub const LUV_U_MIN: f64 = -100.0;
pub const LUV_U_MAX: f64 = 200.0;
pub const LUV_V_MIN: f64 = -200.0;
pub const LUV_V_MAX: f64 = 120.0;

// Rows of the XYZ (D65) to linear sRGB matrix.
const D65: [[f64; 3]; 3] = [
    [3.24096994190452134377, -1.53738317757009345794, -0.49861076029300328366],
    [-0.96924363628087982613, 1.87596750150772066772, 0.04155505740717561247],
    [0.05563007969699360846, -0.20397695888897656435, 1.05697151424287856072],
];

fn y_to_l(y: f64) -> f64 {
    if y <= EPSILON {
        y * KAPPA
    } else {
        116.0 * y.cbrt() - 16.0
    }
}

fn l_to_y(l: f64) -> f64 {
    if l <= 8.0 {
        l / KAPPA
    } else {
        ((l + 16.0) / 116.0).powi(3)
    }
}

/// Converts raw L*u*v* into XYZ.
pub fn luv_to_xyz(l: f64, u: f64, v: f64) -> [f64; 3] {
    if l <= 1e-8 {
        return [0.0, 0.0, 0.0];
    }
    let var_u = u / (13.0 * l) + REF_U;
    let var_v = v / (13.0 * l) + REF_V;
    let y = l_to_y(l);
    let x = -(9.0 * y * var_u) / ((var_u - 4.0) * var_v - var_u * var_v);
    let z = (9.0 * y - 15.0 * var_v * y - var_v * x) / (3.0 * var_v);
    [x, y, z]
}

/// Converts XYZ into raw L*u*v*.
pub fn xyz_to_luv(x: f64, y: f64, z: f64) -> [f64; 3] {
    let divider = x + 15.0 * y + 3.0 * z;
    let (var_u, var_v) = if divider != 0.0 {
        (4.0 * x / divider, 9.0 * y / divider)
    } else {
        (0.0, 0.0)
    };
    let l = y_to_l(y);
    if l <= 1e-8 {
        return [0.0, 0.0, 0.0];
    }
    [l, 13.0 * l * (var_u - REF_U), 13.0 * l * (var_v - REF_V)]
}

/// Lines bounding the sRGB gamut at lightness `l`, as (slope, intercept).
pub fn get_bounds(l: f64) -> [(f64, f64); 6] {
    let sub1 = (l + 16.0).powi(3) / 1560896.0;
    let sub2 = if sub1 > EPSILON { sub1 } else { l / KAPPA };
    let mut out = [(0.0, 0.0); 6];
    for (channel, m) in D65.iter().enumerate() {
        let (m1, m2, m3) = (m[0], m[1], m[2]);
        for t in 0..2 {
            let t = t as f64;
            let top1 = (284517.0 * m1 - 94839.0 * m3) * sub2;
            let top2 = (838422.0 * m3 + 769860.0 * m2 + 731718.0 * m1) * l * sub2
                - 769860.0 * t * l;
            let bottom = (632260.0 * m3 - 126452.0 * m2) * sub2 + 126452.0 * t;
            out[channel * 2 + t as usize] = (top1 / bottom, top2 / bottom);
        }
    }
    out
}

/// Largest chroma inside sRGB for lightness `l` and hue `h` (degrees).
pub fn max_chroma_for_lh(l: f64, h: f64) -> f64 {
    let rad = h.to_radians();
    get_bounds(l)
        .iter()
        .filter_map(|&(slope, intercept)| {
            let len = intercept / (rad.sin() - slope * rad.cos());
            (len >= 0.0).then_some(len)
        })
        .fold(f64::MAX, f64::min)
}

/// Raw HSLuv (degrees, percent, percent) into raw L*u*v*.
pub fn hsluv_to_luv(h: f64, s: f64, l: f64) -> [f64; 3] {
    let c = if l > 99.9999999 || l < 1e-8 {
        0.0
    } else {
        max_chroma_for_lh(l, h) / 100.0 * s
    };
    let l = l.clamp(0.0, 100.0);
    let rad = h.to_radians();
    [l, c * rad.cos(), c * rad.sin()]
}

/// Raw L*u*v* into raw HSLuv.
pub fn luv_to_hsluv(l: f64, u: f64, v: f64) -> [f64; 3] {
    let c = u.hypot(v);
    let h = if c < 1e-8 {
        0.0
    } else {
        v.atan2(u).to_degrees().rem_euclid(360.0)
    };
    if l > 99.9999999 {
        return [h, 0.0, 100.0];
    }
    if l < 1e-8 {
        return [h, 0.0, 0.0];
    }
    [h, c / max_chroma_for_lh(l, h) * 100.0, l]
}

#[derive(Debug, Default)]
pub struct Luv;

impl Luv {
    pub fn scale_up(v: &[f64]) -> [f64; 3] {
        [
            v[0] * 100.0,
            scale_up(v[1], LUV_U_MIN, LUV_U_MAX),
            scale_up(v[2], LUV_V_MIN, LUV_V_MAX),
        ]
    }

    pub fn scale_down(v: [f64; 3]) -> [f64; 3] {
        [
            v[0] / 100.0,
            scale_down(v[1], LUV_U_MIN, LUV_U_MAX),
            scale_down(v[2], LUV_V_MIN, LUV_V_MAX),
        ]
    }
}

impl SpaceModel for Luv {
    fn space_type(&self) -> SpaceType {
        SpaceType::Luv
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "Luv"
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d65()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, u, v] = Luv::scale_up(io);
        io[..3].copy_from_slice(&luv_to_xyz(l, u, v));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let luv = xyz_to_luv(io[0], io[1], io[2]);
        io[..3].copy_from_slice(&Luv::scale_down(luv));
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let [l, u, v] = Luv::scale_up(values);
        CssFuncPrinter::new("luv")
            .value(l)
            .value(u)
            .value(v)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}

/// Human friendly HSL alternative with uniform lightness.
#[derive(Debug, Default)]
pub struct HsLuv;

impl SpaceModel for HsLuv {
    fn space_type(&self) -> SpaceType {
        SpaceType::Hsluv
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "HSLuv"
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d65()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, u, v] = hsluv_to_luv(io[0] * 360.0, io[1] * 100.0, io[2] * 100.0);
        io[..3].copy_from_slice(&luv_to_xyz(l, u, v));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, u, v] = xyz_to_luv(io[0], io[1], io[2]);
        let [h, s, l] = luv_to_hsluv(l, u, v);
        io[0] = h / 360.0;
        io[1] = s / 100.0;
        io[2] = l / 100.0;
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::new("hsluv")
            .int(values[0] * 360.0)
            .value(values[1] * 100.0)
            .value(values[2] * 100.0)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsluv_roundtrip() {
        let [l, u, v] = hsluv_to_luv(250.0, 60.0, 40.0);
        let [h, s, l2] = luv_to_hsluv(l, u, v);
        assert!((h - 250.0).abs() < 1e-6);
        assert!((s - 60.0).abs() < 1e-6);
        assert!((l2 - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_luv_white() {
        let [l, u, v] = xyz_to_luv(0.95047, 1.0, 1.08883);
        assert!((l - 100.0).abs() < 1e-6);
        assert!(u.abs() < 0.05 && v.abs() < 0.05);
    }
}
