//! CIE L*a*b* and its polar form L*C*h, relative to D50.

use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::{CssFuncPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, scale_down, scale_up};

const D50_WHITE: [f64; 3] = [0.9642956764295677, 1.0, 0.8251046025104602];
const EPSILON: f64 = 216.0 / 24389.0;
const KAPPA: f64 = 24389.0 / 27.0;

pub const LAB_L_MAX: f64 = 100.0;
pub const LAB_AB_MIN: f64 = -128.0;
pub const LAB_AB_MAX: f64 = 127.0;
pub const LCH_C_MAX: f64 = 150.0;

/// Converts raw L*a*b* into XYZ (D50).
pub fn lab_to_xyz(l: f64, a: f64, b: f64) -> [f64; 3] {
    let fy = (l + 16.0) / 116.0;
    let fx = a / 500.0 + fy;
    let fz = fy - b / 200.0;
    let x = if fx.powi(3) > EPSILON {
        fx.powi(3)
    } else {
        (116.0 * fx - 16.0) / KAPPA
    };
    let y = if l > KAPPA * EPSILON {
        fy.powi(3)
    } else {
        l / KAPPA
    };
    let z = if fz.powi(3) > EPSILON {
        fz.powi(3)
    } else {
        (116.0 * fz - 16.0) / KAPPA
    };
    [x * D50_WHITE[0], y * D50_WHITE[1], z * D50_WHITE[2]]
}

/// Converts XYZ (D50) into raw L*a*b*.
pub fn xyz_to_lab(x: f64, y: f64, z: f64) -> [f64; 3] {
    let f = |t: f64| {
        if t > EPSILON {
            t.cbrt()
        } else {
            (KAPPA * t + 16.0) / 116.0
        }
    };
    let fx = f(x / D50_WHITE[0]);
    let fy = f(y / D50_WHITE[1]);
    let fz = f(z / D50_WHITE[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Converts raw L*C*h (hue in degrees) into raw L*a*b*.
pub fn lch_to_lab(l: f64, c: f64, h: f64) -> [f64; 3] {
    let rad = h.to_radians();
    [l, c * rad.cos(), c * rad.sin()]
}

/// Converts raw L*a*b* into raw L*C*h (hue in degrees).
pub fn lab_to_lch(l: f64, a: f64, b: f64) -> [f64; 3] {
    let c = a.hypot(b);
    let h = if c < 1e-8 {
        0.0
    } else {
        b.atan2(a).to_degrees().rem_euclid(360.0)
    };
    [l, c, h]
}

#[derive(Debug, Default)]
pub struct Lab;

impl Lab {
    /// Normalized values into raw L*a*b*.
    pub fn scale_up(v: &[f64]) -> [f64; 3] {
        [
            v[0] * LAB_L_MAX,
            scale_up(v[1], LAB_AB_MIN, LAB_AB_MAX),
            scale_up(v[2], LAB_AB_MIN, LAB_AB_MAX),
        ]
    }

    /// Raw L*a*b* into normalized values.
    pub fn scale_down(v: [f64; 3]) -> [f64; 3] {
        [
            v[0] / LAB_L_MAX,
            scale_down(v[1], LAB_AB_MIN, LAB_AB_MAX),
            scale_down(v[2], LAB_AB_MIN, LAB_AB_MAX),
        ]
    }
}

impl SpaceModel for Lab {
    fn space_type(&self) -> SpaceType {
        SpaceType::Lab
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "Lab"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["lab".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d50()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, a, b] = Lab::scale_up(io);
        io[..3].copy_from_slice(&lab_to_xyz(l, a, b));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let lab = xyz_to_lab(io[0], io[1], io[2]);
        io[..3].copy_from_slice(&Lab::scale_down(lab));
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let [l, a, b] = Lab::scale_up(values);
        CssFuncPrinter::new("lab")
            .value(l)
            .value(a)
            .value(b)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Lch;

impl Lch {
    pub fn scale_up(v: &[f64]) -> [f64; 3] {
        [v[0] * LAB_L_MAX, v[1] * LCH_C_MAX, v[2] * 360.0]
    }

    pub fn scale_down(v: [f64; 3]) -> [f64; 3] {
        [v[0] / LAB_L_MAX, v[1] / LCH_C_MAX, v[2] / 360.0]
    }
}

impl SpaceModel for Lch {
    fn space_type(&self) -> SpaceType {
        SpaceType::Lch
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "Lch"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["lch".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d50()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, c, h] = Lch::scale_up(io);
        let [l, a, b] = lch_to_lab(l, c, h);
        io[..3].copy_from_slice(&lab_to_xyz(l, a, b));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, a, b] = xyz_to_lab(io[0], io[1], io[2]);
        io[..3].copy_from_slice(&Lch::scale_down(lab_to_lch(l, a, b)));
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let [l, c, h] = Lch::scale_up(values);
        CssFuncPrinter::new("lch")
            .value(l)
            .value(c)
            .value(h)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}
