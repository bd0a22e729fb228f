//! OKLab and OKLCh.
//!
//! Both sit on the sRGB profile: values are converted through linear RGB and
//! then gamma encoded, so the profile step itself is the identity.

use std::sync::Arc;

use crate::colors::cms::{Profile, linear_to_srgb, mul3, srgb_to_linear};
use crate::colors::printer::{CssFuncPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, scale_down, scale_up};

/// Chroma stored as a fraction of this maximum.
pub const OKLCH_C_MAX: f64 = 0.4;
const AB_MIN: f64 = -0.4;
const AB_MAX: f64 = 0.4;

const LRGB2CONE: [[f64; 3]; 3] = [
    [0.4122214708, 0.5363325363, 0.0514459929],
    [0.2119034982, 0.6806995451, 0.1073969566],
    [0.0883024619, 0.2817188376, 0.6299787005],
];

const CONE2LRGB: [[f64; 3]; 3] = [
    [4.0767416613479942676681908333711298900607278264432, -3.30771159040819331315866078424893188865618253342, 0.230969928729427886449650619561935920170561518112],
    [-1.2684380040921760691815055595117506020901414005992, 2.60975740066337143024050095284233623056192338553, -0.341319396310219620992658250306535533187548361872],
    [-0.0041960865418371092973767821251846315637521173374, -0.70341861445944960601310996913659932654899822384, 1.707614700930944853864541790660472961199090408527],
];

const M2: [[f64; 3]; 3] = [
    [0.2104542553, 0.793617785, -0.0040720468],
    [1.9779984951, -2.428592205, 0.4505937099],
    [0.0259040371, 0.7827717662, -0.808675766],
];

const M2_INV: [[f64; 3]; 3] = [
    [0.99999999845051981426207542502031373637162589278552, 0.39633779217376785682345989261573192476766903603, 0.215803758060758803423141461830037892590617787467],
    [1.00000000888176077671607524567047071276183677410134, -0.10556134232365634941095687705472233997368274024, -0.063854174771705903405254198817795633810975771082],
    [1.00000005467241091770129286515344610721841028698942, -0.08948418209496575968905274586339134130669669716, -1.291485537864091739948928752914772401878545675371],
];

/// Raw OKLab into linear sRGB.
pub fn oklab_to_linear_rgb(lab: [f64; 3]) -> [f64; 3] {
    let cones = mul3(&M2_INV, lab).map(|c| c * c * c);
    mul3(&CONE2LRGB, cones)
}

/// Linear sRGB into raw OKLab.
pub fn linear_rgb_to_oklab(rgb: [f64; 3]) -> [f64; 3] {
    let cones = mul3(&LRGB2CONE, rgb).map(f64::cbrt);
    mul3(&M2, cones)
}

/// Raw OKLCh (hue in degrees) into raw OKLab.
pub fn oklch_to_oklab(l: f64, c: f64, h: f64) -> [f64; 3] {
    let rad = h.to_radians();
    [l, c * rad.cos(), c * rad.sin()]
}

/// Raw OKLab into raw OKLCh. Near-gray colors get hue zero.
pub fn oklab_to_oklch(lab: [f64; 3]) -> [f64; 3] {
    let [l, a, b] = lab;
    let c = a.hypot(b);
    let h = if c <= 0.001 {
        0.0
    } else {
        b.atan2(a).to_degrees().rem_euclid(360.0)
    };
    [l, c, h]
}

fn to_srgb(lab: [f64; 3]) -> [f64; 3] {
    oklab_to_linear_rgb(lab).map(linear_to_srgb)
}

fn from_srgb(rgb: &[f64]) -> [f64; 3] {
    linear_rgb_to_oklab([rgb[0], rgb[1], rgb[2]].map(srgb_to_linear))
}

#[derive(Debug, Default)]
pub struct OkLab;

impl SpaceModel for OkLab {
    fn space_type(&self) -> SpaceType {
        SpaceType::OkLab
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "OkLab"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["oklab".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let lab = [
            io[0],
            scale_up(io[1], AB_MIN, AB_MAX),
            scale_up(io[2], AB_MIN, AB_MAX),
        ];
        io[..3].copy_from_slice(&to_srgb(lab));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, a, b] = from_srgb(io);
        io[0] = l;
        io[1] = scale_down(a, AB_MIN, AB_MAX);
        io[2] = scale_down(b, AB_MIN, AB_MAX);
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::new("oklab")
            .value(values[0])
            .value(scale_up(values[1], AB_MIN, AB_MAX))
            .value(scale_up(values[2], AB_MIN, AB_MAX))
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct OkLch;

impl SpaceModel for OkLch {
    fn space_type(&self) -> SpaceType {
        SpaceType::OkLch
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "OkLch"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["oklch".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let lab = oklch_to_oklab(io[0], io[1] * OKLCH_C_MAX, io[2] * 360.0);
        io[..3].copy_from_slice(&to_srgb(lab));
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let [l, c, h] = oklab_to_oklch(from_srgb(io));
        io[0] = l;
        io[1] = c / OKLCH_C_MAX;
        io[2] = h / 360.0;
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::new("oklch")
            .value(values[0])
            .value(values[1] * OKLCH_C_MAX)
            .value(values[2] * 360.0)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}
