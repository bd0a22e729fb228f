//! Color management backend.
//!
//! Spaces never convert between each other directly. Each one maps its values
//! onto a [`Profile`] and a [`CmsBackend`] moves values between profiles.
//! [`BuiltinCms`] knows the three matrix profiles every built-in space uses:
//! gamma encoded sRGB, CIE XYZ (D65) and CIE XYZ (D50). ICC data can be
//! registered as a profile, but the built-in backend refuses to transform it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHasher;

/// Rendering intent requested for a profile transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingIntent {
    #[default]
    Unknown,
    Auto,
    Perceptual,
    RelativeColorimetric,
    RelativeColorimetricNoBpc,
    Saturation,
    AbsoluteColorimetric,
}

impl RenderingIntent {
    /// Stable identifier used in transform cache keys.
    pub fn id(self) -> &'static str {
        match self {
            RenderingIntent::Unknown => "unknown",
            RenderingIntent::Auto => "auto",
            RenderingIntent::Perceptual => "perceptual",
            RenderingIntent::RelativeColorimetric => "relative-colorimetric",
            RenderingIntent::RelativeColorimetricNoBpc => "relative-colorimetric-nobpc",
            RenderingIntent::Saturation => "saturation",
            RenderingIntent::AbsoluteColorimetric => "absolute-colorimetric",
        }
    }

    /// Maps a PDF `/RI` name onto an intent.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "Perceptual" => RenderingIntent::Perceptual,
            "RelativeColorimetric" => RenderingIntent::RelativeColorimetric,
            "Saturation" => RenderingIntent::Saturation,
            "AbsoluteColorimetric" => RenderingIntent::AbsoluteColorimetric,
            _ => RenderingIntent::Unknown,
        }
    }
}

/// Color model a profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// Gamma encoded sRGB.
    Srgb,
    /// CIE XYZ relative to D65.
    XyzD65,
    /// CIE XYZ relative to D50.
    XyzD50,
    /// Opaque ICC profile data.
    Icc,
}

/// A color profile.
///
/// Two profiles are the same profile when their checksums match.
#[derive(Clone)]
pub struct Profile {
    id: String,
    name: String,
    checksum: String,
    kind: ProfileKind,
    channels: usize,
    data: Vec<u8>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("checksum", &self.checksum)
            .field("kind", &self.kind)
            .field("channels", &self.channels)
            .finish()
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.checksum == other.checksum
    }
}

static SRGB: LazyLock<Arc<Profile>> =
    LazyLock::new(|| Arc::new(Profile::builtin("srgb", "sRGB", ProfileKind::Srgb)));
static XYZ_D65: LazyLock<Arc<Profile>> =
    LazyLock::new(|| Arc::new(Profile::builtin("xyz-d65", "XYZ D65", ProfileKind::XyzD65)));
static XYZ_D50: LazyLock<Arc<Profile>> =
    LazyLock::new(|| Arc::new(Profile::builtin("xyz-d50", "XYZ D50", ProfileKind::XyzD50)));

fn checksum_of(bytes: &[u8]) -> String {
    let mut hasher = FxHasher::default();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl Profile {
    fn builtin(id: &str, name: &str, kind: ProfileKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            checksum: format!("builtin-{id}"),
            kind,
            channels: 3,
            data: Vec::new(),
        }
    }

    pub fn srgb() -> Arc<Profile> {
        SRGB.clone()
    }

    pub fn xyz_d65() -> Arc<Profile> {
        XYZ_D65.clone()
    }

    pub fn xyz_d50() -> Arc<Profile> {
        XYZ_D50.clone()
    }

    /// Wraps raw ICC data.
    ///
    /// `channels` is the number of device channels the profile expects.
    pub fn from_icc(name: &str, channels: usize, data: Vec<u8>) -> Arc<Profile> {
        let checksum = checksum_of(&data);
        Arc::new(Self {
            id: format!("icc-{checksum}"),
            name: name.to_string(),
            checksum,
            kind: ProfileKind::Icc,
            channels,
            data,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Moves values from one profile into another.
pub trait ColorTransform: Send + Sync {
    /// Converts in place. Values past the profile channels (opacity) are kept.
    fn do_transform(&self, io: &mut Vec<f64>) -> bool;
}

/// Tests values against the gamut of a target profile.
pub trait GamutChecker: Send + Sync {
    /// Returns true when the values cannot be shown in the target profile.
    fn check_gamut(&self, input: &[f64]) -> bool;
}

/// Factory for transforms and gamut checkers.
pub trait CmsBackend: Send + Sync + fmt::Debug {
    fn create_transform(
        &self,
        from: &Profile,
        to: &Profile,
        intent: RenderingIntent,
    ) -> Option<Arc<dyn ColorTransform>>;

    fn create_gamut_checker(&self, from: &Profile, to: &Profile) -> Option<Arc<dyn GamutChecker>>;
}

// ============================================================================
// Built-in matrix backend
// ============================================================================

type Mat3 = [[f64; 3]; 3];

const LRGB_TO_XYZ65: Mat3 = [
    [0.4123907992659595, 0.357584339383878, 0.1804807884018343],
    [0.21263900587151036, 0.715168678767756, 0.07219231536073371],
    [0.01933081871559185, 0.11919477979462599, 0.9505321522496606],
];

const XYZ65_TO_LRGB: Mat3 = invert3(&LRGB_TO_XYZ65);

// Bradford chromatic adaptation.
const XYZ65_TO_XYZ50: Mat3 = [
    [1.0479298208405488, 0.022946793341019088, -0.05019222954313557],
    [0.029627815688159344, 0.990434484573249, -0.01707382502938514],
    [-0.009243058152591178, 0.015055144896577895, 0.7518742899580008],
];

const XYZ50_TO_XYZ65: Mat3 = invert3(&XYZ65_TO_XYZ50);

/// Inverse of a non-singular 3x3 matrix.
const fn invert3(m: &Mat3) -> Mat3 {
    let c00 = m[1][1] * m[2][2] - m[1][2] * m[2][1];
    let c01 = m[1][2] * m[2][0] - m[1][0] * m[2][2];
    let c02 = m[1][0] * m[2][1] - m[1][1] * m[2][0];
    let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02;
    [
        [
            c00 / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            c01 / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            c02 / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ]
}

/// Multiplies a 3x3 matrix with a vector.
pub fn mul3(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// sRGB transfer function, extended to negative values.
pub fn srgb_to_linear(v: f64) -> f64 {
    let a = v.abs();
    let out = if a <= 0.04045 {
        a / 12.92
    } else {
        ((a + 0.055) / 1.055).powf(2.4)
    };
    out.copysign(v)
}

/// Inverse sRGB transfer function, extended to negative values.
pub fn linear_to_srgb(v: f64) -> f64 {
    let a = v.abs();
    let out = if a <= 0.0031308 {
        a * 12.92
    } else {
        1.055 * a.powf(1.0 / 2.4) - 0.055
    };
    out.copysign(v)
}

fn to_xyz65(kind: ProfileKind, v: [f64; 3]) -> Option<[f64; 3]> {
    match kind {
        ProfileKind::Srgb => Some(mul3(&LRGB_TO_XYZ65, v.map(srgb_to_linear))),
        ProfileKind::XyzD65 => Some(v),
        ProfileKind::XyzD50 => Some(mul3(&XYZ50_TO_XYZ65, v)),
        ProfileKind::Icc => None,
    }
}

fn from_xyz65(kind: ProfileKind, v: [f64; 3]) -> Option<[f64; 3]> {
    match kind {
        ProfileKind::Srgb => Some(mul3(&XYZ65_TO_LRGB, v).map(linear_to_srgb)),
        ProfileKind::XyzD65 => Some(v),
        ProfileKind::XyzD50 => Some(mul3(&XYZ65_TO_XYZ50, v)),
        ProfileKind::Icc => None,
    }
}

struct MatrixTransform {
    from: ProfileKind,
    to: ProfileKind,
}

impl MatrixTransform {
    fn apply(&self, v: [f64; 3]) -> Option<[f64; 3]> {
        from_xyz65(self.to, to_xyz65(self.from, v)?)
    }
}

impl ColorTransform for MatrixTransform {
    fn do_transform(&self, io: &mut Vec<f64>) -> bool {
        if io.len() < 3 {
            return false;
        }
        match self.apply([io[0], io[1], io[2]]) {
            Some(out) => {
                io[..3].copy_from_slice(&out);
                true
            }
            None => false,
        }
    }
}

impl GamutChecker for MatrixTransform {
    fn check_gamut(&self, input: &[f64]) -> bool {
        if self.to != ProfileKind::Srgb || input.len() < 3 {
            return false;
        }
        match self.apply([input[0], input[1], input[2]]) {
            Some(out) => out.iter().any(|v| !(-1e-4..=1.0 + 1e-4).contains(v)),
            None => false,
        }
    }
}

/// Backend built from fixed matrices.
///
/// The rendering intent does not change the math; only the colorimetric
/// path exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCms;

impl CmsBackend for BuiltinCms {
    fn create_transform(
        &self,
        from: &Profile,
        to: &Profile,
        _intent: RenderingIntent,
    ) -> Option<Arc<dyn ColorTransform>> {
        if from.kind() == ProfileKind::Icc || to.kind() == ProfileKind::Icc {
            tracing::debug!(from = from.name(), to = to.name(), "no transform for ICC data");
            return None;
        }
        Some(Arc::new(MatrixTransform {
            from: from.kind(),
            to: to.kind(),
        }))
    }

    fn create_gamut_checker(&self, from: &Profile, to: &Profile) -> Option<Arc<dyn GamutChecker>> {
        if from.kind() == ProfileKind::Icc || to.kind() == ProfileKind::Icc {
            return None;
        }
        Some(Arc::new(MatrixTransform {
            from: from.kind(),
            to: to.kind(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_xyz_roundtrip() {
        let cms = BuiltinCms;
        let there = cms
            .create_transform(&Profile::srgb(), &Profile::xyz_d50(), RenderingIntent::Auto)
            .unwrap();
        let back = cms
            .create_transform(&Profile::xyz_d50(), &Profile::srgb(), RenderingIntent::Auto)
            .unwrap();
        let mut v = vec![0.2, 0.6, 0.9, 0.5];
        assert!(there.do_transform(&mut v));
        assert!(back.do_transform(&mut v));
        for (a, b) in v.iter().zip([0.2, 0.6, 0.9, 0.5]) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inverse_matrices() {
        for (m, inv) in [
            (&LRGB_TO_XYZ65, &XYZ65_TO_LRGB),
            (&XYZ65_TO_XYZ50, &XYZ50_TO_XYZ65),
        ] {
            for col in 0..3 {
                let mut unit = [0.0; 3];
                unit[col] = 1.0;
                let out = mul3(inv, mul3(m, unit));
                for (row, v) in out.iter().enumerate() {
                    let want = if row == col { 1.0 } else { 0.0 };
                    assert!((v - want).abs() < 1e-12, "{row},{col}: {v}");
                }
            }
        }
    }

    #[test]
    fn test_white_maps_to_d65() {
        let t = BuiltinCms
            .create_transform(&Profile::srgb(), &Profile::xyz_d65(), RenderingIntent::Auto)
            .unwrap();
        let mut v = vec![1.0, 1.0, 1.0];
        t.do_transform(&mut v);
        assert!((v[0] - 0.9505).abs() < 1e-3);
        assert!((v[1] - 1.0).abs() < 1e-6);
        assert!((v[2] - 1.089).abs() < 1e-3);
    }

    #[test]
    fn test_icc_unsupported() {
        let icc = Profile::from_icc("Custom", 4, vec![1, 2, 3]);
        assert!(
            BuiltinCms
                .create_transform(&icc, &Profile::srgb(), RenderingIntent::Auto)
                .is_none()
        );
        assert_eq!(icc, Profile::from_icc("Other name", 4, vec![1, 2, 3]));
    }
}
