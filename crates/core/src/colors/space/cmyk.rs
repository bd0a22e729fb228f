use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::{CssFuncPrinter, opacity_of};
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, restore_opacity, take_opacity};

/// Total ink coverage above which a CMYK color is considered over-inked.
pub const OVER_INK_LIMIT: f64 = 3.2;

/// Naive device CMYK over sRGB.
#[derive(Debug, Default)]
pub struct Cmyk;

impl SpaceModel for Cmyk {
    fn space_type(&self) -> SpaceType {
        SpaceType::Cmyk
    }

    fn component_count(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "DeviceCMYK"
    }

    fn short_name(&self) -> &str {
        "CMYK"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["device-cmyk".into()]
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if io.len() < 4 {
            return;
        }
        let opacity = take_opacity(io, 4);
        let k = io[3];
        let rgb: Vec<f64> = io[..3].iter().map(|c| (1.0 - c) * (1.0 - k)).collect();
        *io = rgb;
        restore_opacity(io, opacity);
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let opacity = take_opacity(io, 3);
        let (r, g, b) = (io[0], io[1], io[2]);
        let k = 1.0 - r.max(g).max(b);
        let cmyk = if k >= 1.0 {
            vec![0.0, 0.0, 0.0, 1.0]
        } else {
            vec![
                (1.0 - r - k) / (1.0 - k),
                (1.0 - g - k) / (1.0 - k),
                (1.0 - b - k) / (1.0 - k),
                k,
            ]
        };
        *io = cmyk;
        restore_opacity(io, opacity);
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        values
            .iter()
            .take(4)
            .fold(CssFuncPrinter::new("device-cmyk"), |p, &v| p.value(v))
            .alpha(opacity_of(values, 4, opacity))
            .finish()
    }

    fn over_ink(&self, values: &[f64]) -> bool {
        values.iter().take(4).sum::<f64>() > OVER_INK_LIMIT
    }
}

/// CMY without a black channel.
#[derive(Debug, Default)]
pub struct Cmy;

impl SpaceModel for Cmy {
    fn space_type(&self) -> SpaceType {
        SpaceType::Cmy
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "CMY"
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        for v in io.iter_mut().take(3) {
            *v = 1.0 - *v;
        }
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        for v in io.iter_mut().take(3) {
            *v = 1.0 - *v;
        }
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        values
            .iter()
            .take(3)
            .fold(CssFuncPrinter::new("device-cmyk"), |p, &v| p.value(v))
            .value(0.0)
            .alpha(opacity_of(values, 3, opacity))
            .finish()
    }
}
