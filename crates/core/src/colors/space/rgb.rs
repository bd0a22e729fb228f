//! sRGB and linear RGB.

use std::sync::Arc;

use crate::colors::cms::{Profile, linear_to_srgb, srgb_to_linear};
use crate::colors::printer::CssFuncPrinter;
use crate::colors::space::{AnySpace, SpaceModel, SpaceType};
use crate::colors::utils::rgba_to_hex;

/// Gamma encoded sRGB; the canonical space of the engine.
#[derive(Debug, Default)]
pub struct Rgb;

impl SpaceModel for Rgb {
    fn space_type(&self) -> SpaceType {
        SpaceType::Rgb
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "RGB"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["srgb".into()]
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn to_css(&self, space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let with_alpha = opacity && values.len() == 4;
        match space.to_rgba(values, 1.0) {
            Ok(rgba) => rgba_to_hex(rgba, with_alpha),
            Err(_) => String::new(),
        }
    }
}

/// RGB without the sRGB transfer curve.
#[derive(Debug, Default)]
pub struct LinearRgb;

impl SpaceModel for LinearRgb {
    fn space_type(&self) -> SpaceType {
        SpaceType::LinearRgb
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "linearRGB"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["srgb-linear".into(), "linearrgb".into()]
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        for v in io.iter_mut().take(3) {
            *v = linear_to_srgb(*v);
        }
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        for v in io.iter_mut().take(3) {
            *v = srgb_to_linear(*v);
        }
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::color("srgb-linear", values, 3, opacity)
    }
}
