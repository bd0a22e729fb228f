use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::printer::CssFuncPrinter;
use crate::colors::space::{AnySpace, SpaceModel, SpaceType};

/// CIE XYZ relative to D65. Values are stored as-is.
#[derive(Debug, Default)]
pub struct Xyz;

impl SpaceModel for Xyz {
    fn space_type(&self) -> SpaceType {
        SpaceType::Xyz
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "XYZ"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["xyz".into(), "xyz-d65".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d65()
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::color("xyz", values, 3, opacity)
    }
}

/// CIE XYZ relative to D50.
#[derive(Debug, Default)]
pub struct Xyz50;

impl SpaceModel for Xyz50 {
    fn space_type(&self) -> SpaceType {
        SpaceType::Xyz50
    }

    fn component_count(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "XYZ50"
    }

    fn svg_names(&self) -> Vec<String> {
        vec!["xyz-d50".into()]
    }

    fn is_unbounded(&self) -> bool {
        true
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::xyz_d50()
    }

    fn to_css(&self, _space: &AnySpace, values: &[f64], opacity: bool) -> String {
        CssFuncPrinter::color("xyz-d50", values, 3, opacity)
    }
}
