use std::sync::Arc;

use crate::colors::cms::Profile;
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, restore_opacity, take_opacity};
use crate::colors::utils::rgba_to_hex;

/// Single channel gray over sRGB.
#[derive(Debug, Default)]
pub struct Gray;

impl SpaceModel for Gray {
    fn space_type(&self) -> SpaceType {
        SpaceType::Gray
    }

    fn component_count(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Gray"
    }

    fn profile(&self) -> Arc<Profile> {
        Profile::srgb()
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        let Some(&g) = io.first() else {
            return;
        };
        let opacity = take_opacity(io, 1);
        *io = vec![g, g, g];
        restore_opacity(io, opacity);
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if io.len() < 3 {
            return;
        }
        let opacity = take_opacity(io, 3);
        let g = 0.2126 * io[0] + 0.7152 * io[1] + 0.0722 * io[2];
        *io = vec![g];
        restore_opacity(io, opacity);
    }

    fn to_css(&self, space: &AnySpace, values: &[f64], opacity: bool) -> String {
        let with_alpha = opacity && values.len() == 2;
        match space.to_rgba(values, 1.0) {
            Ok(rgba) => rgba_to_hex(rgba, with_alpha),
            Err(_) => String::new(),
        }
    }
}
