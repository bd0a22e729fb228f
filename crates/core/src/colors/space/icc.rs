//! Spaces backed by named ICC profiles (`icc-color(...)`).
//!
//! Without profile data the space still carries the device values, followed
//! by an sRGB fallback used for every conversion.

use std::sync::Arc;

use itertools::Itertools;

use crate::colors::cms::{Profile, RenderingIntent};
use crate::colors::printer::format_number;
use crate::colors::space::{AnySpace, SpaceModel, SpaceType, restore_opacity, take_opacity};
use crate::colors::utils::rgba_to_hex;

#[derive(Debug, Clone)]
pub struct IccSpace {
    name: String,
    profile: Option<Arc<Profile>>,
    channels: usize,
    intent: RenderingIntent,
}

impl IccSpace {
    pub fn new(name: &str, profile: Option<Arc<Profile>>, channels: usize) -> Self {
        Self {
            name: name.to_string(),
            profile,
            channels,
            intent: RenderingIntent::Perceptual,
        }
    }

    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Number of device channels described by the profile.
    pub fn profile_size(&self) -> usize {
        self.channels
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }
}

impl SpaceModel for IccSpace {
    fn space_type(&self) -> SpaceType {
        SpaceType::Cms
    }

    fn component_type(&self) -> SpaceType {
        match self.channels {
            1 => SpaceType::Gray,
            3 => SpaceType::Rgb,
            4 => SpaceType::Cmyk,
            _ => SpaceType::None,
        }
    }

    fn component_count(&self) -> usize {
        if self.profile.is_some() {
            self.channels
        } else {
            self.channels + 3
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> String {
        "color-selector-cms".into()
    }

    fn profile(&self) -> Arc<Profile> {
        self.profile.clone().unwrap_or_else(Profile::srgb)
    }

    fn intent(&self) -> RenderingIntent {
        self.intent
    }

    fn intent_priority(&self) -> u32 {
        100
    }

    fn space_to_profile(&self, io: &mut Vec<f64>) {
        if self.profile.is_none() && io.len() >= self.channels + 3 {
            io.drain(..self.channels);
        }
    }

    fn profile_to_space(&self, io: &mut Vec<f64>) {
        if self.profile.is_none() && io.len() >= 3 {
            let opacity = take_opacity(io, 3);
            let mut out = vec![0.0; self.channels];
            out.extend_from_slice(&io[..3]);
            *io = out;
            restore_opacity(io, opacity);
        }
    }

    fn to_css(&self, space: &AnySpace, values: &[f64], _opacity: bool) -> String {
        let device = values
            .iter()
            .take(self.channels)
            .map(|&v| format_number(v))
            .join(", ");
        let icc = format!("icc-color({}, {device})", self.name);
        match space.to_rgba(values, 1.0) {
            Ok(rgba) => format!("{} {}", rgba_to_hex(rgba, false), icc),
            Err(_) => icc,
        }
    }
}
