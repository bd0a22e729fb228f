//! Color spaces.
//!
//! A space is a [`SpaceModel`] (the math specific to one color model) wrapped
//! in an [`AnySpace`], which owns the shared conversion pipeline:
//!
//! 1. the source model maps its values onto its profile,
//! 2. the CMS backend transforms between profiles,
//! 3. the target model maps profile values back into its own format.
//!
//! Transforms and gamut checkers are cached per space.

mod cmyk;
mod gray;
mod hsl;
mod hsv;
mod icc;
mod lab;
mod luv;
mod named;
mod ok;
mod rgb;
mod xyz;

pub use cmyk::{Cmy, Cmyk};
pub use gray::Gray;
pub use hsl::Hsl;
pub use hsv::Hsv;
pub use icc::IccSpace;
pub use lab::{Lab, Lch};
pub use luv::{HsLuv, Luv};
pub use named::{NamedColor, css_name_to_rgba, rgba_to_css_name};
pub use ok::{OkLab, OkLch};
pub use rgb::{LinearRgb, Rgb};
pub use xyz::{Xyz, Xyz50};

use std::fmt;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::colors::cms::{CmsBackend, ColorTransform, GamutChecker, Profile, RenderingIntent};
use crate::colors::components::Components;
use crate::colors::utils::pack_rgba;
use crate::error::{ColorError, ColorResult};

/// Identifies the color model of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpaceType {
    None,
    Rgb,
    LinearRgb,
    Hsl,
    Hsv,
    Cmyk,
    Cmy,
    Hsluv,
    Lch,
    Luv,
    OkLab,
    OkLch,
    Lab,
    YCbCr,
    Xyz,
    Xyz50,
    Yxy,
    Gray,
    CssName,
    Cms,
}

/// Math and metadata of one color model.
///
/// Implementations keep any trailing opacity value untouched when
/// converting.
pub trait SpaceModel: Send + Sync {
    fn space_type(&self) -> SpaceType;

    /// Space type whose component table describes the channels.
    fn component_type(&self) -> SpaceType {
        self.space_type()
    }

    fn component_count(&self) -> usize;

    fn name(&self) -> &str;

    fn short_name(&self) -> &str {
        self.name()
    }

    fn icon(&self) -> String {
        format!("color-selector-{}", self.short_name().to_ascii_lowercase())
    }

    /// Names under which SVG content may refer to this space.
    fn svg_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Unbounded spaces have no gamut of their own.
    fn is_unbounded(&self) -> bool {
        false
    }

    fn profile(&self) -> Arc<Profile>;

    fn intent(&self) -> RenderingIntent {
        RenderingIntent::Unknown
    }

    fn intent_priority(&self) -> u32 {
        0
    }

    /// Converts values in this space into the profile's format.
    fn space_to_profile(&self, _io: &mut Vec<f64>) {}

    /// Converts profile values into this space.
    fn profile_to_space(&self, _io: &mut Vec<f64>) {}

    /// CSS-style text for `values`, including opacity when asked for.
    fn to_css(&self, space: &AnySpace, values: &[f64], opacity: bool) -> String;

    /// True when the values put more ink on the page than a press allows.
    fn over_ink(&self, _values: &[f64]) -> bool {
        false
    }

    fn is_valid(&self) -> bool {
        true
    }
}

/// Splits a trailing opacity value off a value vector of `n` channels.
pub(crate) fn take_opacity(io: &mut Vec<f64>, n: usize) -> Option<f64> {
    if io.len() > n { io.pop() } else { None }
}

/// Pushes an opacity value back on after a conversion.
pub(crate) fn restore_opacity(io: &mut Vec<f64>, opacity: Option<f64>) {
    if let Some(o) = opacity {
        io.push(o);
    }
}

/// Scales a normalized value into `[min, max]`.
pub(crate) fn scale_up(v: f64, min: f64, max: f64) -> f64 {
    v * (max - min) + min
}

/// Maps a value in `[min, max]` into `[0, 1]`.
pub(crate) fn scale_down(v: f64, min: f64, max: f64) -> f64 {
    (v - min) / (max - min)
}

/// A registered color space.
pub struct AnySpace {
    model: Box<dyn SpaceModel>,
    cms: Arc<dyn CmsBackend>,
    transforms: Mutex<FxHashMap<String, Option<Arc<dyn ColorTransform>>>>,
    gamut_checkers: Mutex<FxHashMap<String, Option<Arc<dyn GamutChecker>>>>,
}

impl fmt::Debug for AnySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnySpace")
            .field("type", &self.space_type())
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for AnySpace {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl AnySpace {
    pub fn new(model: impl SpaceModel + 'static, cms: Arc<dyn CmsBackend>) -> Self {
        Self::from_boxed(Box::new(model), cms)
    }

    pub fn from_boxed(model: Box<dyn SpaceModel>, cms: Arc<dyn CmsBackend>) -> Self {
        Self {
            model,
            cms,
            transforms: Mutex::new(FxHashMap::default()),
            gamut_checkers: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn space_type(&self) -> SpaceType {
        self.model.space_type()
    }

    pub fn component_type(&self) -> SpaceType {
        self.model.component_type()
    }

    pub fn component_count(&self) -> usize {
        self.model.component_count()
    }

    pub fn components(&self, alpha: bool) -> &'static Components {
        Components::get(self.component_type(), alpha)
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn short_name(&self) -> &str {
        self.model.short_name()
    }

    pub fn icon(&self) -> String {
        self.model.icon()
    }

    pub fn svg_names(&self) -> Vec<String> {
        self.model.svg_names()
    }

    pub fn is_unbounded(&self) -> bool {
        self.model.is_unbounded()
    }

    pub fn profile(&self) -> Arc<Profile> {
        self.model.profile()
    }

    pub fn intent(&self) -> RenderingIntent {
        self.model.intent()
    }

    pub fn intent_priority(&self) -> u32 {
        self.model.intent_priority()
    }

    pub fn is_valid(&self) -> bool {
        self.model.is_valid()
    }

    /// Accepts exactly the channel count, optionally followed by opacity.
    pub fn is_valid_data(&self, values: &[f64]) -> bool {
        let n = self.component_count();
        values.len() == n || values.len() == n + 1
    }

    pub fn to_css(&self, values: &[f64], opacity: bool) -> String {
        self.model.to_css(self, values, opacity)
    }

    pub fn over_ink(&self, values: &[f64]) -> bool {
        self.model.over_ink(values)
    }

    pub fn space_to_profile(&self, io: &mut Vec<f64>) {
        self.model.space_to_profile(io);
    }

    pub fn profile_to_space(&self, io: &mut Vec<f64>) {
        self.model.profile_to_space(io);
    }

    /// Converts values from this space into `to`.
    ///
    /// On failure the values are left in this space's format.
    pub fn convert(&self, io: &mut Vec<f64>, to: &AnySpace) -> bool {
        if self == to {
            return true;
        }
        self.space_to_profile(io);
        if self.profile_to_profile(io, to) {
            to.profile_to_space(io);
            true
        } else {
            self.profile_to_space(io);
            false
        }
    }

    /// Picks the intent used when converting into `to`.
    fn choose_intent(&self, to_intent: RenderingIntent, to_priority: u32) -> RenderingIntent {
        let intent = if self.intent_priority() <= to_priority || self.intent() == RenderingIntent::Unknown
        {
            to_intent
        } else {
            self.intent()
        };
        if intent == RenderingIntent::Unknown {
            RenderingIntent::Perceptual
        } else {
            intent
        }
    }

    /// Transforms profile values of this space into the profile of `to`.
    pub fn profile_to_profile(&self, io: &mut Vec<f64>, to: &AnySpace) -> bool {
        self.transform_into(io, &to.profile(), to.intent(), to.intent_priority())
    }

    fn transform_into(
        &self,
        io: &mut Vec<f64>,
        to_profile: &Profile,
        to_intent: RenderingIntent,
        to_priority: u32,
    ) -> bool {
        let from_profile = self.profile();
        if *from_profile == *to_profile {
            return true;
        }
        let intent = self.choose_intent(to_intent, to_priority);
        let key = format!("{}-{}", to_profile.checksum(), intent.id());
        let transform = {
            let mut cache = match self.transforms.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache
                .entry(key)
                .or_insert_with(|| self.cms.create_transform(&from_profile, to_profile, intent))
                .clone()
        };
        match transform {
            Some(t) => t.do_transform(io),
            None => {
                tracing::debug!(
                    from = self.name(),
                    to = to_profile.name(),
                    "no profile transform available"
                );
                false
            }
        }
    }

    /// Packs values (optionally followed by opacity) as `0xRRGGBBAA`.
    ///
    /// Spaces other than RGB are converted through sRGB first.
    pub fn to_rgba(&self, values: &[f64], opacity: f64) -> ColorResult<u32> {
        if self.space_type() == SpaceType::Rgb {
            return pack_values(values, opacity);
        }
        let mut copy = values.to_vec();
        self.space_to_profile(&mut copy);
        if !self.transform_into(&mut copy, &Profile::srgb(), RenderingIntent::Unknown, 0) {
            return Err(ColorError::new(format!(
                "cannot convert from {} to sRGB",
                self.name()
            )));
        }
        pack_values(&copy, opacity)
    }

    /// True when `input` (values in this space) falls outside `to`.
    pub fn out_of_gamut(&self, input: &[f64], to: &AnySpace) -> bool {
        let to_profile = to.profile();
        if *self.profile() == *to_profile {
            return false;
        }
        let checker = {
            let mut cache = match self.gamut_checkers.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache
                .entry(to_profile.id().to_string())
                .or_insert_with(|| self.cms.create_gamut_checker(&self.profile(), &to_profile))
                .clone()
        };
        let Some(checker) = checker else {
            return false;
        };
        let mut profiled = input.to_vec();
        self.space_to_profile(&mut profiled);
        checker.check_gamut(&profiled)
    }
}

fn pack_values(values: &[f64], opacity: f64) -> ColorResult<u32> {
    match values.len() {
        3 => Ok(pack_rgba(values[0], values[1], values[2], opacity)),
        4 => Ok(pack_rgba(values[0], values[1], values[2], opacity * values[3])),
        n => Err(ColorError::new(format!(
            "cannot pack {n} values into RGBA"
        ))),
    }
}
