//! The `Color` value type.
//!
//! A color is a space plus a vector of normalized values, optionally followed
//! by an opacity value. Conversions that cannot be performed leave the color
//! untouched and report failure through `bool` or `Option`.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::colors::manager::Manager;
use crate::colors::space::{AnySpace, SpaceType};
use crate::colors::utils::rgba_to_values;
use crate::error::ColorResult;

/// Default tolerance for [`Color::is_close`] and [`Color::is_similar`].
pub const COLOR_EPSILON: f64 = 1e-4;

/// Tolerance used by `==`.
const EQ_EPSILON: f64 = 0.00001;

/// Tolerance used to decide whether a set changed anything.
const CHANGE_EPSILON: f64 = 0.001;

#[derive(Clone)]
pub struct Color {
    name: String,
    values: Vec<f64>,
    space: Arc<AnySpace>,
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Color")
            .field("space", &self.space.name())
            .field("values", &self.values)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css(true))
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        *self.space == *other.space && self.is_near(&other.values, EQ_EPSILON)
    }
}

impl std::ops::Index<usize> for Color {
    type Output = f64;

    /// Channel value. Indexing the opacity channel of a color without
    /// opacity yields `1.0`.
    fn index(&self, index: usize) -> &f64 {
        const ONE: f64 = 1.0;
        self.values.get(index).unwrap_or(&ONE)
    }
}

impl Color {
    pub fn new(space: Arc<AnySpace>, values: Vec<f64>) -> Self {
        debug_assert!(space.is_valid_data(&values));
        Self {
            name: String::new(),
            values,
            space,
        }
    }

    /// Builds a color in the default manager's space for `space_type`.
    pub fn from_type(space_type: SpaceType, values: Vec<f64>) -> Option<Self> {
        Manager::get().if_valid(space_type, values)
    }

    /// Builds an sRGB color from `0xRRGGBBAA`.
    pub fn from_rgba(rgba: u32, opacity: bool) -> Self {
        Self::new(Manager::get().rgb(), rgba_to_values(rgba, opacity))
    }

    /// Parses CSS text with the default manager.
    pub fn parse(value: &str) -> Option<Self> {
        Manager::get().parse(value)
    }

    pub fn space(&self) -> &Arc<AnySpace> {
        &self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn set_values(&mut self, values: Vec<f64>) {
        debug_assert!(self.space.is_valid_data(&values));
        self.name.clear();
        self.values = values;
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn get(&self, index: usize) -> f64 {
        self[index]
    }

    /// Sets one channel, appending it when `index` is the opacity channel.
    ///
    /// Returns true if the value moved by at least 0.001.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        debug_assert!(index <= self.opacity_channel());
        if index == self.values.len() {
            self.values.push(1.0);
        }
        let changed = (self.values[index] - value).abs() >= CHANGE_EPSILON;
        self.values[index] = value;
        changed
    }

    /// Copies another color.
    ///
    /// With `keep_space` the result is converted back into this color's space
    /// and opacity presence, and the return value tells whether the values
    /// changed noticeably.
    pub fn set_color(&mut self, other: &Color, keep_space: bool) -> bool {
        if keep_space {
            let prev_space = self.space.clone();
            let prev_values = self.values.clone();
            let prev_opacity = self.has_opacity();
            if self.set_color(other, false) {
                self.convert_space(prev_space);
                self.enable_opacity(prev_opacity);
                return !self.is_near(&prev_values, CHANGE_EPSILON);
            }
        } else if self != other {
            self.space = other.space.clone();
            self.values = other.values.clone();
            self.name = other.name.clone();
            return true;
        }
        false
    }

    /// Parses `parsable` and sets it, see [`Color::set_color`].
    pub fn set_parsed(&mut self, parsable: &str, keep_space: bool) -> bool {
        match Color::parse(parsable) {
            Some(color) => self.set_color(&color, keep_space),
            None => false,
        }
    }

    /// Replaces the color with sRGB values from `0xRRGGBBAA`.
    pub fn set_rgba(&mut self, rgba: u32, opacity: bool) -> bool {
        if self.space.space_type() != SpaceType::Rgb {
            self.space = Manager::get().rgb();
        } else if self.to_rgba(if opacity { 1.0 } else { 0.0 }).ok() == Some(rgba) {
            return false;
        }
        self.name.clear();
        self.values = rgba_to_values(rgba, opacity);
        true
    }

    fn is_near(&self, other: &[f64], epsilon: f64) -> bool {
        self.values.len() == other.len()
            && self
                .values
                .iter()
                .zip(other)
                .all(|(a, b)| (a - b).abs() < epsilon)
    }

    // ========================================================================
    // Opacity
    // ========================================================================

    pub fn opacity_channel(&self) -> usize {
        self.space.component_count()
    }

    /// Bit used in `pin` masks for `channel`.
    pub fn pin(&self, channel: usize) -> u32 {
        1 << channel
    }

    pub fn has_opacity(&self) -> bool {
        self.values.len() > self.opacity_channel()
    }

    pub fn enable_opacity(&mut self, enable: bool) {
        let has = self.has_opacity();
        if enable && !has {
            self.values.push(1.0);
        } else if !enable && has {
            self.values.pop();
        }
    }

    pub fn opacity(&self) -> f64 {
        if self.has_opacity() {
            self.values.last().copied().unwrap_or(1.0)
        } else {
            1.0
        }
    }

    /// Removes the opacity channel and returns its value.
    pub fn steal_opacity(&mut self) -> f64 {
        let ret = self.opacity();
        self.enable_opacity(false);
        ret
    }

    /// Returns false if the opacity already had this value.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if self.has_opacity() {
            if let Some(last) = self.values.last_mut() {
                if *last == opacity {
                    return false;
                }
                *last = opacity;
            }
        } else {
            self.values.push(opacity);
        }
        true
    }

    /// Multiplies the current opacity by `opacity`.
    pub fn add_opacity(&mut self, opacity: f64) -> bool {
        self.set_opacity(opacity * self.opacity())
    }

    pub fn with_opacity(&self, opacity: f64) -> Color {
        let mut copy = self.clone();
        copy.add_opacity(opacity);
        copy
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Converts into the space and opacity presence of `other`.
    pub fn convert(&mut self, other: &Color) -> bool {
        if self.convert_space(other.space.clone()) {
            self.enable_opacity(other.has_opacity());
            return true;
        }
        false
    }

    pub fn convert_space(&mut self, to: Arc<AnySpace>) -> bool {
        if !to.is_valid() {
            return false;
        }
        if *self.space != *to {
            if !self.space.convert(&mut self.values, &to) {
                tracing::debug!(from = self.space.name(), to = to.name(), "conversion failed");
                return false;
            }
            self.space = to;
            debug_assert!(self.space.is_valid_data(&self.values));
        }
        self.name.clear();
        true
    }

    pub fn convert_type(&mut self, space_type: SpaceType) -> bool {
        match Manager::get().find(space_type) {
            Some(space) => self.convert_space(space),
            None => false,
        }
    }

    pub fn converted(&self, other: &Color) -> Option<Color> {
        let mut copy = self.clone();
        copy.convert(other).then_some(copy)
    }

    pub fn converted_space(&self, to: Arc<AnySpace>) -> Option<Color> {
        let mut copy = self.clone();
        copy.convert_space(to).then_some(copy)
    }

    pub fn converted_type(&self, space_type: SpaceType) -> Option<Color> {
        let mut copy = self.clone();
        copy.convert_type(space_type).then_some(copy)
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn to_css(&self, opacity: bool) -> String {
        self.space.to_css(&self.values, opacity)
    }

    /// Packs as `0xRRGGBBAA`, multiplying the alpha by `opacity`.
    pub fn to_rgba(&self, opacity: f64) -> ColorResult<u32> {
        self.space.to_rgba(&self.values, opacity)
    }

    pub fn to_argb(&self, opacity: f64) -> ColorResult<u32> {
        let v = self.to_rgba(opacity)?;
        Ok((v >> 8) | ((v & 0xff) << 24))
    }

    pub fn to_abgr(&self, opacity: f64) -> ColorResult<u32> {
        Ok(self.to_rgba(opacity)?.swap_bytes())
    }

    pub fn is_out_of_gamut(&self, other: &AnySpace) -> bool {
        self.space.out_of_gamut(&self.values, other)
    }

    pub fn is_over_inked(&self) -> bool {
        self.space.over_ink(&self.values)
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    /// Clamps channels into `[0, 1]` and wraps hues.
    pub fn normalize(&mut self) {
        let comps = self.space.components(self.has_opacity());
        comps.normalize(&mut self.values);
    }

    pub fn normalized(&self) -> Color {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Inverts every channel whose bit is not set in `pin`.
    pub fn invert(&mut self, pin: u32) {
        for (i, v) in self.values.iter_mut().enumerate() {
            if pin & (1 << i) == 0 {
                *v = 1.0 - *v;
            }
        }
    }

    /// Inverts all channels except opacity.
    pub fn invert_color(&mut self) {
        self.invert(self.pin(self.opacity_channel()));
    }

    /// Adds `(random - 0.5) * force` to every unpinned channel.
    pub fn jitter<R: Rng>(&mut self, force: f64, pin: u32, rng: &mut R) {
        for (i, v) in self.values.iter_mut().enumerate() {
            if pin & (1 << i) != 0 {
                continue;
            }
            *v += rng.gen_range(-0.5..0.5) * force;
        }
        self.normalize();
    }

    /// Paints `other` over this color using `other`'s opacity.
    pub fn compose(&mut self, other: &Color) {
        let alpha = other.opacity();
        let pin = self.pin(self.opacity_channel());
        self.mutate_with(other, pin, |v, o| *v = *v * (1.0 - alpha) + o * alpha);
        let opacity = 1.0 - (1.0 - self.opacity()) * (1.0 - alpha);
        self.set_opacity(opacity);
    }

    pub fn composed(&self, other: &Color) -> Color {
        let mut copy = self.clone();
        copy.compose(other);
        copy
    }

    /// Moves towards `other` by `pos` (0 keeps this color, 1 becomes `other`).
    pub fn average(&mut self, other: &Color, pos: f64, pin: u32) {
        self.mutate_with(other, pin, |v, o| *v = *v * (1.0 - pos) + o * pos);
    }

    pub fn averaged(&self, other: &Color, pos: f64) -> Color {
        let mut copy = self.clone();
        copy.average(other, pos, 0);
        copy
    }

    /// Sum of squared channel differences, after converting `other` here.
    ///
    /// Returns zero if `other` cannot be converted.
    pub fn difference(&self, other: &Color) -> f64 {
        match other.converted(self) {
            Some(copy) => self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (v - copy[i]).powi(2))
                .sum(),
            None => 0.0,
        }
    }

    /// Same space, same size and every channel within `epsilon`.
    pub fn is_close(&self, other: &Color, epsilon: f64) -> bool {
        *self.space == *other.space && self.is_near(&other.values, epsilon)
    }

    /// Like [`Color::is_close`], converting `other` into this space first.
    pub fn is_similar(&self, other: &Color, epsilon: f64) -> bool {
        if *other.space != *self.space {
            return match other.converted_space(self.space.clone()) {
                Some(copy) => self.is_close(&copy, epsilon),
                None => false,
            };
        }
        self.is_close(other, epsilon)
    }

    fn mutate_with(&mut self, other: &Color, pin: u32, mut func: impl FnMut(&mut f64, f64)) {
        if *other.space != *self.space || other.has_opacity() != self.has_opacity() {
            let Some(copy) = other.converted(self) else {
                return;
            };
            return self.mutate_with(&copy, pin, func);
        }
        for (i, v) in self.values.iter_mut().enumerate() {
            if pin & (1 << i) == 0 {
                func(v, other[i]);
            }
        }
    }
}
