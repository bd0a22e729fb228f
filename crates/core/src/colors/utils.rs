//! Packing helpers and palette utilities.

use std::sync::LazyLock;

use regex::Regex;

use crate::colors::color::Color;
use crate::colors::space::{SpaceType, rgba_to_css_name};
use crate::error::{ColorError, ColorResult};

/// Packs four channels in `[0, 1]` as `0xRRGGBBAA`.
pub fn pack_rgba(r: f64, g: f64, b: f64, a: f64) -> u32 {
    let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    (byte(r) << 24) | (byte(g) << 16) | (byte(b) << 8) | byte(a)
}

/// Parses `#RRGGBBAA` as used in preferences. An empty string is zero.
///
/// Nothing but that exact form is accepted; use the CSS parser for
/// anything else.
pub fn hex_to_rgba(value: &str) -> ColorResult<u32> {
    if value.is_empty() {
        return Ok(0);
    }
    let digits = value
        .strip_prefix('#')
        .filter(|d| d.len() == 8)
        .ok_or_else(|| ColorError::new("badly formatted color, it must be in #RRGGBBAA format"))?;
    u32::from_str_radix(digits, 16)
        .map_err(|_| ColorError::new("badly formatted color, it must be in #RRGGBBAA format"))
}

/// Unpacks `0xRRGGBBAA` into three or four values in `[0, 1]`.
pub fn rgba_to_values(rgba: u32, opacity: bool) -> Vec<f64> {
    let channel = |shift: u32| ((rgba >> shift) & 0xff) as f64 / 255.0;
    let mut values = vec![channel(24), channel(16), channel(8)];
    if opacity {
        values.push(channel(0));
    }
    values
}

/// Formats `#RRGGBB`, or `#RRGGBBAA` when `alpha` is set.
pub fn rgba_to_hex(value: u32, alpha: bool) -> String {
    if alpha {
        format!("#{value:08x}")
    } else {
        format!("#{:06x}", value >> 8)
    }
}

/// Builds a somewhat unique id for a palette entry.
pub fn color_to_id(color: Option<&Color>) -> String {
    let Some(color) = color else {
        return "none".into();
    };
    let name = color.name();
    if !name.is_empty() && !name.starts_with('#') {
        return desc_to_id(name);
    }
    if color.space().space_type() == SpaceType::CssName
        && let Ok(rgba) = color.to_rgba(1.0)
        && rgba_to_css_name(rgba).is_some()
    {
        return format!("css-{}", color.to_css(true));
    }
    let mut out = format!("{}-", color.space().name());
    for value in color.values() {
        out.push_str(&format!("{:02x}", (value * 255.0) as u32));
    }
    out.to_lowercase()
}

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]").expect("valid regex"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));
static EDGE_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^-|-$)").expect("valid regex"));
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(-?)([^\d]*)").expect("valid regex"));

/// Turns a color description into an XML friendly id.
pub fn desc_to_id(desc: &str) -> String {
    let name = NON_ALNUM.replace_all(desc, "-");
    let name = DASHES.replace_all(&name, "-");
    let name = EDGE_DASH.replace_all(&name, "");
    let name = LEADING_NUMBER.replace(&name, "${3}${2}${1}");
    name.to_lowercase()
}

/// Darker or lighter version of a color, used for checkerboards.
pub fn make_contrasted_color(orig: &Color, amount: f64) -> Color {
    let Some(mut color) = orig.converted_type(SpaceType::Hsl) else {
        return orig.clone();
    };
    let lightness = color[2];
    let step = if lightness < 0.08 { 0.08 } else { -0.08 };
    color.set(2, lightness + step * amount);
    color.convert_space(orig.space().clone());
    color
}

/// Themed dark or light shade of a color, returned in RGB.
pub fn make_theme_color(orig: &Color, dark: bool) -> Color {
    let Some(mut color) = orig.converted_type(SpaceType::Hsluv) else {
        return orig.clone();
    };
    if dark {
        color.set(1, color[1].min(0.8));
        color.set(2, (color[2] * 0.7).min(0.3));
    } else {
        color.set(2, (color[2] + (1.0 - color[2]) * 0.5).max(0.8));
    }
    color.converted_type(SpaceType::Rgb).unwrap_or(color)
}

/// Desaturated, compressed-lightness version of a color, returned in RGB.
pub fn make_disabled_color(orig: &Color, dark: bool) -> Color {
    let Some(mut hsl) = orig.converted_type(SpaceType::Hsluv) else {
        return orig.clone();
    };
    let saturation = hsl.get(1) * 0.30;
    let lightness = 0.35 * hsl.get(2) + if dark { 0.20 } else { 0.70 };
    hsl.set(1, saturation);
    hsl.set(2, lightness);
    hsl.converted_type(SpaceType::Rgb).unwrap_or(hsl)
}

/// Maps an L* value (0..100) onto a perceptual 0..1 scale.
pub fn perceptual_lightness(l: f64) -> f64 {
    if l <= 0.885645168 {
        l * 0.09032962963
    } else {
        l.cbrt() * 0.249914424 - 0.16
    }
}

pub fn get_perceptual_lightness(color: &Color) -> f64 {
    match color.converted_type(SpaceType::Hsluv) {
        Some(hsluv) => perceptual_lightness(hsluv[2] * 100.0),
        None => 1.0,
    }
}

/// Gray level and alpha to draw over a background of lightness `l`.
pub fn get_contrasting_color(l: f64) -> (f64, f64) {
    const THRESHOLD: f64 = 0.85;
    if l > THRESHOLD {
        let t = (l - THRESHOLD) / (1.0 - THRESHOLD);
        (0.0, 0.4 - 0.1 * t)
    } else {
        let t = (THRESHOLD - l) / THRESHOLD;
        (1.0, 0.6 + 0.1 * t)
    }
}
