//! CSS Color 4 gamut mapping.
//!
//! Out of gamut colors are brought into a target space by lowering OKLCh
//! chroma with a binary search until clipping the result is no longer
//! noticeable (deltaE OK below one just noticeable difference).

use std::sync::Arc;

use crate::colors::color::Color;
use crate::colors::manager::Manager;
use crate::colors::space::{AnySpace, SpaceType};
use crate::colors::utils::rgba_to_values;

/// Just noticeable difference in deltaE OK.
pub const JND: f64 = 0.02;

/// Search resolution on chroma.
const CHROMA_EPSILON: f64 = 0.0001;

fn channels_out_of_gamut(values: &[f64], space: &AnySpace, eps: f64) -> bool {
    let n = space.component_count();
    values.len() >= n && values[..n].iter().any(|&v| v < -eps || v > 1.0 + eps)
}

/// True when `color` falls outside the `[0, 1]` channel box of `space`.
///
/// Unbounded spaces contain every color.
pub fn out_of_gamut(color: &Color, space: &Arc<AnySpace>, eps: f64) -> bool {
    if space.is_unbounded() {
        return false;
    }
    if **color.space() == **space {
        return channels_out_of_gamut(color.values(), space, eps);
    }
    match color.converted_space(space.clone()) {
        Some(converted) => channels_out_of_gamut(converted.values(), space, eps),
        None => false,
    }
}

/// Euclidean distance of two colors in OKLab.
pub fn delta_e_ok(color: &Color, sample: &Color, oklab: &Arc<AnySpace>) -> f64 {
    let (Some(c), Some(s)) = (
        color.converted_space(oklab.clone()),
        sample.converted_space(oklab.clone()),
    ) else {
        return 0.0;
    };
    ((c[0] - s[0]).powi(2) + (c[1] - s[1]).powi(2) + (c[2] - s[2]).powi(2)).sqrt()
}

/// Maps `origin` into `space` with the default manager.
pub fn to_gamut_css(origin: &Color, space: &Arc<AnySpace>) -> Option<Color> {
    to_gamut_css_in(Manager::get(), origin, space)
}

/// Maps `origin` into `space`, using the OK spaces registered in `manager`.
pub fn to_gamut_css_in(manager: &Manager, origin: &Color, space: &Arc<AnySpace>) -> Option<Color> {
    if space.is_unbounded() {
        return origin.converted_space(space.clone());
    }
    let oklab = manager.find(SpaceType::OkLab)?;
    let oklch = manager.find(SpaceType::OkLch)?;
    let origin_oklch = origin.converted_space(oklch)?;

    let lightness = origin_oklch[0];
    if lightness >= 1.0 || lightness <= 0.0 {
        let rgba = if lightness >= 1.0 { 0xffffffff } else { 0x000000ff };
        let mut media =
            Color::new(manager.rgb(), rgba_to_values(rgba, false)).converted_space(space.clone())?;
        if origin.has_opacity() {
            media.set_opacity(origin.opacity());
        }
        return Some(media);
    }

    if !out_of_gamut(&origin_oklch, space, 0.0) {
        return origin_oklch.converted_space(space.clone());
    }

    let clip = |color: &Color| -> Option<Color> {
        let mut dest = color.converted_space(space.clone())?;
        dest.normalize();
        Some(dest)
    };

    let mut min = 0.0;
    let mut max = origin_oklch[1];
    let mut min_in_gamut = true;
    let mut current = origin_oklch;
    let mut clipped = clip(&current)?;
    let mut e = delta_e_ok(&clipped, &current, &oklab);
    if e < JND {
        return Some(clipped);
    }

    while max - min > CHROMA_EPSILON {
        let chroma = (min + max) / 2.0;
        current.set(1, chroma);
        if min_in_gamut && !out_of_gamut(&current, space, 0.0) {
            min = chroma;
            continue;
        }
        clipped = clip(&current)?;
        e = delta_e_ok(&clipped, &current, &oklab);
        if e < JND {
            if JND - e < CHROMA_EPSILON {
                break;
            }
            min_in_gamut = false;
            min = chroma;
        } else {
            max = chroma;
        }
    }
    Some(clipped)
}
