//! Component metadata for every color space type.
//!
//! Each space type owns an ordered list of channels. Values are always stored
//! normalized to `[0, 1]`; the [`Unit`] of a channel tells the UI how to scale
//! it for display. A second table carries the same lists with a trailing
//! `alpha` channel.

use std::collections::BTreeMap;
use std::ops::{BitAnd, BitOr};
use std::sync::LazyLock;

use crate::colors::space::SpaceType;

/// Display unit of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// 0..255
    EightBit,
    /// 0..360
    Degree,
    /// 0..100
    Percent,
    /// 0..1024
    Linear1024,
    /// 0..40
    Chroma40,
}

impl Unit {
    /// Factor mapping a normalized value to display units.
    pub fn scale(self) -> u32 {
        match self {
            Unit::EightBit => 255,
            Unit::Degree => 360,
            Unit::Percent => 100,
            Unit::Linear1024 => 1024,
            Unit::Chroma40 => 40,
        }
    }
}

/// Bit set describing where a space shows up in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Traits(u8);

impl Traits {
    pub const NONE: Traits = Traits(0);
    /// Offered in color pickers.
    pub const PICKER: Traits = Traits(1);
    /// Used for computation only.
    pub const INTERNAL: Traits = Traits(2);
    /// Backed by an ICC profile.
    pub const CMS: Traits = Traits(4);

    pub fn contains(self, other: Traits) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Traits) -> bool {
        self.0 & other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Traits {
    type Output = Traits;

    fn bitor(self, rhs: Traits) -> Traits {
        Traits(self.0 | rhs.0)
    }
}

impl BitAnd for Traits {
    type Output = Traits;

    fn bitand(self, rhs: Traits) -> Traits {
        Traits(self.0 & rhs.0)
    }
}

/// A single channel of a color space.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub space: SpaceType,
    pub index: usize,
    pub id: &'static str,
    pub name: &'static str,
    pub tip: &'static str,
    pub unit: Unit,
    pub scale: u32,
}

impl Component {
    pub fn new(
        space: SpaceType,
        index: usize,
        id: &'static str,
        name: &'static str,
        tip: &'static str,
        unit: Unit,
    ) -> Self {
        Self {
            space,
            index,
            id,
            name,
            tip,
            unit,
            scale: unit.scale(),
        }
    }

    /// Brings a value back into `[0, 1]`.
    ///
    /// Hues wrap around, everything else is clamped.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.unit == Unit::Degree && !(0.0..=1.0).contains(&value) {
            return value - value.floor();
        }
        value.clamp(0.0, 1.0)
    }
}

/// Ordered channel list of a space type.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    space: SpaceType,
    wheel: SpaceType,
    traits: Traits,
    components: Vec<Component>,
}

type Row = (&'static str, &'static str, &'static str, Unit);

fn build(space: SpaceType, wheel: SpaceType, traits: Traits, rows: &[Row]) -> Components {
    let components = rows
        .iter()
        .enumerate()
        .map(|(i, &(id, name, tip, unit))| Component::new(space, i, id, name, tip, unit))
        .collect();
    Components {
        space,
        wheel,
        traits,
        components,
    }
}

fn tables() -> Vec<Components> {
    use SpaceType as T;
    use Unit::*;

    let picker = Traits::PICKER;
    let internal = Traits::INTERNAL;
    let cms = Traits::CMS;

    let rgb: &[Row] = &[
        ("r", "_R", "Red", EightBit),
        ("g", "_G", "Green", EightBit),
        ("b", "_B", "Blue", EightBit),
    ];
    let hsl: &[Row] = &[
        ("h", "_H", "Hue", Degree),
        ("s", "_S", "Saturation", Percent),
        ("l", "_L", "Lightness", Percent),
    ];
    let hsv: &[Row] = &[
        ("h", "_H", "Hue", Degree),
        ("s", "_S", "Saturation", Percent),
        ("v", "_V", "Value", Percent),
    ];
    let cmyk: &[Row] = &[
        ("c", "_C", "Cyan", Percent),
        ("m", "_M", "Magenta", Percent),
        ("y", "_Y", "Yellow", Percent),
        ("k", "_K", "Black", Percent),
    ];
    let cmy: &[Row] = &[
        ("c", "_C", "Cyan", Percent),
        ("m", "_M", "Magenta", Percent),
        ("y", "_Y", "Yellow", Percent),
    ];
    let hsluv: &[Row] = &[
        ("h", "_H*", "Hue", Degree),
        ("s", "_S*", "Saturation", Percent),
        ("l", "_L*", "Lightness", Percent),
    ];
    let lch: &[Row] = &[
        ("l", "_L", "Luminance", EightBit),
        ("c", "_C", "Chroma", EightBit),
        ("h", "_H", "Hue", Degree),
    ];
    let luv: &[Row] = &[
        ("l", "_L", "Luminance", Percent),
        ("u", "_u", "Chroma U", Percent),
        ("v", "_v", "Chroma V", Percent),
    ];
    let oklab: &[Row] = &[
        ("l", "_L", "Lightness", Percent),
        ("a", "_A", "Component A", Percent),
        ("b", "_B", "Component B", Percent),
    ];
    let oklch: &[Row] = &[
        ("l", "_L", "Lightness", Percent),
        ("c", "_C", "Chroma", Chroma40),
        ("h", "_H", "Hue", Degree),
    ];
    let lab: &[Row] = &[
        ("l", "_L", "Lightness", Percent),
        ("a", "_A", "Component A", EightBit),
        ("b", "_B", "Component B", EightBit),
    ];
    let ycbcr: &[Row] = &[
        ("y", "_Y", "Y", EightBit),
        ("cb", "C_b", "Cb", EightBit),
        ("cr", "C_r", "Cr", EightBit),
    ];
    let xyz: &[Row] = &[
        ("x", "_X", "X", EightBit),
        ("y", "_Y", "Y", EightBit),
        ("z", "_Z", "Z", EightBit),
    ];
    let yxy: &[Row] = &[
        ("y1", "_Y", "Y", EightBit),
        ("x", "_x", "x", EightBit),
        ("y2", "y", "y", EightBit),
    ];
    let gray: &[Row] = &[("gray", "G", "Gray", Linear1024)];

    vec![
        build(T::Rgb, T::Hsl, picker, rgb),
        build(T::LinearRgb, T::Hsl, internal, rgb),
        build(T::Hsl, T::Hsl, picker, hsl),
        build(T::Hsv, T::Hsl, picker, hsv),
        build(T::Cmyk, T::None, picker, cmyk),
        build(T::Cmy, T::None, internal, cmy),
        build(T::Hsluv, T::Hsluv, picker, hsluv),
        build(T::Lch, T::Hsl, internal, lch),
        build(T::Luv, T::Hsl, internal, luv),
        build(T::OkLab, T::Hsl, internal, oklab),
        build(T::OkLch, T::OkLch, picker, oklch),
        build(T::Lab, T::Hsl, internal, lab),
        build(T::YCbCr, T::None, cms, ycbcr),
        build(T::Xyz, T::Hsl, internal, xyz),
        build(T::Xyz50, T::Hsl, internal, xyz),
        build(T::Yxy, T::None, cms, yxy),
        build(T::Gray, T::None, picker | cms, gray),
    ]
}

static PLAIN: LazyLock<BTreeMap<SpaceType, Components>> =
    LazyLock::new(|| tables().into_iter().map(|c| (c.space, c)).collect());

static EMPTY: LazyLock<Components> =
    LazyLock::new(|| build(SpaceType::None, SpaceType::None, Traits::NONE, &[]));

static WITH_ALPHA: LazyLock<BTreeMap<SpaceType, Components>> = LazyLock::new(|| {
    tables()
        .into_iter()
        .map(|mut c| {
            let index = c.components.len();
            c.components.push(Component::new(
                c.space,
                index,
                "alpha",
                "_A",
                "Alpha",
                Unit::Percent,
            ));
            (c.space, c)
        })
        .collect()
});

impl Components {
    /// Looks up the channel list for a space type.
    ///
    /// Unknown types resolve to the empty `None` entry.
    pub fn get(space: SpaceType, alpha: bool) -> &'static Components {
        let table = if alpha { &*WITH_ALPHA } else { &*PLAIN };
        table.get(&space).unwrap_or(&EMPTY)
    }

    pub fn space(&self) -> SpaceType {
        self.space
    }

    /// Space type used to draw a color wheel for this space.
    pub fn wheel_type(&self) -> SpaceType {
        self.wheel
    }

    pub fn traits(&self) -> Traits {
        self.traits
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn get_component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// Normalizes every value that has a matching channel.
    pub fn normalize(&self, values: &mut [f64]) {
        for (value, comp) in values.iter_mut().zip(&self.components) {
            *value = comp.normalize(*value);
        }
    }
}

impl std::ops::Index<usize> for Components {
    type Output = Component;

    fn index(&self, index: usize) -> &Component {
        &self.components[index]
    }
}

impl<'a> IntoIterator for &'a Components {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
