//! Tests for the `Color` value type, CSS round trips and gamut mapping.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use pigment_core::colors::space::IccSpace;
use pigment_core::colors::utils::{hex_to_rgba, rgba_to_hex, rgba_to_values};
use pigment_core::colors::{
    AnySpace, BuiltinCms, Color, Components, Manager, Profile, SpaceType, Unit, to_gamut_css,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rgb(r: f64, g: f64, b: f64) -> Color {
    Color::from_type(SpaceType::Rgb, vec![r, g, b]).expect("rgb color")
}

fn assert_values(color: &Color, expected: &[f64], epsilon: f64) {
    assert_eq!(color.values().len(), expected.len(), "{color:?}");
    for (got, want) in color.values().iter().zip(expected) {
        assert_abs_diff_eq!(*got, *want, epsilon = epsilon);
    }
}

// ============================================================================
// Construction and packing
// ============================================================================

#[test]
fn test_color_keeps_its_space() {
    let manager = Manager::get();
    for space_type in [
        SpaceType::Rgb,
        SpaceType::Hsl,
        SpaceType::Hsv,
        SpaceType::Cmyk,
        SpaceType::Lab,
        SpaceType::OkLch,
        SpaceType::Xyz,
    ] {
        let space = manager.find(space_type).expect("registered space");
        let values = vec![0.5; space.component_count()];
        assert!(space.is_valid_data(&values));
        let color = Color::new(space.clone(), values);
        assert_eq!(**color.space(), *space);
        assert_eq!(color.space().space_type(), space_type);
    }
}

#[test]
fn test_rgba_packing() {
    let color = Color::from_rgba(0x123456cc, true);
    assert_eq!(color.to_rgba(1.0).unwrap(), 0x123456cc);
    assert_eq!(color.to_rgba(0.5).unwrap(), 0x12345666);
    assert_eq!(color.to_argb(1.0).unwrap(), 0xcc123456);
    assert_eq!(color.to_abgr(1.0).unwrap(), 0xcc563412);
}

#[test]
fn test_hex_helpers_are_inverse() {
    for value in [0u32, 0x00000001, 0x123456cc, 0xdeadbeef, 0xffffffff] {
        let hex = rgba_to_hex(value, true);
        assert_eq!(hex_to_rgba(&hex).unwrap(), value);
    }
    assert_eq!(rgba_to_hex(0xff000080, false), "#ff0000");
    assert_eq!(hex_to_rgba("").unwrap(), 0);
    assert!(hex_to_rgba("#fff").is_err());
    assert!(hex_to_rgba("12345678").is_err());
}

#[test]
fn test_rgba_to_values() {
    let values = rgba_to_values(0xff00ff80, true);
    assert_eq!(values.len(), 4);
    assert_abs_diff_eq!(values[0], 1.0);
    assert_abs_diff_eq!(values[1], 0.0);
    assert_abs_diff_eq!(values[3], 128.0 / 255.0);
    assert_eq!(rgba_to_values(0xff00ff80, false).len(), 3);
}

// ============================================================================
// CSS parsing and printing
// ============================================================================

#[test]
fn test_css_print_vectors() {
    assert_eq!(Color::parse("#ff0000").unwrap().to_css(false), "#ff0000");
    assert_eq!(
        Color::parse("hsl(0, 100%, 50%)").unwrap().to_css(false),
        "hsl(0, 100, 50)"
    );
    assert_eq!(
        Color::parse("device-cmyk(0.25 0.75 0.5 0.1)")
            .unwrap()
            .to_css(false),
        "device-cmyk(0.25 0.75 0.5 0.1)"
    );
}

#[test]
fn test_css_short_hex_and_names() {
    let short = Color::parse("#f00").unwrap();
    assert_values(&short, &[1.0, 0.0, 0.0], 1e-9);
    let named = Color::parse("red").unwrap();
    assert_eq!(named.to_rgba(1.0).unwrap(), 0xff0000ff);
    assert!(Color::parse("not-a-color").is_none());
    assert!(Color::parse("rgb(1 2").is_none());
}

#[test]
fn test_css_rgb_functions() {
    let legacy = Color::parse("rgb(255, 0, 0)").unwrap();
    assert_eq!(legacy.to_rgba(1.0).unwrap(), 0xff0000ff);
    let modern = Color::parse("rgb(0 255 0 / 50%)").unwrap();
    assert!(modern.has_opacity());
    assert_abs_diff_eq!(modern.opacity(), 0.5, epsilon = 1e-9);
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_rgb_to_hsl() {
    let hsl = rgb(1.0, 0.0, 0.0).converted_type(SpaceType::Hsl).unwrap();
    assert_values(&hsl, &[0.0, 1.0, 0.5], 1e-6);
}

#[test]
fn test_round_trip_through_other_spaces() {
    let mut rng = StdRng::seed_from_u64(7);
    let targets = [
        SpaceType::Hsl,
        SpaceType::Hsv,
        SpaceType::Cmyk,
        SpaceType::Lab,
        SpaceType::OkLab,
        SpaceType::Xyz,
        SpaceType::LinearRgb,
    ];
    for _ in 0..20 {
        let mut color = rgb(0.5, 0.5, 0.5);
        color.jitter(0.9, 0, &mut rng);
        for target in targets {
            let there = color.converted_type(target).unwrap();
            let back = there.converted_type(SpaceType::Rgb).unwrap();
            assert_values(&back, color.values(), 0.005);
        }
    }
}

#[test]
fn test_conversion_keeps_opacity() {
    let color = Color::parse("#33669980").unwrap();
    let hsl = color.converted_type(SpaceType::Hsl).unwrap();
    assert!(hsl.has_opacity());
    assert_abs_diff_eq!(hsl.opacity(), color.opacity(), epsilon = 1e-9);
}

#[test]
fn test_convert_to_unregistered_type() {
    let red = rgb(1.0, 0.0, 0.0);
    assert!(red.converted_type(SpaceType::None).is_none());
}

#[test]
fn test_is_similar_across_spaces() {
    let red = rgb(1.0, 0.0, 0.0);
    let hsl = Color::from_type(SpaceType::Hsl, vec![0.0, 1.0, 0.5]).unwrap();
    assert!(!red.is_close(&hsl, 1e-6));
    assert!(red.is_similar(&hsl, 1e-6));
    assert!(hsl.is_similar(&red, 1e-6));

    let darker = Color::from_type(SpaceType::Hsl, vec![0.0, 1.0, 0.4]).unwrap();
    assert!(!red.is_similar(&darker, 0.01));
    assert!(red.is_similar(&darker, 0.25));
}

fn press_color() -> Color {
    let profile = Profile::from_icc("press", 4, vec![0x50, 0x52, 0x45, 0x53]);
    let space = AnySpace::new(IccSpace::new("press", Some(profile), 4), Arc::new(BuiltinCms));
    Color::new(Arc::new(space), vec![0.1, 0.2, 0.3, 0.4])
}

#[test]
fn test_difference() {
    let red = rgb(1.0, 0.0, 0.0);
    assert_abs_diff_eq!(red.difference(&rgb(0.0, 0.0, 0.0)), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(red.difference(&rgb(0.5, 0.5, 0.0)), 0.5, epsilon = 1e-12);

    let hsl = Color::from_type(SpaceType::Hsl, vec![0.0, 1.0, 0.5]).unwrap();
    assert_abs_diff_eq!(red.difference(&hsl), 0.0, epsilon = 1e-9);

    // No transform between the builtin profiles and an embedded one.
    let press = press_color();
    assert!(press.converted_type(SpaceType::Rgb).is_none());
    assert_eq!(red.difference(&press), 0.0);
    assert_eq!(press.difference(&red), 0.0);
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_normalize_is_idempotent() {
    let space = Manager::get().find(SpaceType::Hsl).unwrap();
    let mut color = Color::new(space, vec![1.25, 1.5, -0.5]);
    color.normalize();
    let once = color.clone();
    color.normalize();
    assert_eq!(color, once);
    assert_values(&once, &[0.25, 1.0, 0.0], 1e-9);
}

#[test]
fn test_component_normalize() {
    let hsl = Components::get(SpaceType::Hsl, false);
    let hue = hsl.get_component(0).unwrap();
    let sat = hsl.get_component(1).unwrap();
    assert_eq!(hue.unit, Unit::Degree);
    for v in [-1.75, -0.25, 0.0, 0.5, 1.5, 7.2] {
        let n = hue.normalize(v);
        assert!((0.0..=1.0).contains(&n));
        assert_abs_diff_eq!(hue.normalize(n), n);
        let s = sat.normalize(v);
        assert!((0.0..=1.0).contains(&s));
        assert_abs_diff_eq!(sat.normalize(s), s);
    }
}

#[test]
fn test_average_and_invert() {
    let black = rgb(0.0, 0.0, 0.0);
    let white = rgb(1.0, 1.0, 1.0);
    assert_values(&black.averaged(&white, 0.25), &[0.25, 0.25, 0.25], 1e-9);

    let mut color = rgb(0.2, 0.4, 0.6);
    color.invert_color();
    assert_values(&color, &[0.8, 0.6, 0.4], 1e-9);
}

#[test]
fn test_compose_over_opaque() {
    let base = rgb(1.0, 1.0, 1.0);
    let top = Color::parse("#00000080").unwrap();
    let mixed = base.composed(&top);
    let alpha = 128.0 / 255.0;
    assert_abs_diff_eq!(mixed[0], 1.0 - alpha, epsilon = 1e-6);
}

#[test]
fn test_over_inked_cmyk() {
    let cmyk = Manager::get().find(SpaceType::Cmyk).unwrap();
    assert!(Color::new(cmyk.clone(), vec![1.0, 1.0, 1.0, 0.5]).is_over_inked());
    assert!(!Color::new(cmyk, vec![0.5, 0.5, 0.5, 0.5]).is_over_inked());
}

#[test]
fn test_name_cleared_by_set_values_and_convert() {
    let mut color = rgb(0.1, 0.2, 0.3);
    color.set_name("Ocean");
    assert_eq!(color.name(), "Ocean");
    color.set(0, 0.9);
    assert_eq!(color.name(), "Ocean");
    color.set_values(vec![0.9, 0.2, 0.3]);
    assert_eq!(color.name(), "");
    color.set_name("Ocean");
    assert!(color.convert_type(SpaceType::Hsl));
    assert_eq!(color.name(), "");
}

// ============================================================================
// Gamut mapping
// ============================================================================

#[test]
fn test_gamut_in_gamut_unchanged() {
    let color = rgb(0.2, 0.4, 0.6);
    let mapped = to_gamut_css(&color, &Manager::get().rgb()).unwrap();
    assert!(mapped.is_close(&color, 1e-4));
}

#[test]
fn test_gamut_light_maps_to_white() {
    let color = Color::from_type(SpaceType::OkLch, vec![1.0, 0.5, 0.1, 0.4]).unwrap();
    let mapped = to_gamut_css(&color, &Manager::get().rgb()).unwrap();
    assert_values(&mapped, &[1.0, 1.0, 1.0, 0.4], 1e-6);
}

#[test]
fn test_gamut_vectors() {
    let rgb_space = Manager::get().rgb();
    let red = Color::from_type(SpaceType::OkLch, vec![0.70, 0.25 / 0.40, 20.0 / 360.0]).unwrap();
    let mapped = to_gamut_css(&red, &rgb_space).unwrap();
    assert_values(&mapped, &[1.0, 0.332, 0.393], 0.01);

    let teal = Color::from_type(SpaceType::OkLch, vec![0.53, 0.10 / 0.40, 209.0 / 360.0]).unwrap();
    let mapped = to_gamut_css(&teal, &rgb_space).unwrap();
    assert_values(&mapped, &[0.0, 0.486, 0.553], 0.01);
}

// ============================================================================
// Channels and opacity
// ============================================================================

#[test]
fn test_set_channel() {
    let mut color = rgb(1.0, 0.0, 0.0);
    assert!(!color.set(0, 1.0));
    assert!(!color.set(1, 0.0005));
    assert!(color.set(2, 0.5));
    assert_values(&color, &[1.0, 0.0005, 0.5], 1e-12);
    assert!(!color.has_opacity());

    // Writing the opacity slot appends the channel.
    assert!(color.set(color.opacity_channel(), 0.25));
    assert!(color.has_opacity());
    assert_values(&color, &[1.0, 0.0005, 0.5, 0.25], 1e-12);
    assert_abs_diff_eq!(color.opacity(), 0.25, epsilon = 1e-12);

    let mut opaque = rgb(0.0, 0.0, 0.0);
    assert!(!opaque.set(3, 1.0));
    assert_eq!(opaque.size(), 4);
}

#[test]
fn test_steal_and_enable_opacity() {
    let mut color = Color::parse("#33669980").unwrap();
    let rgb_values = color.values()[..3].to_vec();
    assert_abs_diff_eq!(color.steal_opacity(), 128.0 / 255.0, epsilon = 1e-9);
    assert!(!color.has_opacity());
    assert_values(&color, &rgb_values, 1e-12);

    // Stealing from an opaque color changes nothing.
    assert_eq!(color.steal_opacity(), 1.0);
    assert_eq!(color.size(), 3);

    color.enable_opacity(true);
    color.enable_opacity(true);
    assert_eq!(color.size(), 4);
    assert_eq!(color.opacity(), 1.0);
    assert_eq!(color.steal_opacity(), 1.0);
    assert_values(&color, &rgb_values, 1e-12);

    color.enable_opacity(false);
    assert_eq!(color.size(), 3);
}

#[test]
fn test_seeded_jitter_is_reproducible() {
    let jittered = |seed: u64, pin: u32| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut color = rgb(0.5, 0.5, 0.5);
        color.jitter(0.9, pin, &mut rng);
        color
    };
    let a = jittered(42, 0);
    let b = jittered(42, 0);
    assert_eq!(a.values(), b.values());
    assert_ne!(a.values(), jittered(43, 0).values());
    for v in a.values() {
        assert!((0.05..=0.95).contains(v), "{v}");
    }

    let pinned = jittered(42, 1 << 1);
    assert_eq!(pinned.get(1), 0.5);
    assert_eq!(pinned.get(0), a.get(0));
}
