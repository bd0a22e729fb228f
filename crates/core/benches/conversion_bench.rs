//! Benchmarks for color conversion, CSS parsing and gamut mapping.
//!
//! Benchmark groups:
//! - `conversion`: RGB to each target space and back
//! - `css_parse`: CSS color text parsing
//! - `gamut`: CSS gamut mapping of in-gamut and oversaturated colors

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pigment_core::colors::{SpaceType, to_gamut_css};
use pigment_core::{Color, Manager};

// =============================================================================
// Data Generation
// =============================================================================

/// `n` RGB colors spread over the cube.
fn generate_rgb_colors(n: usize) -> Vec<Color> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n.max(1) as f64;
            let rgba = (((t * 255.0) as u32) << 24)
                | ((((1.0 - t) * 255.0) as u32) << 16)
                | ((((t * 7.0).fract() * 255.0) as u32) << 8)
                | 0xff;
            Color::from_rgba(rgba, false)
        })
        .collect()
}

fn generate_css(n: usize) -> Vec<String> {
    let templates = [
        "#3366cc",
        "rgb(10% 20% 30%)",
        "hsl(210deg 50% 40%)",
        "oklch(0.7 0.2 20)",
        "lab(50% 40 -20)",
        "device-cmyk(0.1 0.2 0.3 0.4)",
        "rebeccapurple",
        "hwb(120 10% 20%)",
    ];
    (0..n).map(|i| templates[i % templates.len()].to_string()).collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");
    let colors = generate_rgb_colors(1_000);
    let manager = Manager::get();

    for (label, target) in [
        ("hsl", SpaceType::Hsl),
        ("cmyk", SpaceType::Cmyk),
        ("lab", SpaceType::Lab),
        ("oklch", SpaceType::OkLch),
        ("hsluv", SpaceType::Hsluv),
    ] {
        let Some(space) = manager.find(target) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("rgb_to", label), &colors, |b, colors| {
            b.iter(|| {
                for color in colors {
                    black_box(color.converted_space(space.clone()));
                }
            })
        });
    }

    let rgb = manager.rgb();
    let oklch: Vec<Color> = colors
        .iter()
        .filter_map(|c| c.converted_type(SpaceType::OkLch))
        .collect();
    group.bench_with_input(BenchmarkId::new("to_rgb", "oklch"), &oklch, |b, colors| {
        b.iter(|| {
            for color in colors {
                black_box(color.converted_space(rgb.clone()));
            }
        })
    });

    group.finish();
}

fn bench_css_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("css_parse");

    for n in [100, 1_000] {
        let inputs = generate_css(n);
        group.bench_with_input(BenchmarkId::new("mixed", n), &inputs, |b, inputs| {
            b.iter(|| {
                for input in inputs {
                    black_box(Color::parse(black_box(input)));
                }
            })
        });
    }

    group.finish();
}

fn bench_gamut(c: &mut Criterion) {
    let mut group = c.benchmark_group("gamut");
    let rgb = Manager::get().rgb();

    let inputs = [
        ("in_gamut", "oklch(0.5 0.05 200)"),
        ("oversaturated", "oklch(0.7 0.4 20)"),
        ("too_light", "oklch(1.2 0.1 90)"),
    ];
    for (label, css) in inputs {
        let Some(color) = Color::parse(css) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("to_rgb", label), &color, |b, color| {
            b.iter(|| black_box(to_gamut_css(black_box(color), &rgb)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_conversion, bench_css_parse, bench_gamut);
criterion_main!(benches);
