//! Tests for the `sh` operator and shading pattern fills.

use pigment_core::interp::{BuilderEvent, Interpreter, RecordingBuilder};
use pigment_core::model::objects::dict;
use pigment_core::model::{NoStore, PDFDict, PDFObject, PDFStream, PathSegment};
use pigment_core::Diagnostics;

use approx::assert_abs_diff_eq;

fn nums(values: &[f64]) -> PDFObject {
    PDFObject::Array(values.iter().map(|&v| PDFObject::Real(v)).collect())
}

/// Gray ramp from 0 at `x = 0` to 1 at `x = 1`.
fn ramp() -> PDFObject {
    PDFObject::Dict(dict([
        ("FunctionType", PDFObject::Int(2)),
        ("Domain", nums(&[0.0, 1.0])),
        ("C0", nums(&[0.0])),
        ("C1", nums(&[1.0])),
        ("N", PDFObject::Int(1)),
    ]))
}

fn function_shading() -> PDFObject {
    PDFObject::Dict(dict([
        ("ShadingType", PDFObject::Int(1)),
        ("ColorSpace", PDFObject::name("DeviceGray")),
        ("Function", ramp()),
    ]))
}

fn axial_shading() -> PDFObject {
    PDFObject::Dict(dict([
        ("ShadingType", PDFObject::Int(2)),
        ("ColorSpace", PDFObject::name("DeviceGray")),
        ("Coords", nums(&[0.0, 0.0, 100.0, 0.0])),
        ("Function", ramp()),
    ]))
}

/// Mesh with 8-bit flags, coordinates and gray components.
fn mesh(shading_type: i64, data: Vec<u8>) -> PDFObject {
    let attrs = dict([
        ("ShadingType", PDFObject::Int(shading_type)),
        ("ColorSpace", PDFObject::name("DeviceGray")),
        ("BitsPerCoordinate", PDFObject::Int(8)),
        ("BitsPerComponent", PDFObject::Int(8)),
        ("BitsPerFlag", PDFObject::Int(8)),
        ("Decode", nums(&[0.0, 255.0, 0.0, 255.0, 0.0, 1.0])),
    ]);
    PDFObject::from(PDFStream::new(attrs, data))
}

fn shadings(shading: PDFObject) -> PDFDict {
    dict([("Shading", PDFObject::Dict(dict([("Sh0", shading)])))])
}

fn run(
    resources: PDFDict,
    content: &[u8],
    precision: Option<(f64, u32)>,
) -> (Vec<BuilderEvent>, Diagnostics) {
    let mut builder = RecordingBuilder::new();
    let diagnostics = {
        let mut interp = Interpreter::new(&mut builder, &NoStore, resources);
        if let Some((color_delta, max_depth)) = precision {
            interp.set_approximation_precision(color_delta, max_depth);
        }
        interp.parse_bytes(content.to_vec());
        interp.finish()
    };
    (builder.into_events(), diagnostics)
}

fn fill_colors(events: &[BuilderEvent]) -> Vec<Vec<f64>> {
    events
        .iter()
        .filter_map(|e| match e {
            BuilderEvent::Path {
                fill: true,
                fill_color,
                ..
            } => Some(fill_color.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// sh
// ============================================================================

#[test]
fn test_axial_goes_to_builder() {
    let (events, diagnostics) = run(shadings(axial_shading()), b"2 0 0 2 0 0 cm /Sh0 sh", None);
    assert_eq!(diagnostics, Diagnostics::default());
    assert_eq!(
        events,
        vec![BuilderEvent::ShadedFill {
            shading_type: 2,
            matrix: (2.0, 0.0, 0.0, 2.0, 0.0, 0.0),
        }]
    );
}

#[test]
fn test_function_shading_subdivides() {
    let (events, _) = run(shadings(function_shading()), b"/Sh0 sh", Some((0.5, 6)));
    let colors = fill_colors(&events);
    assert_eq!(colors.len(), 4);
    assert!(colors.iter().all(|c| c.len() == 1));
    // Each quarter is painted with the color at its center.
    assert!(colors.contains(&vec![0.25]));
    assert!(colors.contains(&vec![0.75]));

    let (events, _) = run(shadings(function_shading()), b"/Sh0 sh", Some((0.25, 6)));
    assert_eq!(fill_colors(&events).len(), 16);
}

#[test]
fn test_function_shading_depth_limit() {
    let (events, _) = run(shadings(function_shading()), b"/Sh0 sh", Some((0.001, 2)));
    assert_eq!(fill_colors(&events).len(), 16);
}

/// Gray equal to `y`, independent of `x`, over the unit square.
fn vertical_ramp_shading(domain: &[f64]) -> PDFObject {
    let attrs = dict([
        ("FunctionType", PDFObject::Int(0)),
        ("Domain", nums(&[0.0, 1.0, 0.0, 1.0])),
        ("Range", nums(&[0.0, 1.0])),
        ("Size", PDFObject::Array(vec![PDFObject::Int(2), PDFObject::Int(2)])),
        ("BitsPerSample", PDFObject::Int(8)),
    ]);
    let function = PDFObject::from(PDFStream::new(attrs, vec![0u8, 0, 255, 255]));
    PDFObject::Dict(dict([
        ("ShadingType", PDFObject::Int(1)),
        ("ColorSpace", PDFObject::name("DeviceGray")),
        ("Domain", nums(domain)),
        ("Function", function),
    ]))
}

#[test]
fn test_function_shading_domain_order() {
    // [xmin xmax ymin ymax]: x spans 0..2, y spans 0..1.
    let shading = vertical_ramp_shading(&[0.0, 2.0, 0.0, 1.0]);
    let (events, _) = run(shadings(shading), b"/Sh0 sh", Some((0.5, 6)));
    let fills: Vec<(Vec<PathSegment>, f64)> = events
        .iter()
        .filter_map(|e| match e {
            BuilderEvent::Path {
                fill: true,
                segments,
                fill_color,
                ..
            } => Some((segments.clone(), fill_color[0])),
            _ => None,
        })
        .collect();
    assert_eq!(fills.len(), 4);

    let points = |segments: &[PathSegment]| -> Vec<(f64, f64)> {
        segments
            .iter()
            .filter_map(|s| match *s {
                PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    };
    let max_x = fills
        .iter()
        .flat_map(|(segments, _)| points(segments))
        .map(|(x, _)| x)
        .fold(f64::MIN, f64::max);
    assert_abs_diff_eq!(max_x, 2.0, epsilon = 1e-12);

    // Each cell is painted with the gray of its vertical center.
    for (segments, gray) in &fills {
        let pts = points(segments);
        let center_y = pts.iter().map(|p| p.1).sum::<f64>() / pts.len() as f64;
        assert_abs_diff_eq!(*gray, center_y, epsilon = 1e-9);
    }
    let mut grays: Vec<f64> = fills.iter().map(|(_, g)| *g).collect();
    grays.sort_by(f64::total_cmp);
    assert_abs_diff_eq!(grays[0], 0.25, epsilon = 1e-9);
    assert_abs_diff_eq!(grays[3], 0.75, epsilon = 1e-9);
}

#[test]
fn test_sh_keeps_state_and_path() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, shadings(function_shading()));
    interp.parse_bytes(&b"0 0 m 5 5 l /Sh0 sh"[..]);
    assert_eq!(interp.save_depth(), 0);
    assert_eq!(interp.state().fill_space.name(), "DeviceGray");
    assert_eq!(
        interp.state().path.segments(),
        &[PathSegment::MoveTo(0.0, 0.0), PathSegment::LineTo(5.0, 5.0)]
    );
    drop(interp);
    assert_eq!(builder.events.first(), Some(&BuilderEvent::SaveState));
    assert_eq!(builder.events.last(), Some(&BuilderEvent::RestoreState));
}

#[test]
fn test_flat_triangle_is_one_path() {
    let data = vec![
        0, 0, 0, 128, //
        0, 100, 0, 128, //
        0, 0, 100, 128,
    ];
    let (events, _) = run(shadings(mesh(4, data)), b"/Sh0 sh", None);
    let colors = fill_colors(&events);
    assert_eq!(colors, vec![vec![128.0 / 255.0]]);
    let BuilderEvent::Path { segments, .. } = builder_path(&events) else {
        unreachable!();
    };
    assert_eq!(segments.len(), 4);
}

#[test]
fn test_gouraud_triangle_subdivides_to_color_delta() {
    let data = vec![
        0, 0, 0, 0, //
        0, 100, 0, 255, //
        0, 0, 100, 0,
    ];
    let (events, _) = run(shadings(mesh(4, data)), b"/Sh0 sh", Some((0.5, 6)));
    let colors = fill_colors(&events);
    assert_eq!(colors.len(), 4);
    assert!(colors.contains(&vec![0.5]));
}

#[test]
fn test_flat_coons_patch() {
    let mut data = vec![0u8];
    for (x, y) in [
        (0, 0),
        (0, 10),
        (0, 20),
        (0, 30),
        (10, 30),
        (20, 30),
        (30, 30),
        (30, 20),
        (30, 10),
        (30, 0),
        (20, 0),
        (10, 0),
    ] {
        data.extend([x, y]);
    }
    data.extend([51, 51, 51, 51]);
    let (events, diagnostics) = run(shadings(mesh(6, data)), b"/Sh0 sh", None);
    assert_eq!(diagnostics.errors, 0);
    assert_eq!(fill_colors(&events), vec![vec![0.2]]);
    let BuilderEvent::Path { segments, .. } = builder_path(&events) else {
        unreachable!();
    };
    assert_eq!(segments.len(), 6);
    assert_eq!(segments[0], PathSegment::MoveTo(0.0, 0.0));
    assert_eq!(
        segments.iter().filter(|s| matches!(s, PathSegment::CurveTo(..))).count(),
        4
    );
}

#[test]
fn test_patch_corners_subdivide() {
    let mut data = vec![0u8];
    for (x, y) in [
        (0, 0),
        (0, 10),
        (0, 20),
        (0, 30),
        (10, 30),
        (20, 30),
        (30, 30),
        (30, 20),
        (30, 10),
        (30, 0),
        (20, 0),
        (10, 0),
    ] {
        data.extend([x, y]);
    }
    data.extend([0, 255, 255, 0]);
    let (events, _) = run(shadings(mesh(6, data)), b"/Sh0 sh", Some((0.5, 1)));
    assert_eq!(fill_colors(&events).len(), 4);
}

#[test]
fn test_unknown_and_bad_shadings() {
    let (_, diagnostics) = run(PDFDict::new(), b"/Sh0 sh", None);
    assert_eq!(diagnostics.warnings, 1);
    assert!(diagnostics.contains("Unknown shading 'Sh0'"));

    let bad = PDFObject::Dict(dict([
        ("ShadingType", PDFObject::Int(9)),
        ("ColorSpace", PDFObject::name("DeviceGray")),
    ]));
    let (events, diagnostics) = run(shadings(bad), b"/Sh0 sh", None);
    assert!(events.is_empty());
    assert!(diagnostics.contains("Bad shading 'Sh0'"));
}

// ============================================================================
// Shading patterns
// ============================================================================

fn pattern_resources(shading: PDFObject) -> PDFDict {
    let pattern = PDFObject::Dict(dict([
        ("PatternType", PDFObject::Int(2)),
        ("Shading", shading),
    ]));
    dict([("Pattern", PDFObject::Dict(dict([("P0", pattern)])))])
}

#[test]
fn test_supported_pattern_is_painted_by_builder() {
    let (events, diagnostics) = run(
        pattern_resources(axial_shading()),
        b"/Pattern cs /P0 scn 0 0 10 10 re f",
        None,
    );
    assert_eq!(diagnostics, Diagnostics::default());
    assert_eq!(fill_colors(&events).len(), 1);
}

#[test]
fn test_unsupported_pattern_falls_back_to_shading() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(
        &mut builder,
        &NoStore,
        pattern_resources(function_shading()),
    );
    interp.parse_bytes(&b"/Pattern cs /P0 scn 0 0 10 10 re f"[..]);
    assert_eq!(interp.clip_history().depth(), 0);
    assert!(interp.clip_history().clip_path().is_empty());
    assert!(interp.state().path.segments().is_empty());
    assert!(interp.state().fill_space.is_pattern());
    drop(interp);
    assert_eq!(fill_colors(&builder.events).len(), 4);
    assert!(
        !builder
            .events
            .iter()
            .any(|e| matches!(e, BuilderEvent::Clip { .. }))
    );
}

fn builder_path(events: &[BuilderEvent]) -> &BuilderEvent {
    events
        .iter()
        .find(|e| matches!(e, BuilderEvent::Path { .. }))
        .expect("a painted path")
}
