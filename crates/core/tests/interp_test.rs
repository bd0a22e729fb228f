//! Tests for the content stream driver: operand checks, the state stack,
//! clipping, color and ExtGState operators.

use pigment_core::interp::{BuilderEvent, FillRule, Interpreter, RecordingBuilder};
use pigment_core::model::objects::dict;
use pigment_core::model::{MemoryStore, NoStore, ObjectStore, PDFDict, PDFObject, PDFStream, PathSegment};
use pigment_core::Diagnostics;

fn run_in(
    store: &dyn ObjectStore,
    resources: PDFDict,
    content: &[u8],
) -> (Vec<BuilderEvent>, Diagnostics) {
    let mut builder = RecordingBuilder::new();
    let diagnostics = {
        let mut interp = Interpreter::new(&mut builder, store, resources);
        interp.parse_bytes(content.to_vec());
        interp.finish()
    };
    (builder.into_events(), diagnostics)
}

fn run(content: &[u8]) -> (Vec<BuilderEvent>, Diagnostics) {
    run_in(&NoStore, PDFDict::new(), content)
}

fn paths(events: &[BuilderEvent]) -> Vec<&BuilderEvent> {
    events
        .iter()
        .filter(|e| matches!(e, BuilderEvent::Path { .. }))
        .collect()
}

fn clips(events: &[BuilderEvent]) -> Vec<&BuilderEvent> {
    events
        .iter()
        .filter(|e| matches!(e, BuilderEvent::Clip { .. }))
        .collect()
}

fn nums(values: &[f64]) -> PDFObject {
    PDFObject::Array(values.iter().map(|&v| PDFObject::Real(v)).collect())
}

// ============================================================================
// Painting end to end
// ============================================================================

#[test]
fn test_stroked_rectangle() {
    let (events, diagnostics) = run(b"1 0 0 RG 0 0 100 100 re S");
    assert_eq!(diagnostics, Diagnostics::default());

    let painted = paths(&events);
    assert_eq!(painted.len(), 1);
    let BuilderEvent::Path {
        fill,
        stroke,
        segments,
        stroke_color,
        ..
    } = painted[0]
    else {
        unreachable!();
    };
    assert!(!fill);
    assert!(stroke);
    assert_eq!(stroke_color, &vec![1.0, 0.0, 0.0]);
    assert_eq!(segments[0], PathSegment::MoveTo(0.0, 0.0));
    assert!(clips(&events).is_empty());
}

#[test]
fn test_fill_rules_and_combined_painting() {
    let (events, _) = run(b"0 0 m 10 0 l 10 10 l f* 0 0 m 5 5 l 0 5 l b");
    let painted = paths(&events);
    assert_eq!(painted.len(), 2);
    assert!(matches!(
        painted[0],
        BuilderEvent::Path { fill: true, stroke: false, even_odd: true, .. }
    ));
    let BuilderEvent::Path { fill, stroke, segments, .. } = painted[1] else {
        unreachable!();
    };
    assert!(*fill && *stroke);
    assert_eq!(segments.last(), Some(&PathSegment::ClosePath));
}

#[test]
fn test_paint_without_path_does_nothing() {
    let (events, diagnostics) = run(b"S f B n");
    assert!(paths(&events).is_empty());
    assert_eq!(diagnostics.errors, 0);
}

#[test]
fn test_lineto_without_current_point() {
    let (events, diagnostics) = run(b"10 10 l S");
    assert!(paths(&events).is_empty());
    assert!(diagnostics.contains("No current point in lineto"));
}

// ============================================================================
// Operand checks
// ============================================================================

#[test]
fn test_unknown_operator_warns() {
    let (_, diagnostics) = run(b"foo");
    assert_eq!(diagnostics.warnings, 1);
    assert!(diagnostics.contains("Unknown operator 'foo'"));
}

#[test]
fn test_unknown_operator_silent_in_compatibility_section() {
    let (_, diagnostics) = run(b"BX foo BX bar EX baz EX");
    assert_eq!(diagnostics.warnings, 0);

    let (_, diagnostics) = run(b"BX EX foo");
    assert_eq!(diagnostics.warnings, 1);
}

#[test]
fn test_too_few_args() {
    let (events, diagnostics) = run(b"1 m 5 5 l S");
    assert!(diagnostics.contains("Too few (1) args to 'm' operator"));
    assert!(paths(&events).is_empty());
}

#[test]
fn test_extra_leading_args_dropped() {
    let (events, diagnostics) = run(b"9 0 0 m 10 10 l S");
    assert_eq!(diagnostics.errors, 0);
    let BuilderEvent::Path { segments, .. } = paths(&events)[0] else {
        unreachable!();
    };
    assert_eq!(segments[0], PathSegment::MoveTo(0.0, 0.0));
}

#[test]
fn test_too_many_args_for_variadic_operator() {
    let (_, diagnostics) = run(b"1 2 3 4 5 sc");
    assert!(diagnostics.contains("Too many (5) args to 'sc' operator"));
}

#[test]
fn test_wrong_arg_type() {
    let (_, diagnostics) = run(b"(x) 0 m");
    assert!(diagnostics.contains("Arg #0 to 'm' operator is wrong type (string)"));
}

#[test]
fn test_operand_stack_limit() {
    let content = format!("{} n", vec!["1"; 40].join(" "));
    let (_, diagnostics) = run(content.as_bytes());
    assert_eq!(diagnostics.errors, 7);
    assert!(diagnostics.contains("Too many args in content stream"));
}

#[test]
fn test_leftover_args() {
    let (_, diagnostics) = run(b"0 0 m 1 2");
    assert!(diagnostics.contains("Leftover args in content stream"));
}

#[test]
fn test_operator_history() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"q 1 w bogus Q"[..]);
    assert_eq!(interp.last_operator(), "Q");
    assert_eq!(interp.previous_operator(0), "");
    assert_eq!(interp.previous_operator(1), "w");
    assert_eq!(interp.previous_operator(2), "q");
    assert_eq!(interp.previous_operator(3), "");
}

// ============================================================================
// State stack
// ============================================================================

#[test]
fn test_save_restore() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"q 5 w q 2 w"[..]);
    assert_eq!(interp.save_depth(), 2);
    assert_eq!(interp.state().line_width, 2.0);

    interp.parse_bytes(&b"Q"[..]);
    assert_eq!(interp.state().line_width, 5.0);

    // Restoring past the bottom of the stack is a no-op.
    interp.parse_bytes(&b"Q Q Q"[..]);
    assert_eq!(interp.save_depth(), 0);
    assert_eq!(interp.state().line_width, 1.0);
    assert_eq!(interp.finish().errors, 0);
}

#[test]
fn test_finish_restores_open_saves() {
    let (events, _) = run(b"q q");
    let saves = events.iter().filter(|e| **e == BuilderEvent::SaveState).count();
    let restores = events.iter().filter(|e| **e == BuilderEvent::RestoreState).count();
    assert_eq!(saves, 2);
    assert_eq!(restores, 2);
}

#[test]
fn test_path_survives_restore() {
    let (events, _) = run(b"0 0 m q 10 10 l Q S");
    let BuilderEvent::Path { segments, .. } = paths(&events)[0] else {
        unreachable!();
    };
    assert_eq!(
        segments,
        &vec![PathSegment::MoveTo(0.0, 0.0), PathSegment::LineTo(10.0, 10.0)]
    );
}

#[test]
fn test_cm_concatenates() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"2 0 0 2 0 0 cm 1 0 0 1 5 5 cm"[..]);
    assert_eq!(interp.state().ctm, (2.0, 0.0, 0.0, 2.0, 10.0, 10.0));
}

#[test]
fn test_style_notifications_bracket_changes() {
    let (events, _) = run(b"3 w");
    assert_eq!(events[0], BuilderEvent::BeforeStateChange);
    assert!(matches!(events[1], BuilderEvent::UpdateStyle { line_width, .. } if line_width == 3.0));
}

// ============================================================================
// Clipping
// ============================================================================

#[test]
fn test_clip_applies_when_path_ends() {
    let (events, _) = run(b"0 0 50 50 re W n");
    assert_eq!(
        clips(&events),
        vec![&BuilderEvent::Clip {
            rule: FillRule::NonZero,
            is_bbox: false,
            contours: 1,
        }]
    );
}

#[test]
fn test_clip_after_painting() {
    let (events, _) = run(b"0 0 50 50 re W* f");
    let path_at = events
        .iter()
        .position(|e| matches!(e, BuilderEvent::Path { .. }))
        .unwrap();
    let clip_at = events
        .iter()
        .position(|e| matches!(e, BuilderEvent::Clip { rule: FillRule::EvenOdd, .. }))
        .unwrap();
    assert!(path_at < clip_at);
}

#[test]
fn test_clip_restored_with_state() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"q 0 0 50 50 re W n"[..]);
    assert_eq!(interp.clip_history().depth(), 1);
    assert_eq!(interp.clip_history().clip_path().len(), 1);
    interp.parse_bytes(&b"Q"[..]);
    assert_eq!(interp.clip_history().depth(), 0);
    assert!(interp.clip_history().clip_path().is_empty());
}

#[test]
fn test_nested_clips_intersect() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"0 0 50 50 re W n q 100 100 10 10 re W n"[..]);
    // Disjoint clips leave nothing visible.
    assert!(interp.clip_history().flattened().is_empty());
}

// ============================================================================
// Color
// ============================================================================

#[test]
fn test_device_colors() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"0.5 g 0 1 0 RG"[..]);
    assert_eq!(interp.state().fill_space.name(), "DeviceGray");
    assert_eq!(interp.state().fill_color.as_slice(), &[0.5]);
    assert_eq!(interp.state().stroke_space.name(), "DeviceRGB");

    interp.parse_bytes(&b"0.1 0.2 0.3 0.4 k"[..]);
    assert_eq!(interp.state().fill_space.name(), "DeviceCMYK");
    assert_eq!(interp.state().fill_color.len(), 4);
}

#[test]
fn test_color_space_then_color() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, PDFDict::new());
    interp.parse_bytes(&b"/DeviceRGB cs"[..]);
    assert_eq!(interp.state().fill_color.as_slice(), &[0.0, 0.0, 0.0]);
    interp.parse_bytes(&b"1 0.5 0 sc"[..]);
    assert_eq!(interp.state().fill_color.as_slice(), &[1.0, 0.5, 0.0]);

    interp.parse_bytes(&b"1 0 sc"[..]);
    assert!(
        interp
            .diagnostics()
            .contains("Incorrect number of arguments in 'sc' command")
    );
}

#[test]
fn test_named_color_space_from_resources() {
    let resources = dict([(
        "ColorSpace",
        PDFObject::Dict(dict([("CS0", PDFObject::name("DeviceCMYK"))])),
    )]);
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, resources);
    interp.parse_bytes(&b"/CS0 cs /Missing CS"[..]);
    assert_eq!(interp.state().fill_space.name(), "DeviceCMYK");
    assert_eq!(interp.state().fill_color.as_slice(), &[0.0, 0.0, 0.0, 1.0]);
    let diagnostics = interp.finish();
    assert!(diagnostics.contains("Bad color space (stroke)"));
    assert_eq!(diagnostics.errors, 1);
}

#[test]
fn test_unknown_pattern_warns() {
    let (_, diagnostics) = run(b"/Pattern cs /P0 scn");
    assert_eq!(diagnostics.errors, 0);
    assert!(diagnostics.contains("Unknown pattern 'P0'"));
}

// ============================================================================
// ExtGState
// ============================================================================

fn gstate(entries: Vec<(&str, PDFObject)>) -> PDFDict {
    dict([(
        "ExtGState",
        PDFObject::Dict(dict([("GS0", PDFObject::Dict(dict(entries)))])),
    )])
}

#[test]
fn test_gs_opacity_and_blend_mode() {
    let resources = gstate(vec![
        ("ca", PDFObject::Real(0.5)),
        ("CA", PDFObject::Real(0.25)),
        ("BM", PDFObject::name("Multiply")),
        ("LW", PDFObject::Int(4)),
    ]);
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, resources);
    interp.parse_bytes(&b"/GS0 gs"[..]);
    let state = interp.state();
    assert_eq!(state.fill_opacity, 0.5);
    assert_eq!(state.stroke_opacity, 0.25);
    assert_eq!(state.blend_mode, "Multiply");
    assert_eq!(state.line_width, 4.0);
}

#[test]
fn test_gs_invalid_blend_mode() {
    let resources = gstate(vec![("BM", PDFObject::name("Sparkle"))]);
    let (_, diagnostics) = run_in(&NoStore, resources, b"/GS0 gs");
    assert!(diagnostics.contains("Invalid blend mode in ExtGState"));
}

#[test]
fn test_gs_soft_mask_without_group() {
    let resources = gstate(vec![(
        "SMask",
        PDFObject::Dict(dict([("S", PDFObject::name("Luminosity"))])),
    )]);
    let (events, diagnostics) = run_in(&NoStore, resources, b"/GS0 gs");
    assert!(diagnostics.contains("Invalid soft mask in ExtGState - missing group"));
    assert!(!events.iter().any(|e| matches!(e, BuilderEvent::StartGroup { .. })));
}

#[test]
fn test_gs_soft_mask_draws_group() {
    let mut store = MemoryStore::new();
    let form = PDFStream::new(
        dict([
            ("Subtype", PDFObject::name("Form")),
            ("BBox", nums(&[0.0, 0.0, 10.0, 10.0])),
            (
                "Group",
                PDFObject::Dict(dict([
                    ("S", PDFObject::name("Transparency")),
                    ("CS", PDFObject::name("DeviceGray")),
                ])),
            ),
        ]),
        &b"0 0 10 10 re f"[..],
    );
    let form_ref = store.add(form);
    let resources = gstate(vec![(
        "SMask",
        PDFObject::Dict(dict([
            ("S", PDFObject::name("Alpha")),
            ("G", PDFObject::Ref(form_ref)),
        ])),
    )]);
    let (events, diagnostics) = run_in(&store, resources, b"/GS0 gs");
    assert_eq!(diagnostics.errors, 0);
    assert!(events.contains(&BuilderEvent::StartGroup {
        bbox: (0.0, 0.0, 10.0, 10.0),
        isolated: false,
        knockout: false,
        soft_mask: true,
        alpha: true,
    }));
    assert!(events.contains(&BuilderEvent::FinishGroup { soft_mask: true }));
    assert_eq!(paths(&events).len(), 1);
}

#[test]
fn test_gs_missing_resource_is_ignored() {
    let (_, diagnostics) = run(b"/Nothing gs");
    assert_eq!(diagnostics, Diagnostics::default());
}

// ============================================================================
// Marked content
// ============================================================================

#[test]
fn test_marked_content_tags() {
    let (events, _) = run(b"/OC /MC0 BDC EMC /Span BMC EMC /P <</MCID 0>> BDC EMC");
    let marked: Vec<&BuilderEvent> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                BuilderEvent::BeginMarkedContent { .. } | BuilderEvent::EndMarkedContent
            )
        })
        .collect();
    assert_eq!(marked.len(), 6);
    assert_eq!(
        marked[0],
        &BuilderEvent::BeginMarkedContent {
            tag: Some("OC".into()),
            properties: Some("MC0".into()),
        }
    );
    let untagged = BuilderEvent::BeginMarkedContent {
        tag: None,
        properties: None,
    };
    assert_eq!(marked[2], &untagged);
    assert_eq!(marked[4], &untagged);
}
