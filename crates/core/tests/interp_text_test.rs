//! Tests for text objects: positioning, font selection and glyph advances.

use pigment_core::interp::{BuilderEvent, Interpreter, RecordingBuilder};
use pigment_core::model::objects::dict;
use pigment_core::model::{NoStore, PDFDict, PDFObject};
use pigment_core::Diagnostics;

/// `F1` covers `A` (500) and `B` (600); other codes use the 250 missing width.
fn font_resources() -> PDFDict {
    let font = dict([
        ("Type", PDFObject::name("Font")),
        ("Subtype", PDFObject::name("Type1")),
        ("BaseFont", PDFObject::name("Helvetica")),
        ("FirstChar", PDFObject::Int(65)),
        (
            "Widths",
            PDFObject::Array(vec![PDFObject::Int(500), PDFObject::Int(600)]),
        ),
        (
            "FontDescriptor",
            PDFObject::Dict(dict([("MissingWidth", PDFObject::Int(250))])),
        ),
    ]);
    dict([(
        "Font",
        PDFObject::Dict(dict([("F1", PDFObject::Dict(font))])),
    )])
}

fn run(content: &[u8]) -> (Vec<BuilderEvent>, Diagnostics) {
    let mut builder = RecordingBuilder::new();
    let diagnostics = {
        let mut interp = Interpreter::new(&mut builder, &NoStore, font_resources());
        interp.parse_bytes(content.to_vec());
        interp.finish()
    };
    (builder.into_events(), diagnostics)
}

/// `(x, y, code)` of every reported character.
fn chars(events: &[BuilderEvent]) -> Vec<(f64, f64, u32)> {
    events
        .iter()
        .filter_map(|e| match e {
            BuilderEvent::Char { x, y, code, .. } => Some((*x, *y, *code)),
            _ => None,
        })
        .collect()
}

fn assert_close(got: f64, want: f64) {
    assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
}

#[test]
fn test_show_advances_by_widths() {
    let (events, diagnostics) = run(b"BT /F1 10 Tf 100 200 Td (AB) Tj ET");
    assert_eq!(diagnostics.errors, 0);
    let shown = chars(&events);
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0], (100.0, 200.0, 65));
    assert_close(shown[1].0, 105.0);
    assert_eq!(shown[1].2, 66);
}

#[test]
fn test_text_object_events() {
    let (events, _) = run(b"BT /F1 12 Tf (A) Tj ET");
    assert_eq!(events.first(), Some(&BuilderEvent::TextPosition { x: 0.0, y: 0.0 }));
    assert_eq!(events[1], BuilderEvent::BeginText);
    assert!(events.contains(&BuilderEvent::Font {
        name: Some("Helvetica".into()),
        size: 12.0,
    }));
    let begin = events
        .iter()
        .position(|e| *e == BuilderEvent::BeginString { len: 1 })
        .unwrap();
    assert!(matches!(
        events[begin + 1],
        BuilderEvent::Char { ref unicode, .. } if unicode.as_deref() == Some("A")
    ));
    assert_eq!(events[begin + 2], BuilderEvent::EndString);
    assert_eq!(events.last(), Some(&BuilderEvent::EndText));
}

#[test]
fn test_font_reported_once_until_changed() {
    let (events, _) = run(b"BT /F1 10 Tf (A) Tj (B) Tj 2 0 0 2 0 0 Tm (A) Tj ET");
    let fonts = events
        .iter()
        .filter(|e| matches!(e, BuilderEvent::Font { .. }))
        .count();
    assert_eq!(fonts, 2);
}

#[test]
fn test_tj_kerning() {
    let (events, _) = run(b"BT /F1 10 Tf [(A) -1000 (B) 500 (A)] TJ ET");
    let shown = chars(&events);
    assert_close(shown[1].0, 15.0);
    assert_close(shown[2].0, 16.0);
    assert!(events.contains(&BuilderEvent::TextShift { shift: -1000.0 }));
    assert!(events.contains(&BuilderEvent::TextShift { shift: 500.0 }));
}

#[test]
fn test_spacing_and_scaling() {
    // Word spacing applies to the single byte space only.
    let (events, _) = run(b"BT /F1 10 Tf 1 Tc 3 Tw ( A) Tj ET");
    let shown = chars(&events);
    assert_close(shown[1].0, 2.5 + 1.0 + 3.0);

    let (events, _) = run(b"BT /F1 10 Tf 50 Tz (AA) Tj ET");
    let shown = chars(&events);
    assert_close(shown[1].0, 2.5);
}

#[test]
fn test_rise_offsets_characters() {
    let (events, _) = run(b"BT /F1 10 Tf 4 Ts (A) Tj ET");
    assert_eq!(chars(&events)[0], (0.0, 4.0, 65));
}

#[test]
fn test_line_movement() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, font_resources());
    interp.parse_bytes(&b"BT 10 20 Td 5 -14 TD T*"[..]);
    let state = interp.state();
    assert_eq!(state.leading, 14.0);
    assert_eq!(state.line_pos, (15.0, -8.0));
    assert_eq!(state.cur_pos, (15.0, -8.0));

    interp.parse_bytes(&b"1 0 0 1 50 60 Tm"[..]);
    assert_eq!(interp.state().cur_pos, (50.0, 60.0));
    assert_eq!(interp.state().line_pos, (0.0, 0.0));
}

#[test]
fn test_quote_operators_move_to_next_line() {
    let (events, _) = run(b"BT /F1 10 Tf 12 TL 0 100 Td (A) ' 2 1 (B) \" ET");
    let shown = chars(&events);
    assert_eq!(shown[0], (0.0, 88.0, 65));
    assert_eq!(shown[1], (0.0, 76.0, 66));
}

#[test]
fn test_double_quote_sets_spacing() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, font_resources());
    interp.parse_bytes(&b"BT /F1 10 Tf 2 1 (B) \" ET"[..]);
    assert_eq!(interp.state().word_space, 2.0);
    assert_eq!(interp.state().char_space, 1.0);
}

#[test]
fn test_show_without_font() {
    let (events, diagnostics) = run(b"BT (A) Tj /Missing 10 Tf (A) Tj ET");
    assert_eq!(diagnostics.errors, 2);
    assert!(diagnostics.contains("No font in show"));
    assert!(chars(&events).is_empty());
}

#[test]
fn test_render_mode_is_a_style_change() {
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, font_resources());
    interp.parse_bytes(&b"BT 3 Tr ET"[..]);
    assert_eq!(interp.state().render, 3);
    drop(interp);
    assert!(builder.events.contains(&BuilderEvent::BeforeStateChange));
}

#[test]
fn test_identity_font_two_byte_codes() {
    let font = dict([
        ("Type", PDFObject::name("Font")),
        ("Subtype", PDFObject::name("Type0")),
        ("BaseFont", PDFObject::name("CJK")),
        ("Encoding", PDFObject::name("Identity-H")),
    ]);
    let resources = dict([(
        "Font",
        PDFObject::Dict(dict([("F2", PDFObject::Dict(font))])),
    )]);
    let mut builder = RecordingBuilder::new();
    {
        let mut interp = Interpreter::new(&mut builder, &NoStore, resources);
        interp.parse_bytes(&b"BT /F2 10 Tf <00410042> Tj ET"[..]);
    }
    let shown = chars(&builder.events);
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].2, 0x41);
    // Default width of 1000 glyph units.
    assert_close(shown[1].0, 10.0);
}
