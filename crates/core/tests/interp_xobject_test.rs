//! Tests for form and image XObjects, inline images and optional content
//! layers.

use pigment_core::interp::{BuilderEvent, FillRule, Interpreter, RecordingBuilder};
use pigment_core::model::objects::dict;
use pigment_core::model::{
    MemoryStore, NoStore, ObjectStore, PDFDict, PDFObjRef, PDFObject, PDFStream,
};
use pigment_core::{Diagnostics, InterpreterConfig};

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

fn nums(values: &[f64]) -> PDFObject {
    PDFObject::Array(values.iter().map(|&v| PDFObject::Real(v)).collect())
}

fn xobjects(entries: Vec<(&str, PDFObject)>) -> PDFDict {
    dict([("XObject", PDFObject::Dict(dict(entries)))])
}

fn form(extra: Vec<(&str, PDFObject)>, content: &'static [u8]) -> PDFObject {
    let mut attrs = dict([
        ("Type", PDFObject::name("XObject")),
        ("Subtype", PDFObject::name("Form")),
        ("BBox", nums(&[0.0, 0.0, 50.0, 50.0])),
    ]);
    for (k, v) in extra {
        attrs.insert(k.to_string(), v);
    }
    PDFObject::from(PDFStream::new(attrs, content))
}

fn image(extra: Vec<(&str, PDFObject)>) -> PDFStream {
    let mut attrs = dict([
        ("Subtype", PDFObject::name("Image")),
        ("Width", PDFObject::Int(2)),
        ("Height", PDFObject::Int(2)),
        ("BitsPerComponent", PDFObject::Int(8)),
        ("ColorSpace", PDFObject::name("DeviceRGB")),
    ]);
    for (k, v) in extra {
        attrs.insert(k.to_string(), v);
    }
    PDFStream::new(attrs, vec![0u8; 12])
}

fn count(events: &[BuilderEvent], pred: impl Fn(&BuilderEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

// ============================================================================
// Forms
// ============================================================================

#[test]
fn test_form_is_grouped_and_clipped() {
    let resources = xobjects(vec![(
        "Fm0",
        form(
            vec![("Matrix", nums(&[1.0, 0.0, 0.0, 1.0, 10.0, 20.0]))],
            b"0 0 10 10 re f",
        ),
    )]);
    let (events, diagnostics) = run_in(&NoStore, resources, b"/Fm0 Do");
    assert_eq!(diagnostics, Diagnostics::default());
    assert_eq!(
        events[0],
        BuilderEvent::StartGroup {
            bbox: (0.0, 0.0, 50.0, 50.0),
            isolated: false,
            knockout: false,
            soft_mask: false,
            alpha: false,
        }
    );
    assert_eq!(events[1], BuilderEvent::SaveState);
    assert_eq!(
        events[2],
        BuilderEvent::Clip {
            rule: FillRule::NonZero,
            is_bbox: true,
            contours: 1,
        }
    );
    assert!(matches!(
        events[3],
        BuilderEvent::Path { ctm, .. } if ctm == (1.0, 0.0, 0.0, 1.0, 10.0, 20.0)
    ));
    assert_eq!(events[4], BuilderEvent::RestoreState);
    assert_eq!(events[5], BuilderEvent::FinishGroup { soft_mask: false });
    assert_eq!(events.len(), 6);
}

#[test]
fn test_form_does_not_leak_state() {
    let resources = xobjects(vec![("Fm0", form(vec![], b"7 w 2 0 0 2 0 0 cm"))]);
    let mut builder = RecordingBuilder::new();
    let mut interp = Interpreter::new(&mut builder, &NoStore, resources);
    interp.parse_bytes(&b"/Fm0 Do"[..]);
    assert_eq!(interp.state().line_width, 1.0);
    assert_eq!(interp.state().ctm, (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
    assert_eq!(interp.save_depth(), 0);
    assert_eq!(interp.clip_history().depth(), 0);
}

#[test]
fn test_transparency_group_takes_fill_opacity() {
    let group = PDFObject::Dict(dict([
        ("S", PDFObject::name("Transparency")),
        ("I", PDFObject::Bool(true)),
    ]));
    let mut resources = xobjects(vec![("Fm0", form(vec![("Group", group)], b""))]);
    resources.insert(
        "ExtGState".into(),
        PDFObject::Dict(dict([(
            "GS0",
            PDFObject::Dict(dict([("ca", PDFObject::Real(0.5))])),
        )])),
    );
    let (events, _) = run_in(&NoStore, resources, b"/GS0 gs /Fm0 Do");
    assert!(matches!(
        events[0],
        BuilderEvent::StartGroup { isolated: true, knockout: false, .. }
    ));
    assert!(events.contains(&BuilderEvent::GroupOpacity { opacity: 0.5 }));
}

#[test]
fn test_form_without_group_keeps_opacity() {
    let mut resources = xobjects(vec![("Fm0", form(vec![], b""))]);
    resources.insert(
        "ExtGState".into(),
        PDFObject::Dict(dict([(
            "GS0",
            PDFObject::Dict(dict([("ca", PDFObject::Real(0.5))])),
        )])),
    );
    let (events, _) = run_in(&NoStore, resources, b"/GS0 gs /Fm0 Do");
    assert_eq!(
        count(&events, |e| matches!(e, BuilderEvent::GroupOpacity { .. })),
        0
    );
}

#[test]
fn test_recursive_form_stops_at_depth_limit() {
    let mut store = MemoryStore::new();
    let resources = xobjects(vec![(
        "Fm0",
        PDFObject::Ref(PDFObjRef::new(1, 0)),
    )]);
    store.insert(1, form(vec![("Resources", PDFObject::Dict(resources.clone()))], b"/Fm0 Do"));

    let config = InterpreterConfig {
        max_form_depth: 3,
        ..InterpreterConfig::default()
    };
    let mut builder = RecordingBuilder::new();
    {
        let mut interp = Interpreter::new_sub_page(
            &mut builder,
            &store,
            resources,
            (0.0, 0.0, 100.0, 100.0),
            config,
        );
        interp.parse_bytes(&b"/Fm0 Do"[..]);
        assert_eq!(interp.finish().errors, 0);
    }
    let events = builder.into_events();
    assert_eq!(
        count(&events, |e| matches!(e, BuilderEvent::StartGroup { .. })),
        4
    );
    assert_eq!(
        count(&events, |e| matches!(e, BuilderEvent::FinishGroup { .. })),
        4
    );
}

#[test]
fn test_form_sees_outer_resources() {
    let resources = xobjects(vec![
        ("Fm0", form(vec![], b"/Im0 Do")),
        ("Im0", PDFObject::from(image(vec![]))),
    ]);
    let (events, _) = run_in(&NoStore, resources, b"/Fm0 Do");
    assert_eq!(
        count(&events, |e| matches!(e, BuilderEvent::Image { .. })),
        1
    );
}

#[test]
fn test_bad_form_bbox() {
    let mut attrs = dict([("Subtype", PDFObject::name("Form"))]);
    attrs.insert("BBox".into(), nums(&[0.0, 0.0]));
    let resources = xobjects(vec![("Fm0", PDFObject::from(PDFStream::new(attrs, &b"0 0 1 1 re f"[..])))]);
    let (events, diagnostics) = run_in(&NoStore, resources, b"/Fm0 Do");
    assert!(diagnostics.contains("Bad form bounding box"));
    assert!(events.is_empty());
}

// ============================================================================
// XObject lookup
// ============================================================================

#[test]
fn test_missing_xobject_is_silent() {
    let (events, diagnostics) = run_in(&NoStore, PDFDict::new(), b"/Nope Do");
    assert!(events.is_empty());
    assert_eq!(diagnostics, Diagnostics::default());
}

#[test]
fn test_xobject_wrong_type_and_subtype() {
    let resources = xobjects(vec![
        ("Dict", PDFObject::Dict(PDFDict::new())),
        (
            "Odd",
            PDFObject::from(PDFStream::new(
                dict([("Subtype", PDFObject::name("Sound"))]),
                Vec::new(),
            )),
        ),
        (
            "PS",
            PDFObject::from(PDFStream::new(
                dict([("Subtype", PDFObject::name("PS"))]),
                Vec::new(),
            )),
        ),
    ]);
    let (_, diagnostics) = run_in(&NoStore, resources, b"/Dict Do /Odd Do /PS Do");
    assert!(diagnostics.contains("XObject 'Dict' is wrong type"));
    assert!(diagnostics.contains("Unknown XObject subtype 'Sound'"));
    assert_eq!(diagnostics.errors, 2);
}

#[test]
fn test_optional_content_layer() {
    let oc = PDFObject::Dict(dict([
        ("Type", PDFObject::name("OCG")),
        ("Name", PDFObject::String(b"Layer 1".to_vec())),
    ]));
    let resources = xobjects(vec![("Im0", PDFObject::from(image(vec![("OC", oc)])))]);
    let (events, _) = run_in(&NoStore, resources, b"/Im0 Do");
    assert_eq!(
        events[0],
        BuilderEvent::BeginXObjectLayer {
            label: "Layer 1".into()
        }
    );
    assert!(matches!(events[1], BuilderEvent::Image { .. }));
    assert_eq!(events[2], BuilderEvent::EndMarkedContent);
}

// ============================================================================
// Images
// ============================================================================

#[test]
fn test_image_xobject() {
    let resources = xobjects(vec![("Im0", PDFObject::from(image(vec![])))]);
    let (events, _) = run_in(&NoStore, resources, b"/Im0 Do");
    assert_eq!(
        events,
        vec![BuilderEvent::Image {
            width: 2,
            height: 2,
            inline: false,
            mask_colors: None,
        }]
    );
}

#[test]
fn test_color_key_mask() {
    let mask = PDFObject::Array((0..6).map(PDFObject::Int).collect());
    let resources = xobjects(vec![("Im0", PDFObject::from(image(vec![("Mask", mask)])))]);
    let (events, _) = run_in(&NoStore, resources, b"/Im0 Do");
    assert!(matches!(
        &events[0],
        BuilderEvent::Image { mask_colors: Some(colors), .. } if colors == &vec![0, 1, 2, 3, 4, 5]
    ));
}

#[test]
fn test_stencil_masks() {
    let stencil = |decode: Option<PDFObject>| {
        let mut attrs = dict([
            ("Subtype", PDFObject::name("Image")),
            ("Width", PDFObject::Int(8)),
            ("Height", PDFObject::Int(1)),
            ("ImageMask", PDFObject::Bool(true)),
        ]);
        if let Some(decode) = decode {
            attrs.insert("Decode".into(), decode);
        }
        PDFObject::from(PDFStream::new(attrs, vec![0xf0u8]))
    };
    let resources = xobjects(vec![
        ("M0", stencil(None)),
        ("M1", stencil(Some(PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(0)])))),
    ]);
    let (events, _) = run_in(&NoStore, resources, b"/M0 Do /M1 Do");
    assert_eq!(
        events,
        vec![
            BuilderEvent::ImageMask {
                width: 8,
                height: 1,
                invert: false,
            },
            BuilderEvent::ImageMask {
                width: 8,
                height: 1,
                invert: true,
            },
        ]
    );
}

#[test]
fn test_explicit_and_soft_masks() {
    let mut store = MemoryStore::new();
    let stencil = store.add(PDFStream::new(
        dict([
            ("Width", PDFObject::Int(4)),
            ("Height", PDFObject::Int(4)),
            ("ImageMask", PDFObject::Bool(true)),
        ]),
        vec![0u8; 4],
    ));
    let soft = store.add(PDFStream::new(
        dict([
            ("Width", PDFObject::Int(3)),
            ("Height", PDFObject::Int(3)),
            ("BitsPerComponent", PDFObject::Int(8)),
            ("ColorSpace", PDFObject::name("DeviceGray")),
        ]),
        vec![0u8; 9],
    ));
    let resources = xobjects(vec![
        ("Im0", PDFObject::from(image(vec![("Mask", PDFObject::Ref(stencil))]))),
        ("Im1", PDFObject::from(image(vec![("SMask", PDFObject::Ref(soft))]))),
    ]);
    let (events, diagnostics) = run_in(&store, resources, b"/Im0 Do /Im1 Do");
    assert_eq!(diagnostics.errors, 0);
    assert_eq!(
        events,
        vec![
            BuilderEvent::MaskedImage {
                width: 2,
                height: 2,
                mask_width: 4,
                mask_height: 4,
                mask_invert: false,
            },
            BuilderEvent::SoftMaskedImage {
                width: 2,
                height: 2,
                mask_width: 3,
                mask_height: 3,
            },
        ]
    );
}

#[test]
fn test_bad_image_parameters() {
    let resources = xobjects(vec![
        ("Zero", PDFObject::from(image(vec![("Width", PDFObject::Int(0))]))),
        ("NoCs", PDFObject::from(image(vec![("ColorSpace", PDFObject::Null)]))),
        (
            "DeepMask",
            PDFObject::from(image(vec![
                ("ImageMask", PDFObject::Bool(true)),
                ("BitsPerComponent", PDFObject::Int(8)),
            ])),
        ),
    ]);
    let (events, diagnostics) = run_in(&NoStore, resources, b"/Zero Do /NoCs Do /DeepMask Do");
    assert!(events.is_empty());
    assert_eq!(diagnostics.errors, 3);
    assert!(diagnostics.contains("Bad image parameters"));
}

// ============================================================================
// Inline images
// ============================================================================

#[test]
fn test_inline_image_with_abbreviations() {
    let (events, diagnostics) = run_in(
        &NoStore,
        PDFDict::new(),
        b"q BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff EI Q",
    );
    assert_eq!(diagnostics.errors, 0);
    assert!(events.contains(&BuilderEvent::Image {
        width: 2,
        height: 1,
        inline: true,
        mask_colors: None,
    }));
}

#[test]
fn test_inline_image_mask() {
    let (events, _) = run_in(
        &NoStore,
        PDFDict::new(),
        b"BI /W 8 /H 1 /IM true /D [1 0] ID \x0f EI",
    );
    assert_eq!(
        events,
        vec![BuilderEvent::ImageMask {
            width: 8,
            height: 1,
            invert: true,
        }]
    );
}

#[test]
fn test_inline_image_color_space_resource() {
    let resources = dict([(
        "ColorSpace",
        PDFObject::Dict(dict([("CS0", PDFObject::name("DeviceCMYK"))])),
    )]);
    let (events, diagnostics) = run_in(
        &NoStore,
        resources,
        b"BI /W 1 /H 1 /BPC 8 /CS /CS0 ID \x00\x00\x00\x00 EI",
    );
    assert_eq!(diagnostics.errors, 0);
    assert_eq!(events.len(), 1);
}

#[test]
fn test_truncated_inline_image() {
    let (events, diagnostics) = run_in(&NoStore, PDFDict::new(), b"BI /W 1 /H 1 ID \x00\x01");
    assert!(events.is_empty());
    assert!(diagnostics.contains("End of file in inline image"));
}
