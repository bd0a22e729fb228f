//! Scene builder - the output side of the interpreter.
//!
//! The interpreter never produces a drawing itself. It raises notifications
//! on a [`SceneBuilder`] at fixed points of the operator semantics; an SVG
//! writer, a renderer or a test recorder decides what to make of them.
//! Every method has an empty default so builders only implement what they
//! care about.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interp::clip::{ClipPath, FillRule};
use crate::model::{GfxColor, GfxState, PDFStream, PathSegment, Pattern, PdfColorSpace, Shading};
use crate::utils::{Matrix, Rect};

/// Transparency group parameters for [`SceneBuilder::start_group`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupParams {
    pub blending_space: Option<PdfColorSpace>,
    pub isolated: bool,
    pub knockout: bool,
    /// The group is rendered into a soft mask.
    pub soft_mask: bool,
    /// Soft mask from the group's alpha rather than its luminosity.
    pub alpha: bool,
    /// Backdrop color for luminosity masks, in the blending space.
    pub backdrop: Option<GfxColor>,
}

/// One glyph placement.
#[derive(Debug, Clone, PartialEq)]
pub struct CharInfo {
    /// Glyph position in user space, rise applied.
    pub x: f64,
    pub y: f64,
    /// Pen advance in user space.
    pub dx: f64,
    pub dy: f64,
    /// Advance without spacing, in text space scaled by the font size.
    pub ax: f64,
    pub ay: f64,
    /// Glyph origin offset in user space (vertical fonts).
    pub origin_x: f64,
    pub origin_y: f64,
    pub code: u32,
    /// Bytes the code occupied in the string.
    pub len: usize,
    pub unicode: Option<String>,
}

/// Image parameters shared by the image notifications.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    /// `None` for stencil masks.
    pub color_space: Option<Arc<PdfColorSpace>>,
    pub interpolate: bool,
    /// Image stream; data is still encoded.
    pub stream: Arc<PDFStream>,
    pub inline: bool,
}

#[allow(unused_variables)]
pub trait SceneBuilder {
    // ========================================================================
    // Page setup
    // ========================================================================

    fn push_page(&mut self, label: &str, state: &GfxState) {}

    fn set_document_size(&mut self, width: f64, height: f64) {}

    fn set_margins(&mut self, trim: Rect, art: Rect, media: Rect) {}

    fn crop_page(&mut self, crop: Rect) {}

    fn set_metadata(&mut self, key: &str, value: &str) {}

    fn add_color_profile(&mut self, profile: &[u8]) {}

    fn add_optional_group(&mut self, key: &str, label: &str, visible: bool) {}

    // ========================================================================
    // Graphics state
    // ========================================================================

    /// Called after the state was pushed.
    fn save_state(&mut self, state: &GfxState) {}

    /// Called before the state is popped.
    fn restore_state(&mut self, state: &GfxState) {}

    fn before_state_change(&mut self, state: &GfxState) {}

    fn update_style(&mut self, state: &GfxState) {}

    // ========================================================================
    // Painting
    // ========================================================================

    fn add_path(&mut self, state: &GfxState, fill: bool, stroke: bool, even_odd: bool) {}

    /// Axial or radial shading drawn natively; `matrix` maps shading space
    /// to device space.
    fn add_shaded_fill(&mut self, state: &GfxState, shading: &Shading, matrix: Matrix) {}

    /// Patterns for which painting falls back to clipped shading fills.
    fn is_pattern_type_supported(&self, pattern: Option<&Pattern>) -> bool {
        match pattern {
            Some(Pattern::Tiling { .. }) => true,
            Some(Pattern::Shading { shading, .. }) => matches!(shading.shading_type, 2 | 3),
            None => false,
        }
    }

    /// `flattened` is the effective clip after intersecting every level.
    fn set_clip(&mut self, state: &GfxState, rule: FillRule, is_bbox: bool, flattened: &ClipPath) {}

    // ========================================================================
    // Text
    // ========================================================================

    fn begin_text_object(&mut self, state: &GfxState) {}

    fn end_text_object(&mut self, state: &GfxState) {}

    fn update_text_position(&mut self, tx: f64, ty: f64) {}

    fn update_text_matrix(&mut self, state: &GfxState, flip: bool) {}

    fn update_font(&mut self, state: &GfxState, flip: bool) {}

    fn update_text_shift(&mut self, state: &GfxState, shift: f64) {}

    fn begin_string(&mut self, state: &GfxState, len: usize) {}

    fn add_char(&mut self, state: &GfxState, ch: &CharInfo) {}

    fn end_string(&mut self, state: &GfxState) {}

    // ========================================================================
    // Images
    // ========================================================================

    fn add_image(&mut self, state: &GfxState, image: &ImageData, mask_colors: Option<&[i64]>) {}

    fn add_image_mask(&mut self, state: &GfxState, image: &ImageData, invert: bool) {}

    fn add_masked_image(
        &mut self,
        state: &GfxState,
        image: &ImageData,
        mask: &ImageData,
        mask_invert: bool,
    ) {
    }

    fn add_soft_masked_image(&mut self, state: &GfxState, image: &ImageData, mask: &ImageData) {}

    // ========================================================================
    // Groups and layers
    // ========================================================================

    fn start_group(&mut self, state: &GfxState, bbox: Rect, params: &GroupParams) {}

    fn finish_group(&mut self, state: &GfxState, for_soft_mask: bool) {}

    fn set_group_opacity(&mut self, opacity: f64) {}

    fn begin_marked_content(&mut self, tag: Option<&str>, properties: Option<&str>) {}

    fn end_marked_content(&mut self) {}

    fn begin_xobject_layer(&mut self, label: &str) {}
}

// ============================================================================
// RecordingBuilder
// ============================================================================

/// Serializable record of one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BuilderEvent {
    PushPage {
        label: String,
        ctm: Matrix,
    },
    DocumentSize {
        width: f64,
        height: f64,
    },
    Margins {
        trim: Rect,
        art: Rect,
        media: Rect,
    },
    CropPage {
        crop: Rect,
    },
    Metadata {
        key: String,
        value: String,
    },
    ColorProfile {
        len: usize,
    },
    OptionalGroup {
        key: String,
        label: String,
        visible: bool,
    },
    SaveState,
    RestoreState,
    BeforeStateChange,
    UpdateStyle {
        fill_space: String,
        fill: Vec<f64>,
        stroke_space: String,
        stroke: Vec<f64>,
        line_width: f64,
    },
    Path {
        fill: bool,
        stroke: bool,
        even_odd: bool,
        ctm: Matrix,
        segments: Vec<PathSegment>,
        fill_color: Vec<f64>,
        stroke_color: Vec<f64>,
    },
    ShadedFill {
        shading_type: u32,
        matrix: Matrix,
    },
    Clip {
        rule: FillRule,
        is_bbox: bool,
        contours: usize,
    },
    BeginText,
    EndText,
    TextPosition {
        x: f64,
        y: f64,
    },
    TextMatrix {
        matrix: Matrix,
        flip: bool,
    },
    Font {
        name: Option<String>,
        size: f64,
    },
    TextShift {
        shift: f64,
    },
    BeginString {
        len: usize,
    },
    Char {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        code: u32,
        unicode: Option<String>,
    },
    EndString,
    Image {
        width: u32,
        height: u32,
        inline: bool,
        mask_colors: Option<Vec<i64>>,
    },
    ImageMask {
        width: u32,
        height: u32,
        invert: bool,
    },
    MaskedImage {
        width: u32,
        height: u32,
        mask_width: u32,
        mask_height: u32,
        mask_invert: bool,
    },
    SoftMaskedImage {
        width: u32,
        height: u32,
        mask_width: u32,
        mask_height: u32,
    },
    StartGroup {
        bbox: Rect,
        isolated: bool,
        knockout: bool,
        soft_mask: bool,
        alpha: bool,
    },
    FinishGroup {
        soft_mask: bool,
    },
    GroupOpacity {
        opacity: f64,
    },
    BeginMarkedContent {
        tag: Option<String>,
        properties: Option<String>,
    },
    EndMarkedContent,
    BeginXObjectLayer {
        label: String,
    },
}

/// Builder that keeps every notification as a [`BuilderEvent`].
#[derive(Debug, Default, Clone)]
pub struct RecordingBuilder {
    pub events: Vec<BuilderEvent>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<BuilderEvent> {
        self.events
    }

    /// Painted paths, in order.
    pub fn paths(&self) -> impl Iterator<Item = &BuilderEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, BuilderEvent::Path { .. }))
    }

    fn push(&mut self, event: BuilderEvent) {
        tracing::trace!(?event, "builder event");
        self.events.push(event);
    }
}

impl SceneBuilder for RecordingBuilder {
    fn push_page(&mut self, label: &str, state: &GfxState) {
        self.push(BuilderEvent::PushPage {
            label: label.to_string(),
            ctm: state.ctm,
        });
    }

    fn set_document_size(&mut self, width: f64, height: f64) {
        self.push(BuilderEvent::DocumentSize { width, height });
    }

    fn set_margins(&mut self, trim: Rect, art: Rect, media: Rect) {
        self.push(BuilderEvent::Margins { trim, art, media });
    }

    fn crop_page(&mut self, crop: Rect) {
        self.push(BuilderEvent::CropPage { crop });
    }

    fn set_metadata(&mut self, key: &str, value: &str) {
        self.push(BuilderEvent::Metadata {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn add_color_profile(&mut self, profile: &[u8]) {
        self.push(BuilderEvent::ColorProfile { len: profile.len() });
    }

    fn add_optional_group(&mut self, key: &str, label: &str, visible: bool) {
        self.push(BuilderEvent::OptionalGroup {
            key: key.to_string(),
            label: label.to_string(),
            visible,
        });
    }

    fn save_state(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::SaveState);
    }

    fn restore_state(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::RestoreState);
    }

    fn before_state_change(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::BeforeStateChange);
    }

    fn update_style(&mut self, state: &GfxState) {
        self.push(BuilderEvent::UpdateStyle {
            fill_space: state.fill_space.name().to_string(),
            fill: state.fill_color.to_vec(),
            stroke_space: state.stroke_space.name().to_string(),
            stroke: state.stroke_color.to_vec(),
            line_width: state.line_width,
        });
    }

    fn add_path(&mut self, state: &GfxState, fill: bool, stroke: bool, even_odd: bool) {
        self.push(BuilderEvent::Path {
            fill,
            stroke,
            even_odd,
            ctm: state.ctm,
            segments: state.path.segments().to_vec(),
            fill_color: state.fill_color.to_vec(),
            stroke_color: state.stroke_color.to_vec(),
        });
    }

    fn add_shaded_fill(&mut self, _state: &GfxState, shading: &Shading, matrix: Matrix) {
        self.push(BuilderEvent::ShadedFill {
            shading_type: shading.shading_type,
            matrix,
        });
    }

    fn set_clip(&mut self, _state: &GfxState, rule: FillRule, is_bbox: bool, flattened: &ClipPath) {
        self.push(BuilderEvent::Clip {
            rule,
            is_bbox,
            contours: flattened.len(),
        });
    }

    fn begin_text_object(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::BeginText);
    }

    fn end_text_object(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::EndText);
    }

    fn update_text_position(&mut self, tx: f64, ty: f64) {
        self.push(BuilderEvent::TextPosition { x: tx, y: ty });
    }

    fn update_text_matrix(&mut self, state: &GfxState, flip: bool) {
        self.push(BuilderEvent::TextMatrix {
            matrix: state.text_mat,
            flip,
        });
    }

    fn update_font(&mut self, state: &GfxState, _flip: bool) {
        self.push(BuilderEvent::Font {
            name: state.font.as_ref().map(|f| f.name().to_string()),
            size: state.font_size,
        });
    }

    fn update_text_shift(&mut self, _state: &GfxState, shift: f64) {
        self.push(BuilderEvent::TextShift { shift });
    }

    fn begin_string(&mut self, _state: &GfxState, len: usize) {
        self.push(BuilderEvent::BeginString { len });
    }

    fn add_char(&mut self, _state: &GfxState, ch: &CharInfo) {
        self.push(BuilderEvent::Char {
            x: ch.x,
            y: ch.y,
            dx: ch.dx,
            dy: ch.dy,
            code: ch.code,
            unicode: ch.unicode.clone(),
        });
    }

    fn end_string(&mut self, _state: &GfxState) {
        self.push(BuilderEvent::EndString);
    }

    fn add_image(&mut self, _state: &GfxState, image: &ImageData, mask_colors: Option<&[i64]>) {
        self.push(BuilderEvent::Image {
            width: image.width,
            height: image.height,
            inline: image.inline,
            mask_colors: mask_colors.map(<[i64]>::to_vec),
        });
    }

    fn add_image_mask(&mut self, _state: &GfxState, image: &ImageData, invert: bool) {
        self.push(BuilderEvent::ImageMask {
            width: image.width,
            height: image.height,
            invert,
        });
    }

    fn add_masked_image(
        &mut self,
        _state: &GfxState,
        image: &ImageData,
        mask: &ImageData,
        mask_invert: bool,
    ) {
        self.push(BuilderEvent::MaskedImage {
            width: image.width,
            height: image.height,
            mask_width: mask.width,
            mask_height: mask.height,
            mask_invert,
        });
    }

    fn add_soft_masked_image(&mut self, _state: &GfxState, image: &ImageData, mask: &ImageData) {
        self.push(BuilderEvent::SoftMaskedImage {
            width: image.width,
            height: image.height,
            mask_width: mask.width,
            mask_height: mask.height,
        });
    }

    fn start_group(&mut self, _state: &GfxState, bbox: Rect, params: &GroupParams) {
        self.push(BuilderEvent::StartGroup {
            bbox,
            isolated: params.isolated,
            knockout: params.knockout,
            soft_mask: params.soft_mask,
            alpha: params.alpha,
        });
    }

    fn finish_group(&mut self, _state: &GfxState, for_soft_mask: bool) {
        self.push(BuilderEvent::FinishGroup {
            soft_mask: for_soft_mask,
        });
    }

    fn set_group_opacity(&mut self, opacity: f64) {
        self.push(BuilderEvent::GroupOpacity { opacity });
    }

    fn begin_marked_content(&mut self, tag: Option<&str>, properties: Option<&str>) {
        self.push(BuilderEvent::BeginMarkedContent {
            tag: tag.map(str::to_string),
            properties: properties.map(str::to_string),
        });
    }

    fn end_marked_content(&mut self) {
        self.push(BuilderEvent::EndMarkedContent);
    }

    fn begin_xobject_layer(&mut self, label: &str) {
        self.push(BuilderEvent::BeginXObjectLayer {
            label: label.to_string(),
        });
    }
}
