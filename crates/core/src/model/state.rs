//! Graphics and text state.

use std::sync::Arc;

use crate::colors::{Color, Manager};
use crate::model::GfxColor;
use crate::model::colorspace::PdfColorSpace;
use crate::model::font::GfxFont;
use crate::model::path::GfxPath;
use crate::model::shading::Pattern;
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, mult_matrix};

/// Everything `q` saves and `Q` restores, plus the path under construction.
#[derive(Debug, Clone)]
pub struct GfxState {
    /// Current transformation matrix
    pub ctm: Matrix,

    pub fill_space: Arc<PdfColorSpace>,
    pub stroke_space: Arc<PdfColorSpace>,
    pub fill_color: GfxColor,
    pub stroke_color: GfxColor,
    pub fill_pattern: Option<Arc<Pattern>>,
    pub stroke_pattern: Option<Arc<Pattern>>,

    pub line_width: f64,
    pub line_cap: i64,
    pub line_join: i64,
    pub miter_limit: f64,
    /// Dash pattern: (array, phase)
    pub dash: (Vec<f64>, f64),
    pub flatness: f64,
    pub rendering_intent: String,

    pub blend_mode: String,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub fill_overprint: bool,
    pub stroke_overprint: bool,
    pub overprint_mode: i64,
    pub stroke_adjust: bool,

    pub font: Option<Arc<dyn GfxFont>>,
    pub font_size: f64,
    pub char_space: f64,
    pub word_space: f64,
    /// Horizontal scaling as a fraction (`Tz 100` is 1.0)
    pub horiz_scaling: f64,
    pub leading: f64,
    pub rise: f64,
    pub render: i64,
    /// Text matrix (Tm)
    pub text_mat: Matrix,
    /// Start of the current line in text space
    pub line_pos: Point,
    /// Pen position in user space
    pub cur_pos: Point,

    pub path: GfxPath,
}

impl GfxState {
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill_space: Arc::new(PdfColorSpace::DeviceGray),
            stroke_space: Arc::new(PdfColorSpace::DeviceGray),
            fill_color: GfxColor::from_slice(&[0.0]),
            stroke_color: GfxColor::from_slice(&[0.0]),
            fill_pattern: None,
            stroke_pattern: None,
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            dash: (Vec::new(), 0.0),
            flatness: 1.0,
            rendering_intent: "RelativeColorimetric".to_string(),
            blend_mode: "Normal".to_string(),
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            fill_overprint: false,
            stroke_overprint: false,
            overprint_mode: 0,
            stroke_adjust: false,
            font: None,
            font_size: 0.0,
            char_space: 0.0,
            word_space: 0.0,
            horiz_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            render: 0,
            text_mat: MATRIX_IDENTITY,
            line_pos: (0.0, 0.0),
            cur_pos: (0.0, 0.0),
            path: GfxPath::new(),
        }
    }

    /// Concatenates `m` in front of the CTM (`cm`).
    pub fn concat_ctm(&mut self, m: Matrix) {
        self.ctm = mult_matrix(m, self.ctm);
    }

    /// Maps a text-space displacement through the text matrix.
    pub fn text_transform_delta(&self, x: f64, y: f64) -> Point {
        let (a, b, c, d, _, _) = self.text_mat;
        (a * x + c * y, b * x + d * y)
    }

    /// Starts a new line at `(tx, ty)` in text space.
    pub fn text_move_to(&mut self, tx: f64, ty: f64) {
        self.line_pos = (tx, ty);
        let (a, b, c, d, e, f) = self.text_mat;
        self.cur_pos = (a * tx + c * ty + e, b * tx + d * ty + f);
    }

    /// Moves the pen by a text-space displacement.
    pub fn text_shift(&mut self, tx: f64, ty: f64) {
        let (dx, dy) = self.text_transform_delta(tx, ty);
        self.shift(dx, dy);
    }

    /// Moves the pen by an already transformed displacement.
    pub fn shift(&mut self, dx: f64, dy: f64) {
        self.cur_pos.0 += dx;
        self.cur_pos.1 += dy;
    }

    pub fn set_fill_space(&mut self, space: Arc<PdfColorSpace>) {
        self.fill_color = space.default_color();
        self.fill_space = space;
        self.fill_pattern = None;
    }

    pub fn set_stroke_space(&mut self, space: Arc<PdfColorSpace>) {
        self.stroke_color = space.default_color();
        self.stroke_space = space;
        self.stroke_pattern = None;
    }

    /// Fill color mapped into the color engine, `None` for patterns.
    pub fn fill_engine_color(&self, manager: &Manager) -> Option<Color> {
        self.fill_space.to_color(&self.fill_color, manager)
    }

    pub fn stroke_engine_color(&self, manager: &Manager) -> Option<Color> {
        self.stroke_space.to_color(&self.stroke_color, manager)
    }

    /// Line width scaled by the CTM, as device-space stroke half-widths expect.
    pub fn transformed_line_width(&self) -> f64 {
        let (a, b, c, d, _, _) = self.ctm;
        let scale = ((a * a + b * b + c * c + d * d) / 2.0).sqrt();
        (self.line_width * scale).max(f64::EPSILON)
    }
}

impl Default for GfxState {
    fn default() -> Self {
        Self::new(MATRIX_IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_move_applies_matrix() {
        let mut state = GfxState::default();
        state.text_mat = (2.0, 0.0, 0.0, 2.0, 10.0, 20.0);
        state.text_move_to(1.0, 1.0);
        assert_eq!(state.line_pos, (1.0, 1.0));
        assert_eq!(state.cur_pos, (12.0, 22.0));
        state.text_shift(3.0, 0.0);
        assert_eq!(state.cur_pos, (18.0, 22.0));
    }

    #[test]
    fn test_space_change_resets_color() {
        let mut state = GfxState::default();
        state.set_fill_space(Arc::new(PdfColorSpace::DeviceCmyk));
        assert_eq!(state.fill_color.as_slice(), &[0.0, 0.0, 0.0, 1.0]);
        assert!(state.fill_pattern.is_none());
    }
}
