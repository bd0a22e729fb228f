//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Construction operators extend the path in the graphics state; painting
//! operators hand it to the builder and end it. `W`/`W*` only record the
//! clip, which is applied when the path ends, after painting.
//!
//! Paths painted with a pattern the builder cannot draw fall back to
//! clipping to the path and subdividing the pattern's shading.

use std::sync::Arc;

use crate::interp::builder::SceneBuilder;
use crate::interp::clip::FillRule;
use crate::interp::interpreter::Interpreter;
use crate::model::Pattern;
use crate::utils::{invert_matrix, mult_matrix};

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    // ========================================================================
    // Path construction
    // ========================================================================

    /// Begins a new subpath.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        self.state.path.move_to(x, y);
    }

    /// Appends a straight line segment.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        if !self.state.path.is_cur_pt() {
            self.error("No current point in lineto");
            return;
        }
        self.state.path.line_to(x, y);
    }

    /// Appends a cubic Bezier curve.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if !self.state.path.is_cur_pt() {
            self.error("No current point in curveto");
            return;
        }
        self.state.path.curve_to(x1, y1, x2, y2, x3, y3);
    }

    /// Appends a curve whose first control point is the current point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let Some((x1, y1)) = self.state.path.current_point() else {
            self.error("No current point in curveto1");
            return;
        };
        self.state.path.curve_to(x1, y1, x2, y2, x3, y3);
    }

    /// Appends a curve whose second control point is its end point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        if !self.state.path.is_cur_pt() {
            self.error("No current point in curveto2");
            return;
        }
        self.state.path.curve_to(x1, y1, x3, y3, x3, y3);
    }

    /// Closes the current subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        if !self.state.path.is_cur_pt() {
            self.error("No current point in closepath");
            return;
        }
        self.state.path.close();
    }

    /// Appends a closed rectangle.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let path = &mut self.state.path;
        path.move_to(x, y);
        path.line_to(x + w, y);
        path.line_to(x + w, y + h);
        path.line_to(x, y + h);
        path.close();
    }

    // ========================================================================
    // Path painting
    // ========================================================================

    /// Strokes the path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        if self.state.path.is_path() {
            if self.stroke_needs_fallback() {
                self.do_pattern_stroke_fallback();
            } else {
                self.builder.add_path(&self.state, false, true, false);
            }
        }
        self.do_end_path();
    }

    /// Closes and strokes the path.
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        self.state.path.close();
        self.do_S();
    }

    /// Fills the path with the nonzero winding rule.
    ///
    /// PDF operator: `f` (and the obsolete `F`)
    pub fn do_f(&mut self) {
        self.fill(false);
    }

    /// Fills the path with the even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) {
        self.fill(true);
    }

    /// Fills and strokes the path.
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        if self.state.path.is_path() {
            self.do_fill_and_stroke(false);
        } else {
            self.builder.add_path(&self.state, true, true, false);
        }
        self.do_end_path();
    }

    /// Fills with the even-odd rule and strokes the path.
    ///
    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        if self.state.path.is_path() {
            self.do_fill_and_stroke(true);
        }
        self.do_end_path();
    }

    /// Closes, fills and strokes the path.
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.close_fill_stroke(false);
    }

    /// Closes, fills with the even-odd rule and strokes the path.
    ///
    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) {
        self.close_fill_stroke(true);
    }

    /// Ends the path without painting it.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.do_end_path();
    }

    // ========================================================================
    // Clipping
    // ========================================================================

    /// Marks the path as a nonzero clip, applied when the path ends.
    ///
    /// PDF operator: `W`
    pub fn do_W(&mut self) {
        self.pending_clip = Some(FillRule::NonZero);
    }

    /// Marks the path as an even-odd clip, applied when the path ends.
    ///
    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) {
        self.pending_clip = Some(FillRule::EvenOdd);
    }

    /// Applies a pending clip and clears the path.
    pub(crate) fn do_end_path(&mut self) {
        if self.state.path.is_cur_pt()
            && let Some(rule) = self.pending_clip.take()
        {
            self.clip.set_clip_from_state(&self.state, rule);
            let flattened = self.clip.flattened();
            self.builder.set_clip(&self.state, rule, false, &flattened);
        }
        self.state.path.clear();
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fill(&mut self, even_odd: bool) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        if self.state.path.is_path() {
            if self.fill_needs_fallback() {
                self.do_pattern_fill_fallback(even_odd);
            } else {
                self.builder.add_path(&self.state, true, false, even_odd);
            }
        }
        self.do_end_path();
    }

    fn close_fill_stroke(&mut self, even_odd: bool) {
        if !self.state.path.is_cur_pt() {
            return;
        }
        if self.state.path.is_path() {
            self.state.path.close();
            self.do_fill_and_stroke(even_odd);
        }
        self.do_end_path();
    }

    fn fill_needs_fallback(&self) -> bool {
        self.state.fill_space.is_pattern()
            && !self
                .builder
                .is_pattern_type_supported(self.state.fill_pattern.as_deref())
    }

    fn stroke_needs_fallback(&self) -> bool {
        self.state.stroke_space.is_pattern()
            && !self
                .builder
                .is_pattern_type_supported(self.state.stroke_pattern.as_deref())
    }

    fn do_fill_and_stroke(&mut self, even_odd: bool) {
        if self.fill_needs_fallback() || self.stroke_needs_fallback() {
            self.do_pattern_fill_fallback(even_odd);
            self.do_pattern_stroke_fallback();
        } else {
            self.builder.add_path(&self.state, true, true, even_odd);
        }
    }

    fn do_pattern_fill_fallback(&mut self, even_odd: bool) {
        let Some(pattern) = self.state.fill_pattern.clone() else {
            return;
        };
        if let Pattern::Shading { .. } = *pattern {
            self.do_shading_pattern_fallback(&pattern, false, even_odd);
        }
    }

    fn do_pattern_stroke_fallback(&mut self) {
        let Some(pattern) = self.state.stroke_pattern.clone() else {
            return;
        };
        if let Pattern::Shading { .. } = *pattern {
            self.do_shading_pattern_fallback(&pattern, true, false);
        }
    }

    /// Clips to the path, or its stroke outline, and subdivides the
    /// pattern's shading in pattern space.
    ///
    /// The clip is kept in the history but not announced to the builder.
    fn do_shading_pattern_fallback(&mut self, pattern: &Pattern, stroke: bool, even_odd: bool) {
        let Pattern::Shading { shading, matrix, .. } = pattern else {
            return;
        };
        let saved_path = self.state.path.clone();
        self.save_state();

        if stroke {
            self.clip.set_stroke_clip_from_state(&self.state);
        } else {
            let rule = if even_odd {
                FillRule::EvenOdd
            } else {
                FillRule::NonZero
            };
            self.clip.set_clip_from_state(&self.state, rule);
        }

        self.state
            .set_fill_space(Arc::new(shading.color_space.clone()));
        if let Some(background) = &shading.background {
            self.state.fill_color = background.clone();
            self.builder.add_path(&self.state, true, false, false);
        }
        self.state.path.clear();

        // Pattern space to the current user space.
        let to_base = mult_matrix(*matrix, self.base_matrix);
        match invert_matrix(self.state.ctm) {
            Some(inverse) => self.state.concat_ctm(mult_matrix(to_base, inverse)),
            None => self.warning("Singular transform in pattern fill"),
        }

        self.fill_shading(shading);

        self.restore_state();
        self.state.path = saved_path;
    }
}
