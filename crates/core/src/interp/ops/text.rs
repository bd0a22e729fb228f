//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "
//!
//! Text state operators update the graphics state; positioning operators
//! also report the new line start to the builder. Showing operators decode
//! the string through the current font and report one character at a time.

use crate::interp::builder::{CharInfo, SceneBuilder};
use crate::interp::interpreter::Interpreter;
use crate::model::PDFObject;
use crate::utils::{MATRIX_IDENTITY, Matrix};

/// Text space units per glyph space unit in `TJ` adjustments.
const TJ_SCALE: f64 = 0.001;

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    // ========================================================================
    // Text objects
    // ========================================================================

    /// Begins a text object.
    ///
    /// PDF operator: `BT`
    pub fn do_BT(&mut self) {
        self.state.text_mat = MATRIX_IDENTITY;
        self.state.text_move_to(0.0, 0.0);
        self.builder.update_text_position(0.0, 0.0);
        self.font_changed = true;
        self.builder.begin_text_object(&self.state);
    }

    /// Ends a text object.
    ///
    /// PDF operator: `ET`
    pub fn do_ET(&mut self) {
        self.builder.end_text_object(&self.state);
    }

    // ========================================================================
    // Text state
    // ========================================================================

    /// Sets character spacing.
    ///
    /// PDF operator: `Tc`
    pub fn do_Tc(&mut self, space: f64) {
        self.state.char_space = space;
    }

    /// Sets word spacing.
    ///
    /// PDF operator: `Tw`
    pub fn do_Tw(&mut self, space: f64) {
        self.state.word_space = space;
    }

    /// Sets horizontal scaling, given in percent.
    ///
    /// PDF operator: `Tz`
    pub fn do_Tz(&mut self, scale: f64) {
        self.state.horiz_scaling = scale * 0.01;
        self.builder.update_text_matrix(&self.state, !self.sub_page);
        self.font_changed = true;
    }

    /// Sets text leading.
    ///
    /// PDF operator: `TL`
    pub fn do_TL(&mut self, leading: f64) {
        self.state.leading = leading;
    }

    /// Selects a font resource and size.
    ///
    /// An unknown font leaves no font selected, so later text is reported
    /// as an error instead of drawn with the previous font.
    ///
    /// PDF operator: `Tf`
    pub fn do_Tf(&mut self, fontid: &str, fontsize: f64) {
        let font = self.lookup_font(fontid);
        if font.is_none() {
            tracing::debug!(font = fontid, "font not found, text will be skipped");
        }
        self.state.font = font;
        self.state.font_size = fontsize;
        self.font_changed = true;
    }

    /// Sets the text rendering mode.
    ///
    /// PDF operator: `Tr`
    pub fn do_Tr(&mut self, render: i64) {
        self.builder.before_state_change(&self.state);
        self.state.render = render;
        self.builder.update_style(&self.state);
    }

    /// Sets text rise.
    ///
    /// PDF operator: `Ts`
    pub fn do_Ts(&mut self, rise: f64) {
        self.state.rise = rise;
    }

    // ========================================================================
    // Text positioning
    // ========================================================================

    /// Moves to the start of the next line, offset from the current one.
    ///
    /// PDF operator: `Td`
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        let (lx, ly) = self.state.line_pos;
        self.move_line(lx + tx, ly + ty);
    }

    /// Like `Td`, also setting the leading to `-ty`.
    ///
    /// PDF operator: `TD`
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.state.leading = -ty;
        self.do_Td(tx, ty);
    }

    /// Sets the text matrix and line matrix.
    ///
    /// PDF operator: `Tm`
    pub fn do_Tm(&mut self, matrix: Matrix) {
        self.state.text_mat = matrix;
        self.state.text_move_to(0.0, 0.0);
        self.builder.update_text_matrix(&self.state, !self.sub_page);
        self.builder.update_text_position(0.0, 0.0);
        self.font_changed = true;
    }

    /// Moves to the start of the next line.
    ///
    /// PDF operator: `T*`
    pub fn do_T_star(&mut self) {
        let (lx, ly) = self.state.line_pos;
        self.move_line(lx, ly - self.state.leading);
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.state.text_move_to(tx, ty);
        self.builder.update_text_position(tx, ty);
    }

    // ========================================================================
    // Text showing
    // ========================================================================

    /// Shows a string.
    ///
    /// PDF operator: `Tj`
    pub fn do_Tj(&mut self, s: &[u8]) {
        if self.state.font.is_none() {
            self.error("No font in show");
            return;
        }
        self.do_update_font();
        self.do_show_text(s);
    }

    /// Moves to the next line and shows a string.
    ///
    /// PDF operator: `'`
    pub fn do_quote(&mut self, s: &[u8]) {
        if self.state.font.is_none() {
            self.error("No font in move/show");
            return;
        }
        self.do_update_font();
        self.do_T_star();
        self.do_show_text(s);
    }

    /// Sets word and character spacing, moves to the next line and shows a
    /// string.
    ///
    /// PDF operator: `"`
    pub fn do_doublequote(&mut self, aw: f64, ac: f64, s: &[u8]) {
        if self.state.font.is_none() {
            self.error("No font in move/set/show");
            return;
        }
        self.do_update_font();
        self.state.word_space = aw;
        self.state.char_space = ac;
        self.do_T_star();
        self.do_show_text(s);
    }

    /// Shows strings with individual glyph positioning.
    ///
    /// Numbers move the pen back by thousandths of the font size.
    ///
    /// PDF operator: `TJ`
    pub fn do_TJ(&mut self, seq: &PDFObject) {
        let Some(font) = self.state.font.clone() else {
            self.error("No font in show/space");
            return;
        };
        self.do_update_font();
        let vertical = font.wmode() != 0;
        let PDFObject::Array(items) = seq else {
            return;
        };
        for item in items {
            match item {
                PDFObject::Int(_) | PDFObject::Real(_) => {
                    let n = item.as_num().unwrap_or(0.0);
                    let shift = -n * TJ_SCALE * self.state.font_size.abs();
                    if vertical {
                        self.state.text_shift(0.0, shift);
                    } else {
                        self.state.text_shift(shift, 0.0);
                    }
                    self.builder.update_text_shift(&self.state, n);
                }
                PDFObject::String(s) => self.do_show_text(s),
                _ => self.error("Element of show/space array must be number or string"),
            }
        }
    }

    /// Sends the font to the builder if it changed since the last string.
    fn do_update_font(&mut self) {
        if self.font_changed {
            self.builder.update_font(&self.state, !self.sub_page);
            self.font_changed = false;
        }
    }

    /// Decodes `s` and reports each character at the pen position.
    fn do_show_text(&mut self, s: &[u8]) {
        let Some(font) = self.state.font.clone() else {
            return;
        };
        let vertical = font.wmode() != 0;
        self.builder.begin_string(&self.state, s.len());

        let (rise_x, rise_y) = self.state.text_transform_delta(0.0, self.state.rise);
        let size = self.state.font_size;
        let mut rest = s;
        while let Some(ch) = font.next_char(rest) {
            let n = ch.len.clamp(1, rest.len());
            let is_space = n == 1 && rest[0] == b' ';
            let (mut dx, mut dy) = (ch.dx * size, ch.dy * size);
            let (mut ax, ay) = (dx, dy);
            if vertical {
                dy += self.state.char_space;
                if is_space {
                    dy += self.state.word_space;
                }
            } else {
                dx += self.state.char_space;
                if is_space {
                    dx += self.state.word_space;
                }
                dx *= self.state.horiz_scaling;
                ax *= self.state.horiz_scaling;
            }
            let (tdx, tdy) = self.state.text_transform_delta(dx, dy);
            let (origin_x, origin_y) = self
                .state
                .text_transform_delta(ch.origin_x * size, ch.origin_y * size);
            let (x, y) = self.state.cur_pos;

            let info = CharInfo {
                x: x + rise_x,
                y: y + rise_y,
                dx,
                dy,
                ax,
                ay,
                origin_x,
                origin_y,
                code: ch.code,
                len: n,
                unicode: ch.unicode,
            };
            self.builder.add_char(&self.state, &info);
            self.state.shift(tdx, tdy);
            rest = &rest[n..];
        }

        self.builder.end_string(&self.state);
    }
}
