//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! These operators manage the graphics state stack and transformation matrix.
//! - q/Q: Push/pop graphics state together with the clip history
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling, bracketed by style notifications
//! - ri, i: Rendering intent and flatness
//! - gs: Parameters from an ExtGState dictionary, soft masks included

use crate::interp::builder::{GroupParams, SceneBuilder};
use crate::interp::interpreter::Interpreter;
use crate::model::{GfxColor, PDFDict, PDFObject, PDFStream, PdfColorSpace, PdfFunction};
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect};

/// Blend modes accepted in `BM`.
const BLEND_MODES: &[&str] = &[
    "Normal",
    "Compatible",
    "Multiply",
    "Screen",
    "Overlay",
    "Darken",
    "Lighten",
    "ColorDodge",
    "ColorBurn",
    "HardLight",
    "SoftLight",
    "Difference",
    "Exclusion",
    "Hue",
    "Saturation",
    "Color",
    "Luminosity",
];

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.save_state();
    }

    /// Restores the graphics state from the stack.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        self.restore_state();
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) {
        self.state.concat_ctm(matrix);
        self.font_changed = true;
    }

    /// Sets the line width in the graphics state.
    ///
    /// PDF operator: `w`
    pub fn do_w(&mut self, linewidth: f64) {
        self.builder.before_state_change(&self.state);
        self.state.line_width = linewidth;
        self.builder.update_style(&self.state);
    }

    /// Sets the line cap style in the graphics state.
    ///
    /// PDF operator: `J`
    pub fn do_J(&mut self, linecap: i64) {
        self.builder.before_state_change(&self.state);
        self.state.line_cap = linecap;
        self.builder.update_style(&self.state);
    }

    /// Sets the line join style in the graphics state.
    ///
    /// PDF operator: `j`
    pub fn do_j(&mut self, linejoin: i64) {
        self.builder.before_state_change(&self.state);
        self.state.line_join = linejoin;
        self.builder.update_style(&self.state);
    }

    /// Sets the miter limit in the graphics state.
    ///
    /// PDF operator: `M`
    pub fn do_M(&mut self, miterlimit: f64) {
        self.builder.before_state_change(&self.state);
        self.state.miter_limit = miterlimit;
        self.builder.update_style(&self.state);
    }

    /// Sets the line dash pattern in the graphics state.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, dash_array: &PDFObject, phase: f64) {
        self.builder.before_state_change(&self.state);
        let dashes = match dash_array {
            PDFObject::Array(items) => items.iter().filter_map(|v| v.as_num().ok()).collect(),
            _ => Vec::new(),
        };
        self.state.dash = (dashes, phase);
        self.builder.update_style(&self.state);
    }

    /// Rendering intents have no effect on the output.
    ///
    /// PDF operator: `ri`
    pub fn do_ri(&mut self) {}

    /// Sets the flatness tolerance, truncated to an integer.
    ///
    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: f64) {
        self.state.flatness = flatness.trunc();
    }

    /// Applies an ExtGState resource.
    ///
    /// Transfer functions are ignored, apart from validating the one of a
    /// soft mask.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &str) {
        let Some(obj) = self.resources.ext_gstate(self.store, name) else {
            return;
        };
        let PDFObject::Dict(gs) = obj else {
            self.error(format!("ExtGState '{name}' is wrong type"));
            return;
        };
        let store = self.store;
        let get = |key: &str| store.lookup(&gs, key);

        match get("BM") {
            PDFObject::Null => {}
            bm => match blend_mode(&bm) {
                Some(mode) => self.state.blend_mode = mode.to_string(),
                None => self.error("Invalid blend mode in ExtGState"),
            },
        }
        if let Ok(ca) = get("ca").as_num() {
            self.state.fill_opacity = ca;
        }
        if let Ok(ca) = get("CA").as_num() {
            self.state.stroke_opacity = ca;
        }

        let fill_op = get("op").as_bool().ok();
        if let Some(op) = fill_op {
            self.state.fill_overprint = op;
        }
        if let Ok(op) = get("OP").as_bool() {
            self.state.stroke_overprint = op;
            if fill_op.is_none() {
                self.state.fill_overprint = op;
            }
        }
        if let Ok(sa) = get("SA").as_bool() {
            self.state.stroke_adjust = sa;
        }
        if let Ok(lw) = get("LW").as_num() {
            self.state.line_width = lw;
        }

        match get("SMask") {
            PDFObject::Null => {}
            smask if smask.is_name("None") => {}
            PDFObject::Dict(smask) => self.apply_soft_mask_dict(&smask),
            _ => self.error("Invalid soft mask in ExtGState"),
        }
    }

    fn apply_soft_mask_dict(&mut self, smask: &PDFDict) {
        let store = self.store;
        let alpha = store.lookup(smask, "S").is_name("Alpha");

        let tr = store.lookup(smask, "TR");
        if !tr.is_null() && !tr.is_name("Identity") {
            let valid = PdfFunction::parse(&tr, store)
                .is_ok_and(|f| f.input_size() == Some(1) && f.output_size() == Some(1));
            if !valid {
                self.error("Invalid transfer function in soft mask in ExtGState");
            }
        }

        let backdrop: Option<GfxColor> = match store.lookup(smask, "BC") {
            PDFObject::Array(items) => Some(
                items
                    .iter()
                    .map(|v| store.resolve(v).as_num().unwrap_or(0.0))
                    .collect(),
            ),
            _ => None,
        };

        let PDFObject::Stream(group_form) = store.lookup(smask, "G") else {
            self.error("Invalid soft mask in ExtGState - missing group");
            return;
        };
        let PDFObject::Dict(group) = store.lookup(&group_form.attrs, "Group") else {
            self.error("Invalid soft mask in ExtGState - missing group");
            return;
        };
        let blending_space = match store.lookup(&group, "CS") {
            PDFObject::Null => None,
            cs => PdfColorSpace::parse(&cs, store).ok(),
        };
        let backdrop = backdrop.or_else(|| match &blending_space {
            Some(cs) => Some(cs.default_color()),
            None => Some(GfxColor::from_slice(&[0.0])),
        });
        let params = GroupParams {
            isolated: store.lookup(&group, "I").as_bool().unwrap_or(false),
            knockout: store.lookup(&group, "K").as_bool().unwrap_or(false),
            blending_space,
            soft_mask: true,
            alpha,
            backdrop,
        };
        self.do_soft_mask(&group_form, params);
    }

    /// Draws a soft mask group form.
    pub(crate) fn do_soft_mask(&mut self, form: &PDFStream, params: GroupParams) {
        if self.form_depth > self.config.max_form_depth {
            return;
        }
        let Some((matrix, bbox)) = self.form_geometry(form) else {
            return;
        };
        let resources = match self.store.lookup(&form.attrs, "Resources") {
            PDFObject::Dict(d) => Some(d),
            _ => None,
        };
        self.do_form1(form, resources, matrix, bbox, true, params);
    }

    /// Validates `FormType` and reads `BBox` and `Matrix`.
    pub(crate) fn form_geometry(&mut self, form: &PDFStream) -> Option<(Matrix, Rect)> {
        let store = self.store;
        let form_type = store.lookup(&form.attrs, "FormType");
        if !(form_type.is_null() || form_type.as_int().is_ok_and(|t| t == 1)) {
            self.error("Unknown form type");
        }
        let bbox = match store.lookup(&form.attrs, "BBox") {
            PDFObject::Array(items) if items.len() >= 4 => {
                let v: Vec<f64> = items
                    .iter()
                    .take(4)
                    .map(|i| store.resolve(i).as_num().unwrap_or(0.0))
                    .collect();
                (v[0], v[1], v[2], v[3])
            }
            _ => {
                self.error("Bad form bounding box");
                return None;
            }
        };
        let matrix = match store.lookup(&form.attrs, "Matrix").as_num_array() {
            Ok(m) if m.len() >= 6 => (m[0], m[1], m[2], m[3], m[4], m[5]),
            _ => MATRIX_IDENTITY,
        };
        Some((matrix, bbox))
    }
}

fn blend_mode(obj: &PDFObject) -> Option<&str> {
    match obj {
        PDFObject::Name(name) => BLEND_MODES.iter().copied().find(|m| m == name),
        // An array lists alternatives; the first known one wins.
        PDFObject::Array(items) => items.iter().find_map(blend_mode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_mode_names() {
        assert_eq!(blend_mode(&PDFObject::name("Multiply")), Some("Multiply"));
        assert_eq!(blend_mode(&PDFObject::name("Bogus")), None);
        let alts = PDFObject::Array(vec![PDFObject::name("Bogus"), PDFObject::name("Screen")]);
        assert_eq!(blend_mode(&alts), Some("Screen"));
    }
}
