//! Color operators.
//!
//! Handles: G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn
//!
//! - G/g: DeviceGray (stroke/non-stroke)
//! - RG/rg: DeviceRGB (stroke/non-stroke)
//! - K/k: DeviceCMYK (stroke/non-stroke)
//! - CS/cs: Select a color space from resources or by family name
//! - SC/SCN/sc/scn: Set color in current color space; SCN/scn also
//!   select patterns
//!
//! Every change is bracketed by `before_state_change`/`update_style`.

use std::sync::Arc;

use crate::interp::builder::SceneBuilder;
use crate::interp::interpreter::Interpreter;
use crate::model::{GfxColor, PDFObject, Pattern, PdfColorSpace};

/// Which side of the graphics state a color operator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Fill,
    Stroke,
}

impl Side {
    const fn op(self, fill: &'static str, stroke: &'static str) -> &'static str {
        match self {
            Self::Fill => fill,
            Self::Stroke => stroke,
        }
    }
}

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    /// Sets the gray level for stroking operations.
    ///
    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.set_device_color(Side::Stroke, PdfColorSpace::DeviceGray, &[gray]);
    }

    /// Sets the gray level for non-stroking operations.
    ///
    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.set_device_color(Side::Fill, PdfColorSpace::DeviceGray, &[gray]);
    }

    /// Sets the RGB color for stroking operations.
    ///
    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.set_device_color(Side::Stroke, PdfColorSpace::DeviceRgb, &[r, g, b]);
    }

    /// Sets the RGB color for non-stroking operations.
    ///
    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.set_device_color(Side::Fill, PdfColorSpace::DeviceRgb, &[r, g, b]);
    }

    /// Sets the CMYK color for stroking operations.
    ///
    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_device_color(Side::Stroke, PdfColorSpace::DeviceCmyk, &[c, m, y, k]);
    }

    /// Sets the CMYK color for non-stroking operations.
    ///
    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_device_color(Side::Fill, PdfColorSpace::DeviceCmyk, &[c, m, y, k]);
    }

    /// Selects the stroking color space.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, space: &PDFObject) {
        self.set_color_space(Side::Stroke, space);
    }

    /// Selects the non-stroking color space.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, space: &PDFObject) {
        self.set_color_space(Side::Fill, space);
    }

    /// Sets the stroking color in the current space.
    ///
    /// PDF operator: `SC`
    pub fn do_SC(&mut self, args: &[PDFObject]) {
        self.set_color(Side::Stroke, args);
    }

    /// Sets the non-stroking color in the current space.
    ///
    /// PDF operator: `sc`
    pub fn do_sc(&mut self, args: &[PDFObject]) {
        self.set_color(Side::Fill, args);
    }

    /// Sets the stroking color, or pattern in a pattern space.
    ///
    /// PDF operator: `SCN`
    pub fn do_SCN(&mut self, args: &[PDFObject]) {
        self.set_color_n(Side::Stroke, args);
    }

    /// Sets the non-stroking color, or pattern in a pattern space.
    ///
    /// PDF operator: `scn`
    pub fn do_scn(&mut self, args: &[PDFObject]) {
        self.set_color_n(Side::Fill, args);
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    fn space(&self, side: Side) -> &Arc<PdfColorSpace> {
        match side {
            Side::Fill => &self.state.fill_space,
            Side::Stroke => &self.state.stroke_space,
        }
    }

    fn set_color_values(&mut self, side: Side, color: GfxColor) {
        match side {
            Side::Fill => self.state.fill_color = color,
            Side::Stroke => self.state.stroke_color = color,
        }
    }

    fn set_pattern(&mut self, side: Side, pattern: Option<Arc<Pattern>>) {
        match side {
            Side::Fill => self.state.fill_pattern = pattern,
            Side::Stroke => self.state.stroke_pattern = pattern,
        }
    }

    fn set_device_color(&mut self, side: Side, space: PdfColorSpace, values: &[f64]) {
        self.builder.before_state_change(&self.state);
        let space = Arc::new(space);
        match side {
            Side::Fill => self.state.set_fill_space(space),
            Side::Stroke => self.state.set_stroke_space(space),
        }
        self.set_color_values(side, GfxColor::from_slice(values));
        self.builder.update_style(&self.state);
    }

    fn set_color_space(&mut self, side: Side, arg: &PDFObject) {
        self.builder.before_state_change(&self.state);
        let space = self.lookup_color_space(arg);
        self.set_pattern(side, None);
        match space {
            Some(space) => {
                match side {
                    Side::Fill => self.state.set_fill_space(space),
                    Side::Stroke => self.state.set_stroke_space(space),
                }
                self.builder.update_style(&self.state);
            }
            None => {
                let which = side.op("fill", "stroke");
                self.error(format!("Bad color space ({which})"));
            }
        }
    }

    fn set_color(&mut self, side: Side, args: &[PDFObject]) {
        if args.len() != self.space(side).n_comps() {
            let op = side.op("sc", "SC");
            self.error(format!("Incorrect number of arguments in '{op}' command"));
            return;
        }
        self.builder.before_state_change(&self.state);
        self.set_pattern(side, None);
        self.set_color_values(side, numbers(args));
        self.builder.update_style(&self.state);
    }

    fn set_color_n(&mut self, side: Side, args: &[PDFObject]) {
        let op = side.op("scn", "SCN");
        self.builder.before_state_change(&self.state);
        let space = self.space(side).clone();
        if !space.is_pattern() {
            if args.len() != space.n_comps() {
                self.error(format!("Incorrect number of arguments in '{op}' command"));
                return;
            }
            self.set_pattern(side, None);
            self.set_color_values(side, numbers(args));
            self.builder.update_style(&self.state);
            return;
        }

        let Some((last, components)) = args.split_last() else {
            return;
        };
        if !components.is_empty() {
            let fits = space
                .pattern_under()
                .is_some_and(|under| under.n_comps() == components.len());
            if !fits {
                self.error(format!("Incorrect number of arguments in '{op}' command"));
                return;
            }
            self.set_color_values(side, numbers(components));
            self.builder.update_style(&self.state);
        }
        if let Some(pattern) = self.lookup_pattern(last) {
            self.set_pattern(side, Some(pattern));
            self.builder.update_style(&self.state);
        }
    }

    /// Pattern resource named by `obj`.
    pub(crate) fn lookup_pattern(&mut self, obj: &PDFObject) -> Option<Arc<Pattern>> {
        let PDFObject::Name(name) = obj else {
            return None;
        };
        let Some(res) = self.resources.pattern(self.store, name) else {
            self.warning(format!("Unknown pattern '{name}'"));
            return None;
        };
        match Pattern::parse(&res, self.store) {
            Ok(pattern) => Some(Arc::new(pattern)),
            Err(e) => {
                self.error(format!("Bad pattern '{name}': {e}"));
                None
            }
        }
    }
}

/// Numeric operands; anything else reads as zero.
fn numbers(args: &[PDFObject]) -> GfxColor {
    args.iter().map(|a| a.as_num().unwrap_or(0.0)).collect()
}
