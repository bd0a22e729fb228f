//! XObject, image and marked content operators.
//!
//! Handles: Do, BI/ID/EI, BMC, BDC, EMC, BX, EX
//!
//! XObjects:
//! - Do: Draw a named Form or Image XObject; PostScript XObjects are skipped
//!
//! Inline images arrive from the lexer as one token with their dictionary
//! and raw data; abbreviated keys are accepted wherever the full ones are.
//!
//! Marked content:
//! - BMC/BDC: Begin a sequence; only `BDC` with a named property list is
//!   reported with its tag
//! - EMC: End a sequence
//! - BX/EX: Compatibility sections, where unknown operators are silent

use std::sync::Arc;

use crate::config::GroupBy;
use crate::interp::builder::{GroupParams, ImageData, SceneBuilder};
use crate::interp::clip::FillRule;
use crate::interp::interpreter::Interpreter;
use crate::interp::lexer::InlineImage;
use crate::model::page::decode_text_string;
use crate::model::{ObjectStore, PDFDict, PDFObject, PDFStream, PdfColorSpace};
use crate::utils::{Matrix, Rect};

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    // ========================================================================
    // XObjects
    // ========================================================================

    /// Draws a named XObject.
    ///
    /// A missing resource is skipped silently. An XObject with an optional
    /// content group is wrapped in a layer named after the group.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, name: &str) {
        let Some(obj) = self.resources.xobject(self.store, name) else {
            return;
        };
        let PDFObject::Stream(xobj) = obj else {
            self.error(format!("XObject '{name}' is wrong type"));
            return;
        };

        let store = self.store;
        let mut layered = false;
        if let PDFObject::Dict(oc) = store.lookup(&xobj.attrs, "OC")
            && store.lookup(&oc, "Type").is_name("OCG")
        {
            let label = match store.lookup(&oc, "Name") {
                PDFObject::String(s) => decode_text_string(&s),
                _ => String::new(),
            };
            self.builder.begin_xobject_layer(&label);
            layered = true;
        }

        match store.lookup(&xobj.attrs, "Subtype") {
            PDFObject::Name(subtype) => match subtype.as_str() {
                "Image" => self.do_image(&xobj, false),
                "Form" => self.do_form(&xobj, None),
                "PS" => tracing::debug!(xobject = name, "skipping PostScript XObject"),
                other => self.error(format!("Unknown XObject subtype '{other}'")),
            },
            _ => self.error("XObject subtype is missing or wrong type"),
        }

        if layered {
            self.builder.end_marked_content();
        }
    }

    /// Draws a form XObject, moved by `offset` when given.
    ///
    /// Forms nested deeper than the configured limit are skipped.
    pub(crate) fn do_form(&mut self, form: &PDFStream, offset: Option<(f64, f64)>) {
        if self.form_depth > self.config.max_form_depth {
            tracing::debug!(depth = self.form_depth, "form nesting limit reached");
            return;
        }
        let Some((mut matrix, bbox)) = self.form_geometry(form) else {
            return;
        };
        if let Some((dx, dy)) = offset {
            matrix.4 += dx;
            matrix.5 += dy;
        }

        let store = self.store;
        let resources = match store.lookup(&form.attrs, "Resources") {
            PDFObject::Dict(d) => Some(d),
            _ => None,
        };

        let mut params = GroupParams::default();
        let mut transp_group = false;
        if let PDFObject::Dict(group) = store.lookup(&form.attrs, "Group")
            && store.lookup(&group, "S").is_name("Transparency")
        {
            transp_group = true;
            params.blending_space = match store.lookup(&group, "CS") {
                PDFObject::Null => None,
                cs => PdfColorSpace::parse(&cs, store).ok(),
            };
            params.isolated = store.lookup(&group, "I").as_bool().unwrap_or(false);
            params.knockout = store.lookup(&group, "K").as_bool().unwrap_or(false);
        }

        self.do_form1(form, resources, matrix, bbox, transp_group, params);
    }

    /// Runs a form's content inside a group clipped to its bounding box.
    ///
    /// Transparency and soft mask groups start with a normal blend mode;
    /// the fill opacity moves onto the group and both opacities reset.
    pub(crate) fn do_form1(
        &mut self,
        form: &PDFStream,
        resources: Option<PDFDict>,
        matrix: Matrix,
        bbox: Rect,
        transp_group: bool,
        params: GroupParams,
    ) {
        let soft_mask = params.soft_mask;
        self.form_depth += 1;
        self.resources.push(resources.unwrap_or_default());
        self.builder.start_group(&self.state, bbox, &params);

        self.save_state();
        self.state.path.clear();
        self.state.concat_ctm(matrix);

        let (x0, y0, x1, y1) = bbox;
        let path = &mut self.state.path;
        path.move_to(x0, y0);
        path.line_to(x1, y0);
        path.line_to(x1, y1);
        path.line_to(x0, y1);
        path.close();
        self.clip.set_clip_from_state(&self.state, FillRule::NonZero);
        let flattened = self.clip.flattened();
        self.builder
            .set_clip(&self.state, FillRule::NonZero, true, &flattened);
        self.state.path.clear();

        if soft_mask || transp_group {
            self.state.blend_mode = "Normal".to_string();
            if self.state.fill_opacity != 1.0 {
                self.builder.set_group_opacity(self.state.fill_opacity);
                self.state.fill_opacity = 1.0;
            }
            self.state.stroke_opacity = 1.0;
        }

        let saved_base = self.base_matrix;
        self.base_matrix = self.state.ctm;
        match form.decode() {
            Ok(data) => self.parse_bytes(data),
            Err(e) => self.error(format!("Unreadable form content: {e}")),
        }
        self.base_matrix = saved_base;

        self.restore_state();
        self.resources.pop();
        self.builder.finish_group(&self.state, soft_mask);
        self.form_depth -= 1;
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Draws an inline image.
    ///
    /// PDF operator: `BI` ... `ID` ... `EI`
    pub fn do_inline_image(&mut self, image: InlineImage) {
        let stream = Arc::new(PDFStream::new(image.dict, image.data));
        self.do_image(&stream, true);
    }

    /// Reads image parameters and reports the image, stencil mask or
    /// masked image to the builder.
    pub(crate) fn do_image(&mut self, stream: &Arc<PDFStream>, inline: bool) {
        if self.read_image(stream, inline).is_none() {
            self.error("Bad image parameters");
        }
    }

    fn read_image(&mut self, stream: &Arc<PDFStream>, inline: bool) -> Option<()> {
        let store = self.store;
        let attrs = &stream.attrs;
        let get = |long: &str, short: &str| lookup_either(store, attrs, long, short);

        let width = image_dimension(&get("Width", "W"))?;
        let height = image_dimension(&get("Height", "H"))?;
        let interpolate = get("Interpolate", "I").as_bool().unwrap_or(false);

        let mask = match get("ImageMask", "IM") {
            PDFObject::Null => false,
            obj => obj.as_bool().ok()?,
        };
        let bits = match get("BitsPerComponent", "BPC") {
            PDFObject::Null if mask => 1,
            obj => u32::try_from(obj.as_int().ok()?).ok()?,
        };

        let mut data = ImageData {
            width,
            height,
            bits_per_component: bits,
            color_space: None,
            interpolate,
            stream: stream.clone(),
            inline,
        };

        if mask {
            if bits != 1 {
                return None;
            }
            let invert = first_decode_is_one(&get("Decode", "D"));
            self.builder.add_image_mask(&self.state, &data, invert);
            return Some(());
        }

        let cs = get("ColorSpace", "CS");
        if cs.is_null() {
            return None;
        }
        data.color_space = Some(self.lookup_color_space(&cs)?);

        let smask = store.lookup(attrs, "SMask");
        let color_mask = store.lookup(attrs, "Mask");
        match (smask, color_mask) {
            (PDFObject::Stream(smask), _) if !inline => {
                let mask_data = self.read_soft_mask(&smask)?;
                self.builder
                    .add_soft_masked_image(&self.state, &data, &mask_data);
            }
            (_, PDFObject::Array(items)) => {
                let colors = items
                    .iter()
                    .map(|v| store.resolve(v).as_int().ok())
                    .collect::<Option<Vec<i64>>>()?;
                self.builder.add_image(&self.state, &data, Some(&colors));
            }
            (_, PDFObject::Stream(mask)) if !inline => {
                let (mask_data, invert) = self.read_stencil_mask(&mask)?;
                self.builder
                    .add_masked_image(&self.state, &data, &mask_data, invert);
            }
            _ => self.builder.add_image(&self.state, &data, None),
        }
        Some(())
    }

    /// Soft mask image: needs its own size and bit depth and a DeviceGray
    /// color space.
    fn read_soft_mask(&mut self, smask: &Arc<PDFStream>) -> Option<ImageData> {
        let store = self.store;
        let attrs = &smask.attrs;
        let get = |long: &str, short: &str| lookup_either(store, attrs, long, short);

        let width = image_dimension(&get("Width", "W"))?;
        let height = image_dimension(&get("Height", "H"))?;
        let bits = u32::try_from(get("BitsPerComponent", "BPC").as_int().ok()?).ok()?;
        let space = self.lookup_color_space(&get("ColorSpace", "CS"))?;
        if *space != PdfColorSpace::DeviceGray {
            return None;
        }
        Some(ImageData {
            width,
            height,
            bits_per_component: bits,
            color_space: Some(space),
            interpolate: get("Interpolate", "I").as_bool().unwrap_or(false),
            stream: smask.clone(),
            inline: false,
        })
    }

    /// Explicit stencil mask; must be an image mask. Returns the data and
    /// whether its decode array inverts it.
    fn read_stencil_mask(&mut self, mask: &Arc<PDFStream>) -> Option<(ImageData, bool)> {
        let store = self.store;
        let attrs = &mask.attrs;
        let get = |long: &str, short: &str| lookup_either(store, attrs, long, short);

        let width = image_dimension(&get("Width", "W"))?;
        let height = image_dimension(&get("Height", "H"))?;
        if !get("ImageMask", "IM").as_bool().ok()? {
            return None;
        }
        let invert = first_decode_is_one(&get("Decode", "D"));
        let data = ImageData {
            width,
            height,
            bits_per_component: 1,
            color_space: None,
            interpolate: get("Interpolate", "I").as_bool().unwrap_or(false),
            stream: mask.clone(),
            inline: false,
        };
        Some((data, invert))
    }

    // ========================================================================
    // Marked content
    // ========================================================================

    /// Marked content is not reported inside forms when grouping by
    /// XObject.
    fn ignore_marked_content(&self) -> bool {
        self.config.group_by == GroupBy::XObject && self.form_depth != 0
    }

    /// Begins a marked content sequence.
    ///
    /// PDF operators: `BMC`, `BDC`
    pub fn do_BDC(&mut self, args: &[PDFObject]) {
        if self.ignore_marked_content() {
            return;
        }
        match args {
            [PDFObject::Name(tag), PDFObject::Name(props)] => {
                self.builder
                    .begin_marked_content(Some(tag.as_str()), Some(props.as_str()));
            }
            _ => self.builder.begin_marked_content(None, None),
        }
    }

    /// Ends a marked content sequence.
    ///
    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) {
        if self.ignore_marked_content() {
            return;
        }
        self.builder.end_marked_content();
    }

    /// Begins a compatibility section.
    ///
    /// PDF operator: `BX`
    pub fn do_BX(&mut self) {
        self.ignore_undef += 1;
    }

    /// Ends a compatibility section.
    ///
    /// PDF operator: `EX`
    pub fn do_EX(&mut self) {
        self.ignore_undef = self.ignore_undef.saturating_sub(1);
    }
}

/// Looks up `long`, falling back to its inline image abbreviation.
fn lookup_either(store: &dyn ObjectStore, dict: &PDFDict, long: &str, short: &str) -> PDFObject {
    match store.lookup(dict, long) {
        PDFObject::Null => store.lookup(dict, short),
        obj => obj,
    }
}

/// Positive image width or height, given as an integer or a real.
fn image_dimension(obj: &PDFObject) -> Option<u32> {
    let v = match obj {
        PDFObject::Int(i) => *i as f64,
        PDFObject::Real(r) => *r,
        _ => return None,
    };
    if v < 1.0 || v > f64::from(u32::MAX) {
        return None;
    }
    Some(v as u32)
}

/// A decode array starting with 1 inverts a one-bit mask.
fn first_decode_is_one(obj: &PDFObject) -> bool {
    match obj {
        PDFObject::Array(items) => items
            .first()
            .and_then(|v| v.as_num().ok())
            .is_some_and(|v| v == 1.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_dimension() {
        assert_eq!(image_dimension(&PDFObject::Int(16)), Some(16));
        assert_eq!(image_dimension(&PDFObject::Real(8.0)), Some(8));
        assert_eq!(image_dimension(&PDFObject::Int(0)), None);
        assert_eq!(image_dimension(&PDFObject::name("W")), None);
    }

    #[test]
    fn test_decode_inverts_mask() {
        let inverted = PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(0)]);
        let normal = PDFObject::Array(vec![PDFObject::Int(0), PDFObject::Int(1)]);
        assert!(first_decode_is_one(&inverted));
        assert!(!first_decode_is_one(&normal));
        assert!(!first_decode_is_one(&PDFObject::Null));
    }
}
