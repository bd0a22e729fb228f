//! PDF content stream interpreter.
//!
//! `Interpreter` pulls tokens from a [`ContentParser`], collects operands,
//! and checks each operator against the static table before running its
//! handler. Handlers are grouped by category under `ops/`; this file holds
//! the driver loop, the graphics state stack, diagnostics and page setup.
//!
//! Problems in the content never abort a page: they are logged through
//! `tracing`, counted in [`Diagnostics`], and the offending operator is
//! skipped.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use rustc_hash::FxHashMap;

use crate::config::{GroupBy, InterpreterConfig};
use crate::error::{PdfError, Result};
use crate::interp::builder::SceneBuilder;
use crate::interp::clip::{ClipHistory, FillRule};
use crate::interp::lexer::{ContentParser, ContentToken};
use crate::interp::optable::{Op, find_op};
use crate::interp::resources::ResourceStack;
use crate::model::page::decode_text_string;
use crate::model::{
    GfxFont, GfxState, ObjectStore, PDFDict, PDFObject, PageInfo, PdfColorSpace, load_font,
};
use crate::utils::{Matrix, Rect};

/// Operators remembered for [`Interpreter::previous_operator`].
const MAX_OPERATOR_HISTORY: usize = 16;

/// Resolution of page output, in dots per inch.
const PAGE_DPI: f64 = 96.0;

/// Counts of reported problems, with their messages in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub errors: usize,
    pub warnings: usize,
    pub messages: Vec<String>,
}

impl Diagnostics {
    /// True if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

pub struct Interpreter<'a, B: SceneBuilder> {
    pub(crate) builder: &'a mut B,
    pub(crate) store: &'a dyn ObjectStore,
    pub(crate) config: InterpreterConfig,
    pub(crate) state: GfxState,
    state_stack: Vec<GfxState>,
    pub(crate) clip: ClipHistory,
    pub(crate) resources: ResourceStack,
    diagnostics: Diagnostics,
    history: VecDeque<&'static str>,
    /// Depth of `BX`/`EX` sections; unknown operators are silent inside.
    pub(crate) ignore_undef: u32,
    pub(crate) form_depth: u32,
    /// CTM at the start of the page or of the innermost form.
    pub(crate) base_matrix: Matrix,
    /// Clip recorded by `W`/`W*`, applied when the path ends.
    pub(crate) pending_clip: Option<FillRule>,
    color_space_cache: FxHashMap<String, Arc<PdfColorSpace>>,
    font_cache: FxHashMap<String, Arc<dyn GfxFont>>,
    pub(crate) font_changed: bool,
    pub(crate) sub_page: bool,
    pos: usize,
    page_size: (f64, f64),
}

impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    fn with_state(
        builder: &'a mut B,
        store: &'a dyn ObjectStore,
        resources: PDFDict,
        state: GfxState,
        config: InterpreterConfig,
        sub_page: bool,
    ) -> Self {
        let base_matrix = state.ctm;
        Self {
            builder,
            store,
            config,
            state,
            state_stack: Vec::new(),
            clip: ClipHistory::new(),
            resources: ResourceStack::new(resources),
            diagnostics: Diagnostics::default(),
            history: VecDeque::with_capacity(MAX_OPERATOR_HISTORY + 1),
            ignore_undef: 0,
            form_depth: 0,
            base_matrix,
            pending_clip: None,
            color_space_cache: FxHashMap::default(),
            font_cache: FxHashMap::default(),
            font_changed: false,
            sub_page,
            pos: 0,
            page_size: (0.0, 0.0),
        }
    }

    /// Interpreter for a whole page, rendered at 96 dpi with the page's
    /// rotation. Raises the page setup notifications on `builder`.
    pub fn new_page(
        builder: &'a mut B,
        store: &'a dyn ObjectStore,
        page: &PageInfo,
        config: InterpreterConfig,
    ) -> Self {
        let (ctm, width, height) = page_ctm(PAGE_DPI, page.crop_box, page.rotate, true);
        let mut interp = Self::with_state(
            builder,
            store,
            page.resources.clone(),
            GfxState::new(ctm),
            config,
            false,
        );
        interp.page_size = (width, height);
        interp.load_optional_content_layers(&page.resources, 0);
        interp.load_color_profile();

        interp.builder.push_page(&page.label, &interp.state);
        interp.builder.set_document_size(width, height);

        let crop = page.crop_box;
        let sx = scale_factor(width, crop.2 - crop.0);
        let sy = scale_factor(height, crop.3 - crop.1);
        let scale = |r: Rect| (r.0 * sx, r.1 * sy, r.2 * sx, r.3 * sy);
        interp
            .builder
            .set_margins(scale(page.trim_box), scale(page.art_box), scale(page.media_box));
        if let Some(clip_to) = page.clip_to
            && clip_to != crop
        {
            interp.builder.crop_page(scale(clip_to));
        }

        for (key, entry) in [
            ("title", "Title"),
            ("description", "Subject"),
            ("creator", "Author"),
            ("subject", "Keywords"),
            ("date", "CreationDate"),
        ] {
            interp.builder.set_metadata(key, &page.info_string(entry));
        }

        interp.form_depth = 0;
        interp.push_operator("startPage");
        interp
    }

    /// Interpreter for a standalone content stream over `bbox` at 72 dpi.
    pub fn new_sub_page(
        builder: &'a mut B,
        store: &'a dyn ObjectStore,
        resources: PDFDict,
        bbox: Rect,
        config: InterpreterConfig,
    ) -> Self {
        let (ctm, width, height) = page_ctm(72.0, bbox, 0, false);
        let mut interp =
            Self::with_state(builder, store, resources, GfxState::new(ctm), config, true);
        interp.page_size = (width, height);
        interp
    }

    /// Sub-page interpreter with an identity CTM and default settings.
    pub fn new(builder: &'a mut B, store: &'a dyn ObjectStore, resources: PDFDict) -> Self {
        Self::new_sub_page(
            builder,
            store,
            resources,
            (0.0, 0.0, 612.0, 792.0),
            InterpreterConfig::default(),
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &GfxState {
        &self.state
    }

    pub fn clip_history(&self) -> &ClipHistory {
        &self.clip
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Page size in output units.
    pub fn page_size(&self) -> (f64, f64) {
        self.page_size
    }

    /// Number of saved graphics states.
    pub fn save_depth(&self) -> usize {
        self.state_stack.len()
    }

    /// Sets the shading subdivision thresholds.
    ///
    /// The parameterized Gouraud threshold follows `color_delta`, scaled by
    /// each shading's parameter domain.
    pub fn set_approximation_precision(&mut self, color_delta: f64, max_depth: u32) {
        self.config.color_delta = color_delta;
        self.config.max_depth = max_depth;
    }

    /// Restores every open save and returns the diagnostics.
    pub fn finish(mut self) -> Diagnostics {
        while !self.state_stack.is_empty() {
            self.restore_state();
        }
        self.diagnostics
    }

    // ========================================================================
    // Diagnostics and operator history
    // ========================================================================

    pub(crate) fn error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::error!(pos = self.pos, "{msg}");
        self.diagnostics.errors += 1;
        self.diagnostics.messages.push(msg);
    }

    pub(crate) fn warning(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!(pos = self.pos, "{msg}");
        self.diagnostics.warnings += 1;
        self.diagnostics.messages.push(msg);
    }

    pub(crate) fn push_operator(&mut self, name: &'static str) {
        self.history.push_front(name);
        self.history.truncate(MAX_OPERATOR_HISTORY);
    }

    /// Operator executed `look_back` steps before the latest one.
    ///
    /// `0` always yields an empty name.
    pub fn previous_operator(&self, look_back: usize) -> &'static str {
        if look_back == 0 {
            return "";
        }
        self.history.get(look_back).copied().unwrap_or("")
    }

    /// Latest executed operator.
    pub fn last_operator(&self) -> &'static str {
        self.history.front().copied().unwrap_or("")
    }

    // ========================================================================
    // Driver loop
    // ========================================================================

    /// Runs page contents: a stream or an array of streams.
    pub fn parse(&mut self, contents: &PDFObject) -> Result<()> {
        let contents = self.store.resolve(contents);
        let streams = match &contents {
            PDFObject::Stream(s) => vec![s.clone()],
            PDFObject::Array(items) => {
                let mut streams = Vec::with_capacity(items.len());
                for item in items {
                    match self.store.resolve(item) {
                        PDFObject::Stream(s) => streams.push(s),
                        _ => {
                            self.error("Weird page contents");
                            return Err(PdfError::BadContent("Weird page contents".into()));
                        }
                    }
                }
                streams
            }
            _ => {
                self.error("Weird page contents");
                return Err(PdfError::BadContent("Weird page contents".into()));
            }
        };
        let mut segments = Vec::with_capacity(streams.len());
        for stream in &streams {
            match stream.decode() {
                Ok(data) => segments.push(data),
                Err(e) => self.error(format!("Unreadable content stream: {e}")),
            }
        }
        self.go(ContentParser::new(segments));
        Ok(())
    }

    /// Runs raw, already decoded content.
    pub fn parse_bytes(&mut self, data: impl Into<Bytes>) {
        self.go(ContentParser::from_bytes(data));
    }

    pub(crate) fn go(&mut self, mut parser: ContentParser) {
        let mut args: Vec<PDFObject> = Vec::new();
        while let Some(token) = parser.next_token() {
            self.pos = parser.pos();
            match token {
                ContentToken::Operand(obj) => {
                    if args.len() < self.config.max_args {
                        args.push(obj);
                    } else {
                        self.error("Too many args in content stream");
                    }
                }
                ContentToken::Operator(name) => {
                    self.exec_op(&name, &mut args);
                    args.clear();
                }
                ContentToken::InlineImage(image) => {
                    if self.check_op("BI", &mut args).is_some() {
                        self.do_inline_image(image);
                    }
                    args.clear();
                }
                ContentToken::BadInlineImage(msg) => {
                    self.error(msg);
                    args.clear();
                }
            }
        }
        if !args.is_empty() {
            self.error("Leftover args in content stream");
        }
    }

    /// Checks and runs one operator.
    pub(crate) fn exec_op(&mut self, name: &str, args: &mut Vec<PDFObject>) {
        if let Some(op) = self.check_op(name, args) {
            self.dispatch(op, args);
        }
    }

    /// Resolves `name` and validates the operands.
    ///
    /// Fixed-arity operators keep only their trailing operands. On success
    /// the operator is pushed onto the history.
    fn check_op(&mut self, name: &str, args: &mut Vec<PDFObject>) -> Option<Op> {
        let Some(spec) = find_op(name) else {
            if self.ignore_undef == 0 {
                self.warning(format!("Unknown operator '{name}'"));
            }
            return None;
        };
        let n = args.len();
        if spec.num_args >= 0 {
            let want = spec.num_args as usize;
            if n < want {
                self.error(format!("Too few ({n}) args to '{name}' operator"));
                return None;
            }
            if n > want {
                args.drain(..n - want);
            }
        } else if n > spec.num_args.unsigned_abs() as usize {
            self.error(format!("Too many ({n}) args to '{name}' operator"));
            return None;
        }
        let bad = args
            .iter()
            .zip(spec.tchk)
            .position(|(arg, tchk)| !tchk.check(arg));
        if let Some(i) = bad {
            let got = args[i].type_name();
            self.error(format!("Arg #{i} to '{name}' operator is wrong type ({got})"));
            return None;
        }
        self.push_operator(spec.name);
        Some(spec.op)
    }

    fn dispatch(&mut self, op: Op, args: &[PDFObject]) {
        match op {
            // Graphics state
            Op::Save => self.do_q(),
            Op::Restore => self.do_Q(),
            Op::Concat => self.do_cm(matrix_arg(args)),
            Op::SetLineWidth => self.do_w(num(args, 0)),
            Op::SetLineCap => self.do_J(int(args, 0)),
            Op::SetLineJoin => self.do_j(int(args, 0)),
            Op::SetMiterLimit => self.do_M(num(args, 0)),
            Op::SetDash => self.do_d(&args[0], num(args, 1)),
            Op::SetRenderingIntent => self.do_ri(),
            Op::SetFlat => self.do_i(num(args, 0)),
            Op::SetExtGState => self.do_gs(name(args, 0)),

            // Color
            Op::SetFillGray => self.do_g(num(args, 0)),
            Op::SetStrokeGray => self.do_G(num(args, 0)),
            Op::SetFillRgbColor => self.do_rg(num(args, 0), num(args, 1), num(args, 2)),
            Op::SetStrokeRgbColor => self.do_RG(num(args, 0), num(args, 1), num(args, 2)),
            Op::SetFillCmykColor => {
                self.do_k(num(args, 0), num(args, 1), num(args, 2), num(args, 3));
            }
            Op::SetStrokeCmykColor => {
                self.do_K(num(args, 0), num(args, 1), num(args, 2), num(args, 3));
            }
            Op::SetFillColorSpace => self.do_cs(&args[0]),
            Op::SetStrokeColorSpace => self.do_CS(&args[0]),
            Op::SetFillColor => self.do_sc(args),
            Op::SetStrokeColor => self.do_SC(args),
            Op::SetFillColorN => self.do_scn(args),
            Op::SetStrokeColorN => self.do_SCN(args),

            // Path construction and painting
            Op::MoveTo => self.do_m(num(args, 0), num(args, 1)),
            Op::LineTo => self.do_l(num(args, 0), num(args, 1)),
            Op::CurveTo => {
                let [x1, y1, x2, y2, x3, y3] = nums::<6>(args);
                self.do_c(x1, y1, x2, y2, x3, y3);
            }
            Op::CurveTo1 => {
                let [x2, y2, x3, y3] = nums::<4>(args);
                self.do_v(x2, y2, x3, y3);
            }
            Op::CurveTo2 => {
                let [x1, y1, x3, y3] = nums::<4>(args);
                self.do_y(x1, y1, x3, y3);
            }
            Op::Rectangle => {
                let [x, y, w, h] = nums::<4>(args);
                self.do_re(x, y, w, h);
            }
            Op::ClosePath => self.do_h(),
            Op::EndPath => self.do_n(),
            Op::Stroke => self.do_S(),
            Op::CloseStroke => self.do_s(),
            Op::Fill => self.do_f(),
            Op::EoFill => self.do_f_star(),
            Op::FillStroke => self.do_B(),
            Op::EoFillStroke => self.do_B_star(),
            Op::CloseFillStroke => self.do_b(),
            Op::CloseEoFillStroke => self.do_b_star(),
            Op::Clip => self.do_W(),
            Op::EoClip => self.do_W_star(),
            Op::ShFill => self.do_sh(name(args, 0)),

            // Text
            Op::BeginText => self.do_BT(),
            Op::EndText => self.do_ET(),
            Op::SetCharSpacing => self.do_Tc(num(args, 0)),
            Op::SetWordSpacing => self.do_Tw(num(args, 0)),
            Op::SetHorizScaling => self.do_Tz(num(args, 0)),
            Op::SetTextLeading => self.do_TL(num(args, 0)),
            Op::SetFont => self.do_Tf(name(args, 0), num(args, 1)),
            Op::SetTextRender => self.do_Tr(int(args, 0)),
            Op::SetTextRise => self.do_Ts(num(args, 0)),
            Op::TextMove => self.do_Td(num(args, 0), num(args, 1)),
            Op::TextMoveSet => self.do_TD(num(args, 0), num(args, 1)),
            Op::SetTextMatrix => self.do_Tm(matrix_arg(args)),
            Op::TextNextLine => self.do_T_star(),
            Op::ShowText => self.do_Tj(string(args, 0)),
            Op::MoveShowText => self.do_quote(string(args, 0)),
            Op::MoveSetShowText => {
                self.do_doublequote(num(args, 0), num(args, 1), string(args, 2));
            }
            Op::ShowSpaceText => self.do_TJ(&args[0]),
            Op::SetCharWidth | Op::SetCacheDevice => {}

            // XObjects, images and marked content
            Op::XObject => self.do_Do(name(args, 0)),
            // Inline images reach the interpreter as whole tokens.
            Op::BeginImage => {}
            Op::ImageData => self.error("Internal: got 'ID' operator"),
            Op::EndImage => self.error("Internal: got 'EI' operator"),
            Op::BeginMarkedContent => self.do_BDC(args),
            Op::EndMarkedContent => self.do_EMC(),
            Op::MarkPoint => {}
            Op::BeginIgnoreUndef => self.do_BX(),
            Op::EndIgnoreUndef => self.do_EX(),
        }
    }

    // ========================================================================
    // State stack
    // ========================================================================

    pub(crate) fn save_state(&mut self) {
        self.state_stack.push(self.state.clone());
        self.clip.save();
        self.builder.save_state(&self.state);
    }

    /// Pops the state stack. The path and pen positions are not part of
    /// the saved state and survive the restore.
    pub(crate) fn restore_state(&mut self) {
        let Some(mut saved) = self.state_stack.pop() else {
            return;
        };
        self.builder.restore_state(&self.state);
        saved.path = std::mem::take(&mut self.state.path);
        saved.cur_pos = self.state.cur_pos;
        saved.line_pos = self.state.line_pos;
        self.state = saved;
        self.clip.restore();
    }

    // ========================================================================
    // Resource lookups
    // ========================================================================

    /// Color space named by an operand, from resources or by family name.
    ///
    /// Named lookups are cached per form depth, pattern spaces excepted.
    pub(crate) fn lookup_color_space(&mut self, arg: &PDFObject) -> Option<Arc<PdfColorSpace>> {
        let PDFObject::Name(name) = arg else {
            return PdfColorSpace::parse(arg, self.store).ok().map(Arc::new);
        };
        let key = format!("{}-{name}", self.form_depth);
        if let Some(cached) = self.color_space_cache.get(&key) {
            return Some(cached.clone());
        }
        let obj = self
            .resources
            .color_space(self.store, name)
            .unwrap_or_else(|| arg.clone());
        match PdfColorSpace::parse(&obj, self.store) {
            Ok(space) => {
                let space = Arc::new(space);
                if !space.is_pattern() {
                    self.color_space_cache.insert(key, space.clone());
                }
                Some(space)
            }
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "color space lookup failed");
                None
            }
        }
    }

    /// Font resource, loaded once per form depth.
    pub(crate) fn lookup_font(&mut self, name: &str) -> Option<Arc<dyn GfxFont>> {
        let key = format!("{}-{name}", self.form_depth);
        if let Some(font) = self.font_cache.get(&key) {
            return Some(font.clone());
        }
        let obj = self.resources.font(self.store, name)?;
        match load_font(&obj, self.store) {
            Ok(font) => {
                self.font_cache.insert(key, font.clone());
                Some(font)
            }
            Err(e) => {
                self.error(format!("Unusable font '{name}': {e}"));
                None
            }
        }
    }

    // ========================================================================
    // Page setup
    // ========================================================================

    /// Registers optional content groups with the builder.
    ///
    /// Page `Properties` entries of type OCG are registered under their
    /// resource key. Without page properties, catalog groups get `OC{n}`
    /// keys. When grouping by optional content, form resources are searched
    /// as well.
    pub(crate) fn load_optional_content_layers(&mut self, resources: &PDFDict, depth: u32) {
        if depth > self.config.max_form_depth {
            return;
        }
        let store = self.store;
        let catalog_groups = self.catalog_optional_groups();
        let props = store.lookup(resources, "Properties");

        match (props.dict(), &catalog_groups) {
            (Some(props), Some(groups)) => {
                for (key, value) in props {
                    let value = store.resolve(value);
                    let Some(ocg) = value.dict() else {
                        continue;
                    };
                    if !store.lookup(ocg, "Type").is_name("OCG") {
                        continue;
                    }
                    let label = text_entry(store, ocg, "Name");
                    let visible = groups
                        .iter()
                        .rev()
                        .find(|(name, _)| *name == label)
                        .is_none_or(|(_, on)| *on);
                    self.builder.add_optional_group(key, &label, visible);
                }
            }
            (None, Some(groups)) => {
                for (i, (name, on)) in groups.iter().enumerate() {
                    self.builder
                        .add_optional_group(&format!("OC{}", i + 1), name, *on);
                }
            }
            _ => {}
        }

        if self.config.group_by == GroupBy::OptionalContent
            && let PDFObject::Dict(xobjects) = store.lookup(resources, "XObject")
        {
            for value in xobjects.values() {
                let PDFObject::Stream(stream) = store.resolve(value) else {
                    continue;
                };
                if !store.lookup(&stream.attrs, "Subtype").is_name("Form") {
                    continue;
                }
                if let PDFObject::Dict(form_resources) = store.lookup(&stream.attrs, "Resources") {
                    self.load_optional_content_layers(&form_resources, depth + 1);
                }
            }
        }
    }

    /// `(name, visible)` of every catalog OCG, `None` without `OCProperties`.
    fn catalog_optional_groups(&self) -> Option<Vec<(String, bool)>> {
        let store = self.store;
        let catalog = store.catalog()?;
        let props = store.lookup(&catalog, "OCProperties");
        let props = props.dict()?;
        let config = store.lookup(props, "D");
        let config = config.dict();
        let refs_in = |key: &str| -> Vec<PDFObject> {
            config
                .map(|d| match d.get(key) {
                    Some(v) => match store.resolve(v) {
                        PDFObject::Array(a) => a,
                        _ => Vec::new(),
                    },
                    None => Vec::new(),
                })
                .unwrap_or_default()
        };
        let base_off = config.is_some_and(|d| store.lookup(d, "BaseState").is_name("OFF"));
        let on = refs_in("ON");
        let off = refs_in("OFF");

        let PDFObject::Array(ocgs) = store.lookup(props, "OCGs") else {
            return Some(Vec::new());
        };
        let groups = ocgs
            .iter()
            .filter_map(|entry| {
                let ocg = store.resolve(entry);
                let name = text_entry(store, ocg.dict()?, "Name");
                let visible = if base_off {
                    on.contains(entry)
                } else {
                    !off.contains(entry)
                };
                Some((name, visible))
            })
            .collect();
        Some(groups)
    }

    /// Sends the output intent profile when the document has exactly one.
    pub(crate) fn load_color_profile(&mut self) {
        let store = self.store;
        let Some(catalog) = store.catalog() else {
            return;
        };
        let PDFObject::Array(intents) = store.lookup(&catalog, "OutputIntents") else {
            return;
        };
        if intents.len() != 1 {
            return;
        }
        let intent = store.resolve(&intents[0]);
        let Some(intent) = intent.dict() else {
            return;
        };
        let PDFObject::Stream(profile) = store.lookup(intent, "DestOutputProfile") else {
            return;
        };
        match profile.decode() {
            Ok(data) => self.builder.add_color_profile(&data),
            Err(e) => self.error(format!("Unreadable output intent profile: {e}")),
        }
    }

    /// Draws an annotation's appearance stream as a form at its `Rect`.
    ///
    /// Each page gets one `A{page}` optional group holding its annotations.
    pub fn build_annots(&mut self, annot: &PDFObject, page_num: u32) {
        let store = self.store;
        let annot = store.resolve(annot);
        let Some(annot) = annot.dict() else {
            return;
        };
        let PDFObject::Dict(ap) = store.lookup(annot, "AP") else {
            self.warning("No handler for annotations without an appearance stream");
            return;
        };
        let appearance = match store.lookup(&ap, "N") {
            // Several appearance states; the first one is drawn.
            PDFObject::Dict(states) => states
                .values()
                .next()
                .map(|v| store.resolve(v))
                .unwrap_or_default(),
            other => other,
        };
        let PDFObject::Stream(appearance) = appearance else {
            return;
        };
        let label = format!("{page_num} - Annotations");
        self.builder
            .add_optional_group(&format!("A{page_num}"), &label, true);
        self.builder.begin_xobject_layer(&label);
        if let Ok(rect) = store.lookup(annot, "Rect").as_num_array()
            && rect.len() >= 2
        {
            self.do_form(&appearance, Some((rect[0], rect[1])));
        }
        self.builder.end_marked_content();
    }
}

/// Interprets a page: contents first, then annotations.
pub fn interpret_page<B: SceneBuilder>(
    builder: &mut B,
    store: &dyn ObjectStore,
    page: &PageInfo,
    config: InterpreterConfig,
) -> Result<Diagnostics> {
    let mut interp = Interpreter::new_page(builder, store, page, config);
    if !page.contents.is_null() {
        interp.parse(&page.contents)?;
    }
    for annot in &page.annots {
        interp.build_annots(annot, page.number);
    }
    Ok(interp.finish())
}

/// Device CTM and page size for a box rendered at `dpi`.
///
/// `upside_down` puts the origin at the top left with y growing downwards.
pub fn page_ctm(dpi: f64, bbox: Rect, rotate: i64, upside_down: bool) -> (Matrix, f64, f64) {
    let k = dpi / 72.0;
    let (px1, py1, px2, py2) = bbox;
    let flip = |v: f64| if upside_down { v } else { -v };
    let (ctm, width, height) = match rotate.rem_euclid(360) {
        90 => (
            (
                0.0,
                flip(k),
                k,
                0.0,
                -k * py1,
                k * if upside_down { -px1 } else { px2 },
            ),
            k * (py2 - py1),
            k * (px2 - px1),
        ),
        180 => (
            (
                -k,
                0.0,
                0.0,
                flip(k),
                k * px2,
                k * if upside_down { -py1 } else { py2 },
            ),
            k * (px2 - px1),
            k * (py2 - py1),
        ),
        270 => (
            (
                0.0,
                flip(-k),
                -k,
                0.0,
                k * py2,
                k * if upside_down { px2 } else { -px1 },
            ),
            k * (py2 - py1),
            k * (px2 - px1),
        ),
        _ => (
            (
                k,
                0.0,
                0.0,
                flip(-k),
                -k * px1,
                k * if upside_down { py2 } else { -py1 },
            ),
            k * (px2 - px1),
            k * (py2 - py1),
        ),
    };
    (ctm, width, height)
}

fn scale_factor(size: f64, extent: f64) -> f64 {
    if extent.abs() > f64::EPSILON {
        size / extent
    } else {
        1.0
    }
}

fn text_entry(store: &dyn ObjectStore, dict: &PDFDict, key: &str) -> String {
    match store.lookup(dict, key) {
        PDFObject::String(bytes) => decode_text_string(&bytes),
        PDFObject::Name(name) => name,
        _ => String::new(),
    }
}

// ============================================================================
// Operand accessors
//
// Operands were type checked against the table before dispatch, so these
// only fall back to zero values for positions the table leaves unchecked.
// ============================================================================

pub(crate) fn num(args: &[PDFObject], i: usize) -> f64 {
    args.get(i).and_then(|a| a.as_num().ok()).unwrap_or(0.0)
}

pub(crate) fn int(args: &[PDFObject], i: usize) -> i64 {
    args.get(i).and_then(|a| a.as_int().ok()).unwrap_or(0)
}

pub(crate) fn name(args: &[PDFObject], i: usize) -> &str {
    args.get(i).and_then(|a| a.as_name().ok()).unwrap_or("")
}

pub(crate) fn string(args: &[PDFObject], i: usize) -> &[u8] {
    args.get(i).and_then(|a| a.as_string().ok()).unwrap_or(&[])
}

fn nums<const N: usize>(args: &[PDFObject]) -> [f64; N] {
    std::array::from_fn(|i| num(args, i))
}

fn matrix_arg(args: &[PDFObject]) -> Matrix {
    let [a, b, c, d, e, f] = nums::<6>(args);
    (a, b, c, d, e, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::apply_matrix_pt;

    #[test]
    fn test_page_ctm_upside_down() {
        let (ctm, w, h) = page_ctm(96.0, (0.0, 0.0, 72.0, 144.0), 0, true);
        assert_eq!((w, h), (96.0, 192.0));
        let (x, y) = apply_matrix_pt(ctm, (0.0, 144.0));
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
        let (_, y) = apply_matrix_pt(ctm, (0.0, 0.0));
        assert!((y - 192.0).abs() < 1e-9);
    }

    #[test]
    fn test_page_ctm_identity_for_sub_page() {
        let (ctm, ..) = page_ctm(72.0, (0.0, 0.0, 10.0, 10.0), 0, false);
        assert_eq!(ctm, (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotated_page_swaps_size() {
        let (_, w, h) = page_ctm(72.0, (0.0, 0.0, 100.0, 50.0), 90, true);
        assert_eq!((w, h), (50.0, 100.0));
    }
}
