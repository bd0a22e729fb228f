//! Registry of color spaces.
//!
//! Handles: space registration and lookup by type, name or SVG name, and
//! turning parsed color text into a [`Color`].

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

use crate::colors::cms::{BuiltinCms, CmsBackend};
use crate::colors::color::Color;
use crate::colors::components::Traits;
use crate::colors::parser::{ColorParser, Parsers};
use crate::colors::space::{
    AnySpace, Cmyk, Gray, HsLuv, Hsl, Hsv, IccSpace, Lab, Lch, LinearRgb, Luv, NamedColor, OkLab,
    OkLch, Rgb, SpaceModel, SpaceType, Xyz, Xyz50,
};
use crate::error::{ColorError, ColorResult};

static DEFAULT: LazyLock<Manager> = LazyLock::new(Manager::new);

pub struct Manager {
    spaces: Vec<Arc<AnySpace>>,
    svg_names: FxHashMap<String, Arc<AnySpace>>,
    rgb: Arc<AnySpace>,
    parsers: Parsers,
    cms: Arc<dyn CmsBackend>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("spaces", &self.spaces.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("cms", &self.cms)
            .finish()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// Manager with every built-in space and the built-in CMS.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(BuiltinCms))
    }

    pub fn with_backend(cms: Arc<dyn CmsBackend>) -> Self {
        let rgb = Arc::new(AnySpace::new(Rgb, cms.clone()));
        let mut manager = Self {
            spaces: Vec::new(),
            svg_names: FxHashMap::default(),
            rgb: rgb.clone(),
            parsers: Parsers::default(),
            cms,
        };
        manager.insert(rgb);

        let builtin: Vec<Box<dyn SpaceModel>> = vec![
            Box::new(NamedColor),
            Box::new(Cmyk),
            Box::new(Gray),
            Box::new(Hsl),
            Box::new(HsLuv),
            Box::new(Hsv),
            Box::new(Lab),
            Box::new(LinearRgb),
            Box::new(Lch),
            Box::new(Luv),
            Box::new(OkLab),
            Box::new(OkLch),
            Box::new(Xyz),
            Box::new(Xyz50),
        ];
        for model in builtin {
            let space = Arc::new(AnySpace::from_boxed(model, manager.cms.clone()));
            manager.insert(space);
        }
        manager
    }

    /// The process wide manager.
    pub fn get() -> &'static Manager {
        &DEFAULT
    }

    pub fn cms(&self) -> &Arc<dyn CmsBackend> {
        &self.cms
    }

    fn insert(&mut self, space: Arc<AnySpace>) {
        for name in space.svg_names() {
            self.svg_names.insert(name, space.clone());
        }
        self.spaces.push(space);
    }

    /// Registers a new space.
    ///
    /// Only ICC spaces may share a type; names and SVG names must be unique.
    pub fn add_space(&mut self, model: impl SpaceModel + 'static) -> ColorResult<Arc<AnySpace>> {
        let space = Arc::new(AnySpace::new(model, self.cms.clone()));
        if space.space_type() != SpaceType::Cms && self.find(space.space_type()).is_some() {
            return Err(ColorError::new("Can not add the same color space twice."));
        }
        if self.find_by_name(space.name()).is_some() {
            return Err(ColorError::new(format!(
                "Can not add a second color space named '{}'.",
                space.name()
            )));
        }
        if space.svg_names().iter().any(|n| self.svg_names.contains_key(n)) {
            return Err(ColorError::new("Can not add the same svg attribute name twice."));
        }
        tracing::debug!(name = space.name(), "registered color space");
        self.insert(space.clone());
        Ok(space)
    }

    /// Unregisters a space. Colors already holding it keep working.
    pub fn remove_space(&mut self, space: &Arc<AnySpace>) -> bool {
        self.svg_names.retain(|_, s| !Arc::ptr_eq(s, space));
        let before = self.spaces.len();
        self.spaces.retain(|s| !Arc::ptr_eq(s, space));
        before != self.spaces.len()
    }

    pub fn add_parser(&mut self, parser: Box<dyn ColorParser>) {
        self.parsers.add_parser(parser);
    }

    /// Spaces whose components carry any of `traits`.
    pub fn spaces(&self, traits: Traits) -> Vec<Arc<AnySpace>> {
        self.spaces
            .iter()
            .filter(|s| s.components(false).traits().intersects(traits))
            .cloned()
            .collect()
    }

    pub fn find(&self, space_type: SpaceType) -> Option<Arc<AnySpace>> {
        self.spaces.iter().find(|s| s.space_type() == space_type).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<AnySpace>> {
        self.spaces.iter().find(|s| s.name() == name).cloned()
    }

    /// Looks up a space by an SVG attribute value such as `linearRGB`.
    pub fn find_svg_color_space(&self, input: &str) -> Option<Arc<AnySpace>> {
        self.svg_names.get(&input.to_ascii_lowercase()).cloned()
    }

    pub fn rgb(&self) -> Arc<AnySpace> {
        self.rgb.clone()
    }

    /// Builds a color of `space_type` when the values fit that space.
    pub fn if_valid(&self, space_type: SpaceType, values: Vec<f64>) -> Option<Color> {
        let space = self.find(space_type)?;
        space.is_valid_data(&values).then(|| Color::new(space, values))
    }

    /// Parses CSS color text.
    ///
    /// `icc-color()` values resolve against a registered space of that name.
    /// An unknown profile name still yields a color when an sRGB fallback
    /// was given, carried by a profile-less ICC space.
    pub fn parse(&self, input: &str) -> Option<Color> {
        let parsed = self.parsers.parse(input)?;
        if parsed.space_type != SpaceType::Cms {
            return self.if_valid(parsed.space_type, parsed.values);
        }
        if let Some(space) = self.find_by_name(&parsed.cms_name)
            && space.space_type() == SpaceType::Cms
            && space.is_valid_data(&parsed.values)
        {
            return Some(Color::new(space, parsed.values));
        }
        if parsed.fallback.len() != 3 || parsed.values.is_empty() {
            tracing::debug!(name = %parsed.cms_name, "no color profile for icc-color");
            return None;
        }
        let model = IccSpace::new(&parsed.cms_name, None, parsed.values.len());
        let space = Arc::new(AnySpace::new(model, self.cms.clone()));
        let mut values = parsed.values;
        values.extend(parsed.fallback);
        Some(Color::new(space, values))
    }
}
