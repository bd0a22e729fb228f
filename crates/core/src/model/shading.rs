//! Shadings (types 1-7) and patterns.
//!
//! Mesh shadings are decoded eagerly into vertices and patches so the
//! interpreter's subdivision can walk them without touching stream data.

use std::sync::Arc;

use crate::error::{PdfError, Result};
use crate::model::GfxColor;
use crate::model::bits::BitReader;
use crate::model::colorspace::PdfColorSpace;
use crate::model::function::{PdfFunction, eval_functions, parse_functions};
use crate::model::objects::{ObjectStore, PDFDict, PDFObject, PDFStream};
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect};

/// One vertex of a triangle mesh.
///
/// `color` holds a single parameter when the shading has a function.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshVertex {
    pub x: f64,
    pub y: f64,
    pub color: GfxColor,
}

/// A bicubic patch with a 4x4 control grid and four corner colors.
///
/// `color[0][0]` sits at `(x[0][0], y[0][0])`, `color[0][1]` at the `[0][3]`
/// corner, `color[1][1]` at `[3][3]` and `color[1][0]` at `[3][0]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub x: [[f64; 4]; 4],
    pub y: [[f64; 4]; 4],
    pub color: [[GfxColor; 2]; 2],
}

impl Patch {
    /// Fills the four interior control points of a Coons patch.
    fn derive_coons_interior(&mut self) {
        for grid in [&mut self.x, &mut self.y] {
            let p = *grid;
            grid[1][1] = (-4.0 * p[0][0] + 6.0 * (p[0][1] + p[1][0]) - 2.0 * (p[0][3] + p[3][0])
                + 3.0 * (p[3][1] + p[1][3])
                - p[3][3])
                / 9.0;
            grid[1][2] = (-4.0 * p[0][3] + 6.0 * (p[0][2] + p[1][3]) - 2.0 * (p[0][0] + p[3][3])
                + 3.0 * (p[3][2] + p[1][0])
                - p[3][0])
                / 9.0;
            grid[2][1] = (-4.0 * p[3][0] + 6.0 * (p[3][1] + p[2][0]) - 2.0 * (p[3][3] + p[0][0])
                + 3.0 * (p[0][1] + p[2][3])
                - p[0][3])
                / 9.0;
            grid[2][2] = (-4.0 * p[3][3] + 6.0 * (p[3][2] + p[2][3]) - 2.0 * (p[3][0] + p[0][3])
                + 3.0 * (p[0][2] + p[2][0])
                - p[0][0])
                / 9.0;
        }
    }
}

/// Boundary control points in stream order, then the tensor interior.
const PATCH_ORDER: [(usize, usize); 16] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (1, 3),
    (2, 3),
    (3, 3),
    (3, 2),
    (3, 1),
    (3, 0),
    (2, 0),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, 2),
    (2, 1),
];

#[derive(Debug, Clone, PartialEq)]
pub enum ShadingKind {
    /// Type 1.
    Function {
        domain: [f64; 4],
        matrix: Matrix,
        functions: Vec<PdfFunction>,
    },
    /// Type 2.
    Axial {
        coords: [f64; 4],
        domain: (f64, f64),
        functions: Vec<PdfFunction>,
        extend: (bool, bool),
    },
    /// Type 3.
    Radial {
        coords: [f64; 6],
        domain: (f64, f64),
        functions: Vec<PdfFunction>,
        extend: (bool, bool),
    },
    /// Types 4 and 5.
    Gouraud {
        vertices: Vec<MeshVertex>,
        triangles: Vec<[usize; 3]>,
        functions: Vec<PdfFunction>,
        param_domain: (f64, f64),
    },
    /// Types 6 and 7.
    Patch {
        patches: Vec<Patch>,
        functions: Vec<PdfFunction>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub shading_type: u32,
    pub color_space: PdfColorSpace,
    pub background: Option<GfxColor>,
    pub bbox: Option<Rect>,
    pub anti_alias: bool,
    pub kind: ShadingKind,
}

/// Mesh stream layout shared by types 4 to 7.
struct MeshLayout {
    bits_per_coord: u32,
    bits_per_comp: u32,
    bits_per_flag: u32,
    decode: Vec<(f64, f64)>,
    n_comps: usize,
}

impl MeshLayout {
    fn parse(dict: &PDFDict, store: &dyn ObjectStore, n_comps: usize, needs_flag: bool) -> Result<Self> {
        let int = |key: &str| store.lookup(dict, key).as_int().map(|v| v as u32);
        let bits_per_coord = int("BitsPerCoordinate")?;
        let bits_per_comp = int("BitsPerComponent")?;
        let bits_per_flag = if needs_flag { int("BitsPerFlag")? } else { 0 };
        if !matches!(bits_per_coord, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32)
            || !matches!(bits_per_comp, 1 | 2 | 4 | 8 | 12 | 16)
            || bits_per_flag > 8
        {
            return Err(PdfError::BadContent("bad mesh shading bit sizes".into()));
        }
        let decode: Vec<(f64, f64)> = store
            .lookup(dict, "Decode")
            .as_num_array()?
            .chunks_exact(2)
            .map(|c| (c[0], c[1]))
            .collect();
        if decode.len() < 2 + n_comps {
            return Err(PdfError::BadContent("mesh shading Decode too short".into()));
        }
        Ok(Self {
            bits_per_coord,
            bits_per_comp,
            bits_per_flag,
            decode,
            n_comps,
        })
    }

    fn read_point(&self, r: &mut BitReader<'_>) -> Option<(f64, f64)> {
        let (x0, x1) = self.decode[0];
        let (y0, y1) = self.decode[1];
        let x = r.read_scaled(self.bits_per_coord, x0, x1)?;
        let y = r.read_scaled(self.bits_per_coord, y0, y1)?;
        Some((x, y))
    }

    fn read_color(&self, r: &mut BitReader<'_>) -> Option<GfxColor> {
        (0..self.n_comps)
            .map(|i| {
                let (lo, hi) = self.decode[2 + i];
                r.read_scaled(self.bits_per_comp, lo, hi)
            })
            .collect()
    }
}

fn num_array<const N: usize>(obj: &PDFObject, default: [f64; N]) -> Result<[f64; N]> {
    if obj.is_null() {
        return Ok(default);
    }
    let values = obj.as_num_array()?;
    values
        .try_into()
        .map_err(|_| PdfError::BadContent(format!("expected {N} numbers")))
}

fn extend_flags(obj: &PDFObject) -> (bool, bool) {
    match obj {
        PDFObject::Array(a) if a.len() == 2 => (
            a[0].as_bool().unwrap_or(false),
            a[1].as_bool().unwrap_or(false),
        ),
        _ => (false, false),
    }
}

impl Shading {
    /// Parses a shading dictionary or stream.
    pub fn parse(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Self> {
        let obj = store.resolve(obj);
        let dict = obj.dict().ok_or(PdfError::TypeError {
            expected: "shading",
            got: obj.type_name(),
        })?;
        let get = |key: &str| store.lookup(dict, key);
        let shading_type = get("ShadingType").as_int()? as u32;
        let color_space = PdfColorSpace::parse(
            dict.get("ColorSpace").ok_or_else(|| PdfError::MissingKey("ColorSpace".into()))?,
            store,
        )?;
        if color_space.is_pattern() {
            return Err(PdfError::BadContent("shading in a Pattern color space".into()));
        }
        let background = get("Background")
            .as_num_array()
            .ok()
            .filter(|b| b.len() == color_space.n_comps())
            .map(GfxColor::from_vec);
        let bbox = get("BBox")
            .as_num_array()
            .ok()
            .filter(|b| b.len() == 4)
            .map(|b| (b[0], b[1], b[2], b[3]));
        let anti_alias = get("AntiAlias").as_bool().unwrap_or(false);
        let functions = match dict.get("Function") {
            Some(f) => parse_functions(f, store)?,
            None => Vec::new(),
        };

        let kind = match shading_type {
            1 => {
                if functions.is_empty() {
                    return Err(PdfError::MissingKey("Function".into()));
                }
                let m = num_array(&get("Matrix"), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0])?;
                ShadingKind::Function {
                    domain: num_array(&get("Domain"), [0.0, 1.0, 0.0, 1.0])?,
                    matrix: (m[0], m[1], m[2], m[3], m[4], m[5]),
                    functions,
                }
            }
            2 | 3 => {
                if functions.is_empty() {
                    return Err(PdfError::MissingKey("Function".into()));
                }
                let [t0, t1] = num_array(&get("Domain"), [0.0, 1.0])?;
                let extend = extend_flags(&get("Extend"));
                if shading_type == 2 {
                    ShadingKind::Axial {
                        coords: num_array(&get("Coords"), [0.0; 4])?,
                        domain: (t0, t1),
                        functions,
                        extend,
                    }
                } else {
                    ShadingKind::Radial {
                        coords: num_array(&get("Coords"), [0.0; 6])?,
                        domain: (t0, t1),
                        functions,
                        extend,
                    }
                }
            }
            4 | 5 => {
                let stream = obj.as_stream()?;
                parse_gouraud(shading_type, stream, dict, store, &color_space, functions)?
            }
            6 | 7 => {
                let stream = obj.as_stream()?;
                parse_patches(shading_type, stream, dict, store, &color_space, functions)?
            }
            other => {
                return Err(PdfError::Unsupported(format!("shading type {other}")));
            }
        };

        Ok(Self {
            shading_type,
            color_space,
            background,
            bbox,
            anti_alias,
            kind,
        })
    }

    /// True when mesh colors are a single parameter fed to a function.
    pub fn is_parameterized(&self) -> bool {
        match &self.kind {
            ShadingKind::Gouraud { functions, .. } | ShadingKind::Patch { functions, .. } => {
                !functions.is_empty()
            }
            _ => false,
        }
    }

    /// Color of a function shading at `(x, y)` in its domain.
    pub fn function_color(&self, x: f64, y: f64) -> GfxColor {
        match &self.kind {
            ShadingKind::Function { functions, .. } => eval_functions(functions, &[x, y]),
            _ => self.color_space.default_color(),
        }
    }

    /// Color for a mesh parameter or an axial/radial `t`.
    pub fn parameterized_color(&self, t: f64) -> GfxColor {
        match &self.kind {
            ShadingKind::Axial { functions, .. }
            | ShadingKind::Radial { functions, .. }
            | ShadingKind::Gouraud { functions, .. }
            | ShadingKind::Patch { functions, .. }
                if !functions.is_empty() =>
            {
                eval_functions(functions, &[t])
            }
            _ => self.color_space.default_color(),
        }
    }
}

fn parse_gouraud(
    shading_type: u32,
    stream: &PDFStream,
    dict: &PDFDict,
    store: &dyn ObjectStore,
    color_space: &PdfColorSpace,
    functions: Vec<PdfFunction>,
) -> Result<ShadingKind> {
    let n_comps = if functions.is_empty() {
        color_space.n_comps()
    } else {
        1
    };
    let layout = MeshLayout::parse(dict, store, n_comps, shading_type == 4)?;
    let per_row = if shading_type == 5 {
        let n = store.lookup(dict, "VerticesPerRow").as_int()?;
        if n < 2 {
            return Err(PdfError::BadContent("VerticesPerRow below 2".into()));
        }
        n as usize
    } else {
        0
    };
    let data = stream.decode()?;
    let mut reader = BitReader::new(&data);
    let mut vertices = Vec::new();
    let mut flags = Vec::new();
    loop {
        let flag = if shading_type == 4 {
            match reader.read(layout.bits_per_flag) {
                Some(f) => f,
                None => break,
            }
        } else {
            0
        };
        let Some((x, y)) = layout.read_point(&mut reader) else {
            break;
        };
        let Some(color) = layout.read_color(&mut reader) else {
            break;
        };
        reader.align();
        vertices.push(MeshVertex { x, y, color });
        flags.push(flag);
    }

    let mut triangles = Vec::new();
    if shading_type == 4 {
        let mut i = 0;
        // Indices of the last triangle, for edge sharing.
        let mut last: Option<[usize; 3]> = None;
        while i < vertices.len() {
            match (flags[i], last) {
                (1, Some([_, b, c])) => {
                    last = Some([b, c, i]);
                    i += 1;
                }
                (2, Some([a, _, c])) => {
                    last = Some([a, c, i]);
                    i += 1;
                }
                _ => {
                    if i + 2 >= vertices.len() {
                        break;
                    }
                    last = Some([i, i + 1, i + 2]);
                    i += 3;
                }
            }
            if let Some(t) = last {
                triangles.push(t);
            }
        }
    } else {
        let rows = vertices.len() / per_row;
        for r in 0..rows.saturating_sub(1) {
            for c in 0..per_row - 1 {
                let v = r * per_row + c;
                triangles.push([v, v + 1, v + per_row]);
                triangles.push([v + 1, v + per_row + 1, v + per_row]);
            }
        }
    }

    let param_domain = if functions.is_empty() {
        (0.0, 1.0)
    } else {
        layout.decode[2]
    };
    Ok(ShadingKind::Gouraud {
        vertices,
        triangles,
        functions,
        param_domain,
    })
}

fn parse_patches(
    shading_type: u32,
    stream: &PDFStream,
    dict: &PDFDict,
    store: &dyn ObjectStore,
    color_space: &PdfColorSpace,
    functions: Vec<PdfFunction>,
) -> Result<ShadingKind> {
    let n_comps = if functions.is_empty() {
        color_space.n_comps()
    } else {
        1
    };
    let layout = MeshLayout::parse(dict, store, n_comps, true)?;
    let tensor = shading_type == 7;
    let data = stream.decode()?;
    let mut reader = BitReader::new(&data);
    let mut patches: Vec<Patch> = Vec::new();

    'patches: loop {
        let Some(flag) = reader.read(layout.bits_per_flag) else {
            break;
        };
        let mut patch = Patch::default();
        let first = if flag == 0 {
            0
        } else {
            let Some(prev) = patches.last() else {
                break;
            };
            // Edge of the previous patch shared with this one, and its colors.
            let (edge, colors) = match flag {
                1 => ([(0, 3), (1, 3), (2, 3), (3, 3)], [(0, 1), (1, 1)]),
                2 => ([(3, 3), (3, 2), (3, 1), (3, 0)], [(1, 1), (1, 0)]),
                3 => ([(3, 0), (2, 0), (1, 0), (0, 0)], [(1, 0), (0, 0)]),
                _ => break,
            };
            for (j, &(r, c)) in edge.iter().enumerate() {
                patch.x[0][j] = prev.x[r][c];
                patch.y[0][j] = prev.y[r][c];
            }
            patch.color[0][0] = prev.color[colors[0].0][colors[0].1].clone();
            patch.color[0][1] = prev.color[colors[1].0][colors[1].1].clone();
            4
        };
        let count = if tensor { 16 } else { 12 };
        for &(r, c) in &PATCH_ORDER[first..count] {
            let Some((x, y)) = layout.read_point(&mut reader) else {
                break 'patches;
            };
            patch.x[r][c] = x;
            patch.y[r][c] = y;
        }
        let corners: &[(usize, usize)] = if flag == 0 {
            &[(0, 0), (0, 1), (1, 1), (1, 0)]
        } else {
            &[(1, 1), (1, 0)]
        };
        for &(r, c) in corners {
            let Some(color) = layout.read_color(&mut reader) else {
                break 'patches;
            };
            patch.color[r][c] = color;
        }
        if !tensor {
            patch.derive_coons_interior();
        }
        reader.align();
        patches.push(patch);
    }

    Ok(ShadingKind::Patch { patches, functions })
}

/// A resolved pattern resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Type 1.
    Tiling {
        paint_type: i64,
        tiling_type: i64,
        bbox: Rect,
        x_step: f64,
        y_step: f64,
        matrix: Matrix,
        stream: Arc<PDFStream>,
    },
    /// Type 2.
    Shading {
        shading: Arc<Shading>,
        matrix: Matrix,
        ext_gstate: Option<PDFDict>,
    },
}

impl Pattern {
    pub fn parse(obj: &PDFObject, store: &dyn ObjectStore) -> Result<Self> {
        let obj = store.resolve(obj);
        let dict = obj.dict().ok_or(PdfError::TypeError {
            expected: "pattern",
            got: obj.type_name(),
        })?;
        let get = |key: &str| store.lookup(dict, key);
        let m = num_array(&get("Matrix"), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0])?;
        let matrix = (m[0], m[1], m[2], m[3], m[4], m[5]);
        match get("PatternType").as_int()? {
            1 => {
                let b = num_array(&get("BBox"), [0.0; 4])?;
                Ok(Self::Tiling {
                    paint_type: get("PaintType").as_int().unwrap_or(1),
                    tiling_type: get("TilingType").as_int().unwrap_or(1),
                    bbox: (b[0], b[1], b[2], b[3]),
                    x_step: get("XStep").as_num()?,
                    y_step: get("YStep").as_num()?,
                    matrix,
                    stream: obj.as_stream()?.clone(),
                })
            }
            2 => {
                let shading = dict
                    .get("Shading")
                    .ok_or_else(|| PdfError::MissingKey("Shading".into()))?;
                Ok(Self::Shading {
                    shading: Arc::new(Shading::parse(shading, store)?),
                    matrix,
                    ext_gstate: get("ExtGState").as_dict().ok().cloned(),
                })
            }
            other => Err(PdfError::BadContent(format!("unknown pattern type {other}"))),
        }
    }

    pub const fn pattern_type(&self) -> u32 {
        match self {
            Self::Tiling { .. } => 1,
            Self::Shading { .. } => 2,
        }
    }

    pub const fn matrix(&self) -> Matrix {
        match self {
            Self::Tiling { matrix, .. } | Self::Shading { matrix, .. } => *matrix,
        }
    }

    /// Identity matrix shorthand for patterns built in code.
    pub fn shading(shading: Shading) -> Self {
        Self::Shading {
            shading: Arc::new(shading),
            matrix: MATRIX_IDENTITY,
            ext_gstate: None,
        }
    }
}
