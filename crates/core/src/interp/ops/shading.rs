//! Shading operator and shading subdivision.
//!
//! Handles: sh
//!
//! Axial and radial shadings go to the builder as they are. Function,
//! triangle mesh and patch mesh shadings are approximated by flat filled
//! paths, subdividing until neighbouring colors are within
//! `color_delta` or `max_depth` is reached.

use std::sync::Arc;

use crate::interp::builder::SceneBuilder;
use crate::interp::interpreter::Interpreter;
use crate::model::{GfxColor, MeshVertex, Patch, Shading, ShadingKind};
use crate::utils::{Matrix, apply_matrix_pt};

#[allow(non_snake_case)]
impl<'a, B: SceneBuilder> Interpreter<'a, B> {
    /// Paints a shading over the current clip.
    ///
    /// PDF operator: `sh`
    pub fn do_sh(&mut self, name: &str) {
        let Some(obj) = self.resources.shading(self.store, name) else {
            self.warning(format!("Unknown shading '{name}'"));
            return;
        };
        let shading = match Shading::parse(&obj, self.store) {
            Ok(shading) => Arc::new(shading),
            Err(e) => {
                self.error(format!("Bad shading '{name}': {e}"));
                return;
            }
        };

        if matches!(shading.shading_type, 2 | 3) {
            self.builder
                .add_shaded_fill(&self.state, &shading, self.state.ctm);
            return;
        }

        let saved_path = self.state.path.clone();
        self.save_state();
        self.state
            .set_fill_space(Arc::new(shading.color_space.clone()));
        self.fill_shading(&shading);
        self.restore_state();
        self.state.path = saved_path;
    }

    /// Subdivides a function or mesh shading into filled paths.
    ///
    /// Axial and radial shadings are left to the builder and draw nothing
    /// here.
    pub(crate) fn fill_shading(&mut self, shading: &Shading) {
        tracing::debug!(
            shading_type = shading.shading_type,
            color_delta = self.config.color_delta,
            max_depth = self.config.max_depth,
            "subdividing shading"
        );
        match &shading.kind {
            ShadingKind::Function { domain, matrix, .. } => {
                self.do_function_sh_fill(shading, *domain, *matrix);
            }
            ShadingKind::Gouraud {
                vertices,
                triangles,
                param_domain,
                ..
            } => self.do_gouraud_sh_fill(shading, vertices, triangles, *param_domain),
            ShadingKind::Patch { patches, .. } => self.do_patch_mesh_sh_fill(shading, patches),
            ShadingKind::Axial { .. } | ShadingKind::Radial { .. } => {}
        }
    }

    /// Fills the current path with `color` and clears it.
    fn fill_flat(&mut self, color: GfxColor) {
        self.state.fill_color = color;
        self.builder.add_path(&self.state, true, false, false);
        self.state.path.clear();
    }

    // ========================================================================
    // Function-based shadings (type 1)
    // ========================================================================

    fn do_function_sh_fill(&mut self, shading: &Shading, domain: [f64; 4], matrix: Matrix) {
        // Domain is [xmin xmax ymin ymax].
        let [x0, x1, y0, y1] = domain;
        let colors = [
            shading.function_color(x0, y0),
            shading.function_color(x0, y1),
            shading.function_color(x1, y0),
            shading.function_color(x1, y1),
        ];
        self.function_sh_fill1(shading, matrix, (x0, y0, x1, y1), &colors, 0);
    }

    /// Corner colors are ordered `(x0,y0)`, `(x0,y1)`, `(x1,y0)`, `(x1,y1)`.
    fn function_sh_fill1(
        &mut self,
        shading: &Shading,
        matrix: Matrix,
        (x0, y0, x1, y1): (f64, f64, f64, f64),
        colors: &[GfxColor; 4],
        depth: u32,
    ) {
        let delta = self.config.color_delta;
        let close = (0..4).all(|i| within(&colors[i], &colors[(i + 1) & 3], delta));
        let (xm, ym) = (0.5 * (x0 + x1), 0.5 * (y0 + y1));

        // At least one subdivision, so uniform corners do not hide a
        // varying interior.
        if (close && depth > 0) || depth == self.config.max_depth {
            let path = &mut self.state.path;
            let p = |x, y| apply_matrix_pt(matrix, (x, y));
            let (ax, ay) = p(x0, y0);
            path.move_to(ax, ay);
            let (bx, by) = p(x1, y0);
            path.line_to(bx, by);
            let (cx, cy) = p(x1, y1);
            path.line_to(cx, cy);
            let (dx, dy) = p(x0, y1);
            path.line_to(dx, dy);
            path.close();
            self.fill_flat(shading.function_color(xm, ym));
            return;
        }

        let c0m = shading.function_color(x0, ym);
        let c1m = shading.function_color(x1, ym);
        let cm0 = shading.function_color(xm, y0);
        let cm1 = shading.function_color(xm, y1);
        let cmm = shading.function_color(xm, ym);
        let d = depth + 1;

        let upper_left = [colors[0].clone(), c0m.clone(), cm0.clone(), cmm.clone()];
        self.function_sh_fill1(shading, matrix, (x0, y0, xm, ym), &upper_left, d);
        let lower_left = [c0m, colors[1].clone(), cmm.clone(), cm1.clone()];
        self.function_sh_fill1(shading, matrix, (x0, ym, xm, y1), &lower_left, d);
        let upper_right = [cm0, cmm.clone(), colors[2].clone(), c1m.clone()];
        self.function_sh_fill1(shading, matrix, (xm, y0, x1, ym), &upper_right, d);
        let lower_right = [cmm, cm1, c1m, colors[3].clone()];
        self.function_sh_fill1(shading, matrix, (xm, ym, x1, y1), &lower_right, d);
    }

    // ========================================================================
    // Triangle meshes (types 4 and 5)
    // ========================================================================

    fn do_gouraud_sh_fill(
        &mut self,
        shading: &Shading,
        vertices: &[MeshVertex],
        triangles: &[[usize; 3]],
        (t_min, t_max): (f64, f64),
    ) {
        let parameterized = shading.is_parameterized();
        let threshold = self.config.color_delta * (t_max - t_min);
        for tri in triangles {
            let (Some(v0), Some(v1), Some(v2)) = (
                vertices.get(tri[0]),
                vertices.get(tri[1]),
                vertices.get(tri[2]),
            ) else {
                continue;
            };
            let p = [(v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y)];
            if parameterized {
                let t = [param(&v0.color), param(&v1.color), param(&v2.color)];
                self.gouraud_param_fill(shading, p, t, threshold, 0);
            } else {
                let c = [v0.color.clone(), v1.color.clone(), v2.color.clone()];
                self.gouraud_color_fill(p, c, 0);
            }
        }
    }

    fn fill_triangle(&mut self, [(x0, y0), (x1, y1), (x2, y2)]: [(f64, f64); 3], color: GfxColor) {
        let path = &mut self.state.path;
        path.move_to(x0, y0);
        path.line_to(x1, y1);
        path.line_to(x2, y2);
        path.close();
        self.fill_flat(color);
    }

    fn gouraud_param_fill(
        &mut self,
        shading: &Shading,
        p: [(f64, f64); 3],
        t: [f64; 3],
        threshold: f64,
        depth: u32,
    ) {
        let mean = (t[0] + t[1] + t[2]) / 3.0;
        let fine = t.iter().all(|v| (v - mean).abs() < threshold);
        if fine || depth == self.config.max_depth {
            self.fill_triangle(p, shading.parameterized_color(mean));
            return;
        }
        let [p0, p1, p2] = p;
        let (p01, p12, p20) = (midpoint(p0, p1), midpoint(p1, p2), midpoint(p2, p0));
        let (t01, t12, t20) = ((t[0] + t[1]) / 2.0, (t[1] + t[2]) / 2.0, (t[2] + t[0]) / 2.0);
        let d = depth + 1;
        self.gouraud_param_fill(shading, [p0, p01, p20], [t[0], t01, t20], threshold, d);
        self.gouraud_param_fill(shading, [p01, p1, p12], [t01, t[1], t12], threshold, d);
        self.gouraud_param_fill(shading, [p01, p12, p20], [t01, t12, t20], threshold, d);
        self.gouraud_param_fill(shading, [p20, p12, p2], [t20, t12, t[2]], threshold, d);
    }

    fn gouraud_color_fill(&mut self, p: [(f64, f64); 3], c: [GfxColor; 3], depth: u32) {
        let delta = self.config.color_delta;
        let close = within(&c[0], &c[1], delta) && within(&c[1], &c[2], delta);
        if close || depth == self.config.max_depth {
            let [c0, ..] = c;
            self.fill_triangle(p, c0);
            return;
        }
        let [p0, p1, p2] = p;
        let (p01, p12, p20) = (midpoint(p0, p1), midpoint(p1, p2), midpoint(p2, p0));
        let [c0, c1, c2] = c;
        let c01 = average(&c0, &c1);
        let c12 = average(&c1, &c2);
        let c20 = average(&c2, &c0);
        let d = depth + 1;
        self.gouraud_color_fill([p0, p01, p20], [c0, c01.clone(), c20.clone()], d);
        self.gouraud_color_fill([p01, p1, p12], [c01.clone(), c1, c12.clone()], d);
        self.gouraud_color_fill([p01, p12, p20], [c01, c12.clone(), c20.clone()], d);
        self.gouraud_color_fill([p20, p12, p2], [c20, c12, c2], d);
    }

    // ========================================================================
    // Patch meshes (types 6 and 7)
    // ========================================================================

    fn do_patch_mesh_sh_fill(&mut self, shading: &Shading, patches: &[Patch]) {
        // Large meshes start deeper so fewer levels remain to subdivide.
        let start = match patches.len() {
            n if n > 128 => 3,
            n if n > 64 => 2,
            n if n > 16 => 1,
            _ => 0,
        };
        for patch in patches {
            self.fill_patch(shading, patch, start);
        }
    }

    fn fill_patch(&mut self, shading: &Shading, patch: &Patch, depth: u32) {
        let delta = self.config.color_delta;
        let c = &patch.color;
        let close = within(&c[0][0], &c[0][1], delta)
            && within(&c[0][1], &c[1][1], delta)
            && within(&c[1][1], &c[1][0], delta)
            && within(&c[1][0], &c[0][0], delta);

        if close || depth >= self.config.max_depth {
            let (x, y) = (&patch.x, &patch.y);
            let path = &mut self.state.path;
            path.move_to(x[0][0], y[0][0]);
            path.curve_to(x[0][1], y[0][1], x[0][2], y[0][2], x[0][3], y[0][3]);
            path.curve_to(x[1][3], y[1][3], x[2][3], y[2][3], x[3][3], y[3][3]);
            path.curve_to(x[3][2], y[3][2], x[3][1], y[3][1], x[3][0], y[3][0]);
            path.curve_to(x[2][0], y[2][0], x[1][0], y[1][0], x[0][0], y[0][0]);
            path.close();
            let color = if shading.is_parameterized() {
                shading.parameterized_color(param(&c[0][0]))
            } else {
                c[0][0].clone()
            };
            self.fill_flat(color);
            return;
        }

        for sub in split_patch(patch) {
            self.fill_patch(shading, &sub, depth + 1);
        }
    }
}

/// Splits a patch at its parametric midpoints.
///
/// Returns the quarters in the order `00`, `10`, `01`, `11`, where the first
/// digit selects the half along the first grid index.
fn split_patch(patch: &Patch) -> [Patch; 4] {
    let mut p00 = Patch::default();
    let mut p01 = Patch::default();
    let mut p10 = Patch::default();
    let mut p11 = Patch::default();

    for (src, dst) in [(&patch.x, 0), (&patch.y, 1)] {
        // Each row split in half along the second index: 8 points per row.
        let mut rows = [[0.0; 8]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            let s = src[i];
            row[0] = s[0];
            row[1] = 0.5 * (s[0] + s[1]);
            let mid = 0.5 * (s[1] + s[2]);
            row[6] = 0.5 * (s[2] + s[3]);
            row[2] = 0.5 * (row[1] + mid);
            row[5] = 0.5 * (mid + row[6]);
            row[3] = 0.5 * (row[2] + row[5]);
            row[4] = row[3];
            row[7] = s[3];
        }
        for (half, (lo, hi)) in [(0, (&mut p00, &mut p10)), (4, (&mut p01, &mut p11))] {
            let lo = if dst == 0 { &mut lo.x } else { &mut lo.y };
            let hi = if dst == 0 { &mut hi.x } else { &mut hi.y };
            for j in 0..4 {
                let col = [
                    rows[0][half + j],
                    rows[1][half + j],
                    rows[2][half + j],
                    rows[3][half + j],
                ];
                lo[0][j] = col[0];
                lo[1][j] = 0.5 * (col[0] + col[1]);
                let mid = 0.5 * (col[1] + col[2]);
                hi[2][j] = 0.5 * (col[2] + col[3]);
                lo[2][j] = 0.5 * (lo[1][j] + mid);
                hi[1][j] = 0.5 * (mid + hi[2][j]);
                lo[3][j] = 0.5 * (lo[2][j] + hi[1][j]);
                hi[0][j] = lo[3][j];
                hi[3][j] = col[3];
            }
        }
    }

    let c = &patch.color;
    let top = average(&c[0][0], &c[0][1]);
    let right = average(&c[0][1], &c[1][1]);
    let bottom = average(&c[1][1], &c[1][0]);
    let left = average(&c[1][0], &c[0][0]);
    let center = average(&left, &right);

    p00.color = [
        [c[0][0].clone(), top.clone()],
        [left.clone(), center.clone()],
    ];
    p01.color = [
        [top, c[0][1].clone()],
        [center.clone(), right.clone()],
    ];
    p11.color = [
        [center.clone(), right],
        [bottom.clone(), c[1][1].clone()],
    ];
    p10.color = [[left, center], [c[1][0].clone(), bottom]];

    [p00, p10, p01, p11]
}

/// True when every component of `a` is within `delta` of `b`.
fn within(a: &GfxColor, b: &GfxColor, delta: f64) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= delta)
}

fn average(a: &GfxColor, b: &GfxColor) -> GfxColor {
    a.iter().zip(b.iter()).map(|(x, y)| (x + y) / 2.0).collect()
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (0.5 * (a.0 + b.0), 0.5 * (a.1 + b.1))
}

/// Interpolation parameter of a parameterized mesh color.
fn param(color: &GfxColor) -> f64 {
    color.first().copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: f64) -> GfxColor {
        GfxColor::from_slice(&[v])
    }

    fn flat_patch() -> Patch {
        let mut patch = Patch::default();
        for i in 0..4 {
            for j in 0..4 {
                patch.x[i][j] = j as f64;
                patch.y[i][j] = i as f64;
            }
        }
        patch.color = [[gray(0.0), gray(1.0)], [gray(0.0), gray(1.0)]];
        patch
    }

    #[test]
    fn test_split_patch_corners() {
        let parts = split_patch(&flat_patch());
        let [p00, p10, p01, p11] = &parts;
        assert_eq!((p00.x[0][0], p00.y[0][0]), (0.0, 0.0));
        assert_eq!((p01.x[0][3], p01.y[0][3]), (3.0, 0.0));
        assert_eq!((p10.x[3][0], p10.y[3][0]), (0.0, 3.0));
        assert_eq!((p11.x[3][3], p11.y[3][3]), (3.0, 3.0));
        assert_eq!((p00.x[3][3], p00.y[3][3]), (1.5, 1.5));
        assert_eq!(p11.x[0][0], p00.x[3][3]);
    }

    #[test]
    fn test_split_patch_colors() {
        let parts = split_patch(&flat_patch());
        assert_eq!(parts[0].color[0][1], gray(0.5));
        assert_eq!(parts[0].color[1][1], gray(0.5));
        assert_eq!(parts[3].color[1][1], gray(1.0));
        assert_eq!(parts[1].color[1][0], gray(0.0));
    }

    #[test]
    fn test_within_and_average() {
        let a = GfxColor::from_slice(&[0.0, 1.0]);
        let b = GfxColor::from_slice(&[0.4, 0.8]);
        assert!(within(&a, &b, 0.5));
        assert!(!within(&a, &b, 0.3));
        assert_eq!(average(&a, &b).as_slice(), &[0.2, 0.9]);
    }
}
