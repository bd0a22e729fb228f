//! Geometry helpers shared by the interpreter.
//!
//! Provides:
//! - Geometric types (Point, Rect, Matrix)
//! - Affine matrix products, inversion and point mapping
//! - Bezier flattening used when handing outlines to polygon clipping

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (x0, y0, x1, y1) where (x0, y0) is typically bottom-left
/// and (x1, y1) is top-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: result = m1 * m0.
/// This applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Inverts an affine matrix. Returns `None` for singular matrices.
pub fn invert_matrix(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det.abs() < EPSILON {
        return None;
    }
    let ia = d / det;
    let ib = -b / det;
    let ic = -c / det;
    let id = a / det;
    Some((ia, ib, ic, id, -(e * ia + f * ic), -(e * ib + f * id)))
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Normalizes a rectangle so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

/// Number of line segments used per flattened cubic bezier.
pub const CURVE_SEGMENTS: usize = 16;

/// Flattens a cubic bezier into line endpoints (start point excluded).
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<Point> {
    (1..=CURVE_SEGMENTS)
        .map(|i| {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            (
                a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
                a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
            )
        })
        .collect()
}
