//! Path under construction, in user space.

use crate::utils::{Matrix, Point, apply_matrix_pt, flatten_cubic};

/// Path segment for graphics operations.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

/// Path built by `m`, `l`, `c`, `v`, `y`, `re` and `h`.
///
/// A lone `m` sets the current point without starting a subpath; a second
/// `m` in a row replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GfxPath {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    start: Point,
    just_moved: bool,
}

impl GfxPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True once a current point exists.
    pub const fn is_cur_pt(&self) -> bool {
        self.current.is_some()
    }

    /// True once something beyond a bare moveto was added.
    pub fn is_path(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, PathSegment::MoveTo(..)))
    }

    pub const fn current_point(&self) -> Option<Point> {
        self.current
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        if self.just_moved
            && let Some(PathSegment::MoveTo(..)) = self.segments.last()
        {
            self.segments.pop();
        }
        self.segments.push(PathSegment::MoveTo(x, y));
        self.current = Some((x, y));
        self.start = (x, y);
        self.just_moved = true;
    }

    /// Callers check [`GfxPath::is_cur_pt`] first.
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo(x, y));
        self.current = Some((x, y));
        self.just_moved = false;
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.segments
            .push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
        self.current = Some((x3, y3));
        self.just_moved = false;
    }

    /// Closes the current subpath; the current point returns to its start.
    pub fn close(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.segments.push(PathSegment::ClosePath);
        self.current = Some(self.start);
        self.just_moved = false;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.current = None;
        self.just_moved = false;
    }

    /// Subpaths mapped through `m` with curves flattened, as polygon contours.
    ///
    /// Contours with fewer than three points are dropped.
    pub fn to_polygons(&self, m: Matrix) -> Vec<Vec<[f64; 2]>> {
        let mut out = Vec::new();
        let mut contour: Vec<Point> = Vec::new();
        let flush = |contour: &mut Vec<Point>, out: &mut Vec<Vec<[f64; 2]>>| {
            if contour.len() >= 3 {
                out.push(
                    contour
                        .iter()
                        .map(|&p| {
                            let (x, y) = apply_matrix_pt(m, p);
                            [x, y]
                        })
                        .collect(),
                );
            }
            contour.clear();
        };
        let mut start = (0.0, 0.0);
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(x, y) => {
                    flush(&mut contour, &mut out);
                    start = (x, y);
                    contour.push(start);
                }
                PathSegment::LineTo(x, y) => contour.push((x, y)),
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    let p0 = contour.last().copied().unwrap_or(start);
                    contour.extend(flatten_cubic(p0, (x1, y1), (x2, y2), (x3, y3)));
                }
                PathSegment::ClosePath => {
                    flush(&mut contour, &mut out);
                    contour.push(start);
                }
            }
        }
        flush(&mut contour, &mut out);
        out
    }

    /// Open polylines of every subpath, mapped through `m`, for stroking.
    pub fn to_polylines(&self, m: Matrix) -> Vec<Vec<Point>> {
        let mut out = Vec::new();
        let mut line: Vec<Point> = Vec::new();
        let mut start = (0.0, 0.0);
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(x, y) => {
                    if line.len() > 1 {
                        out.push(std::mem::take(&mut line));
                    }
                    line.clear();
                    start = (x, y);
                    line.push(start);
                }
                PathSegment::LineTo(x, y) => line.push((x, y)),
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    let p0 = line.last().copied().unwrap_or(start);
                    line.extend(flatten_cubic(p0, (x1, y1), (x2, y2), (x3, y3)));
                }
                PathSegment::ClosePath => {
                    line.push(start);
                    if line.len() > 1 {
                        out.push(std::mem::take(&mut line));
                    }
                    line.clear();
                    line.push(start);
                }
            }
        }
        if line.len() > 1 {
            out.push(line);
        }
        out.into_iter()
            .map(|l| l.into_iter().map(|p| apply_matrix_pt(m, p)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    #[test]
    fn test_lone_moveto_is_not_a_path() {
        let mut path = GfxPath::new();
        assert!(!path.is_cur_pt());
        path.move_to(1.0, 1.0);
        path.move_to(2.0, 2.0);
        assert!(path.is_cur_pt());
        assert!(!path.is_path());
        assert_eq!(path.segments(), &[PathSegment::MoveTo(2.0, 2.0)]);
        path.line_to(3.0, 3.0);
        assert!(path.is_path());
    }

    #[test]
    fn test_close_returns_to_start() {
        let mut path = GfxPath::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.line_to(10.0, 10.0);
        path.close();
        assert_eq!(path.current_point(), Some((0.0, 0.0)));
        let polys = path.to_polygons(MATRIX_IDENTITY);
        assert_eq!(polys, vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]]);
    }
}
