//! Clip history mirroring the `q`/`Q` stack.
//!
//! Entries live in an arena and point at the entry they were saved from.
//! A freshly saved entry starts as a copy of its parent; the first clip set
//! on it replaces the copy, later clips at the same level intersect.
//!
//! An empty path means "no clip" and is the identity for intersection.

use i_overlay::core::fill_rule::FillRule as OverlayFill;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use serde::{Deserialize, Serialize};

use crate::model::GfxState;

/// Polygon contours in device space.
pub type ClipPath = Vec<Vec<[f64; 2]>>;

/// Winding rule of a clip or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl From<FillRule> for OverlayFill {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => OverlayFill::NonZero,
            FillRule::EvenOdd => OverlayFill::EvenOdd,
        }
    }
}

#[derive(Debug, Clone)]
struct ClipEntry {
    path: ClipPath,
    rule: FillRule,
    /// Still a verbatim copy of the parent.
    copied: bool,
    saved: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ClipHistory {
    entries: Vec<ClipEntry>,
    top: usize,
}

impl Default for ClipHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipHistory {
    pub fn new() -> Self {
        Self {
            entries: vec![ClipEntry {
                path: Vec::new(),
                rule: FillRule::NonZero,
                copied: false,
                saved: None,
            }],
            top: 0,
        }
    }

    /// Pushes a copy of the current entry.
    pub fn save(&mut self) {
        let current = &self.entries[self.top];
        let entry = ClipEntry {
            path: current.path.clone(),
            rule: current.rule,
            copied: true,
            saved: Some(self.top),
        };
        // Restored entries are always the last ones, so the arena stays a stack.
        self.entries.truncate(self.top + 1);
        self.entries.push(entry);
        self.top = self.entries.len() - 1;
    }

    /// Drops the current entry; restoring the bottom entry does nothing.
    pub fn restore(&mut self) {
        if let Some(saved) = self.entries[self.top].saved {
            self.entries.truncate(self.top);
            self.top = saved;
        }
    }

    pub fn set_clip(&mut self, path: ClipPath, rule: FillRule) {
        let entry = &mut self.entries[self.top];
        if entry.copied {
            entry.path = path;
        } else {
            entry.path = maybe_intersect(&entry.path, &path, entry.rule, rule);
        }
        entry.rule = rule;
        entry.copied = false;
    }

    /// Clips to the state's current path mapped through its CTM.
    pub fn set_clip_from_state(&mut self, state: &GfxState, rule: FillRule) {
        self.set_clip(state.path.to_polygons(state.ctm), rule);
    }

    /// Clips to the outline of the state's path stroked with its line width.
    pub fn set_stroke_clip_from_state(&mut self, state: &GfxState) {
        self.set_clip(stroke_outline(state), FillRule::NonZero);
    }

    /// Clip path of the current level only.
    pub fn clip_path(&self) -> &ClipPath {
        &self.entries[self.top].path
    }

    pub fn fill_rule(&self) -> FillRule {
        self.entries[self.top].rule
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut i = self.top;
        while let Some(parent) = self.entries[i].saved {
            depth += 1;
            i = parent;
        }
        depth
    }

    /// Intersection of the current entry with all of its ancestors.
    pub fn flattened(&self) -> ClipPath {
        self.flattened_at(self.top)
    }

    fn flattened_at(&self, index: usize) -> ClipPath {
        let entry = &self.entries[index];
        match entry.saved {
            None => entry.path.clone(),
            Some(parent) => {
                let parent_rule = self.entries[parent].rule;
                maybe_intersect(
                    &entry.path,
                    &self.flattened_at(parent),
                    entry.rule,
                    parent_rule,
                )
            }
        }
    }
}

/// Intersects two clip paths, each under its own winding rule.
///
/// An empty operand leaves the other one untouched.
pub fn maybe_intersect(v1: &ClipPath, v2: &ClipPath, fill1: FillRule, fill2: FillRule) -> ClipPath {
    if v1.is_empty() {
        return v2.clone();
    }
    if v2.is_empty() {
        return v1.clone();
    }
    let a = simplify(v1, fill1);
    let b = simplify(v2, fill2);
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    flatten_shapes(a.overlay(&b, OverlayRule::Intersect, OverlayFill::EvenOdd))
}

/// Resolves self-overlaps of `path` under `rule` into plain contours.
fn simplify(path: &ClipPath, rule: FillRule) -> ClipPath {
    let empty: ClipPath = Vec::new();
    flatten_shapes(path.overlay(&empty, OverlayRule::Subject, rule.into()))
}

fn flatten_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> ClipPath {
    shapes.into_iter().flatten().collect()
}

/// Union of one quad per stroked segment, in device space.
fn stroke_outline(state: &GfxState) -> ClipPath {
    let half = state.transformed_line_width() / 2.0;
    let mut quads: ClipPath = Vec::new();
    for line in state.path.to_polylines(state.ctm) {
        for seg in line.windows(2) {
            let ((x0, y0), (x1, y1)) = (seg[0], seg[1]);
            let len = (x1 - x0).hypot(y1 - y0);
            if len <= f64::EPSILON {
                continue;
            }
            let (nx, ny) = (-(y1 - y0) / len * half, (x1 - x0) / len * half);
            quads.push(vec![
                [x0 + nx, y0 + ny],
                [x1 + nx, y1 + ny],
                [x1 - nx, y1 - ny],
                [x0 - nx, y0 - ny],
            ]);
        }
    }
    if quads.is_empty() {
        return quads;
    }
    simplify(&quads, FillRule::NonZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> ClipPath {
        vec![vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]]
    }

    fn area(path: &ClipPath) -> f64 {
        path.iter()
            .map(|c| {
                let n = c.len();
                (0..n)
                    .map(|i| {
                        let (p, q) = (c[i], c[(i + 1) % n]);
                        p[0] * q[1] - q[0] * p[1]
                    })
                    .sum::<f64>()
                    / 2.0
            })
            .sum::<f64>()
            .abs()
    }

    #[test]
    fn test_first_clip_replaces_copy() {
        let mut clip = ClipHistory::new();
        clip.set_clip(rect(0.0, 0.0, 10.0, 10.0), FillRule::NonZero);
        clip.save();
        clip.set_clip(rect(20.0, 20.0, 30.0, 30.0), FillRule::NonZero);
        assert_eq!(clip.clip_path(), &rect(20.0, 20.0, 30.0, 30.0));
        assert_eq!(clip.depth(), 1);
    }

    #[test]
    fn test_second_clip_intersects() {
        let mut clip = ClipHistory::new();
        clip.save();
        clip.set_clip(rect(0.0, 0.0, 10.0, 10.0), FillRule::NonZero);
        clip.set_clip(rect(5.0, 5.0, 15.0, 15.0), FillRule::EvenOdd);
        assert!((area(clip.clip_path()) - 25.0).abs() < 1e-6);
        assert_eq!(clip.fill_rule(), FillRule::EvenOdd);
    }

    #[test]
    fn test_restore_bottom_is_noop() {
        let mut clip = ClipHistory::new();
        clip.set_clip(rect(0.0, 0.0, 1.0, 1.0), FillRule::NonZero);
        clip.restore();
        assert_eq!(clip.depth(), 0);
        assert_eq!(clip.clip_path(), &rect(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_stroke_outline_has_width() {
        let mut state = GfxState::default();
        state.line_width = 2.0;
        state.path.move_to(0.0, 0.0);
        state.path.line_to(10.0, 0.0);
        let outline = stroke_outline(&state);
        assert!((area(&outline) - 20.0).abs() < 1e-6);
    }
}
