//! An ordered set of identified colors edited together.
//!
//! Handles: per-id colors, space/alpha constraints, component-wise edits,
//! averages, and change notification with grab/release and blocking.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::colors::color::Color;
use crate::colors::components::{Component, Components};
use crate::colors::space::AnySpace;
use crate::error::{ColorError, ColorResult};

/// Id used by the single-color helpers.
const SINGLE: &str = "single";

/// Notifications sent to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSetEvent {
    Changed,
    Grabbed,
    Released,
    Cleared,
}

/// Handle returned by [`ColorSet::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

type Observer = Box<dyn FnMut(ColorSetEvent) + Send>;

#[derive(Default)]
pub struct ColorSet {
    colors: Vec<(String, Color)>,
    space_constraint: Option<Arc<AnySpace>>,
    alpha_constraint: Option<bool>,
    grabbed: bool,
    blocked: bool,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: usize,
}

impl std::fmt::Debug for ColorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorSet")
            .field("colors", &self.colors)
            .field("space_constraint", &self.space_constraint)
            .field("alpha_constraint", &self.alpha_constraint)
            .field("grabbed", &self.grabbed)
            .finish()
    }
}

impl ColorSet {
    /// Set whose new entries are converted into `space` and forced to have
    /// (or lack) opacity according to `alpha`.
    pub fn new(space: Option<Arc<AnySpace>>, alpha: Option<bool>) -> Self {
        Self {
            space_constraint: space,
            alpha_constraint: alpha,
            ..Self::default()
        }
    }

    pub fn connect(&mut self, observer: impl FnMut(ColorSetEvent) + Send + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        before != self.observers.len()
    }

    fn emit(&mut self, event: ColorSetEvent) {
        if self.blocked {
            return;
        }
        self.blocked = true;
        for (_, observer) in &mut self.observers {
            observer(event);
        }
        self.blocked = false;
    }

    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Starts an interactive edit.
    pub fn grab(&mut self) {
        if !self.blocked && !self.grabbed {
            self.emit(ColorSetEvent::Grabbed);
            self.grabbed = true;
        }
    }

    pub fn release(&mut self) {
        if !self.blocked && self.grabbed {
            self.grabbed = false;
            self.emit(ColorSetEvent::Released);
        }
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn space_constraint(&self) -> Option<&Arc<AnySpace>> {
        self.space_constraint.as_ref()
    }

    pub fn alpha_constraint(&self) -> Option<bool> {
        self.alpha_constraint
    }

    /// Components of the constraining space.
    pub fn components(&self) -> ColorResult<&'static Components> {
        match &self.space_constraint {
            Some(space) => Ok(space.components(self.alpha_constraint.unwrap_or(false))),
            None => Err(ColorError::new(
                "Components are only available on a color space constrained ColorSet.",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Color)> {
        self.colors.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn clear(&mut self) {
        if !self.colors.is_empty() {
            self.colors.clear();
            self.emit(ColorSetEvent::Cleared);
        }
    }

    /// True when every color equals the first one.
    pub fn is_same(&self) -> bool {
        match self.colors.first() {
            Some((_, first)) => self.colors.iter().all(|(_, c)| c == first),
            None => true,
        }
    }

    fn set_inner(&mut self, id: &str, other: &Color) -> bool {
        if let Some((_, color)) = self.colors.iter_mut().find(|(cid, _)| cid == id) {
            let was = color.clone();
            color.set_color(other, true);
            return was != *color;
        }
        let mut copy = other.clone();
        if let Some(space) = &self.space_constraint {
            copy.convert_space(space.clone());
        }
        if let Some(alpha) = self.alpha_constraint {
            copy.enable_opacity(alpha);
        }
        self.colors.push((id.to_string(), copy));
        true
    }

    /// Sets the color for `id`. Existing entries keep their space.
    pub fn set(&mut self, id: &str, other: &Color) -> bool {
        if self.set_inner(id, other) {
            self.emit(ColorSetEvent::Changed);
            return true;
        }
        false
    }

    /// Replaces the set by one color.
    pub fn set_single(&mut self, other: &Color) -> bool {
        if self.colors.len() != 1 || self.colors[0].0 != SINGLE {
            self.colors.clear();
        }
        self.set(SINGLE, other)
    }

    pub fn get_single(&self) -> Option<Color> {
        self.get(SINGLE)
    }

    /// Normalized copy of the color for `id`.
    pub fn get(&self, id: &str) -> Option<Color> {
        self.colors
            .iter()
            .find(|(cid, _)| cid == id)
            .map(|(_, c)| c.normalized())
    }

    /// Sets every entry to `other`, each keeping its space.
    pub fn set_all(&mut self, other: &Color) -> usize {
        let mut changed = 0;
        for (_, color) in &mut self.colors {
            let was = color.clone();
            color.set_color(other, true);
            changed += usize::from(was != *color);
        }
        if changed > 0 {
            self.emit(ColorSetEvent::Changed);
        }
        changed
    }

    /// Copies every entry of `other` by id.
    pub fn set_all_from(&mut self, other: &ColorSet) -> usize {
        let mut changed = 0;
        for (id, color) in &other.colors {
            changed += usize::from(self.set_inner(id, color));
        }
        if changed > 0 {
            self.emit(ColorSetEvent::Changed);
        }
        changed
    }

    fn is_valid(&self, component: &Component) -> bool {
        self.space_constraint
            .as_ref()
            .is_some_and(|s| s.component_type() == component.space)
    }

    fn check(&self, component: &Component, op: &str) -> ColorResult<()> {
        if self.is_valid(component) {
            Ok(())
        } else {
            Err(ColorError::new(format!(
                "Incompatible color component used in ColorSet::{op}."
            )))
        }
    }

    /// Sets one component on every entry.
    pub fn set_all_component(&mut self, component: &Component, value: f64) -> ColorResult<usize> {
        self.check(component, "set")?;
        let mut changed = 0;
        for (_, color) in &mut self.colors {
            let was = color.clone();
            color.set(component.index, value);
            changed += usize::from(was != *color);
        }
        if changed > 0 {
            self.emit(ColorSetEvent::Changed);
        }
        Ok(changed)
    }

    /// Moves every entry so the component average becomes `value`.
    pub fn set_average(&mut self, component: &Component, value: f64) -> ColorResult<()> {
        self.check(component, "set_average")?;
        let delta = value - self.get_average_component(component)?;
        for (_, color) in &mut self.colors {
            let current = color[component.index];
            color.set(component.index, current + delta);
        }
        self.emit(ColorSetEvent::Changed);
        Ok(())
    }

    pub fn get_average_component(&self, component: &Component) -> ColorResult<f64> {
        self.check(component, "get")?;
        let sum: f64 = self.colors.iter().map(|(_, c)| c[component.index]).sum();
        Ok(component.normalize(sum / self.colors.len() as f64))
    }

    pub fn get_all_component(&self, component: &Component) -> ColorResult<Vec<f64>> {
        self.check(component, "get_all")?;
        Ok(self
            .colors
            .iter()
            .map(|(_, c)| component.normalize(c[component.index]))
            .collect())
    }

    /// The constraining space, or the most common space in the set.
    pub fn get_best_space(&self) -> Option<Arc<AnySpace>> {
        if let Some(space) = &self.space_constraint {
            return Some(space.clone());
        }
        let mut counts: IndexMap<&str, (usize, &Arc<AnySpace>)> = IndexMap::new();
        let mut best: Option<(usize, &Arc<AnySpace>)> = None;
        for (_, color) in &self.colors {
            let entry = counts.entry(color.space().name()).or_insert((0, color.space()));
            entry.0 += 1;
            if best.is_none_or(|(n, _)| entry.0 > n) {
                best = Some(*entry);
            }
        }
        best.map(|(_, s)| s.clone())
    }

    /// Average of all entries in the best space.
    pub fn get_average(&self) -> ColorResult<Color> {
        let space = self
            .get_best_space()
            .filter(|_| !self.colors.is_empty())
            .ok_or_else(|| ColorError::new("Can't get the average color of no colors."))?;
        let alpha = self.alpha_constraint.unwrap_or(true);
        let mut values = vec![0.0; space.component_count() + usize::from(alpha)];
        for (_, color) in &self.colors {
            let converted;
            let source = if **color.space() == *space {
                color
            } else if let Some(copy) = color.converted_space(space.clone()) {
                converted = copy;
                &converted
            } else {
                continue;
            };
            for (i, v) in values.iter_mut().enumerate() {
                *v += source[i];
            }
        }
        let n = self.colors.len() as f64;
        values.iter_mut().for_each(|v| *v /= n);
        Ok(Color::new(space, values))
    }
}
