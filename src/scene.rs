//! Retained-mode drawing surface the drawers write into and the painter reads from.
//!
//! Line wrappers are keyed by `(color, measure)` so interactive redraws update
//! geometry in place instead of recreating primitives.

use glam::Vec2;
use gpui::Hsla;

/// Identity of one line: a (color label, measure) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    pub color: usize,
    pub measure: usize,
}

/// Cell the host tooltip should describe when a primitive is hovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TooltipTarget {
    pub measure: usize,
    pub x: Option<usize>,
    pub color: usize,
    pub facet: usize,
}

/// A stroked polyline made of disconnected subpaths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathPrimitive {
    pub subpaths: Vec<Vec<Vec2>>,
    pub stroke_width: f32,
    /// Dash length; solid when `None`.
    pub dash: Option<f32>,
    /// Invisible paths only serve as hover targets.
    pub visible: bool,
}

impl PathPrimitive {
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.len() < 2)
    }

    /// Shortest distance from `p` to any segment of the path.
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let mut best = f32::INFINITY;
        for subpath in &self.subpaths {
            if let [single] = subpath.as_slice() {
                best = best.min(single.distance(p));
            }
            for w in subpath.windows(2) {
                best = best.min(segment_distance(p, w[0], w[1]));
            }
        }
        best
    }
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CirclePrimitive {
    /// Index of the x label the circle stands for; circles are keyed by it.
    pub x_index: usize,
    pub center: Vec2,
    pub radius: f32,
    pub opacity: f32,
    pub tooltip: Option<TooltipTarget>,
}

/// Group holding everything drawn for one line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineWrapper {
    pub key: LineKey,
    pub color: Hsla,
    pub opacity: f32,
    pub tooltip: Option<TooltipTarget>,
    pub line: PathPrimitive,
    pub hit_line: PathPrimitive,
    pub dashed: PathPrimitive,
    pub hit_dashed: PathPrimitive,
    pub points: Vec<CirclePrimitive>,
    pub lonely: Vec<CirclePrimitive>,
    pub clipped: bool,
    pub emphasized: bool,
}

impl LineWrapper {
    pub fn new(key: LineKey, color: Hsla, opacity: f32) -> Self {
        Self {
            key,
            color,
            opacity,
            tooltip: None,
            line: PathPrimitive::default(),
            hit_line: PathPrimitive::default(),
            dashed: PathPrimitive::default(),
            hit_dashed: PathPrimitive::default(),
            points: Vec::new(),
            lonely: Vec::new(),
            clipped: false,
            emphasized: false,
        }
    }

    fn hit_distance(&self, p: Vec2) -> f32 {
        self.hit_line.distance_to(p).min(self.hit_dashed.distance_to(p))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HLine {
    pub value: f64,
    pub y: f32,
}

/// Horizontal band shading a part of the x range with no data at the current aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MissingArea {
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

impl MissingArea {
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRect {
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Counters of primitive churn, used to check that interactive redraws reuse primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub wrappers_created: usize,
    pub wrappers_updated: usize,
    pub points_created: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    wrappers: Vec<LineWrapper>,
    pub clip: Option<ClipRect>,
    pub hlines: Vec<HLine>,
    /// Vertical offset of the x axis domain line, non-zero when y = 0 is not at the bottom.
    pub x_domain_offset: f32,
    pub left_missing: MissingArea,
    pub right_missing: MissingArea,
    pub stats: SurfaceStats,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn wrappers(&self) -> &[LineWrapper] {
        &self.wrappers
    }

    pub fn wrapper(&self, key: LineKey) -> Option<&LineWrapper> {
        self.wrappers.iter().find(|w| w.key == key)
    }

    pub fn wrapper_mut(&mut self, key: LineKey) -> Option<&mut LineWrapper> {
        self.wrappers.iter_mut().find(|w| w.key == key)
    }

    /// Returns the wrapper for `key`, creating it with `create` when absent.
    pub fn upsert_wrapper(&mut self, key: LineKey, create: impl FnOnce() -> LineWrapper) -> &mut LineWrapper {
        match self.wrappers.iter().position(|w| w.key == key) {
            Some(idx) => {
                self.stats.wrappers_updated += 1;
                &mut self.wrappers[idx]
            }
            None => {
                self.stats.wrappers_created += 1;
                self.wrappers.push(create());
                let last = self.wrappers.len() - 1;
                &mut self.wrappers[last]
            }
        }
    }

    /// Drops wrappers whose key is not in `keys`.
    pub fn retain_wrappers(&mut self, keys: &[LineKey]) {
        self.wrappers.retain(|w| keys.contains(&w.key));
    }

    pub fn clear(&mut self) {
        self.wrappers.clear();
        self.hlines.clear();
        self.clip = None;
        self.x_domain_offset = 0.0;
        self.clear_missing_areas();
    }

    pub fn clear_missing_areas(&mut self) {
        self.left_missing = MissingArea::default();
        self.right_missing = MissingArea::default();
    }

    /// Line whose hover path lies under `p`, topmost first.
    pub fn hit_test(&self, p: Vec2) -> Option<LineKey> {
        self.wrappers
            .iter()
            .rev()
            .find(|w| {
                let reach = w.hit_line.stroke_width.max(w.hit_dashed.stroke_width) / 2.0;
                w.hit_distance(p) <= reach
            })
            .map(|w| w.key)
    }

    /// Emphasizes the hovered line: thicker stroke, points revealed, drawn on top.
    pub fn set_hover(&mut self, hovered: Option<LineKey>, base_stroke_width: f32) {
        for wrapper in &mut self.wrappers {
            let emphasized = Some(wrapper.key) == hovered;
            if wrapper.emphasized == emphasized {
                continue;
            }
            wrapper.emphasized = emphasized;
            wrapper.line.stroke_width = if emphasized {
                base_stroke_width + 1.0
            } else {
                base_stroke_width
            };
            let opacity = if emphasized { 1.0 } else { 0.0 };
            for point in &mut wrapper.points {
                point.opacity = opacity;
            }
        }
        if let Some(idx) = hovered.and_then(|k| self.wrappers.iter().position(|w| w.key == k)) {
            let wrapper = self.wrappers.remove(idx);
            self.wrappers.push(wrapper);
        }
    }

    pub fn hovered(&self) -> Option<LineKey> {
        self.wrappers.iter().find(|w| w.emphasized).map(|w| w.key)
    }
}
