//! Data shaping and geometry shared by the main drawer, the brush drawer and the zoomer.

use crate::axis::Axis;
use crate::chart_def::{ChartDefinition, DimensionKind, DisplayAxis, EmptyBinsMode, MeasureDef};
use crate::config::LinesChartConfig;
use crate::scene::{CirclePrimitive, LineKey, LineWrapper, PathPrimitive, Surface, ClipRect, TooltipTarget};
use crate::tensor::{AxisLabel, ChartTensorData, Coords};
use crate::theme::ChartTheme;
use glam::Vec2;

/// Closed x-range, in axis units (milliseconds for timelines).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn from_tuple((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn contains(&self, other: &Interval) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Overlap of both intervals, `None` when it is empty or a single point.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let overlap = Interval::new(self.min.max(other.min), self.max.min(other.max));
        (overlap.min < overlap.max).then_some(overlap)
    }
}

/// One bin of one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointDatum {
    pub x: usize,
    pub color: usize,
    pub measure: usize,
    /// The bin holds no record for this measure.
    pub filtered: bool,
}

/// One (color, measure) line with a point per x label.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSeries {
    pub key: LineKey,
    pub points: Vec<PointDatum>,
}

impl LineSeries {
    pub fn non_filtered(&self) -> impl Iterator<Item = &PointDatum> {
        self.points.iter().filter(|p| !p.filtered)
    }
}

/// Builds one line per (color label, measure) pair, every point initially filtered.
pub fn prepare_data(
    def: &ChartDefinition,
    data: &ChartTensorData,
    measure_filter: Option<&dyn Fn(&MeasureDef) -> bool>,
) -> Vec<LineSeries> {
    let x_count = data.x_labels().len();
    let color_count = data.color_labels().map_or(1, |labels| labels.len());
    let mut lines = Vec::with_capacity(color_count * def.measures.len());
    for color in 0..color_count {
        for (measure, measure_def) in def.measures.iter().enumerate() {
            if measure_filter.is_some_and(|keep| !keep(measure_def)) {
                continue;
            }
            lines.push(LineSeries {
                key: LineKey { color, measure },
                points: (0..x_count)
                    .map(|x| PointDatum {
                        x,
                        color,
                        measure,
                        filtered: true,
                    })
                    .collect(),
            });
        }
    }
    lines
}

/// Marks the point filtered when its bin holds no non-null value; returns whether it is kept.
pub fn non_zero_count_filter(point: &mut PointDatum, facet: usize, data: &ChartTensorData) -> bool {
    let coords = Coords {
        x: point.x,
        color: point.color,
        facet,
    };
    point.filtered = data.non_null_count(coords, point.measure) == 0.0;
    !point.filtered
}

/// Dashed bridges over runs of empty bins, and points left without a solid neighbour.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmptySegments {
    /// `(last point before the run, first point after the run)`.
    pub segments: Vec<(PointDatum, PointDatum)>,
    pub lonely: Vec<PointDatum>,
}

/// Scans the ordered points once for maximal runs of filtered points.
///
/// An inner run yields a segment between its two solid neighbours. A run touching the
/// start (or end) of the series yields a lonely marker on the first (or last) point
/// instead. A solid point shared by two segments is lonely too. A fully empty series
/// yields nothing.
pub fn get_empty_segments(points: &[PointDatum]) -> EmptySegments {
    let mut result = EmptySegments::default();
    if points.iter().all(|p| p.filtered) {
        return result;
    }

    let mut last_solid: Option<usize> = None;
    let mut in_run = false;
    for (i, point) in points.iter().enumerate() {
        if point.filtered {
            in_run = true;
            continue;
        }
        if in_run {
            match last_solid {
                Some(start) => result.segments.push((points[start], *point)),
                None => result.lonely.push(points[0]),
            }
            in_run = false;
        }
        last_solid = Some(i);
    }
    if in_run {
        if let Some(last) = points.last() {
            result.lonely.push(*last);
        }
    }

    for pair in result.segments.windows(2) {
        if pair[0].1 == pair[1].0 {
            result.lonely.push(pair[0].1);
        }
    }
    result
}

/// Position of a point along x, by dimension kind.
pub fn x_coord(kind: &DimensionKind, labels: &[AxisLabel], x_axis: &Axis, point: &PointDatum) -> f32 {
    let label = labels.get(point.x);
    match kind {
        DimensionKind::Timeline { .. } => x_axis.map(label.map_or(f64::NAN, |l| l.ts_value)),
        DimensionKind::BinnedNumerical {
            one_tick_per_bin: false,
        }
        | DimensionKind::UnbinnedNumerical => x_axis.map(label.map_or(f64::NAN, |l| l.sort_value)),
        // Band scales map an index to the middle of its band.
        _ => x_axis.map(point.x as f64),
    }
}

/// Everything needed to place a point on screen for one facet.
#[derive(Clone, Copy)]
pub struct CoordContext<'a> {
    pub def: &'a ChartDefinition,
    pub data: &'a ChartTensorData,
    pub facet: usize,
    pub x_axis: &'a Axis,
    pub y_axis: Option<&'a Axis>,
    pub y2_axis: Option<&'a Axis>,
}

impl<'a> CoordContext<'a> {
    pub fn x(&self, point: &PointDatum) -> f32 {
        x_coord(&self.def.x_dimension.kind, self.data.x_labels(), self.x_axis, point)
    }

    /// Zero values are mapped to 1 on a log-scaled axis 1.
    pub fn y(&self, point: &PointDatum) -> f32 {
        let coords = Coords {
            x: point.x,
            color: point.color,
            facet: self.facet,
        };
        let mut value = self.data.aggr(point.measure, coords);
        if self.def.axis1_log_scale && value == 0.0 {
            value = 1.0;
        }
        let axis = match self.def.measure_axis(point.measure) {
            DisplayAxis::Axis1 => self.y_axis.or(self.y2_axis),
            DisplayAxis::Axis2 => self.y2_axis.or(self.y_axis),
        };
        axis.map_or(0.0, |a| a.map(value))
    }

    pub fn point(&self, point: &PointDatum) -> Vec2 {
        Vec2::new(self.x(point), self.y(point))
    }
}

/// Path generator: which points are part of the line, and how they are joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineGenerator {
    /// Empty bins are part of the line (`ZEROS` mode).
    pub connect_empty_bins: bool,
    /// Monotone cubic interpolation instead of straight segments.
    pub smoothing: bool,
}

const SMOOTHING_STEPS: usize = 8;

impl LineGenerator {
    pub fn new(def: &ChartDefinition) -> Self {
        Self {
            connect_empty_bins: def.empty_bins_mode() == EmptyBinsMode::Zeros,
            smoothing: def.smoothing,
        }
    }

    pub fn is_defined(&self, point: &PointDatum) -> bool {
        self.connect_empty_bins || !point.filtered
    }

    /// Subpaths made of consecutive defined points.
    pub fn generate(&self, points: &[PointDatum], coord: impl Fn(&PointDatum) -> Vec2) -> Vec<Vec<Vec2>> {
        let mut subpaths = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        for point in points {
            if self.is_defined(point) {
                current.push(coord(point));
            } else if !current.is_empty() {
                subpaths.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            subpaths.push(current);
        }
        if self.smoothing {
            subpaths.iter().map(|s| monotone(s)).collect()
        } else {
            subpaths
        }
    }
}

/// Fritsch-Carlson monotone cubic interpolation, sampled into a polyline.
fn monotone(points: &[Vec2]) -> Vec<Vec2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let slopes: Vec<f32> = points
        .windows(2)
        .map(|w| {
            let dx = w[1].x - w[0].x;
            if dx.abs() <= f32::EPSILON {
                0.0
            } else {
                (w[1].y - w[0].y) / dx
            }
        })
        .collect();

    let mut tangents = vec![0.0f32; n];
    tangents[0] = slopes[0];
    tangents[n - 1] = slopes[n - 2];
    for i in 1..n - 1 {
        tangents[i] = (slopes[i - 1] + slopes[i]) / 2.0;
    }
    for i in 0..n - 1 {
        if slopes[i] == 0.0 {
            tangents[i] = 0.0;
            tangents[i + 1] = 0.0;
            continue;
        }
        let a = tangents[i] / slopes[i];
        let b = tangents[i + 1] / slopes[i];
        let s = a * a + b * b;
        if s > 9.0 {
            let t = 3.0 / s.sqrt();
            tangents[i] = t * a * slopes[i];
            tangents[i + 1] = t * b * slopes[i];
        }
    }

    let mut out = Vec::with_capacity((n - 1) * SMOOTHING_STEPS + 1);
    out.push(points[0]);
    for i in 0..n - 1 {
        let (p0, p1) = (points[i], points[i + 1]);
        let h = p1.x - p0.x;
        for step in 1..=SMOOTHING_STEPS {
            let t = step as f32 / SMOOTHING_STEPS as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            let y = h00 * p0.y + h10 * h * tangents[i] + h01 * p1.y + h11 * h * tangents[i + 1];
            out.push(Vec2::new(p0.x + h * t, y));
        }
    }
    out
}

/// Coordinate context plus styling, for one facet surface.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub coords: CoordContext<'a>,
    pub theme: &'a ChartTheme,
    pub config: &'a LinesChartConfig,
}

impl<'a> DrawContext<'a> {
    fn empty_bins_mode(&self) -> EmptyBinsMode {
        self.coords.def.empty_bins_mode()
    }
}

/// Geometry computed for one line before it is written to the surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineGeometry {
    pub key: Option<LineKey>,
    pub main: Vec<Vec<Vec2>>,
    pub dashed: Vec<Vec<Vec2>>,
}

/// Creates one wrapper per line on fresh draws and drops wrappers of vanished lines.
/// Interactive redraws keep the existing wrappers untouched.
pub fn draw_wrappers(
    ctx: &DrawContext<'_>,
    surface: &mut Surface,
    lines: &[LineSeries],
    redraw: bool,
    register_tooltips: bool,
) {
    if redraw {
        return;
    }
    let def = ctx.coords.def;
    for line in lines {
        let color = ctx.theme.line_color(def.color_index(line.key.color, line.key.measure));
        let wrapper = surface.upsert_wrapper(line.key, || {
            LineWrapper::new(line.key, color, def.color_transparency)
        });
        wrapper.color = color;
        wrapper.opacity = def.color_transparency;
        wrapper.tooltip = register_tooltips.then_some(TooltipTarget {
            measure: line.key.measure,
            x: None,
            color: line.key.color,
            facet: ctx.coords.facet,
        });
    }
    let keys: Vec<LineKey> = lines.iter().map(|l| l.key).collect();
    surface.retain_wrappers(&keys);
}

/// Places one masked circle per point (every point in `ZEROS` mode, non-empty bins
/// otherwise), keyed by x index. Lonely circles are dropped; `draw_path` recreates them.
pub fn draw_points(
    ctx: &DrawContext<'_>,
    surface: &mut Surface,
    lines: &mut [LineSeries],
    radius: f32,
    register_tooltips: bool,
) {
    let zeros = ctx.empty_bins_mode() == EmptyBinsMode::Zeros;
    for line in lines.iter_mut() {
        for point in line.points.iter_mut() {
            non_zero_count_filter(point, ctx.coords.facet, ctx.coords.data);
        }
        let Some(wrapper) = surface.wrapper_mut(line.key) else {
            continue;
        };
        let previous = std::mem::take(&mut wrapper.points);
        let mut created = 0;
        for point in line.points.iter().filter(|p| zeros || !p.filtered) {
            let center = ctx.coords.point(point);
            let circle = match previous.iter().find(|c| c.x_index == point.x) {
                Some(existing) => CirclePrimitive {
                    center,
                    ..existing.clone()
                },
                None => {
                    created += 1;
                    CirclePrimitive {
                        x_index: point.x,
                        center,
                        radius,
                        opacity: 0.0,
                        tooltip: None,
                    }
                }
            };
            let tooltip = register_tooltips.then_some(TooltipTarget {
                measure: point.measure,
                x: Some(point.x),
                color: point.color,
                facet: ctx.coords.facet,
            });
            wrapper.points.push(CirclePrimitive { tooltip, ..circle });
        }
        wrapper.lonely.clear();
        surface.stats.points_created += created;
    }
}

/// Refreshes filtered flags and computes the main and dashed geometry of every line.
/// Reuses `generator` when given so interactive redraws keep the same path settings.
pub fn configure_lines(
    ctx: &DrawContext<'_>,
    lines: &mut [LineSeries],
    generator: Option<LineGenerator>,
) -> (LineGenerator, Vec<LineGeometry>) {
    let generator = generator.unwrap_or_else(|| LineGenerator::new(ctx.coords.def));
    let mode = ctx.empty_bins_mode();
    let coords = ctx.coords;

    let geometries = lines
        .iter_mut()
        .map(|line| {
            for point in line.points.iter_mut() {
                non_zero_count_filter(point, coords.facet, coords.data);
            }
            let main = match mode {
                EmptyBinsMode::Zeros | EmptyBinsMode::Dashed => {
                    generator.generate(&line.points, |p| coords.point(p))
                }
                EmptyBinsMode::Omit => {
                    let kept: Vec<PointDatum> = line.non_filtered().copied().collect();
                    generator.generate(&kept, |p| coords.point(p))
                }
            };
            let dashed = if mode == EmptyBinsMode::Dashed {
                get_empty_segments(&line.points)
                    .segments
                    .iter()
                    .map(|(a, b)| vec![coords.point(a), coords.point(b)])
                    .collect()
            } else {
                Vec::new()
            };
            LineGeometry {
                key: Some(line.key),
                main,
                dashed,
            }
        })
        .collect();
    (generator, geometries)
}

/// Writes the visible, dashed and invisible hover paths of every line, then its lonely points.
pub fn draw_paths(
    ctx: &DrawContext<'_>,
    surface: &mut Surface,
    lines: &[LineSeries],
    geometries: Vec<LineGeometry>,
    redraw: bool,
    stroke_width: f32,
    with_hit_paths: bool,
) {
    let hit_width = ctx.config.hit_stroke_width;
    let dash = ctx.config.dash_length;
    for (line, geometry) in lines.iter().zip(geometries) {
        let Some(wrapper) = surface.wrapper_mut(line.key) else {
            continue;
        };
        let width = if wrapper.emphasized {
            stroke_width + 1.0
        } else {
            stroke_width
        };
        if with_hit_paths {
            wrapper.hit_line = PathPrimitive {
                subpaths: geometry.main.clone(),
                stroke_width: hit_width,
                dash: None,
                visible: false,
            };
            wrapper.hit_dashed = PathPrimitive {
                subpaths: geometry.dashed.clone(),
                stroke_width: hit_width,
                dash: None,
                visible: false,
            };
        }
        wrapper.line = PathPrimitive {
            subpaths: geometry.main,
            stroke_width: width,
            dash: None,
            visible: true,
        };
        wrapper.dashed = PathPrimitive {
            subpaths: geometry.dashed,
            stroke_width,
            dash: Some(dash),
            visible: true,
        };
        draw_path(ctx, wrapper, line, redraw);
    }
}

/// Points that no solid segment reaches get an explicit circle: the only non-empty
/// point of a line, and in `DASHED` mode the ends of dashed runs without a solid neighbour.
pub fn draw_path(ctx: &DrawContext<'_>, wrapper: &mut LineWrapper, line: &LineSeries, redraw: bool) {
    let mode = ctx.empty_bins_mode();
    let kept: Vec<&PointDatum> = line.non_filtered().collect();

    let mut lonely: Vec<PointDatum> = Vec::new();
    if let [only] = kept.as_slice() {
        lonely.push(**only);
    }
    if mode == EmptyBinsMode::Dashed && !redraw && kept.len() > 1 {
        for point in get_empty_segments(&line.points).lonely {
            if !lonely.iter().any(|p| p.x == point.x) {
                lonely.push(point);
            }
        }
    }

    let radius = if mode == EmptyBinsMode::Dashed {
        ctx.config.dashed_lonely_point_radius
    } else {
        ctx.config.lonely_point_radius
    };
    wrapper.lonely = lonely
        .iter()
        .map(|p| CirclePrimitive {
            x_index: p.x,
            center: ctx.coords.point(p),
            radius,
            opacity: 1.0,
            tooltip: None,
        })
        .collect();
}

/// Clips every wrapper to the plot area, with extra room above for smoothed curves.
pub fn clip_paths(surface: &mut Surface, margin: f32) {
    surface.clip = Some(ClipRect {
        y: -margin,
        width: surface.width,
        height: surface.height + margin,
    });
    let keys: Vec<LineKey> = surface.wrappers().iter().map(|w| w.key).collect();
    for key in keys {
        if let Some(wrapper) = surface.wrapper_mut(key) {
            wrapper.clipped = true;
        }
    }
}
