//! Per-mount rendering context and the two line drawers.

use crate::axis::{Axis, TickFormat};
use crate::chart_def::{ChartDefinition, DisplayAxis};
use crate::config::LinesChartConfig;
use crate::lines_utils::{
    clip_paths, configure_lines, draw_paths, draw_points, draw_wrappers, prepare_data, CoordContext,
    DrawContext, Interval, LineGenerator,
};
use crate::scales::ChartScale;
use crate::scene::{HLine, MissingArea, Surface};
use crate::tensor::{ChartTensorData, Extent, MeasureExtents};
use crate::theme::ChartTheme;
use crate::utils::date_formatter::DateDisplayUnit;
use tracing::debug;

/// Pixel size of the plot area and of the brush strip below it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartViewport {
    pub width: f32,
    pub height: f32,
    pub brush_height: f32,
}

impl ChartViewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            brush_height: 40.0,
        }
    }
}

/// State kept between the draws of one facet.
#[derive(Clone, Debug, Default)]
pub struct DrawCache {
    pub line_generator: Option<LineGenerator>,
    pub points_removed: bool,
}

#[derive(Clone, Debug)]
pub struct FacetSurface {
    pub label: Option<String>,
    pub surface: Surface,
    pub cache: DrawCache,
}

/// Applies `include_zero` to a value extent. `None` for a non-finite extent.
pub fn y_domain(extent: &Extent, include_zero: bool) -> Option<(f64, f64)> {
    if !extent.is_finite() {
        return None;
    }
    let (mut min, mut max) = extent.as_tuple();
    if include_zero {
        if min > 0.0 {
            min = 0.0;
        }
        if max < 0.0 {
            max = 0.0;
        }
    }
    Some((min, max))
}

/// Each y axis in use has a finite, non-degenerate extent.
pub fn has_valid_y_extents(def: &ChartDefinition, y1: &Extent, y2: &Extent) -> bool {
    let valid = |axis: DisplayAxis, extent: &Extent| {
        !def.has_axis(axis) || (extent.is_finite() && extent.min != extent.max)
    };
    valid(DisplayAxis::Axis1, y1) && valid(DisplayAxis::Axis2, y2)
}

/// Builds the x axis over `range_width` pixels and the y axes over `height` pixels.
fn build_axes(
    def: &ChartDefinition,
    data: &ChartTensorData,
    extents: &MeasureExtents,
    range_width: f32,
    height: f32,
    config: &LinesChartConfig,
) -> (Axis, Option<Axis>, Option<Axis>) {
    let kind = &def.x_dimension.kind;
    let x_axis = if kind.is_continuous() {
        let domain = data.x_extent(kind.is_timeline()).unwrap_or((0.0, 1.0));
        let format = if kind.is_timeline() {
            TickFormat::Time {
                unit: DateDisplayUnit::Default,
                tz: config.tz_or_utc(),
            }
        } else {
            TickFormat::Numeric
        };
        let mut axis = Axis::new(
            ChartScale::new_linear(domain, (0.0, range_width)),
            config.x_tick_count,
            format,
            def.x_dimension.column.clone(),
        );
        axis.update_time_format();
        axis
    } else {
        let names = data.x_labels().iter().map(|l| l.label.clone()).collect();
        Axis::new(
            ChartScale::new_band(data.x_labels().len(), (0.0, range_width)),
            config.x_tick_count,
            TickFormat::Category(names),
            def.x_dimension.column.clone(),
        )
    };

    let y_axis_for = |axis: DisplayAxis, extent: &Extent, log: bool| -> Option<Axis> {
        if !def.has_axis(axis) {
            return None;
        }
        let domain = y_domain(extent, def.include_zero).unwrap_or((0.0, 1.0));
        let scale = if log {
            ChartScale::new_log(domain, (height, 0.0))
        } else {
            ChartScale::new_linear(domain, (height, 0.0))
        };
        let format = if extent.only_percent {
            TickFormat::Percent
        } else {
            TickFormat::Numeric
        };
        let title = def
            .measures
            .iter()
            .filter(|m| m.display_axis == axis)
            .map(|m| m.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Some(Axis::new(scale, config.y_tick_count, format, title))
    };

    let y_axis = y_axis_for(DisplayAxis::Axis1, &extents.y1, def.axis1_log_scale);
    let y2_axis = y_axis_for(DisplayAxis::Axis2, &extents.y2, false);
    (x_axis, y_axis, y2_axis)
}

/// Everything one mount of the chart draws into.
#[derive(Clone, Debug)]
pub struct ChartFrame {
    pub def: ChartDefinition,
    pub data: ChartTensorData,
    pub x_axis: Axis,
    pub y_axis: Option<Axis>,
    pub y2_axis: Option<Axis>,
    pub facets: Vec<FacetSurface>,
    pub theme: ChartTheme,
    pub config: LinesChartConfig,
    pub interactive: bool,
    pub viewport: ChartViewport,
}

impl ChartFrame {
    /// Axes are fitted to the whole tensor, all facets included.
    pub fn new(
        def: ChartDefinition,
        data: ChartTensorData,
        viewport: ChartViewport,
        theme: ChartTheme,
        config: LinesChartConfig,
        interactive: bool,
    ) -> Self {
        let extents = data.measure_extents(&def, None);
        let (mut x_axis, y_axis, y2_axis) =
            build_axes(&def, &data, &extents, viewport.width, viewport.height, &config);
        if interactive {
            x_axis.label_rotation = config.label_rotation;
        }

        let facets = match data.facet_labels() {
            Some(labels) if !labels.is_empty() => labels
                .iter()
                .map(|l| FacetSurface {
                    label: Some(l.label.clone()),
                    surface: Surface::new(viewport.width, viewport.height),
                    cache: DrawCache::default(),
                })
                .collect(),
            _ => vec![FacetSurface {
                label: None,
                surface: Surface::new(viewport.width, viewport.height),
                cache: DrawCache::default(),
            }],
        };

        Self {
            def,
            data,
            x_axis,
            y_axis,
            y2_axis,
            facets,
            theme,
            config,
            interactive,
            viewport,
        }
    }

    pub fn x_domain(&self) -> Interval {
        Interval::from_tuple(self.x_axis.domain())
    }

    /// Sets the x domain and refreshes the time tick format and axis title.
    pub fn set_x_domain(&mut self, interval: Interval) {
        if !interval.is_finite() {
            return;
        }
        self.x_axis.set_domain(interval.min, interval.max);
        self.x_axis.update_time_format();
    }

    /// Rescales the y axes to the given extents; non-finite extents are skipped.
    pub fn set_y_domains(&mut self, y1: &Extent, y2: &Extent) {
        let include_zero = self.def.include_zero;
        if let (Some(axis), Some((min, max))) = (self.y_axis.as_mut(), y_domain(y1, include_zero)) {
            axis.set_domain(min, max);
        }
        if let (Some(axis), Some((min, max))) = (self.y2_axis.as_mut(), y_domain(y2, include_zero)) {
            axis.set_domain(min, max);
        }
    }

    /// Draws every facet. `redraw` marks an interactive redraw over the same tensor.
    pub fn draw_frame(&mut self, redraw: bool) {
        let Self {
            def,
            data,
            x_axis,
            y_axis,
            y2_axis,
            facets,
            theme,
            config,
            interactive,
            ..
        } = self;
        for (facet_idx, facet) in facets.iter_mut().enumerate() {
            let ctx = DrawContext {
                coords: CoordContext {
                    def,
                    data,
                    facet: facet_idx,
                    x_axis,
                    y_axis: y_axis.as_ref(),
                    y2_axis: y2_axis.as_ref(),
                },
                theme,
                config,
            };
            LinesDrawer::draw(&ctx, facet, redraw, *interactive);
        }
    }

    /// Grid lines from the axis 1 ticks (axis 2 otherwise) and the x domain line offset
    /// that puts it on y = 0.
    pub fn update_hlines(&mut self) {
        let Some(axis) = self.y_axis.as_ref().or(self.y2_axis.as_ref()) else {
            return;
        };
        let height = self.viewport.height;
        let hlines: Vec<HLine> = axis
            .tick_values()
            .into_iter()
            .map(|value| HLine {
                value,
                y: axis.map(value),
            })
            .collect();
        let offset = if axis.scale.is_log() {
            0.0
        } else {
            axis.map(0.0).clamp(0.0, height) - height
        };
        for facet in &mut self.facets {
            facet.surface.hlines = hlines.clone();
            facet.surface.x_domain_offset = offset;
        }
    }

    /// Shades the parts of the explorable range that the loaded tensor does not cover.
    pub fn update_missing_data_areas(&mut self, data_interval: Interval, loaded_interval: Interval) {
        let (range_min, range_max) = self.x_axis.scale.range();
        let height = self.viewport.height;
        let area = |from: f64, to: f64| {
            let x0 = self.x_axis.map(from).max(range_min);
            let x1 = self.x_axis.map(to).min(range_max);
            MissingArea {
                x: x0,
                width: (x1 - x0).max(0.0),
                height,
            }
        };
        let left = if loaded_interval.min > data_interval.min {
            area(data_interval.min, loaded_interval.min)
        } else {
            MissingArea::default()
        };
        let right = if loaded_interval.max < data_interval.max {
            area(loaded_interval.max, data_interval.max)
        } else {
            MissingArea::default()
        };
        for facet in &mut self.facets {
            facet.surface.left_missing = left;
            facet.surface.right_missing = right;
        }
    }

    pub fn clean_missing_data_areas(&mut self) {
        for facet in &mut self.facets {
            facet.surface.clear_missing_areas();
        }
    }

    /// Drops every primitive, before the frame is replaced by a fresh mount.
    pub fn clean_frame(&mut self) {
        for facet in &mut self.facets {
            facet.surface.clear();
            facet.cache = DrawCache::default();
        }
    }
}

/// Draws the lines of one facet of the main chart.
pub struct LinesDrawer;

impl LinesDrawer {
    pub fn draw(ctx: &DrawContext<'_>, facet: &mut FacetSurface, redraw: bool, interactive: bool) {
        let def = ctx.coords.def;
        let mut lines = prepare_data(def, ctx.coords.data, None);
        let surface = &mut facet.surface;
        let cache = &mut facet.cache;

        draw_wrappers(ctx, surface, &lines, redraw, true);

        if !redraw {
            draw_points(ctx, surface, &mut lines, ctx.config.point_radius, true);
            cache.points_removed = false;
        } else if !cache.points_removed {
            let keys: Vec<_> = surface.wrappers().iter().map(|w| w.key).collect();
            for key in keys {
                if let Some(wrapper) = surface.wrapper_mut(key) {
                    wrapper.points.clear();
                }
            }
            cache.points_removed = true;
            debug!("points removed for interactive redraw");
        }

        let reuse = if redraw { cache.line_generator } else { None };
        let (generator, geometries) = configure_lines(ctx, &mut lines, reuse);
        cache.line_generator = Some(generator);
        draw_paths(ctx, surface, &lines, geometries, redraw, def.stroke_width, true);

        if interactive {
            clip_paths(surface, ctx.config.clip_margin);
        }
    }
}

/// Static overview of the whole data interval, drawn once in the brush strip.
#[derive(Clone, Debug)]
pub struct BrushFrame {
    pub surface: Surface,
    pub x_axis: Axis,
    pub y_axis: Option<Axis>,
    pub y2_axis: Option<Axis>,
}

impl BrushFrame {
    pub fn new(frame: &ChartFrame) -> Self {
        let extents = frame.data.measure_extents(&frame.def, None);
        let (x_axis, y_axis, y2_axis) = build_axes(
            &frame.def,
            &frame.data,
            &extents,
            frame.viewport.width,
            frame.viewport.brush_height,
            &frame.config,
        );
        let mut brush = Self {
            surface: Surface::new(frame.viewport.width, frame.viewport.brush_height),
            x_axis,
            y_axis,
            y2_axis,
        };
        LinesBrushDrawer::draw(frame, &mut brush);
        brush
    }

    pub fn x_domain(&self) -> Interval {
        Interval::from_tuple(self.x_axis.domain())
    }
}

/// Lower-fidelity copy of the lines: small points, thin strokes, no tooltips or hover.
pub struct LinesBrushDrawer;

impl LinesBrushDrawer {
    pub fn draw(frame: &ChartFrame, brush: &mut BrushFrame) {
        let ctx = DrawContext {
            coords: CoordContext {
                def: &frame.def,
                data: &frame.data,
                facet: 0,
                x_axis: &brush.x_axis,
                y_axis: brush.y_axis.as_ref(),
                y2_axis: brush.y2_axis.as_ref(),
            },
            theme: &frame.theme,
            config: &frame.config,
        };
        let mut lines = prepare_data(&frame.def, &frame.data, None);
        draw_wrappers(&ctx, &mut brush.surface, &lines, false, false);
        draw_points(&ctx, &mut brush.surface, &mut lines, frame.config.brush_point_radius, false);
        let (_, geometries) = configure_lines(&ctx, &mut lines, None);
        draw_paths(
            &ctx,
            &mut brush.surface,
            &lines,
            geometries,
            false,
            frame.config.brush_stroke_width,
            false,
        );
    }
}

