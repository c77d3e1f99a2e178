//! gpui host for a `LinesChart`: paints its surfaces, feeds it drag, wheel and brush
//! input, and pumps the debounced re-query on animation frames.

use crate::chart::LinesChart;
use crate::lines_utils::Interval;
use crate::painter::{paint_surface, x_axis_elements, y_axis_elements};
use crate::query::PivotQueryService;
use crate::scene::Surface;
use crate::utils::{PixelsExt, PointExt};
use crate::zoom::ZoomBehavior;
use glam::Vec2;
use gpui::prelude::*;
use gpui::*;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

actions!(lines_chart, [ResetView]);

const WHEEL_SENSITIVITY: f32 = 200.0;
const FACET_GAP: f32 = 16.0;

pub type SharedQueryService = Arc<Mutex<dyn PivotQueryService + Send>>;

pub fn init(cx: &mut App) {
    cx.bind_keys([KeyBinding::new("ctrl-0", ResetView, Some("LinesChart"))]);
}

pub struct LinesChartView {
    pub chart: LinesChart,
    service: SharedQueryService,
    focus_handle: FocusHandle,
    plot_bounds: Rc<RefCell<Bounds<Pixels>>>,
    brush_bounds: Rc<RefCell<Bounds<Pixels>>>,
    drag_last: Option<Point<Pixels>>,
    brush_anchor: Option<f32>,
    brush_selection: Option<(f32, f32)>,
    pump_scheduled: bool,
}

impl Focusable for LinesChartView {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl LinesChartView {
    pub fn new(chart: LinesChart, service: SharedQueryService, cx: &mut Context<Self>) -> Self {
        Self {
            chart,
            service,
            focus_handle: cx.focus_handle(),
            plot_bounds: Rc::new(RefCell::new(Bounds::default())),
            brush_bounds: Rc::new(RefCell::new(Bounds::default())),
            drag_last: None,
            brush_anchor: None,
            brush_selection: None,
            pump_scheduled: false,
        }
    }

    fn local(bounds: Bounds<Pixels>, position: Point<Pixels>) -> Vec2 {
        (position - bounds.origin).to_vec2()
    }

    fn facet_at(&self, y: f32) -> usize {
        let height = self.chart.frame().viewport.height + FACET_GAP;
        if height <= 0.0 || y < 0.0 {
            return 0;
        }
        (y / height).floor() as usize
    }

    /// Polls the chart every frame while a request is debounced or in flight.
    pub fn pump(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.pump_scheduled = false;
        let summary = {
            let mut service = self.service.lock();
            self.chart.poll(Instant::now(), &mut *service)
        };
        if summary.dispatched || summary.remounted || summary.stale > 0 {
            cx.notify();
        }
        if self.chart.ui().loading {
            self.schedule_pump(window, cx);
        }
    }

    fn schedule_pump(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.pump_scheduled {
            return;
        }
        self.pump_scheduled = true;
        cx.on_next_frame(window, |this, window, cx| this.pump(window, cx));
    }

    fn handle_mouse_down(&mut self, event: &MouseDownEvent, window: &mut Window, cx: &mut Context<Self>) {
        window.focus(&self.focus_handle);
        let brush_bounds = *self.brush_bounds.borrow();
        if self.chart.brush().is_some() && brush_bounds.contains(&event.position) {
            let x = Self::local(brush_bounds, event.position).x;
            self.brush_anchor = Some(x);
            self.brush_selection = Some((x, x));
            cx.notify();
            return;
        }
        let bounds = *self.plot_bounds.borrow();
        if !bounds.contains(&event.position) {
            return;
        }
        self.chart.zoom_start(Some(Self::local(bounds, event.position)));
        self.drag_last = Some(event.position);
    }

    fn handle_mouse_move(&mut self, event: &MouseMoveEvent, _window: &mut Window, cx: &mut Context<Self>) {
        if let Some(anchor) = self.brush_anchor {
            let brush_bounds = *self.brush_bounds.borrow();
            let x = Self::local(brush_bounds, event.position)
                .x
                .clamp(0.0, brush_bounds.size.width.as_f32());
            self.brush_selection = Some((anchor.min(x), anchor.max(x)));
            cx.notify();
            return;
        }
        let bounds = *self.plot_bounds.borrow();
        match self.drag_last {
            Some(last) => {
                let dx = (event.position.x - last.x).as_f32();
                self.drag_last = Some(event.position);
                self.chart.pan_by(dx);
                cx.notify();
            }
            None if bounds.contains(&event.position) => {
                let local = Self::local(bounds, event.position);
                let facet = self.facet_at(local.y);
                let facet_top = facet as f32 * (self.chart.frame().viewport.height + FACET_GAP);
                let before = self.chart.frame().facets.get(facet).and_then(|f| f.surface.hovered());
                let hovered = self.chart.hover(facet, Vec2::new(local.x, local.y - facet_top));
                if before != hovered {
                    cx.notify();
                }
            }
            None => {}
        }
    }

    fn handle_mouse_up(&mut self, event: &MouseUpEvent, window: &mut Window, cx: &mut Context<Self>) {
        if self.brush_anchor.take().is_some() {
            let selection = self.brush_selection.take();
            let interval = match (selection, self.chart.brush()) {
                (Some((from, to)), Some(brush)) if (to - from).abs() >= 1.0 => Some(Interval::new(
                    brush.x_axis.scale.invert(from),
                    brush.x_axis.scale.invert(to),
                )),
                (Some(_), Some(brush)) => Some(brush.x_domain()),
                _ => None,
            };
            if let Some(interval) = interval {
                if self.chart.brush_changed(interval, Instant::now()) {
                    self.schedule_pump(window, cx);
                }
            }
            cx.notify();
            return;
        }
        if self.drag_last.take().is_none() {
            return;
        }
        let bounds = *self.plot_bounds.borrow();
        let cursor = Self::local(bounds, event.position);
        if self.chart.zoom_end(Some(cursor), Instant::now()) {
            self.schedule_pump(window, cx);
        }
        cx.notify();
    }

    fn handle_scroll(&mut self, event: &ScrollWheelEvent, window: &mut Window, cx: &mut Context<Self>) {
        let bounds = *self.plot_bounds.borrow();
        if bounds.is_empty() || !self.chart.is_interactive() {
            return;
        }
        let delta_y = match event.delta {
            ScrollDelta::Pixels(p) => p.y.as_f32(),
            ScrollDelta::Lines(p) => p.y * 20.0,
        };
        if delta_y == 0.0 {
            return;
        }
        let anchor = Self::local(bounds, event.position).x;
        self.chart.zoom_start(None);
        self.chart
            .zoom_at(anchor, ZoomBehavior::wheel_factor(delta_y, WHEEL_SENSITIVITY));
        if self.chart.zoom_end(None, Instant::now()) {
            self.schedule_pump(window, cx);
        }
        cx.notify();
    }

    fn handle_reset_view(&mut self, _: &ResetView, window: &mut Window, cx: &mut Context<Self>) {
        let Some(data) = self.chart.zoom_state().map(|s| s.data_interval) else {
            return;
        };
        if self.chart.brush_changed(data, Instant::now()) {
            self.schedule_pump(window, cx);
        }
        cx.notify();
    }

    fn render_brush(&self) -> Option<AnyElement> {
        let brush = self.chart.brush()?;
        let frame = self.chart.frame();
        let theme = frame.theme.clone();
        let surface = brush.surface.clone();
        let brush_rc = self.brush_bounds.clone();
        let selection = self.brush_selection.or_else(|| {
            let data = self.chart.ui().brush_data?;
            Some((
                brush.x_axis.map(data.display_interval.min),
                brush.x_axis.map(data.display_interval.max),
            ))
        });
        let selection_color = theme.brush_selection;

        Some(
            div()
                .w(px(frame.viewport.width))
                .h(px(frame.viewport.brush_height))
                .mt(px(32.0))
                .relative()
                .child(
                    canvas(|_, _, _| {}, move |bounds, (), window, _cx| {
                        *brush_rc.borrow_mut() = bounds;
                        paint_surface(window, bounds, &surface, &theme, 0.0);
                        if let Some((from, to)) = selection {
                            let rect = Bounds::new(
                                Point::new(bounds.origin.x + px(from), bounds.origin.y),
                                size(px((to - from).max(1.0)), bounds.size.height),
                            );
                            window.paint_quad(fill(rect, selection_color));
                        }
                    })
                    .size_full(),
                )
                .into_any_element(),
        )
    }
}

impl Render for LinesChartView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let frame = self.chart.frame();
        let theme = frame.theme.clone();
        let width = frame.viewport.width;
        let height = frame.viewport.height;
        let missing_opacity = frame.config.missing_area_opacity;
        let surfaces: Vec<Surface> = frame.facets.iter().map(|f| f.surface.clone()).collect();
        let facet_count = surfaces.len().max(1) as f32;
        let plot_rc = self.plot_bounds.clone();
        let ui = self.chart.ui().clone();

        let mut axis_elements = Vec::new();
        for facet in 0..surfaces.len() {
            let top = facet as f32 * (height + FACET_GAP);
            let mut facet_axes = x_axis_elements(&frame.x_axis, height, theme.axis_label, theme.axis_label_size);
            if let Some(axis) = frame.y_axis.as_ref() {
                facet_axes.extend(y_axis_elements(axis, false, theme.axis_label, theme.axis_label_size));
            }
            if let Some(axis) = frame.y2_axis.as_ref() {
                facet_axes.extend(y_axis_elements(axis, true, theme.axis_label, theme.axis_label_size));
            }
            axis_elements.push(
                div()
                    .absolute()
                    .top(px(top))
                    .left(px(0.0))
                    .w(px(width))
                    .h(px(height))
                    .children(facet_axes)
                    .into_any_element(),
            );
        }

        let status = div()
            .flex()
            .justify_end()
            .gap_2()
            .text_size(theme.axis_label_size)
            .text_color(theme.status_text)
            .when(ui.loading, |d| d.child("Loading…"))
            .when_some(self.chart.indicator().error.clone(), |d, error| {
                d.child(div().text_color(theme.error_text).child(error))
            })
            .child(ui.chart_top_right_label.clone());

        let plot = div()
            .relative()
            .w(px(width))
            .h(px(height * facet_count + FACET_GAP * (facet_count - 1.0)))
            .when(ui.hide_aggregations_metrics, |d| d.opacity(0.9))
            .child(
                canvas(|_, _, _| {}, move |bounds, (), window, _cx| {
                    *plot_rc.borrow_mut() = bounds;
                    for (idx, surface) in surfaces.iter().enumerate() {
                        let top = idx as f32 * (height + FACET_GAP);
                        let facet_bounds = Bounds::new(
                            Point::new(bounds.origin.x, bounds.origin.y + px(top)),
                            size(px(width), px(height)),
                        );
                        paint_surface(window, facet_bounds, surface, &theme, missing_opacity);
                    }
                })
                .size_full()
                .absolute(),
            )
            .children(axis_elements);

        div()
            .track_focus(&self.focus_handle)
            .key_context("LinesChart")
            .flex()
            .flex_col()
            .p(px(56.0))
            .bg(frame.theme.background)
            .on_action(cx.listener(Self::handle_reset_view))
            .on_mouse_down(MouseButton::Left, cx.listener(Self::handle_mouse_down))
            .on_mouse_move(cx.listener(Self::handle_mouse_move))
            .on_mouse_up(MouseButton::Left, cx.listener(Self::handle_mouse_up))
            .on_scroll_wheel(cx.listener(Self::handle_scroll))
            .child(status)
            .child(plot)
            .children(self.render_brush())
    }
}
