use super::behavior::ZoomBehavior;
use super::debounce::Debouncer;
use super::state::{inspect_zoom, GestureKind, ZoomEvent, ZoomState};
use crate::activity::{
    compute_chart_top_right_label, compute_no_records_top_right_label, main_automatic_binning_mode_label,
    ActivityIndicator, UiDisplayState,
};
use crate::drawer::ChartFrame;
use crate::error::QueryError;
use crate::lines_utils::Interval;
use crate::request::{compute_request, BinCountStrategy, ChartTypeBinLimit, PivotRequest};
use crate::tensor::{MeasureExtents, PivotResponse};
use glam::Vec2;
use std::time::Instant;
use tracing::{debug, info};

/// What a zoom tick did to the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomTick {
    Rescaled,
    Prevented,
    /// Local rescaling is off until the pending remount.
    Ignored,
}

/// What to do with a pivot query result.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseOutcome {
    /// Fresh data for the current interaction: remount the chart on it.
    Remount(PivotResponse),
    /// Too few labels to draw; the current rendering stays.
    Ignored,
    /// Superseded by a newer interaction.
    Stale { expected: u64, received: Option<u64> },
    Failed(String),
}

/// Drives offline rescaling during gestures and debounced re-queries after them.
pub struct LinesZoomer {
    state: ZoomState,
    behavior: ZoomBehavior,
    debouncer: Debouncer<PivotRequest>,
    bin_strategy: Box<dyn BinCountStrategy>,
    cursor_at_start: Option<Vec2>,
    display_at_start: Option<Interval>,
}

fn extents_for(frame: &ChartFrame) -> impl Fn(Interval) -> MeasureExtents + '_ {
    move |interval| frame.data.measure_extents(&frame.def, Some(interval.as_tuple()))
}

impl LinesZoomer {
    /// Sets up zooming over a freshly drawn frame, continuing `previous` after a re-query.
    pub fn new(frame: &mut ChartFrame, previous: Option<&ZoomState>) -> Self {
        let state = ZoomState::init(frame.x_domain(), previous, extents_for(frame));
        let mut behavior = ZoomBehavior::new(state.display_interval, frame.x_axis.scale.range());
        behavior.set_scale_extent(state.scale_extent());
        let debouncer = Debouncer::from_config(&frame.config.debounce);

        let zoomer = Self {
            state,
            behavior,
            debouncer,
            bin_strategy: Box::new(ChartTypeBinLimit),
            cursor_at_start: None,
            display_at_start: None,
        };
        if zoomer.state.display_interval != frame.x_domain() {
            zoomer.redraw_chart(frame, false);
        } else {
            frame.update_missing_data_areas(zoomer.state.data_interval, zoomer.state.loaded_interval);
        }
        zoomer
    }

    pub fn with_bin_strategy(mut self, strategy: Box<dyn BinCountStrategy>) -> Self {
        self.bin_strategy = strategy;
        self
    }

    pub fn state(&self) -> &ZoomState {
        &self.state
    }

    pub fn into_state(self) -> ZoomState {
        self.state
    }

    /// Hands the bin strategy over to the zoomer of the next mount.
    pub fn take_bin_strategy(&mut self) -> Box<dyn BinCountStrategy> {
        std::mem::replace(&mut self.bin_strategy, Box::new(ChartTypeBinLimit))
    }

    /// Re-enables local rescaling when an accepted response could not be mounted.
    pub fn resume_offline_zoom(&mut self) {
        self.state.offline_zoom_disabled = false;
    }

    pub fn mark_brush_drawn(&mut self) {
        self.state.has_brush_been_drawn = true;
    }

    pub fn behavior(&self) -> &ZoomBehavior {
        &self.behavior
    }

    pub fn has_pending_request(&self) -> bool {
        self.debouncer.has_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    fn update_state(&mut self, f: impl FnOnce(ZoomState) -> ZoomState) {
        let state = self.state.clone();
        self.state = f(state);
    }

    /// Rescales the axes to the display interval and redraws the lines in place.
    /// `redraw` is false only right after a mount, so points are kept.
    fn redraw_chart(&self, frame: &mut ChartFrame, redraw: bool) {
        frame.set_x_domain(self.state.display_interval);
        frame.set_y_domains(&self.state.y_extent, &self.state.y2_extent);
        frame.draw_frame(redraw);
        frame.update_hlines();
        frame.update_missing_data_areas(self.state.data_interval, self.state.loaded_interval);
    }

    /// `cursor` is the pointer position for drags, `None` for wheel gestures.
    pub fn zoom_start(&mut self, ui: &mut UiDisplayState, cursor: Option<Vec2>) {
        self.update_state(ZoomState::start_gesture);
        self.cursor_at_start = cursor;
        self.display_at_start = Some(self.state.display_interval);
        ui.hide_aggregations_metrics = true;
        debug!(sequence_id = self.state.sequence_id, "zoom start");
    }

    /// One gesture tick proposing the x domain `proposed` under transform `event`.
    pub fn zoom(
        &mut self,
        frame: &mut ChartFrame,
        ui: &mut UiDisplayState,
        event: ZoomEvent,
        proposed: Interval,
    ) -> ZoomTick {
        if self.state.offline_zoom_disabled {
            return ZoomTick::Ignored;
        }
        self.state.sequence_id += 1;

        let gesture = GestureKind::classify(&self.state.previous_zoom_event, &event);
        debug!(?gesture, min = proposed.min, max = proposed.max, "zoom tick");
        let inspection = inspect_zoom(&self.state, proposed, gesture, extents_for(frame));
        let prevented = inspection.prevent_offline_zoom;
        let def = &frame.def;
        self.update_state(|s| s.apply_zoom(def, &inspection, event));
        self.behavior.sync_to(self.state.display_interval);

        if prevented {
            if self.state.points_count == 0 {
                ui.chart_top_right_label = compute_no_records_top_right_label();
            }
            return ZoomTick::Prevented;
        }
        self.redraw_chart(frame, true);
        ui.set_brush_display_interval(self.state.display_interval);
        ZoomTick::Rescaled
    }

    /// Drag by `dx` pixels.
    pub fn pan_by(&mut self, frame: &mut ChartFrame, ui: &mut UiDisplayState, dx: f32) -> ZoomTick {
        self.behavior.pan_by(dx as f64);
        self.behavior_tick(frame, ui)
    }

    /// Wheel zoom by `factor` around the pixel `anchor_x`.
    pub fn zoom_at(
        &mut self,
        frame: &mut ChartFrame,
        ui: &mut UiDisplayState,
        anchor_x: f32,
        factor: f64,
    ) -> ZoomTick {
        self.behavior.zoom_at(anchor_x as f64, factor);
        self.behavior_tick(frame, ui)
    }

    fn behavior_tick(&mut self, frame: &mut ChartFrame, ui: &mut UiDisplayState) -> ZoomTick {
        let tick = self.zoom(frame, ui, self.behavior.event(), self.behavior.domain());
        self.behavior.sync_to(self.state.display_interval);
        self.state.previous_zoom_event = self.behavior.event();
        tick
    }

    /// Ends a gesture. Returns whether a re-query was scheduled.
    pub fn zoom_end(
        &mut self,
        frame: &mut ChartFrame,
        ui: &mut UiDisplayState,
        cursor: Option<Vec2>,
        now: Instant,
    ) -> bool {
        let was_click = matches!((self.cursor_at_start, cursor), (Some(a), Some(b)) if a == b);
        let unchanged = self.display_at_start == Some(self.state.display_interval);
        self.cursor_at_start = None;
        self.display_at_start = None;

        if was_click || unchanged || self.state.prevent_next_pivot_request {
            debug!(was_click, unchanged, "zoom end without re-query");
            ui.hide_aggregations_metrics = false;
            ui.loading = self.debouncer.has_pending();
            frame.clean_missing_data_areas();
            self.update_state(ZoomState::settle);
            return false;
        }
        self.handle_offline_zoomend(frame, ui, now)
    }

    /// Moves the display to the brush selection, clamped to the data interval, and
    /// schedules a re-query for it.
    pub fn brush_changed(
        &mut self,
        frame: &mut ChartFrame,
        ui: &mut UiDisplayState,
        interval: Interval,
        now: Instant,
    ) -> bool {
        if !interval.is_finite() {
            return false;
        }
        let Some(interval) = interval.intersect(&self.state.data_interval) else {
            return false;
        };
        if interval == self.state.display_interval {
            return false;
        }
        let extents = extents_for(frame)(interval);
        self.update_state(|s| s.select_interval(interval, extents));
        self.behavior.reset_to(interval);
        self.behavior.set_scale_extent(self.state.scale_extent());
        ui.hide_aggregations_metrics = true;
        ui.set_brush_display_interval(interval);
        self.redraw_chart(frame, true);
        self.handle_offline_zoomend(frame, ui, now)
    }

    fn handle_offline_zoomend(&mut self, frame: &mut ChartFrame, ui: &mut UiDisplayState, now: Instant) -> bool {
        let request = compute_request(
            &frame.def,
            frame.viewport.width,
            frame.viewport.height,
            Some(&self.state),
            self.bin_strategy.as_ref(),
        );
        match request {
            Ok(request) => {
                debug!(sequence_id = request.sequence_id, "re-query scheduled");
                self.debouncer.submit(now, request);
                ui.loading = true;
                self.update_state(ZoomState::await_query);
                true
            }
            Err(err) => {
                info!("request not ready: {}", err);
                ui.clean_feedback();
                self.update_state(ZoomState::settle);
                false
            }
        }
    }

    /// Request whose debounce window elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<PivotRequest> {
        self.debouncer.poll(now)
    }

    /// Applies the sequence id fence to a query result.
    pub fn handle_response(
        &mut self,
        ui: &mut UiDisplayState,
        indicator: &mut dyn ActivityIndicator,
        result: Result<PivotResponse, QueryError>,
        interactive_automatic: bool,
    ) -> ResponseOutcome {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let message = err.user_message();
                indicator.display_backend_error(&message);
                ui.chart_top_right_label = compute_no_records_top_right_label();
                ui.clean_feedback();
                self.update_state(ZoomState::settle);
                return ResponseOutcome::Failed(message);
            }
        };

        let expected = self.state.sequence_id;
        if response.sequence_id != Some(expected) {
            info!(
                expected,
                received = ?response.sequence_id,
                "dropping pivot response of a previous interaction"
            );
            return ResponseOutcome::Stale {
                expected,
                received: response.sequence_id,
            };
        }

        if !response.has_enough_data() {
            info!("Not enough data");
            ui.clean_feedback();
            self.update_state(ZoomState::settle);
            return ResponseOutcome::Ignored;
        }

        indicator.clear();
        ui.clean_feedback();
        ui.chart_top_right_label = compute_chart_top_right_label(
            response.after_filter_records,
            main_automatic_binning_mode_label(&response),
            interactive_automatic,
        );
        self.update_state(ZoomState::accept_response);
        ResponseOutcome::Remount(response)
    }
}
