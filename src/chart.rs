//! Lines chart model.
//!
//! `LinesChart` owns one mount of the chart: the drawn frame, the optional zoomer and
//! brush, and the status shown around the plot. When a zoom re-query comes back it
//! remounts itself on the new tensor, carrying the zoom state over.

use crate::activity::{
    compute_chart_top_right_label, main_automatic_binning_mode_label, ActivityIndicator, BrushData,
    ChartActivityIndicator, UiDisplayState,
};
use crate::chart_def::ChartDefinition;
use crate::config::LinesChartConfig;
use crate::drawer::{BrushFrame, ChartFrame, ChartViewport};
use crate::lines_utils::Interval;
use crate::query::PivotQueryService;
use crate::request::{BinCountStrategy, NO_MEASURE_MESSAGE};
use crate::scene::LineKey;
use crate::tensor::{AxesDef, ChartTensorData, PivotResponse};
use crate::theme::ChartTheme;
use crate::zoom::{LinesZoomer, ResponseOutcome, ZoomEvent, ZoomState, ZoomTick};
use eyre::{bail, Result};
use glam::Vec2;
use std::time::Instant;
use tracing::{info, warn};

/// What one `poll` did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub dispatched: bool,
    pub remounted: bool,
    pub stale: usize,
}

pub struct LinesChart {
    frame: ChartFrame,
    zoomer: Option<LinesZoomer>,
    brush: Option<BrushFrame>,
    ui: UiDisplayState,
    indicator: ChartActivityIndicator,
}

fn mount_frame(
    def: ChartDefinition,
    response: PivotResponse,
    viewport: ChartViewport,
    config: LinesChartConfig,
    theme: ChartTheme,
) -> Result<ChartFrame> {
    if def.measures.is_empty() {
        bail!(NO_MEASURE_MESSAGE);
    }
    if response.axis_labels.is_empty() {
        bail!("pivot response has no axis");
    }
    let data = ChartTensorData::new(response, AxesDef::for_definition(&def));
    let interactive = def.is_interactive(config.disable_interactivity_globally);
    let mut frame = ChartFrame::new(def, data, viewport, theme, config, interactive);
    frame.draw_frame(false);
    frame.update_hlines();
    Ok(frame)
}

fn records_label(frame: &ChartFrame) -> String {
    let response = frame.data.response();
    compute_chart_top_right_label(
        response.after_filter_records,
        main_automatic_binning_mode_label(response),
        frame.interactive,
    )
}

impl LinesChart {
    /// Draws the chart for a first pivot response and sets up zooming when eligible.
    pub fn mount(
        def: ChartDefinition,
        response: PivotResponse,
        viewport: ChartViewport,
        config: LinesChartConfig,
        theme: ChartTheme,
    ) -> Result<Self> {
        let mut frame = mount_frame(def, response, viewport, config, theme)?;
        let mut zoomer = frame.interactive.then(|| LinesZoomer::new(&mut frame, None));

        let mut ui = UiDisplayState {
            chart_top_right_label: records_label(&frame),
            ..Default::default()
        };

        let mut brush = None;
        if let Some(zoomer) = zoomer.as_mut() {
            if frame.def.brush && frame.facets.len() == 1 && !zoomer.state().has_brush_been_drawn {
                brush = Some(BrushFrame::new(&frame));
                zoomer.mark_brush_drawn();
                let state = zoomer.state();
                ui.display_brush = true;
                ui.brush_data = Some(BrushData {
                    data_interval: state.data_interval,
                    display_interval: state.display_interval,
                    snap_ranges: state.data_interval,
                    width: frame.viewport.width,
                });
            }
        }

        info!(
            interactive = frame.interactive,
            facets = frame.facets.len(),
            "lines chart mounted"
        );
        Ok(Self {
            frame,
            zoomer,
            brush,
            ui,
            indicator: ChartActivityIndicator::default(),
        })
    }

    pub fn with_bin_strategy(mut self, strategy: Box<dyn BinCountStrategy>) -> Self {
        self.zoomer = self.zoomer.map(|z| z.with_bin_strategy(strategy));
        self
    }

    pub fn frame(&self) -> &ChartFrame {
        &self.frame
    }

    pub fn brush(&self) -> Option<&BrushFrame> {
        self.brush.as_ref()
    }

    pub fn ui(&self) -> &UiDisplayState {
        &self.ui
    }

    pub fn indicator(&self) -> &ChartActivityIndicator {
        &self.indicator
    }

    pub fn zoom_state(&self) -> Option<&ZoomState> {
        self.zoomer.as_ref().map(LinesZoomer::state)
    }

    pub fn is_interactive(&self) -> bool {
        self.zoomer.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.zoomer.as_ref().and_then(LinesZoomer::next_deadline)
    }

    /// Replaces the frame by a fresh mount on `response`, keeping the zoom state and brush.
    fn remount(&mut self, response: PivotResponse) -> Result<()> {
        let Some(old) = self.zoomer.as_mut() else {
            return Ok(());
        };
        let state = old.state().clone();
        let mut frame = mount_frame(
            self.frame.def.clone(),
            response,
            self.frame.viewport,
            self.frame.config.clone(),
            self.frame.theme.clone(),
        )?;
        let strategy = old.take_bin_strategy();
        let zoomer = LinesZoomer::new(&mut frame, Some(&state)).with_bin_strategy(strategy);

        self.frame.clean_frame();
        self.frame = frame;
        self.ui.set_brush_display_interval(zoomer.state().display_interval);
        self.zoomer = Some(zoomer);
        Ok(())
    }

    /// Dispatches the debounced request once due, then applies every available result.
    pub fn poll(&mut self, now: Instant, service: &mut dyn PivotQueryService) -> PollSummary {
        let mut summary = PollSummary::default();
        let Some(zoomer) = self.zoomer.as_mut() else {
            return summary;
        };
        if let Some(request) = zoomer.poll(now) {
            info!(sequence_id = request.sequence_id, "dispatching pivot request");
            service.execute(request);
            summary.dispatched = true;
        }

        while let Some(result) = service.try_next() {
            let Some(zoomer) = self.zoomer.as_mut() else {
                break;
            };
            let interactive = self.frame.interactive;
            match zoomer.handle_response(&mut self.ui, &mut self.indicator, result, interactive) {
                ResponseOutcome::Remount(response) => match self.remount(response) {
                    Ok(()) => summary.remounted = true,
                    Err(err) => {
                        warn!("remount failed: {:#}", err);
                        if let Some(zoomer) = self.zoomer.as_mut() {
                            zoomer.resume_offline_zoom();
                        }
                        self.indicator.display_backend_error(&err.to_string());
                    }
                },
                ResponseOutcome::Stale { .. } => summary.stale += 1,
                ResponseOutcome::Ignored | ResponseOutcome::Failed(_) => {}
            }
        }

        if let Some(zoomer) = self.zoomer.as_ref() {
            self.ui.loading = zoomer.has_pending_request() || service.has_in_flight();
        }
        summary
    }

    pub fn zoom_start(&mut self, cursor: Option<Vec2>) {
        if let Some(zoomer) = self.zoomer.as_mut() {
            zoomer.zoom_start(&mut self.ui, cursor);
        }
    }

    pub fn zoom(&mut self, event: ZoomEvent, proposed: Interval) -> ZoomTick {
        match self.zoomer.as_mut() {
            Some(zoomer) => zoomer.zoom(&mut self.frame, &mut self.ui, event, proposed),
            None => ZoomTick::Ignored,
        }
    }

    pub fn pan_by(&mut self, dx: f32) -> ZoomTick {
        match self.zoomer.as_mut() {
            Some(zoomer) => zoomer.pan_by(&mut self.frame, &mut self.ui, dx),
            None => ZoomTick::Ignored,
        }
    }

    pub fn zoom_at(&mut self, anchor_x: f32, factor: f64) -> ZoomTick {
        match self.zoomer.as_mut() {
            Some(zoomer) => zoomer.zoom_at(&mut self.frame, &mut self.ui, anchor_x, factor),
            None => ZoomTick::Ignored,
        }
    }

    /// Returns whether a re-query was scheduled.
    pub fn zoom_end(&mut self, cursor: Option<Vec2>, now: Instant) -> bool {
        match self.zoomer.as_mut() {
            Some(zoomer) => zoomer.zoom_end(&mut self.frame, &mut self.ui, cursor, now),
            None => false,
        }
    }

    pub fn brush_changed(&mut self, interval: Interval, now: Instant) -> bool {
        match self.zoomer.as_mut() {
            Some(zoomer) => zoomer.brush_changed(&mut self.frame, &mut self.ui, interval, now),
            None => false,
        }
    }

    /// Emphasizes the line under `point` in `facet`, if any.
    pub fn hover(&mut self, facet: usize, point: Vec2) -> Option<LineKey> {
        let stroke_width = self.frame.def.stroke_width;
        let surface = &mut self.frame.facets.get_mut(facet)?.surface;
        let hovered = surface.hit_test(point);
        surface.set_hover(hovered, stroke_width);
        hovered
    }

    pub fn hover_out(&mut self) {
        let stroke_width = self.frame.def.stroke_width;
        for facet in &mut self.frame.facets {
            facet.surface.set_hover(None, stroke_width);
        }
    }
}
