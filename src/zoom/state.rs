//! Interaction state of one chart mount, and its pure transitions.

use crate::chart_def::ChartDefinition;
use crate::drawer::has_valid_y_extents;
use crate::lines_utils::Interval;
use crate::tensor::{Extent, MeasureExtents};

/// Snapshot of the zoom transform: scale factor and pixel translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomEvent {
    pub scale: f64,
    pub translate: (f64, f64),
}

impl Default for ZoomEvent {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: (0.0, 0.0),
        }
    }
}

/// What a zoom tick does compared to the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureKind {
    pub zooming: bool,
    pub zooming_in: bool,
    pub panning_left: bool,
    pub panning_right: bool,
}

impl GestureKind {
    pub fn classify(previous: &ZoomEvent, current: &ZoomEvent) -> Self {
        let zooming = current.scale != previous.scale;
        Self {
            zooming,
            zooming_in: zooming && current.scale > previous.scale,
            panning_left: !zooming && current.translate.0 > previous.translate.0,
            panning_right: !zooming && current.translate.0 < previous.translate.0,
        }
    }

    pub fn is_panning(&self) -> bool {
        self.panning_left || self.panning_right
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZoomPhase {
    #[default]
    Idle,
    /// Between zoom start and zoom end.
    Gesturing,
    /// The last tick was applied locally over the loaded tensor.
    OfflineRescale,
    /// A re-query is debounced or in flight.
    AwaitingQuery,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoomState {
    /// Explorable x-range, established by the first mount.
    pub data_interval: Interval,
    /// x-range currently shown.
    pub display_interval: Interval,
    /// x-range covered by the loaded tensor.
    pub loaded_interval: Interval,
    pub last_valid_display_interval: Interval,
    /// Id of the latest interaction; responses carrying another id are stale.
    pub sequence_id: u64,
    pub y_extent: Extent,
    pub y2_extent: Extent,
    pub records_count: f64,
    pub points_count: usize,
    pub previous_zoom_event: ZoomEvent,
    pub offline_zoom_disabled: bool,
    pub prevent_next_pivot_request: bool,
    /// Next query is sent without the zoom filter.
    pub disable_zoom_filtering: bool,
    pub prevent_thumbnail_update: bool,
    pub max_scale: f64,
    pub phase: ZoomPhase,
    pub has_brush_been_drawn: bool,
}

impl ZoomState {
    /// State for a new mount whose tensor covers `x_domain`. Intervals, sequence id and
    /// brush flag are carried over from `previous` when the mount follows a re-query.
    pub fn init(
        x_domain: Interval,
        previous: Option<&ZoomState>,
        extents_for: impl Fn(Interval) -> MeasureExtents,
    ) -> Self {
        let data_interval = previous.map_or(x_domain, |p| p.data_interval);
        let display_interval = previous.map_or(data_interval, |p| p.display_interval);
        let extents = extents_for(display_interval);
        Self {
            data_interval,
            display_interval,
            loaded_interval: x_domain,
            last_valid_display_interval: x_domain,
            sequence_id: previous.map_or(0, |p| p.sequence_id),
            y_extent: extents.y1,
            y2_extent: extents.y2,
            records_count: extents.records_count,
            points_count: extents.points_count,
            previous_zoom_event: ZoomEvent::default(),
            offline_zoom_disabled: false,
            prevent_next_pivot_request: false,
            disable_zoom_filtering: false,
            prevent_thumbnail_update: previous.is_some_and(|p| p.prevent_thumbnail_update),
            max_scale: (display_interval.span() / 1000.0).log2(),
            phase: ZoomPhase::Idle,
            has_brush_been_drawn: previous.is_some_and(|p| p.has_brush_been_drawn),
        }
    }

    /// Bounds of the zoom factor, relative to the current display interval.
    pub fn scale_extent(&self) -> (f64, f64) {
        let min = if self.display_interval == self.data_interval {
            1.0
        } else {
            0.1
        };
        let max = if self.max_scale.is_finite() {
            self.max_scale.max(min)
        } else {
            min
        };
        (min, max)
    }

    pub fn start_gesture(mut self) -> Self {
        self.sequence_id += 1;
        self.prevent_next_pivot_request = false;
        self.phase = ZoomPhase::Gesturing;
        self
    }

    /// Applies an inspected tick. A tick with `prevent_offline_zoom` leaves the display,
    /// the extents and the previous event untouched.
    pub fn apply_zoom(mut self, def: &ChartDefinition, inspection: &ZoomInspection, event: ZoomEvent) -> Self {
        self.prevent_next_pivot_request = inspection.prevent_next_pivot_request;
        if inspection.prevent_offline_zoom {
            return self;
        }
        let display = inspection.display_interval;
        let extents = &inspection.extents;
        if extents.points_count > 1
            && has_valid_y_extents(def, &extents.y1, &extents.y2)
            && display.min != display.max
        {
            self.last_valid_display_interval = display;
        }
        self.display_interval = display;
        self.y_extent = extents.y1;
        self.y2_extent = extents.y2;
        self.records_count = extents.records_count;
        self.points_count = extents.points_count;
        self.disable_zoom_filtering = inspection.disable_zoom_filtering;
        self.previous_zoom_event = event;
        self.phase = ZoomPhase::OfflineRescale;
        self
    }

    /// Moves the display to a brush selection. Selecting the whole data interval
    /// re-queries it without the zoom filter.
    pub fn select_interval(mut self, interval: Interval, extents: MeasureExtents) -> Self {
        if interval == self.data_interval {
            self.disable_zoom_filtering = true;
        }
        self.sequence_id += 1;
        self.display_interval = interval;
        self.y_extent = extents.y1;
        self.y2_extent = extents.y2;
        self.records_count = extents.records_count;
        self.points_count = extents.points_count;
        self.previous_zoom_event = ZoomEvent::default();
        self.phase = ZoomPhase::OfflineRescale;
        self
    }

    pub fn await_query(mut self) -> Self {
        self.phase = ZoomPhase::AwaitingQuery;
        self
    }

    pub fn settle(mut self) -> Self {
        self.phase = ZoomPhase::Idle;
        self
    }

    /// A matching response was accepted; no local rescale until the remount.
    pub fn accept_response(mut self) -> Self {
        self.offline_zoom_disabled = true;
        self.prevent_thumbnail_update = true;
        self.phase = ZoomPhase::Idle;
        self
    }
}

/// Outcome of checking a proposed x domain against the data bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomInspection {
    pub display_interval: Interval,
    pub extents: MeasureExtents,
    /// The proposed domain had to be replaced by `display_interval`.
    pub should_rescale: bool,
    pub prevent_offline_zoom: bool,
    pub prevent_next_pivot_request: bool,
    pub disable_zoom_filtering: bool,
}

/// Clamps `proposed` to the data interval and decides whether the tick may be
/// rendered locally and whether the gesture deserves a re-query.
pub fn inspect_zoom(
    state: &ZoomState,
    proposed: Interval,
    gesture: GestureKind,
    extents_for: impl Fn(Interval) -> MeasureExtents,
) -> ZoomInspection {
    let data = state.data_interval;
    let mut display = if proposed.is_finite() {
        proposed
    } else {
        state.last_valid_display_interval
    };
    let mut prevent_offline_zoom = false;
    let mut prevent_next_pivot_request = false;
    let mut disable_zoom_filtering = false;

    let too_far_left = display.min <= data.min;
    let too_far_right = display.max >= data.max;

    if too_far_left && too_far_right {
        display = data;
        if state.loaded_interval != data {
            disable_zoom_filtering = true;
        } else {
            prevent_next_pivot_request = true;
        }
    } else if too_far_left {
        if gesture.panning_left && state.display_interval.min <= data.min {
            prevent_offline_zoom = true;
        }
        if gesture.is_panning() {
            let span = display.span();
            display = Interval::new(data.min, (data.min + span).min(data.max));
        } else {
            display.min = data.min;
        }
    } else if too_far_right {
        if gesture.panning_right && state.display_interval.max >= data.max {
            prevent_offline_zoom = true;
        }
        if gesture.is_panning() {
            let span = display.span();
            display = Interval::new((data.max - span).max(data.min), data.max);
        } else {
            display.max = data.max;
        }
    }

    if state.points_count <= 1 && gesture.zooming_in {
        prevent_offline_zoom = true;
        prevent_next_pivot_request = true;
    }
    if display.min >= display.max {
        prevent_offline_zoom = true;
    }

    ZoomInspection {
        display_interval: display,
        extents: extents_for(display),
        should_rescale: display != proposed,
        prevent_offline_zoom,
        prevent_next_pivot_request,
        disable_zoom_filtering,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(display: Interval, points: usize) -> ZoomState {
        let mut s = ZoomState::init(Interval::new(0.0, 1000.0), None, |_| MeasureExtents::default());
        s.display_interval = display;
        s.points_count = points;
        s
    }

    fn extents(_: Interval) -> MeasureExtents {
        MeasureExtents::default()
    }

    #[test]
    fn classification() {
        let prev = ZoomEvent::default();
        let zoom_in = ZoomEvent {
            scale: 2.0,
            translate: (-10.0, 0.0),
        };
        let pan_left = ZoomEvent {
            scale: 1.0,
            translate: (15.0, 0.0),
        };
        assert!(GestureKind::classify(&prev, &zoom_in).zooming_in);
        assert!(!GestureKind::classify(&prev, &zoom_in).panning_right);
        assert!(GestureKind::classify(&prev, &pan_left).panning_left);
    }

    #[test]
    fn non_finite_domain_falls_back_to_last_valid() {
        let mut s = state(Interval::new(100.0, 300.0), 10);
        s.last_valid_display_interval = Interval::new(100.0, 300.0);
        let result = inspect_zoom(&s, Interval::new(f64::NAN, 300.0), GestureKind::default(), extents);
        assert_eq!(result.display_interval, Interval::new(100.0, 300.0));
        assert!(result.should_rescale);
    }

    #[test]
    fn zoom_out_on_one_side_clips_that_side() {
        let s = state(Interval::new(100.0, 300.0), 10);
        let gesture = GestureKind {
            zooming: true,
            ..Default::default()
        };
        let result = inspect_zoom(&s, Interval::new(-20.0, 420.0), gesture, extents);
        assert_eq!(result.display_interval, Interval::new(0.0, 420.0));
        assert!(!result.prevent_offline_zoom);
    }

    #[test]
    fn cannot_zoom_into_a_single_point() {
        let s = state(Interval::new(100.0, 300.0), 1);
        let gesture = GestureKind {
            zooming: true,
            zooming_in: true,
            ..Default::default()
        };
        let result = inspect_zoom(&s, Interval::new(150.0, 250.0), gesture, extents);
        assert!(result.prevent_offline_zoom);
        assert!(result.prevent_next_pivot_request);
    }

    #[test]
    fn prevented_tick_keeps_display() {
        let def: ChartDefinition = serde_json::from_str(
            r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[{"column":"v"}]}"#,
        )
        .unwrap();
        let s = state(Interval::new(100.0, 300.0), 1);
        let inspection = ZoomInspection {
            display_interval: Interval::new(150.0, 250.0),
            extents: MeasureExtents::default(),
            should_rescale: false,
            prevent_offline_zoom: true,
            prevent_next_pivot_request: true,
            disable_zoom_filtering: false,
        };
        let next = s.clone().apply_zoom(&def, &inspection, ZoomEvent::default());
        assert_eq!(next.display_interval, s.display_interval);
        assert!(next.prevent_next_pivot_request);
    }
}
