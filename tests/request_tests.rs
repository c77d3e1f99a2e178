mod common;

use common::*;
use lines_chart::activity::{compute_chart_top_right_label, label_for_records_count, NO_RECORDS};
use lines_chart::config::LinesChartConfig;
use lines_chart::error::{ErrorPayload, QueryError};
use lines_chart::request::{compute_request, ChartTypeBinLimit, PixelDensity, NO_MEASURE_MESSAGE};
use lines_chart::tensor::PivotResponse;
use lines_chart::zoom::ZoomState;
use lines_chart::{ChartViewport, Interval, LinesChart};
use std::time::Duration;

fn zoomed_state(display: Interval) -> ZoomState {
    let mut state = ZoomState::init(Interval::new(1000.0, 2000.0), None, |_| Default::default());
    state.display_interval = display;
    state.sequence_id = 7;
    state
}

#[test]
fn zoom_request_filters_on_the_display_interval() {
    let def = timeline_def();
    let state = zoomed_state(Interval::new(1200.4, 1499.6));
    let request = compute_request(&def, WIDTH, HEIGHT, Some(&state), &ChartTypeBinLimit).unwrap();

    assert_eq!(request.request_type, "AGGREGATED_ND");
    assert_eq!(request.sequence_id, 7);
    let filter = request.zoom_filter().unwrap();
    assert_eq!(filter.column, "ts");
    assert_eq!((filter.min_value, filter.max_value), (1200, 1500));
    let params = request.axes[0].date_params.as_ref().unwrap();
    assert_eq!(params.max_bin_number_for_automatic_mode, 1000);

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["type"], "AGGREGATED_ND");
    assert_eq!(json["sequenceId"], 7);
    assert_eq!(json["filters"][0]["filterType"], "INTERACTIVE_DATE_FACET");
}

#[test]
fn full_data_requests_drop_the_zoom_filter() {
    let mut state = zoomed_state(Interval::new(1000.0, 2000.0));
    state.disable_zoom_filtering = true;
    let request = compute_request(&timeline_def(), WIDTH, HEIGHT, Some(&state), &ChartTypeBinLimit).unwrap();
    assert!(request.zoom_filter().is_none());

    let initial = compute_request(&timeline_def(), WIDTH, HEIGHT, None, &ChartTypeBinLimit).unwrap();
    assert!(initial.filters.is_empty());
    assert_eq!(initial.sequence_id, 0);
}

#[test]
fn pixel_density_caps_the_main_axis() {
    let request = compute_request(&timeline_def(), 300.0, HEIGHT, None, &PixelDensity::default()).unwrap();
    let params = request.axes[0].date_params.as_ref().unwrap();
    assert_eq!(params.max_bin_number_for_automatic_mode, 150);
}

#[test]
fn chart_without_measure_is_not_queried() {
    let def = def_from(r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[]}"#);
    let err = compute_request(&def, WIDTH, HEIGHT, None, &ChartTypeBinLimit).unwrap_err();
    assert_eq!(err.to_string(), NO_MEASURE_MESSAGE);

    let mounted = LinesChart::mount(
        def,
        timeline_response(1000.0, 1000.0, None),
        ChartViewport::new(WIDTH, HEIGHT),
        LinesChartConfig::default(),
        Default::default(),
    );
    assert!(mounted.is_err());
}

#[test]
fn custom_strategy_is_used_for_re_queries() {
    let mut chart = mount_timeline(1000.0, 1000.0)
        .with_bin_strategy(Box::new(PixelDensity { pixels_per_bin: 8.0 }));
    let (mut channel, backend) = lines_chart::QueryChannel::new();
    let start = std::time::Instant::now();

    assert!(chart.brush_changed(Interval::new(1100.0, 1500.0), start));
    chart.poll(start + Duration::from_millis(300), &mut channel);
    let request = backend.next_request().unwrap();
    let params = request.axes[0].date_params.as_ref().unwrap();
    assert_eq!(params.max_bin_number_for_automatic_mode, 100);
}

#[test]
fn config_reads_partial_json() {
    let config = LinesChartConfig::from_json(
        r#"{"disable_interactivity_globally":true,"debounce":{"delay_ms":150},"timezone":"Europe/Paris"}"#,
    )
    .unwrap();
    assert!(config.disable_interactivity_globally);
    assert_eq!(config.debounce.delay(), Duration::from_millis(150));
    assert_eq!(config.debounce.initial_delay(), Duration::from_millis(300));
    assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Paris);

    let bad = LinesChartConfig {
        timezone: "Mars/Olympus".to_string(),
        ..Default::default()
    };
    assert!(bad.tz().is_err());
    assert_eq!(bad.tz_or_utc(), chrono_tz::UTC);
}

#[test]
fn global_kill_switch_mounts_static_charts() {
    let config = LinesChartConfig {
        disable_interactivity_globally: true,
        ..Default::default()
    };
    let chart = LinesChart::mount(
        timeline_def(),
        timeline_response(1000.0, 1000.0, None),
        ChartViewport::new(WIDTH, HEIGHT),
        config,
        Default::default(),
    )
    .unwrap();
    assert!(!chart.is_interactive());
    assert_eq!(chart.ui().chart_top_right_label, "150 records");
}

#[test]
fn pivot_response_parses_camel_case() {
    let json = r#"{
        "axisLabels": [[{"label": "a", "sortValue": 1, "tsValue": 1000}, {"label": "b", "sortValue": 2, "tsValue": 2000}]],
        "axisDefs": [{"dateParams": {"mode": "HOUR"}}],
        "counts": {"tensor": [1, 2, 0], "multipliers": [1]},
        "aggregations": [{"tensor": [5, 6, 0], "multipliers": [1]}],
        "afterFilterRecords": 3,
        "sequenceId": 4
    }"#;
    let response = PivotResponse::from_json(json).unwrap();
    assert_eq!(response.sequence_id, Some(4));
    assert_eq!(response.axis_labels[0][1].ts_value, 2000.0);
    assert!(response.has_enough_data());
    assert_eq!(
        lines_chart::activity::main_automatic_binning_mode_label(&response),
        Some("Hour")
    );

    assert!(PivotResponse::from_json(r#"{"axisLabels": []}"#).is_err());
    assert!(PivotResponse::from_json("not json").is_err());
}

#[test]
fn records_labels() {
    assert_eq!(label_for_records_count(0), NO_RECORDS);
    assert_eq!(label_for_records_count(1), "1 record");
    assert_eq!(label_for_records_count(42), "42 records");
    assert_eq!(compute_chart_top_right_label(42, Some("Day"), true), "42 records (Day)");
    assert_eq!(compute_chart_top_right_label(42, Some("Day"), false), "42 records");
    assert_eq!(compute_chart_top_right_label(0, Some("Day"), true), NO_RECORDS);
}

#[test]
fn backend_error_messages() {
    let aborted = QueryError::Backend {
        status: 500,
        payload: ErrorPayload {
            error_type: Some("com.dataiku.dip.pivot.backend.model.SecurityAbortedException".to_string()),
            message: Some("limit 10000".to_string()),
        },
    };
    assert_eq!(
        aborted.user_message(),
        "Too much data to draw. Please adjust chart settings (limit 10000)"
    );

    let other = QueryError::Backend {
        status: 502,
        payload: ErrorPayload {
            error_type: Some("java.lang.NullPointerException".to_string()),
            message: Some("oops".to_string()),
        },
    };
    assert_eq!(other.user_message(), "oops");

    let unknown = QueryError::Backend {
        status: 500,
        payload: ErrorPayload::default(),
    };
    assert_eq!(
        unknown.user_message(),
        "An unknown error occurred while interacting with the chart."
    );
    assert_eq!(QueryError::Transport("timed out".to_string()).user_message(), "timed out");
}
