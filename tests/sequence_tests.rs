mod common;

use common::*;
use lines_chart::error::{ErrorPayload, QueryError};
use lines_chart::query::{QueryBackend, QueryChannel};
use lines_chart::request::PivotRequest;
use lines_chart::zoom::{ZoomEvent, ZoomPhase};
use lines_chart::{Interval, LinesChart};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Runs `n` zoom-in gestures, each dispatched before the next starts.
fn dispatch_gestures(
    chart: &mut LinesChart,
    channel: &mut QueryChannel,
    backend: &QueryBackend,
    n: u64,
    start: Instant,
) -> Vec<PivotRequest> {
    let mut requests = Vec::new();
    for k in 1..=n {
        let at = start + Duration::from_secs(k);
        let inset = 40.0 * k as f64;
        chart.zoom_start(None);
        chart.zoom(
            ZoomEvent {
                scale: 1.0 + k as f64,
                translate: (0.0, 0.0),
            },
            Interval::new(1000.0 + inset, 2000.0 - inset),
        );
        assert!(chart.zoom_end(None, at));
        chart.poll(at + Duration::from_millis(400), channel);
        requests.push(backend.next_request().unwrap());
    }
    requests
}

fn answer(request: &PivotRequest) -> lines_chart::query::QueryResult {
    let filter = request.zoom_filter().unwrap();
    Ok(timeline_response(
        filter.min_value as f64,
        (filter.max_value - filter.min_value) as f64,
        Some(request.sequence_id),
    ))
}

#[test]
fn only_the_latest_response_is_applied() {
    for seed in 0..8 {
        let mut chart = mount_timeline(1000.0, 1000.0);
        let (mut channel, backend) = QueryChannel::new();
        let start = Instant::now();

        let requests = dispatch_gestures(&mut chart, &mut channel, &backend, 6, start);
        let latest = requests.last().unwrap().clone();
        let ids: Vec<u64> = requests.iter().map(|r| r.sequence_id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let mut shuffled = requests.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        for request in &shuffled {
            backend.respond(answer(request));
        }

        let summary = chart.poll(start + Duration::from_secs(60), &mut channel);
        assert!(summary.remounted);
        assert_eq!(summary.stale, requests.len() - 1);

        let filter = latest.zoom_filter().unwrap();
        let state = chart.zoom_state().unwrap();
        assert_eq!(state.sequence_id, latest.sequence_id);
        assert_eq!(
            state.loaded_interval,
            Interval::new(filter.min_value as f64, filter.max_value as f64)
        );
        assert_eq!(state.data_interval, Interval::new(1000.0, 2000.0));
        assert!(!state.offline_zoom_disabled);
        assert!(!chart.ui().loading);
    }
}

#[test]
fn response_of_a_superseded_gesture_is_dropped() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let (mut channel, backend) = QueryChannel::new();
    let start = Instant::now();

    let requests = dispatch_gestures(&mut chart, &mut channel, &backend, 1, start);
    chart.zoom_start(None);

    backend.respond(answer(&requests[0]));
    let summary = chart.poll(start + Duration::from_secs(10), &mut channel);
    assert!(!summary.remounted);
    assert_eq!(summary.stale, 1);
    assert_eq!(chart.zoom_state().unwrap().loaded_interval, Interval::new(1000.0, 2000.0));
}

#[test]
fn remount_shades_the_unloaded_part_of_the_data() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let (mut channel, backend) = QueryChannel::new();
    let start = Instant::now();

    let requests = dispatch_gestures(&mut chart, &mut channel, &backend, 1, start);
    backend.respond(answer(&requests[0]));
    chart.poll(start + Duration::from_secs(10), &mut channel);

    let surface = &chart.frame().facets[0].surface;
    assert_eq!(surface.left_missing.width, 0.0);
    assert_eq!(chart.frame().x_domain(), Interval::new(1040.0, 1960.0));
    assert_eq!(chart.zoom_state().unwrap().phase, ZoomPhase::Idle);

    chart.zoom_start(None);
    chart.zoom(
        ZoomEvent {
            scale: 0.5,
            translate: (0.0, 0.0),
        },
        Interval::new(900.0, 2100.0),
    );
    let state = chart.zoom_state().unwrap();
    assert_eq!(state.display_interval, Interval::new(1000.0, 2000.0));
    assert!(state.disable_zoom_filtering);
    let surface = &chart.frame().facets[0].surface;
    assert!(surface.left_missing.width > 0.0);
    assert!(surface.right_missing.width > 0.0);
}

#[test]
fn backend_error_keeps_the_chart_and_reports() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let (mut channel, backend) = QueryChannel::new();
    let start = Instant::now();

    let _ = dispatch_gestures(&mut chart, &mut channel, &backend, 1, start);
    let display = chart.zoom_state().unwrap().display_interval;
    backend.respond(Err(QueryError::Backend {
        status: 500,
        payload: ErrorPayload {
            error_type: Some("ApplicativeException".to_string()),
            message: Some("Engine crashed".to_string()),
        },
    }));
    let summary = chart.poll(start + Duration::from_secs(10), &mut channel);

    assert!(!summary.remounted);
    assert_eq!(chart.indicator().error.as_deref(), Some("Engine crashed"));
    assert_eq!(chart.ui().chart_top_right_label, "No records");
    assert!(!chart.ui().loading);
    assert_eq!(chart.zoom_state().unwrap().display_interval, display);
    assert_eq!(chart.frame().x_domain(), display);
}

#[test]
fn single_label_response_is_ignored() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let (mut channel, backend) = QueryChannel::new();
    let start = Instant::now();

    let requests = dispatch_gestures(&mut chart, &mut channel, &backend, 1, start);
    backend.respond(Ok(response_with_gaps(
        1500.0,
        0.0,
        1,
        &[],
        Some(requests[0].sequence_id),
    )));
    let summary = chart.poll(start + Duration::from_secs(10), &mut channel);

    assert!(!summary.remounted);
    assert_eq!(summary.stale, 0);
    assert!(chart.indicator().error.is_none());
    assert_eq!(chart.zoom_state().unwrap().loaded_interval, Interval::new(1000.0, 2000.0));
}

#[test]
fn superseded_single_label_response_leaves_pending_query_alone() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let (mut channel, backend) = QueryChannel::new();
    let start = Instant::now();

    let requests = dispatch_gestures(&mut chart, &mut channel, &backend, 1, start);
    let at = start + Duration::from_secs(2);
    chart.zoom_start(None);
    chart.zoom(
        ZoomEvent {
            scale: 3.0,
            translate: (0.0, 0.0),
        },
        Interval::new(1080.0, 1920.0),
    );
    assert!(chart.zoom_end(None, at));
    assert_eq!(chart.zoom_state().unwrap().phase, ZoomPhase::AwaitingQuery);

    backend.respond(Ok(response_with_gaps(
        1500.0,
        0.0,
        1,
        &[],
        Some(requests[0].sequence_id),
    )));
    let summary = chart.poll(at + Duration::from_millis(10), &mut channel);

    assert_eq!(summary.stale, 1);
    assert!(!summary.dispatched);
    assert_eq!(chart.zoom_state().unwrap().phase, ZoomPhase::AwaitingQuery);
    assert!(chart.ui().hide_aggregations_metrics);
    assert!(chart.ui().loading);
}
