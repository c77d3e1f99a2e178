mod common;

use common::*;
use lines_chart::lines_utils::{get_empty_segments, PointDatum};
use lines_chart::scene::{LineKey, LineWrapper};
use lines_chart::tensor::{AxesDef, AxisLabel, ChartTensorData, Coords, PivotResponse, TensorBlock};
use lines_chart::zoom::ZoomEvent;
use lines_chart::{Interval, LinesChart};

const LINE: LineKey = LineKey { color: 0, measure: 0 };

fn points(filtered: &[bool]) -> Vec<PointDatum> {
    filtered
        .iter()
        .enumerate()
        .map(|(x, f)| PointDatum {
            x,
            color: 0,
            measure: 0,
            filtered: *f,
        })
        .collect()
}

fn def_with_mode(mode: &str) -> lines_chart::ChartDefinition {
    def_from(&format!(
        r#"{{"xDimension":{{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC","emptyBinsMode":"{}"}},"measures":[{{"column":"v"}}]}}"#,
        mode
    ))
}

fn line(chart: &LinesChart) -> &LineWrapper {
    chart.frame().facets[0].surface.wrapper(LINE).unwrap()
}

#[test]
fn gap_between_two_values_is_one_segment() {
    let pts = points(&[false, true, true, false]);
    let result = get_empty_segments(&pts);
    assert_eq!(result.segments, vec![(pts[0], pts[3])]);
    assert!(result.lonely.is_empty());
}

#[test]
fn runs_at_both_ends_make_lonely_points() {
    let pts = points(&[true, false, false, true]);
    let result = get_empty_segments(&pts);
    assert!(result.segments.is_empty());
    assert_eq!(result.lonely, vec![pts[0], pts[3]]);
}

#[test]
fn empty_series_has_no_segments() {
    let result = get_empty_segments(&points(&[true, true, true]));
    assert!(result.segments.is_empty());
    assert!(result.lonely.is_empty());
}

#[test]
fn dashed_mode_bridges_empty_bins() {
    let chart = mount(
        def_with_mode("DASHED"),
        response_with_gaps(1000.0, 900.0, 10, &[3, 4], None),
    );
    let wrapper = line(&chart);

    assert_eq!(wrapper.line.subpaths.len(), 2);
    assert_eq!(wrapper.line.subpaths[0].len(), 3);
    assert_eq!(wrapper.line.subpaths[1].len(), 5);
    assert_eq!(wrapper.dashed.subpaths.len(), 1);
    assert_eq!(wrapper.dashed.dash, Some(12.0));
    assert_eq!(wrapper.dashed.subpaths[0][0], wrapper.line.subpaths[0][2]);
    assert!(wrapper.lonely.is_empty());
    assert_eq!(wrapper.points.len(), 8);
    assert!(wrapper.points.iter().all(|p| p.opacity == 0.0));
    assert!(!wrapper.hit_dashed.visible);
}

#[test]
fn dashed_mode_marks_edge_points() {
    let chart = mount(
        def_with_mode("DASHED"),
        response_with_gaps(1000.0, 900.0, 10, &[0, 1, 9], None),
    );
    let wrapper = line(&chart);
    let lonely: Vec<usize> = wrapper.lonely.iter().map(|c| c.x_index).collect();
    assert_eq!(lonely, vec![0, 9]);
    assert!(wrapper.lonely.iter().all(|c| c.radius == 2.5 && c.opacity == 1.0));
}

#[test]
fn zeros_mode_connects_every_bin() {
    let chart = mount(
        def_with_mode("ZEROS"),
        response_with_gaps(1000.0, 900.0, 10, &[3, 4], None),
    );
    let wrapper = line(&chart);
    assert_eq!(wrapper.line.subpaths.len(), 1);
    assert_eq!(wrapper.line.subpaths[0].len(), 10);
    assert!(wrapper.dashed.subpaths.is_empty());
    assert_eq!(wrapper.points.len(), 10);
}

#[test]
fn default_mode_skips_empty_bins() {
    let chart = mount(timeline_def(), response_with_gaps(1000.0, 900.0, 10, &[3, 4], None));
    let wrapper = line(&chart);
    assert_eq!(wrapper.line.subpaths.len(), 1);
    assert_eq!(wrapper.line.subpaths[0].len(), 8);
    assert!(wrapper.dashed.subpaths.is_empty());
    assert!(wrapper.lonely.is_empty());
}

#[test]
fn single_value_is_drawn_as_a_point() {
    let empty: Vec<usize> = (0..10).filter(|i| *i != 6).collect();
    let chart = mount(timeline_def(), response_with_gaps(1000.0, 900.0, 10, &empty, None));
    let wrapper = line(&chart);
    assert_eq!(wrapper.lonely.len(), 1);
    assert_eq!(wrapper.lonely[0].x_index, 6);
    assert_eq!(wrapper.lonely[0].radius, 4.0);
}

#[test]
fn interactive_redraw_drops_points_and_keeps_wrappers() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let created = chart.frame().facets[0].surface.stats.wrappers_created;
    assert_eq!(line(&chart).points.len(), 50);
    assert!(line(&chart).clipped);

    chart.zoom_start(None);
    chart.zoom(
        ZoomEvent {
            scale: 2.0,
            translate: (0.0, 0.0),
        },
        Interval::new(1250.0, 1750.0),
    );

    let surface = &chart.frame().facets[0].surface;
    assert_eq!(surface.stats.wrappers_created, created);
    assert!(line(&chart).points.is_empty());
    assert!(surface.clip.is_some());
    let first = line(&chart).line.subpaths[0][0];
    assert!(first.x < 0.0);
}

#[test]
fn hovering_a_line_emphasizes_it() {
    let mut chart = mount_timeline(1000.0, 1000.0);
    let on_line = line(&chart).line.subpaths[0][10];

    assert_eq!(chart.hover(0, on_line), Some(LINE));
    assert!(line(&chart).emphasized);
    assert_eq!(line(&chart).line.stroke_width, 3.0);
    assert!(line(&chart).points.iter().all(|p| p.opacity == 1.0));

    chart.hover_out();
    assert!(!line(&chart).emphasized);
    assert_eq!(chart.hover(3, on_line), None);
}

#[test]
fn static_chart_is_not_clipped() {
    let def = def_from(r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"DAY"},"measures":[{"column":"v"}]}"#);
    let chart = mount(def, timeline_response(1000.0, 1000.0, None));
    assert!(chart.frame().facets[0].surface.clip.is_none());
    assert!(!line(&chart).clipped);
    assert!(!chart.frame().facets[0].surface.hlines.is_empty());
}

#[test]
fn zero_is_drawn_as_one_on_a_log_axis() {
    let def = def_from(
        r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[{"column":"v"}],"axis1LogScale":true}"#,
    );
    let mut response = response_with_gaps(1000.0, 900.0, 10, &[], None);
    response.aggregations[0].tensor[3] = 0.0;
    let chart = mount(def, response);

    let axis = chart.frame().y_axis.as_ref().unwrap();
    assert!(axis.scale.is_log());
    let points = &line(&chart).line.subpaths[0];
    assert_eq!(points.len(), 10);
    assert!((points[3].y - axis.map(1.0)).abs() < 1e-3);
    assert!((points[3].y - HEIGHT).abs() < 1e-3);
}

#[test]
fn axis2_measures_use_the_second_axis() {
    let def = def_from(
        r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[{"column":"v"},{"column":"w","displayAxis":"axis2"}]}"#,
    );
    let mut response = response_with_gaps(1000.0, 900.0, 10, &[], None);
    let second: Vec<f64> = response.aggregations[0].tensor.iter().map(|v| v * 100.0).collect();
    response.aggregations.push(TensorBlock {
        tensor: second,
        multipliers: vec![1],
        non_null_counts: None,
    });
    let chart = mount(def, response);
    let frame = chart.frame();

    let y1 = frame.y_axis.as_ref().unwrap();
    let y2 = frame.y2_axis.as_ref().unwrap();
    assert_eq!(y1.domain(), (10.0, 16.0));
    assert_eq!(y2.domain(), (1000.0, 1600.0));

    let wrapper = frame.facets[0].surface.wrapper(LineKey { color: 0, measure: 1 }).unwrap();
    let points = &wrapper.line.subpaths[0];
    for (x, p) in points.iter().enumerate() {
        let value = (10 + x % 7) as f64 * 100.0;
        assert!((p.y - y2.map(value)).abs() < 1e-3);
        assert!((0.0..=HEIGHT).contains(&p.y));
    }
}

const X_BINS: usize = 5;

/// x by color by facet tensor, two labels on the color and facet axes, an "others"
/// bin on each axis. Cell value is `100 * facet + 10 * color + x`.
fn faceted_response() -> PivotResponse {
    let x_labels: Vec<AxisLabel> = (0..X_BINS)
        .map(|i| {
            let ts = 1000.0 + 100.0 * i as f64;
            AxisLabel {
                label: format!("{}", ts),
                sort_value: ts,
                ts_value: ts,
                ..Default::default()
            }
        })
        .collect();
    let names = |prefix: &str| -> Vec<AxisLabel> {
        (0..2)
            .map(|i| AxisLabel {
                label: format!("{}{}", prefix, i),
                sort_value: i as f64,
                ..Default::default()
            })
            .collect()
    };

    let multipliers = vec![1, X_BINS + 1, (X_BINS + 1) * 3];
    let mut counts = vec![0.0; (X_BINS + 1) * 3 * 3];
    let mut values = vec![0.0; counts.len()];
    for facet in 0..2 {
        for color in 0..2 {
            for x in 0..X_BINS {
                let loc = x * multipliers[0] + color * multipliers[1] + facet * multipliers[2];
                counts[loc] = 1.0;
                values[loc] = (100 * facet + 10 * color + x) as f64;
            }
        }
    }

    PivotResponse {
        axis_labels: vec![x_labels, names("c"), names("f")],
        after_filter_records: counts.iter().sum::<f64>() as u64,
        counts: TensorBlock {
            tensor: counts,
            multipliers: multipliers.clone(),
            non_null_counts: None,
        },
        aggregations: vec![TensorBlock {
            tensor: values,
            multipliers,
            non_null_counts: None,
        }],
        ..Default::default()
    }
}

fn faceted_def() -> lines_chart::ChartDefinition {
    def_from(
        r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"colorDimension":{"column":"c"},"facetDimension":{"column":"f"},"measures":[{"column":"v"}]}"#,
    )
}

#[test]
fn color_and_facet_cells_are_addressed_by_multipliers() {
    let def = faceted_def();
    let data = ChartTensorData::new(faceted_response(), AxesDef::for_definition(&def));

    let cell = Coords { x: 3, color: 1, facet: 1 };
    assert_eq!(data.aggr(0, cell), 113.0);
    assert_eq!(data.count(cell), 1.0);
    assert_eq!(data.count(Coords { x: X_BINS, color: 1, facet: 1 }), 0.0);
    assert_eq!(data.count(Coords { x: 0, color: 2, facet: 0 }), 0.0);

    let all = data.measure_extents(&def, None);
    assert_eq!(all.y1.as_tuple(), (0.0, 114.0));
    assert_eq!(all.points_count, 20);

    let ranged = data.measure_extents(&def, Some((1100.0, 1300.0)));
    assert_eq!(ranged.y1.as_tuple(), (1.0, 113.0));
    assert_eq!(ranged.points_count, 12);
    assert_eq!(ranged.records_count, 12.0);
}

#[test]
fn every_facet_draws_every_color() {
    let chart = mount(faceted_def(), faceted_response());
    let frame = chart.frame();
    assert_eq!(frame.facets.len(), 2);
    assert_eq!(frame.facets[1].label.as_deref(), Some("f1"));
    let y = frame.y_axis.as_ref().unwrap();

    for (facet_idx, facet) in frame.facets.iter().enumerate() {
        for color in 0..2 {
            let wrapper = facet.surface.wrapper(LineKey { color, measure: 0 }).unwrap();
            let points = &wrapper.line.subpaths[0];
            assert_eq!(points.len(), X_BINS);
            let expected = (100 * facet_idx + 10 * color) as f64;
            assert!((points[0].y - y.map(expected)).abs() < 1e-3);
        }
    }
}

#[test]
fn smoothing_passes_through_every_bin_without_overshoot() {
    let straight = mount(timeline_def(), response_with_gaps(1000.0, 900.0, 10, &[], None));
    let def = def_from(
        r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[{"column":"v"}],"smoothing":true}"#,
    );
    let smooth = mount(def, response_with_gaps(1000.0, 900.0, 10, &[], None));

    let knots = &line(&straight).line.subpaths[0];
    let curve = &line(&smooth).line.subpaths[0];
    let steps = (curve.len() - 1) / (knots.len() - 1);
    assert!(steps > 1);
    assert_eq!(curve.len(), (knots.len() - 1) * steps + 1);

    for (i, knot) in knots.iter().enumerate() {
        assert!(curve[i * steps].distance(*knot) < 1e-3);
    }
    for (i, w) in knots.windows(2).enumerate() {
        let (lo, hi) = (w[0].y.min(w[1].y), w[0].y.max(w[1].y));
        for p in &curve[i * steps..=(i + 1) * steps] {
            assert!(p.y >= lo - 1e-3 && p.y <= hi + 1e-3);
        }
    }
}
