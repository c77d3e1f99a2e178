#![allow(dead_code)]

use lines_chart::chart::LinesChart;
use lines_chart::chart_def::ChartDefinition;
use lines_chart::config::LinesChartConfig;
use lines_chart::drawer::ChartViewport;
use lines_chart::tensor::{AxisLabel, PivotResponse, TensorBlock};
use lines_chart::theme::ChartTheme;

pub const WIDTH: f32 = 800.0;
pub const HEIGHT: f32 = 400.0;

pub fn timeline_def() -> ChartDefinition {
    def_from(r#"{"xDimension":{"column":"ts","kind":"TIMELINE","mode":"AUTOMATIC"},"measures":[{"column":"v"}]}"#)
}

pub fn def_from(json: &str) -> ChartDefinition {
    serde_json::from_str(json).unwrap()
}

/// `n` timeline bins evenly spread over `[start, start + span]`, one measure,
/// with zero records in the bins listed in `empty`.
pub fn response_with_gaps(start: f64, span: f64, n: usize, empty: &[usize], sequence_id: Option<u64>) -> PivotResponse {
    let step = span / (n.max(2) - 1) as f64;
    let labels = (0..n)
        .map(|i| {
            let ts = if i + 1 == n { start + span } else { start + i as f64 * step };
            AxisLabel {
                label: format!("{}", ts),
                sort_value: ts,
                ts_value: ts,
                ..Default::default()
            }
        })
        .collect();

    let mut counts: Vec<f64> = (0..n).map(|i| if empty.contains(&i) { 0.0 } else { 3.0 }).collect();
    let mut values: Vec<f64> = (0..n)
        .map(|i| if empty.contains(&i) { 0.0 } else { 10.0 + (i % 7) as f64 })
        .collect();
    // "others" bin
    counts.push(0.0);
    values.push(0.0);

    PivotResponse {
        axis_labels: vec![labels],
        after_filter_records: counts.iter().sum::<f64>() as u64,
        counts: TensorBlock {
            tensor: counts,
            multipliers: vec![1],
            non_null_counts: None,
        },
        aggregations: vec![TensorBlock {
            tensor: values,
            multipliers: vec![1],
            non_null_counts: None,
        }],
        sequence_id,
        ..Default::default()
    }
}

pub fn timeline_response(start: f64, span: f64, sequence_id: Option<u64>) -> PivotResponse {
    response_with_gaps(start, span, 50, &[], sequence_id)
}

pub fn mount(def: ChartDefinition, response: PivotResponse) -> LinesChart {
    LinesChart::mount(
        def,
        response,
        ChartViewport::new(WIDTH, HEIGHT),
        LinesChartConfig::default(),
        ChartTheme::default(),
    )
    .unwrap()
}

/// Interactive timeline chart over `[start, start + span]` with 50 bins.
pub fn mount_timeline(start: f64, span: f64) -> LinesChart {
    mount(timeline_def(), timeline_response(start, span, None))
}
