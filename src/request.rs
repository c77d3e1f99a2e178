//! Aggregation request sent to the pivot backend for a mount or a zoom re-query.

use crate::chart_def::{ChartDefinition, ChartType, DateBinningMode, DimensionKind};
use crate::zoom::ZoomState;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

pub const NO_MEASURE_MESSAGE: &str = "To finish your chart, please select what you want to display";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDateParams {
    pub mode: DateBinningMode,
    pub max_bin_number_for_automatic_mode: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAxis {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_params: Option<RequestDateParams>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableElementsLimits {
    pub all_axes: usize,
    pub facet: usize,
}

impl Default for DrawableElementsLimits {
    fn default() -> Self {
        Self {
            all_axes: 10_000,
            facet: 200,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAggregation {
    pub id: usize,
    pub column: String,
    pub function: String,
}

/// Date range restriction applied while a zoomed-in interval is re-queried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFilter {
    pub column: String,
    pub column_type: String,
    pub filter_type: String,
    pub date_filter_type: String,
    pub min_value: i64,
    pub max_value: i64,
}

impl RuntimeFilter {
    pub fn zoom_range(column: &str, min: f64, max: f64) -> Self {
        Self {
            column: column.to_string(),
            column_type: "DATE".to_string(),
            filter_type: "INTERACTIVE_DATE_FACET".to_string(),
            date_filter_type: "RANGE".to_string(),
            min_value: min.round() as i64,
            max_value: max.round() as i64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub axes: Vec<RequestAxis>,
    pub drawable_elements_limits: DrawableElementsLimits,
    pub aggregations: Vec<RequestAggregation>,
    pub count: bool,
    pub filters: Vec<RuntimeFilter>,
    pub sequence_id: u64,
    pub use_live_processing_if_available: bool,
}

impl PivotRequest {
    pub fn zoom_filter(&self) -> Option<&RuntimeFilter> {
        self.filters
            .iter()
            .find(|f| f.filter_type == "INTERACTIVE_DATE_FACET")
    }
}

/// Picks how many bins the backend may return for an automatic date axis.
pub trait BinCountStrategy: Send {
    /// `main` is true for the x axis, false for the color and facet axes.
    fn max_bins(&self, def: &ChartDefinition, main: bool, width: f32, height: f32) -> usize;
}

/// Fixed limits by chart type.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChartTypeBinLimit;

impl BinCountStrategy for ChartTypeBinLimit {
    fn max_bins(&self, def: &ChartDefinition, main: bool, _width: f32, _height: f32) -> usize {
        match (def.chart_type, main) {
            (ChartType::Lines | ChartType::StackedArea, true) => 1000,
            (ChartType::Lines | ChartType::StackedArea, false) => 10,
            (ChartType::MultiColumnsLines, true) => 30,
            (ChartType::MultiColumnsLines, false) => 10,
        }
    }
}

/// Caps the chart type limit of the main axis to one bin per `pixels_per_bin` pixels.
#[derive(Clone, Copy, Debug)]
pub struct PixelDensity {
    pub pixels_per_bin: f32,
}

impl Default for PixelDensity {
    fn default() -> Self {
        Self { pixels_per_bin: 2.0 }
    }
}

impl BinCountStrategy for PixelDensity {
    fn max_bins(&self, def: &ChartDefinition, main: bool, width: f32, height: f32) -> usize {
        let limit = ChartTypeBinLimit.max_bins(def, main, width, height);
        if !main || self.pixels_per_bin <= 0.0 {
            return limit;
        }
        let by_width = (width / self.pixels_per_bin).floor().max(1.0) as usize;
        limit.min(by_width)
    }
}

/// Builds the pivot request for the chart, restricted to the displayed interval
/// when a zoom state is given and zoom filtering is on.
pub fn compute_request(
    def: &ChartDefinition,
    width: f32,
    height: f32,
    zoom: Option<&ZoomState>,
    strategy: &dyn BinCountStrategy,
) -> Result<PivotRequest> {
    if def.measures.is_empty() {
        bail!(NO_MEASURE_MESSAGE);
    }
    if width <= 0.0 || height <= 0.0 {
        bail!("chart viewport is empty ({}x{})", width, height);
    }

    let date_params = |kind: &DimensionKind, main: bool| match kind {
        DimensionKind::Timeline { mode } => Some(RequestDateParams {
            mode: *mode,
            max_bin_number_for_automatic_mode: strategy.max_bins(def, main, width, height),
        }),
        _ => None,
    };

    let mut axes = vec![RequestAxis {
        column: def.x_dimension.column.clone(),
        date_params: date_params(&def.x_dimension.kind, true),
    }];
    for dim in [&def.color_dimension, &def.facet_dimension].into_iter().flatten() {
        axes.push(RequestAxis {
            column: dim.column.clone(),
            date_params: None,
        });
    }

    let aggregations = def
        .measures
        .iter()
        .enumerate()
        .map(|(id, m)| RequestAggregation {
            id,
            column: m.column.clone(),
            function: m.function.clone(),
        })
        .collect();

    let mut filters = Vec::new();
    if let Some(state) = zoom {
        if !state.disable_zoom_filtering && def.x_dimension.kind.is_timeline() {
            filters.push(RuntimeFilter::zoom_range(
                &def.x_dimension.column,
                state.display_interval.min,
                state.display_interval.max,
            ));
        }
    }

    Ok(PivotRequest {
        request_type: "AGGREGATED_ND".to_string(),
        axes,
        drawable_elements_limits: DrawableElementsLimits::default(),
        aggregations,
        count: true,
        filters,
        sequence_id: zoom.map_or(0, |s| s.sequence_id),
        use_live_processing_if_available: def.use_live_processing_if_available,
    })
}
