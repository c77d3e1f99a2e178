//! Pivot response wire format and the tensor accessor used by the drawers.

use crate::chart_def::{ChartDefinition, DateBinningMode, DisplayAxis};
use eyre::{eyre, Result, WrapErr};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisLabel {
    pub label: String,
    pub sort_value: f64,
    /// Bin timestamp in milliseconds, set for date axes.
    pub ts_value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A flattened N-dimensional array addressed through per-axis multipliers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TensorBlock {
    pub tensor: Vec<f64>,
    pub multipliers: Vec<usize>,
    /// Absent when the aggregation has no null value (the counts apply).
    pub non_null_counts: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateParams {
    pub mode: Option<DateBinningMode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseAxisDef {
    pub date_params: Option<DateParams>,
}

/// Result of one pivot query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PivotResponse {
    pub axis_labels: Vec<Vec<AxisLabel>>,
    pub axis_defs: Vec<ResponseAxisDef>,
    pub counts: TensorBlock,
    pub aggregations: Vec<TensorBlock>,
    pub after_filter_records: u64,
    /// Echo of the request's sequence id.
    pub sequence_id: Option<u64>,
}

impl PivotResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(json).wrap_err("invalid pivot response")?;
        if response.axis_labels.is_empty() {
            return Err(eyre!("pivot response has no axis"));
        }
        Ok(response)
    }

    /// Binning mode the backend picked for the main (x) date axis.
    pub fn main_binning_mode(&self) -> Option<DateBinningMode> {
        self.axis_defs
            .first()
            .and_then(|d| d.date_params.as_ref())
            .and_then(|p| p.mode)
    }

    /// A zoom response is only usable when the first axis has more than one label.
    pub fn has_enough_data(&self) -> bool {
        self.axis_labels.first().map_or(true, |labels| labels.len() != 1)
    }
}

/// Position of each logical axis in the response tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxesDef {
    pub x: usize,
    pub color: Option<usize>,
    pub facet: Option<usize>,
}

impl AxesDef {
    pub fn for_definition(def: &ChartDefinition) -> Self {
        let mut next = 1;
        let color = def.color_dimension.as_ref().map(|_| {
            next += 1;
            next - 1
        });
        let facet = def.facet_dimension.as_ref().map(|_| next);
        Self { x: 0, color, facet }
    }
}

/// Address of one cell, by logical axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coords {
    pub x: usize,
    pub color: usize,
    pub facet: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
    pub only_percent: bool,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            only_percent: true,
        }
    }
}

impl Extent {
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeasureExtents {
    pub y1: Extent,
    pub y2: Extent,
    pub records_count: f64,
    /// Number of non-empty bins in range.
    pub points_count: usize,
}

/// Read-only view over a pivot response.
#[derive(Clone, Debug)]
pub struct ChartTensorData {
    response: PivotResponse,
    axes: AxesDef,
}

impl ChartTensorData {
    pub fn new(response: PivotResponse, axes: AxesDef) -> Self {
        Self { response, axes }
    }

    pub fn response(&self) -> &PivotResponse {
        &self.response
    }

    pub fn axes(&self) -> AxesDef {
        self.axes
    }

    pub fn x_labels(&self) -> &[AxisLabel] {
        self.axis_labels(Some(self.axes.x))
    }

    pub fn color_labels(&self) -> Option<&[AxisLabel]> {
        self.axes.color.map(|idx| self.axis_labels(Some(idx)))
    }

    pub fn facet_labels(&self) -> Option<&[AxisLabel]> {
        self.axes.facet.map(|idx| self.axis_labels(Some(idx)))
    }

    fn axis_labels(&self, idx: Option<usize>) -> &[AxisLabel] {
        idx.and_then(|i| self.response.axis_labels.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn coords_loc(&self, block: &TensorBlock, coords: Coords) -> usize {
        let mut loc = 0;
        let mut add = |axis: Option<usize>, coord: usize| {
            if let Some(m) = axis.and_then(|a| block.multipliers.get(a)) {
                loc += coord * m;
            }
        };
        add(Some(self.axes.x), coords.x);
        add(self.axes.color, coords.color);
        add(self.axes.facet, coords.facet);
        loc
    }

    /// Aggregated value of a measure, NaN when the cell is missing.
    pub fn aggr(&self, measure: usize, coords: Coords) -> f64 {
        self.response
            .aggregations
            .get(measure)
            .and_then(|block| block.tensor.get(self.coords_loc(block, coords)))
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn count(&self, coords: Coords) -> f64 {
        let block = &self.response.counts;
        block
            .tensor
            .get(self.coords_loc(block, coords))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn non_null_count(&self, coords: Coords, measure: usize) -> f64 {
        match self.response.aggregations.get(measure) {
            Some(block) => match &block.non_null_counts {
                Some(counts) => counts
                    .get(self.coords_loc(block, coords))
                    .copied()
                    .unwrap_or(0.0),
                None => self.count(coords),
            },
            None => 0.0,
        }
    }

    /// Whether the flat tensor index belongs to an x bin whose timestamp lies in `range`.
    /// The trailing "others" bin of each axis is never in range.
    fn in_timestamp_range(&self, index: usize, block: &TensorBlock, range: Option<(f64, f64)>) -> bool {
        let Some((lo, hi)) = range else {
            return true;
        };
        let labels = self.x_labels();
        let multiplier = block.multipliers.get(self.axes.x).copied().unwrap_or(1).max(1);
        let label_idx = (index / multiplier) % (labels.len() + 1);
        match labels.get(label_idx) {
            Some(label) => label.ts_value >= lo && label.ts_value <= hi,
            None => false,
        }
    }

    /// Min and max of every measure over non-empty bins, per display axis, optionally
    /// restricted to x bins whose timestamp lies in `range`.
    pub fn measure_extents(&self, def: &ChartDefinition, range: Option<(f64, f64)>) -> MeasureExtents {
        let counts = &self.response.counts;
        let per_measure: Vec<(DisplayAxis, bool, f64, f64)> = def
            .measures
            .par_iter()
            .enumerate()
            .map(|(idx, measure)| {
                let (min, max) = self
                    .response
                    .aggregations
                    .get(idx)
                    .map(|block| {
                        block
                            .tensor
                            .iter()
                            .enumerate()
                            .filter(|(i, v)| {
                                !v.is_nan()
                                    && counts.tensor.get(*i).copied().unwrap_or(0.0) != 0.0
                                    && self.in_timestamp_range(*i, counts, range)
                            })
                            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
                                (lo.min(*v), hi.max(*v))
                            })
                    })
                    .unwrap_or((f64::INFINITY, f64::NEG_INFINITY));
                (measure.display_axis, measure.percent, min, max)
            })
            .collect();

        let mut result = MeasureExtents::default();
        for (axis, percent, min, max) in per_measure {
            let extent = match axis {
                DisplayAxis::Axis1 => &mut result.y1,
                DisplayAxis::Axis2 => &mut result.y2,
            };
            extent.only_percent &= percent;
            extent.min = extent.min.min(min);
            extent.max = extent.max.max(max);
        }

        for (i, count) in counts.tensor.iter().enumerate() {
            if *count != 0.0 && self.in_timestamp_range(i, counts, range) {
                result.records_count += count;
                result.points_count += 1;
            }
        }
        result
    }

    /// Min and max of the x labels, by timestamp for timelines or by sort value otherwise.
    pub fn x_extent(&self, by_timestamp: bool) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for label in self.x_labels() {
            if by_timestamp {
                if label.ts_value != 0.0 {
                    lo = lo.min(label.ts_value);
                    hi = hi.max(label.ts_value);
                }
            } else {
                lo = lo.min(label.min.unwrap_or(label.sort_value));
                hi = hi.max(label.max.unwrap_or(label.sort_value));
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}
