//! Descriptor of what a lines chart plots. Built by the caller before each mount,
//! read-only for the chart core.

use serde::{Deserialize, Serialize};

/// Date binning of a timeline dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateBinningMode {
    Automatic,
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    QuarterOfDay,
    QuarterOfHour,
    QuarterOfMinute,
}

impl DateBinningMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Year => "Year",
            Self::Quarter => "Quarter",
            Self::Month => "Month",
            Self::Week => "Week",
            Self::Day => "Day",
            Self::Hour => "Hour",
            Self::Minute => "Minute",
            Self::Second => "Second",
            Self::QuarterOfDay => "Quarter of day",
            Self::QuarterOfHour => "Quarter of hour",
            Self::QuarterOfMinute => "Quarter of minute",
        }
    }
}

/// How the x labels of a dimension are laid out on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionKind {
    /// Dates placed on a continuous time scale (by `ts_value`).
    Timeline { mode: DateBinningMode },
    /// Numerical bins, placed by `sort_value` unless one tick per bin is requested.
    BinnedNumerical {
        #[serde(default, rename = "oneTickPerBin")]
        one_tick_per_bin: bool,
    },
    UnbinnedNumerical,
    /// Alphanumerical values and ordinal dates: one band per label.
    Categorical,
}

impl DimensionKind {
    pub fn is_timeline(&self) -> bool {
        matches!(self, Self::Timeline { .. })
    }

    /// Only automatic timelines can be re-aggregated by the backend while zooming.
    pub fn is_interactive_candidate(&self) -> bool {
        matches!(
            self,
            Self::Timeline {
                mode: DateBinningMode::Automatic
            }
        )
    }

    pub fn is_continuous(&self) -> bool {
        match self {
            Self::Timeline { .. } | Self::UnbinnedNumerical => true,
            Self::BinnedNumerical { one_tick_per_bin } => !one_tick_per_bin,
            Self::Categorical => false,
        }
    }
}

/// Treatment of x bins holding zero records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmptyBinsMode {
    /// Empty bins are drawn as zero values and connected.
    Zeros,
    /// Empty bins are bridged by dashed segments.
    Dashed,
    /// Empty bins are left out of the line.
    #[default]
    #[serde(alias = "AVERAGE")]
    Omit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XDimension {
    pub column: String,
    #[serde(flatten)]
    pub kind: DimensionKind,
    #[serde(default)]
    pub empty_bins_mode: EmptyBinsMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub column: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayAxis {
    #[default]
    Axis1,
    Axis2,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDef {
    pub column: String,
    /// Aggregation function forwarded to the backend (`SUM`, `AVG`, ...).
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default)]
    pub display_axis: DisplayAxis,
    /// Measure computed as a percentage.
    #[serde(default)]
    pub percent: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Lines,
    StackedArea,
    MultiColumnsLines,
}

fn default_function() -> String {
    "SUM".to_string()
}

fn default_stroke_width() -> f32 {
    2.0
}

fn default_transparency() -> f32 {
    0.75
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    #[serde(rename = "type", default)]
    pub chart_type: ChartType,
    pub x_dimension: XDimension,
    #[serde(default)]
    pub color_dimension: Option<Dimension>,
    #[serde(default)]
    pub facet_dimension: Option<Dimension>,
    pub measures: Vec<MeasureDef>,
    #[serde(default)]
    pub smoothing: bool,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    /// Opacity of the line wrappers.
    #[serde(default = "default_transparency")]
    pub color_transparency: f32,
    /// Show the overview strip below the chart.
    #[serde(default)]
    pub brush: bool,
    #[serde(default)]
    pub include_zero: bool,
    #[serde(default)]
    pub axis1_log_scale: bool,
    #[serde(default)]
    pub use_live_processing_if_available: bool,
}

impl ChartDefinition {
    pub fn empty_bins_mode(&self) -> EmptyBinsMode {
        self.x_dimension.empty_bins_mode
    }

    /// Interactivity requires a lines chart over an automatic timeline.
    pub fn is_interactive(&self, disable_globally: bool) -> bool {
        if disable_globally || self.chart_type != ChartType::Lines {
            return false;
        }
        self.x_dimension.kind.is_interactive_candidate()
    }

    pub fn measure_axis(&self, measure: usize) -> DisplayAxis {
        self.measures
            .get(measure)
            .map(|m| m.display_axis)
            .unwrap_or_default()
    }

    pub fn has_axis(&self, axis: DisplayAxis) -> bool {
        self.measures.iter().any(|m| m.display_axis == axis)
    }

    /// Index of a (color, measure) pair in the line colour scale.
    pub fn color_index(&self, color: usize, measure: usize) -> usize {
        color * self.measures.len().max(1) + measure
    }
}
