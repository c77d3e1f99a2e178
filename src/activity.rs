//! Status shown around the chart: records label, loader, backend errors, brush data.

use crate::lines_utils::Interval;
use crate::tensor::PivotResponse;
use tracing::warn;

pub const NO_RECORDS: &str = "No records";

/// Sink for status messages raised during an interaction.
pub trait ActivityIndicator {
    fn display_backend_error(&mut self, message: &str);
    fn clear(&mut self);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartActivityIndicator {
    pub error: Option<String>,
}

impl ActivityIndicator for ChartActivityIndicator {
    fn display_backend_error(&mut self, message: &str) {
        warn!(message, "backend error during chart interaction");
        self.error = Some(message.to_string());
    }

    fn clear(&mut self) {
        self.error = None;
    }
}

/// What the brush strip needs to place its selection window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushData {
    pub data_interval: Interval,
    pub display_interval: Interval,
    /// Selection snaps to these bounds when released close to them.
    pub snap_ranges: Interval,
    pub width: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiDisplayState {
    pub chart_top_right_label: String,
    /// Aggregation metrics are dimmed while the view differs from the loaded data.
    pub hide_aggregations_metrics: bool,
    pub loading: bool,
    pub display_brush: bool,
    pub brush_data: Option<BrushData>,
}

impl UiDisplayState {
    pub fn set_brush_display_interval(&mut self, interval: Interval) {
        if let Some(brush) = self.brush_data.as_mut() {
            brush.display_interval = interval;
        }
    }

    /// Clears the feedback shown while an interaction is in progress.
    pub fn clean_feedback(&mut self) {
        self.hide_aggregations_metrics = false;
        self.loading = false;
    }
}

pub fn label_for_records_count(count: u64) -> String {
    match count {
        0 => NO_RECORDS.to_string(),
        1 => "1 record".to_string(),
        n => format!("{} records", n),
    }
}

/// Description of the binning the backend picked for an automatic main date axis.
pub fn main_automatic_binning_mode_label(response: &PivotResponse) -> Option<&'static str> {
    response.main_binning_mode().map(|mode| mode.label())
}

/// Records label, followed by the binning mode when the chart re-aggregates on zoom.
pub fn compute_chart_top_right_label(
    records: u64,
    binning_mode_label: Option<&str>,
    interactive_automatic: bool,
) -> String {
    let label = label_for_records_count(records);
    match binning_mode_label {
        Some(mode) if interactive_automatic && records > 0 => format!("{} ({})", label, mode),
        _ => label,
    }
}

pub fn compute_no_records_top_right_label() -> String {
    NO_RECORDS.to_string()
}
