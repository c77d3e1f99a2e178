//! Axis = scale + tick generation + tick formatting.

use crate::scales::ChartScale;
use crate::utils::date_formatter::{compute_date_display, format_timestamp, DateDisplayUnit};
use chrono_tz::Tz;

#[derive(Clone, Debug, PartialEq)]
pub enum TickFormat {
    Numeric,
    Percent,
    Time { unit: DateDisplayUnit, tz: Tz },
    /// Category names, indexed by band.
    Category(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub position: f32,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct Axis {
    pub scale: ChartScale,
    pub tick_count: usize,
    pub format: TickFormat,
    /// Column name shown under the axis.
    pub base_title: String,
    /// Title actually displayed, possibly suffixed with the shared date.
    pub title: String,
    /// Tick label rotation in radians.
    pub label_rotation: f32,
}

impl Axis {
    pub fn new(scale: ChartScale, tick_count: usize, format: TickFormat, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            scale,
            tick_count,
            format,
            base_title: title.clone(),
            title,
            label_rotation: 0.0,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.scale.domain()
    }

    pub fn set_domain(&mut self, min: f64, max: f64) {
        self.scale = self.scale.with_domain(min, max);
    }

    pub fn map(&self, value: f64) -> f32 {
        self.scale.map(value)
    }

    pub fn tick_values(&self) -> Vec<f64> {
        self.scale.ticks(self.tick_count)
    }

    pub fn ticks(&self) -> Vec<Tick> {
        self.tick_values()
            .into_iter()
            .map(|value| Tick {
                value,
                position: self.scale.map(value),
                label: self.format_value(value),
            })
            .collect()
    }

    pub fn format_value(&self, value: f64) -> String {
        match &self.format {
            TickFormat::Time { unit, tz } => format_timestamp(value, unit.date_format(), *tz),
            TickFormat::Category(names) => names.get(value as usize).cloned().unwrap_or_default(),
            TickFormat::Percent => format!("{:.0}%", value * 100.0),
            TickFormat::Numeric => {
                if value.abs() < 0.001 && value.abs() > 0.0 {
                    format!("{:.4}", value)
                } else if value.abs() > 1000.0 || value.fract() == 0.0 {
                    format!("{:.0}", value)
                } else {
                    format!("{:.2}", value)
                }
            }
        }
    }

    /// Re-picks the time granularity for the current domain and appends the shared
    /// date to the title. No-op for non-time axes or a non-finite domain.
    pub fn update_time_format(&mut self) {
        let TickFormat::Time { tz, .. } = self.format else {
            return;
        };
        let (min, max) = self.domain();
        if !min.is_finite() || !max.is_finite() {
            return;
        }
        let display = compute_date_display(min, max, tz);
        self.title = match display.formatted_main_date {
            Some(date) => format!("{} ({})", self.base_title, date),
            None => self.base_title.clone(),
        };
        self.format = TickFormat::Time {
            unit: display.unit,
            tz,
        };
    }
}
