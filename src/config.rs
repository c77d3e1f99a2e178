//! Tuning knobs for chart mounting, drawing and interaction.

use chrono_tz::Tz;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delays of the leading + trailing debounce applied to zoom re-queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub initial_delay_ms: u64,
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 300,
            delay_ms: 300,
        }
    }
}

impl DebounceConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinesChartConfig {
    /// Kill-switch: when set, every chart is mounted static.
    pub disable_interactivity_globally: bool,
    pub debounce: DebounceConfig,

    pub point_radius: f32,
    pub brush_point_radius: f32,
    pub brush_stroke_width: f32,
    pub lonely_point_radius: f32,
    pub dashed_lonely_point_radius: f32,
    /// Width of the invisible duplicate path used as hover target.
    pub hit_stroke_width: f32,
    pub dash_length: f32,
    /// Extra room above the clip rect so smoothed curves are not cut.
    pub clip_margin: f32,
    pub missing_area_opacity: f32,

    pub x_tick_count: usize,
    pub y_tick_count: usize,
    /// Rotation applied to x tick labels of interactive charts, in radians.
    pub label_rotation: f32,
    /// IANA name of the timezone used to format time ticks.
    pub timezone: String,
}

impl Default for LinesChartConfig {
    fn default() -> Self {
        Self {
            disable_interactivity_globally: false,
            debounce: DebounceConfig::default(),
            point_radius: 5.0,
            brush_point_radius: 1.0,
            brush_stroke_width: 1.0,
            lonely_point_radius: 4.0,
            dashed_lonely_point_radius: 2.5,
            hit_stroke_width: 10.0,
            dash_length: 12.0,
            clip_margin: 10.0,
            missing_area_opacity: 0.6,
            x_tick_count: 8,
            y_tick_count: 10,
            label_rotation: 0.5,
            timezone: "UTC".to_string(),
        }
    }
}

impl LinesChartConfig {
    /// Parses a (possibly partial) JSON configuration; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).wrap_err("invalid lines chart configuration")?;
        config.tz()?;
        Ok(config)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| eyre!("unknown timezone {:?}: {}", self.timezone, e))
    }

    /// Timezone used for tick formatting, UTC when the configured name is unknown.
    pub fn tz_or_utc(&self) -> Tz {
        self.tz().unwrap_or(Tz::UTC)
    }
}
