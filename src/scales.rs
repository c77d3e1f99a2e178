use d3rs::scale::{LinearScale, Scale as D3Scale};
use std::fmt;

/// Mapping between data values and device pixels along one axis.
#[derive(Clone)]
pub enum ChartScale {
    Linear {
        scale: LinearScale,
        domain: (f64, f64),
        range: (f32, f32),
    },
    /// Base-10 log scale, evaluated as a linear scale over the log domain.
    Log {
        scale: LinearScale,
        domain: (f64, f64),
        range: (f32, f32),
    },
    /// One band per category; values are band indices.
    Band { count: usize, range: (f32, f32) },
}

impl fmt::Debug for ChartScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear { domain, range, .. } => f
                .debug_struct("Linear")
                .field("domain", domain)
                .field("range", range)
                .finish(),
            Self::Log { domain, range, .. } => f
                .debug_struct("Log")
                .field("domain", domain)
                .field("range", range)
                .finish(),
            Self::Band { count, range } => f
                .debug_struct("Band")
                .field("count", count)
                .field("range", range)
                .finish(),
        }
    }
}

fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

impl ChartScale {
    pub fn new_linear(domain: (f64, f64), range: (f32, f32)) -> Self {
        let (d_min, d_max) = widen_degenerate(domain.0, domain.1);
        let scale = LinearScale::new()
            .domain(d_min, d_max)
            .range(range.0 as f64, range.1 as f64);
        Self::Linear {
            scale,
            domain: (d_min, d_max),
            range,
        }
    }

    pub fn new_log(domain: (f64, f64), range: (f32, f32)) -> Self {
        let d_min = if domain.0 > 0.0 { domain.0 } else { 1.0 };
        let d_max = if domain.1 > d_min { domain.1 } else { d_min * 10.0 };
        let scale = LinearScale::new()
            .domain(d_min.log10(), d_max.log10())
            .range(range.0 as f64, range.1 as f64);
        Self::Log {
            scale,
            domain: (d_min, d_max),
            range,
        }
    }

    pub fn new_band(count: usize, range: (f32, f32)) -> Self {
        Self::Band { count, range }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    pub fn map(&self, value: f64) -> f32 {
        let res = match self {
            Self::Linear { scale, .. } => scale.scale(value) as f32,
            Self::Log { scale, .. } => scale.scale(value.log10()) as f32,
            Self::Band { .. } => self.band_start(value as usize) + self.band_width() / 2.0,
        };
        if res.is_nan() || res.is_infinite() {
            0.0
        } else {
            res
        }
    }

    pub fn invert(&self, pixel: f32) -> f64 {
        match self {
            Self::Linear { scale, .. } => scale.invert(pixel as f64).unwrap_or(0.0),
            Self::Log { scale, .. } => 10f64.powf(scale.invert(pixel as f64).unwrap_or(0.0)),
            Self::Band { count, .. } => {
                let width = self.band_width();
                if width <= 0.0 {
                    return 0.0;
                }
                let idx = ((pixel - self.range().0) / width).floor().max(0.0) as usize;
                idx.min(count.saturating_sub(1)) as f64
            }
        }
    }

    pub fn band_width(&self) -> f32 {
        match self {
            Self::Band { count, range } if *count > 0 => (range.1 - range.0) / *count as f32,
            _ => 0.0,
        }
    }

    fn band_start(&self, index: usize) -> f32 {
        self.range().0 + index as f32 * self.band_width()
    }

    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::Linear { range, .. } | Self::Log { range, .. } | Self::Band { range, .. } => *range,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        match self {
            Self::Linear { domain, .. } | Self::Log { domain, .. } => *domain,
            Self::Band { count, .. } => (0.0, count.saturating_sub(1) as f64),
        }
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self {
            Self::Linear { scale, .. } => scale.ticks(count),
            Self::Log { domain, .. } => {
                let lo = domain.0.log10().floor() as i32;
                let hi = domain.1.log10().ceil() as i32;
                (lo..=hi)
                    .map(|e| 10f64.powi(e))
                    .filter(|v| *v >= domain.0 && *v <= domain.1)
                    .collect()
            }
            Self::Band { count, .. } => (0..*count).map(|i| i as f64).collect(),
        }
    }

    /// Same kind of scale over a new domain. Non-finite bounds keep the current domain.
    pub fn with_domain(&self, min: f64, max: f64) -> Self {
        if !min.is_finite() || !max.is_finite() {
            return self.clone();
        }
        match self {
            Self::Linear { range, .. } => Self::new_linear((min, max), *range),
            Self::Log { range, .. } => Self::new_log((min, max), *range),
            Self::Band { .. } => self.clone(),
        }
    }
}
