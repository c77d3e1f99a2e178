use super::state::ZoomEvent;
use crate::lines_utils::Interval;

/// Scale + translate transform over a base x domain, the way a d3 zoom behaviour
/// drives a linear x scale.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomBehavior {
    base_domain: Interval,
    range: (f64, f64),
    scale: f64,
    translate_x: f64,
    scale_extent: (f64, f64),
}

impl ZoomBehavior {
    pub fn new(domain: Interval, range: (f32, f32)) -> Self {
        Self {
            base_domain: domain,
            range: (range.0 as f64, range.1 as f64),
            scale: 1.0,
            translate_x: 0.0,
            scale_extent: (0.0, f64::INFINITY),
        }
    }

    pub fn set_scale_extent(&mut self, extent: (f64, f64)) {
        self.scale_extent = extent;
    }

    pub fn event(&self) -> ZoomEvent {
        ZoomEvent {
            scale: self.scale,
            translate: (self.translate_x, 0.0),
        }
    }

    fn base_value(&self, pixel: f64) -> f64 {
        let (r0, r1) = self.range;
        if (r1 - r0).abs() <= f64::EPSILON {
            return self.base_domain.min;
        }
        self.base_domain.min + (pixel - r0) * self.base_domain.span() / (r1 - r0)
    }

    fn base_pixel(&self, value: f64) -> f64 {
        let span = self.base_domain.span();
        if span.abs() <= f64::EPSILON {
            return self.range.0;
        }
        self.range.0 + (value - self.base_domain.min) * (self.range.1 - self.range.0) / span
    }

    /// x domain seen through the current transform.
    pub fn domain(&self) -> Interval {
        let (r0, r1) = self.range;
        let k = self.scale;
        let t = self.translate_x;
        Interval::new(self.base_value((r0 - t) / k), self.base_value((r1 - t) / k))
    }

    /// Drag by `dx` pixels; positive moves the content right, showing earlier values.
    pub fn pan_by(&mut self, dx: f64) {
        self.translate_x += dx;
    }

    /// Scales by `factor` around the pixel `anchor`, within the scale extent.
    pub fn zoom_at(&mut self, anchor: f64, factor: f64) {
        let (lo, hi) = self.scale_extent;
        let k1 = (self.scale * factor).clamp(lo, hi.max(lo));
        let local = (anchor - self.translate_x) / self.scale;
        self.translate_x = anchor - local * k1;
        self.scale = k1;
    }

    /// Restarts the transform from identity over `domain`.
    pub fn reset_to(&mut self, domain: Interval) {
        self.base_domain = domain;
        self.scale = 1.0;
        self.translate_x = 0.0;
    }

    /// Adjusts the transform so that it shows `display` over the same base domain.
    pub fn sync_to(&mut self, display: Interval) {
        if !display.is_finite() || display.span() <= 0.0 {
            return;
        }
        self.scale = self.base_domain.span() / display.span();
        self.translate_x = self.range.0 - self.scale * self.base_pixel(display.min);
    }

    /// Zoom factor for a wheel delta in pixels; scrolling up zooms in.
    pub fn wheel_factor(delta: f32, sensitivity: f32) -> f64 {
        let factor = 1.0 + (delta.abs() / sensitivity) as f64;
        if delta > 0.0 {
            factor
        } else {
            1.0 / factor
        }
    }
}
