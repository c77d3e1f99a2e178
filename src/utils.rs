//! Small conversions between gpui pixel types and plain floats.

use glam::Vec2;
use gpui::{Pixels, Point};

pub mod date_formatter;

pub trait PixelsExt {
    fn as_f32(&self) -> f32;
}

impl PixelsExt for Pixels {
    fn as_f32(&self) -> f32 {
        f32::from(*self)
    }
}

pub trait PointExt {
    fn to_vec2(&self) -> Vec2;
}

impl PointExt for Point<Pixels> {
    fn to_vec2(&self) -> Vec2 {
        Vec2::new(self.x.as_f32(), self.y.as_f32())
    }
}
