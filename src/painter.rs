//! Paints retained surfaces into a gpui window.

use crate::axis::Axis;
use crate::scene::{CirclePrimitive, MissingArea, PathPrimitive, Surface};
use crate::theme::ChartTheme;
use crate::utils::PixelsExt;
use glam::Vec2;
use gpui::prelude::*;
use gpui::{
    div, fill, px, size, AnyElement, Bounds, ContentMask, Hsla, PathBuilder, Pixels, Point, TextAlign, Window,
};

const CIRCLE_SEGMENTS: usize = 16;

fn to_point(origin: Point<Pixels>, p: Vec2) -> Point<Pixels> {
    Point::new(origin.x + px(p.x), origin.y + px(p.y))
}

/// Splits a polyline into dashes of `dash` pixels separated by gaps of the same length.
pub fn dash_polyline(points: &[Vec2], dash: f32) -> Vec<Vec<Vec2>> {
    let mut dashes = Vec::new();
    if dash <= 0.0 || points.len() < 2 {
        return dashes;
    }
    let mut drawing = true;
    let mut left = dash;
    let mut current = vec![points[0]];
    for w in points.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let mut remaining = a.distance(b);
        while remaining > 0.0 {
            let step = remaining.min(left);
            let next = a + (b - a).normalize_or_zero() * step;
            if drawing {
                current.push(next);
            }
            left -= step;
            remaining -= step;
            a = next;
            if left <= f32::EPSILON {
                if drawing && current.len() > 1 {
                    dashes.push(std::mem::take(&mut current));
                }
                drawing = !drawing;
                left = dash;
                current = vec![a];
            }
        }
    }
    if drawing && current.len() > 1 {
        dashes.push(current);
    }
    dashes
}

fn paint_polylines(window: &mut Window, origin: Point<Pixels>, subpaths: &[Vec<Vec2>], width: f32, color: Hsla) {
    let mut builder = PathBuilder::stroke(px(width));
    let mut has_segment = false;
    for subpath in subpaths.iter().filter(|s| s.len() > 1) {
        builder.move_to(to_point(origin, subpath[0]));
        for p in &subpath[1..] {
            builder.line_to(to_point(origin, *p));
        }
        has_segment = true;
    }
    if has_segment {
        if let Ok(path) = builder.build() {
            window.paint_path(path, color);
        }
    }
}

fn paint_path_primitive(window: &mut Window, origin: Point<Pixels>, path: &PathPrimitive, color: Hsla) {
    if !path.visible || path.is_empty() {
        return;
    }
    match path.dash {
        Some(dash) => {
            let dashes: Vec<Vec<Vec2>> = path
                .subpaths
                .iter()
                .flat_map(|s| dash_polyline(s, dash))
                .collect();
            paint_polylines(window, origin, &dashes, path.stroke_width, color);
        }
        None => paint_polylines(window, origin, &path.subpaths, path.stroke_width, color),
    }
}

fn paint_circle(window: &mut Window, origin: Point<Pixels>, circle: &CirclePrimitive, color: Hsla) {
    if circle.opacity <= 0.0 || circle.radius <= 0.0 {
        return;
    }
    let mut builder = PathBuilder::fill();
    for i in 0..=CIRCLE_SEGMENTS {
        let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
        let p = circle.center + Vec2::new(angle.cos(), angle.sin()) * circle.radius;
        if i == 0 {
            builder.move_to(to_point(origin, p));
        } else {
            builder.line_to(to_point(origin, p));
        }
    }
    if let Ok(path) = builder.build() {
        window.paint_path(path, color.opacity(circle.opacity));
    }
}

fn paint_missing_area(window: &mut Window, origin: Point<Pixels>, area: &MissingArea, color: Hsla) {
    if !area.is_visible() {
        return;
    }
    let rect = Bounds::new(
        Point::new(origin.x + px(area.x), origin.y),
        size(px(area.width), px(area.height)),
    );
    window.paint_quad(fill(rect, color));
}

/// Paints one surface: shaded missing areas, grid lines, the x domain line, then lines and points.
pub fn paint_surface(
    window: &mut Window,
    bounds: Bounds<Pixels>,
    surface: &Surface,
    theme: &ChartTheme,
    missing_area_opacity: f32,
) {
    let origin = bounds.origin;
    let width = bounds.size.width.as_f32();
    let height = bounds.size.height.as_f32();

    let missing_color = theme.missing_data_area.opacity(missing_area_opacity);
    paint_missing_area(window, origin, &surface.left_missing, missing_color);
    paint_missing_area(window, origin, &surface.right_missing, missing_color);

    let grid: Vec<Vec<Vec2>> = surface
        .hlines
        .iter()
        .filter(|h| (0.0..=height).contains(&h.y))
        .map(|h| vec![Vec2::new(0.5, h.y), Vec2::new(width - 0.5, h.y)])
        .collect();
    paint_polylines(window, origin, &grid, 1.0, theme.grid_line);

    let axis_y = height + surface.x_domain_offset;
    paint_polylines(
        window,
        origin,
        &[vec![Vec2::new(0.0, axis_y), Vec2::new(width, axis_y)]],
        1.0,
        theme.axis_line,
    );

    let clip = surface.clip.map(|c| {
        Bounds::new(
            Point::new(origin.x, origin.y + px(c.y)),
            size(px(c.width), px(c.height)),
        )
    });
    for wrapper in surface.wrappers() {
        let color = wrapper.color.opacity(wrapper.opacity);
        let paint = |window: &mut Window| {
            paint_path_primitive(window, origin, &wrapper.dashed, color);
            paint_path_primitive(window, origin, &wrapper.line, color);
            for circle in wrapper.points.iter().chain(wrapper.lonely.iter()) {
                paint_circle(window, origin, circle, color);
            }
        };
        match clip.filter(|_| wrapper.clipped) {
            Some(bounds) => window.with_content_mask(Some(ContentMask { bounds }), paint),
            None => paint(window),
        }
    }
}

/// Absolutely positioned tick labels and title of the x axis, below a plot `height` pixels tall.
pub fn x_axis_elements(axis: &Axis, height: f32, color: Hsla, font_size: Pixels) -> Vec<AnyElement> {
    let mut elements: Vec<AnyElement> = axis
        .ticks()
        .into_iter()
        .map(|tick| {
            div()
                .absolute()
                .left(px(tick.position))
                .top(px(height + 4.0))
                .ml(px(-40.0))
                .w(px(80.0))
                .text_align(TextAlign::Center)
                .text_color(color)
                .text_size(font_size)
                .child(tick.label)
                .into_any_element()
        })
        .collect();
    elements.push(
        div()
            .absolute()
            .left(px(0.0))
            .right(px(0.0))
            .top(px(height + 20.0))
            .text_align(TextAlign::Center)
            .text_color(color)
            .text_size(font_size)
            .child(axis.title.clone())
            .into_any_element(),
    );
    elements
}

/// Tick labels of a y axis, on the left side of the plot or on the right for axis 2.
pub fn y_axis_elements(axis: &Axis, right: bool, color: Hsla, font_size: Pixels) -> Vec<AnyElement> {
    axis.ticks()
        .into_iter()
        .map(|tick| {
            let label = div()
                .absolute()
                .top(px(tick.position))
                .mt(px(-8.0))
                .h(px(16.0))
                .w(px(48.0))
                .flex()
                .items_center()
                .text_color(color)
                .text_size(font_size);
            let label = if right {
                label.right(px(-52.0)).justify_start()
            } else {
                label.left(px(-52.0)).justify_end()
            };
            label.child(tick.label).into_any_element()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_alternate_with_gaps() {
        let line = [Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0)];
        let dashes = dash_polyline(&line, 12.0);
        assert_eq!(dashes.len(), 3);
        assert_eq!(dashes[0].first(), Some(&Vec2::new(0.0, 0.0)));
        assert!((dashes[1][0].x - 24.0).abs() < 1e-4);
        assert!((dashes[2].last().map_or(0.0, |p| p.x) - 50.0).abs() < 1e-4);
    }
}
