use egui::{Pos2, Rect};

/// Images smaller than this (in canvas units) are rejected.
pub const MIN_ELEMENT_SIZE: f32 = 1.0;

/// Calculate distance from a point to a line segment (used for stroke coverage and hit testing)
pub(crate) fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / line_len).clamp(0.0, line_len);
    let projection = line_start + (line_vec * t / line_len);
    (point - projection).length()
}

/// Distance from `point` to the closest part of a polyline.
///
/// A single-point polyline degenerates to the distance to that point.
pub(crate) fn distance_to_polyline(point: Pos2, points: &[Pos2]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => (point - *only).length(),
        _ => points
            .windows(2)
            .map(|w| distance_to_line_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Calculate the bounding box for a set of points
pub(crate) fn calculate_bounds(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        Pos2::new(min_x - padding, min_y - padding),
        Pos2::new(max_x + padding, max_y + padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_line_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_line_segment(Pos2::new(-4.0, 0.0), a, b), 4.0);
        assert_eq!(distance_to_line_segment(Pos2::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn single_point_polyline_is_a_dot() {
        let d = distance_to_polyline(Pos2::new(3.0, 4.0), &[Pos2::ZERO]);
        assert_eq!(d, 5.0);
    }

    #[test]
    fn bounds_include_padding() {
        let rect = calculate_bounds(&[Pos2::new(1.0, 2.0), Pos2::new(5.0, 8.0)], 1.0);
        assert_eq!(rect, Rect::from_min_max(Pos2::new(0.0, 1.0), Pos2::new(6.0, 9.0)));
    }
}
