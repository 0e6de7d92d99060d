// ---------------------------------------------------------------------------
// Reverse lookup: clicked plot coordinate → nearest plotted point
// ---------------------------------------------------------------------------

/// Index of the point in `points` nearest to `click`.
///
/// Distances are taken in data space after dividing each axis by its entry
/// in `scale` (typically the visible span of that axis), so an axis spanning
/// micro-amps and one spanning volts weigh equally. A non-positive or
/// non-finite scale falls back to 1.
///
/// Equidistant candidates resolve to the lowest index. Points with a
/// non-finite coordinate are ignored. When `max_distance` is given, a
/// nearest point farther than it (in normalized units) yields `None`.
pub fn nearest_point(
    points: &[[f64; 2]],
    click: [f64; 2],
    scale: [f64; 2],
    max_distance: Option<f64>,
) -> Option<usize> {
    if !(click[0].is_finite() && click[1].is_finite()) {
        return None;
    }
    let norm = |s: f64| if s.is_finite() && s > 0.0 { s } else { 1.0 };
    let (sx, sy) = (norm(scale[0]), norm(scale[1]));

    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let dx = (p[0] - click[0]) / sx;
        let dy = (p[1] - click[1]) / sy;
        let d2 = dx * dx + dy * dy;
        if !d2.is_finite() {
            continue;
        }
        // Only a strictly smaller distance replaces the current best.
        match best {
            Some((_, best_d2)) if d2 >= best_d2 => {}
            _ => best = Some((i, d2)),
        }
    }

    let (index, d2) = best?;
    match max_distance {
        Some(limit) if d2.sqrt() > limit => None,
        _ => Some(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: [f64; 2] = [1.0, 1.0];

    #[test]
    fn exact_hit_returns_that_point() {
        let pts = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert_eq!(nearest_point(&pts, [1.0, 1.0], UNIT, Some(0.0)), Some(1));
    }

    #[test]
    fn ties_go_to_lower_index() {
        let pts = [[1.0, 0.0], [-1.0, 0.0], [0.0, 1.0]];
        assert_eq!(nearest_point(&pts, [0.0, 0.0], UNIT, None), Some(0));
    }

    #[test]
    fn duplicate_points_resolve_to_first() {
        let pts = [[5.0, 5.0], [3.0, 3.0], [3.0, 3.0]];
        assert_eq!(nearest_point(&pts, [3.0, 3.0], UNIT, None), Some(1));
    }

    #[test]
    fn scale_normalizes_axes() {
        // x spans volts, y spans micro-amps.
        let pts = [[0.5, 10e-6], [0.52, 1e-6]];
        let click = [0.505, 1e-6];
        // Raw distances only see x, where the first point is closer.
        assert_eq!(nearest_point(&pts, click, UNIT, None), Some(0));
        // Normalized by the visible span, the y offset dominates.
        assert_eq!(nearest_point(&pts, click, [1.0, 10e-6], None), Some(1));
    }

    #[test]
    fn far_click_selects_nothing() {
        let pts = [[0.0, 0.0]];
        assert_eq!(nearest_point(&pts, [1.0, 0.0], [10.0, 10.0], Some(0.05)), None);
        assert_eq!(nearest_point(&pts, [0.4, 0.0], [10.0, 10.0], Some(0.05)), Some(0));
    }

    #[test]
    fn ignores_non_finite_points_and_degenerate_scale() {
        let pts = [[f64::NAN, 0.0], [2.0, 2.0]];
        assert_eq!(nearest_point(&pts, [0.0, 0.0], [0.0, f64::INFINITY], None), Some(1));
        assert_eq!(nearest_point(&[], [0.0, 0.0], UNIT, None), None);
        assert_eq!(nearest_point(&pts, [f64::NAN, 0.0], UNIT, None), None);
    }
}
