//! Narrow-phase collision tests
//!
//! Everything is a circle except the beam, which is a thick segment.

use glam::DVec2;

/// True when two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: DVec2, ra: f64, b: DVec2, rb: f64) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Closest point to `p` on the segment `a`..`b`
pub fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        // Degenerate segment
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Distance from `p` to the segment `a`..`b`
#[inline]
pub fn point_segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Circle vs segment of half-thickness `thickness`
#[inline]
pub fn circle_hits_thick_segment(
    center: DVec2,
    radius: f64,
    a: DVec2,
    b: DVec2,
    thickness: f64,
) -> bool {
    point_segment_distance(center, a, b) <= radius + thickness
}

/// Push `pos` out of a circle so the two circles just touch.
///
/// Returns the corrected position, or `None` if they do not overlap.
pub fn push_out_of_circle(pos: DVec2, radius: f64, center: DVec2, other_radius: f64) -> Option<DVec2> {
    let delta = pos - center;
    let min_dist = radius + other_radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return None;
    }
    let dist = dist_sq.sqrt();
    // Coincident centers push straight down (toward the player's side)
    let normal = if dist > 1e-9 { delta / dist } else { DVec2::Y };
    Some(center + normal * min_dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_touching_count_as_overlap() {
        assert!(circles_overlap(DVec2::ZERO, 5.0, DVec2::new(10.0, 0.0), 5.0));
        assert!(!circles_overlap(DVec2::ZERO, 5.0, DVec2::new(10.1, 0.0), 5.0));
    }

    #[test]
    fn test_point_segment_distance_regions() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        assert!((point_segment_distance(DVec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((point_segment_distance(DVec2::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-12);
        assert!((point_segment_distance(DVec2::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let p = DVec2::new(3.0, 4.0);
        assert!((point_segment_distance(p, DVec2::ZERO, DVec2::ZERO) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_thick_segment() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(0.0, -100.0);
        assert!(circle_hits_thick_segment(DVec2::new(10.0, -50.0), 5.0, a, b, 6.0));
        assert!(!circle_hits_thick_segment(DVec2::new(12.0, -50.0), 5.0, a, b, 6.0));
    }

    #[test]
    fn test_push_out() {
        let out = push_out_of_circle(DVec2::new(5.0, 0.0), 5.0, DVec2::ZERO, 10.0).unwrap();
        assert!((out.x - 15.0).abs() < 1e-12);
        assert!(push_out_of_circle(DVec2::new(20.0, 0.0), 5.0, DVec2::ZERO, 10.0).is_none());
    }
}
