//! Read-side interface that followers use to look up the leader's trail.

use convoy_common::Vec2;

/// A queryable history of the leader's path.
///
/// [`crate::PathRecorder`] is the production implementation; tests and tools
/// may supply fixed trails.
pub trait TrailSource {
    /// Number of samples currently held. Followers wait until this exceeds 1.
    fn sample_count(&self) -> usize;

    /// Point `meters_back` along the path behind the newest sample.
    fn position_at_distance_behind(&self, meters_back: f32) -> Vec2;

    /// Total path length available for queries, when the source knows it.
    ///
    /// Followers clamp their offset to this value. Sources returning `None`
    /// are queried with the raw offset and must clamp on their own.
    fn recorded_distance(&self) -> Option<f32> {
        None
    }
}

/// Trail made of a fixed polyline, newest point first.
///
/// Useful for tooling and for driving followers along authored paths.
#[derive(Debug, Clone, Default)]
pub struct PolylineTrail {
    points: Vec<Vec2>,
}

impl PolylineTrail {
    /// Creates a trail from points ordered newest to oldest.
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Total length of the polyline.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl TrailSource for PolylineTrail {
    fn sample_count(&self) -> usize {
        self.points.len()
    }

    fn position_at_distance_behind(&self, meters_back: f32) -> Vec2 {
        let Some(&first) = self.points.first() else {
            return Vec2::ZERO;
        };
        if meters_back.is_nan() || meters_back <= 0.0 {
            return first;
        }

        let mut travelled = 0.0;
        for w in self.points.windows(2) {
            let segment = w[0].distance(w[1]);
            if travelled + segment >= meters_back {
                if segment <= f32::EPSILON {
                    return w[1];
                }
                return w[0].lerp(w[1], (meters_back - travelled) / segment);
            }
            travelled += segment;
        }

        self.points.last().copied().unwrap_or(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_query() {
        let trail = PolylineTrail::new(vec![
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, -2.0),
        ]);

        assert_eq!(trail.length(), 4.0);
        assert_eq!(trail.position_at_distance_behind(0.0), Vec2::new(2.0, 0.0));
        assert_eq!(trail.position_at_distance_behind(1.0), Vec2::new(1.0, 0.0));
        assert_eq!(trail.position_at_distance_behind(3.0), Vec2::new(0.0, -1.0));
        assert_eq!(trail.position_at_distance_behind(9.0), Vec2::new(0.0, -2.0));
        assert_eq!(trail.recorded_distance(), None);
    }

    #[test]
    fn test_empty_polyline() {
        let trail = PolylineTrail::default();
        assert_eq!(trail.sample_count(), 0);
        assert_eq!(trail.position_at_distance_behind(1.0), Vec2::ZERO);
    }
}
