//! 2D geometry helpers shared by the recorder and the followers.
//!
//! Positions are plain [`glam::Vec2`] values in world units (meters).

pub use glam::Vec2;

/// Lower bound applied to smoothing times to keep the integrator finite.
pub const MIN_SMOOTH_TIME: f32 = 0.0001;

/// Horizontal facing of an entity, derived from its motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Facing {
    /// Moving (or last moved) toward negative X
    #[default]
    Left,
    /// Moving (or last moved) toward positive X
    Right,
}

impl Facing {
    /// Resolves a facing from a horizontal delta.
    ///
    /// Returns `None` while `|dx| <= deadzone` so sub-pixel noise does not
    /// flip the sprite back and forth.
    #[must_use]
    pub fn from_horizontal_delta(dx: f32, deadzone: f32) -> Option<Self> {
        if dx.abs() <= deadzone {
            None
        } else if dx > 0.0 {
            Some(Self::Right)
        } else {
            Some(Self::Left)
        }
    }

    /// Returns whether art drawn facing the other way must be mirrored.
    #[must_use]
    pub const fn needs_flip(self, art_faces_left: bool) -> bool {
        match self {
            Self::Right => art_faces_left,
            Self::Left => !art_faces_left,
        }
    }
}

/// Critically-damped move of `current` toward `target`.
///
/// `velocity` is the integrator state and must persist between calls.
/// The step never overshoots the target and the implied speed is capped at
/// `max_speed`. A non-positive `dt` leaves everything untouched.
pub fn smooth_damp(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> Vec2 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;

    // Pade-style approximation of exp(-omega * dt)
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let max_change = max_speed.max(0.0) * smooth_time;
    let change = (current - target).clamp_length_max(max_change);
    let clamped_target = current - change;

    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = clamped_target + (change + temp) * decay;

    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec2::ZERO;
    }

    output
}

/// Point on the segment `a -> b` at parameter `t`, with `t` clamped to `[0, 1]`.
#[must_use]
pub fn lerp_clamped(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a.lerp(b, t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_deadzone() {
        assert_eq!(Facing::from_horizontal_delta(0.01, 0.05), None);
        assert_eq!(Facing::from_horizontal_delta(-0.05, 0.05), None);
        assert_eq!(Facing::from_horizontal_delta(0.2, 0.05), Some(Facing::Right));
        assert_eq!(Facing::from_horizontal_delta(-0.2, 0.05), Some(Facing::Left));
    }

    #[test]
    fn test_facing_flip() {
        assert!(Facing::Right.needs_flip(true));
        assert!(!Facing::Left.needs_flip(true));
        assert!(Facing::Left.needs_flip(false));
        assert!(!Facing::Right.needs_flip(false));
    }

    #[test]
    fn test_smooth_damp_moves_toward_target() {
        let mut velocity = Vec2::ZERO;
        let next = smooth_damp(
            Vec2::new(5.0, 0.0),
            Vec2::ZERO,
            &mut velocity,
            0.12,
            8.0,
            0.02,
        );
        assert!(next.x < 5.0);
        assert!(next.x > 0.0);
        assert!(velocity.x < 0.0);
    }

    #[test]
    fn test_smooth_damp_never_overshoots() {
        let target = Vec2::new(1.0, -2.0);
        let mut current = Vec2::new(-3.0, 4.0);
        let mut velocity = Vec2::ZERO;
        let mut last = current.distance(target);

        for _ in 0..500 {
            current = smooth_damp(current, target, &mut velocity, 0.1, 100.0, 0.02);
            let d = current.distance(target);
            assert!(d <= last + 1e-5);
            last = d;
        }
        assert!(last < 1e-3);
    }

    #[test]
    fn test_smooth_damp_respects_max_speed() {
        let mut velocity = Vec2::ZERO;
        let start = Vec2::ZERO;
        let dt = 0.02;
        let mut current = start;
        for _ in 0..50 {
            let next = smooth_damp(current, Vec2::new(1000.0, 0.0), &mut velocity, 0.2, 4.0, dt);
            assert!(next.distance(current) / dt <= 4.0 + 1e-3);
            current = next;
        }
    }

    #[test]
    fn test_smooth_damp_zero_dt() {
        let mut velocity = Vec2::new(1.0, 1.0);
        let current = Vec2::new(2.0, 3.0);
        let out = smooth_damp(current, Vec2::ZERO, &mut velocity, 0.1, 8.0, 0.0);
        assert_eq!(out, current);
        assert_eq!(velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_lerp_clamped() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(2.0, 0.0);
        assert_eq!(lerp_clamped(a, b, 0.5), Vec2::new(1.5, 0.0));
        assert_eq!(lerp_clamped(a, b, 2.0), b);
        assert_eq!(lerp_clamped(a, b, -1.0), a);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn step_from_rest_never_moves_away(
                sx in -50.0f32..50.0, sy in -50.0f32..50.0,
                tx in -50.0f32..50.0, ty in -50.0f32..50.0,
                smooth_time in 0.01f32..2.0,
                max_speed in 0.1f32..20.0,
            ) {
                let current = Vec2::new(sx, sy);
                let target = Vec2::new(tx, ty);
                let mut velocity = Vec2::ZERO;
                let next = smooth_damp(current, target, &mut velocity, smooth_time, max_speed, 0.02);

                prop_assert!(next.distance(target) <= current.distance(target) + 1e-4);
                prop_assert!(next.distance(current) <= max_speed * 0.02 + 1e-4);
            }
        }
    }
}
