#![forbid(unsafe_code)]

//! Horizontal shake played when the error state is entered.
//!
//! The shake is a fixed keyframe track sampled with linear interpolation.
//! Like the other time-based pieces of the crate it is driven by explicit
//! `tick(dt)` calls and never reads a wall clock.

use std::time::Duration;

/// Horizontal offsets visited by the shake, evenly spaced in time.
pub const SHAKE_KEYFRAMES: [f32; 9] = [-15.0, 15.0, -15.0, 15.0, -12.0, 12.0, -10.0, 10.0, 0.0];

/// Default shake duration.
pub const SHAKE_DURATION: Duration = Duration::from_millis(500);

/// Error shake animation state.
#[derive(Debug, Clone, Copy)]
pub struct Shake {
    elapsed: Duration,
    duration: Duration,
}

impl Default for Shake {
    fn default() -> Self {
        Self::new(SHAKE_DURATION)
    }
}

impl Shake {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Advance by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Time elapsed past completion.
    #[must_use]
    pub fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }

    /// Normalized progress in [0.0, 1.0].
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Current horizontal offset.
    #[must_use]
    pub fn offset(&self) -> f32 {
        let segments = (SHAKE_KEYFRAMES.len() - 1) as f32;
        let position = self.progress() * segments;
        let index = position.floor() as usize;
        if index >= SHAKE_KEYFRAMES.len() - 1 {
            return SHAKE_KEYFRAMES[SHAKE_KEYFRAMES.len() - 1];
        }
        let t = position - index as f32;
        let from = SHAKE_KEYFRAMES[index];
        let to = SHAKE_KEYFRAMES[index + 1];
        from + (to - from) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_first_keyframe() {
        let shake = Shake::default();
        assert_eq!(shake.offset(), -15.0);
        assert!(!shake.is_complete());
    }

    #[test]
    fn ends_at_rest() {
        let mut shake = Shake::default();
        shake.tick(SHAKE_DURATION);
        assert!(shake.is_complete());
        assert_eq!(shake.offset(), 0.0);
        assert_eq!(shake.overshoot(), Duration::ZERO);
    }

    #[test]
    fn interpolates_between_keyframes() {
        // 8 segments over 800ms: 50ms is halfway from -15 to 15.
        let mut shake = Shake::new(Duration::from_millis(800));
        shake.tick(Duration::from_millis(50));
        assert!(shake.offset().abs() < 1e-3);
    }

    #[test]
    fn overshoot_is_measured() {
        let mut shake = Shake::default();
        shake.tick(Duration::from_millis(650));
        assert_eq!(shake.overshoot(), Duration::from_millis(150));
    }

    #[test]
    fn zero_duration_is_complete() {
        let shake = Shake::new(Duration::ZERO);
        assert!(shake.is_complete());
        assert_eq!(shake.progress(), 1.0);
    }

    #[test]
    fn offset_stays_within_keyframe_bounds() {
        let mut shake = Shake::default();
        for _ in 0..60 {
            shake.tick(Duration::from_millis(10));
            let offset = shake.offset();
            assert!((-15.0..=15.0).contains(&offset), "offset {offset} out of bounds");
        }
    }
}
