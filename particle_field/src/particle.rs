use std::collections::VecDeque;

use glam::Vec2;
use hand_pose::{Finger, Handedness};

/// A live particle. Owned by the engine; never handed out mutably.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position:      Vec2,
    /// Canvas units per second.
    pub velocity:      Vec2,
    pub birth_ms:      f64,
    pub size:          f32,
    /// Stable per-particle random in `[0, 1)`, used for hue jitter.
    pub color_seed:    f32,
    pub finger_origin: Option<(Handedness, Finger)>,
    pub trail:         Option<VecDeque<Vec2>>,
}

impl Particle {
    pub fn age_ms(&self, now_ms: f64) -> f64 { now_ms - self.birth_ms }

    /// `age / lifetime`, clamped to `[0, 1]`.
    pub fn life_fraction(&self, now_ms: f64, lifetime_ms: f64) -> f32 {
        if lifetime_ms <= 0.0 {
            return 1.0;
        }
        (self.age_ms(now_ms) / lifetime_ms).clamp(0.0, 1.0) as f32
    }

    pub fn is_expired(&self, now_ms: f64, lifetime_ms: f64) -> bool {
        self.age_ms(now_ms) >= lifetime_ms
    }

    /// Opacity: stays bright, then falls off quadratically near the end.
    pub fn alpha(&self, now_ms: f64, lifetime_ms: f64) -> f32 {
        let t = self.life_fraction(now_ms, lifetime_ms);
        1.0 - t * t
    }

    pub(crate) fn record_trail(&mut self, max_len: usize) {
        if max_len == 0 {
            self.trail = None;
            return;
        }
        let pos = self.position;
        let trail = self.trail.get_or_insert_with(|| VecDeque::with_capacity(max_len));
        while trail.len() >= max_len {
            trail.pop_front();
        }
        trail.push_back(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> Particle {
        Particle {
            position:      Vec2::ZERO,
            velocity:      Vec2::ZERO,
            birth_ms:      100.0,
            size:          2.0,
            color_seed:    0.5,
            finger_origin: None,
            trail:         None,
        }
    }

    #[test]
    fn alpha_is_quadratic() {
        let q = p();
        assert_eq!(q.alpha(100.0, 1000.0), 1.0);
        assert!((q.alpha(600.0, 1000.0) - 0.75).abs() < 1e-6);
        assert_eq!(q.alpha(1100.0, 1000.0), 0.0);
    }

    #[test]
    fn expiry_is_inclusive() {
        let q = p();
        assert!(!q.is_expired(1099.0, 1000.0));
        assert!(q.is_expired(1100.0, 1000.0));
    }

    #[test]
    fn trail_is_bounded() {
        let mut q = p();
        for i in 0..10 {
            q.position = Vec2::splat(i as f32);
            q.record_trail(3);
        }
        let t = q.trail.as_ref().unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t[0], Vec2::splat(7.0));
        q.record_trail(0);
        assert!(q.trail.is_none());
    }
}
