//! The per-frame entry point of the crate.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::landmarks::{Handedness, LandmarkFrame};
use crate::pose::{classify_pose, PoseKind};
use crate::state::{Finger, HandState};
use crate::touch::{detect_touch, TouchInfo};
use crate::trail::TrailStore;

// ════════════════════════════════════════════════════════════════════════════
// HandConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tuning for the interpreter. Every field can change at runtime through
/// [`HandInterpreter::set_config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Flip x so the canvas behaves like a mirror.
    pub mirror:                bool,
    /// Samples kept per fingertip trail (2–128).
    pub trail_length:          usize,
    /// Clear all trails after this long without hands (100–10000 ms).
    pub trail_timeout_ms:      f64,
    /// Palms closer than this are "touching" (canvas units).
    pub palm_touch_distance:   f32,
    /// Fingertip pairs closer than this are listed as touching (canvas units).
    pub finger_touch_distance: f32,
}

impl Default for HandConfig {
    fn default() -> Self {
        HandConfig {
            mirror:                true,
            trail_length:          24,
            trail_timeout_ms:      1500.0,
            palm_touch_distance:   110.0,
            finger_touch_distance: 36.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Output types
// ════════════════════════════════════════════════════════════════════════════

/// A hand seen this frame, with what the interpreter remembers about it.
#[derive(Clone, Debug)]
pub struct TrackedHand {
    pub state:    HandState,
    /// Previous frame's state for the same handedness, if it was seen.
    pub previous: Option<HandState>,
    pub pose:     PoseKind,
    /// Time since `previous`.
    pub dt_ms:    Option<f64>,
}

impl TrackedHand {
    pub fn handedness(&self) -> Handedness { self.state.handedness }

    /// Fingertip velocity in canvas units (z: depth units) per millisecond.
    pub fn fingertip_velocity(&self, finger: Finger) -> Option<Vec3> {
        let prev = self.previous.as_ref()?;
        let dt = self.dt_ms.filter(|dt| *dt > 0.0)? as f32;
        Some((self.state.tip(finger).position - prev.tip(finger).position) / dt)
    }

    /// Fingertip displacement since the previous frame.
    pub fn fingertip_delta(&self, finger: Finger) -> Option<Vec3> {
        let prev = self.previous.as_ref()?;
        Some(self.state.tip(finger).position - prev.tip(finger).position)
    }

    pub fn palm_velocity(&self) -> Option<Vec2> {
        let prev = self.previous.as_ref()?;
        let dt = self.dt_ms.filter(|dt| *dt > 0.0)? as f32;
        Some((self.state.palm_xy() - prev.palm_xy()) / dt)
    }
}

/// Everything derived from one sensor tick.
#[derive(Clone, Debug, Default)]
pub struct HandFrame {
    /// Right hand first when both are present.
    pub hands:          Vec<TrackedHand>,
    pub touch:          TouchInfo,
    /// The no-hands timeout fired on this frame.
    pub trails_cleared: bool,
}

impl HandFrame {
    pub fn hand(&self, handedness: Handedness) -> Option<&TrackedHand> {
        self.hands.iter().find(|h| h.handedness() == handedness)
    }

    /// The hand that drives single-hand features: right if present.
    pub fn primary(&self) -> Option<&TrackedHand> { self.hands.first() }

    pub fn is_empty(&self) -> bool { self.hands.is_empty() }

    pub fn states(&self) -> Vec<&HandState> {
        self.hands.iter().map(|h| &h.state).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandInterpreter
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct HandInterpreter {
    config:   HandConfig,
    surface:  Vec2,
    /// Single-slot history per handedness: `(state, time seen)`.
    previous: [Option<(HandState, f64)>; 2],
    trails:   TrailStore,
}

impl HandInterpreter {
    pub fn new(config: HandConfig) -> Self {
        let trails = TrailStore::new(config.trail_length, config.trail_timeout_ms);
        HandInterpreter {
            config,
            surface:  Vec2::new(1280.0, 720.0),
            previous: [None, None],
            trails,
        }
    }

    pub fn with_surface(mut self, width: f32, height: f32) -> Self {
        self.surface = Vec2::new(width, height);
        self
    }

    pub fn config(&self) -> &HandConfig { &self.config }
    pub fn surface(&self) -> Vec2 { self.surface }
    pub fn trails(&self) -> &TrailStore { &self.trails }

    pub fn set_config(&mut self, config: HandConfig) {
        self.trails.set_capacity(config.trail_length);
        self.trails.set_timeout(config.trail_timeout_ms);
        self.config = config;
    }

    /// Interpret this tick's observations (0, 1 or 2 hands).
    pub fn interpret(&mut self, frames: &[LandmarkFrame], now_ms: f64) -> HandFrame {
        let mut accepted: [Option<&LandmarkFrame>; 2] = [None, None];
        for frame in frames {
            let slot = &mut accepted[frame.handedness().slot()];
            if slot.is_some() {
                log::warn!("dropping duplicate {} hand observation", frame.handedness().name());
                continue;
            }
            *slot = Some(frame);
        }

        let mut hands = Vec::with_capacity(2);
        for handedness in [Handedness::Right, Handedness::Left] {
            let slot = handedness.slot();
            let Some(frame) = accepted[slot] else {
                // absent this frame: velocity must not bridge the gap
                self.previous[slot] = None;
                continue;
            };

            let state = HandState::from_frame(frame, self.surface.x, self.surface.y, self.config.mirror);
            let (previous, dt_ms) = match self.previous[slot].take() {
                Some((prev, seen)) => (Some(prev), Some(now_ms - seen)),
                None               => (None, None),
            };
            self.previous[slot] = Some((state.clone(), now_ms));

            hands.push(TrackedHand { state, previous, pose: classify_pose(frame), dt_ms });
        }

        let states: Vec<&HandState> = hands.iter().map(|h| &h.state).collect();
        let touch = detect_touch(
            &states,
            self.config.palm_touch_distance,
            self.config.finger_touch_distance,
        );
        let trails_cleared = self.trails.update(&states, now_ms);

        HandFrame { hands, touch, trails_cleared }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SyntheticHand;

    fn interp() -> HandInterpreter {
        HandInterpreter::new(HandConfig::default()).with_surface(1000.0, 1000.0)
    }

    #[test]
    fn no_hands_is_empty_not_error() {
        let out = interp().interpret(&[], 0.0);
        assert!(out.is_empty());
        assert!(!out.touch.touching);
    }

    #[test]
    fn right_hand_comes_first() {
        let l = SyntheticHand::new(Handedness::Left, PoseKind::One).frame();
        let r = SyntheticHand::new(Handedness::Right, PoseKind::Two).frame();
        let out = interp().interpret(&[l, r], 0.0);
        assert_eq!(out.hands.len(), 2);
        assert_eq!(out.primary().unwrap().handedness(), Handedness::Right);
        assert_eq!(out.hand(Handedness::Left).unwrap().pose, PoseKind::One);
    }

    #[test]
    fn duplicate_handedness_is_dropped() {
        let a = SyntheticHand::new(Handedness::Right, PoseKind::One).frame();
        let b = SyntheticHand::new(Handedness::Right, PoseKind::Five).frame();
        let out = interp().interpret(&[a, b], 0.0);
        assert_eq!(out.hands.len(), 1);
        assert_eq!(out.hands[0].pose, PoseKind::One);
    }

    #[test]
    fn velocity_needs_history() {
        let mut i = interp();
        let h0 = SyntheticHand::new(Handedness::Right, PoseKind::Five);
        let h1 = h0.clone().center(Vec3::new(0.6, 0.55, 0.0));

        let first = i.interpret(&[h0.frame()], 0.0);
        assert!(first.hands[0].fingertip_velocity(Finger::Index).is_none());

        let second = i.interpret(&[h1.frame()], 10.0);
        let v = second.hands[0].fingertip_velocity(Finger::Index).unwrap();
        // mirrored: moving right in observation space moves left on canvas
        assert!((v.x + 10.0).abs() < 1e-3, "vx = {}", v.x);
        assert!(v.y.abs() < 1e-4);
    }

    #[test]
    fn gap_resets_history() {
        let mut i = interp();
        let h = SyntheticHand::new(Handedness::Right, PoseKind::Five);
        i.interpret(&[h.frame()], 0.0);
        i.interpret(&[], 16.0);
        let out = i.interpret(&[h.frame()], 32.0);
        assert!(out.hands[0].previous.is_none());
    }

    #[test]
    fn trails_follow_hands() {
        let mut i = interp();
        let h = SyntheticHand::new(Handedness::Left, PoseKind::Five);
        for t in 0..50 {
            i.interpret(&[h.frame()], t as f64 * 16.0);
        }
        assert_eq!(i.trails().get(Handedness::Left, Finger::Thumb).len(), 24);
        assert!(i.trails().get(Handedness::Right, Finger::Thumb).is_empty());
    }

    #[test]
    fn shrinking_trail_length_applies_immediately() {
        let mut i = interp();
        let h = SyntheticHand::new(Handedness::Right, PoseKind::Five);
        for t in 0..10 { i.interpret(&[h.frame()], t as f64); }
        i.set_config(HandConfig { trail_length: 4, ..HandConfig::default() });
        assert_eq!(i.trails().get(Handedness::Right, Finger::Pinky).len(), 4);
    }
}
