//! Two-hand proximity: palm touch and touching fingertip pairs.

use glam::Vec2;

use crate::landmarks::Handedness;
use crate::state::{Finger, HandState};

/// A left/right fingertip pair close enough to count as touching.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPair {
    pub left:     Finger,
    pub right:    Finger,
    pub midpoint: Vec2,
    pub distance: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchInfo {
    /// Palms closer than the palm threshold.
    pub touching: bool,
    pub palm_distance: Option<f32>,
    pub pairs: Vec<TouchPair>,
}

/// Compare a left and a right hand. Anything other than exactly one of each
/// yields the default (not touching, no pairs).
pub fn detect_touch(hands: &[&HandState], palm_threshold: f32, finger_threshold: f32) -> TouchInfo {
    let left  = hands.iter().find(|h| h.handedness == Handedness::Left);
    let right = hands.iter().find(|h| h.handedness == Handedness::Right);
    let (Some(l), Some(r)) = (left, right) else {
        return TouchInfo::default();
    };

    let palm_distance = l.palm_xy().distance(r.palm_xy());

    let mut pairs = Vec::new();
    for lt in &l.fingertips {
        for rt in &r.fingertips {
            let d = lt.xy().distance(rt.xy());
            if d < finger_threshold {
                pairs.push(TouchPair {
                    left:     lt.finger,
                    right:    rt.finger,
                    midpoint: (lt.xy() + rt.xy()) * 0.5,
                    distance: d,
                });
            }
        }
    }

    TouchInfo {
        touching: palm_distance < palm_threshold,
        palm_distance: Some(palm_distance),
        pairs,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkFrame;
    use crate::synth::SyntheticHand;
    use crate::PoseKind;
    use glam::Vec3;

    fn hand_at(h: Handedness, cx: f32) -> HandState {
        let frame: LandmarkFrame = SyntheticHand::new(h, PoseKind::Five)
            .center(Vec3::new(cx, 0.5, 0.0))
            .frame();
        HandState::from_frame(&frame, 1000.0, 1000.0, false)
    }

    #[test]
    fn far_hands_do_not_touch() {
        let l = hand_at(Handedness::Left, 0.2);
        let r = hand_at(Handedness::Right, 0.8);
        let t = detect_touch(&[&l, &r], 120.0, 30.0);
        assert!(!t.touching);
        assert!(t.pairs.is_empty());
        assert!(t.palm_distance.unwrap() > 500.0);
    }

    #[test]
    fn overlapping_hands_touch() {
        let l = hand_at(Handedness::Left, 0.5);
        let r = hand_at(Handedness::Right, 0.5);
        let t = detect_touch(&[&l, &r], 120.0, 30.0);
        assert!(t.touching);
        assert!(!t.pairs.is_empty());
    }

    #[test]
    fn single_hand_is_never_touching() {
        let r = hand_at(Handedness::Right, 0.5);
        assert_eq!(detect_touch(&[&r], 120.0, 30.0), TouchInfo::default());
    }
}
