//! Derived per-hand state in canvas space.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::landmarks::{Handedness, LandmarkFrame, FINGERTIPS, PALM_JOINTS};

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// Finger identity. The discriminant is the fingertip index, stable across
/// frames so trails and pads can key on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Finger {
    Thumb  = 0,
    Index  = 1,
    Middle = 2,
    Ring   = 3,
    Pinky  = 4,
}

impl Finger {
    pub const ALL: [Finger; 5] = [Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn index(self) -> usize { self as usize }

    pub fn from_index(i: usize) -> Option<Finger> {
        Finger::ALL.get(i).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fingertip / HandState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fingertip {
    pub finger:   Finger,
    /// x/y in canvas units, z is the sensor's relative depth.
    pub position: Vec3,
}

impl Fingertip {
    pub fn xy(&self) -> Vec2 { self.position.truncate() }
}

/// One hand for one frame. Recomputed every frame, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct HandState {
    pub palm:          Vec3,
    pub fingertips:    [Fingertip; 5],
    /// Mean distance between adjacent fingertips, canvas units.
    pub finger_spread: f32,
    pub handedness:    Handedness,
}

impl HandState {
    /// Map a landmark frame into canvas space.
    ///
    /// With `mirror` the x axis is flipped so the picture behaves like a
    /// mirror for the performer facing the camera.
    pub fn from_frame(frame: &LandmarkFrame, width: f32, height: f32, mirror: bool) -> Self {
        let to_canvas = |p: Vec3| {
            let x = if mirror { 1.0 - p.x } else { p.x };
            Vec3::new(x * width, p.y * height, p.z)
        };

        let palm = PALM_JOINTS.iter()
            .map(|&i| to_canvas(frame.point(i)))
            .fold(Vec3::ZERO, |acc, p| acc + p)
            / PALM_JOINTS.len() as f32;

        let fingertips = Finger::ALL.map(|finger| Fingertip {
            finger,
            position: to_canvas(frame.point(FINGERTIPS[finger.index()])),
        });

        let finger_spread = mean_adjacent_distance(&fingertips.map(|t| t.xy()));

        HandState { palm, fingertips, finger_spread, handedness: frame.handedness() }
    }

    pub fn tip(&self, finger: Finger) -> &Fingertip {
        &self.fingertips[finger.index()]
    }

    pub fn palm_xy(&self) -> Vec2 { self.palm.truncate() }

    pub fn tips_xy(&self) -> [Vec2; 5] { self.fingertips.map(|t| t.xy()) }
}

/// Mean distance between neighbouring points (`p[i]`, `p[i+1]`).
/// Zero for fewer than two points.
pub fn mean_adjacent_distance(points: &[Vec2]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    let total: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    total / (points.len() - 1) as f32
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{INDEX_TIP, LANDMARK_COUNT};

    fn flat_frame(h: Handedness) -> LandmarkFrame {
        let mut pts = [Vec3::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        pts[INDEX_TIP] = Vec3::new(0.25, 0.1, -0.05);
        LandmarkFrame::new(&pts, h).unwrap()
    }

    #[test]
    fn fingertip_order_is_stable() {
        let s = HandState::from_frame(&flat_frame(Handedness::Right), 100.0, 100.0, false);
        for (i, tip) in s.fingertips.iter().enumerate() {
            assert_eq!(tip.finger.index(), i);
        }
    }

    #[test]
    fn mirroring_flips_x() {
        let plain    = HandState::from_frame(&flat_frame(Handedness::Right), 200.0, 100.0, false);
        let mirrored = HandState::from_frame(&flat_frame(Handedness::Right), 200.0, 100.0, true);
        assert_eq!(plain.tip(Finger::Index).position.x, 50.0);
        assert_eq!(mirrored.tip(Finger::Index).position.x, 150.0);
        assert_eq!(mirrored.tip(Finger::Index).position.y, 10.0);
        assert_eq!(mirrored.tip(Finger::Index).position.z, -0.05);
    }

    #[test]
    fn spread_of_evenly_spaced_points() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(80.0, 0.0), Vec2::new(160.0, 0.0)];
        assert_eq!(mean_adjacent_distance(&pts), 80.0);
        assert_eq!(mean_adjacent_distance(&pts[..1]), 0.0);
    }

    #[test]
    fn finger_from_index_bounds() {
        assert_eq!(Finger::from_index(4), Some(Finger::Pinky));
        assert_eq!(Finger::from_index(5), None);
    }
}
