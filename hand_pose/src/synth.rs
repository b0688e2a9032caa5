//! Deterministic synthetic hands.
//!
//! Used by the keyboard/mouse simulation sensor and by tests that need a
//! landmark set with a known pose. Geometry is laid out in units of the hand
//! size around `center`; left hands are mirrored so the thumb sits on the
//! outside.

use glam::{Vec2, Vec3};

use crate::landmarks::*;
use crate::pose::PoseKind;
use crate::state::Finger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerShape {
    Extended,
    Curled,
    /// Tip level with the PIP joint: neither extended nor curled.
    Half,
}

/// `(x offset of the finger column, MCP y offset)` for index..pinky.
const FINGER_BASES: [(f32, f32); 4] = [(-0.15, -0.05), (0.0, -0.06), (0.15, -0.05), (0.28, 0.0)];

#[derive(Clone, Debug)]
pub struct SyntheticHand {
    handedness:  Handedness,
    shapes:      [FingerShape; 5],
    center:      Vec3,
    size:        f32,
    tip_offsets: [Vec3; 5],
}

impl SyntheticHand {
    pub fn new(handedness: Handedness, pose: PoseKind) -> Self {
        use FingerShape::{Curled as C, Extended as E};
        let shapes = match pose {
            PoseKind::None => [C, C, C, C, C],
            PoseKind::One  => [C, E, C, C, C],
            PoseKind::Two  => [C, E, E, C, C],
            PoseKind::Five => [E, E, E, E, E],
        };
        Self::with_shapes(handedness, shapes)
    }

    pub fn with_shapes(handedness: Handedness, shapes: [FingerShape; 5]) -> Self {
        SyntheticHand {
            handedness,
            shapes,
            center:      Vec3::new(0.5, 0.55, 0.0),
            size:        0.25,
            tip_offsets: [Vec3::ZERO; 5],
        }
    }

    /// Palm center in normalized space; z is the depth of every landmark.
    pub fn center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    /// Hand height in normalized units.
    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Move one fingertip by `delta` (normalized units) after layout.
    pub fn nudge_tip(mut self, finger: Finger, delta: Vec3) -> Self {
        self.tip_offsets[finger.index()] += delta;
        self
    }

    pub fn handedness(&self) -> Handedness { self.handedness }

    pub fn points(&self) -> [Vec3; LANDMARK_COUNT] {
        let flip = match self.handedness {
            Handedness::Right => 1.0,
            Handedness::Left  => -1.0,
        };
        let at = |u: f32, v: f32| {
            let off = Vec2::new(u * flip, v) * self.size;
            Vec3::new(self.center.x + off.x, self.center.y + off.y, self.center.z)
        };

        let mut p = [Vec3::ZERO; LANDMARK_COUNT];
        p[WRIST]     = at(0.0, 0.5);
        p[THUMB_CMC] = at(-0.2, 0.35);
        p[THUMB_MCP] = at(-0.35, 0.2);
        match self.shapes[0] {
            FingerShape::Extended => {
                p[THUMB_IP]  = at(-0.48, 0.08);
                p[THUMB_TIP] = at(-0.6, -0.05);
            }
            FingerShape::Half => {
                p[THUMB_IP]  = at(-0.4, 0.15);
                p[THUMB_TIP] = at(-0.4, 0.1);
            }
            FingerShape::Curled => {
                p[THUMB_IP]  = at(-0.25, 0.12);
                p[THUMB_TIP] = at(-0.05, 0.1);
            }
        }

        let chains = [
            (INDEX_MCP,  INDEX_PIP,  INDEX_DIP,  INDEX_TIP),
            (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
            (RING_MCP,   RING_PIP,   RING_DIP,   RING_TIP),
            (PINKY_MCP,  PINKY_PIP,  PINKY_DIP,  PINKY_TIP),
        ];
        for (i, &(mcp, pip, dip, tip)) in chains.iter().enumerate() {
            let (u, v) = FINGER_BASES[i];
            p[mcp] = at(u, v);
            match self.shapes[i + 1] {
                FingerShape::Extended => {
                    p[pip] = at(u, v - 0.2);
                    p[dip] = at(u, v - 0.33);
                    p[tip] = at(u, v - 0.45);
                }
                FingerShape::Half => {
                    p[pip] = at(u, v - 0.18);
                    p[dip] = at(u * 0.9, v - 0.24);
                    p[tip] = at(u * 0.8, v - 0.18);
                }
                FingerShape::Curled => {
                    p[pip] = at(u, v - 0.15);
                    p[dip] = at(u * 0.9, v - 0.05);
                    p[tip] = at(u * 0.8, v + 0.05);
                }
            }
        }

        for (i, &tip) in FINGERTIPS.iter().enumerate() {
            p[tip] += self.tip_offsets[i];
        }
        p
    }

    pub fn frame(&self) -> LandmarkFrame {
        LandmarkFrame::from_array(self.points(), self.handedness)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_hand_mirrors_right() {
        let r = SyntheticHand::new(Handedness::Right, PoseKind::Five).points();
        let l = SyntheticHand::new(Handedness::Left, PoseKind::Five).points();
        assert!((r[THUMB_TIP].x - 0.5) < 0.0);
        assert!((l[THUMB_TIP].x - 0.5) > 0.0);
        assert_eq!(r[MIDDLE_TIP], l[MIDDLE_TIP]);
    }

    #[test]
    fn nudge_moves_only_the_tip() {
        let base  = SyntheticHand::new(Handedness::Right, PoseKind::One);
        let moved = base.clone().nudge_tip(Finger::Index, Vec3::new(0.0, 0.0, -0.1));
        let (a, b) = (base.points(), moved.points());
        assert_eq!(b[INDEX_TIP].z, a[INDEX_TIP].z - 0.1);
        assert_eq!(a[INDEX_PIP], b[INDEX_PIP]);
    }
}
