//! Landmark topology and the validated per-hand sensor frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Topology (MediaPipe 21-point hand)
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Fingertip landmark per finger, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// `(mcp, pip)` joints for the four non-thumb fingers, index first.
pub const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_MCP,  INDEX_PIP),
    (MIDDLE_MCP, MIDDLE_PIP),
    (RING_MCP,   RING_PIP),
    (PINKY_MCP,  PINKY_PIP),
];

/// Joints averaged into the palm center.
pub const PALM_JOINTS: [usize; 6] = [WRIST, THUMB_CMC, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Slot index used by per-hand arrays (`Left = 0`, `Right = 1`).
    pub fn slot(self) -> usize {
        match self {
            Handedness::Left  => 0,
            Handedness::Right => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handedness::Left  => "left",
            Handedness::Right => "right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame
// ════════════════════════════════════════════════════════════════════════════

/// Rejected sensor input. Only a contract breach by the sensor adapter lands
/// here; missing hands are not an error.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("expected {expected} landmarks per hand, got {got}")]
    WrongPointCount { expected: usize, got: usize },

    #[error("landmark {index} is not finite")]
    NonFinite { index: usize },
}

/// One hand's 21 landmarks for one sensor tick, in normalized observation
/// space (x right, y down, z = relative depth, smaller is closer).
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    points:     [Vec3; LANDMARK_COUNT],
    handedness: Handedness,
}

impl LandmarkFrame {
    pub fn new(points: &[Vec3], handedness: Handedness) -> Result<Self, FrameError> {
        if points.len() != LANDMARK_COUNT {
            return Err(FrameError::WrongPointCount {
                expected: LANDMARK_COUNT,
                got:      points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(FrameError::NonFinite { index });
        }
        let mut fixed = [Vec3::ZERO; LANDMARK_COUNT];
        fixed.copy_from_slice(points);
        Ok(LandmarkFrame { points: fixed, handedness })
    }

    /// Build from `[x, y, z]` triples, as delivered by JSON-speaking trackers.
    pub fn from_triples(triples: &[[f32; 3]], handedness: Handedness) -> Result<Self, FrameError> {
        let points: Vec<Vec3> = triples.iter().map(|t| Vec3::from_array(*t)).collect();
        Self::new(&points, handedness)
    }

    /// Infallible constructor for generators that produce a fixed array.
    pub(crate) fn from_array(points: [Vec3; LANDMARK_COUNT], handedness: Handedness) -> Self {
        LandmarkFrame { points, handedness }
    }

    pub fn handedness(&self) -> Handedness { self.handedness }
    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] { &self.points }
    pub fn point(&self, index: usize) -> Vec3 { self.points[index] }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
