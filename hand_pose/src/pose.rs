//! Discrete pose classification by extended-finger count.
//!
//! Folded fingers must be *curled* (tip below the PIP joint), not merely
//! "not extended". A finger halfway through a transition is neither, so
//! it blocks every pose that has an opinion about it.

use serde::{Deserialize, Serialize};

use crate::landmarks::{LandmarkFrame, FINGER_JOINTS, FINGERTIPS, THUMB_MCP, WRIST};

/// Thumb counts as extended when its tip is this much farther from the wrist
/// than its MCP knuckle.
const THUMB_EXTEND_RATIO: f32 = 1.3;

/// Recognized poses. Anything else is [`PoseKind::None`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoseKind {
    None,
    One,
    Two,
    Five,
}

impl PoseKind {
    /// Extended-finger count this pose stands for (0 for `None`).
    pub fn count(self) -> u8 {
        match self {
            PoseKind::None => 0,
            PoseKind::One  => 1,
            PoseKind::Two  => 2,
            PoseKind::Five => 5,
        }
    }

    pub fn is_some(self) -> bool { self != PoseKind::None }
}

/// Per-finger reading, thumb first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerReading {
    pub extended: [bool; 5],
    pub curled:   [bool; 5],
}

pub fn read_fingers(frame: &LandmarkFrame) -> FingerReading {
    let wrist = frame.point(WRIST);
    let thumb_tip = frame.point(FINGERTIPS[0]);
    let thumb_mcp = frame.point(THUMB_MCP);

    let tip_reach  = thumb_tip.truncate().distance(wrist.truncate());
    let knuckle    = thumb_mcp.truncate().distance(wrist.truncate());
    let thumb_ext  = tip_reach > knuckle * THUMB_EXTEND_RATIO;

    let mut extended = [thumb_ext, false, false, false, false];
    let mut curled   = [!thumb_ext, false, false, false, false];

    for (i, &(mcp, pip)) in FINGER_JOINTS.iter().enumerate() {
        let tip_y = frame.point(FINGERTIPS[i + 1]).y;
        let pip_y = frame.point(pip).y;
        let mcp_y = frame.point(mcp).y;
        // y grows downward in observation space
        extended[i + 1] = tip_y < pip_y && tip_y < mcp_y;
        curled[i + 1]   = tip_y > pip_y;
    }

    FingerReading { extended, curled }
}

/// Classify a single hand. Returns exactly one pose.
pub fn classify_pose(frame: &LandmarkFrame) -> PoseKind {
    let FingerReading { extended: e, curled: c } = read_fingers(frame);

    if e.iter().all(|&x| x) {
        PoseKind::Five
    } else if e[1] && e[2] && c[3] && c[4] {
        PoseKind::Two
    } else if e[1] && c[2] && c[3] && c[4] {
        PoseKind::One
    } else {
        PoseKind::None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Handedness;
    use crate::synth::{FingerShape, SyntheticHand};
    use test_case::test_case;

    use FingerShape::{Curled as C, Extended as E, Half as H};

    #[test_case([E, E, E, E, E], PoseKind::Five ; "open palm")]
    #[test_case([C, E, E, C, C], PoseKind::Two  ; "victory")]
    #[test_case([E, E, E, C, C], PoseKind::Two  ; "victory with thumb out")]
    #[test_case([C, E, C, C, C], PoseKind::One  ; "pointing")]
    #[test_case([C, C, C, C, C], PoseKind::None ; "fist")]
    #[test_case([C, E, H, C, C], PoseKind::None ; "middle finger in transition")]
    #[test_case([C, E, E, E, C], PoseKind::None ; "three fingers")]
    #[test_case([C, E, E, H, C], PoseKind::None ; "ring not curled")]
    #[test_case([C, E, E, E, E], PoseKind::None ; "four fingers")]
    fn classify_table(shapes: [FingerShape; 5], expected: PoseKind) {
        let frame = SyntheticHand::with_shapes(Handedness::Right, shapes).frame();
        assert_eq!(classify_pose(&frame), expected);
    }

    #[test]
    fn curl_is_required_not_just_unextended() {
        let r = read_fingers(&SyntheticHand::with_shapes(Handedness::Left, [C, E, H, C, C]).frame());
        assert!(!r.extended[2]);
        assert!(!r.curled[2]);
    }

    #[test]
    fn counts() {
        assert_eq!(PoseKind::None.count(), 0);
        assert_eq!(PoseKind::Five.count(), 5);
        assert!(!PoseKind::None.is_some());
    }
}
