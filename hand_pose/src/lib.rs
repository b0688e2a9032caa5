//! # hand_pose
//!
//! Turns raw per-frame hand landmark observations into the structures the
//! rest of the synth consumes.
//!
//! ## Pipeline
//!
//! | Stage | Type | Notes |
//! |---|---|---|
//! | Sensor observation | [`LandmarkFrame`] | 21 normalized points + handedness; wrong point count is rejected |
//! | Per-hand state | [`HandState`] | palm, 5 fingertips (thumb=0 … pinky=4), finger spread |
//! | Pose | [`PoseKind`] | extended-finger count: none / one / two / five |
//! | Two hands | [`TouchInfo`] | palm touch flag + touching fingertip pairs |
//! | History | [`TrailStore`] | bounded fingertip trails, cleared after a no-hands timeout |
//!
//! [`HandInterpreter`] runs all of the above once per sensor tick and keeps the
//! only cross-frame state this crate owns: the previous hand state per
//! handedness (for velocities) and the trails.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{HandConfig, HandInterpreter, Handedness, PoseKind};
//! use hand_pose::synth::SyntheticHand;
//!
//! let mut interp = HandInterpreter::new(HandConfig::default());
//! let frame = SyntheticHand::new(Handedness::Right, PoseKind::Two).frame();
//! let out = interp.interpret(&[frame], 0.0);
//! assert_eq!(out.hands[0].pose, PoseKind::Two);
//! ```

pub mod landmarks;
pub mod state;
pub mod pose;
pub mod touch;
pub mod trail;
pub mod interpreter;
pub mod synth;

pub use landmarks::{FrameError, Handedness, LandmarkFrame, LANDMARK_COUNT};
pub use state::{Finger, Fingertip, HandState};
pub use pose::{classify_pose, PoseKind};
pub use touch::{detect_touch, TouchInfo, TouchPair};
pub use trail::{FingerTrail, TrailSample, TrailStore};
pub use interpreter::{HandConfig, HandFrame, HandInterpreter, TrackedHand};
