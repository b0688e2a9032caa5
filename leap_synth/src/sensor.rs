//! Hand sources: real hardware or a keyboard/mouse simulation.
//!
//! Consumers only see [`HandSource::poll`]; whether the landmarks came from
//! a Leap Motion controller or were synthesised from the mouse is invisible
//! to the frame loop.

use std::sync::mpsc::Receiver;

use glam::{Vec2, Vec3};
use hand_pose::synth::SyntheticHand;
use hand_pose::{Handedness, LandmarkFrame, PoseKind};

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait HandSource {
    /// The newest observation since the last call, or `None` if nothing new
    /// arrived. Older observations are dropped, never queued.
    fn poll(&mut self) -> Option<Vec<LandmarkFrame>>;
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: keyboard + mouse
// ════════════════════════════════════════════════════════════════════════════

/// Input for the simulated hands, sent by the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse position, normalized to the surface; `None` outside the window.
    Pointer(Option<Vec2>),
    Pose { hand: Handedness, pose: PoseKind },
    /// Show or hide the left hand.
    ToggleLeft,
    /// Mouse button: push the right hand toward the sensor.
    Push(bool),
}

/// Depth offset of a pushed hand.
const PUSH_DEPTH: f32 = -0.05;

/// Synthesises hands from [`SimInput`]. The right hand follows the pointer;
/// the left hand, when shown, mirrors it across the vertical centre line.
pub struct SimHandSource {
    rx:         Receiver<SimInput>,
    mirror:     bool,
    pointer:    Option<Vec2>,
    right_pose: PoseKind,
    left_pose:  PoseKind,
    left_shown: bool,
    pushed:     bool,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>, mirror: bool) -> Self {
        SimHandSource {
            rx,
            mirror,
            pointer:    None,
            right_pose: PoseKind::Five,
            left_pose:  PoseKind::Five,
            left_shown: false,
            pushed:     false,
        }
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::Pointer(p)         => self.pointer = p,
            SimInput::Pose { hand: Handedness::Right, pose } => self.right_pose = pose,
            SimInput::Pose { hand: Handedness::Left, pose }  => {
                self.left_pose = pose;
                self.left_shown = true;
            }
            SimInput::ToggleLeft         => self.left_shown = !self.left_shown,
            SimInput::Push(down)         => self.pushed = down,
        }
    }

    /// Canvas-normalized position → landmark space.
    fn to_sensor(&self, p: Vec2) -> Vec2 {
        if self.mirror { Vec2::new(1.0 - p.x, p.y) } else { p }
    }

    fn hands(&self) -> Vec<LandmarkFrame> {
        let Some(p) = self.pointer else { return Vec::new() };
        let mut out = Vec::with_capacity(2);

        let z = if self.pushed { PUSH_DEPTH } else { 0.0 };
        let r = self.to_sensor(p);
        out.push(SyntheticHand::new(Handedness::Right, self.right_pose)
            .center(Vec3::new(r.x, r.y, z))
            .frame());

        if self.left_shown {
            let l = self.to_sensor(Vec2::new(1.0 - p.x, p.y));
            out.push(SyntheticHand::new(Handedness::Left, self.left_pose)
                .center(Vec3::new(l.x, l.y, 0.0))
                .frame());
        }
        out
    }
}

impl HandSource for SimHandSource {
    fn poll(&mut self) -> Option<Vec<LandmarkFrame>> {
        let inputs: Vec<SimInput> = self.rx.try_iter().collect();
        for input in inputs {
            self.apply(input);
        }
        Some(self.hands())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks from a Leap Motion controller, polled on its own thread.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Millimetres are mapped into the unit cube over the comfortable
/// interaction box: x ∈ [−250, 250], y ∈ [50, 450] (flipped so up is up on
/// screen), z ∈ [−250, 250] scaled by 1/500.
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    rx: Receiver<Vec<LandmarkFrame>>,
}

#[cfg(feature = "leap")]
impl LeapHandSource {
    pub fn spawn() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            if let Err(e) = leap_loop(&tx) {
                log::error!("hand sensor stopped: {}", e);
            }
        });
        LeapHandSource { rx }
    }
}

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn poll(&mut self) -> Option<Vec<LandmarkFrame>> {
        self.rx.try_iter().last()
    }
}

#[cfg(feature = "leap")]
fn leap_loop(tx: &std::sync::mpsc::Sender<Vec<LandmarkFrame>>) -> Result<(), crate::error::AppError> {
    use crate::error::AppError;
    use leaprs::*;

    let mut connection = Connection::create(ConnectionConfig::default())
        .map_err(|e| AppError::Sensor(format!("cannot create LeapC connection: {:?}", e)))?;
    connection.open()
        .map_err(|e| AppError::Sensor(format!("cannot open Leap Motion device: {:?}", e)))?;
    log::info!("Leap Motion connection open");

    loop {
        let msg = match connection.poll(100) {
            Ok(m)  => m,
            Err(_) => continue,
        };
        if let Event::Tracking(frame) = msg.event() {
            let hands: Vec<LandmarkFrame> = frame.hands().filter_map(|h| {
                let handedness = match h.hand_type() {
                    HandType::Left => Handedness::Left,
                    _              => Handedness::Right,
                };
                let mm = leap_points(&h);
                match LandmarkFrame::new(&mm.map(normalize_mm), handedness) {
                    Ok(f)  => Some(f),
                    Err(e) => {
                        log::warn!("dropping Leap hand: {}", e);
                        None
                    }
                }
            }).collect();
            if tx.send(hands).is_err() {
                return Ok(());
            }
        }
    }
}

/// Wrist plus four joints per digit, in millimetres.
#[cfg(feature = "leap")]
fn leap_points(hand: &leaprs::Hand) -> [Vec3; hand_pose::LANDMARK_COUNT] {
    macro_rules! joint {
        ($j:expr) => {{ let j = $j; Vec3::new(j.x, j.y, j.z) }};
    }
    let mut pts = [Vec3::ZERO; hand_pose::LANDMARK_COUNT];
    let digits: Vec<_> = hand.digits().collect();
    if let Some(middle) = digits.get(2) {
        pts[0] = joint!(middle.metacarpal().prev_joint());
    }
    for (i, d) in digits.iter().take(5).enumerate() {
        let base = 1 + i * 4;
        pts[base]     = joint!(d.metacarpal().next_joint());
        pts[base + 1] = joint!(d.proximal().next_joint());
        pts[base + 2] = joint!(d.intermediate().next_joint());
        pts[base + 3] = joint!(d.distal().next_joint());
    }
    pts
}

/// Leap millimetres → normalized sensor space.
pub fn normalize_mm(p: Vec3) -> Vec3 {
    Vec3::new(
        (p.x + 250.0) / 500.0,
        1.0 - (p.y - 50.0) / 400.0,
        p.z / 500.0,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::{HandConfig, HandInterpreter};
    use std::sync::mpsc;

    fn source() -> (mpsc::Sender<SimInput>, SimHandSource) {
        let (tx, rx) = mpsc::channel();
        (tx, SimHandSource::new(rx, true))
    }

    #[test]
    fn no_pointer_no_hands() {
        let (_tx, mut src) = source();
        assert_eq!(src.poll().map(|h| h.len()), Some(0));
    }

    #[test]
    fn right_hand_lands_under_the_pointer() {
        let (tx, mut src) = source();
        tx.send(SimInput::Pointer(Some(Vec2::new(0.25, 0.5)))).unwrap();
        let frames = src.poll().unwrap();
        assert_eq!(frames.len(), 1);

        let mut interp = HandInterpreter::new(HandConfig::default()).with_surface(1000.0, 1000.0);
        let out = interp.interpret(&frames, 0.0);
        let palm = out.hands[0].state.palm_xy();
        // palm sits a little off the synthetic hand's centre
        assert!((palm.x - 250.0).abs() < 30.0, "palm x {}", palm.x);
    }

    #[test]
    fn left_hand_mirrors_and_takes_its_own_pose() {
        let (tx, mut src) = source();
        tx.send(SimInput::Pointer(Some(Vec2::new(0.3, 0.5)))).unwrap();
        tx.send(SimInput::Pose { hand: Handedness::Left, pose: PoseKind::Two }).unwrap();
        tx.send(SimInput::Pose { hand: Handedness::Right, pose: PoseKind::One }).unwrap();
        let frames = src.poll().unwrap();
        let mut interp = HandInterpreter::new(HandConfig::default());
        let out = interp.interpret(&frames, 0.0);
        assert_eq!(out.hand(Handedness::Right).map(|h| h.pose), Some(PoseKind::One));
        assert_eq!(out.hand(Handedness::Left).map(|h| h.pose), Some(PoseKind::Two));

        tx.send(SimInput::ToggleLeft).unwrap();
        assert_eq!(src.poll().unwrap().len(), 1);
    }

    #[test]
    fn push_moves_toward_the_sensor() {
        let (tx, mut src) = source();
        tx.send(SimInput::Pointer(Some(Vec2::new(0.5, 0.5)))).unwrap();
        let rest = src.poll().unwrap()[0].point(8).z;
        tx.send(SimInput::Push(true)).unwrap();
        let pushed = src.poll().unwrap()[0].point(8).z;
        assert!(pushed < rest);
    }

    #[test]
    fn interaction_box_maps_to_unit_square() {
        assert_eq!(normalize_mm(Vec3::new(-250.0, 450.0, 0.0)), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(normalize_mm(Vec3::new(250.0, 50.0, 250.0)), Vec3::new(1.0, 1.0, 0.5));
    }
}
