//! Mode state machine: sustained poses select the active mode.
//!
//! ```text
//! Idle ──pose seen──▶ Holding(pose) ──now − start ≥ dwell──▶ Transition ──done──▶ Idle
//!                        │
//!                        └──pose gone / changed──▶ Idle (or a fresh hold)
//! ```

use hand_pose::{HandFrame, Handedness, PoseKind};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Pads,
    Ribbons,
    Theremin,
    Particles,
    Nebula,
    Orbit,
    Echo,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Pads, Mode::Ribbons, Mode::Theremin, Mode::Particles,
        Mode::Nebula, Mode::Orbit, Mode::Echo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Pads      => "pads",
            Mode::Ribbons   => "ribbons",
            Mode::Theremin  => "theremin",
            Mode::Particles => "particles",
            Mode::Nebula    => "nebula",
            Mode::Orbit     => "orbit",
            Mode::Echo      => "echo",
        }
    }

    /// Modes whose main visual is the particle field.
    pub fn uses_particles(self) -> bool {
        matches!(self, Mode::Particles | Mode::Nebula)
    }
}

impl Default for Mode {
    fn default() -> Self { Mode::Particles }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL.into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode '{}'", s))
    }
}

/// The fixed pose → mode table. `Echo` has no pose; it is selected from the
/// control surface.
pub fn mode_for_pose(hand: Handedness, pose: PoseKind) -> Option<Mode> {
    match (hand, pose) {
        (Handedness::Right, PoseKind::One)  => Some(Mode::Pads),
        (Handedness::Right, PoseKind::Two)  => Some(Mode::Ribbons),
        (Handedness::Right, PoseKind::Five) => Some(Mode::Particles),
        (Handedness::Left,  PoseKind::One)  => Some(Mode::Theremin),
        (Handedness::Left,  PoseKind::Two)  => Some(Mode::Orbit),
        (Handedness::Left,  PoseKind::Five) => Some(Mode::Nebula),
        (_, PoseKind::None)                 => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HoldState / Transition
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoldState {
    pub pose:              PoseKind,
    pub hand:              Handedness,
    pub start_ms:          f64,
    pub required_dwell_ms: f64,
}

impl HoldState {
    pub fn elapsed(&self, now_ms: f64) -> f64 { now_ms - self.start_ms }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.elapsed(now_ms) >= self.required_dwell_ms
    }

    /// Fill of the dwell ring, `[0, 1]`.
    pub fn fraction(&self, now_ms: f64) -> f32 {
        if self.required_dwell_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now_ms) / self.required_dwell_ms).clamp(0.0, 1.0) as f32
    }
}

/// The mode-switch animation. Purely time-parameterised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub from:        Mode,
    pub to:          Mode,
    pub start_ms:    f64,
    pub duration_ms: f64,
}

impl Transition {
    /// Monotonic in `now_ms`, clamped to `[0, 1]`.
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn is_done(&self, now_ms: f64) -> bool { self.progress(now_ms) >= 1.0 }

    /// Full-screen flash, decays to zero.
    pub fn flash_alpha(&self, now_ms: f64) -> f32 {
        let p = self.progress(now_ms);
        0.6 * (1.0 - p) * (1.0 - p)
    }

    /// Mode name overlay, gone by the halfway point.
    pub fn overlay_alpha(&self, now_ms: f64) -> f32 {
        (1.0 - 2.0 * self.progress(now_ms)).max(0.0)
    }

    /// Radial burst: expanding radius (ease-out) and fading strength.
    pub fn burst(&self, now_ms: f64, max_radius: f32) -> (f32, f32) {
        let p = self.progress(now_ms);
        let eased = 1.0 - (1.0 - p).powi(3);
        (eased * max_radius, 1.0 - p)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ModeController
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModeEvent {
    HoldStarted   { hand: Handedness, pose: PoseKind },
    HoldAbandoned { hand: Handedness, pose: PoseKind },
    Switched      { from: Mode, to: Mode },
}

pub struct ModeController {
    mode:          Mode,
    hold:          Option<HoldState>,
    transition:    Option<Transition>,
    dwell_ms:      f64,
    transition_ms: f64,
}

impl ModeController {
    pub fn new(initial: Mode, dwell_ms: f64, transition_ms: f64) -> Self {
        ModeController { mode: initial, hold: None, transition: None, dwell_ms, transition_ms }
    }

    pub fn mode(&self) -> Mode { self.mode }
    pub fn hold(&self) -> Option<&HoldState> { self.hold.as_ref() }
    pub fn transition(&self) -> Option<&Transition> { self.transition.as_ref() }

    /// True while a switch animation is running; mode input is suspended.
    pub fn in_transition(&self, now_ms: f64) -> bool {
        self.transition.is_some_and(|t| !t.is_done(now_ms))
    }

    /// Applies to holds started from now on.
    pub fn set_timing(&mut self, dwell_ms: f64, transition_ms: f64) {
        self.dwell_ms = dwell_ms;
        self.transition_ms = transition_ms;
    }

    /// Switch immediately (with animation), bypassing the dwell.
    pub fn force_mode(&mut self, to: Mode, now_ms: f64) -> Option<ModeEvent> {
        self.hold = None;
        self.switch_to(to, now_ms)
    }

    /// Advance by one frame.
    pub fn update(&mut self, hands: &HandFrame, now_ms: f64) -> Vec<ModeEvent> {
        let mut events = Vec::new();

        if let Some(t) = self.transition {
            if !t.is_done(now_ms) {
                return events;
            }
            self.transition = None;
        }

        // Right hand first, so it wins when both show a pose.
        let seen = hands.hands.iter()
            .find(|h| h.pose.is_some())
            .map(|h| (h.handedness(), h.pose));

        match (self.hold, seen) {
            (Some(h), Some((hand, pose))) if h.hand == hand && h.pose == pose => {}
            (Some(h), other) => {
                log::debug!("hold {:?} {:?} abandoned after {:.0} ms", h.hand, h.pose, h.elapsed(now_ms));
                events.push(ModeEvent::HoldAbandoned { hand: h.hand, pose: h.pose });
                self.hold = None;
                if let Some((hand, pose)) = other {
                    self.start_hold(hand, pose, now_ms, &mut events);
                }
            }
            (None, Some((hand, pose))) => self.start_hold(hand, pose, now_ms, &mut events),
            (None, None) => {}
        }

        if let Some(h) = self.hold.filter(|h| h.is_due(now_ms)) {
            self.hold = None;
            if let Some(ev) = mode_for_pose(h.hand, h.pose).and_then(|to| self.switch_to(to, now_ms)) {
                events.push(ev);
            }
        }
        events
    }

    fn start_hold(&mut self, hand: Handedness, pose: PoseKind, now_ms: f64, events: &mut Vec<ModeEvent>) {
        log::debug!("hold {:?} {:?} started", hand, pose);
        self.hold = Some(HoldState { pose, hand, start_ms: now_ms, required_dwell_ms: self.dwell_ms });
        events.push(ModeEvent::HoldStarted { hand, pose });
    }

    fn switch_to(&mut self, to: Mode, now_ms: f64) -> Option<ModeEvent> {
        let from = self.mode;
        if from == to {
            log::debug!("already in {}, switch ignored", to);
            return None;
        }
        log::info!("mode {} → {}", from, to);
        self.mode = to;
        self.transition = Some(Transition { from, to, start_ms: now_ms, duration_ms: self.transition_ms });
        Some(ModeEvent::Switched { from, to })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
