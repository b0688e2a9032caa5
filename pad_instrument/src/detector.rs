//! Per-pad tap detectors.
//!
//! Every detector sees one fingertip sample per frame and returns whether it
//! qualifies as a tap. The first sample after a reset only records a baseline.
//! Depth follows the sensor convention: smaller z is closer to the sensor, so
//! a push toward it has positive push speed.

use glam::Vec2;

use crate::config::{PadConfig, TapAlgorithm};

/// One fingertip reading as a detector sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipSample {
    pub xy:     Vec2,
    pub z:      f32,
    pub t_ms:   f64,
    /// Radius containment against the pad this detector belongs to.
    pub inside: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthState {
    last: Option<(f32, f64)>,
}

impl DepthState {
    /// Record `s` and return the push speed toward the sensor (units/s)
    /// since the previous sample.
    fn advance(&mut self, s: &TipSample) -> Option<f32> {
        let prev = self.last.replace((s.z, s.t_ms));
        let (z0, t0) = prev?;
        let dt = s.t_ms - t0;
        if dt <= 0.0 {
            return None;
        }
        Some(-(s.z - z0) / (dt / 1000.0) as f32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WiggleState {
    last_xy: Option<Vec2>,
}

impl WiggleState {
    fn advance(&mut self, s: &TipSample) -> Option<f32> {
        let prev = self.last_xy.replace(s.xy)?;
        Some(prev.distance(s.xy))
    }
}

/// Bookkeeping for the active [`TapAlgorithm`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectorState {
    ZVelocity(DepthState),
    DwellRetreat {
        depth:       DepthState,
        dwell_start: Option<f64>,
    },
    Wiggle(WiggleState),
    Hybrid {
        depth:  DepthState,
        wiggle: WiggleState,
    },
}

impl DetectorState {
    pub fn new(algorithm: TapAlgorithm) -> Self {
        match algorithm {
            TapAlgorithm::ZVelocity    => DetectorState::ZVelocity(DepthState::default()),
            TapAlgorithm::DwellRetreat => DetectorState::DwellRetreat { depth: DepthState::default(), dwell_start: None },
            TapAlgorithm::Wiggle       => DetectorState::Wiggle(WiggleState::default()),
            TapAlgorithm::Hybrid       => DetectorState::Hybrid { depth: DepthState::default(), wiggle: WiggleState::default() },
        }
    }

    pub fn algorithm(&self) -> TapAlgorithm {
        match self {
            DetectorState::ZVelocity(_)        => TapAlgorithm::ZVelocity,
            DetectorState::DwellRetreat { .. } => TapAlgorithm::DwellRetreat,
            DetectorState::Wiggle(_)           => TapAlgorithm::Wiggle,
            DetectorState::Hybrid { .. }       => TapAlgorithm::Hybrid,
        }
    }

    /// Back to a fresh baseline, same algorithm.
    pub fn reset(&mut self) {
        *self = DetectorState::new(self.algorithm());
    }

    /// Feed one sample. State always advances, even while `armed` is false
    /// because the pad is cooling down. A qualifying dwell is only spent on
    /// an armed sample, so it survives the cooldown.
    pub fn update(&mut self, s: &TipSample, cfg: &PadConfig, armed: bool) -> bool {
        match self {
            DetectorState::ZVelocity(depth) => {
                let push = depth.advance(s);
                s.inside && push.is_some_and(|v| v >= cfg.z_velocity_threshold)
            }
            DetectorState::DwellRetreat { depth, dwell_start } => {
                let push = depth.advance(s);
                if !s.inside {
                    *dwell_start = None;
                    return false;
                }
                let start = *dwell_start.get_or_insert(s.t_ms);
                let dwelled = s.t_ms - start >= cfg.dwell_ms;
                let retreating = push.is_some_and(|v| v <= -cfg.retreat_velocity);
                if dwelled && retreating && armed {
                    *dwell_start = None;
                    return true;
                }
                false
            }
            DetectorState::Wiggle(wiggle) => {
                let step = wiggle.advance(s);
                s.inside && step.is_some_and(|d| d >= cfg.wiggle_threshold)
            }
            DetectorState::Hybrid { depth, wiggle } => {
                let push = depth.advance(s);
                let step = wiggle.advance(s);
                s.inside
                    && (push.is_some_and(|v| v >= cfg.z_velocity_threshold)
                        || step.is_some_and(|d| d >= cfg.wiggle_threshold))
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn at(t_ms: f64, x: f32, z: f32) -> TipSample {
        TipSample { xy: Vec2::new(x, 0.0), z, t_ms, inside: true }
    }

    fn run(alg: TapAlgorithm, samples: &[TipSample]) -> Vec<bool> {
        let cfg = PadConfig::default();
        let mut d = DetectorState::new(alg);
        samples.iter().map(|s| d.update(s, &cfg, true)).collect()
    }

    #[test_case(TapAlgorithm::ZVelocity)]
    #[test_case(TapAlgorithm::DwellRetreat)]
    #[test_case(TapAlgorithm::Wiggle)]
    #[test_case(TapAlgorithm::Hybrid)]
    fn first_sample_is_baseline(alg: TapAlgorithm) {
        assert_eq!(run(alg, &[at(0.0, 500.0, -9.0)]), vec![false]);
    }

    #[test]
    fn z_velocity_fires_on_push() {
        // 0.02 depth units in 16 ms = 1.25 units/s toward the sensor
        let fired = run(TapAlgorithm::ZVelocity, &[at(0.0, 0.0, 0.0), at(16.0, 0.0, -0.02), at(32.0, 0.0, -0.021)]);
        assert_eq!(fired, vec![false, true, false]);
    }

    #[test]
    fn z_velocity_ignores_pull_back() {
        let fired = run(TapAlgorithm::ZVelocity, &[at(0.0, 0.0, 0.0), at(16.0, 0.0, 0.02)]);
        assert_eq!(fired, vec![false, false]);
    }

    #[test]
    fn nothing_fires_outside_the_pad() {
        let mut outside = at(16.0, 0.0, -0.05);
        outside.inside = false;
        assert_eq!(run(TapAlgorithm::Hybrid, &[at(0.0, 100.0, 0.0), outside]), vec![false, false]);
    }

    #[test]
    fn dwell_retreat_needs_dwell_then_retreat() {
        let samples = [
            at(0.0, 0.0, 0.0),
            at(50.0, 0.0, 0.0),
            at(66.0, 0.0, 0.02),    // retreat, but dwell too short
            at(150.0, 0.0, 0.02),
            at(166.0, 0.0, 0.04),   // dwelled 166 ms, retreat 1.25 units/s
            at(182.0, 0.0, 0.06),   // dwell restarted on trigger
        ];
        assert_eq!(
            run(TapAlgorithm::DwellRetreat, &samples),
            vec![false, false, false, false, true, false],
        );
    }

    #[test]
    fn leaving_the_pad_resets_dwell() {
        let cfg = PadConfig::default();
        let mut d = DetectorState::new(TapAlgorithm::DwellRetreat);
        d.update(&at(0.0, 0.0, 0.0), &cfg, true);
        let mut out = at(100.0, 0.0, 0.0);
        out.inside = false;
        d.update(&out, &cfg, true);
        d.update(&at(116.0, 0.0, 0.0), &cfg, true);
        assert!(!d.update(&at(132.0, 0.0, 0.03), &cfg, true));
    }

    #[test]
    fn dwell_survives_a_disarmed_retreat() {
        let cfg = PadConfig::default();
        let mut d = DetectorState::new(TapAlgorithm::DwellRetreat);
        d.update(&at(0.0, 0.0, 0.0), &cfg, true);
        d.update(&at(150.0, 0.0, 0.0), &cfg, true);
        assert!(!d.update(&at(166.0, 0.0, 0.02), &cfg, false));
        assert!(d.update(&at(182.0, 0.0, 0.04), &cfg, true));
    }

    #[test]
    fn wiggle_fires_on_lateral_step() {
        let fired = run(TapAlgorithm::Wiggle, &[at(0.0, 0.0, 0.0), at(16.0, 5.0, 0.0), at(32.0, 25.0, 0.0)]);
        assert_eq!(fired, vec![false, false, true]);
    }

    #[test_case(&[at(0.0, 0.0, 0.0), at(16.0, 0.0, -0.02)] ; "push")]
    #[test_case(&[at(0.0, 0.0, 0.0), at(16.0, 30.0, 0.0)]  ; "shake")]
    fn hybrid_fires_on_either(samples: &[TipSample]) {
        assert_eq!(run(TapAlgorithm::Hybrid, samples), vec![false, true]);
    }

    #[test]
    fn reset_keeps_algorithm() {
        let cfg = PadConfig::default();
        let mut d = DetectorState::new(TapAlgorithm::Wiggle);
        d.update(&at(0.0, 0.0, 0.0), &cfg, true);
        d.reset();
        assert_eq!(d, DetectorState::new(TapAlgorithm::Wiggle));
        assert!(!d.update(&at(16.0, 90.0, 0.0), &cfg, true));
    }
}
