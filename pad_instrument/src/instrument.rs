use glam::Vec2;
use hand_pose::{Finger, HandState, TrackedHand};

use crate::config::{PadConfig, TapAlgorithm};
use crate::detector::{DetectorState, TipSample};
use crate::layout::{calibrate, Pad, PadLayout};

/// One pad hit, ready to become an audio trigger.
#[derive(Clone, Debug, PartialEq)]
pub struct PadTrigger {
    pub pad:      usize,
    pub sound_id: String,
    pub finger:   Finger,
}

/// The pad set plus the detector state of every pad.
pub struct PadInstrument {
    config:  PadConfig,
    surface: Vec2,
    layout:  PadLayout,
}

impl PadInstrument {
    /// Starts on the fallback layout until [`calibrate_from`](Self::calibrate_from) succeeds.
    pub fn new(config: PadConfig, surface: Vec2) -> Self {
        let layout = PadLayout::fallback(surface, &config);
        PadInstrument { config, surface, layout }
    }

    pub fn config(&self) -> &PadConfig { &self.config }
    pub fn layout(&self) -> &PadLayout { &self.layout }
    pub fn pads(&self) -> &[Pad] { &self.layout.pads }
    pub fn is_calibrated(&self) -> bool { self.layout.calibrated }

    /// Rebuild the pad set from `hand`. On failure the current layout stays
    /// and `None` is returned.
    pub fn calibrate_from(&mut self, hand: &HandState) -> Option<f32> {
        let layout = calibrate(&hand.tips_xy(), hand.palm_xy(), self.surface, &self.config)?;
        let scale = layout.scale;
        log::info!("pads calibrated: scale {:.3}, {} pads", scale, layout.len());
        self.layout = layout;
        Some(scale)
    }

    /// Drop any calibration and go back to the fallback fan.
    pub fn reset_layout(&mut self) {
        self.layout = PadLayout::fallback(self.surface, &self.config);
    }

    pub fn set_surface(&mut self, surface: Vec2) {
        self.surface = surface;
        if !self.layout.calibrated {
            self.reset_layout();
        }
    }

    /// Apply new tuning. A different algorithm resets every detector; new
    /// geometry rebuilds the fallback fan (a calibrated layout keeps its pads
    /// until the next calibration).
    pub fn set_config(&mut self, config: PadConfig) {
        let algorithm_changed = config.tap_algorithm != self.config.tap_algorithm;
        let geometry_changed = config.pads_per_finger != self.config.pads_per_finger
            || config.base_size != self.config.base_size
            || config.spacing != self.config.spacing;
        self.config = config;
        if geometry_changed && !self.layout.calibrated {
            self.reset_layout();
        } else if algorithm_changed {
            self.reset_detectors();
        }
    }

    pub fn set_tap_algorithm(&mut self, algorithm: TapAlgorithm) {
        if algorithm != self.config.tap_algorithm {
            log::debug!("tap algorithm → {}", algorithm.name());
            self.config.tap_algorithm = algorithm;
            self.reset_detectors();
        }
    }

    /// Forget every detector's baseline, e.g. when the tracked hand is lost.
    pub fn release(&mut self) {
        for pad in &mut self.layout.pads {
            pad.detector.reset();
        }
    }

    fn reset_detectors(&mut self) {
        let alg = self.config.tap_algorithm;
        for pad in &mut self.layout.pads {
            pad.detector = DetectorState::new(alg);
        }
    }

    /// Run every pad's detector against its finger on `hand`.
    pub fn detect(&mut self, hand: &TrackedHand, now_ms: f64) -> Vec<PadTrigger> {
        let cfg = &self.config;
        let mut hits = Vec::new();
        for (i, pad) in self.layout.pads.iter_mut().enumerate() {
            let tip = hand.state.tip(pad.finger);
            let sample = TipSample {
                xy:     tip.xy(),
                z:      tip.position.z,
                t_ms:   now_ms,
                inside: pad.contains(tip.xy()),
            };
            let cooling = pad.last_trigger_ms.is_some_and(|t| now_ms - t < cfg.cooldown_ms);
            let qualifies = pad.detector.update(&sample, cfg, !cooling);
            if qualifies && !cooling {
                pad.last_trigger_ms = Some(now_ms);
                log::debug!("pad {} ({}) hit at {:.0} ms", i, pad.sound_id, now_ms);
                hits.push(PadTrigger { pad: i, sound_id: pad.sound_id.clone(), finger: pad.finger });
            }
        }
        hits
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use hand_pose::{Fingertip, Handedness, PoseKind};
    use pretty_assertions::assert_eq;

    const SURFACE: Vec2 = Vec2::new(1280.0, 720.0);

    /// A right hand with every fingertip parked off-canvas except `finger`,
    /// which sits at `tip`.
    fn hand_with(finger: Finger, tip: Vec3) -> TrackedHand {
        let fingertips = Finger::ALL.map(|f| Fingertip {
            finger:   f,
            position: if f == finger { tip } else { Vec3::new(-500.0, -500.0, 0.0) },
        });
        TrackedHand {
            state: HandState {
                palm: Vec3::new(640.0, 600.0, 0.0),
                fingertips,
                finger_spread: 80.0,
                handedness: Handedness::Right,
            },
            previous: None,
            pose:     PoseKind::None,
            dt_ms:    None,
        }
    }

    fn first_index_pad(inst: &PadInstrument) -> (usize, Vec2) {
        inst.pads().iter().enumerate()
            .find(|(_, p)| p.finger == Finger::Index)
            .map(|(i, p)| (i, p.center))
            .unwrap()
    }

    #[test]
    fn push_into_pad_triggers_its_sound() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let (idx, c) = first_index_pad(&inst);
        assert!(inst.detect(&hand_with(Finger::Index, c.extend(0.0)), 0.0).is_empty());
        let hits = inst.detect(&hand_with(Finger::Index, c.extend(-0.03)), 16.0);
        assert_eq!(hits, vec![PadTrigger { pad: idx, sound_id: "snare_0".into(), finger: Finger::Index }]);
    }

    #[test]
    fn cooldown_swallows_second_qualifying_tap() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let (_, c) = first_index_pad(&inst);
        let mut fired = 0;
        // pushes every frame: 0, 16, 32 … 160 ms all within 180 ms of the first hit
        for k in 0..11 {
            let t = k as f64 * 16.0;
            fired += inst.detect(&hand_with(Finger::Index, c.extend(-0.03 * k as f32)), t).len();
        }
        assert_eq!(fired, 1);
        // past the refractory period the next push counts again
        fired += inst.detect(&hand_with(Finger::Index, c.extend(-0.4)), 200.0).len();
        assert_eq!(fired, 2);
    }

    #[test]
    fn dwell_armed_during_cooldown_fires_once_it_ends() {
        let cfg = PadConfig { tap_algorithm: TapAlgorithm::DwellRetreat, ..PadConfig::default() };
        let mut inst = PadInstrument::new(cfg, SURFACE);
        let (_, c) = first_index_pad(&inst);
        let hits = |inst: &mut PadInstrument, t: f64, z: f32| inst.detect(&hand_with(Finger::Index, c.extend(z)), t).len();

        assert_eq!(hits(&mut inst, 0.0, 0.0), 0);
        assert_eq!(hits(&mut inst, 150.0, 0.0), 0);
        assert_eq!(hits(&mut inst, 166.0, 0.02), 1);
        // second dwell starts at 182 and qualifies at 326, still inside the cooldown
        assert_eq!(hits(&mut inst, 182.0, 0.02), 0);
        assert_eq!(hits(&mut inst, 310.0, 0.02), 0);
        assert_eq!(hits(&mut inst, 326.0, 0.04), 0);
        assert_eq!(hits(&mut inst, 350.0, 0.06), 1);
    }

    #[test]
    fn other_fingers_do_not_hit_index_pads() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let (_, c) = first_index_pad(&inst);
        inst.detect(&hand_with(Finger::Pinky, c.extend(0.0)), 0.0);
        assert!(inst.detect(&hand_with(Finger::Pinky, c.extend(-0.05)), 16.0).is_empty());
    }

    #[test]
    fn release_makes_next_sample_a_baseline() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let (_, c) = first_index_pad(&inst);
        inst.detect(&hand_with(Finger::Index, c.extend(0.0)), 0.0);
        inst.release();
        assert!(inst.detect(&hand_with(Finger::Index, c.extend(-0.05)), 16.0).is_empty());
    }

    #[test]
    fn switching_algorithm_resets_detectors() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let (_, c) = first_index_pad(&inst);
        inst.detect(&hand_with(Finger::Index, c.extend(0.0)), 0.0);
        inst.set_tap_algorithm(TapAlgorithm::Wiggle);
        assert!(inst.pads().iter().all(|p| p.detector == DetectorState::new(TapAlgorithm::Wiggle)));
    }

    #[test]
    fn calibration_replaces_fallback() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        assert!(!inst.is_calibrated());
        let mut hand = hand_with(Finger::Thumb, Vec3::ZERO).state;
        for (i, t) in hand.fingertips.iter_mut().enumerate() {
            t.position = Vec3::new(480.0 + 80.0 * i as f32, 300.0, 0.0);
        }
        assert_eq!(inst.calibrate_from(&hand), Some(1.0));
        assert!(inst.is_calibrated());
        inst.reset_layout();
        assert!(!inst.is_calibrated());
    }

    #[test]
    fn failed_calibration_keeps_layout() {
        let mut inst = PadInstrument::new(PadConfig::default(), SURFACE);
        let before = inst.layout().clone();
        let hand = hand_with(Finger::Thumb, Vec3::new(-500.0, -500.0, 0.0)).state;
        assert_eq!(inst.calibrate_from(&hand), None);
        assert_eq!(inst.layout(), &before);
    }
}
