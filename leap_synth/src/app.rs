//! Frame loop: window, hand source, console and audio engine around the
//! pure [`step`] function.
//!
//! ```text
//! window keys ─┐                       ┌─▶ DrawCmds ─▶ window
//! console ─────┼─▶ FrameInput ─▶ step ─┼─▶ AudioCmds ─▶ AudioEngine
//! HandSource ──┘                       └─▶ SimEvents ─▶ log
//! ```

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use hand_pose::LandmarkFrame;

use crate::audio::{dispatch, open_midi_output, AudioEngine, MidiEngine, NullEngine, RecordingEngine};
use crate::config::{drain_updates, parse_command, update_channel, AudioSettings, ConfigUpdate, Settings, UpdateSender, UPDATE_QUEUE};
use crate::error::Result;
use crate::sensor::{HandSource, SimInput};
use crate::sim::{step, FrameInput, SimEvent, SimulationState};
use crate::visualizer::{UiAction, Visualizer};

/// How long the last observation stands in for a silent sensor.
pub const STALE_FRAME_MS: f64 = 250.0;

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Also write the session to this MIDI file.
    pub record: Option<PathBuf>,
    /// Skip MIDI port probing and run silent.
    pub quick:  bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Latest-frame policy
// ════════════════════════════════════════════════════════════════════════════

/// Keeps the newest observation. A sensor that skips a tick does not make
/// the hands vanish; one that stays quiet past [`STALE_FRAME_MS`] does.
#[derive(Default)]
pub struct LatestFrame {
    hands:   Vec<LandmarkFrame>,
    seen_ms: Option<f64>,
}

impl LatestFrame {
    pub fn update(&mut self, polled: Option<Vec<LandmarkFrame>>, now_ms: f64) -> Vec<LandmarkFrame> {
        match polled {
            Some(hands) => {
                self.hands = hands;
                self.seen_ms = Some(now_ms);
            }
            None => {
                let stale = self.seen_ms.map_or(true, |t| now_ms - t > STALE_FRAME_MS);
                if stale && !self.hands.is_empty() {
                    log::debug!("hand source silent for {} ms, dropping hands", STALE_FRAME_MS);
                    self.hands.clear();
                }
            }
        }
        self.hands.clone()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wiring
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "leap")]
fn hand_source(_sim: Receiver<SimInput>, _mirror: bool) -> Box<dyn HandSource> {
    Box::new(crate::sensor::LeapHandSource::spawn())
}

#[cfg(not(feature = "leap"))]
fn hand_source(sim: Receiver<SimInput>, mirror: bool) -> Box<dyn HandSource> {
    Box::new(crate::sensor::SimHandSource::new(sim, mirror))
}

fn audio_engine(settings: &AudioSettings, opts: &RunOptions, now_ms: f64) -> Box<dyn AudioEngine> {
    let base: Box<dyn AudioEngine> = if !settings.enabled || opts.quick {
        log::info!("audio output disabled");
        Box::new(NullEngine)
    } else {
        match open_midi_output(settings.port_hint.as_deref()) {
            Ok(out) => Box::new(MidiEngine::new(out, settings, now_ms)),
            Err(e) => {
                log::warn!("{}; continuing without sound", e);
                Box::new(NullEngine)
            }
        }
    };
    match &opts.record {
        Some(path) => {
            log::info!("recording session to {}", path.display());
            Box::new(RecordingEngine::new(base, settings, path.clone(), now_ms))
        }
        None => base,
    }
}

/// Reads control commands from stdin on its own thread.
fn spawn_console(tx: UpdateSender) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(update) => {
                    tx.send(update);
                }
                Err(e) => log::warn!("{}", e),
            }
        }
    });
}

fn log_events(events: &[SimEvent]) {
    for ev in events {
        match ev {
            SimEvent::ModeSwitched { from, to }   => log::info!("mode {} → {}", from, to),
            SimEvent::Calibrated { scale }        => log::info!("pads calibrated, scale {:.2}", scale),
            SimEvent::HoldStarted { hand, pose }  => log::debug!("{:?} hand holding {:?}", hand, pose),
            SimEvent::HoldAbandoned { hand, pose } => log::debug!("{:?} hand let go of {:?}", hand, pose),
            SimEvent::PadHit { pad, sound_id }    => log::debug!("pad {} hit: {}", pad, sound_id),
            SimEvent::TrailsCleared               => log::debug!("trails cleared"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run
// ════════════════════════════════════════════════════════════════════════════

pub fn run(settings: Settings, opts: RunOptions) -> Result<()> {
    // ── control surface ──────────────────────────────────────────────────
    let (update_tx, update_rx) = update_channel(UPDATE_QUEUE);
    spawn_console(update_tx);

    // ── hands ────────────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let mut source = hand_source(sim_rx, settings.hands.mirror);
    let mut latest = LatestFrame::default();

    // ── window, audio, state ─────────────────────────────────────────────
    let mut vis = Visualizer::new(settings.surface.width as usize, settings.surface.height as usize)?;
    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_secs_f64() * 1000.0;
    let mut engine = audio_engine(&settings.audio, &opts, now_ms());
    let mut state = SimulationState::new(settings);

    // ── main loop ────────────────────────────────────────────────────────
    let mut outcome = Ok(());
    'frames: while vis.is_open() {
        let mut updates: Vec<ConfigUpdate> = Vec::new();
        for action in vis.poll_input(state.settings()) {
            match action {
                UiAction::Quit          => break 'frames,
                // the receiver is gone when hardware drives the hands
                UiAction::Sim(input)    => { sim_tx.send(input).ok(); }
                UiAction::Config(u)     => updates.push(u),
            }
        }
        updates.extend(drain_updates(&update_rx));

        let now = now_ms();
        let hands = latest.update(source.poll(), now);
        let audio_before = state.settings().audio.clone();

        let (next, fx) = step(state, FrameInput { now_ms: now, hands, config_updates: updates });
        state = next;

        log_events(&fx.events);
        if state.settings().audio != audio_before {
            engine.configure(&state.settings().audio);
        }
        engine.tick(now);
        dispatch(engine.as_mut(), &fx.audio);

        if let Err(e) = vis.present(&fx.draws) {
            outcome = Err(e);
            break;
        }
    }

    engine.finish()?;
    outcome
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::synth::SyntheticHand;
    use hand_pose::{Handedness, PoseKind};

    fn hand() -> Vec<LandmarkFrame> {
        vec![SyntheticHand::new(Handedness::Right, PoseKind::Five).frame()]
    }

    #[test]
    fn silent_tick_reuses_the_last_frame() {
        let mut latest = LatestFrame::default();
        assert_eq!(latest.update(Some(hand()), 0.0).len(), 1);
        assert_eq!(latest.update(None, 100.0).len(), 1);
        assert_eq!(latest.update(None, STALE_FRAME_MS).len(), 1);
    }

    #[test]
    fn long_silence_drops_the_hands() {
        let mut latest = LatestFrame::default();
        latest.update(Some(hand()), 0.0);
        assert!(latest.update(None, STALE_FRAME_MS + 1.0).is_empty());
        assert_eq!(latest.update(Some(hand()), 400.0).len(), 1);
    }

    #[test]
    fn an_empty_observation_is_not_silence() {
        let mut latest = LatestFrame::default();
        latest.update(Some(hand()), 0.0);
        assert!(latest.update(Some(Vec::new()), 16.0).is_empty());
        assert!(latest.update(None, 32.0).is_empty());
    }

    #[test]
    fn quick_and_disabled_run_silent() {
        let settings = AudioSettings { enabled: false, ..AudioSettings::default() };
        let mut engine = audio_engine(&settings, &RunOptions::default(), 0.0);
        engine.trigger("kick");
        engine.tick(10.0);
        assert!(engine.finish().is_ok());

        let quick = RunOptions { quick: true, record: None };
        let mut engine = audio_engine(&AudioSettings::default(), &quick, 0.0);
        assert!(engine.finish().is_ok());
    }
}
