//! One frame of the synth, as a pure function of the persistent state and
//! this frame's input.
//!
//! ```text
//! FrameInput ─▶ config updates ─▶ hand interpreter ─▶ mode controller
//!                                                        │
//!        FrameEffects ◀─ overlay ◀─ visuals ◀─ particles ◀─ mode input
//! ```
//!
//! Nothing here touches a window, a MIDI port or a clock; the caller feeds
//! time in and carries draw lists and audio commands out.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use hand_pose::{Finger, HandFrame, HandInterpreter, Handedness, LandmarkFrame, PoseKind};
use pad_instrument::PadInstrument;
use particle_field::{EmitterSource, ParticleConfig, ParticleEngine};

use crate::config::{ConfigUpdate, Param, Settings};
use crate::draw::{DrawCmd, DrawList};
use crate::mode::{Mode, ModeController, ModeEvent};
use crate::render::{
    draw_fingertips, draw_pads, draw_sprites, draw_touch_connections, renderer_for, RenderContext,
};

/// Smallest parameter change worth sending, one step of a 8-bit control.
pub const PARAM_EPSILON: f32 = 1.0 / 256.0;

// ════════════════════════════════════════════════════════════════════════════
// Frame I/O
// ════════════════════════════════════════════════════════════════════════════

/// Continuous synth parameters, all normalized to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamState {
    pub filter_cutoff:   f32,
    pub resonance:       f32,
    pub theremin_pitch:  f32,
    pub theremin_volume: f32,
    pub delay_mix:       f32,
}

impl Default for ParamState {
    fn default() -> Self {
        ParamState {
            filter_cutoff:   0.5,
            resonance:       0.2,
            theremin_pitch:  0.5,
            theremin_volume: 0.0,
            delay_mix:       0.0,
        }
    }
}

impl ParamState {
    pub fn values(&self) -> [(&'static str, f32); 5] {
        [
            ("filter_cutoff",   self.filter_cutoff),
            ("resonance",       self.resonance),
            ("theremin_pitch",  self.theremin_pitch),
            ("theremin_volume", self.theremin_volume),
            ("delay_mix",       self.delay_mix),
        ]
    }

    pub fn set(&mut self, name: &str, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match name {
            "filter_cutoff"   => self.filter_cutoff = v,
            "resonance"       => self.resonance = v,
            "theremin_pitch"  => self.theremin_pitch = v,
            "theremin_volume" => self.theremin_volume = v,
            "delay_mix"       => self.delay_mix = v,
            other => log::warn!("ignoring unknown parameter '{}'", other),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCmd {
    Trigger  { sound_id: String },
    SetParam { name: &'static str, value: f32, ramp_ms: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    ModeSwitched  { from: Mode, to: Mode },
    HoldStarted   { hand: Handedness, pose: PoseKind },
    HoldAbandoned { hand: Handedness, pose: PoseKind },
    PadHit        { pad: usize, sound_id: String },
    Calibrated    { scale: f32 },
    TrailsCleared,
}

#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub now_ms:         f64,
    /// This tick's observations; empty when no hand is visible.
    pub hands:          Vec<LandmarkFrame>,
    pub config_updates: Vec<ConfigUpdate>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameEffects {
    pub draws:  Vec<DrawCmd>,
    pub audio:  Vec<AudioCmd>,
    pub events: Vec<SimEvent>,
}

// ════════════════════════════════════════════════════════════════════════════
// SimulationState
// ════════════════════════════════════════════════════════════════════════════

/// Everything that survives from one frame to the next.
pub struct SimulationState {
    settings:            Settings,
    interpreter:         HandInterpreter,
    controller:          ModeController,
    pads:                PadInstrument,
    particles:           ParticleEngine,
    params:              ParamState,
    /// Last value sent per parameter; `None` until the first frame.
    sent:                Option<ParamState>,
    last_frame_ms:       Option<f64>,
    calibrate_requested: bool,
}

impl SimulationState {
    pub fn new(settings: Settings) -> Self {
        let surface = settings.surface_size();
        let interpreter = HandInterpreter::new(settings.hands.clone()).with_surface(surface.x, surface.y);
        let controller = ModeController::new(Mode::default(), settings.gesture.dwell_ms, settings.gesture.transition_ms);
        let pads = PadInstrument::new(settings.pads.clone(), surface);
        let particles = ParticleEngine::new(
            effective_particle_config(&settings.particles, Mode::default()),
            surface.x,
            surface.y,
            settings.visual.seed,
        );
        SimulationState {
            settings,
            interpreter,
            controller,
            pads,
            particles,
            params: ParamState::default(),
            sent: None,
            last_frame_ms: None,
            calibrate_requested: false,
        }
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn mode(&self) -> Mode { self.controller.mode() }
    pub fn controller(&self) -> &ModeController { &self.controller }
    pub fn pads(&self) -> &PadInstrument { &self.pads }
    pub fn particles(&self) -> &ParticleEngine { &self.particles }
    pub fn params(&self) -> &ParamState { &self.params }
    pub fn surface(&self) -> Vec2 { self.settings.surface_size() }

    fn apply_update(&mut self, update: ConfigUpdate, now_ms: f64, events: &mut Vec<SimEvent>) {
        log::debug!("applying {:?}", update);
        match update {
            ConfigUpdate::Set(p, v) => {
                let stored = p.apply(&mut self.settings, v);
                if v.is_nan() || (stored - v).abs() > 1e-6 * v.abs().max(1.0) {
                    log::warn!("{} clamped from {} to {}", p.name(), v, stored);
                }
                if matches!(p, Param::DwellMs | Param::TransitionMs) {
                    self.controller.set_timing(self.settings.gesture.dwell_ms, self.settings.gesture.transition_ms);
                }
            }
            ConfigUpdate::SetTapAlgorithm(alg) => {
                self.settings.pads.tap_algorithm = alg;
                self.pads.set_tap_algorithm(alg);
                log::info!("tap algorithm: {}", alg.name());
            }
            ConfigUpdate::SetColorMode(c) => self.settings.particles.color_mode = c,
            ConfigUpdate::SetMode(to) => {
                if let Some(ModeEvent::Switched { from, to }) = self.controller.force_mode(to, now_ms) {
                    events.push(SimEvent::ModeSwitched { from, to });
                }
            }
            ConfigUpdate::Calibrate => self.calibrate_requested = true,
            ConfigUpdate::ClearParticles => self.particles.clear(),
        }
    }

    /// Push changed settings down into the subsystems that own a copy.
    fn sync_subsystems(&mut self) {
        if self.interpreter.config() != &self.settings.hands {
            self.interpreter.set_config(self.settings.hands.clone());
        }
        if self.pads.config() != &self.settings.pads {
            self.pads.set_config(self.settings.pads.clone());
        }
        let particles = effective_particle_config(&self.settings.particles, self.controller.mode());
        if self.particles.config() != &particles {
            self.particles.set_config(particles);
        }
    }

    fn advance(&mut self, input: FrameInput) -> FrameEffects {
        let now = input.now_ms;
        let dt = self.last_frame_ms.map_or(0.0, |t| (now - t).max(0.0));
        self.last_frame_ms = Some(now);
        let mut fx = FrameEffects::default();
        let prev_mode = self.controller.mode();

        // ── control surface, at the frame boundary ──
        for update in input.config_updates {
            self.apply_update(update, now, &mut fx.events);
        }
        self.sync_subsystems();

        // ── hands ──
        let hands = self.interpreter.interpret(&input.hands, now);
        if hands.trails_cleared {
            fx.events.push(SimEvent::TrailsCleared);
        }
        if self.calibrate_requested {
            if let Some(primary) = hands.primary() {
                self.calibrate_requested = false;
                match self.pads.calibrate_from(&primary.state) {
                    Some(scale) => fx.events.push(SimEvent::Calibrated { scale }),
                    None        => log::warn!("calibration failed, keeping the current pad layout"),
                }
            }
        }

        // ── mode ──
        for ev in self.controller.update(&hands, now) {
            fx.events.push(match ev {
                ModeEvent::HoldStarted { hand, pose }   => SimEvent::HoldStarted { hand, pose },
                ModeEvent::HoldAbandoned { hand, pose } => SimEvent::HoldAbandoned { hand, pose },
                ModeEvent::Switched { from, to }        => SimEvent::ModeSwitched { from, to },
            });
        }
        let mode = self.controller.mode();
        if prev_mode != mode {
            if prev_mode == Mode::Pads {
                self.pads.release();
            }
            self.sync_subsystems();
        }
        let active = !self.controller.in_transition(now);

        // ── mode input ──
        if active {
            self.mode_input(mode, &hands, now, &mut fx);
        }
        if mode != Mode::Theremin {
            self.params.theremin_volume = 0.0;
        }

        // ── particles ──
        let sources = if active && mode.uses_particles() { emitter_sources(&hands) } else { Vec::new() };
        self.particles.emit(&sources, now);
        self.particles.integrate(now, dt);
        if active && mode.uses_particles() {
            self.params.delay_mix = self.particles.fill_fraction();
        }

        // ── visuals ──
        let mut out = DrawList::new();
        out.push(DrawCmd::Fade { color: 0x000000, alpha: self.settings.visual.fade });
        self.draw_mode(mode, &hands, now, &mut out);
        self.draw_hold(&hands, now, &mut out);
        self.draw_transition(now, &mut out);
        self.draw_hud(mode, &mut out);
        fx.draws = out.into_vec();

        // ── continuous parameters ──
        self.send_params(&mut fx.audio);
        fx
    }

    fn mode_input(&mut self, mode: Mode, hands: &HandFrame, now: f64, fx: &mut FrameEffects) {
        let surface = self.surface();
        let spread_ref = 2.0 * self.settings.pads.reference_spread;

        match mode {
            Mode::Pads => match hands.primary() {
                Some(hand) => {
                    for t in self.pads.detect(hand, now) {
                        fx.audio.push(AudioCmd::Trigger { sound_id: t.sound_id.clone() });
                        fx.events.push(SimEvent::PadHit { pad: t.pad, sound_id: t.sound_id });
                    }
                }
                None => self.pads.release(),
            },
            Mode::Ribbons => {
                if let Some(hand) = hands.primary() {
                    self.params.filter_cutoff = (1.0 - hand.state.palm.y / surface.y).clamp(0.0, 1.0);
                    self.params.resonance = (hand.state.finger_spread / spread_ref).clamp(0.0, 1.0);
                }
            }
            Mode::Theremin => {
                if let Some(right) = hands.hand(Handedness::Right) {
                    self.params.theremin_pitch = (right.state.palm.x / surface.x).clamp(0.0, 1.0);
                }
                self.params.theremin_volume = hands.hand(Handedness::Left)
                    .map_or(0.0, |left| (1.0 - left.state.palm.y / surface.y).clamp(0.0, 1.0));
            }
            Mode::Echo => {
                if let Some(hand) = hands.primary() {
                    self.params.delay_mix = (hand.state.finger_spread / spread_ref).clamp(0.0, 1.0);
                }
            }
            Mode::Particles | Mode::Nebula | Mode::Orbit => {}
        }
    }

    fn draw_mode(&self, mode: Mode, hands: &HandFrame, now: f64, out: &mut DrawList) {
        let ctx = RenderContext {
            hands,
            trails:  self.interpreter.trails(),
            visual:  &self.settings.visual,
            params:  &self.params,
            now_ms:  now,
            surface: self.surface(),
        };
        match mode {
            Mode::Pads => {
                draw_pads(self.pads.pads(), now, self.settings.pads.cooldown_ms, out);
                draw_touch_connections(&ctx, out);
            }
            Mode::Particles | Mode::Nebula => {
                let external = hands.primary().map_or(0.5, |h| h.state.palm.x / ctx.surface.x);
                draw_sprites(&self.particles.render(now, external), out);
                draw_touch_connections(&ctx, out);
            }
            other => {
                if let Some(renderer) = renderer_for(other) {
                    renderer.render(&ctx, out);
                }
            }
        }
        draw_fingertips(&ctx, out);
    }

    /// Dwell ring around the palm of the hand holding a pose.
    fn draw_hold(&self, hands: &HandFrame, now: f64, out: &mut DrawList) {
        let Some(hold) = self.controller.hold() else { return };
        let Some(hand) = hands.hand(hold.hand) else { return };
        let sweep = hold.fraction(now) * TAU;
        out.push(DrawCmd::Arc {
            center:      hand.state.palm_xy(),
            radius:      40.0,
            start_angle: -FRAC_PI_2,
            end_angle:   -FRAC_PI_2 + sweep,
            width:       4.0,
            color:       0xFFFFFF,
            alpha:       0.8,
        });
    }

    fn draw_transition(&self, now: f64, out: &mut DrawList) {
        let Some(t) = self.controller.transition().filter(|t| !t.is_done(now)) else { return };
        let surface = self.surface();
        let center = surface * 0.5;
        let (radius, strength) = t.burst(now, surface.length() * 0.5);

        for k in 0..3 {
            let k = k as f32;
            out.push(DrawCmd::Arc {
                center,
                radius:      radius * (1.0 - 0.15 * k),
                start_angle: 0.0,
                end_angle:   TAU,
                width:       2.0 + 6.0 * strength,
                color:       0xFFFFFF,
                alpha:       strength * (1.0 - 0.3 * k),
            });
        }
        out.push(DrawCmd::Flash { color: 0xFFFFFF, alpha: t.flash_alpha(now) });

        let scale = 6u32;
        let name = t.to.name();
        let text_w = name.len() as f32 * 4.0 * scale as f32;
        let pos = center - Vec2::new(text_w * 0.5, 2.5 * scale as f32);
        out.text(pos, name, 0xFFFFFF, t.overlay_alpha(now), scale);
    }

    fn draw_hud(&self, mode: Mode, out: &mut DrawList) {
        let label = match mode {
            Mode::Pads => format!("{} {}", mode.name(), if self.pads.is_calibrated() { "cal" } else { "" }),
            m if m.uses_particles() => format!("{} {}", m.name(), self.particles.len()),
            m => m.name().to_string(),
        };
        out.text(Vec2::new(12.0, 12.0), label.trim_end(), 0xC0C0C0, 0.8, 2);
    }

    fn send_params(&mut self, audio: &mut Vec<AudioCmd>) {
        let ramp_ms = self.settings.audio.ramp_ms;
        let sent = self.sent.get_or_insert_with(|| {
            // force every parameter out on the first frame
            ParamState {
                filter_cutoff:   -1.0,
                resonance:       -1.0,
                theremin_pitch:  -1.0,
                theremin_volume: -1.0,
                delay_mix:       -1.0,
            }
        });
        let previous = sent.values();
        for ((name, value), (_, last)) in self.params.values().into_iter().zip(previous) {
            if (value - last).abs() > PARAM_EPSILON {
                audio.push(AudioCmd::SetParam { name, value, ramp_ms });
                sent.set(name, value);
            }
        }
    }
}

/// Advance the synth by one frame.
pub fn step(mut state: SimulationState, input: FrameInput) -> (SimulationState, FrameEffects) {
    let effects = state.advance(input);
    (state, effects)
}

/// The particle settings in force for `mode`. Nebula swaps gravity for
/// turbulence and pulls particles together.
pub fn effective_particle_config(base: &ParticleConfig, mode: Mode) -> ParticleConfig {
    let mut c = base.clone();
    if mode == Mode::Nebula {
        c.turbulence = true;
        c.gravity = 0.0;
        c.attraction = c.attraction.max(60.0);
    }
    c
}

/// One source per visible fingertip, moving with the fingertip.
fn emitter_sources(hands: &HandFrame) -> Vec<EmitterSource> {
    hands.hands.iter().flat_map(|hand| {
        Finger::ALL.into_iter().map(move |f| EmitterSource {
            position: hand.state.tip(f).xy(),
            velocity: hand.fingertip_velocity(f).map_or(Vec2::ZERO, |v| v.truncate() * 1000.0),
            origin:   Some((hand.handedness(), f)),
        })
    }).collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use hand_pose::synth::SyntheticHand;
    use pretty_assertions::assert_eq;

    fn settings() -> Settings {
        let mut s = Settings::default();
        s.surface.width = 1000;
        s.surface.height = 800;
        s
    }

    fn frame(now_ms: f64, hands: Vec<LandmarkFrame>, updates: Vec<ConfigUpdate>) -> FrameInput {
        FrameInput { now_ms, hands, config_updates: updates }
    }

    fn hand(h: Handedness, pose: PoseKind, x: f32, y: f32) -> LandmarkFrame {
        SyntheticHand::new(h, pose).center(Vec3::new(x, y, 0.0)).frame()
    }

    fn params_sent(fx: &FrameEffects) -> Vec<&'static str> {
        fx.audio.iter().filter_map(|a| match a {
            AudioCmd::SetParam { name, .. } => Some(*name),
            _ => None,
        }).collect()
    }

    #[test]
    fn first_frame_sends_every_parameter_once() {
        let state = SimulationState::new(settings());
        let (state, fx) = step(state, frame(0.0, vec![], vec![]));
        assert_eq!(params_sent(&fx).len(), 5);
        let (_, fx) = step(state, frame(16.0, vec![], vec![]));
        assert!(params_sent(&fx).is_empty());
    }

    #[test]
    fn updates_apply_before_the_frame() {
        let state = SimulationState::new(settings());
        let (state, _) = step(state, frame(0.0, vec![], vec![
            ConfigUpdate::Set(Param::EmissionRate, 500.0),
            ConfigUpdate::Set(Param::Drag, 7.0),
        ]));
        assert_eq!(state.particles().config().emission_rate, 500.0);
        assert_eq!(state.settings().particles.drag, 1.0);
    }

    #[test]
    fn set_mode_reaches_echo() {
        let state = SimulationState::new(settings());
        let (state, fx) = step(state, frame(0.0, vec![], vec![ConfigUpdate::SetMode(Mode::Echo)]));
        assert_eq!(state.mode(), Mode::Echo);
        assert!(fx.events.contains(&SimEvent::ModeSwitched { from: Mode::Particles, to: Mode::Echo }));
        // the overlay is up
        assert!(fx.draws.iter().any(|d| matches!(d, DrawCmd::Flash { .. })));
    }

    #[test]
    fn nebula_overrides_particle_physics() {
        let state = SimulationState::new(settings());
        let (state, _) = step(state, frame(0.0, vec![], vec![ConfigUpdate::SetMode(Mode::Nebula)]));
        let c = state.particles().config();
        assert!(c.turbulence);
        assert_eq!(c.gravity, 0.0);
        assert_eq!(c.attraction, 60.0);
        // and they are restored on the way out
        let (state, _) = step(state, frame(2000.0, vec![], vec![ConfigUpdate::SetMode(Mode::Orbit)]));
        assert_eq!(state.particles().config(), &state.settings().particles);
    }

    #[test]
    fn particles_emit_only_after_the_transition() {
        let mut state = SimulationState::new(settings());
        let open = || vec![hand(Handedness::Right, PoseKind::Five, 0.5, 0.5)];
        // already in Particles: emission starts on the second frame
        for i in 0..5 {
            let (s, _) = step(state, frame(i as f64 * 20.0, open(), vec![]));
            state = s;
        }
        assert!(!state.particles().is_empty());

        let (state, _) = step(state, frame(100.0, open(), vec![ConfigUpdate::SetMode(Mode::Nebula), ConfigUpdate::ClearParticles]));
        let (state, _) = step(state, frame(120.0, open(), vec![]));
        assert!(state.particles().is_empty());
    }

    #[test]
    fn theremin_maps_palms() {
        let mut state = SimulationState::new(settings());
        let (s, _) = step(state, frame(0.0, vec![], vec![ConfigUpdate::SetMode(Mode::Theremin)]));
        state = s;
        // mirrored: normalized x 0.25 lands at canvas x 750 of 1000
        let hands = || vec![
            hand(Handedness::Right, PoseKind::None, 0.25, 0.5),
            hand(Handedness::Left, PoseKind::None, 0.75, 0.75),
        ];
        let (state, _) = step(state, frame(2000.0, hands(), vec![]));
        let p = state.params();
        let palm_x = p.theremin_pitch;
        assert!(palm_x > 0.7 && palm_x < 0.8, "pitch {}", palm_x);
        assert!(p.theremin_volume > 0.0 && p.theremin_volume < 0.5, "volume {}", p.theremin_volume);

        // left hand gone: silent
        let (state, _) = step(state, frame(2016.0, vec![hand(Handedness::Right, PoseKind::None, 0.25, 0.5)], vec![]));
        assert_eq!(state.params().theremin_volume, 0.0);
    }

    #[test]
    fn calibration_waits_for_a_hand() {
        let state = SimulationState::new(settings());
        let (state, fx) = step(state, frame(0.0, vec![], vec![ConfigUpdate::Calibrate]));
        assert!(!fx.events.iter().any(|e| matches!(e, SimEvent::Calibrated { .. })));
        let (state, fx) = step(state, frame(16.0, vec![hand(Handedness::Right, PoseKind::Five, 0.5, 0.5)], vec![]));
        assert!(fx.events.iter().any(|e| matches!(e, SimEvent::Calibrated { .. })));
        assert!(state.pads().is_calibrated());
    }

    #[test]
    fn hud_names_the_mode() {
        let state = SimulationState::new(settings());
        let (_, fx) = step(state, frame(0.0, vec![], vec![]));
        assert!(fx.draws.iter().any(|d| matches!(d, DrawCmd::Text { text, .. } if text == "particles 0")));
    }
}
