//! Audio output.
//!
//! The simulation only speaks in [`AudioCmd`]s; an [`AudioEngine`] turns
//! them into sound. The real engine drives a MIDI synthesiser through
//! `midir`, so any General MIDI softsynth (FluidSynth, TiMidity, the OS
//! wavetable) becomes the instrument.
//!
//! None of the calls block. Commands act at the time of the last
//! [`AudioEngine::tick`].

use std::path::PathBuf;

use synth_midi::{
    bend_range_rpn, bipolar_to_bend, control_target, drum_note, unit_to_cc, ControlTarget,
    MidiError, MidiMessage, Scale, SessionRecording, PERCUSSION_CHANNEL,
};

use crate::config::AudioSettings;
use crate::error::Result;
use crate::sim::AudioCmd;

/// Below this volume the continuous voice is released.
const VOICE_GATE: f32 = 0.02;

pub trait AudioEngine {
    fn trigger(&mut self, sound_id: &str);
    /// Move `name` to `value` over `ramp_ms`.
    fn set_parameter(&mut self, name: &str, value: f32, ramp_ms: u32);
    /// Advance the engine clock: due note-offs and ramp steps go out here.
    fn tick(&mut self, now_ms: f64);
    /// Settings changed at runtime.
    fn configure(&mut self, _settings: &AudioSettings) {}
    /// Silence everything and flush any output.
    fn finish(&mut self) -> Result<()> { Ok(()) }
}

/// Hand one frame's commands to `engine`.
pub fn dispatch(engine: &mut dyn AudioEngine, cmds: &[AudioCmd]) {
    for cmd in cmds {
        match cmd {
            AudioCmd::Trigger { sound_id } => engine.trigger(sound_id),
            AudioCmd::SetParam { name, value, ramp_ms } => engine.set_parameter(name, *value, *ramp_ms),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSink: abstraction over midir / recording / null
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiSink {
    fn send(&mut self, now_ms: f64, msg: MidiMessage);
}

impl MidiSink for SessionRecording {
    fn send(&mut self, now_ms: f64, msg: MidiMessage) {
        self.push(now_ms, msg);
    }
}

impl MidiSink for Vec<(f64, MidiMessage)> {
    fn send(&mut self, now_ms: f64, msg: MidiMessage) {
        self.push((now_ms, msg));
    }
}

// ── midir backend ──────────────────────────────────────────────────────────

pub struct MidirOut {
    conn: midir::MidiOutputConnection,
    buf:  Vec<u8>,
}

impl MidiSink for MidirOut {
    fn send(&mut self, _now_ms: f64, msg: MidiMessage) {
        self.buf.clear();
        msg.encode(&mut self.buf);
        if let Err(e) = self.conn.send(&self.buf) {
            log::debug!("{}", MidiError::Send(e.to_string()));
        }
    }
}

// ── null backend (used when no MIDI port is available) ─────────────────────

pub struct NullOut;

impl MidiSink for NullOut {
    fn send(&mut self, _now_ms: f64, _msg: MidiMessage) {}
}

/// Open an output port: the first whose name contains `hint`, otherwise a
/// known softsynth, otherwise the first port.
pub fn open_midi_output(hint: Option<&str>) -> std::result::Result<MidirOut, MidiError> {
    let midi_out = midir::MidiOutput::new("leap_synth")
        .map_err(|e| MidiError::PortUnavailable(e.to_string()))?;

    let ports = midi_out.ports();
    if ports.is_empty() {
        return Err(MidiError::PortUnavailable(
            "no MIDI output ports (start a synthesiser such as `fluidsynth` or `timidity -iA`)".into(),
        ));
    }

    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_default().to_lowercase())
        .collect();
    let by_hint = hint.map(str::to_lowercase)
        .and_then(|h| names.iter().position(|n| n.contains(&h)));
    let softsynth = names.iter().position(|n| {
        n.contains("fluid") || n.contains("timidity") || n.contains("microsoft")
            || n.contains("gm") || n.contains("synth")
    });
    if hint.is_some() && by_hint.is_none() {
        log::warn!("no MIDI port matches {:?}, picking another", hint.unwrap_or_default());
    }
    let idx = by_hint.or(softsynth).unwrap_or(0);

    let port = &ports[idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".to_string());
    log::info!("opening MIDI port: {}", name);

    let conn = midi_out.connect(port, "leap-synth")
        .map_err(|e| MidiError::PortUnavailable(e.to_string()))?;
    Ok(MidirOut { conn, buf: Vec::with_capacity(3) })
}

// ════════════════════════════════════════════════════════════════════════════
// MidiEngine
// ════════════════════════════════════════════════════════════════════════════

/// A parameter moving toward its target.
#[derive(Clone, Debug)]
struct Ramp {
    name:      String,
    target:    ControlTarget,
    from:      f32,
    to:        f32,
    start_ms:  f64,
    length_ms: f64,
    current:   f32,
    /// Last wire value sent, to suppress duplicates.
    sent:      Option<u16>,
}

impl Ramp {
    fn value_at(&self, now_ms: f64) -> f32 {
        if self.length_ms <= 0.0 {
            return self.to;
        }
        let p = ((now_ms - self.start_ms) / self.length_ms).clamp(0.0, 1.0) as f32;
        self.from + (self.to - self.from) * p
    }
}

/// Drums on the GM percussion channel, one continuous voice on
/// `voice_channel` steered by controllers and pitch bend.
pub struct MidiEngine<S: MidiSink> {
    sink:     S,
    settings: AudioSettings,
    scale:    Scale,
    now_ms:   f64,
    /// `(due, note)` on the percussion channel.
    offs:     Vec<(f64, u8)>,
    ramps:    Vec<Ramp>,
    voice:    Option<u8>,
}

impl<S: MidiSink> MidiEngine<S> {
    pub fn new(sink: S, settings: &AudioSettings, now_ms: f64) -> Self {
        let mut engine = MidiEngine {
            sink,
            settings: settings.clone(),
            scale:    Scale::from(settings.scale),
            now_ms,
            offs:     Vec::new(),
            ramps:    Vec::new(),
            voice:    None,
        };
        engine.send_setup();
        engine
    }

    pub fn sink(&self) -> &S { &self.sink }
    pub fn into_sink(self) -> S { self.sink }

    fn send(&mut self, msg: MidiMessage) {
        self.sink.send(self.now_ms, msg);
    }

    fn send_setup(&mut self) {
        let channel = self.settings.voice_channel;
        self.send(MidiMessage::ProgramChange { channel, program: self.settings.program.program() });
        for (controller, value) in bend_range_rpn(self.settings.bend_range) {
            self.send(MidiMessage::ControlChange { channel, controller, value });
        }
        log::debug!("voice program {} on channel {}", self.settings.program.name(), channel);
    }

    /// Wire value for `value` on `target`, before deduplication.
    fn wire_value(&self, target: ControlTarget, value: f32) -> u16 {
        match target {
            ControlTarget::Cc(_) => unit_to_cc(value) as u16,
            ControlTarget::PitchBend => {
                let range = self.settings.bend_range.max(1) as f32;
                let mut semis = (2.0 * value.clamp(0.0, 1.0) - 1.0) * range;
                if self.settings.quantize {
                    semis = self.scale.snap(semis).clamp(-range, range);
                }
                bipolar_to_bend(semis / range)
            }
        }
    }

    fn emit(&mut self, target: ControlTarget, wire: u16) {
        let channel = self.settings.voice_channel;
        match target {
            ControlTarget::Cc(controller) => {
                self.send(MidiMessage::ControlChange { channel, controller, value: wire.min(127) as u8 })
            }
            ControlTarget::PitchBend => self.send(MidiMessage::PitchBend { channel, value: wire }),
        }
    }

    /// Start or stop the continuous voice as volume crosses the gate.
    fn gate_voice(&mut self, volume: f32) {
        let channel = self.settings.voice_channel;
        match self.voice {
            None if volume > VOICE_GATE => {
                let note = self.settings.root.min(127);
                self.send(MidiMessage::NoteOn { channel, note, velocity: 100 });
                self.voice = Some(note);
            }
            Some(note) if volume <= VOICE_GATE => {
                self.send(MidiMessage::NoteOff { channel, note });
                self.voice = None;
            }
            _ => {}
        }
    }

    fn step_ramps(&mut self) {
        let now = self.now_ms;
        for i in 0..self.ramps.len() {
            let value = self.ramps[i].value_at(now);
            self.ramps[i].current = value;
            let target = self.ramps[i].target;
            let wire = self.wire_value(target, value);
            if self.ramps[i].sent != Some(wire) {
                self.ramps[i].sent = Some(wire);
                self.emit(target, wire);
            }
            if self.ramps[i].name == "theremin_volume" {
                self.gate_voice(value);
            }
        }
    }

    fn silence(&mut self) {
        let offs = std::mem::take(&mut self.offs);
        for (_, note) in offs {
            self.send(MidiMessage::NoteOff { channel: PERCUSSION_CHANNEL, note });
        }
        if let Some(note) = self.voice.take() {
            self.send(MidiMessage::NoteOff { channel: self.settings.voice_channel, note });
        }
    }
}

impl<S: MidiSink> AudioEngine for MidiEngine<S> {
    fn trigger(&mut self, sound_id: &str) {
        match drum_note(sound_id) {
            Ok(note) => {
                let velocity = self.settings.drum_velocity.clamp(1, 127);
                self.send(MidiMessage::NoteOn { channel: PERCUSSION_CHANNEL, note, velocity });
                self.offs.push((self.now_ms + self.settings.note_ms, note));
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    fn set_parameter(&mut self, name: &str, value: f32, ramp_ms: u32) {
        let target = match control_target(name) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{}", e);
                return;
            }
        };
        let now = self.now_ms;
        let value = value.clamp(0.0, 1.0);
        match self.ramps.iter_mut().find(|r| r.name == name) {
            Some(r) => {
                r.from = r.current;
                r.to = value;
                r.start_ms = now;
                r.length_ms = ramp_ms as f64;
            }
            // nothing to ramp from yet
            None => self.ramps.push(Ramp {
                name:      name.to_string(),
                target,
                from:      value,
                to:        value,
                start_ms:  now,
                length_ms: 0.0,
                current:   value,
                sent:      None,
            }),
        }
        self.step_ramps();
    }

    fn tick(&mut self, now_ms: f64) {
        self.now_ms = now_ms.max(self.now_ms);
        let now = self.now_ms;
        let (due, pending): (Vec<_>, Vec<_>) = self.offs.drain(..).partition(|(t, _)| *t <= now);
        self.offs = pending;
        for (_, note) in due {
            self.send(MidiMessage::NoteOff { channel: PERCUSSION_CHANNEL, note });
        }
        self.step_ramps();
    }

    fn configure(&mut self, settings: &AudioSettings) {
        let resend = settings.program != self.settings.program
            || settings.bend_range != self.settings.bend_range
            || settings.voice_channel != self.settings.voice_channel;
        if settings.voice_channel != self.settings.voice_channel {
            self.silence();
        }
        self.scale = Scale::from(settings.scale);
        self.settings = settings.clone();
        if resend {
            self.send_setup();
        }
        // quantization or range may have moved the pitch
        for r in &mut self.ramps {
            r.sent = None;
        }
        self.step_ramps();
    }

    fn finish(&mut self) -> Result<()> {
        self.silence();
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NullEngine / RecordingEngine
// ════════════════════════════════════════════════════════════════════════════

/// Swallows everything; used when no MIDI port exists or audio is disabled.
pub struct NullEngine;

impl AudioEngine for NullEngine {
    fn trigger(&mut self, _sound_id: &str) {}
    fn set_parameter(&mut self, _name: &str, _value: f32, _ramp_ms: u32) {}
    fn tick(&mut self, _now_ms: f64) {}
}

/// Plays through `inner` and keeps a MIDI file of the session, written on
/// [`AudioEngine::finish`].
pub struct RecordingEngine {
    inner:  Box<dyn AudioEngine>,
    shadow: MidiEngine<SessionRecording>,
    path:   PathBuf,
}

impl RecordingEngine {
    pub fn new(inner: Box<dyn AudioEngine>, settings: &AudioSettings, path: PathBuf, now_ms: f64) -> Self {
        let name = path.file_stem().map_or_else(|| "session".to_string(), |s| s.to_string_lossy().into_owned());
        let shadow = MidiEngine::new(SessionRecording::new(&name), settings, now_ms);
        RecordingEngine { inner, shadow, path }
    }

    pub fn recording(&self) -> &SessionRecording { self.shadow.sink() }
}

impl AudioEngine for RecordingEngine {
    fn trigger(&mut self, sound_id: &str) {
        self.inner.trigger(sound_id);
        self.shadow.trigger(sound_id);
    }

    fn set_parameter(&mut self, name: &str, value: f32, ramp_ms: u32) {
        self.inner.set_parameter(name, value, ramp_ms);
        self.shadow.set_parameter(name, value, ramp_ms);
    }

    fn tick(&mut self, now_ms: f64) {
        self.inner.tick(now_ms);
        self.shadow.tick(now_ms);
    }

    fn configure(&mut self, settings: &AudioSettings) {
        self.inner.configure(settings);
        self.shadow.configure(settings);
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()?;
        self.shadow.finish()?;
        self.shadow.sink().write_file(&self.path)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
