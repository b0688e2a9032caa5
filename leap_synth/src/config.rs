//! Settings file, runtime parameters and the control channel.
//!
//! The settings file is TOML with one table per subsystem:
//!
//! ```toml
//! [surface]
//! width = 1280
//! height = 720
//!
//! [gesture]
//! dwell_ms = 400.0
//!
//! [particles]
//! emission_rate = 240.0
//! color_mode = "rainbow"
//! ```
//!
//! Missing tables and keys fall back to their defaults. At runtime every
//! numeric or boolean option is addressed through [`Param`]; values are
//! clamped to the parameter's range.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use hand_pose::HandConfig;
use pad_instrument::{PadConfig, TapAlgorithm};
use particle_field::{ColorMode, ParticleConfig};
use serde::{Deserialize, Serialize};
use synth_midi::{GeneralMidi, ScaleKind};

use crate::error::{AppError, Result};
use crate::mode::Mode;

// ════════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    pub width:  u32,
    pub height: u32,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        SurfaceSettings { width: 1280, height: 720 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// How long a pose must be held before its mode activates.
    pub dwell_ms:      f64,
    /// Length of the mode-switch animation.
    pub transition_ms: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        GestureSettings { dwell_ms: 400.0, transition_ms: 900.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Open a MIDI port at all.
    pub enabled:       bool,
    /// Substring of the preferred output port name.
    pub port_hint:     Option<String>,
    pub drum_velocity: u8,
    /// Channel of the continuous (theremin) voice.
    pub voice_channel: u8,
    pub program:       GeneralMidi,
    /// Pitch-bend range in semitones either side of centre.
    pub bend_range:    u8,
    /// Snap theremin pitch to `scale`.
    pub quantize:      bool,
    pub scale:         ScaleKind,
    /// MIDI note the theremin voice sounds at zero bend.
    pub root:          u8,
    /// Ramp applied to every continuous parameter change.
    pub ramp_ms:       u32,
    /// Drum note length before its note-off.
    pub note_ms:       f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            enabled:       true,
            port_hint:     None,
            drum_velocity: 100,
            voice_channel: 0,
            program:       GeneralMidi::Pad2Warm,
            bend_range:    12,
            quantize:      false,
            scale:         ScaleKind::PentatonicMinor,
            root:          60,
            ramp_ms:       60,
            note_ms:       120.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Fraction of the previous frame darkened away each frame.
    pub fade:            f32,
    pub ribbon_width:    f32,
    pub glow_radius:     f32,
    pub show_fingertips: bool,
    /// Seed of the particle RNG.
    pub seed:            u64,
}

impl Default for VisualSettings {
    fn default() -> Self {
        VisualSettings {
            fade:            0.18,
            ribbon_width:    6.0,
            glow_radius:     18.0,
            show_fingertips: true,
            seed:            7,
        }
    }
}

/// Everything tunable, one table per subsystem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub surface:   SurfaceSettings,
    pub hands:     HandConfig,
    pub gesture:   GestureSettings,
    pub pads:      PadConfig,
    pub particles: ParticleConfig,
    pub audio:     AudioSettings,
    pub visual:    VisualSettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and clamp every parameter into range.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let settings: Settings = toml::from_str(text)?;
        Ok(settings.clamped())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn clamped(mut self) -> Self {
        for p in Param::ALL {
            let v = p.get(&self);
            let applied = p.apply(&mut self, v);
            if applied != v {
                log::warn!("{} = {} out of range, using {}", p.name(), v, applied);
            }
        }
        self.surface.width = self.surface.width.clamp(160, 7680);
        self.surface.height = self.surface.height.clamp(120, 4320);
        self.audio.voice_channel = self.audio.voice_channel.min(15);
        self.audio.root = self.audio.root.min(127);
        self
    }

    pub fn surface_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.surface.width as f32, self.surface.height as f32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Param
// ════════════════════════════════════════════════════════════════════════════

/// Every runtime-adjustable numeric or boolean option. Booleans read
/// `v >= 0.5` as true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    // ── hands ──
    Mirror,
    TrailLength,
    TrailTimeoutMs,
    PalmTouchDistance,
    FingerTouchDistance,
    // ── gesture ──
    DwellMs,
    TransitionMs,
    // ── pads ──
    PadsPerFinger,
    PadBaseSize,
    PadSpacing,
    ReferenceSpread,
    ZVelocityThreshold,
    PadDwellMs,
    RetreatVelocity,
    WiggleThreshold,
    CooldownMs,
    // ── particles ──
    EmissionRate,
    MaxParticles,
    LifetimeMs,
    Gravity,
    Drag,
    Turbulence,
    TurbulenceStrength,
    NoiseScale,
    NoiseSpeed,
    Attraction,
    Repulsion,
    ForceRadius,
    Bounce,
    InheritVelocity,
    SpreadSpeed,
    ParticleSize,
    ParticleTrailLength,
    ColorSpeedRange,
    // ── audio ──
    DrumVelocity,
    RampMs,
    Quantize,
    BendRange,
    // ── visual ──
    Fade,
    RibbonWidth,
    GlowRadius,
    ShowFingertips,
}

impl Param {
    pub const ALL: [Param; 42] = [
        Param::Mirror, Param::TrailLength, Param::TrailTimeoutMs,
        Param::PalmTouchDistance, Param::FingerTouchDistance,
        Param::DwellMs, Param::TransitionMs,
        Param::PadsPerFinger, Param::PadBaseSize, Param::PadSpacing,
        Param::ReferenceSpread, Param::ZVelocityThreshold, Param::PadDwellMs,
        Param::RetreatVelocity, Param::WiggleThreshold, Param::CooldownMs,
        Param::EmissionRate, Param::MaxParticles, Param::LifetimeMs,
        Param::Gravity, Param::Drag, Param::Turbulence, Param::TurbulenceStrength,
        Param::NoiseScale, Param::NoiseSpeed, Param::Attraction, Param::Repulsion,
        Param::ForceRadius, Param::Bounce, Param::InheritVelocity,
        Param::SpreadSpeed, Param::ParticleSize, Param::ParticleTrailLength,
        Param::ColorSpeedRange,
        Param::DrumVelocity, Param::RampMs, Param::Quantize, Param::BendRange,
        Param::Fade, Param::RibbonWidth, Param::GlowRadius, Param::ShowFingertips,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Mirror              => "mirror",
            Param::TrailLength         => "trail_length",
            Param::TrailTimeoutMs      => "trail_timeout_ms",
            Param::PalmTouchDistance   => "palm_touch_distance",
            Param::FingerTouchDistance => "finger_touch_distance",
            Param::DwellMs             => "dwell_ms",
            Param::TransitionMs        => "transition_ms",
            Param::PadsPerFinger       => "pads_per_finger",
            Param::PadBaseSize         => "pad_base_size",
            Param::PadSpacing          => "pad_spacing",
            Param::ReferenceSpread     => "reference_spread",
            Param::ZVelocityThreshold  => "z_velocity_threshold",
            Param::PadDwellMs          => "pad_dwell_ms",
            Param::RetreatVelocity     => "retreat_velocity",
            Param::WiggleThreshold     => "wiggle_threshold",
            Param::CooldownMs          => "cooldown_ms",
            Param::EmissionRate        => "emission_rate",
            Param::MaxParticles        => "max_particles",
            Param::LifetimeMs          => "lifetime_ms",
            Param::Gravity             => "gravity",
            Param::Drag                => "drag",
            Param::Turbulence          => "turbulence",
            Param::TurbulenceStrength  => "turbulence_strength",
            Param::NoiseScale          => "noise_scale",
            Param::NoiseSpeed          => "noise_speed",
            Param::Attraction          => "attraction",
            Param::Repulsion           => "repulsion",
            Param::ForceRadius         => "force_radius",
            Param::Bounce              => "bounce",
            Param::InheritVelocity     => "inherit_velocity",
            Param::SpreadSpeed         => "spread_speed",
            Param::ParticleSize        => "particle_size",
            Param::ParticleTrailLength => "particle_trail_length",
            Param::ColorSpeedRange     => "color_speed_range",
            Param::DrumVelocity        => "drum_velocity",
            Param::RampMs              => "ramp_ms",
            Param::Quantize            => "quantize",
            Param::BendRange           => "bend_range",
            Param::Fade                => "fade",
            Param::RibbonWidth         => "ribbon_width",
            Param::GlowRadius          => "glow_radius",
            Param::ShowFingertips      => "show_fingertips",
        }
    }

    /// Inclusive `(min, max)`. Bounds are `f32` values so `f32` fields clamp
    /// to exactly representable limits.
    pub fn range(self) -> (f64, f64) {
        let (lo, hi): (f32, f32) = match self {
            Param::Mirror | Param::Turbulence | Param::Quantize | Param::ShowFingertips => (0.0, 1.0),
            Param::TrailLength         => (2.0, 128.0),
            Param::TrailTimeoutMs      => (100.0, 10_000.0),
            Param::PalmTouchDistance   => (10.0, 400.0),
            Param::FingerTouchDistance => (5.0, 200.0),
            Param::DwellMs             => (50.0, 3000.0),
            Param::TransitionMs        => (100.0, 5000.0),
            Param::PadsPerFinger       => (1.0, 6.0),
            Param::PadBaseSize         => (16.0, 160.0),
            Param::PadSpacing          => (20.0, 200.0),
            Param::ReferenceSpread     => (20.0, 300.0),
            Param::ZVelocityThreshold  => (0.05, 5.0),
            Param::PadDwellMs          => (20.0, 1000.0),
            Param::RetreatVelocity     => (0.05, 5.0),
            Param::WiggleThreshold     => (2.0, 80.0),
            Param::CooldownMs          => (0.0, 2000.0),
            Param::EmissionRate        => (0.0, 2000.0),
            Param::MaxParticles        => (0.0, 20_000.0),
            Param::LifetimeMs          => (100.0, 10_000.0),
            Param::Gravity             => (-2000.0, 2000.0),
            Param::Drag                => (0.8, 1.0),
            Param::TurbulenceStrength  => (0.0, 2000.0),
            Param::NoiseScale          => (0.0005, 0.05),
            Param::NoiseSpeed          => (0.0, 0.01),
            Param::Attraction          => (0.0, 2000.0),
            Param::Repulsion           => (0.0, 2000.0),
            Param::ForceRadius         => (5.0, 200.0),
            Param::Bounce              => (0.0, 1.0),
            Param::InheritVelocity     => (0.0, 2.0),
            Param::SpreadSpeed         => (0.0, 1000.0),
            Param::ParticleSize        => (0.5, 20.0),
            Param::ParticleTrailLength => (0.0, 32.0),
            Param::ColorSpeedRange     => (10.0, 5000.0),
            Param::DrumVelocity        => (1.0, 127.0),
            Param::RampMs              => (0.0, 2000.0),
            Param::BendRange           => (1.0, 24.0),
            Param::Fade                => (0.0, 1.0),
            Param::RibbonWidth         => (1.0, 40.0),
            Param::GlowRadius          => (0.0, 80.0),
        };
        (lo as f64, hi as f64)
    }

    fn is_flag(self) -> bool {
        matches!(self, Param::Mirror | Param::Turbulence | Param::Quantize | Param::ShowFingertips)
    }

    /// Parameters stored as `f64` milliseconds.
    fn is_millis(self) -> bool {
        matches!(
            self,
            Param::TrailTimeoutMs | Param::DwellMs | Param::TransitionMs
                | Param::PadDwellMs | Param::CooldownMs | Param::LifetimeMs
        )
    }

    fn is_integer(self) -> bool {
        matches!(
            self,
            Param::TrailLength | Param::PadsPerFinger | Param::MaxParticles
                | Param::ParticleTrailLength | Param::DrumVelocity | Param::RampMs
                | Param::BendRange
        )
    }

    /// Clamp, write into `settings` and return the value actually stored.
    pub fn apply(self, settings: &mut Settings, value: f64) -> f64 {
        let (lo, hi) = self.range();
        let mut v = if value.is_finite() { value.clamp(lo, hi) } else { lo };
        if self.is_flag() {
            v = if v >= 0.5 { 1.0 } else { 0.0 };
        } else if self.is_integer() {
            v = v.round();
        }
        let on = v >= 0.5;

        let s = settings;
        match self {
            Param::Mirror              => s.hands.mirror = on,
            Param::TrailLength         => s.hands.trail_length = v as usize,
            Param::TrailTimeoutMs      => s.hands.trail_timeout_ms = v,
            Param::PalmTouchDistance   => s.hands.palm_touch_distance = v as f32,
            Param::FingerTouchDistance => s.hands.finger_touch_distance = v as f32,
            Param::DwellMs             => s.gesture.dwell_ms = v,
            Param::TransitionMs        => s.gesture.transition_ms = v,
            Param::PadsPerFinger       => s.pads.pads_per_finger = v as usize,
            Param::PadBaseSize         => s.pads.base_size = v as f32,
            Param::PadSpacing          => s.pads.spacing = v as f32,
            Param::ReferenceSpread     => s.pads.reference_spread = v as f32,
            Param::ZVelocityThreshold  => s.pads.z_velocity_threshold = v as f32,
            Param::PadDwellMs          => s.pads.dwell_ms = v,
            Param::RetreatVelocity     => s.pads.retreat_velocity = v as f32,
            Param::WiggleThreshold     => s.pads.wiggle_threshold = v as f32,
            Param::CooldownMs          => s.pads.cooldown_ms = v,
            Param::EmissionRate        => s.particles.emission_rate = v as f32,
            Param::MaxParticles        => s.particles.max_particles = v as usize,
            Param::LifetimeMs          => s.particles.lifetime_ms = v,
            Param::Gravity             => s.particles.gravity = v as f32,
            Param::Drag                => s.particles.drag = v as f32,
            Param::Turbulence          => s.particles.turbulence = on,
            Param::TurbulenceStrength  => s.particles.turbulence_strength = v as f32,
            Param::NoiseScale          => s.particles.noise_scale = v as f32,
            Param::NoiseSpeed          => s.particles.noise_speed = v as f32,
            Param::Attraction          => s.particles.attraction = v as f32,
            Param::Repulsion           => s.particles.repulsion = v as f32,
            Param::ForceRadius         => s.particles.force_radius = v as f32,
            Param::Bounce              => s.particles.bounce = v as f32,
            Param::InheritVelocity     => s.particles.inherit_velocity = v as f32,
            Param::SpreadSpeed         => s.particles.spread_speed = v as f32,
            Param::ParticleSize        => s.particles.size = v as f32,
            Param::ParticleTrailLength => s.particles.trail_length = v as usize,
            Param::ColorSpeedRange     => s.particles.color_speed_range = v as f32,
            Param::DrumVelocity        => s.audio.drum_velocity = v as u8,
            Param::RampMs              => s.audio.ramp_ms = v as u32,
            Param::Quantize            => s.audio.quantize = on,
            Param::BendRange           => s.audio.bend_range = v as u8,
            Param::Fade                => s.visual.fade = v as f32,
            Param::RibbonWidth         => s.visual.ribbon_width = v as f32,
            Param::GlowRadius          => s.visual.glow_radius = v as f32,
            Param::ShowFingertips      => s.visual.show_fingertips = on,
        }
        self.get(s)
    }

    pub fn get(self, s: &Settings) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Param::Mirror              => flag(s.hands.mirror),
            Param::TrailLength         => s.hands.trail_length as f64,
            Param::TrailTimeoutMs      => s.hands.trail_timeout_ms,
            Param::PalmTouchDistance   => s.hands.palm_touch_distance as f64,
            Param::FingerTouchDistance => s.hands.finger_touch_distance as f64,
            Param::DwellMs             => s.gesture.dwell_ms,
            Param::TransitionMs        => s.gesture.transition_ms,
            Param::PadsPerFinger       => s.pads.pads_per_finger as f64,
            Param::PadBaseSize         => s.pads.base_size as f64,
            Param::PadSpacing          => s.pads.spacing as f64,
            Param::ReferenceSpread     => s.pads.reference_spread as f64,
            Param::ZVelocityThreshold  => s.pads.z_velocity_threshold as f64,
            Param::PadDwellMs          => s.pads.dwell_ms,
            Param::RetreatVelocity     => s.pads.retreat_velocity as f64,
            Param::WiggleThreshold     => s.pads.wiggle_threshold as f64,
            Param::CooldownMs          => s.pads.cooldown_ms,
            Param::EmissionRate        => s.particles.emission_rate as f64,
            Param::MaxParticles        => s.particles.max_particles as f64,
            Param::LifetimeMs          => s.particles.lifetime_ms,
            Param::Gravity             => s.particles.gravity as f64,
            Param::Drag                => s.particles.drag as f64,
            Param::Turbulence          => flag(s.particles.turbulence),
            Param::TurbulenceStrength  => s.particles.turbulence_strength as f64,
            Param::NoiseScale          => s.particles.noise_scale as f64,
            Param::NoiseSpeed          => s.particles.noise_speed as f64,
            Param::Attraction          => s.particles.attraction as f64,
            Param::Repulsion           => s.particles.repulsion as f64,
            Param::ForceRadius         => s.particles.force_radius as f64,
            Param::Bounce              => s.particles.bounce as f64,
            Param::InheritVelocity     => s.particles.inherit_velocity as f64,
            Param::SpreadSpeed         => s.particles.spread_speed as f64,
            Param::ParticleSize        => s.particles.size as f64,
            Param::ParticleTrailLength => s.particles.trail_length as f64,
            Param::ColorSpeedRange     => s.particles.color_speed_range as f64,
            Param::DrumVelocity        => s.audio.drum_velocity as f64,
            Param::RampMs              => s.audio.ramp_ms as f64,
            Param::Quantize            => flag(s.audio.quantize),
            Param::BendRange           => s.audio.bend_range as f64,
            Param::Fade                => s.visual.fade as f64,
            Param::RibbonWidth         => s.visual.ribbon_width as f64,
            Param::GlowRadius          => s.visual.glow_radius as f64,
            Param::ShowFingertips      => flag(s.visual.show_fingertips),
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().replace('-', "_");
        Param::ALL.into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(&key))
            .ok_or_else(|| format!("unknown parameter '{}'", s))
    }
}

/// One line per parameter: name, current value, range.
pub fn describe_params(settings: &Settings) -> String {
    let mut out = String::new();
    for p in Param::ALL {
        let (lo, hi) = p.range();
        let v = p.get(settings);
        let shown = if p.is_millis() { v.to_string() } else { (v as f32).to_string() };
        out.push_str(&format!("{:<24} {:>10}   [{} … {}]\n", p.name(), shown, lo as f32, hi as f32));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// ConfigUpdate / commands
// ════════════════════════════════════════════════════════════════════════════

/// A change requested from outside the frame loop. Applied at the next
/// frame boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigUpdate {
    Set(Param, f64),
    SetTapAlgorithm(TapAlgorithm),
    SetColorMode(ColorMode),
    SetMode(Mode),
    /// Rebuild the pad layout from the next visible hand.
    Calibrate,
    ClearParticles,
}

/// Parse one console line.
///
/// ```text
/// set <param> <number|on|off>
/// tap <z_velocity|dwell_retreat|wiggle|hybrid>
/// color <velocity|lifetime|external|rainbow>
/// mode <name>
/// calibrate
/// clear
/// ```
pub fn parse_command(line: &str) -> Result<ConfigUpdate> {
    let fail = |reason: String| AppError::Command { input: line.trim().to_string(), reason };
    let words: Vec<&str> = line.split_whitespace().collect();

    match words.as_slice() {
        ["set", param, value] => {
            let p: Param = param.parse().map_err(fail)?;
            let v = match value.to_ascii_lowercase().as_str() {
                "on" | "true"   => 1.0,
                "off" | "false" => 0.0,
                other => other.parse::<f64>().map_err(|e| fail(format!("bad value '{}': {}", value, e)))?,
            };
            Ok(ConfigUpdate::Set(p, v))
        }
        ["tap", alg]    => alg.parse().map(ConfigUpdate::SetTapAlgorithm).map_err(fail),
        ["color", mode] => mode.parse().map(ConfigUpdate::SetColorMode).map_err(fail),
        ["mode", mode]  => mode.parse().map(ConfigUpdate::SetMode).map_err(fail),
        ["calibrate"]   => Ok(ConfigUpdate::Calibrate),
        ["clear"]       => Ok(ConfigUpdate::ClearParticles),
        []              => Err(fail("empty command".to_string())),
        _               => Err(fail("unrecognised command".to_string())),
    }
}

// ── bounded update channel ─────────────────────────────────────────────────

pub const UPDATE_QUEUE: usize = 64;

/// Producer side of the control channel. Never blocks.
#[derive(Clone)]
pub struct UpdateSender {
    tx: SyncSender<ConfigUpdate>,
}

impl UpdateSender {
    /// `false` when the update was dropped.
    pub fn send(&self, update: ConfigUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(u)) => {
                log::warn!("control queue full, dropping {:?}", u);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

pub fn update_channel(capacity: usize) -> (UpdateSender, Receiver<ConfigUpdate>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (UpdateSender { tx }, rx)
}

/// Everything queued so far, in order.
pub fn drain_updates(rx: &Receiver<ConfigUpdate>) -> Vec<ConfigUpdate> {
    rx.try_iter().collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
