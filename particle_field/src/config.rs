use serde::{Deserialize, Serialize};

use crate::color::ColorMode;
use crate::grid::ForceParams;

/// Particle tuning. Ranges are enforced by the settings layer of the app.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Particles per second per emitting fingertip (0–2000).
    pub emission_rate:       f32,
    /// Hard population cap (0–20000).
    pub max_particles:       usize,
    /// Lifetime in ms (100–10000).
    pub lifetime_ms:         f64,
    /// Downward acceleration, canvas units/s² (−2000–2000).
    pub gravity:             f32,
    /// Velocity multiplier per 1/60 s (0.8–1.0).
    pub drag:                f32,
    pub turbulence:          bool,
    /// Curl-noise acceleration, canvas units/s² (0–2000).
    pub turbulence_strength: f32,
    /// Canvas units → noise domain (0.0005–0.05).
    pub noise_scale:         f32,
    /// Noise time advance per ms (0–0.01).
    pub noise_speed:         f32,
    /// Pair attraction strength (0–2000).
    pub attraction:          f32,
    /// Pair repulsion strength (0–2000).
    pub repulsion:           f32,
    /// Pair force cutoff and grid cell size (5–200).
    pub force_radius:        f32,
    /// Fraction of speed kept on an edge bounce (0–1).
    pub bounce:              f32,
    /// Fraction of fingertip velocity handed to new particles (0–2).
    pub inherit_velocity:    f32,
    /// Max magnitude of the isotropic random launch velocity, units/s (0–1000).
    pub spread_speed:        f32,
    /// Base radius (0.5–20).
    pub size:                f32,
    /// Points kept per particle trail; 0 disables trails (0–32).
    pub trail_length:        usize,
    pub color_mode:          ColorMode,
    /// Speed mapped to the hot end of the velocity palette (10–5000).
    pub color_speed_range:   f32,
    /// Longer than this between frames counts as a gap (ms).
    pub gap_ms:              f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig {
            emission_rate:       120.0,
            max_particles:       3000,
            lifetime_ms:         2200.0,
            gravity:             220.0,
            drag:                0.985,
            turbulence:          false,
            turbulence_strength: 140.0,
            noise_scale:         0.004,
            noise_speed:         0.0004,
            attraction:          0.0,
            repulsion:           0.0,
            force_radius:        40.0,
            bounce:              0.6,
            inherit_velocity:    0.6,
            spread_speed:        60.0,
            size:                3.0,
            trail_length:        0,
            color_mode:          ColorMode::Velocity,
            color_speed_range:   600.0,
            gap_ms:              250.0,
        }
    }
}

impl ParticleConfig {
    pub fn forces(&self) -> ForceParams {
        ForceParams {
            attraction: self.attraction,
            repulsion:  self.repulsion,
            radius:     self.force_radius,
        }
    }

    pub fn forces_enabled(&self) -> bool {
        self.attraction != 0.0 || self.repulsion != 0.0
    }
}
