//! Particle color modes and the shared HSV palette helper.

use serde::{Deserialize, Serialize};

/// How a particle's hue is chosen. Closed set, dispatched by `match`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Slow = blue, fast = red.
    Velocity,
    /// Hue drifts as the particle ages.
    Lifetime,
    /// Hue follows an external parameter in `[0, 1]`.
    External,
    /// Time-driven rainbow.
    Rainbow,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [ColorMode::Velocity, ColorMode::Lifetime, ColorMode::External, ColorMode::Rainbow];

    pub fn next(self) -> Self {
        match self {
            ColorMode::Velocity => ColorMode::Lifetime,
            ColorMode::Lifetime => ColorMode::External,
            ColorMode::External => ColorMode::Rainbow,
            ColorMode::Rainbow  => ColorMode::Velocity,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Velocity => "velocity",
            ColorMode::Lifetime => "lifetime",
            ColorMode::External => "external",
            ColorMode::Rainbow  => "rainbow",
        }
    }

    /// Hue in degrees for one particle.
    ///
    /// * `speed_frac`: speed / configured speed range, clamped to `[0, 1]`
    /// * `life_frac` : age / lifetime
    /// * `external`  : caller-supplied parameter in `[0, 1]`
    pub fn hue(self, speed_frac: f32, life_frac: f32, external: f32, seed: f32, now_ms: f64) -> f32 {
        let h = match self {
            ColorMode::Velocity => 240.0 - speed_frac.clamp(0.0, 1.0) * 240.0,
            ColorMode::Lifetime => 180.0 + life_frac * 140.0 + seed * 30.0,
            ColorMode::External => external.clamp(0.0, 1.0) * 360.0 + (seed - 0.5) * 24.0,
            ColorMode::Rainbow  => (now_ms * 0.06) as f32 + seed * 360.0,
        };
        h.rem_euclid(360.0)
    }
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorMode::ALL.into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown color mode '{}'", s))
    }
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u32;
    0xFF000000 | (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_argb(0.0, 1.0, 1.0),   0xFFFF0000);
        assert_eq!(hsv_to_argb(120.0, 1.0, 1.0), 0xFF00FF00);
        assert_eq!(hsv_to_argb(240.0, 1.0, 1.0), 0xFF0000FF);
        assert_eq!(hsv_to_argb(360.0, 1.0, 1.0), 0xFFFF0000);
    }

    #[test]
    fn velocity_hue_runs_blue_to_red() {
        assert_eq!(ColorMode::Velocity.hue(0.0, 0.0, 0.0, 0.0, 0.0), 240.0);
        assert_eq!(ColorMode::Velocity.hue(1.0, 0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(ColorMode::Velocity.hue(7.0, 0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn hue_is_wrapped() {
        for mode in ColorMode::ALL {
            let h = mode.hue(0.5, 0.9, 0.99, 0.99, 123_456.0);
            assert!((0.0..360.0).contains(&h), "{:?} gave {}", mode, h);
        }
    }

    #[test]
    fn cycle_and_parse() {
        let mut m = ColorMode::Velocity;
        for _ in 0..4 { m = m.next(); }
        assert_eq!(m, ColorMode::Velocity);
        assert_eq!("Rainbow".parse::<ColorMode>(), Ok(ColorMode::Rainbow));
        assert!("plaid".parse::<ColorMode>().is_err());
    }
}
