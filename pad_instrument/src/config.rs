use serde::{Deserialize, Serialize};

/// Which tap detector every pad runs. Closed set, dispatched by `match`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapAlgorithm {
    /// Fingertip pushes toward the sensor faster than a threshold.
    ZVelocity,
    /// Rest inside the pad for a while, then pull back.
    DwellRetreat,
    /// Lateral shake inside the pad.
    Wiggle,
    /// `ZVelocity` or `Wiggle`.
    Hybrid,
}

impl TapAlgorithm {
    pub const ALL: [TapAlgorithm; 4] = [
        TapAlgorithm::ZVelocity,
        TapAlgorithm::DwellRetreat,
        TapAlgorithm::Wiggle,
        TapAlgorithm::Hybrid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TapAlgorithm::ZVelocity    => "z_velocity",
            TapAlgorithm::DwellRetreat => "dwell_retreat",
            TapAlgorithm::Wiggle       => "wiggle",
            TapAlgorithm::Hybrid       => "hybrid",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TapAlgorithm::ZVelocity    => TapAlgorithm::DwellRetreat,
            TapAlgorithm::DwellRetreat => TapAlgorithm::Wiggle,
            TapAlgorithm::Wiggle       => TapAlgorithm::Hybrid,
            TapAlgorithm::Hybrid       => TapAlgorithm::ZVelocity,
        }
    }
}

impl std::str::FromStr for TapAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().replace('-', "_");
        TapAlgorithm::ALL.into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(&key))
            .ok_or_else(|| format!("unknown tap algorithm '{}'", s))
    }
}

/// Layout and detection tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    pub tap_algorithm:        TapAlgorithm,
    /// Pads along each finger's ray (1–6).
    pub pads_per_finger:      usize,
    /// Pad diameter at scale 1, canvas units (10–200).
    pub base_size:            f32,
    /// Distance between pads on a ray at scale 1 (10–300).
    pub spacing:              f32,
    /// Mean adjacent fingertip distance that maps to scale 1 (10–300).
    pub reference_spread:     f32,
    /// Push speed toward the sensor that counts as a tap, depth units/s (0.01–5).
    pub z_velocity_threshold: f32,
    /// Time inside a pad before a retreat can trigger (0–2000 ms).
    pub dwell_ms:             f64,
    /// Pull-back speed that ends a dwell, depth units/s (0.01–5).
    pub retreat_velocity:     f32,
    /// Lateral step between samples that counts as a shake (1–100 units).
    pub wiggle_threshold:     f32,
    /// Refractory period after a trigger (0–2000 ms).
    pub cooldown_ms:          f64,
}

impl Default for PadConfig {
    fn default() -> Self {
        PadConfig {
            tap_algorithm:        TapAlgorithm::ZVelocity,
            pads_per_finger:      3,
            base_size:            56.0,
            spacing:              70.0,
            reference_spread:     80.0,
            z_velocity_threshold: 0.35,
            dwell_ms:             120.0,
            retreat_velocity:     0.25,
            wiggle_threshold:     14.0,
            cooldown_ms:          180.0,
        }
    }
}
