//! Pad geometry: personalized calibration and the static fallback fan.

use glam::Vec2;
use hand_pose::state::mean_adjacent_distance;
use hand_pose::Finger;

use crate::config::PadConfig;
use crate::detector::DetectorState;

/// Kit voice played by each finger's pads, thumb first.
pub const KIT_VOICES: [&str; 5] = ["kick", "snare", "hat", "tom", "crash"];

/// Fallback fan: finger ray angles in degrees (y grows downward, 270° is up).
const FALLBACK_ANGLES: [f32; 5] = [200.0, 235.0, 270.0, 305.0, 340.0];
/// Fallback distance from the fan center to the first pad at scale 1.
const FALLBACK_REACH: f32 = 90.0;

pub fn sound_id(finger: Finger, row: usize) -> String {
    format!("{}_{}", KIT_VOICES[finger.index()], row)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pad {
    pub center:           Vec2,
    /// Diameter.
    pub size:             f32,
    pub sound_id:         String,
    pub finger:           Finger,
    pub row:              usize,
    pub last_trigger_ms:  Option<f64>,
    pub detector:         DetectorState,
}

impl Pad {
    pub fn radius(&self) -> f32 { self.size * 0.5 }

    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius() * self.radius()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PadLayout {
    pub pads:       Vec<Pad>,
    pub scale:      f32,
    /// False for the fallback fan.
    pub calibrated: bool,
}

impl PadLayout {
    /// Static radial fan centered in the lower middle of the surface.
    pub fn fallback(surface: Vec2, config: &PadConfig) -> Self {
        let center = Vec2::new(surface.x * 0.5, surface.y * 0.72);
        let rays = FALLBACK_ANGLES.map(|deg| {
            let a = deg.to_radians();
            (Vec2::new(a.cos(), a.sin()), FALLBACK_REACH)
        });
        PadLayout {
            pads:       build_pads(center, &rays, 1.0, surface, config),
            scale:      1.0,
            calibrated: false,
        }
    }

    pub fn len(&self) -> usize { self.pads.len() }
    pub fn is_empty(&self) -> bool { self.pads.is_empty() }
}

/// Personalized layout from one hand's fingertips (thumb first) and palm.
///
/// Returns `None` with fewer than five tips, or when the tips collapse onto
/// one point so no scale can be derived.
pub fn calibrate(tips: &[Vec2], palm: Vec2, surface: Vec2, config: &PadConfig) -> Option<PadLayout> {
    if tips.len() < 5 || config.reference_spread <= 0.0 {
        return None;
    }
    let tips = &tips[..5];
    if !palm.is_finite() || tips.iter().any(|t| !t.is_finite()) {
        return None;
    }
    let spread = mean_adjacent_distance(tips);
    if spread < 1e-3 {
        return None;
    }
    let scale = spread / config.reference_spread;

    let mut rays = [(Vec2::ZERO, 0.0); 5];
    for (ray, tip) in rays.iter_mut().zip(tips) {
        let d = *tip - palm;
        let angle = d.y.atan2(d.x);
        *ray = (Vec2::new(angle.cos(), angle.sin()), d.length());
    }

    Some(PadLayout {
        pads: build_pads(palm, &rays, scale, surface, config),
        scale,
        calibrated: true,
    })
}

fn build_pads(origin: Vec2, rays: &[(Vec2, f32); 5], scale: f32, surface: Vec2, config: &PadConfig) -> Vec<Pad> {
    let size = config.base_size * scale;
    let half = Vec2::splat(size * 0.5);
    let lo = half.min(surface * 0.5);
    let hi = (surface - half).max(lo);

    let mut pads = Vec::with_capacity(5 * config.pads_per_finger);
    for finger in Finger::ALL {
        let (dir, reach) = rays[finger.index()];
        for row in 0..config.pads_per_finger {
            let center = origin + dir * (reach + config.spacing * scale * row as f32);
            pads.push(Pad {
                center:          center.max(lo).min(hi),
                size,
                sound_id:        sound_id(finger, row),
                finger,
                row,
                last_trigger_ms: None,
                detector:        DetectorState::new(config.tap_algorithm),
            });
        }
    }
    pads
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SURFACE: Vec2 = Vec2::new(1280.0, 720.0);

    /// Tips 80 units apart on a line above the palm.
    fn even_tips() -> [Vec2; 5] {
        [0.0, 80.0, 160.0, 240.0, 320.0].map(|x| Vec2::new(480.0 + x, 300.0))
    }

    #[test]
    fn reference_spread_gives_unit_scale() {
        let layout = calibrate(&even_tips(), Vec2::new(640.0, 450.0), SURFACE, &PadConfig::default()).unwrap();
        assert_eq!(layout.scale, 1.0);
        assert!(layout.calibrated);
        assert_eq!(layout.len(), 15);
        assert!(layout.pads.iter().all(|p| p.size == 56.0));
    }

    #[test]
    fn scale_follows_spread() {
        let tips = even_tips().map(|t| Vec2::new(640.0 + (t.x - 640.0) * 1.5, t.y));
        let layout = calibrate(&tips, Vec2::new(640.0, 450.0), SURFACE, &PadConfig::default()).unwrap();
        assert!((layout.scale - 1.5).abs() < 1e-5);
        assert!((layout.pads[0].size - 84.0).abs() < 1e-4);
    }

    #[test]
    fn pads_march_outward_along_each_ray() {
        let palm = Vec2::new(640.0, 450.0);
        let layout = calibrate(&even_tips(), palm, SURFACE, &PadConfig::default()).unwrap();
        let middle: Vec<&Pad> = layout.pads.iter().filter(|p| p.finger == Finger::Middle).collect();
        assert_eq!(middle.len(), 3);
        // middle tip is straight above the palm at distance 150
        assert!((middle[0].center - Vec2::new(640.0, 300.0)).length() < 1e-3);
        assert!((middle[1].center - Vec2::new(640.0, 230.0)).length() < 1e-3);
        assert!((middle[2].center - Vec2::new(640.0, 160.0)).length() < 1e-3);
        assert_eq!(middle[2].sound_id, "hat_2");
    }

    #[test]
    fn pads_stay_on_the_surface() {
        let tips = even_tips().map(|t| t - Vec2::new(0.0, 280.0));
        let layout = calibrate(&tips, Vec2::new(640.0, 60.0), SURFACE, &PadConfig::default()).unwrap();
        for p in &layout.pads {
            assert!(p.center.y >= p.radius() && p.center.y <= SURFACE.y - p.radius(), "{:?}", p.center);
            assert!(p.center.x >= p.radius() && p.center.x <= SURFACE.x - p.radius());
        }
    }

    #[test]
    fn too_few_tips_or_collapsed_hand_fail() {
        let cfg = PadConfig::default();
        assert!(calibrate(&even_tips()[..4], Vec2::ZERO, SURFACE, &cfg).is_none());
        assert!(calibrate(&[Vec2::splat(5.0); 5], Vec2::ZERO, SURFACE, &cfg).is_none());
    }

    #[test]
    fn fallback_is_a_fan_below_center() {
        let layout = PadLayout::fallback(SURFACE, &PadConfig::default());
        assert!(!layout.calibrated);
        assert_eq!(layout.scale, 1.0);
        assert_eq!(layout.len(), 15);
        let middle = layout.pads.iter().find(|p| p.sound_id == "hat_0").unwrap();
        assert!((middle.center - Vec2::new(640.0, 518.4 - 90.0)).length() < 1e-2);
        assert!(layout.pads.iter().all(|p| p.center.y < 720.0 * 0.72 + 1.0));
    }

    #[test]
    fn sound_ids_name_voice_and_row() {
        assert_eq!(sound_id(Finger::Thumb, 0), "kick_0");
        assert_eq!(sound_id(Finger::Index, 1), "snare_1");
    }
}
