use std::f32::consts::TAU;

use glam::Vec2;
use pad_instrument::Pad;
use particle_field::hsv_to_argb;

use crate::draw::{DrawCmd, DrawList};

/// How long a hit keeps flashing.
pub const HIT_FLASH_MS: f64 = 250.0;

/// Pads as tinted discs with an outline. A recent hit flashes white and a
/// pad still in cooldown shows a dimmer outline.
pub fn draw_pads(pads: &[Pad], now_ms: f64, cooldown_ms: f64, out: &mut DrawList) {
    for pad in pads {
        let base = hsv_to_argb(pad.finger.index() as f32 * 72.0, 0.6, 0.55);
        let since = pad.last_trigger_ms.map(|t| now_ms - t);
        let cooling = since.is_some_and(|s| s < cooldown_ms);

        out.circle(pad.center, pad.radius(), base, 0.35);
        out.push(DrawCmd::Arc {
            center:      pad.center,
            radius:      pad.radius(),
            start_angle: 0.0,
            end_angle:   TAU,
            width:       2.0,
            color:       base,
            alpha:       if cooling { 0.4 } else { 0.9 },
        });

        if let Some(s) = since.filter(|s| (0.0..HIT_FLASH_MS).contains(s)) {
            let k = 1.0 - (s / HIT_FLASH_MS) as f32;
            out.glow(pad.center, pad.radius() * (1.0 + 0.5 * (1.0 - k)), 0xFFFFFF, k);
        }

        let label = pad.sound_id.replace('_', " ");
        let x = pad.center.x - label.len() as f32 * 2.0;
        out.text(Vec2::new(x, pad.center.y - 2.0), &label, 0xE0E0E0, 0.7, 1);
    }
}
