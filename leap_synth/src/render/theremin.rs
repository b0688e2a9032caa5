use glam::Vec2;
use hand_pose::Handedness;
use particle_field::hsv_to_argb;

use super::{draw_touch_connections, RenderContext, Visualization};
use crate::draw::{DrawList, Paint};

/// Pitch runs left to right, volume bottom to top. Guide lines mark half
/// steps, the voice marker sits on the right palm.
pub struct Theremin;

const GUIDES: usize = 24;

impl Visualization for Theremin {
    fn render(&self, ctx: &RenderContext, out: &mut DrawList) {
        let (w, h) = (ctx.surface.x, ctx.surface.y);
        let pitch  = ctx.params.theremin_pitch;
        let volume = ctx.params.theremin_volume;
        let voice  = hsv_to_argb(pitch * 300.0, 0.8, 1.0);

        // ── pitch guides ──
        for k in 0..=GUIDES {
            let x = w * k as f32 / GUIDES as f32;
            let alpha = if k % 12 == 0 { 0.35 } else { 0.12 };
            out.line(Vec2::new(x, 0.0), Vec2::new(x, h), 1.0, Paint::Solid(0x5060A0), alpha);
        }

        // ── volume line ──
        let vy = (1.0 - volume) * h;
        let paint = Paint::Linear { from: 0x202040, to: voice, start: Vec2::new(0.0, vy), end: Vec2::new(w, vy) };
        out.line(Vec2::new(0.0, vy), Vec2::new(w, vy), 2.0, paint, 0.3 + 0.5 * volume);

        // ── hands ──
        if let Some(right) = ctx.hands.hand(Handedness::Right) {
            let p = right.state.palm_xy();
            out.line(Vec2::new(pitch * w, 0.0), Vec2::new(pitch * w, h), 2.0, Paint::Solid(voice), 0.6);
            out.glow(p, ctx.visual.glow_radius * (1.0 + 2.0 * volume), voice, 0.4 + 0.6 * volume);
        }
        if let Some(left) = ctx.hands.hand(Handedness::Left) {
            out.glow(left.state.palm_xy(), ctx.visual.glow_radius, 0xA0A0FF, 0.5);
        }

        out.text(
            Vec2::new(12.0, 40.0),
            &format!("pitch {:.2}  vol {:.2}", pitch, volume),
            voice,
            0.8,
            2,
        );

        draw_touch_connections(ctx, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualSettings;
    use crate::draw::DrawCmd;
    use crate::sim::ParamState;
    use hand_pose::{HandFrame, TrailStore};

    #[test]
    fn silent_theremin_still_draws_its_grid() {
        let (hands, trails) = (HandFrame::default(), TrailStore::new(8, 1000.0));
        let visual = VisualSettings::default();
        let params = ParamState { theremin_volume: 0.0, theremin_pitch: 0.5, ..ParamState::default() };
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 0.0, surface: Vec2::new(480.0, 320.0) };
        let mut out = DrawList::new();
        Theremin.render(&ctx, &mut out);

        let paths = out.as_slice().iter().filter(|c| matches!(c, DrawCmd::Path { .. })).count();
        assert_eq!(paths, GUIDES + 2);
        assert!(out.as_slice().iter().any(|c| matches!(c, DrawCmd::Text { text, .. } if text == "pitch 0.50  vol 0.00")));
    }
}
