use std::f32::consts::TAU;

use glam::Vec2;

use super::{draw_touch_connections, RenderContext, Visualization};
use crate::draw::{DrawCmd, DrawList, Paint};

/// Each fingertip becomes a satellite on a ring around its palm; the ring
/// radius is the tip's distance from the palm.
pub struct Orbit;

const SPIN_PER_MS: f32 = 0.0012;

impl Visualization for Orbit {
    fn render(&self, ctx: &RenderContext, out: &mut DrawList) {
        let t = ctx.now_ms as f32;

        for hand in &ctx.hands.hands {
            let palm = hand.state.palm_xy();
            let h = hand.handedness();
            let dir = if h == hand_pose::Handedness::Left { -1.0 } else { 1.0 };

            for tip in &hand.state.fingertips {
                let r = tip.xy().distance(palm);
                let color = ctx.color(h, tip.finger, 1.0);
                out.push(DrawCmd::Arc {
                    center:      palm,
                    radius:      r,
                    start_angle: 0.0,
                    end_angle:   TAU,
                    width:       1.0,
                    color:       ctx.color(h, tip.finger, 0.2),
                    alpha:       0.5,
                });

                // inner rings turn faster
                let speed = SPIN_PER_MS * (1.0 + 60.0 / r.max(20.0));
                let a = dir * t * speed + tip.finger.index() as f32 * TAU / 5.0;
                let sat = palm + Vec2::new(a.cos(), a.sin()) * r;
                out.glow(sat, ctx.visual.glow_radius * 0.5, color, 0.8);
                out.circle(sat, 3.0, color, 1.0);
                out.line(palm, tip.xy(), 1.0, Paint::Solid(color), 0.3);
            }
            out.glow(palm, ctx.visual.glow_radius, 0xFFFFFF, 0.4);
        }

        draw_touch_connections(ctx, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualSettings;
    use crate::render::test_support::run;
    use crate::sim::ParamState;
    use hand_pose::Handedness;

    #[test]
    fn one_ring_per_fingertip() {
        let (hands, trails) = run(&[Handedness::Right, Handedness::Left], 2);
        let (visual, params) = (VisualSettings::default(), ParamState::default());
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 250.0, surface: Vec2::new(800.0, 600.0) };
        let mut out = DrawList::new();
        Orbit.render(&ctx, &mut out);
        let arcs = out.as_slice().iter().filter(|c| matches!(c, DrawCmd::Arc { .. })).count();
        assert_eq!(arcs, 10);
    }

    #[test]
    fn satellites_stay_on_their_ring() {
        let (hands, trails) = run(&[Handedness::Right], 1);
        let (visual, params) = (VisualSettings::default(), ParamState::default());
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 1234.0, surface: Vec2::new(800.0, 600.0) };
        let mut out = DrawList::new();
        Orbit.render(&ctx, &mut out);

        let palm = hands.hands[0].state.palm_xy();
        let radii: Vec<f32> = hands.hands[0].state.fingertips.iter().map(|t| t.xy().distance(palm)).collect();
        let sats: Vec<f32> = out.as_slice().iter().filter_map(|c| match c {
            DrawCmd::Circle { center, radius, .. } if *radius == 3.0 => Some(center.distance(palm)),
            _ => None,
        }).collect();
        assert_eq!(sats.len(), 5);
        for (s, r) in sats.iter().zip(&radii) {
            assert!((s - r).abs() < 1e-2, "{} vs {}", s, r);
        }
    }
}
