use glam::Vec2;

use super::{draw_touch_connections, RenderContext, Visualization};
use crate::draw::{DrawList, Paint};

/// Fingertip trails as glowing ribbons: a wide faint pass under a narrow
/// bright one, tail to head in the finger's color. Filter cutoff widens the
/// ribbons and resonance brightens the heads.
pub struct Ribbons;

impl Visualization for Ribbons {
    fn render(&self, ctx: &RenderContext, out: &mut DrawList) {
        let width = ctx.visual.ribbon_width * (0.6 + 0.8 * ctx.params.filter_cutoff);

        for (hand, finger, trail) in ctx.trails.iter() {
            if trail.len() < 2 {
                continue;
            }
            let pts: Vec<Vec2> = trail.iter().map(|s| Vec2::new(s.x, s.y)).collect();
            let (tail, head) = (pts[0], pts[pts.len() - 1]);

            let paint = Paint::Linear {
                from:  ctx.color(hand, finger, 0.0),
                to:    ctx.color(hand, finger, 1.0),
                start: tail,
                end:   head,
            };
            out.smooth_path(&pts, width * 2.5, paint, 0.25);
            out.smooth_path(&pts, width, paint, 0.9);

            let glow = ctx.visual.glow_radius * (0.7 + 0.6 * ctx.params.resonance);
            out.glow(head, glow, ctx.color(hand, finger, 1.0), 0.6);
        }

        draw_touch_connections(ctx, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualSettings;
    use crate::draw::DrawCmd;
    use crate::render::test_support::run;
    use crate::sim::ParamState;
    use hand_pose::Handedness;

    fn draw(frames: usize) -> DrawList {
        let (hands, trails) = run(&[Handedness::Right], frames);
        let (visual, params) = (VisualSettings::default(), ParamState::default());
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 0.0, surface: Vec2::new(800.0, 600.0) };
        let mut out = DrawList::new();
        Ribbons.render(&ctx, &mut out);
        out
    }

    #[test]
    fn single_sample_trails_draw_nothing() {
        assert!(draw(1).is_empty());
    }

    #[test]
    fn each_finger_gets_two_passes_and_a_glow() {
        let out = draw(6);
        let paths = out.as_slice().iter().filter(|c| matches!(c, DrawCmd::Path { .. })).count();
        let discs = out.as_slice().iter().filter(|c| matches!(c, DrawCmd::Circle { .. })).count();
        assert_eq!((paths, discs), (10, 5));
    }
}
