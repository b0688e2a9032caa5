use std::f32::consts::TAU;

use glam::Vec2;

use super::{draw_touch_connections, RenderContext, Visualization};
use crate::draw::{DrawCmd, DrawList};

/// Trail samples replayed as rings that grow and fade with their age. The
/// delay mix sets how many past samples echo.
pub struct Echo;

/// Ring growth, canvas units per ms of age.
const GROWTH: f32 = 0.06;

impl Visualization for Echo {
    fn render(&self, ctx: &RenderContext, out: &mut DrawList) {
        let stride = (4.0 - 3.0 * ctx.params.delay_mix).round().max(1.0) as usize;

        for (hand, finger, trail) in ctx.trails.iter() {
            let Some(newest) = trail.latest() else { continue };
            let span = (newest.t_ms - trail.iter().next().map_or(newest.t_ms, |s| s.t_ms)).max(1.0);

            for s in trail.iter().rev().step_by(stride) {
                let age = (ctx.now_ms - s.t_ms).max(0.0);
                let fresh = 1.0 - ((newest.t_ms - s.t_ms) / span) as f32;
                out.push(DrawCmd::Arc {
                    center:      Vec2::new(s.x, s.y),
                    radius:      4.0 + age as f32 * GROWTH,
                    start_angle: 0.0,
                    end_angle:   TAU,
                    width:       1.5,
                    color:       ctx.color(hand, finger, fresh),
                    alpha:       0.7 * fresh,
                });
            }
            out.circle(Vec2::new(newest.x, newest.y), 3.0, ctx.color(hand, finger, 1.0), 1.0);
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

    fn arcs(delay_mix: f32) -> usize {
        let (hands, trails) = run(&[Handedness::Right], 9);
        let visual = VisualSettings::default();
        let params = ParamState { delay_mix, ..ParamState::default() };
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 200.0, surface: Vec2::new(800.0, 600.0) };
        let mut out = DrawList::new();
        Echo.render(&ctx, &mut out);
        out.as_slice().iter().filter(|c| matches!(c, DrawCmd::Arc { .. })).count()
    }

    #[test]
    fn more_delay_means_more_echoes() {
        // 9 samples per finger, the oldest has zero freshness and is dropped
        assert_eq!(arcs(1.0), 5 * 8);
        assert_eq!(arcs(0.0), 5 * 2);
    }

    #[test]
    fn empty_trails_draw_nothing() {
        let (hands, trails) = (hand_pose::HandFrame::default(), hand_pose::TrailStore::new(8, 1000.0));
        let (visual, params) = (VisualSettings::default(), ParamState::default());
        let ctx = RenderContext { hands: &hands, trails: &trails, visual: &visual, params: &params, now_ms: 0.0, surface: Vec2::new(800.0, 600.0) };
        let mut out = DrawList::new();
        Echo.render(&ctx, &mut out);
        assert!(out.is_empty());
    }
}
