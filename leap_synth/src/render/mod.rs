//! Mode visuals.
//!
//! | Mode | Renderer |
//! |---|---|
//! | Ribbons | [`Ribbons`]: fingertip trails as tapered glowing curves |
//! | Orbit | [`Orbit`]: fingertips as satellites circling the palm |
//! | Echo | [`Echo`]: trail samples re-emitted as expanding rings |
//! | Theremin | [`Theremin`]: pitch grid, volume line and the voice marker |
//! | Pads | [`draw_pads`], called directly by the simulation |
//! | Particles / Nebula | [`draw_sprites`] |
//!
//! Renderers hold no state; everything they need is in [`RenderContext`].

mod echo;
mod orbit;
mod pads;
mod ribbons;
mod theremin;

pub use echo::Echo;
pub use orbit::Orbit;
pub use pads::draw_pads;
pub use ribbons::Ribbons;
pub use theremin::Theremin;

use glam::Vec2;
use hand_pose::{Finger, HandFrame, Handedness, TrailStore};
use particle_field::{hsv_to_argb, Sprite};

use crate::config::VisualSettings;
use crate::draw::{DrawList, Paint};
use crate::mode::Mode;
use crate::sim::ParamState;

/// Read-only view of one frame.
pub struct RenderContext<'a> {
    pub hands:   &'a HandFrame,
    pub trails:  &'a TrailStore,
    pub visual:  &'a VisualSettings,
    pub params:  &'a ParamState,
    pub now_ms:  f64,
    pub surface: Vec2,
}

impl RenderContext<'_> {
    /// Shared palette: each finger has its own hue band, the left hand is
    /// offset by half a band, and everything drifts slowly with time.
    /// `t` in `[0, 1]` goes from the dim tail to the bright head.
    pub fn color(&self, hand: Handedness, finger: Finger, t: f32) -> u32 {
        let band = finger.index() as f32 * 72.0;
        let side = if hand == Handedness::Left { 36.0 } else { 0.0 };
        let drift = (self.now_ms * 0.01) as f32;
        let t = t.clamp(0.0, 1.0);
        hsv_to_argb(band + side + drift, 0.75, 0.35 + 0.65 * t)
    }
}

pub trait Visualization {
    fn render(&self, ctx: &RenderContext, out: &mut DrawList);
}

/// The stateless renderer for modes that have one.
pub fn renderer_for(mode: Mode) -> Option<&'static dyn Visualization> {
    match mode {
        Mode::Ribbons  => Some(&Ribbons),
        Mode::Orbit    => Some(&Orbit),
        Mode::Echo     => Some(&Echo),
        Mode::Theremin => Some(&Theremin),
        Mode::Pads | Mode::Particles | Mode::Nebula => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Shared pieces
// ════════════════════════════════════════════════════════════════════════════

/// Lines between touching fingertip pairs and a glow between touching palms.
pub fn draw_touch_connections(ctx: &RenderContext, out: &mut DrawList) {
    let touch = &ctx.hands.touch;
    let (left, right) = match (ctx.hands.hand(Handedness::Left), ctx.hands.hand(Handedness::Right)) {
        (Some(l), Some(r)) => (l, r),
        _ => return,
    };

    for pair in &touch.pairs {
        let a = left.state.tip(pair.left).xy();
        let b = right.state.tip(pair.right).xy();
        let paint = Paint::Linear {
            from:  ctx.color(Handedness::Left, pair.left, 1.0),
            to:    ctx.color(Handedness::Right, pair.right, 1.0),
            start: a,
            end:   b,
        };
        out.line(a, b, 2.0, paint, 0.9);
        out.glow(pair.midpoint, ctx.visual.glow_radius * 0.6, 0xFFFFFF, 0.7);
    }

    if touch.touching {
        let mid = (left.state.palm_xy() + right.state.palm_xy()) * 0.5;
        let pulse = 0.75 + 0.25 * ((ctx.now_ms * 0.012).sin() as f32);
        out.glow(mid, ctx.visual.glow_radius * 3.0 * pulse, 0xFFE8C0, 0.8);
    }
}

/// Small dots on every visible fingertip.
pub fn draw_fingertips(ctx: &RenderContext, out: &mut DrawList) {
    if !ctx.visual.show_fingertips {
        return;
    }
    for hand in &ctx.hands.hands {
        for tip in &hand.state.fingertips {
            out.circle(tip.xy(), 4.0, ctx.color(hand.handedness(), tip.finger, 1.0), 0.9);
        }
    }
}

/// Particle sprites, trails first so the heads sit on top.
pub fn draw_sprites(sprites: &[Sprite], out: &mut DrawList) {
    for s in sprites.iter().filter(|s| s.trail.len() >= 2) {
        let pts: Vec<Vec2> = s.trail.iter().copied().chain(std::iter::once(s.position)).collect();
        out.smooth_path(&pts, (s.radius * 0.5).max(1.0), Paint::Solid(s.color), s.alpha * 0.5);
    }
    for s in sprites {
        out.circle(s.position, s.radius, s.color, s.alpha);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use hand_pose::synth::SyntheticHand;
    use hand_pose::{HandConfig, HandFrame, HandInterpreter, Handedness, PoseKind, TrailStore};

    /// Interpreted frames of the given hands after `frames` ticks of motion.
    pub fn run(hands: &[Handedness], frames: usize) -> (HandFrame, TrailStore) {
        let mut interp = HandInterpreter::new(HandConfig::default()).with_surface(800.0, 600.0);
        let mut last = None;
        for i in 0..frames.max(1) {
            let shift = i as f32 * 0.01;
            let lm: Vec<_> = hands.iter().map(|&h| {
                let x = if h == Handedness::Right { 0.35 } else { 0.65 };
                SyntheticHand::new(h, PoseKind::Five)
                    .center(glam::Vec3::new(x + shift, 0.5, 0.0))
                    .frame()
            }).collect();
            last = Some(interp.interpret(&lm, i as f64 * 16.0));
        }
        let frame = last.unwrap_or_default();
        (frame, interp.trails().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawCmd;
    use test_support::run;

    fn ctx<'a>(hands: &'a HandFrame, trails: &'a TrailStore, visual: &'a VisualSettings, params: &'a ParamState) -> RenderContext<'a> {
        RenderContext { hands, trails, visual, params, now_ms: 500.0, surface: Vec2::new(800.0, 600.0) }
    }

    #[test]
    fn renderer_table() {
        for mode in Mode::ALL {
            assert_eq!(renderer_for(mode).is_some(), !matches!(mode, Mode::Pads | Mode::Particles | Mode::Nebula));
        }
    }

    #[test]
    fn colors_brighten_toward_the_head() {
        let (hands, trails) = run(&[Handedness::Right], 1);
        let (v, p) = (VisualSettings::default(), ParamState::default());
        let c = ctx(&hands, &trails, &v, &p);
        let luma = |argb: u32| ((argb >> 16) & 0xFF) + ((argb >> 8) & 0xFF) + (argb & 0xFF);
        assert!(luma(c.color(Handedness::Right, Finger::Index, 1.0)) > luma(c.color(Handedness::Right, Finger::Index, 0.0)));
        assert_ne!(c.color(Handedness::Right, Finger::Index, 1.0), c.color(Handedness::Right, Finger::Middle, 1.0));
    }

    #[test]
    fn no_connections_with_one_hand() {
        let (hands, trails) = run(&[Handedness::Right], 3);
        let (v, p) = (VisualSettings::default(), ParamState::default());
        let mut out = DrawList::new();
        draw_touch_connections(&ctx(&hands, &trails, &v, &p), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn fingertips_follow_the_setting() {
        let (hands, trails) = run(&[Handedness::Right, Handedness::Left], 1);
        let p = ParamState::default();
        let mut v = VisualSettings::default();
        let mut out = DrawList::new();
        draw_fingertips(&ctx(&hands, &trails, &v, &p), &mut out);
        assert_eq!(out.len(), 10);
        v.show_fingertips = false;
        let mut out = DrawList::new();
        draw_fingertips(&ctx(&hands, &trails, &v, &p), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn sprites_draw_trail_then_head() {
        let sprite = Sprite {
            position: Vec2::new(5.0, 5.0),
            radius:   3.0,
            color:    0xFFFF0000,
            alpha:    0.8,
            trail:    vec![Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0)],
        };
        let mut out = DrawList::new();
        draw_sprites(&[sprite], &mut out);
        assert_eq!(out.len(), 2);
        assert!(matches!(out.as_slice()[0], DrawCmd::Path { .. }));
        assert!(matches!(out.as_slice()[1], DrawCmd::Circle { .. }));
    }
}
