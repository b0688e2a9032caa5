//! Backend-neutral drawing commands. The simulation emits these and the
//! window rasterizes them.

use glam::Vec2;

/// Fill of a shape. Colors are packed `0x00RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Solid(u32),
    Linear { from: u32, to: u32, start: Vec2, end: Vec2 },
    Radial { center: Vec2, radius: f32, inner: u32, outer: u32 },
}

impl Paint {
    /// Color of the paint at `p`, with the gradient parameter clamped.
    pub fn color_at(&self, p: Vec2) -> u32 {
        match *self {
            Paint::Solid(c) => c,
            Paint::Linear { from, to, start, end } => {
                let axis = end - start;
                let len2 = axis.length_squared();
                let t = if len2 <= f32::EPSILON { 0.0 } else { (p - start).dot(axis) / len2 };
                lerp_color(from, to, t)
            }
            Paint::Radial { center, radius, inner, outer } => {
                let t = if radius <= f32::EPSILON { 1.0 } else { p.distance(center) / radius };
                lerp_color(inner, outer, t)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSeg {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    Clear(u32),
    /// Blend the whole previous frame toward `color` by `alpha`.
    Fade { color: u32, alpha: f32 },
    /// Filled disc.
    Circle { center: Vec2, radius: f32, paint: Paint, alpha: f32 },
    /// Stroked arc, angles in radians, clockwise in screen space.
    Arc { center: Vec2, radius: f32, start_angle: f32, end_angle: f32, width: f32, color: u32, alpha: f32 },
    /// Stroked polyline/curve.
    Path { segs: Vec<PathSeg>, width: f32, paint: Paint, alpha: f32 },
    /// Top-left anchored text in the bitmap font; `scale` multiplies the
    /// 3×5 glyph cell.
    Text { pos: Vec2, text: String, color: u32, alpha: f32, scale: u32 },
    /// Full-screen additive wash.
    Flash { color: u32, alpha: f32 },
}

impl DrawCmd {
    pub fn alpha(&self) -> f32 {
        match self {
            DrawCmd::Clear(_) => 1.0,
            DrawCmd::Fade { alpha, .. }
            | DrawCmd::Circle { alpha, .. }
            | DrawCmd::Arc { alpha, .. }
            | DrawCmd::Path { alpha, .. }
            | DrawCmd::Text { alpha, .. }
            | DrawCmd::Flash { alpha, .. } => *alpha,
        }
    }
}

/// Ordered commands for one frame, painter's algorithm.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self { DrawList::default() }

    /// Invisible commands are dropped here.
    pub fn push(&mut self, cmd: DrawCmd) {
        if cmd.alpha() > 0.0 {
            self.cmds.push(cmd);
        }
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: u32, alpha: f32) {
        if radius > 0.0 {
            self.push(DrawCmd::Circle { center, radius, paint: Paint::Solid(color), alpha });
        }
    }

    /// Soft disc fading from `color` at the centre to black at the rim.
    pub fn glow(&mut self, center: Vec2, radius: f32, color: u32, alpha: f32) {
        if radius > 0.0 {
            let paint = Paint::Radial { center, radius, inner: color, outer: 0x000000 };
            self.push(DrawCmd::Circle { center, radius, paint, alpha });
        }
    }

    pub fn line(&mut self, a: Vec2, b: Vec2, width: f32, paint: Paint, alpha: f32) {
        self.push(DrawCmd::Path { segs: vec![PathSeg::MoveTo(a), PathSeg::LineTo(b)], width, paint, alpha });
    }

    /// Smooth curve through `points` using midpoint quadratics.
    pub fn smooth_path(&mut self, points: &[Vec2], width: f32, paint: Paint, alpha: f32) {
        if points.len() < 2 {
            return;
        }
        let mut segs = vec![PathSeg::MoveTo(points[0])];
        for w in points.windows(2).skip(1) {
            segs.push(PathSeg::QuadTo { ctrl: w[0], to: (w[0] + w[1]) * 0.5 });
        }
        if let Some(&last) = points.last() {
            segs.push(PathSeg::LineTo(last));
        }
        self.push(DrawCmd::Path { segs, width, paint, alpha });
    }

    pub fn text(&mut self, pos: Vec2, text: &str, color: u32, alpha: f32, scale: u32) {
        self.push(DrawCmd::Text { pos, text: text.to_string(), color, alpha, scale: scale.max(1) });
    }

    pub fn len(&self) -> usize { self.cmds.len() }
    pub fn is_empty(&self) -> bool { self.cmds.is_empty() }
    pub fn as_slice(&self) -> &[DrawCmd] { &self.cmds }
    pub fn into_vec(self) -> Vec<DrawCmd> { self.cmds }

    pub fn extend(&mut self, other: DrawList) {
        self.cmds.extend(other.cmds);
    }
}

// ── color helpers ──────────────────────────────────────────────────────────

/// Linear blend of two packed colors, `t` clamped to `[0, 1]`.
pub fn lerp_color(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let ch = |shift: u32| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        ((ca + (cb - ca) * t).round() as u32) << shift
    };
    ch(16) | ch(8) | ch(0)
}

/// Scale brightness, `k` clamped to `[0, 1]`.
pub fn dim(color: u32, k: f32) -> u32 {
    lerp_color(0x000000, color, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_lerp_endpoints() {
        assert_eq!(lerp_color(0x000000, 0xFFFFFF, 0.0), 0x000000);
        assert_eq!(lerp_color(0x000000, 0xFFFFFF, 1.0), 0xFFFFFF);
        assert_eq!(lerp_color(0x000000, 0x0000FF, 0.5), 0x000080);
        assert_eq!(dim(0x204060, 2.0), 0x204060);
    }

    #[test]
    fn gradients_sample_along_their_axis() {
        let lin = Paint::Linear { from: 0x000000, to: 0xFF0000, start: Vec2::ZERO, end: Vec2::new(10.0, 0.0) };
        assert_eq!(lin.color_at(Vec2::new(-5.0, 3.0)), 0x000000);
        assert_eq!(lin.color_at(Vec2::new(10.0, 7.0)), 0xFF0000);
        let rad = Paint::Radial { center: Vec2::ZERO, radius: 4.0, inner: 0xFFFFFF, outer: 0x000000 };
        assert_eq!(rad.color_at(Vec2::ZERO), 0xFFFFFF);
        assert_eq!(rad.color_at(Vec2::new(0.0, 9.0)), 0x000000);
    }

    #[test]
    fn invisible_commands_are_dropped() {
        let mut list = DrawList::new();
        list.circle(Vec2::ZERO, 5.0, 0xFFFFFF, 0.0);
        list.circle(Vec2::ZERO, 0.0, 0xFFFFFF, 1.0);
        list.text(Vec2::ZERO, "", 0xFFFFFF, 0.0, 1);
        assert!(list.is_empty());
        list.circle(Vec2::ZERO, 5.0, 0xFFFFFF, 0.5);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn smooth_path_shape() {
        let mut list = DrawList::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0)];
        list.smooth_path(&pts, 2.0, Paint::Solid(0xFFFFFF), 1.0);
        match &list.as_slice()[0] {
            DrawCmd::Path { segs, .. } => assert_eq!(segs, &vec![
                PathSeg::MoveTo(Vec2::new(0.0, 0.0)),
                PathSeg::QuadTo { ctrl: Vec2::new(10.0, 0.0), to: Vec2::new(15.0, 5.0) },
                PathSeg::LineTo(Vec2::new(20.0, 10.0)),
            ]),
            other => panic!("expected a path, got {:?}", other),
        }
    }
}
