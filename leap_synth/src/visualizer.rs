//! Software-rendered visualizer using `minifb`.
//!
//! [`Canvas`] rasterizes [`DrawCmd`]s into a `u32` buffer and knows nothing
//! about windows, so it can be tested headless. [`Visualizer`] owns the
//! window, turns keys and the mouse into [`UiAction`]s and presents the
//! canvas.
//!
//! ```text
//! 1 / 2 / 5 / 0   right hand: one / two / five fingers / fist
//! ⇧ + digit       same for the left hand (shows it)
//! L               show / hide the left hand
//! mouse           moves the hands; button pushes toward the sensor
//! C  calibrate pads     T  next tap algorithm    M  next color mode
//! E  echo mode          X  clear particles       Q / Esc  quit
//! ```

use std::f32::consts::TAU;

use glam::Vec2;
use hand_pose::{Handedness, PoseKind};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::config::{ConfigUpdate, Settings};
use crate::draw::{DrawCmd, Paint, PathSeg};
use crate::error::{AppError, Result};
use crate::mode::Mode;
use crate::sensor::SimInput;

const BG_COLOR: u32 = 0xFF05050C;

/// Line pieces per quadratic segment.
const QUAD_STEPS: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    buf: Vec<u32>,
    w:   usize,
    h:   usize,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }
    pub fn buffer(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    pub fn draw_all(&mut self, cmds: &[DrawCmd]) {
        for cmd in cmds {
            self.draw(cmd);
        }
    }

    pub fn draw(&mut self, cmd: &DrawCmd) {
        match cmd {
            DrawCmd::Clear(color) => self.buf.fill(0xFF000000 | color),
            DrawCmd::Fade { color, alpha } => {
                for px in &mut self.buf {
                    *px = blend(*px, *color, *alpha);
                }
            }
            DrawCmd::Circle { center, radius, paint, alpha } => self.fill_disc(*center, *radius, paint, *alpha),
            DrawCmd::Arc { center, radius, start_angle, end_angle, width, color, alpha } => {
                self.stroke_arc(*center, *radius, (*start_angle, *end_angle), *width, *color, *alpha)
            }
            DrawCmd::Path { segs, width, paint, alpha } => {
                for (a, b) in flatten(segs) {
                    self.stroke_segment(a, b, *width, paint, *alpha);
                }
            }
            DrawCmd::Text { pos, text, color, alpha, scale } => {
                self.draw_label(text, pos.x.round() as i64, pos.y.round() as i64, *color, *alpha, *scale as i64)
            }
            DrawCmd::Flash { color, alpha } => {
                for px in &mut self.buf {
                    *px = add(*px, *color, *alpha);
                }
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn blend_pixel(&mut self, x: i64, y: i64, color: u32, alpha: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            let i = y as usize * self.w + x as usize;
            self.buf[i] = blend(self.buf[i], color, alpha);
        }
    }

    /// Pixel box covering `lo..=hi`, clipped to the canvas.
    fn clip(&self, lo: Vec2, hi: Vec2) -> (i64, i64, i64, i64) {
        (
            (lo.x.floor() as i64).max(0),
            (lo.y.floor() as i64).max(0),
            (hi.x.ceil() as i64).min(self.w as i64 - 1),
            (hi.y.ceil() as i64).min(self.h as i64 - 1),
        )
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, paint: &Paint, alpha: f32) {
        let (x0, y0, x1, y1) = self.clip(center - radius, center + radius);
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if p.distance_squared(center) <= r2 {
                    self.blend_pixel(x, y, paint.color_at(p), alpha);
                }
            }
        }
    }

    fn stroke_segment(&mut self, a: Vec2, b: Vec2, width: f32, paint: &Paint, alpha: f32) {
        let half = (width * 0.5).max(0.5);
        let (x0, y0, x1, y1) = self.clip(a.min(b) - half, a.max(b) + half);
        let ab = b - a;
        let len2 = ab.length_squared();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = if len2 <= f32::EPSILON { 0.0 } else { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) };
                if p.distance(a + ab * t) <= half {
                    self.blend_pixel(x, y, paint.color_at(p), alpha);
                }
            }
        }
    }

    fn stroke_arc(&mut self, center: Vec2, radius: f32, (start, end): (f32, f32), width: f32, color: u32, alpha: f32) {
        let half = (width * 0.5).max(0.5);
        let outer = radius + half;
        let (x0, y0, x1, y1) = self.clip(center - outer, center + outer);
        let sweep = end - start;
        let full = sweep.abs() >= TAU;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if (p.length() - radius).abs() > half {
                    continue;
                }
                let inside = full || {
                    let a = (p.y.atan2(p.x) - start.min(end)).rem_euclid(TAU);
                    a <= sweep.abs()
                };
                if inside {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    /// 3×5 bitmap font; `scale` blows each glyph pixel up to a square.
    fn draw_label(&mut self, text: &str, x: i64, y: i64, color: u32, alpha: f32, scale: i64) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3i64 {
                    if bits & (1 << (2 - col)) != 0 {
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.blend_pixel(cx + col * scale + dx, y + row as i64 * scale + dy, color, alpha);
                            }
                        }
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.w as i64 { break; }
        }
    }
}

/// Straight pieces approximating a path.
fn flatten(segs: &[PathSeg]) -> Vec<(Vec2, Vec2)> {
    let mut out = Vec::new();
    let mut cur: Option<Vec2> = None;
    for seg in segs {
        match *seg {
            PathSeg::MoveTo(p) => cur = Some(p),
            PathSeg::LineTo(p) => {
                if let Some(c) = cur {
                    out.push((c, p));
                }
                cur = Some(p);
            }
            PathSeg::QuadTo { ctrl, to } => {
                if let Some(from) = cur {
                    let mut prev = from;
                    for i in 1..=QUAD_STEPS {
                        let t = i as f32 / QUAD_STEPS as f32;
                        let u = 1.0 - t;
                        let p = from * (u * u) + ctrl * (2.0 * u * t) + to * (t * t);
                        out.push((prev, p));
                        prev = p;
                    }
                }
                cur = Some(to);
            }
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

/// Additive light: `a + b·t`, saturating per channel.
fn add(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let ch = |shift: u32| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        ((ca + cb * t).round().min(255.0) as u32) << shift
    };
    0xFF000000 | ch(16) | ch(8) | ch(0)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

/// What the window asks of the rest of the app.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    Sim(SimInput),
    Config(ConfigUpdate),
    Quit,
}

pub struct Visualizer {
    window:     Window,
    canvas:     Canvas,
    mouse_down: bool,
    pointer:    Option<Vec2>,
}

impl Visualizer {
    pub fn new(w: usize, h: usize) -> Result<Self> {
        let mut window = Window::new(
            "Leap Synth",
            w, h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(w, h), mouse_down: false, pointer: None })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Keyboard and mouse since the last frame. `settings` supplies the
    /// current values for the cycling keys.
    pub fn poll_input(&mut self, settings: &Settings) -> Vec<UiAction> {
        let mut actions = Vec::new();
        if !self.window.is_open() {
            actions.push(UiAction::Quit);
            return actions;
        }

        let shift = self.window.is_key_down(Key::LeftShift)
                 || self.window.is_key_down(Key::RightShift);
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            actions.push(UiAction::Quit);
            return actions;
        }

        let hand = if shift { Handedness::Left } else { Handedness::Right };
        for (key, pose) in [
            (Key::Key1, PoseKind::One),
            (Key::Key2, PoseKind::Two),
            (Key::Key5, PoseKind::Five),
            (Key::Key0, PoseKind::None),
        ] {
            if one_shot(key) {
                actions.push(UiAction::Sim(SimInput::Pose { hand, pose }));
            }
        }
        if one_shot(Key::L) {
            actions.push(UiAction::Sim(SimInput::ToggleLeft));
        }
        if one_shot(Key::C) {
            actions.push(UiAction::Config(ConfigUpdate::Calibrate));
        }
        if one_shot(Key::M) {
            actions.push(UiAction::Config(ConfigUpdate::SetColorMode(settings.particles.color_mode.next())));
        }
        if one_shot(Key::T) {
            actions.push(UiAction::Config(ConfigUpdate::SetTapAlgorithm(settings.pads.tap_algorithm.next())));
        }
        if one_shot(Key::X) {
            actions.push(UiAction::Config(ConfigUpdate::ClearParticles));
        }
        if one_shot(Key::E) {
            actions.push(UiAction::Config(ConfigUpdate::SetMode(Mode::Echo)));
        }

        // ── mouse ──
        let (w, h) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let pointer = self.window.get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| Vec2::new(x / w, y / h));
        if pointer != self.pointer {
            self.pointer = pointer;
            actions.push(UiAction::Sim(SimInput::Pointer(pointer)));
        }
        let down = self.window.get_mouse_down(MouseButton::Left);
        if down != self.mouse_down {
            self.mouse_down = down;
            actions.push(UiAction::Sim(SimInput::Push(down)));
        }
        actions
    }

    /// Rasterize one frame and show it.
    pub fn present(&mut self, cmds: &[DrawCmd]) -> Result<()> {
        self.canvas.draw_all(cmds);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.window.update_with_buffer(self.canvas.buffer(), w, h)
            .map_err(|e| AppError::Window(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> Canvas {
        let mut c = Canvas::new(40, 30);
        c.draw(&DrawCmd::Clear(0x000000));
        c
    }

    #[test]
    fn blend_and_add() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.5), 0xFF808080);
        assert_eq!(blend(0x00123456, 0x00FFFFFF, 0.0), 0xFF123456);
        assert_eq!(add(0xFFF0F0F0, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(add(0xFF000000, 0xFF804020, 0.5), 0xFF402010);
    }

    #[test]
    fn disc_covers_its_centre_only() {
        let mut c = canvas();
        c.draw(&DrawCmd::Circle { center: Vec2::new(10.0, 10.0), radius: 3.0, paint: Paint::Solid(0xFF0000), alpha: 1.0 });
        assert_eq!(c.pixel(10, 10), Some(0xFFFF0000));
        assert_eq!(c.pixel(20, 10), Some(0xFF000000));
    }

    #[test]
    fn fade_darkens_the_previous_frame() {
        let mut c = Canvas::new(4, 4);
        c.draw(&DrawCmd::Clear(0xFFFFFF));
        c.draw(&DrawCmd::Fade { color: 0x000000, alpha: 0.5 });
        assert_eq!(c.pixel(1, 1), Some(0xFF808080));
    }

    #[test]
    fn flash_is_additive() {
        let mut c = canvas();
        c.draw(&DrawCmd::Flash { color: 0xFFFFFF, alpha: 0.25 });
        assert_eq!(c.pixel(0, 0), Some(0xFF404040));
    }

    #[test]
    fn path_paints_along_the_line() {
        let mut c = canvas();
        c.draw(&DrawCmd::Path {
            segs:  vec![PathSeg::MoveTo(Vec2::new(2.0, 15.5)), PathSeg::LineTo(Vec2::new(38.0, 15.5))],
            width: 2.0,
            paint: Paint::Solid(0x00FF00),
            alpha: 1.0,
        });
        assert_eq!(c.pixel(20, 15), Some(0xFF00FF00));
        assert_eq!(c.pixel(20, 5), Some(0xFF000000));
    }

    #[test]
    fn quadratic_flattens_to_its_endpoints() {
        let segs = [
            PathSeg::MoveTo(Vec2::ZERO),
            PathSeg::QuadTo { ctrl: Vec2::new(5.0, 10.0), to: Vec2::new(10.0, 0.0) },
        ];
        let pieces = flatten(&segs);
        assert_eq!(pieces.len(), QUAD_STEPS);
        assert_eq!(pieces[0].0, Vec2::ZERO);
        assert_eq!(pieces[QUAD_STEPS - 1].1, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn partial_arc_leaves_the_rest_dark() {
        let mut c = canvas();
        // lower half only: 0 → π, y grows downward
        c.draw(&DrawCmd::Arc {
            center: Vec2::new(20.0, 15.0), radius: 10.0,
            start_angle: 0.0, end_angle: std::f32::consts::PI,
            width: 2.0, color: 0xFFFFFF, alpha: 1.0,
        });
        assert_eq!(c.pixel(20, 25), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(20, 4), Some(0xFF000000));
    }

    #[test]
    fn text_uses_the_bitmap_font() {
        let mut c = canvas();
        c.draw(&DrawCmd::Text { pos: Vec2::new(1.0, 1.0), text: "1".into(), color: 0xFFFFFF, alpha: 1.0, scale: 2 });
        // top row of '1' is 0b010: middle column lit, scaled ×2
        assert_eq!(c.pixel(3, 1), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(4, 2), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(1, 1), Some(0xFF000000));
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut c = canvas();
        c.draw(&DrawCmd::Circle { center: Vec2::new(-50.0, -50.0), radius: 10.0, paint: Paint::Solid(0xFFFFFF), alpha: 1.0 });
        c.draw(&DrawCmd::Text { pos: Vec2::new(38.0, 28.0), text: "hello".into(), color: 0xFFFFFF, alpha: 1.0, scale: 3 });
        assert!(c.buffer().iter().all(|&p| p == 0xFF000000 || p == 0xFFFFFFFF));
    }
}
