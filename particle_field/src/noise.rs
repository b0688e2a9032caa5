//! Curl-noise turbulence.
//!
//! The scalar field is a small sum of sines: cheap, deterministic and smooth
//! everywhere. The flow is its rotated gradient `(∂n/∂y, −∂n/∂x)`, which is
//! divergence-free, so particles swirl instead of bunching up.

use glam::Vec2;

const EPS: f32 = 0.01;

pub fn scalar_noise(x: f32, y: f32, t: f32) -> f32 {
    (x * 1.7 + t).sin() * (y * 1.3 - t * 0.7).cos()
        + 0.5 * ((x + y) * 2.3 + t * 1.3).sin()
        + 0.25 * (x * 3.1 - y * 2.9 - t * 0.5).cos()
}

/// Curl of [`scalar_noise`] at `p` (noise-domain coordinates) by central
/// differences.
pub fn curl(p: Vec2, t: f32) -> Vec2 {
    let dn_dy = (scalar_noise(p.x, p.y + EPS, t) - scalar_noise(p.x, p.y - EPS, t)) / (2.0 * EPS);
    let dn_dx = (scalar_noise(p.x + EPS, p.y, t) - scalar_noise(p.x - EPS, p.y, t)) / (2.0 * EPS);
    Vec2::new(dn_dy, -dn_dx)
}
