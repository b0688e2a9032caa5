//! Emission, integration and rendering of the live population.

use glam::Vec2;
use hand_pose::{Finger, Handedness};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::hsv_to_argb;
use crate::config::ParticleConfig;
use crate::grid::{net_forces_grid, SpatialGrid};
use crate::noise::curl;
use crate::particle::Particle;

/// 60 Hz frame in ms; drag is specified per frame of this length.
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

// ════════════════════════════════════════════════════════════════════════════
// EmitterSource / Sprite
// ════════════════════════════════════════════════════════════════════════════

/// A point particles are emitted from this frame, typically a fingertip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterSource {
    pub position: Vec2,
    /// Canvas units per second.
    pub velocity: Vec2,
    pub origin:   Option<(Handedness, Finger)>,
}

impl EmitterSource {
    pub fn at(position: Vec2) -> Self {
        EmitterSource { position, velocity: Vec2::ZERO, origin: None }
    }
}

/// Render-ready view of one particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub radius:   f32,
    /// Packed 0xFFRRGGBB.
    pub color:    u32,
    pub alpha:    f32,
    /// Oldest first; empty unless particle trails are on.
    pub trail:    Vec<Vec2>,
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleEngine
// ════════════════════════════════════════════════════════════════════════════

pub struct ParticleEngine {
    config:       ParticleConfig,
    /// Dense storage in birth order.
    particles:    Vec<Particle>,
    bounds:       Vec2,
    grid:         SpatialGrid,
    rng:          StdRng,
    last_emit_ms: Option<f64>,
    /// Fractional particles owed to each source, carried between frames.
    carry:        f64,
}

impl ParticleEngine {
    pub fn new(config: ParticleConfig, width: f32, height: f32, seed: u64) -> Self {
        let grid = SpatialGrid::new(config.force_radius);
        ParticleEngine {
            particles:    Vec::with_capacity(config.max_particles.min(20_000)),
            config,
            bounds:       Vec2::new(width, height),
            grid,
            rng:          StdRng::seed_from_u64(seed),
            last_emit_ms: None,
            carry:        0.0,
        }
    }

    pub fn config(&self) -> &ParticleConfig { &self.config }
    pub fn particles(&self) -> &[Particle] { &self.particles }
    pub fn len(&self) -> usize { self.particles.len() }
    pub fn is_empty(&self) -> bool { self.particles.is_empty() }

    /// Population as a fraction of the cap.
    pub fn fill_fraction(&self) -> f32 {
        if self.config.max_particles == 0 {
            return 1.0;
        }
        self.particles.len() as f32 / self.config.max_particles as f32
    }

    /// Swap in new tuning. A lower cap evicts the oldest particles first.
    pub fn set_config(&mut self, config: ParticleConfig) {
        if self.particles.len() > config.max_particles {
            let excess = self.particles.len() - config.max_particles;
            self.particles.drain(..excess);
            log::debug!("particle cap lowered to {}, evicted {}", config.max_particles, excess);
        }
        if config.trail_length == 0 {
            for p in &mut self.particles {
                p.trail = None;
            }
        }
        self.config = config;
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.bounds = Vec2::new(width, height);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.rearm();
    }

    fn rearm(&mut self) {
        self.last_emit_ms = None;
        self.carry = 0.0;
    }

    // ── emission ─────────────────────────────────────────────────────────

    /// Emit from every source. Returns how many particles were born.
    ///
    /// Each frame emits the whole part of what the elapsed time owes; the
    /// fraction rolls into the next frame so the long-run rate is exact.
    /// An empty source list marks a gap; the next non-empty call only arms
    /// the clock so a long pause does not come back as a burst.
    pub fn emit(&mut self, sources: &[EmitterSource], now_ms: f64) -> usize {
        if sources.is_empty() {
            self.rearm();
            return 0;
        }
        let Some(last) = self.last_emit_ms.replace(now_ms) else {
            self.carry = 0.0;
            return 0;
        };
        let elapsed = now_ms - last;
        if elapsed > self.config.gap_ms {
            self.carry = 0.0;
            return 0;
        }
        if elapsed <= 0.0 {
            return 0;
        }

        self.carry += self.config.emission_rate.max(0.0) as f64 * elapsed / 1000.0;
        let whole = self.carry.floor();
        self.carry -= whole;
        let per_source = whole as usize;
        let room = self.config.max_particles.saturating_sub(self.particles.len());
        let wanted = per_source.saturating_mul(sources.len());
        let budget = wanted.min(room);

        let mut born = 0;
        'sources: for src in sources {
            for _ in 0..per_source {
                if born == budget {
                    break 'sources;
                }
                let p = self.spawn(src, now_ms);
                self.particles.push(p);
                born += 1;
            }
        }
        born
    }

    fn spawn(&mut self, src: &EmitterSource, now_ms: f64) -> Particle {
        let angle: f32 = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let speed: f32 = self.rng.gen_range(0.0f32..=1.0) * self.config.spread_speed;
        let jitter = Vec2::new(angle.cos(), angle.sin()) * speed;
        let size = self.config.size * self.rng.gen_range(0.6f32..=1.4);
        Particle {
            position:      src.position,
            velocity:      src.velocity * self.config.inherit_velocity + jitter,
            birth_ms:      now_ms,
            size,
            color_seed:    self.rng.gen(),
            finger_origin: src.origin,
            trail:         None,
        }
    }

    // ── integration ──────────────────────────────────────────────────────

    /// Drop every particle whose age has reached its lifetime.
    pub fn cull(&mut self, now_ms: f64) -> usize {
        let lifetime = self.config.lifetime_ms;
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_expired(now_ms, lifetime));
        before - self.particles.len()
    }

    /// Advance the population by `dt_ms`, ending at `now_ms`.
    pub fn integrate(&mut self, now_ms: f64, dt_ms: f64) {
        self.cull(now_ms);
        if self.particles.is_empty() || dt_ms <= 0.0 {
            return;
        }

        let cfg = &self.config;
        let forces = if cfg.forces_enabled() {
            let positions: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
            self.grid.rebuild(cfg.force_radius, &positions);
            net_forces_grid(&positions, &cfg.forces(), &self.grid)
        } else {
            Vec::new()
        };

        let dt = (dt_ms / 1000.0) as f32;
        let drag = cfg.drag.clamp(0.0, 1.0).powf((dt_ms / REFERENCE_FRAME_MS) as f32);
        let noise_t = (now_ms * cfg.noise_speed as f64) as f32;
        let bounds = self.bounds;

        for (i, p) in self.particles.iter_mut().enumerate() {
            let mut acc = Vec2::new(0.0, cfg.gravity);
            if cfg.turbulence {
                acc += curl(p.position * cfg.noise_scale, noise_t) * cfg.turbulence_strength;
            }
            if let Some(f) = forces.get(i) {
                acc += *f;
            }

            p.velocity = (p.velocity + acc * dt) * drag;
            p.position += p.velocity * dt;
            bounce(p, bounds, cfg.bounce);
            p.record_trail(cfg.trail_length);
        }
    }

    // ── rendering ────────────────────────────────────────────────────────

    /// Sprites for every live particle. `external` feeds
    /// [`ColorMode::External`](crate::ColorMode::External).
    pub fn render(&self, now_ms: f64, external: f32) -> Vec<Sprite> {
        let cfg = &self.config;
        self.particles.iter()
            .filter(|p| !p.is_expired(now_ms, cfg.lifetime_ms))
            .map(|p| {
                let life = p.life_fraction(now_ms, cfg.lifetime_ms);
                let speed_frac = p.velocity.length() / cfg.color_speed_range.max(1.0);
                let hue = cfg.color_mode.hue(speed_frac, life, external, p.color_seed, now_ms);
                let alpha = p.alpha(now_ms, cfg.lifetime_ms);
                Sprite {
                    position: p.position,
                    radius:   p.size * (0.6 + 0.4 * alpha),
                    color:    hsv_to_argb(hue, 0.85, 1.0),
                    alpha,
                    trail:    p.trail.as_ref().map(|t| t.iter().copied().collect()).unwrap_or_default(),
                }
            })
            .collect()
    }
}

/// Reflect off the surface edges, keeping `damping` of the normal speed.
fn bounce(p: &mut Particle, bounds: Vec2, damping: f32) {
    if p.position.x < 0.0 {
        p.position.x = -p.position.x;
        p.velocity.x = p.velocity.x.abs() * damping;
    } else if p.position.x > bounds.x {
        p.position.x = 2.0 * bounds.x - p.position.x;
        p.velocity.x = -p.velocity.x.abs() * damping;
    }
    if p.position.y < 0.0 {
        p.position.y = -p.position.y;
        p.velocity.y = p.velocity.y.abs() * damping;
    } else if p.position.y > bounds.y {
        p.position.y = 2.0 * bounds.y - p.position.y;
        p.velocity.y = -p.velocity.y.abs() * damping;
    }
    p.position = p.position.clamp(Vec2::ZERO, bounds);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
