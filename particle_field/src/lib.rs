//! # particle_field
//!
//! The particle engine behind the particle-driven modes.
//!
//! * **Emission** is time-based: `floor(rate × elapsed_ms / 1000)` particles
//!   per source per frame, with the remainder dropped. The first frame after
//!   a gap only re-arms the clock.
//! * **Integration** applies gravity, drag, optional curl-noise turbulence and
//!   optional pair forces, then bounces particles off all four edges.
//! * **Pair forces** go through a [`SpatialGrid`] whose cell size equals the
//!   force radius, so each particle only looks at its 3×3 cell block.
//! * **Population** is hard-capped. Emission past the cap is dropped, never
//!   queued.
//!
//! ```rust
//! use glam::Vec2;
//! use particle_field::{EmitterSource, ParticleConfig, ParticleEngine};
//!
//! let mut engine = ParticleEngine::new(ParticleConfig::default(), 800.0, 600.0, 7);
//! let src = [EmitterSource::at(Vec2::new(400.0, 300.0))];
//! engine.emit(&src, 0.0);      // arms the clock
//! engine.emit(&src, 100.0);    // 120/s × 0.1 s = 12
//! assert_eq!(engine.len(), 12);
//! ```

pub mod color;
pub mod config;
pub mod engine;
pub mod grid;
pub mod noise;
pub mod particle;

pub use color::{hsv_to_argb, ColorMode};
pub use config::ParticleConfig;
pub use engine::{EmitterSource, ParticleEngine, Sprite};
pub use grid::{net_forces_brute, net_forces_grid, pair_force, ForceParams, SpatialGrid};
pub use noise::{curl, scalar_noise};
pub use particle::Particle;
