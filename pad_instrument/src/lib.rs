//! # pad_instrument
//!
//! Virtual drum pads laid out around the performer's hand.
//!
//! | Piece | Type | Notes |
//! |---|---|---|
//! | Layout | [`PadLayout`] | `calibrate` from five tips + palm, or the static fallback fan |
//! | Pad | [`Pad`] | center, diameter, `"<voice>_<row>"` sound id, owning finger |
//! | Detection | [`DetectorState`] | one per pad, variant chosen by [`TapAlgorithm`] |
//! | Instrument | [`PadInstrument`] | runs detection with a shared per-pad cooldown |
//!
//! Calibration scale is `mean adjacent fingertip distance / reference_spread`,
//! so a hand whose tips sit exactly `reference_spread` apart gets pads of
//! `base_size`:
//!
//! ```rust
//! use glam::Vec2;
//! use pad_instrument::{calibrate, PadConfig};
//!
//! let tips: Vec<Vec2> = (0..5).map(|i| Vec2::new(400.0 + 80.0 * i as f32, 300.0)).collect();
//! let layout = calibrate(&tips, Vec2::new(560.0, 450.0), Vec2::new(1280.0, 720.0), &PadConfig::default()).unwrap();
//! assert_eq!(layout.scale, 1.0);
//! assert_eq!(layout.pads[0].size, PadConfig::default().base_size);
//! ```

pub mod config;
pub mod detector;
pub mod instrument;
pub mod layout;

pub use config::{PadConfig, TapAlgorithm};
pub use detector::{DetectorState, TipSample};
pub use instrument::{PadInstrument, PadTrigger};
pub use layout::{calibrate, sound_id, Pad, PadLayout, KIT_VOICES};
