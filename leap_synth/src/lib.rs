//! # leap_synth
//!
//! Gesture-driven audio-visual synth. Hand landmarks from a Leap Motion
//! controller (or the mouse) are interpreted into poses and fingertip
//! motion; held poses pick a mode, and each mode turns the hands into sound
//! and light.
//!
//! ## Pose → Mode mapping
//!
//! A pose must be held for the dwell time (400 ms by default) before the
//! switch happens. When both hands qualify, the right hand wins.
//!
//! | Pose | Right hand | Left hand |
//! |---|---|---|
//! | One finger | Pads | Theremin |
//! | Two fingers | Ribbons | Orbit |
//! | Open hand | Particles | Nebula |
//!
//! Echo has no pose; it is entered from the console (`mode echo`) or the
//! `E` key.
//!
//! ## Modes
//!
//! | Mode | Sound | Visual |
//! |---|---|---|
//! | Pads | fingertip taps trigger drum sounds | pad grid with hit flashes |
//! | Ribbons | palm height → filter cutoff, spread → resonance | fingertip trails as glowing ribbons |
//! | Theremin | right palm x → pitch, left palm height → volume | pitch grid and volume line |
//! | Particles | population → delay mix | fingertips emit particles |
//! | Nebula | as Particles | particles with turbulence and palm attraction |
//! | Orbit | none | fingertips circle the palm |
//! | Echo | spread → delay mix | trail samples as expanding rings |
//!
//! ## Feature flags
//!
//! * (default) **Simulation mode**: mouse and keyboard drive the hands.
//! * `leap` **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keys
//!
//! | Key | Action |
//! |---|---|
//! | mouse | move the right hand (left hand mirrors it) |
//! | mouse button | push toward the sensor |
//! | `1` `2` `5` `0` | right-hand pose: one, two, open, fist |
//! | `Shift` + digit | left-hand pose |
//! | `L` | show / hide the left hand |
//! | `C` | calibrate pads to the visible hand |
//! | `T` / `M` | next tap algorithm / particle color mode |
//! | `E` | Echo mode |
//! | `X` | clear particles |
//! | `Q` / `Esc` | quit |

pub mod app;
pub mod audio;
pub mod config;
pub mod draw;
pub mod error;
pub mod mode;
pub mod render;
pub mod sensor;
pub mod sim;
pub mod visualizer;
