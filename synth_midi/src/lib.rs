//! # synth_midi
//!
//! The MIDI side of the gesture synth. No I/O beyond file writing; the live
//! port lives in the application.
//!
//! | Piece | Items |
//! |---|---|
//! | Wire messages | [`MidiMessage`], [`unit_to_cc`], [`bipolar_to_bend`] |
//! | Drum kit | [`drum_note`] maps `"<voice>_<row>"` sound ids to GM percussion keys |
//! | Continuous parameters | [`control_target`]: named parameter → CC number or pitch bend |
//! | Pitch | [`Scale`], [`PitchMap`] for theremin quantization |
//! | Recording | [`SessionRecording`] writes a Type-0 standard MIDI file |
//!
//! ```rust
//! use synth_midi::{drum_note, MidiMessage, PERCUSSION_CHANNEL};
//!
//! let note = drum_note("snare_0").unwrap();
//! let msg = MidiMessage::NoteOn { channel: PERCUSSION_CHANNEL, note, velocity: 100 };
//! assert_eq!(msg.to_bytes(), vec![0x99, 38, 100]);
//! ```

pub mod control;
pub mod error;
pub mod kit;
pub mod message;
pub mod scale;
pub mod smf;

pub use control::{bend_range_rpn, control_target, ControlTarget, CONTROL_MAP};
pub use error::MidiError;
pub use kit::{drum_note, GeneralMidi, PERCUSSION_CHANNEL};
pub use message::{bipolar_to_bend, unit_to_cc, MidiMessage, PITCH_BEND_CENTER};
pub use scale::{PitchMap, Scale, ScaleKind};
pub use smf::{ms_to_ticks, SessionRecording};
