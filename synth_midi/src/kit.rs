//! General MIDI drum kit and the handful of melodic programs the synth uses.

use serde::{Deserialize, Serialize};

use crate::error::{MidiError, Result};

/// GM reserves channel 10 (index 9) for percussion.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// GM percussion key numbers, one row per pad along a finger.
/// Rows past the end wrap around.
const KIT: [(&str, [u8; 3]); 5] = [
    ("kick",  [36, 35, 41]),   // bass drum 1, acoustic bass drum, low floor tom
    ("snare", [38, 40, 37]),   // acoustic snare, electric snare, side stick
    ("hat",   [42, 46, 44]),   // closed, open, pedal hi-hat
    ("tom",   [45, 48, 50]),   // low, hi-mid, high tom
    ("crash", [49, 51, 57]),   // crash 1, ride 1, crash 2
];

/// Resolve a `"<voice>_<row>"` sound id to a GM percussion key.
///
/// ```rust
/// assert_eq!(synth_midi::drum_note("kick_0").unwrap(), 36);
/// assert_eq!(synth_midi::drum_note("hat_1").unwrap(), 46);
/// ```
pub fn drum_note(sound_id: &str) -> Result<u8> {
    let unknown = || MidiError::UnknownSound(sound_id.to_string());
    let (voice, row) = sound_id.rsplit_once('_').ok_or_else(unknown)?;
    let row: usize = row.parse().map_err(|_| unknown())?;
    KIT.iter()
        .find(|(name, _)| *name == voice)
        .map(|(_, notes)| notes[row % notes.len()])
        .ok_or_else(unknown)
}

// ════════════════════════════════════════════════════════════════════════════
// Melodic programs
// ════════════════════════════════════════════════════════════════════════════

/// The GM programs offered for the continuous voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GeneralMidi {
    Violin         = 40,
    SynthVoice     = 54,
    Lead1Square    = 80,
    Lead2Sawtooth  = 81,
    Lead4Chiff     = 83,
    Lead8BassLead  = 87,
    Pad1NewAge     = 88,
    Pad2Warm       = 89,
    Pad7Halo       = 94,
    Pad8Sweep      = 95,
}

impl GeneralMidi {
    /// Raw MIDI program number (0–127).
    pub fn program(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str {
        match self {
            GeneralMidi::Violin        => "Violin",
            GeneralMidi::SynthVoice    => "Synth Voice",
            GeneralMidi::Lead1Square   => "Lead 1 (square)",
            GeneralMidi::Lead2Sawtooth => "Lead 2 (sawtooth)",
            GeneralMidi::Lead4Chiff    => "Lead 4 (chiff)",
            GeneralMidi::Lead8BassLead => "Lead 8 (bass + lead)",
            GeneralMidi::Pad1NewAge    => "Pad 1 (new age)",
            GeneralMidi::Pad2Warm      => "Pad 2 (warm)",
            GeneralMidi::Pad7Halo      => "Pad 7 (halo)",
            GeneralMidi::Pad8Sweep     => "Pad 8 (sweep)",
        }
    }
}
