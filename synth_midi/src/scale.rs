// ════════════════════════════════════════════════════════════════════════════
// Scale: pitch sets for theremin quantization
// ════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

/// Named pitch collections, selectable from the settings file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Chromatic,
    Major,
    Minor,
    PentatonicMajor,
    PentatonicMinor,
    Blues,
}

/// A pitch collection, as semitone intervals from the root.
#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    /// Semitone offsets from root, e.g. `[0,2,4,5,7,9,11]` for major.
    pub intervals: Vec<u8>,
    pub name:      &'static str,
}

impl Scale {
    pub fn chromatic() -> Self {
        Scale { intervals: (0..12).collect(), name: "Chromatic" }
    }
    /// Major scale (Ionian): W W H W W W H
    pub fn major() -> Self {
        Scale { intervals: vec![0,2,4,5,7,9,11], name: "Major" }
    }
    /// Natural minor (Aeolian): W H W W H W W
    pub fn minor() -> Self {
        Scale { intervals: vec![0,2,3,5,7,8,10], name: "Minor" }
    }
    pub fn pentatonic_major() -> Self {
        Scale { intervals: vec![0,2,4,7,9], name: "Pentatonic Major" }
    }
    pub fn pentatonic_minor() -> Self {
        Scale { intervals: vec![0,3,5,7,10], name: "Pentatonic Minor" }
    }
    pub fn blues() -> Self {
        Scale { intervals: vec![0,3,5,6,7,10], name: "Blues" }
    }

    pub fn len(&self) -> usize { self.intervals.len() }
    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }

    /// Nearest scale tone to `semitones` above the root, across octaves.
    ///
    /// ```rust
    /// use synth_midi::Scale;
    /// assert_eq!(Scale::major().snap(5.6), 5.0);
    /// assert_eq!(Scale::major().snap(13.2), 14.0);
    /// ```
    pub fn snap(&self, semitones: f32) -> f32 {
        if self.is_empty() {
            return semitones;
        }
        let octave = (semitones / 12.0).floor();
        let within = semitones - octave * 12.0;
        // include the next octave's root so values just below 12 can round up
        let best = self.intervals.iter()
            .map(|&i| i as f32)
            .chain(std::iter::once(12.0))
            .min_by(|a, b| (a - within).abs().total_cmp(&(b - within).abs()))
            .unwrap_or(0.0);
        octave * 12.0 + best
    }
}

impl From<ScaleKind> for Scale {
    fn from(kind: ScaleKind) -> Self {
        match kind {
            ScaleKind::Chromatic       => Scale::chromatic(),
            ScaleKind::Major           => Scale::major(),
            ScaleKind::Minor           => Scale::minor(),
            ScaleKind::PentatonicMajor => Scale::pentatonic_major(),
            ScaleKind::PentatonicMinor => Scale::pentatonic_minor(),
            ScaleKind::Blues           => Scale::blues(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PitchMap: scale degree → MIDI note number
// ════════════════════════════════════════════════════════════════════════════

/// Maps a scale degree to a MIDI note number, wrapping across octaves from
/// a root note.
#[derive(Clone, Debug, PartialEq)]
pub struct PitchMap {
    /// MIDI note number for degree 0.
    pub root:  u8,
    pub scale: Scale,
}

impl PitchMap {
    pub fn new(root: u8, scale: Scale) -> Self {
        PitchMap { root, scale }
    }

    /// The result is clamped to 0–127.
    pub fn note_for(&self, degree: usize) -> u8 {
        let n = self.scale.len().max(1);
        let octave   = degree / n;
        let semitone = self.scale.intervals.get(degree % n).copied().unwrap_or(0) as usize;
        let note     = self.root as usize + octave * 12 + semitone;
        note.min(127) as u8
    }
}
