//! Continuous synth parameters and the MIDI controllers that carry them.

use crate::error::{MidiError, Result};

/// Where a named parameter lands on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlTarget {
    /// 7-bit continuous controller.
    Cc(u8),
    /// 14-bit pitch bend of the continuous voice.
    PitchBend,
}

/// `(parameter name, target)`. Every value the simulation emits is
/// normalized to `[0, 1]`.
pub const CONTROL_MAP: [(&str, ControlTarget); 5] = [
    ("filter_cutoff",   ControlTarget::Cc(74)),   // brightness
    ("resonance",       ControlTarget::Cc(71)),   // harmonic content
    ("delay_mix",       ControlTarget::Cc(91)),   // effects send
    ("theremin_volume", ControlTarget::Cc(7)),    // channel volume
    ("theremin_pitch",  ControlTarget::PitchBend),
];

pub fn control_target(name: &str) -> Result<ControlTarget> {
    CONTROL_MAP.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, t)| *t)
        .ok_or_else(|| MidiError::UnknownParameter(name.to_string()))
}

/// Registered-parameter sequence setting the pitch-bend range to
/// `semitones`, as `(controller, value)` pairs.
pub fn bend_range_rpn(semitones: u8) -> [(u8, u8); 4] {
    [(101, 0), (100, 0), (6, semitones.min(127)), (38, 0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_parameters() {
        assert_eq!(control_target("filter_cutoff").unwrap(), ControlTarget::Cc(74));
        assert_eq!(control_target("theremin_pitch").unwrap(), ControlTarget::PitchBend);
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let err = control_target("wobble").unwrap_err();
        assert_eq!(err.to_string(), "no controller mapping for parameter 'wobble'");
    }

    #[test]
    fn rpn_sequence() {
        assert_eq!(bend_range_rpn(12), [(101, 0), (100, 0), (6, 12), (38, 0)]);
    }
}
