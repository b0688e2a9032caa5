//! Channel voice messages and their wire encoding.

/// Centre of the 14-bit pitch-bend range.
pub const PITCH_BEND_CENTER: u16 = 0x2000;

/// A channel voice message. Channels are 0–15; data bytes are masked to
/// 7 bits on encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn        { channel: u8, note: u8, velocity: u8 },
    NoteOff       { channel: u8, note: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// 14-bit value, `PITCH_BEND_CENTER` is no bend.
    PitchBend     { channel: u8, value: u16 },
}

impl MidiMessage {
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => channel & 0x0F,
        }
    }

    /// Append the wire bytes (status + data) to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let ch = self.channel();
        match *self {
            MidiMessage::NoteOn { note, velocity, .. } => {
                buf.extend_from_slice(&[0x90 | ch, note & 0x7F, velocity & 0x7F]);
            }
            MidiMessage::NoteOff { note, .. } => {
                buf.extend_from_slice(&[0x80 | ch, note & 0x7F, 0x00]);
            }
            MidiMessage::ControlChange { controller, value, .. } => {
                buf.extend_from_slice(&[0xB0 | ch, controller & 0x7F, value & 0x7F]);
            }
            MidiMessage::ProgramChange { program, .. } => {
                buf.extend_from_slice(&[0xC0 | ch, program & 0x7F]);
            }
            MidiMessage::PitchBend { value, .. } => {
                let v = value.min(0x3FFF);
                buf.extend_from_slice(&[0xE0 | ch, (v & 0x7F) as u8, (v >> 7) as u8]);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(3);
        self.encode(&mut buf);
        buf
    }
}

/// Map `[0, 1]` onto a 7-bit controller value.
pub fn unit_to_cc(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// Map `[-1, 1]` onto the 14-bit pitch-bend range.
pub fn bipolar_to_bend(x: f32) -> u16 {
    let v = PITCH_BEND_CENTER as f32 + x.clamp(-1.0, 1.0) * 8191.0;
    (v.round() as u16).min(0x3FFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_on_bytes() {
        let m = MidiMessage::NoteOn { channel: 9, note: 36, velocity: 100 };
        assert_eq!(m.to_bytes(), vec![0x99, 36, 100]);
    }

    #[test]
    fn control_change_masks_data() {
        let m = MidiMessage::ControlChange { channel: 0x12, controller: 74, value: 0xFF };
        assert_eq!(m.to_bytes(), vec![0xB2, 74, 0x7F]);
    }

    #[test]
    fn pitch_bend_is_lsb_first() {
        let m = MidiMessage::PitchBend { channel: 1, value: PITCH_BEND_CENTER };
        assert_eq!(m.to_bytes(), vec![0xE1, 0x00, 0x40]);
        let top = MidiMessage::PitchBend { channel: 1, value: 0x3FFF };
        assert_eq!(top.to_bytes(), vec![0xE1, 0x7F, 0x7F]);
    }

    #[test]
    fn scalings() {
        assert_eq!(unit_to_cc(0.0), 0);
        assert_eq!(unit_to_cc(1.0), 127);
        assert_eq!(unit_to_cc(3.0), 127);
        assert_eq!(bipolar_to_bend(0.0), PITCH_BEND_CENTER);
        assert_eq!(bipolar_to_bend(-1.0), 1);
        assert_eq!(bipolar_to_bend(1.0), 0x3FFF);
    }
}
