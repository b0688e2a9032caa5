// ════════════════════════════════════════════════════════════════════════════
// SessionRecording: timestamped messages → standard MIDI file
// ════════════════════════════════════════════════════════════════════════════

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::message::MidiMessage;

pub const DEFAULT_TPQ:   u16 = 480;
pub const DEFAULT_TEMPO: u32 = 120;

/// Milliseconds → ticks at `tpq` ticks per quarter and `bpm`.
pub fn ms_to_ticks(ms: f64, tpq: u16, bpm: u32) -> u32 {
    // ticks = ms * tpq * bpm / 60_000
    let ticks = ms.max(0.0) * tpq as f64 * bpm.max(1) as f64 / 60_000.0;
    ticks.round().min(u32::MAX as f64) as u32
}

/// Everything sent during a live session, with the time it was sent.
///
/// ```rust
/// use synth_midi::{MidiMessage, SessionRecording};
///
/// let mut rec = SessionRecording::new("session");
/// rec.push(1000.0, MidiMessage::NoteOn { channel: 9, note: 36, velocity: 110 });
/// rec.push(1250.0, MidiMessage::NoteOff { channel: 9, note: 36 });
/// let bytes = rec.to_bytes();
/// assert_eq!(&bytes[0..4], b"MThd");
/// ```
#[derive(Clone, Debug)]
pub struct SessionRecording {
    pub ticks_per_quarter: u16,
    pub tempo_bpm:         u32,
    pub name:              String,
    start_ms:              Option<f64>,
    /// Absolute tick, message; non-decreasing ticks.
    events:                Vec<(u32, MidiMessage)>,
}

impl SessionRecording {
    pub fn new(name: &str) -> Self {
        SessionRecording {
            ticks_per_quarter: DEFAULT_TPQ,
            tempo_bpm:         DEFAULT_TEMPO,
            name:              name.to_string(),
            start_ms:          None,
            events:            Vec::new(),
        }
    }

    /// Record `msg` sent at `now_ms`. The first message defines time zero;
    /// a clock that runs backwards is pinned to the last tick.
    pub fn push(&mut self, now_ms: f64, msg: MidiMessage) {
        let start = *self.start_ms.get_or_insert(now_ms);
        let tick = ms_to_ticks(now_ms - start, self.ticks_per_quarter, self.tempo_bpm);
        let last = self.events.last().map_or(0, |(t, _)| *t);
        self.events.push((tick.max(last), msg));
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Serialise to a standard MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::new();
        // ── Header chunk ──────────────────────────────────────────────────
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        // ── Track chunk ───────────────────────────────────────────────────
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut f = std::fs::File::create(path.as_ref())?;
        f.write_all(&self.to_bytes())?;
        log::info!("wrote {} MIDI events to {}", self.events.len(), path.as_ref().display());
        Ok(())
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();

        // ── Tempo meta-event ──────────────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.push(((micros >> 16) & 0xFF) as u8);
        t.push(((micros >>  8) & 0xFF) as u8);
        t.push(( micros        & 0xFF) as u8);

        // ── Track name meta-event ─────────────────────────────────────────
        let name = self.name.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // ── Channel events ────────────────────────────────────────────────
        let mut prev = 0u32;
        for (tick, msg) in &self.events {
            write_vlq(&mut t, tick - prev);
            msg.encode(&mut t);
            prev = *tick;
        }

        // ── End of Track ──────────────────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

/// Write a MIDI variable-length quantity (VLQ).
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = 4;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── VLQ encoding ─────────────────────────────────────────────────────
    #[test]
    fn vlq_single_byte() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x40);
        assert_eq!(b, [0x40]);
    }

    #[test]
    fn vlq_two_bytes() {
        let mut b = Vec::new();
        write_vlq(&mut b, 128);
        assert_eq!(b, [0x81, 0x00]);
    }

    #[test]
    fn vlq_largest_two_byte_value() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x3FFF);
        assert_eq!(b, [0xFF, 0x7F]);
    }

    #[test]
    fn vlq_full_width() {
        let mut b = Vec::new();
        write_vlq(&mut b, u32::MAX);
        assert_eq!(b, [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    // ── timing ───────────────────────────────────────────────────────────
    #[test]
    fn half_second_is_a_quarter_at_120bpm() {
        assert_eq!(ms_to_ticks(500.0, 480, 120), 480);
        assert_eq!(ms_to_ticks(-5.0, 480, 120), 0);
    }

    // ── file structure ───────────────────────────────────────────────────
    fn two_hits() -> SessionRecording {
        let mut rec = SessionRecording::new("t");
        rec.push(10_000.0, MidiMessage::NoteOn { channel: 9, note: 36, velocity: 100 });
        rec.push(10_500.0, MidiMessage::NoteOff { channel: 9, note: 36 });
        rec
    }

    #[test]
    fn header_is_format_0() {
        let bytes = two_hits().to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &[0, 0]);
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn events_use_delta_times() {
        let bytes = two_hits().to_bytes();
        // tempo (7) + name (3 + 1 + 1) after the 22-byte header
        let events = &bytes[22 + 7 + 5..];
        assert_eq!(&events[..4], &[0x00, 0x99, 36, 100]);
        // 480 ticks = 0x83 0x60
        assert_eq!(&events[4..9], &[0x83, 0x60, 0x89, 36, 0]);
        assert_eq!(&events[9..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn backwards_clock_is_pinned() {
        let mut rec = two_hits();
        rec.push(9_000.0, MidiMessage::NoteOn { channel: 9, note: 38, velocity: 90 });
        assert_eq!(rec.len(), 3);
        let bytes = rec.to_bytes();
        let tail = &bytes[bytes.len() - 8..];
        assert_eq!(&tail[..4], &[0x00, 0x99, 38, 90]);
    }
}
