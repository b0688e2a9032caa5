use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("no drum voice for sound id '{0}'")]
    UnknownSound(String),

    #[error("no controller mapping for parameter '{0}'")]
    UnknownParameter(String),

    #[error("MIDI output unavailable: {0}")]
    PortUnavailable(String),

    #[error("MIDI send failed: {0}")]
    Send(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MidiError>;
