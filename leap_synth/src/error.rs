use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop the application. Degraded sensor input never
/// ends up here; it is handled frame by frame.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("window error: {0}")]
    Window(String),

    #[error("cannot read settings file {path}: {source}")]
    ConfigRead {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    ConfigParse {
        path:   PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot serialise settings: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("bad control command '{input}': {reason}")]
    Command {
        input:  String,
        reason: String,
    },

    #[error(transparent)]
    Midi(#[from] synth_midi::MidiError),

    #[error("hand sensor error: {0}")]
    Sensor(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
