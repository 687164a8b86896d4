use thiserror::Error;

/// Errors from loading a saved engine state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Malformed state document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported state version: {0}")]
    UnsupportedVersion(u32),

    #[error("Truncated version {version} state: expected {expected} values, found {found}")]
    Truncated {
        version: u32,
        expected: usize,
        found: usize,
    },
}

/// Errors from reading an engine configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from opening the audio device.
#[cfg(feature = "device-output")]
#[derive(Error, Debug)]
pub enum AudioOutputError {
    #[error("No audio output device available")]
    NoDevice,

    #[error("Failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

pub type StateResult<T> = Result<T, StateError>;
