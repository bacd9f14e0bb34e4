use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("could not start the workflow: {0}")]
    KickoffFailed(String),
    #[error("workflow run raised an exception in event `{event_id}`: {message}")]
    RunException { event_id: String, message: String },
    #[error("a run is already in progress for trace `{0}`")]
    RunInProgress(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode payload: {0}")]
    Decode(String),
    #[error("invalid workflow topology: {0}")]
    InvalidTopology(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for StudioError {
    fn from(error: serde_json::Error) -> Self {
        StudioError::Decode(error.to_string())
    }
}
