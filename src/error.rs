use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("Generation service returned no text")]
    EmptyResponse,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StoryError>;
