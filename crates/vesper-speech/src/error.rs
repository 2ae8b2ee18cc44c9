use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid audio payload: {0}")]
    InvalidAudio(String),
}
