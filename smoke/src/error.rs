use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webdriver error `{error}`: {message}")]
    WebDriver { error: String, message: String },
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
    #[error("invalid screenshot data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("{url} not ready after {attempts} attempts: {last}")]
    NotReady {
        url: String,
        attempts: u32,
        last: String,
    },
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SmokeError {
    /// WebDriver error code, when the remote end reported one.
    pub fn webdriver_code(&self) -> Option<&str> {
        match self {
            SmokeError::WebDriver { error, .. } => Some(error),
            _ => None,
        }
    }
}
