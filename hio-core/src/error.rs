use thiserror::Error;

/// Failures that abandon the current extraction run.
#[derive(Debug, Error)]
pub enum Error {
    /// An expected element, attribute or label is missing from the portal markup.
    #[error("not found: {0}")]
    NotFound(String),

    /// The portal answered with an unexpected status code.
    #[error("HTTP call to {url} failed with status code {status}")]
    Http { url: String, status: u16 },

    /// A date, time or number field could not be parsed.
    #[error("failed to parse {field} from '{value}'")]
    Parse { field: &'static str, value: String },

    /// Connection, timeout or body decoding failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub fn not_found<T: Into<String>>(what: T) -> Self {
        Error::NotFound(what.into())
    }

    pub fn parse<T: Into<String>>(field: &'static str, value: T) -> Self {
        Error::Parse {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
