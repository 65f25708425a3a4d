use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {entity} at {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog source is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed input whose shape is not a catalog.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("taxonomy error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Whether the failure was a missing source rather than bad content.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
