use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentError>;

/// Load failures. `Network` and `EmptyContent` are retried and end in a
/// fallback document; `UnknownKey` is returned to the caller as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Network error for {resource}: {message}")]
    Network { resource: String, message: String },

    #[error("Empty content at {resource}")]
    EmptyContent { resource: String },

    #[error("Unknown content key: {0}")]
    UnknownKey(String),
}

impl ContentError {
    pub fn network(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnknownKey(_))
    }
}
