use thiserror::Error;

pub type Result<T> = std::result::Result<T, TermsError>;

#[derive(Error, Debug)]
pub enum TermsError {
    #[error("Invalid trigger pattern '{pattern}' for term '{id}': {source}")]
    InvalidPattern {
        id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Trigger pattern '{pattern}' for term '{id}' matches the empty string")]
    EmptyPattern { id: String, pattern: String },

    #[error("Document error: {0}")]
    Document(#[from] refdoc_document::DocumentError),
}
