use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavigatorError>;

#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("Content error: {0}")]
    Content(#[from] refdoc_content::ContentError),

    #[error("Document error: {0}")]
    Document(#[from] refdoc_document::DocumentError),

    #[error("Terms error: {0}")]
    Terms(#[from] refdoc_terms::TermsError),

    #[error("Topic '{0}' is not configured")]
    UnknownTopic(String),
}
