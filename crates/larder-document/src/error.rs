//! Typed errors for document rendering.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF objects could not be encoded or serialized.
    #[error("pdf encoding failed: {0}")]
    Pdf(String),

    /// The output sink rejected a write.
    #[error("document sink failed: {0}")]
    Sink(#[from] std::io::Error),

    /// The rendering task stopped before finishing the document.
    #[error("rendering aborted: {0}")]
    Aborted(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        RenderError::Pdf(e.to_string())
    }
}
