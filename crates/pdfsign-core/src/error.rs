use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: i64, total: u32 },

    #[error("Invalid signature rectangle: {0}")]
    InvalidRect(String),

    #[error("Signature rectangle does not intersect page {0}")]
    OutsidePage(u32),

    #[error("Unsupported signature image: {0}")]
    UnsupportedImage(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl SignError {
    /// True when the failure was caused by the uploaded files or parameters
    /// rather than by this process.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SignError::OperationError(_))
    }
}
