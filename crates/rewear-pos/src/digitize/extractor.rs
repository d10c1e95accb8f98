use super::domain::{ExtractedReceipt, ReceiptImage};

/// Reads customer name, amount, and date off a receipt photo.
pub trait ReceiptExtractor: Send + Sync {
    fn extract(&self, image: &ReceiptImage) -> Result<ExtractedReceipt, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("receipt extraction unavailable: {0}")]
    Unavailable(String),
    #[error("receipt could not be read: {0}")]
    Failed(String),
}

/// Extractor for deployments without a vision service; staff type the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledExtractor;

impl ReceiptExtractor for DisabledExtractor {
    fn extract(&self, _image: &ReceiptImage) -> Result<ExtractedReceipt, ExtractionError> {
        Err(ExtractionError::Unavailable(
            "no vision service configured".to_string(),
        ))
    }
}
