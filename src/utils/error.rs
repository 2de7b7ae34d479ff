use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormscanError {
    /// Unknown template, malformed region entry or unreadable template source.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The document could not be turned into an image.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Failure reported by the recognition engine, passed through as-is.
    #[error("OCR engine error: {0}")]
    OcrEngine(String),
    #[error("Ground truth error: {0}")]
    GroundTruth(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl FormscanError {
    pub fn config(msg: impl Into<String>) -> Self {
        FormscanError::Configuration(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        FormscanError::Decode(msg.into())
    }

    pub fn ocr(msg: impl Into<String>) -> Self {
        FormscanError::OcrEngine(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_cause() {
        let err = FormscanError::config("Unknown template: invoice");
        assert_eq!(err.to_string(), "Configuration error: Unknown template: invoice");

        let err = FormscanError::ocr("Tesseract init error");
        assert_eq!(err.to_string(), "OCR engine error: Tesseract init error");
    }
}
