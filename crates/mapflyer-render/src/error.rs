use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to encode QR code: {0}")]
    Qr(String),

    #[error("PNG error: {0}")]
    Png(String),

    #[error("Unusable image: {0}")]
    Image(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
