//! Error types for the render pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur while generating a QR image.
///
/// None of these are retried. The caller (or the person at the prompt) fixes
/// the input and runs again.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Empty data, out-of-range option, missing logo, unsupported extension.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An SVG logo was requested on PNG output but nothing can rasterize it.
    #[error(
        "SVG logo {} cannot be placed on PNG output: no SVG rasterizer is available.\n\
         Fix options:\n \
         - Export the QR as SVG (vector) instead of PNG, or\n \
         - Use a PNG/JPG logo, or\n \
         - Rebuild with the `svg-raster` feature enabled.",
        .logo.display()
    )]
    MissingRasterizer { logo: PathBuf },

    /// The output location could not be created or written.
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data does not fit in any QR version at the requested level.
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    /// Logo decoding or PNG encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An SVG logo could not be parsed or rasterized.
    #[error("SVG logo error: {0}")]
    Svg(String),
}

impl RenderError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RenderError::Filesystem { path: path.into(), source }
    }
}
