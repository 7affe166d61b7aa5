use thiserror::Error;

/// Errors raised by the annotation canvas and its raster codecs
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The bytes are not an image any enabled codec understands
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Writing the surface to an image format failed
    #[error("failed to encode canvas: {0}")]
    Encode(#[source] image::ImageError),

    /// A raster could not be allocated at the requested size
    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

pub type CanvasResult<T> = Result<T, CanvasError>;
