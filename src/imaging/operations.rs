//! High-level image operations.
//!
//! These functions validate the user's file, read it, and hand pixel work to
//! a backend. They return `Err` on bad input: the codec runs inside a
//! user-initiated action whose caller reports the failure next to the form.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_downscale_dimensions;
use super::file::ImageFile;
use super::inline::InlineImage;
use super::params::{DownscaleParams, ResizeParams};
use thiserror::Error;

/// Input rejected before any I/O.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file provided")]
    MissingFile,
    #[error("file must be an image (got {media_type})")]
    NotAnImage { media_type: String },
    #[error("file too large: {size} bytes (max {} MB)", megabytes(.max))]
    TooLarge { size: u64, max: u64 },
}

fn megabytes(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / 1024.0 / 1024.0)
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to process image: {0}")]
    Imaging(#[from] BackendError),
}

impl CodecError {
    /// True for input problems the user can fix by picking another file.
    pub fn is_validation(&self) -> bool {
        matches!(self, CodecError::Validation(_))
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Reject files whose declared media type is not `image/*`.
pub fn ensure_image(file: &ImageFile) -> std::result::Result<(), ValidationError> {
    if file.is_image() {
        Ok(())
    } else {
        Err(ValidationError::NotAnImage {
            media_type: file.media_type().to_string(),
        })
    }
}

/// Encode a file unchanged as `data:<mime>;base64,<payload>`.
///
/// The type check happens before the file is read.
pub fn encode_to_inline_image(file: &ImageFile) -> Result<String> {
    ensure_image(file)?;
    let bytes = file.read()?;
    tracing::debug!(name = file.name(), bytes = bytes.len(), "inline-encoding image");
    Ok(InlineImage::new(file.media_type(), bytes).to_data_uri())
}

/// Plan the backend resize for a source of the given size.
pub fn plan_downscale(source: (u32, u32), params: &DownscaleParams) -> ResizeParams {
    let (width, height) =
        calculate_downscale_dimensions(source, (params.max_width, params.max_height));
    ResizeParams {
        width,
        height,
        quality: params.quality,
    }
}

/// Fit a file inside `params`' bounding box and re-encode it as JPEG.
///
/// The output is always tagged `image/jpeg`, whatever the input format.
/// Images already inside the box are re-encoded at their own size.
pub fn encode_and_downscale(
    backend: &impl ImageBackend,
    file: &ImageFile,
    params: &DownscaleParams,
) -> Result<String> {
    ensure_image(file)?;
    let bytes = file.read()?;
    let dims = backend.identify(&bytes)?;
    let resize = plan_downscale((dims.width, dims.height), params);
    tracing::debug!(
        name = file.name(),
        from = %format!("{}x{}", dims.width, dims.height),
        to = %format!("{}x{}", resize.width, resize.height),
        quality = resize.quality.value(),
        "downscaling image"
    );
    let jpeg = backend.downscale(&bytes, &resize)?;
    Ok(InlineImage::new("image/jpeg", jpeg).to_data_uri())
}
