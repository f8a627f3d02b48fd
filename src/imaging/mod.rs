//! Image codec: turns user-selected files into inline `data:` strings.
//!
//! | Operation | Function |
//! |---|---|
//! | **Inline as-is** | [`encode_to_inline_image`]: base64 of the untouched bytes |
//! | **Downscale + JPEG** | [`encode_and_downscale`]: fit 800×600 (default), re-encode |
//! | **Upload policy** | [`UploadPolicy::process`]: size ceiling, then one of the above |
//! | **Parse** | [`InlineImage::parse`]: data URI back to mime + bytes |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Validation + encoding, combining calculations and backend

pub mod backend;
mod calculations;
pub mod file;
pub mod inline;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod upload;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_downscale_dimensions;
pub use file::ImageFile;
pub use inline::InlineImage;
pub use operations::{
    CodecError, ValidationError, encode_and_downscale, encode_to_inline_image, plan_downscale,
};
pub use params::{DownscaleParams, Quality, ResizeParams};
pub use rust_backend::RustBackend;
pub use upload::UploadPolicy;
