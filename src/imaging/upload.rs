//! Editor upload policy: size ceiling plus the compress-or-keep choice.

use super::backend::ImageBackend;
use super::file::ImageFile;
use super::operations::{
    self, CodecError, ValidationError, encode_and_downscale, encode_to_inline_image,
};
use super::params::{DownscaleParams, Quality};
use crate::config::ImagesConfig;

/// How uploaded images are checked and encoded before storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadPolicy {
    /// Downscale and re-encode as JPEG instead of storing the file as-is.
    pub compress: bool,
    pub downscale: DownscaleParams,
    /// Largest accepted source file, in bytes.
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            compress: true,
            downscale: DownscaleParams::default(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl UploadPolicy {
    pub fn from_config(config: &ImagesConfig) -> Self {
        Self {
            compress: config.compress,
            downscale: DownscaleParams {
                max_width: config.max_width,
                max_height: config.max_height,
                quality: Quality::from_fraction(config.quality),
            },
            max_bytes: config.max_upload_bytes,
        }
    }

    /// Check a file against the policy without reading its contents.
    pub fn validate<'a>(
        &self,
        file: Option<&'a ImageFile>,
    ) -> Result<&'a ImageFile, CodecError> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        operations::ensure_image(file)?;
        let size = file.size()?;
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            }
            .into());
        }
        Ok(file)
    }

    /// Validate and encode a file into the inline string stored in `imagem`.
    pub fn process(
        &self,
        backend: &impl ImageBackend,
        file: Option<&ImageFile>,
    ) -> Result<String, CodecError> {
        let file = self.validate(file)?;
        let inline = if self.compress {
            encode_and_downscale(backend, file, &self.downscale)?
        } else {
            encode_to_inline_image(file)?
        };
        tracing::debug!(
            name = file.name(),
            chars = inline.len(),
            compressed = self.compress,
            "image processed"
        );
        Ok(inline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn gif(len: usize) -> ImageFile {
        ImageFile::from_bytes("anim.gif", "image/gif", vec![0u8; len])
    }

    #[test]
    fn missing_file_is_validation_error() {
        let err = UploadPolicy::default()
            .process(&MockBackend::new(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Validation(ValidationError::MissingFile)
        ));
    }

    #[test]
    fn oversized_file_rejected_before_encoding() {
        let backend = MockBackend::new();
        let policy = UploadPolicy {
            max_bytes: 10,
            ..UploadPolicy::default()
        };
        let err = policy.process(&backend, Some(&gif(11))).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Validation(ValidationError::TooLarge { size: 11, max: 10 })
        ));
        assert!(backend.recorded().is_empty());
    }

    #[test]
    fn exact_limit_is_accepted() {
        let policy = UploadPolicy {
            compress: false,
            max_bytes: 3,
            ..UploadPolicy::default()
        };
        let uri = policy.process(&MockBackend::new(), Some(&gif(3))).unwrap();
        assert_eq!(uri, "data:image/gif;base64,AAAA");
    }

    #[test]
    fn compress_routes_through_backend() {
        let backend = MockBackend::returning(vec![Dimensions {
            width: 1200,
            height: 1600,
        }]);
        let uri = UploadPolicy::default()
            .process(&backend, Some(&gif(4)))
            .unwrap();

        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(matches!(
            backend.recorded()[1],
            RecordedOp::Downscale {
                width: 450,
                height: 600,
                quality: 80,
                ..
            }
        ));
    }

    #[test]
    fn from_config_maps_fraction_quality() {
        let config = ImagesConfig {
            quality: 0.65,
            max_width: 1024,
            ..ImagesConfig::default()
        };
        let policy = UploadPolicy::from_config(&config);
        assert_eq!(policy.downscale.quality.value(), 65);
        assert_eq!(policy.downscale.max_width, 1024);
        assert_eq!(policy.max_bytes, config.max_upload_bytes);
    }
}
