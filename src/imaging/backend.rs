//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two pixel operations the codec
//! needs: identify (decode just enough to learn the dimensions) and
//! downscale (decode, rasterize at an exact size, re-encode as JPEG).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests substitute the `MockBackend` below so codec logic can be
//! checked without encoding real pixels.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations work on in-memory encoded bytes; reading the file is the
/// caller's job so validation can happen before any I/O.
pub trait ImageBackend: Sync {
    /// Get image dimensions from encoded bytes.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Rasterize at exactly `params.width` x `params.height` and return
    /// JPEG-encoded bytes.
    fn downscale(&self, bytes: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use std::sync::Mutex;

    /// Stand-in backend: hands out queued dimensions and logs each call.
    #[derive(Default)]
    pub struct MockBackend {
        pub queued_dimensions: Mutex<Vec<Dimensions>>,
        pub calls: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        Downscale {
            input_len: usize,
            width: u32,
            height: u32,
            quality: u8,
        },
    }

    /// Bytes the mock returns from `downscale`.
    pub const MOCK_JPEG: &[u8] = b"\xFF\xD8mock-jpeg\xFF\xD9";

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn returning(dims: Vec<Dimensions>) -> Self {
            Self {
                queued_dimensions: Mutex::new(dims),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn recorded(&self) -> Vec<RecordedOp> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(bytes.len()));

            self.queued_dimensions
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("no dimensions queued".to_string()))
        }

        fn downscale(&self, bytes: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
            self.calls.lock().unwrap().push(RecordedOp::Downscale {
                input_len: bytes.len(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(MOCK_JPEG.to_vec())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::returning(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"abc").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.recorded();
        assert_eq!(ops, vec![RecordedOp::Identify(3)]);
    }

    #[test]
    fn mock_identify_without_dimensions_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(b"abc").is_err());
    }

    #[test]
    fn mock_records_downscale() {
        let backend = MockBackend::new();

        let out = backend
            .downscale(
                b"source",
                &ResizeParams {
                    width: 400,
                    height: 300,
                    quality: Quality::new(70),
                },
            )
            .unwrap();

        assert_eq!(out, MOCK_JPEG);
        assert!(matches!(
            &backend.recorded()[0],
            RecordedOp::Downscale {
                input_len: 6,
                width: 400,
                height: 300,
                quality: 70,
            }
        ));
    }
}
