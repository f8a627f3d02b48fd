//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the high-level [`operations`](super::operations) (which validate input and
//! build inline strings) and the [`backend`](super::backend) (which does the
//! pixel work), so a mock backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy JPEG quality as a percentage (1–100, default 80).
//!   Built from the `(0, 1]` fraction users configure.
//! - [`DownscaleParams`]: Bounding box plus quality for `encode_and_downscale`.
//! - [`ResizeParams`]: Exact output dimensions handed to the backend.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Build from a `(0, 1]` fraction, e.g. `0.8` → 80.
    ///
    /// Out-of-range and non-finite values are clamped into 1..=100.
    pub fn from_fraction(fraction: f32) -> Self {
        if !fraction.is_finite() {
            return Self::default();
        }
        Self::new((fraction * 100.0).round().max(0.0) as u32)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Bounds and quality for a downscale + re-encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownscaleParams {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl Default for DownscaleParams {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            quality: Quality::default(),
        }
    }
}

/// Exact raster size and encoding quality for a single backend resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
