//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the raster size for a downscale into a bounding box.
///
/// The dominant edge decides which bound applies: landscape images
/// (`width > height`) are checked against `max_width`, portrait and square
/// images against `max_height`. When that edge exceeds its bound both
/// dimensions shrink proportionally so the edge lands exactly on the bound.
/// Images already inside the bound keep their size; nothing is upscaled.
///
/// Fractional results are truncated, and each edge is kept at least 1px.
///
/// # Examples
/// ```
/// # use boletim::imaging::calculate_downscale_dimensions;
/// // 1600x800 landscape into 800x600 → width bound hit first
/// assert_eq!(calculate_downscale_dimensions((1600, 800), (800, 600)), (800, 400));
///
/// // Already small enough → unchanged
/// assert_eq!(calculate_downscale_dimensions((640, 480), (800, 600)), (640, 480));
/// ```
pub fn calculate_downscale_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    let (w, h) = if src_w > src_h {
        if src_w > max_w {
            let h = src_h as f64 * max_w as f64 / src_w as f64;
            (max_w, h as u32)
        } else {
            (src_w, src_h)
        }
    } else if src_h > max_h {
        let w = src_w as f64 * max_h as f64 / src_h as f64;
        (w as u32, max_h)
    } else {
        (src_w, src_h)
    };

    (w.max(1), h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_over_width_bound() {
        assert_eq!(
            calculate_downscale_dimensions((1600, 800), (800, 600)),
            (800, 400)
        );
    }

    #[test]
    fn portrait_over_height_bound() {
        // 600x1200 → height bound 600, width = 600 * 600/1200 = 300
        assert_eq!(
            calculate_downscale_dimensions((600, 1200), (800, 600)),
            (300, 600)
        );
    }

    #[test]
    fn square_uses_height_bound() {
        assert_eq!(
            calculate_downscale_dimensions((1000, 1000), (800, 600)),
            (600, 600)
        );
    }

    #[test]
    fn inside_bounds_is_unchanged() {
        assert_eq!(
            calculate_downscale_dimensions((800, 600), (800, 600)),
            (800, 600)
        );
        assert_eq!(
            calculate_downscale_dimensions((20, 10), (800, 600)),
            (20, 10)
        );
    }

    #[test]
    fn landscape_only_checks_width() {
        // 900x700 is taller than the 600 height bound but landscape,
        // so only the width bound applies: 900 → 800, 700 → 622
        assert_eq!(
            calculate_downscale_dimensions((900, 700), (800, 600)),
            (800, 622)
        );
    }

    #[test]
    fn fractional_heights_truncate() {
        // 1000x333 → 800 x 266.4
        assert_eq!(
            calculate_downscale_dimensions((1000, 333), (800, 600)),
            (800, 266)
        );
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        assert_eq!(
            calculate_downscale_dimensions((10_000, 1), (800, 600)),
            (800, 1)
        );
    }
}
