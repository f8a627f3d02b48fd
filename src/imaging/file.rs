//! User-selected image files.
//!
//! An [`ImageFile`] carries a declared media type separately from its bytes.
//! For files on disk the media type comes from the extension and the bytes
//! are only read on demand, so type validation never touches the disk.

use std::io;
use std::path::{Path, PathBuf};

/// Extension → media type table for the formats editors upload.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
];

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type for a path, judged by extension only.
pub fn media_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| {
            MEDIA_TYPES
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

#[derive(Debug, Clone)]
enum Contents {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// An image file as handed over by the user.
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    media_type: String,
    contents: Contents,
}

impl ImageFile {
    /// Wrap bytes already in memory (e.g. a form upload).
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            contents: Contents::Memory(bytes),
        }
    }

    /// Reference a file on disk without reading it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            media_type: media_type_for(&path).to_string(),
            contents: Contents::Disk(path),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Size in bytes (a metadata lookup for files on disk).
    pub fn size(&self) -> io::Result<u64> {
        match &self.contents {
            Contents::Memory(bytes) => Ok(bytes.len() as u64),
            Contents::Disk(path) => Ok(std::fs::metadata(path)?.len()),
        }
    }

    /// Load the full contents.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        match &self.contents {
            Contents::Memory(bytes) => Ok(bytes.clone()),
            Contents::Disk(path) => std::fs::read(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn media_type_by_extension() {
        assert_eq!(media_type_for(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("x.png")), "image/png");
        assert_eq!(media_type_for(Path::new("x.svg")), "image/svg+xml");
        assert_eq!(media_type_for(Path::new("notes.txt")), FALLBACK_MEDIA_TYPE);
        assert_eq!(media_type_for(Path::new("no-extension")), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn open_does_not_touch_disk() {
        let file = ImageFile::open("/nonexistent/dir/cover.webp");
        assert_eq!(file.name(), "cover.webp");
        assert_eq!(file.media_type(), "image/webp");
        assert!(file.is_image());
        assert!(file.read().is_err());
    }

    #[test]
    fn reads_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let file = ImageFile::open(&path);
        assert_eq!(file.size().unwrap(), 6);
        assert_eq!(file.read().unwrap(), b"GIF89a");
    }

    #[test]
    fn memory_file_reports_declared_type() {
        let file = ImageFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec());
        assert!(!file.is_image());
        assert_eq!(file.size().unwrap(), 5);
    }
}
