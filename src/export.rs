//! Handing final bitmaps off to disk.

use crate::core::error::ExportError;
use crate::session::{PhotoItem, Session};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless, keeps alpha.
    Png,
    /// Lossy, alpha is dropped.
    Jpeg {
        /// Encoder quality, 1 to 100.
        quality: u8,
    },
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Png
    }
}

impl ExportFormat {
    /// Quality used when none is given.
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// Parse a format name such as `png`, `jpg` or `jpeg`.
    pub fn parse(name: &str) -> ExportResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg {
                quality: Self::DEFAULT_JPEG_QUALITY,
            }),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&ext)
    }

    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Write one bitmap.
pub fn export(bitmap: &RgbaImage, path: &Path, format: ExportFormat) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let write_error = |source| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    match format {
        ExportFormat::Png => bitmap
            .save_with_format(path, ImageFormat::Png)
            .map_err(write_error)?,
        ExportFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
            let writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).map_err(write_error)?;
        }
    }
    log::info!(
        "Exported {}x{} to {}",
        bitmap.width(),
        bitmap.height(),
        path.display()
    );
    Ok(())
}

/// Hand off the current photo's final bitmap.
pub fn export_current(session: &Session, path: &Path, format: ExportFormat) -> ExportResult<()> {
    let bitmap = session
        .current_bitmap()
        .ok_or(ExportError::NothingRendered)?;
    export(bitmap, path, format)
}

/// File name for the item at `index`: `<index>-<recipe>.<ext>`, 1-based.
pub fn export_name(index: usize, item: &PhotoItem, format: ExportFormat) -> String {
    format!("{:02}-{}.{}", index + 1, item.applied, format.extension())
}

/// Write every rendered item into `dir` in parallel. Items without a render are skipped.
pub fn export_all(items: &[PhotoItem], dir: &Path, format: ExportFormat) -> ExportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    items
        .par_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let bitmap = item.processed.as_ref()?;
            let path = dir.join(export_name(index, item, format));
            Some(export(bitmap, &path, format).map(|()| path))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SourceImage;
    use image::Rgba;

    fn item(processed: bool) -> PhotoItem {
        let source = SourceImage::solid(5, 3, [10, 20, 30, 128]).unwrap();
        let bitmap = processed.then(|| RgbaImage::from_pixel(5, 3, Rgba([200, 100, 50, 128])));
        PhotoItem::new(source, "caramel_fade").with_processed(bitmap)
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::parse("PNG").unwrap(), ExportFormat::Png);
        assert_eq!(
            ExportFormat::from_path(Path::new("out.jpeg")).unwrap(),
            ExportFormat::Jpeg { quality: 90 }
        );
        assert!(matches!(
            ExportFormat::parse("bmp"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("a.png");
        let bitmap = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 77]));
        export(&bitmap, &path, ExportFormat::Png).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back, bitmap);
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bitmap = RgbaImage::from_pixel(8, 8, Rgba([120, 120, 120, 10]));
        export(&bitmap, &path, ExportFormat::Jpeg { quality: 95 }).unwrap();
        let back = image::open(&path).unwrap();
        assert!(!back.color().has_alpha());
        assert_eq!((back.width(), back.height()), (8, 8));
    }

    #[test]
    fn test_export_current_needs_a_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current.png");
        let session = Session::new();
        assert!(matches!(
            export_current(&session, &path, ExportFormat::Png),
            Err(ExportError::NothingRendered)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_all_skips_unrendered() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![item(true), item(false), item(true)];
        let mut written = export_all(&items, dir.path(), ExportFormat::Png).unwrap();
        written.sort();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01-caramel_fade.png", "03-caramel_fade.png"]);
    }
}
