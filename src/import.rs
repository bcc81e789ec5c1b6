//! Turning picked photos into source images.
//!
//! Each photo is decoded, turned upright according to its EXIF orientation
//! and downscaled with Lanczos3 to the working width. Failures are per photo:
//! the caller decides whether the rest of the batch continues.

use crate::core::error::{ImportError, ImportResult};
use crate::core::types::{Orientation, SourceImage};
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Working width photos are downscaled to.
pub const DEFAULT_TARGET_WIDTH: u32 = 2048;

/// Most photos a single import may carry.
pub const MAX_SELECTION: usize = 10;

/// File extensions picked up when a directory is imported.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"];

/// One photo handed over by the picker.
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// A file on disk.
    Path(PathBuf),
    /// Encoded bytes already in memory.
    Bytes {
        /// Name used in notices and logs.
        label: String,
        /// Encoded image data.
        data: Arc<[u8]>,
    },
}

impl ImportSource {
    /// In-memory source.
    pub fn bytes(label: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        ImportSource::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    /// Name used in notices and logs.
    pub fn label(&self) -> String {
        match self {
            ImportSource::Path(path) => path.display().to_string(),
            ImportSource::Bytes { label, .. } => label.clone(),
        }
    }

    /// Read and decode this photo.
    pub fn load(&self, target_width: u32) -> ImportResult<SourceImage> {
        match self {
            ImportSource::Path(path) => load_path(path, target_width),
            ImportSource::Bytes { label, data } => decode_labeled(label, data, target_width),
        }
    }
}

impl From<PathBuf> for ImportSource {
    fn from(path: PathBuf) -> Self {
        ImportSource::Path(path)
    }
}

/// An ordered set of photos to import together.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    /// Photos in the order they were picked.
    pub sources: Vec<ImportSource>,
}

impl ImportBatch {
    /// Create a batch.
    pub fn new(sources: Vec<ImportSource>) -> Self {
        Self { sources }
    }

    /// A batch of files.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::new(paths.into_iter().map(ImportSource::Path).collect())
    }

    /// Drop photos beyond `max`. Returns how many were dropped.
    pub fn truncate(&mut self, max: usize) -> usize {
        let dropped = self.sources.len().saturating_sub(max);
        if dropped > 0 {
            log::warn!(
                "Selection of {} photos exceeds the limit of {}; dropping {}",
                self.sources.len(),
                max,
                dropped
            );
            self.sources.truncate(max);
        }
        dropped
    }

    /// Number of photos.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Decode encoded bytes into an upright, downscaled source image.
pub fn decode(bytes: &[u8], target_width: u32) -> ImportResult<SourceImage> {
    decode_labeled("image", bytes, target_width)
}

fn decode_labeled(label: &str, bytes: &[u8], target_width: u32) -> ImportResult<SourceImage> {
    let format = image::guess_format(bytes).ok();
    let image = image::load_from_memory(bytes).map_err(|source| ImportError::Decode {
        label: label.to_string(),
        source,
    })?;

    let orientation = read_orientation(bytes);
    let upright = orientation.apply(image);
    let scaled = downscale(upright, target_width);

    log::debug!(
        "Decoded {} ({:?}, {:?}) to {}x{}",
        label,
        format,
        orientation,
        scaled.width(),
        scaled.height()
    );

    SourceImage::from_dynamic(scaled, format, orientation).ok_or_else(|| ImportError::EmptyImage {
        label: label.to_string(),
    })
}

/// Read a file and decode it.
pub fn load_path(path: &Path, target_width: u32) -> ImportResult<SourceImage> {
    let label = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| ImportError::Read {
        label: label.clone(),
        source,
    })?;
    decode_labeled(&label, &bytes, target_width)
}

/// EXIF orientation of an encoded image. Missing or unreadable EXIF means upright.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

/// Shrink to `target_width` keeping the aspect ratio. Narrower images pass through.
pub fn downscale(image: DynamicImage, target_width: u32) -> DynamicImage {
    if target_width == 0 || image.width() <= target_width {
        return image;
    }
    let scale = target_width as f64 / image.width() as f64;
    let height = ((image.height() as f64 * scale).round() as u32).max(1);
    image.resize_exact(target_width, height, FilterType::Lanczos3)
}

/// Expand the given paths into image files.
///
/// Directories are walked recursively and only files with an image extension
/// are kept, sorted by name. Explicit file paths are kept as given so that a
/// bad file surfaces as a per-photo failure.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_image_extension(e.path()))
                .map(|e| e.into_path())
                .collect();
            log::debug!("Found {} images under {}", found.len(), path.display());
            files.append(&mut found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Check if a path has a supported image extension.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
