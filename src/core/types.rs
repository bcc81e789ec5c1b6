//! Core value types shared by stages, recipes and the session.
//!
//! Frames flowing through a pipeline are plain `RgbaImage` buffers. The
//! types here describe what surrounds them: the immutable source a pipeline
//! starts from, the extent every stage must preserve, and the scalar
//! parameter values recipes are tuned with.

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Integral rectangle describing where an image lives.
///
/// Pipelines never move or resize a frame, so in practice the origin is
/// always zero; it is kept so crops can be expressed against padded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Left edge in pixels.
    pub x: i64,
    /// Top edge in pixels.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Create an extent at the given origin.
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Extent of an image, anchored at the origin.
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    /// Geometric center, in pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Whether the extent covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a pixel coordinate lies inside the extent.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i64
            && y < self.y + self.height as i64
    }

    /// Grow the extent by `margin` pixels on every side.
    pub fn outset(&self, margin: u32) -> Self {
        Self::new(
            self.x - margin as i64,
            self.y - margin as i64,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }

    /// Dimensions as a `(width, height)` pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// EXIF orientation of a decoded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// 1: stored upright.
    #[default]
    Up,
    /// 2: mirrored horizontally.
    UpMirrored,
    /// 3: rotated 180 degrees.
    Down,
    /// 4: mirrored vertically.
    DownMirrored,
    /// 5: transposed across the main diagonal.
    LeftMirrored,
    /// 6: needs a 90 degree clockwise rotation.
    Right,
    /// 7: transposed across the anti-diagonal.
    RightMirrored,
    /// 8: needs a 270 degree clockwise rotation.
    Left,
}

impl Orientation {
    /// Map an EXIF orientation tag value. Unknown values are treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::UpMirrored,
            3 => Orientation::Down,
            4 => Orientation::DownMirrored,
            5 => Orientation::LeftMirrored,
            6 => Orientation::Right,
            7 => Orientation::RightMirrored,
            8 => Orientation::Left,
            _ => Orientation::Up,
        }
    }

    /// The EXIF tag value for this orientation.
    pub fn to_exif(self) -> u32 {
        match self {
            Orientation::Up => 1,
            Orientation::UpMirrored => 2,
            Orientation::Down => 3,
            Orientation::DownMirrored => 4,
            Orientation::LeftMirrored => 5,
            Orientation::Right => 6,
            Orientation::RightMirrored => 7,
            Orientation::Left => 8,
        }
    }

    /// Produce the upright image.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Up => image,
            Orientation::UpMirrored => image.fliph(),
            Orientation::Down => image.rotate180(),
            Orientation::DownMirrored => image.flipv(),
            Orientation::LeftMirrored => image.rotate90().fliph(),
            Orientation::Right => image.rotate90(),
            Orientation::RightMirrored => image.rotate90().flipv(),
            Orientation::Left => image.rotate270(),
        }
    }
}

/// Metadata about a source image without the pixel data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Width in pixels, after orientation and downscaling.
    pub width: u32,
    /// Height in pixels, after orientation and downscaling.
    pub height: u32,
    /// Whether the decoded photo carried an alpha channel.
    pub has_alpha: bool,
    /// Container format the photo was decoded from, if known.
    #[serde(skip)]
    pub format: Option<ImageFormat>,
    /// Orientation that was applied during import.
    pub orientation: Orientation,
}

/// An imported photo: decoded, upright, immutable.
///
/// Pixels are shared through an `Arc`, so every clone handed to a background
/// render refers to the same buffer.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Image metadata (dimensions, format, orientation).
    pub metadata: ImageMetadata,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    /// Wrap an RGBA buffer that is already upright. Returns `None` for an
    /// empty buffer.
    pub fn from_rgba(pixels: RgbaImage) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self {
            metadata: ImageMetadata {
                width: pixels.width(),
                height: pixels.height(),
                has_alpha: pixels.pixels().any(|p| p[3] != u8::MAX),
                format: None,
                orientation: Orientation::Up,
            },
            pixels: Arc::new(pixels),
        })
    }

    /// Build from a decoded image, recording where it came from.
    pub fn from_dynamic(
        image: DynamicImage,
        format: Option<ImageFormat>,
        orientation: Orientation,
    ) -> Option<Self> {
        let has_alpha = image.color().has_alpha();
        let pixels = image.to_rgba8();
        let mut source = Self::from_rgba(pixels)?;
        source.metadata.has_alpha = has_alpha;
        source.metadata.format = format;
        source.metadata.orientation = orientation;
        Some(source)
    }

    /// A solid-colour image, mostly useful in tests and previews.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Option<Self> {
        Self::from_rgba(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    /// Borrow the pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Extent of the source, anchored at the origin.
    pub fn extent(&self) -> Extent {
        Extent::new(0, 0, self.metadata.width, self.metadata.height)
    }

    /// Approximate memory footprint in bytes.
    pub fn estimated_memory_size(&self) -> usize {
        self.metadata.width as usize * self.metadata.height as usize * 4
    }
}

/// Scalar parameter values recipes are tuned with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// 64-bit floating point number
    Float(f64),
    /// 64-bit signed integer
    Integer(i64),
    /// Boolean flag
    Boolean(bool),
}

impl Value {
    /// Try to get this value as a float. Integers coerce.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Boolean(_) => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Human-readable type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "Float",
            Value::Integer(_) => "Integer",
            Value::Boolean(_) => "Boolean",
        }
    }

    /// Whether two values have the same kind. Integers may stand in for floats.
    pub fn same_kind(&self, other: &Value) -> bool {
        matches!(
            (self, other),
            (Value::Float(_), Value::Float(_))
                | (Value::Float(_), Value::Integer(_))
                | (Value::Integer(_), Value::Integer(_))
                | (Value::Boolean(_), Value::Boolean(_))
        )
    }

    /// Parse a CLI literal: `true`/`false`, an integer, or a float.
    pub fn parse(text: &str) -> Option<Value> {
        let text = text.trim();
        match text {
            "true" => return Some(Value::Boolean(true)),
            "false" => return Some(Value::Boolean(false)),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_center_and_contains() {
        let extent = Extent::new(0, 0, 10, 4);
        assert_eq!(extent.center(), (5.0, 2.0));
        assert!(extent.contains(9, 3));
        assert!(!extent.contains(10, 3));
        assert!(!extent.contains(-1, 0));
        assert_eq!(extent.outset(2), Extent::new(-2, -2, 14, 8));
    }

    #[test]
    fn test_orientation_round_trip_tags() {
        for tag in 1..=8 {
            assert_eq!(Orientation::from_exif(tag).to_exif(), tag);
        }
        assert_eq!(Orientation::from_exif(42), Orientation::Up);
    }

    #[test]
    fn test_orientation_swaps_dimensions() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 2));
        assert_eq!(Orientation::Right.apply(image.clone()).width(), 2);
        assert_eq!(Orientation::Left.apply(image.clone()).height(), 4);
        assert_eq!(Orientation::Down.apply(image).width(), 4);
    }

    #[test]
    fn test_orientation_right_rotates_clockwise() {
        // 2x2 with red in the top-left corner: a clockwise turn lands it top-right.
        let mut buffer = RgbaImage::new(2, 2);
        buffer.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let upright = Orientation::Right
            .apply(DynamicImage::ImageRgba8(buffer))
            .to_rgba8();
        assert_eq!(upright.get_pixel(1, 0)[0], 255);
        assert_eq!(upright.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_orientation_transpose() {
        let mut buffer = RgbaImage::new(3, 2);
        buffer.put_pixel(2, 0, image::Rgba([0, 255, 0, 255]));
        let upright = Orientation::LeftMirrored
            .apply(DynamicImage::ImageRgba8(buffer))
            .to_rgba8();
        assert_eq!(upright.dimensions(), (2, 3));
        assert_eq!(upright.get_pixel(0, 2)[1], 255);
    }

    #[test]
    fn test_source_image_rejects_empty() {
        assert!(SourceImage::from_rgba(RgbaImage::new(0, 3)).is_none());
        let source = SourceImage::solid(3, 2, [10, 20, 30, 255]).unwrap();
        assert_eq!(source.extent(), Extent::new(0, 0, 3, 2));
        assert!(!source.metadata.has_alpha);
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("true"), Some(Value::Boolean(true)));
        assert_eq!(Value::parse("6"), Some(Value::Integer(6)));
        assert_eq!(Value::parse("0.25"), Some(Value::Float(0.25)));
        assert_eq!(Value::parse("NaN"), None);
        assert_eq!(Value::parse("abc"), None);
    }

    #[test]
    fn test_value_kinds() {
        assert!(Value::Float(1.0).same_kind(&Value::Integer(2)));
        assert!(!Value::Integer(1).same_kind(&Value::Float(2.0)));
        assert_eq!(Value::Integer(3).as_float(), Some(3.0));
    }
}
