//! Error types for leafmatch.

use crate::template::GeneratorState;
use thiserror::Error;

/// Result alias for leafmatch operations.
pub type LeafMatchResult<T> = std::result::Result<T, LeafMatchError>;

/// Errors that can occur while preparing plants, generating templates or
/// scoring them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LeafMatchError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A configuration value is out of its accepted range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Width or height is zero or overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer cannot hold the requested view.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A sub-view does not fit inside its parent.
    #[error("roi {width}x{height} at ({x}, {y}) outside {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two images that must share a size do not.
    #[error("size mismatch: expected {expected:?}, got {got:?}")]
    SizeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// The file does not exist.
    #[error("file missing: {path}")]
    FileMissing { path: String },
    /// The file exists but could not be read or decoded.
    #[error("failed to read image {path}: {reason}")]
    ImageIo { path: String, reason: String },
    /// The masked segmentation image has no foreground pixel.
    #[error("plant region is empty after masking")]
    EmptyPlant,
    /// The silhouette produced no outer contour.
    #[error("shape silhouette has no outer contour")]
    NoContour,
    /// The silhouette produced more than one outer contour.
    #[error("shape silhouette is ambiguous: {count} outer contours")]
    AmbiguousShape { count: usize },
    /// The requested template size is outside the supported range.
    #[error("template size {size} outside [{min}, {max}]")]
    InvalidSize { size: u32, min: u32, max: u32 },
    /// The clamped matching rectangle cannot slide the template.
    #[error(
        "search area {rect_width}x{rect_height} too small for template {tpl_width}x{tpl_height}"
    )]
    SearchAreaTooSmall {
        rect_width: usize,
        rect_height: usize,
        tpl_width: usize,
        tpl_height: usize,
    },
    /// A generator operation was called before its required state.
    #[error("generator not ready: requires {required:?}, currently {actual:?}")]
    NotReady {
        required: GeneratorState,
        actual: GeneratorState,
    },
    /// An index is outside its container.
    #[error("{context} index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
}
