//! Image loading via the `image` crate.
//!
//! [`ImageSource`] is the byte-buffer boundary of the crate: it turns a path
//! into a decoded buffer and reports a missing file separately from a file
//! that cannot be read or decoded.

use crate::image::{ImageView, OwnedImage};
use crate::util::{LeafMatchError, LeafMatchResult};
use image::{DynamicImage, GrayImage, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of decoded images addressed by path.
pub trait ImageSource {
    /// Loads a color image.
    fn load_color(&self, path: &Path) -> LeafMatchResult<RgbImage>;

    /// Loads a single-channel image.
    fn load_gray(&self, path: &Path) -> LeafMatchResult<GrayImage>;
}

/// Reads images from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsImageSource;

impl FsImageSource {
    fn open(path: &Path) -> LeafMatchResult<DynamicImage> {
        if !path.is_file() {
            return Err(LeafMatchError::FileMissing {
                path: path.display().to_string(),
            });
        }
        image::open(path).map_err(|err| LeafMatchError::ImageIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

impl ImageSource for FsImageSource {
    fn load_color(&self, path: &Path) -> LeafMatchResult<RgbImage> {
        Ok(Self::open(path)?.to_rgb8())
    }

    fn load_gray(&self, path: &Path) -> LeafMatchResult<GrayImage> {
        Ok(Self::open(path)?.to_luma8())
    }
}

/// In-memory image source for hosts that already hold decoded buffers.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageSource {
    images: HashMap<PathBuf, DynamicImage>,
}

impl MemoryImageSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an image under `path`, replacing any previous entry.
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, image: DynamicImage) {
        self.images.insert(path.into(), image);
    }

    fn lookup(&self, path: &Path) -> LeafMatchResult<&DynamicImage> {
        self.images
            .get(path)
            .ok_or_else(|| LeafMatchError::FileMissing {
                path: path.display().to_string(),
            })
    }
}

impl ImageSource for MemoryImageSource {
    fn load_color(&self, path: &Path) -> LeafMatchResult<RgbImage> {
        Ok(self.lookup(path)?.to_rgb8())
    }

    fn load_gray(&self, path: &Path) -> LeafMatchResult<GrayImage> {
        Ok(self.lookup(path)?.to_luma8())
    }
}

/// Copies a grayscale `image` buffer into an owned image.
pub fn owned_from_gray_image(img: &GrayImage) -> LeafMatchResult<OwnedImage<u8>> {
    OwnedImage::new(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Converts an owned image into a grayscale `image` buffer.
pub fn gray_image_from_owned(img: &OwnedImage<u8>) -> LeafMatchResult<GrayImage> {
    let width = img.width();
    let height = img.height();
    GrayImage::from_raw(width as u32, height as u32, img.data().to_vec())
        .ok_or(LeafMatchError::InvalidDimensions { width, height })
}

/// Borrows a grayscale `image` buffer as a view.
pub fn gray_view(img: &GrayImage) -> LeafMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Loads an image from disk and converts it to a grayscale owned image.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> LeafMatchResult<OwnedImage<u8>> {
    let img = FsImageSource.load_gray(path.as_ref())?;
    owned_from_gray_image(&img)
}
