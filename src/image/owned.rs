//! Owned contiguous image buffers.

use super::{ImageView, ImageViewMut, Layout};
use crate::util::{LeafMatchError, LeafMatchResult};

/// Owned contiguous image buffer with `stride == width`.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> OwnedImage<T> {
    /// Wraps a row-major buffer of exactly `width * height` elements.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> LeafMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(LeafMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(LeafMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(LeafMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(LeafMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel data in row-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the pixel data mutably.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the image and returns its pixel buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            layout: self.layout(),
        }
    }

    /// Returns a mutable view aliasing the whole image.
    pub fn view_mut(&mut self) -> ImageViewMut<'_, T> {
        let layout = self.layout();
        ImageViewMut {
            data: &mut self.data,
            layout,
        }
    }

    fn layout(&self) -> Layout {
        Layout {
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }
}

impl<T: Copy> OwnedImage<T> {
    /// Creates an image with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> LeafMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(LeafMatchError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(LeafMatchError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a new contiguous image.
    pub fn from_view(view: ImageView<'_, T>) -> LeafMatchResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(LeafMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Applies `f` to every pixel and returns the result as a new image.
    pub fn map<U, F>(&self, f: F) -> OwnedImage<U>
    where
        F: Fn(T) -> U,
    {
        OwnedImage {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }
}
