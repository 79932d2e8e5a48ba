//! Image buffers and aliasing views.
//!
//! The search writes scores, templates and the leaf accumulation into
//! rectangular windows of larger buffers. `ImageView` and `ImageViewMut` are
//! those windows: a borrowed slice plus a `Layout` whose stride is the row
//! pitch of the parent buffer. A window of a window keeps the parent's
//! stride, so writes through any `ImageViewMut` land in the parent's pixels.

use crate::util::{LeafMatchError, LeafMatchResult};

pub mod io;
mod owned;

pub use owned::OwnedImage;

/// Shape of a strided window: visible width and height plus row pitch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Layout {
    width: usize,
    height: usize,
    stride: usize,
}

impl Layout {
    /// Validates the layout and returns it with the minimum backing length.
    fn checked(width: usize, height: usize, stride: usize) -> LeafMatchResult<(Self, usize)> {
        if width == 0 || height == 0 {
            return Err(LeafMatchError::InvalidDimensions { width, height });
        }
        if stride < width {
            return Err(LeafMatchError::InvalidStride { width, stride });
        }
        let span = (height - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width))
            .ok_or(LeafMatchError::InvalidDimensions { width, height })?;
        Ok((
            Self {
                width,
                height,
                stride,
            },
            span,
        ))
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.stride)?.checked_add(x)
    }

    fn row_range(&self, y: usize) -> Option<std::ops::Range<usize>> {
        let start = self.index(0, y)?;
        Some(start..start + self.width)
    }

    /// Offset of the `width x height` window at `(x, y)`.
    fn window_offset(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> LeafMatchResult<usize> {
        if width == 0 || height == 0 {
            return Err(LeafMatchError::InvalidDimensions { width, height });
        }
        let fits = x
            .checked_add(width)
            .zip(y.checked_add(height))
            .is_some_and(|(end_x, end_y)| end_x <= self.width && end_y <= self.height);
        if !fits {
            return Err(LeafMatchError::RoiOutOfBounds {
                x,
                y,
                width,
                height,
                img_width: self.width,
                img_height: self.height,
            });
        }
        Ok(y * self.stride + x)
    }
}

/// Borrowed 2D image window with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    layout: Layout,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> LeafMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> LeafMatchResult<Self> {
        let (layout, needed) = Layout::checked(width, height, stride)?;
        if data.len() < needed {
            return Err(LeafMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, layout })
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Row pitch of the backing buffer in elements.
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    /// Backing slice starting at the window's first pixel.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        self.data.get(self.layout.index(x, y)?)
    }

    /// Visible part of row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        self.data.get(self.layout.row_range(y)?)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.layout.height).filter_map(move |y| self.row(y))
    }

    /// Zero-copy sub-window sharing this view's buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> LeafMatchResult<ImageView<'a, T>> {
        let offset = self.layout.window_offset(x, y, width, height)?;
        ImageView::new(&self.data[offset..], width, height, self.layout.stride)
    }
}

/// Mutable image window; writes reach the buffer it was carved from.
pub struct ImageViewMut<'a, T> {
    data: &'a mut [T],
    layout: Layout,
}

impl<'a, T> ImageViewMut<'a, T> {
    /// Creates a mutable view with an explicit stride.
    pub fn new(
        data: &'a mut [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> LeafMatchResult<Self> {
        let (layout, needed) = Layout::checked(width, height, stride)?;
        if data.len() < needed {
            return Err(LeafMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, layout })
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    /// Read-only reborrow of the same window.
    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &*self.data,
            layout: self.layout,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.data.get(self.layout.index(x, y)?)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let idx = self.layout.index(x, y)?;
        self.data.get_mut(idx)
    }

    pub fn row_mut(&mut self, y: usize) -> Option<&mut [T]> {
        let range = self.layout.row_range(y)?;
        self.data.get_mut(range)
    }

    /// Mutable sub-window reborrowing this view.
    pub fn roi_mut(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> LeafMatchResult<ImageViewMut<'_, T>> {
        let offset = self.layout.window_offset(x, y, width, height)?;
        ImageViewMut::new(&mut self.data[offset..], width, height, self.layout.stride)
    }

    /// Narrows the view to a sub-window, keeping the parent borrow.
    pub fn into_roi(
        self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> LeafMatchResult<ImageViewMut<'a, T>> {
        let offset = self.layout.window_offset(x, y, width, height)?;
        let stride = self.layout.stride;
        ImageViewMut::new(&mut self.data[offset..], width, height, stride)
    }
}

impl<T: Copy> ImageViewMut<'_, T> {
    pub fn fill(&mut self, value: T) {
        for y in 0..self.layout.height {
            if let Some(row) = self.row_mut(y) {
                row.fill(value);
            }
        }
    }

    /// Copies a window of the same size into this one.
    pub fn copy_from(&mut self, src: ImageView<'_, T>) -> LeafMatchResult<()> {
        if (src.width(), src.height()) != (self.layout.width, self.layout.height) {
            return Err(LeafMatchError::SizeMismatch {
                expected: (self.layout.width, self.layout.height),
                got: (src.width(), src.height()),
            });
        }
        for (y, src_row) in src.rows().enumerate() {
            if let Some(dst_row) = self.row_mut(y) {
                dst_row.copy_from_slice(src_row);
            }
        }
        Ok(())
    }
}
