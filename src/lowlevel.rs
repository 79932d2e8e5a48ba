//! Low-level building blocks for custom pipelines.
//!
//! These expose the individual preprocessing stages, contour tracing,
//! rasterization and score-field helpers used by [`crate::Segmenter`].

pub use crate::candidate::{find_extremes, Extremes, Peak};
pub use crate::geometry::{min_enclosing_circle, Circle};
pub use crate::image::io::{
    gray_image_from_owned, gray_view, load_gray_image, owned_from_gray_image,
};
pub use crate::preprocess::color::{segmentation_image, segmentation_value, srgb_to_lab};
pub use crate::preprocess::edges::edge_map;
pub use crate::template::raster::{draw_antialiased_polygon, fill_polygon};
pub use crate::template::shape::{extract_outer_contour, ShapeModel};
pub use crate::template::RotationTable;
