//! leafmatch locates leaf-shaped silhouettes in plant photographs.
//!
//! A photograph and its plant mask are reduced to a cropped edge map. Every
//! caller-supplied (shape, size, rotation) hypothesis is rasterized as a
//! template and scored against that edge map with a chamfer distance over a
//! search window anchored at the plant's stem. Accepted hypotheses are
//! recorded in a fixed-size Leaf Indicator vector.
//!
//! Shapes can be swept in parallel with the `rayon` feature; spans and
//! events are emitted with the `tracing` feature.

mod trace;

mod candidate;
pub mod chamfer;
pub mod geometry;
pub mod image;
pub mod preprocess;
pub mod search;
pub mod sink;
pub mod template;
pub mod util;

pub mod lowlevel;

pub use chamfer::ChamferScorer;
pub use geometry::{Point, PointF, Rect};
pub use image::io::{FsImageSource, ImageSource, MemoryImageSource};
pub use image::{ImageView, ImageViewMut, OwnedImage};
pub use preprocess::{PlantPreprocessor, PreparedPlant, PreprocessConfig};
pub use search::{
    LeafIndicator, LeafMatch, PlantParams, ScatterPoint, SegmentationConfig, Segmenter,
};
pub use sink::{NullSink, RenderSink};
pub use template::{GeneratorConfig, GeneratorState, TemplateGenerator};
pub use util::{LeafMatchError, LeafMatchResult};
