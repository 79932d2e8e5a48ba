//! Render sink for intermediate images.

use crate::image::ImageView;

/// Receives named intermediate images for display or debugging.
///
/// Calls are fire-and-forget: a sink must not fail the run.
pub trait RenderSink {
    fn show(&mut self, name: &str, image: ImageView<'_, u8>);
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn show(&mut self, _name: &str, _image: ImageView<'_, u8>) {}
}
