use std::time::Duration;

use crate::compositor::layer::Layer;
use crate::foundation::core::IntSize;

/// An immutable, single-use snapshot of a layer hierarchy plus frame
/// metadata, produced once per animation frame on the UI thread.
///
/// A tree is moved — never copied — to the GPU thread for drawing, and is
/// dropped there once rasterization completes (or on the UI thread if it is
/// never submitted). At most one tree is in flight per engine at a time; the
/// animator enforces that.
#[derive(Debug)]
pub struct LayerTree {
    root_layer: Layer,
    frame_size: IntSize, // Physical pixels.
    construction_time: Duration,
    rasterizer_tracing_threshold: u32,
}

impl LayerTree {
    /// Wrap a finished layer hierarchy.
    pub fn new(root_layer: Layer) -> Self {
        Self {
            root_layer,
            frame_size: IntSize::default(),
            construction_time: Duration::ZERO,
            rasterizer_tracing_threshold: 0,
        }
    }

    /// The root of the hierarchy.
    pub fn root_layer(&self) -> &Layer {
        &self.root_layer
    }

    /// Frame dimensions in physical pixels.
    pub fn frame_size(&self) -> IntSize {
        self.frame_size
    }

    /// Set the frame dimensions in physical pixels.
    pub fn set_frame_size(&mut self, frame_size: IntSize) {
        self.frame_size = frame_size;
    }

    /// Wall-clock time the UI thread spent building this tree.
    pub fn construction_time(&self) -> Duration {
        self.construction_time
    }

    /// Record how long the UI thread spent building this tree.
    pub fn set_construction_time(&mut self, construction_time: Duration) {
        self.construction_time = construction_time;
    }

    /// The number of frame intervals missed after which the rasterizer must
    /// trace the rasterized picture to a trace file. 0 disables tracing.
    pub fn rasterizer_tracing_threshold(&self) -> u32 {
        self.rasterizer_tracing_threshold
    }

    /// Set the slow-frame tracing threshold (0 disables).
    pub fn set_rasterizer_tracing_threshold(&mut self, interval: u32) {
        self.rasterizer_tracing_threshold = interval;
    }
}
