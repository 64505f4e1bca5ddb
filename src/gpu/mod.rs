//! GPU-thread components.
//!
//! Everything here is owned by the GPU thread and communicates with the rest
//! of the pipeline only through moved messages: the device context and its
//! textures never cross a thread boundary. The [`Rasterizer`] is the
//! pipeline's `GPUDelegate`: widget-available / surface-destroyed
//! notifications and layer-tree draws arrive as posted messages.

/// Device context and synchronization primitives.
pub mod context;
/// The GPU-thread draw driver.
pub mod rasterizer;
/// Texture recycling and transferable resources.
pub mod resources;
/// Window and render surfaces.
pub mod surface;

pub use context::{DeviceContext, Mailbox, SyncPoint};
pub use rasterizer::Rasterizer;
pub use resources::{
    GpuTexture, ResourceManager, ReturnedResource, TextureLayer, TransferableResource,
};
pub use surface::{AcceleratedWidget, RenderSurface, WindowSurface};

use crate::compositor::layer_tree::LayerTree;
use std::sync::mpsc;

/// The delegate interface the GPU thread serves, as posted messages.
///
/// Each message carries moved ownership; nothing is shared with the sender.
pub enum GpuMsg {
    /// The platform produced a drawable; create the window surface.
    WidgetAvailable(AcceleratedWidget),
    /// The drawable is gone; tear down device state.
    SurfaceDestroyed,
    /// Rasterize and present one layer tree.
    Draw(Box<LayerTree>),
    /// Stop the GPU loop and drop the rasterizer on its own thread.
    Shutdown,
}

/// Posting side of the GPU thread's message queue.
///
/// Posting after the GPU loop has exited quietly drops the message — the
/// same tolerance the draw path has for a missing surface.
#[derive(Clone)]
pub struct GpuHandle {
    tx: mpsc::Sender<GpuMsg>,
}

impl GpuHandle {
    /// Wrap the sending half of the GPU thread's channel.
    pub fn new(tx: mpsc::Sender<GpuMsg>) -> Self {
        Self { tx }
    }

    /// Post one message to the GPU thread.
    pub fn post(&self, msg: GpuMsg) {
        if self.tx.send(msg).is_err() {
            tracing::trace!("gpu thread gone; dropping message");
        }
    }
}
