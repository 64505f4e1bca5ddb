//! Kiln is a retained-mode frame pipeline for embedded rendering engines.
//!
//! Application code (a scripting VM, in the full engine) builds a [`LayerTree`]
//! on the UI thread once per animation frame. The tree is an immutable
//! snapshot: it is moved across a channel to the GPU thread, where the
//! [`Rasterizer`](gpu::Rasterizer) paints it into a window surface and presents
//! it. Frame production is paced to vsync by the [`Animator`](shell::Animator),
//! which keeps at most one tree in flight at a time.
//!
//! - Build a [`Layer`] tree and wrap it in a [`LayerTree`]
//! - Stand up a [`Shell`](shell::Shell) (UI / GPU / IO threads) and a
//!   [`ShellView`](shell::ShellView)
//! - Attach a [`FrameProducer`](shell::FrameProducer) and let vsync drive it
//!
//! An alternate retained-scene backend lives in [`session`]: instead of
//! rasterizing locally, it presents the frame through a scene-graph session
//! with fenced surface handoff.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Layer tree and paint orchestration.
pub mod compositor;
/// GPU-thread components: device context, surfaces, rasterizer, resources.
pub mod gpu;
/// Recorded pictures, the recording canvas, and the CPU raster executor.
pub mod painting;
/// Retained scene-graph session backend.
pub mod session;
/// Threads, pacing, and engine wiring.
pub mod shell;

pub use crate::foundation::core::{Affine, BezPath, IntSize, Point, Rect, Rgba8Premul};
pub use crate::foundation::error::{KilnError, KilnResult};
pub use crate::foundation::instrument::{Counter, Stopwatch};

pub use crate::compositor::layer::Layer;
pub use crate::compositor::layer_tree::LayerTree;
pub use crate::compositor::paint_context::{PaintContext, ScopedFrame};
pub use crate::painting::canvas::PaintCanvas;
pub use crate::painting::display_list::Picture;
