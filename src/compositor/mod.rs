//! The retained layer tree and the machinery that paints it.
//!
//! A [`Layer`](layer::Layer) tree is assembled on the UI thread during a
//! frame's build phase, frozen into a [`LayerTree`](layer_tree::LayerTree),
//! and moved to the GPU thread where a
//! [`PaintContext`](paint_context::PaintContext) orchestrates exactly one
//! paint pass over it per acquired frame.

/// Layer variants and their paint contracts.
pub mod layer;
/// The per-frame immutable tree snapshot.
pub mod layer_tree;
/// Paint-pass orchestration and instrumentation.
pub mod paint_context;
