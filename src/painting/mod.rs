//! Recorded pictures, the recording canvas, and the CPU raster executor.
//!
//! Paint is recorded, not executed, while a frame is being composited: the
//! [`PaintCanvas`](canvas::PaintCanvas) turns save/clip/draw calls into an
//! immutable op list, and the [`RasterEngine`](raster::RasterEngine) later
//! executes that list into a pixmap on the GPU thread. The recorded form is
//! also what gets serialized for diagnostic picture traces.

/// The recording canvas.
pub mod canvas;
/// Recorded ops, pictures, and their serialized form.
pub mod display_list;
/// Executes recordings into pixmaps.
pub mod raster;
