use std::path::PathBuf;

use crate::foundation::core::IntSize;
use crate::foundation::error::{KilnError, KilnResult};
use crate::foundation::instrument::{Counter, Stopwatch};
use crate::painting::canvas::PaintCanvas;
use crate::painting::raster::RasterEngine;

/// Orchestrates paint passes over layer trees and carries the HUD
/// instrumentation that spans them.
///
/// Exactly one [`ScopedFrame`] can be live per context: acquisition borrows
/// the context mutably, so the discipline is enforced by the borrow checker
/// rather than a lock (producer and consumer share the GPU thread).
#[derive(Debug, Default)]
pub struct PaintContext {
    engine_time: Stopwatch,
    frame_time: Stopwatch,
    frame_count: Counter,
}

enum FrameTarget {
    Onscreen,
    File { path: PathBuf },
}

/// A time-bounded handle over one paint pass.
///
/// The underlying canvas is released on every exit path: submitting an
/// onscreen frame rasterizes and stops the paint stopwatch; dropping a file
/// frame serializes whatever was recorded to its path.
pub struct ScopedFrame<'a> {
    context: &'a mut PaintContext,
    canvas: Option<PaintCanvas>,
    target: FrameTarget,
}

impl PaintContext {
    /// Create a context with fresh instrumentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stopwatch tracking UI-thread layer-tree construction laps.
    pub fn engine_time(&self) -> &Stopwatch {
        &self.engine_time
    }

    /// Mutable access for recording an off-thread construction lap.
    pub fn engine_time_mut(&mut self) -> &mut Stopwatch {
        &mut self.engine_time
    }

    /// Stopwatch tracking GPU-thread paint laps.
    pub fn frame_time(&self) -> &Stopwatch {
        &self.frame_time
    }

    /// Number of onscreen frames acquired so far.
    pub fn frame_count(&self) -> usize {
        self.frame_count.count()
    }

    /// Begin an onscreen paint pass. Starts the paint stopwatch and counts
    /// the frame.
    pub fn acquire_frame(&mut self, size: IntSize) -> ScopedFrame<'_> {
        self.frame_time.start();
        self.frame_count.increment(1);
        ScopedFrame {
            context: self,
            canvas: Some(PaintCanvas::new(size)),
            target: FrameTarget::Onscreen,
        }
    }

    /// Begin a diagnostic paint pass that serializes to `path` when the
    /// frame ends. Leaves the onscreen instrumentation untouched.
    pub fn acquire_file_frame(&mut self, path: PathBuf, size: IntSize) -> ScopedFrame<'_> {
        ScopedFrame {
            context: self,
            canvas: Some(PaintCanvas::new(size)),
            target: FrameTarget::File { path },
        }
    }
}

impl ScopedFrame<'_> {
    /// The recording canvas for this pass.
    pub fn canvas(&mut self) -> &mut PaintCanvas {
        self.canvas
            .as_mut()
            .unwrap_or_else(|| panic!("frame canvas already released"))
    }

    /// Finish an onscreen pass: execute the recording into `target` and stop
    /// the paint stopwatch (via the frame's drop).
    pub fn submit_to(
        mut self,
        engine: &mut RasterEngine,
        target: &mut vello_cpu::Pixmap,
    ) -> KilnResult<()> {
        let canvas = self
            .canvas
            .take()
            .unwrap_or_else(|| panic!("frame canvas already released"));
        engine.render(&canvas.finish(), target)
    }
}

impl Drop for ScopedFrame<'_> {
    fn drop(&mut self) {
        match &self.target {
            FrameTarget::Onscreen => self.context.frame_time.stop(),
            FrameTarget::File { path } => {
                if let Some(canvas) = self.canvas.take()
                    && let Err(e) = write_file_frame(canvas, path)
                {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write picture trace");
                }
            }
        }
    }
}

fn write_file_frame(canvas: PaintCanvas, path: &PathBuf) -> KilnResult<()> {
    let bytes = canvas.finish().to_json_bytes()?;
    std::fs::write(path, bytes).map_err(|e| KilnError::serde(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Rect, Rgba8Premul};

    #[test]
    fn onscreen_frames_count_and_record_laps() {
        let mut context = PaintContext::new();
        {
            let mut frame = context.acquire_frame(IntSize::new(8, 8));
            frame
                .canvas()
                .draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba8Premul::black());
        }
        assert_eq!(context.frame_count(), 1);
        {
            let mut frame = context.acquire_frame(IntSize::new(8, 8));
            let mut engine = RasterEngine::new();
            let mut target = vello_cpu::Pixmap::new(8, 8);
            frame.canvas().clear(Rgba8Premul::black());
            frame.submit_to(&mut engine, &mut target).unwrap();
        }
        assert_eq!(context.frame_count(), 2);
    }

    #[test]
    fn file_frames_write_on_drop_and_skip_instrumentation() {
        let mut context = PaintContext::new();
        let path = std::env::temp_dir().join(format!(
            "kiln_file_frame_test_{}.json",
            std::process::id()
        ));
        {
            let mut frame = context.acquire_file_frame(path.clone(), IntSize::new(4, 4));
            frame
                .canvas()
                .draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba8Premul::black());
        }
        assert_eq!(context.frame_count(), 0);
        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
