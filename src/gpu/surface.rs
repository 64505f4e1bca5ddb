use crate::foundation::core::IntSize;
use crate::foundation::error::{KilnError, KilnResult};

/// A native drawable handle delivered by the windowing layer.
///
/// Passed by value across the thread boundary; id 0 is the null handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceleratedWidget {
    /// Platform drawable identity.
    pub id: u64,
    /// Drawable dimensions at the time of the notification.
    pub size: IntSize,
}

/// The presentable window surface bound to an accelerated widget.
///
/// Owns the double-buffered backing store: paint lands in a render surface's
/// pixmap and [`present`](WindowSurface::present) copies it into the front
/// buffer, which is what the display (and tests) observe.
#[derive(Debug)]
pub struct WindowSurface {
    widget_id: u64,
    size: IntSize,
    front: Option<vello_cpu::Pixmap>,
    present_count: u64,
}

impl WindowSurface {
    /// Bind a surface to a widget. Fails on the null widget handle.
    pub fn create(widget: AcceleratedWidget) -> KilnResult<Self> {
        if widget.id == 0 {
            return Err(KilnError::validation("null accelerated widget"));
        }
        tracing::debug!(widget = widget.id, size = ?widget.size, "window surface created");
        Ok(Self {
            widget_id: widget.id,
            size: widget.size,
            front: None,
            present_count: 0,
        })
    }

    /// The bound widget's identity.
    pub fn widget_id(&self) -> u64 {
        self.widget_id
    }

    /// Current surface dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// Resize the backing store. The front buffer is dropped; the next
    /// present repopulates it.
    pub fn resize(&mut self, size: IntSize) {
        if self.size == size {
            return;
        }
        tracing::debug!(from = ?self.size, to = ?size, "window surface resized");
        self.size = size;
        self.front = None;
    }

    /// Swap buffers: publish `frame` as the front buffer.
    pub fn present(&mut self, frame: &vello_cpu::Pixmap) {
        let mut front = match self.front.take() {
            Some(existing)
                if existing.width() == frame.width() && existing.height() == frame.height() =>
            {
                existing
            }
            _ => vello_cpu::Pixmap::new(frame.width(), frame.height()),
        };
        front
            .data_as_u8_slice_mut()
            .copy_from_slice(frame.data_as_u8_slice());
        self.front = Some(front);
        self.present_count += 1;
    }

    /// Number of presents since creation.
    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    /// The last presented frame, if any.
    pub fn front(&self) -> Option<&vello_cpu::Pixmap> {
        self.front.as_ref()
    }
}

/// The frame-sized render target paint is executed into.
///
/// Recreated whenever the incoming frame size differs from the current
/// target, mirroring how a hardware pipeline rewraps the window framebuffer.
#[derive(Debug)]
pub struct RenderSurface {
    size: IntSize,
    pixmap: vello_cpu::Pixmap,
}

impl RenderSurface {
    /// Allocate a target of `size`.
    pub fn new(size: IntSize) -> KilnResult<Self> {
        let (w, h) = size.to_u16_pair()?;
        Ok(Self {
            size,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Target dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// The backing pixels.
    pub fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }

    /// Mutable backing pixels for raster execution.
    pub fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }
}
