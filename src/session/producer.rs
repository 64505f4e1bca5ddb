use std::collections::HashMap;

use crate::foundation::core::IntSize;
use crate::foundation::error::KilnResult;
use crate::painting::raster::clear_to_transparent;

/// Maximum recycled surfaces retained per exact-size bucket.
const MAX_SURFACES_PER_BUCKET: usize = 3;

/// A producer-owned paint surface submitted to the compositor.
///
/// The fence flag stands in for the GPU-side semaphore a hardware producer
/// signals when its raster work for the frame completes: submission is not
/// visible to the compositor until the fence is signaled.
#[derive(Debug)]
pub struct SessionSurface {
    id: u64,
    size: IntSize,
    pixmap: vello_cpu::Pixmap,
    fence_signaled: bool,
}

impl SessionSurface {
    /// Producer-unique surface id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Surface dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// The painted pixels.
    pub fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }

    /// Mutable pixels for the paint task.
    pub fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    /// Whether the producer's work on this surface has completed.
    pub fn fence_signaled(&self) -> bool {
        self.fence_signaled
    }

    pub(crate) fn signal_fence(&mut self) {
        self.fence_signaled = true;
    }
}

/// Allocation statistics for pool instrumentation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceProducerStats {
    /// Surfaces allocated fresh.
    pub created: u64,
    /// Pool hits served.
    pub reused: u64,
    /// Surfaces currently parked for reuse.
    pub retained: usize,
}

/// Produces and recycles the surfaces paint tasks render into.
///
/// The reuse pool is keyed by exact size; a present returns that frame's
/// surfaces to the producer so their buffers can back later frames.
#[derive(Debug, Default)]
pub struct SurfaceProducer {
    free: HashMap<IntSize, Vec<SessionSurface>>,
    next_surface_id: u64,
    stats: SurfaceProducerStats,
}

impl SurfaceProducer {
    /// Create an empty producer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a surface of exactly `size`, recycled when possible. Recycled
    /// surfaces come back cleared with their fence unsignaled.
    pub fn produce_surface(&mut self, size: IntSize) -> KilnResult<SessionSurface> {
        if let Some(bucket) = self.free.get_mut(&size)
            && let Some(mut surface) = bucket.pop()
        {
            self.stats.retained -= 1;
            self.stats.reused += 1;
            surface.fence_signaled = false;
            clear_to_transparent(&mut surface.pixmap);
            return Ok(surface);
        }

        let (w, h) = size.to_u16_pair()?;
        self.next_surface_id += 1;
        self.stats.created += 1;
        Ok(SessionSurface {
            id: self.next_surface_id,
            size,
            pixmap: vello_cpu::Pixmap::new(w, h),
            fence_signaled: false,
        })
    }

    /// Book-keep a present: the compositor consumed these surfaces, so their
    /// buffers become reusable.
    pub fn on_surfaces_presented(&mut self, surfaces: Vec<SessionSurface>) {
        for surface in surfaces {
            let bucket = self.free.entry(surface.size()).or_default();
            if bucket.len() >= MAX_SURFACES_PER_BUCKET {
                continue;
            }
            bucket.push(surface);
            self.stats.retained += 1;
        }
    }

    /// Current pool statistics.
    pub fn stats(&self) -> SurfaceProducerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presented_surfaces_are_recycled_by_exact_size() {
        let mut producer = SurfaceProducer::new();
        let a = producer.produce_surface(IntSize::new(8, 8)).unwrap();
        let a_id = a.id();
        producer.on_surfaces_presented(vec![a]);

        let b = producer.produce_surface(IntSize::new(8, 8)).unwrap();
        assert_eq!(b.id(), a_id);
        assert_eq!(producer.stats().created, 1);
        assert_eq!(producer.stats().reused, 1);

        let c = producer.produce_surface(IntSize::new(4, 4)).unwrap();
        assert_ne!(c.id(), a_id);
        assert_eq!(producer.stats().created, 2);
    }

    #[test]
    fn recycled_surfaces_come_back_cleared_and_unfenced() {
        let mut producer = SurfaceProducer::new();
        let mut a = producer.produce_surface(IntSize::new(4, 4)).unwrap();
        a.pixmap_mut().data_as_u8_slice_mut().fill(255);
        a.signal_fence();
        producer.on_surfaces_presented(vec![a]);

        let b = producer.produce_surface(IntSize::new(4, 4)).unwrap();
        assert!(!b.fence_signaled());
        assert!(b.pixmap().data_as_u8_slice().iter().all(|&x| x == 0));
    }

    #[test]
    fn bucket_cap_bounds_retention() {
        let mut producer = SurfaceProducer::new();
        let surfaces: Vec<_> = (0..5)
            .map(|_| producer.produce_surface(IntSize::new(4, 4)).unwrap())
            .collect();
        producer.on_surfaces_presented(surfaces);
        assert_eq!(producer.stats().retained, MAX_SURFACES_PER_BUCKET);
    }
}
