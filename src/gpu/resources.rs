use std::cell::Cell;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::foundation::core::IntSize;
use crate::foundation::error::KilnResult;
use crate::gpu::context::{DeviceContext, Mailbox, SyncPoint};

/// Maximum recycled textures retained per exact-size bucket.
const MAX_TEXTURES_PER_BUCKET: usize = 8;

/// A device texture allocation.
///
/// Owned by the [`ResourceManager`] (directly or through its cache) except
/// while attached to a [`TextureLayer`] or handed out as a
/// [`TransferableResource`].
#[derive(Debug)]
pub struct GpuTexture {
    id: u64,
    size: IntSize,
    pixels: vello_cpu::Pixmap,
}

impl GpuTexture {
    fn allocate(device: &mut DeviceContext, size: IntSize) -> KilnResult<Self> {
        let (w, h) = size.to_u16_pair()?;
        let id = device.allocate_texture_id(size);
        Ok(Self {
            id,
            size,
            pixels: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Device-local texture identity (never 0 for a live texture).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Texture dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// Texel storage.
    pub fn pixels(&self) -> &vello_cpu::Pixmap {
        &self.pixels
    }

    /// Mutable texel storage for uploads.
    pub fn pixels_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixels
    }
}

/// A compositor leaf that carries a texture to hand off for cross-process
/// composition.
#[derive(Debug, Default)]
pub struct TextureLayer {
    texture: Option<GpuTexture>,
}

impl TextureLayer {
    /// Create a layer holding `texture`.
    pub fn new(texture: GpuTexture) -> Self {
        Self {
            texture: Some(texture),
        }
    }

    /// Attach a texture, replacing any existing one.
    pub fn set_texture(&mut self, texture: GpuTexture) {
        self.texture = Some(texture);
    }

    /// Move the backing texture out of the layer.
    pub fn take_texture(&mut self) -> Option<GpuTexture> {
        self.texture.take()
    }
}

/// A texture packaged for handoff to another process/compositor.
#[derive(Clone, Copy, Debug)]
pub struct TransferableResource {
    /// Process-unique resource id, strictly increasing.
    pub id: u64,
    /// Texture dimensions.
    pub size: IntSize,
    /// Cross-process texture name.
    pub mailbox: Mailbox,
    /// Producer-side ordering point the consumer must wait on.
    pub sync_point: SyncPoint,
}

/// A consumer's notice that it is done with a transferred resource.
#[derive(Clone, Copy, Debug)]
pub struct ReturnedResource {
    /// The id from the matching [`TransferableResource`].
    pub id: u64,
    /// Consumer-side ordering point for the resource's last read.
    pub sync_point: SyncPoint,
    /// Reference count being returned; this pipeline always transfers one.
    pub count: u32,
}

#[derive(Debug, Default, Clone)]
struct TextureCacheStats {
    retained: usize,
    reused: u64,
    dropped_on_put: u64,
}

#[derive(Debug, Default)]
struct TextureCache {
    buckets: HashMap<IntSize, Vec<GpuTexture>>,
    stats: TextureCacheStats,
}

impl TextureCache {
    fn get_texture(&mut self, size: IntSize) -> Option<GpuTexture> {
        let texture = self.buckets.get_mut(&size)?.pop()?;
        self.stats.retained -= 1;
        self.stats.reused += 1;
        Some(texture)
    }

    fn put_texture(&mut self, texture: GpuTexture) {
        let bucket = self.buckets.entry(texture.size()).or_default();
        if bucket.len() >= MAX_TEXTURES_PER_BUCKET {
            self.stats.dropped_on_put += 1;
            return;
        }
        bucket.push(texture);
        self.stats.retained += 1;
    }
}

/// Owns GPU textures across frame boundaries: allocates on demand, recycles
/// by exact size, and tracks textures transferred to an external consumer.
///
/// Not thread-safe by design — it lives on the GPU thread and resource-id
/// allocation must never be touched from anywhere else (the `!Sync` marker
/// enforces that a shared reference cannot cross threads).
#[derive(Debug)]
pub struct ResourceManager {
    device: DeviceContext,
    cache: TextureCache,
    in_flight: HashMap<u64, GpuTexture>,
    next_resource_id: u64,
    _gpu_thread_only: PhantomData<Cell<()>>,
}

impl ResourceManager {
    /// Take ownership of the device context textures will be bound to.
    pub fn new(device: DeviceContext) -> Self {
        Self {
            device,
            cache: TextureCache::default(),
            in_flight: HashMap::new(),
            next_resource_id: 0,
            _gpu_thread_only: PhantomData,
        }
    }

    /// The owned device context.
    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    /// Get a texture of exactly `size`: recycled on a pool hit, freshly
    /// allocated otherwise.
    pub fn create_texture(&mut self, size: IntSize) -> KilnResult<GpuTexture> {
        if let Some(texture) = self.cache.get_texture(size) {
            return Ok(texture);
        }
        self.device.make_current()?;
        GpuTexture::allocate(&mut self.device, size)
    }

    /// Package the layer's texture for cross-process handoff.
    ///
    /// Ownership of the texture moves from the layer into the resource-id
    /// table until the consumer returns it.
    pub fn create_transferable_resource(
        &mut self,
        layer: &mut TextureLayer,
    ) -> KilnResult<Option<TransferableResource>> {
        let Some(texture) = layer.take_texture() else {
            return Ok(None);
        };
        let size = texture.size();

        self.device.make_current()?;
        let mailbox = self.device.generate_mailbox();
        let sync_point = self.device.insert_sync_point();

        let id = self.next_resource_id;
        self.next_resource_id += 1;
        self.in_flight.insert(id, texture);

        Ok(Some(TransferableResource {
            id,
            size,
            mailbox,
            sync_point,
        }))
    }

    /// Reclaim resources the consumer is done with.
    ///
    /// Unknown ids (already reclaimed, or never issued) are skipped — a
    /// duplicate return is not an error. Each known texture waits on the
    /// consumer's sync point before becoming reusable.
    pub fn return_resources(&mut self, resources: Vec<ReturnedResource>) {
        debug_assert!(!resources.is_empty());
        if self.device.make_current().is_err() {
            tracing::warn!("dropping returned resources: device context lost");
            return;
        }
        for resource in resources {
            debug_assert_eq!(1, resource.count);
            let Some(texture) = self.in_flight.remove(&resource.id) else {
                continue;
            };
            debug_assert_ne!(0, texture.id());
            self.device.wait_sync_point(resource.sync_point);
            self.cache.put_texture(texture);
        }
    }

    /// Number of textures currently parked in the reuse pool.
    pub fn pooled_texture_count(&self) -> usize {
        self.cache.stats.retained
    }

    /// Number of pool hits served so far.
    pub fn pool_hits(&self) -> u64 {
        self.cache.stats.reused
    }
}
