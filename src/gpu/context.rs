use crate::foundation::core::IntSize;
use crate::foundation::error::{KilnError, KilnResult};

/// A marker in the device command queue.
///
/// Consumers wait on a sync point before touching a resource the producer
/// wrote; the wait is queued on the device, never blocked on the CPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncPoint(pub u64);

/// An opaque token naming a texture for cross-process handoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mailbox(pub [u8; 16]);

/// The GPU device binding owned by one thread.
///
/// Plays the role a GL context plays in a hardware pipeline: it must be made
/// current before any device call, it allocates textures, and it orders work
/// through sync points. The context is owned exclusively by the thread that
/// created it; only handles minted from it (mailboxes, sync points) travel.
#[derive(Debug)]
pub struct DeviceContext {
    current: bool,
    lost: bool,
    next_texture_id: u64,
    next_sync_point: u64,
    next_mailbox: u64,
    retired_sync_point: u64,
    texture_allocations: u64,
}

impl DeviceContext {
    /// Bind a new device context.
    ///
    /// Creation can fail when the environment has no usable device; callers
    /// on the draw path treat that as fatal, since there is no degraded
    /// rendering fallback.
    pub fn create() -> KilnResult<Self> {
        Ok(Self {
            current: false,
            lost: false,
            next_texture_id: 1,
            next_sync_point: 1,
            next_mailbox: 1,
            retired_sync_point: 0,
            texture_allocations: 0,
        })
    }

    /// Make this context current on the calling thread.
    pub fn make_current(&mut self) -> KilnResult<()> {
        if self.lost {
            return Err(KilnError::paint("device context lost"));
        }
        self.current = true;
        Ok(())
    }

    /// Whether the context is current.
    pub fn is_current(&self) -> bool {
        self.current && !self.lost
    }

    /// Mark the context as lost (unrecoverable device teardown).
    pub fn mark_lost(&mut self) {
        self.lost = true;
        self.current = false;
        tracing::debug!("device context lost");
    }

    /// Whether the device binding has been lost.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Insert a sync point after the commands issued so far.
    pub fn insert_sync_point(&mut self) -> SyncPoint {
        debug_assert!(self.is_current());
        let sp = SyncPoint(self.next_sync_point);
        self.next_sync_point += 1;
        sp
    }

    /// Queue a wait on `sync_point` ahead of subsequent commands.
    ///
    /// This is a device-queue-side ordering edge, not a CPU block; the
    /// software device retires the point immediately.
    pub fn wait_sync_point(&mut self, sync_point: SyncPoint) {
        debug_assert!(self.is_current());
        self.retired_sync_point = self.retired_sync_point.max(sync_point.0);
    }

    /// Highest sync point the device has retired.
    pub fn retired_sync_point(&self) -> u64 {
        self.retired_sync_point
    }

    /// Mint a mailbox token for texture handoff.
    pub fn generate_mailbox(&mut self) -> Mailbox {
        debug_assert!(self.is_current());
        let n = self.next_mailbox;
        self.next_mailbox += 1;
        let mut name = [0u8; 16];
        name[..8].copy_from_slice(&n.to_le_bytes());
        Mailbox(name)
    }

    pub(crate) fn allocate_texture_id(&mut self, size: IntSize) -> u64 {
        debug_assert!(self.is_current());
        debug_assert!(!size.is_empty());
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.texture_allocations += 1;
        id
    }

    /// Number of textures allocated over the context's lifetime.
    pub fn texture_allocations(&self) -> u64 {
        self.texture_allocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_points_are_strictly_increasing() {
        let mut ctx = DeviceContext::create().unwrap();
        ctx.make_current().unwrap();
        let a = ctx.insert_sync_point();
        let b = ctx.insert_sync_point();
        assert!(b > a);
        ctx.wait_sync_point(b);
        ctx.wait_sync_point(a);
        assert_eq!(ctx.retired_sync_point(), b.0);
    }

    #[test]
    fn lost_context_rejects_make_current() {
        let mut ctx = DeviceContext::create().unwrap();
        ctx.mark_lost();
        assert!(ctx.make_current().is_err());
        assert!(!ctx.is_current());
    }

    #[test]
    fn mailboxes_are_unique() {
        let mut ctx = DeviceContext::create().unwrap();
        ctx.make_current().unwrap();
        assert_ne!(ctx.generate_mailbox(), ctx.generate_mailbox());
    }
}
