use crate::shell::engine::{UiHandle, UiMsg};
use crate::shell::vsync::VsyncProvider;

/// Paces frame production to the display.
///
/// The animator guarantees two invariants:
///
/// - at most one vsync request is armed at a time, and
/// - at most one built layer tree is in flight toward the GPU thread; a
///   request that arrives while a frame is in flight is deferred until the
///   GPU thread reports completion.
///
/// Stopping bumps a generation counter, so vsync callbacks armed before the
/// stop are recognized as stale and dropped instead of reaching a torn-down
/// engine — the posted-task equivalent of a weak receiver.
pub struct Animator {
    vsync: Box<dyn VsyncProvider>,
    ui: UiHandle,
    running: bool,
    generation: u64,
    frame_requested: bool,
    frame_in_flight: bool,
    request_pending_completion: bool,
}

impl Animator {
    /// Create a stopped animator.
    pub fn new(vsync: Box<dyn VsyncProvider>, ui: UiHandle) -> Self {
        Self {
            vsync,
            ui,
            running: false,
            generation: 0,
            frame_requested: false,
            frame_in_flight: false,
            request_pending_completion: false,
        }
    }

    /// Whether the animator is currently pacing frames.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The UI queue vsync callbacks post into.
    pub fn ui_handle(&self) -> UiHandle {
        self.ui.clone()
    }

    /// Begin pacing and arm an initial frame request.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.request_frame();
    }

    /// Suppress frame requests. Armed vsync callbacks become stale; a frame
    /// already in flight is allowed to finish.
    pub fn stop(&mut self) {
        self.running = false;
        self.generation += 1;
        self.frame_requested = false;
        self.request_pending_completion = false;
    }

    /// Ask for one frame build at the next vsync.
    pub fn request_frame(&mut self) {
        if !self.running || self.frame_requested {
            return;
        }
        if self.frame_in_flight {
            self.request_pending_completion = true;
            return;
        }
        self.frame_requested = true;
        let generation = self.generation;
        let ui = self.ui.clone();
        self.vsync.await_vsync(Box::new(move |frame_time| {
            ui.post(UiMsg::Vsync {
                frame_time,
                generation,
            });
        }));
    }

    /// Gate a delivered vsync tick. Returns whether the engine should build
    /// a frame for it; stale and post-stop ticks return `false`.
    pub fn on_vsync(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.running {
            return false;
        }
        self.frame_requested = false;
        true
    }

    /// Note that a built tree was posted to the GPU thread.
    pub fn did_submit_frame(&mut self) {
        self.frame_in_flight = true;
    }

    /// The GPU thread finished (or dropped) the in-flight frame; re-arm a
    /// deferred request if one accumulated.
    pub fn on_frame_complete(&mut self) {
        self.frame_in_flight = false;
        if self.request_pending_completion {
            self.request_pending_completion = false;
            self.request_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::vsync::ManualVsync;
    use std::sync::mpsc;
    use std::time::Instant;

    fn animator() -> (Animator, crate::shell::vsync::ManualVsyncPump, mpsc::Receiver<UiMsg>) {
        let (vsync, pump) = ManualVsync::new();
        let (ui, rx) = UiHandle::channel();
        (Animator::new(Box::new(vsync), ui), pump, rx)
    }

    #[test]
    fn start_arms_exactly_one_request() {
        let (mut animator, pump, _rx) = animator();
        animator.start();
        animator.request_frame();
        animator.request_frame();
        assert_eq!(pump.pending(), 1);
    }

    #[test]
    fn stale_vsync_after_stop_is_rejected() {
        let (mut animator, pump, rx) = animator();
        animator.start();
        animator.stop();
        assert!(pump.pump(Instant::now()));
        let Ok(UiMsg::Vsync { generation, .. }) = rx.try_recv() else {
            panic!("expected a vsync message");
        };
        assert!(!animator.on_vsync(generation));
    }

    #[test]
    fn request_during_flight_is_deferred_until_completion() {
        let (mut animator, pump, rx) = animator();
        animator.start();
        assert!(pump.pump(Instant::now()));
        let Ok(UiMsg::Vsync { generation, .. }) = rx.try_recv() else {
            panic!("expected a vsync message");
        };
        assert!(animator.on_vsync(generation));
        animator.did_submit_frame();

        animator.request_frame();
        assert_eq!(pump.pending(), 0, "request must wait for completion");

        animator.on_frame_complete();
        assert_eq!(pump.pending(), 1, "completion re-arms the deferred request");
    }
}
