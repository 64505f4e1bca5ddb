use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// A single-shot vsync callback carrying the tick's monotonic timestamp.
pub type VsyncCallback = Box<dyn FnOnce(Instant) + Send>;

/// Source of display-refresh ticks.
///
/// Each [`await_vsync`](VsyncProvider::await_vsync) call arms exactly one
/// callback for the next tick; pacing to the display is the provider's
/// concern, requesting at most one outstanding callback is the caller's.
pub trait VsyncProvider: Send {
    /// Arm `callback` to fire at the next vsync.
    fn await_vsync(&mut self, callback: VsyncCallback);
}

/// Timer-driven vsync: ticks at a fixed interval from an epoch, standing in
/// for a hardware vsync signal on platforms without one.
pub struct TimerVsync {
    tx: mpsc::Sender<VsyncCallback>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TimerVsync {
    /// Spawn the tick thread with the given refresh interval.
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel::<VsyncCallback>();
        let thread = thread::Builder::new()
            .name("kiln-vsync".to_owned())
            .spawn(move || {
                let epoch = Instant::now();
                while let Ok(callback) = rx.recv() {
                    // Sleep to the next interval boundary past now.
                    let elapsed = epoch.elapsed();
                    let ticks = elapsed.as_nanos() / interval.as_nanos() + 1;
                    let next = epoch + interval * (ticks as u32);
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    callback(Instant::now());
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn vsync thread: {e}"));
        Self {
            tx,
            thread: Some(thread),
        }
    }
}

impl VsyncProvider for TimerVsync {
    fn await_vsync(&mut self, callback: VsyncCallback) {
        if self.tx.send(callback).is_err() {
            tracing::trace!("vsync thread gone; dropping callback");
        }
    }
}

impl Drop for TimerVsync {
    fn drop(&mut self) {
        let (tx, _) = mpsc::channel();
        self.tx = tx;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A manually pumped vsync source for tests and headless embedders.
///
/// Armed callbacks queue up until [`ManualVsyncPump::pump`] fires them; the
/// shared queue is the deliberate exception to the no-locks rule, since the
/// pumping side lives outside the pipeline's threads.
pub struct ManualVsync {
    pending: Arc<Mutex<VecDeque<VsyncCallback>>>,
}

/// Pumping side of a [`ManualVsync`].
#[derive(Clone)]
pub struct ManualVsyncPump {
    pending: Arc<Mutex<VecDeque<VsyncCallback>>>,
}

impl ManualVsync {
    /// Create a provider and its pump.
    pub fn new() -> (Self, ManualVsyncPump) {
        let pending = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self {
                pending: pending.clone(),
            },
            ManualVsyncPump { pending },
        )
    }
}

impl VsyncProvider for ManualVsync {
    fn await_vsync(&mut self, callback: VsyncCallback) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(callback);
        }
    }
}

impl ManualVsyncPump {
    /// Fire the oldest armed callback with `frame_time`. Returns whether a
    /// callback was pending.
    pub fn pump(&self, frame_time: Instant) -> bool {
        let callback = match self.pending.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(_) => None,
        };
        match callback {
            Some(callback) => {
                callback(frame_time);
                true
            }
            None => false,
        }
    }

    /// Number of armed callbacks waiting for a tick.
    pub fn pending(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_vsync_fires_in_arm_order() {
        let (mut vsync, pump) = ManualVsync::new();
        let (tx, rx) = mpsc::channel();
        for i in 0..2 {
            let tx = tx.clone();
            vsync.await_vsync(Box::new(move |_| {
                let _ = tx.send(i);
            }));
        }
        assert_eq!(pump.pending(), 2);
        assert!(pump.pump(Instant::now()));
        assert!(pump.pump(Instant::now()));
        assert!(!pump.pump(Instant::now()));
        assert_eq!(rx.try_recv().unwrap(), 0);
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn timer_vsync_delivers_a_tick() {
        let mut vsync = TimerVsync::new(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel();
        let armed_at = Instant::now();
        vsync.await_vsync(Box::new(move |ts| {
            let _ = tx.send(ts);
        }));
        let ts = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(ts >= armed_at);
    }
}
