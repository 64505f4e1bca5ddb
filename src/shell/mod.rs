//! Threads, frame pacing, and engine wiring.
//!
//! The shell stands up the pipeline's three threads — UI (frame building),
//! GPU (rasterization), IO (asset loading) — and the components that live on
//! them. Threads communicate exclusively by posting one-shot messages that
//! carry moved ownership; the only shared state is the immutable
//! [`Settings`](settings::Settings) and the tracing flag.

/// Vsync-paced frame scheduling.
pub mod animator;
/// The UI-thread engine and its collaborator traits.
pub mod engine;
/// Startup configuration and the tracing controller.
pub mod settings;
/// Shell and per-view thread wiring.
pub mod shell_view;
/// Dedicated worker threads draining one-shot tasks.
pub mod task_runner;
/// Vsync providers.
pub mod vsync;

pub use animator::Animator;
pub use engine::{
    DisplayMetrics, Engine, EngineConfig, FrameProducer, UiHandle, UiMsg, ViewportMetrics,
};
pub use settings::{Settings, TracingController};
pub use shell_view::{Shell, ShellView};
pub use task_runner::{TaskRunner, TaskRunnerHandle};
pub use vsync::{ManualVsync, ManualVsyncPump, TimerVsync, VsyncCallback, VsyncProvider};
