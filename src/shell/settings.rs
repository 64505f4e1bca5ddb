use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use crate::foundation::core::Rgba8Premul;

/// Process-wide configuration, constructed once at startup and passed by
/// reference to the components that need it. There are no hidden statics:
/// anything that used to be a global runtime flag lives here.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Baseline color every onscreen frame is cleared to before painting.
    pub clear_color: Rgba8Premul,
    /// Nominal display refresh interval used for frame pacing.
    pub frame_interval: Duration,
    /// Directory diagnostic picture traces are written into.
    pub traces_dir: PathBuf,
    /// Start with forced picture tracing on.
    pub enable_picture_tracing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clear_color: Rgba8Premul::black(),
            frame_interval: Duration::from_nanos(16_666_667),
            traces_dir: std::env::temp_dir(),
            enable_picture_tracing: false,
        }
    }
}

/// Runtime switchboard for the diagnostic picture-trace side channel.
///
/// The flag is the one piece of state shared across threads besides the
/// settings themselves; it is a single atomic, flipped by tooling and read
/// by the rasterizer once per frame.
#[derive(Debug)]
pub struct TracingController {
    picture_tracing: AtomicBool,
    traces_dir: PathBuf,
}

impl TracingController {
    /// Create a controller from startup settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            picture_tracing: AtomicBool::new(settings.enable_picture_tracing),
            traces_dir: settings.traces_dir.clone(),
        }
    }

    /// Whether every frame should be traced regardless of duration.
    pub fn picture_tracing_enabled(&self) -> bool {
        self.picture_tracing.load(Ordering::Relaxed)
    }

    /// Force (or stop forcing) per-frame picture traces.
    pub fn set_picture_tracing_enabled(&self, enabled: bool) {
        self.picture_tracing.store(enabled, Ordering::Relaxed);
    }

    /// Generate a trace file path from the current wall-clock time.
    pub fn picture_tracing_path_for_current_time(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        self.traces_dir.join(format!("kiln_picture_{nanos}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_flag_round_trips() {
        let controller = TracingController::new(&Settings::default());
        assert!(!controller.picture_tracing_enabled());
        controller.set_picture_tracing_enabled(true);
        assert!(controller.picture_tracing_enabled());
    }

    #[test]
    fn trace_paths_land_in_traces_dir() {
        let settings = Settings {
            traces_dir: PathBuf::from("/tmp/kiln-traces"),
            ..Settings::default()
        };
        let controller = TracingController::new(&settings);
        let path = controller.picture_tracing_path_for_current_time();
        assert!(path.starts_with("/tmp/kiln-traces"));
        assert!(path.to_string_lossy().contains("kiln_picture_"));
    }
}
