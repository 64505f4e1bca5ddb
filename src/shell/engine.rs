use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use crate::compositor::layer::Layer;
use crate::compositor::layer_tree::LayerTree;
use crate::foundation::core::{IntSize, Point};
use crate::foundation::error::{KilnError, KilnResult};
use crate::gpu::{AcceleratedWidget, GpuHandle, GpuMsg};
use crate::painting::display_list::Picture;
use crate::shell::animator::Animator;
use crate::shell::task_runner::TaskRunnerHandle;
use crate::shell::vsync::VsyncProvider;

/// Raw viewport geometry delivered by the platform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportMetrics {
    /// Viewport width in physical pixels.
    pub physical_width: u32,
    /// Viewport height in physical pixels.
    pub physical_height: u32,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
    /// Top inset in logical pixels.
    pub padding_top: f64,
    /// Right inset in logical pixels.
    pub padding_right: f64,
    /// Bottom inset in logical pixels.
    pub padding_bottom: f64,
    /// Left inset in logical pixels.
    pub padding_left: f64,
}

/// Display geometry forwarded to the frame producer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayMetrics {
    /// Viewport size in physical pixels.
    pub physical_size: IntSize,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
    /// Insets in logical pixels: top, right, bottom, left.
    pub padding: [f64; 4],
}

/// The application side of the pipeline — in the full engine, the scripting
/// VM. Asked for a layer tree once per paced frame.
pub trait FrameProducer: Send {
    /// Build the next frame's layer tree.
    ///
    /// Returning `None` (no view attached, nothing changed) is a valid,
    /// silent outcome: no frame is submitted and pacing simply continues.
    fn begin_frame(&mut self, frame_time: Instant) -> Option<LayerTree>;

    /// Observe a display-geometry change.
    fn set_display_metrics(&mut self, _metrics: &DisplayMetrics) {}
}

/// Messages handled by the UI thread's engine loop.
pub enum UiMsg {
    /// Platform produced a drawable.
    WidgetAvailable(AcceleratedWidget),
    /// Platform tore the drawable down.
    OutputSurfaceDestroyed,
    /// Viewport geometry changed.
    ViewportMetricsChanged(ViewportMetrics),
    /// The hosting activity went to the background.
    ActivityPaused,
    /// The hosting activity came to the foreground.
    ActivityResumed,
    /// Attach the application frame producer.
    SetProducer(Box<dyn FrameProducer>),
    /// Load a serialized picture snapshot off the IO thread and attach a
    /// producer that renders it.
    RunFromSnapshot(PathBuf),
    /// IO thread finished loading a snapshot.
    SnapshotLoaded(KilnResult<Picture>),
    /// The producer asks for a frame.
    ScheduleFrame,
    /// A vsync tick armed by the animator.
    Vsync {
        /// Monotonic timestamp of the tick.
        frame_time: Instant,
        /// Animator generation the tick was armed under.
        generation: u64,
    },
    /// The GPU thread finished the in-flight frame.
    FrameComplete,
    /// Stop the UI loop and drop the engine on its own thread.
    Shutdown,
}

/// Posting side of the UI thread's message queue.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::Sender<UiMsg>,
}

impl UiHandle {
    /// Create a queue, returning the posting and receiving halves.
    pub fn channel() -> (Self, mpsc::Receiver<UiMsg>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Post one message to the UI thread.
    pub fn post(&self, msg: UiMsg) {
        if self.tx.send(msg).is_err() {
            tracing::trace!("ui thread gone; dropping message");
        }
    }
}

/// Wiring the engine needs at construction.
pub struct EngineConfig {
    /// GPU thread posting handle.
    pub gpu: GpuHandle,
    /// IO thread posting handle.
    pub io: TaskRunnerHandle,
    /// The engine's own queue, for messages posted back to itself.
    pub ui: UiHandle,
    /// Vsync source for the animator.
    pub vsync: Box<dyn VsyncProvider>,
}

/// The UI-thread coordinator.
///
/// Tracks the two gates that allow frame production — a live output surface
/// and a running activity — asks the [`FrameProducer`] for layer trees on
/// paced vsync ticks, stamps them with frame size and construction time, and
/// moves them to the GPU thread.
pub struct Engine {
    gpu: GpuHandle,
    io: TaskRunnerHandle,
    animator: Animator,

    producer: Option<Box<dyn FrameProducer>>,
    physical_size: IntSize,
    display_metrics: DisplayMetrics,

    activity_running: bool,
    have_surface: bool,
}

impl Engine {
    /// Create an engine with no producer attached.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            gpu: config.gpu,
            io: config.io,
            animator: Animator::new(config.vsync, config.ui),
            producer: None,
            physical_size: IntSize::default(),
            display_metrics: DisplayMetrics::default(),
            activity_running: false,
            have_surface: false,
        }
    }

    /// Whether the activity is in the foreground.
    pub fn activity_running(&self) -> bool {
        self.activity_running
    }

    /// Whether an output surface is live.
    pub fn have_surface(&self) -> bool {
        self.have_surface
    }

    /// Handle one message. Returns `false` for [`UiMsg::Shutdown`], which
    /// ends the loop.
    pub fn dispatch(&mut self, msg: UiMsg) -> bool {
        match msg {
            UiMsg::WidgetAvailable(widget) => self.on_widget_available(widget),
            UiMsg::OutputSurfaceDestroyed => self.on_output_surface_destroyed(),
            UiMsg::ViewportMetricsChanged(metrics) => self.on_viewport_metrics_changed(metrics),
            UiMsg::ActivityPaused => self.on_activity_paused(),
            UiMsg::ActivityResumed => self.on_activity_resumed(),
            UiMsg::SetProducer(producer) => self.set_producer(producer),
            UiMsg::RunFromSnapshot(path) => self.run_from_snapshot(path),
            UiMsg::SnapshotLoaded(result) => self.on_snapshot_loaded(result),
            UiMsg::ScheduleFrame => self.schedule_frame(),
            UiMsg::Vsync {
                frame_time,
                generation,
            } => self.on_vsync(frame_time, generation),
            UiMsg::FrameComplete => self.animator.on_frame_complete(),
            UiMsg::Shutdown => return false,
        }
        true
    }

    /// Build one layer tree, stamping frame size and construction time.
    pub fn begin_frame(&mut self, frame_time: Instant) -> Option<LayerTree> {
        let producer = self.producer.as_mut()?;
        let begin = Instant::now();
        let mut tree = producer.begin_frame(frame_time)?;
        tree.set_frame_size(self.physical_size);
        tree.set_construction_time(begin.elapsed());
        Some(tree)
    }

    /// Ask the animator for a frame at the next vsync.
    pub fn schedule_frame(&mut self) {
        self.animator.request_frame();
    }

    fn on_widget_available(&mut self, widget: AcceleratedWidget) {
        self.gpu.post(GpuMsg::WidgetAvailable(widget));
        self.have_surface = true;
        self.start_animator_if_possible();
        if self.producer.is_some() {
            self.schedule_frame();
        }
    }

    fn on_output_surface_destroyed(&mut self) {
        self.have_surface = false;
        self.animator.stop();
        self.gpu.post(GpuMsg::SurfaceDestroyed);
    }

    fn on_viewport_metrics_changed(&mut self, metrics: ViewportMetrics) {
        self.physical_size = IntSize::new(metrics.physical_width, metrics.physical_height);
        self.display_metrics = DisplayMetrics {
            physical_size: self.physical_size,
            device_pixel_ratio: metrics.device_pixel_ratio,
            padding: [
                metrics.padding_top,
                metrics.padding_right,
                metrics.padding_bottom,
                metrics.padding_left,
            ],
        };
        if let Some(producer) = self.producer.as_mut() {
            producer.set_display_metrics(&self.display_metrics);
        }
    }

    fn on_activity_paused(&mut self) {
        self.activity_running = false;
        self.animator.stop();
    }

    fn on_activity_resumed(&mut self) {
        self.activity_running = true;
        self.start_animator_if_possible();
    }

    fn start_animator_if_possible(&mut self) {
        if self.activity_running && self.have_surface {
            self.animator.start();
        }
    }

    fn set_producer(&mut self, mut producer: Box<dyn FrameProducer>) {
        producer.set_display_metrics(&self.display_metrics);
        self.producer = Some(producer);
        self.schedule_frame();
    }

    fn run_from_snapshot(&mut self, path: PathBuf) {
        let ui = self.ui_for_io();
        self.io.post(move || {
            let result = std::fs::read(&path)
                .map_err(|e| {
                    KilnError::serde(format!("failed to read snapshot {}: {e}", path.display()))
                })
                .and_then(|bytes| Picture::from_json_bytes(&bytes));
            ui.post(UiMsg::SnapshotLoaded(result));
        });
    }

    fn on_snapshot_loaded(&mut self, result: KilnResult<Picture>) {
        match result {
            Ok(picture) => self.set_producer(Box::new(SnapshotProducer::new(picture))),
            Err(e) => tracing::warn!(error = %e, "snapshot load failed"),
        }
    }

    fn ui_for_io(&self) -> UiHandle {
        self.animator.ui_handle()
    }

    fn on_vsync(&mut self, frame_time: Instant, generation: u64) {
        if !self.animator.on_vsync(generation) {
            return;
        }
        if !self.activity_running || !self.have_surface {
            return;
        }
        let Some(tree) = self.begin_frame(frame_time) else {
            return;
        };
        self.gpu.post(GpuMsg::Draw(Box::new(tree)));
        self.animator.did_submit_frame();
    }
}

/// Renders a loaded snapshot picture every frame.
struct SnapshotProducer {
    picture: Arc<Picture>,
}

impl SnapshotProducer {
    fn new(picture: Picture) -> Self {
        Self {
            picture: Arc::new(picture),
        }
    }
}

impl FrameProducer for SnapshotProducer {
    fn begin_frame(&mut self, _frame_time: Instant) -> Option<LayerTree> {
        Some(LayerTree::new(Layer::Picture {
            offset: Point::new(0.0, 0.0),
            picture: self.picture.clone(),
        }))
    }
}
