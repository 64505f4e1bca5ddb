use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use crate::gpu::{GpuHandle, GpuMsg, Rasterizer};
use crate::shell::engine::{Engine, EngineConfig, UiHandle, UiMsg};
use crate::shell::settings::{Settings, TracingController};
use crate::shell::task_runner::{TaskRunner, TaskRunnerHandle};
use crate::shell::vsync::VsyncProvider;

/// Process-level shell state shared by views: the startup settings, the
/// tracing controller, and the IO thread.
pub struct Shell {
    settings: Arc<Settings>,
    tracing_controller: Arc<TracingController>,
    io: TaskRunner,
}

impl Shell {
    /// Stand up the shell with `settings`.
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        let tracing_controller = Arc::new(TracingController::new(&settings));
        Self {
            settings,
            tracing_controller,
            io: TaskRunner::spawn("kiln-io"),
        }
    }

    /// The immutable startup settings.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.clone()
    }

    /// The shared tracing controller.
    pub fn tracing_controller(&self) -> Arc<TracingController> {
        self.tracing_controller.clone()
    }

    /// Posting handle for the IO thread.
    pub fn io_task_runner(&self) -> TaskRunnerHandle {
        self.io.handle()
    }
}

/// One rendering view: a UI thread running an [`Engine`] and a GPU thread
/// running a [`Rasterizer`], wired back-to-back.
///
/// Dropping the view posts shutdown to both loops and joins them, so each
/// component is destroyed on the thread that owns it — the engine's script
/// state and the rasterizer's device context never cross threads, even at
/// teardown.
pub struct ShellView {
    ui: UiHandle,
    gpu: GpuHandle,
    ui_thread: Option<thread::JoinHandle<()>>,
    gpu_thread: Option<thread::JoinHandle<()>>,
}

impl ShellView {
    /// Spawn the view's UI and GPU threads.
    pub fn new(shell: &Shell, vsync: Box<dyn VsyncProvider>) -> Self {
        let (gpu_tx, gpu_rx) = mpsc::channel::<GpuMsg>();
        let gpu = GpuHandle::new(gpu_tx);
        let (ui, ui_rx) = UiHandle::channel();

        let settings = shell.settings();
        let tracing_controller = shell.tracing_controller();
        let ui_for_gpu = ui.clone();
        let gpu_thread = thread::Builder::new()
            .name("kiln-gpu".to_owned())
            .spawn(move || {
                let mut rasterizer = Rasterizer::new(settings, tracing_controller);
                while let Ok(msg) = gpu_rx.recv() {
                    match msg {
                        GpuMsg::WidgetAvailable(widget) => rasterizer.on_widget_available(widget),
                        GpuMsg::SurfaceDestroyed => rasterizer.on_output_surface_destroyed(),
                        GpuMsg::Draw(tree) => {
                            rasterizer.draw(*tree);
                            ui_for_gpu.post(UiMsg::FrameComplete);
                        }
                        GpuMsg::Shutdown => break,
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn gpu thread: {e}"));

        let config = EngineConfig {
            gpu: gpu.clone(),
            io: shell.io_task_runner(),
            ui: ui.clone(),
            vsync,
        };
        let ui_thread = thread::Builder::new()
            .name("kiln-ui".to_owned())
            .spawn(move || {
                let mut engine = Engine::new(config);
                while let Ok(msg) = ui_rx.recv() {
                    if !engine.dispatch(msg) {
                        break;
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn ui thread: {e}"));

        Self {
            ui,
            gpu,
            ui_thread: Some(ui_thread),
            gpu_thread: Some(gpu_thread),
        }
    }

    /// Posting handle for platform glue (widgets, metrics, lifecycle) and
    /// producer attachment.
    pub fn ui_handle(&self) -> UiHandle {
        self.ui.clone()
    }

    /// Posting handle straight to the GPU loop.
    pub fn gpu_handle(&self) -> GpuHandle {
        self.gpu.clone()
    }
}

impl Drop for ShellView {
    fn drop(&mut self) {
        self.ui.post(UiMsg::Shutdown);
        self.gpu.post(GpuMsg::Shutdown);
        if let Some(thread) = self.ui_thread.take() {
            let _ = thread.join();
        }
        if let Some(thread) = self.gpu_thread.take() {
            let _ = thread.join();
        }
    }
}
