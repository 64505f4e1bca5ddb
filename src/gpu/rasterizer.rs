use std::sync::Arc;
use std::time::Duration;

use crate::compositor::layer_tree::LayerTree;
use crate::compositor::paint_context::PaintContext;
use crate::gpu::context::DeviceContext;
use crate::gpu::surface::{AcceleratedWidget, RenderSurface, WindowSurface};
use crate::painting::raster::RasterEngine;
use crate::shell::settings::{Settings, TracingController};

/// One frame interval at the nominal 60Hz refresh.
const ONE_FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// The GPU-thread draw driver.
///
/// Owns the window surface, the device context, and the raster engine, and
/// turns each submitted [`LayerTree`] into a presented frame. Lifecycle:
///
/// - no surface: draws are silently dropped (normal during startup and
///   teardown, not an error);
/// - widget available: the window surface exists and draws present;
/// - surface destroyed: device state is torn down in dependency order and
///   the rasterizer returns to the no-surface state.
///
/// Failure to create the device context or the render surface is fatal —
/// there is no degraded-rendering fallback, by design.
pub struct Rasterizer {
    settings: Arc<Settings>,
    tracing_controller: Arc<TracingController>,

    surface: Option<WindowSurface>,
    device: Option<DeviceContext>,
    raster: Option<RasterEngine>,
    render_surface: Option<RenderSurface>,

    paint_context: PaintContext,
}

impl Rasterizer {
    /// Create a rasterizer in the no-surface state.
    pub fn new(settings: Arc<Settings>, tracing_controller: Arc<TracingController>) -> Self {
        Self {
            settings,
            tracing_controller,
            surface: None,
            device: None,
            raster: None,
            render_surface: None,
            paint_context: PaintContext::new(),
        }
    }

    /// Paint instrumentation (frame counts, engine/paint stopwatches).
    pub fn paint_context(&self) -> &PaintContext {
        &self.paint_context
    }

    /// The window surface, when one is bound.
    pub fn window_surface(&self) -> Option<&WindowSurface> {
        self.surface.as_ref()
    }

    /// Bind the platform drawable. A window surface is required; failure to
    /// create one is fatal.
    pub fn on_widget_available(&mut self, widget: AcceleratedWidget) {
        let surface = WindowSurface::create(widget)
            .unwrap_or_else(|e| panic!("window surface required: {e}"));
        self.surface = Some(surface);
    }

    /// Rasterize and present one layer tree.
    ///
    /// With no surface bound the frame is dropped without touching any
    /// instrumentation.
    pub fn draw(&mut self, layer_tree: LayerTree) {
        let _span = tracing::debug_span!("rasterizer_draw").entered();

        let Some(surface) = self.surface.as_mut() else {
            tracing::trace!("no output surface; dropping frame");
            return;
        };

        let size = layer_tree.frame_size();
        if surface.size() != size {
            surface.resize(size);
        }

        // The compositor cannot know how long layer-tree construction took;
        // the tree carries that measurement from the UI thread.
        self.paint_context
            .engine_time_mut()
            .set_lap_time(layer_tree.construction_time());

        let device = self.device.get_or_insert_with(|| {
            DeviceContext::create().unwrap_or_else(|e| panic!("device context required: {e}"))
        });
        device
            .make_current()
            .unwrap_or_else(|e| panic!("device context must be current: {e}"));
        let raster = self.raster.get_or_insert_with(RasterEngine::new);

        let render_surface = match self.render_surface.take() {
            Some(rs) if rs.size() == size => self.render_surface.insert(rs),
            _ => self.render_surface.insert(
                RenderSurface::new(size)
                    .unwrap_or_else(|e| panic!("render surface required: {e}")),
            ),
        };

        {
            let mut frame = self.paint_context.acquire_frame(size);
            frame.canvas().clear(self.settings.clear_color);
            layer_tree.root_layer().paint(&mut frame);
            if let Err(e) = frame.submit_to(raster, render_surface.pixmap_mut()) {
                tracing::warn!(error = %e, "paint pass failed; dropping frame");
                return;
            }
            surface.present(render_surface.pixmap());
        }

        // While rendering the last frame, if we exceeded the tracing
        // threshold carried by the layer tree, force a trace to disk.
        let frame_exceeded_threshold = exceeded_tracing_threshold(
            self.paint_context.frame_time().last_lap(),
            layer_tree.rasterizer_tracing_threshold(),
        );

        if frame_exceeded_threshold || self.tracing_controller.picture_tracing_enabled() {
            let path = self.tracing_controller.picture_tracing_path_for_current_time();
            tracing::debug!(path = %path.display(), "tracing frame picture");
            let mut file_frame = self.paint_context.acquire_file_frame(path, size);
            layer_tree.root_layer().paint(&mut file_frame);
        }
    }

    /// Tear down device state and return to the no-surface state.
    ///
    /// The context must be current while its dependents are destroyed; the
    /// render surface goes first, then the raster engine, then the context,
    /// and the window surface last.
    pub fn on_output_surface_destroyed(&mut self) {
        if let Some(device) = self.device.as_mut() {
            if device.make_current().is_err() {
                tracing::warn!("device context not current during teardown");
            }
            self.render_surface = None;
            self.raster = None;
        }
        self.device = None;
        self.surface = None;
    }
}

/// Whether the last paint lap missed enough frame intervals to force a
/// diagnostic trace. A zero threshold disables tracing.
fn exceeded_tracing_threshold(last_lap: Duration, threshold_intervals: u32) -> bool {
    threshold_intervals != 0 && last_lap > ONE_FRAME_DURATION * threshold_intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::layer::Layer;
    use crate::foundation::core::{IntSize, Point, Rect, Rgba8Premul};
    use crate::painting::canvas::PaintCanvas;
    use crate::painting::display_list::Picture;
    

    fn rasterizer_with(settings: Settings) -> Rasterizer {
        let settings = Arc::new(settings);
        let tracing_controller = Arc::new(TracingController::new(&settings));
        Rasterizer::new(settings, tracing_controller)
    }

    fn rasterizer() -> Rasterizer {
        rasterizer_with(Settings::default())
    }

    fn widget(size: IntSize) -> AcceleratedWidget {
        AcceleratedWidget { id: 7, size }
    }

    fn red_tree(size: IntSize) -> LayerTree {
        let mut rec = PaintCanvas::new(size);
        rec.draw_rect(
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rgba8Premul::from_straight_rgba(255, 0, 0, 255),
        );
        let picture = Arc::new(Picture::new(Rect::new(0.0, 0.0, 4.0, 4.0), rec.finish()));
        let mut tree = LayerTree::new(Layer::Picture {
            offset: Point::new(0.0, 0.0),
            picture,
        });
        tree.set_frame_size(size);
        tree.set_construction_time(Duration::from_millis(1));
        tree
    }

    #[test]
    fn draw_without_surface_drops_frame_silently() {
        let mut rasterizer = rasterizer();
        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(rasterizer.paint_context().frame_count(), 0);
    }

    #[test]
    fn draw_presents_painted_pixels() {
        let mut rasterizer = rasterizer();
        rasterizer.on_widget_available(widget(IntSize::new(8, 8)));
        rasterizer.draw(red_tree(IntSize::new(8, 8)));

        assert_eq!(rasterizer.paint_context().frame_count(), 1);
        let surface = rasterizer.window_surface().unwrap();
        assert_eq!(surface.present_count(), 1);
        let front = surface.front().unwrap();
        assert_eq!(&front.data_as_u8_slice()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn surface_resizes_only_when_frame_size_changes() {
        let mut rasterizer = rasterizer();
        rasterizer.on_widget_available(widget(IntSize::new(800, 600)));
        rasterizer.draw(red_tree(IntSize::new(800, 600)));
        {
            let surface = rasterizer.window_surface().unwrap();
            assert_eq!(surface.size(), IntSize::new(800, 600));
            assert_eq!(surface.present_count(), 1);
        }

        rasterizer.draw(red_tree(IntSize::new(1024, 768)));
        let surface = rasterizer.window_surface().unwrap();
        assert_eq!(surface.size(), IntSize::new(1024, 768));
        let front = surface.front().unwrap();
        assert_eq!(front.width(), 1024);
        assert_eq!(front.height(), 768);
    }

    #[test]
    fn destroy_then_draw_noops_without_crash() {
        let mut rasterizer = rasterizer();
        rasterizer.on_widget_available(widget(IntSize::new(8, 8)));
        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(rasterizer.paint_context().frame_count(), 1);

        rasterizer.on_output_surface_destroyed();
        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(rasterizer.paint_context().frame_count(), 1);
        assert!(rasterizer.window_surface().is_none());
    }

    #[test]
    fn threshold_predicate_matches_missed_intervals() {
        assert!(exceeded_tracing_threshold(Duration::from_millis(40), 2));
        assert!(!exceeded_tracing_threshold(Duration::from_millis(10), 2));
        assert!(!exceeded_tracing_threshold(Duration::from_millis(40), 0));
    }

    #[test]
    fn forced_picture_tracing_writes_one_file_per_draw() {
        let traces_dir = std::env::temp_dir().join(format!(
            "kiln_trace_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&traces_dir).unwrap();

        let mut rasterizer = rasterizer_with(Settings {
            traces_dir: traces_dir.clone(),
            ..Settings::default()
        });
        rasterizer.on_widget_available(widget(IntSize::new(8, 8)));

        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(std::fs::read_dir(&traces_dir).unwrap().count(), 0);

        rasterizer
            .tracing_controller
            .set_picture_tracing_enabled(true);
        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(std::fs::read_dir(&traces_dir).unwrap().count(), 1);

        rasterizer
            .tracing_controller
            .set_picture_tracing_enabled(false);
        rasterizer.draw(red_tree(IntSize::new(8, 8)));
        assert_eq!(std::fs::read_dir(&traces_dir).unwrap().count(), 1);

        let _ = std::fs::remove_dir_all(&traces_dir);
    }
}
