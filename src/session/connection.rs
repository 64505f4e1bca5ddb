use std::sync::Arc;

use crate::foundation::core::{IntSize, Rgba8Premul};
use crate::foundation::error::KilnResult;
use crate::painting::canvas::PaintCanvas;
use crate::painting::display_list::Picture;
use crate::painting::raster::RasterEngine;
use crate::session::producer::{SessionSurface, SurfaceProducer};
use crate::session::scene::{
    ImportToken, METRICS_EVENT_MASK, NodeId, SceneOp, SceneSession, SessionEvent,
    SessionTransport,
};

/// Callback invoked when the root node's device pixel ratio changes.
pub type MetricsCallback = Box<dyn FnMut(f64) + Send>;

/// A deferred paint: rasterized during present, after the frame's scene ops
/// have already been flushed.
pub struct PaintTask {
    /// Content to rasterize.
    pub picture: Arc<Picture>,
    /// Surface size to paint into.
    pub size: IntSize,
    /// Baseline the surface is cleared to first.
    pub clear_color: Rgba8Premul,
}

/// Collects the frame's paint tasks and the session-side metrics.
#[derive(Default)]
pub struct SceneUpdateContext {
    paint_tasks: Vec<PaintTask>,
    device_pixel_ratio: Option<f64>,
}

impl SceneUpdateContext {
    /// Queue a paint task for this frame's present.
    pub fn add_paint_task(&mut self, task: PaintTask) {
        self.paint_tasks.push(task);
    }

    /// Last device pixel ratio the session reported, if any.
    pub fn device_pixel_ratio(&self) -> Option<f64> {
        self.device_pixel_ratio
    }

    fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = Some(ratio);
    }

    fn execute_paint_tasks(
        &mut self,
        raster: &mut RasterEngine,
        producer: &mut SurfaceProducer,
    ) -> KilnResult<Vec<SessionSurface>> {
        let mut surfaces = Vec::with_capacity(self.paint_tasks.len());
        for task in self.paint_tasks.drain(..) {
            let mut surface = producer.produce_surface(task.size)?;
            let mut canvas = PaintCanvas::new(task.size);
            canvas.clear(task.clear_color);
            canvas.draw_picture(&task.picture);
            raster.render(&canvas.finish(), surface.pixmap_mut())?;
            surface.signal_fence();
            surfaces.push(surface);
        }
        Ok(surfaces)
    }
}

/// Binding to a retained scene-graph compositor session.
///
/// On construction the connection imports the root node under its
/// cross-process token, subscribes it to metrics events, and presents once
/// so the compositor processes the binding. Thereafter the scene hierarchy
/// is rebuilt every frame: each present detaches the previous frame's
/// children rather than diffing them.
pub struct SessionConnection {
    debug_label: String,
    session: SceneSession,
    root_node: NodeId,
    scene_update_context: SceneUpdateContext,
    surface_producer: SurfaceProducer,
    raster: RasterEngine,
    metrics_callback: MetricsCallback,
}

impl SessionConnection {
    /// Bind a session, import the root node, and present the binding.
    pub fn new(
        transport: Box<dyn SessionTransport>,
        debug_label: impl Into<String>,
        import_token: ImportToken,
        metrics_callback: MetricsCallback,
    ) -> Self {
        let mut session = SceneSession::new(transport);
        let root_node = session.import_node(import_token);
        session.enqueue(SceneOp::SetEventMask {
            node: root_node,
            mask: METRICS_EVENT_MASK,
        });
        session.present(0);

        Self {
            debug_label: debug_label.into(),
            session,
            root_node,
            scene_update_context: SceneUpdateContext::default(),
            surface_producer: SurfaceProducer::new(),
            raster: RasterEngine::new(),
            metrics_callback,
        }
    }

    /// The label this connection registered under, for diagnostics.
    pub fn debug_label(&self) -> &str {
        &self.debug_label
    }

    /// The imported root node.
    pub fn root_node_id(&self) -> NodeId {
        self.root_node
    }

    /// The frame's scene-update state (paint task queue, metrics).
    pub fn scene_update_context_mut(&mut self) -> &mut SceneUpdateContext {
        &mut self.scene_update_context
    }

    /// Queue a scene op for the next present.
    pub fn enqueue(&mut self, op: SceneOp) {
        self.session.enqueue(op);
    }

    /// Producer pool statistics.
    pub fn surface_producer_stats(&self) -> crate::session::producer::SurfaceProducerStats {
        self.surface_producer.stats()
    }

    /// Process a batch of session events, forwarding metrics changes for the
    /// owned root node and ignoring every other kind.
    pub fn handle_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::Metrics {
                    node_id,
                    device_pixel_ratio,
                } if node_id == self.root_node => {
                    self.scene_update_context
                        .set_device_pixel_ratio(device_pixel_ratio);
                    (self.metrics_callback)(device_pixel_ratio);
                }
                _ => {}
            }
        }
    }

    /// Present one frame.
    ///
    /// Ops queued for this frame flush first — paint tasks have not executed
    /// yet, but their surfaces are fenced, so the compositor can start
    /// processing ops while we finish painting. The producer then gets its
    /// bookkeeping notification, and a detach of the root's children is
    /// queued so the next frame starts from a fresh hierarchy.
    pub fn present(&mut self, presentation_time: u64) -> KilnResult<()> {
        self.session.present(presentation_time);

        let surfaces = self
            .scene_update_context
            .execute_paint_tasks(&mut self.raster, &mut self.surface_producer)?;
        self.surface_producer.on_surfaces_presented(surfaces);

        self.session.enqueue(SceneOp::DetachChildren {
            node: self.root_node,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rect;
    use crate::session::scene::test_support::RecordingTransport;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc;

    fn test_picture() -> Arc<Picture> {
        let mut rec = PaintCanvas::new(IntSize::new(4, 4));
        rec.draw_rect(
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rgba8Premul::from_straight_rgba(0, 255, 0, 255),
        );
        Arc::new(Picture::new(Rect::new(0.0, 0.0, 4.0, 4.0), rec.finish()))
    }

    fn connection() -> (
        SessionConnection,
        mpsc::Receiver<Vec<SceneOp>>,
        mpsc::Receiver<u64>,
    ) {
        let (transport, flush_rx, present_rx) = RecordingTransport::new();
        let connection =
            SessionConnection::new(transport, "test-view", ImportToken(7), Box::new(|_| {}));
        (connection, flush_rx, present_rx)
    }

    #[test]
    fn construction_binds_root_and_presents_once() {
        let (connection, flush_rx, present_rx) = connection();
        let batch = flush_rx.try_recv().unwrap();
        assert_eq!(
            batch,
            vec![
                SceneOp::ImportNode {
                    node: connection.root_node_id(),
                    token: ImportToken(7),
                },
                SceneOp::SetEventMask {
                    node: connection.root_node_id(),
                    mask: METRICS_EVENT_MASK,
                },
            ]
        );
        assert_eq!(present_rx.try_recv().unwrap(), 0);
    }

    #[test]
    fn detach_children_rides_the_next_present() {
        let (mut connection, flush_rx, _present_rx) = connection();
        let _ = flush_rx.try_recv().unwrap();

        connection.present(100).unwrap();
        assert_eq!(flush_rx.try_recv().unwrap(), vec![]);

        connection.present(200).unwrap();
        assert_eq!(
            flush_rx.try_recv().unwrap(),
            vec![SceneOp::DetachChildren {
                node: connection.root_node_id(),
            }]
        );
    }

    #[test]
    fn paint_tasks_execute_fenced_and_recycle_through_the_producer() {
        let (mut connection, _flush_rx, _present_rx) = connection();
        let picture = test_picture();

        for time in [100, 200] {
            connection.scene_update_context_mut().add_paint_task(PaintTask {
                picture: picture.clone(),
                size: IntSize::new(4, 4),
                clear_color: Rgba8Premul::transparent(),
            });
            connection.present(time).unwrap();
        }

        let stats = connection.surface_producer_stats();
        assert_eq!(stats.created, 1, "second frame must reuse the buffer");
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.retained, 1);
    }

    #[test]
    fn metrics_events_filter_to_the_owned_root_node() {
        let (transport, _flush_rx, _present_rx) = RecordingTransport::new();
        let seen = std::sync::Arc::new(AtomicU64::new(0));
        let seen_cb = seen.clone();
        let mut connection = SessionConnection::new(
            transport,
            "test-view",
            ImportToken(7),
            Box::new(move |ratio| {
                seen_cb.store(ratio.to_bits(), Ordering::SeqCst);
            }),
        );
        let root = connection.root_node_id();

        connection.handle_events(vec![
            SessionEvent::ViewAttached { node_id: root },
            SessionEvent::Metrics {
                node_id: NodeId(root.0 + 1),
                device_pixel_ratio: 3.0,
            },
            SessionEvent::Metrics {
                node_id: root,
                device_pixel_ratio: 2.0,
            },
        ]);

        assert_eq!(f64::from_bits(seen.load(Ordering::SeqCst)), 2.0);
        assert_eq!(connection.scene_update_context_mut().device_pixel_ratio(), Some(2.0));
    }
}
