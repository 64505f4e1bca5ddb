/// Identity of a node within a scene-graph session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Cross-process token under which the compositor exported our root node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportToken(pub u64);

/// Event-mask bit requesting metrics events for a node.
pub const METRICS_EVENT_MASK: u32 = 1 << 0;

/// One queued scene-graph operation.
///
/// Ops are buffered in the session and only reach the compositor at the next
/// present.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneOp {
    /// Bind a local node id to an exported node via its token.
    ImportNode {
        /// Local id being bound.
        node: NodeId,
        /// The compositor's export token.
        token: ImportToken,
    },
    /// Subscribe a node to an event mask.
    SetEventMask {
        /// Target node.
        node: NodeId,
        /// Bitmask of requested event kinds.
        mask: u32,
    },
    /// Attach a painted surface under a node.
    AttachSurface {
        /// Parent node.
        node: NodeId,
        /// Producer surface id.
        surface_id: u64,
    },
    /// Drop every child of a node (the hierarchy is rebuilt each frame).
    DetachChildren {
        /// Parent node.
        node: NodeId,
    },
}

/// Events delivered by the scene-graph system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    /// A node's rendering metrics changed.
    Metrics {
        /// Node the metrics apply to.
        node_id: NodeId,
        /// New physical-per-logical pixel ratio.
        device_pixel_ratio: f64,
    },
    /// A child view attached below a node.
    ViewAttached {
        /// The hosting node.
        node_id: NodeId,
    },
    /// A child view detached.
    ViewDetached {
        /// The hosting node.
        node_id: NodeId,
    },
}

/// What the compositor reports back for a presented frame.
#[derive(Clone, Copy, Debug)]
pub struct PresentationInfo {
    /// When the frame was (or will be) shown.
    pub presentation_time: u64,
    /// The compositor's current frame interval.
    pub presentation_interval: u64,
}

/// Wire seam to the compositor's session endpoint.
///
/// The real transport is an IPC channel; tests substitute a recorder. Both
/// calls are fire-and-forget from the pipeline's point of view.
pub trait SessionTransport: Send {
    /// Deliver a batch of queued ops.
    fn flush(&mut self, ops: Vec<SceneOp>);

    /// Ask the compositor to present, acknowledging via `ack` whenever it
    /// gets around to it.
    fn present(&mut self, presentation_time: u64, ack: Box<dyn FnOnce(PresentationInfo) + Send>);
}

/// Client-side state of one scene-graph session: the op queue and node-id
/// allocation.
pub struct SceneSession {
    transport: Box<dyn SessionTransport>,
    queued: Vec<SceneOp>,
    next_node_id: u32,
}

impl SceneSession {
    /// Bind a session over `transport`.
    pub fn new(transport: Box<dyn SessionTransport>) -> Self {
        Self {
            transport,
            queued: Vec::new(),
            next_node_id: 1,
        }
    }

    /// Queue an op for the next present.
    pub fn enqueue(&mut self, op: SceneOp) {
        self.queued.push(op);
    }

    /// Allocate a node id and queue the import binding it to `token`.
    pub fn import_node(&mut self, token: ImportToken) -> NodeId {
        let node = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.enqueue(SceneOp::ImportNode { node, token });
        node
    }

    /// Flush queued ops and request a present. The acknowledgment is
    /// fire-and-forget.
    pub fn present(&mut self, presentation_time: u64) {
        let ops = std::mem::take(&mut self.queued);
        self.transport.flush(ops);
        self.transport.present(presentation_time, Box::new(|_| {}));
    }
}
