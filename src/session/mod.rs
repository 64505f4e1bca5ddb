//! Alternate compositor backend: a retained scene-graph session.
//!
//! Instead of rasterizing into a locally owned window surface, this backend
//! presents each frame through a scene-graph session owned by a system
//! compositor. Paint still happens locally, into producer-owned surfaces
//! whose handoff is fenced; the scene itself is rebuilt — not diffed — every
//! frame.

/// Session binding, present protocol, and event filtering.
pub mod connection;
/// Producer-side surface pool and bookkeeping.
pub mod producer;
/// Scene ops, events, and the session transport seam.
pub mod scene;

pub use connection::{MetricsCallback, PaintTask, SceneUpdateContext, SessionConnection};
pub use producer::{SessionSurface, SurfaceProducer};
pub use scene::{
    ImportToken, METRICS_EVENT_MASK, NodeId, PresentationInfo, SceneOp, SceneSession,
    SessionEvent, SessionTransport,
};
