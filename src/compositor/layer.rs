use std::sync::Arc;

use crate::compositor::paint_context::ScopedFrame;
use crate::foundation::core::{BezPath, Point, Rect};
use crate::painting::display_list::{ColorFilter, GroupPaint, ImageData, Picture};
use kurbo::Shape as _;

/// One node of the retained scene graph.
///
/// Layers are built during the UI-thread build phase of a frame and are
/// immutable once attached to a [`LayerTree`](crate::LayerTree). A parent
/// exclusively owns its children, so the structure is a tree by construction.
///
/// Every variant's `paint` pushes and pops canvas state symmetrically,
/// including with no children and with degenerate clip shapes.
#[derive(Clone, Debug)]
pub enum Layer {
    /// Paints its children in order with no effect of its own.
    Container {
        /// Child layers, painted front-to-back in vec order.
        children: Vec<Layer>,
    },
    /// Clips its children to an axis-aligned rectangle.
    ClipRect {
        /// Clip rectangle.
        clip: Rect,
        /// Child layers.
        children: Vec<Layer>,
    },
    /// Clips its children to a filled path.
    ClipPath {
        /// Clip path.
        clip: BezPath,
        /// Child layers.
        children: Vec<Layer>,
    },
    /// Composites its children through a color filter.
    ColorFilter {
        /// The filter applied when the offscreen layer is composited back.
        filter: ColorFilter,
        /// Bounds of the offscreen layer.
        bounds: Rect,
        /// Child layers.
        children: Vec<Layer>,
    },
    /// Replays a recorded picture at an offset.
    Picture {
        /// Offset applied before replay.
        offset: Point,
        /// The shared recording.
        picture: Arc<Picture>,
    },
    /// Draws texture pixels into a destination rectangle.
    Texture {
        /// Texture content.
        image: ImageData,
        /// Destination rectangle.
        dst: Rect,
    },
}

impl Layer {
    /// Recursively composite this layer and its children into the frame.
    pub fn paint(&self, frame: &mut ScopedFrame<'_>) {
        match self {
            Layer::Container { children } => {
                Self::paint_children(children, frame);
            }
            Layer::ClipRect { clip, children } => {
                let canvas = frame.canvas();
                canvas.save();
                canvas.clip_rect(*clip);
                Self::paint_children(children, frame);
                frame.canvas().restore();
            }
            Layer::ClipPath { clip, children } => {
                let canvas = frame.canvas();
                canvas.save_layer(Some(clip.bounding_box()), GroupPaint::default());
                canvas.clip_path(clip);
                Self::paint_children(children, frame);
                frame.canvas().restore();
            }
            Layer::ColorFilter {
                filter,
                bounds,
                children,
            } => {
                frame.canvas().save_layer(
                    Some(*bounds),
                    GroupPaint {
                        opacity: 1.0,
                        filter: Some(*filter),
                    },
                );
                Self::paint_children(children, frame);
                frame.canvas().restore();
            }
            Layer::Picture { offset, picture } => {
                let canvas = frame.canvas();
                canvas.save();
                canvas.translate(offset.x, offset.y);
                canvas.draw_picture(picture);
                canvas.restore();
            }
            Layer::Texture { image, dst } => {
                frame.canvas().draw_image(image.clone(), *dst);
            }
        }
    }

    fn paint_children(children: &[Layer], frame: &mut ScopedFrame<'_>) {
        for child in children {
            child.paint(frame);
        }
    }

    /// Conservative axis-aligned bounds of what this layer paints.
    pub fn paint_bounds(&self) -> Rect {
        match self {
            Layer::Container { children } => Self::children_bounds(children),
            Layer::ClipRect { clip, children } => {
                Self::children_bounds(children).intersect(*clip)
            }
            Layer::ClipPath { clip, children } => {
                Self::children_bounds(children).intersect(clip.bounding_box())
            }
            Layer::ColorFilter { bounds, .. } => *bounds,
            Layer::Picture { offset, picture } => {
                picture.cull_rect() + kurbo::Vec2::new(offset.x, offset.y)
            }
            Layer::Texture { dst, .. } => *dst,
        }
    }

    fn children_bounds(children: &[Layer]) -> Rect {
        children
            .iter()
            .map(Layer::paint_bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }
}
