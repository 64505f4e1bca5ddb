use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::{Affine, BezPath, IntSize, Point, Rect, Rgba8Premul};
use crate::foundation::error::KilnResult;
use crate::painting::display_list::{
    AtlasBatch, BlendMode, ClipShape, DisplayList, GroupPaint, ImageData, PaintOp, Picture,
    RsTransform, VertexMesh,
};

struct OpenGroup {
    paint: GroupPaint,
    bounds: Option<Rect>,
    ops: Vec<PaintOp>,
}

/// A recording canvas with save/clip/draw semantics.
///
/// The canvas can be invalidated when the surface behind it is torn down
/// mid-frame; every operation checks validity first and becomes a no-op on an
/// invalid canvas rather than failing. Unbalanced restores are ignored at the
/// base of the save stack.
pub struct PaintCanvas {
    size: IntSize,
    valid: bool,
    base_ops: Vec<PaintOp>,
    // Save stacks are shallow in practice; one slot per clip/filter level.
    stack: SmallVec<[OpenGroup; 4]>,
}

impl PaintCanvas {
    /// Create a canvas recording for a target of `size`.
    pub fn new(size: IntSize) -> Self {
        Self {
            size,
            valid: true,
            base_ops: Vec::new(),
            stack: SmallVec::new(),
        }
    }

    /// Target dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// Whether the canvas still accepts operations.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Detach the canvas from its (torn-down) surface. All subsequent
    /// operations become no-ops.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Depth of the save stack (0 at the base).
    pub fn save_count(&self) -> usize {
        self.stack.len()
    }

    fn push(&mut self, op: PaintOp) {
        match self.stack.last_mut() {
            Some(group) => group.ops.push(op),
            None => self.base_ops.push(op),
        }
    }

    /// Open a plain save scope.
    pub fn save(&mut self) {
        if !self.valid {
            return;
        }
        self.stack.push(OpenGroup {
            paint: GroupPaint::default(),
            bounds: None,
            ops: Vec::new(),
        });
    }

    /// Open an offscreen layer scope composited back with `paint`.
    pub fn save_layer(&mut self, bounds: Option<Rect>, paint: GroupPaint) {
        if !self.valid {
            return;
        }
        self.stack.push(OpenGroup {
            paint,
            bounds,
            ops: Vec::new(),
        });
    }

    /// Close the innermost save scope. A restore at the base is ignored.
    pub fn restore(&mut self) {
        if !self.valid {
            return;
        }
        let Some(group) = self.stack.pop() else {
            return;
        };
        self.push(PaintOp::Group {
            paint: group.paint,
            bounds: group.bounds,
            ops: group.ops,
        });
    }

    /// Translate the current transform.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.concat(Affine::translate((dx, dy)));
    }

    /// Concatenate a transform onto the current matrix.
    pub fn concat(&mut self, transform: Affine) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Transform(transform));
    }

    /// Intersect the clip with a rectangle.
    pub fn clip_rect(&mut self, rect: Rect) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Clip(ClipShape::Rect(rect)));
    }

    /// Intersect the clip with a filled path.
    pub fn clip_path(&mut self, path: &BezPath) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Clip(ClipShape::Path(path.clone())));
    }

    /// Replace the target's content with a color.
    pub fn clear(&mut self, color: Rgba8Premul) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Clear(color));
    }

    /// Fill a rectangle.
    pub fn draw_rect(&mut self, rect: Rect, color: Rgba8Premul) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Rect { rect, color });
    }

    /// Fill a path.
    pub fn draw_path(&mut self, path: &BezPath, color: Rgba8Premul) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Path {
            path: path.clone(),
            color,
        });
    }

    /// Replay a recorded picture under the current transform and clip.
    pub fn draw_picture(&mut self, picture: &Arc<Picture>) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Picture(Arc::clone(picture)));
    }

    /// Draw image pixels into `dst`.
    pub fn draw_image(&mut self, image: ImageData, dst: Rect) {
        if !self.valid {
            return;
        }
        self.push(PaintOp::Image { image, dst });
    }

    /// Fill a triangle mesh.
    ///
    /// Mismatched array lengths are a caller error and are surfaced; they are
    /// the one paint condition that is not absorbed. An invalid canvas still
    /// no-ops before any validation, matching the surface-teardown contract.
    pub fn draw_vertices(
        &mut self,
        vertices: Vec<Point>,
        texture_coordinates: Vec<Point>,
        colors: Vec<Rgba8Premul>,
        indices: Vec<u32>,
        blend: BlendMode,
    ) -> KilnResult<()> {
        if !self.valid {
            return Ok(());
        }
        let mesh = VertexMesh::new(vertices, texture_coordinates, colors, indices, blend)?;
        self.push(PaintOp::Vertices(mesh));
        Ok(())
    }

    /// Stamp sprites out of an atlas image.
    ///
    /// Length mismatches between `transforms`, `rects`, and `colors` are
    /// surfaced to the caller, after the validity check, like
    /// [`draw_vertices`](PaintCanvas::draw_vertices).
    pub fn draw_atlas(
        &mut self,
        atlas: ImageData,
        transforms: Vec<RsTransform>,
        rects: Vec<Rect>,
        colors: Vec<Rgba8Premul>,
        blend: BlendMode,
    ) -> KilnResult<()> {
        if !self.valid {
            return Ok(());
        }
        let batch = AtlasBatch::new(atlas, transforms, rects, colors, blend)?;
        self.push(PaintOp::Atlas(batch));
        Ok(())
    }

    /// Finish recording. Any scopes left open are closed.
    pub fn finish(mut self) -> DisplayList {
        while let Some(group) = self.stack.pop() {
            let op = PaintOp::Group {
                paint: group.paint,
                bounds: group.bounds,
                ops: group.ops,
            };
            match self.stack.last_mut() {
                Some(parent) => parent.ops.push(op),
                None => self.base_ops.push(op),
            }
        }
        DisplayList { ops: self.base_ops }
    }
}
