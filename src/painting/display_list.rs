use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, IntSize, Point, Rect, Rgba8Premul};
use crate::foundation::error::{KilnError, KilnResult};

/// Blend modes available to color filters and vertex meshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlendMode {
    /// Source over destination (normal alpha compositing).
    #[default]
    SrcOver,
    /// Multiply source into destination.
    Modulate,
    /// Inverse-multiply (brightening) blend.
    Screen,
}

/// A color filter installed on an offscreen compositing layer.
///
/// Children painted under the filter are composited back through
/// `color` combined with `blend`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorFilter {
    /// Filter color.
    pub color: Rgba8Premul,
    /// How the filter color combines with the layer content.
    pub blend: BlendMode,
}

/// Paint properties applied when a saved layer is composited back.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupPaint {
    /// Uniform opacity applied at composite time.
    pub opacity: f32,
    /// Optional color filter applied at composite time.
    pub filter: Option<ColorFilter>,
}

impl Default for GroupPaint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            filter: None,
        }
    }
}

impl GroupPaint {
    pub(crate) fn is_passthrough(&self) -> bool {
        self.filter.is_none() && self.opacity >= 1.0
    }
}

/// Shape of a clip installed on the canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ClipShape {
    /// Axis-aligned rectangle in the current transform's space.
    Rect(Rect),
    /// Arbitrary filled path in the current transform's space.
    Path(BezPath),
}

/// Immutable RGBA8 premultiplied pixel data drawn by image ops.
///
/// Pixel payloads are elided from serialized recordings (diagnostic trace
/// blobs record dimensions and byte length only).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageData {
    /// Pixel dimensions.
    pub size: IntSize,
    /// Byte length of the pixel payload.
    pub byte_len: usize,
    #[serde(skip)]
    pixels: Arc<Vec<u8>>,
}

impl ImageData {
    /// Wrap premultiplied RGBA8 bytes. `pixels.len()` must equal
    /// `size.rgba8_byte_len()`.
    pub fn new(size: IntSize, pixels: Vec<u8>) -> KilnResult<Self> {
        if pixels.len() != size.rgba8_byte_len() {
            return Err(KilnError::validation(
                "image pixel length must match rgba8 dimensions",
            ));
        }
        Ok(Self {
            size,
            byte_len: pixels.len(),
            pixels: Arc::new(pixels),
        })
    }

    /// The pixel payload (empty for deserialized recordings).
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A triangle mesh with optional per-vertex colors and texture coordinates.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VertexMesh {
    /// Triangle vertices, three per triangle (or indexed via `indices`).
    pub vertices: Vec<Point>,
    /// Optional texture coordinates, one per vertex when present.
    pub texture_coordinates: Vec<Point>,
    /// Optional colors, one per vertex when present.
    pub colors: Vec<Rgba8Premul>,
    /// Optional triangle indices into `vertices`.
    pub indices: Vec<u32>,
    /// Blend applied between vertex colors and the paint.
    pub blend: BlendMode,
}

impl VertexMesh {
    /// Validate array lengths the way the drawing call requires.
    ///
    /// Length mismatches are caller errors and are surfaced, not absorbed.
    pub fn new(
        vertices: Vec<Point>,
        texture_coordinates: Vec<Point>,
        colors: Vec<Rgba8Premul>,
        indices: Vec<u32>,
        blend: BlendMode,
    ) -> KilnResult<Self> {
        let vertex_count = vertices.len();
        if !texture_coordinates.is_empty() && texture_coordinates.len() != vertex_count {
            return Err(KilnError::validation(
                "vertices and textureCoordinates lengths must match",
            ));
        }
        if !colors.is_empty() && colors.len() != vertex_count {
            return Err(KilnError::validation(
                "vertices and colors lengths must match",
            ));
        }
        if indices.iter().any(|&i| i as usize >= vertex_count) {
            return Err(KilnError::validation(
                "vertex indices must reference existing vertices",
            ));
        }
        Ok(Self {
            vertices,
            texture_coordinates,
            colors,
            indices,
            blend,
        })
    }

    /// Resolve the effective triangle list (indexed or sequential).
    pub(crate) fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let seq: Vec<usize> = if self.indices.is_empty() {
            (0..self.vertices.len()).collect()
        } else {
            self.indices.iter().map(|&i| i as usize).collect()
        };
        (0..seq.len() / 3).map(move |t| [seq[t * 3], seq[t * 3 + 1], seq[t * 3 + 2]])
    }
}

/// A rotation-scale-translation transform for one atlas sprite.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RsTransform {
    /// Cosine of the rotation times the scale.
    pub scos: f64,
    /// Sine of the rotation times the scale.
    pub ssin: f64,
    /// X translation.
    pub tx: f64,
    /// Y translation.
    pub ty: f64,
}

impl RsTransform {
    pub(crate) fn to_affine(self) -> Affine {
        Affine::new([self.scos, self.ssin, -self.ssin, self.scos, self.tx, self.ty])
    }
}

/// A batch of sprites sampled from one atlas image.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AtlasBatch {
    /// Atlas pixels.
    pub atlas: ImageData,
    /// One placement transform per sprite.
    pub transforms: Vec<RsTransform>,
    /// One atlas source rectangle per sprite.
    pub rects: Vec<Rect>,
    /// Optional per-sprite tint colors.
    pub colors: Vec<Rgba8Premul>,
    /// Blend applied between tint and sprite.
    pub blend: BlendMode,
}

impl AtlasBatch {
    /// Validate array lengths the way the drawing call requires.
    pub fn new(
        atlas: ImageData,
        transforms: Vec<RsTransform>,
        rects: Vec<Rect>,
        colors: Vec<Rgba8Premul>,
        blend: BlendMode,
    ) -> KilnResult<Self> {
        if transforms.len() != rects.len() {
            return Err(KilnError::validation(
                "transforms and rects lengths must match",
            ));
        }
        if !colors.is_empty() && colors.len() != rects.len() {
            return Err(KilnError::validation(
                "if supplied, colors length must match that of transforms and rects",
            ));
        }
        Ok(Self {
            atlas,
            transforms,
            rects,
            colors,
            blend,
        })
    }
}

/// One recorded canvas operation.
///
/// `Transform` and `Clip` apply to the remaining ops of the enclosing group;
/// groups are produced by save/save-layer scopes and composite as a unit.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum PaintOp {
    /// Concatenate a transform onto the current matrix.
    Transform(Affine),
    /// Intersect the current clip with a shape.
    Clip(ClipShape),
    /// A save/save-layer scope and its recorded contents.
    Group {
        /// Composite-time paint for the scope.
        paint: GroupPaint,
        /// Optional bounds hint from `save_layer`.
        bounds: Option<Rect>,
        /// Ops recorded inside the scope.
        ops: Vec<PaintOp>,
    },
    /// Fill the whole target with a color, replacing existing content.
    Clear(Rgba8Premul),
    /// Fill an axis-aligned rectangle.
    Rect {
        /// Rectangle in the current transform's space.
        rect: Rect,
        /// Fill color.
        color: Rgba8Premul,
    },
    /// Fill a path.
    Path {
        /// Path in the current transform's space.
        path: BezPath,
        /// Fill color.
        color: Rgba8Premul,
    },
    /// Draw image pixels into a destination rectangle.
    Image {
        /// Source pixels.
        image: ImageData,
        /// Destination rectangle in the current transform's space.
        dst: Rect,
    },
    /// Replay a recorded picture.
    Picture(Arc<Picture>),
    /// Fill a triangle mesh.
    Vertices(VertexMesh),
    /// Stamp sprites out of an atlas image.
    Atlas(AtlasBatch),
}

/// A finished recording, ready to execute or serialize.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DisplayList {
    pub(crate) ops: Vec<PaintOp>,
}

impl DisplayList {
    /// Recorded ops in order.
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Serialize to the diagnostic trace format.
    pub fn to_json_bytes(&self) -> KilnResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| KilnError::serde(e.to_string()))
    }
}

/// An immutable recorded picture: a display list plus its cull rect.
///
/// Pictures are produced once (by application paint code or decoded from a
/// snapshot byte stream) and shared by reference across frames.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Picture {
    cull_rect: Rect,
    display_list: DisplayList,
}

impl Picture {
    /// Wrap a finished recording.
    pub fn new(cull_rect: Rect, display_list: DisplayList) -> Self {
        Self {
            cull_rect,
            display_list,
        }
    }

    /// Conservative bounds of the recorded content.
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// The recorded ops.
    pub fn display_list(&self) -> &DisplayList {
        &self.display_list
    }

    /// Decode a serialized picture byte stream.
    pub fn from_json_bytes(bytes: &[u8]) -> KilnResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| KilnError::serde(e.to_string()))
    }

    /// Serialize to the snapshot/trace byte format.
    pub fn to_json_bytes(&self) -> KilnResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| KilnError::serde(e.to_string()))
    }
}
