use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, Rect};
use crate::foundation::error::{KilnError, KilnResult};
use crate::painting::display_list::{
    AtlasBatch, BlendMode, ClipShape, ColorFilter, DisplayList, ImageData, PaintOp, VertexMesh,
};

/// Maximum retained temp surfaces per (width, height) bucket.
const MAX_TEMPS_PER_BUCKET: usize = 4;

/// Executes recordings into `vello_cpu` pixmaps.
///
/// This is the graphics-library binding the rasterizer creates once per
/// device context and reuses across frames: it caches a `RenderContext`
/// between draws and pools temp surfaces used for group/clip compositing.
/// `vello_cpu` renders into a fresh buffer, so accumulation onto existing
/// content goes through a temp surface and a premultiplied-over composite.
pub struct RasterEngine {
    ctx: Option<vello_cpu::RenderContext>,
    temps: TempSurfaces,
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterEngine {
    /// Create an engine with no cached raster state.
    pub fn new() -> Self {
        Self {
            ctx: None,
            temps: TempSurfaces::default(),
        }
    }

    /// Execute `list` into `target`.
    ///
    /// The target's existing content is kept; recordings that want a defined
    /// baseline start with a clear op.
    pub fn render(&mut self, list: &DisplayList, target: &mut vello_cpu::Pixmap) -> KilnResult<()> {
        self.exec_ops(list.ops(), Affine::IDENTITY, target)
    }

    fn exec_ops(
        &mut self,
        ops: &[PaintOp],
        mut transform: Affine,
        target: &mut vello_cpu::Pixmap,
    ) -> KilnResult<()> {
        let mut batch: Vec<(Affine, &PaintOp)> = Vec::new();
        for (i, op) in ops.iter().enumerate() {
            match op {
                PaintOp::Transform(a) => transform = transform * *a,
                PaintOp::Rect { .. }
                | PaintOp::Path { .. }
                | PaintOp::Image { .. }
                | PaintOp::Vertices(_)
                | PaintOp::Atlas(_) => batch.push((transform, op)),
                PaintOp::Clear(color) => {
                    self.flush_batch(&mut batch, target)?;
                    fill_pixmap(target, color.to_array());
                }
                PaintOp::Picture(picture) => {
                    self.flush_batch(&mut batch, target)?;
                    self.exec_ops(picture.display_list().ops(), transform, target)?;
                }
                PaintOp::Group { paint, ops, .. } => {
                    self.flush_batch(&mut batch, target)?;
                    if paint.is_passthrough() {
                        self.exec_ops(ops, transform, target)?;
                    } else {
                        let mut tmp = self.temps.borrow(target.width(), target.height());
                        clear_to_transparent(&mut tmp);
                        self.exec_ops(ops, transform, &mut tmp)?;
                        if let Some(filter) = paint.filter {
                            apply_color_filter(tmp.data_as_u8_slice_mut(), filter);
                        }
                        premul_over_with_opacity(
                            target.data_as_u8_slice_mut(),
                            tmp.data_as_u8_slice(),
                            paint.opacity,
                        )?;
                        self.temps.release(tmp);
                    }
                }
                PaintOp::Clip(shape) => {
                    // A clip applies to the rest of the enclosing scope:
                    // render the remainder offscreen, mask it by the shape's
                    // coverage under the current transform, and composite.
                    self.flush_batch(&mut batch, target)?;
                    let rest = &ops[i + 1..];
                    if rest.is_empty() {
                        return Ok(());
                    }
                    let mut content = self.temps.borrow(target.width(), target.height());
                    clear_to_transparent(&mut content);
                    self.exec_ops(rest, transform, &mut content)?;

                    let mut mask = self.temps.borrow(target.width(), target.height());
                    clear_to_transparent(&mut mask);
                    self.rasterize_clip_shape(shape, transform, &mut mask)?;
                    apply_mask(content.data_as_u8_slice_mut(), mask.data_as_u8_slice())?;
                    premul_over_with_opacity(
                        target.data_as_u8_slice_mut(),
                        content.data_as_u8_slice(),
                        1.0,
                    )?;
                    self.temps.release(mask);
                    self.temps.release(content);
                    return Ok(());
                }
            }
        }
        self.flush_batch(&mut batch, target)
    }

    fn flush_batch(
        &mut self,
        batch: &mut Vec<(Affine, &PaintOp)>,
        target: &mut vello_cpu::Pixmap,
    ) -> KilnResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let (w, h) = (target.width(), target.height());
        let mut tmp = self.temps.borrow(w, h);
        clear_to_transparent(&mut tmp);

        let mut ctx = self.take_ctx(w, h);
        for (transform, op) in batch.drain(..) {
            draw_op(&mut ctx, transform, op)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut tmp);
        self.ctx = Some(ctx);

        premul_over_with_opacity(target.data_as_u8_slice_mut(), tmp.data_as_u8_slice(), 1.0)?;
        self.temps.release(tmp);
        Ok(())
    }

    fn rasterize_clip_shape(
        &mut self,
        shape: &ClipShape,
        transform: Affine,
        mask: &mut vello_cpu::Pixmap,
    ) -> KilnResult<()> {
        let mut ctx = self.take_ctx(mask.width(), mask.height());
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        match shape {
            ClipShape::Rect(rect) => ctx.fill_rect(&rect_to_cpu(*rect)),
            ClipShape::Path(path) => ctx.fill_path(&bezpath_to_cpu(path)),
        }
        ctx.flush();
        ctx.render_to_pixmap(mask);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn take_ctx(&mut self, width: u16, height: u16) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx
    }
}

fn draw_op(
    ctx: &mut vello_cpu::RenderContext,
    transform: Affine,
    op: &PaintOp,
) -> KilnResult<()> {
    ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    match op {
        PaintOp::Rect { rect, color } => {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.fill_rect(&rect_to_cpu(*rect));
        }
        PaintOp::Path { path, color } => {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        PaintOp::Image { image, dst } => draw_image(ctx, transform, image, *dst)?,
        PaintOp::Vertices(mesh) => draw_vertices(ctx, transform, mesh),
        PaintOp::Atlas(batch) => draw_atlas(ctx, transform, batch)?,
        _ => {}
    }
    Ok(())
}

fn draw_atlas(
    ctx: &mut vello_cpu::RenderContext,
    transform: Affine,
    batch: &AtlasBatch,
) -> KilnResult<()> {
    for (i, (&sprite_transform, &src)) in
        batch.transforms.iter().zip(batch.rects.iter()).enumerate()
    {
        let Some(sprite) = extract_rect(&batch.atlas, src) else {
            continue;
        };
        let tinted = match batch.colors.get(i) {
            Some(&tint) => tint_image(&sprite, tint, batch.blend),
            None => sprite,
        };
        let dst = Rect::new(0.0, 0.0, src.width(), src.height());
        draw_image(ctx, transform * sprite_transform.to_affine(), &tinted, dst)?;
    }
    Ok(())
}

// Copy an integer-aligned subrect out of an atlas. Out-of-bounds or empty
// rects yield nothing.
fn extract_rect(atlas: &ImageData, src: Rect) -> Option<ImageData> {
    let (x0, y0) = (src.x0.floor().max(0.0) as u32, src.y0.floor().max(0.0) as u32);
    let (x1, y1) = (src.x1.ceil() as i64, src.y1.ceil() as i64);
    let (x1, y1) = (
        (x1.max(0) as u32).min(atlas.size.width),
        (y1.max(0) as u32).min(atlas.size.height),
    );
    if x1 <= x0 || y1 <= y0 || atlas.pixels().is_empty() {
        return None;
    }
    let (w, h) = (x1 - x0, y1 - y0);
    let stride = atlas.size.width as usize * 4;
    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for row in y0..y1 {
        let start = row as usize * stride + x0 as usize * 4;
        pixels.extend_from_slice(&atlas.pixels()[start..start + w as usize * 4]);
    }
    ImageData::new(crate::foundation::core::IntSize::new(w, h), pixels).ok()
}

fn tint_image(
    image: &ImageData,
    tint: crate::foundation::core::Rgba8Premul,
    blend: BlendMode,
) -> ImageData {
    let mut pixels = image.pixels().to_vec();
    apply_color_filter(
        &mut pixels,
        ColorFilter {
            color: tint,
            blend,
        },
    );
    ImageData::new(image.size, pixels).unwrap_or_else(|_| image.clone())
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    transform: Affine,
    image: &ImageData,
    dst: Rect,
) -> KilnResult<()> {
    if image.size.is_empty() || image.pixels().is_empty() {
        return Ok(());
    }
    let pixmap = pixmap_from_premul_bytes(image.pixels(), image.size.width, image.size.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };
    let (iw, ih) = (f64::from(image.size.width), f64::from(image.size.height));
    let fit = transform
        * Affine::translate((dst.x0, dst.y0))
        * Affine::scale_non_uniform(dst.width() / iw, dst.height() / ih);
    ctx.set_transform(affine_to_cpu(fit));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    Ok(())
}

// Flat-shaded mesh fill: each triangle takes the average of its vertex
// colors (white when the mesh carries none). Texture coordinates are
// validated at record time but not sampled by the CPU executor.
fn draw_vertices(ctx: &mut vello_cpu::RenderContext, transform: Affine, mesh: &VertexMesh) {
    ctx.set_transform(affine_to_cpu(transform));
    for [a, b, c] in mesh.triangles() {
        let color = if mesh.colors.is_empty() {
            [255u8, 255, 255, 255]
        } else {
            let avg = |f: fn(&crate::foundation::core::Rgba8Premul) -> u8| -> u8 {
                let sum: u16 = [a, b, c]
                    .iter()
                    .map(|&i| u16::from(f(&mesh.colors[i])))
                    .sum();
                (sum / 3) as u8
            };
            [avg(|c| c.r), avg(|c| c.g), avg(|c| c.b), avg(|c| c.a)]
        };
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color[0], color[1], color[2], color[3],
        ));
        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(mesh.vertices[a]));
        path.line_to(point_to_cpu(mesh.vertices[b]));
        path.line_to(point_to_cpu(mesh.vertices[c]));
        path.close_path();
        ctx.fill_path(&path);
    }
}

#[derive(Default)]
struct TempSurfaces {
    free: HashMap<(u16, u16), Vec<vello_cpu::Pixmap>>,
}

impl TempSurfaces {
    fn borrow(&mut self, width: u16, height: u16) -> vello_cpu::Pixmap {
        if let Some(bucket) = self.free.get_mut(&(width, height))
            && let Some(pixmap) = bucket.pop()
        {
            return pixmap;
        }
        vello_cpu::Pixmap::new(width, height)
    }

    fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        let bucket = self
            .free
            .entry((pixmap.width(), pixmap.height()))
            .or_default();
        if bucket.len() < MAX_TEMPS_PER_BUCKET {
            bucket.push(pixmap);
        }
    }
}

pub(crate) fn fill_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

pub(crate) fn clear_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> KilnResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KilnError::paint("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KilnError::paint("pixmap height exceeds u16"))?;
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    let dst = pixmap.data_as_u8_slice_mut();
    if dst.len() != bytes.len() {
        return Err(KilnError::paint("pixmap byte length mismatch"));
    }
    dst.copy_from_slice(bytes);
    Ok(pixmap)
}

fn mul_div255_u8(a: u16, b: u16) -> u8 {
    (((a * b) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

fn premul_over_with_opacity(dst: &mut [u8], src: &[u8], opacity: f32) -> KilnResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KilnError::paint(
            "premul over expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
    Ok(())
}

fn apply_mask(dst: &mut [u8], mask: &[u8]) -> KilnResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(KilnError::paint(
            "mask apply expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let coverage = u16::from(m[3]);
        if coverage == 255 {
            continue;
        }
        for c in 0..4 {
            d[c] = mul_div255_u8(u16::from(d[c]), coverage);
        }
    }
    Ok(())
}

fn apply_color_filter(bytes: &mut [u8], filter: ColorFilter) {
    let f = filter.color.to_array();
    for px in bytes.chunks_exact_mut(4) {
        match filter.blend {
            BlendMode::Modulate => {
                for c in 0..4 {
                    px[c] = mul_div255_u8(u16::from(px[c]), u16::from(f[c]));
                }
            }
            BlendMode::SrcOver => {
                let inv = 255u16 - u16::from(f[3]);
                for c in 0..4 {
                    px[c] = add_sat_u8(f[c], mul_div255_u8(u16::from(px[c]), inv));
                }
            }
            BlendMode::Screen => {
                for c in 0..4 {
                    let s = u16::from(f[c]);
                    let d = u16::from(px[c]);
                    px[c] = (s + d - u16::from(mul_div255_u8(s, d))).min(255) as u8;
                }
            }
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: crate::foundation::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{IntSize, Point, Rgba8Premul};
    use crate::painting::canvas::PaintCanvas;
    use crate::painting::display_list::{GroupPaint, Picture};

    fn px(pixmap: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
        let w = pixmap.width() as usize;
        let data = pixmap.data_as_u8_slice();
        let i = (y * w + x) * 4;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    fn red() -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(255, 0, 0, 255)
    }

    fn render_canvas(canvas: PaintCanvas) -> vello_cpu::Pixmap {
        let mut target = vello_cpu::Pixmap::new(8, 8);
        RasterEngine::new()
            .render(&canvas.finish(), &mut target)
            .unwrap();
        target
    }

    #[test]
    fn clear_then_rect_paints_inside_only() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.clear(Rgba8Premul::transparent());
        canvas.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), red());
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 1, 1), [255, 0, 0, 255]);
        assert_eq!(px(&target, 6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_rect_masks_content_outside() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.save();
        canvas.clip_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        canvas.draw_rect(Rect::new(0.0, 0.0, 8.0, 8.0), red());
        canvas.restore();
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 1, 1), [255, 0, 0, 255]);
        assert_eq!(px(&target, 6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn empty_clip_path_masks_everything_without_crashing() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.save();
        canvas.clip_path(&BezPath::new());
        canvas.draw_rect(Rect::new(0.0, 0.0, 8.0, 8.0), red());
        canvas.restore();
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 4, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn group_opacity_scales_alpha() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.save_layer(
            None,
            GroupPaint {
                opacity: 0.5,
                filter: None,
            },
        );
        canvas.draw_rect(Rect::new(0.0, 0.0, 8.0, 8.0), red());
        canvas.restore();
        let target = render_canvas(canvas);
        let p = px(&target, 4, 4);
        assert!(p[3] > 100 && p[3] < 160, "alpha {} not ~128", p[3]);
    }

    #[test]
    fn modulate_filter_tints_layer_content() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.save_layer(
            None,
            GroupPaint {
                opacity: 1.0,
                filter: Some(ColorFilter {
                    color: red(),
                    blend: BlendMode::Modulate,
                }),
            },
        );
        canvas.draw_rect(
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Rgba8Premul::from_straight_rgba(255, 255, 255, 255),
        );
        canvas.restore();
        let target = render_canvas(canvas);
        let p = px(&target, 4, 4);
        assert!(p[0] > 250 && p[1] < 5 && p[2] < 5, "expected red tint, got {p:?}");
    }

    #[test]
    fn translated_picture_replays_at_offset() {
        let mut rec = PaintCanvas::new(IntSize::new(2, 2));
        rec.draw_rect(Rect::new(0.0, 0.0, 2.0, 2.0), red());
        let picture = Arc::new(Picture::new(Rect::new(0.0, 0.0, 2.0, 2.0), rec.finish()));

        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.save();
        canvas.translate(4.0, 4.0);
        canvas.draw_picture(&picture);
        canvas.restore();
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 5, 5), [255, 0, 0, 255]);
        assert_eq!(px(&target, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn vertices_fill_their_triangle() {
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas
            .draw_vertices(
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(8.0, 0.0),
                    Point::new(0.0, 8.0),
                ],
                vec![],
                vec![red(), red(), red()],
                vec![],
                BlendMode::SrcOver,
            )
            .unwrap();
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 1, 1), [255, 0, 0, 255]);
        assert_eq!(px(&target, 7, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn atlas_sprites_stamp_at_their_transforms() {
        // 2x1 atlas: left pixel red, right pixel blue.
        let atlas = ImageData::new(
            IntSize::new(2, 1),
            vec![255, 0, 0, 255, 0, 0, 255, 255],
        )
        .unwrap();
        let sprite = |tx: f64| crate::painting::display_list::RsTransform {
            scos: 1.0,
            ssin: 0.0,
            tx,
            ty: 0.0,
        };
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas
            .draw_atlas(
                atlas,
                vec![sprite(0.0), sprite(4.0)],
                vec![
                    Rect::new(0.0, 0.0, 1.0, 1.0),
                    Rect::new(1.0, 0.0, 2.0, 1.0),
                ],
                vec![],
                BlendMode::SrcOver,
            )
            .unwrap();
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 0, 0), [255, 0, 0, 255]);
        assert_eq!(px(&target, 4, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn image_draws_scaled_into_dst() {
        let mut pixels = vec![0u8; 4];
        pixels.copy_from_slice(&[0, 0, 255, 255]);
        let image = ImageData::new(IntSize::new(1, 1), pixels).unwrap();
        let mut canvas = PaintCanvas::new(IntSize::new(8, 8));
        canvas.draw_image(image, Rect::new(2.0, 2.0, 6.0, 6.0));
        let target = render_canvas(canvas);
        assert_eq!(px(&target, 4, 4), [0, 0, 255, 255]);
        assert_eq!(px(&target, 0, 0), [0, 0, 0, 0]);
    }
}
