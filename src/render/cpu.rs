//! CPU rasterization of draw lists with `vello_cpu`.

use crate::foundation::core::{Affine, BezPath, Point, Rgba8};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::render::draw::{DrawList, DrawOp};

#[derive(Clone, Debug)]
/// Rasterized layer in premultiplied RGBA8, row-major.
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Always `true` for rasterizer output.
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Pixel at `(x, y)` as stored.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Straight-alpha copy of the pixel data, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
            }
        }
        out
    }
}

/// Rasterizes [`DrawList`]s onto a fixed-size surface.
#[derive(Clone, Debug)]
pub struct CpuRasterizer {
    width: u16,
    height: u16,
    clear: Option<Rgba8>,
}

impl CpuRasterizer {
    /// Rasterizer for a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> CanvasmarkResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| CanvasmarkError::render("surface width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| CanvasmarkError::render("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(CanvasmarkError::render("surface must be non-empty"));
        }
        Ok(Self {
            width,
            height,
            clear: None,
        })
    }

    /// Fill the surface with `color` before drawing.
    pub fn with_clear(mut self, color: Rgba8) -> Self {
        self.clear = Some(color);
        self
    }

    /// Rasterize `list` in order.
    #[tracing::instrument(skip_all, fields(ops = list.len()))]
    pub fn rasterize(&self, list: &DrawList) -> CanvasmarkResult<FrameRgba> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        let clear = self
            .clear
            .map(|c| premul_rgba8(c.r, c.g, c.b, c.a))
            .unwrap_or([0, 0, 0, 0]);
        clear_pixmap(&mut pixmap, clear);

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        for op in &list.ops {
            draw_op(&mut ctx, op);
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRgba {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::FillPath {
            path,
            transform,
            color,
            opacity,
        } => {
            ctx.set_transform(affine_to_cpu(*transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.set_fill_rule(vello_cpu::peniko::Fill::EvenOdd);
            with_opacity(ctx, *opacity, |ctx| ctx.fill_path(&bezpath_to_cpu(path)));
        }
        DrawOp::StrokePath {
            path,
            transform,
            color,
            width,
            opacity,
        } => {
            ctx.set_transform(affine_to_cpu(*transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            with_opacity(ctx, *opacity, |ctx| ctx.stroke_path(&bezpath_to_cpu(path)));
        }
    }
}

fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity.max(0.0));
        draw(ctx);
        ctx.pop_layer();
    } else {
        draw(ctx);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
