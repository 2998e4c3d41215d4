use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Shape;

use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::assets::text::{FontFace, TextMeasure, TextShaper};
use crate::chat::model::Speaker;
use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::render::config::{LayoutMetrics, RenderConfig};
use crate::render::layout::{BubbleShape, ChatAreaLayout, layout_chat_area, measure_bubble};
use crate::timeline::scheduler::FrameDescriptor;

const PATH_TOLERANCE: f64 = 0.1;

/// A rendered frame in tightly packed RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Read-only inputs every compositor of a job shares.
#[derive(Clone, Debug)]
pub struct CompositorAssets {
    /// Font for all text.
    pub font: FontFace,
    /// Decoded avatar; `None` draws the initial-letter disc.
    pub avatar: Option<PreparedImage>,
}

#[derive(Clone)]
struct AvatarPaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// CPU compositor for the chat screen.
///
/// Owns a raster context and a text shaper, so it is not shared between threads; parallel
/// renders create one per worker. Output depends only on the descriptor and the static
/// config/assets.
pub struct Compositor {
    cfg: RenderConfig,
    shaper: TextShaper,
    avatar: Option<AvatarPaint>,
    initial: String,
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: vello_cpu::Pixmap,
    shapes: HashMap<String, Arc<BubbleShape>>,
}

impl Compositor {
    /// Validate `cfg` and prepare a raster context of the configured size.
    pub fn new(cfg: &RenderConfig, assets: &CompositorAssets) -> ChatReelResult<Self> {
        cfg.validate()?;
        let (w, h) = canvas_u16(cfg)?;
        let shaper = TextShaper::new(&assets.font)?;
        let avatar = assets.avatar.as_ref().map(avatar_paint).transpose()?;
        let initial = cfg
            .counterparty_name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();

        Ok(Self {
            cfg: cfg.clone(),
            shaper,
            avatar,
            initial,
            ctx: Some(vello_cpu::RenderContext::new(w, h)),
            pixmap: vello_cpu::Pixmap::new(w, h),
            shapes: HashMap::new(),
        })
    }

    /// The configuration this compositor draws with.
    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    /// Composite one frame. The result is premultiplied RGBA8.
    pub fn render(&mut self, frame: &FrameDescriptor<'_>) -> ChatReelResult<FrameRGBA> {
        let metrics = self.cfg.layout;
        let width = f64::from(self.cfg.width);
        let height = f64::from(self.cfg.height);

        let mut bubbles = Vec::with_capacity(frame.visible_turns.len());
        for turn in frame.visible_turns {
            let shape = match self.shapes.get(&turn.text) {
                Some(s) => Arc::clone(s),
                None => {
                    let s = Arc::new(measure_bubble(&mut self.shaper, &metrics, &turn.text));
                    self.shapes.insert(turn.text.clone(), Arc::clone(&s));
                    s
                }
            };
            bubbles.push((turn.speaker, shape));
        }
        let area = layout_chat_area(
            &bubbles,
            frame.typing_indicator_visible,
            &metrics,
            width,
            height,
        );

        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        self.draw(&mut ctx, frame, &area);
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx = Some(ctx);

        let data = self.pixmap.data_as_u8_slice().to_vec();
        if data.len() != self.cfg.canvas().rgba_len() {
            return Err(ChatReelError::render(format!(
                "frame {} buffer size mismatch",
                frame.index.0
            )));
        }
        Ok(FrameRGBA {
            width: self.cfg.width,
            height: self.cfg.height,
            data,
            premultiplied: true,
        })
    }

    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        frame: &FrameDescriptor<'_>,
        area: &ChatAreaLayout,
    ) {
        let pal = self.cfg.palette;
        let width = f64::from(self.cfg.width);
        let height = f64::from(self.cfg.height);

        reset_state(ctx);
        fill_rect(ctx, Rect::new(0.0, 0.0, width, height), pal.background);

        let last = area.bubbles.len().checked_sub(1);
        for (i, bubble) in area.bubbles.iter().enumerate() {
            let opacity = if Some(i) == last {
                frame.last_turn_opacity.clamp(0.0, 1.0)
            } else {
                1.0
            };
            let layered = opacity < 1.0;
            if layered {
                ctx.push_opacity_layer(opacity);
            }
            self.draw_bubble(ctx, bubble.speaker, bubble.rect(), &bubble.shape);
            if layered {
                ctx.pop_layer();
            }
        }

        if let Some(r) = area.typing {
            self.draw_typing(ctx, r);
        }

        self.draw_header(ctx);
        self.draw_footer(ctx);
    }

    fn draw_header(&mut self, ctx: &mut vello_cpu::RenderContext) {
        let pal = self.cfg.palette;
        let m = self.cfg.layout;
        let width = f64::from(self.cfg.width);

        fill_rect(ctx, Rect::new(0.0, 0.0, width, m.header_height), pal.bar);
        fill_path(ctx, &chevron_path(Point::new(20.0, 52.0)), pal.text);

        let (cx, cy) = m.avatar_center;
        let disc = kurbo::Circle::new((cx, cy), m.avatar_radius).to_path(PATH_TOLERANCE);
        match &self.avatar {
            Some(a) => {
                let d = 2.0 * m.avatar_radius;
                let paint_tr = Affine::translate((cx - m.avatar_radius, cy - m.avatar_radius))
                    * Affine::scale_non_uniform(d / f64::from(a.w), d / f64::from(a.h));
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(a.paint.clone());
                ctx.set_paint_transform(affine_to_cpu(paint_tr));
                ctx.fill_path(&bezpath_to_cpu(&disc));
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            }
            None => {
                fill_path(ctx, &disc, pal.avatar_fallback);
                let initial = self.initial.clone();
                self.draw_text(
                    ctx,
                    &initial,
                    m.status_font_px + 2.0,
                    pal.text,
                    Point::new(cx, cy + 5.0),
                    Align::Center,
                );
            }
        }

        let name_x = cx + m.avatar_radius + 10.0;
        let name = self.cfg.counterparty_name.clone();
        let status = self.cfg.status_text.clone();
        self.draw_text(
            ctx,
            &name,
            m.name_font_px,
            pal.text,
            Point::new(name_x, 45.0),
            Align::Left,
        );
        self.draw_text(
            ctx,
            &status,
            m.status_font_px,
            pal.muted_text,
            Point::new(name_x, 62.0),
            Align::Left,
        );

        for k in 0..3 {
            let dot = kurbo::Circle::new((width - 24.0, 42.0 + 6.0 * f64::from(k)), 2.0);
            fill_path(ctx, &dot.to_path(PATH_TOLERANCE), pal.text);
        }
    }

    fn draw_bubble(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        speaker: Speaker,
        r: Rect,
        shape: &BubbleShape,
    ) {
        let pal = self.cfg.palette;
        let m = self.cfg.layout;
        let fill = match speaker {
            Speaker::User => pal.user_bubble,
            Speaker::Counterparty => pal.counterparty_bubble,
        };
        let rr = kurbo::RoundedRect::from_rect(r, m.bubble_radius);
        fill_path(ctx, &rr.to_path(PATH_TOLERANCE), fill);

        for (i, line) in shape.lines.iter().enumerate() {
            let baseline = r.y0 + m.first_baseline + i as f64 * m.line_height;
            self.draw_text(
                ctx,
                line,
                m.body_font_px,
                pal.text,
                Point::new(r.x0 + m.bubble_padding, baseline),
                Align::Left,
            );
        }

        let meta_y = r.y1 - m.meta_baseline_inset;
        let clock = self.cfg.clock_label.clone();
        self.draw_text(
            ctx,
            &clock,
            m.meta_font_px,
            pal.muted_text,
            Point::new(r.x1 - m.bubble_padding, meta_y),
            Align::Right,
        );

        if speaker == Speaker::User {
            let clock_w = f64::from(self.shaper.measure(&clock, m.meta_font_px));
            let right = receipt_right_edge(r, clock_w, &m);
            fill_path(ctx, &tick_path(Point::new(right - 13.0, meta_y)), pal.muted_text);
            fill_path(ctx, &tick_path(Point::new(right - 8.5, meta_y)), pal.muted_text);
        }
    }

    fn draw_typing(&mut self, ctx: &mut vello_cpu::RenderContext, r: Rect) {
        let pal = self.cfg.palette;
        let rr = kurbo::RoundedRect::from_rect(r, self.cfg.layout.bubble_radius);
        fill_path(ctx, &rr.to_path(PATH_TOLERANCE), pal.counterparty_bubble);
        for k in 0..3 {
            let dot = kurbo::Circle::new(
                (r.x0 + 15.0 + 12.0 * f64::from(k), r.y0 + r.height() / 2.0),
                3.0,
            );
            fill_path(ctx, &dot.to_path(PATH_TOLERANCE), pal.muted_text);
        }
    }

    fn draw_footer(&mut self, ctx: &mut vello_cpu::RenderContext) {
        let pal = self.cfg.palette;
        let m = self.cfg.layout;
        let width = f64::from(self.cfg.width);
        let y = f64::from(self.cfg.height) - m.footer_height;

        fill_rect(ctx, Rect::new(0.0, y, width, y + m.footer_height), pal.bar);

        let field = kurbo::RoundedRect::new(10.0, y + 10.0, width - 50.0, y + 50.0, 20.0);
        fill_path(ctx, &field.to_path(PATH_TOLERANCE), pal.chat_background);
        let placeholder = self.cfg.placeholder_text.clone();
        self.draw_text(
            ctx,
            &placeholder,
            m.body_font_px,
            pal.muted_text,
            Point::new(25.0, y + 33.0),
            Align::Left,
        );

        let send_center = Point::new(width - 25.0, y + 30.0);
        let button = kurbo::Circle::new(send_center, 18.0).to_path(PATH_TOLERANCE);
        fill_path(ctx, &button, pal.user_bubble);
        fill_path(ctx, &send_arrow_path(send_center), pal.text);
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        size_px: f32,
        color: Color,
        baseline: Point,
        align: Align,
    ) {
        if text.is_empty() {
            return;
        }
        let line = self.shaper.shape_line(text, size_px);
        let w = f64::from(line.width);
        let x = match align {
            Align::Left => baseline.x,
            Align::Center => baseline.x - w / 2.0,
            Align::Right => baseline.x - w,
        };
        ctx.set_transform(affine_to_cpu(Affine::translate((x, baseline.y))));
        ctx.set_paint(color.to_cpu());
        let glyphs = line.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        });
        ctx.glyph_run(self.shaper.font())
            .font_size(line.font_size)
            .fill_glyphs(glyphs);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

fn canvas_u16(cfg: &RenderConfig) -> ChatReelResult<(u16, u16)> {
    let w: u16 = cfg
        .width
        .try_into()
        .map_err(|_| ChatReelError::configuration("canvas width exceeds u16"))?;
    let h: u16 = cfg
        .height
        .try_into()
        .map_err(|_| ChatReelError::configuration("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn reset_state(ctx: &mut vello_cpu::RenderContext) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
}

fn fill_rect(ctx: &mut vello_cpu::RenderContext, r: Rect, color: Color) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color.to_cpu());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1));
}

fn fill_path(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Color) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color.to_cpu());
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut p = BezPath::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            p.move_to((x, y));
        } else {
            p.line_to((x, y));
        }
    }
    p.close_path();
    p
}

/// Back chevron with its point at `tip`.
fn chevron_path(tip: Point) -> BezPath {
    let (x, y) = (tip.x, tip.y);
    polygon(&[
        (x + 8.0, y - 9.0),
        (x + 10.5, y - 7.0),
        (x + 4.5, y),
        (x + 10.5, y + 7.0),
        (x + 8.0, y + 9.0),
        (x, y),
    ])
}

const RECEIPT_GAP: f64 = 4.0;

/// Right edge of the double tick, kept clear of the right-aligned clock label.
fn receipt_right_edge(r: Rect, clock_width: f64, m: &LayoutMetrics) -> f64 {
    r.x1 - m.bubble_padding - clock_width - RECEIPT_GAP
}

/// One read-receipt check mark starting at `origin` on the baseline.
fn tick_path(origin: Point) -> BezPath {
    let (x, y) = (origin.x, origin.y);
    polygon(&[
        (x, y - 4.0),
        (x + 1.1, y - 5.1),
        (x + 3.0, y - 3.0),
        (x + 7.3, y - 8.2),
        (x + 8.4, y - 7.1),
        (x + 3.0, y - 0.8),
    ])
}

fn send_arrow_path(center: Point) -> BezPath {
    let (x, y) = (center.x, center.y);
    polygon(&[
        (x - 6.0, y - 7.0),
        (x + 8.0, y),
        (x - 6.0, y + 7.0),
        (x - 3.0, y),
    ])
}

fn avatar_paint(img: &PreparedImage) -> ChatReelResult<AvatarPaint> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    Ok(AvatarPaint {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        w: img.width,
        h: img.height,
    })
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ChatReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ChatReelError::missing_asset("avatar width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ChatReelError::missing_asset("avatar height exceeds u16"))?;
    if bytes.len() != (width as usize).saturating_mul(height as usize).saturating_mul(4) {
        return Err(ChatReelError::render("avatar buffer size mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
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
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
