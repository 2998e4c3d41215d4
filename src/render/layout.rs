use std::sync::Arc;

use crate::assets::text::{TextMeasure, wrap_text};
use crate::chat::model::Speaker;
use crate::foundation::core::{Point, Rect};
use crate::render::config::LayoutMetrics;

/// Size and wrapped text of one bubble, independent of its position.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleShape {
    /// Outer width, clamped to `[bubble_min_width, bubble_max_width]`.
    pub width: f64,
    /// Outer height.
    pub height: f64,
    /// Wrapped text lines.
    pub lines: Vec<String>,
}

/// Wrap `text` and size its bubble.
pub fn measure_bubble<M: TextMeasure + ?Sized>(
    m: &mut M,
    metrics: &LayoutMetrics,
    text: &str,
) -> BubbleShape {
    let size = metrics.body_font_px;
    let lines = wrap_text(m, text, size, metrics.text_max_width() as f32);
    let widest = lines
        .iter()
        .map(|l| f64::from(m.measure(l, size)))
        .fold(0.0_f64, f64::max);
    let width = (widest + 2.0 * metrics.bubble_padding)
        .clamp(metrics.bubble_min_width, metrics.bubble_max_width);
    let height = lines.len() as f64 * metrics.line_height + metrics.bubble_vertical_padding;
    BubbleShape {
        width,
        height,
        lines,
    }
}

/// A bubble with its final on-screen position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBubble {
    /// Sender; decides alignment and fill.
    pub speaker: Speaker,
    /// Top-left corner.
    pub origin: Point,
    /// Size and text.
    pub shape: Arc<BubbleShape>,
}

impl PlacedBubble {
    /// Bubble bounds.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, (self.shape.width, self.shape.height))
    }
}

/// Positions of everything in the scrolling chat area for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatAreaLayout {
    /// Visible bubbles, top to bottom.
    pub bubbles: Vec<PlacedBubble>,
    /// Typing bubble bounds, when shown.
    pub typing: Option<Rect>,
    /// Upward shift applied to keep the stack bottom inside the chat area (`>= 0`).
    pub scroll: f64,
}

/// Stack bubbles top to bottom, anchoring the stack bottom when it overflows.
///
/// The stack starts at `chat_top`. When its total height (each bubble plus one gap, and the
/// typing bubble when shown) would pass `canvas_height - bottom_reserve`, the whole stack moves
/// up by the overflow so the newest content stays visible.
pub fn layout_chat_area(
    bubbles: &[(Speaker, Arc<BubbleShape>)],
    typing_visible: bool,
    metrics: &LayoutMetrics,
    canvas_width: f64,
    canvas_height: f64,
) -> ChatAreaLayout {
    let mut total: f64 = bubbles
        .iter()
        .map(|(_, s)| s.height + metrics.bubble_gap)
        .sum();
    if typing_visible {
        total += metrics.typing_height + metrics.bubble_gap;
    }

    let max_y = canvas_height - metrics.bottom_reserve;
    let mut y = metrics.chat_top;
    let mut scroll = 0.0;
    if y + total > max_y {
        scroll = y + total - max_y;
        y = max_y - total;
    }

    let mut placed = Vec::with_capacity(bubbles.len());
    for (speaker, shape) in bubbles {
        let x = match speaker {
            Speaker::User => canvas_width - shape.width - metrics.side_margin,
            Speaker::Counterparty => metrics.side_margin,
        };
        placed.push(PlacedBubble {
            speaker: *speaker,
            origin: Point::new(x, y),
            shape: Arc::clone(shape),
        });
        y += shape.height + metrics.bubble_gap;
    }

    let typing = typing_visible.then(|| {
        Rect::from_origin_size(
            (metrics.side_margin, y),
            (metrics.typing_width, metrics.typing_height),
        )
    });

    ChatAreaLayout {
        bubbles: placed,
        typing,
        scroll,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
