use std::path::PathBuf;

use crate::assets::color::Color;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Screen colors. Defaults reproduce a dark messenger theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Whole-canvas clear color; also the flatten color for encoded frames.
    pub background: Color,
    /// Chat area and input field fill.
    pub chat_background: Color,
    /// USER bubble fill.
    pub user_bubble: Color,
    /// COUNTERPARTY bubble and typing bubble fill.
    pub counterparty_bubble: Color,
    /// Primary text.
    pub text: Color,
    /// Secondary text: clock labels, ticks, status, placeholder, typing dots.
    pub muted_text: Color,
    /// Header and footer bars.
    pub bar: Color,
    /// Fallback avatar disc.
    pub avatar_fallback: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::rgb(0x0a, 0x10, 0x14),
            chat_background: Color::rgb(0x11, 0x1b, 0x21),
            user_bubble: Color::rgb(0x00, 0x5c, 0x4b),
            counterparty_bubble: Color::rgb(0x1f, 0x29, 0x37),
            text: Color::rgb(0xff, 0xff, 0xff),
            muted_text: Color::rgb(0x86, 0x96, 0xa0),
            bar: Color::rgb(0x20, 0x2c, 0x33),
            avatar_fallback: Color::rgb(0x4a, 0x55, 0x68),
        }
    }
}

/// Pixel geometry of the chat screen.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// Header bar height.
    pub header_height: f64,
    /// Top of the first bubble when nothing is scrolled.
    pub chat_top: f64,
    /// Input bar height.
    pub footer_height: f64,
    /// Space kept free above the bottom edge when anchoring the bubble stack.
    pub bottom_reserve: f64,
    /// Widest a bubble gets.
    pub bubble_max_width: f64,
    /// Narrowest a bubble gets.
    pub bubble_min_width: f64,
    /// Horizontal text inset.
    pub bubble_padding: f64,
    /// Bubble corner radius.
    pub bubble_radius: f64,
    /// Distance between wrapped text baselines.
    pub line_height: f64,
    /// Added to `lines * line_height`; leaves room for the clock label.
    pub bubble_vertical_padding: f64,
    /// Baseline of the first text line below the bubble top.
    pub first_baseline: f64,
    /// Baseline of the clock label above the bubble bottom.
    pub meta_baseline_inset: f64,
    /// Distance from a bubble to the screen edge.
    pub side_margin: f64,
    /// Vertical space between bubbles.
    pub bubble_gap: f64,
    /// Message text size.
    pub body_font_px: f32,
    /// Header name size.
    pub name_font_px: f32,
    /// Header status size.
    pub status_font_px: f32,
    /// Clock label size.
    pub meta_font_px: f32,
    /// Avatar circle center.
    pub avatar_center: (f64, f64),
    /// Avatar circle radius.
    pub avatar_radius: f64,
    /// Typing bubble width.
    pub typing_width: f64,
    /// Typing bubble height.
    pub typing_height: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            header_height: 100.0,
            chat_top: 120.0,
            footer_height: 60.0,
            bottom_reserve: 80.0,
            bubble_max_width: 250.0,
            bubble_min_width: 100.0,
            bubble_padding: 12.0,
            bubble_radius: 18.0,
            line_height: 20.0,
            bubble_vertical_padding: 30.0,
            first_baseline: 25.0,
            meta_baseline_inset: 8.0,
            side_margin: 20.0,
            bubble_gap: 15.0,
            body_font_px: 14.0,
            name_font_px: 16.0,
            status_font_px: 12.0,
            meta_font_px: 10.0,
            avatar_center: (60.0, 50.0),
            avatar_radius: 20.0,
            typing_width: 60.0,
            typing_height: 40.0,
        }
    }
}

impl LayoutMetrics {
    /// Width available to wrapped text inside a bubble.
    pub fn text_max_width(&self) -> f64 {
        self.bubble_max_width - 2.0 * self.bubble_padding
    }

    fn validate(&self) -> ChatReelResult<()> {
        let lengths = [
            ("header_height", self.header_height),
            ("chat_top", self.chat_top),
            ("footer_height", self.footer_height),
            ("bottom_reserve", self.bottom_reserve),
            ("bubble_padding", self.bubble_padding),
            ("bubble_radius", self.bubble_radius),
            ("line_height", self.line_height),
            ("bubble_vertical_padding", self.bubble_vertical_padding),
            ("side_margin", self.side_margin),
            ("bubble_gap", self.bubble_gap),
            ("avatar_radius", self.avatar_radius),
            ("typing_width", self.typing_width),
            ("typing_height", self.typing_height),
        ];
        for (name, v) in lengths {
            if !v.is_finite() || v < 0.0 {
                return Err(ChatReelError::configuration(format!(
                    "layout.{name} must be finite and >= 0"
                )));
            }
        }
        for (name, v) in [
            ("body_font_px", self.body_font_px),
            ("name_font_px", self.name_font_px),
            ("status_font_px", self.status_font_px),
            ("meta_font_px", self.meta_font_px),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ChatReelError::configuration(format!(
                    "layout.{name} must be finite and > 0"
                )));
            }
        }
        if !(self.bubble_min_width > 0.0 && self.bubble_min_width <= self.bubble_max_width) {
            return Err(ChatReelError::configuration(
                "layout.bubble_min_width must be in (0, bubble_max_width]",
            ));
        }
        if self.text_max_width() <= 0.0 {
            return Err(ChatReelError::configuration(
                "layout.bubble_max_width must exceed twice the bubble padding",
            ));
        }
        Ok(())
    }
}

/// Static rendering configuration shared by every frame of a job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Font used for every string on screen; `None` means discover one.
    pub font_path: Option<PathBuf>,
    /// Header name; its first letter seeds the fallback avatar.
    pub counterparty_name: String,
    /// Line under the header name.
    pub status_text: String,
    /// Fixed label drawn in each bubble's corner.
    pub clock_label: String,
    /// Input field placeholder.
    pub placeholder_text: String,
    /// Colors.
    pub palette: Palette,
    /// Geometry.
    pub layout: LayoutMetrics,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 376,
            height: 812,
            font_path: None,
            counterparty_name: crate::chat::job::DEFAULT_COUNTERPARTY_NAME.to_owned(),
            status_text: "online".to_owned(),
            clock_label: "12:00".to_owned(),
            placeholder_text: "Type a message".to_owned(),
            palette: Palette::default(),
            layout: LayoutMetrics::default(),
        }
    }
}

impl RenderConfig {
    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Reject unusable dimensions and metrics before any frame is drawn.
    pub fn validate(&self) -> ChatReelResult<()> {
        self.canvas().validate()?;
        self.layout.validate()?;
        let l = &self.layout;
        if f64::from(self.height) <= l.chat_top + l.bottom_reserve {
            return Err(ChatReelError::configuration(format!(
                "canvas height {} leaves no room for the chat area",
                self.height
            )));
        }
        if f64::from(self.width) < l.bubble_max_width + 2.0 * l.side_margin {
            return Err(ChatReelError::configuration(format!(
                "canvas width {} is narrower than a full bubble",
                self.width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/config.rs"]
mod tests;
