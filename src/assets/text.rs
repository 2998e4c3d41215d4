use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Environment variable that overrides font discovery.
pub const FONT_ENV: &str = "CHATREEL_FONT";

const WELL_KNOWN_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Width of a string at a given pixel size.
///
/// Implementations may cache, hence `&mut self`.
pub trait TextMeasure {
    /// Advance width of `text` set on one line at `size_px`.
    fn measure(&mut self, text: &str, size_px: f32) -> f32;
}

/// Monospace stand-in: every char advances `em * size_px`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance per char in ems.
    pub em: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { em: 0.5 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * self.em * size_px
    }
}

/// Greedy word wrap on single spaces.
///
/// Words are appended to the current line while the projected width stays strictly below
/// `max_width`; otherwise a new line starts. A single word wider than `max_width` gets a line
/// of its own and is not broken. `lines.join(" ") == text` for any input.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    m: &mut M,
    text: &str,
    size_px: f32,
    max_width: f32,
) -> Vec<String> {
    let mut words = text.split(' ');
    let mut lines = Vec::new();
    let mut current = words.next().unwrap_or_default().to_owned();

    for word in words {
        let candidate = format!("{current} {word}");
        if m.measure(&candidate, size_px) < max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }
    lines.push(current);
    lines
}

/// Font bytes loaded once and shared by every render worker.
#[derive(Clone, Debug)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
}

impl FontFace {
    /// Wrap raw TTF/OTF bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> ChatReelResult<Self> {
        if bytes.is_empty() {
            return Err(ChatReelError::configuration("font file is empty"));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
        })
    }

    /// Read a font file. Failure is a configuration error: nothing can be drawn without it.
    pub fn from_path(path: &Path) -> ChatReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ChatReelError::configuration(format!("read font '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }

    /// `$CHATREEL_FONT`, else the first well-known system font that exists.
    pub fn discover() -> Option<PathBuf> {
        if let Some(p) = std::env::var_os(FONT_ENV).map(PathBuf::from)
            && p.is_file()
        {
            return Some(p);
        }
        WELL_KNOWN_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }

    /// Raw font bytes.
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }
}

/// Placeholder Parley brush; color is chosen when glyphs are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush;

/// One glyph, positioned relative to the line origin on the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph id in the font.
    pub id: u32,
    /// Horizontal offset from the line start.
    pub x: f32,
    /// Vertical offset from the baseline.
    pub y: f32,
}

/// A single shaped line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedLine {
    /// Advance width.
    pub width: f32,
    /// Pixel size the line was shaped at.
    pub font_size: f32,
    /// Glyphs in visual order.
    pub glyphs: Vec<PositionedGlyph>,
}

/// Parley-backed shaper bound to one font.
///
/// Holds mutable Parley contexts, so each render worker owns its own instance.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    lines: HashMap<(String, u32), Arc<ShapedLine>>,
}

impl TextShaper {
    /// Register `face` with a fresh font context.
    pub fn new(face: &FontFace) -> ChatReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ChatReelError::configuration("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ChatReelError::configuration("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
            0,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            lines: HashMap::new(),
        })
    }

    /// Family name the font registered under.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape `text` on a single unbroken line. Results are cached per `(text, size)`.
    pub fn shape_line(&mut self, text: &str, size_px: f32) -> Arc<ShapedLine> {
        let key = (text.to_owned(), size_px.to_bits());
        if let Some(line) = self.lines.get(&key) {
            return Arc::clone(line);
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let baseline = layout
            .lines()
            .next()
            .map(|l| l.metrics().baseline)
            .unwrap_or(0.0);
        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| PositionedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                }));
            }
        }

        let shaped = Arc::new(ShapedLine {
            width: layout.width(),
            font_size: size_px,
            glyphs,
        });
        self.lines.insert(key, Arc::clone(&shaped));
        shaped
    }
}

impl TextMeasure for TextShaper {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        self.shape_line(text, size_px).width
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
