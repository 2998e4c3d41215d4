//! Inputs the compositor consumes: colors, the avatar raster, and shaped text.

/// Hex colors.
pub mod color;
/// Avatar image decoding.
pub mod decode;
/// Text measurement, wrapping, and glyph layout.
pub mod text;
