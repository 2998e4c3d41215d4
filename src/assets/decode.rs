use std::sync::Arc;

use anyhow::Context;

use crate::chat::job::ImageSource;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Decoded raster in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode any format `image` understands and premultiply alpha.
pub fn decode_image(bytes: &[u8]) -> ChatReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ChatReelError::missing_asset("avatar image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Resolve and decode the avatar.
///
/// A file that does not exist or cannot be decoded is a [`ChatReelError::MissingAsset`]; the
/// caller draws the initial-letter fallback instead.
pub fn load_avatar(source: &ImageSource) -> ChatReelResult<PreparedImage> {
    let owned;
    let bytes: &[u8] = match source {
        ImageSource::Bytes(b) => b,
        ImageSource::Path(p) => {
            owned = std::fs::read(p).map_err(|e| {
                ChatReelError::missing_asset(format!("avatar '{}': {e}", p.display()))
            })?;
            &owned
        }
    };
    decode_image(bytes).map_err(|e| match e {
        ChatReelError::Other(inner) => ChatReelError::missing_asset(format!("avatar: {inner:#}")),
        other => other,
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let p = Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]);
        px.copy_from_slice(&p.to_array());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
