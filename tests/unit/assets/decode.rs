use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(2, 3, [100, 50, 200, 128])).unwrap();
    assert_eq!((prepared.width, prepared.height), (2, 3));
    assert_eq!(
        &prepared.rgba8_premul[..4],
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn fully_transparent_pixels_are_zeroed() {
    let prepared = decode_image(&png_bytes(1, 1, [255, 255, 255, 0])).unwrap();
    assert_eq!(prepared.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn missing_avatar_file_is_a_missing_asset() {
    let err = load_avatar(&ImageSource::Path("/definitely/not/here.png".into())).unwrap_err();
    assert!(matches!(err, ChatReelError::MissingAsset(_)));
    assert!(!err.is_fatal());
}

#[test]
fn undecodable_avatar_bytes_are_a_missing_asset() {
    let err = load_avatar(&ImageSource::Bytes(b"not an image".to_vec())).unwrap_err();
    assert!(matches!(err, ChatReelError::MissingAsset(_)));
}

#[test]
fn avatar_from_bytes_decodes() {
    let img = load_avatar(&ImageSource::Bytes(png_bytes(4, 4, [1, 2, 3, 255]))).unwrap();
    assert_eq!(img.width, 4);
}

#[test]
fn decoded_pixels_match_color_premultiplication() {
    let c = crate::assets::color::Color {
        r: 30,
        g: 200,
        b: 90,
        a: 77,
    };
    let prepared = decode_image(&png_bytes(1, 1, [30, 200, 90, 77])).unwrap();
    assert_eq!(prepared.rgba8_premul.as_slice(), &c.to_premul().to_array());
}
