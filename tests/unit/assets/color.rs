use super::*;
use serde_json::json;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: Color = serde_json::from_value(json!("#005c4b")).unwrap();
    assert_eq!(c, Color::rgb(0x00, 0x5c, 0x4b));

    let c: Color = serde_json::from_value(json!("FFFFFF80")).unwrap();
    assert_eq!(c.a, 0x80);
}

#[test]
fn parses_byte_arrays() {
    let c: Color = serde_json::from_value(json!([17, 27, 33])).unwrap();
    assert_eq!(c, Color::rgb(17, 27, 33));
    assert!(serde_json::from_value::<Color>(json!([1, 2])).is_err());
}

#[test]
fn rejects_malformed_hex() {
    assert!(Color::from_hex("#12345").is_err());
    assert!(Color::from_hex("#gg0000").is_err());
    assert!(Color::from_hex("#ééé").is_err());
}

#[test]
fn serializes_back_to_hex() {
    let c = Color::rgb(0x1f, 0x29, 0x37);
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#1f2937"));
    let t = Color { a: 0x40, ..c };
    assert_eq!(t.to_hex(), "#1f293740");
}
