use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ChatReelError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(ChatReelError::render("x").to_string().contains("render error:"));
    assert!(ChatReelError::encode("x").to_string().contains("encode error:"));
    assert!(ChatReelError::mix("x").to_string().contains("mix error:"));
    assert!(
        ChatReelError::missing_asset("x")
            .to_string()
            .contains("missing asset:")
    );
    assert!(ChatReelError::cancelled("x").to_string().contains("cancelled:"));
}

#[test]
fn only_mix_and_missing_asset_are_recoverable() {
    assert!(!ChatReelError::mix("x").is_fatal());
    assert!(!ChatReelError::missing_asset("x").is_fatal());
    assert!(ChatReelError::configuration("x").is_fatal());
    assert!(ChatReelError::render("x").is_fatal());
    assert!(ChatReelError::encode("x").is_fatal());
    assert!(ChatReelError::cancelled("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ChatReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
