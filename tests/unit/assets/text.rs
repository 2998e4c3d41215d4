use super::*;

fn wrap(text: &str, max_width: f32) -> Vec<String> {
    // 14px * 0.5em = 7px per char
    wrap_text(&mut FixedAdvance::default(), text, 14.0, max_width)
}

#[test]
fn short_text_stays_on_one_line() {
    assert_eq!(wrap("Hello there", 226.0), vec!["Hello there"]);
}

#[test]
fn wraps_greedily_below_max_width() {
    // "aaaa bbbb" = 9 chars = 63px; max 63 is not strictly below -> break
    assert_eq!(wrap("aaaa bbbb", 63.0), vec!["aaaa", "bbbb"]);
    assert_eq!(wrap("aaaa bbbb", 64.0), vec!["aaaa bbbb"]);
    assert_eq!(
        wrap("one two three four five", 70.0),
        vec!["one two", "three", "four five"]
    );
}

#[test]
fn overlong_word_gets_its_own_line() {
    assert_eq!(
        wrap("a supercalifragilistic b", 50.0),
        vec!["a", "supercalifragilistic", "b"]
    );
}

#[test]
fn wrap_then_join_round_trips() {
    let samples = [
        "",
        "x",
        "Hello",
        "The stars say this week is good for new beginnings, especially at work.",
        "double  spaces  survive",
        " leading and trailing ",
        "ünïcödé wörds wrap by char count",
    ];
    for s in samples {
        for max in [1.0, 30.0, 100.0, 226.0, 10_000.0] {
            let lines = wrap(s, max);
            assert!(!lines.is_empty());
            assert_eq!(lines.join(" "), s, "max={max}");
        }
    }
}

#[test]
fn empty_font_bytes_are_rejected() {
    let err = FontFace::from_bytes(Vec::new()).unwrap_err();
    assert!(matches!(err, ChatReelError::Configuration(_)));
    let err = FontFace::from_path(Path::new("/no/such/font.ttf")).unwrap_err();
    assert!(matches!(err, ChatReelError::Configuration(_)));
}

#[test]
fn shaper_measures_with_a_real_font_when_available() {
    let Some(path) = std::env::var_os("CHATREEL_TEST_FONT")
        .map(PathBuf::from)
        .or_else(FontFace::discover)
    else {
        return;
    };
    let face = FontFace::from_path(&path).unwrap();
    let mut shaper = TextShaper::new(&face).unwrap();
    assert!(!shaper.family_name().is_empty());

    let short = shaper.measure("Hi", 14.0);
    let long = shaper.measure("Hi there, how are you?", 14.0);
    assert!(short > 0.0);
    assert!(long > short);
    // larger size, wider text
    assert!(shaper.measure("Hi", 28.0) > short);
    // cached result is identical
    assert_eq!(shaper.measure("Hi", 14.0), short);

    let line = shaper.shape_line("Hi", 14.0);
    assert_eq!(line.glyphs.len(), 2);
    assert!(line.glyphs.iter().all(|g| g.y.abs() < 1e-3));
}

#[test]
fn shaped_glyphs_advance_along_the_baseline() {
    let Some(path) = std::env::var_os("CHATREEL_TEST_FONT")
        .map(PathBuf::from)
        .or_else(FontFace::discover)
    else {
        return;
    };
    let mut shaper = TextShaper::new(&FontFace::from_path(&path).unwrap()).unwrap();
    let line = shaper.shape_line("Hello world", 14.0);
    assert_eq!(line.glyphs.len(), 11);
    for pair in line.glyphs.windows(2) {
        assert!(pair[1].x > pair[0].x, "{:?}", line.glyphs);
    }
    assert!(line.glyphs[0].x.abs() < 1e-3);
    assert!(line.glyphs[10].x < line.width);
    assert!(line.glyphs.iter().all(|g| g.y.abs() < 1e-3));
}

#[test]
fn garbage_font_bytes_fail_to_register() {
    let face = FontFace::from_bytes(b"not a font at all".to_vec()).unwrap();
    let err = TextShaper::new(&face).err().unwrap();
    assert!(matches!(err, ChatReelError::Configuration(_)));
}
