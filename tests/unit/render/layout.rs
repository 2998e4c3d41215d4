use super::*;
use crate::assets::text::FixedAdvance;

fn metrics() -> LayoutMetrics {
    LayoutMetrics::default()
}

fn shape(text: &str) -> Arc<BubbleShape> {
    Arc::new(measure_bubble(&mut FixedAdvance::default(), &metrics(), text))
}

#[test]
fn short_text_gets_minimum_width() {
    // "Hi" = 2 * 7px = 14px, + 24 padding = 38 -> clamped to 100
    let s = shape("Hi");
    assert_eq!(s.width, 100.0);
    assert_eq!(s.lines, vec!["Hi"]);
    assert_eq!(s.height, 20.0 + 30.0);
}

#[test]
fn medium_text_fits_its_measured_width() {
    // 20 chars = 140px + 24 = 164
    let s = shape("abcdefghij klmnopqrs");
    assert_eq!(s.width, 164.0);
    assert_eq!(s.lines.len(), 1);
}

#[test]
fn long_text_wraps_and_clamps_to_max_width() {
    let text = "the quick brown fox jumps over the lazy dog and keeps running far away";
    let s = shape(text);
    assert!(s.lines.len() > 1);
    assert!(s.width <= 250.0);
    assert_eq!(s.height, s.lines.len() as f64 * 20.0 + 30.0);
    assert_eq!(s.lines.join(" "), text);
    for l in &s.lines {
        assert!(FixedAdvance::default().measure(l, 14.0) < 226.0 || !l.contains(' '));
    }
}

#[test]
fn bubbles_align_by_speaker_and_stack_with_gap() {
    let a = shape("Hi");
    let b = shape("Hello");
    let l = layout_chat_area(
        &[(Speaker::Counterparty, a.clone()), (Speaker::User, b.clone())],
        false,
        &metrics(),
        376.0,
        812.0,
    );
    assert_eq!(l.scroll, 0.0);
    assert_eq!(l.bubbles[0].origin, Point::new(20.0, 120.0));
    assert_eq!(l.bubbles[1].origin, Point::new(376.0 - 100.0 - 20.0, 120.0 + 50.0 + 15.0));
    assert!(l.typing.is_none());
}

#[test]
fn typing_bubble_sits_below_the_stack() {
    let a = shape("Hi");
    let l = layout_chat_area(&[(Speaker::User, a)], true, &metrics(), 376.0, 812.0);
    let t = l.typing.unwrap();
    assert_eq!(t.origin(), Point::new(20.0, 120.0 + 50.0 + 15.0));
    assert_eq!((t.width(), t.height()), (60.0, 40.0));
}

#[test]
fn overflowing_stack_is_anchored_to_the_bottom() {
    let s = shape("Hi");
    let turns: Vec<_> = (0..20).map(|_| (Speaker::User, s.clone())).collect();
    let l = layout_chat_area(&turns, false, &metrics(), 376.0, 812.0);
    // 20 * 65 = 1300 > 732 - 120
    let total = 20.0 * 65.0;
    assert_eq!(l.scroll, 120.0 + total - 732.0);
    let last = l.bubbles.last().unwrap().rect();
    assert_eq!(last.y1 + 15.0, 732.0);
    for w in l.bubbles.windows(2) {
        assert_eq!(w[1].origin.y - w[0].origin.y, 65.0);
    }
}

#[test]
fn typing_bubble_counts_toward_overflow() {
    let s = shape("Hi");
    let turns: Vec<_> = (0..20).map(|_| (Speaker::Counterparty, s.clone())).collect();
    let l = layout_chat_area(&turns, true, &metrics(), 376.0, 812.0);
    let t = l.typing.unwrap();
    assert_eq!(t.y1 + 15.0, 732.0);
}
