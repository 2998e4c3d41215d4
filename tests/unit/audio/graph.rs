use super::*;

#[test]
fn renders_pads_and_options() {
    let mut g = FilterGraph::new();
    g.push(
        FilterNode::new("adelay")
            .input("1:a")
            .param("delays", 2000)
            .param("all", 1)
            .output("c0"),
    )
    .push(FilterNode::new("volume").input("c0").positional(0.3).output("out"));
    assert_eq!(
        g.render(),
        "[1:a]adelay=delays=2000:all=1[c0];[c0]volume=0.3[out]"
    );
    g.validate("out").unwrap();
}

#[test]
fn node_without_params_renders_bare() {
    let mut g = FilterGraph::new();
    g.push(FilterNode::new("apad").input("0:a").output("p"));
    assert_eq!(g.render(), "[0:a]apad[p]");
}

#[test]
fn validate_catches_bad_wiring() {
    let mut g = FilterGraph::new();
    g.push(FilterNode::new("anull").input("nope").output("out"));
    assert!(matches!(g.validate("out"), Err(ChatReelError::Mix(_))));

    let mut g = FilterGraph::new();
    g.push(FilterNode::new("asplit").input("1:a").positional(2).output("a").output("b"))
        .push(FilterNode::new("anull").input("a").output("out"));
    // 'b' is never consumed
    assert!(g.validate("out").is_err());

    let mut g = FilterGraph::new();
    g.push(FilterNode::new("anull").input("1:a").output("x"))
        .push(FilterNode::new("anull").input("2:a").output("x"));
    assert!(g.validate("x").is_err());

    let mut g = FilterGraph::new();
    g.push(FilterNode::new("anull").input("1:a").output("x"))
        .push(FilterNode::new("anull").input("x").output("y"))
        .push(FilterNode::new("anull").input("x").output("out"));
    assert!(g.validate("out").is_err());
}

#[test]
fn stream_specifiers_are_recognised() {
    assert!(is_stream_specifier("0:a"));
    assert!(is_stream_specifier("12:v"));
    assert!(!is_stream_specifier("a:0"));
    assert!(!is_stream_specifier("cues"));
}

#[test]
fn lookup_helpers() {
    let mut g = FilterGraph::new();
    g.push(FilterNode::new("adelay").input("1:a").param("delays", 5).output("a"))
        .push(FilterNode::new("adelay").input("2:a").param("delays", 9).output("b"));
    let delays: Vec<_> = g.nodes_named("adelay").filter_map(|n| n.get("delays")).collect();
    assert_eq!(delays, vec!["5", "9"]);
}
