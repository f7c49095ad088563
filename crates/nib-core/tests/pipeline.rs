//! End-to-end pipeline tests: host-config mutations through layout,
//! composition, and the frame driver.

use nib_core::{
    ATTR_STATIC, AttrValue, Color, ElementKind, FlexDirection, HostContext, NamedColor, NodeId,
    Overflow, Position, Props, Screen, ScreenOptions, Style, TestBackend,
};

fn debug_screen(columns: u16) -> Screen<TestBackend> {
    match Screen::mount_with(TestBackend::new(columns), ScreenOptions { debug: true }) {
        Ok(s) => s,
        Err(_) => unreachable!(),
    }
}

fn throttled_screen(columns: u16) -> Screen<TestBackend> {
    match Screen::mount(TestBackend::new(columns)) {
        Ok(s) => s,
        Err(_) => unreachable!(),
    }
}

/// Create a `Text` element with one string leaf.
fn text_element(screen: &mut Screen<TestBackend>, content: &str, style: Style) -> NodeId {
    let text = screen
        .create_instance(
            ElementKind::Text,
            &Props::new().style(style),
            HostContext::default(),
        )
        .unwrap_or_default();
    let leaf = screen
        .create_text_instance(content, HostContext { inside_text: true })
        .unwrap_or_default();
    screen.append_initial_child(text, leaf).ok();
    text
}

fn leaf_of(screen: &Screen<TestBackend>, text: NodeId) -> NodeId {
    screen
        .tree()
        .node(text)
        .and_then(|n| n.children.first().copied())
        .unwrap_or_default()
}

#[test]
fn single_styled_line() {
    let mut screen = debug_screen(80);
    let text = text_element(
        &mut screen,
        "Hello",
        Style::new().color(Color::Named(NamedColor::Green)),
    );
    screen.append_child_to_container(text).ok();
    screen.reset_after_commit().ok();

    assert_eq!(
        screen.terminal().frames(),
        &["\x1b[32mHello\x1b[39m\n".to_string()]
    );
}

#[test]
fn nested_styling() {
    let mut screen = debug_screen(80);
    let root_ctx = screen.get_root_host_context();
    let outer = screen
        .create_instance(
            ElementKind::Text,
            &Props::new().style(Style::new().color(Color::Named(NamedColor::Blue))),
            root_ctx,
        )
        .unwrap_or_default();
    let text_ctx = screen.get_child_host_context(root_ctx, ElementKind::Text);

    let a = screen
        .create_text_instance("A ", text_ctx)
        .unwrap_or_default();
    screen.append_initial_child(outer, a).ok();

    let inner = screen
        .create_instance(
            ElementKind::Text,
            &Props::new().style(Style::new().bold(true)),
            text_ctx,
        )
        .unwrap_or_default();
    let b = screen
        .create_text_instance("B", text_ctx)
        .unwrap_or_default();
    screen.append_initial_child(inner, b).ok();
    screen.append_initial_child(outer, inner).ok();

    let c = screen
        .create_text_instance(" C", text_ctx)
        .unwrap_or_default();
    screen.append_initial_child(outer, c).ok();

    screen.append_child_to_container(outer).ok();
    screen.reset_after_commit().ok();

    assert_eq!(
        screen.terminal().last_frame(),
        Some("\x1b[34mA \x1b[1mB\x1b[22m C\x1b[39m\n")
    );
}

#[test]
fn keyed_reorder_preserves_layout_handles() {
    let mut screen = debug_screen(80);
    let row = screen
        .create_instance(ElementKind::Box, &Props::new(), HostContext::default())
        .unwrap_or_default();
    let a = text_element(&mut screen, "A", Style::new());
    let b = text_element(&mut screen, "B", Style::new());
    screen.append_initial_child(row, a).ok();
    screen.append_initial_child(row, b).ok();
    screen.append_child_to_container(row).ok();
    screen.reset_after_commit().ok();
    assert_eq!(screen.terminal().last_frame(), Some("AB\n"));

    let handle_a = screen.tree().node(a).and_then(|n| n.layout);
    let handle_b = screen.tree().node(b).and_then(|n| n.layout);
    let style_a = screen.tree().node(a).map(|n| n.style.clone());

    // The keyed diff reorders by removing and reinserting before the
    // sibling.
    screen.remove_child(row, b).ok();
    screen.insert_before(row, b, a).ok();
    screen.reset_after_commit().ok();

    assert_eq!(screen.terminal().last_frame().map(|f| f.contains("BA")), Some(true));
    // No handle was freed or recreated, and styles survived the move.
    assert_eq!(screen.tree().node(a).and_then(|n| n.layout), handle_a);
    assert_eq!(screen.tree().node(b).and_then(|n| n.layout), handle_b);
    assert_eq!(screen.tree().node(a).map(|n| n.style.clone()), style_a);
}

#[test]
fn overflow_clip_hides_outside_columns() {
    let mut screen = debug_screen(80);
    let boxed = screen
        .create_instance(
            ElementKind::Box,
            &Props::new().style(Style::new().width(5).overflow_x(Overflow::Hidden)),
            HostContext::default(),
        )
        .unwrap_or_default();
    let text = text_element(&mut screen, "HelloWorld", Style::new());
    screen.append_initial_child(boxed, text).ok();
    screen.append_child_to_container(boxed).ok();
    screen.reset_after_commit().ok();

    let frame = screen.terminal().last_frame().unwrap_or("").to_string();
    let first = frame.split('\n').next().unwrap_or("");
    assert!(first.starts_with("Hello"), "{first:?}");
    assert!(!first.contains('W'));
}

#[test]
fn wrap_breaks_words_at_inner_width() {
    let mut screen = debug_screen(80);
    let boxed = screen
        .create_instance(
            ElementKind::Box,
            &Props::new().style(Style::new().width(7)),
            HostContext::default(),
        )
        .unwrap_or_default();
    let text = text_element(
        &mut screen,
        "alpha beta gamma",
        Style::new().text_wrap(nib_core::TextWrap::Wrap),
    );
    screen.append_initial_child(boxed, text).ok();
    screen.append_child_to_container(boxed).ok();
    screen.reset_after_commit().ok();

    assert_eq!(
        screen.terminal().last_frame(),
        Some("alpha\nbeta\ngamma\n")
    );
}

#[test]
fn static_region_appends_without_rewrites() {
    let mut screen = throttled_screen(80);

    // Commit 1: a static list with two items plus a dynamic line.
    let static_box = screen
        .create_instance(
            ElementKind::Box,
            &Props::new()
                .style(
                    Style::new()
                        .position(Position::Absolute)
                        .flex_direction(FlexDirection::Column),
                )
                .attr(ATTR_STATIC, AttrValue::Bool(true)),
            HostContext::default(),
        )
        .unwrap_or_default();
    let item_a = text_element(&mut screen, "a", Style::new());
    let item_b = text_element(&mut screen, "b", Style::new());
    screen.append_initial_child(static_box, item_a).ok();
    screen.append_initial_child(static_box, item_b).ok();
    screen.append_child_to_container(static_box).ok();

    let dynamic = text_element(&mut screen, "dyn", Style::new());
    screen.append_child_to_container(dynamic).ok();

    screen.reset_after_commit().ok();
    // Static growth bypasses the rate limiter: the frame is out already.
    assert_eq!(screen.terminal().write_count(), 1);
    assert_eq!(screen.terminal().frames()[0], "a\nb\ndyn\n");

    // Commit 2: the host consumed the rendered items (a Static element
    // only keeps not-yet-written children).
    screen.remove_child(static_box, item_a).ok();
    screen.remove_child(static_box, item_b).ok();
    screen.reset_after_commit().ok();
    std::thread::sleep(std::time::Duration::from_millis(40));
    screen.tick().ok();
    // Nothing changed on screen: no write happened.
    assert_eq!(screen.terminal().write_count(), 1);

    // Commit 3: mutating the dynamic region does not rewrite the static
    // rows.
    screen.commit_text_update(leaf_of(&screen, dynamic), "dyn!").ok();
    screen.reset_after_commit().ok();
    std::thread::sleep(std::time::Duration::from_millis(40));
    screen.tick().ok();
    assert_eq!(screen.terminal().write_count(), 2);
    let second = screen.terminal().frames()[1].clone();
    assert!(!second.contains('a'), "{second:?}");
    assert!(second.contains("dyn!"));

    // Commit 4: a third static item triggers one immediate emission
    // carrying only the new item above the dynamic region.
    let item_c = text_element(&mut screen, "c", Style::new());
    screen.append_child(static_box, item_c).ok();
    screen.reset_after_commit().ok();
    // No tick, no sleep: the limiter was bypassed.
    assert_eq!(screen.terminal().write_count(), 3);
    let third = screen.terminal().frames()[2].clone();
    assert!(third.contains("c\n"), "{third:?}");
    assert!(!third.contains("a\nb"), "{third:?}");
    assert!(third.contains("dyn!"));
}

#[test]
fn render_is_idempotent() {
    let mut screen = debug_screen(80);
    let text = text_element(&mut screen, "steady", Style::new());
    screen.append_child_to_container(text).ok();
    screen.reset_after_commit().ok();
    let first = screen.terminal().last_frame().map(str::to_string);
    screen.reset_after_commit().ok();

    // Identical bytes were produced; the second render wrote nothing.
    assert_eq!(screen.terminal().write_count(), 1);
    assert_eq!(screen.terminal().last_frame().map(str::to_string), first);
}

#[test]
fn incremental_commits_match_from_scratch_build() {
    // Mutate one screen across two commits.
    let mut mutated = debug_screen(80);
    let row = mutated
        .create_instance(ElementKind::Box, &Props::new(), HostContext::default())
        .unwrap_or_default();
    let a = text_element(&mut mutated, "one", Style::new());
    let b = text_element(
        &mut mutated,
        "two",
        Style::new().color(Color::Named(NamedColor::Red)),
    );
    mutated.append_initial_child(row, a).ok();
    mutated.append_initial_child(row, b).ok();
    mutated.append_child_to_container(row).ok();
    mutated.reset_after_commit().ok();

    mutated.commit_text_update(leaf_of(&mutated, a), "ONE").ok();
    mutated.remove_child(row, b).ok();
    mutated.insert_before(row, b, a).ok();
    mutated.reset_after_commit().ok();

    // Build the post-state directly.
    let mut fresh = debug_screen(80);
    let row2 = fresh
        .create_instance(ElementKind::Box, &Props::new(), HostContext::default())
        .unwrap_or_default();
    let b2 = text_element(
        &mut fresh,
        "two",
        Style::new().color(Color::Named(NamedColor::Red)),
    );
    let a2 = text_element(&mut fresh, "ONE", Style::new());
    fresh.append_initial_child(row2, b2).ok();
    fresh.append_initial_child(row2, a2).ok();
    fresh.append_child_to_container(row2).ok();
    fresh.reset_after_commit().ok();

    // Applying the commit incrementally renders the same bytes as
    // building the post-state tree from scratch (modulo the in-place
    // erase of the previously painted single line).
    let via_commits = mutated.terminal().last_frame().unwrap_or("");
    let from_scratch = fresh.terminal().last_frame().unwrap_or("");
    assert_eq!(from_scratch, "\x1b[31mtwo\x1b[39mONE\n");
    assert_eq!(
        via_commits,
        format!("\x1b[1A\x1b[2K\x1b[1B\x1b[1A{from_scratch}")
    );
}
