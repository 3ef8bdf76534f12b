use super::*;
use ratatui::style::Modifier;

fn render(content: &str, width: usize) -> Vec<String> {
    render_markdown(content, &Theme::dark_default(), width)
        .iter()
        .map(spans_text)
        .collect()
}

#[test]
fn paragraphs_are_separated_by_one_blank_line() {
    assert_eq!(
        render("First paragraph.\n\nSecond paragraph.", 80),
        vec!["First paragraph.", "", "Second paragraph."]
    );
}

#[test]
fn fenced_code_block_gets_language_caption() {
    let lines = render("Example:\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n", 80);
    assert_eq!(
        lines,
        vec![
            "Example:",
            "",
            "rust",
            "fn main() {",
            "    println!(\"hi\");",
            "}",
        ]
    );
}

#[test]
fn unlabelled_code_block_uses_generic_caption() {
    let lines = render("```\nls -la\n```", 80);
    assert_eq!(lines, vec!["code", "ls -la"]);
}

#[test]
fn code_block_lines_use_code_style() {
    let theme = Theme::dark_default();
    let lines = render_markdown("```sh\necho hi\n```", &theme, 80);
    assert_eq!(lines[0].spans[0].style, theme.code_caption_style);
    assert_eq!(lines[1].spans[0].style, theme.code_block_style);
}

#[test]
fn unordered_and_ordered_lists_render_markers() {
    let lines = render("- apples\n- pears\n\n3. three\n4. four", 80);
    assert_eq!(
        lines,
        vec!["• apples", "• pears", "", "3. three", "4. four"]
    );
}

#[test]
fn nested_lists_indent_under_parent_marker() {
    let lines = render("- outer\n  - inner\n- next", 80);
    assert_eq!(lines, vec!["• outer", "  • inner", "• next"]);
}

#[test]
fn wrapped_list_items_hang_under_the_text() {
    let lines = render("1. one two three four", 10);
    assert_eq!(lines, vec!["1. one two", "   three", "   four"]);
}

#[test]
fn emphasis_and_inline_code_are_styled() {
    let theme = Theme::dark_default();
    let lines = render_markdown("a **bold** and `code`", &theme, 80);
    let spans = &lines[0].spans;
    let bold = spans.iter().find(|s| s.content == "bold").expect("bold span");
    assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    let code = spans.iter().find(|s| s.content == "code").expect("code span");
    assert_eq!(code.style, theme.inline_code_style);
}

#[test]
fn links_show_destination_when_text_differs() {
    assert_eq!(
        render("see [docs](https://ai.google.dev)", 80),
        vec!["see docs (https://ai.google.dev)"]
    );
    assert_eq!(
        render("<https://ai.google.dev>", 80),
        vec!["https://ai.google.dev"]
    );
}

#[test]
fn headings_and_quotes() {
    let theme = Theme::dark_default();
    let lines = render_markdown("# Title\n\n> quoted text", &theme, 80);
    assert_eq!(spans_text(&lines[0]), "Title");
    assert!(lines[0].spans[0]
        .style
        .add_modifier
        .contains(Modifier::UNDERLINED));
    assert_eq!(spans_text(&lines[1]), "");
    assert_eq!(spans_text(&lines[2]), "│ quoted text");
}

#[test]
fn rule_is_capped_to_width() {
    let lines = render("above\n\n---\n\nbelow", 10);
    assert_eq!(lines[2], "─".repeat(10));
}

#[test]
fn tables_render_cells_with_separators() {
    let lines = render("| a | b |\n|---|---|\n| 1 | 2 |", 80);
    assert_eq!(lines, vec!["a │ b", "1 │ 2"]);
}

#[test]
fn partial_markdown_mid_stream_still_renders() {
    let lines = render("Here is code:\n\n```py\nprint(1", 80);
    assert_eq!(lines, vec!["Here is code:", "", "py", "print(1"]);
}

#[test]
fn plain_rendering_keeps_line_breaks_and_wraps() {
    let lines: Vec<String> = render_plain("one two three\n\n*not markdown*", Style::default(), 9)
        .iter()
        .map(spans_text)
        .collect();
    assert_eq!(lines, vec!["one two", "three", "", "*not", "markdown*"]);
}
