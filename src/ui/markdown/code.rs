use pulldown_cmark::CodeBlockKind;

pub(super) fn language_hint_from_codeblock_kind(kind: &CodeBlockKind) -> String {
    match kind {
        CodeBlockKind::Indented => String::new(),
        CodeBlockKind::Fenced(info) => info.split_ascii_whitespace().next().unwrap_or("").into(),
    }
}

pub(super) fn push_codeblock_text(code_block_lines: &mut Vec<String>, text: &str) {
    for l in text.lines() {
        code_block_lines.push(detab(l));
    }
}

/// Caption shown above a code block.
pub(super) fn code_caption(language: &str) -> String {
    if language.is_empty() {
        "code".to_string()
    } else {
        language.to_string()
    }
}

pub(super) fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}
