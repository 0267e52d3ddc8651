//! Strips markdown decoration from generated text.
//!
//! Ordered markers (`1.`, `a.`, `AA.`) are left alone; the content parser depends on them.
//! Fence lines are dropped but the fenced text is kept, since models sometimes fence the
//! whole answer.

use std::sync::LazyLock;

use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    // Order matters: line-level markers first, then emphasis from longest to shortest.
    [
        (r"(?m)^[ \t]*```.*$", ""),
        (r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$", ""),
        (r"!\[[^\]]*\]\([^)]*\)", ""),
        (r"\[([^\]]+)\]\([^)]+\)", "$1"),
        (r"(?m)^[ \t]*#{1,6}[ \t]*", ""),
        (r"(?m)^[ \t]*>[ \t]?", ""),
        (r"(?m)^[ \t]*[-*+][ \t]+", ""),
        (r"\*\*\*(.+?)\*\*\*", "$1"),
        (r"___(.+?)___", "$1"),
        (r"\*\*(.+?)\*\*", "$1"),
        (r"__(.+?)__", "$1"),
        (r"~~(.+?)~~", "$1"),
        (r"\*([^*\n]+?)\*", "$1"),
        (r"(^|[^\w])_([^_\n]+?)_([^\w]|$)", "$1$2$3"),
        (r"`([^`\n]+)`", "$1"),
        (r"\n(?:[ \t]*\n)+", "\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Rule {
        pattern: Regex::new(pattern).expect("valid markdown rule"),
        replacement,
    })
    .collect()
});

pub fn clean_markdown(markdown: &str) -> String {
    let mut text = markdown.replace("\r\n", "\n");
    for rule in RULES.iter() {
        text = rule
            .pattern
            .replace_all(&text, rule.replacement)
            .into_owned();
    }
    text.trim().to_string()
}
