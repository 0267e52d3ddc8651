//! Line-oriented parser for generated worksheet text.
//!
//! Single pass with one open item at a time:
//! - `<digits>.` starts a new item (matching / multiple choice / text by keyword).
//! - `a.`–`d.` lines are choices of an open multiple-choice or matching item.
//! - `AA.`–`DD.` lines (uppercase only) are answers of an open matching item.
//! - anything else continues the open item, or becomes a standalone text item.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::content::models::ContentItem;

/// Category labels that make the next continuation line join with ": " instead of a newline.
const CATEGORY_LABELS: [&str; 5] = [
    "multiple choice",
    "matching",
    "short answer",
    "long answer",
    "challenge question",
];

static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*(.*)$").expect("valid numbered marker regex"));

static LETTER_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-d]\.\s+\w+").expect("valid letter option regex"));

static MATCHING_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]{2}\.\s+\w+").expect("valid matching answer regex"));

/// True when `text` ends with one of the fixed category labels (case-insensitive).
pub(crate) fn ends_with_category_label(text: &str) -> bool {
    let lower = text.trim_end().to_lowercase();
    CATEGORY_LABELS.iter().any(|label| lower.ends_with(label))
}

/// Parses generated text into an ordered sequence of content items.
pub fn parse_content(content: &str) -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = Vec::new();
    let mut current: Option<ContentItem> = None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = NUMBERED_MARKER.captures(line) {
            if let Some(open) = current.take() {
                items.push(open);
            }
            let marker_text = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_lowercase();
            current = Some(start_item(line, &marker_text));
            continue;
        }

        if LETTER_OPTION.is_match(line) {
            match current.as_mut() {
                Some(ContentItem::MultipleChoice { choices, .. })
                | Some(ContentItem::Matching { choices, .. }) => {
                    choices.push(line.to_string());
                    continue;
                }
                Some(_) => {}
                None => debug!(line, "Choice line with no open question; keeping as text"),
            }
        } else if MATCHING_ANSWER.is_match(line) {
            if let Some(ContentItem::Matching { answers, .. }) = current.as_mut() {
                answers.push(line.to_string());
                continue;
            }
        }

        match current.as_mut() {
            Some(open) => append_continuation(open, line),
            None => items.push(ContentItem::text(line)),
        }
    }

    if let Some(open) = current {
        items.push(open);
    }
    items
}

fn start_item(line: &str, marker_text: &str) -> ContentItem {
    if marker_text.contains("matching") {
        ContentItem::Matching {
            question: line.to_string(),
            choices: Vec::new(),
            answers: Vec::new(),
        }
    } else if marker_text.contains("multiple choice") {
        ContentItem::MultipleChoice {
            question: line.to_string(),
            choices: Vec::new(),
        }
    } else {
        ContentItem::text(line)
    }
}

fn append_continuation(item: &mut ContentItem, line: &str) {
    match item {
        ContentItem::Text { content } => {
            if ends_with_category_label(content) {
                content.push_str(": ");
            } else {
                content.push('\n');
            }
            content.push_str(line);
        }
        ContentItem::MultipleChoice { question, .. } | ContentItem::Matching { question, .. } => {
            question.push('\n');
            question.push_str(line);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
