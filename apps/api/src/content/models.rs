use serde::{Deserialize, Serialize};

/// One parsed unit of worksheet text.
///
/// `MultipleChoice` and `Matching` keep their lettered lines verbatim ("a. cat"), in the
/// order they appeared in the source. Empty `choices`/`answers` are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        content: String,
    },
    MultipleChoice {
        question: String,
        choices: Vec<String>,
    },
    Matching {
        question: String,
        choices: Vec<String>,
        answers: Vec<String>,
    },
}

impl ContentItem {
    pub fn text(content: impl Into<String>) -> Self {
        ContentItem::Text {
            content: content.into(),
        }
    }

    /// The leading block of the item: `content` for text, `question` otherwise.
    pub fn heading(&self) -> &str {
        match self {
            ContentItem::Text { content } => content,
            ContentItem::MultipleChoice { question, .. } => question,
            ContentItem::Matching { question, .. } => question,
        }
    }

    pub fn choices(&self) -> &[String] {
        match self {
            ContentItem::Text { .. } => &[],
            ContentItem::MultipleChoice { choices, .. } => choices,
            ContentItem::Matching { choices, .. } => choices,
        }
    }

    pub fn answers(&self) -> &[String] {
        match self {
            ContentItem::Matching { answers, .. } => answers,
            _ => &[],
        }
    }

    /// Number of stacked rows below the question: `max(choices, answers)`.
    pub fn row_count(&self) -> usize {
        self.choices().len().max(self.answers().len())
    }

    /// Reconstructs the trimmed source lines this item was built from.
    ///
    /// Colon-joined continuation lines ("2. Short answer: Why ...") are split back apart
    /// at the first ": " that follows a category label. A source line that itself
    /// contained "<label>: " mid-line is indistinguishable and comes back split.
    #[cfg(test)]
    pub fn source_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for segment in self.heading().split('\n') {
            if matches!(self, ContentItem::Text { .. }) {
                split_colon_joined(segment, &mut lines);
            } else {
                lines.push(segment.to_string());
            }
        }
        lines.extend(self.choices().iter().cloned());
        lines.extend(self.answers().iter().cloned());
        lines
    }
}

#[cfg(test)]
fn split_colon_joined(segment: &str, out: &mut Vec<String>) {
    let mut rest = segment;
    while let Some(pos) = rest.find(": ") {
        let head = &rest[..pos];
        if !crate::content::parser::ends_with_category_label(head) {
            break;
        }
        out.push(head.to_string());
        rest = &rest[pos + 2..];
    }
    out.push(rest.to_string());
}
