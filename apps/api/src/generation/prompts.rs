// LLM prompt constants for worksheet generation.
// The numbering conventions in the template are the contract with content::parser.

/// System prompt for worksheet generation.
pub const WORKSHEET_SYSTEM: &str = "You are an experienced classroom teacher who writes \
    printable worksheets. Respond with plain text only. \
    Do NOT wrap the worksheet in code fences. \
    Do NOT include explanations before or after the worksheet.";

/// Worksheet prompt template. Replace `{grade_label}`, `{subject}`, `{topic}` before sending.
///
/// The numbering conventions are what the content parser keys on: `1.` starts an item,
/// `a.`-`d.` are choices, `AA.`-`DD.` are matching answers.
pub const WORKSHEET_PROMPT_TEMPLATE: &str = r#"Create an educational worksheet for {grade_label} {subject} about {topic}.
Include:
1. 2-3 warm-up questions
2. 3-4 main exercises or problems (short response, matching, or multiple choice)
3. 1-2 long answer questions (1 paragraph response)
4. 1 challenge question (short response or multiple choice)
Include only the content in your response, no formatting or question types.
Format with clear sections and numbering.
Number every question as "1.", "2.", ... at the start of its line.
For multiple choice, put "Multiple Choice" in the question line and list options on their own lines as "a.", "b.", "c.", "d.".
For matching, put "Matching" in the question line, list the terms as "a.", "b.", ... and the definitions as "AA.", "BB.", ...
Ensure the worksheet is appropriate for the grade level and subject. Consider the Common Core State Standards for each grade level."#;

/// "4th grade", "1st grade", or the raw label when the grade is not a number
/// ("Kindergarten").
pub fn grade_label(grade: &str) -> String {
    let grade = grade.trim();
    match grade.parse::<u32>() {
        Ok(n) => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix} grade")
        }
        Err(_) => grade.to_string(),
    }
}

pub fn build_worksheet_prompt(subject: &str, topic: &str, grade: &str) -> String {
    WORKSHEET_PROMPT_TEMPLATE
        .replace("{grade_label}", &grade_label(grade))
        .replace("{subject}", subject.trim())
        .replace("{topic}", topic.trim())
}
