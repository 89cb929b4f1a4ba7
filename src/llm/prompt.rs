use crate::error::{Result, WizardError};
use crate::settings::Prompts;

/// Placeholder name for the answers collected so far
pub const ANSWERS_PLACEHOLDER: &str = "현재까지답변";

/// Render the recommendation prompt from the configured template
pub fn build_recommendation_prompt(
    prompts: &Prompts,
    answers: &[String],
    questions: &[String],
) -> Result<String> {
    let template = required_template(
        prompts.recommendation_prompt.as_deref(),
        "recommendationPrompt",
    )?;
    Ok(render_template(template, answers, questions))
}

/// Render the next-question prompt from the configured template
pub fn build_next_question_prompt(
    prompts: &Prompts,
    answers: &[String],
    questions: &[String],
) -> Result<String> {
    let template = required_template(
        prompts.next_question_prompt.as_deref(),
        "nextQuestionPrompt",
    )?;
    Ok(render_template(template, answers, questions))
}

fn required_template<'a>(template: Option<&'a str>, name: &str) -> Result<&'a str> {
    template
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| WizardError::Configuration(format!("prompts.{} is not configured", name)))
}

/// One `- question: answer` line per answer. Missing or blank questions are
/// labelled by position.
pub fn render_transcript(answers: &[String], questions: &[String]) -> String {
    answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let question = questions
                .get(i)
                .filter(|q| !q.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("질문 {}", i + 1));
            format!("- {}: {}", question, answer)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace every `{{현재까지답변}}` token with the transcript.
///
/// Other `{{...}}` tokens and unterminated `{{` are copied through unchanged.
/// Inserted text is never rescanned.
pub fn render_template(template: &str, answers: &[String], questions: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut transcript: Option<String> = None;
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) if &after[..end] == ANSWERS_PLACEHOLDER => {
                let text = transcript.get_or_insert_with(|| render_transcript(answers, questions));
                out.push_str(text);
                rest = &after[end + 2..];
            }
            _ => {
                // Not ours; emit the braces and keep scanning what follows
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
