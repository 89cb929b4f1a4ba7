//! Question sequencing for a wizard session.
//!
//! Static steps come straight from settings. `ai` steps are generated from the
//! answers so far; if generation fails for any reason the configured static
//! question is asked instead. Recommendation failures are returned to the
//! caller unchanged.

use crate::error::{Result, WizardError};
use crate::llm::{ApiClient, ChatTransport, Completion, GiftRecommendations};
use crate::settings::{QuestionType, Settings};
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Static,
    Generated,
}

/// A question ready to be shown
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub description: String,
    pub chips: Vec<String>,
    pub source: QuestionSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Ask(Question),
    Finished,
}

pub struct Wizard<'a, T: ChatTransport> {
    settings: &'a Settings,
    client: &'a ApiClient<T>,
    transcript: Transcript,
    index: usize,
    current: Option<Question>,
}

impl<'a, T: ChatTransport> Wizard<'a, T> {
    pub fn new(settings: &'a Settings, client: &'a ApiClient<T>) -> Self {
        Wizard {
            settings,
            client,
            transcript: Transcript::new(),
            index: 0,
            current: static_question(settings, 0),
        }
    }

    /// The question awaiting an answer, or `None` once all steps are answered
    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn common_description(&self) -> &str {
        &self.settings.common_description
    }

    /// Model used for this session's requests
    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// `(step number starting at 1, total steps)`
    pub fn progress(&self) -> (usize, usize) {
        let total = self.settings.step_count();
        ((self.index + 1).min(total), total)
    }

    /// Record an answer to the current question and move to the next step
    pub async fn answer(&mut self, answer: &str) -> Result<Step> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(WizardError::InvalidInput("Please enter an answer".to_string()));
        }
        let question = self
            .current
            .take()
            .ok_or_else(|| WizardError::InvalidInput("All questions are already answered".to_string()))?;

        self.transcript.push(question.text, answer);
        self.index += 1;

        let Some(spec) = self.settings.question(self.index) else {
            tracing::debug!(answers = self.transcript.len(), "all questions answered");
            return Ok(Step::Finished);
        };

        let next = match spec.kind {
            QuestionType::Normal => static_question(self.settings, self.index),
            QuestionType::Ai => self.generated_question().await,
        };
        self.current = next.clone();
        Ok(next.map(Step::Ask).unwrap_or(Step::Finished))
    }

    /// Request recommendations for the answers collected so far
    pub async fn recommend(&self) -> Result<Completion<GiftRecommendations>> {
        if self.transcript.is_empty() {
            return Err(WizardError::InvalidInput("Answer at least one question first".to_string()));
        }
        self.client.recommendations(&self.transcript).await
    }

    /// Start over from the first question
    pub fn restart(&mut self) {
        self.transcript.clear();
        self.index = 0;
        self.current = static_question(self.settings, 0);
    }

    async fn generated_question(&self) -> Option<Question> {
        match self.client.next_question(&self.transcript).await {
            Ok(completion) => {
                let generated = completion.value;
                Some(Question {
                    text: generated.question,
                    description: generated.description,
                    chips: generated.chips,
                    source: QuestionSource::Generated,
                })
            }
            Err(e) if e.is_cancelled() => {
                tracing::debug!(step = self.index, "question generation superseded");
                static_question(self.settings, self.index)
            }
            Err(e) => {
                tracing::warn!(step = self.index, error = %e, "question generation failed, using configured question");
                static_question(self.settings, self.index)
            }
        }
    }
}

fn static_question(settings: &Settings, index: usize) -> Option<Question> {
    settings.question(index).map(|spec| Question {
        text: spec.text,
        description: spec.description,
        chips: spec.chips,
        source: QuestionSource::Static,
    })
}
