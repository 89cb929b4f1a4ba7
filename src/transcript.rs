use serde::{Deserialize, Serialize};

/// One answered wizard step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Answers collected so far in a wizard session, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    exchanges: Vec<Exchange>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript from parallel question/answer lists. Questions past the end of
    /// `questions` are left empty.
    pub fn from_answers(questions: &[String], answers: &[String]) -> Self {
        let exchanges = answers
            .iter()
            .enumerate()
            .map(|(i, answer)| Exchange {
                question: questions.get(i).cloned().unwrap_or_default(),
                answer: answer.clone(),
            })
            .collect();
        Transcript { exchanges }
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.exchanges.push(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn questions(&self) -> Vec<String> {
        self.exchanges.iter().map(|e| e.question.clone()).collect()
    }

    pub fn answers(&self) -> Vec<String> {
        self.exchanges.iter().map(|e| e.answer.clone()).collect()
    }
}
