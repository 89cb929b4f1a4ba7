use crate::error::{Result, WizardError};
use serde::{Deserialize, Serialize};

/// Effective wizard settings after all layers are merged.
///
/// Field names serialize in camelCase so existing `settings.json` documents
/// can be used unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub questions: Vec<String>,
    pub question_descriptions: Vec<String>,
    pub question_types: Vec<QuestionType>,
    pub question_chips: Vec<Vec<String>>,
    pub common_description: String,
    pub model: String,
    pub temperature: f64,
    pub prompts: Prompts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Normal,
    Ai,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Normal => write!(f, "normal"),
            QuestionType::Ai => write!(f, "ai"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question_prompt: Option<String>,
}

/// A single wizard step as configured
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSpec {
    pub text: String,
    pub description: String,
    pub kind: QuestionType,
    pub chips: Vec<String>,
}

/// One configuration layer: the fetched document, the persisted override or a
/// partial update. Absent fields leave the lower layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_descriptions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_types: Option<Vec<QuestionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_chips: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Prompts>,
    /// Legacy field; the endpoint is fixed and this value is always discarded.
    #[serde(default, skip_serializing)]
    pub api_endpoint: Option<serde_json::Value>,
}

impl SettingsLayer {
    /// Drop the legacy `apiEndpoint` field, if present
    pub fn strip_legacy(mut self, origin: &str) -> Self {
        if self.api_endpoint.take().is_some() {
            tracing::warn!(origin, "ignoring apiEndpoint; the API endpoint is not configurable");
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsLayer::default()
    }
}

impl Settings {
    /// Overlay a layer onto these settings, field by field
    pub fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(ref v) = layer.questions {
            self.questions = v.clone();
        }
        if let Some(ref v) = layer.question_descriptions {
            self.question_descriptions = v.clone();
        }
        if let Some(ref v) = layer.question_types {
            self.question_types = v.clone();
        }
        if let Some(ref v) = layer.question_chips {
            self.question_chips = v.clone();
        }
        if let Some(ref v) = layer.common_description {
            self.common_description = v.clone();
        }
        if let Some(ref v) = layer.model {
            self.model = v.clone();
        }
        if let Some(v) = layer.temperature {
            self.temperature = v;
        }
        if let Some(ref v) = layer.prompts {
            self.prompts = v.clone();
        }
    }

    /// Number of configured wizard steps
    pub fn step_count(&self) -> usize {
        self.questions.len()
    }

    /// Look up a configured wizard step
    pub fn question(&self, index: usize) -> Option<QuestionSpec> {
        let text = self.questions.get(index)?;
        Some(QuestionSpec {
            text: text.clone(),
            description: self.question_descriptions.get(index).cloned().unwrap_or_default(),
            kind: self.question_types.get(index).copied().unwrap_or_default(),
            chips: self.question_chips.get(index).cloned().unwrap_or_default(),
        })
    }

    /// Check the per-question arrays line up and the model parameters are usable
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let n = self.questions.len();

        if n == 0 {
            errors.push("at least one question is required".to_string());
        }
        for (name, len) in [
            ("questionDescriptions", self.question_descriptions.len()),
            ("questionTypes", self.question_types.len()),
            ("questionChips", self.question_chips.len()),
        ] {
            if len != n {
                errors.push(format!("{} has {} entries but there are {} questions", name, len, n));
            }
        }
        if self.model.trim().is_empty() {
            errors.push("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.push(format!("temperature {} is outside 0..=2", self.temperature));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WizardError::Configuration(errors.join("; ")))
        }
    }
}
