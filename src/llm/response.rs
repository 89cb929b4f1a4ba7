use crate::error::{Result, WizardError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gift keyword recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRecommendations {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

impl GiftRecommendations {
    /// Keywords paired with their description (empty when the model gave fewer)
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keywords.iter().enumerate().map(|(i, keyword)| {
            let description = self.descriptions.get(i).map(String::as_str).unwrap_or("");
            (keyword.as_str(), description)
        })
    }
}

/// An AI-generated wizard question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextQuestion {
    pub question: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub chips: Vec<String>,
}

/// Parse a recommendation payload
pub fn parse_recommendations(payload: &Value) -> Result<GiftRecommendations> {
    let parsed: GiftRecommendations = serde_json::from_value(payload.clone())
        .map_err(|e| WizardError::MalformedResponse(format!("Invalid recommendations: {}", e)))?;
    if parsed.keywords.is_empty() {
        return Err(WizardError::MalformedResponse(
            "Recommendations contain no keywords".to_string(),
        ));
    }
    Ok(parsed)
}

/// Parse a next-question payload
pub fn parse_next_question(payload: &Value) -> Result<NextQuestion> {
    let parsed: NextQuestion = serde_json::from_value(payload.clone())
        .map_err(|e| WizardError::MalformedResponse(format!("Invalid next question: {}", e)))?;
    if parsed.question.trim().is_empty() {
        return Err(WizardError::MalformedResponse(
            "Generated question is empty".to_string(),
        ));
    }
    Ok(parsed)
}

/// Extract the JSON payload from model output, unwrapping a markdown code fence
pub fn extract_json(raw: &str) -> Result<Value> {
    let candidate = fenced_block(raw).unwrap_or(raw).trim();
    serde_json::from_str(candidate).map_err(|e| {
        tracing::debug!(error = %e, "model output is not JSON");
        WizardError::MalformedResponse(format!("Response is not valid JSON: {}", e))
    })
}

/// Interior of the first closed ```` ```json ```` fence. Without one, the
/// first closed fence of any kind.
fn fenced_block(raw: &str) -> Option<&str> {
    json_fence(raw).or_else(|| {
        let start = raw.find("```")?;
        let body = &raw[start + 3..];
        let end = body.find("```")?;
        Some(&body[..end])
    })
}

fn json_fence(raw: &str) -> Option<&str> {
    let mut rest = raw;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        if after.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            let body = &after[4..];
            return body.find("```").map(|end| &body[..end]);
        }
        rest = after;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_fenced() {
        let value = extract_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_plain() {
        let value = extract_json("{\"a\":1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_bare_fence_with_prose() {
        let raw = "Here you go:\n```\n{\"keywords\": [\"x\"]}\n```\nEnjoy!";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"keywords": ["x"]}));
    }

    #[test]
    fn test_json_fence_wins_over_earlier_fence() {
        let raw = "Example:\n```text\nhello\n```\nAnswer:\n```json\n{\"a\":1}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));

        let upper = "```\nnot this\n```\n```JSON\n{\"b\":2}\n```";
        assert_eq!(extract_json(upper).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn test_extract_json_rejects_garbage() {
        assert!(matches!(
            extract_json("not json"),
            Err(WizardError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unclosed_fence_is_malformed() {
        assert!(matches!(
            extract_json("```json\n{\"a\":1}"),
            Err(WizardError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_recommendations() {
        let payload = json!({
            "keywords": ["샤넬 지갑", "애플 에어팟"],
            "descriptions": ["고급스러워요!"]
        });
        let parsed = parse_recommendations(&payload).unwrap();
        let items: Vec<_> = parsed.items().collect();
        assert_eq!(items, vec![("샤넬 지갑", "고급스러워요!"), ("애플 에어팟", "")]);
    }

    #[test]
    fn test_parse_recommendations_wrong_shape() {
        assert!(parse_recommendations(&json!({"question": "hi"})).is_err());
        assert!(parse_recommendations(&json!({"keywords": []})).is_err());
    }

    #[test]
    fn test_parse_next_question_defaults() {
        let parsed = parse_next_question(&json!({"question": "몇 살이야?"})).unwrap();
        assert_eq!(parsed.question, "몇 살이야?");
        assert!(parsed.description.is_empty());
        assert!(parsed.chips.is_empty());

        assert!(parse_next_question(&json!({"question": "  "})).is_err());
    }
}
