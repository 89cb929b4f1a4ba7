use super::cache::{CachePolicy, ResponseCache};
use super::prompt::{build_next_question_prompt, build_recommendation_prompt};
use super::response::{extract_json, parse_next_question, parse_recommendations};
use super::{GiftRecommendations, NextQuestion};
use crate::error::{Result, WizardError};
use crate::settings::{Prompts, Settings};
use crate::transcript::Transcript;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// The chat-completions endpoint; not configurable
pub const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_PREFIX: &str = "sk-";
const API_KEY_MIN_BODY: usize = 32;
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl ChatRequest {
    /// A single user message
    pub fn user(model: &str, prompt: String, temperature: f64) -> Self {
        ChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// Sends one chat-completion request
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Check an API key has the `sk-` prefix followed by at least 32 of `[A-Za-z0-9_-]`
pub fn validate_api_key(key: &str) -> Result<()> {
    let body = key.strip_prefix(API_KEY_PREFIX).ok_or_else(|| {
        WizardError::InvalidApiKey(format!("key must start with '{}'", API_KEY_PREFIX))
    })?;
    if body.chars().count() < API_KEY_MIN_BODY {
        return Err(WizardError::InvalidApiKey(format!(
            "key must have at least {} characters after '{}'",
            API_KEY_MIN_BODY, API_KEY_PREFIX
        )));
    }
    if !body
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(WizardError::InvalidApiKey(
            "key may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

/// HTTPS transport to the chat-completions endpoint
pub struct HttpTransport {
    client: Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: &str) -> Result<Self> {
        validate_api_key(api_key)?;
        Ok(HttpTransport {
            client: Client::new(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| WizardError::Transport(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WizardError::Api {
                status,
                body: snippet(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| WizardError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_LIMIT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}…", cut)
    }
}

/// Logical request kinds; each gets its own cache key namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Recommendations,
    NextQuestion,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Recommendations => "recommendations",
            Operation::NextQuestion => "nextQuestion",
        }
    }

    /// `"{operation}-{answers as JSON}"`
    pub fn cache_key(self, answers: &[String]) -> Result<String> {
        Ok(format!("{}-{}", self.name(), serde_json::to_string(answers)?))
    }
}

/// Normalized payload of a completed request
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub payload: Value,
    pub total_tokens: Option<u64>,
    pub from_cache: bool,
}

/// A typed result plus request metadata
#[derive(Debug, Clone)]
pub struct Completion<T> {
    pub value: T,
    pub total_tokens: Option<u64>,
    pub from_cache: bool,
}

struct InFlight {
    id: u64,
    token: CancellationToken,
}

/// Request pipeline: response cache, a single in-flight request slot and a
/// per-request timeout in front of a [`ChatTransport`].
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    model: String,
    temperature: f64,
    prompts: Prompts,
    timeout: Duration,
    cache: ResponseCache<ParsedResponse>,
    in_flight: Mutex<Option<InFlight>>,
    next_request_id: AtomicU64,
}

impl<T: ChatTransport> ApiClient<T> {
    pub fn new(transport: T, settings: &Settings) -> Self {
        ApiClient {
            transport,
            model: settings.model.clone(),
            temperature: settings.temperature,
            prompts: settings.prompts.clone(),
            timeout: DEFAULT_TIMEOUT,
            cache: ResponseCache::new(CachePolicy::default()),
            in_flight: Mutex::new(None),
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache = ResponseCache::new(policy);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn cached(&self, key: &str) -> Option<ParsedResponse> {
        self.cache.get(key)
    }

    /// Ask for gift recommendations based on the whole transcript
    pub async fn recommendations(&self, transcript: &Transcript) -> Result<Completion<GiftRecommendations>> {
        let answers = transcript.answers();
        let prompt = build_recommendation_prompt(&self.prompts, &answers, &transcript.questions())?;
        let key = Operation::Recommendations.cache_key(&answers)?;
        tracing::info!(answers = answers.len(), "requesting gift recommendations");

        let response = self.call(Operation::Recommendations, prompt, &key).await?;
        Ok(Completion {
            value: parse_recommendations(&response.payload)?,
            total_tokens: response.total_tokens,
            from_cache: response.from_cache,
        })
    }

    /// Ask the model to write the next wizard question
    pub async fn next_question(&self, transcript: &Transcript) -> Result<Completion<NextQuestion>> {
        let answers = transcript.answers();
        let prompt = build_next_question_prompt(&self.prompts, &answers, &transcript.questions())?;
        let key = Operation::NextQuestion.cache_key(&answers)?;
        tracing::info!(answers = answers.len(), "requesting next question");

        let response = self.call(Operation::NextQuestion, prompt, &key).await?;
        Ok(Completion {
            value: parse_next_question(&response.payload)?,
            total_tokens: response.total_tokens,
            from_cache: response.from_cache,
        })
    }

    /// Run one request through the cache, the in-flight slot and the timeout.
    ///
    /// Starting a call cancels whatever call this client still has in flight;
    /// the superseded call resolves to [`WizardError::Cancelled`] and its result
    /// never reaches the cache.
    pub async fn call(&self, operation: Operation, prompt: String, cache_key: &str) -> Result<ParsedResponse> {
        if let Some(mut hit) = self.cache.get(cache_key) {
            tracing::debug!(operation = operation.name(), "using cached response");
            hit.from_cache = true;
            return Ok(hit);
        }

        let (id, token) = self.begin_request();
        let request = ChatRequest::user(&self.model, prompt, self.temperature);
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(WizardError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.transport.send(&request)) => match result {
                Ok(inner) => inner,
                Err(_) => Err(WizardError::Timeout(self.timeout)),
            },
        };
        self.finish_request(id);

        // A newer call may have started after the transport returned
        if token.is_cancelled() {
            tracing::debug!(operation = operation.name(), request = id, "discarding superseded response");
            return Err(WizardError::Cancelled);
        }

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(operation = operation.name(), error = %e, "API request failed");
                return Err(e);
            }
        };
        tracing::info!(
            operation = operation.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API request completed"
        );

        let parsed = normalize(response)?;
        self.cache.set(cache_key.to_string(), parsed.clone());
        tracing::trace!(entries = self.cache.entry_count(), "response cached");
        Ok(parsed)
    }

    fn begin_request(&self) -> (u64, CancellationToken) {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self.slot().replace(InFlight {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            tracing::debug!(previous = previous.id, request = id, "cancelling superseded request");
            previous.token.cancel();
        }
        (id, token)
    }

    fn finish_request(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|current| current.id == id) {
            *slot = None;
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(response: ChatResponse) -> Result<ParsedResponse> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| WizardError::MalformedResponse("Response has no message content".to_string()))?;

    Ok(ParsedResponse {
        payload: extract_json(&content)?,
        total_tokens: response.usage.and_then(|usage| usage.total_tokens),
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{reply, Scripted, ScriptedTransport};
    use crate::settings::default_settings;
    use serde_json::json;

    fn client(script: Vec<Scripted>) -> ApiClient<ScriptedTransport> {
        ApiClient::new(ScriptedTransport::new(script), &default_settings())
    }

    fn transcript(answers: &[&str]) -> Transcript {
        let mut t = Transcript::new();
        for (i, answer) in answers.iter().enumerate() {
            t.push(format!("Q{}", i + 1), *answer);
        }
        t
    }

    #[tokio::test]
    async fn test_same_request_hits_network_once() {
        let client = client(vec![(Duration::ZERO, reply("{\"a\":1}"))]);

        let first = client.call(Operation::NextQuestion, "p".into(), "key").await.unwrap();
        let second = client.call(Operation::NextQuestion, "p".into(), "key").await.unwrap();

        assert_eq!(client.transport.calls(), 1);
        assert_eq!(first.payload, second.payload);
        assert_eq!(
            serde_json::to_string(&first.payload).unwrap(),
            serde_json::to_string(&second.payload).unwrap()
        );
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.total_tokens, Some(42));
    }

    #[tokio::test]
    async fn test_newer_call_cancels_older() {
        let client = client(vec![
            (Duration::from_millis(300), reply("{\"which\":\"a\"}")),
            (Duration::from_millis(10), reply("{\"which\":\"b\"}")),
        ]);

        let (a, b) = tokio::join!(
            client.call(Operation::NextQuestion, "a".into(), "key-a"),
            async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                client.call(Operation::NextQuestion, "b".into(), "key-b").await
            }
        );

        assert!(matches!(a, Err(WizardError::Cancelled)));
        assert_eq!(b.unwrap().payload, json!({"which": "b"}));
        assert!(client.cached("key-a").is_none());
        assert!(client.cached("key-b").is_some());
    }

    #[tokio::test]
    async fn test_timeout_does_not_populate_cache() {
        let client = client(vec![(Duration::from_secs(5), reply("{\"a\":1}"))])
            .with_timeout(Duration::from_millis(50));

        let result = client.call(Operation::Recommendations, "p".into(), "key").await;
        assert!(matches!(result, Err(WizardError::Timeout(_))));
        assert!(client.cached("key").is_none());
    }

    #[tokio::test]
    async fn test_malformed_content_is_an_error() {
        let client = client(vec![(Duration::ZERO, reply("not json"))]);

        let result = client.call(Operation::Recommendations, "p".into(), "key").await;
        assert!(matches!(result, Err(WizardError::MalformedResponse(_))));
        assert!(client.cached("key").is_none());
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let client = client(vec![(
            Duration::ZERO,
            Err(WizardError::Api {
                status: 401,
                body: "invalid key".to_string(),
            }),
        )]);

        let result = client.call(Operation::Recommendations, "p".into(), "key").await;
        assert!(matches!(result, Err(WizardError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_recommendations_unwraps_fence() {
        let content = "```json\n{\"keywords\": [\"에어팟\"], \"descriptions\": [\"좋아요\"]}\n```";
        let client = client(vec![(Duration::ZERO, reply(content))]);

        let result = client.recommendations(&transcript(&["여자친구"])).await.unwrap();
        assert_eq!(result.value.keywords, vec!["에어팟"]);
        assert_eq!(result.total_tokens, Some(42));

        let prompts = client.transport.prompts();
        assert!(prompts[0].contains("- Q1: 여자친구"));
    }

    #[tokio::test]
    async fn test_next_question_is_cached_by_answers() {
        let client = client(vec![(
            Duration::ZERO,
            reply("{\"question\": \"몇 살이야?\", \"chips\": [\"20대\"]}"),
        )]);

        let first = client.next_question(&transcript(&["친구"])).await.unwrap();
        let second = client.next_question(&transcript(&["친구"])).await.unwrap();
        assert_eq!(first.value, second.value);
        assert!(second.from_cache);
        assert_eq!(client.transport.calls(), 1);
        assert!(client.cached("nextQuestion-[\"친구\"]").is_some());
    }

    #[tokio::test]
    async fn test_missing_template_skips_network() {
        let mut settings = default_settings();
        settings.prompts.recommendation_prompt = None;
        let client = ApiClient::new(ScriptedTransport::new(vec![]), &settings);

        let result = client.recommendations(&transcript(&["x"])).await;
        assert!(matches!(result, Err(WizardError::Configuration(_))));
        assert_eq!(client.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let empty: Result<ChatResponse> = Ok(serde_json::from_value(json!({"choices": []})).unwrap());
        let client = client(vec![(Duration::ZERO, empty)]);

        let result = client.call(Operation::NextQuestion, "p".into(), "key").await;
        assert!(matches!(result, Err(WizardError::MalformedResponse(_))));
    }

    #[test]
    fn test_cache_key_format() {
        let key = Operation::Recommendations
            .cache_key(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(key, "recommendations-[\"a\",\"b\"]");
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::user("gpt-4o-mini", "hello".to_string(), 0.7);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.7
            })
        );
    }

    #[test]
    fn test_validate_api_key() {
        let valid = format!("sk-{}", "a".repeat(32));
        assert!(validate_api_key(&valid).is_ok());
        assert!(validate_api_key("sk-proj-abcdefghijklmnopqrstuvwxyz_0123456789").is_ok());

        assert!(validate_api_key(&format!("sk-{}", "a".repeat(31))).is_err());
        assert!(validate_api_key(&format!("pk-{}", "a".repeat(32))).is_err());
        assert!(validate_api_key(&format!("sk-{}!", "a".repeat(32))).is_err());
    }

    #[test]
    fn test_error_body_is_truncated() {
        let long = "x".repeat(2000);
        let cut = snippet(&long);
        assert!(cut.chars().count() <= ERROR_BODY_LIMIT + 1);
        assert_eq!(snippet("  short  "), "short");
    }
}
