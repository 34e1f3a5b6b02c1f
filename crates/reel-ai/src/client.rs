//! HTTP client for the inference provider.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use reel_models::CaptionResult;

use crate::caption::{build_caption_prompt, parse_caption_reply};
use crate::error::{AiError, AiResult};

/// Name of the credential variable.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CAPTION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CAPTION_LANGUAGE: &str = "Indonesian";
const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";
const DEFAULT_TTS_VOICE: &str = "alloy";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const CAPTION_MAX_TOKENS: u32 = 200;
const CAPTION_TEMPERATURE: f32 = 0.8;

/// Inference client configuration.
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    /// Bearer credential; calls fail fast without it
    pub api_key: Option<String>,
    /// Provider base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub caption_model: String,
    /// Language the caption is requested in
    pub caption_language: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub timeout: Duration,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            caption_language: DEFAULT_CAPTION_LANGUAGE.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AiClientConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = match std::env::var("OPENAI_BASE_URL") {
            Ok(raw) if Url::parse(&raw).is_ok() => raw,
            Ok(raw) => {
                warn!(base_url = %raw, "Invalid OPENAI_BASE_URL, using default");
                defaults.base_url
            }
            Err(_) => defaults.base_url,
        };

        Self {
            api_key: std::env::var(API_KEY_VAR)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url,
            caption_model: std::env::var("CAPTION_MODEL").unwrap_or(defaults.caption_model),
            caption_language: std::env::var("CAPTION_LANGUAGE").unwrap_or(defaults.caption_language),
            tts_model: std::env::var("TTS_MODEL").unwrap_or(defaults.tts_model),
            tts_voice: std::env::var("TTS_VOICE").unwrap_or(defaults.tts_voice),
            timeout: std::env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Point at a different provider.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// Client for caption generation and speech synthesis.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: AiClientConfig,
    http: Client,
}

impl InferenceClient {
    /// Create a client; no request is made until a method is called.
    pub fn new(config: AiClientConfig) -> AiResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    fn api_key(&self) -> AiResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or(AiError::NotConfigured(API_KEY_VAR))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Ask the chat model for a caption and hashtags for `prompt`.
    pub async fn generate_caption(&self, prompt: &str) -> AiResult<CaptionResult> {
        let api_key = self.api_key()?;
        let content = build_caption_prompt(&self.config.caption_language, prompt);

        let request = ChatRequest {
            model: &self.config.caption_model,
            messages: vec![ChatMessage {
                role: "user",
                content: &content,
            }],
            max_tokens: CAPTION_MAX_TOKENS,
            temperature: CAPTION_TEMPERATURE,
        };

        debug!(model = %self.config.caption_model, "Requesting caption");
        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response, "caption").await?;
        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        // Missing content parses to an empty caption, not an error
        let reply = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let result = parse_caption_reply(&reply);
        info!(hashtags = result.hashtags.len(), "Caption generated");
        Ok(result)
    }

    /// Synthesize `text` to audio/mpeg bytes.
    pub async fn synthesize_speech(&self, text: &str) -> AiResult<Vec<u8>> {
        let api_key = self.api_key()?;

        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
        };

        debug!(model = %self.config.tts_model, chars = text.len(), "Requesting speech");
        let response = self
            .http
            .post(self.endpoint("audio/speech"))
            .bearer_auth(api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        let response = check_status(response, "speech").await?;
        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        info!(size = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}

/// Map a non-success reply to an error, logging the provider's body.
async fn check_status(response: reqwest::Response, call: &'static str) -> AiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(call, status = status.as_u16(), body = %body, "Inference provider error");
    Err(AiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> InferenceClient {
        let config = AiClientConfig::default()
            .with_base_url(server.uri())
            .with_api_key("test-key");
        InferenceClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_caption_request_and_parse() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{
                    "role": "user",
                    "content": "Write 1 short caption (in Indonesian) and 6 relevant hashtags for: video: beach"
                }],
                "max_tokens": 200,
                "temperature": 0.8
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant",
                    "content": "Caption: Ombak sore\nHashtags: #pantai #sunset"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).generate_caption("video: beach").await.unwrap();
        assert_eq!(result.caption, "Ombak sore");
        assert_eq!(result.hashtags, vec!["#pantai", "#sunset"]);
    }

    #[tokio::test]
    async fn test_caption_without_choices_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let result = client_for(&server).generate_caption("x").await.unwrap();
        assert_eq!(result, CaptionResult::default());
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_caption("x").await.unwrap_err();
        match err {
            AiError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_synthesize_speech() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(header("accept", "audio/mpeg"))
            .and(body_json(json!({
                "model": "gpt-4o-mini-tts",
                "voice": "alloy",
                "input": "Halo semua"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .expect(1)
            .mount(&server)
            .await;

        let audio = client_for(&server).synthesize_speech("Halo semua").await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn test_empty_speech_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = client_for(&server).synthesize_speech("hi").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = InferenceClient::new(AiClientConfig::default().with_base_url(server.uri())).unwrap();
        assert!(!client.is_configured());

        assert!(client.generate_caption("x").await.unwrap_err().is_not_configured());
        assert!(client.synthesize_speech("x").await.unwrap_err().is_not_configured());
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_endpoint_joins_trailing_slash() {
        let config = AiClientConfig::default().with_base_url("http://localhost:9000/v1/");
        let client = InferenceClient::new(config).unwrap();
        assert_eq!(client.endpoint("audio/speech"), "http://localhost:9000/v1/audio/speech");
    }
}
