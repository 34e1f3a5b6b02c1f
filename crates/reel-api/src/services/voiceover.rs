//! Voice-over provider backed by the inference client.

use std::sync::Arc;

use async_trait::async_trait;
use reel_ai::InferenceClient;
use reel_media::{MediaError, MediaResult, VoiceoverProvider};
use reel_models::VoiceoverRequest;

/// Synthesizes voice-over audio through the speech endpoint.
#[derive(Clone)]
pub struct SpeechVoiceover {
    client: Arc<InferenceClient>,
}

impl SpeechVoiceover {
    pub fn new(client: Arc<InferenceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VoiceoverProvider for SpeechVoiceover {
    async fn synthesize(&self, request: &VoiceoverRequest) -> MediaResult<Vec<u8>> {
        self.client
            .synthesize_speech(&request.text)
            .await
            .map_err(|e| MediaError::voiceover(e.to_string()))
    }
}
