//! Application state.

use std::sync::Arc;

use tracing::info;

use reel_ai::{AiClientConfig, InferenceClient};
use reel_media::{
    BackendKind, EnginePipeline, ProcessPipeline, ProcessPipelineConfig, SandboxLoader, VideoPipeline,
    VoiceoverProvider, WatermarkAsset,
};
use reel_models::EncodingConfig;

use crate::config::ApiConfig;
use crate::services::SpeechVoiceover;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<dyn VideoPipeline>,
    pub ai: Arc<InferenceClient>,
    pub watermark: WatermarkAsset,
}

impl AppState {
    /// Create new application state, wiring the configured backend.
    pub fn new(config: ApiConfig, ai_config: AiClientConfig) -> anyhow::Result<Self> {
        let ai = Arc::new(InferenceClient::new(ai_config)?);
        let watermark = WatermarkAsset::new(&config.watermark_path);
        let voiceover: Arc<dyn VoiceoverProvider> = Arc::new(SpeechVoiceover::new(Arc::clone(&ai)));

        let pipeline: Arc<dyn VideoPipeline> = match config.backend {
            BackendKind::Process => {
                let pipeline_config = ProcessPipelineConfig {
                    work_dir: config.work_dir.clone(),
                    encoding: EncodingConfig::default(),
                    ffmpeg_program: config.ffmpeg_path.clone(),
                };
                Arc::new(ProcessPipeline::new(pipeline_config, watermark.clone()).with_voiceover(voiceover))
            }
            BackendKind::Engine => {
                let loader = SandboxLoader::new(&config.ffmpeg_path, &config.work_dir);
                Arc::new(
                    EnginePipeline::new(loader, watermark.clone(), EncodingConfig::default())
                        .with_voiceover(voiceover),
                )
            }
        };

        info!(
            backend = %config.backend,
            watermark = %watermark.path().display(),
            inference_configured = ai.is_configured(),
            "Application state ready"
        );

        Ok(Self {
            config,
            pipeline,
            ai,
            watermark,
        })
    }

    /// Assemble state from prebuilt parts.
    pub fn from_parts(
        config: ApiConfig,
        pipeline: Arc<dyn VideoPipeline>,
        ai: Arc<InferenceClient>,
        watermark: WatermarkAsset,
    ) -> Self {
        Self {
            config,
            pipeline,
            ai,
            watermark,
        }
    }
}
