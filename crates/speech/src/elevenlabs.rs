//! ElevenLabs text-to-speech backend

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use leadcall_core::{SpeechSynthesizer, SynthesizedAudio};

use crate::SpeechError;

const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const MODEL_ID: &str = "eleven_turbo_v2";

/// Where rendered audio lands and how callers reach it
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    pub api_key: String,
    pub voice_id: String,
    /// Directory the server exposes under `/audio`
    pub output_dir: PathBuf,
    /// Public base URL, e.g. the tunnel address Twilio calls back into
    pub public_base_url: String,
}

impl SpeechOptions {
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let voice_id = voice_id.into();
        Self {
            api_key: api_key.into(),
            voice_id: if voice_id.is_empty() {
                DEFAULT_VOICE_ID.to_string()
            } else {
                voice_id
            },
            output_dir: output_dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

/// ElevenLabs synthesizer. Unconfigured (empty API key) instances always
/// report `None` so the caller uses the gateway voice.
pub struct ElevenLabsSynthesizer {
    options: SpeechOptions,
    client: Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(options: SpeechOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { options, client }
    }

    pub fn is_enabled(&self) -> bool {
        !self.options.api_key.is_empty()
    }

    async fn render(&self, text: &str) -> Result<SynthesizedAudio, SpeechError> {
        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            self.options.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.75 },
        });

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.options.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(format!("HTTP {status}: {detail}")));
        }
        let audio = response.bytes().await?;

        tokio::fs::create_dir_all(&self.options.output_dir).await?;
        let file_name = format!("{}.mp3", Uuid::new_v4());
        tokio::fs::write(self.options.output_dir.join(&file_name), &audio).await?;

        Ok(SynthesizedAudio {
            url: format!(
                "{}/audio/{file_name}",
                self.options.public_base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> leadcall_core::Result<Option<SynthesizedAudio>> {
        if !self.is_enabled() || text.trim().is_empty() {
            return Ok(None);
        }
        match self.render(text).await {
            Ok(audio) => Ok(Some(audio)),
            Err(err) => {
                tracing::warn!(error = %err, "speech synthesis failed, using gateway voice");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(api_key: &str) -> SpeechOptions {
        SpeechOptions::new(api_key, "", "/tmp/audio", "http://localhost:5001/")
    }

    #[tokio::test]
    async fn unconfigured_synthesizer_yields_gateway_fallback() {
        let synth = ElevenLabsSynthesizer::new(options(""));
        assert!(!synth.is_enabled());
        let audio = synth.synthesize("Hello there").await.unwrap();
        assert!(audio.is_none());
    }

    #[tokio::test]
    async fn empty_text_is_not_sent_to_the_provider() {
        let synth = ElevenLabsSynthesizer::new(options("key"));
        let audio = synth.synthesize("   ").await.unwrap();
        assert!(audio.is_none());
    }

    #[test]
    fn empty_voice_id_falls_back_to_default() {
        let opts = options("key");
        assert_eq!(opts.voice_id, DEFAULT_VOICE_ID);
    }

    #[test]
    fn public_url_has_no_double_slash() {
        let opts = options("key");
        assert_eq!(opts.public_base_url, "http://localhost:5001/");
        let trimmed = opts.public_base_url.trim_end_matches('/');
        assert_eq!(format!("{trimmed}/audio/x.mp3"), "http://localhost:5001/audio/x.mp3");
    }
}
