//! Speech-to-text providers

use serde::Deserialize;

use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// Model used when the configuration names none
pub const WHISPER_DEFAULT_MODEL: &str = "whisper-1";
/// Model used when the configuration names none
pub const DEEPGRAM_DEFAULT_MODEL: &str = "nova-2";

/// STT backend with its credentials and model
enum SttBackend {
    Whisper { api_key: String, model: String },
    Deepgram { api_key: String, model: String },
}

/// Transcribes speech to text via a cloud provider
pub struct SpeechToText {
    client: reqwest::Client,
    backend: SttBackend,
}

impl SpeechToText {
    /// Create an STT instance using `OpenAI` Whisper; `model` absent means
    /// the provider default
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn whisper(api_key: String, model: Option<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            backend: SttBackend::Whisper {
                api_key,
                model: model.unwrap_or_else(|| WHISPER_DEFAULT_MODEL.to_string()),
            },
        })
    }

    /// Create an STT instance using Deepgram; `model` absent means the
    /// provider default
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn deepgram(api_key: String, model: Option<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            backend: SttBackend::Deepgram {
                api_key,
                model: model.unwrap_or_else(|| DEEPGRAM_DEFAULT_MODEL.to_string()),
            },
        })
    }

    /// The model this instance will request
    #[must_use]
    pub fn model(&self) -> &str {
        match &self.backend {
            SttBackend::Whisper { model, .. } | SttBackend::Deepgram { model, .. } => model,
        }
    }

    /// Transcribe audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");
        match &self.backend {
            SttBackend::Whisper { api_key, model } => {
                self.transcribe_whisper(audio, api_key, model).await
            }
            SttBackend::Deepgram { api_key, model } => {
                self.transcribe_deepgram(audio, api_key, model).await
            }
        }
    }

    async fn transcribe_whisper(&self, audio: &[u8], api_key: &str, model: &str) -> Result<String> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", model.to_string());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    async fn transcribe_deepgram(
        &self,
        audio: &[u8],
        api_key: &str,
        model: &str,
    ) -> Result<String> {
        let url = format!("https://api.deepgram.com/v1/listen?model={model}&punctuate=true");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await?;
        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .ok_or_else(|| Error::Stt("no speech detected".to_string()))?;

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whisper_requires_key() {
        assert!(SpeechToText::whisper(String::new(), None).is_err());
        assert!(SpeechToText::whisper("sk-test".to_string(), None).is_ok());
    }

    #[test]
    fn deepgram_requires_key() {
        assert!(SpeechToText::deepgram(String::new(), None).is_err());
    }

    #[test]
    fn each_provider_defaults_its_own_model() {
        let whisper = SpeechToText::whisper("sk-test".to_string(), None).unwrap();
        assert_eq!(whisper.model(), WHISPER_DEFAULT_MODEL);

        let deepgram = SpeechToText::deepgram("dg-test".to_string(), None).unwrap();
        assert_eq!(deepgram.model(), DEEPGRAM_DEFAULT_MODEL);
    }

    #[test]
    fn configured_model_overrides_the_default() {
        let deepgram =
            SpeechToText::deepgram("dg-test".to_string(), Some("nova-3".to_string())).unwrap();
        assert_eq!(deepgram.model(), "nova-3");
    }
}
