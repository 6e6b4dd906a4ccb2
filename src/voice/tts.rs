//! Text-to-speech providers

use crate::{Error, Result};

/// TTS backend with its credentials, voice, and model
enum TtsBackend {
    OpenAi {
        api_key: String,
        voice: String,
        speed: f64,
        model: String,
    },
    ElevenLabs {
        api_key: String,
        voice_id: String,
        model: String,
    },
}

/// Synthesizes speech (MP3) from text via a cloud provider
pub struct TextToSpeech {
    client: reqwest::Client,
    backend: TtsBackend,
}

impl TextToSpeech {
    /// Create a TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn openai(api_key: String, voice: String, speed: f64, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            backend: TtsBackend::OpenAi {
                api_key,
                voice,
                speed,
                model,
            },
        })
    }

    /// Create a TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn elevenlabs(api_key: String, voice_id: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            backend: TtsBackend::ElevenLabs {
                api_key,
                voice_id,
                model,
            },
        })
    }

    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match &self.backend {
            TtsBackend::OpenAi {
                api_key,
                voice,
                speed,
                model,
            } => self.synthesize_openai(text, api_key, voice, *speed, model).await,
            TtsBackend::ElevenLabs {
                api_key,
                voice_id,
                model,
            } => self.synthesize_elevenlabs(text, api_key, voice_id, model).await,
        }
    }

    async fn synthesize_openai(
        &self,
        text: &str,
        api_key: &str,
        voice: &str,
        speed: f64,
        model: &str,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model,
            input: text,
            voice,
            speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    async fn synthesize_elevenlabs(
        &self,
        text: &str,
        api_key: &str,
        voice_id: &str,
        model: &str,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice_id}");
        let request = ElevenLabsRequest {
            text,
            model_id: model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_key() {
        let result = TextToSpeech::openai(
            String::new(),
            "alloy".to_string(),
            1.0,
            "tts-1".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn elevenlabs_requires_key() {
        let result = TextToSpeech::elevenlabs(
            String::new(),
            "voice".to_string(),
            "eleven_monolingual_v1".to_string(),
        );
        assert!(result.is_err());
    }
}
