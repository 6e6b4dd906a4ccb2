//! Runtime configuration
//!
//! Precedence: environment variables > config file > defaults. The config
//! file lives at `~/.config/parley/config.toml` and every field in it is
//! optional.

pub mod file;

pub use file::{config_file_path, load_config_file};

use crate::{Error, Result};

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// OpenWeatherMap key for weather lookups
    pub openweather: Option<String>,

    /// Alpha Vantage key for stock quotes
    pub alphavantage: Option<String>,

    /// NewsAPI key for headlines
    pub newsapi: Option<String>,

    /// OpenAI key for Whisper STT and TTS
    pub openai: Option<String>,

    /// Deepgram key for STT (alternative to Whisper)
    pub deepgram: Option<String>,

    /// ElevenLabs key for TTS (alternative to OpenAI)
    pub elevenlabs: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Whether speech input/output is enabled
    pub enabled: bool,

    /// STT model name; absent means the selected provider's default
    pub stt_model: Option<String>,

    /// TTS model name
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: None,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_keys: ApiKeys,
    pub voice: VoiceConfig,

    /// HTTP API server port
    pub port: u16,

    /// Max turns retained per conversation session
    pub history_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            voice: VoiceConfig::default(),
            port: 8002,
            history_cap: crate::session::DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration: env vars > `~/.config/parley/config.toml` > defaults
    ///
    /// # Errors
    ///
    /// Returns error if an env var holds a value that fails to parse
    /// (e.g. a non-numeric `PARLEY_PORT`)
    pub fn load() -> Result<Self> {
        let file = load_config_file();
        let mut config = Self::default();

        config.api_keys.openweather = env_var("OPENWEATHER_API_KEY").or(file.api_keys.openweather);
        config.api_keys.alphavantage =
            env_var("ALPHAVANTAGE_API_KEY").or(file.api_keys.alphavantage);
        config.api_keys.newsapi = env_var("NEWS_API_KEY").or(file.api_keys.newsapi);
        config.api_keys.openai = env_var("OPENAI_API_KEY").or(file.api_keys.openai);
        config.api_keys.deepgram = env_var("DEEPGRAM_API_KEY").or(file.api_keys.deepgram);
        config.api_keys.elevenlabs = env_var("ELEVENLABS_API_KEY").or(file.api_keys.elevenlabs);

        if let Some(enabled) = file.voice.enabled {
            config.voice.enabled = enabled;
        }
        if let Some(model) = file.voice.stt_model {
            config.voice.stt_model = Some(model);
        }
        if let Some(model) = file.voice.tts_model {
            config.voice.tts_model = model;
        }
        if let Some(voice) = file.voice.tts_voice {
            config.voice.tts_voice = voice;
        }
        if let Some(speed) = file.voice.tts_speed {
            config.voice.tts_speed = speed;
        }

        if let Some(port) = file.server.port {
            config.port = port;
        }
        if let Some(port) = env_var("PARLEY_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid PARLEY_PORT: {port}")))?;
        }

        if let Some(cap) = file.session.history_cap {
            config.history_cap = cap;
        }
        if let Some(cap) = env_var("PARLEY_HISTORY_CAP") {
            config.history_cap = cap
                .parse()
                .map_err(|_| Error::Config(format!("invalid PARLEY_HISTORY_CAP: {cap}")))?;
        }

        Ok(config)
    }
}

/// Read an env var, treating empty values as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 8002);
        assert_eq!(config.history_cap, 32);
        assert!(config.voice.enabled);
        // No STT model pinned; each provider falls back to its own default
        assert!(config.voice.stt_model.is_none());
        assert!(config.api_keys.openweather.is_none());
    }
}
