//! Speech adapter: single-shot speech-to-text and text-to-speech
//!
//! Both directions are one cloud API call per invocation, no streaming.
//! Synthesis failure is expected to degrade gracefully — callers keep the
//! text response and drop the audio.

pub mod stt;
pub mod tts;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;

use crate::Result;

/// Pairs a transcriber and a synthesizer behind one stateless facade
pub struct SpeechAdapter {
    stt: SpeechToText,
    tts: TextToSpeech,
}

impl SpeechAdapter {
    #[must_use]
    pub fn new(stt: SpeechToText, tts: TextToSpeech) -> Self {
        Self { stt, tts }
    }

    /// Transcribe audio bytes (WAV or WebM) to text
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails or yields no transcript
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        self.stt.transcribe(audio).await
    }

    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.tts.synthesize(text).await
    }
}
