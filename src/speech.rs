//! Speech recognition and synthesis adapters.
//!
//! DESIGN
//! ======
//! The host platform provides the engines (browser Web Speech, an OS service,
//! a test fake) behind [`RecognitionEngine`] and [`SynthesisEngine`]. A missing
//! engine is `None`: recognition then reports itself unsupported, synthesis
//! silently does nothing.
//!
//! Recognition runs continuously with interim results. The engine pushes
//! result batches into [`SpeechRecognizer::handle_result`]; finalized segments
//! accumulate with a space after each one, interim ones are only kept until
//! the next batch.

use crate::config::DEFAULT_SPEECH_LOCALE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition is not available on this platform")]
    RecognitionUnsupported,
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

impl SpeechError {
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RecognitionUnsupported => "이 환경에서는 음성 인식을 지원하지 않습니다.",
            Self::Recognition(_) => "음성 인식 중 오류가 발생했습니다.",
        }
    }
}

/// Settings handed to the engine on every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionConfig {
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        Self { locale: locale.to_owned(), continuous: true, interim_results: true }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self::for_locale(DEFAULT_SPEECH_LOCALE)
    }
}

/// One entry in an engine result batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSegment {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionSegment {
    #[must_use]
    pub fn final_text(transcript: &str) -> Self {
        Self { transcript: transcript.to_owned(), is_final: true }
    }

    #[must_use]
    pub fn interim(transcript: &str) -> Self {
        Self { transcript: transcript.to_owned(), is_final: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
}

pub trait RecognitionEngine: Send {
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError>;
    fn stop(&mut self);
}

pub trait SynthesisEngine: Send {
    /// Stop whatever is being spoken. No-op when idle.
    fn cancel(&mut self);
    fn speak(&mut self, utterance: &Utterance);
}

// =============================================================================
// RECOGNITION
// =============================================================================

pub struct SpeechRecognizer {
    engine: Option<Box<dyn RecognitionEngine>>,
    config: RecognitionConfig,
    recording: bool,
    final_text: String,
    interim_text: String,
    error: Option<String>,
}

impl SpeechRecognizer {
    #[must_use]
    pub fn new(engine: Option<Box<dyn RecognitionEngine>>, config: RecognitionConfig) -> Self {
        Self {
            engine,
            config,
            recording: false,
            final_text: String::new(),
            interim_text: String::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Accumulated finalized text.
    #[must_use]
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// Latest not-yet-final text, for transient display.
    #[must_use]
    pub fn interim_text(&self) -> &str {
        &self.interim_text
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start listening. Already recording: no-op.
    ///
    /// # Errors
    ///
    /// [`SpeechError::RecognitionUnsupported`] without an engine, or whatever
    /// the engine reports.
    pub fn start(&mut self) -> Result<(), SpeechError> {
        if self.recording {
            return Ok(());
        }
        let Some(engine) = self.engine.as_mut() else {
            let err = SpeechError::RecognitionUnsupported;
            self.error = Some(err.user_message().to_owned());
            return Err(err);
        };
        if let Err(e) = engine.start(&self.config) {
            tracing::warn!(error = %e, "speech recognition failed to start");
            self.error = Some(e.user_message().to_owned());
            return Err(e);
        }
        self.recording = true;
        self.error = None;
        self.interim_text.clear();
        tracing::debug!(locale = %self.config.locale, "speech recognition started");
        Ok(())
    }

    /// Stop listening. Idle: no-op.
    pub fn stop(&mut self) {
        if !self.recording {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.recording = false;
        self.interim_text.clear();
    }

    /// Start when idle, stop when recording. Returns whether recording now.
    pub fn toggle(&mut self) -> Result<bool, SpeechError> {
        if self.recording {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.recording)
    }

    /// Apply an engine result batch. Entries before `result_index` were
    /// already delivered.
    pub fn handle_result(&mut self, result_index: usize, results: &[RecognitionSegment]) {
        self.interim_text.clear();
        for segment in results.iter().skip(result_index) {
            if segment.is_final {
                self.final_text.push_str(&segment.transcript);
                self.final_text.push(' ');
            } else {
                self.interim_text.push_str(&segment.transcript);
            }
        }
    }

    pub fn on_error(&mut self, message: &str) {
        tracing::warn!(%message, "speech recognition error");
        self.recording = false;
        self.interim_text.clear();
        self.error = Some(SpeechError::Recognition(message.to_owned()).user_message().to_owned());
    }

    pub fn on_end(&mut self) {
        self.recording = false;
        self.interim_text.clear();
    }

    /// Move the finalized text out, e.g. into the chat input.
    pub fn take_text(&mut self) -> String {
        self.interim_text.clear();
        std::mem::take(&mut self.final_text)
    }
}

impl std::fmt::Debug for SpeechRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechRecognizer")
            .field("supported", &self.is_supported())
            .field("recording", &self.recording)
            .field("final_text", &self.final_text)
            .field("interim_text", &self.interim_text)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SYNTHESIS
// =============================================================================

pub struct SpeechSynthesizer {
    engine: Option<Box<dyn SynthesisEngine>>,
    lang: String,
}

impl SpeechSynthesizer {
    #[must_use]
    pub fn new(engine: Option<Box<dyn SynthesisEngine>>, lang: &str) -> Self {
        Self { engine, lang: lang.to_owned() }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    /// Speak `text`, interrupting anything in flight.
    pub fn speak(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!("speech synthesis unavailable; skipping");
            return;
        };
        engine.cancel();
        engine.speak(&Utterance { text: text.to_owned(), lang: self.lang.clone() });
    }

    pub fn cancel(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
    }
}

impl std::fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("supported", &self.is_supported())
            .field("lang", &self.lang)
            .finish()
    }
}

#[cfg(test)]
#[path = "speech_test.rs"]
mod tests;
