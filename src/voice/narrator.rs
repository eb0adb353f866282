//! Narrator - speaks advisor feedback, remote first, on-device otherwise.

use std::sync::Arc;

use crate::coach::Feedback;
use crate::config::VoiceConfig;

use super::remote::VapiClient;
use super::speech::{select_voice, SpeechSynthesizer, Utterance};

pub struct Narrator {
    remote: VapiClient,
    speech: Arc<dyn SpeechSynthesizer>,
    config: VoiceConfig,
}

impl Narrator {
    pub fn new(config: &VoiceConfig, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            remote: VapiClient::from_config(config),
            speech,
            config: config.clone(),
        }
    }

    /// Speak `feedback`. Never fails; problems are logged.
    pub async fn speak(&self, feedback: &Feedback) {
        if self.remote.has_key() {
            let message = format!("{} {}", feedback.summary, feedback.motivation);
            match self.remote.call(&message).await {
                Ok(()) => {
                    log::info!("narrator: remote call started");
                    return;
                }
                Err(e) => log::warn!("narrator: remote call failed ({e}), speaking locally"),
            }
        }
        self.speak_locally(&feedback.motivation);
    }

    /// Swap the voice-call key; `None` means on-device speech only.
    pub fn set_api_key(&self, key: Option<String>) {
        self.remote.set_api_key(key);
    }

    /// On-device synthesis of `text` with the configured voice parameters.
    pub fn speak_locally(&self, text: &str) {
        let voices = self.speech.voices();
        let mut utterance = Utterance::from_config(text, &self.config);
        utterance.voice = select_voice(
            &voices,
            &self.config.preferred_vendors,
            &self.config.preferred_locale,
        )
        .cloned();
        self.speech.speak(utterance);
    }
}
