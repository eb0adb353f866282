//! Voice output for post-run feedback.
//!
//! [`Narrator`] tries the remote voice-call service first and falls back to
//! an injected [`SpeechSynthesizer`].

pub mod narrator;
pub mod remote;
pub mod speech;

pub use narrator::Narrator;
pub use remote::{VapiClient, VoiceError};
pub use speech::{select_voice, LogSpeech, SpeechSynthesizer, SystemSpeech, Utterance, VoiceInfo};
