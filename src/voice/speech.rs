//! On-device speech synthesis capability.
//!
//! [`SpeechSynthesizer`] is the injected seam; [`SystemSpeech`] shells out to
//! the platform TTS command and [`LogSpeech`] only logs.

use std::process::{Command, Stdio};
use std::sync::OnceLock;

use crate::config::VoiceConfig;

/// A voice offered by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP-47 language tag, e.g. `"en-US"`.
    pub lang: String,
}

/// A single fire-and-forget speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// 1.0 = normal speed.
    pub rate: f32,
    /// 1.0 = normal pitch.
    pub pitch: f32,
    /// 0.0 – 1.0.
    pub volume: f32,
    /// `None` uses the platform default voice.
    pub voice: Option<VoiceInfo>,
}

impl Utterance {
    /// Utterance with the rate/pitch/volume from `config`.
    pub fn from_config(text: impl Into<String>, config: &VoiceConfig) -> Self {
        Self {
            text: text.into(),
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
            voice: None,
        }
    }
}

/// Object-safe, thread-safe on-device speech.
///
/// `speak` must not block on playback.
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<VoiceInfo>;
    fn speak(&self, utterance: Utterance);
}

/// Pick the first voice whose name contains a preferred vendor, else the
/// first whose language starts with `locale`.
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    vendors: &[String],
    locale: &str,
) -> Option<&'a VoiceInfo> {
    voices.iter().find(|v| {
        vendors.iter().any(|vendor| v.name.contains(vendor.as_str()))
            || (!locale.is_empty() && v.lang.starts_with(locale))
    })
}

// ---------------------------------------------------------------------------
// SystemSpeech
// ---------------------------------------------------------------------------

/// Speaks through `say` (macOS) or `espeak` (elsewhere).
#[derive(Debug, Clone)]
pub struct SystemSpeech {
    program: &'static str,
    /// Installed voices, listed once on first use.
    voices: OnceLock<Vec<VoiceInfo>>,
}

impl Default for SystemSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSpeech {
    pub fn new() -> Self {
        let program = if cfg!(target_os = "macos") { "say" } else { "espeak" };
        Self::with_program(program)
    }

    fn with_program(program: &'static str) -> Self {
        Self {
            program,
            voices: OnceLock::new(),
        }
    }

    /// Ask the engine for its installed voices. Empty when it is missing.
    fn list_voices(&self) -> Vec<VoiceInfo> {
        let query: &[&str] = match self.program {
            "say" => &["-v", "?"],
            _ => &["--voices"],
        };
        let output = match Command::new(self.program).args(query).stderr(Stdio::null()).output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                log::warn!("speech: {} voice listing exited with {}", self.program, output.status);
                return Vec::new();
            }
            Err(e) => {
                log::warn!("speech: {} unavailable: {e}", self.program);
                return Vec::new();
            }
        };
        let listing = String::from_utf8_lossy(&output.stdout);
        let voices = match self.program {
            "say" => parse_say_voices(&listing),
            _ => parse_espeak_voices(&listing),
        };
        log::debug!("speech: {} voices from {}", voices.len(), self.program);
        voices
    }

    /// Command-line arguments for `utterance`.
    pub fn args(&self, utterance: &Utterance) -> Vec<String> {
        let mut args = Vec::new();
        match self.program {
            "say" => {
                // words per minute, ~180 at normal rate
                args.push("-r".into());
                args.push(format!("{}", (180.0 * utterance.rate).round() as u32));
                if let Some(voice) = &utterance.voice {
                    args.push("-v".into());
                    args.push(voice.name.clone());
                }
            }
            _ => {
                args.push("-s".into());
                args.push(format!("{}", (175.0 * utterance.rate).round() as u32));
                args.push("-p".into());
                args.push(format!("{}", (50.0 * utterance.pitch).round().min(99.0) as u32));
                args.push("-a".into());
                args.push(format!("{}", (100.0 * utterance.volume).round().min(200.0) as u32));
                if let Some(voice) = &utterance.voice {
                    // espeak selects by language identifier, not display name
                    args.push("-v".into());
                    args.push(voice.lang.to_lowercase());
                }
            }
        }
        args.push(utterance.text.clone());
        args
    }
}

impl SpeechSynthesizer for SystemSpeech {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.get_or_init(|| self.list_voices()).clone()
    }

    fn speak(&self, utterance: Utterance) {
        let args = self.args(&utterance);
        let program = self.program;
        match Command::new(program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                log::debug!("speech: speaking via {program}");
                // Reap the process once playback ends.
                std::thread::spawn(move || match child.wait() {
                    Ok(status) if !status.success() => {
                        log::warn!("speech: {program} exited with {status}")
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("speech: waiting for {program} failed: {e}"),
                });
            }
            Err(e) => log::warn!("speech: {program} unavailable: {e}"),
        }
    }
}

/// Parse `say -v '?'` output: `Name   xx_YY   # sample sentence`.
/// Names may contain spaces; the locale is the last field before `#`.
pub fn parse_say_voices(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let described = line.split('#').next()?.trim_end();
            let (name, locale) = described.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || !locale.contains('_') {
                return None;
            }
            Some(VoiceInfo {
                name: name.to_string(),
                lang: locale.replace('_', "-"),
            })
        })
        .collect()
}

/// Parse `espeak --voices` output. The first line is a header; columns are
/// `Pty Language Age/Gender VoiceName File [Other Languages]`.
pub fn parse_espeak_voices(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let lang = fields.next()?;
            let _age_gender = fields.next()?;
            let name = fields.next()?;
            Some(VoiceInfo {
                name: name.replace('_', " "),
                lang: lang.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LogSpeech
// ---------------------------------------------------------------------------

/// Logs utterances instead of speaking them.
#[derive(Debug, Clone, Default)]
pub struct LogSpeech;

impl SpeechSynthesizer for LogSpeech {
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn speak(&self, utterance: Utterance) {
        log::info!("speech: {}", utterance.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> VoiceInfo {
        VoiceInfo {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn vendors() -> Vec<String> {
        vec!["Google".into(), "Microsoft".into()]
    }

    #[test]
    fn vendor_match_wins_in_list_order() {
        let voices = [
            voice("Alex", "de-DE"),
            voice("Microsoft Zira", "en-US"),
            voice("Google UK English", "en-GB"),
        ];
        let picked = select_voice(&voices, &vendors(), "en").unwrap();
        assert_eq!(picked.name, "Microsoft Zira");
    }

    #[test]
    fn locale_match_when_no_vendor() {
        let voices = [voice("Anna", "de-DE"), voice("Samantha", "en-US")];
        assert_eq!(
            select_voice(&voices, &vendors(), "en").unwrap().name,
            "Samantha"
        );
    }

    #[test]
    fn no_match_means_platform_default() {
        let voices = [voice("Anna", "de-DE")];
        assert!(select_voice(&voices, &vendors(), "en").is_none());
        assert!(select_voice(&[], &vendors(), "en").is_none());
    }

    #[test]
    fn utterance_takes_config_parameters() {
        let u = Utterance::from_config("Go", &VoiceConfig::default());
        assert_eq!((u.rate, u.pitch, u.volume), (0.9, 1.1, 0.8));
        assert!(u.voice.is_none());
    }

    #[test]
    fn espeak_args_scale_parameters() {
        let speech = SystemSpeech::with_program("espeak");
        let args = speech.args(&Utterance::from_config("Nice run", &VoiceConfig::default()));
        assert_eq!(
            args,
            vec!["-s", "158", "-p", "55", "-a", "80", "Nice run"]
        );
    }

    #[test]
    fn say_args_include_voice() {
        let speech = SystemSpeech::with_program("say");
        let mut u = Utterance::from_config("Hi", &VoiceConfig::default());
        u.voice = Some(voice("Samantha", "en-US"));
        assert_eq!(speech.args(&u), vec!["-r", "162", "-v", "Samantha", "Hi"]);
    }

    #[test]
    fn espeak_voice_is_selected_by_language() {
        let speech = SystemSpeech::with_program("espeak");
        let mut u = Utterance::from_config("Go", &VoiceConfig::default());
        u.voice = Some(voice("English (America)", "en-US"));
        let args = speech.args(&u);
        assert_eq!(&args[6..], ["-v", "en-us", "Go"]);
    }

    const SAY_LISTING: &str = "\
Alex                en_US    # Most people recognize me by my voice.
Bad News            en_US    # The light you see at the end of the tunnel is the headlamp.
Anna                de_DE    # Hallo, ich heiße Anna.
Google Español      es_ES    # Hola
";

    const ESPEAK_LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

    #[test]
    fn parses_say_listing() {
        let voices = parse_say_voices(SAY_LISTING);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0], voice("Alex", "en-US"));
        assert_eq!(voices[1], voice("Bad News", "en-US"));
        assert_eq!(voices[3], voice("Google Español", "es-ES"));

        let picked = select_voice(&voices, &vendors(), "fr").unwrap();
        assert_eq!(picked.name, "Google Español");
    }

    #[test]
    fn parses_espeak_listing() {
        let voices = parse_espeak_voices(ESPEAK_LISTING);
        assert_eq!(
            voices,
            vec![
                voice("Afrikaans", "af"),
                voice("English (Great Britain)", "en-gb"),
                voice("English (America)", "en-us"),
            ]
        );
        assert_eq!(select_voice(&voices, &vendors(), "en").unwrap().lang, "en-gb");
    }

    #[test]
    fn blank_or_malformed_listing_yields_no_voices() {
        assert!(parse_say_voices("").is_empty());
        assert!(parse_say_voices("garbage\n").is_empty());
        assert!(parse_espeak_voices("Pty Language Age/Gender VoiceName File\n").is_empty());
    }
}
