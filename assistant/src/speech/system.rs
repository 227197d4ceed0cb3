//! Speech through the platform's own synthesizer: `espeak-ng` (or `espeak`)
//! on Unix, SAPI through PowerShell on Windows.

use super::{SpeechEngine, VoiceProfile};
use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

#[cfg(not(target_os = "windows"))]
const CANDIDATES: [&str; 2] = ["espeak-ng", "espeak"];

pub struct SystemVoice {
    program: String,
    voice: Option<String>,
    rate: Option<u32>,
}

impl SystemVoice {
    /// Finds a working synthesizer on this machine.
    pub fn detect() -> Result<Self> {
        #[cfg(not(target_os = "windows"))]
        {
            for program in CANDIDATES {
                let check = std::process::Command::new(program)
                    .arg("--version")
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .output();
                if let Ok(output) = check {
                    if output.status.success() {
                        info!(
                            "Using {}: {}",
                            program,
                            String::from_utf8_lossy(&output.stdout).trim()
                        );
                        return Ok(Self::with_program(program));
                    }
                }
            }
            Err(anyhow::anyhow!(
                "No system speech synthesizer found (install espeak-ng)"
            ))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(Self::with_program("powershell"))
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            voice: None,
            rate: None,
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn command_for(&self, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            cmd.arg("-v").arg(voice);
        }
        if let Some(rate) = self.rate {
            cmd.arg("-s").arg(rate.to_string());
        }
        cmd.arg("--").arg(text);
        cmd
    }

    #[cfg(target_os = "windows")]
    fn command_for(&self, text: &str) -> Command {
        let mut script = String::from(
            "Add-Type -AssemblyName System.Speech; \
             $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; ",
        );
        if let Some(voice) = &self.voice {
            script.push_str(&format!("$s.SelectVoice('{}'); ", ps_quote(voice)));
        }
        if let Some(rate) = self.rate {
            script.push_str(&format!("$s.Rate = {}; ", sapi_rate(rate)));
        }
        script.push_str(&format!("$s.Speak('{}')", ps_quote(text)));

        let mut cmd = Command::new(&self.program);
        cmd.args(["-NoProfile", "-Command", &script]);
        cmd
    }
}

#[async_trait]
impl SpeechEngine for SystemVoice {
    fn voices(&self) -> Vec<VoiceProfile> {
        #[cfg(not(target_os = "windows"))]
        let listing = std::process::Command::new(&self.program)
            .arg("--voices")
            .output();

        #[cfg(target_os = "windows")]
        let listing = std::process::Command::new(&self.program)
            .args([
                "-NoProfile",
                "-Command",
                "Add-Type -AssemblyName System.Speech; \
                 (New-Object System.Speech.Synthesis.SpeechSynthesizer).GetInstalledVoices() | \
                 ForEach-Object { $_.VoiceInfo.Name + '|' + $_.VoiceInfo.Culture.Name }",
            ])
            .output();

        match listing {
            Ok(output) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout);
                #[cfg(not(target_os = "windows"))]
                let voices = parse_espeak_voices(&text);
                #[cfg(target_os = "windows")]
                let voices = parse_sapi_voices(&text);
                debug!("Synthesizer exposes {} voice(s)", voices.len());
                voices
            }
            Ok(output) => {
                debug!("Voice listing exited with {}", output.status);
                Vec::new()
            }
            Err(e) => {
                debug!("Voice listing failed: {}", e);
                Vec::new()
            }
        }
    }

    fn set_voice(&mut self, id: &str) {
        self.voice = Some(id.to_string());
    }

    fn set_rate(&mut self, rate: u32) {
        self.rate = Some(rate);
    }

    async fn synthesize(&self, text: &str) -> Result<()> {
        let status = self
            .command_for(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", self.program, e))?;

        if !status.success() {
            return Err(anyhow::anyhow!("{} exited with {}", self.program, status));
        }
        Ok(())
    }
}

/// Parses `espeak --voices` output. The voice id is its language code, which
/// is what `-v` accepts.
pub fn parse_espeak_voices(listing: &str) -> Vec<VoiceProfile> {
    listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(VoiceProfile {
                id: language.to_string(),
                name: name.replace('_', " "),
                languages: vec![language.to_string()],
            })
        })
        .collect()
}

/// Parses `Name|culture` lines from the SAPI listing.
pub fn parse_sapi_voices(listing: &str) -> Vec<VoiceProfile> {
    listing
        .lines()
        .filter_map(|line| {
            let (name, culture) = line.trim().split_once('|')?;
            Some(VoiceProfile {
                id: name.to_string(),
                name: name.to_string(),
                languages: vec![culture.to_string()],
            })
        })
        .collect()
}

#[cfg(target_os = "windows")]
fn ps_quote(text: &str) -> String {
    text.replace('\'', "''")
}

/// SAPI rates run from -10 to 10 around a default of roughly 180 wpm.
#[cfg(target_os = "windows")]
fn sapi_rate(wpm: u32) -> i32 {
    ((wpm as i32 - 180) / 10).clamp(-10, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESPEAK_LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  de              --/M      German             gmw/de
 2  en-gb           --/M      English_(Great_Britain) gmw/en           (en 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

    #[test]
    fn test_parse_espeak_voices() {
        let voices = parse_espeak_voices(ESPEAK_LISTING);

        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0].id, "af");
        assert_eq!(voices[2].id, "en-gb");
        assert_eq!(voices[2].name, "English (Great Britain)");
        assert_eq!(voices[3].languages, vec!["en-us"]);
    }

    #[test]
    fn test_parse_espeak_voices_selects_english() {
        let voices = parse_espeak_voices(ESPEAK_LISTING);
        assert_eq!(super::super::select_voice(&voices).unwrap().id, "en-gb");
    }

    #[test]
    fn test_parse_espeak_voices_garbage() {
        assert!(parse_espeak_voices("").is_empty());
        assert!(parse_espeak_voices("command not found").is_empty());
    }

    #[test]
    fn test_parse_sapi_voices() {
        let voices = parse_sapi_voices("Microsoft David Desktop|en-US\r\nMicrosoft Hedda|de-DE\r\n");
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].id, "Microsoft David Desktop");
        assert_eq!(voices[1].languages, vec!["de-DE"]);
    }

    #[test]
    fn test_settings_are_stored() {
        let mut engine = SystemVoice::with_program("espeak-ng");
        engine.set_voice("en-us");
        engine.set_rate(160);
        assert_eq!(engine.voice.as_deref(), Some("en-us"));
        assert_eq!(engine.rate, Some(160));
    }
}
