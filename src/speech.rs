use std::env;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Text-to-speech capability. Speaking is best-effort: a failing or missing
/// synthesizer must never surface as an error to the session.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);
    fn is_available(&self) -> bool;
}

/// Speaks by handing the text to a system TTS command (`say` on macOS,
/// `espeak`/`spd-say` on Linux). The child is left to run on its own.
pub struct CommandSpeaker {
    program: String,
}

const TTS_PROGRAMS: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

impl CommandSpeaker {
    pub fn detect() -> Option<Self> {
        TTS_PROGRAMS
            .iter()
            .find(|program| find_in_path(program))
            .map(|program| Self {
                program: program.to_string(),
            })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        let _ = Command::new(&self.program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Stand-in when no synthesizer is installed. The session shows a one-time
/// warning instead of failing.
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn speak(&self, _text: &str) {}

    fn is_available(&self) -> bool {
        false
    }
}

pub fn system_speaker() -> Arc<dyn Speaker> {
    match CommandSpeaker::detect() {
        Some(speaker) => Arc::new(speaker),
        None => Arc::new(NullSpeaker),
    }
}

fn find_in_path(name: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}

/// Speaker that records everything it was asked to say, for asserting on
/// spoken output without an audio backend.
#[cfg(test)]
pub struct RecordingSpeaker {
    spoken: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSpeaker {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            spoken: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn is_available(&self) -> bool {
        true
    }
}
