//! Announcement sinks.
//!
//! `announce` is fire-and-forget. A new announcement interrupts whatever is
//! still being spoken; nothing is queued.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

use crate::storage::VoiceBackend;

/// Sink for spoken cues.
pub trait Announcer: Send {
    fn announce(&mut self, text: &str);
}

/// Used when no speech capability is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce(&mut self, _text: &str) {}
}

/// Prints each cue on its own line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAnnouncer;

impl Announcer for ConsoleAnnouncer {
    fn announce(&mut self, text: &str) {
        println!("  >> {text}");
    }
}

/// Speaks through an external text-to-speech program (`espeak`, `say`, ...).
///
/// The program gets the configured arguments followed by the text. If it
/// cannot be spawned the announcer logs once and goes silent for good.
#[derive(Debug)]
pub struct SpeechAnnouncer {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
    available: bool,
}

impl SpeechAnnouncer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: None,
            available: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn interrupt(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Announcer for SpeechAnnouncer {
    fn announce(&mut self, text: &str) {
        if !self.available {
            return;
        }
        self.interrupt();
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.current = Some(child),
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "speech unavailable, continuing silently");
                self.available = false;
            }
        }
    }
}

impl Drop for SpeechAnnouncer {
    fn drop(&mut self) {
        self.interrupt();
    }
}

/// Speaks through the platform speech engine (SAPI, AVFoundation, ...).
///
/// Falls back to silence when the engine cannot be initialised.
#[cfg(not(target_os = "linux"))]
pub struct SystemAnnouncer {
    tts: Option<tts::Tts>,
}

#[cfg(not(target_os = "linux"))]
impl SystemAnnouncer {
    pub fn new() -> Self {
        let tts = match tts::Tts::default() {
            Ok(mut engine) => {
                let _ = engine.set_rate(engine.normal_rate());
                Some(engine)
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech engine unavailable, continuing silently");
                None
            }
        };
        Self { tts }
    }

    pub fn is_available(&self) -> bool {
        self.tts.is_some()
    }
}

#[cfg(not(target_os = "linux"))]
impl Default for SystemAnnouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "linux"))]
impl Announcer for SystemAnnouncer {
    fn announce(&mut self, text: &str) {
        if let Some(ref mut tts) = self.tts {
            // interrupt = true: newest cue wins
            let _ = tts.speak(text, true);
        }
    }
}

/// Build the announcer for the configured voice backend.
///
/// `None` when speech is off, or when the platform has no built-in engine.
pub fn voice_announcer(backend: VoiceBackend) -> Option<Box<dyn Announcer>> {
    match backend {
        VoiceBackend::Off => None,
        VoiceBackend::Program { command, args } => {
            Some(Box::new(SpeechAnnouncer::new(command, args)))
        }
        #[cfg(not(target_os = "linux"))]
        VoiceBackend::System => Some(Box::new(SystemAnnouncer::new())),
        #[cfg(target_os = "linux")]
        VoiceBackend::System => {
            tracing::warn!("no built-in speech engine on this platform; set voice.command");
            None
        }
    }
}

/// Keeps every announcement in a shared buffer.
///
/// For front-ends that render cues themselves, and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryAnnouncer {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl MemoryAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.spoken.lock().ok().and_then(|s| s.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut s) = self.spoken.lock() {
            s.clear();
        }
    }
}

impl Announcer for MemoryAnnouncer {
    fn announce(&mut self, text: &str) {
        if let Ok(mut s) = self.spoken.lock() {
            s.push(text.to_string());
        }
    }
}

/// Fan out to two sinks.
impl<A: Announcer, B: Announcer> Announcer for (A, B) {
    fn announce(&mut self, text: &str) {
        self.0.announce(text);
        self.1.announce(text);
    }
}

impl Announcer for Box<dyn Announcer> {
    fn announce(&mut self, text: &str) {
        (**self).announce(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_announcer_shares_buffer_between_clones() {
        let recorder = MemoryAnnouncer::new();
        let mut sink: Box<dyn Announcer> = Box::new(recorder.clone());
        sink.announce("1 2");
        sink.announce("Go");
        assert_eq!(recorder.spoken(), ["1 2", "Go"]);
        assert_eq!(recorder.last().as_deref(), Some("Go"));
        recorder.clear();
        assert!(recorder.spoken().is_empty());
    }

    #[test]
    fn missing_speech_program_degrades_to_silence() {
        let mut speech = SpeechAnnouncer::new("roundbell-no-such-tts-binary", vec![]);
        speech.announce("1 2 3");
        assert!(!speech.is_available());
        speech.announce("Go");
        assert!(!speech.is_available());
    }

    #[test]
    fn voice_off_builds_no_announcer() {
        assert!(voice_announcer(VoiceBackend::Off).is_none());
        let program = VoiceBackend::Program {
            command: "roundbell-no-such-tts-binary".into(),
            args: Vec::new(),
        };
        let mut speech = voice_announcer(program).unwrap();
        speech.announce("Go");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_has_no_system_engine() {
        assert!(voice_announcer(VoiceBackend::System).is_none());
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn system_engine_failure_is_silent() {
        // Headless hosts may have no engine; announcing must not panic either way.
        let mut system = SystemAnnouncer::new();
        if !system.is_available() {
            system.announce("1 2");
        }
    }

    #[test]
    fn pair_fans_out() {
        let a = MemoryAnnouncer::new();
        let b = MemoryAnnouncer::new();
        let mut both = (a.clone(), b.clone());
        both.announce("Burpees");
        assert_eq!(a.spoken(), ["Burpees"]);
        assert_eq!(b.spoken(), ["Burpees"]);
    }
}
