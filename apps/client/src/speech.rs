/// Voice parameters handed to the speech synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            pitch: 1.1,
            rate: 1.0,
        }
    }
}

/// Reads answers aloud. Speech synthesis itself lives outside this crate.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, voice: &Voice);
}

/// Writes what would be spoken to stdout.
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str, voice: &Voice) {
        println!(
            "[speak {} pitch={:.1} rate={:.1}] {text}",
            voice.language, voice.pitch, voice.rate
        );
    }
}
