// Mood presets and the keyword matcher that picks one from free text.
// Catalog order matters: the matcher returns the first mood that matches.

use crate::sequencer::scale::Scale;
use crate::sequencer::voice::{InstrumentKind, Oscillator, VoiceSettings};
use crate::shared::NUM_COLS;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoodEntry {
    pub name: &'static str,
    pub scale: Scale,
    pub tempo: u32,
    pub pattern: [bool; NUM_COLS], // one flag per column, written to the middle row
    pub instrument: InstrumentKind,
    pub settings: VoiceSettings,
}

const fn pattern(bits: [u8; NUM_COLS]) -> [bool; NUM_COLS] {
    let mut out = [false; NUM_COLS];
    let mut i = 0;
    while i < NUM_COLS {
        out[i] = bits[i] != 0;
        i += 1;
    }
    out
}

const fn envelope(attack: f32, decay: f32, sustain: f32, release: f32, oscillator: Oscillator) -> VoiceSettings {
    VoiceSettings {
        attack: Some(attack),
        decay: Some(decay),
        sustain: Some(sustain),
        release: Some(release),
        oscillator: Some(oscillator),
    }
}

pub static MOODS: [MoodEntry; 8] = [
    MoodEntry {
        name: "romantic",
        scale: Scale::Major,
        tempo: 100,
        pattern: pattern([1, 0, 1, 1, 0, 0, 1, 0]),
        instrument: InstrumentKind::Piano,
        settings: envelope(0.005, 0.1, 0.3, 1.0, Oscillator::FatSine {
            partials: &[1.0, 2.0, 1.0, 2.0, 0.5],
            spread: 60.0,
        }),
    },
    MoodEntry {
        name: "energetic",
        scale: Scale::Pentatonic,
        tempo: 150,
        pattern: pattern([1, 1, 0, 1, 0, 1, 1, 0]),
        instrument: InstrumentKind::Synth,
        settings: envelope(0.001, 0.2, 0.5, 0.3, Oscillator::FatSawtooth { count: 3, spread: 30.0 }),
    },
    MoodEntry {
        name: "dreamy",
        scale: Scale::Minor,
        tempo: 90,
        pattern: pattern([0, 1, 0, 0, 1, 0, 0, 1]),
        instrument: InstrumentKind::Pluck,
        settings: envelope(0.005, 0.5, 0.1, 1.5, Oscillator::Sine { partials: &[0.5, 1.0, 1.5] }),
    },
    MoodEntry {
        name: "dramatic",
        scale: Scale::Minor,
        tempo: 120,
        pattern: pattern([1, 1, 0, 0, 1, 1, 0, 0]),
        instrument: InstrumentKind::Synth,
        settings: envelope(0.01, 0.4, 0.2, 1.0, Oscillator::Square { width: 0.6 }),
    },
    MoodEntry {
        name: "happy",
        scale: Scale::Major,
        tempo: 140,
        pattern: pattern([1, 0, 1, 0, 1, 0, 1, 0]),
        instrument: InstrumentKind::Piano,
        settings: envelope(0.003, 0.1, 0.4, 0.7, Oscillator::FmTriangle { modulation_index: 0.5 }),
    },
    MoodEntry {
        name: "sad",
        scale: Scale::Minor,
        tempo: 80,
        pattern: pattern([0, 1, 0, 1, 0, 1, 0, 1]),
        instrument: InstrumentKind::Piano,
        settings: envelope(0.01, 0.3, 0.2, 1.2, Oscillator::Sine { partials: &[1.0, 0.3, 0.1] }),
    },
    MoodEntry {
        name: "calm",
        scale: Scale::Pentatonic,
        tempo: 100,
        pattern: pattern([1, 0, 0, 1, 0, 0, 1, 0]),
        instrument: InstrumentKind::Pluck,
        settings: envelope(0.002, 0.8, 0.1, 1.0, Oscillator::Sine { partials: &[1.0, 0.5] }),
    },
    MoodEntry {
        name: "excited",
        scale: Scale::Major,
        tempo: 160,
        pattern: pattern([1, 1, 0, 1, 1, 0, 1, 1]),
        instrument: InstrumentKind::Synth,
        settings: envelope(0.001, 0.1, 0.6, 0.2, Oscillator::Pulse { width: 0.3 }),
    },
];

const DEFAULT_MOOD: usize = 4; // happy

pub fn default_mood() -> &'static MoodEntry {
    &MOODS[DEFAULT_MOOD]
}

/// Pick a mood from free text. A mood matches when its name contains any of
/// the lowercased, whitespace-split words (so "rom" finds "romantic", but
/// "romantically" finds nothing). Falls back to "happy". Runs of whitespace
/// never produce an empty word, so extra spaces can't match every mood.
pub fn match_mood(text: &str) -> &'static MoodEntry {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    MOODS
        .iter()
        .find(|mood| words.iter().any(|word| mood.name.contains(word)))
        .unwrap_or_else(default_mood)
}

/// Exact lookup for the emotion-template prompt, falling back to "happy".
pub fn mood_by_name(name: &str) -> &'static MoodEntry {
    let name = name.trim();
    MOODS
        .iter()
        .find(|mood| mood.name.eq_ignore_ascii_case(name))
        .unwrap_or_else(default_mood)
}
