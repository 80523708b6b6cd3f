// Scale table: each scale is exactly NUM_ROWS pitches, lowest first.
// Row 0 of the grid is the top of the screen, so it gets the highest pitch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;
use crate::shared::NUM_ROWS;

const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A note at a specific octave, e.g. C4 or Eb4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    semitone: u8, // 0 = C .. 11 = B
    octave: u8,
}

impl Pitch {
    pub const fn new(semitone: u8, octave: u8) -> Self {
        Self { semitone, octave }
    }

    // MIDI numbering, C4 = 60
    pub fn midi(&self) -> u8 {
        (self.octave + 1) * 12 + self.semitone
    }

    // equal temperament around A4 = 440Hz
    pub fn frequency(&self) -> f32 {
        440.0 * 2.0_f32.powf((self.midi() as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[self.semitone as usize % 12], self.octave)
    }
}

const C4: Pitch = Pitch::new(0, 4);
const D4: Pitch = Pitch::new(2, 4);
const EB4: Pitch = Pitch::new(3, 4);
const E4: Pitch = Pitch::new(4, 4);
const F4: Pitch = Pitch::new(5, 4);
const G4: Pitch = Pitch::new(7, 4);
const AB4: Pitch = Pitch::new(8, 4);
const A4: Pitch = Pitch::new(9, 4);
const BB4: Pitch = Pitch::new(10, 4);
const B4: Pitch = Pitch::new(11, 4);
const C5: Pitch = Pitch::new(0, 5);
const D5: Pitch = Pitch::new(2, 5);
const E5: Pitch = Pitch::new(4, 5);

const MAJOR: [Pitch; NUM_ROWS] = [C4, D4, E4, F4, G4, A4, B4, C5];
const MINOR: [Pitch; NUM_ROWS] = [C4, D4, EB4, F4, G4, AB4, BB4, C5];
const PENTATONIC: [Pitch; NUM_ROWS] = [C4, D4, E4, G4, A4, C5, D5, E5];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Major,
    Minor,
    Pentatonic,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::Major, Scale::Minor, Scale::Pentatonic];

    pub fn pitches(self) -> &'static [Pitch; NUM_ROWS] {
        match self {
            Scale::Major => &MAJOR,
            Scale::Minor => &MINOR,
            Scale::Pentatonic => &PENTATONIC,
        }
    }

    /// Pitch played by a grid row. Rows outside the grid have no pitch.
    pub fn pitch_for_row(self, row: usize) -> Option<Pitch> {
        if row >= NUM_ROWS {
            return None;
        }
        Some(self.pitches()[NUM_ROWS - row - 1])
    }

    pub fn name(self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
            Scale::Pentatonic => "pentatonic",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Scale::Major => Scale::Minor,
            Scale::Minor => Scale::Pentatonic,
            Scale::Pentatonic => Scale::Major,
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scale {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::ALL
            .into_iter()
            .find(|scale| scale.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SequencerError::UnknownScale(s.to_string()))
    }
}
