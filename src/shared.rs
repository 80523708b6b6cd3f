// Input plan (resolved by the TUI into the semantic events below):
//
// Grid:
//   arrows / hjkl   //  MoveCursor
//   Enter           //  ToggleCursor
//
// Transport:
//   Space           //  PlayPress (play when stopped, stop when playing)
//   s               //  Stop
//   c               //  Clear
//   - / =           //  AdjustTempo(-5 or 5)
//
// Sound:
//   1 2 3           //  SetScale(major / minor / pentatonic)
//   Tab             //  CycleScale
//   i               //  CycleInstrument
//   [ / ]           //  AdjustAttack(-0.01 or 0.01)
//   { / }           //  AdjustDecay(-0.01 or 0.01)
//
// Prompts (typed text, Enter submits, Esc cancels):
//   e               //  ApplyEmotion(text)
//   m               //  DescribeMood(text)
//   o               //  LoadShare(text)
//
// Misc:
//   g               //  Challenge
//   x               //  Share
//   q / Esc         //  Quit
//
// The middle layer owns every bit of sequencer state; the TUI only renders the
// DisplayState snapshot it hands out each frame.

use crate::sequencer::achievements::Badge;
use crate::sequencer::scale::Scale;
use crate::sequencer::voice::InstrumentKind;

pub const NUM_ROWS: usize = 8;
pub const NUM_COLS: usize = 8;
// mood patterns only ever write this row
pub const MIDDLE_ROW: usize = NUM_ROWS / 2;

pub const DEFAULT_TEMPO: u32 = 120;
// bounds for interactive tempo changes; shared melodies may carry any positive tempo
pub const MIN_TEMPO: u32 = 40;
pub const MAX_TEMPO: u32 = 240;

// envelope control defaults (seconds, except sustain which is a level)
pub const DEFAULT_ATTACK: f32 = 0.01;
pub const DEFAULT_DECAY: f32 = 0.1;
pub const DEFAULT_SUSTAIN: f32 = 0.5;
pub const DEFAULT_RELEASE: f32 = 1.0;
pub const MAX_ENVELOPE_CONTROL: f32 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // cursor over the 8x8 grid
    MoveCursor { rows: i8, cols: i8 },
    ToggleCursor,

    // transport
    PlayPress,
    Stop,
    Clear,
    AdjustTempo(i32),

    // sound
    SetScale(Scale),
    CycleScale,
    CycleInstrument,
    AdjustAttack(f32),
    AdjustDecay(f32),

    // text prompts
    ApplyEmotion(String),
    DescribeMood(String),
    LoadShare(String),

    Challenge,
    Share,
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub grid: [[bool; NUM_COLS]; NUM_ROWS],
    pub playing_column: Option<usize>, // column last played, cleared on stop
    pub cursor: (usize, usize),        // (row, col)
    pub playing: bool,
    pub tempo: u32,
    pub scale: Scale,
    pub instrument: InstrumentKind,
    pub attack: f32,
    pub decay: f32,
    pub badges: Vec<(Badge, bool)>, // every badge with its unlocked flag
    pub display_text: String,
    pub share_link: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedState {
    Off,
    Lit,      // active cell
    Playhead, // inactive cell in the playing column
    Struck,   // active cell in the playing column
}

impl DisplayState {
    pub fn led(&self, row: usize, col: usize) -> LedState {
        let active = self.grid[row][col];
        let under_playhead = self.playing_column == Some(col);
        match (active, under_playhead) {
            (false, false) => LedState::Off,
            (true, false) => LedState::Lit,
            (false, true) => LedState::Playhead,
            (true, true) => LedState::Struck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_states_follow_playhead() {
        let mut grid = [[false; NUM_COLS]; NUM_ROWS];
        grid[0][2] = true;
        grid[1][3] = true;
        let ds = DisplayState {
            grid,
            playing_column: Some(2),
            cursor: (0, 0),
            playing: true,
            tempo: DEFAULT_TEMPO,
            scale: Scale::Major,
            instrument: InstrumentKind::Synth,
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            badges: Vec::new(),
            display_text: String::new(),
            share_link: None,
        };
        assert_eq!(ds.led(0, 2), LedState::Struck);
        assert_eq!(ds.led(1, 2), LedState::Playhead);
        assert_eq!(ds.led(1, 3), LedState::Lit);
        assert_eq!(ds.led(0, 0), LedState::Off);
    }
}
