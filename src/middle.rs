// The middle layer: owns the sequencer state and the scheduler, turns semantic
// input events into core operations, and hands the TUI a DisplayState to draw.
// Every failure stops here and turns into status text or a log line.

use std::time::Instant;

use crossbeam_channel::Sender;

use crate::audio_api::{AudioCommand, AudioContext};
use crate::error::SequencerError;
use crate::sequencer::achievements::{AchievementTracker, Badge};
use crate::sequencer::codec::{self, MelodySnapshot};
use crate::sequencer::events::SequencerObserver;
use crate::sequencer::grid::Grid;
use crate::sequencer::mood::{self, MoodEntry};
use crate::sequencer::scale::Scale;
use crate::sequencer::scheduler::Scheduler;
use crate::sequencer::state::SequencerState;
use crate::sequencer::voice::VoiceSettings;
use crate::shared::{
    DisplayState, InputEvent, DEFAULT_TEMPO, MAX_TEMPO, MIDDLE_ROW, MIN_TEMPO, NUM_COLS, NUM_ROWS,
};

pub const DEFAULT_SHARE_BASE: &str = "https://melodygrid.local/";

pub struct Middle {
    pub state: SequencerState,
    scheduler: Scheduler,
    achievements: AchievementTracker,
    playing_column: Option<usize>,
    cursor: (usize, usize),
    display_text: String,
    share_base: String,
    share_link: Option<String>,
    observers: Vec<Box<dyn SequencerObserver>>,
}

// forwards scheduler/grid notifications to the playhead and any extra observers
struct Fanout<'a> {
    playing_column: &'a mut Option<usize>,
    observers: &'a mut [Box<dyn SequencerObserver>],
}

impl SequencerObserver for Fanout<'_> {
    fn column_advanced(&mut self, col: usize) {
        *self.playing_column = Some(col);
        for o in self.observers.iter_mut() {
            o.column_advanced(col);
        }
    }

    fn cell_changed(&mut self, row: usize, col: usize, active: bool) {
        for o in self.observers.iter_mut() {
            o.cell_changed(row, col, active);
        }
    }
}

impl Middle {
    pub fn new(audio_tx: Sender<AudioCommand>) -> Self {
        Self {
            state: SequencerState::new(audio_tx),
            scheduler: Scheduler::new(DEFAULT_TEMPO),
            achievements: AchievementTracker::new(),
            playing_column: None,
            cursor: (0, 0),
            display_text: String::from("Toggle some cells and press space"),
            share_base: String::from(DEFAULT_SHARE_BASE),
            share_link: None,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SequencerObserver>) {
        self.observers.push(observer);
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    pub fn handle_input(&mut self, event: InputEvent, ctx: &mut dyn AudioContext, now: Instant) {
        match event {
            InputEvent::MoveCursor { rows, cols } => {
                let (row, col) = self.cursor;
                self.cursor = (
                    (row as i64 + rows as i64).clamp(0, NUM_ROWS as i64 - 1) as usize,
                    (col as i64 + cols as i64).clamp(0, NUM_COLS as i64 - 1) as usize,
                );
            }
            InputEvent::ToggleCursor => {
                let (row, col) = self.cursor;
                self.toggle_cell(row, col);
            }
            InputEvent::PlayPress => {
                if self.scheduler.is_playing() {
                    self.stop();
                } else {
                    self.play(ctx, now);
                }
            }
            InputEvent::Stop => self.stop(),
            InputEvent::Clear => self.clear(),
            InputEvent::AdjustTempo(delta) => {
                let tempo = (self.scheduler.tempo() as i64 + delta as i64)
                    .clamp(MIN_TEMPO as i64, MAX_TEMPO as i64) as u32;
                self.set_tempo(tempo, ctx, now);
            }
            InputEvent::SetScale(scale) => self.set_scale(scale),
            InputEvent::CycleScale => self.set_scale(self.state.scale.next()),
            InputEvent::CycleInstrument => {
                let kind = self.state.voice.kind().next();
                self.state.voice.switch_instrument(kind, &VoiceSettings::default());
                self.display_text = format!("Instrument: {kind}");
            }
            InputEvent::AdjustAttack(delta) => {
                let attack = self.state.voice.attack() + delta;
                self.state.voice.set_attack(attack);
            }
            InputEvent::AdjustDecay(delta) => {
                let decay = self.state.voice.decay() + delta;
                self.state.voice.set_decay(decay);
            }
            InputEvent::ApplyEmotion(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    self.apply_mood(mood::mood_by_name(text), text, ctx, now);
                }
            }
            InputEvent::DescribeMood(text) => {
                if !text.trim().is_empty() {
                    let entry = mood::match_mood(&text);
                    self.apply_mood(entry, entry.name, ctx, now);
                }
            }
            InputEvent::LoadShare(text) => {
                // already logged and reported in the status line
                let _ = self.load_share(&text, ctx, now);
            }
            InputEvent::Challenge => {
                self.display_text = self.achievements.next_challenge().to_string();
            }
            InputEvent::Share => {
                self.share();
            }
            InputEvent::Quit => {}
        }
    }

    /// Pump the scheduler; returns how many columns were played.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut fanout = Fanout {
            playing_column: &mut self.playing_column,
            observers: &mut self.observers,
        };
        self.scheduler.poll(now, &self.state, &mut fanout)
    }

    pub fn toggle_cell(&mut self, row: usize, col: usize) -> bool {
        if row >= NUM_ROWS || col >= NUM_COLS {
            return false;
        }
        let active = self.state.grid.toggle(row, col);
        for o in self.observers.iter_mut() {
            o.cell_changed(row, col, active);
        }
        if let Some(badge) = self.achievements.record_grid(self.state.grid.count_active()) {
            self.display_text = format!("Badge unlocked: {}", badge.label());
        }
        active
    }

    pub fn clear(&mut self) {
        let before = self.state.grid.to_matrix();
        self.state.grid.clear();
        self.notify_changes(&before);
    }

    /// Bulk-load a matrix. A wrong shape leaves the current grid alone.
    pub fn load_grid<R: AsRef<[bool]>>(&mut self, matrix: &[R]) -> Result<(), SequencerError> {
        let mut grid = Grid::new();
        grid.set_from_matrix(matrix)?;
        self.replace_grid(grid);
        Ok(())
    }

    pub fn play(&mut self, ctx: &mut dyn AudioContext, now: Instant) {
        if let Err(e) = self.scheduler.start(ctx, now) {
            self.display_text = format!("Couldn't start audio ({e}). Try again.");
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.playing_column = None;
    }

    pub fn set_tempo(&mut self, tempo: u32, ctx: &mut dyn AudioContext, now: Instant) {
        if let Err(e) = self.scheduler.set_tempo(tempo, ctx, now) {
            self.playing_column = None;
            self.display_text = format!("Couldn't restart audio ({e})");
        }
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.state.scale = scale;
        self.display_text = format!("Scale: {scale}");
    }

    /// Instrument by name; unknown names keep the current voice.
    pub fn set_instrument_named(&mut self, name: &str) -> Result<(), SequencerError> {
        self.state.voice.switch_instrument_named(name, &VoiceSettings::default())
    }

    /// Load a mood preset: scale, tempo, voice, and its pattern on the middle row.
    pub fn apply_mood(&mut self, entry: &MoodEntry, label: &str, ctx: &mut dyn AudioContext, now: Instant) {
        self.state.scale = entry.scale;
        self.set_tempo(entry.tempo, ctx, now);
        self.state.voice.switch_instrument(entry.instrument, &entry.settings);

        let mut grid = Grid::new();
        for (col, &on) in entry.pattern.iter().enumerate() {
            grid.set(MIDDLE_ROW, col, on);
        }
        self.replace_grid(grid);

        tracing::info!(mood = entry.name, "applied mood template");
        self.display_text = format!("Applied \"{label}\" template!");
        self.achievements.unlock(Badge::Emotion);
    }

    pub fn snapshot(&self) -> MelodySnapshot {
        self.state.snapshot(self.scheduler.tempo())
    }

    /// Build a share link for the current melody and remember it for display.
    pub fn share(&mut self) -> String {
        let token = codec::encode(&self.snapshot());
        let link = codec::share_link(&self.share_base, &token);
        tracing::info!(%link, "share link created");
        self.display_text = String::from("Share link ready");
        self.share_link = Some(link.clone());
        link
    }

    pub fn set_share_base(&mut self, base: impl Into<String>) {
        self.share_base = base.into();
    }

    /// Apply a share link or bare token. Nothing changes unless the whole
    /// token is valid.
    pub fn load_share(&mut self, input: &str, ctx: &mut dyn AudioContext, now: Instant) -> Result<(), SequencerError> {
        let decoded = codec::token_from_link(input)
            .ok_or_else(|| SequencerError::MalformedShareToken("no melody token found".into()))
            .and_then(codec::decode);
        let snapshot = match decoded {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("error loading melody: {e}");
                self.display_text = String::from("Couldn't load that melody link");
                return Err(e);
            }
        };

        self.load_grid(&snapshot.grid)?;
        self.state.scale = snapshot.scale;
        self.set_tempo(snapshot.tempo, ctx, now);
        self.state.voice.switch_instrument(snapshot.instrument, &VoiceSettings::default());
        self.display_text = String::from("Loaded shared melody!");
        Ok(())
    }

    pub fn display_state(&self) -> DisplayState {
        let playback = self.scheduler.playback();
        DisplayState {
            grid: self.state.grid.to_matrix(),
            playing_column: self.playing_column,
            cursor: self.cursor,
            playing: playback.is_playing,
            tempo: playback.tempo,
            scale: self.state.scale,
            instrument: self.state.voice.kind(),
            attack: self.state.voice.attack(),
            decay: self.state.voice.decay(),
            badges: self.achievements.badges(),
            display_text: self.display_text.clone(),
            share_link: self.share_link.clone(),
        }
    }

    // swap in a whole new grid, notifying observers about each changed cell
    fn replace_grid(&mut self, grid: Grid) {
        let before = self.state.grid.to_matrix();
        self.state.grid = grid;
        self.notify_changes(&before);
    }

    fn notify_changes(&mut self, before: &[[bool; NUM_COLS]; NUM_ROWS]) {
        let mut fanout = Fanout {
            playing_column: &mut self.playing_column,
            observers: &mut self.observers,
        };
        for (row, cells) in before.iter().enumerate() {
            for (col, &was) in cells.iter().enumerate() {
                let active = self.state.grid.get(row, col);
                if was != active {
                    fanout.cell_changed(row, col, active);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use crate::sequencer::scale::Pitch;
    use crate::sequencer::scheduler::note_duration;
    use crate::sequencer::test_fixture::{EventLog, FakeContext, command_channel, triggers};
    use crate::sequencer::voice::InstrumentKind;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    struct Shared(Rc<RefCell<EventLog>>);

    impl SequencerObserver for Shared {
        fn column_advanced(&mut self, col: usize) {
            self.0.borrow_mut().column_advanced(col);
        }

        fn cell_changed(&mut self, row: usize, col: usize, active: bool) {
            self.0.borrow_mut().cell_changed(row, col, active);
        }
    }

    fn middle_with_log() -> (Middle, crossbeam_channel::Receiver<AudioCommand>, Rc<RefCell<EventLog>>) {
        let (tx, rx) = command_channel();
        let mut middle = Middle::new(tx);
        let log = Rc::new(RefCell::new(EventLog::default()));
        middle.add_observer(Box::new(Shared(log.clone())));
        (middle, rx, log)
    }

    #[test]
    fn test_romantic_cycle_plays_four_notes() {
        let (mut middle, rx, log) = middle_with_log();
        let mut ctx = FakeContext::running();
        let t0 = Instant::now();

        middle.handle_input(InputEvent::DescribeMood("romantic evening".into()), &mut ctx, t0);
        assert_eq!(middle.scheduler().tempo(), 100);
        assert_eq!(middle.state.scale, Scale::Major);
        assert_eq!(middle.state.voice.kind(), InstrumentKind::Piano);
        let _ = triggers(&rx);

        middle.handle_input(InputEvent::PlayPress, &mut ctx, t0);
        let mut fired = 0;
        for step in 1..=8 {
            fired += middle.tick(t0 + ms(600 * step));
        }
        assert_eq!(fired, 8);
        assert_eq!(log.borrow().columns, (0..NUM_COLS).collect::<Vec<_>>());

        let played = triggers(&rx);
        assert_eq!(played.len(), 4);
        let major: &[Pitch] = Scale::Major.pitches();
        for (pitch, duration) in played {
            assert!(major.contains(&pitch));
            assert_eq!(pitch.to_string(), "F4");
            assert_eq!(duration, note_duration(100));
            assert_eq!(duration, ms(300));
        }
    }

    #[test]
    fn test_mood_pattern_lands_on_middle_row_only() {
        let (mut middle, _rx, log) = middle_with_log();
        let mut ctx = FakeContext::running();
        middle.toggle_cell(0, 0);
        log.borrow_mut().cells.clear();

        middle.handle_input(InputEvent::ApplyEmotion("sad".into()), &mut ctx, Instant::now());
        let grid = middle.state.grid.to_matrix();
        for (row, cells) in grid.iter().enumerate() {
            let expected = if row == MIDDLE_ROW { mood::mood_by_name("sad").pattern } else { [false; NUM_COLS] };
            assert_eq!(cells, &expected, "row {row}");
        }
        // old cell cleared plus four new ones
        assert_eq!(log.borrow().cells.len(), 5);
        assert!(middle.achievements().is_unlocked(Badge::Emotion));
        assert_eq!(middle.display_state().display_text, "Applied \"sad\" template!");
    }

    #[test]
    fn test_first_toggle_unlocks_badge() {
        let (mut middle, _rx, log) = middle_with_log();
        let mut ctx = FakeContext::running();
        middle.handle_input(InputEvent::MoveCursor { rows: 2, cols: 9 }, &mut ctx, Instant::now());
        assert_eq!(middle.display_state().cursor, (2, NUM_COLS - 1));
        middle.handle_input(InputEvent::ToggleCursor, &mut ctx, Instant::now());
        assert!(middle.state.grid.get(2, NUM_COLS - 1));
        assert!(middle.achievements().is_unlocked(Badge::FirstNote));
        assert_eq!(log.borrow().cells, vec![(2, NUM_COLS - 1, true)]);
    }

    #[test]
    fn test_share_then_load_restores_state() {
        let (tx, _rx) = command_channel();
        let mut ctx = FakeContext::running();
        let now = Instant::now();

        let mut source = Middle::new(tx.clone());
        source.toggle_cell(1, 1);
        source.toggle_cell(6, 4);
        source.set_scale(Scale::Pentatonic);
        source.set_tempo(175, &mut ctx, now);
        source.set_instrument_named("pluck").unwrap();
        let link = source.share();
        assert!(link.starts_with(DEFAULT_SHARE_BASE));
        source.set_share_base("https://tunes.test/play");
        assert!(source.share().starts_with("https://tunes.test/play?melody="));

        let mut target = Middle::new(tx);
        target.load_share(&link, &mut ctx, now).unwrap();
        assert_eq!(target.snapshot(), source.snapshot());
        assert_eq!(target.display_state().display_text, "Loaded shared melody!");
    }

    #[test]
    fn test_bad_share_leaves_state_untouched() {
        let (tx, _rx) = command_channel();
        let mut ctx = FakeContext::running();
        let now = Instant::now();
        let mut middle = Middle::new(tx);
        middle.toggle_cell(3, 3);
        let before = middle.snapshot();

        let good = codec::encode(&MelodySnapshot { tempo: 90, ..before.clone() });
        let truncated = &good[..good.len() - 4];
        for input in [truncated, "", "https://x.test/?other=1", "!!!"] {
            let result = middle.load_share(input, &mut ctx, now);
            assert!(matches!(result, Err(SequencerError::MalformedShareToken(_))));
            assert_eq!(middle.snapshot(), before);
        }
    }

    #[test]
    fn test_tempo_knob_restarts_and_clamps() {
        let (mut middle, _rx, log) = middle_with_log();
        let mut ctx = FakeContext::running();
        let t0 = Instant::now();
        middle.handle_input(InputEvent::PlayPress, &mut ctx, t0);
        middle.tick(t0 + ms(1000)); // columns 0 and 1
        assert_eq!(middle.scheduler().playback().current_column, 2);

        let t1 = t0 + ms(1100);
        middle.handle_input(InputEvent::AdjustTempo(-60), &mut ctx, t1);
        assert_eq!(middle.scheduler().tempo(), 60);
        assert_eq!(middle.scheduler().playback().current_column, 0);
        middle.tick(t1 + ms(1000));
        assert_eq!(log.borrow().columns, vec![0, 1, 0]);

        middle.handle_input(InputEvent::AdjustTempo(-1000), &mut ctx, t1);
        assert_eq!(middle.scheduler().tempo(), MIN_TEMPO);
        middle.handle_input(InputEvent::AdjustTempo(1000), &mut ctx, t1);
        assert_eq!(middle.scheduler().tempo(), MAX_TEMPO);
    }

    #[test]
    fn test_audio_failure_is_reported_not_raised() {
        let (tx, _rx) = command_channel();
        let mut ctx = FakeContext::suspended(false);
        let mut middle = Middle::new(tx);
        middle.handle_input(InputEvent::PlayPress, &mut ctx, Instant::now());
        let ds = middle.display_state();
        assert!(!ds.playing);
        assert!(ds.display_text.starts_with("Couldn't start audio"));
    }

    #[test]
    fn test_stop_clears_playhead() {
        let (tx, _rx) = command_channel();
        let mut ctx = FakeContext::running();
        let t0 = Instant::now();
        let mut middle = Middle::new(tx);
        middle.handle_input(InputEvent::PlayPress, &mut ctx, t0);
        middle.tick(t0 + ms(500));
        assert_eq!(middle.display_state().playing_column, Some(0));
        middle.handle_input(InputEvent::PlayPress, &mut ctx, t0 + ms(600));
        let ds = middle.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.playing_column, None);
        // stopping again is harmless
        middle.handle_input(InputEvent::Stop, &mut ctx, t0 + ms(700));
        assert!(!middle.display_state().playing);
    }

    #[test]
    fn test_clear_and_wrong_shape_load() {
        let (mut middle, _rx, log) = middle_with_log();
        middle.toggle_cell(0, 0);
        middle.toggle_cell(7, 7);
        middle.clear();
        assert_eq!(middle.state.grid.count_active(), 0);
        assert_eq!(log.borrow().cells[2..], [(0, 0, false), (7, 7, false)]);

        middle.toggle_cell(5, 5);
        let bad = vec![vec![true; NUM_COLS]; 3];
        assert!(matches!(middle.load_grid(&bad), Err(SequencerError::ShapeMismatch { .. })));
        assert_eq!(middle.state.grid.count_active(), 1);
    }

    #[test]
    fn test_instrument_cycle_and_unknown_name() {
        let (tx, _rx) = command_channel();
        let mut ctx = FakeContext::running();
        let mut middle = Middle::new(tx);
        middle.handle_input(InputEvent::CycleInstrument, &mut ctx, Instant::now());
        assert_eq!(middle.state.voice.kind(), InstrumentKind::Piano);
        assert!(middle.set_instrument_named("kazoo").is_err());
        assert_eq!(middle.state.voice.kind(), InstrumentKind::Piano);
    }
}
