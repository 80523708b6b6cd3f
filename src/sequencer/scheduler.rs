// Playback clock. The scheduler never spawns anything: the main loop calls
// `poll` with the current time and every tick that has come due is played
// right there, on the caller's thread. There is at most one timer at any
// moment, so notes can't double-trigger.

use std::time::{Duration, Instant};

use crate::audio_api::AudioContext;
use crate::error::SequencerError;
use crate::sequencer::events::SequencerObserver;
use crate::sequencer::state::SequencerState;
use crate::shared::NUM_COLS;

/// One step per beat.
pub fn step_interval(tempo: u32) -> Duration {
    Duration::from_nanos(60_000_000_000 / tempo.max(1) as u64)
}

/// Notes last an eighth note, half a step.
pub fn note_duration(tempo: u32) -> Duration {
    step_interval(tempo) / 2
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_column: usize,
    pub tempo: u32,
}

#[derive(Clone, Copy, Debug)]
struct StepTimer {
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug)]
pub struct Scheduler {
    playback: PlaybackState,
    timer: Option<StepTimer>,
}

impl Scheduler {
    pub fn new(tempo: u32) -> Self {
        Self {
            playback: PlaybackState {
                is_playing: false,
                current_column: 0,
                tempo: tempo.max(1),
            },
            timer: None,
        }
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing
    }

    pub fn tempo(&self) -> u32 {
        self.playback.tempo
    }

    /// Interval of the armed timer, if any.
    #[cfg(test)]
    pub fn timer_interval(&self) -> Option<Duration> {
        self.timer.map(|t| t.interval)
    }

    /// Begin playback from column 0. Does nothing when already playing. If
    /// the audio output is suspended it gets unlocked first; when that fails
    /// playback stays stopped.
    pub fn start(&mut self, ctx: &mut dyn AudioContext, now: Instant) -> Result<(), SequencerError> {
        if self.playback.is_playing {
            return Ok(());
        }
        if !ctx.is_running() {
            ctx.resume().inspect_err(|e| tracing::error!("playback not started: {e}"))?;
        }

        let interval = step_interval(self.playback.tempo);
        self.playback.current_column = 0;
        self.playback.is_playing = true;
        self.timer = Some(StepTimer { interval, next_due: now + interval });
        tracing::info!(tempo = self.playback.tempo, ?interval, "playback started");
        Ok(())
    }

    /// Cancel the timer. Safe to call at any time; returns whether anything
    /// was actually playing.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.playback.is_playing;
        self.timer = None;
        self.playback.is_playing = false;
        if was_playing {
            tracing::info!(column = self.playback.current_column, "playback stopped");
        }
        was_playing
    }

    /// Change tempo. While playing this restarts from column 0 at the new
    /// interval; the old timer is gone before the new one is armed.
    pub fn set_tempo(&mut self, tempo: u32, ctx: &mut dyn AudioContext, now: Instant) -> Result<(), SequencerError> {
        self.playback.tempo = tempo.max(1);
        if self.playback.is_playing {
            tracing::debug!(tempo = self.playback.tempo, "tempo change, restarting playback");
            self.stop();
            self.start(ctx, now)?;
        }
        Ok(())
    }

    /// Play every tick that is due at `now` and return how many fired. At most
    /// one cycle is caught up; anything older is dropped and the timer is
    /// re-anchored to `now`.
    pub fn poll(&mut self, now: Instant, state: &SequencerState, observer: &mut dyn SequencerObserver) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timer.as_mut() {
            if now < timer.next_due {
                break;
            }
            if fired == NUM_COLS {
                tracing::warn!(behind = ?(now - timer.next_due), "scheduler fell behind, skipping ticks");
                timer.next_due = now + timer.interval;
                break;
            }
            timer.next_due += timer.interval;
            self.on_column(state, observer);
            fired += 1;
        }
        fired
    }

    // one step: trigger the column's notes, move on, tell the observer
    fn on_column(&mut self, state: &SequencerState, observer: &mut dyn SequencerObserver) {
        let col = self.playback.current_column;
        let duration = note_duration(self.playback.tempo);

        // Same voice for every row, so on a mono voice the last row wins.
        for row in state.grid.active_in_column(col) {
            if let Some(pitch) = state.scale.pitch_for_row(row) {
                state.voice.trigger(pitch, duration);
            }
        }

        self.playback.current_column = (col + 1) % NUM_COLS;
        observer.column_advanced(col);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::events::NoopObserver;
    use crate::sequencer::test_fixture::{EventLog, FakeContext, command_channel, triggers};
    use crate::sequencer::scale::Scale;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_interval_follows_tempo() {
        assert_eq!(step_interval(120), ms(500));
        assert_eq!(step_interval(60), ms(1000));
        assert_eq!(note_duration(120), ms(250));
    }

    #[test]
    fn test_first_tick_is_one_interval_after_start() {
        let (tx, _rx) = command_channel();
        let state = SequencerState::new(tx);
        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();

        sched.start(&mut ctx, t0).unwrap();
        assert!(sched.is_playing());
        assert_eq!(sched.timer_interval(), Some(ms(500)));
        assert_eq!(sched.poll(t0 + ms(499), &state, &mut NoopObserver), 0);
        assert_eq!(sched.poll(t0 + ms(500), &state, &mut NoopObserver), 1);
        assert_eq!(sched.playback().current_column, 1);
    }

    #[test]
    fn test_double_start_keeps_single_timer() {
        let (tx, rx) = command_channel();
        let mut state = SequencerState::new(tx);
        for col in 0..NUM_COLS {
            state.grid.set(0, col, true);
        }
        rx.try_iter().for_each(drop);

        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();
        sched.start(&mut ctx, t0).unwrap();
        sched.start(&mut ctx, t0 + ms(100)).unwrap();

        let mut log = EventLog::default();
        let mut fired = 0;
        // two seconds of wall clock in 50ms polls
        for step in 1..=40 {
            fired += sched.poll(t0 + ms(step * 50), &state, &mut log);
        }
        assert_eq!(fired, 4);
        assert_eq!(log.columns, vec![0, 1, 2, 3]);
        assert_eq!(triggers(&rx).len(), 4);
    }

    #[test]
    fn test_tempo_change_restarts_from_column_zero() {
        let (tx, _rx) = command_channel();
        let state = SequencerState::new(tx);
        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();

        sched.start(&mut ctx, t0).unwrap();
        assert_eq!(sched.poll(t0 + ms(1500), &state, &mut NoopObserver), 3);
        assert_eq!(sched.playback().current_column, 3);

        let t1 = t0 + ms(1600);
        sched.set_tempo(60, &mut ctx, t1).unwrap();
        assert!(sched.is_playing());
        assert_eq!(sched.playback().current_column, 0);
        assert_eq!(sched.timer_interval(), Some(ms(1000)));

        let mut log = EventLog::default();
        assert_eq!(sched.poll(t1 + ms(999), &state, &mut log), 0);
        assert_eq!(sched.poll(t1 + ms(1000), &state, &mut log), 1);
        assert_eq!(sched.poll(t1 + ms(2000), &state, &mut log), 1);
        assert_eq!(log.columns, vec![0, 1]);
    }

    #[test]
    fn test_tempo_change_while_stopped_does_not_start() {
        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        sched.set_tempo(90, &mut ctx, Instant::now()).unwrap();
        assert!(!sched.is_playing());
        assert_eq!(sched.tempo(), 90);
        assert_eq!(sched.timer_interval(), None);
    }

    #[test]
    fn test_stop_is_idempotent_and_silences_ticks() {
        let (tx, _rx) = command_channel();
        let state = SequencerState::new(tx);
        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();

        assert!(!sched.stop()); // never started
        sched.start(&mut ctx, t0).unwrap();
        assert!(sched.stop());
        assert!(!sched.stop());
        assert_eq!(sched.poll(t0 + ms(5000), &state, &mut NoopObserver), 0);
    }

    #[test]
    fn test_locked_audio_is_unlocked_on_start() {
        let mut ctx = FakeContext::suspended(true);
        let mut sched = Scheduler::new(120);
        sched.start(&mut ctx, Instant::now()).unwrap();
        assert!(sched.is_playing());
        assert_eq!(ctx.resume_calls, 1);
    }

    #[test]
    fn test_failed_unlock_keeps_playback_stopped() {
        let mut ctx = FakeContext::suspended(false);
        let mut sched = Scheduler::new(120);
        let result = sched.start(&mut ctx, Instant::now());
        assert!(matches!(result, Err(SequencerError::AudioUnavailable(_))));
        assert!(!sched.is_playing());
        assert_eq!(sched.timer_interval(), None);
    }

    #[test]
    fn test_column_wraps_and_maps_rows_to_scale() {
        let (tx, rx) = command_channel();
        let mut state = SequencerState::new(tx);
        state.scale = Scale::Minor;
        state.grid.set(0, 0, true); // top row, highest note
        state.grid.set(5, 7, true);
        rx.try_iter().for_each(drop);

        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();
        sched.start(&mut ctx, t0).unwrap();
        let mut log = EventLog::default();
        for step in 1..=9 {
            sched.poll(t0 + ms(step * 500), &state, &mut log);
        }
        assert_eq!(log.columns, vec![0, 1, 2, 3, 4, 5, 6, 7, 0]);
        assert_eq!(sched.playback().current_column, 1);

        let played: Vec<String> = triggers(&rx).iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(played, vec!["C5", "Eb4", "C5"]);
        assert!(triggers(&rx).is_empty());
    }

    #[test]
    fn test_backlog_is_capped_at_one_cycle() {
        let (tx, _rx) = command_channel();
        let state = SequencerState::new(tx);
        let mut ctx = FakeContext::running();
        let mut sched = Scheduler::new(120);
        let t0 = Instant::now();
        sched.start(&mut ctx, t0).unwrap();

        // ten seconds late: one cycle plays, the rest is dropped
        let late = t0 + ms(10_000);
        assert_eq!(sched.poll(late, &state, &mut NoopObserver), NUM_COLS);
        assert_eq!(sched.poll(late + ms(499), &state, &mut NoopObserver), 0);
        assert_eq!(sched.poll(late + ms(500), &state, &mut NoopObserver), 1);
    }
}
