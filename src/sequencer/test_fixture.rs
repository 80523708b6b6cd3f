// Purely for testing: a command channel we can inspect, a fake audio context
// with a scriptable unlock, and an observer that records everything.

use std::time::Duration;

use crossbeam_channel::Receiver;

pub use crate::audio_api::command_channel;
use crate::audio_api::{AudioCommand, AudioContext};
use crate::error::SequencerError;
use crate::sequencer::events::SequencerObserver;
use crate::sequencer::scale::Pitch;

/// Drain the channel, keeping only note triggers.
pub fn triggers(rx: &Receiver<AudioCommand>) -> Vec<(Pitch, Duration)> {
    rx.try_iter()
        .filter_map(|cmd| match cmd {
            AudioCommand::Trigger { pitch, duration, .. } => Some((pitch, duration)),
            _ => None,
        })
        .collect()
}

pub struct FakeContext {
    pub running: bool,
    pub unlock_ok: bool,
    pub resume_calls: usize,
}

impl FakeContext {
    pub fn running() -> Self {
        Self { running: true, unlock_ok: true, resume_calls: 0 }
    }

    pub fn suspended(unlock_ok: bool) -> Self {
        Self { running: false, unlock_ok, resume_calls: 0 }
    }
}

impl AudioContext for FakeContext {
    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<(), SequencerError> {
        self.resume_calls += 1;
        if !self.unlock_ok {
            return Err(SequencerError::AudioUnavailable("no user gesture yet".into()));
        }
        self.running = true;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    pub columns: Vec<usize>,
    pub cells: Vec<(usize, usize, bool)>,
}

impl SequencerObserver for EventLog {
    fn column_advanced(&mut self, col: usize) {
        self.columns.push(col);
    }

    fn cell_changed(&mut self, row: usize, col: usize, active: bool) {
        self.cells.push((row, col, active));
    }
}
