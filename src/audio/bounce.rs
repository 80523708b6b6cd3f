// Offline render: run the same scheduler against a simulated clock and feed
// its commands straight into an Engine instead of a sound card.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel::Receiver;

use crate::audio_api::{AudioCommand, AudioContext};
use crate::error::SequencerError;
use crate::sequencer::events::NoopObserver;
use crate::sequencer::scheduler::{step_interval, Scheduler};
use crate::sequencer::state::SequencerState;
use crate::shared::{DEFAULT_RELEASE, NUM_COLS};

pub const BOUNCE_SAMPLE_RATE: u32 = 44100;

/// Audio context for rendering without a device: always running.
pub struct Offline;

impl AudioContext for Offline {
    fn is_running(&self) -> bool {
        true
    }

    fn resume(&mut self) -> Result<(), SequencerError> {
        Ok(())
    }
}

/// Render `cycles` passes over the grid, plus a tail so the last note can
/// release. `rx` must be the receiving end of the state's voice channel.
pub fn render(
    state: &SequencerState,
    rx: &Receiver<AudioCommand>,
    tempo: u32,
    cycles: usize,
    sample_rate: u32,
) -> Vec<f32> {
    let mut engine = super::Engine::new(sample_rate);
    let mut scheduler = Scheduler::new(tempo);
    let interval = step_interval(tempo);
    let t0 = Instant::now();

    let steps = cycles * NUM_COLS;
    let tail = Duration::from_secs_f32(DEFAULT_RELEASE);
    let mut out = Vec::with_capacity(samples_at(interval * steps as u32 + tail, sample_rate));

    // start can't fail offline
    let _ = scheduler.start(&mut Offline, t0);
    for step in 1..=steps {
        let now = t0 + interval * step as u32;
        scheduler.poll(now, state, &mut NoopObserver);
        for cmd in rx.try_iter() {
            engine.handle_cmd(cmd);
        }
        // sample positions come from absolute time so rounding never drifts
        let end = samples_at(interval * step as u32, sample_rate);
        out.extend((out.len()..end).map(|_| engine.next_sample()));
    }
    scheduler.stop();

    let end = out.len() + samples_at(tail, sample_rate);
    out.extend((out.len()..end).map(|_| engine.next_sample()));
    tracing::info!(steps, samples = out.len(), "bounce rendered");
    out
}

fn samples_at(t: Duration, sample_rate: u32) -> usize {
    (t.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Write mono 16-bit PCM.
pub fn export(path: &Path, data: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("could not create {}", path.display()))?;

    for sample in data {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }

    writer.finalize()?;
    tracing::info!(path = %path.display(), "bounce written");
    Ok(())
}
