use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{command_channel, AudioCommand, AudioContext};
use crate::error::SequencerError;

pub mod bounce;
mod engine;
mod synth;

pub use engine::Engine;

// Output starts suspended; the first play press unlocks it (see `resume`).
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    output_stream: Option<cpal::Stream>, // None when no output device
    running: bool,
}

impl AudioHandle {
    pub fn sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }
}

impl AudioContext for AudioHandle {
    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<(), SequencerError> {
        let stream = self
            .output_stream
            .as_ref()
            .ok_or_else(|| SequencerError::AudioUnavailable("no output device".into()))?;
        stream
            .play()
            .map_err(|e| SequencerError::AudioUnavailable(e.to_string()))?;
        self.running = true;
        tracing::info!("audio output unlocked");
        Ok(())
    }
}

/// Open the default output device. Never fails: without a device the handle
/// still hands out a sender but can't be resumed, so playback reports
/// `AudioUnavailable`.
pub fn start_audio() -> AudioHandle {
    // Nothing drains the queue until the first play unlocks the stream, so it
    // must hold every voice acquire/release issued before then.
    let (tx, rx) = command_channel();

    let output_stream = match open_output(rx) {
        Ok(stream) => Some(stream),
        Err(e) => {
            // rx is gone with the failed stream, later sends just report disconnected
            tracing::warn!("audio output disabled: {e:#}");
            None
        }
    };
    AudioHandle { tx, output_stream, running: false }
}

fn open_output(rx: Receiver<AudioCommand>) -> anyhow::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    tracing::info!(sample_rate, channels, "audio output opened");

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let stream = build_output_stream_f32(&device, &config.into(), rx, sample_rate, channels)?;
            // some hosts start streams on creation; hold it until unlocked
            if let Err(e) = stream.pause() {
                tracing::debug!("could not pause fresh output stream: {e}");
            }
            Ok(stream)
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);

    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info| {
                while let Ok(cmd) = rx.try_recv() {
                    engine.handle_cmd(cmd);
                }
                engine.render_block(data, channels);
            },
            err_fn,
            None,
        )
        .context("failed to build output stream")?;

    Ok(stream)
}
