use crate::audio_api::{AudioCommand, VoiceId};

use super::synth::MonoSynth;

// hard cap so we never allocate in the audio callback; only one voice is live
// at a time, the spare slots cover acquire-before-release races
const MAX_VOICES: usize = 4;
const MASTER_GAIN: f32 = 0.25;

struct Slot {
    id: VoiceId,
    synth: MonoSynth,
}

pub struct Engine {
    sample_rate: f32,
    slots: [Option<Slot>; MAX_VOICES],
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::AcquireVoice { id, spec } => {
                // what slot do we write to?
                let free = self.slots.iter().position(Option::is_none).unwrap_or(0);
                self.slots[free] = Some(Slot { id, synth: MonoSynth::new(spec, self.sample_rate) });
            }
            AudioCommand::ReleaseVoice(id) => {
                if let Some(slot) = self.slots.iter_mut().find(|s| s.as_ref().is_some_and(|s| s.id == id)) {
                    *slot = None;
                }
            }
            AudioCommand::UpdateEnvelope { id, envelope } => {
                if let Some(slot) = self.slot_mut(id) {
                    slot.synth.set_envelope(envelope);
                }
            }
            AudioCommand::Trigger { id, pitch, duration } => {
                if let Some(slot) = self.slot_mut(id) {
                    slot.synth.note_on(pitch.frequency(), duration);
                }
            }
        }
    }

    fn slot_mut(&mut self, id: VoiceId) -> Option<&mut Slot> {
        self.slots.iter_mut().flatten().find(|s| s.id == id)
    }

    pub fn next_sample(&mut self) -> f32 {
        let mut out = 0.0;
        for slot in self.slots.iter_mut().flatten() {
            out += slot.synth.next_sample();
        }
        (out * MASTER_GAIN).clamp(-1.0, 1.0)
    }

    /// Fill an interleaved buffer, same mono signal on every channel.
    pub fn render_block(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }
}
