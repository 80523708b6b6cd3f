use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::error::SequencerError;
use crate::sequencer::scale::Pitch;
use crate::sequencer::voice::{Envelope, VoiceSpec};

static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

// atomic so ids stay unique no matter which thread builds the voice
pub fn next_voice_id() -> VoiceId {
    VoiceId(NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Sequencer → engine command queue. Unbounded: commands pile up while the
/// output is still locked and none of them may be dropped.
pub fn command_channel() -> (Sender<AudioCommand>, Receiver<AudioCommand>) {
    crossbeam_channel::unbounded()
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    // The engine never builds instruments on its own; the sequencer side decides
    // when a voice exists and tells the engine to set one up or tear it down.
    AcquireVoice { id: VoiceId, spec: VoiceSpec },
    ReleaseVoice(VoiceId),

    // attack/decay knobs tweak the live voice without rebuilding it
    UpdateEnvelope { id: VoiceId, envelope: Envelope },

    // restarts the voice's single note, cutting off whatever it was playing
    Trigger { id: VoiceId, pitch: Pitch, duration: Duration },
}

/// The "audio output ready" gate. Output may start suspended until the user
/// does something; `resume` is the one-shot unlock.
pub trait AudioContext {
    fn is_running(&self) -> bool;
    fn resume(&mut self) -> Result<(), SequencerError>;
}
