use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;
use crate::sequencer::codec::MelodySnapshot;
use crate::sequencer::grid::Grid;
use crate::sequencer::scale::Scale;
use crate::sequencer::voice::VoiceConfig;

/// Everything the scheduler reads on a tick: the notes, the scale they map to,
/// and the voice that plays them. Tempo lives with the scheduler.
#[derive(Debug)]
pub struct SequencerState {
    pub grid: Grid,
    pub scale: Scale,
    pub voice: VoiceConfig,
}

impl SequencerState {
    pub fn new(audio_tx: Sender<AudioCommand>) -> Self {
        Self {
            grid: Grid::new(),
            scale: Scale::default(),
            voice: VoiceConfig::new(audio_tx),
        }
    }

    pub fn snapshot(&self, tempo: u32) -> MelodySnapshot {
        MelodySnapshot {
            grid: self.grid.to_matrix(),
            scale: self.scale,
            tempo,
            instrument: self.voice.kind(),
        }
    }
}
