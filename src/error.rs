// Every failure the sequencer core can report. All of them are handled by the
// caller at the boundary (status text, log line, or a silent no-op); none of
// them should ever stop the scheduler or leave the grid half-written.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// The audio output could not be unlocked, so playback did not start
    AudioUnavailable(String),
    /// A bulk grid load had the wrong dimensions
    ShapeMismatch { rows: usize, cols: usize },
    /// A share token could not be decoded or failed validation
    MalformedShareToken(String),
    /// Instrument name not in {synth, piano, pluck}
    UnknownInstrumentKind(String),
    /// Scale name not in {major, minor, pentatonic}
    UnknownScale(String),
}

impl std::fmt::Display for SequencerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerError::AudioUnavailable(msg) => write!(f, "audio unavailable: {}", msg),
            SequencerError::ShapeMismatch { rows, cols } => write!(
                f,
                "grid shape mismatch: got {}x{}, expected {}x{}",
                rows,
                cols,
                crate::shared::NUM_ROWS,
                crate::shared::NUM_COLS
            ),
            SequencerError::MalformedShareToken(msg) => write!(f, "malformed share token: {}", msg),
            SequencerError::UnknownInstrumentKind(name) => write!(f, "unknown instrument: {:?}", name),
            SequencerError::UnknownScale(name) => write!(f, "unknown scale: {:?}", name),
        }
    }
}

impl std::error::Error for SequencerError {}
