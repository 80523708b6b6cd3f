/// Receives sequencer notifications for display purposes. Observers only get
/// copies of values, never a handle on the grid or the playback state.
pub trait SequencerObserver {
    /// A column was just played.
    fn column_advanced(&mut self, _col: usize) {}

    /// A cell changed through a toggle, clear or bulk load.
    fn cell_changed(&mut self, _row: usize, _col: usize, _active: bool) {}
}

/// Observer that ignores everything, for headless playback.
pub struct NoopObserver;

impl SequencerObserver for NoopObserver {}

/// Writes every notification to the debug log.
pub struct TraceObserver;

impl SequencerObserver for TraceObserver {
    fn column_advanced(&mut self, col: usize) {
        tracing::debug!(col, "column played");
    }

    fn cell_changed(&mut self, row: usize, col: usize, active: bool) {
        tracing::debug!(row, col, active, "cell changed");
    }
}
