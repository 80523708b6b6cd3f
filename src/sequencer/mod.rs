// Sequencer core: no terminal, no audio device, just state and timing.

pub mod achievements;
pub mod codec;
pub mod events;
pub mod grid;
pub mod mood;
pub mod scale;
pub mod scheduler;
pub mod state;
pub mod voice;

#[cfg(test)]
pub mod test_fixture;
