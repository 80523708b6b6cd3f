// Instrument voices. There is exactly one live voice at a time; switching
// instruments releases the old one before the new one is set up, so the engine
// never holds an orphaned instrument.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::audio_api::{next_voice_id, AudioCommand, VoiceId};
use crate::error::SequencerError;
use crate::sequencer::scale::Pitch;
use crate::shared::{DEFAULT_ATTACK, DEFAULT_DECAY, DEFAULT_RELEASE, DEFAULT_SUSTAIN, MAX_ENVELOPE_CONTROL};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    #[default]
    Synth, // fat sawtooth
    Piano, // fat sine with a few partials
    Pluck, // plucked string, no oscillator
}

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 3] = [InstrumentKind::Synth, InstrumentKind::Piano, InstrumentKind::Pluck];

    pub fn name(self) -> &'static str {
        match self {
            InstrumentKind::Synth => "synth",
            InstrumentKind::Piano => "piano",
            InstrumentKind::Pluck => "pluck",
        }
    }

    pub fn next(self) -> Self {
        match self {
            InstrumentKind::Synth => InstrumentKind::Piano,
            InstrumentKind::Piano => InstrumentKind::Pluck,
            InstrumentKind::Pluck => InstrumentKind::Synth,
        }
    }

    /// Oscillator used when no override is given. Pluck has none.
    pub fn default_oscillator(self) -> Option<Oscillator> {
        match self {
            InstrumentKind::Synth => Some(Oscillator::FatSawtooth { count: 3, spread: 30.0 }),
            InstrumentKind::Piano => Some(Oscillator::FatSine {
                partials: &[1.0, 2.0, 1.0, 2.0, 0.5],
                spread: 60.0,
            }),
            InstrumentKind::Pluck => None,
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentKind {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstrumentKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SequencerError::UnknownInstrumentKind(s.to_string()))
    }
}

// spread is the detune between stacked oscillators, in cents
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Oscillator {
    FatSawtooth { count: u8, spread: f32 },
    FatSine { partials: &'static [f32], spread: f32 },
    Sine { partials: &'static [f32] },
    Square { width: f32 },
    FmTriangle { modulation_index: f32 },
    Pulse { width: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            sustain: DEFAULT_SUSTAIN,
            release: DEFAULT_RELEASE,
        }
    }
}

/// Per-mood tweaks layered over the instrument defaults. Anything left as
/// `None` comes from the knobs (attack, decay) or the fixed defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoiceSettings {
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
    pub oscillator: Option<Oscillator>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSpec {
    pub kind: InstrumentKind,
    pub oscillator: Option<Oscillator>,
    pub envelope: Envelope,
}

/// Handle to the instrument the engine is currently holding for us. Dropping
/// it tells the engine to free the instrument.
#[derive(Debug)]
pub struct LiveVoice {
    id: VoiceId,
    spec: VoiceSpec,
    tx: Sender<AudioCommand>,
}

impl LiveVoice {
    fn acquire(spec: VoiceSpec, tx: Sender<AudioCommand>) -> Self {
        let id = next_voice_id();
        send(&tx, AudioCommand::AcquireVoice { id, spec });
        Self { id, spec, tx }
    }

    #[cfg(test)]
    pub fn id(&self) -> VoiceId {
        self.id
    }

    #[cfg(test)]
    pub fn spec(&self) -> &VoiceSpec {
        &self.spec
    }

    pub fn trigger(&self, pitch: Pitch, duration: Duration) {
        send(&self.tx, AudioCommand::Trigger { id: self.id, pitch, duration });
    }

    fn set_envelope(&mut self, envelope: Envelope) {
        self.spec.envelope = envelope;
        send(&self.tx, AudioCommand::UpdateEnvelope { id: self.id, envelope });
    }
}

impl Drop for LiveVoice {
    fn drop(&mut self) {
        send(&self.tx, AudioCommand::ReleaseVoice(self.id));
    }
}

fn send(tx: &Sender<AudioCommand>, cmd: AudioCommand) {
    if let Err(e) = tx.try_send(cmd) {
        tracing::debug!("dropped audio command: {e}");
    }
}

/// Owner of the current voice plus the attack/decay knob values new voices
/// start from.
#[derive(Debug)]
pub struct VoiceConfig {
    tx: Sender<AudioCommand>,
    attack: f32,
    decay: f32,
    current: Option<LiveVoice>,
}

impl VoiceConfig {
    /// Starts with a plain synth voice.
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        let mut config = Self {
            tx,
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            current: None,
        };
        config.switch_instrument(InstrumentKind::Synth, &VoiceSettings::default());
        config
    }

    pub fn kind(&self) -> InstrumentKind {
        self.current.as_ref().map(|v| v.spec.kind).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&LiveVoice> {
        self.current.as_ref()
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn trigger(&self, pitch: Pitch, duration: Duration) {
        if let Some(voice) = &self.current {
            voice.trigger(pitch, duration);
        }
    }

    /// Replace the live voice with a fresh `kind` voice.
    pub fn switch_instrument(&mut self, kind: InstrumentKind, overrides: &VoiceSettings) {
        // release before acquire, never two instruments alive at once
        self.current = None;

        let envelope = Envelope {
            attack: overrides.attack.unwrap_or(self.attack),
            decay: overrides.decay.unwrap_or(self.decay),
            sustain: overrides.sustain.unwrap_or(DEFAULT_SUSTAIN),
            release: overrides.release.unwrap_or(DEFAULT_RELEASE),
        };
        let oscillator = match kind {
            InstrumentKind::Pluck => None,
            _ => overrides.oscillator.or(kind.default_oscillator()),
        };

        let spec = VoiceSpec { kind, oscillator, envelope };
        tracing::debug!(instrument = %kind, ?envelope, "voice switched");
        self.current = Some(LiveVoice::acquire(spec, self.tx.clone()));
    }

    /// Like `switch_instrument` but from a name. Unknown names leave the
    /// current voice untouched and report the error back.
    pub fn switch_instrument_named(&mut self, name: &str, overrides: &VoiceSettings) -> Result<(), SequencerError> {
        match name.parse::<InstrumentKind>() {
            Ok(kind) => {
                self.switch_instrument(kind, overrides);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{e}; keeping the {} voice", self.kind());
                Err(e)
            }
        }
    }

    pub fn set_attack(&mut self, attack: f32) {
        self.attack = attack.clamp(0.0, MAX_ENVELOPE_CONTROL);
        if let Some(voice) = &mut self.current {
            let envelope = Envelope { attack: self.attack, ..voice.spec.envelope };
            voice.set_envelope(envelope);
        }
    }

    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay.clamp(0.0, MAX_ENVELOPE_CONTROL);
        if let Some(voice) = &mut self.current {
            let envelope = Envelope { decay: self.decay, ..voice.spec.envelope };
            voice.set_envelope(envelope);
        }
    }
}
