// One monophonic instrument: oscillator (or plucked string) through an ADSR.
// A new trigger restarts the note, so whatever was sounding gets cut off.
// Everything lives in fixed-size arrays so building one never allocates.

use std::f32::consts::TAU;
use std::time::Duration;

use crate::sequencer::voice::{Envelope, Oscillator, VoiceSpec};

const MAX_UNISON: usize = 3; // stacked oscillators for the "fat" shapes
const PLUCK_BUFFER: usize = 4096; // lowest pluck note ~ sample_rate / 4096
const PLUCK_DAMPING: f32 = 0.996;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Clone, Copy, Debug)]
struct Adsr {
    stage: Stage,
    level: f32,
    release_step: f32,
    gate_samples: u64, // samples left before release kicks in
}

impl Adsr {
    fn idle() -> Self {
        Self { stage: Stage::Idle, level: 0.0, release_step: 0.0, gate_samples: 0 }
    }

    fn next(&mut self, env: &Envelope, sample_rate: f32) -> f32 {
        if self.stage != Stage::Idle && self.stage != Stage::Release {
            if self.gate_samples == 0 {
                self.stage = Stage::Release;
                self.release_step = self.level / (env.release * sample_rate).max(1.0);
            } else {
                self.gate_samples -= 1;
            }
        }

        match self.stage {
            Stage::Idle => {}
            Stage::Attack => {
                self.level += 1.0 / (env.attack * sample_rate).max(1.0);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                let sustain = env.sustain.clamp(0.0, 1.0);
                self.level -= (1.0 - sustain) / (env.decay * sample_rate).max(1.0);
                if self.level <= sustain {
                    self.level = sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => self.level = env.sustain.clamp(0.0, 1.0),
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }
}

pub struct MonoSynth {
    spec: VoiceSpec,
    sample_rate: f32,
    freq: f32,
    phases: [f32; MAX_UNISON],
    mod_phase: f32,
    adsr: Adsr,
    string: [f32; PLUCK_BUFFER],
    string_len: usize,
    string_pos: usize,
    noise: u32,
}

impl MonoSynth {
    pub fn new(spec: VoiceSpec, sample_rate: f32) -> Self {
        Self {
            spec,
            sample_rate,
            freq: 0.0,
            phases: [0.0; MAX_UNISON],
            mod_phase: 0.0,
            adsr: Adsr::idle(),
            string: [0.0; PLUCK_BUFFER],
            string_len: 1,
            string_pos: 0,
            noise: 0x9E37_79B9,
        }
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.spec.envelope = envelope;
    }

    pub fn is_sounding(&self) -> bool {
        self.adsr.stage != Stage::Idle
    }

    pub fn note_on(&mut self, freq: f32, duration: Duration) {
        self.freq = freq;
        self.adsr.stage = Stage::Attack;
        self.adsr.gate_samples = (duration.as_secs_f32() * self.sample_rate) as u64;

        if self.spec.oscillator.is_none() {
            // excite the string with a burst of noise
            self.string_len = ((self.sample_rate / freq.max(1.0)) as usize).clamp(2, PLUCK_BUFFER);
            self.string_pos = 0;
            for i in 0..self.string_len {
                let n = self.next_noise();
                self.string[i] = n;
            }
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.is_sounding() {
            return 0.0;
        }
        let level = self.adsr.next(&self.spec.envelope, self.sample_rate);
        let raw = match self.spec.oscillator {
            Some(osc) => self.oscillate(osc),
            None => self.pluck(),
        };
        raw * level
    }

    fn oscillate(&mut self, osc: Oscillator) -> f32 {
        let (voices, spread) = match osc {
            Oscillator::FatSawtooth { count, spread } => ((count as usize).clamp(1, MAX_UNISON), spread),
            Oscillator::FatSine { spread, .. } => (MAX_UNISON, spread),
            _ => (1, 0.0),
        };

        let mut out = 0.0;
        for v in 0..voices {
            // detune evenly across [-spread/2, spread/2] cents
            let cents = if voices > 1 {
                spread * (v as f32 / (voices - 1) as f32 - 0.5)
            } else {
                0.0
            };
            let freq = self.freq * 2.0_f32.powf(cents / 1200.0);
            let p = self.phases[v];
            out += shape(osc, p, self.mod_phase);
            self.phases[v] = (p + freq / self.sample_rate).fract();
        }
        self.mod_phase = (self.mod_phase + self.freq / self.sample_rate).fract();
        out / voices as f32
    }

    fn pluck(&mut self) -> f32 {
        let len = self.string_len;
        let pos = self.string_pos;
        let out = self.string[pos];
        let next = self.string[(pos + 1) % len];
        self.string[pos] = 0.5 * (out + next) * PLUCK_DAMPING;
        self.string_pos = (pos + 1) % len;
        out
    }

    // xorshift32, plenty for a noise burst
    fn next_noise(&mut self) -> f32 {
        let mut x = self.noise;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

// one cycle of the waveform at phase p in [0, 1)
fn shape(osc: Oscillator, p: f32, mod_phase: f32) -> f32 {
    match osc {
        Oscillator::FatSawtooth { .. } => 2.0 * p - 1.0,
        Oscillator::FatSine { partials, .. } | Oscillator::Sine { partials } => additive(partials, p),
        Oscillator::Square { width } | Oscillator::Pulse { width } => {
            if p < width.clamp(0.01, 0.99) { 1.0 } else { -1.0 }
        }
        Oscillator::FmTriangle { modulation_index } => {
            let offset = modulation_index * (TAU * mod_phase).sin() / TAU;
            triangle((p + offset).rem_euclid(1.0))
        }
    }
}

fn additive(partials: &[f32], p: f32) -> f32 {
    let total: f32 = partials.iter().map(|a| a.abs()).sum();
    if total == 0.0 {
        return (TAU * p).sin();
    }
    let sum: f32 = partials
        .iter()
        .enumerate()
        .map(|(k, a)| a * (TAU * (k + 1) as f32 * p).sin())
        .sum();
    sum / total
}

fn triangle(p: f32) -> f32 {
    1.0 - 4.0 * (p - 0.5).abs()
}
