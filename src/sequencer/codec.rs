// Share tokens: the melody record as compact JSON, then base64 with the
// URL-safe alphabet and no padding so it can sit in a query string as-is.
//
//   {"grid":[[0,1,...],...],"scale":"major","tempo":120,"instrument":"synth"}

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::SequencerError;
use crate::sequencer::scale::Scale;
use crate::sequencer::voice::InstrumentKind;
use crate::shared::{NUM_COLS, NUM_ROWS};

pub const SHARE_PARAM: &str = "melody";

/// Everything a share link carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MelodySnapshot {
    pub grid: [[bool; NUM_COLS]; NUM_ROWS],
    pub scale: Scale,
    pub tempo: u32,
    pub instrument: InstrumentKind,
}

// wire shape; field order here is the order in the JSON
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShareRecord {
    grid: Vec<Vec<u8>>,
    scale: String,
    tempo: u32,
    instrument: String,
}

pub fn encode(snapshot: &MelodySnapshot) -> String {
    let record = ShareRecord {
        grid: snapshot
            .grid
            .iter()
            .map(|row| row.iter().map(|&cell| cell as u8).collect())
            .collect(),
        scale: snapshot.scale.name().to_string(),
        tempo: snapshot.tempo,
        instrument: snapshot.instrument.name().to_string(),
    };
    // plain strings and integers only, serializing cannot fail
    let json = serde_json::to_string(&record).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode and fully validate a token. Nothing is applied anywhere; the caller
/// gets either a complete snapshot or an error.
pub fn decode(token: &str) -> Result<MelodySnapshot, SequencerError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| malformed(format!("not base64: {e}")))?;
    let record: ShareRecord =
        serde_json::from_slice(&bytes).map_err(|e| malformed(format!("bad record: {e}")))?;

    if record.grid.len() != NUM_ROWS || record.grid.iter().any(|row| row.len() != NUM_COLS) {
        return Err(malformed(format!("grid must be {NUM_ROWS}x{NUM_COLS}")));
    }
    let mut grid = [[false; NUM_COLS]; NUM_ROWS];
    for (dst_row, src_row) in grid.iter_mut().zip(&record.grid) {
        for (dst, &src) in dst_row.iter_mut().zip(src_row) {
            *dst = match src {
                0 => false,
                1 => true,
                other => return Err(malformed(format!("grid cell {other} is not 0 or 1"))),
            };
        }
    }

    let scale: Scale = record.scale.parse().map_err(|e: SequencerError| malformed(e.to_string()))?;
    let instrument: InstrumentKind =
        record.instrument.parse().map_err(|e: SequencerError| malformed(e.to_string()))?;
    if record.tempo == 0 {
        return Err(malformed("tempo must be positive".into()));
    }

    let snapshot = MelodySnapshot { grid, scale, tempo: record.tempo, instrument };

    // Only the exact bytes `encode` produces are accepted, so every valid token
    // re-encodes to itself.
    if encode(&snapshot) != token {
        return Err(malformed("token is not in canonical form".into()));
    }
    Ok(snapshot)
}

pub fn share_link(base: &str, token: &str) -> String {
    format!("{base}?{SHARE_PARAM}={token}")
}

/// Accepts a bare token or any link carrying `?melody=<token>`.
pub fn token_from_link(input: &str) -> Option<&str> {
    let input = input.trim();
    let Some((_, query)) = input.split_once('?') else {
        return (!input.is_empty()).then_some(input);
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn malformed(msg: String) -> SequencerError {
    SequencerError::MalformedShareToken(msg)
}
