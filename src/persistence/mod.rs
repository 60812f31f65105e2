//! Snapshot save/load
//!
//! A running match can be frozen to JSON and resumed later. The snapshot
//! holds the complete `MatchState`, so ticking a restored match with the
//! same timesteps reproduces the uninterrupted run.
//!
//! Features:
//! - Versioned JSON envelope
//! - Version check on load

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::sim::MatchState;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a MatchState,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    state: MatchState,
}

/// Serialize a match to a JSON snapshot
pub fn save_snapshot(state: &MatchState) -> Result<String> {
    let json = serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        state,
    })?;
    log::debug!(
        "Saved snapshot at tick {} ({} bytes)",
        state.time_ticks(),
        json.len()
    );
    Ok(json)
}

/// Restore a match from a JSON snapshot
pub fn load_snapshot(json: &str) -> Result<MatchState> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(MatchError::invalid_state(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            envelope.version
        )));
    }
    envelope.state.settings().validate()?;
    log::info!("Loaded snapshot at tick {}", envelope.state.time_ticks());
    Ok(envelope.state)
}
