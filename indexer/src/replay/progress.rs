//! Replay progress counters (spec §5: "atomic integers"), published over a
//! `watch` channel so `/api/rebuild-status` can read the in-flight phase
//! without blocking on the rebuild itself.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPhase {
    #[default]
    Idle,
    Metadata,
    Scan,
    Replay,
    Done,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ReplayProgress {
    pub phase: ReplayPhase,
    pub conditions_loaded: usize,
    pub events_scanned: usize,
    pub users_total: usize,
    pub users_done: usize,
    pub built_through_block: i64,
}
