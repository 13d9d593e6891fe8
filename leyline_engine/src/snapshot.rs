// Persistence surface — snapshot and restore.
//
// A `WorldSnapshot` stores the beacon list (id order) and the link log
// (creation order). Fields and coverage are deliberately *not* stored:
// restore rebuilds the beacons, then replays every link through the
// normal `link` pipeline in its recorded order. Because candidate
// processing is deterministic, the replay re-derives the exact same
// fields, stacks, areas — and the same failed-candidate outcomes — the
// live engine had.
//
// Each beacon entry also carries its neighbor list. Replay does not need
// it (the link log is authoritative), but hosts reading the save file
// get the full graph without walking the log themselves.
//
// JSON in and out via serde_json, matching the save/load convention of
// the host's other state files.

use crate::config::EngineConfig;
use crate::graph::Beacon;
use crate::registry::Registry;
use crate::types::{BeaconId, Position, TeamId};
use crate::validator::LinkError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// One beacon as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconSnapshot {
    pub id: BeaconId,
    pub position: Position,
    pub owner: Option<TeamId>,
    /// Neighbor ids at save time. Informational for hosts; replay
    /// reconstructs topology from the link log.
    pub links: Vec<BeaconId>,
    pub locked: bool,
    pub defense_attachments: u32,
}

/// A complete persisted engine state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Beacons in id order.
    pub beacons: Vec<BeaconSnapshot>,
    /// Links in the order they were created. Replaying them in this
    /// order reproduces every field and every failed candidate.
    pub links: Vec<(BeaconId, BeaconId)>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Why a snapshot failed to load.
#[derive(Debug)]
pub enum SnapshotError {
    /// Malformed JSON payload.
    Json(serde_json::Error),
    /// Two beacon entries share an id.
    DuplicateBeacon(BeaconId),
    /// Two beacon entries share a column.
    DuplicatePosition(Position),
    /// A logged link references a missing beacon or endpoints that do
    /// not share an owner.
    MismatchedLink(BeaconId, BeaconId),
    /// A logged link was rejected during replay — the snapshot is
    /// internally inconsistent.
    Replay(BeaconId, BeaconId, LinkError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot JSON error: {err}"),
            Self::DuplicateBeacon(id) => write!(f, "snapshot repeats beacon {id}"),
            Self::DuplicatePosition(pos) => {
                write!(f, "snapshot has two beacons at column ({}, {})", pos.x, pos.z)
            }
            Self::MismatchedLink(a, b) => {
                write!(f, "snapshot link {a}–{b} has missing or mismatched owners")
            }
            Self::Replay(a, b, reason) => {
                write!(f, "snapshot link {a}–{b} failed replay: {reason}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl Registry {
    /// Capture the persistable state: beacons in id order plus the link
    /// creation log.
    pub fn snapshot(&self) -> WorldSnapshot {
        let state = self.read();
        let beacons = state
            .graph
            .beacons()
            .map(|b| BeaconSnapshot {
                id: b.id,
                position: b.position,
                owner: b.owner,
                links: b.links.to_vec(),
                locked: b.locked,
                defense_attachments: b.defense_attachments,
            })
            .collect();
        WorldSnapshot {
            beacons,
            links: state.link_log.clone(),
        }
    }

    /// Rebuild an engine from a snapshot, replaying the link log through
    /// the normal pipeline so fields and coverage are re-derived rather
    /// than trusted from disk.
    pub fn restore(config: EngineConfig, snapshot: &WorldSnapshot) -> Result<Self, SnapshotError> {
        let registry = Registry::new(config);
        {
            let mut state = registry.write();
            for entry in &snapshot.beacons {
                let column = entry.position.column();
                if state.spatial.at(column).is_some() {
                    return Err(SnapshotError::DuplicatePosition(entry.position));
                }
                let beacon = Beacon {
                    id: entry.id,
                    position: entry.position,
                    owner: entry.owner,
                    links: SmallVec::new(),
                    locked: entry.locked,
                    defense_attachments: entry.defense_attachments,
                };
                if !state.graph.insert_recorded(beacon) {
                    return Err(SnapshotError::DuplicateBeacon(entry.id));
                }
                state.spatial.insert(column, entry.id);
            }
        }

        for &(a, b) in &snapshot.links {
            let team = {
                let state = registry.read();
                let (Some(ba), Some(bb)) = (state.graph.beacon(a), state.graph.beacon(b)) else {
                    return Err(SnapshotError::MismatchedLink(a, b));
                };
                match (ba.owner, bb.owner) {
                    (Some(t), Some(u)) if t == u => t,
                    _ => return Err(SnapshotError::MismatchedLink(a, b)),
                }
            };
            registry
                .link(team, a, b)
                .map_err(|reason| SnapshotError::Replay(a, b, reason))?;
        }

        Ok(registry)
    }
}
