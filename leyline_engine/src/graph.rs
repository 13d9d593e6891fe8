// The beacon graph — nodes, mirrored link edges, and per-node invariants.
//
// Beacons live in an arena (`BTreeMap` keyed by `BeaconId`) and reference
// each other only by id, so there are no ownership cycles and snapshots
// are a plain walk of the map. Link edges are kept twice:
// - in each endpoint's `links` list (the mirror invariant: `b` is in
//   `a`'s list iff `a` is in `b`'s list), and
// - as `LinkRecord`s in creation order, which is what the validator's
//   crossing scan and the snapshot's replay log iterate.
//
// This module is topology only. Legality of a new link is `validator.rs`,
// triangle closure is `triangle.rs`, and the cascade rules (which fields
// die when a beacon or link dies) are coordinated by `registry.rs`.
//
// **Critical constraint: determinism.** Beacons iterate in id order
// (BTreeMap), links in creation order. No hash-ordered iteration escapes
// this module.

use crate::types::{BeaconId, Position, TeamId};
use leyline_geom::Segment;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Errors for beacon lifecycle operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeaconError {
    /// The referenced beacon id does not exist.
    NotFound(BeaconId),
    /// A beacon already occupies the target column.
    DuplicatePosition(Position),
}

impl fmt::Display for BeaconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "beacon {id} does not exist"),
            Self::DuplicatePosition(pos) => {
                write!(f, "a beacon already occupies column ({}, {})", pos.x, pos.z)
            }
        }
    }
}

impl std::error::Error for BeaconError {}

/// A capturable node in the territory graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Beacon {
    pub id: BeaconId,
    pub position: Position,
    /// Owning team; `None` while unowned.
    pub owner: Option<TeamId>,
    /// Linked beacon ids, in link-creation order. Bounded by the
    /// configured link limit (8 by default), hence the inline capacity.
    pub links: SmallVec<[BeaconId; 8]>,
    /// Host metadata: whether the beacon is locked against capture.
    /// Carried and persisted, never interpreted here.
    pub locked: bool,
    /// Host metadata: count of defense/extension attachments. Carried
    /// and persisted, never interpreted here.
    pub defense_attachments: u32,
}

/// A committed mirrored link. `a < b` canonically; `team` is the common
/// owner of both endpoints at creation time, and `segment` their planar
/// geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub a: BeaconId,
    pub b: BeaconId,
    pub team: TeamId,
    pub segment: Segment,
}

/// The beacon arena plus the link edge set.
#[derive(Clone, Debug, Default)]
pub struct BeaconGraph {
    beacons: BTreeMap<BeaconId, Beacon>,
    /// Active links in creation order.
    links: Vec<LinkRecord>,
    next_id: u32,
}

impl BeaconGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a beacon and return its freshly assigned id. Column uniqueness
    /// is the registry's job (it owns the spatial index).
    pub fn insert(&mut self, position: Position, owner: Option<TeamId>) -> BeaconId {
        let id = BeaconId(self.next_id);
        self.next_id += 1;
        self.beacons.insert(
            id,
            Beacon {
                id,
                position,
                owner,
                links: SmallVec::new(),
                locked: false,
                defense_attachments: 0,
            },
        );
        id
    }

    /// Re-insert a beacon under its recorded id (snapshot restore).
    /// Returns `false` if the id is already taken.
    pub fn insert_recorded(&mut self, beacon: Beacon) -> bool {
        if self.beacons.contains_key(&beacon.id) {
            return false;
        }
        self.next_id = self.next_id.max(beacon.id.0 + 1);
        self.beacons.insert(beacon.id, beacon);
        true
    }

    /// Remove a beacon, severing every incident link on both sides.
    /// Returns the removed beacon and the links it took with it (the
    /// registry uses those to invalidate fields and trim the replay log).
    pub fn remove(&mut self, id: BeaconId) -> Result<(Beacon, Vec<LinkRecord>), BeaconError> {
        let beacon = self.beacons.remove(&id).ok_or(BeaconError::NotFound(id))?;
        for &other in &beacon.links {
            if let Some(b) = self.beacons.get_mut(&other) {
                b.links.retain(|&mut n| n != id);
            }
        }
        let mut severed = Vec::new();
        self.links.retain(|record| {
            if record.a == id || record.b == id {
                severed.push(*record);
                false
            } else {
                true
            }
        });
        Ok((beacon, severed))
    }

    pub fn beacon(&self, id: BeaconId) -> Option<&Beacon> {
        self.beacons.get(&id)
    }

    pub fn beacon_mut(&mut self, id: BeaconId) -> Option<&mut Beacon> {
        self.beacons.get_mut(&id)
    }

    /// Beacons in id order.
    pub fn beacons(&self) -> impl Iterator<Item = &Beacon> {
        self.beacons.values()
    }

    pub fn degree(&self, id: BeaconId) -> Option<usize> {
        self.beacons.get(&id).map(|b| b.links.len())
    }

    pub fn neighbors(&self, id: BeaconId) -> Option<&[BeaconId]> {
        self.beacons.get(&id).map(|b| b.links.as_slice())
    }

    pub fn has_link(&self, a: BeaconId, b: BeaconId) -> bool {
        self.beacons
            .get(&a)
            .is_some_and(|beacon| beacon.links.contains(&b))
    }

    /// Active links in creation order.
    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    /// Commit a validated link as a mirrored pair. Callers have already
    /// run the validator; this only records topology.
    pub fn add_link(&mut self, a: BeaconId, b: BeaconId, team: TeamId, segment: Segment) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if let Some(beacon) = self.beacons.get_mut(&a) {
            beacon.links.push(b);
        }
        if let Some(beacon) = self.beacons.get_mut(&b) {
            beacon.links.push(a);
        }
        self.links.push(LinkRecord {
            a: lo,
            b: hi,
            team,
            segment,
        });
    }

    /// Remove the mirrored pair between two beacons. Returns `false`
    /// (and changes nothing) if no such link exists.
    pub fn remove_link(&mut self, a: BeaconId, b: BeaconId) -> bool {
        if !self.has_link(a, b) {
            return false;
        }
        if let Some(beacon) = self.beacons.get_mut(&a) {
            beacon.links.retain(|&mut n| n != b);
        }
        if let Some(beacon) = self.beacons.get_mut(&b) {
            beacon.links.retain(|&mut n| n != a);
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.links.retain(|record| !(record.a == lo && record.b == hi));
        true
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }
}
