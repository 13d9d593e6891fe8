// Core types shared across the territory engine.
//
// Defines beacon positions, compact entity identifiers, the opaque team
// handle, and the result struct returned by a successful link. All types
// derive `Serialize` and `Deserialize` for save/load and host-side state
// transfer.
//
// IDs are sequential integers assigned by the engine in creation order,
// never reused within one engine instance. Beacons reference each other
// only through `BeaconId` — the graph is an arena, with no owning
// references between nodes.

use leyline_geom::{GridPoint, Segment};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact identifier for a beacon node in the territory graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeaconId(pub u32);

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeaconId({})", self.0)
    }
}

/// Compact identifier for an active triangle field. Assigned in creation
/// order, so larger ids are newer fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

/// Opaque team handle. The engine only ever compares teams for equality;
/// what a team *is* (name, color, roster) lives entirely in the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TeamId({})", self.0)
    }
}

/// A beacon's position in the voxel world.
///
/// The (x, z) column is the beacon's unique planar key — all graph and
/// field geometry happens on that plane. `y` is the structural height of
/// the beacon block; the engine carries it for the host but never
/// interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The planar column this position occupies.
    pub const fn column(self) -> GridPoint {
        GridPoint::new(self.x, self.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Outcome of a successfully committed link.
///
/// The link itself succeeded (failure is the `Err` arm of
/// `Registry::link`); these fields report what the new edge closed:
/// how many triangle fields it created, and how many candidate triangles
/// were rejected for conflicting with enemy territory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    pub fields_made: u32,
    pub fields_failed: u32,
    /// The committed link as a planar segment, for host-side rendering.
    pub segment: Segment,
}
