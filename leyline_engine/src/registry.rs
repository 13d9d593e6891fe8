// The registry — composition root and the only public mutation surface.
//
// `Registry` owns the beacon graph, the spatial index, and the coverage
// accounting, and keeps them consistent through every cascade:
// - removing a beacon severs its links and kills every field it anchors;
// - changing ownership eagerly kills the beacon's fields and prunes
//   links whose far endpoint no longer shares the owner;
// - committing a link runs validation, then triangle detection, then
//   field registration, all inside one critical section.
//
// Mutations are all-or-nothing: validation happens before any state is
// touched, and field registration is internally two-phase, so a caller
// never observes a half-applied operation.
//
// Concurrency follows a single-writer / many-reader discipline. The
// whole engine state sits behind one `RwLock`: per-tick queries
// (`fields_at`, `area_of`, `nearby`, ...) share the read lock and only
// serialize against the rare mutation, never against each other. Nothing
// in here blocks on I/O or timers — every call is synchronous and
// CPU-bound. A poisoned lock is recovered with `PoisonError::into_inner`
// so a panicking host thread cannot wedge the engine.

use crate::config::EngineConfig;
use crate::coverage::{TerritoryCoverage, TriangleField};
use crate::graph::{Beacon, BeaconError, BeaconGraph};
use crate::spatial::SpatialIndex;
use crate::triangle::{closing_candidates, vertex_key};
use crate::types::{BeaconId, LinkResult, Position, TeamId};
use crate::validator::{LinkError, validate_link};
use leyline_geom::{GridPoint, Triangle};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Everything behind the lock. Field-level splitting matters: the link
/// path borrows the graph and spatial index immutably while mutating
/// coverage.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub graph: BeaconGraph,
    pub spatial: SpatialIndex,
    pub coverage: TerritoryCoverage,
    /// Committed links in creation order — the replay log the snapshot
    /// persists. Entries leave when their link does.
    pub link_log: Vec<(BeaconId, BeaconId)>,
}

/// The territory engine façade consumed by the host's event layer.
#[derive(Debug)]
pub struct Registry {
    config: EngineConfig,
    state: RwLock<EngineState>,
}

impl Registry {
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState {
            graph: BeaconGraph::new(),
            spatial: SpatialIndex::new(config.spatial_bucket_size),
            coverage: TerritoryCoverage::new(),
            link_log: Vec::new(),
        };
        Self {
            config,
            state: RwLock::new(state),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Beacon lifecycle
    // -----------------------------------------------------------------

    /// Create a beacon at a capture event. Fails if the column is taken.
    pub fn add_beacon(
        &self,
        position: Position,
        owner: Option<TeamId>,
    ) -> Result<BeaconId, BeaconError> {
        let mut state = self.write();
        let column = position.column();
        if state.spatial.at(column).is_some() {
            return Err(BeaconError::DuplicatePosition(position));
        }
        let id = state.graph.insert(position, owner);
        state.spatial.insert(column, id);
        Ok(id)
    }

    /// Destroy a beacon. Cascades: every incident link is severed and
    /// every field anchored on this beacon is unregistered.
    pub fn remove_beacon(&self, id: BeaconId) -> Result<(), BeaconError> {
        let mut state = self.write();
        if state.graph.beacon(id).is_none() {
            return Err(BeaconError::NotFound(id));
        }
        state.coverage.remove_fields_with_beacon(id);
        let (beacon, _severed) = state.graph.remove(id)?;
        state.spatial.remove(beacon.position.column());
        state.link_log.retain(|&(a, b)| a != id && b != id);
        Ok(())
    }

    /// Change (or clear) a beacon's owner. On any change, fields
    /// anchored on the beacon are invalidated immediately, and links to
    /// beacons that do not share the new owner are severed — a captured
    /// beacon never retains cross-team topology.
    pub fn set_owner(&self, id: BeaconId, owner: Option<TeamId>) -> Result<(), BeaconError> {
        let mut state = self.write();
        let beacon = state.graph.beacon(id).ok_or(BeaconError::NotFound(id))?;
        if beacon.owner == owner {
            return Ok(());
        }
        let neighbors: Vec<BeaconId> = beacon.links.to_vec();

        state.coverage.remove_fields_with_beacon(id);
        if let Some(beacon) = state.graph.beacon_mut(id) {
            beacon.owner = owner;
        }
        for other in neighbors {
            let keep = owner.is_some()
                && state.graph.beacon(other).is_some_and(|b| b.owner == owner);
            if !keep {
                state.graph.remove_link(id, other);
                state
                    .link_log
                    .retain(|&(a, b)| !((a == id && b == other) || (a == other && b == id)));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Linking
    // -----------------------------------------------------------------

    /// Attempt a link between two beacons on behalf of `team`.
    ///
    /// On success the mirrored edge is committed and every triangle the
    /// new edge closes is offered to coverage, one candidate at a time
    /// in ascending third-vertex order; candidates that collide with
    /// enemy territory only bump `fields_failed`. On `Err` the graph is
    /// untouched.
    pub fn link(&self, team: TeamId, a: BeaconId, b: BeaconId) -> Result<LinkResult, LinkError> {
        let mut state = self.write();
        let state = &mut *state;

        let segment = validate_link(&state.graph, &self.config, team, a, b)?;
        state.graph.add_link(a, b, team, segment);
        state.link_log.push((a, b));

        let candidates = closing_candidates(&state.graph, a, b, team);
        let mut fields_made = 0;
        let mut fields_failed = 0;

        let EngineState {
            graph,
            spatial,
            coverage,
            ..
        } = state;
        for c in candidates {
            let key = vertex_key(a, b, c);
            if coverage.contains_vertices(key) {
                continue;
            }
            let polygon = match (graph.beacon(key[0]), graph.beacon(key[1]), graph.beacon(key[2])) {
                (Some(x), Some(y), Some(z)) => Triangle::new(
                    x.position.column(),
                    y.position.column(),
                    z.position.column(),
                ),
                _ => continue,
            };
            let registered = coverage.register_field(team, key, polygon, |col| {
                spatial.at(col).is_some_and(|occupant| {
                    graph
                        .beacon(occupant)
                        .is_some_and(|b| b.owner.is_some_and(|t| t != team))
                })
            });
            if registered.is_some() {
                fields_made += 1;
            } else {
                fields_failed += 1;
            }
        }

        Ok(LinkResult {
            fields_made,
            fields_failed,
            segment,
        })
    }

    /// Remove the mirrored link between two beacons, invalidating any
    /// field built on that edge. Absent links (including links to
    /// since-destroyed beacons) are a silent no-op.
    pub fn unlink(&self, a: BeaconId, b: BeaconId) {
        let mut state = self.write();
        if !state.graph.has_link(a, b) {
            return;
        }
        state.coverage.remove_fields_with_edge(a, b);
        state.graph.remove_link(a, b);
        state
            .link_log
            .retain(|&(x, y)| !((x == a && y == b) || (x == b && y == a)));
    }

    // -----------------------------------------------------------------
    // Queries — shared read lock, safe to hammer from movement ticks
    // -----------------------------------------------------------------

    /// The beacon occupying a column, if any.
    pub fn at(&self, x: i32, z: i32) -> Option<BeaconId> {
        self.read().spatial.at(GridPoint::new(x, z))
    }

    /// Beacons within `radius` blocks of a column, sorted by id.
    pub fn nearby(&self, x: i32, z: i32, radius: u32) -> Vec<BeaconId> {
        self.read().spatial.nearby(GridPoint::new(x, z), radius)
    }

    /// All fields covering a column, newest first. The head's owner is
    /// the friend-or-foe answer; the length is the stack depth.
    pub fn fields_at(&self, x: i32, z: i32) -> Vec<TriangleField> {
        self.read()
            .coverage
            .fields_at(GridPoint::new(x, z))
            .into_iter()
            .copied()
            .collect()
    }

    /// How many of `team`'s fields cover a column.
    pub fn stack_count(&self, team: TeamId, x: i32, z: i32) -> u32 {
        self.read().coverage.stack_count(team, GridPoint::new(x, z))
    }

    /// The team's scored area in columns, deduplicated across overlaps.
    pub fn area_of(&self, team: TeamId) -> u64 {
        self.read().coverage.area_of(team)
    }

    /// All active fields in creation order.
    pub fn fields(&self) -> Vec<TriangleField> {
        self.read().coverage.fields().copied().collect()
    }

    pub fn neighbors(&self, id: BeaconId) -> Result<Vec<BeaconId>, BeaconError> {
        self.read()
            .graph
            .neighbors(id)
            .map(<[BeaconId]>::to_vec)
            .ok_or(BeaconError::NotFound(id))
    }

    pub fn degree(&self, id: BeaconId) -> Result<usize, BeaconError> {
        self.read().graph.degree(id).ok_or(BeaconError::NotFound(id))
    }

    pub fn owner(&self, id: BeaconId) -> Result<Option<TeamId>, BeaconError> {
        self.read()
            .graph
            .beacon(id)
            .map(|b| b.owner)
            .ok_or(BeaconError::NotFound(id))
    }

    /// Full beacon record (cloned out of the lock).
    pub fn beacon(&self, id: BeaconId) -> Result<Beacon, BeaconError> {
        self.read()
            .graph
            .beacon(id)
            .cloned()
            .ok_or(BeaconError::NotFound(id))
    }

    pub fn beacon_count(&self) -> usize {
        self.read().graph.len()
    }

    // -----------------------------------------------------------------
    // Host metadata pass-through
    // -----------------------------------------------------------------

    pub fn set_locked(&self, id: BeaconId, locked: bool) -> Result<(), BeaconError> {
        let mut state = self.write();
        let beacon = state.graph.beacon_mut(id).ok_or(BeaconError::NotFound(id))?;
        beacon.locked = locked;
        Ok(())
    }

    pub fn is_locked(&self, id: BeaconId) -> Result<bool, BeaconError> {
        self.read()
            .graph
            .beacon(id)
            .map(|b| b.locked)
            .ok_or(BeaconError::NotFound(id))
    }

    pub fn set_defense_attachments(&self, id: BeaconId, count: u32) -> Result<(), BeaconError> {
        let mut state = self.write();
        let beacon = state.graph.beacon_mut(id).ok_or(BeaconError::NotFound(id))?;
        beacon.defense_attachments = count;
        Ok(())
    }

    pub fn defense_attachments(&self, id: BeaconId) -> Result<u32, BeaconError> {
        self.read()
            .graph
            .beacon(id)
            .map(|b| b.defense_attachments)
            .ok_or(BeaconError::NotFound(id))
    }
}
