// Territory coverage — per-team field sets, column stacks, and scored area.
//
// Coverage is column accounting, not polygon bookkeeping: every active
// field contributes its rasterized columns to its team's per-column
// stack counters, and a team's scored area is the number of columns with
// a stack of at least one. Overlapping friendly fields therefore count
// each shared column once, never twice — area moves only on 0→1 and 1→0
// transitions.
//
// Registration is two-phase and atomic. Phase one scans the candidate
// triangle's columns (bounded by its own bounding box) for conflicts:
// a column already covered by another team, or occupied by an
// enemy-owned beacon. Any conflict aborts with no state change. Phase
// two commits counters, the cached area delta, and the field record.
//
// Counter maps are `FxHashMap` — hot, and never iterated for results.
// The field registry is a `BTreeMap` keyed by creation-ordered
// `FieldId`, so `fields_at` answers newest-first by walking it in
// reverse.

use crate::spatial::pack;
use crate::types::{BeaconId, FieldId, TeamId};
use leyline_geom::{GridPoint, Triangle};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An active triangular field: three pairwise-linked beacons of one team
/// and the polygon on their columns. Immutable once created; only ever
/// deleted, never merged, split, or re-shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleField {
    pub id: FieldId,
    pub team: TeamId,
    /// Vertex beacon ids in ascending order — the field's identity for
    /// duplicate detection.
    pub vertices: [BeaconId; 3],
    pub polygon: Triangle,
}

impl TriangleField {
    /// Whether this field has `id` as one of its three vertices.
    pub fn has_vertex(&self, id: BeaconId) -> bool {
        self.vertices.contains(&id)
    }

    /// Whether this field uses the edge between two beacons.
    pub fn has_edge(&self, a: BeaconId, b: BeaconId) -> bool {
        a != b && self.has_vertex(a) && self.has_vertex(b)
    }
}

/// Per-team coverage accounting over all active fields.
#[derive(Clone, Debug, Default)]
pub struct TerritoryCoverage {
    fields: BTreeMap<FieldId, TriangleField>,
    /// team -> packed column -> number of that team's fields covering it.
    /// Entries are removed when they reach zero.
    stacks: FxHashMap<TeamId, FxHashMap<u64, u32>>,
    /// team -> cached count of columns with stack >= 1.
    areas: FxHashMap<TeamId, u64>,
    next_field_id: u64,
}

impl TerritoryCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an active field already has exactly this vertex set
    /// (ascending order, as produced by `triangle::vertex_key`).
    pub fn contains_vertices(&self, vertices: [BeaconId; 3]) -> bool {
        self.fields.values().any(|f| f.vertices == vertices)
    }

    /// Attempt to register a new field. Returns the new field's id, or
    /// `None` if any covered column conflicts with enemy territory —
    /// either a column another team's field covers, or one reported by
    /// `enemy_beacon_at` (the registry passes the spatial-index
    /// occupancy test). On `None`, nothing changed.
    pub fn register_field(
        &mut self,
        team: TeamId,
        vertices: [BeaconId; 3],
        polygon: Triangle,
        enemy_beacon_at: impl Fn(GridPoint) -> bool,
    ) -> Option<FieldId> {
        let columns = polygon.columns();

        for &col in &columns {
            if self.covered_by_other_team(team, col) || enemy_beacon_at(col) {
                return None;
            }
        }

        let counters = self.stacks.entry(team).or_default();
        let mut newly_covered = 0u64;
        for &col in &columns {
            let count = counters.entry(pack(col)).or_insert(0);
            if *count == 0 {
                newly_covered += 1;
            }
            *count += 1;
        }
        *self.areas.entry(team).or_insert(0) += newly_covered;

        let id = FieldId(self.next_field_id);
        self.next_field_id += 1;
        self.fields.insert(
            id,
            TriangleField {
                id,
                team,
                vertices,
                polygon,
            },
        );
        Some(id)
    }

    /// Remove a field, releasing its columns. Area drops by the columns
    /// whose stack count returns to zero. Returns the removed field, or
    /// `None` if the id is not active.
    pub fn unregister_field(&mut self, id: FieldId) -> Option<TriangleField> {
        let field = self.fields.remove(&id)?;
        let counters = self.stacks.entry(field.team).or_default();
        let mut released = 0u64;
        for col in field.polygon.columns() {
            let key = pack(col);
            if let Some(count) = counters.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    counters.remove(&key);
                    released += 1;
                }
            }
        }
        if let Some(area) = self.areas.get_mut(&field.team) {
            *area -= released.min(*area);
        }
        Some(field)
    }

    /// Remove every field that has `beacon` as a vertex. Returns the
    /// removed fields. Used by the destruction and capture cascades.
    pub fn remove_fields_with_beacon(&mut self, beacon: BeaconId) -> Vec<TriangleField> {
        let doomed: Vec<FieldId> = self
            .fields
            .values()
            .filter(|f| f.has_vertex(beacon))
            .map(|f| f.id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.unregister_field(id))
            .collect()
    }

    /// Remove every field that uses the edge `a–b`. Returns the removed
    /// fields. Used by the unlink cascade.
    pub fn remove_fields_with_edge(&mut self, a: BeaconId, b: BeaconId) -> Vec<TriangleField> {
        let doomed: Vec<FieldId> = self
            .fields
            .values()
            .filter(|f| f.has_edge(a, b))
            .map(|f| f.id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.unregister_field(id))
            .collect()
    }

    /// All fields (any team) covering a column, newest first. The host's
    /// movement effects read the head for friend-or-foe and the length
    /// for stack depth.
    pub fn fields_at(&self, col: GridPoint) -> Vec<&TriangleField> {
        self.fields
            .values()
            .rev()
            .filter(|f| f.polygon.covers(col))
            .collect()
    }

    /// How many of `team`'s fields cover a column. O(1).
    pub fn stack_count(&self, team: TeamId, col: GridPoint) -> u32 {
        self.stacks
            .get(&team)
            .and_then(|counters| counters.get(&pack(col)))
            .copied()
            .unwrap_or(0)
    }

    /// The team's scored area: deduplicated covered columns. O(1).
    pub fn area_of(&self, team: TeamId) -> u64 {
        self.areas.get(&team).copied().unwrap_or(0)
    }

    pub fn field(&self, id: FieldId) -> Option<&TriangleField> {
        self.fields.get(&id)
    }

    /// Active fields in creation order.
    pub fn fields(&self) -> impl Iterator<Item = &TriangleField> {
        self.fields.values()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn covered_by_other_team(&self, team: TeamId, col: GridPoint) -> bool {
        let key = pack(col);
        self.stacks
            .iter()
            .any(|(t, counters)| *t != team && counters.contains_key(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: TeamId = TeamId(1);
    const BLUE: TeamId = TeamId(2);

    fn tri(ax: i32, az: i32, bx: i32, bz: i32, cx: i32, cz: i32) -> Triangle {
        Triangle::new(
            GridPoint::new(ax, az),
            GridPoint::new(bx, bz),
            GridPoint::new(cx, cz),
        )
    }

    fn verts(a: u32, b: u32, c: u32) -> [BeaconId; 3] {
        [BeaconId(a), BeaconId(b), BeaconId(c)]
    }

    fn no_beacons(_: GridPoint) -> bool {
        false
    }

    #[test]
    fn register_scores_rasterized_area() {
        let mut cov = TerritoryCoverage::new();
        let polygon = tri(0, 0, 10, 0, 0, 10);
        let expected = polygon.columns().len() as u64;
        let id = cov
            .register_field(RED, verts(0, 1, 2), polygon, no_beacons)
            .unwrap();
        assert_eq!(cov.area_of(RED), expected);
        assert_eq!(cov.field(id).unwrap().team, RED);
    }

    #[test]
    fn overlapping_friendly_fields_deduplicate_area() {
        let mut cov = TerritoryCoverage::new();
        let a = tri(0, 0, 10, 0, 0, 10);
        let b = tri(0, 0, 10, 0, 10, 10);
        cov.register_field(RED, verts(0, 1, 2), a, no_beacons).unwrap();
        let area_one = cov.area_of(RED);
        cov.register_field(RED, verts(1, 2, 3), b, no_beacons).unwrap();

        let union: std::collections::BTreeSet<_> =
            a.columns().into_iter().chain(b.columns()).collect();
        assert_eq!(cov.area_of(RED), union.len() as u64);
        assert!(cov.area_of(RED) < area_one + b.columns().len() as u64);

        // A column under both fields stacks to 2 but scores once.
        let shared = a
            .columns()
            .into_iter()
            .find(|&c| b.covers(c))
            .expect("triangles overlap");
        assert_eq!(cov.stack_count(RED, shared), 2);
    }

    #[test]
    fn enemy_covered_column_blocks_registration() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(BLUE, verts(10, 11, 12), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        let blue_area = cov.area_of(BLUE);

        // Overlapping red triangle must be rejected with no side effects.
        let rejected = cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 10, 10), no_beacons);
        assert_eq!(rejected, None);
        assert_eq!(cov.area_of(RED), 0);
        assert_eq!(cov.area_of(BLUE), blue_area);
        assert_eq!(cov.field_count(), 1);
    }

    #[test]
    fn enemy_beacon_column_blocks_registration() {
        let mut cov = TerritoryCoverage::new();
        let enemy_column = GridPoint::new(3, 3);
        let rejected = cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), |c| {
            c == enemy_column
        });
        assert_eq!(rejected, None);
        assert_eq!(cov.area_of(RED), 0);
    }

    #[test]
    fn disjoint_enemy_fields_coexist() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(BLUE, verts(10, 11, 12), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        cov.register_field(RED, verts(0, 1, 2), tri(100, 100, 110, 100, 100, 110), no_beacons)
            .unwrap();
        assert_eq!(cov.field_count(), 2);
        assert!(cov.area_of(RED) > 0);
        assert!(cov.area_of(BLUE) > 0);
    }

    #[test]
    fn unregister_releases_only_unshared_columns() {
        let mut cov = TerritoryCoverage::new();
        let a = tri(0, 0, 10, 0, 0, 10);
        let b = tri(0, 0, 10, 0, 10, 10);
        let id_a = cov.register_field(RED, verts(0, 1, 2), a, no_beacons).unwrap();
        cov.register_field(RED, verts(1, 2, 3), b, no_beacons).unwrap();

        cov.unregister_field(id_a);
        assert_eq!(cov.area_of(RED), b.columns().len() as u64);

        // Shared columns survive with a stack of 1.
        let shared = a.columns().into_iter().find(|&c| b.covers(c)).unwrap();
        assert_eq!(cov.stack_count(RED, shared), 1);
    }

    #[test]
    fn unregister_missing_field_is_none() {
        let mut cov = TerritoryCoverage::new();
        assert!(cov.unregister_field(FieldId(9)).is_none());
    }

    #[test]
    fn fields_at_orders_newest_first() {
        let mut cov = TerritoryCoverage::new();
        let first = cov
            .register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        let second = cov
            .register_field(RED, verts(1, 2, 3), tri(0, 0, 10, 0, 10, 10), no_beacons)
            .unwrap();

        let shared = cov
            .field(first)
            .unwrap()
            .polygon
            .columns()
            .into_iter()
            .find(|&c| cov.field(second).unwrap().polygon.covers(c))
            .unwrap();
        let stack: Vec<FieldId> = cov.fields_at(shared).iter().map(|f| f.id).collect();
        assert_eq!(stack, vec![second, first]);
    }

    #[test]
    fn fields_at_empty_column() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        assert!(cov.fields_at(GridPoint::new(500, 500)).is_empty());
    }

    #[test]
    fn remove_fields_with_beacon_cascades() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        cov.register_field(RED, verts(1, 2, 3), tri(0, 0, 10, 0, 10, 10), no_beacons)
            .unwrap();
        cov.register_field(RED, verts(4, 5, 6), tri(50, 50, 60, 50, 50, 60), no_beacons)
            .unwrap();

        let removed = cov.remove_fields_with_beacon(BeaconId(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(cov.field_count(), 1);
        assert_eq!(
            cov.area_of(RED),
            tri(50, 50, 60, 50, 50, 60).columns().len() as u64
        );
    }

    #[test]
    fn remove_fields_with_edge_spares_other_edges() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        cov.register_field(RED, verts(0, 2, 3), tri(0, 0, 0, 10, -10, 10), no_beacons)
            .unwrap();

        // Edge 0–1 only appears in the first field.
        let removed = cov.remove_fields_with_edge(BeaconId(0), BeaconId(1));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].vertices, verts(0, 1, 2));
        assert_eq!(cov.field_count(), 1);
    }

    #[test]
    fn duplicate_vertex_set_is_detectable() {
        let mut cov = TerritoryCoverage::new();
        cov.register_field(RED, verts(0, 1, 2), tri(0, 0, 10, 0, 0, 10), no_beacons)
            .unwrap();
        assert!(cov.contains_vertices(verts(0, 1, 2)));
        assert!(!cov.contains_vertices(verts(0, 1, 3)));
    }

    #[test]
    fn degenerate_field_registers_with_zero_area() {
        // Three collinear beacons form a legal cycle with no interior.
        let mut cov = TerritoryCoverage::new();
        let id = cov
            .register_field(RED, verts(0, 1, 2), tri(0, 0, 5, 0, 10, 0), no_beacons)
            .unwrap();
        assert_eq!(cov.area_of(RED), 0);
        assert!(cov.field(id).is_some());
    }
}
