// Spatial index over beacon columns.
//
// Two structures kept in lockstep:
// - `columns`: packed (x, z) -> BeaconId, giving O(1) occupancy lookup.
//   This is what enforces "one beacon per column" and answers the
//   enemy-beacon occupancy test during field registration.
// - `buckets`: a coarse grid of cells (`bucket_size` blocks on a side),
//   each holding the beacons whose columns fall inside it. `nearby`
//   gathers candidates from the cells overlapping the query circle and
//   applies an exact squared-distance filter, so it never scans the
//   whole beacon set.
//
// Uses `FxHashMap` because these maps are hot and their iteration order
// never reaches callers — `nearby` sorts its results by id before
// returning, keeping query output deterministic.

use crate::types::BeaconId;
use leyline_geom::GridPoint;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Pack a column into a single map key: x in the high 32 bits, z in the
/// low 32.
pub(crate) fn pack(p: GridPoint) -> u64 {
    (u64::from(p.x as u32) << 32) | u64::from(p.z as u32)
}

/// Index from world columns to beacons.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    columns: FxHashMap<u64, BeaconId>,
    buckets: FxHashMap<(i32, i32), SmallVec<[(BeaconId, GridPoint); 4]>>,
    bucket_size: i32,
}

impl SpatialIndex {
    pub fn new(bucket_size: u32) -> Self {
        Self {
            columns: FxHashMap::default(),
            buckets: FxHashMap::default(),
            bucket_size: bucket_size.max(1) as i32,
        }
    }

    fn bucket_of(&self, p: GridPoint) -> (i32, i32) {
        (p.x.div_euclid(self.bucket_size), p.z.div_euclid(self.bucket_size))
    }

    /// The beacon occupying a column, if any.
    pub fn at(&self, p: GridPoint) -> Option<BeaconId> {
        self.columns.get(&pack(p)).copied()
    }

    /// Register a beacon at a column. The caller (the registry) has
    /// already rejected duplicate positions.
    pub fn insert(&mut self, p: GridPoint, id: BeaconId) {
        self.columns.insert(pack(p), id);
        self.buckets.entry(self.bucket_of(p)).or_default().push((id, p));
    }

    /// Remove whatever beacon occupies a column. No-op for empty columns.
    pub fn remove(&mut self, p: GridPoint) {
        if self.columns.remove(&pack(p)).is_some() {
            let key = self.bucket_of(p);
            if let Some(cell) = self.buckets.get_mut(&key) {
                cell.retain(|&mut (_, pos)| pos != p);
                if cell.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    /// All beacons within `radius` blocks (planar Euclidean, inclusive)
    /// of a column, sorted by id.
    ///
    /// The squared radius of a full-range query exceeds i64, so the
    /// comparison is done in i128. When the query circle spans more grid
    /// cells than are occupied, the scan flips to the occupied cells
    /// directly — cost stays proportional to the beacon count, not the
    /// radius.
    pub fn nearby(&self, center: GridPoint, radius: u32) -> Vec<BeaconId> {
        let r = i64::from(radius);
        let r_sq = i128::from(r) * i128::from(r);
        let b = i64::from(self.bucket_size);
        let min_bx = (i64::from(center.x) - r).div_euclid(b);
        let max_bx = (i64::from(center.x) + r).div_euclid(b);
        let min_bz = (i64::from(center.z) - r).div_euclid(b);
        let max_bz = (i64::from(center.z) + r).div_euclid(b);
        let cells = (max_bx - min_bx + 1).saturating_mul(max_bz - min_bz + 1);

        let mut out = Vec::new();
        if cells > self.buckets.len() as i64 {
            for cell in self.buckets.values() {
                for &(id, pos) in cell {
                    if pos.distance_sq(center) <= r_sq {
                        out.push(id);
                    }
                }
            }
        } else {
            for bx in min_bx..=max_bx {
                for bz in min_bz..=max_bz {
                    let Some(cell) = self.buckets.get(&(bx as i32, bz as i32)) else {
                        continue;
                    };
                    for &(id, pos) in cell {
                        if pos.distance_sq(center) <= r_sq {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Number of indexed beacons.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
