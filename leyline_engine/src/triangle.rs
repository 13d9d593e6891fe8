// Triangle detection — finding the 3-cycles a new link closes.
//
// A triangle field can only appear at the moment a link commits: the new
// edge `a–b` closes one 3-cycle for every beacon `c` that was already
// linked to both `a` and `b`. So detection is just the intersection of
// the two endpoints' neighbor sets, filtered to the linking team.
//
// Candidates are returned in ascending id order. That order is load
// bearing: the registry registers candidates one at a time, each
// evaluated against coverage as of its own turn, so an earlier candidate
// can claim columns that block a later one in the same call. A fixed
// order keeps that outcome — and the replayed snapshot — deterministic.

use crate::graph::BeaconGraph;
use crate::types::{BeaconId, TeamId};
use smallvec::SmallVec;

/// Beacons that complete a triangle with the just-committed link `a–b`,
/// owned by `team`, ascending by id. Excludes `a` and `b` themselves.
pub fn closing_candidates(
    graph: &BeaconGraph,
    a: BeaconId,
    b: BeaconId,
    team: TeamId,
) -> SmallVec<[BeaconId; 8]> {
    let mut out: SmallVec<[BeaconId; 8]> = SmallVec::new();
    let (Some(na), Some(nb)) = (graph.neighbors(a), graph.neighbors(b)) else {
        return out;
    };
    for &c in na {
        if c == a || c == b || !nb.contains(&c) {
            continue;
        }
        let owned = graph.beacon(c).is_some_and(|beacon| beacon.owner == Some(team));
        if owned {
            out.push(c);
        }
    }
    out.sort_unstable();
    out
}

/// The identity of a triangle: its vertex set in ascending order.
pub fn vertex_key(a: BeaconId, b: BeaconId, c: BeaconId) -> [BeaconId; 3] {
    let mut key = [a, b, c];
    key.sort_unstable();
    key
}
