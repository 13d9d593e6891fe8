// Link validation — the pure legality check for a proposed link.
//
// `validate_link` inspects the graph read-only and either returns the
// planar segment the link would occupy or the first failed check, in
// this fixed order:
//   1. self-link
//   2. endpoint existence and ownership by the requesting team
//   3. link limit on either endpoint
//   4. duplicate link
//   5. distance cap (only when configured)
//   6. crossing against any enemy-owned link
//
// The crossing test is the numerical contract of this module: exact
// integer orientation tests from `leyline_geom`, never floating-point
// thresholds, so near-parallel and near-endpoint configurations are
// decided identically on every platform. Links that merely touch at a
// shared beacon do not cross.

use crate::config::EngineConfig;
use crate::graph::BeaconGraph;
use crate::types::{BeaconId, TeamId};
use leyline_geom::{Segment, segments_properly_cross};
use std::fmt;

/// Reasons a proposed link is rejected. The graph is never mutated on
/// rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// Both endpoints are the same beacon.
    SelfLink,
    /// An endpoint is missing or not owned by the requesting team.
    NotOwned,
    /// An endpoint already carries the configured maximum number of links.
    LinkLimitReached,
    /// The two beacons are already linked.
    DuplicateLink,
    /// The planar span exceeds the configured distance cap.
    LinkTooLong,
    /// The segment would properly cross a link owned by another team.
    CrossesEnemyLink,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::SelfLink => "a beacon cannot link to itself",
            Self::NotOwned => "both beacons must exist and belong to the requesting team",
            Self::LinkLimitReached => "beacon link limit reached",
            Self::DuplicateLink => "these beacons are already linked",
            Self::LinkTooLong => "link exceeds the configured maximum distance",
            Self::CrossesEnemyLink => "link would cross an enemy link",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for LinkError {}

/// Decide whether `team` may link beacons `a` and `b`. Pure read — the
/// registry commits the edge only after this returns `Ok`.
pub fn validate_link(
    graph: &BeaconGraph,
    config: &EngineConfig,
    team: TeamId,
    a: BeaconId,
    b: BeaconId,
) -> Result<Segment, LinkError> {
    if a == b {
        return Err(LinkError::SelfLink);
    }

    let (beacon_a, beacon_b) = match (graph.beacon(a), graph.beacon(b)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(LinkError::NotOwned),
    };
    if beacon_a.owner != Some(team) || beacon_b.owner != Some(team) {
        return Err(LinkError::NotOwned);
    }

    let limit = usize::from(config.max_links_per_beacon);
    if beacon_a.links.len() >= limit || beacon_b.links.len() >= limit {
        return Err(LinkError::LinkLimitReached);
    }

    if beacon_a.links.contains(&b) {
        return Err(LinkError::DuplicateLink);
    }

    let segment = Segment::new(beacon_a.position.column(), beacon_b.position.column());

    if let Some(max) = config.max_link_distance {
        let max = i128::from(max);
        if segment.a.distance_sq(segment.b) > max * max {
            return Err(LinkError::LinkTooLong);
        }
    }

    for record in graph.links() {
        if record.team != team && segments_properly_cross(segment, record.segment) {
            return Err(LinkError::CrossesEnemyLink);
        }
    }

    Ok(segment)
}
