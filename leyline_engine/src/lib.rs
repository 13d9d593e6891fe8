// leyline_engine — territory graph & field engine.
//
// This crate contains all territory logic for Leyline: the beacon graph,
// link validation, triangle-field detection, coverage accounting, and
// the spatial index, composed behind the `Registry` façade. It has zero
// host dependencies and can be tested, benchmarked, and run headless —
// block mutation, chat, inventory, and rendering all live on the host
// side and talk to this crate through `Registry`.
//
// Module overview:
// - `registry.rs`:  The `Registry` façade — every operation and cascade.
// - `graph.rs`:     Beacon arena + mirrored link edges (`BeaconGraph`).
// - `validator.rs`: Pure link legality checks, including the exact
//                   enemy-crossing test.
// - `triangle.rs`:  3-cycle detection when a link commits.
// - `coverage.rs`:  Per-team field sets, column stacks, scored area.
// - `spatial.rs`:   Column -> beacon index with bucketed radius queries.
// - `snapshot.rs`:  Save/load via an ordered beacon list + link log.
// - `config.rs`:    `EngineConfig` — all tunables, no global state.
// - `types.rs`:     Ids, `TeamId`, `Position`, `LinkResult`.
//
// Planar geometry (orientation, crossing, rasterization) is the
// companion crate `leyline_geom`.
//
// **Critical constraint: determinism.** Every operation is a pure
// function of engine state and arguments: ids are sequential, ordered
// collections drive every iteration that reaches a caller, and triangle
// candidates are processed in a fixed order. A snapshot replayed on any
// platform reproduces fields, areas, and failure counts exactly.

pub mod config;
pub mod coverage;
pub mod graph;
pub mod registry;
pub mod snapshot;
pub mod spatial;
pub mod triangle;
pub mod types;
pub mod validator;

pub use config::EngineConfig;
pub use coverage::TriangleField;
pub use graph::{Beacon, BeaconError};
pub use registry::Registry;
pub use snapshot::{SnapshotError, WorldSnapshot};
pub use types::{BeaconId, FieldId, LinkResult, Position, TeamId};
pub use validator::LinkError;
