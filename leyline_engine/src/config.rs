// Engine configuration.
//
// All tunable parameters live in `EngineConfig`, passed into the
// `Registry` constructor — there is no process-wide settings state. Hosts
// typically load the config from JSON alongside their own settings; the
// `to_json`/`from_json` helpers cover that. Fields carry
// `#[serde(default)]` so configs written by older hosts keep loading as
// knobs are added.
//
// See also: `validator.rs` which reads the link limit and distance cap,
// `spatial.rs` which reads the bucket size.

use serde::{Deserialize, Serialize};

/// Tunable parameters for one engine instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of links any one beacon may carry.
    pub max_links_per_beacon: u8,
    /// Optional cap on planar link length, in blocks. `None` disables the
    /// check entirely.
    pub max_link_distance: Option<u32>,
    /// Bucket edge length for the spatial index's `nearby` grid, in
    /// blocks. Larger buckets scan fewer cells but more candidates.
    pub spatial_bucket_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_links_per_beacon: 8,
            max_link_distance: None,
            spatial_bucket_size: 16,
        }
    }
}

impl EngineConfig {
    /// Serialize to pretty JSON for host-side config files.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
