//! Overpass QL construction for building-footprint queries
//!
//! Two query shapes: the area-scoped listing that discovers every building
//! way in a city, and the batched way lookup that pulls node geometry for a
//! chunk of way ids.

use std::time::Duration;

/// Offset mapping an OSM relation id to its Overpass area id
const AREA_ID_OFFSET: u64 = 3_600_000_000;

/// Server-side timeout for the area listing query, seconds
const LISTING_TIMEOUT_SECS: u32 = 50;

/// Server-side timeout for batched way queries, seconds. Large batches are
/// the slow path, so this is generous.
const BATCH_TIMEOUT_SECS: u32 = 180;

/// Configuration for the query endpoint
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// URL of the Overpass interpreter endpoint
    pub interpreter_url: String,

    /// Client-side cap per request; must exceed the server-side query
    /// timeouts or slow batches get cut off mid-flight
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            interpreter_url: "https://overpass-api.de/api/interpreter".to_string(),
            request_timeout: Duration::from_secs(BATCH_TIMEOUT_SECS as u64 + 20),
        }
    }
}

/// Derives the Overpass area id for a city relation id
pub fn area_id(city_relation_id: u64) -> u64 {
    AREA_ID_OFFSET + city_relation_id
}

/// Query listing every building way inside an area. `out center` keeps the
/// response small: way skeletons only, no node geometry yet.
pub fn building_listing(area: u64) -> String {
    format!(
        "[out:json][timeout:{LISTING_TIMEOUT_SECS}];\n\
         (\n\
         \x20   way[\"building\"](area:{area});\n\
         );\n\
         out center;\n"
    )
}

/// Combined query for one chunk of way ids plus all nodes they reference
/// (the `(._;>;)` recurse-down)
pub fn way_batch(ids: &[u64]) -> String {
    let ways = ids
        .iter()
        .map(|id| format!("way({id});"))
        .collect::<Vec<_>>()
        .join("\n    ");
    format!(
        "[out:json][timeout:{BATCH_TIMEOUT_SECS}];\n\
         (\n\
         \x20   {ways}\n\
         );\n\
         (._;>;);\n\
         out body;\n"
    )
}
