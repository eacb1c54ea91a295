//! Domain model for building footprints
//!
//! Wire records arrive duck-typed (a `type` field on every element); they are
//! demultiplexed once, at the client boundary, into the explicit
//! [`RawElement`] variants the rest of the pipeline works with.

use serde::{Deserialize, Serialize};

/// A single geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
}

/// A building skeleton: an ordered list of node ids not yet resolved to
/// coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: u64,
    pub nodes: Vec<u64>,
}

/// A fully reconciled building footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: u64,
    pub nodes: Vec<Node>,
}

impl Building {
    /// Number of distinct outline corners. Closed ways repeat the first node
    /// at the end; that terminal duplicate is not an extra corner.
    pub fn effective_points(&self) -> usize {
        match self.nodes.as_slice() {
            [] => 0,
            [_] => 1,
            [first, .., last] if first.id == last.id => self.nodes.len() - 1,
            _ => self.nodes.len(),
        }
    }
}

/// A query API element after demultiplexing on its `type` tag
#[derive(Debug, Clone, PartialEq)]
pub enum RawElement {
    Node(Node),
    Way(Way),
}

impl RawElement {
    pub fn id(&self) -> u64 {
        match self {
            RawElement::Node(node) => node.id,
            RawElement::Way(way) => way.id,
        }
    }
}

/// Raw element record as it appears on the wire
#[derive(Debug, Deserialize)]
pub(crate) struct WireElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<u64>,
}

impl WireElement {
    /// Typed view of the record. Foreign kinds (relations, areas, counts) and
    /// nodes without coordinates are dropped here, never propagated.
    pub(crate) fn into_element(self) -> Option<RawElement> {
        match self.kind.as_str() {
            "node" => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => Some(RawElement::Node(Node {
                    id: self.id,
                    lat,
                    lon,
                })),
                _ => None,
            },
            "way" => Some(RawElement::Way(Way {
                id: self.id,
                nodes: self.nodes,
            })),
            _ => None,
        }
    }
}

/// Top-level response body of the query API
#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    #[serde(default)]
    pub(crate) elements: Vec<WireElement>,
}
