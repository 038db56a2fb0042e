//! Temporal edge representation

use crate::graph::property::{PropertyMap, PropertyValue};
use crate::graph::types::{Timestamp, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A directed edge with a validity interval.
///
/// Edges are bucketed by `valid_from` in the snapshot store; `valid_to`
/// marks when the edge stops being current. Undirected graphs are
/// represented by storing both orientations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalEdge {
    pub source: VertexId,
    pub target: VertexId,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    pub properties: PropertyMap,
}

impl TemporalEdge {
    pub fn new(
        source: VertexId,
        target: VertexId,
        valid_from: Timestamp,
        valid_to: Timestamp,
    ) -> Self {
        TemporalEdge {
            source,
            target,
            valid_from,
            valid_to,
            properties: HashMap::new(),
        }
    }

    pub fn new_with_properties(
        source: VertexId,
        target: VertexId,
        valid_from: Timestamp,
        valid_to: Timestamp,
        properties: PropertyMap,
    ) -> Self {
        TemporalEdge {
            source,
            target,
            valid_from,
            valid_to,
            properties,
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: String, value: PropertyValue) {
        self.properties.insert(key, value);
    }

    /// The same edge with source and target swapped. Used when loading
    /// undirected data, where each logical edge is stored twice.
    pub fn reversed(&self) -> TemporalEdge {
        TemporalEdge {
            source: self.target,
            target: self.source,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            properties: self.properties.clone(),
        }
    }
}
