//! Core type definitions for partitioned temporal graphs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u64);

impl VertexId {
    pub fn new(id: u64) -> Self {
        VertexId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(id: u64) -> Self {
        VertexId(id)
    }
}

/// Identifier of a graph partition. The partition space is capped at 256
/// partitions so the id packs into a single byte in replica sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u8);

impl PartitionId {
    pub fn new(id: u8) -> Self {
        PartitionId(id)
    }

    /// Converts an untyped partition index, as produced by routing layers
    /// that work in plain integers.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside `0..=255`. An out-of-range index means
    /// the routing layer and the partition space disagree, which is a
    /// programming error rather than a runtime condition.
    pub fn from_index(index: i64) -> Self {
        assert!(
            (0..=255).contains(&index),
            "partition index {} outside supported range 0..=255",
            index
        );
        PartitionId(index as u8)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for PartitionId {
    fn from(id: u8) -> Self {
        PartitionId(id)
    }
}

/// Event/validity timestamp in milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Inclusive time window over edge validity intervals.
///
/// An edge participates in a windowed view when its `valid_from` falls
/// inside `[from, max_valid_to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from: Timestamp,
    pub max_valid_to: Timestamp,
}

impl Window {
    pub fn new(from: Timestamp, max_valid_to: Timestamp) -> Self {
        Window { from, max_valid_to }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.from && ts <= self.max_valid_to
    }

    /// True when `from` exceeds `max_valid_to`. Such a window contains no
    /// timestamps.
    pub fn is_empty(&self) -> bool {
        self.from > self.max_valid_to
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.max_valid_to)
    }
}
