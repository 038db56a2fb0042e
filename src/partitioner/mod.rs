//! State consumed by streaming partitioners.

pub mod replica;

pub use replica::ReplicaRecord;
