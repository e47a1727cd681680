//! Transitive property-path resolution (spec §4.7).

mod engine;

pub use engine::TransitivePathEngine;
