//! kartograf — geographic resolution engine for Serbian field-service
//! dashboards.
//!
//! The engine is total: every non-empty input resolves to a coordinate,
//! degrading from cached and locally known data through an external
//! geocoder down to a deterministic jittered fallback.

pub mod geo;
pub mod server;

pub use geo::{CacheStats, Coordinate, GeoResolver, Granularity, ResolutionResult, ResolutionSource};
