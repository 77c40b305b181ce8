//! Core types for the geographic resolution subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A map coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Shift by additive lat/lng offsets.
    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        Self {
            lat: self.lat + dlat,
            lng: self.lng + dlng,
        }
    }
}

/// Whether resolution targets a street address or an administrative area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Street,
    Municipality,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Street => write!(f, "street"),
            Self::Municipality => write!(f, "municipality"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "street" => Ok(Self::Street),
            "municipality" => Ok(Self::Municipality),
            other => Err(format!(
                "Unknown granularity '{}'. Use 'street' or 'municipality'.",
                other
            )),
        }
    }
}

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    LocalKb,
    External,
    Fallback,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::LocalKb => write!(f, "local_kb"),
            Self::External => write!(f, "external"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved location with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub coordinate: Coordinate,
    pub source: ResolutionSource,
    /// Area or municipality name the result was anchored to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Full display name from the external provider, when it produced the hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ResolutionResult {
    pub fn new(coordinate: Coordinate, source: ResolutionSource) -> Self {
        Self {
            coordinate,
            source,
            region: None,
            display_name: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A street address extracted from the `"<City>,<AREA>,<STREET NUMBER>"`
/// convention. Inputs outside the convention are handled as opaque names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub area: String,
    pub street: String,
    pub house_number: Option<u32>,
}

/// Outcome of a single resolution tier. `Skip` hands control to the next
/// tier; it is not an error.
#[derive(Debug, Clone)]
pub enum TierOutcome {
    Accepted(ResolutionResult),
    Skip,
}

/// Rectangular lat/lng range used to reject out-of-region candidates.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, c: Coordinate) -> bool {
        c.lat >= self.lat_min
            && c.lat <= self.lat_max
            && c.lng >= self.lng_min
            && c.lng <= self.lng_max
    }
}

/// External geocoding failures. These never escape the engine: every variant
/// collapses to "skip this tier/variant" inside the orchestrator.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("street".parse::<Granularity>().unwrap(), Granularity::Street);
        assert_eq!(
            "Municipality".parse::<Granularity>().unwrap(),
            Granularity::Municipality
        );
        assert!("county".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ResolutionSource::LocalKb.to_string(), "local_kb");
        assert_eq!(ResolutionSource::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&ResolutionSource::LocalKb).unwrap();
        assert_eq!(json, "\"local_kb\"");
    }

    #[test]
    fn test_bounding_box_contains() {
        let bb = BoundingBox {
            lat_min: 44.0,
            lat_max: 45.0,
            lng_min: 20.0,
            lng_max: 21.0,
        };
        assert!(bb.contains(Coordinate::new(44.5, 20.5)));
        assert!(!bb.contains(Coordinate::new(45.5, 20.5)));
        assert!(!bb.contains(Coordinate::new(44.5, 19.5)));
    }

    #[test]
    fn test_coordinate_offset() {
        let c = Coordinate::new(44.8, 20.4).offset(0.01, -0.02);
        assert!((c.lat - 44.81).abs() < 1e-9);
        assert!((c.lng - 20.38).abs() < 1e-9);
    }
}
