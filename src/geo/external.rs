//! External geocoding tier: query variants against OpenStreetMap Nominatim,
//! rate-limited and bounds-filtered.

use super::knowledge;
use super::limiter::RateLimiter;
use super::types::{BoundingBox, Coordinate, GeoError, ParsedAddress};
use serde::Deserialize;
use std::time::Duration;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "kartograf/0.3 (field-service dashboard)";
const EXTERNAL_TIMEOUT: Duration = Duration::from_secs(10);
const CANDIDATE_LIMIT: usize = 5;

/// Display-name markers identifying a candidate as Belgrade/Serbia.
const REGION_MARKERS: &[&str] = &[
    "beograd", "belgrade", "srbija", "serbia", "београд", "србија",
];

/// One geocoding candidate, already parsed to numeric coordinates.
#[derive(Debug, Clone)]
pub struct GeoCandidate {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    pub place_type: Option<String>,
    pub place_class: Option<String>,
}

impl GeoCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Free-text geocoding behind a trait so tests can spy on call counts and
/// script responses without the network.
pub trait Geocoder: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<GeoCandidate>, GeoError>;
}

/// Raw Nominatim result row. Coordinates arrive as strings.
#[derive(Deserialize, Debug)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
    #[serde(default, rename = "class")]
    place_class: Option<String>,
}

/// Nominatim HTTP client: country-restricted free-text search with a
/// bounded timeout.
pub struct NominatimClient {
    agent: ureq::Agent,
}

impl NominatimClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(EXTERNAL_TIMEOUT).build(),
        }
    }
}

impl Default for NominatimClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<Vec<GeoCandidate>, GeoError> {
        let url = format!(
            "{}?q={}&format=json&limit={}&addressdetails=1&countrycodes=rs",
            NOMINATIM_URL,
            urlencod(query),
            CANDIDATE_LIMIT,
        );

        let response = self
            .agent
            .get(&url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| GeoError::Network(e.to_string()))?;

        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|r| GeoCandidate {
                // An unparseable coordinate becomes 0.0, which every
                // regional bounding box rejects.
                lat: r.lat.parse().unwrap_or(0.0),
                lng: r.lon.parse().unwrap_or(0.0),
                display_name: r.display_name,
                place_type: r.place_type,
                place_class: r.place_class,
            })
            .collect())
    }
}

/// Ordered query variants for a structured street address.
pub fn street_variants(parsed: &ParsedAddress, raw: &str) -> Vec<String> {
    let number = parsed
        .house_number
        .map(|n| format!(" {}", n))
        .unwrap_or_default();
    let street = &parsed.street;

    let mut variants = vec![
        format!("{}{}, {}, Beograd, Srbija", street, number, parsed.area),
        format!("{}{}, Beograd", street, number),
        format!("ulica {}{}, Beograd", street, number),
    ];
    if let Some(code) = knowledge::postal_code(&parsed.area) {
        variants.push(format!("{}{}, {} Beograd", street, number, code));
    }
    variants.push(raw.to_string());
    variants
}

/// Ordered query variants for a bare municipality name.
pub fn municipality_variants(name: &str, raw: &str) -> Vec<String> {
    vec![
        format!("{}, Beograd, Srbija", name),
        format!("opština {}, Srbija", name),
        raw.to_string(),
    ]
}

/// Minimal percent-encoding over UTF-8 bytes; Cyrillic queries encode
/// byte-by-byte.
fn urlencod(s: &str) -> String {
    let mut out = String::new();
    for b in s.bytes() {
        match b {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn has_region_marker(display_name: &str) -> bool {
    let lower = display_name.to_lowercase();
    REGION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Rank candidates: a Belgrade/Serbia-marked candidate inside the bounds
/// wins; otherwise the first in-bounds candidate; otherwise nothing.
pub fn pick_candidate<'a>(
    candidates: &'a [GeoCandidate],
    bounds: &BoundingBox,
) -> Option<&'a GeoCandidate> {
    candidates
        .iter()
        .find(|c| has_region_marker(&c.display_name) && bounds.contains(c.coordinate()))
        .or_else(|| candidates.iter().find(|c| bounds.contains(c.coordinate())))
}

/// The external tier: walks query variants through the shared limiter,
/// returning the first accepted candidate.
pub struct ExternalResolver {
    client: Box<dyn Geocoder>,
    limiter: RateLimiter,
}

impl ExternalResolver {
    pub fn new() -> Self {
        Self {
            client: Box::new(NominatimClient::new()),
            limiter: RateLimiter::new(),
        }
    }

    /// Assemble from parts (tests inject a mock geocoder and a short
    /// limiter interval).
    pub fn with_parts(client: Box<dyn Geocoder>, limiter: RateLimiter) -> Self {
        Self { client, limiter }
    }

    /// Try each variant in order. Network failures, empty responses, and
    /// out-of-bounds result sets all mean "next variant".
    pub fn resolve_variants(
        &self,
        variants: &[String],
        bounds: &BoundingBox,
    ) -> Option<(Coordinate, String)> {
        for variant in variants {
            self.limiter.acquire();
            match self.client.search(variant) {
                Ok(candidates) => {
                    if let Some(chosen) = pick_candidate(&candidates, bounds) {
                        tracing::debug!(
                            tier = "external",
                            query = %variant,
                            accepted = true,
                            display_name = %chosen.display_name,
                            "variant accepted"
                        );
                        return Some((chosen.coordinate(), chosen.display_name.clone()));
                    }
                    tracing::debug!(
                        tier = "external",
                        query = %variant,
                        accepted = false,
                        reason = "no candidate in bounds",
                        candidates = candidates.len(),
                        "variant rejected"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        tier = "external",
                        query = %variant,
                        accepted = false,
                        reason = %e,
                        "variant failed"
                    );
                }
            }
        }
        None
    }

    /// One rate-limited query, no variant loop (the transliteration retry).
    pub fn resolve_single(
        &self,
        query: &str,
        bounds: &BoundingBox,
    ) -> Option<(Coordinate, String)> {
        self.resolve_variants(std::slice::from_ref(&query.to_string()), bounds)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Handler = Box<dyn Fn(&str) -> Result<Vec<GeoCandidate>, GeoError> + Send + Sync>;

    /// Scripted geocoder that records every query it receives.
    pub struct MockGeocoder {
        calls: Arc<Mutex<Vec<String>>>,
        handler: Handler,
    }

    impl MockGeocoder {
        pub fn new(
            handler: impl Fn(&str) -> Result<Vec<GeoCandidate>, GeoError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                handler: Box::new(handler),
            }
        }

        /// Always returns zero candidates.
        pub fn empty() -> Self {
            Self::new(|_| Ok(Vec::new()))
        }

        /// Shared handle to the recorded query log.
        pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
            self.calls.clone()
        }
    }

    impl Geocoder for MockGeocoder {
        fn search(&self, query: &str) -> Result<Vec<GeoCandidate>, GeoError> {
            self.calls.lock().unwrap().push(query.to_string());
            (self.handler)(query)
        }
    }

    pub fn candidate(lat: f64, lng: f64, display_name: &str) -> GeoCandidate {
        GeoCandidate {
            lat,
            lng,
            display_name: display_name.to_string(),
            place_type: None,
            place_class: None,
        }
    }
}
