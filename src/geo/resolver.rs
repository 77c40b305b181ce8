//! Resolution orchestrator — sequences the tier chain.
//!
//! Street flow:        cache → local KB → external variants → transliteration
//!                     retry → deterministic fallback
//! Municipality flow:  cache → centroid table → external variants →
//!                     transliteration retry → deterministic fallback
//!
//! A single forward pass: the first tier producing an accepted coordinate
//! wins, is written to the granularity's cache, and is returned. Resolution
//! is total — the fallback tier cannot fail.

use super::cache::{ResolutionCache, STREET_WINDOW_MS};
use super::external::{self, ExternalResolver};
use super::knowledge::{self, BELGRADE_BOUNDS, SERBIA_BOUNDS};
use super::types::{
    BoundingBox, Coordinate, Granularity, ParsedAddress, ResolutionResult, ResolutionSource,
    TierOutcome,
};
use super::{jitter, normalize, translit};
use serde::Serialize;
use std::collections::HashMap;

/// Entry counts per cache, for the introspection endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub street: usize,
    pub municipality: usize,
}

/// The resolution engine. Methods take `&self`; shared state lives behind
/// mutexes inside the caches and the limiter, so one instance serves
/// concurrent requests.
pub struct GeoResolver {
    street_cache: ResolutionCache,
    municipality_cache: ResolutionCache,
    external: ExternalResolver,
    offline: bool,
}

impl GeoResolver {
    pub fn new() -> Self {
        Self {
            street_cache: ResolutionCache::bucketed(STREET_WINDOW_MS),
            municipality_cache: ResolutionCache::manual(),
            external: ExternalResolver::new(),
            offline: false,
        }
    }

    /// Build around a specific external tier (tests inject a mock geocoder
    /// and a short limiter interval).
    pub fn with_external(external: ExternalResolver) -> Self {
        Self {
            street_cache: ResolutionCache::bucketed(STREET_WINDOW_MS),
            municipality_cache: ResolutionCache::manual(),
            external,
            offline: false,
        }
    }

    /// Skip the external tiers entirely (cache, knowledge base, and
    /// fallback still apply).
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Resolve a free-text location. Total: always yields a coordinate.
    pub fn resolve(&self, location: &str, granularity: Granularity) -> ResolutionResult {
        match granularity {
            Granularity::Street => self.resolve_street(location),
            Granularity::Municipality => self.resolve_municipality(location),
        }
    }

    /// Best-effort batch resolution, sequential so every external call
    /// queues through the shared limiter in order.
    pub fn resolve_many(
        &self,
        locations: &[String],
        granularity: Granularity,
    ) -> HashMap<String, Coordinate> {
        locations
            .iter()
            .filter(|loc| !loc.trim().is_empty())
            .map(|loc| (loc.clone(), self.resolve(loc, granularity).coordinate))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            street: self.street_cache.len(),
            municipality: self.municipality_cache.len(),
        }
    }

    /// All cached keys across both granularities.
    pub fn cache_keys(&self) -> Vec<String> {
        let mut keys = self.street_cache.keys();
        keys.extend(self.municipality_cache.keys());
        keys
    }

    pub fn clear_caches(&self) {
        self.street_cache.clear();
        self.municipality_cache.clear();
    }

    // ─── Street granularity ─────────────────────────────────────

    fn resolve_street(&self, location: &str) -> ResolutionResult {
        let key = normalize::normalize_key(location);

        if let Some(hit) = self.street_cache.get(&key) {
            tracing::debug!(tier = "cache", accepted = true, key = %key, "cache hit");
            return hit;
        }

        let parsed = normalize::parse_address(location);
        if parsed.is_none() {
            tracing::debug!(
                tier = "normalizer",
                accepted = false,
                reason = "input outside address convention, treated as opaque name",
            );
        }

        if let TierOutcome::Accepted(result) =
            self.local_kb_tier(location, parsed.as_ref(), &BELGRADE_BOUNDS)
        {
            self.street_cache.put(&key, &result);
            return result;
        }

        if !self.offline {
            let variants = match &parsed {
                Some(p) => external::street_variants(p, location),
                None => vec![format!("{}, Beograd, Srbija", location), location.to_string()],
            };

            if let Some((coord, display)) =
                self.external.resolve_variants(&variants, &BELGRADE_BOUNDS)
            {
                let mut result =
                    ResolutionResult::new(coord, ResolutionSource::External).with_display_name(display);
                if let Some(p) = &parsed {
                    result = result.with_region(normalize::canonical_municipality(&p.area));
                }
                self.street_cache.put(&key, &result);
                return result;
            }

            if let Some(result) = self.translit_tier(location, &BELGRADE_BOUNDS) {
                self.street_cache.put(&key, &result);
                return result;
            }
        }

        let result = self.fallback_tier(location, parsed.as_ref());
        self.street_cache.put(&key, &result);
        result
    }

    // ─── Municipality granularity ───────────────────────────────

    fn resolve_municipality(&self, location: &str) -> ResolutionResult {
        let canonical = normalize::canonical_municipality(location);
        let key = normalize::normalize_key(&canonical);

        if let Some(hit) = self.municipality_cache.get(&key) {
            tracing::debug!(tier = "cache", accepted = true, key = %key, "cache hit");
            return hit;
        }

        if let Some((name, center)) = knowledge::lookup_municipality(&canonical) {
            if SERBIA_BOUNDS.contains(center) {
                tracing::debug!(tier = "local_kb", accepted = true, municipality = name);
                let result = ResolutionResult::new(center, ResolutionSource::LocalKb)
                    .with_region(normalize::canonical_municipality(name));
                self.municipality_cache.put(&key, &result);
                return result;
            }
        }
        tracing::debug!(tier = "local_kb", accepted = false, reason = "no municipality match");

        if !self.offline {
            let variants = external::municipality_variants(&canonical, location);

            if let Some((coord, display)) =
                self.external.resolve_variants(&variants, &SERBIA_BOUNDS)
            {
                let result = ResolutionResult::new(coord, ResolutionSource::External)
                    .with_region(canonical.clone())
                    .with_display_name(display);
                self.municipality_cache.put(&key, &result);
                return result;
            }

            if let Some(result) = self.translit_tier(location, &SERBIA_BOUNDS) {
                self.municipality_cache.put(&key, &result);
                return result;
            }
        }

        let result = self.fallback_tier(&canonical, None);
        self.municipality_cache.put(&key, &result);
        result
    }

    // ─── Tiers ──────────────────────────────────────────────────

    /// Local knowledge base: area substring match, then street substring
    /// match inside the area. The hit gets deterministic house/micro jitter
    /// so co-located work orders fan out on the map.
    fn local_kb_tier(
        &self,
        raw: &str,
        parsed: Option<&ParsedAddress>,
        bounds: &BoundingBox,
    ) -> TierOutcome {
        let area_query = parsed.map(|p| p.area.as_str()).unwrap_or(raw);
        let Some(area) = knowledge::lookup_area(area_query) else {
            tracing::debug!(tier = "local_kb", accepted = false, reason = "no area match");
            return TierOutcome::Skip;
        };

        let base = parsed
            .and_then(|p| area.street(&p.street))
            .unwrap_or(area.center);
        let house = parsed.and_then(|p| p.house_number);
        let (dlat, dlng) = jitter::address_offset(raw, house);
        let coord = base.offset(dlat, dlng);

        if !bounds.contains(coord) {
            tracing::debug!(tier = "local_kb", accepted = false, reason = "jittered point out of bounds");
            return TierOutcome::Skip;
        }

        tracing::debug!(tier = "local_kb", accepted = true, area = area.canonical_name());
        TierOutcome::Accepted(
            ResolutionResult::new(coord, ResolutionSource::LocalKb)
                .with_region(normalize::canonical_municipality(area.canonical_name())),
        )
    }

    /// One extra external attempt with the Cyrillic form of the raw input,
    /// only when the substitution table actually changed it.
    fn translit_tier(&self, raw: &str, bounds: &BoundingBox) -> Option<ResolutionResult> {
        let cyrillic = match translit::transliterate(raw) {
            Some(q) => q,
            None => {
                tracing::debug!(tier = "translit", accepted = false, reason = "no substitution fired");
                return None;
            }
        };

        let (coord, display) = self.external.resolve_single(&cyrillic, bounds)?;
        tracing::debug!(tier = "translit", accepted = true, query = %cyrillic);
        Some(
            ResolutionResult::new(coord, ResolutionSource::External).with_display_name(display),
        )
    }

    /// Final tier, cannot fail: anchor on a known center or the default,
    /// spread with the larger deterministic offset. Not bounds-checked —
    /// anchored by construction.
    fn fallback_tier(&self, raw: &str, parsed: Option<&ParsedAddress>) -> ResolutionResult {
        let (anchor, center) = knowledge::fallback_center(raw);
        let street = parsed.map(|p| p.street.as_str());
        let house = parsed.and_then(|p| p.house_number);
        let (dlat, dlng) = jitter::fallback_offset(raw, street, house);

        tracing::debug!(
            tier = "fallback",
            accepted = true,
            anchor = anchor.unwrap_or("default center"),
        );

        let mut result =
            ResolutionResult::new(center.offset(dlat, dlng), ResolutionSource::Fallback);
        if let Some(name) = anchor {
            result = result.with_region(normalize::canonical_municipality(name));
        }
        result
    }
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::external::testing::{candidate, MockGeocoder};
    use crate::geo::limiter::RateLimiter;
    use std::time::{Duration, Instant};

    fn fast_external(mock: MockGeocoder) -> ExternalResolver {
        ExternalResolver::with_parts(
            Box::new(mock),
            RateLimiter::with_interval(Duration::from_millis(1)),
        )
    }

    fn offline_resolver() -> GeoResolver {
        let mut resolver = GeoResolver::with_external(fast_external(MockGeocoder::empty()));
        resolver.set_offline(true);
        resolver
    }

    #[test]
    fn test_totality_on_garbage_input() {
        let resolver = offline_resolver();
        let result = resolver.resolve("???###", Granularity::Street);
        assert!(result.coordinate.lat.is_finite());
        assert!(result.coordinate.lng.is_finite());
        assert_eq!(result.source, ResolutionSource::Fallback);
        // Anchored near the default center.
        assert!((result.coordinate.lat - knowledge::DEFAULT_CENTER.lat).abs() < 0.03);
        assert!((result.coordinate.lng - knowledge::DEFAULT_CENTER.lng).abs() < 0.03);
    }

    #[test]
    fn test_local_kb_hit_for_known_street() {
        let resolver = offline_resolver();
        let result = resolver.resolve("Beograd,BORČA,BORSKA 10", Granularity::Street);
        assert_eq!(result.source, ResolutionSource::LocalKb);
        assert_eq!(result.region.as_deref(), Some("Borča"));
        assert!(BELGRADE_BOUNDS.contains(result.coordinate));
    }

    #[test]
    fn test_house_number_spread() {
        let resolver = offline_resolver();
        let a = resolver.resolve("Beograd,BORČA,BORSKA 10", Granularity::Street);
        let b = resolver.resolve("Beograd,BORČA,BORSKA 50", Granularity::Street);

        assert_ne!(a.coordinate, b.coordinate);

        let center = knowledge::lookup_area("borča").unwrap().center;
        for r in [&a, &b] {
            assert!((r.coordinate.lat - center.lat).abs() < 0.01);
            assert!((r.coordinate.lng - center.lng).abs() < 0.01);
        }
    }

    #[test]
    fn test_determinism_of_kb_and_fallback_paths() {
        // Separate resolver instances so no cache is shared.
        let a = offline_resolver().resolve("Beograd,BORČA,BORSKA 10", Granularity::Street);
        let b = offline_resolver().resolve("Beograd,BORČA,BORSKA 10", Granularity::Street);
        assert_eq!(a.coordinate, b.coordinate);

        let c = offline_resolver().resolve("???###", Granularity::Street);
        let d = offline_resolver().resolve("???###", Granularity::Street);
        assert_eq!(c.coordinate, d.coordinate);
    }

    #[test]
    fn test_cache_short_circuits_external_calls() {
        let mock = MockGeocoder::new(|_| {
            Ok(vec![candidate(44.81, 20.46, "Непозната улица, Београд, Србија")])
        });
        let log = mock.call_log();
        let resolver = GeoResolver::with_external(fast_external(mock));

        // Unknown area: local KB skips, external answers.
        let first = resolver.resolve("Beograd,NEPOZNATO,GLAVNA 1", Granularity::Street);
        assert_eq!(first.source, ResolutionSource::External);
        let calls_after_first = log.lock().unwrap().len();
        assert_eq!(calls_after_first, 1);

        // Same input inside the same window: served from cache.
        let second = resolver.resolve("Beograd,NEPOZNATO,GLAVNA 1", Granularity::Street);
        assert_eq!(second.source, ResolutionSource::Cache);
        assert_eq!(log.lock().unwrap().len(), calls_after_first);
    }

    #[test]
    fn test_rate_limiter_spaces_external_calls() {
        let mock = MockGeocoder::empty();
        let external = ExternalResolver::with_parts(
            Box::new(mock),
            RateLimiter::with_interval(Duration::from_millis(40)),
        );
        let resolver = GeoResolver::with_external(external);

        // Opaque inputs with no KB match and no transliteration: two
        // external calls each, six calls total, five enforced waits.
        let start = Instant::now();
        resolver.resolve("qwerty one", Granularity::Street);
        resolver.resolve("qwerty two", Granularity::Street);
        resolver.resolve("qwerty three", Granularity::Street);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_transliteration_triggers_exactly_one_extra_call() {
        let mock = MockGeocoder::empty();
        let log = mock.call_log();
        let resolver = GeoResolver::with_external(fast_external(mock));

        // Unknown area, so the local KB skips; the street name is in the
        // substitution table.
        let result = resolver.resolve("Beograd,NEPOZNATO,BORSKA 10", Granularity::Street);

        let calls = log.lock().unwrap().clone();
        // Four street variants (no postal code for an unknown area), then
        // the single Cyrillic retry built from the raw input.
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[4], "београд,nepoznato,борска 10");
        assert_eq!(result.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_transliteration_hit_is_external_source() {
        let mock = MockGeocoder::new(|q| {
            if q.contains("борска") {
                Ok(vec![candidate(44.8737, 20.4450, "Борска, Београд, Србија")])
            } else {
                Ok(Vec::new())
            }
        });
        let resolver = GeoResolver::with_external(fast_external(mock));

        // Misses the local KB (unknown area); the Latin variants find
        // nothing, the Cyrillic retry hits.
        let result = resolver.resolve("Beograd,NEPOZNATO,BORSKA 10", Granularity::Street);
        assert_eq!(result.source, ResolutionSource::External);
        assert!(BELGRADE_BOUNDS.contains(result.coordinate));
    }

    #[test]
    fn test_offline_never_touches_external() {
        let mock = MockGeocoder::empty();
        let log = mock.call_log();
        let mut resolver = GeoResolver::with_external(fast_external(mock));
        resolver.set_offline(true);

        resolver.resolve("Beograd,NEPOZNATO,GLAVNA 1", Granularity::Street);
        resolver.resolve("nigde", Granularity::Municipality);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_municipality_centroid_lookup() {
        let resolver = offline_resolver();
        let result = resolver.resolve("cukarica", Granularity::Municipality);
        assert_eq!(result.source, ResolutionSource::LocalKb);
        assert_eq!(result.region.as_deref(), Some("Čukarica"));
        assert!(SERBIA_BOUNDS.contains(result.coordinate));
    }

    #[test]
    fn test_municipality_determinism() {
        let resolver = offline_resolver();
        let a = resolver.resolve("Vračar", Granularity::Municipality);
        resolver.clear_caches();
        let b = resolver.resolve("VRACAR", Granularity::Municipality);
        assert_eq!(a.coordinate, b.coordinate);
    }

    #[test]
    fn test_municipality_cache_persists_until_clear() {
        let resolver = offline_resolver();
        resolver.resolve("Zemun", Granularity::Municipality);

        let second = resolver.resolve("Zemun", Granularity::Municipality);
        assert_eq!(second.source, ResolutionSource::Cache);

        resolver.clear_caches();
        let third = resolver.resolve("Zemun", Granularity::Municipality);
        assert_eq!(third.source, ResolutionSource::LocalKb);
    }

    #[test]
    fn test_resolve_many_covers_all_inputs() {
        let resolver = offline_resolver();
        let locations = vec![
            "Beograd,BORČA,BORSKA 10".to_string(),
            "???###".to_string(),
            "".to_string(),
        ];
        let map = resolver.resolve_many(&locations, Granularity::Street);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("Beograd,BORČA,BORSKA 10"));
        assert!(map.contains_key("???###"));
    }

    #[test]
    fn test_cache_stats_and_keys() {
        let resolver = offline_resolver();
        resolver.resolve("Beograd,BORČA,BORSKA 10", Granularity::Street);
        resolver.resolve("Zemun", Granularity::Municipality);

        let stats = resolver.cache_stats();
        assert_eq!(stats.street, 1);
        assert_eq!(stats.municipality, 1);
        assert_eq!(resolver.cache_keys().len(), 2);

        resolver.clear_caches();
        let stats = resolver.cache_stats();
        assert_eq!(stats.street + stats.municipality, 0);
    }
}
