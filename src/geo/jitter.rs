//! Deterministic coordinate jitter.
//!
//! Dashboard markers for addresses that resolve to the same base point must
//! not collapse onto one pixel, but re-rendering the same address must put
//! its marker in the same place. Every offset here is a pure function of the
//! input string and house number — no randomness, no clock.

/// Spread per house-number step, in degrees (~17 m of latitude).
const HOUSE_STEP_DEG: f64 = 1.5e-4;

/// House numbers wrap at this modulus before scaling.
const HOUSE_MODULUS: u32 = 50;

/// Half-width of the hash-derived micro offset, in degrees.
const MICRO_SPAN_DEG: f64 = 5.0e-4;

/// Half-width of the fallback-tier offset, in degrees (~1.1 km).
const FALLBACK_SPAN_DEG: f64 = 1.0e-2;

/// Rolling polynomial hash over the input, weighted by character position.
///
/// `h_i = h_{i-1} * 31 + byte_i * (i + 1)` with wrapping arithmetic. The
/// position weight makes anagrams hash differently, so two addresses built
/// from the same letters still land on distinct offsets.
pub fn position_hash(s: &str) -> u64 {
    let mut h: u64 = 0;
    for (i, b) in s.bytes().enumerate() {
        h = h
            .wrapping_mul(31)
            .wrapping_add((b as u64).wrapping_mul(i as u64 + 1));
    }
    h
}

/// Map a hash to a symmetric range `[-magnitude, magnitude)`.
fn span(h: u64, magnitude: f64) -> f64 {
    ((h % 10_000) as f64 / 10_000.0 - 0.5) * 2.0 * magnitude
}

/// House-number-derived offset: `house mod 50` scaled so consecutive street
/// numbers fan out along the street.
pub fn house_offset(house: u32) -> f64 {
    f64::from(house % HOUSE_MODULUS) * HOUSE_STEP_DEG
}

/// Hash-derived micro offset, strictly smaller than one house step band.
/// Separates addresses that share a base coordinate and house number.
pub fn micro_offset(s: &str) -> (f64, f64) {
    let h = position_hash(s);
    (span(h, MICRO_SPAN_DEG), span(h >> 16, MICRO_SPAN_DEG))
}

/// Combined offset for a knowledge-base hit: house spread plus micro jitter.
/// Total magnitude stays under ~0.01° of the base coordinate.
pub fn address_offset(raw: &str, house: Option<u32>) -> (f64, f64) {
    let house_term = house_offset(house.unwrap_or(0));
    let (mlat, mlng) = micro_offset(raw);
    (house_term + mlat, house_term / 2.0 + mlng)
}

/// Larger offset for the deterministic fallback tier: full-string hash,
/// street-only hash, and house term combined, so unresolved addresses spread
/// out instead of stacking on the default center.
pub fn fallback_offset(full: &str, street: Option<&str>, house: Option<u32>) -> (f64, f64) {
    let h_full = position_hash(full);
    let h_street = street
        .map(position_hash)
        .unwrap_or_else(|| h_full.rotate_left(17));
    let house_term = house_offset(house.unwrap_or(0));
    let dlat = span(h_full, FALLBACK_SPAN_DEG) + house_term;
    let dlng = span(h_street, FALLBACK_SPAN_DEG) + span(h_full >> 32, MICRO_SPAN_DEG);
    (dlat, dlng)
}
