use crate::geo::GeoResolver;

/// Shared application state. The resolver takes `&self` everywhere, so no
/// outer lock is needed; its caches and limiter synchronize internally.
pub struct AppState {
    pub resolver: GeoResolver,
}
