// ============================================================================
// Pipeline météo : nom de lieu -> coordonnées -> météo
// ============================================================================
// Deux étapes strictement séquentielles : la météo n'est demandée que si le
// géocodage a réussi. Un échec météo garde le lieu résolu (succès partiel).
//
// CONCEPT RUST : Traits aux frontières
// - Geocoder et WeatherSource abstraient les services HTTP
// - Les tests injectent des faux services sans réseau
// ============================================================================

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::api::nominatim::NominatimClient;
use crate::api::open_meteo::OpenMeteoClient;
use crate::error::FetchError;
use crate::models::{Coordinates, GeoLocation, LookupResult, WeatherSnapshot};

/// Résolution d'un nom de lieu en coordonnées
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, place: &str) -> Result<GeoLocation, FetchError>;
}

/// Source de météo pour des coordonnées
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn forecast(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, FetchError>;
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn resolve(&self, place: &str) -> Result<GeoLocation, FetchError> {
        NominatimClient::resolve(self, place).await
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn forecast(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        OpenMeteoClient::forecast(self, coordinates).await
    }
}

/// Enchaîne géocodage et météo
#[derive(Debug, Clone)]
pub struct LookupPipeline<G, W> {
    geocoder: G,
    weather: W,
}

impl<G, W> LookupPipeline<G, W>
where
    G: Geocoder,
    W: WeatherSource,
{
    pub fn new(geocoder: G, weather: W) -> Self {
        Self { geocoder, weather }
    }

    /// Recherche la météo d'un lieu
    ///
    /// Exactement une résolution par appel, au plus une requête météo.
    #[instrument(skip(self))]
    pub async fn lookup(&self, place: &str) -> LookupResult {
        let location = match self.geocoder.resolve(place).await {
            Ok(location) => location,
            Err(cause) => {
                warn!(error = %cause, "Geocoding failed, weather not requested");
                return LookupResult::LocationNotFound { cause };
            }
        };

        match self.weather.forecast(location.coordinates()).await {
            Ok(weather) => {
                info!(place = %location.display_name, "Weather lookup complete");
                LookupResult::Resolved { location, weather }
            }
            Err(cause) => {
                warn!(place = %location.display_name, error = %cause, "Weather fetch failed");
                LookupResult::WeatherUnavailable { location, cause }
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
