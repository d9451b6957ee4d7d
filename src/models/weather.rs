// ============================================================================
// Structures : GeoLocation, WeatherSnapshot, LookupResult
// ============================================================================
// Résultats du widget météo : lieu résolu, conditions actuelles, prévision
// horaire et résultat global de la recherche (avec succès partiel)
// ============================================================================

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// Coordonnées géographiques (degrés décimaux)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Lieu résolu par le géocodage
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    /// Nom complet (ex: "Paris, Île-de-France, France")
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(display_name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            display_name: display_name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Conditions actuelles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    /// Température en °C
    pub temperature: f64,
    /// Vitesse du vent en km/h
    pub wind_speed: f64,
}

/// Un point de la prévision horaire
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    /// Température en °C
    pub temperature: f64,
}

/// Météo pour un lieu : conditions actuelles + prévision horaire
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    /// Ordre du fournisseur (chronologique)
    pub hourly: Vec<HourlyPoint>,
}

// ============================================================================
// LookupResult : résultat de la recherche lieu -> météo
// ============================================================================
// CONCEPT RUST : Enum avec données
// - Resolved : les deux étapes ont réussi
// - LocationNotFound : le géocodage a échoué, la météo n'a pas été demandée
// - WeatherUnavailable : le lieu est connu, seule la météo a échoué
// ============================================================================

/// Résultat d'une recherche météo
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Resolved {
        location: GeoLocation,
        weather: WeatherSnapshot,
    },
    LocationNotFound {
        cause: FetchError,
    },
    WeatherUnavailable {
        location: GeoLocation,
        cause: FetchError,
    },
}

impl LookupResult {
    /// Lieu résolu, même si la météo a échoué
    pub fn location(&self) -> Option<&GeoLocation> {
        match self {
            LookupResult::Resolved { location, .. }
            | LookupResult::WeatherUnavailable { location, .. } => Some(location),
            LookupResult::LocationNotFound { .. } => None,
        }
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        match self {
            LookupResult::Resolved { weather, .. } => Some(weather),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, LookupResult::Resolved { .. })
    }

    /// Message d'alerte pour l'utilisateur (None si tout a réussi)
    pub fn alert_message(&self) -> Option<&'static str> {
        match self {
            LookupResult::Resolved { .. } => None,
            LookupResult::LocationNotFound {
                cause: FetchError::NotFound { .. },
            } => Some("City not found. Please enter a valid city name."),
            LookupResult::LocationNotFound { .. } => {
                Some("Unable to fetch coordinates. Please try again later.")
            }
            LookupResult::WeatherUnavailable { .. } => {
                Some("Unable to fetch weather data. Please try again later.")
            }
        }
    }
}
