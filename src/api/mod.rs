// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients HTTP du tableau de bord :
// cotations (Alpha Vantage), géocodage (Nominatim) et météo (Open-Meteo)
// ============================================================================

pub mod alpha_vantage; // Cotations intraday
pub mod lookup;        // Pipeline lieu -> météo
pub mod nominatim;     // Géocodage
pub mod open_meteo;    // Prévisions météo

// Re-export des types principaux
pub use alpha_vantage::AlphaVantageClient;
pub use lookup::{Geocoder, LookupPipeline, WeatherSource};
pub use nominatim::NominatimClient;
pub use open_meteo::OpenMeteoClient;

/// Pipeline météo branchée sur les vrais services
pub type WeatherLookup = LookupPipeline<NominatimClient, OpenMeteoClient>;
