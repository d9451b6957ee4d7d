// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod ohlc;     // Chandelles et fenêtres de temps
pub mod snapshot; // Instantané d'un ticker
pub mod ticker;   // Suggestions de symboles
pub mod weather;  // Lieu, météo et résultat de recherche

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazydash::models::ohlc::QuoteBar;
// On peut faire : use lazydash::models::QuoteBar;
pub use ohlc::{QuoteBar, TimeRange};
pub use snapshot::StockSnapshot;
pub use ticker::{SymbolSuggester, REFERENCE_SYMBOLS};
pub use weather::{
    Coordinates, CurrentConditions, GeoLocation, HourlyPoint, LookupResult, WeatherSnapshot,
};
