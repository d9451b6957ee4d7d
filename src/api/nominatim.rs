// ============================================================================
// API Client : Nominatim (géocodage OpenStreetMap)
// ============================================================================
// Résout un nom de lieu libre ("Paris", "Lyon, France") en coordonnées.
// Une seule requête, limitée au meilleur résultat, sans retry.
// ============================================================================

use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::GeoLocation;

/// Un résultat de recherche Nominatim
///
/// Nominatim renvoie lat/lon sous forme de strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

/// Client de géocodage
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Crée le client depuis la configuration
    ///
    /// Le User-Agent est obligatoire selon la politique d'usage de Nominatim.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.geocode_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Résout un nom de lieu en GeoLocation (meilleur résultat)
    ///
    /// Un nom vide ne déclenche pas de requête : NotFound directement.
    #[instrument(skip(self))]
    pub async fn resolve(&self, place: &str) -> Result<GeoLocation, FetchError> {
        let query = place.trim();
        if query.is_empty() {
            debug!("Empty place name, skipping geocoding request");
            return Err(FetchError::not_found(place));
        }

        let request = self.build_request(query)?;
        debug!(url = %request.url(), "Sending HTTP request to Nominatim");

        let response = self.client.execute(request).await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "Nominatim returned error status");
            return Err(FetchError::Network(format!("Nominatim returned HTTP {}", status)));
        }

        let body = response.text().await?;
        let location = decode_places(query, &body)?;

        info!(display_name = %location.display_name, lat = location.latitude, lon = location.longitude, "Place resolved");
        Ok(location)
    }

    fn build_request(&self, query: &str) -> Result<reqwest::Request, FetchError> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .build()?;

        Ok(request)
    }
}

/// Décode la réponse Nominatim et garde le premier résultat
///
/// - Tableau vide : NotFound
/// - Forme inattendue ou lat/lon non numériques : MalformedResponse
pub fn decode_places(query: &str, body: &str) -> Result<GeoLocation, FetchError> {
    let places: Vec<Place> = serde_json::from_str(body)?;

    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::not_found(query))?;

    let latitude = parse_coordinate("lat", &place.lat)?;
    let longitude = parse_coordinate("lon", &place.lon)?;

    Ok(GeoLocation::new(place.display_name, latitude, longitude))
}

fn parse_coordinate(field: &str, value: &str) -> Result<f64, FetchError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FetchError::malformed(format!(
            "field '{}' is not a coordinate: {:?}",
            field, value
        ))),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_first_place() {
        let body = r#"[
            {"place_id": 1, "lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris, Île-de-France, France"},
            {"place_id": 2, "lat": "33.66", "lon": "-95.55", "display_name": "Paris, Texas"}
        ]"#;

        let location = decode_places("Paris", body).unwrap();
        assert_eq!(location.display_name, "Paris, Île-de-France, France");
        assert_eq!(location.latitude, 48.8588897);
        assert_eq!(location.longitude, 2.3200410);
    }

    #[test]
    fn test_decode_empty_is_not_found() {
        let err = decode_places("Atlantis", "[]").unwrap_err();
        assert_eq!(err, FetchError::not_found("Atlantis"));
    }

    #[test]
    fn test_decode_bad_shape_is_malformed() {
        let err = decode_places("Paris", r#"{"error": "bad request"}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));

        let err = decode_places("Paris", r#"[{"lat": "north", "lon": "2.3", "display_name": "Paris"}]"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));

        // display_name manquant
        let err = decode_places("Paris", r#"[{"lat": "1", "lon": "2"}]"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_blank_place_skips_request() {
        let config = Config {
            geocode_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = NominatimClient::new(&config).unwrap();

        let err = client.resolve("   ").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn test_build_request_params() {
        let client = NominatimClient::new(&Config::default()).unwrap();
        let request = client.build_request("São Paulo").unwrap();
        let url = request.url();

        assert_eq!(url.host_str(), Some("nominatim.openstreetmap.org"));
        assert_eq!(url.path(), "/search");
        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("q".to_string(), "São Paulo".to_string()),
                ("format".to_string(), "json".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }
}
