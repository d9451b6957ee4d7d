// ============================================================================
// API Client : Open-Meteo (prévisions météo)
// ============================================================================
// Récupère en un seul appel les conditions actuelles et la température
// horaire pour des coordonnées données. Pas de clé d'API, pas de retry.
// ============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{Coordinates, CurrentConditions, HourlyPoint, WeatherSnapshot};

// ============================================================================
// Structures pour parser la réponse JSON d'Open-Meteo
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
    hourly: Hourly,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
}

/// Séries horaires : time[i] et temperature_2m[i] décrivent la même heure
#[derive(Debug, Deserialize)]
struct Hourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
}

/// Client de prévisions météo
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Récupère la météo pour des coordonnées
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn forecast(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let request = self.build_request(coordinates)?;
        debug!(url = %request.url(), "Sending HTTP request to Open-Meteo");

        let response = self.client.execute(request).await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "Open-Meteo returned error status");
            return Err(FetchError::Network(format!("Open-Meteo returned HTTP {}", status)));
        }

        let body = response.text().await?;
        let weather = decode_forecast(&body)?;

        info!(
            temperature = weather.current.temperature,
            hours = weather.hourly.len(),
            "Successfully fetched weather data"
        );
        Ok(weather)
    }

    fn build_request(&self, coordinates: Coordinates) -> Result<reqwest::Request, FetchError> {
        let latitude = coordinates.latitude.to_string();
        let longitude = coordinates.longitude.to_string();

        let request = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
                ("hourly", "temperature_2m,wind_speed_10m"),
            ])
            .build()?;

        Ok(request)
    }
}

/// Décode la réponse Open-Meteo
///
/// Les tableaux horaires doivent avoir la même longueur, sinon MalformedResponse.
pub fn decode_forecast(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let hourly = response.hourly;

    if hourly.time.len() != hourly.temperature_2m.len() {
        return Err(FetchError::malformed(format!(
            "hourly arrays are misaligned: {} timestamps, {} temperatures",
            hourly.time.len(),
            hourly.temperature_2m.len()
        )));
    }

    // CONCEPT RUST : zip + collect::<Result<Vec<_>, _>>()
    // - zip parcourt les deux tableaux en parallèle (même index = même heure)
    // - collect sur des Result s'arrête à la première erreur
    let points = hourly
        .time
        .iter()
        .zip(hourly.temperature_2m)
        .map(|(time, temperature)| {
            let timestamp = parse_hour(time)?;
            let temperature = temperature
                .ok_or_else(|| FetchError::malformed(format!("missing temperature at {}", time)))?;
            Ok(HourlyPoint {
                timestamp,
                temperature,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(WeatherSnapshot {
        current: CurrentConditions {
            temperature: response.current_weather.temperature,
            wind_speed: response.current_weather.windspeed,
        },
        hourly: points,
    })
}

/// Parse une heure Open-Meteo ("2024-01-05T14:00", GMT par défaut)
fn parse_hour(value: &str) -> Result<DateTime<Utc>, FetchError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| FetchError::malformed(format!("invalid hourly timestamp {:?}", value)))
}

// ============================================================================
// Tests unitaires
// ============================================================================
