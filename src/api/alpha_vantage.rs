// ============================================================================
// API Client : Alpha Vantage (cotations intraday)
// ============================================================================
// Récupère la série intraday 5 minutes d'un ticker et la convertit en
// StockSnapshot (chandelles triées + champs dérivés)
//
// Deux étages séparés :
// 1. AlphaVantageClient::fetch_stock : appel HTTP (async)
// 2. ingest_intraday : transformation pure de la réponse décodée
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{QuoteBar, StockSnapshot};

/// Clé de la série dans la réponse Alpha Vantage
pub const SERIES_KEY: &str = "Time Series (5min)";

// ============================================================================
// Structures pour parser la réponse JSON d'Alpha Vantage
// ============================================================================
// Alpha Vantage utilise des clés "numérotées" ("1. open", "6. Time Zone"...)
// et des valeurs numériques sous forme de strings.
//
// La série est gardée en serde_json::Value par entrée : une entrée invalide
// est rejetée seule, sans faire échouer le décodage de toute la réponse.
// ============================================================================

/// Réponse complète de l'endpoint TIME_SERIES_INTRADAY
#[derive(Debug, Default, Deserialize)]
pub struct IntradayResponse {
    #[serde(rename = "Meta Data")]
    pub meta: Option<MetaData>,

    /// timestamp -> enregistrement OHLC (strings)
    #[serde(rename = "Time Series (5min)")]
    pub series: Option<BTreeMap<String, serde_json::Value>>,

    /// Symbole inconnu, paramètre invalide, etc.
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,

    /// Limite d'appels atteinte
    #[serde(rename = "Note")]
    pub note: Option<String>,

    /// Message d'information (clé premium, limite journalière...)
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// Métadonnées de la série
#[derive(Debug, Default, Deserialize)]
pub struct MetaData {
    /// Fuseau horaire des timestamps (ex: "US/Eastern")
    #[serde(rename = "6. Time Zone")]
    pub time_zone: Option<String>,
}

/// Une entrée brute de la série
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

// ============================================================================
// Client HTTP
// ============================================================================

/// Client Alpha Vantage
///
/// La clé d'API est validée à la construction : sans clé, pas de client.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    /// Crée le client depuis la configuration
    ///
    /// Échoue avec FetchError::Config si la clé d'API est absente.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let api_key = config.api_key()?.to_string();

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.quote_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Récupère l'instantané d'un ticker
    ///
    /// # Exemple
    /// let snapshot = client.fetch_stock("AAPL").await?;
    /// println!("Prix actuel : {}", snapshot.price);
    #[instrument(skip(self))]
    pub async fn fetch_stock(&self, symbol: &str) -> Result<StockSnapshot, FetchError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(FetchError::data_unavailable(symbol, "empty symbol"));
        }

        let request = self.build_request(&symbol)?;
        debug!(url = %redacted_url(request.url()), "Sending HTTP request to Alpha Vantage");

        let response = self.client.execute(request).await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, "Alpha Vantage returned error status");
            return Err(FetchError::Network(format!(
                "Alpha Vantage returned HTTP {}",
                status
            )));
        }

        let body = response.text().await?;
        let snapshot = parse_intraday_json(&symbol, &body)?;

        info!(bars = snapshot.bars.len(), price = snapshot.price, "Successfully fetched stock data");
        Ok(snapshot)
    }

    /// Construit la requête GET (sans l'envoyer)
    fn build_request(&self, symbol: &str) -> Result<reqwest::Request, FetchError> {
        let request = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", "5min"),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ])
            .build()?;

        Ok(request)
    }
}

/// Normalise un symbole saisi par l'utilisateur ("  aapl " -> "AAPL")
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// URL à logger : la valeur du paramètre apikey est masquée
///
/// La clé est encodée dans l'URL : on remplace la paire, pas le texte.
fn redacted_url(url: &reqwest::Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "apikey" { "***".to_string() } else { value.into_owned() };
            (name.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

// ============================================================================
// Ingestion : réponse décodée -> StockSnapshot
// ============================================================================

/// Décode le body JSON puis construit l'instantané
pub fn parse_intraday_json(symbol: &str, body: &str) -> Result<StockSnapshot, FetchError> {
    let response: IntradayResponse = serde_json::from_str(body)?;
    ingest_intraday(symbol, response)
}

/// Convertit une réponse intraday en StockSnapshot
///
/// - Série absente ou vide : DataUnavailable (avec le message du fournisseur s'il y en a un)
/// - Entrée invalide : rejetée entièrement et loggée, les autres sont gardées
/// - Toutes les entrées invalides : MalformedResponse
pub fn ingest_intraday(symbol: &str, response: IntradayResponse) -> Result<StockSnapshot, FetchError> {
    let series = match response.series {
        Some(series) if !series.is_empty() => series,
        _ => {
            let reason = response
                .error_message
                .or(response.note)
                .or(response.information)
                .unwrap_or_else(|| format!("'{}' missing from response", SERIES_KEY));
            warn!(symbol = %symbol, reason = %reason, "No intraday series in response");
            return Err(FetchError::data_unavailable(symbol, reason));
        }
    };

    let time_zone = response
        .meta
        .as_ref()
        .and_then(|meta| meta.time_zone.as_deref())
        .map(parse_time_zone)
        .unwrap_or(Tz::UTC);

    let total = series.len();
    let mut bars = Vec::with_capacity(total);
    let mut rejected = 0;

    for (key, value) in series {
        match parse_entry(&key, value, time_zone) {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                rejected += 1;
                warn!(entry = %key, error = %e, "Rejected malformed quote entry");
            }
        }
    }

    debug!(
        parsed = bars.len(),
        total,
        rejected,
        time_zone = %time_zone,
        "Finished parsing intraday series"
    );

    StockSnapshot::from_bars(symbol, bars).ok_or_else(|| {
        error!(symbol = %symbol, total, "No valid quote entry found");
        FetchError::malformed(format!("all {} entries of '{}' are malformed", total, SERIES_KEY))
    })
}

/// Parse une entrée : timestamp + 4 prix, tout ou rien
fn parse_entry(key: &str, value: serde_json::Value, time_zone: Tz) -> Result<QuoteBar, FetchError> {
    let timestamp = parse_timestamp(key, time_zone)?;

    let raw: RawBar = serde_json::from_value(value)
        .map_err(|e| FetchError::malformed(format!("entry {}: {}", key, e)))?;

    Ok(QuoteBar::new(
        timestamp,
        parse_price(key, "1. open", &raw.open)?,
        parse_price(key, "2. high", &raw.high)?,
        parse_price(key, "3. low", &raw.low)?,
        parse_price(key, "4. close", &raw.close)?,
    ))
}

fn parse_price(key: &str, field: &str, value: &str) -> Result<f64, FetchError> {
    match value.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(FetchError::malformed(format!(
            "entry {}: field '{}' is not a number: {:?}",
            key, field, value
        ))),
    }
}

/// Parse un timestamp "YYYY-MM-DD HH:MM:SS" (ou "YYYY-MM-DD") dans le fuseau donné
fn parse_timestamp(key: &str, time_zone: Tz) -> Result<DateTime<Utc>, FetchError> {
    let naive = NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(key, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| FetchError::malformed(format!("invalid timestamp {:?}", key)))?;

    // Heure inexistante (passage à l'heure d'été) : entrée rejetée
    time_zone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| FetchError::malformed(format!("timestamp {:?} does not exist in {}", key, time_zone)))
}

fn parse_time_zone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(time_zone = %name, "Unknown time zone, assuming UTC");
        Tz::UTC
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
