// ============================================================================
// Module : config
// ============================================================================
// Configuration des fournisseurs de données (endpoints, user-agent, clé d'API)
//
// Ordre de priorité (le dernier gagne) :
// 1. Valeurs par défaut
// 2. Fichier TOML : ./lazydash.toml, sinon ~/.config/lazydash/config.toml
// 3. Variable d'environnement ALPHA_VANTAGE_API_KEY
//
// La clé d'API est injectée dans le client qui en a besoin (pas de globale).
// Son absence fait échouer la construction du client, avant toute requête.
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Nom de la variable d'environnement contenant la clé Alpha Vantage
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// Nom du fichier de config dans le répertoire courant
const LOCAL_CONFIG_FILE: &str = "lazydash.toml";

/// Erreurs de configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing Alpha Vantage API key (set ALPHA_VANTAGE_API_KEY or alpha_vantage_api_key in lazydash.toml)")]
    MissingApiKey,

    #[error("failed to read config file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Configuration de l'application
///
/// CONCEPT RUST : #[serde(default)]
/// - Chaque champ absent du fichier prend la valeur de Default
/// - Un fichier vide est donc une config valide
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clé d'API Alpha Vantage (fournisseur de cotations)
    pub alpha_vantage_api_key: Option<String>,

    /// Endpoint des cotations intraday
    pub quote_base_url: String,

    /// Endpoint du géocodage (Nominatim)
    pub geocode_base_url: String,

    /// Endpoint des prévisions météo (Open-Meteo)
    pub weather_base_url: String,

    /// User-Agent envoyé à tous les fournisseurs (exigé par Nominatim)
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            quote_base_url: "https://www.alphavantage.co".to_string(),
            geocode_base_url: "https://nominatim.openstreetmap.org".to_string(),
            weather_base_url: "https://api.open-meteo.com".to_string(),
            user_agent: concat!("lazydash/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// La clé ne doit jamais finir dans les logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "alpha_vantage_api_key",
                &self.alpha_vantage_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("quote_base_url", &self.quote_base_url)
            .field("geocode_base_url", &self.geocode_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Config {
    /// Charge la configuration depuis les emplacements par défaut + l'environnement
    ///
    /// Un fichier absent n'est pas une erreur, un fichier illisible ou invalide l'est.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Charge la configuration depuis un fichier TOML précis
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self::from_toml_str(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse une configuration TOML (retourne le message d'erreur du parser)
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Applique la clé d'API venant de l'environnement (prioritaire sur le fichier)
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using Alpha Vantage API key from environment");
            self.alpha_vantage_api_key = Some(key);
        }
    }

    /// Retourne la clé d'API validée (présente et non vide)
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.alpha_vantage_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Cherche le fichier de config : répertoire courant puis répertoire utilisateur
    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("lazydash").join("config.toml"))
            .filter(|path| path.is_file())
    }
}
