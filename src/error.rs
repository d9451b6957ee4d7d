// ============================================================================
// Module : error
// ============================================================================
// Taxonomie des erreurs de récupération de données
//
// Chaque widget convertit ces erreurs en un seul message pour l'utilisateur
// (voir app.rs et LookupResult). Aucune erreur structurée ne va jusqu'au rendu.
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error automatiquement
// - #[error("...")] génère l'implémentation de Display
// - #[from] génère un From<T> pour utiliser ? directement
// ============================================================================

use thiserror::Error;

use crate::config::ConfigError;

/// Erreur terminale d'une requête (aucun retry automatique)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Le fournisseur a répondu mais la série attendue est absente ou vide
    #[error("no data available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Aucun lieu ne correspond à la recherche
    #[error("no place matches '{query}'")]
    NotFound { query: String },

    /// Échec de transport ou statut HTTP non-succès
    #[error("network error: {0}")]
    Network(String),

    /// Réponse présente mais pas décodable dans la forme attendue
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration invalide (clé d'API absente, etc.)
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FetchError {
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(query: impl Into<String>) -> Self {
        FetchError::NotFound {
            query: query.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        FetchError::MalformedResponse(message.into())
    }

    /// Nom court du type d'erreur, pour les logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::DataUnavailable { .. } => "data_unavailable",
            FetchError::NotFound { .. } => "not_found",
            FetchError::Network(_) => "network",
            FetchError::MalformedResponse(_) => "malformed_response",
            FetchError::Config(_) => "config",
        }
    }
}

// ============================================================================
// Conversion depuis reqwest
// ============================================================================
// Une erreur de décodage du body veut dire que le serveur a répondu avec
// une forme inattendue : c'est une MalformedResponse, pas un problème réseau.
// ============================================================================

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            FetchError::MalformedResponse(error.to_string())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::MalformedResponse(error.to_string())
    }
}
