// ============================================================================
// LazyDash - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Clients HTTP (cotations, géocodage, météo)
pub mod app;       // État de l'application
pub mod config;    // Configuration (fichier TOML + variables d'environnement)
pub mod error;     // Erreurs de récupération
pub mod models;    // Structures de données
pub mod ui;        // Interface utilisateur
