// ==========================================
// Pipeline FEC - Bibliothèque principale
// ==========================================
// Périmètre: ingestion tolérante de fichiers FEC (18 champs obligatoires),
// validation structurelle et comptable, persistance par exercice
// Stack: Rust + SQLite
// ==========================================

// ==========================================
// Déclaration des modules
// ==========================================

// Couche domaine - entités et types
pub mod domain;

// Couche repository - accès aux données
pub mod repository;

// Couche moteur - détection, normalisation, parsing, anomalies
pub mod engine;

// Couche configuration - seuils et paramètres
pub mod config;

// Infrastructure base de données (connexion / PRAGMA / schéma)
pub mod db;

// Journalisation
pub mod logging;

// ==========================================
// Ré-exports des types principaux
// ==========================================

// Types domaine
pub use domain::types::{AccountType, Encoding, FecField, Separator, Severity};

// Entités domaine
pub use domain::{
    AnomalyReport, DetectedFormat, FecEntry, ImportStatistics, NormalizedHeader, RootAccount,
    RowError,
};

// Moteur
pub use engine::{
    AnomalyClassifier, FecImporter, FormatDetector, HeaderNormalizer, HierarchyBuilder, RowParser,
};

// Configuration
pub use config::{ConfigManager, ImportConfigReader};

/// Version du crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
