// ==========================================
// Pipeline FEC - Couche moteur
// ==========================================
// Responsabilité: détection de format, normalisation d'en-tête,
// parsing ligne à ligne, classification d'anomalies, hiérarchie de
// comptes, orchestration de l'import
// Interdit: aucune requête SQL directe, tout accès passe par les
// repositories
// ==========================================

pub mod anomaly_classifier;
pub mod error;
pub mod format_detector;
pub mod header_normalizer;
pub mod hierarchy;
pub mod importer;
pub mod row_parser;

// Ré-exports du moteur
pub use anomaly_classifier::AnomalyClassifier;
pub use error::ImportError;
pub use format_detector::FormatDetector;
pub use header_normalizer::{AliasTable, HeaderNormalizer};
pub use hierarchy::HierarchyBuilder;
pub use importer::FecImporter;
pub use row_parser::RowParser;
