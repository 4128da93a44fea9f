// ==========================================
// Pipeline FEC - Couche domaine
// ==========================================
// Responsabilité: entités et types du domaine comptable
// Interdit: aucune logique d'accès aux données, aucune logique moteur
// ==========================================

pub mod compte;
pub mod ecriture;
pub mod rapport;
pub mod types;

// Ré-exports des types principaux
pub use compte::{ImportBatchRecord, RootAccount};
pub use ecriture::{DetectedFormat, FecEntry, ImportStatistics, NormalizedHeader, RowError};
pub use rapport::{
    AnalysisReport, Anomaly, AnomalyReport, AnomalyWarning, DataQuality, DataStatistics,
    FileInfo, FormatInfo, HeaderInfo, ImportOutcome, MappedColumn,
};
pub use types::{AccountType, ColumnTarget, Encoding, FecField, Separator, Severity};
