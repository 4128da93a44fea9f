// ==========================================
// Pipeline FEC - Rapports d'analyse et d'import
// ==========================================
// Contrat de sortie consommé par l'interface de revue (JSON) et par
// l'appelant de l'import. Le rapport d'analyse est toujours complet,
// y compris en présence d'anomalies critiques: l'interface doit
// pouvoir expliquer pourquoi l'import est bloqué.
// ==========================================

use crate::domain::types::Severity;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Anomalies
// ==========================================

/// Anomalie critique (bloque l'import)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

/// Avertissement (n'empêche pas l'import, suggère une action)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyWarning {
    pub code: String,
    pub message: String,
    pub action: String,
}

/// Rapport d'anomalies agrégé
///
/// Invariant: critical non vide => import bloqué
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub critical: Vec<Anomaly>,
    pub warnings: Vec<AnomalyWarning>,
}

impl AnomalyReport {
    pub fn ready_for_import(&self) -> bool {
        self.critical.is_empty()
    }

    pub fn push_critical(&mut self, code: &str, message: String) {
        self.critical.push(Anomaly {
            code: code.to_string(),
            message,
            severity: Severity::Critical,
        });
    }

    pub fn push_warning(&mut self, code: &str, message: String, action: String) {
        self.warnings.push(AnomalyWarning {
            code: code.to_string(),
            message,
            action,
        });
    }
}

// ==========================================
// Rapport d'analyse (chemin sans persistance)
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Lignes non vides du fichier
    pub total_lines: usize,
    /// Lignes de données (après l'en-tête)
    pub data_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    pub separator: String,
    pub header_line: usize,
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedColumn {
    pub column: usize,
    pub original: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderInfo {
    pub mapped: Vec<MappedColumn>,
    /// Colonnes conservées en Custom_<origine>
    pub custom: Vec<String>,
    /// Champs obligatoires absents
    pub missing: Vec<String>,
    /// Collisions d'alias (dernier gagnant, signalé sans correction)
    pub collisions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStatistics {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub valid_rows: usize,
    pub distinct_accounts: usize,
    pub distinct_journals: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuality {
    pub rows_with_errors: usize,
    pub error_ratio: f64,
    /// Montants déclarés numériques illisibles (défaut 0 ou ignorés)
    pub amount_defaults: usize,
    /// Premières erreurs de ligne, pour diagnostic
    pub sample_errors: Vec<String>,
}

/// Rapport d'analyse complet, sérialisé tel quel vers l'interface de revue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: String,
    pub file_info: FileInfo,
    pub format: FormatInfo,
    pub headers: HeaderInfo,
    pub data_statistics: DataStatistics,
    pub data_quality: DataQuality,
    pub anomalies: AnomalyReport,
    pub recommendations: Vec<String>,
    pub ready_for_import: bool,
    pub exercice_detected: Option<i32>,
}

// ==========================================
// Résultat d'import (chemin avec persistance)
// ==========================================
// L'import réussit entièrement pour l'exercice détecté, ou échoue
// sans succès partiel silencieux
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub count: usize,
    pub errors: usize,
    pub accounts_created: usize,
    pub message: String,
}
