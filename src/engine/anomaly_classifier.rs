// ==========================================
// Pipeline FEC - Classification des anomalies
// ==========================================
// Responsabilité: agréger les statistiques d'import en anomalies
// critiques (bloquantes) et avertissements (informatifs), produire la
// recommandation de synthèse
// Invariant: critical non vide => ready_for_import = false
// ==========================================
// La synthèse (comptes, journaux, lignes valides, totaux débit/crédit)
// est toujours produite, quel que soit le verdict: traçabilité d'audit.
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::ecriture::ImportStatistics;
use crate::domain::rapport::AnomalyReport;
use rust_decimal::Decimal;
use std::error::Error;
use std::sync::Arc;

// ===== Codes d'anomalies critiques =====
pub const BALANCE_UNBALANCED: &str = "BALANCE_UNBALANCED";
pub const TOO_MANY_ERRORS: &str = "TOO_MANY_ERRORS";
pub const NO_VALID_DATA: &str = "NO_VALID_DATA";

// ===== Codes d'avertissements =====
pub const MINOR_BALANCE_DIFF: &str = "MINOR_BALANCE_DIFF";
pub const LOW_DATA_VOLUME: &str = "LOW_DATA_VOLUME";
pub const NON_EUR_CURRENCY: &str = "NON_EUR_CURRENCY";

// ==========================================
// AnomalyClassifier
// ==========================================
pub struct AnomalyClassifier<C>
where
    C: ImportConfigReader,
{
    config: Arc<C>,
}

impl<C> AnomalyClassifier<C>
where
    C: ImportConfigReader,
{
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// Classe les anomalies et produit la synthèse
    ///
    /// # Retour
    /// - (AnomalyReport, recommandations de synthèse)
    pub async fn classify(
        &self,
        stats: &ImportStatistics,
    ) -> Result<(AnomalyReport, Vec<String>), Box<dyn Error>> {
        let mut report = AnomalyReport::default();

        // === Équilibre débit/crédit ===
        let diff = stats.balance_diff();
        let mut balance_blocked = false;

        // évalué seulement quand le total débit est non nul
        if stats.total_debit > Decimal::ZERO {
            let tolerance = self.config.get_balance_tolerance_ratio().await?;
            let ratio = diff / stats.total_debit;
            if ratio > tolerance {
                balance_blocked = true;
                report.push_critical(
                    BALANCE_UNBALANCED,
                    format!(
                        "balance déséquilibrée: écart de {} € ({} % du total débit)",
                        diff,
                        (ratio * Decimal::from(100)).round_dp(4)
                    ),
                );
            }
        }

        // écart mineur: strictement entre les deux bornes, et seulement
        // si le seuil bloquant n'a pas déjà tranché le même écart
        if !balance_blocked {
            let min = self.config.get_minor_diff_min_eur().await?;
            let max = self.config.get_minor_diff_max_eur().await?;
            if diff > min && diff < max {
                report.push_warning(
                    MINOR_BALANCE_DIFF,
                    format!("écart débit/crédit de {} € (bruit d'arrondi probable)", diff),
                    "vérifier les arrondis du logiciel source".to_string(),
                );
            }
        }

        // === Qualité des lignes ===
        let total_rows = stats.valid_rows + stats.error_rows;
        if total_rows > 0 {
            let tolerance = self.config.get_error_rows_tolerance_ratio().await?;
            let ratio = stats.error_rows as f64 / total_rows as f64;
            if ratio > tolerance {
                report.push_critical(
                    TOO_MANY_ERRORS,
                    format!(
                        "{} lignes en erreur sur {} ({:.1} %)",
                        stats.error_rows,
                        total_rows,
                        ratio * 100.0
                    ),
                );
            }
        }

        if stats.valid_rows == 0 {
            report.push_critical(
                NO_VALID_DATA,
                "aucune ligne de données exploitable".to_string(),
            );
        }

        // === Avertissements non bloquants ===
        let low_volume = self.config.get_low_volume_threshold().await?;
        if stats.valid_rows > 0 && stats.valid_rows < low_volume {
            report.push_warning(
                LOW_DATA_VOLUME,
                format!("seulement {} lignes valides", stats.valid_rows),
                "vérifier que le fichier couvre bien tout l'exercice".to_string(),
            );
        }

        let reference = self.config.get_reference_currency().await?;
        if let Some(currency) = &stats.currency {
            if currency != &reference {
                report.push_warning(
                    NON_EUR_CURRENCY,
                    format!("devise détectée: {} (référence: {})", currency, reference),
                    "les montants sont enregistrés sans conversion".to_string(),
                );
            }
        }

        let recommendations = Self::build_recommendations(stats, &report);

        Ok((report, recommendations))
    }

    /// Synthèse d'audit, toujours émise quel que soit le verdict
    fn build_recommendations(stats: &ImportStatistics, report: &AnomalyReport) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} lignes valides, {} comptes, {} journaux",
                stats.valid_rows,
                stats.distinct_accounts(),
                stats.distinct_journals()
            ),
            format!(
                "total débit {} €, total crédit {} €",
                stats.total_debit, stats.total_credit
            ),
        ];

        if report.ready_for_import() {
            lines.push("aucune anomalie bloquante, import possible".to_string());
        } else {
            let codes: Vec<&str> = report.critical.iter().map(|a| a.code.as_str()).collect();
            lines.push(format!(
                "import bloqué par {} anomalie(s) critique(s): {}",
                report.critical.len(),
                codes.join(", ")
            ));
        }

        lines
    }
}
