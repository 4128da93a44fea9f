// ==========================================
// Pipeline FEC - Orchestrateur d'import
// ==========================================
// Responsabilité: enchaîner détection de format → normalisation
// d'en-tête → parsing ligne à ligne → classification d'anomalies →
// [porte: ready_for_import] → hiérarchie de comptes → persistance
// Interdit: aucune logique d'interface, uniquement traitement de
// données; tout accès base passe par les repositories
// ==========================================
// Deux chemins:
// - analyse_file: sans effet de bord, rejouable à volonté, rapport
//   complet même en présence d'anomalies critiques (l'interface de
//   revue doit pouvoir expliquer le blocage)
// - import_file: remplace l'exercice détecté puis insère par lots;
//   réussit entièrement ou échoue sans succès partiel silencieux
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::compte::ImportBatchRecord;
use crate::domain::ecriture::{FecEntry, ImportStatistics, NormalizedHeader, RowError};
use crate::domain::rapport::{
    AnalysisReport, DataQuality, DataStatistics, FileInfo, FormatInfo, HeaderInfo, ImportOutcome,
    MappedColumn,
};
use crate::domain::types::ColumnTarget;
use crate::engine::anomaly_classifier::AnomalyClassifier;
use crate::engine::error::ImportError;
use crate::engine::format_detector::FormatDetector;
use crate::engine::header_normalizer::{AliasTable, HeaderNormalizer};
use crate::engine::hierarchy::HierarchyBuilder;
use crate::engine::row_parser::RowParser;
use crate::repository::{CompteRepository, EcritureRepository};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Nombre maximal d'erreurs de ligne restituées dans le rapport
const SAMPLE_ERRORS_LIMIT: usize = 10;

/// Produit interne du chemin d'analyse, réutilisé par l'import
struct AnalysisOutcome {
    report: AnalysisReport,
    entries: Vec<FecEntry>,
    stats: ImportStatistics,
}

// ==========================================
// FecImporter - orchestrateur
// ==========================================
/// Orchestrateur du pipeline FEC
///
/// # Étapes (import)
/// 1. Lecture et décodage du fichier (une seule passe en mémoire)
/// 2. Détection séparateur / en-tête / encodage
/// 3. Normalisation d'en-tête par table d'alias
/// 4. Parsing ligne à ligne (erreurs récupérées localement)
/// 5. Classification d'anomalies (porte d'import)
/// 6. Création des comptes racines manquants
/// 7. Remplacement de l'exercice puis insertion par lots
/// 8. Reconstruction des soldes et traçabilité du lot
pub struct FecImporter<E: ?Sized, A: ?Sized, C>
where
    E: EcritureRepository,
    A: CompteRepository,
    C: ImportConfigReader,
{
    ecritures: Arc<E>,
    comptes: Arc<A>,
    config: Arc<C>,
    aliases: AliasTable,
}

impl<E: ?Sized, A: ?Sized, C> FecImporter<E, A, C>
where
    E: EcritureRepository,
    A: CompteRepository,
    C: ImportConfigReader,
{
    /// Crée un orchestrateur avec la table d'alias par défaut
    ///
    /// # Paramètres
    /// - ecritures: repository des écritures
    /// - comptes: repository du plan de comptes
    /// - config: lecteur de configuration des seuils
    pub fn new(ecritures: Arc<E>, comptes: Arc<A>, config: Arc<C>) -> Self {
        Self {
            ecritures,
            comptes,
            config,
            aliases: AliasTable::default(),
        }
    }

    /// Variante avec table d'alias personnalisée (tests, cas clients)
    pub fn with_aliases(
        ecritures: Arc<E>,
        comptes: Arc<A>,
        config: Arc<C>,
        aliases: AliasTable,
    ) -> Self {
        Self {
            ecritures,
            comptes,
            config,
            aliases,
        }
    }

    // ==========================================
    // Chemin analyse (sans persistance)
    // ==========================================

    /// Analyse un fichier sans rien persister
    ///
    /// Rejouable sans risque: aucune écriture en base. Le rapport est
    /// complet même quand des anomalies critiques bloquent l'import.
    pub async fn analyse_file(&self, file_path: &str) -> Result<AnalysisReport, ImportError> {
        let outcome = self.analyse_inner(file_path).await?;
        Ok(outcome.report)
    }

    async fn analyse_inner(&self, file_path: &str) -> Result<AnalysisOutcome, ImportError> {
        let file_name = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());

        // === Étape 1: lecture et décodage ===
        let bytes = std::fs::read(file_path)?;
        let (content, encoding) = FormatDetector::decode(&bytes);

        let lines: Vec<String> = content
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.trim().is_empty())
            .collect();

        // === Étape 2: détection du format ===
        let format = FormatDetector::detect(&lines, encoding)?;
        tracing::info!(
            file = file_name.as_str(),
            separator = %format.separator,
            header_line = format.header_line_index,
            encoding = %format.encoding,
            "format détecté"
        );

        // === Étape 3: normalisation de l'en-tête ===
        let header_line = &lines[format.header_line_index];
        let normalizer = HeaderNormalizer::new(self.aliases.clone());
        let header = normalizer.normalize(header_line, format.separator);

        // === Étape 4: parsing ligne à ligne ===
        let data_lines = &lines[format.header_line_index + 1..];
        let (entries, stats) = self.parse_data_lines(
            data_lines,
            &header,
            format.separator,
            format.header_line_index,
        );

        tracing::info!(
            valid = stats.valid_rows,
            errors = stats.error_rows,
            "parsing terminé"
        );

        // === Étape 5: classification des anomalies ===
        let classifier = AnomalyClassifier::new(Arc::clone(&self.config));
        let (anomalies, recommendations) = classifier
            .classify(&stats)
            .await
            .map_err(|e| ImportError::Other(anyhow::anyhow!("{e}")))?;

        let ready_for_import = anomalies.ready_for_import();

        let report = AnalysisReport {
            status: "ok".to_string(),
            file_info: FileInfo {
                name: file_name,
                total_lines: lines.len(),
                data_lines: data_lines.len(),
            },
            format: FormatInfo {
                separator: format.separator.to_string(),
                header_line: format.header_line_index,
                encoding: format.encoding.to_string(),
            },
            headers: Self::header_info(header_line, format, &header),
            data_statistics: DataStatistics {
                total_debit: stats.total_debit,
                total_credit: stats.total_credit,
                valid_rows: stats.valid_rows,
                distinct_accounts: stats.distinct_accounts(),
                distinct_journals: stats.distinct_journals(),
                date_min: stats.date_min,
                date_max: stats.date_max,
                currency: stats.currency.clone(),
            },
            data_quality: DataQuality {
                rows_with_errors: stats.error_rows,
                error_ratio: stats.error_ratio(),
                amount_defaults: stats.amount_defaults,
                sample_errors: stats
                    .row_errors
                    .iter()
                    .take(SAMPLE_ERRORS_LIMIT)
                    .map(|e| e.to_string())
                    .collect(),
            },
            anomalies,
            recommendations,
            ready_for_import,
            exercice_detected: stats.exercice,
        };

        Ok(AnalysisOutcome {
            report,
            entries,
            stats,
        })
    }

    /// Boucle de parsing: découpage csv au séparateur détecté,
    /// tolérance de colonnes, exercice épinglé sur la première ligne valide
    fn parse_data_lines(
        &self,
        data_lines: &[String],
        header: &NormalizedHeader,
        separator: crate::domain::types::Separator,
        header_line_index: usize,
    ) -> (Vec<FecEntry>, ImportStatistics) {
        let mut stats = ImportStatistics::new();
        let mut entries = Vec::with_capacity(data_lines.len());

        let joined = data_lines.join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator.as_byte())
            .has_headers(false)
            .flexible(true)
            .from_reader(joined.as_bytes());

        let parser = RowParser::new(header);

        for (offset, result) in reader.records().enumerate() {
            // numéro de ligne dans le fichier, base 1, en-tête comprise
            let row_number = header_line_index + 2 + offset;

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    stats.record_error(RowError {
                        row_number,
                        field: None,
                        message: format!("ligne illisible: {}", e),
                    });
                    continue;
                }
            };

            match parser.parse_record(&record, row_number, stats.exercice) {
                Ok(parsed) => {
                    stats.amount_defaults += parsed.amount_defaults;
                    stats.record_valid(&parsed.entry);
                    entries.push(parsed.entry);
                }
                Err(error) => {
                    tracing::debug!(error = %error, "ligne écartée");
                    stats.record_error(error);
                }
            }
        }

        (entries, stats)
    }

    fn header_info(
        header_line: &str,
        format: crate::domain::ecriture::DetectedFormat,
        header: &NormalizedHeader,
    ) -> HeaderInfo {
        let originals: Vec<&str> = header_line.split(format.separator.as_char()).collect();

        let mut mapped = Vec::new();
        let mut custom = Vec::new();
        for (index, target) in header.columns.iter().enumerate() {
            let original = originals.get(index).map(|s| s.trim()).unwrap_or("");
            match target {
                ColumnTarget::Fec(field) => mapped.push(MappedColumn {
                    column: index,
                    original: original.to_string(),
                    field: field.as_str().to_string(),
                }),
                ColumnTarget::Custom(_) => custom.push(target.label()),
            }
        }

        HeaderInfo {
            mapped,
            custom,
            missing: header.missing.iter().map(|f| f.as_str().to_string()).collect(),
            collisions: header.collisions.clone(),
        }
    }

    // ==========================================
    // Chemin import (avec persistance)
    // ==========================================

    /// Importe un fichier pour son exercice détecté
    ///
    /// L'exercice est remplacé (suppression puis insertion par lots):
    /// ré-importer le même fichier ne duplique rien, importer un
    /// fichier corrigé remplace entièrement le précédent.
    pub async fn import_file(&self, file_path: &str) -> Result<ImportOutcome, ImportError> {
        let start_time = std::time::Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        let outcome = self.analyse_inner(file_path).await?;
        let AnalysisOutcome {
            report,
            entries,
            stats,
        } = outcome;

        // === Porte d'import: anomalies critiques ===
        if !report.ready_for_import {
            let codes: Vec<&str> = report
                .anomalies
                .critical
                .iter()
                .map(|a| a.code.as_str())
                .collect();
            let message = format!("import bloqué: {}", codes.join(", "));
            tracing::warn!(batch_id = batch_id.as_str(), reason = message.as_str(), "import refusé");

            self.record_batch(
                &batch_id,
                &report.file_info.name,
                stats.exercice,
                0,
                stats.error_rows,
                0,
                start_time.elapsed().as_millis() as i64,
                "BLOCKED",
            )
            .await;

            return Ok(ImportOutcome {
                success: false,
                count: 0,
                errors: stats.error_rows,
                accounts_created: 0,
                message,
            });
        }

        let exercice = stats.exercice.ok_or_else(|| {
            // NO_VALID_DATA aurait bloqué en amont, ceci est défensif
            ImportError::Persistence("exercice non détecté".to_string())
        })?;

        // === Persistance: tout échec laisse une trace FAILED ===
        let (inserted, accounts_created) =
            match self.persist_entries(exercice, &entries, &stats).await {
                Ok(counts) => counts,
                Err(e) => {
                    self.record_batch(
                        &batch_id,
                        &report.file_info.name,
                        Some(exercice),
                        0,
                        stats.error_rows,
                        0,
                        start_time.elapsed().as_millis() as i64,
                        "FAILED",
                    )
                    .await;
                    return Err(e);
                }
            };

        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        self.record_batch(
            &batch_id,
            &report.file_info.name,
            Some(exercice),
            inserted,
            stats.error_rows,
            accounts_created,
            elapsed_ms,
            "SUCCESS",
        )
        .await;

        tracing::info!(
            batch_id = batch_id.as_str(),
            exercice,
            inserted,
            errors = stats.error_rows,
            accounts_created,
            elapsed_ms,
            "import terminé"
        );

        Ok(ImportOutcome {
            success: true,
            count: inserted,
            errors: stats.error_rows,
            accounts_created,
            message: format!(
                "{} écritures importées pour l'exercice {}",
                inserted, exercice
            ),
        })
    }

    /// Phase de persistance: comptes racines, remplacement d'exercice,
    /// insertion par lots, soldes
    ///
    /// # Retour
    /// - Ok((écritures insérées, comptes racines créés))
    async fn persist_entries(
        &self,
        exercice: i32,
        entries: &[FecEntry],
        stats: &ImportStatistics,
    ) -> Result<(usize, usize), ImportError> {
        // === Comptes racines manquants (avant persistance) ===
        let hierarchy = HierarchyBuilder::new(Arc::clone(&self.comptes));
        let created = hierarchy
            .ensure_roots(&stats.account_labels)
            .await
            .map_err(|e| ImportError::Persistence(e.to_string()))?;

        // === Remplacement de l'exercice, exactement une fois ===
        let deleted = self
            .ecritures
            .delete_exercice(exercice)
            .await
            .map_err(|e| ImportError::Persistence(e.to_string()))?;
        if deleted > 0 {
            tracing::info!(exercice, deleted, "écritures précédentes remplacées");
        }

        // === Insertion par lots ===
        let batch_size = self
            .config
            .get_insert_batch_size()
            .await
            .map_err(|e| ImportError::Other(anyhow::anyhow!("{e}")))?
            .max(1);

        let mut inserted = 0;
        for chunk in entries.chunks(batch_size) {
            inserted += self
                .ecritures
                .insert_batch(chunk)
                .await
                .map_err(|e| ImportError::Persistence(e.to_string()))?;
        }

        // === Soldes agrégés (dérivation pure, rejouable) ===
        self.ecritures
            .rebuild_soldes(exercice)
            .await
            .map_err(|e| ImportError::Persistence(e.to_string()))?;

        Ok((inserted, created.len()))
    }

    /// Trace le lot d'import (audit, jamais bloquant)
    #[allow(clippy::too_many_arguments)]
    async fn record_batch(
        &self,
        batch_id: &str,
        file_name: &str,
        exercice: Option<i32>,
        inserted_count: usize,
        error_count: usize,
        accounts_created: usize,
        elapsed_ms: i64,
        outcome: &str,
    ) {
        let record = ImportBatchRecord {
            batch_id: batch_id.to_string(),
            file_name: file_name.to_string(),
            exercice,
            inserted_count,
            error_count,
            accounts_created,
            elapsed_ms,
            outcome: outcome.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.ecritures.insert_import_batch(&record).await {
            tracing::warn!(error = %e, "échec d'enregistrement du lot d'import");
        }
    }
}
