// ==========================================
// Pipeline FEC - Écritures et structures d'ingestion
// ==========================================
// Référence: format FEC, 18 champs obligatoires, dates AAAAMMJJ
// Cycle de vie: DetectedFormat / NormalizedHeader / RowError /
// ImportStatistics sont transitoires (portée: un appel d'import);
// seule FecEntry est persistée
// ==========================================

use crate::domain::types::{ColumnTarget, Encoding, FecField, Separator};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// ==========================================
// DetectedFormat - structure détectée du fichier
// ==========================================
// Invariant: header_line_index < 10 (l'en-tête est cherchée
// dans les 10 premières lignes seulement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedFormat {
    pub separator: Separator,
    pub header_line_index: usize,
    pub encoding: Encoding,
}

// ==========================================
// NormalizedHeader - en-tête réconciliée
// ==========================================
// Chaque colonne d'origine est soit mappée vers un champ FEC
// canonique, soit conservée en Custom_<origine>.
// En cas de collision d'alias, le dernier gagne (ambiguïté connue,
// signalée dans `collisions` sans être corrigée).
#[derive(Debug, Clone)]
pub struct NormalizedHeader {
    /// Cible de chaque colonne, dans l'ordre d'origine
    pub columns: Vec<ColumnTarget>,
    /// Index de colonne par champ canonique (dernier alias gagnant)
    pub index_of: HashMap<FecField, usize>,
    /// Champs obligatoires absents de l'en-tête
    pub missing: Vec<FecField>,
    /// Collisions d'alias détectées (descriptions lisibles)
    pub collisions: Vec<String>,
}

impl NormalizedHeader {
    /// Nombre de colonnes de l'en-tête d'origine
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index de la colonne portant un champ canonique
    pub fn field_index(&self, field: FecField) -> Option<usize> {
        self.index_of.get(&field).copied()
    }
}

// ==========================================
// FecEntry - écriture comptable normalisée
// ==========================================
// Une par ligne de données valide. Débit et crédit sont toujours >= 0,
// le signe est porté par le choix de colonne, jamais par le montant.
// exercice = année de l'EcritureDate de la première ligne valide du
// fichier (constante pour tout le fichier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FecEntry {
    pub journal_code: String,
    pub journal_lib: String,
    pub ecriture_num: String,
    pub ecriture_date: NaiveDate,
    pub compte_num: String,
    pub compte_lib: String,
    pub comp_aux_num: Option<String>,
    pub comp_aux_lib: Option<String>,
    pub piece_ref: Option<String>,
    pub piece_date: Option<NaiveDate>,
    pub ecriture_lib: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub ecriture_let: Option<String>,
    pub date_let: Option<NaiveDate>,
    pub valid_date: Option<NaiveDate>,
    pub montant_devise: Option<Decimal>,
    pub id_devise: String,
    pub exercice: i32,
}

// ==========================================
// RowError - erreur de ligne récupérable
// ==========================================
// Une ligne en erreur est ignorée et comptée, jamais fatale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Numéro de ligne dans le fichier (base 1, en-tête comprise)
    pub row_number: usize,
    /// Champ en cause, si identifiable
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "ligne {} [{}]: {}", self.row_number, field, self.message),
            None => write!(f, "ligne {}: {}", self.row_number, self.message),
        }
    }
}

// ==========================================
// ImportStatistics - statistiques d'un import
// ==========================================
// Accumulées pendant la boucle de parsing, consommées par le
// classifieur d'anomalies et le rapport d'analyse
#[derive(Debug, Clone, Default)]
pub struct ImportStatistics {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub row_errors: Vec<RowError>,
    /// Montants déclarés numériques illisibles: 0 par défaut sur
    /// débit/crédit, ignorés sur le montant en devise (visibilité sur
    /// le comportement par défaut, voir data_quality)
    pub amount_defaults: usize,
    /// Comptes distincts → premier libellé observé
    pub account_labels: BTreeMap<String, String>,
    pub journals: BTreeSet<String>,
    /// Exercice épinglé sur la première ligne valide
    pub exercice: Option<i32>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    /// Première devise non vide observée
    pub currency: Option<String>,
}

impl ImportStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intègre une écriture valide dans les agrégats
    pub fn record_valid(&mut self, entry: &FecEntry) {
        self.total_debit += entry.debit;
        self.total_credit += entry.credit;
        self.valid_rows += 1;

        self.account_labels
            .entry(entry.compte_num.clone())
            .or_insert_with(|| entry.compte_lib.clone());
        self.journals.insert(entry.journal_code.clone());

        if self.exercice.is_none() {
            self.exercice = Some(entry.exercice);
        }

        self.date_min = Some(match self.date_min {
            Some(d) if d <= entry.ecriture_date => d,
            _ => entry.ecriture_date,
        });
        self.date_max = Some(match self.date_max {
            Some(d) if d >= entry.ecriture_date => d,
            _ => entry.ecriture_date,
        });

        if self.currency.is_none() && !entry.id_devise.is_empty() {
            self.currency = Some(entry.id_devise.clone());
        }
    }

    /// Compte une ligne en erreur (récupérée localement)
    pub fn record_error(&mut self, error: RowError) {
        self.error_rows += 1;
        self.row_errors.push(error);
    }

    /// Écart absolu débit/crédit
    pub fn balance_diff(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }

    /// Part de lignes en erreur sur l'ensemble des lignes de données
    pub fn error_ratio(&self) -> f64 {
        let total = self.valid_rows + self.error_rows;
        if total == 0 {
            0.0
        } else {
            self.error_rows as f64 / total as f64
        }
    }

    pub fn distinct_accounts(&self) -> usize {
        self.account_labels.len()
    }

    pub fn distinct_journals(&self) -> usize {
        self.journals.len()
    }
}
