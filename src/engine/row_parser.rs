// ==========================================
// Pipeline FEC - Parsing ligne à ligne
// ==========================================
// Responsabilité: transformer une ligne de données en écriture typée
// Sortie: Result<ParsedRow, RowError> par ligne — une ligne en erreur
// est ignorée et comptée, jamais fatale (pas d'exception comme flux
// de contrôle)
// ==========================================
// Coercition des montants: espaces (y compris insécables) retirés,
// virgule remplacée par un point, valeur absolue (le signe est porté
// par le choix de colonne débit/crédit, pas par le montant). Un
// montant déclaré numérique illisible est compté et journalisé:
// 0 par défaut sur débit/crédit, absent sur le montant en devise
// (comportement historique conservé, voir DESIGN.md).
// Coercition des dates: chemin rapide AAAAMMJJ, puis formats de repli
// fixes, puis inférence générique. Seule EcritureDate est obligatoire.
// ==========================================

use crate::domain::ecriture::{FecEntry, NormalizedHeader, RowError};
use crate::domain::types::FecField;
use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Tolérance de colonnes de fin manquantes par ligne
pub const COLUMN_COUNT_TOLERANCE: usize = 5;

/// Formats de date de repli, essayés dans l'ordre
pub const FALLBACK_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y", "%m-%d-%Y",
];

/// Devise par défaut quand IdDevise est vide ou absent
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Ligne parsée avec son comptage de montants défaillants
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub entry: FecEntry,
    /// Montants déclarés numériques illisibles sur cette ligne
    pub amount_defaults: usize,
}

// ==========================================
// RowParser
// ==========================================
pub struct RowParser<'h> {
    header: &'h NormalizedHeader,
}

impl<'h> RowParser<'h> {
    pub fn new(header: &'h NormalizedHeader) -> Self {
        Self { header }
    }

    /// Parse une ligne de données déjà découpée en champs
    ///
    /// # Paramètres
    /// - record: champs de la ligne (découpage csv, séparateur détecté)
    /// - row_number: numéro de ligne dans le fichier (base 1)
    /// - pinned_exercice: exercice épinglé par la première ligne valide
    ///   (None tant qu'aucune ligne n'a été parsée)
    pub fn parse_record(
        &self,
        record: &StringRecord,
        row_number: usize,
        pinned_exercice: Option<i32>,
    ) -> Result<ParsedRow, RowError> {
        let expected = self.header.column_count();
        let actual = record.len();

        if expected.abs_diff(actual) > COLUMN_COUNT_TOLERANCE {
            return Err(RowError {
                row_number,
                field: None,
                message: format!(
                    "nombre de colonnes incohérent: {} au lieu de {}",
                    actual, expected
                ),
            });
        }

        // EcritureDate est le seul champ à échec bloquant pour la ligne
        let ecriture_date_raw = self.field(record, FecField::EcritureDate);
        let ecriture_date = parse_date(ecriture_date_raw).ok_or_else(|| RowError {
            row_number,
            field: Some(FecField::EcritureDate.as_str().to_string()),
            message: format!("date d'écriture illisible: \"{}\"", ecriture_date_raw),
        })?;

        let mut amount_defaults = 0;
        let debit = self.amount_field(record, FecField::Debit, row_number, &mut amount_defaults);
        let credit = self.amount_field(record, FecField::Credit, row_number, &mut amount_defaults);

        let id_devise_raw = self.field(record, FecField::IdDevise).trim();
        let id_devise = if id_devise_raw.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            id_devise_raw.to_string()
        };

        // MontantDevise est optionnel mais déclaré numérique: illisible
        // reste absent, compté et journalisé comme débit/crédit
        let montant_devise = match parse_amount(self.field(record, FecField::MontantDevise)) {
            AmountParse::Value(value) => Some(value),
            AmountParse::Empty => None,
            AmountParse::Unparseable(raw) => {
                amount_defaults += 1;
                tracing::warn!(
                    row = row_number,
                    field = FecField::MontantDevise.as_str(),
                    raw = raw.as_str(),
                    "montant illisible ignoré"
                );
                None
            }
        };

        // L'exercice de la première ligne valide vaut pour tout le
        // fichier (un export FEC couvre un exercice unique)
        let exercice = pinned_exercice.unwrap_or_else(|| ecriture_date.year());

        let entry = FecEntry {
            journal_code: self.text_field(record, FecField::JournalCode),
            journal_lib: self.text_field(record, FecField::JournalLib),
            ecriture_num: self.text_field(record, FecField::EcritureNum),
            ecriture_date,
            compte_num: self.text_field(record, FecField::CompteNum),
            compte_lib: self.text_field(record, FecField::CompteLib),
            comp_aux_num: self.optional_field(record, FecField::CompAuxNum),
            comp_aux_lib: self.optional_field(record, FecField::CompAuxLib),
            piece_ref: self.optional_field(record, FecField::PieceRef),
            piece_date: parse_date(self.field(record, FecField::PieceDate)),
            ecriture_lib: self.text_field(record, FecField::EcritureLib),
            debit,
            credit,
            ecriture_let: self.optional_field(record, FecField::EcritureLet),
            date_let: parse_date(self.field(record, FecField::DateLet)),
            valid_date: parse_date(self.field(record, FecField::ValidDate)),
            montant_devise,
            id_devise,
            exercice,
        };

        Ok(ParsedRow {
            entry,
            amount_defaults,
        })
    }

    /// Valeur brute d'un champ canonique ("" si colonne absente ou
    /// ligne tronquée dans la tolérance)
    fn field<'r>(&self, record: &'r StringRecord, field: FecField) -> &'r str {
        self.header
            .field_index(field)
            .and_then(|index| record.get(index))
            .unwrap_or("")
    }

    fn text_field(&self, record: &StringRecord, field: FecField) -> String {
        self.field(record, field).trim().to_string()
    }

    fn optional_field(&self, record: &StringRecord, field: FecField) -> Option<String> {
        let value = self.field(record, field).trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Montant déclaré numérique: illisible vaut 0, compté et journalisé
    fn amount_field(
        &self,
        record: &StringRecord,
        field: FecField,
        row_number: usize,
        amount_defaults: &mut usize,
    ) -> Decimal {
        match parse_amount(self.field(record, field)) {
            AmountParse::Value(value) => value,
            AmountParse::Empty => Decimal::ZERO,
            AmountParse::Unparseable(raw) => {
                *amount_defaults += 1;
                tracing::warn!(
                    row = row_number,
                    field = field.as_str(),
                    raw = raw.as_str(),
                    "montant illisible remplacé par 0"
                );
                Decimal::ZERO
            }
        }
    }
}

// ==========================================
// Coercition des montants
// ==========================================

/// Résultat de coercition d'un montant
pub enum AmountParse {
    Value(Decimal),
    Empty,
    Unparseable(String),
}

/// Coercition d'un montant FEC
///
/// Espaces (insécables compris) retirés, virgule décimale acceptée,
/// valeur absolue systématique
pub fn parse_amount(raw: &str) -> AmountParse {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return AmountParse::Empty;
    }

    match Decimal::from_str(&cleaned) {
        Ok(value) => AmountParse::Value(value.abs()),
        Err(_) => AmountParse::Unparseable(raw.trim().to_string()),
    }
}

// ==========================================
// Coercition des dates
// ==========================================

/// Coercition d'une date FEC
///
/// Chemin rapide: 8 chiffres AAAAMMJJ. Replis: formats courants fixes,
/// puis inférence générique. None si tout échoue.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Chemin rapide AAAAMMJJ
    if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            return Some(date);
        }
    }

    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    infer_date(trimmed)
}

/// Inférence générique: trois segments numériques, l'année se reconnaît
/// à ses 4 chiffres, jour/mois départagés par la plage de valeurs
fn infer_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw
        .split(|c: char| matches!(c, '-' | '/' | '.' | ' '))
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 3 || !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let nums: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    if nums.len() != 3 {
        return None;
    }

    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], nums[2]);
    }

    if parts[2].len() == 4 {
        let year = nums[2] as i32;
        // jour/mois: le premier segment > 12 force jour-mois
        return NaiveDate::from_ymd_opt(year, nums[1], nums[0])
            .or_else(|| NaiveDate::from_ymd_opt(year, nums[0], nums[1]));
    }

    None
}

// ==========================================
// Tests unitaires
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_aaaammjj_aller_retour() {
        let date = parse_date("20240115").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        // le reformatage AAAAMMJJ reproduit le jeton d'origine
        assert_eq!(date.format("%Y%m%d").to_string(), "20240115");
    }

    #[test]
    fn date_formats_de_repli() {
        let attendu = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(attendu));
        assert_eq!(parse_date("15/01/2024"), Some(attendu));
        assert_eq!(parse_date("15-01-2024"), Some(attendu));
        assert_eq!(parse_date("2024/01/15"), Some(attendu));
    }

    #[test]
    fn date_inferee() {
        // séparateur point: aucun format fixe ne matche, inférence seule
        assert_eq!(
            parse_date("15.01.2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(parse_date("n'importe quoi"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn montant_virgule_et_espaces() {
        match parse_amount("1 234,56") {
            AmountParse::Value(v) => assert_eq!(v, Decimal::from_str("1234.56").unwrap()),
            _ => panic!("montant attendu"),
        }
    }

    #[test]
    fn montant_negatif_en_valeur_absolue() {
        match parse_amount("-42,00") {
            AmountParse::Value(v) => assert_eq!(v, Decimal::from_str("42.00").unwrap()),
            _ => panic!("montant attendu"),
        }
    }

    #[test]
    fn montant_illisible_signale() {
        assert!(matches!(parse_amount("abc"), AmountParse::Unparseable(_)));
        assert!(matches!(parse_amount(""), AmountParse::Empty));
        assert!(matches!(parse_amount("   "), AmountParse::Empty));
    }
}
