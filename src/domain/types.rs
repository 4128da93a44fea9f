// ==========================================
// Pipeline FEC - Types du domaine
// ==========================================
// Référence: format FEC statutaire (article A47 A-1 LPF), 18 champs obligatoires
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Champ FEC canonique (18 champs obligatoires)
// ==========================================
// L'ordre des colonnes dans le fichier n'est pas imposé,
// la correspondance se fait par alias d'en-tête
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FecField {
    JournalCode,
    JournalLib,
    EcritureNum,
    EcritureDate,
    CompteNum,
    CompteLib,
    CompAuxNum,
    CompAuxLib,
    PieceRef,
    PieceDate,
    EcritureLib,
    Debit,
    Credit,
    EcritureLet,
    DateLet,
    ValidDate,
    MontantDevise,
    IdDevise,
}

impl FecField {
    /// Les 18 champs, dans l'ordre statutaire
    pub const ALL: [FecField; 18] = [
        FecField::JournalCode,
        FecField::JournalLib,
        FecField::EcritureNum,
        FecField::EcritureDate,
        FecField::CompteNum,
        FecField::CompteLib,
        FecField::CompAuxNum,
        FecField::CompAuxLib,
        FecField::PieceRef,
        FecField::PieceDate,
        FecField::EcritureLib,
        FecField::Debit,
        FecField::Credit,
        FecField::EcritureLet,
        FecField::DateLet,
        FecField::ValidDate,
        FecField::MontantDevise,
        FecField::IdDevise,
    ];

    /// Nom canonique du champ (casse statutaire)
    pub fn as_str(&self) -> &'static str {
        match self {
            FecField::JournalCode => "JournalCode",
            FecField::JournalLib => "JournalLib",
            FecField::EcritureNum => "EcritureNum",
            FecField::EcritureDate => "EcritureDate",
            FecField::CompteNum => "CompteNum",
            FecField::CompteLib => "CompteLib",
            FecField::CompAuxNum => "CompAuxNum",
            FecField::CompAuxLib => "CompAuxLib",
            FecField::PieceRef => "PieceRef",
            FecField::PieceDate => "PieceDate",
            FecField::EcritureLib => "EcritureLib",
            FecField::Debit => "Debit",
            FecField::Credit => "Credit",
            FecField::EcritureLet => "EcritureLet",
            FecField::DateLet => "DateLet",
            FecField::ValidDate => "ValidDate",
            FecField::MontantDevise => "MontantDevise",
            FecField::IdDevise => "IdDevise",
        }
    }
}

impl fmt::Display for FecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Cible d'une colonne d'origine
// ==========================================
// Une colonne non reconnue est conservée (jamais supprimée)
// sous le nom Custom_<origine>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Fec(FecField),
    Custom(String),
}

impl ColumnTarget {
    /// Nom exposé aux consommateurs aval
    pub fn label(&self) -> String {
        match self {
            ColumnTarget::Fec(field) => field.as_str().to_string(),
            ColumnTarget::Custom(original) => format!("Custom_{}", original),
        }
    }
}

// ==========================================
// Séparateur de champs
// ==========================================
// Ensemble fixe de candidats, jamais étendu dynamiquement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Separator {
    Tab,
    Pipe,
    Comma,
    Semicolon,
}

impl Separator {
    /// Candidats, dans l'ordre d'évaluation (départage des égalités)
    pub const CANDIDATES: [Separator; 4] = [
        Separator::Tab,
        Separator::Pipe,
        Separator::Comma,
        Separator::Semicolon,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Separator::Tab => '\t',
            Separator::Pipe => '|',
            Separator::Comma => ',',
            Separator::Semicolon => ';',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Tab => write!(f, "TAB"),
            Separator::Pipe => write!(f, "PIPE"),
            Separator::Comma => write!(f, "COMMA"),
            Separator::Semicolon => write!(f, "SEMICOLON"),
        }
    }
}

// ==========================================
// Encodage détecté
// ==========================================
// Purement informatif, ne bloque jamais l'import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "UTF-8"),
            Encoding::Latin1 => write!(f, "ISO-8859-1"),
        }
    }
}

// ==========================================
// Sévérité d'anomalie
// ==========================================
// critical bloque l'import, warning ne fait qu'informer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

// ==========================================
// Type de compte racine
// ==========================================
// Classement par premier chiffre du numéro de compte
// (table fixe du plan comptable, défaut Other)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Treasury,
    Expense,
    Revenue,
    Special,
    Analytic,
    Other,
}

impl AccountType {
    /// Classement par classe comptable (premier chiffre)
    pub fn from_class(class: u8) -> Self {
        match class {
            1 | 2 | 3 => AccountType::Asset,
            4 => AccountType::Liability,
            5 => AccountType::Treasury,
            6 => AccountType::Expense,
            7 => AccountType::Revenue,
            8 => AccountType::Special,
            9 => AccountType::Analytic,
            _ => AccountType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Treasury => "Treasury",
            AccountType::Expense => "Expense",
            AccountType::Revenue => "Revenue",
            AccountType::Special => "Special",
            AccountType::Analytic => "Analytic",
            AccountType::Other => "Other",
        }
    }

    pub fn from_str_or_other(raw: &str) -> Self {
        match raw {
            "Asset" => AccountType::Asset,
            "Liability" => AccountType::Liability,
            "Treasury" => AccountType::Treasury,
            "Expense" => AccountType::Expense,
            "Revenue" => AccountType::Revenue,
            "Special" => AccountType::Special,
            "Analytic" => AccountType::Analytic,
            _ => AccountType::Other,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
