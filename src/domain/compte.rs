// ==========================================
// Pipeline FEC - Plan de comptes et lots d'import
// ==========================================
// Responsabilité: sorties durables du pipeline hors écritures
// (comptes racines auto-créés, traçabilité des lots)
// ==========================================

use crate::domain::types::AccountType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RootAccount - compte racine (3 chiffres)
// ==========================================
// Créé seulement s'il est absent du plan de comptes,
// jamais modifié par ce pipeline une fois créé
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootAccount {
    /// Racine numérique à 3 chiffres (ex. "411", "601")
    pub numero: String,
    pub libelle: String,
    /// Classe comptable (premier chiffre de la racine)
    pub classe: u8,
    pub account_type: AccountType,
}

impl RootAccount {
    /// Construit un compte racine classé par son premier chiffre
    pub fn from_root(numero: &str, libelle: &str) -> Option<Self> {
        let classe: u8 = numero.chars().next()?.to_digit(10)? as u8;
        Some(Self {
            numero: numero.to_string(),
            libelle: libelle.to_string(),
            classe,
            account_type: AccountType::from_class(classe),
        })
    }
}

// ==========================================
// ImportBatchRecord - traçabilité d'un lot
// ==========================================
// Une ligne par exécution d'import, audit uniquement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatchRecord {
    pub batch_id: String,
    pub file_name: String,
    pub exercice: Option<i32>,
    pub inserted_count: usize,
    pub error_count: usize,
    pub accounts_created: usize,
    pub elapsed_ms: i64,
    /// SUCCESS / BLOCKED / FAILED
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}
