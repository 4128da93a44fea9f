// ==========================================
// Pipeline FEC - Trait de lecture de configuration d'import
// ==========================================
// Responsabilité: interface de lecture des seuils du pipeline
// (aucune implémentation, aucune écriture)
// Implémenteur: ConfigManager (lecture table config_kv)
// ==========================================

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// Usage: injecté dans le classifieur d'anomalies et l'orchestrateur;
// les tests fournissent leur propre implémentation
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== Seuils d'équilibre =====

    /// Tolérance d'équilibre débit/crédit, en part du total débit
    ///
    /// # Défaut
    /// - 0.001 (0,1 %)
    ///
    /// # Usage
    /// - au-delà: anomalie critique BALANCE_UNBALANCED
    async fn get_balance_tolerance_ratio(&self) -> Result<Decimal, Box<dyn Error>>;

    /// Borne basse de l'écart mineur (en euros)
    ///
    /// # Défaut
    /// - 0.01
    async fn get_minor_diff_min_eur(&self) -> Result<Decimal, Box<dyn Error>>;

    /// Borne haute de l'écart mineur (en euros)
    ///
    /// # Défaut
    /// - 1.00
    ///
    /// # Usage
    /// - écart strictement entre les deux bornes: avertissement
    ///   MINOR_BALANCE_DIFF (bruit d'arrondi)
    async fn get_minor_diff_max_eur(&self) -> Result<Decimal, Box<dyn Error>>;

    // ===== Seuils de qualité de données =====

    /// Part maximale de lignes en erreur tolérée
    ///
    /// # Défaut
    /// - 0.05 (5 %)
    ///
    /// # Usage
    /// - au-delà: anomalie critique TOO_MANY_ERRORS
    async fn get_error_rows_tolerance_ratio(&self) -> Result<f64, Box<dyn Error>>;

    /// Seuil de faible volumétrie (lignes valides)
    ///
    /// # Défaut
    /// - 10
    ///
    /// # Usage
    /// - en dessous: avertissement LOW_DATA_VOLUME
    async fn get_low_volume_threshold(&self) -> Result<usize, Box<dyn Error>>;

    /// Devise de référence attendue
    ///
    /// # Défaut
    /// - "EUR"
    ///
    /// # Usage
    /// - devise détectée différente: avertissement NON_EUR_CURRENCY
    async fn get_reference_currency(&self) -> Result<String, Box<dyn Error>>;

    // ===== Persistance =====

    /// Taille des lots d'insertion (lignes par INSERT multi-valeurs)
    ///
    /// # Défaut
    /// - 500
    async fn get_insert_batch_size(&self) -> Result<usize, Box<dyn Error>>;
}
