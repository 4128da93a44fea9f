// ==========================================
// Pipeline FEC - Couche configuration
// ==========================================
// Responsabilité: lecture des seuils du pipeline
// Interdit: aucune logique métier
// ==========================================
// Les valeurs par défaut ci-dessous reprennent les heuristiques
// historiques telles quelles (aucune justification métier documentée
// n'a été retrouvée): elles sont nommées et surchargeables, jamais
// modifiées silencieusement.
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

pub use config_manager::ConfigManager;
pub use import_config_trait::ImportConfigReader;

use rust_decimal::Decimal;

/// Tolérance d'équilibre débit/crédit: 0,1 % du total débit
pub const DEFAULT_BALANCE_TOLERANCE_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Borne basse de l'écart mineur (€ 0,01)
pub const DEFAULT_MINOR_DIFF_MIN_EUR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Borne haute de l'écart mineur (€ 1,00)
pub const DEFAULT_MINOR_DIFF_MAX_EUR: Decimal = Decimal::from_parts(1, 0, 0, false, 0);

/// Part maximale de lignes en erreur tolérée: 5 %
pub const DEFAULT_ERROR_ROWS_TOLERANCE_RATIO: f64 = 0.05;

/// Seuil de faible volumétrie (lignes valides)
pub const DEFAULT_LOW_VOLUME_THRESHOLD: usize = 10;

/// Taille des lots d'insertion
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

/// Devise de référence attendue
pub const DEFAULT_REFERENCE_CURRENCY: &str = "EUR";
