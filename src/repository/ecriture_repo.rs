// ==========================================
// Pipeline FEC - Repository des écritures (trait)
// ==========================================
// Responsabilité: définir l'accès aux écritures persistées
// Interdit: aucune règle métier, uniquement du CRUD
// ==========================================

use crate::domain::compte::ImportBatchRecord;
use crate::domain::ecriture::FecEntry;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EcritureRepository Trait
// ==========================================
// Usage: persistance par exercice (remplacement puis insertion par lots)
// Implémenteur: EcritureRepositoryImpl (rusqlite)
#[async_trait]
pub trait EcritureRepository: Send + Sync {
    // ===== Remplacement par exercice =====

    /// Supprime toutes les écritures d'un exercice
    ///
    /// Appelée exactement une fois par import, avant le premier lot:
    /// le ré-import d'un même fichier ne crée pas de doublons, le
    /// ré-import d'un fichier corrigé remplace entièrement le précédent.
    ///
    /// # Retour
    /// - Ok(usize): nombre de lignes supprimées
    async fn delete_exercice(&self, exercice: i32) -> Result<usize, Box<dyn Error>>;

    // ===== Insertion par lots =====

    /// Insère un lot d'écritures en un seul INSERT multi-valeurs
    ///
    /// Le découpage en lots est décidé par l'appelant (taille
    /// configurée). Un échec fait échouer tout l'import: aucun contrat
    /// de succès partiel sous la granularité du lot.
    ///
    /// # Retour
    /// - Ok(usize): nombre de lignes insérées
    async fn insert_batch(&self, entries: &[FecEntry]) -> Result<usize, Box<dyn Error>>;

    /// Compte les écritures persistées pour un exercice
    async fn count_by_exercice(&self, exercice: i32) -> Result<usize, Box<dyn Error>>;

    // ===== Agrégats dérivés =====

    /// Reconstruit les soldes par compte pour un exercice
    ///
    /// Dérivation pure depuis les écritures persistées
    /// (debit / credit / solde par compte), rejouable sans risque.
    ///
    /// # Retour
    /// - Ok(usize): nombre de comptes agrégés
    async fn rebuild_soldes(&self, exercice: i32) -> Result<usize, Box<dyn Error>>;

    // ===== Traçabilité =====

    /// Enregistre un lot d'import (audit)
    async fn insert_import_batch(&self, batch: &ImportBatchRecord) -> Result<(), Box<dyn Error>>;

    /// Liste les derniers lots d'import
    async fn recent_batches(&self, limit: usize)
        -> Result<Vec<ImportBatchRecord>, Box<dyn Error>>;
}
