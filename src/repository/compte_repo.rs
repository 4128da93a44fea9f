// ==========================================
// Pipeline FEC - Repository du plan de comptes (trait)
// ==========================================
// Responsabilité: consultation et création des comptes racines
// Interdit: aucune règle de classement ici (voir engine::hierarchy)
// ==========================================

use crate::domain::compte::RootAccount;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::error::Error;

// ==========================================
// CompteRepository Trait
// ==========================================
// Usage: création conditionnelle des racines manquantes
// Implémenteur: CompteRepositoryImpl (rusqlite)
#[async_trait]
pub trait CompteRepository: Send + Sync {
    /// Racines déjà présentes parmi celles demandées
    async fn existing_roots(
        &self,
        roots: &[String],
    ) -> Result<BTreeSet<String>, Box<dyn Error>>;

    /// Insère un compte racine s'il est absent
    ///
    /// Implémentation attendue en INSERT OR IGNORE (upsert par contrainte
    /// d'unicité): reste correct si des imports concurrents créent des
    /// racines qui se recouvrent.
    ///
    /// # Retour
    /// - Ok(true): compte créé
    /// - Ok(false): déjà présent, rien à faire
    async fn insert_root_if_absent(&self, account: &RootAccount) -> Result<bool, Box<dyn Error>>;

    /// Lit un compte racine (tests et diagnostic)
    async fn get_root(&self, numero: &str) -> Result<Option<RootAccount>, Box<dyn Error>>;
}
