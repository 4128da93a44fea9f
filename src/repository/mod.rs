// ==========================================
// Pipeline FEC - Couche repository
// ==========================================
// Responsabilité: accès aux données, masquer les détails SQLite
// Interdit: aucune logique métier dans les repositories
// Contrainte: toutes les requêtes sont paramétrées (pas d'injection SQL)
// ==========================================

pub mod compte_repo;
pub mod compte_repo_impl;
pub mod ecriture_repo;
pub mod ecriture_repo_impl;
pub mod error;

// Ré-exports des repositories
pub use compte_repo::CompteRepository;
pub use compte_repo_impl::CompteRepositoryImpl;
pub use ecriture_repo::EcritureRepository;
pub use ecriture_repo_impl::EcritureRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
