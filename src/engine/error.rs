// ==========================================
// Pipeline FEC - Erreurs du moteur d'import
// ==========================================
// Taxonomie:
// - Format: pas de séparateur/en-tête exploitable, import abandonné,
//   rien n'est persisté
// - Persistence: échec de stockage en cours de lot, les lots précédents
//   de cette exécution restent commités (reprise sûre via le
//   remplacement par exercice)
// Les erreurs de ligne (RowError) ne passent jamais par ce type:
// elles sont comptées et récupérées localement. Un import bloqué par
// anomalies critiques n'est pas une erreur non plus: l'appelant reçoit
// un ImportOutcome { success: false } portant les codes.
// ==========================================

use thiserror::Error;

/// Erreurs du moteur d'import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("format de fichier illisible: {0}")]
    Format(String),

    #[error("échec de persistance: {0}")]
    Persistence(String),

    #[error("erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
