// ==========================================
// Pipeline FEC - Erreurs de la couche repository
// ==========================================
// Outil: macro dérive thiserror
// ==========================================

use thiserror::Error;

/// Erreurs de la couche repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Erreurs base de données =====
    #[error("enregistrement introuvable: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("échec de connexion à la base: {0}")]
    DatabaseConnectionError(String),

    #[error("échec de prise du verrou base: {0}")]
    LockError(String),

    #[error("échec de transaction: {0}")]
    DatabaseTransactionError(String),

    #[error("échec de requête: {0}")]
    DatabaseQueryError(String),

    #[error("violation de contrainte d'unicité: {0}")]
    UniqueConstraintViolation(String),

    #[error("violation de clé étrangère: {0}")]
    ForeignKeyViolation(String),

    // ===== Erreurs de données =====
    #[error("échec de validation: {0}")]
    ValidationError(String),

    #[error("valeur de champ invalide (champ={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== Erreurs génériques =====
    #[error("erreur interne: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Conversion depuis rusqlite::Error
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Alias de Result pour la couche repository
pub type RepositoryResult<T> = Result<T, RepositoryError>;
