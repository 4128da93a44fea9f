// ==========================================
// Pipeline FEC - Repository du plan de comptes (implémentation rusqlite)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::compte::RootAccount;
use crate::domain::types::AccountType;
use crate::repository::compte_repo::CompteRepository;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// CompteRepositoryImpl
// ==========================================
pub struct CompteRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CompteRepositoryImpl {
    /// Crée un repository sur un fichier de base
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Crée un repository sur une connexion existante
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl CompteRepository for CompteRepositoryImpl {
    async fn existing_roots(
        &self,
        roots: &[String],
    ) -> Result<BTreeSet<String>, Box<dyn Error>> {
        let conn = self.lock()?;

        let mut found = BTreeSet::new();
        let mut stmt = conn.prepare("SELECT 1 FROM compte WHERE numero = ?1")?;
        for root in roots {
            let exists: Option<i64> = stmt
                .query_row(params![root], |row| row.get(0))
                .optional()?;
            if exists.is_some() {
                found.insert(root.clone());
            }
        }

        Ok(found)
    }

    async fn insert_root_if_absent(
        &self,
        account: &RootAccount,
    ) -> Result<bool, Box<dyn Error>> {
        let conn = self.lock()?;

        // INSERT OR IGNORE: l'unicité du numéro arbitre les créations
        // concurrentes, jamais d'écrasement d'un compte existant
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO compte (numero, libelle, classe, type_compte)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                account.numero,
                account.libelle,
                i64::from(account.classe),
                account.account_type.as_str(),
            ],
        )?;

        Ok(inserted > 0)
    }

    async fn get_root(&self, numero: &str) -> Result<Option<RootAccount>, Box<dyn Error>> {
        let conn = self.lock()?;

        let account = conn
            .query_row(
                "SELECT numero, libelle, classe, type_compte FROM compte WHERE numero = ?1",
                params![numero],
                |row| {
                    let type_raw: String = row.get(3)?;
                    Ok(RootAccount {
                        numero: row.get(0)?,
                        libelle: row.get(1)?,
                        classe: row.get::<_, i64>(2)? as u8,
                        account_type: AccountType::from_str_or_other(&type_raw),
                    })
                },
            )
            .optional()?;

        Ok(account)
    }
}
