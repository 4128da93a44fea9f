// ==========================================
// Pipeline FEC - Repository des écritures (implémentation rusqlite)
// ==========================================
// Contrainte: montants stockés en TEXT (Decimal sérialisé),
// dates en TEXT ISO (AAAA-MM-JJ)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::compte::ImportBatchRecord;
use crate::domain::ecriture::FecEntry;
use crate::repository::ecriture_repo::EcritureRepository;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Colonnes de la table ecriture_comptable, dans l'ordre d'insertion
const ENTRY_COLUMNS: usize = 19;

fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        None => Value::Null,
    }
}

fn optional_text(text: &Option<String>) -> Value {
    match text {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

// ==========================================
// EcritureRepositoryImpl
// ==========================================
pub struct EcritureRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl EcritureRepositoryImpl {
    /// Crée un repository sur un fichier de base
    ///
    /// # Paramètres
    /// - db_path: chemin du fichier SQLite
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

    /// Aplati un lot d'écritures en valeurs SQL, ordre des colonnes fixe
    fn entry_values(entries: &[FecEntry]) -> Vec<Value> {
        let mut values = Vec::with_capacity(entries.len() * ENTRY_COLUMNS);
        for entry in entries {
            values.push(Value::Text(entry.journal_code.clone()));
            values.push(Value::Text(entry.journal_lib.clone()));
            values.push(Value::Text(entry.ecriture_num.clone()));
            values.push(date_value(Some(entry.ecriture_date)));
            values.push(Value::Text(entry.compte_num.clone()));
            values.push(Value::Text(entry.compte_lib.clone()));
            values.push(optional_text(&entry.comp_aux_num));
            values.push(optional_text(&entry.comp_aux_lib));
            values.push(optional_text(&entry.piece_ref));
            values.push(date_value(entry.piece_date));
            values.push(Value::Text(entry.ecriture_lib.clone()));
            values.push(Value::Text(entry.debit.to_string()));
            values.push(Value::Text(entry.credit.to_string()));
            values.push(optional_text(&entry.ecriture_let));
            values.push(date_value(entry.date_let));
            values.push(date_value(entry.valid_date));
            values.push(match entry.montant_devise {
                Some(m) => Value::Text(m.to_string()),
                None => Value::Null,
            });
            values.push(Value::Text(entry.id_devise.clone()));
            values.push(Value::Integer(i64::from(entry.exercice)));
        }
        values
    }
}

#[async_trait]
impl EcritureRepository for EcritureRepositoryImpl {
    async fn delete_exercice(&self, exercice: i32) -> Result<usize, Box<dyn Error>> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM ecriture_comptable WHERE exercice = ?1",
            params![exercice],
        )?;
        Ok(deleted)
    }

    async fn insert_batch(&self, entries: &[FecEntry]) -> Result<usize, Box<dyn Error>> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // Un seul INSERT multi-valeurs pour tout le lot
        let group = format!("({})", vec!["?"; ENTRY_COLUMNS].join(", "));
        let groups = vec![group; entries.len()].join(", ");
        let sql = format!(
            r#"
            INSERT INTO ecriture_comptable (
                journal_code, journal_lib, ecriture_num, ecriture_date,
                compte_num, compte_lib, comp_aux_num, comp_aux_lib,
                piece_ref, piece_date, ecriture_lib, debit, credit,
                ecriture_let, date_let, valid_date, montant_devise,
                id_devise, exercice
            ) VALUES {}
            "#,
            groups
        );

        let inserted = tx.execute(&sql, rusqlite::params_from_iter(Self::entry_values(entries)))?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(inserted)
    }

    async fn count_by_exercice(&self, exercice: i32) -> Result<usize, Box<dyn Error>> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ecriture_comptable WHERE exercice = ?1",
            params![exercice],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn rebuild_soldes(&self, exercice: i32) -> Result<usize, Box<dyn Error>> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM solde_compte WHERE exercice = ?1",
            params![exercice],
        )?;

        // Agrégation en Decimal côté Rust: les montants sont stockés en
        // TEXT, un SUM SQL repasserait par du flottant
        let mut totals: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        {
            let mut stmt = tx.prepare(
                "SELECT compte_num, debit, credit FROM ecriture_comptable WHERE exercice = ?1",
            )?;
            let mut rows = stmt.query(params![exercice])?;
            while let Some(row) = rows.next()? {
                let compte: String = row.get(0)?;
                let debit = Decimal::from_str(&row.get::<_, String>(1)?)
                    .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;
                let credit = Decimal::from_str(&row.get::<_, String>(2)?)
                    .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;
                let slot = totals.entry(compte).or_insert((Decimal::ZERO, Decimal::ZERO));
                slot.0 += debit;
                slot.1 += credit;
            }
        }

        let count = totals.len();
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO solde_compte (exercice, compte_num, debit, credit, solde)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (compte, (debit, credit)) in &totals {
                stmt.execute(params![
                    exercice,
                    compte,
                    debit.to_string(),
                    credit.to_string(),
                    (debit - credit).to_string(),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn insert_import_batch(&self, batch: &ImportBatchRecord) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, exercice, inserted_count, error_count,
                accounts_created, elapsed_ms, outcome, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.exercice,
                batch.inserted_count as i64,
                batch.error_count as i64,
                batch.accounts_created as i64,
                batch.elapsed_ms,
                batch.outcome,
                batch.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn recent_batches(
        &self,
        limit: usize,
    ) -> Result<Vec<ImportBatchRecord>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, exercice, inserted_count, error_count,
                   accounts_created, elapsed_ms, outcome, created_at
            FROM import_batch
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], |row| {
                let created_raw: String = row.get(8)?;
                Ok(ImportBatchRecord {
                    batch_id: row.get(0)?,
                    file_name: row.get(1)?,
                    exercice: row.get(2)?,
                    inserted_count: row.get::<_, i64>(3)? as usize,
                    error_count: row.get::<_, i64>(4)? as usize,
                    accounts_created: row.get::<_, i64>(5)? as usize,
                    elapsed_ms: row.get(6)?,
                    outcome: row.get(7)?,
                    created_at: DateTime::parse_from_rfc3339(&created_raw)
                        .map(|d| d.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }
}
