// ==========================================
// Pipeline FEC - Initialisation SQLite
// ==========================================
// Objectifs:
// - Unifier le comportement PRAGMA de toutes les connexions
//   (éviter "clés étrangères actives sur certains modules seulement")
// - Unifier le busy_timeout pour limiter les erreurs busy en écriture
// - Amorcer le schéma (CREATE TABLE IF NOT EXISTS, idempotent)
// ==========================================

use rusqlite::Connection;
use std::error::Error;
use std::time::Duration;

/// busy_timeout par défaut (millisecondes)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Version de schéma attendue par ce code
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Applique les PRAGMA unifiés sur une connexion
///
/// Note:
/// - foreign_keys doit être activé connexion par connexion
/// - busy_timeout doit être configuré connexion par connexion
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Ouvre une connexion SQLite avec la configuration unifiée
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Amorce le schéma complet du pipeline
///
/// Idempotent: toutes les instructions utilisent IF NOT EXISTS / OR IGNORE,
/// un appel sur une base déjà initialisée est sans effet.
pub fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    // Table de version de schéma
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    // Configuration clé-valeur (portée globale)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        )
        "#,
        [],
    )?;

    // Écritures comptables persistées (sortie durable du pipeline)
    // Les montants sont stockés en TEXT (Decimal sérialisé), jamais en REAL
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS ecriture_comptable (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_code TEXT NOT NULL,
            journal_lib TEXT,
            ecriture_num TEXT,
            ecriture_date TEXT NOT NULL,
            compte_num TEXT NOT NULL,
            compte_lib TEXT,
            comp_aux_num TEXT,
            comp_aux_lib TEXT,
            piece_ref TEXT,
            piece_date TEXT,
            ecriture_lib TEXT,
            debit TEXT NOT NULL,
            credit TEXT NOT NULL,
            ecriture_let TEXT,
            date_let TEXT,
            valid_date TEXT,
            montant_devise TEXT,
            id_devise TEXT NOT NULL,
            exercice INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ecriture_exercice ON ecriture_comptable(exercice)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ecriture_compte ON ecriture_comptable(compte_num)",
        [],
    )?;

    // Plan de comptes (racines à 3 chiffres, créées si absentes, jamais modifiées)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS compte (
            numero TEXT PRIMARY KEY,
            libelle TEXT NOT NULL,
            classe INTEGER NOT NULL,
            type_compte TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    // Soldes agrégés par compte et par exercice (re-dérivables à volonté)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS solde_compte (
            exercice INTEGER NOT NULL,
            compte_num TEXT NOT NULL,
            debit TEXT NOT NULL,
            credit TEXT NOT NULL,
            solde TEXT NOT NULL,
            PRIMARY KEY (exercice, compte_num)
        )
        "#,
        [],
    )?;

    // Traçabilité des lots d'import
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            exercice INTEGER,
            inserted_count INTEGER NOT NULL,
            error_count INTEGER NOT NULL,
            accounts_created INTEGER NOT NULL,
            elapsed_ms INTEGER NOT NULL,
            outcome TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    Ok(())
}

/// Lit la version de schéma (None si la table n'existe pas encore)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    use rusqlite::OptionalExtension;

    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(v)
}
