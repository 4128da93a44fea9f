// ==========================================
// Pipeline FEC - Gestionnaire de configuration
// ==========================================
// Responsabilité: chargement et surcharge des seuils
// Stockage: table config_kv (clé-valeur, portée 'global')
// Toute clé absente retombe sur la constante par défaut nommée
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::{
    DEFAULT_BALANCE_TOLERANCE_RATIO, DEFAULT_ERROR_ROWS_TOLERANCE_RATIO,
    DEFAULT_INSERT_BATCH_SIZE, DEFAULT_LOW_VOLUME_THRESHOLD, DEFAULT_MINOR_DIFF_MAX_EUR,
    DEFAULT_MINOR_DIFF_MIN_EUR, DEFAULT_REFERENCE_CURRENCY,
};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Crée un ConfigManager sur un fichier de base
    ///
    /// # Paramètres
    /// - db_path: chemin du fichier SQLite
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Crée un ConfigManager sur une connexion existante
    ///
    /// Les PRAGMA unifiés sont réappliqués (idempotent) pour garantir
    /// un comportement identique quel que soit le chemin d'ouverture.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| format!("échec de prise du verrou: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Lit une valeur de la table config_kv (portée 'global')
    ///
    /// # Retour
    /// - Some(String): valeur surchargée
    /// - None: clé absente (défaut applicable)
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("échec de prise du verrou: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Écrit une surcharge de configuration (portée 'global')
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("échec de prise du verrou: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    fn get_decimal(&self, key: &str, default: Decimal) -> Result<Decimal, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(Decimal::from_str(raw.trim())?),
            None => Ok(default),
        }
    }

    fn get_f64(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<f64>()?),
            None => Ok(default),
        }
    }

    fn get_usize(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<usize>()?),
            None => Ok(default),
        }
    }
}

// ==========================================
// Implémentation ImportConfigReader
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_balance_tolerance_ratio(&self) -> Result<Decimal, Box<dyn Error>> {
        self.get_decimal(
            "import.balance_tolerance_ratio",
            DEFAULT_BALANCE_TOLERANCE_RATIO,
        )
    }

    async fn get_minor_diff_min_eur(&self) -> Result<Decimal, Box<dyn Error>> {
        self.get_decimal("import.minor_diff_min_eur", DEFAULT_MINOR_DIFF_MIN_EUR)
    }

    async fn get_minor_diff_max_eur(&self) -> Result<Decimal, Box<dyn Error>> {
        self.get_decimal("import.minor_diff_max_eur", DEFAULT_MINOR_DIFF_MAX_EUR)
    }

    async fn get_error_rows_tolerance_ratio(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64(
            "import.error_rows_tolerance_ratio",
            DEFAULT_ERROR_ROWS_TOLERANCE_RATIO,
        )
    }

    async fn get_low_volume_threshold(&self) -> Result<usize, Box<dyn Error>> {
        self.get_usize("import.low_volume_threshold", DEFAULT_LOW_VOLUME_THRESHOLD)
    }

    async fn get_reference_currency(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value("import.reference_currency")?
            .unwrap_or_else(|| DEFAULT_REFERENCE_CURRENCY.to_string()))
    }

    async fn get_insert_batch_size(&self) -> Result<usize, Box<dyn Error>> {
        self.get_usize("import.insert_batch_size", DEFAULT_INSERT_BATCH_SIZE)
    }
}
