// ==========================================
// Pipeline FEC - Entrée ligne de commande
// ==========================================
// Commandes:
// - analyse <fichier>: rapport d'analyse JSON, aucune écriture en base
// - import <fichier>: import bloqué par les anomalies critiques
// Base: $FEC_PIPELINE_DB, sinon répertoire de données utilisateur
// ==========================================

use fec_pipeline::config::ConfigManager;
use fec_pipeline::repository::{CompteRepositoryImpl, EcritureRepositoryImpl};
use fec_pipeline::{db, logging, FecImporter};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Chemin de base par défaut (répertoire de données utilisateur)
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("FEC_PIPELINE_DB") {
        return path;
    }

    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("fec-pipeline");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, "création du répertoire de données impossible");
    }
    dir.join("fec.db").to_string_lossy().to_string()
}

fn print_usage() {
    eprintln!("usage: fec-pipeline <analyse|import> <fichier>");
}

async fn run(command: &str, file_path: &str) -> Result<(), Box<dyn Error>> {
    let db_path = get_default_db_path();
    tracing::info!(db = db_path.as_str(), "base utilisée");

    // Connexion partagée entre repositories et configuration
    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    if let Some(version) = db::read_schema_version(&conn)? {
        if version != db::CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                version,
                expected = db::CURRENT_SCHEMA_VERSION,
                "version de schéma plus récente que ce binaire"
            );
        }
    }
    let conn = Arc::new(Mutex::new(conn));

    let ecritures = Arc::new(EcritureRepositoryImpl::from_connection(Arc::clone(&conn)));
    let comptes = Arc::new(CompteRepositoryImpl::from_connection(Arc::clone(&conn)));
    let config = Arc::new(ConfigManager::from_connection(conn)?);

    let importer = FecImporter::new(ecritures, comptes, config);

    match command {
        "analyse" => {
            let report = importer.analyse_file(file_path).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "import" => {
            let outcome = importer.import_file(file_path).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("Pipeline FEC - ingestion et validation");
    tracing::info!("version: {}", fec_pipeline::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    if let Err(e) = run(&args[1], &args[2]).await {
        tracing::error!(error = %e, "échec de la commande");
        eprintln!("erreur: {}", e);
        std::process::exit(1);
    }
}
