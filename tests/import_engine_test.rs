// ==========================================
// FecImporter - tests de bout en bout
// ==========================================
// Chemin analyse (sans effet de bord) et chemin import (remplacement
// d'exercice, insertion par lots, soldes, traçabilité)
// ==========================================


use fec_pipeline::config::ConfigManager;
use fec_pipeline::engine::{AliasTable, FecImporter};
use fec_pipeline::FecField;
use fec_pipeline::repository::{
    CompteRepositoryImpl, EcritureRepository, EcritureRepositoryImpl,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use test_helpers::{
    balanced_fec_content, create_test_db, fec_row, write_fec_file, MockConfigReader, FEC_HEADER,
};

type TestImporter = FecImporter<EcritureRepositoryImpl, CompteRepositoryImpl, MockConfigReader>;

fn build_importer(
    db_path: &str,
    config: MockConfigReader,
) -> (TestImporter, Arc<EcritureRepositoryImpl>) {
    let ecritures = Arc::new(EcritureRepositoryImpl::new(db_path).unwrap());
    let comptes = Arc::new(CompteRepositoryImpl::new(db_path).unwrap());
    let importer = FecImporter::new(ecritures.clone(), comptes, Arc::new(config));
    (importer, ecritures)
}

/// Fichier volontairement déséquilibré: débits sans contrepartie
fn unbalanced_fec_content(rows: usize) -> String {
    let mut lines = vec![FEC_HEADER.to_string()];
    for i in 0..rows {
        lines.push(fec_row(
            "VE",
            &format!("{}", i + 1),
            "20240115",
            "41100001",
            "Clients - ventes",
            "100,00",
            "0,00",
        ));
    }
    lines.join("\n")
}

// ==========================================
// Chemin analyse
// ==========================================

#[tokio::test]
async fn analyse_ne_persiste_rien() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(10)).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();

    assert!(report.ready_for_import);
    assert_eq!(report.exercice_detected, Some(2024));
    assert_eq!(report.data_statistics.valid_rows, 20);
    assert_eq!(report.data_statistics.total_debit, Decimal::from(1000));
    assert_eq!(report.data_statistics.total_credit, Decimal::from(1000));
    assert_eq!(report.data_statistics.distinct_accounts, 2);
    assert_eq!(report.data_statistics.distinct_journals, 1);
    assert_eq!(report.format.separator, "TAB");
    assert_eq!(report.format.header_line, 0);
    assert_eq!(report.headers.mapped.len(), 18);
    assert!(report.headers.missing.is_empty());

    // l'analyse est rejouable à volonté: rien en base
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 0);
}

#[tokio::test]
async fn analyse_compte_les_lignes_invalides() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, _) = build_importer(&db_path, MockConfigReader::default());

    let mut content = balanced_fec_content(10);
    // date absente: seule cause bloquante au niveau ligne
    content.push('\n');
    content.push_str(&fec_row(
        "VE", "99", "", "41100001", "Clients", "50,00", "0,00",
    ));
    // montant illisible: remplacé par 0 et compté, la ligne reste valide
    content.push('\n');
    content.push_str(&fec_row(
        "VE", "100", "20240116", "41100001", "Clients", "N/A", "0,00",
    ));
    let (_file_guard, file_path) = write_fec_file(&content).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();

    assert_eq!(report.data_statistics.valid_rows, 21);
    assert_eq!(report.data_quality.rows_with_errors, 1);
    assert_eq!(report.data_quality.amount_defaults, 1);
    assert_eq!(report.data_quality.sample_errors.len(), 1);
    assert!(report.data_quality.sample_errors[0].contains("ligne 22"));
}

#[tokio::test]
async fn ligne_tronquee_au_dela_de_la_tolerance_ecartee() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, _) = build_importer(&db_path, MockConfigReader::default());

    // 12 champs sur 18: 6 colonnes manquantes, au-delà de la tolérance
    let mut content = balanced_fec_content(10);
    content.push('\n');
    content.push_str(
        "VE\tJournal VE\t99\t20240115\t41100001\tClients\t\t\tP99\t20240115\tlib\t100,00",
    );
    let (_file_guard, file_path) = write_fec_file(&content).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();

    assert_eq!(report.data_statistics.valid_rows, 20);
    assert_eq!(report.data_quality.rows_with_errors, 1);
    assert!(report.data_quality.sample_errors[0].contains("colonnes"));
    // le total débit n'intègre pas la ligne écartée
    assert_eq!(report.data_statistics.total_debit, Decimal::from(1000));
}

// ==========================================
// Chemin import
// ==========================================

#[tokio::test]
async fn import_reussi_persiste_ecritures_comptes_et_soldes() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(10)).unwrap();

    let outcome = importer.import_file(&file_path).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.count, 20);
    assert_eq!(outcome.errors, 0);
    // racines 411 et 701 dérivées des comptes observés
    assert_eq!(outcome.accounts_created, 2);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 20);

    // soldes agrégés par compte, montants exacts (TEXT, jamais REAL)
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let (debit, solde): (String, String) = conn
        .query_row(
            "SELECT debit, solde FROM solde_compte WHERE exercice = 2024 AND compte_num = '41100001'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(Decimal::from_str(&debit).unwrap(), Decimal::from(1000));
    assert_eq!(Decimal::from_str(&solde).unwrap(), Decimal::from(1000));

    let soldes: i64 = conn
        .query_row("SELECT COUNT(*) FROM solde_compte WHERE exercice = 2024", [], |r| r.get(0))
        .unwrap();
    assert_eq!(soldes, 2);
}

#[tokio::test]
async fn reimport_du_meme_fichier_ne_duplique_rien() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(10)).unwrap();

    importer.import_file(&file_path).await.unwrap();
    let second = importer.import_file(&file_path).await.unwrap();

    assert!(second.success);
    assert_eq!(second.count, 20);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 20);

    // chaque passage laisse sa trace d'audit
    let batches = ecritures.recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.outcome == "SUCCESS"));
}

#[tokio::test]
async fn fichier_corrige_remplace_l_exercice_entier() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());

    let (_f1, first_path) = write_fec_file(&balanced_fec_content(10)).unwrap();
    importer.import_file(&first_path).await.unwrap();
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 20);

    // version corrigée, plus courte, même exercice
    let (_f2, second_path) = write_fec_file(&balanced_fec_content(3)).unwrap();
    let outcome = importer.import_file(&second_path).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.count, 6);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 6);
}

#[tokio::test]
async fn import_bloque_ne_persiste_rien() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());
    let (_file_guard, file_path) = write_fec_file(&unbalanced_fec_content(12)).unwrap();

    let outcome = importer.import_file(&file_path).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.count, 0);
    assert!(outcome.message.contains("BALANCE_UNBALANCED"));
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 0);

    // le refus est tracé lui aussi
    let batches = ecritures.recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].outcome, "BLOCKED");
    assert_eq!(batches[0].inserted_count, 0);
}

#[tokio::test]
async fn insertion_par_petits_lots() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let config = MockConfigReader {
        batch_size: 2,
        ..MockConfigReader::default()
    };
    let (importer, ecritures) = build_importer(&db_path, config);
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(5)).unwrap();

    let outcome = importer.import_file(&file_path).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.count, 10);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 10);
}

#[tokio::test]
async fn exercice_epingle_sur_la_premiere_ligne_valide() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());

    // une paire datée 2025 au milieu d'un fichier 2024: même exercice
    let mut content = balanced_fec_content(6);
    content.push('\n');
    content.push_str(&fec_row(
        "VE", "50", "20250220", "41100001", "Clients", "100,00", "0,00",
    ));
    content.push('\n');
    content.push_str(&fec_row(
        "VE", "50", "20250220", "70110001", "Ventes", "0,00", "100,00",
    ));
    let (_file_guard, file_path) = write_fec_file(&content).unwrap();

    let outcome = importer.import_file(&file_path).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.count, 14);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 14);
    assert_eq!(ecritures.count_by_exercice(2025).await.unwrap(), 0);
}

#[tokio::test]
async fn echec_de_persistance_trace_un_lot_failed() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, ecritures) = build_importer(&db_path, MockConfigReader::default());
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(10)).unwrap();

    // table des écritures supprimée: la persistance échoue forcément
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute("DROP TABLE ecriture_comptable", []).unwrap();

    let result = importer.import_file(&file_path).await;
    assert!(result.is_err());

    // l'échec laisse quand même sa trace d'audit
    let batches = ecritures.recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].outcome, "FAILED");
    assert_eq!(batches[0].inserted_count, 0);
    assert_eq!(batches[0].exercice, Some(2024));
}

#[tokio::test]
async fn montant_devise_illisible_compte_dans_les_defauts() {
    let (_db_guard, db_path) = create_test_db().unwrap();
    let (importer, _) = build_importer(&db_path, MockConfigReader::default());

    let mut content = balanced_fec_content(10);
    // MontantDevise illisible: la ligne reste valide, le défaut est compté
    content.push('\n');
    content.push_str(
        "VE\tJournal VE\t77\t20240117\t41100001\tClients\t\t\tP77\t20240117\tlib\t10,00\t0,00\t\t\t\tabc\tEUR",
    );
    content.push('\n');
    content.push_str(
        "VE\tJournal VE\t77\t20240117\t70110001\tVentes\t\t\tP77\t20240117\tlib\t0,00\t10,00\t\t\t\t\tEUR",
    );
    let (_file_guard, file_path) = write_fec_file(&content).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();

    assert_eq!(report.data_statistics.valid_rows, 22);
    assert_eq!(report.data_quality.rows_with_errors, 0);
    assert_eq!(report.data_quality.amount_defaults, 1);
}

#[tokio::test]
async fn table_d_alias_client_injectee_dans_l_orchestrateur() {
    let (_db_guard, db_path) = create_test_db().unwrap();

    // export client: "DateOperation" au lieu d'EcritureDate, en-tête partielle
    let aliases = AliasTable::from_aliases([
        ("journalcode", FecField::JournalCode),
        ("ecriturenum", FecField::EcritureNum),
        ("dateoperation", FecField::EcritureDate),
        ("comptenum", FecField::CompteNum),
        ("libelle", FecField::CompteLib),
        ("debit", FecField::Debit),
        ("credit", FecField::Credit),
    ]);

    let ecritures = Arc::new(EcritureRepositoryImpl::new(&db_path).unwrap());
    let comptes = Arc::new(CompteRepositoryImpl::new(&db_path).unwrap());
    let importer = FecImporter::with_aliases(
        ecritures,
        comptes,
        Arc::new(MockConfigReader::default()),
        aliases,
    );

    let content = "JournalCode\tEcritureNum\tDateOperation\tCompteNum\tLibelle\tDebit\tCredit\n\
                   VE\t1\t20240115\t41100001\tClients\t100,00\t0,00\n\
                   VE\t1\t20240115\t70110001\tVentes\t0,00\t100,00";
    let (_file_guard, file_path) = write_fec_file(content).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();

    assert_eq!(report.data_statistics.valid_rows, 2);
    assert_eq!(report.exercice_detected, Some(2024));
    assert_eq!(report.data_statistics.distinct_accounts, 2);
    assert!(report.ready_for_import);
}

// ==========================================
// Seuils surchargés via config_kv
// ==========================================

#[tokio::test]
async fn seuils_surcharges_via_config_kv() {
    let (_db_guard, db_path) = create_test_db().unwrap();

    let config = Arc::new(ConfigManager::new(&db_path).unwrap());
    config
        .set_config_value("import.low_volume_threshold", "3")
        .unwrap();
    config
        .set_config_value("import.insert_batch_size", "2")
        .unwrap();

    let ecritures = Arc::new(EcritureRepositoryImpl::new(&db_path).unwrap());
    let comptes = Arc::new(CompteRepositoryImpl::new(&db_path).unwrap());
    let importer = FecImporter::new(ecritures.clone(), comptes, config);

    // 4 lignes valides: sous le seuil par défaut (10), au-dessus du
    // seuil surchargé (3)
    let (_file_guard, file_path) = write_fec_file(&balanced_fec_content(2)).unwrap();

    let report = importer.analyse_file(&file_path).await.unwrap();
    assert!(report.anomalies.warnings.is_empty());
    assert!(report.ready_for_import);

    let outcome = importer.import_file(&file_path).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.count, 4);
    assert_eq!(ecritures.count_by_exercice(2024).await.unwrap(), 4);
}
