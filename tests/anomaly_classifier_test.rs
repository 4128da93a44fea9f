// ==========================================
// AnomalyClassifier - tests d'intégration
// ==========================================
// Seuils bloquants, avertissements, verdict ready_for_import
// ==========================================


use fec_pipeline::domain::ecriture::ImportStatistics;
use fec_pipeline::domain::types::Severity;
use fec_pipeline::engine::anomaly_classifier::{
    AnomalyClassifier, BALANCE_UNBALANCED, LOW_DATA_VOLUME, MINOR_BALANCE_DIFF, NON_EUR_CURRENCY,
    NO_VALID_DATA, TOO_MANY_ERRORS,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use test_helpers::MockConfigReader;

fn classifier() -> AnomalyClassifier<MockConfigReader> {
    AnomalyClassifier::new(Arc::new(MockConfigReader::default()))
}

fn stats_equilibrees(valid_rows: usize, debit: &str, credit: &str) -> ImportStatistics {
    let mut stats = ImportStatistics::new();
    stats.valid_rows = valid_rows;
    stats.total_debit = Decimal::from_str(debit).unwrap();
    stats.total_credit = Decimal::from_str(credit).unwrap();
    stats.currency = Some("EUR".to_string());
    stats
}

#[tokio::test]
async fn fichier_equilibre_pret_a_l_import() {
    let stats = stats_equilibrees(100, "10000.00", "10000.00");

    let (report, recommendations) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert!(report.warnings.is_empty());
    assert!(report.ready_for_import());
    // la synthèse est toujours produite
    assert!(recommendations.iter().any(|r| r.contains("import possible")));
}

#[tokio::test]
async fn desequilibre_au_dela_du_seuil_bloque() {
    // écart de 11 € sur 10 000 € de débit: 0,11 % > 0,1 %
    let stats = stats_equilibrees(100, "10000.00", "9989.00");

    let (report, recommendations) = classifier().classify(&stats).await.unwrap();

    assert_eq!(report.critical.len(), 1);
    assert_eq!(report.critical[0].code, BALANCE_UNBALANCED);
    assert_eq!(report.critical[0].severity, Severity::Critical);
    assert!(!report.ready_for_import());
    // l'écart bloquant ne produit pas en plus l'avertissement mineur
    assert!(report.warnings.iter().all(|w| w.code != MINOR_BALANCE_DIFF));
    assert!(recommendations.iter().any(|r| r.contains(BALANCE_UNBALANCED)));
}

#[tokio::test]
async fn ecart_exactement_au_seuil_ne_bloque_pas() {
    // 10 € sur 10 000 €: ratio 0,001, le seuil est strict
    let stats = stats_equilibrees(100, "10000.00", "9990.00");

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert!(report.ready_for_import());
}

#[tokio::test]
async fn ecart_mineur_signale_sans_bloquer() {
    // 0,50 € sur 10 000 €: sous le seuil bloquant, dans [0,01; 1,00]
    let stats = stats_equilibrees(20, "10000.00", "9999.50");

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, MINOR_BALANCE_DIFF);
    assert!(report.ready_for_import());
}

#[tokio::test]
async fn trop_de_lignes_en_erreur_bloque() {
    // 6 erreurs sur 100 lignes: 6 % > 5 %
    let mut stats = stats_equilibrees(94, "9400.00", "9400.00");
    stats.error_rows = 6;

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert_eq!(report.critical.len(), 1);
    assert_eq!(report.critical[0].code, TOO_MANY_ERRORS);
    assert!(!report.ready_for_import());
}

#[tokio::test]
async fn taux_d_erreur_exactement_au_seuil_ne_bloque_pas() {
    // 5 erreurs sur 100 lignes: ratio 0,05, le seuil est strict
    let mut stats = stats_equilibrees(95, "9500.00", "9500.00");
    stats.error_rows = 5;

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert!(report.ready_for_import());
}

#[tokio::test]
async fn aucune_ligne_valide_bloque() {
    let mut stats = ImportStatistics::new();
    stats.error_rows = 3;

    let (report, _) = classifier().classify(&stats).await.unwrap();

    let codes: Vec<&str> = report.critical.iter().map(|a| a.code.as_str()).collect();
    assert!(codes.contains(&NO_VALID_DATA));
    // 3 erreurs sur 3 lignes franchit aussi le seuil de qualité
    assert!(codes.contains(&TOO_MANY_ERRORS));
    assert!(!report.ready_for_import());
    // pas d'avertissement de faible volume quand rien n'est exploitable
    assert!(report.warnings.iter().all(|w| w.code != LOW_DATA_VOLUME));
}

#[tokio::test]
async fn faible_volume_avertit_sans_bloquer() {
    let stats = stats_equilibrees(4, "400.00", "400.00");

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, LOW_DATA_VOLUME);
    assert!(report.ready_for_import());
}

#[tokio::test]
async fn devise_non_euro_avertit() {
    let mut stats = stats_equilibrees(50, "5000.00", "5000.00");
    stats.currency = Some("USD".to_string());

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, NON_EUR_CURRENCY);
    assert!(report.warnings[0].message.contains("USD"));
}

#[tokio::test]
async fn fichier_sans_montants_ne_declenche_pas_l_equilibre() {
    // total débit nul: le contrôle d'équilibre est ignoré
    let stats = stats_equilibrees(12, "0.00", "0.00");

    let (report, _) = classifier().classify(&stats).await.unwrap();

    assert!(report.critical.is_empty());
    assert!(report.ready_for_import());
}
