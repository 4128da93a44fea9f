// ==========================================
// FormatDetector - tests d'intégration
// ==========================================
// Détection du séparateur, localisation de l'en-tête, encodage
// ==========================================


use fec_pipeline::domain::types::{Encoding, Separator};
use fec_pipeline::engine::format_detector::FormatDetector;
use fec_pipeline::engine::ImportError;
use test_helpers::{balanced_fec_content, FEC_HEADER};

fn to_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn separateur_tabulation_sur_fichier_18_colonnes() {
    let lines = to_lines(&balanced_fec_content(30));
    let format = FormatDetector::detect(&lines, Encoding::Utf8).unwrap();

    assert_eq!(format.separator, Separator::Tab);
    assert_eq!(format.header_line_index, 0);

    // le séparateur retenu donne exactement 18 colonnes sur chaque ligne
    let stable = lines
        .iter()
        .filter(|l| l.split('\t').count() == 18)
        .count();
    assert!(stable as f64 / lines.len() as f64 >= 0.95);
}

#[test]
fn separateur_point_virgule() {
    let content = balanced_fec_content(20).replace('\t', ";");
    let lines = to_lines(&content);
    let format = FormatDetector::detect(&lines, Encoding::Utf8).unwrap();
    assert_eq!(format.separator, Separator::Semicolon);
}

#[test]
fn separateur_pipe() {
    let content = balanced_fec_content(20).replace('\t', "|");
    let lines = to_lines(&content);
    let format = FormatDetector::detect(&lines, Encoding::Utf8).unwrap();
    assert_eq!(format.separator, Separator::Pipe);
}

#[test]
fn en_tete_apres_lignes_de_metadonnees() {
    // métadonnées rembourrées à 18 colonnes, comme les exports tableur
    let padding = "\t".repeat(17);
    let mut content = format!(
        "Export comptable{p}\nSociété DEMO SARL exercice 2024{p}\n",
        p = padding
    );
    content.push_str(&balanced_fec_content(10));
    let lines = to_lines(&content);

    let format = FormatDetector::detect(&lines, Encoding::Utf8).unwrap();
    assert_eq!(format.header_line_index, 2);
}

#[test]
fn en_tete_introuvable() {
    let lines: Vec<String> = (0..20)
        .map(|i| format!("colonne_a\tcolonne_b\tcolonne_c\t{}", i))
        .collect();

    let err = FormatDetector::detect(&lines, Encoding::Utf8).unwrap_err();
    assert!(matches!(err, ImportError::Format(_)));
}

#[test]
fn fichier_vide_refuse() {
    let err = FormatDetector::detect(&[], Encoding::Utf8).unwrap_err();
    assert!(matches!(err, ImportError::Format(_)));
}

#[test]
fn en_tete_reconnue_avec_quatre_jetons_sur_cinq() {
    // EcritureNum absent: 4 jetons de signature restants suffisent
    let header = FEC_HEADER.replace("EcritureNum", "NumeroInterne");
    let mut lines = vec![header];
    lines.push("VE\tJournal VE\t1\t20240115\t41100001\tClients\t\t\tP1\t20240115\tlib\t100,00\t0,00\t\t\t\t\tEUR".to_string());

    let format = FormatDetector::detect(&lines, Encoding::Utf8).unwrap();
    assert_eq!(format.header_line_index, 0);
}

#[test]
fn encodage_latin1_classe_en_repli() {
    // 0xE9 = 'é' en ISO-8859-1, invalide seul en UTF-8
    let bytes = b"JournalCode\tlibell\xe9\n";
    let (text, encoding) = FormatDetector::decode(bytes);
    assert_eq!(encoding, Encoding::Latin1);
    assert!(text.contains("libellé"));

    let (_, encoding) = FormatDetector::decode("JournalCode\tlibellé\n".as_bytes());
    assert_eq!(encoding, Encoding::Utf8);
}
