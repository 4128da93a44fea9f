// ==========================================
// Pipeline FEC - Détection du format de fichier
// ==========================================
// Responsabilité: choisir le séparateur, localiser la ligne d'en-tête,
// classer l'encodage (informatif)
// Entrée: l'ensemble des lignes non vides du fichier, chargé une fois
// Sortie: DetectedFormat, ou ImportError::Format si aucune en-tête
// n'est localisable
// ==========================================
// Principe de scoring: le bon séparateur donne un nombre de colonnes
// stable sur tout le fichier, y compris près de la fin (fichiers avec
// bruit de queue). Score = moyenne / (1 + variance) du nombre de
// colonnes sur un échantillon borné.
// ==========================================

use crate::domain::ecriture::DetectedFormat;
use crate::domain::types::{Encoding, Separator};
use crate::engine::error::ImportError;
use crate::engine::header_normalizer::normalize_token;

/// Profondeur de recherche de l'en-tête (lignes)
pub const HEADER_SCAN_DEPTH: usize = 10;

/// Taille de l'échantillon de tête pour le scoring de séparateur
pub const SAMPLE_HEAD_LINES: usize = 10;

/// Taille de l'échantillon de queue pour le scoring de séparateur
pub const SAMPLE_TAIL_LINES: usize = 50;

/// Signature d'en-tête: 5 jetons discriminants du format FEC
pub const HEADER_SIGNATURE: [&str; 5] =
    ["journalcode", "comptenum", "ecriturenum", "debit", "credit"];

/// Nombre minimal de jetons de signature pour reconnaître l'en-tête
pub const MIN_SIGNATURE_MATCHES: usize = 4;

// ==========================================
// FormatDetector
// ==========================================
pub struct FormatDetector;

impl FormatDetector {
    /// Décode le contenu brut du fichier et classe son encodage
    ///
    /// Best-effort: UTF-8 si les octets sont valides, sinon repli
    /// Latin-1 (chaque octet devient le point de code correspondant).
    /// Purement informatif, ne bloque jamais l'import.
    pub fn decode(bytes: &[u8]) -> (String, Encoding) {
        match std::str::from_utf8(bytes) {
            Ok(text) => (text.to_string(), Encoding::Utf8),
            Err(_) => {
                let text: String = bytes.iter().map(|&b| b as char).collect();
                (text, Encoding::Latin1)
            }
        }
    }

    /// Détecte séparateur et ligne d'en-tête
    ///
    /// # Paramètres
    /// - lines: lignes non vides du fichier, dans l'ordre
    /// - encoding: encodage classé au décodage
    ///
    /// # Erreurs
    /// - ImportError::Format si aucune ligne des HEADER_SCAN_DEPTH
    ///   premières ne porte la signature FEC
    pub fn detect(lines: &[String], encoding: Encoding) -> Result<DetectedFormat, ImportError> {
        if lines.is_empty() {
            return Err(ImportError::Format("fichier vide".to_string()));
        }

        let separator = Self::pick_separator(lines);
        tracing::debug!(separator = %separator, "séparateur retenu");

        let header_line_index = Self::find_header(lines, separator).ok_or_else(|| {
            ImportError::Format(format!(
                "en-tête introuvable dans les {} premières lignes",
                HEADER_SCAN_DEPTH
            ))
        })?;

        Ok(DetectedFormat {
            separator,
            header_line_index,
            encoding,
        })
    }

    /// Choisit le séparateur au meilleur score de stabilité
    ///
    /// Égalités départagées par l'ordre des candidats (premier rencontré)
    fn pick_separator(lines: &[String]) -> Separator {
        let mut best = Separator::CANDIDATES[0];
        let mut best_score = f64::MIN;

        for candidate in Separator::CANDIDATES {
            let score = Self::separator_score(lines, candidate);
            tracing::trace!(separator = %candidate, score, "score de séparateur");
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }

        best
    }

    /// Score de stabilité d'un séparateur sur l'échantillon borné
    ///
    /// Échantillon: les SAMPLE_HEAD_LINES premières lignes et les
    /// SAMPLE_TAIL_LINES dernières (coût O(1) quelle que soit la taille
    /// du fichier). score = moyenne / (1 + variance)
    fn separator_score(lines: &[String], separator: Separator) -> f64 {
        let sep = separator.as_char();
        let head = lines.iter().take(SAMPLE_HEAD_LINES);
        let tail_start = lines.len().saturating_sub(SAMPLE_TAIL_LINES).max(
            SAMPLE_HEAD_LINES.min(lines.len()),
        );
        let tail = lines[tail_start..].iter();

        let counts: Vec<f64> = head
            .chain(tail)
            .map(|line| line.split(sep).count() as f64)
            .collect();

        if counts.is_empty() {
            return 0.0;
        }

        let avg = counts.iter().sum::<f64>() / counts.len() as f64;
        let variance =
            counts.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / counts.len() as f64;

        avg / (1.0 + variance)
    }

    /// Localise la ligne d'en-tête par recouvrement de signature
    ///
    /// Première ligne parmi les HEADER_SCAN_DEPTH premières dont les
    /// jetons normalisés recouvrent au moins MIN_SIGNATURE_MATCHES
    /// éléments de HEADER_SIGNATURE
    fn find_header(lines: &[String], separator: Separator) -> Option<usize> {
        let sep = separator.as_char();

        for (index, line) in lines.iter().take(HEADER_SCAN_DEPTH).enumerate() {
            let matches = line
                .split(sep)
                .map(normalize_token)
                .filter(|token| HEADER_SIGNATURE.contains(&token.as_str()))
                .collect::<std::collections::BTreeSet<_>>()
                .len();

            if matches >= MIN_SIGNATURE_MATCHES {
                return Some(index);
            }
        }

        None
    }
}
