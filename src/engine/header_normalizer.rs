// ==========================================
// Pipeline FEC - Normalisation d'en-tête
// ==========================================
// Responsabilité: réconcilier des intitulés de colonnes arbitraires
// avec les 18 champs FEC canoniques, via une table d'alias
// ==========================================
// La table d'alias est une valeur immuable construite une fois et
// injectée (pas d'état global): les tests peuvent fournir leur propre
// table. Une colonne non reconnue devient Custom_<origine>, jamais
// supprimée. Une colonne obligatoire absente est un avertissement,
// pas une erreur fatale: le caractère bloquant est décidé plus tard
// sur la complétude réelle des données.
// ==========================================

use crate::domain::ecriture::NormalizedHeader;
use crate::domain::types::{ColumnTarget, FecField, Separator};
use std::collections::HashMap;

/// Normalise un jeton d'en-tête: minuscules, accents repliés,
/// [a-z0-9_] uniquement
///
/// Même normalisation que la recherche de signature du détecteur de
/// format: espaces et ponctuation disparaissent, les lettres
/// accentuées sont ramenées à leur base
/// ("Date écriture" → "dateecriture")
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

// ==========================================
// Table d'alias
// ==========================================

/// Alias connus, déjà normalisés (dizaines de variantes par champ,
/// collectées sur des exports réels de logiciels comptables)
const DEFAULT_ALIASES: &[(&str, FecField)] = &[
    // JournalCode
    ("journalcode", FecField::JournalCode),
    ("journal_code", FecField::JournalCode),
    ("codejournal", FecField::JournalCode),
    ("code_journal", FecField::JournalCode),
    ("journal", FecField::JournalCode),
    // JournalLib
    ("journallib", FecField::JournalLib),
    ("journal_lib", FecField::JournalLib),
    ("libellejournal", FecField::JournalLib),
    ("libelle_journal", FecField::JournalLib),
    ("libjournal", FecField::JournalLib),
    ("lib_journal", FecField::JournalLib),
    ("journal_libelle", FecField::JournalLib),
    // EcritureNum
    ("ecriturenum", FecField::EcritureNum),
    ("ecriture_num", FecField::EcritureNum),
    ("numecriture", FecField::EcritureNum),
    ("num_ecriture", FecField::EcritureNum),
    ("numeroecriture", FecField::EcritureNum),
    ("numero_ecriture", FecField::EcritureNum),
    ("noecriture", FecField::EcritureNum),
    ("no_ecriture", FecField::EcritureNum),
    // EcritureDate
    ("ecrituredate", FecField::EcritureDate),
    ("ecriture_date", FecField::EcritureDate),
    ("dateecriture", FecField::EcritureDate),
    ("date_ecriture", FecField::EcritureDate),
    ("datecriture", FecField::EcritureDate),
    ("datecomptable", FecField::EcritureDate),
    ("date_comptable", FecField::EcritureDate),
    // CompteNum
    ("comptenum", FecField::CompteNum),
    ("compte_num", FecField::CompteNum),
    ("numcompte", FecField::CompteNum),
    ("num_compte", FecField::CompteNum),
    ("numerocompte", FecField::CompteNum),
    ("numero_compte", FecField::CompteNum),
    ("numerodecompte", FecField::CompteNum),
    ("nocompte", FecField::CompteNum),
    ("compte", FecField::CompteNum),
    // CompteLib
    ("comptelib", FecField::CompteLib),
    ("compte_lib", FecField::CompteLib),
    ("libellecompte", FecField::CompteLib),
    ("libelle_compte", FecField::CompteLib),
    ("libcompte", FecField::CompteLib),
    ("lib_compte", FecField::CompteLib),
    ("intitulecompte", FecField::CompteLib),
    ("intitule_compte", FecField::CompteLib),
    // CompAuxNum
    ("compauxnum", FecField::CompAuxNum),
    ("comp_aux_num", FecField::CompAuxNum),
    ("compteauxiliaire", FecField::CompAuxNum),
    ("compte_auxiliaire", FecField::CompAuxNum),
    ("compteaux", FecField::CompAuxNum),
    ("compte_aux", FecField::CompAuxNum),
    ("numcompteaux", FecField::CompAuxNum),
    ("num_compte_aux", FecField::CompAuxNum),
    // CompAuxLib
    ("compauxlib", FecField::CompAuxLib),
    ("comp_aux_lib", FecField::CompAuxLib),
    ("libelleauxiliaire", FecField::CompAuxLib),
    ("libelle_auxiliaire", FecField::CompAuxLib),
    ("libcompteaux", FecField::CompAuxLib),
    ("lib_compte_aux", FecField::CompAuxLib),
    ("compte_aux_lib", FecField::CompAuxLib),
    // PieceRef
    ("pieceref", FecField::PieceRef),
    ("piece_ref", FecField::PieceRef),
    ("refpiece", FecField::PieceRef),
    ("ref_piece", FecField::PieceRef),
    ("referencepiece", FecField::PieceRef),
    ("reference_piece", FecField::PieceRef),
    ("numpiece", FecField::PieceRef),
    ("num_piece", FecField::PieceRef),
    ("piece", FecField::PieceRef),
    // PieceDate
    ("piecedate", FecField::PieceDate),
    ("piece_date", FecField::PieceDate),
    ("datepiece", FecField::PieceDate),
    ("date_piece", FecField::PieceDate),
    // EcritureLib
    ("ecriturelib", FecField::EcritureLib),
    ("ecriture_lib", FecField::EcritureLib),
    ("libelleecriture", FecField::EcritureLib),
    ("libelle_ecriture", FecField::EcritureLib),
    ("libecriture", FecField::EcritureLib),
    ("lib_ecriture", FecField::EcritureLib),
    ("libelle", FecField::EcritureLib),
    ("intitule", FecField::EcritureLib),
    // Debit
    ("debit", FecField::Debit),
    ("mtdebit", FecField::Debit),
    ("mt_debit", FecField::Debit),
    ("montantdebit", FecField::Debit),
    ("montant_debit", FecField::Debit),
    // Credit
    ("credit", FecField::Credit),
    ("mtcredit", FecField::Credit),
    ("mt_credit", FecField::Credit),
    ("montantcredit", FecField::Credit),
    ("montant_credit", FecField::Credit),
    // EcritureLet
    ("ecriturelet", FecField::EcritureLet),
    ("ecriture_let", FecField::EcritureLet),
    ("lettrage", FecField::EcritureLet),
    ("codelettrage", FecField::EcritureLet),
    ("code_lettrage", FecField::EcritureLet),
    // DateLet
    ("datelet", FecField::DateLet),
    ("date_let", FecField::DateLet),
    ("datelettrage", FecField::DateLet),
    ("date_lettrage", FecField::DateLet),
    // ValidDate
    ("validdate", FecField::ValidDate),
    ("valid_date", FecField::ValidDate),
    ("datevalidation", FecField::ValidDate),
    ("date_validation", FecField::ValidDate),
    ("datevalid", FecField::ValidDate),
    ("date_valid", FecField::ValidDate),
    // MontantDevise
    ("montantdevise", FecField::MontantDevise),
    ("montant_devise", FecField::MontantDevise),
    ("mtdevise", FecField::MontantDevise),
    ("mt_devise", FecField::MontantDevise),
    // IdDevise
    ("iddevise", FecField::IdDevise),
    ("id_devise", FecField::IdDevise),
    ("devise", FecField::IdDevise),
    ("codedevise", FecField::IdDevise),
    ("code_devise", FecField::IdDevise),
];

/// Table d'alias immuable, construite une fois puis injectée
#[derive(Debug, Clone)]
pub struct AliasTable {
    map: HashMap<String, FecField>,
}

impl AliasTable {
    /// Table vide (tests)
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Construit une table depuis des alias bruts (normalisés ici)
    pub fn from_aliases<'a>(aliases: impl IntoIterator<Item = (&'a str, FecField)>) -> Self {
        let map = aliases
            .into_iter()
            .map(|(alias, field)| (normalize_token(alias), field))
            .collect();
        Self { map }
    }

    pub fn lookup(&self, normalized: &str) -> Option<FecField> {
        self.map.get(normalized).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::from_aliases(DEFAULT_ALIASES.iter().copied())
    }
}

// ==========================================
// HeaderNormalizer
// ==========================================
pub struct HeaderNormalizer {
    aliases: AliasTable,
}

impl HeaderNormalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Réconcilie la ligne d'en-tête avec les champs canoniques
    ///
    /// # Paramètres
    /// - header_line: ligne d'en-tête brute
    /// - separator: séparateur détecté
    ///
    /// # Comportement
    /// - colonne reconnue: mappée vers son champ canonique
    /// - collision d'alias: le dernier gagne, collision signalée
    /// - colonne inconnue: conservée en Custom_<origine>
    /// - champ obligatoire absent: listé dans `missing`
    pub fn normalize(&self, header_line: &str, separator: Separator) -> NormalizedHeader {
        let sep = separator.as_char();

        let mut columns = Vec::new();
        let mut index_of: HashMap<FecField, usize> = HashMap::new();
        let mut collisions = Vec::new();

        for (index, raw) in header_line.split(sep).enumerate() {
            let token = normalize_token(raw);
            match self.aliases.lookup(&token) {
                Some(field) => {
                    if let Some(previous) = index_of.insert(field, index) {
                        collisions.push(format!(
                            "{}: colonnes {} et {} (la dernière gagne)",
                            field.as_str(),
                            previous,
                            index
                        ));
                        tracing::warn!(
                            field = field.as_str(),
                            previous,
                            index,
                            "collision d'alias d'en-tête"
                        );
                    }
                    columns.push(ColumnTarget::Fec(field));
                }
                None => {
                    columns.push(ColumnTarget::Custom(raw.trim().to_string()));
                }
            }
        }

        let missing: Vec<FecField> = FecField::ALL
            .iter()
            .filter(|field| !index_of.contains_key(field))
            .copied()
            .collect();

        if !missing.is_empty() {
            tracing::warn!(count = missing.len(), "champs obligatoires absents de l'en-tête");
        }

        NormalizedHeader {
            columns,
            index_of,
            missing,
            collisions,
        }
    }
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::new(AliasTable::default())
    }
}
