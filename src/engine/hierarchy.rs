// ==========================================
// Pipeline FEC - Hiérarchie du plan de comptes
// ==========================================
// Responsabilité: dériver les racines à 3 chiffres des numéros de
// compte observés et créer celles qui manquent au plan de comptes
// Contrainte: un échec de création est journalisé et ignoré, jamais
// fatal pour l'import
// ==========================================

use crate::domain::compte::RootAccount;
use crate::repository::CompteRepository;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

/// Longueur d'une racine de compte
pub const ROOT_LENGTH: usize = 3;

// ==========================================
// HierarchyBuilder
// ==========================================
pub struct HierarchyBuilder<R>
where
    R: CompteRepository + ?Sized,
{
    repo: Arc<R>,
}

impl<R> HierarchyBuilder<R>
where
    R: CompteRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Crée les comptes racines manquants
    ///
    /// # Paramètres
    /// - account_labels: numéros de compte observés → premier libellé vu
    ///
    /// # Retour
    /// - Ok(Vec<RootAccount>): racines effectivement créées
    pub async fn ensure_roots(
        &self,
        account_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<RootAccount>, Box<dyn Error>> {
        // Racine → premier libellé observé sous cette racine
        let mut roots: BTreeMap<String, String> = BTreeMap::new();
        for (numero, libelle) in account_labels {
            if let Some(root) = derive_root(numero) {
                roots.entry(root).or_insert_with(|| libelle.clone());
            }
        }

        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let wanted: Vec<String> = roots.keys().cloned().collect();
        let existing = self.repo.existing_roots(&wanted).await?;

        let mut created = Vec::new();
        for (root, libelle) in &roots {
            if existing.contains(root) {
                continue;
            }

            let libelle = if libelle.is_empty() {
                format!("Compte racine {}", root)
            } else {
                libelle.clone()
            };

            let Some(account) = RootAccount::from_root(root, &libelle) else {
                continue;
            };

            match self.repo.insert_root_if_absent(&account).await {
                Ok(true) => {
                    tracing::info!(
                        numero = account.numero.as_str(),
                        classe = account.classe,
                        type_compte = account.account_type.as_str(),
                        "compte racine créé"
                    );
                    created.push(account);
                }
                // créé entre-temps par un import concurrent
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        numero = root.as_str(),
                        error = %e,
                        "échec de création de compte racine, ignoré"
                    );
                }
            }
        }

        Ok(created)
    }
}

/// Racine numérique à 3 chiffres d'un numéro de compte
///
/// None si le préfixe n'est pas entièrement numérique
fn derive_root(numero: &str) -> Option<String> {
    let root: String = numero.trim().chars().take(ROOT_LENGTH).collect();
    if root.len() == ROOT_LENGTH && root.chars().all(|c| c.is_ascii_digit()) {
        Some(root)
    } else {
        None
    }
}
