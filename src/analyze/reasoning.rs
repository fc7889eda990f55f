// src/analyze/reasoning.rs
//! Human-readable explanation and recommendations for a NOVA verdict.
//! Tone goes from cautionary (group 4) to encouraging (group 1).

use super::nova::NovaGroup;

/// Above this many additives, group 4 gets an extra tolerance warning.
pub const ADDITIVE_WARNING_THRESHOLD: usize = 3;

pub fn reasoning(group: NovaGroup, additive_count: usize) -> String {
    match group {
        NovaGroup::UltraProcessed => format!(
            "Produit ultra-transformé (NOVA 4) : la liste contient des marqueurs \
             d'ultra-transformation et {} additif(s) identifié(s), signes d'une \
             formulation industrielle.",
            additive_count
        ),
        NovaGroup::Processed => "Produit transformé (NOVA 3) : plusieurs ingrédients \
             ajoutés (sucre, sel, matières grasses, levure...) modifient l'aliment \
             d'origine par des procédés simples."
            .to_string(),
        NovaGroup::CulinaryIngredient => "Ingrédient culinaire transformé (NOVA 2) : \
             produit extrait ou raffiné à partir d'aliments naturels, destiné à la \
             préparation des repas."
            .to_string(),
        NovaGroup::Unprocessed => "Aliment brut ou peu transformé (NOVA 1) : aucun \
             marqueur de transformation industrielle n'a été détecté."
            .to_string(),
    }
}

/// Ordered advice; the generic label advice always closes the list.
pub fn recommendations(group: NovaGroup, additive_count: usize) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    match group {
        NovaGroup::UltraProcessed => {
            out.push("Privilégiez une alternative moins transformée de ce produit.");
            out.push("À consommer occasionnellement plutôt qu'au quotidien.");
            if additive_count > ADDITIVE_WARNING_THRESHOLD {
                out.push(
                    "Nombre élevé d'additifs : surveillez votre tolérance, \
                     en particulier en cas de sensibilité digestive.",
                );
            }
            out.push("Une version faite maison serait une option plus saine.");
        }
        NovaGroup::Processed => {
            out.push("Acceptable avec modération, idéalement pas plus de 2 à 3 fois par semaine.");
            out.push("Une version maison vous permettrait de maîtriser sel, sucre et matières grasses.");
            out.push("Comparez les étiquettes et choisissez les listes d'ingrédients les plus courtes.");
        }
        NovaGroup::CulinaryIngredient => {
            out.push("Bon ingrédient culinaire pour cuisiner vos plats maison.");
            out.push("À utiliser avec modération dans le cadre d'une alimentation équilibrée.");
        }
        NovaGroup::Unprocessed => {
            out.push("Excellent choix ! Ce produit brut est la base d'une alimentation saine.");
            out.push("Continuez à privilégier ce type d'aliments au quotidien.");
        }
    }

    out.push("Consultez l'étiquetage nutritionnel complet (Nutri-Score, valeurs nutritionnelles).");
    out.push("Adaptez votre consommation à vos besoins nutritionnels personnels.");

    out.into_iter().map(String::from).collect()
}
