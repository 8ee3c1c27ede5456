//! Accent-free slugs, unique per (record kind, language).

use crate::error::{SyncError, SyncResult};
use crate::i18n::Language;
use crate::models::{RecordId, RecordKind};
use crate::store::RecordStore;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Upper bound on numeric suffixes tried before giving up.
pub const MAX_SLUG_ATTEMPTS: u32 = 10_000;

/// Lowercase, trim and strip diacritics.
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("separator pattern is valid"))
}

/// Turn already-normalized text into an ASCII slug.
///
/// Characters outside `[a-z0-9_\s-]` are dropped, runs of hyphens and
/// whitespace collapse to a single hyphen, and leading or trailing hyphens
/// and underscores are trimmed.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .nfkd()
        .filter(|c| c.is_ascii())
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    separator_regex()
        .replace_all(&kept, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// Slug base for `raw`, falling back to the record kind when nothing survives.
pub fn base_slug(kind: RecordKind, raw: &str) -> String {
    let base = slugify(&normalize_text(raw));
    if base.is_empty() {
        kind.as_str().to_string()
    } else {
        base
    }
}

/// Find the first free slug for `raw` within `kind` and `language`.
///
/// Tries the base slug, then `base-1`, `base-2`, ... The record being saved
/// is passed as `exclude` so re-saving unchanged content keeps its slug.
/// The check happens right before the caller writes; concurrent writers may
/// still race inside that gap.
pub fn generate_unique_slug<S: RecordStore + ?Sized>(
    store: &S,
    kind: RecordKind,
    language: Language,
    raw: &str,
    exclude: Option<RecordId>,
) -> SyncResult<String> {
    let base = base_slug(kind, raw);

    if !store.slug_taken(kind, language, &base, exclude)? {
        return Ok(base);
    }

    for counter in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, counter);
        if !store.slug_taken(kind, language, &candidate, exclude)? {
            debug!(
                "Slug '{}' taken for {} in {}, using '{}'",
                base,
                kind.as_str(),
                language,
                candidate
            );
            return Ok(candidate);
        }
    }

    Err(SyncError::SlugSpaceExhausted {
        base,
        language,
        attempts: MAX_SLUG_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, IngredientFields, Recipe, RecipeFields, RecipeIngredient};
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ==================== normalize_text Tests ====================

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("  Ensalada Mediterránea "), "ensalada mediterranea");
        assert_eq!(normalize_text("Crème Brûlée"), "creme brulee");
        assert_eq!(normalize_text("Pão de Queijo"), "pao de queijo");
        assert_eq!(normalize_text("Töltött Káposzta"), "toltott kaposzta");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    // ==================== slugify Tests ====================

    #[test]
    fn test_slugify_hyphenates_words() {
        assert_eq!(slugify("ensalada mediterranea"), "ensalada-mediterranea");
        assert_eq!(slugify("tarta   de\tmanzana"), "tarta-de-manzana");
    }

    #[test]
    fn test_slugify_drops_punctuation_and_non_ascii() {
        assert_eq!(slugify("pollo al curry (picante)!"), "pollo-al-curry-picante");
        assert_eq!(slugify("l'escalivada"), "lescalivada");
        assert_eq!(slugify("straße"), "strae");
    }

    #[test]
    fn test_slugify_trims_separators() {
        assert_eq!(slugify("--pan -- tomaca__"), "pan-tomaca");
    }

    #[test]
    fn test_base_slug_falls_back_to_kind() {
        assert_eq!(base_slug(RecordKind::Recipe, "!!!"), "recipe");
        assert_eq!(base_slug(RecordKind::Ingredient, ""), "ingredient");
    }

    // ==================== generate_unique_slug Tests ====================

    fn recipe_with_slug(store: &MemoryStore, language: Language, slug: &str) -> RecordId {
        let id = store
            .insert_recipe(Language::SPANISH, &RecipeFields::default())
            .expect("Should insert");
        store
            .save_recipe_fields(
                id,
                language,
                &RecipeFields {
                    slug: slug.to_string(),
                    ..Default::default()
                },
            )
            .expect("Should save");
        id
    }

    #[test]
    fn test_generate_unique_slug_free_base() {
        let store = MemoryStore::new();
        let slug = generate_unique_slug(
            &store,
            RecordKind::Recipe,
            Language::SPANISH,
            "Ensalada Mediterránea",
            None,
        )
        .expect("Should generate");
        assert_eq!(slug, "ensalada-mediterranea");
    }

    #[test]
    fn test_generate_unique_slug_appends_counter() {
        let store = MemoryStore::new();
        recipe_with_slug(&store, Language::SPANISH, "ensalada-mediterranea");

        let slug = generate_unique_slug(
            &store,
            RecordKind::Recipe,
            Language::SPANISH,
            "Ensalada Mediterránea",
            None,
        )
        .unwrap();
        assert_eq!(slug, "ensalada-mediterranea-1");

        recipe_with_slug(&store, Language::SPANISH, "ensalada-mediterranea-1");
        let slug = generate_unique_slug(
            &store,
            RecordKind::Recipe,
            Language::SPANISH,
            "Ensalada Mediterránea",
            None,
        )
        .unwrap();
        assert_eq!(slug, "ensalada-mediterranea-2");
    }

    #[test]
    fn test_generate_unique_slug_scoped_to_language() {
        let store = MemoryStore::new();
        recipe_with_slug(&store, Language::SPANISH, "gazpacho");

        let slug = generate_unique_slug(
            &store,
            RecordKind::Recipe,
            Language::ENGLISH,
            "Gazpacho",
            None,
        )
        .unwrap();
        assert_eq!(slug, "gazpacho");
    }

    #[test]
    fn test_generate_unique_slug_scoped_to_kind() {
        let store = MemoryStore::new();
        recipe_with_slug(&store, Language::SPANISH, "tomate");

        let slug = generate_unique_slug(
            &store,
            RecordKind::Ingredient,
            Language::SPANISH,
            "Tomate",
            None,
        )
        .unwrap();
        assert_eq!(slug, "tomate");
    }

    #[test]
    fn test_generate_unique_slug_excludes_self() {
        let store = MemoryStore::new();
        let id = store.insert_ingredient().unwrap();
        store
            .save_ingredient_fields(
                id,
                Language::SPANISH,
                &IngredientFields {
                    name: "Ajo".to_string(),
                    slug: "ajo".to_string(),
                },
            )
            .unwrap();

        let resaved =
            generate_unique_slug(&store, RecordKind::Ingredient, Language::SPANISH, "Ajo", Some(id))
                .unwrap();
        assert_eq!(resaved, "ajo");

        let other =
            generate_unique_slug(&store, RecordKind::Ingredient, Language::SPANISH, "Ajo", None)
                .unwrap();
        assert_eq!(other, "ajo-1");
    }

    /// A store in which every slug is already in use.
    #[derive(Default)]
    struct SaturatedStore {
        checks: AtomicU32,
    }

    impl RecordStore for SaturatedStore {
        fn insert_recipe(&self, _: Language, _: &RecipeFields) -> anyhow::Result<RecordId> {
            unreachable!()
        }
        fn load_recipe(&self, _: RecordId) -> anyhow::Result<Option<Recipe>> {
            unreachable!()
        }
        fn save_recipe_fields(
            &self,
            _: RecordId,
            _: Language,
            _: &RecipeFields,
        ) -> anyhow::Result<()> {
            unreachable!()
        }
        fn set_source_language(&self, _: RecordId, _: Language) -> anyhow::Result<()> {
            unreachable!()
        }
        fn set_recipe_ingredients(&self, _: RecordId, _: &[RecipeIngredient]) -> anyhow::Result<()> {
            unreachable!()
        }
        fn insert_ingredient(&self) -> anyhow::Result<RecordId> {
            unreachable!()
        }
        fn load_ingredient(&self, _: RecordId) -> anyhow::Result<Option<Ingredient>> {
            unreachable!()
        }
        fn save_ingredient_fields(
            &self,
            _: RecordId,
            _: Language,
            _: &IngredientFields,
        ) -> anyhow::Result<()> {
            unreachable!()
        }
        fn find_ingredient_by_name(&self, _: &str) -> anyhow::Result<Option<RecordId>> {
            unreachable!()
        }
        fn slug_taken(
            &self,
            _: RecordKind,
            _: Language,
            _: &str,
            _: Option<RecordId>,
        ) -> anyhow::Result<bool> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    #[test]
    fn test_generate_unique_slug_gives_up_when_every_suffix_is_taken() {
        let store = SaturatedStore::default();

        let result = generate_unique_slug(
            &store,
            RecordKind::Recipe,
            Language::CATALAN,
            "Crema catalana",
            None,
        );

        match result {
            Err(SyncError::SlugSpaceExhausted {
                base,
                language,
                attempts,
            }) => {
                assert_eq!(base, "crema-catalana");
                assert_eq!(language, Language::CATALAN);
                assert_eq!(attempts, MAX_SLUG_ATTEMPTS);
            }
            other => panic!("Expected SlugSpaceExhausted, got {:?}", other),
        }
        // The base plus every numbered suffix, and nothing more.
        assert_eq!(store.checks.load(Ordering::SeqCst), MAX_SLUG_ATTEMPTS + 1);
    }

    proptest! {
        #[test]
        fn prop_slugs_are_url_safe(raw in "\\PC{0,40}") {
            let slug = base_slug(RecordKind::Recipe, &raw);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn prop_slug_generation_is_deterministic(raw in "[a-zA-ZáéíóúñçàèòüÁÉ ]{0,30}") {
            prop_assert_eq!(base_slug(RecordKind::Recipe, &raw), base_slug(RecordKind::Recipe, &raw));
        }
    }
}
