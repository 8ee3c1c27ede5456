//! Multilingual synchronization of recipes and their ingredients.
//!
//! After the canonical-language content of a recipe has been saved, the
//! orchestrator walks every other supported language and brings its field
//! set up to date:
//!
//! - creation (no snapshot): every field is translated from the source
//! - update (snapshot present): only fields whose source value changed are
//!   re-translated, the rest keep the translation already stored
//!
//! Rich-text fields are sanitized after translation, and each language gets
//! its own slug derived from its translated title. Translation failures
//! degrade to the source text and never abort the pass; storage failures
//! propagate.

use crate::error::{SyncError, SyncResult};
use crate::html_cleaner::clean_translated_html;
use crate::i18n::Language;
use crate::models::{FieldSnapshot, Ingredient, IngredientFields, Recipe, RecipeField, RecordKind};
use crate::slug::generate_unique_slug;
use crate::store::RecordStore;
use crate::translation::{translate_or_original, Translate};
use tracing::{debug, info, warn};

/// Drives translations through a store and a translation service.
pub struct TranslationSync<'a, S, T> {
    store: &'a S,
    translator: &'a T,
}

impl<'a, S: RecordStore, T: Translate> TranslationSync<'a, S, T> {
    pub fn new(store: &'a S, translator: &'a T) -> Self {
        Self { store, translator }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Entry point after a recipe is created or updated.
    ///
    /// Must run once per save, after the canonical field set and the
    /// ingredient rows are persisted. `snapshot` is the pre-edit canonical
    /// content for an update and `None` for a creation.
    pub async fn handle_translations_for_recipe(
        &self,
        recipe: &mut Recipe,
        source: Language,
        snapshot: Option<&FieldSnapshot>,
    ) -> SyncResult<()> {
        let targets = source.targets();
        info!(
            "Synchronizing recipe {} from {} into {} languages ({})",
            recipe.id,
            source,
            targets.len(),
            if snapshot.is_some() { "update" } else { "create" }
        );

        for target in targets {
            info!("Recipe {}: updating {} translation", recipe.id, target.name());
            self.translate_fields(recipe, source, target, &RecipeField::ALL, snapshot)
                .await?;
        }

        self.sync_all_ingredients(recipe, source).await
    }

    /// Bring the `target` field set of `recipe` in line with `source`.
    ///
    /// Updates `recipe.translations` and persists the target field set.
    pub async fn translate_fields(
        &self,
        recipe: &mut Recipe,
        source: Language,
        target: Language,
        fields: &[RecipeField],
        snapshot: Option<&FieldSnapshot>,
    ) -> SyncResult<()> {
        if source == target {
            return Ok(());
        }

        let force_translate = snapshot.is_none();

        // An edit made while viewing another language must not re-translate.
        if !force_translate && recipe.active_language != source {
            debug!(
                "Recipe {} edited in {} (source {}), keeping {} as is",
                recipe.id, recipe.active_language, source, target
            );
            if let Some(current) = recipe.fields(target).cloned() {
                self.store.save_recipe_fields(recipe.id, target, &current)?;
            }
            return Ok(());
        }

        let source_fields = recipe.fields(source).cloned().unwrap_or_default();
        let existing = recipe.fields(target).cloned().unwrap_or_default();
        let mut updated = existing.clone();
        let mut title_retranslated = false;

        for &field in fields {
            let new_value = source_fields.get(field);
            let changed = match snapshot {
                None => true,
                Some(snapshot) => snapshot.get(field) != new_value,
            };

            if changed {
                let value = self.translate_value(field, new_value, source, target).await;
                updated.set(field, value);
                if field == RecipeField::Title {
                    title_retranslated = true;
                }
            } else {
                debug!(
                    "Recipe {}: {} unchanged, carrying over {} translation",
                    recipe.id,
                    field.name(),
                    target
                );
                updated.set(field, existing.get(field).to_string());
            }
        }

        if fields.contains(&RecipeField::Title) && (title_retranslated || updated.slug.is_empty())
        {
            updated.slug = generate_unique_slug(
                self.store,
                RecordKind::Recipe,
                target,
                &updated.title,
                Some(recipe.id),
            )?;
        }

        self.store.save_recipe_fields(recipe.id, target, &updated)?;
        recipe.translations.insert(target, updated);
        Ok(())
    }

    async fn translate_value(
        &self,
        field: RecipeField,
        value: &str,
        source: Language,
        target: Language,
    ) -> String {
        if value.is_empty() {
            return String::new();
        }

        let translated = translate_or_original(self.translator, value, source, target).await;
        if field.is_rich_text() {
            clean_translated_html(&translated)
        } else {
            translated
        }
    }

    /// Fill in every missing language of `ingredient` from its `source` name.
    ///
    /// Existing non-empty translations are never overwritten.
    pub async fn sync_ingredient(
        &self,
        ingredient: &mut Ingredient,
        source: Language,
    ) -> SyncResult<()> {
        let source_name = ingredient.name(source).to_string();
        if source_name.trim().is_empty() {
            warn!(
                "Ingredient {} has no {} name, skipping translation",
                ingredient.id, source
            );
            return Ok(());
        }

        for target in source.targets() {
            if ingredient.has_name(target) {
                continue;
            }

            let name = translate_or_original(self.translator, &source_name, source, target).await;
            let slug = generate_unique_slug(
                self.store,
                RecordKind::Ingredient,
                target,
                &name,
                Some(ingredient.id),
            )?;

            let fields = IngredientFields { name, slug };
            self.store
                .save_ingredient_fields(ingredient.id, target, &fields)?;
            ingredient.translations.insert(target, fields);
        }

        Ok(())
    }

    /// Synchronize every ingredient attached to `recipe`.
    pub async fn sync_all_ingredients(&self, recipe: &Recipe, source: Language) -> SyncResult<()> {
        for row in &recipe.ingredients {
            let mut ingredient = self
                .store
                .load_ingredient(row.ingredient_id)?
                .ok_or(SyncError::IngredientNotFound(row.ingredient_id))?;
            self.sync_ingredient(&mut ingredient, source).await?;
        }
        Ok(())
    }
}
