//! Saving recipes in the language the author is writing in.
//!
//! Both entry points persist the canonical field set and the ingredient
//! list first and then hand the recipe to the translation orchestrator.

use crate::error::{SyncError, SyncResult};
use crate::i18n::Language;
use crate::models::{
    FieldSnapshot, IngredientFields, Recipe, RecipeFields, RecipeIngredient, RecordId, RecordKind,
};
use crate::slug::generate_unique_slug;
use crate::store::RecordStore;
use crate::sync::TranslationSync;
use crate::translation::Translate;
use tracing::{debug, info};

/// One line of the ingredient list as typed by the author.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
}

impl IngredientLine {
    pub fn new(name: impl Into<String>, quantity: f64, unit: Option<&str>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.map(str::to_string),
        }
    }
}

/// Recipe content submitted in a single language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub tips: String,
    pub ingredients: Vec<IngredientLine>,
}

impl RecipeDraft {
    pub fn validate(&self) -> SyncResult<()> {
        if self.title.trim().is_empty() {
            return Err(SyncError::Invalid("title is required".to_string()));
        }

        for (index, line) in self.ingredients.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(SyncError::Invalid(format!(
                    "ingredient {} has no name",
                    index + 1
                )));
            }
            if !line.quantity.is_finite() || line.quantity <= 0.0 {
                return Err(SyncError::Invalid(format!(
                    "ingredient '{}' needs a positive quantity",
                    line.name.trim()
                )));
            }
        }

        Ok(())
    }

    fn to_fields(&self, slug: String) -> RecipeFields {
        RecipeFields {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            instructions: self.instructions.clone(),
            tips: self.tips.clone(),
            slug,
        }
    }
}

/// Create a recipe written in `language` and translate it everywhere else.
pub async fn create_recipe<S: RecordStore, T: Translate>(
    engine: &TranslationSync<'_, S, T>,
    draft: &RecipeDraft,
    language: Language,
) -> SyncResult<Recipe> {
    draft.validate()?;
    let store = engine.store();

    let slug = generate_unique_slug(store, RecordKind::Recipe, language, &draft.title, None)?;
    let id = store.insert_recipe(language, &draft.to_fields(slug))?;
    attach_ingredients(store, id, draft, language)?;
    info!("Created recipe {} in {}", id, language.name());

    let mut recipe = store
        .load_recipe(id)?
        .ok_or(SyncError::RecipeNotFound(id))?;
    engine
        .handle_translations_for_recipe(&mut recipe, language, None)
        .await?;
    Ok(recipe)
}

/// Replace the content of recipe `id` with `draft`, written in `language`.
///
/// `language` becomes the recipe's source language. Only fields that changed
/// compared to the previous `language` content are re-translated.
pub async fn update_recipe<S: RecordStore, T: Translate>(
    engine: &TranslationSync<'_, S, T>,
    id: RecordId,
    draft: &RecipeDraft,
    language: Language,
) -> SyncResult<Recipe> {
    draft.validate()?;
    let store = engine.store();

    let mut recipe = store
        .load_recipe(id)?
        .ok_or(SyncError::RecipeNotFound(id))?;
    let previous = recipe.fields(language).cloned().unwrap_or_default();
    let snapshot = FieldSnapshot::capture(&previous);

    let title = draft.title.trim();
    let slug = if previous.title != title || previous.slug.is_empty() {
        generate_unique_slug(store, RecordKind::Recipe, language, title, Some(id))?
    } else {
        previous.slug.clone()
    };

    let fields = draft.to_fields(slug);
    store.save_recipe_fields(id, language, &fields)?;
    if recipe.source_language != language {
        debug!(
            "Recipe {} source language {} -> {}",
            id, recipe.source_language, language
        );
        store.set_source_language(id, language)?;
    }
    let rows = attach_ingredients(store, id, draft, language)?;
    info!("Updated recipe {} in {}", id, language.name());

    recipe.source_language = language;
    recipe.active_language = language;
    recipe.translations.insert(language, fields);
    recipe.ingredients = rows;

    engine
        .handle_translations_for_recipe(&mut recipe, language, Some(&snapshot))
        .await?;
    Ok(recipe)
}

/// Find the ingredient called `name` in any language, or create it with
/// `name` as its `language` name.
pub fn resolve_ingredient<S: RecordStore + ?Sized>(
    store: &S,
    name: &str,
    language: Language,
) -> SyncResult<RecordId> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::Invalid("ingredient name is empty".to_string()));
    }

    if let Some(id) = store.find_ingredient_by_name(name)? {
        debug!("Ingredient '{}' resolved to {}", name, id);
        return Ok(id);
    }

    let id = store.insert_ingredient()?;
    let slug = generate_unique_slug(store, RecordKind::Ingredient, language, name, Some(id))?;
    store.save_ingredient_fields(
        id,
        language,
        &IngredientFields {
            name: name.to_string(),
            slug,
        },
    )?;
    info!("Created ingredient {} '{}' in {}", id, name, language);
    Ok(id)
}

fn attach_ingredients<S: RecordStore + ?Sized>(
    store: &S,
    recipe_id: RecordId,
    draft: &RecipeDraft,
    language: Language,
) -> SyncResult<Vec<RecipeIngredient>> {
    let mut rows = Vec::with_capacity(draft.ingredients.len());
    for (position, line) in draft.ingredients.iter().enumerate() {
        rows.push(RecipeIngredient {
            ingredient_id: resolve_ingredient(store, &line.name, language)?,
            quantity: line.quantity,
            unit: line
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(str::to_string),
            position: position as u32,
        });
    }

    store.set_recipe_ingredients(recipe_id, &rows)?;
    Ok(rows)
}

const MAX_DENOMINATOR: i64 = 8;

/// Render a quantity for display: whole numbers as integers, everything
/// else as the closest fraction with a denominator up to 8.
///
/// `2.5` becomes `"2 1/2"`, `0.25` becomes `"1/4"`.
pub fn format_quantity(quantity: f64) -> String {
    if !quantity.is_finite() {
        return quantity.to_string();
    }
    if quantity.fract() == 0.0 {
        return format!("{}", quantity as i64);
    }

    let (numerator, denominator) = closest_fraction(quantity);
    if numerator % denominator == 0 {
        return (numerator / denominator).to_string();
    }

    if numerator.abs() > denominator {
        let whole = numerator / denominator;
        let remainder = (numerator % denominator).abs();
        format!("{} {}/{}", whole, remainder, denominator)
    } else {
        format!("{}/{}", numerator, denominator)
    }
}

/// Smallest-denominator fraction closest to `value`. Already in lowest terms.
fn closest_fraction(value: f64) -> (i64, i64) {
    let mut best = (value.round() as i64, 1);
    let mut best_error = (value - best.0 as f64).abs();

    for denominator in 2..=MAX_DENOMINATOR {
        let numerator = (value * denominator as f64).round() as i64;
        let error = (value - numerator as f64 / denominator as f64).abs();
        if error < best_error {
            best = (numerator, denominator);
            best_error = error;
        }
    }

    best
}
