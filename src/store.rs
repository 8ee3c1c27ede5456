//! Persistence boundary for translatable records.
//!
//! The engine never reaches for an ambient "current language": every read and
//! write names the language partition it touches.

use crate::i18n::Language;
use crate::models::{
    Ingredient, IngredientFields, Recipe, RecipeFields, RecipeIngredient, RecordId, RecordKind,
};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

pub trait RecordStore {
    /// Create a recipe whose only field set is `fields` in `source`.
    fn insert_recipe(&self, source: Language, fields: &RecipeFields) -> Result<RecordId>;

    /// Load a recipe with every stored language and its ingredient rows.
    /// `active_language` is set to the stored source language.
    fn load_recipe(&self, id: RecordId) -> Result<Option<Recipe>>;

    /// Insert or replace the field set of one language.
    fn save_recipe_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &RecipeFields,
    ) -> Result<()>;

    fn set_source_language(&self, id: RecordId, language: Language) -> Result<()>;

    /// Replace the ingredient rows of a recipe.
    fn set_recipe_ingredients(&self, id: RecordId, rows: &[RecipeIngredient]) -> Result<()>;

    /// Create an ingredient with no translations.
    fn insert_ingredient(&self) -> Result<RecordId>;

    fn load_ingredient(&self, id: RecordId) -> Result<Option<Ingredient>>;

    fn save_ingredient_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &IngredientFields,
    ) -> Result<()>;

    /// Exact-match lookup of an ingredient by its name in any language.
    fn find_ingredient_by_name(&self, name: &str) -> Result<Option<RecordId>>;

    /// Whether `slug` is used by another record of `kind` in `language`.
    /// `exclude` skips the record being saved so it never collides with itself.
    fn slug_taken(
        &self,
        kind: RecordKind,
        language: Language,
        slug: &str,
        exclude: Option<RecordId>,
    ) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct StoredRecipe {
    source_language: Language,
    translations: HashMap<Language, RecipeFields>,
    ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: RecordId,
    recipes: BTreeMap<RecordId, StoredRecipe>,
    ingredients: BTreeMap<RecordId, HashMap<Language, IngredientFields>>,
    writes: usize,
}

impl MemoryState {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store guarded by a mutex.
///
/// Counts every write so callers can assert that a pass touched nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations performed so far.
    pub fn writes(&self) -> usize {
        self.lock().map(|state| state.writes).unwrap_or(0)
    }

    pub fn recipe_count(&self) -> usize {
        self.lock().map(|state| state.recipes.len()).unwrap_or(0)
    }

    pub fn ingredient_count(&self) -> usize {
        self.lock().map(|state| state.ingredients.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl RecordStore for MemoryStore {
    fn insert_recipe(&self, source: Language, fields: &RecipeFields) -> Result<RecordId> {
        let mut state = self.lock()?;
        let id = state.allocate_id();
        state.recipes.insert(
            id,
            StoredRecipe {
                source_language: source,
                translations: HashMap::from([(source, fields.clone())]),
                ingredients: Vec::new(),
            },
        );
        state.writes += 1;
        Ok(id)
    }

    fn load_recipe(&self, id: RecordId) -> Result<Option<Recipe>> {
        let state = self.lock()?;
        Ok(state.recipes.get(&id).map(|stored| Recipe {
            id,
            source_language: stored.source_language,
            active_language: stored.source_language,
            translations: stored.translations.clone(),
            ingredients: stored.ingredients.clone(),
        }))
    }

    fn save_recipe_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &RecipeFields,
    ) -> Result<()> {
        let mut state = self.lock()?;
        let stored = state
            .recipes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("recipe {} does not exist", id))?;
        stored.translations.insert(language, fields.clone());
        state.writes += 1;
        Ok(())
    }

    fn set_source_language(&self, id: RecordId, language: Language) -> Result<()> {
        let mut state = self.lock()?;
        let stored = state
            .recipes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("recipe {} does not exist", id))?;
        stored.source_language = language;
        state.writes += 1;
        Ok(())
    }

    fn set_recipe_ingredients(&self, id: RecordId, rows: &[RecipeIngredient]) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(missing) = rows
            .iter()
            .find(|row| !state.ingredients.contains_key(&row.ingredient_id))
        {
            return Err(anyhow!("ingredient {} does not exist", missing.ingredient_id));
        }
        let stored = state
            .recipes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("recipe {} does not exist", id))?;
        stored.ingredients = rows.to_vec();
        state.writes += 1;
        Ok(())
    }

    fn insert_ingredient(&self) -> Result<RecordId> {
        let mut state = self.lock()?;
        let id = state.allocate_id();
        state.ingredients.insert(id, HashMap::new());
        state.writes += 1;
        Ok(id)
    }

    fn load_ingredient(&self, id: RecordId) -> Result<Option<Ingredient>> {
        let state = self.lock()?;
        Ok(state.ingredients.get(&id).map(|translations| Ingredient {
            id,
            translations: translations.clone(),
        }))
    }

    fn save_ingredient_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &IngredientFields,
    ) -> Result<()> {
        let mut state = self.lock()?;
        let translations = state
            .ingredients
            .get_mut(&id)
            .ok_or_else(|| anyhow!("ingredient {} does not exist", id))?;
        translations.insert(language, fields.clone());
        state.writes += 1;
        Ok(())
    }

    fn find_ingredient_by_name(&self, name: &str) -> Result<Option<RecordId>> {
        let state = self.lock()?;
        Ok(state
            .ingredients
            .iter()
            .find(|(_, translations)| translations.values().any(|f| f.name == name))
            .map(|(id, _)| *id))
    }

    fn slug_taken(
        &self,
        kind: RecordKind,
        language: Language,
        slug: &str,
        exclude: Option<RecordId>,
    ) -> Result<bool> {
        let state = self.lock()?;
        let is_other = |id: &RecordId| Some(*id) != exclude;

        let taken = match kind {
            RecordKind::Recipe => state.recipes.iter().any(|(id, stored)| {
                is_other(id)
                    && stored
                        .translations
                        .get(&language)
                        .is_some_and(|f| f.slug == slug)
            }),
            RecordKind::Ingredient => state.ingredients.iter().any(|(id, translations)| {
                is_other(id)
                    && translations
                        .get(&language)
                        .is_some_and(|f| f.slug == slug)
            }),
        };
        Ok(taken)
    }
}
