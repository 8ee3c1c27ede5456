//! Translatable records and their per-language field sets.

use crate::i18n::Language;
use std::collections::HashMap;

pub type RecordId = i64;

/// Record types that own a slug namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Recipe,
    Ingredient,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Recipe => "recipe",
            RecordKind::Ingredient => "ingredient",
        }
    }
}

/// Translatable text fields of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeField {
    Title,
    Description,
    Instructions,
    Tips,
}

impl RecipeField {
    pub const ALL: [RecipeField; 4] = [
        RecipeField::Title,
        RecipeField::Description,
        RecipeField::Instructions,
        RecipeField::Tips,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecipeField::Title => "title",
            RecipeField::Description => "description",
            RecipeField::Instructions => "instructions",
            RecipeField::Tips => "tips",
        }
    }

    /// Rich-text fields hold HTML and go through the sanitizer after translation.
    pub fn is_rich_text(&self) -> bool {
        !matches!(self, RecipeField::Title)
    }
}

/// One language's view of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFields {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub tips: String,
    pub slug: String,
}

impl RecipeFields {
    pub fn get(&self, field: RecipeField) -> &str {
        match field {
            RecipeField::Title => &self.title,
            RecipeField::Description => &self.description,
            RecipeField::Instructions => &self.instructions,
            RecipeField::Tips => &self.tips,
        }
    }

    pub fn set(&mut self, field: RecipeField, value: String) {
        match field {
            RecipeField::Title => self.title = value,
            RecipeField::Description => self.description = value,
            RecipeField::Instructions => self.instructions = value,
            RecipeField::Tips => self.tips = value,
        }
    }
}

/// One language's view of an ingredient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientFields {
    pub name: String,
    pub slug: String,
}

/// Join row between a recipe and an ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub ingredient_id: RecordId,
    pub quantity: f64,
    pub unit: Option<String>,
    pub position: u32,
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: RecordId,
    /// Language whose content was authoritative at the last edit.
    pub source_language: Language,
    /// Language view the current edit was made in. Not persisted.
    pub active_language: Language,
    pub translations: HashMap<Language, RecipeFields>,
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn fields(&self, language: Language) -> Option<&RecipeFields> {
        self.translations.get(&language)
    }

    /// Field value in `language`, empty when that language has no field set yet.
    pub fn field(&self, language: Language, field: RecipeField) -> &str {
        self.fields(language).map(|f| f.get(field)).unwrap_or("")
    }

    pub fn slug(&self, language: Language) -> &str {
        self.fields(language).map(|f| f.slug.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Ingredient {
    pub id: RecordId,
    pub translations: HashMap<Language, IngredientFields>,
}

impl Ingredient {
    pub fn name(&self, language: Language) -> &str {
        self.translations
            .get(&language)
            .map(|f| f.name.as_str())
            .unwrap_or("")
    }

    pub fn slug(&self, language: Language) -> &str {
        self.translations
            .get(&language)
            .map(|f| f.slug.as_str())
            .unwrap_or("")
    }

    pub fn has_name(&self, language: Language) -> bool {
        !self.name(language).trim().is_empty()
    }
}

/// Canonical-language field values captured right before an update.
///
/// Lives for a single synchronization pass. Fields missing from the
/// snapshot compare as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSnapshot {
    values: HashMap<RecipeField, String>,
}

impl FieldSnapshot {
    pub fn capture(fields: &RecipeFields) -> Self {
        Self {
            values: RecipeField::ALL
                .iter()
                .map(|&field| (field, fields.get(field).to_string()))
                .collect(),
        }
    }

    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (RecipeField, V)>,
        V: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(f, v)| (f, v.into())).collect(),
        }
    }

    pub fn get(&self, field: RecipeField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}
