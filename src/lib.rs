//! Multilingual recipe content synchronization.
//!
//! When a recipe is written or edited in one language, [`sync::TranslationSync`]
//! fills in or refreshes every other supported language through a remote
//! translation service, sanitizes translated rich text and assigns each
//! language its own unique slug. Ingredients referenced by the recipe get
//! their missing names translated the same way.

pub mod config;
pub mod db;
pub mod error;
pub mod html_cleaner;
pub mod i18n;
pub mod models;
pub mod recipes;
pub mod retry;
pub mod seasons;
pub mod slug;
pub mod store;
pub mod sync;
pub mod translation;

#[cfg(test)]
mod test_utils;

pub use error::{SyncError, SyncResult};
pub use i18n::Language;
pub use models::{FieldSnapshot, Ingredient, Recipe, RecipeField, RecipeFields};
pub use store::{MemoryStore, RecordStore};
pub use sync::TranslationSync;
pub use translation::{LibreTranslateClient, Translate};
