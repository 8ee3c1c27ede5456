use crate::i18n::Language;
use crate::models::RecordId;
use thiserror::Error;

/// Failures of the synchronization engine that reach the caller.
///
/// Translation service failures never appear here: they are absorbed by
/// `translate_or_original` and the field keeps its source text.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("no free slug for '{base}' in language {language} after {attempts} attempts")]
    SlugSpaceExhausted {
        base: String,
        language: Language,
        attempts: u32,
    },

    #[error("recipe {0} not found")]
    RecipeNotFound(RecordId),

    #[error("ingredient {0} not found")]
    IngredientNotFound(RecordId),

    #[error("invalid recipe: {0}")]
    Invalid(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
