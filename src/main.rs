use anyhow::{bail, Context, Result};
use recipe_sync::config::Config;
use recipe_sync::db::Database;
use recipe_sync::models::RecordId;
use recipe_sync::{Language, LibreTranslateClient, RecordStore, TranslationSync};
use tracing::info;

const USAGE: &str = "Usage: recipe-sync <recipe-id> [language]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recipe_sync=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (recipe_id, language) = match args.as_slice() {
        [id] => (parse_recipe_id(id)?, None),
        [id, code] => (parse_recipe_id(id)?, Some(Language::from_code(code)?)),
        _ => bail!(USAGE),
    };

    let config = Config::from_env();
    let db = Database::new(&config.database_path)?;
    let translator = LibreTranslateClient::new(&config)?;
    info!(
        "Using translation endpoint {} and database {}",
        translator.endpoint(),
        config.database_path
    );

    let mut recipe = db
        .load_recipe(recipe_id)?
        .with_context(|| format!("Recipe {} not found", recipe_id))?;
    let source = language.unwrap_or(recipe.source_language);
    if recipe.fields(source).map_or(true, |fields| fields.title.trim().is_empty()) {
        bail!("Recipe {} has no {} content to translate from", recipe_id, source);
    }
    recipe.active_language = source;

    // Creation semantics: every field of every other language is re-translated.
    TranslationSync::new(&db, &translator)
        .handle_translations_for_recipe(&mut recipe, source, None)
        .await?;

    info!("Recipe {} synchronized from {}", recipe_id, source.name());
    Ok(())
}

fn parse_recipe_id(raw: &str) -> Result<RecordId> {
    raw.parse()
        .with_context(|| format!("Invalid recipe id '{}'. {}", raw, USAGE))
}
