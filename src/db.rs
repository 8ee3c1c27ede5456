use crate::i18n::Language;
use crate::models::{
    Ingredient, IngredientFields, Recipe, RecipeFields, RecipeIngredient, RecordId, RecordKind,
};
use crate::store::RecordStore;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-backed record store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `database_path` and create tables
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;
        Self::from_connection(conn)
    }

    /// In-memory database, mostly useful for tests and dry runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_language TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS recipe_translations (
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                language_code TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                instructions TEXT NOT NULL DEFAULT '',
                tips TEXT NOT NULL DEFAULT '',
                slug TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (recipe_id, language_code)
            );
            CREATE INDEX IF NOT EXISTS idx_recipe_translations_slug
                ON recipe_translations (language_code, slug);
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE TABLE IF NOT EXISTS ingredient_translations (
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                language_code TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                slug TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (ingredient_id, language_code)
            );
            CREATE INDEX IF NOT EXISTS idx_ingredient_translations_slug
                ON ingredient_translations (language_code, slug);
            CREATE INDEX IF NOT EXISTS idx_ingredient_translations_name
                ON ingredient_translations (name);
            CREATE TABLE IF NOT EXISTS recipe_ingredients (
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id),
                quantity REAL NOT NULL,
                unit TEXT,
                position INTEGER NOT NULL
            );",
        )
        .context("Failed to create tables")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }
}

impl RecordStore for Database {
    fn insert_recipe(&self, source: Language, fields: &RecipeFields) -> Result<RecordId> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recipes (source_language) VALUES (?1)",
            params![source.code()],
        )
        .context("Failed to insert recipe")?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO recipe_translations
                (recipe_id, language_code, title, description, instructions, tips, slug)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                source.code(),
                fields.title,
                fields.description,
                fields.instructions,
                fields.tips,
                fields.slug
            ],
        )
        .context("Failed to insert recipe translation")?;

        tx.commit()?;
        Ok(id)
    }

    fn load_recipe(&self, id: RecordId) -> Result<Option<Recipe>> {
        let conn = self.lock()?;

        let source_code: Option<String> = conn
            .query_row(
                "SELECT source_language FROM recipes WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(source_code) = source_code else {
            return Ok(None);
        };
        let source_language = Language::from_code(&source_code)
            .with_context(|| format!("Recipe {} has an unsupported source language", id))?;

        let mut stmt = conn.prepare(
            "SELECT language_code, title, description, instructions, tips, slug
             FROM recipe_translations
             WHERE recipe_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    RecipeFields {
                        title: row.get(1)?,
                        description: row.get(2)?,
                        instructions: row.get(3)?,
                        tips: row.get(4)?,
                        slug: row.get(5)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut translations = HashMap::new();
        for (code, fields) in rows {
            translations.insert(Language::from_code(&code)?, fields);
        }

        let mut stmt = conn.prepare(
            "SELECT ingredient_id, quantity, unit, position
             FROM recipe_ingredients
             WHERE recipe_id = ?1
             ORDER BY position",
        )?;
        let ingredients = stmt
            .query_map(params![id], |row| {
                Ok(RecipeIngredient {
                    ingredient_id: row.get(0)?,
                    quantity: row.get(1)?,
                    unit: row.get(2)?,
                    position: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Recipe {
            id,
            source_language,
            active_language: source_language,
            translations,
            ingredients,
        }))
    }

    fn save_recipe_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &RecipeFields,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO recipe_translations
                (recipe_id, language_code, title, description, instructions, tips, slug)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (recipe_id, language_code) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                instructions = excluded.instructions,
                tips = excluded.tips,
                slug = excluded.slug",
            params![
                id,
                language.code(),
                fields.title,
                fields.description,
                fields.instructions,
                fields.tips,
                fields.slug
            ],
        )
        .context(format!(
            "Failed to save {} translation of recipe {}",
            language, id
        ))?;
        Ok(())
    }

    fn set_source_language(&self, id: RecordId, language: Language) -> Result<()> {
        let conn = self.lock()?;
        let rows_affected = conn
            .execute(
                "UPDATE recipes SET source_language = ?1 WHERE id = ?2",
                params![language.code(), id],
            )
            .context("Failed to update source language")?;

        if rows_affected == 0 {
            return Err(anyhow!("recipe {} does not exist", id));
        }
        Ok(())
    }

    fn set_recipe_ingredients(&self, id: RecordId, rows: &[RecipeIngredient]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![id],
        )?;
        for row in rows {
            tx.execute(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, row.ingredient_id, row.quantity, row.unit, row.position],
            )
            .context(format!(
                "Failed to attach ingredient {} to recipe {}",
                row.ingredient_id, id
            ))?;
        }

        tx.commit()?;
        Ok(())
    }

    fn insert_ingredient(&self) -> Result<RecordId> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO ingredients DEFAULT VALUES", [])
            .context("Failed to insert ingredient")?;
        Ok(conn.last_insert_rowid())
    }

    fn load_ingredient(&self, id: RecordId) -> Result<Option<Ingredient>> {
        let conn = self.lock()?;

        let exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM ingredients WHERE id = ?1",
            params![id],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;
        if !exists {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT language_code, name, slug FROM ingredient_translations WHERE ingredient_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    IngredientFields {
                        name: row.get(1)?,
                        slug: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut translations = HashMap::new();
        for (code, fields) in rows {
            translations.insert(Language::from_code(&code)?, fields);
        }

        Ok(Some(Ingredient { id, translations }))
    }

    fn save_ingredient_fields(
        &self,
        id: RecordId,
        language: Language,
        fields: &IngredientFields,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO ingredient_translations (ingredient_id, language_code, name, slug)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (ingredient_id, language_code) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug",
            params![id, language.code(), fields.name, fields.slug],
        )
        .context(format!(
            "Failed to save {} translation of ingredient {}",
            language, id
        ))?;
        Ok(())
    }

    fn find_ingredient_by_name(&self, name: &str) -> Result<Option<RecordId>> {
        let conn = self.lock()?;
        let id = conn
            .query_row(
                "SELECT ingredient_id FROM ingredient_translations
                 WHERE name = ?1
                 ORDER BY ingredient_id
                 LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn slug_taken(
        &self,
        kind: RecordKind,
        language: Language,
        slug: &str,
        exclude: Option<RecordId>,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let sql = match kind {
            RecordKind::Recipe => {
                "SELECT COUNT(*) FROM recipe_translations
                 WHERE language_code = ?1 AND slug = ?2 AND (?3 IS NULL OR recipe_id != ?3)"
            }
            RecordKind::Ingredient => {
                "SELECT COUNT(*) FROM ingredient_translations
                 WHERE language_code = ?1 AND slug = ?2 AND (?3 IS NULL OR ingredient_id != ?3)"
            }
        };

        let count: i64 = conn.query_row(sql, params![language.code(), slug, exclude], |row| {
            row.get(0)
        })?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Helper Functions ====================

    /// Create a temporary database for testing
    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test_recipes.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");
        (db, temp_dir)
    }

    fn recipe_fields(title: &str, slug: &str) -> RecipeFields {
        RecipeFields {
            title: title.to_string(),
            description: "<p>Desc</p>".to_string(),
            instructions: "<ol><li>Step</li></ol>".to_string(),
            tips: String::new(),
            slug: slug.to_string(),
        }
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn test_database_reopening_keeps_data() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let path_str = db_path.to_str().unwrap();

        let id = {
            let db = Database::new(path_str).expect("Failed to create database");
            db.insert_recipe(Language::SPANISH, &recipe_fields("Paella", "paella"))
                .expect("Should insert")
        };

        let db = Database::new(path_str).expect("Failed to reopen database");
        let recipe = db.load_recipe(id).expect("Should load").expect("Should exist");
        assert_eq!(recipe.field(Language::SPANISH, crate::models::RecipeField::Title), "Paella");
    }

    #[test]
    fn test_invalid_database_path() {
        let result = Database::new("/non/existent/path/db.db");
        assert!(result.is_err());
    }

    // ==================== Recipe Tests ====================

    #[test]
    fn test_insert_and_load_recipe() {
        let (db, _temp_dir) = create_test_db();

        let id = db
            .insert_recipe(Language::CATALAN, &recipe_fields("Crema catalana", "crema-catalana"))
            .expect("Should insert");

        let recipe = db.load_recipe(id).expect("Should load").expect("Should exist");
        assert_eq!(recipe.source_language, Language::CATALAN);
        assert_eq!(recipe.active_language, Language::CATALAN);
        assert_eq!(recipe.slug(Language::CATALAN), "crema-catalana");
        assert_eq!(recipe.translations.len(), 1);
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn test_load_missing_recipe() {
        let (db, _temp_dir) = create_test_db();
        assert!(db.load_recipe(42).expect("Should query").is_none());
    }

    #[test]
    fn test_save_recipe_fields_upserts() {
        let (db, _temp_dir) = create_test_db();
        let id = db
            .insert_recipe(Language::SPANISH, &recipe_fields("Tarta", "tarta"))
            .expect("Should insert");

        db.save_recipe_fields(id, Language::ENGLISH, &recipe_fields("Cake", "cake"))
            .expect("Should insert translation");
        db.save_recipe_fields(id, Language::ENGLISH, &recipe_fields("Pie", "pie"))
            .expect("Should update translation");

        let recipe = db.load_recipe(id).unwrap().unwrap();
        assert_eq!(recipe.translations.len(), 2);
        assert_eq!(recipe.slug(Language::ENGLISH), "pie");
    }

    #[test]
    fn test_set_source_language() {
        let (db, _temp_dir) = create_test_db();
        let id = db
            .insert_recipe(Language::SPANISH, &recipe_fields("Tarta", "tarta"))
            .expect("Should insert");

        db.set_source_language(id, Language::ENGLISH).expect("Should update");
        let recipe = db.load_recipe(id).unwrap().unwrap();
        assert_eq!(recipe.source_language, Language::ENGLISH);

        assert!(db.set_source_language(999, Language::ENGLISH).is_err());
    }

    #[test]
    fn test_set_recipe_ingredients_replaces_rows_in_order() {
        let (db, _temp_dir) = create_test_db();
        let recipe_id = db
            .insert_recipe(Language::SPANISH, &recipe_fields("Salmorejo", "salmorejo"))
            .unwrap();
        let tomato = db.insert_ingredient().unwrap();
        let bread = db.insert_ingredient().unwrap();

        db.set_recipe_ingredients(
            recipe_id,
            &[RecipeIngredient {
                ingredient_id: tomato,
                quantity: 1.0,
                unit: Some("kg".to_string()),
                position: 0,
            }],
        )
        .unwrap();
        db.set_recipe_ingredients(
            recipe_id,
            &[
                RecipeIngredient {
                    ingredient_id: bread,
                    quantity: 200.0,
                    unit: Some("g".to_string()),
                    position: 1,
                },
                RecipeIngredient {
                    ingredient_id: tomato,
                    quantity: 1.5,
                    unit: Some("kg".to_string()),
                    position: 0,
                },
            ],
        )
        .unwrap();

        let recipe = db.load_recipe(recipe_id).unwrap().unwrap();
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].ingredient_id, tomato);
        assert_eq!(recipe.ingredients[0].quantity, 1.5);
        assert_eq!(recipe.ingredients[1].unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_set_recipe_ingredients_unknown_ingredient_rolls_back() {
        let (db, _temp_dir) = create_test_db();
        let recipe_id = db
            .insert_recipe(Language::SPANISH, &recipe_fields("Salmorejo", "salmorejo"))
            .unwrap();
        let tomato = db.insert_ingredient().unwrap();
        db.set_recipe_ingredients(
            recipe_id,
            &[RecipeIngredient {
                ingredient_id: tomato,
                quantity: 1.0,
                unit: None,
                position: 0,
            }],
        )
        .unwrap();

        let result = db.set_recipe_ingredients(
            recipe_id,
            &[RecipeIngredient {
                ingredient_id: 777,
                quantity: 1.0,
                unit: None,
                position: 0,
            }],
        );
        assert!(result.is_err());

        let recipe = db.load_recipe(recipe_id).unwrap().unwrap();
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].ingredient_id, tomato);
    }

    // ==================== Ingredient Tests ====================

    #[test]
    fn test_ingredient_translations_roundtrip() {
        let (db, _temp_dir) = create_test_db();
        let id = db.insert_ingredient().unwrap();

        assert!(db.load_ingredient(id).unwrap().unwrap().translations.is_empty());

        db.save_ingredient_fields(
            id,
            Language::HUNGARIAN,
            &IngredientFields {
                name: "Paradicsom".to_string(),
                slug: "paradicsom".to_string(),
            },
        )
        .unwrap();

        let ingredient = db.load_ingredient(id).unwrap().unwrap();
        assert_eq!(ingredient.name(Language::HUNGARIAN), "Paradicsom");
        assert!(db.load_ingredient(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_find_ingredient_by_name_is_exact() {
        let (db, _temp_dir) = create_test_db();
        let id = db.insert_ingredient().unwrap();
        db.save_ingredient_fields(
            id,
            Language::SPANISH,
            &IngredientFields {
                name: "Tomate".to_string(),
                slug: "tomate".to_string(),
            },
        )
        .unwrap();

        assert_eq!(db.find_ingredient_by_name("Tomate").unwrap(), Some(id));
        assert_eq!(db.find_ingredient_by_name("tomate").unwrap(), None);
        assert_eq!(db.find_ingredient_by_name("Tomates").unwrap(), None);
    }

    // ==================== Slug Tests ====================

    #[test]
    fn test_slug_taken_scopes() {
        let (db, _temp_dir) = create_test_db();
        let id = db
            .insert_recipe(Language::SPANISH, &recipe_fields("Tarta", "tarta"))
            .unwrap();

        assert!(db
            .slug_taken(RecordKind::Recipe, Language::SPANISH, "tarta", None)
            .unwrap());
        assert!(!db
            .slug_taken(RecordKind::Recipe, Language::SPANISH, "tarta", Some(id))
            .unwrap());
        assert!(!db
            .slug_taken(RecordKind::Recipe, Language::ITALIAN, "tarta", None)
            .unwrap());
        assert!(!db
            .slug_taken(RecordKind::Ingredient, Language::SPANISH, "tarta", None)
            .unwrap());
    }
}
