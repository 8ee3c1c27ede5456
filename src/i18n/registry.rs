//! Language registry: Single source of truth for all supported languages.
//!
//! The set of content languages is closed. Every translation pass iterates
//! the registry in its declared order, so the order of `default_languages`
//! is part of the observable behavior (log order, slug allocation order).

use std::sync::OnceLock;

/// Configuration for a supported content language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "es", "ca")
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish", "Catalan")
    pub name: &'static str,

    /// Native name of the language (e.g., "Español", "Català")
    pub native_name: &'static str,

    /// Whether this is the fallback language when none is requested (only one should be true)
    pub is_default: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All languages, in their fixed iteration order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if zero or several languages are flagged as default (this
    /// indicates a configuration error in `default_languages`).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Check if a language code is supported.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// Supported content languages, in iteration order.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_default: true,
        },
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: false,
        },
        LanguageConfig {
            code: "it",
            name: "Italian",
            native_name: "Italiano",
            is_default: false,
        },
        LanguageConfig {
            code: "ca",
            name: "Catalan",
            native_name: "Català",
            is_default: false,
        },
        LanguageConfig {
            code: "hu",
            name: "Hungarian",
            native_name: "Magyar",
            is_default: false,
        },
        LanguageConfig {
            code: "pt",
            name: "Portuguese",
            native_name: "Português",
            is_default: false,
        },
    ]
}
