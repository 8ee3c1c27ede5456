//! Supported content languages.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the closed set of content languages
//! - `language`: Type-safe `Language` value validated against the registry
//!
//! # Example
//!
//! ```rust,ignore
//! use recipe_sync::i18n::Language;
//!
//! let source = Language::from_locale("es-ES");
//! for target in source.targets() {
//!     // en, it, ca, hu, pt
//! }
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
