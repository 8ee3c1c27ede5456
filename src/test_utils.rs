//! Test doubles shared by unit tests.

use crate::i18n::Language;
use crate::translation::{Translate, TranslateError};
use std::sync::Mutex;

/// Records every call and returns `"[target] text"`.
#[derive(Debug, Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<(String, Language, Language)>>,
    fail: bool,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A translator whose service is always down.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, Language, Language)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(text, _, _)| text).collect()
    }
}

impl Translate for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), source, target));

        if self.fail {
            Err(TranslateError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        } else {
            Ok(format!("[{}] {}", target.code(), text))
        }
    }
}
