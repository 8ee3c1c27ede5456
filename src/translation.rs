use crate::config::Config;
use crate::i18n::Language;
use crate::retry::{retry_translation, Backoff};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::warn;

/// Why a single translation call did not produce text.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request timed out")]
    Timeout,

    #[error("translation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("translation request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("malformed translation response: {0}")]
    Malformed(String),
}

impl TranslateError {
    /// Timeouts, network errors, 429 and 5xx are transient. Other 4xx and
    /// malformed bodies will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Timeout | TranslateError::Network(_) => true,
            TranslateError::Status { status, .. } => *status == 429 || *status >= 500,
            TranslateError::Malformed(_) => false,
        }
    }
}

/// A remote `translate(text, source, target)` function.
pub trait Translate {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> impl Future<Output = Result<String, TranslateError>>;
}

/// LibreTranslate-compatible request body
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// HTTP client for a LibreTranslate-style endpoint.
#[derive(Debug, Clone)]
pub struct LibreTranslateClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    backoff: Backoff,
}

impl LibreTranslateClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.translate_timeout)
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.translate_api_url.clone(),
            api_key: config.translate_api_key.clone(),
            backoff: Backoff::new(config.translate_max_attempts),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        let body = TranslateRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "html",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslateError::Status { status, body });
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TranslateError::Timeout
            } else {
                TranslateError::Malformed(e.to_string())
            }
        })?;

        Ok(html_escape::decode_html_entities(&parsed.translated_text).into_owned())
    }
}

fn classify(error: reqwest::Error) -> TranslateError {
    if error.is_timeout() {
        TranslateError::Timeout
    } else {
        TranslateError::Network(error)
    }
}

impl Translate for LibreTranslateClient {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        retry_translation(
            &self.backoff,
            &format!("Translation {} -> {}", source, target),
            || self.request(text, source, target),
        )
        .await
    }
}

/// Translate `text`, keeping the original when the service fails.
///
/// A failed translation must never abort the save that triggered it; the
/// field simply stays in the source language until the next pass.
pub async fn translate_or_original<T: Translate>(
    translator: &T,
    text: &str,
    source: Language,
    target: Language,
) -> String {
    match translator.translate(text, source, target).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(
                "Translation {} -> {} failed, keeping original text: {}",
                source, target, e
            );
            text.to_string()
        }
    }
}
