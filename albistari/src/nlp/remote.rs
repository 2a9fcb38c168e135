use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

use super::{lemmas_from_naf, Lemmatizer};

/// Remote lemmatizer driving an ixa-pipes style NLP pipeline over HTTP.
///
/// The pipeline is two-stage: the tokenizer endpoint takes raw text and
/// answers a NAF document; the POS-tagger endpoint takes that NAF and
/// answers NAF enriched with term lemmas.
pub struct RemoteLemmatizer {
    tokenizer_url: String,
    tagger_url: String,
    lang: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteLemmatizer {
    pub fn new(
        tokenizer_url: impl Into<String>,
        tagger_url: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            tokenizer_url: tokenizer_url.into(),
            tagger_url: tagger_url.into(),
            lang: lang.into(),
            timeout: Duration::from_secs(30),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// POST a document to one pipeline stage and return the response body.
    async fn run_stage(&self, url: &str, document: &str) -> Result<String> {
        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(url)
                .query(&[("lang", self.lang.as_str())])
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(document.to_string())
                .send(),
        )
        .await
        .context("NLP pipeline request timed out")?
        .context("NLP pipeline HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("NLP pipeline error {}: {}", status, body);
        }

        response
            .text()
            .await
            .context("Failed to read NLP pipeline response body")
    }
}

#[async_trait::async_trait]
impl Lemmatizer for RemoteLemmatizer {
    async fn lemmatize(&self, text: &str) -> Result<String> {
        let tokenized = self
            .run_stage(&self.tokenizer_url, text)
            .await
            .context("tokenizer stage failed")?;
        let tagged = self
            .run_stage(&self.tagger_url, &tokenized)
            .await
            .context("tagger stage failed")?;

        let lemmas = lemmas_from_naf(&tagged)?;
        debug!(input = %text, lemmas = %lemmas, "lemmatized text");
        Ok(lemmas)
    }
}
