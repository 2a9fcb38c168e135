use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;

use common::LemmatizerConfig;

/// Core trait for lemmatizer adapters (remote NLP pipeline or degenerate)
#[async_trait::async_trait]
pub trait Lemmatizer: Send + Sync {
    /// Reduce every word of `text` to its dictionary base form.
    /// Returns the space-joined lemmas.
    async fn lemmatize(&self, text: &str) -> Result<String>;
}

/// Degenerate adapter: case folding only, no morphological analysis.
/// Useful when no NLP pipeline is reachable, and as the test stand-in.
pub struct CaseFoldLemmatizer;

#[async_trait::async_trait]
impl Lemmatizer for CaseFoldLemmatizer {
    async fn lemmatize(&self, text: &str) -> Result<String> {
        Ok(text.to_lowercase())
    }
}

/// Create a lemmatizer based on configuration
pub fn create_lemmatizer(config: Option<&LemmatizerConfig>) -> Result<Arc<dyn Lemmatizer>> {
    let adapter = config
        .and_then(|c| c.adapter.as_deref())
        .unwrap_or("casefold");
    match adapter {
        "casefold" => Ok(Arc::new(CaseFoldLemmatizer)),
        "remote" => {
            let cfg =
                config.context("lemmatizer.adapter = \"remote\" requires a [lemmatizer] section")?;
            let tokenizer_url = cfg
                .tokenizer_url
                .clone()
                .context("missing lemmatizer.tokenizer_url in remote config")?;
            let tagger_url = cfg
                .tagger_url
                .clone()
                .context("missing lemmatizer.tagger_url in remote config")?;
            let provider = remote::RemoteLemmatizer::new(tokenizer_url, tagger_url, cfg.lang())
                .with_timeout(cfg.timeout_seconds());
            Ok(Arc::new(provider))
        }
        other => anyhow::bail!("Unknown lemmatizer adapter type: {}", other),
    }
}

/// Extract the lemmas from a NAF document.
///
/// The POS-tagger stage of the pipeline answers NAF XML whose `terms`
/// section carries one `term` element per token with a `lemma` attribute.
/// Lemmas are returned in document order, joined by single spaces.
pub fn lemmas_from_naf(naf: &str) -> Result<String> {
    let mut reader = Reader::from_str(naf);
    let mut lemmas: Vec<String> = Vec::new();
    let mut in_terms = false;
    let mut saw_terms = false;

    loop {
        match reader.read_event().context("failed to parse NAF document")? {
            Event::Start(e) if e.name().as_ref() == b"terms" => {
                in_terms = true;
                saw_terms = true;
            }
            Event::End(e) if e.name().as_ref() == b"terms" => {
                in_terms = false;
            }
            Event::Start(e) | Event::Empty(e) if in_terms && e.name().as_ref() == b"term" => {
                if let Some(attr) = e
                    .try_get_attribute("lemma")
                    .context("malformed term attributes in NAF document")?
                {
                    let lemma = attr
                        .unescape_value()
                        .context("failed to decode lemma attribute")?;
                    lemmas.push(lemma.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_terms {
        anyhow::bail!("NAF document has no terms section");
    }

    Ok(lemmas.join(" "))
}

pub mod remote;
