use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexWriter, TantivyDocument};
use tracing::{debug, info};

use crate::nlp::Lemmatizer;

/// Matches a free-text user utterance against a small set of candidate
/// labels (topic names or article titles) via lemmatized keyword search.
///
/// Both the query and the candidates go through the lemmatizer; the
/// lemmatized candidates are indexed in an ephemeral full-text index that
/// is rebuilt on every call, so an updated candidate list can never answer
/// with stale labels.
pub struct QueryMatcher {
    lemmatizer: Arc<dyn Lemmatizer>,
    labels: Vec<String>,
}

impl QueryMatcher {
    /// If `labels` is empty, the default topic list is used.
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>, labels: Vec<String>) -> Self {
        let labels = if labels.is_empty() {
            common::default_topics()
        } else {
            labels
        };
        Self { lemmatizer, labels }
    }

    /// Return the candidate label closest to `query`, or `None` when no
    /// candidate shares any lemma with the query.
    pub async fn search(&self, query: &str) -> Result<Option<String>> {
        info!(%query, candidates = self.labels.len(), "matching user query");

        let lemmatized_query = self
            .lemmatizer
            .lemmatize(query)
            .await
            .context("failed to lemmatize query")?;

        // lemmatized label -> original label; collisions overwrite, last write wins
        let mut lemma_map: HashMap<String, String> = HashMap::with_capacity(self.labels.len());
        let mut lemmatized_labels = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let lemmatized = self
                .lemmatizer
                .lemmatize(label)
                .await
                .with_context(|| format!("failed to lemmatize candidate label {:?}", label))?;
            lemma_map.insert(lemmatized.clone(), label.clone());
            lemmatized_labels.push(lemmatized);
        }

        debug!(query = %lemmatized_query, labels = ?lemmatized_labels, "lemmatized");

        let hit = top_hit(&lemmatized_query, &lemmatized_labels)?;
        Ok(hit.and_then(|lemmatized| lemma_map.get(&lemmatized).cloned()))
    }
}

/// Index the lemmatized labels in an in-RAM index and return the stored
/// text of the top-ranked full-text hit for the lemmatized query.
fn top_hit(query: &str, labels: &[String]) -> Result<Option<String>> {
    let mut schema_builder = Schema::builder();
    let label_field = schema_builder.add_text_field("label", TEXT | STORED);
    let schema = schema_builder.build();

    let index = Index::create_in_ram(schema);
    let mut writer: IndexWriter = index
        .writer(15_000_000)
        .context("failed to create index writer")?;
    for label in labels {
        writer
            .add_document(doc!(label_field => label.as_str()))
            .context("failed to index label")?;
    }
    writer.commit().context("failed to commit label index")?;

    let reader = index.reader().context("failed to open index reader")?;
    let searcher = reader.searcher();

    let parser = QueryParser::for_index(&index, vec![label_field]);
    // Lenient parse: user text may contain query-syntax metacharacters.
    let (parsed, _errors) = parser.parse_query_lenient(query);

    let top = searcher
        .search(&parsed, &TopDocs::with_limit(1))
        .context("label search failed")?;
    let Some((_score, address)) = top.first() else {
        return Ok(None);
    };

    let stored: TantivyDocument = searcher
        .doc(*address)
        .context("failed to load matched label")?;
    Ok(stored
        .get_first(label_field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string()))
}
