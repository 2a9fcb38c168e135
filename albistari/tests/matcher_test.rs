use std::sync::Arc;

use albistari::matcher::QueryMatcher;
use albistari::nlp::CaseFoldLemmatizer;

fn matcher(labels: &[&str]) -> QueryMatcher {
    QueryMatcher::new(
        Arc::new(CaseFoldLemmatizer),
        labels.iter().map(|l| l.to_string()).collect(),
    )
}

#[tokio::test]
async fn exact_query_returns_its_label() {
    let matcher = matcher(&["Gizartea", "Politika", "Ekonomia"]);
    let result = matcher.search("Ekonomia").await.expect("search");
    assert_eq!(result.as_deref(), Some("Ekonomia"));
}

#[tokio::test]
async fn query_is_matched_case_insensitively() {
    let matcher = matcher(&["Gizartea", "Politika", "Ekonomia"]);
    let result = matcher.search("politika").await.expect("search");
    assert_eq!(result.as_deref(), Some("Politika"));
}

#[tokio::test]
async fn query_without_overlap_reports_not_found() {
    let matcher = matcher(&["Gizartea", "Politika", "Ekonomia"]);
    let result = matcher.search("eguraldiaren iragarpena").await.expect("search");
    assert_eq!(result, None);
}

#[tokio::test]
async fn article_titles_without_matching_lemmas_report_not_found() {
    let matcher = matcher(&[
        "Akusatuek uste dute auzia «torturak pozoituta» dagoela hastapenetatik",
        "Euskara aktibatzeko praktikak",
        "Bederatzi lagun hil dira Suedian, hegazkin istripu batean",
        "Agustin Ibarrolaren 'Gernika' erosi du Bilboko Arte Ederren Museoak",
    ]);
    let result = matcher.search("zientzia albisteak").await.expect("search");
    assert_eq!(result, None);
}

#[tokio::test]
async fn article_title_query_returns_that_title() {
    let matcher = matcher(&[
        "Euskara aktibatzeko praktikak",
        "Bederatzi lagun hil dira Suedian, hegazkin istripu batean",
    ]);
    let result = matcher.search("euskara praktikak").await.expect("search");
    assert_eq!(result.as_deref(), Some("Euskara aktibatzeko praktikak"));
}

#[tokio::test]
async fn updated_candidate_list_returns_no_stale_labels() {
    let lemmatizer = Arc::new(CaseFoldLemmatizer);

    let first = QueryMatcher::new(
        lemmatizer.clone(),
        vec!["Gizartea".to_string(), "Politika".to_string()],
    );
    assert_eq!(
        first.search("politika").await.expect("search").as_deref(),
        Some("Politika")
    );

    // A fresh candidate list must not answer with labels of the old one
    let second = QueryMatcher::new(
        lemmatizer,
        vec!["Kultura".to_string(), "Kirola".to_string()],
    );
    assert_eq!(second.search("politika").await.expect("search"), None);
    assert_eq!(
        second.search("kirola").await.expect("search").as_deref(),
        Some("Kirola")
    );
}

#[tokio::test]
async fn empty_candidate_list_falls_back_to_default_topics() {
    let matcher = QueryMatcher::new(Arc::new(CaseFoldLemmatizer), Vec::new());
    let result = matcher.search("kirola").await.expect("search");
    assert_eq!(result.as_deref(), Some("Kirola"));
}

#[tokio::test]
async fn decorated_article_title_round_trips() {
    // Labels in the shape the scraper produces
    let matcher = matcher(&[
        "\"Euskara aktibatzeko praktikak\" artikulua",
        "\"Bederatzi lagun hil dira Suedian\" artikulua",
    ]);
    let result = matcher
        .search("\"Euskara aktibatzeko praktikak\" artikulua")
        .await
        .expect("search");
    assert_eq!(
        result.as_deref(),
        Some("\"Euskara aktibatzeko praktikak\" artikulua")
    );
}
