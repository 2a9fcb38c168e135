use std::sync::Arc;

use albistari::matcher::QueryMatcher;
use albistari::nlp::{remote::RemoteLemmatizer, CaseFoldLemmatizer, Lemmatizer};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let query = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    if query.is_empty() {
        eprintln!("usage: test_matcher <query words...>");
        eprintln!("Set TOKENIZER_URL and TAGGER_URL to use the remote NLP pipeline.");
        std::process::exit(1);
    }

    // Remote pipeline when configured, case folding otherwise
    let lemmatizer: Arc<dyn Lemmatizer> = match (
        std::env::var("TOKENIZER_URL"),
        std::env::var("TAGGER_URL"),
    ) {
        (Ok(tok), Ok(tag)) => {
            let lang = std::env::var("NLP_LANG").unwrap_or_else(|_| "eu".to_string());
            println!("Using remote pipeline: {} -> {}", tok, tag);
            Arc::new(RemoteLemmatizer::new(tok, tag, lang))
        }
        _ => {
            println!("Using case-fold lemmatizer (no pipeline configured)");
            Arc::new(CaseFoldLemmatizer)
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("Matching against the default topic list");
    println!("Query: {}", query);
    println!("{}", "=".repeat(60));

    let matcher = QueryMatcher::new(lemmatizer, Vec::new());
    match matcher.search(&query).await {
        Ok(Some(topic)) => println!("✓ Matched topic: {}", topic),
        Ok(None) => println!("✗ No topic matched"),
        Err(e) => eprintln!("✗ Failed: {}", e),
    }
}
