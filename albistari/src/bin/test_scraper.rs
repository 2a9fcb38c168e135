use albistari::scraping::Scraper;
use common::ScraperConfig;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let topic = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let topic = if topic.is_empty() {
        "Politika".to_string()
    } else {
        topic
    };

    let config = ScraperConfig {
        base_url: std::env::var("SCRAPER_BASE_URL")
            .unwrap_or_else(|_| "https://www.berria.eus".to_string()),
        fetch_timeout_seconds: Some(10),
        user_agent: None,
    };

    let scraper = match Scraper::new(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Failed to build scraper: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("Scraping topic: {}", topic);
    println!("{}", "=".repeat(60));

    match scraper.topic_articles(&topic).await {
        Ok(articles) => {
            println!("✓ {} headlines", articles.len());
            for article in &articles {
                println!("  - {}", article.title);
                println!("    {}", article.url);
            }

            // Exercise the sub-header extraction on the first hit
            if let Some(first) = articles.first() {
                println!("\n[Sub-header of the first article]");
                match scraper.sub_header(&first.url).await {
                    Ok(sub) => println!("  {}", sub),
                    Err(e) => eprintln!("  ✗ Failed: {}", e),
                }
            }
        }
        Err(e) => eprintln!("✗ Failed: {}", e),
    }
}
