use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use common::ScraperConfig;

/// Topics with their own section page on the site. The two aggregate views
/// (front page and most-read) are not sections and are excluded from
/// whole-site sweeps.
pub const SECTION_TOPICS: [&str; 8] = [
    "Gizartea",
    "Politika",
    "Ekonomia",
    "Mundua",
    "Iritzia",
    "Kultura",
    "Kirola",
    "Bizigiro",
];

/// A headline scraped from a topic page, with its article URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
}

/// Scrapes headlines, article URLs and sub-headers from berria.eus.
pub struct Scraper {
    client: Client,
    base_url: Url,
}

impl Scraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds()))
            .user_agent(config.user_agent().to_string())
            .build()
            .context("failed to build reqwest client")?;
        let base_url =
            Url::parse(&config.base_url).context("failed to parse scraper base_url")?;
        Ok(Self { client, base_url })
    }

    /// Site path of a topic page. Unknown topics have no page.
    pub fn section_path(topic: &str) -> Option<&'static str> {
        match topic {
            "Azken berriak" => Some(""),
            "Berri irakurrienak" => Some("irakurriena/"),
            "Gizartea" => Some("gizartea/"),
            "Politika" => Some("politika/"),
            "Ekonomia" => Some("ekonomia/"),
            "Mundua" => Some("mundua/"),
            "Iritzia" => Some("iritzia/"),
            "Kultura" => Some("kultura/"),
            "Kirola" => Some("kirola/"),
            "Bizigiro" => Some("bizigiro/"),
            _ => None,
        }
    }

    pub fn topic_url(&self, topic: &str) -> Option<Url> {
        Self::section_path(topic).and_then(|path| self.base_url.join(path).ok())
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("fetch of {} failed with status: {}", url, status);
        }

        response
            .text()
            .await
            .context("failed to read response body")
    }

    /// All headlines of a topic page, in site order, as title -> URL pairs.
    /// Duplicate headlines overwrite the earlier URL in place.
    pub async fn topic_articles(&self, topic: &str) -> Result<Vec<Article>> {
        let url = self
            .topic_url(topic)
            .with_context(|| format!("no section page for topic: {}", topic))?;
        let html = self.fetch(&url).await?;

        // The front page groups its headlines under special containers
        let main_page = topic == "Azken berriak";
        let articles = extract_articles(&html, &url, main_page);

        info!(topic, count = articles.len(), "scraped topic headlines");
        Ok(articles)
    }

    /// Sweep every section topic and merge the headlines. Sections that
    /// fail to fetch are logged and skipped without failing the sweep.
    pub async fn all_articles(&self) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for topic in SECTION_TOPICS {
            match self.topic_articles(topic).await {
                Ok(section) => {
                    for article in section {
                        push_article(&mut articles, &mut seen, article.title, article.url);
                    }
                }
                Err(e) => {
                    warn!(topic, error = %e, "skipping section in whole-site sweep");
                }
            }
        }

        info!(count = articles.len(), "collected daily headlines");
        Ok(articles)
    }

    /// Sub-header of an article page. Falls back to the first body
    /// paragraph when the intro block is empty.
    pub async fn sub_header(&self, article_url: &str) -> Result<String> {
        let url = self
            .base_url
            .join(article_url)
            .with_context(|| format!("failed to resolve article URL: {}", article_url))?;
        let html = self.fetch(&url).await?;
        extract_sub_header(&html)
            .with_context(|| format!("no sub-header found at {}", url))
    }
}

/// Extract headline links from a topic page.
///
/// Section pages carry their headlines as h2/h3/h4 elements of class
/// `article-titu`; the front page keeps them under the `bereziak` and
/// `nagusiak` containers.
fn extract_articles(html: &str, page_url: &Url, main_page: bool) -> Vec<Article> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a").unwrap();

    let selectors: Vec<Selector> = if main_page {
        vec![
            Selector::parse("#bereziak h3.article-titu").unwrap(),
            Selector::parse("#nagusiak h2.article-titu, #nagusiak h3.article-titu, #nagusiak h4.article-titu").unwrap(),
        ]
    } else {
        vec![Selector::parse("h2.article-titu, h3.article-titu, h4.article-titu").unwrap()]
    };

    let mut articles = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for selector in &selectors {
        for heading in document.select(selector) {
            let Some(link) = heading.select(&anchor).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Ok(resolved) = page_url.join(href) else {
                warn!(href, "skipping unresolvable article link");
                continue;
            };

            let text = link.text().collect::<String>();
            let title = format!("\"{}\" artikulua", text.trim());
            push_article(&mut articles, &mut seen, title, resolved.to_string());
        }
    }

    articles
}

fn push_article(
    articles: &mut Vec<Article>,
    seen: &mut HashMap<String, usize>,
    title: String,
    url: String,
) {
    if let Some(&idx) = seen.get(&title) {
        articles[idx].url = url;
    } else {
        seen.insert(title.clone(), articles.len());
        articles.push(Article { title, url });
    }
}

fn extract_sub_header(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let intro = Selector::parse("#albistea_titu div.article-sarrera").unwrap();
    let text = document
        .select(&intro)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    if !text.is_empty() {
        return Ok(text);
    }

    // Empty intro block: first paragraph of the article body stands in
    let paragraph = Selector::parse("div.article-testua p").unwrap();
    let fallback = document
        .select(&paragraph)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    if fallback.is_empty() {
        anyhow::bail!("article page has neither intro block nor body paragraph");
    }
    Ok(fallback)
}
