use std::sync::Arc;

use albistari::dialogue::actions::{self, Deps};
use albistari::dialogue::reminder::ReminderHandle;
use albistari::dialogue::{SessionState, ERROR_MSG};
use albistari::nlp::CaseFoldLemmatizer;
use albistari::scraping::{Article, Scraper};
use common::ScraperConfig;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;

const POLITIKA_PAGE: &str = r#"
<h2 class="article-titu"><a href="/politika/lehena.html">Lehen titulua</a></h2>
<h3 class="article-titu"><a href="/politika/bigarrena.html">Bigarren titulua</a></h3>
"#;

fn deps_for(server: &mockito::Server) -> Deps {
    let config = ScraperConfig {
        base_url: server.url(),
        fetch_timeout_seconds: Some(5),
        user_agent: None,
    };
    Deps {
        scraper: Scraper::new(&config).expect("build scraper"),
        lemmatizer: Arc::new(CaseFoldLemmatizer),
        topics: vec![
            "Gizartea".to_string(),
            "Politika".to_string(),
            "Ekonomia".to_string(),
        ],
    }
}

#[tokio::test]
async fn show_topic_news_sets_slots_and_builds_buttons() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/politika/")
        .with_status(200)
        .with_body(POLITIKA_PAGE)
        .create_async()
        .await;

    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());

    let response = actions::show_topic_news(&deps, &mut state, "politika").await;

    assert!(response.text.starts_with("Artikuluen arloa: Politika"));
    assert!(response.text.contains("\"Lehen titulua\" artikulua"));

    // One selection button per article plus the menu button
    assert_eq!(response.buttons.len(), 3);
    assert_eq!(
        response.buttons[0].payload,
        "/choose_news_with_keywords{\"article\":\"Lehen titulua\"}"
    );
    assert_eq!(response.buttons[2].payload, "/show_menu");

    assert_eq!(state.topic.as_deref(), Some("Politika"));
    assert_eq!(state.articles.len(), 2);
}

#[tokio::test]
async fn show_topic_news_failure_clears_slots_and_answers_error() {
    // No mock registered: the scrape fails
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);

    let mut state = SessionState::new(deps.topics.clone());
    state.topic = Some("Gizartea".to_string());
    state.articles = vec![Article {
        title: "zaharra".to_string(),
        url: "http://example.org/zaharra".to_string(),
    }];

    let response = actions::show_topic_news(&deps, &mut state, "politika").await;

    assert_eq!(response.text, ERROR_MSG);
    assert!(response.buttons.is_empty());
    assert_eq!(state.topic, None);
    assert!(state.articles.is_empty());
}

#[tokio::test]
async fn unmatched_topic_answers_the_same_error() {
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());

    let response = actions::show_topic_news(&deps, &mut state, "eguraldia gaur").await;

    assert_eq!(response.text, ERROR_MSG);
    assert_eq!(state.topic, None);
}

#[tokio::test]
async fn return_news_title_answers_sub_header_and_stores_article() {
    let mut server = mockito::Server::new_async().await;
    let _article = server
        .mock("GET", "/politika/lehena.html")
        .with_status(200)
        .with_body(
            r#"<div id="albistea_titu"><div class="article-sarrera">Sarrerako azalpena.</div></div>"#,
        )
        .create_async()
        .await;

    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());
    state.topic = Some("Politika".to_string());
    state.articles = vec![
        Article {
            title: "\"Lehen titulua\" artikulua".to_string(),
            url: format!("{}/politika/lehena.html", server.url()),
        },
        Article {
            title: "\"Bigarren titulua\" artikulua".to_string(),
            url: format!("{}/politika/bigarrena.html", server.url()),
        },
    ];

    let response = actions::return_news_title(&deps, &mut state, "\"Lehen titulua\"").await;

    assert_eq!(response.text, "Sarrerako azalpena.");
    assert_eq!(response.buttons.len(), 3);
    assert_eq!(response.buttons[0].payload, "/more_information");

    assert_eq!(
        state.last_article.as_ref().map(|a| a.title.as_str()),
        Some("\"Lehen titulua\" artikulua")
    );
    assert!(!state.open_question);
}

#[tokio::test]
async fn return_news_title_with_open_question_searches_the_whole_site() {
    let mut server = mockito::Server::new_async().await;

    // Whole-site sweep: one section answers, the rest are skipped
    let _gizartea = server
        .mock("GET", "/gizartea/")
        .with_status(200)
        .with_body(r#"<h2 class="article-titu"><a href="/gizartea/a.html">Gizarte titulua</a></h2>"#)
        .create_async()
        .await;
    let _article = server
        .mock("GET", "/gizartea/a.html")
        .with_status(200)
        .with_body(
            r#"<div id="albistea_titu"><div class="article-sarrera">Gizarteko sarrera.</div></div>"#,
        )
        .create_async()
        .await;

    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());
    state.open_question = true;
    // No stored articles: the open question ranges over the sweep

    let response = actions::return_news_title(&deps, &mut state, "gizarte titulua").await;

    assert_eq!(response.text, "Gizarteko sarrera.");
    assert!(!state.open_question);
    assert!(state.last_article.is_some());
}

#[tokio::test]
async fn return_news_title_failure_resets_slots() {
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);

    let mut state = SessionState::new(deps.topics.clone());
    state.last_article = Some(Article {
        title: "zaharra".to_string(),
        url: "http://example.org/zaharra".to_string(),
    });
    state.open_question = false;
    // No stored articles and no open question: nothing to choose from

    let response = actions::return_news_title(&deps, &mut state, "edozer").await;

    assert_eq!(response.text, ERROR_MSG);
    assert_eq!(state.last_article, None);
    assert!(!state.open_question);
}

#[tokio::test]
async fn return_url_answers_the_last_article() {
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());

    // Without a chosen article the fixed error message is returned
    let response = actions::return_url(&state);
    assert_eq!(response.text, ERROR_MSG);

    state.last_article = Some(Article {
        title: "\"Lehen titulua\" artikulua".to_string(),
        url: "http://example.org/lehena.html".to_string(),
    });
    let response = actions::return_url(&state);
    assert_eq!(response.text, "http://example.org/lehena.html");
    assert_eq!(response.buttons.len(), 2);
}

#[tokio::test]
async fn show_last_topic_news_relists_without_scraping() {
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());
    state.topic = Some("Politika".to_string());
    state.articles = vec![Article {
        title: "\"Lehen titulua\" artikulua".to_string(),
        url: "http://example.org/lehena.html".to_string(),
    }];

    // No mock registered: this must not hit the network
    let response = actions::show_last_topic_news(&state);

    assert!(response.text.starts_with("Artikuluen arloa: Politika"));
    assert!(response.text.contains("\"Lehen titulua\" artikulua"));
    assert_eq!(response.buttons.len(), 2);
}

#[tokio::test]
async fn reminder_delivers_digests_until_cancelled() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/politika/")
        .with_status(200)
        .with_body(POLITIKA_PAGE)
        .create_async()
        .await;

    let mut deps = deps_for(&server);
    deps.topics = vec!["Politika".to_string()];
    let deps = Arc::new(deps);

    let session = Arc::new(Mutex::new(SessionState::new(vec!["Politika".to_string()])));
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();

    let handle = ReminderHandle::spawn(
        deps,
        session.clone(),
        outbox_tx,
        Duration::from_millis(50),
    );

    // First digest arrives after one interval
    let digest = tokio::time::timeout(Duration::from_secs(2), outbox_rx.recv())
        .await
        .expect("digest in time")
        .expect("outbox open");
    assert!(digest.text.starts_with("Artikuluen arloa: Politika"));
    assert_eq!(
        digest.buttons.last().map(|b| b.payload.as_str()),
        Some("/cancel_show_news_reminder")
    );

    handle.cancel();

    // One in-flight digest may still land; after that the loop is gone
    tokio::time::sleep(Duration::from_millis(200)).await;
    while outbox_rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(outbox_rx.try_recv().is_err());
    assert!(handle.is_finished());
}

#[tokio::test]
async fn cancelling_reminders_clears_the_flag() {
    let server = mockito::Server::new_async().await;
    let deps = deps_for(&server);
    let mut state = SessionState::new(deps.topics.clone());
    assert!(state.read_next_news);

    let response = actions::cancel_news_reminder(&mut state);
    assert!(!state.read_next_news);
    assert!(!response.text.is_empty());
}
