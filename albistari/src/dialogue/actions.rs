use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use crate::matcher::QueryMatcher;
use crate::nlp::Lemmatizer;
use crate::scraping::Scraper;

use super::{BotResponse, Button, SessionState, OPEN_QUESTION_PROMPT, REMINDERS_CANCELLED_MSG};

/// Shared collaborators the actions run against.
pub struct Deps {
    pub scraper: Scraper,
    pub lemmatizer: Arc<dyn Lemmatizer>,
    /// Topic labels offered to the matcher for topic requests
    pub topics: Vec<String>,
}

/// Prepare the session to receive a free-form question.
pub fn answer_open_question(state: &mut SessionState) -> BotResponse {
    state.open_question = true;
    BotResponse::text(OPEN_QUESTION_PROMPT)
}

/// Match the requested topic and list its current headlines.
///
/// On any failure (no topic matched, scraping error, pipeline error) the
/// topic and article slots are cleared and the fixed error message is
/// returned.
pub async fn show_topic_news(deps: &Deps, state: &mut SessionState, raw_topic: &str) -> BotResponse {
    match try_show_topic_news(deps, state, raw_topic).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = ?e, raw_topic, "failed to show topic news");
            state.topic = None;
            state.articles.clear();
            BotResponse::error()
        }
    }
}

async fn try_show_topic_news(
    deps: &Deps,
    state: &mut SessionState,
    raw_topic: &str,
) -> Result<BotResponse> {
    let matcher = QueryMatcher::new(deps.lemmatizer.clone(), deps.topics.clone());
    let topic = matcher
        .search(raw_topic)
        .await?
        .context("no topic matched the request")?;

    send_articles(deps, state, &topic, false).await
}

/// Fetch the articles of `topic`, store them in the session and build the
/// headline listing with one selection button per article.
pub(super) async fn send_articles(
    deps: &Deps,
    state: &mut SessionState,
    topic: &str,
    show_next_news: bool,
) -> Result<BotResponse> {
    let articles = deps.scraper.topic_articles(topic).await?;

    let mut text = format!("Artikuluen arloa: {}\n  \n", topic);
    let mut buttons = Vec::with_capacity(articles.len() + 2);
    for article in &articles {
        text.push_str(&article.title);
        text.push_str("\n \n");
        buttons.push(Button::choose_article(&article.title));
    }
    buttons.push(Button::menu());
    if show_next_news {
        buttons.push(Button::stop_reminders());
    }

    state.topic = Some(topic.to_string());
    state.articles = articles;

    Ok(BotResponse { text, buttons })
}

/// Match the chosen article and answer with its sub-header.
///
/// With the open-question flag armed the candidate set is the whole site's
/// current headlines; otherwise it is the articles of the last shown topic.
pub async fn return_news_title(
    deps: &Deps,
    state: &mut SessionState,
    raw_article: &str,
) -> BotResponse {
    match try_return_news_title(deps, state, raw_article).await {
        Ok(response) => {
            state.open_question = false;
            response
        }
        Err(e) => {
            error!(error = ?e, raw_article, "failed to return news title");
            state.last_article = None;
            state.open_question = false;
            BotResponse::error()
        }
    }
}

async fn try_return_news_title(
    deps: &Deps,
    state: &mut SessionState,
    raw_article: &str,
) -> Result<BotResponse> {
    // Entities arrive with the title quotes still attached
    let input = raw_article.replace('"', "");

    let candidates = if state.open_question {
        deps.scraper.all_articles().await?
    } else {
        state.articles.clone()
    };
    anyhow::ensure!(!candidates.is_empty(), "no articles to choose from");

    let titles: Vec<String> = candidates.iter().map(|a| a.title.clone()).collect();
    let matcher = QueryMatcher::new(deps.lemmatizer.clone(), titles);
    let title = matcher
        .search(&input)
        .await?
        .context("no article matched the request")?;

    let article = candidates
        .into_iter()
        .find(|a| a.title == title)
        .context("matched title missing from the article list")?;

    let sub_header = deps.scraper.sub_header(&article.url).await?;
    info!(article = %article.title, "answering with article sub-header");

    state.last_article = Some(article);

    Ok(BotResponse {
        text: sub_header,
        buttons: vec![
            Button::more_information(),
            Button::article_list(),
            Button::menu(),
        ],
    })
}

/// URL of the last chosen article.
pub fn return_url(state: &SessionState) -> BotResponse {
    match &state.last_article {
        Some(article) => BotResponse {
            text: article.url.clone(),
            buttons: vec![Button::article_list(), Button::menu()],
        },
        None => {
            error!("no article chosen yet, cannot return URL");
            BotResponse::error()
        }
    }
}

/// Re-list the stored articles of the last chosen topic without scraping.
pub fn show_last_topic_news(state: &SessionState) -> BotResponse {
    let Some(topic) = &state.topic else {
        error!("no topic stored, cannot re-list articles");
        return BotResponse::error();
    };

    let mut text = format!("Artikuluen arloa: {}\n \n", topic);
    let mut buttons = Vec::with_capacity(state.articles.len() + 1);
    for article in &state.articles {
        text.push_str(&article.title);
        text.push_str("\n \n");
        buttons.push(Button::choose_article(&article.title));
    }
    buttons.push(Button::menu());

    BotResponse { text, buttons }
}

/// Stop the inactivity digests.
pub fn cancel_news_reminder(state: &mut SessionState) -> BotResponse {
    state.read_next_news = false;
    BotResponse::text(REMINDERS_CANCELLED_MSG)
}

/// One reminder firing: rotate to the next topic and send its digest with
/// the stop button attached.
pub async fn react_reminder(deps: &Deps, state: &mut SessionState) -> BotResponse {
    let Some(topic) = state.next_topic() else {
        error!("empty topic rotation, cannot build reminder digest");
        return BotResponse::error();
    };

    match send_articles(deps, state, &topic, true).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = ?e, topic, "failed to build reminder digest");
            BotResponse::error()
        }
    }
}
