use serde::{Deserialize, Serialize};

use crate::scraping::Article;

pub mod actions;
pub mod reminder;

/// The one user-facing error message. Every backend failure (no match,
/// scraping error, pipeline error) surfaces as this, with the detail kept
/// in the logs.
pub const ERROR_MSG: &str =
    "Barkatu, arazo bat izan dut zure eskaera erantzutean. Saiatu berriro, mesedez.";

/// Reply to a request for a free-form question.
pub const OPEN_QUESTION_PROMPT: &str = "Egin zure galdera, entzuten ari naiz.";

/// Confirmation after cancelling the reminder loop.
pub const REMINDERS_CANCELLED_MSG: &str = "Ados, ez dizut beste artikulurik bidaliko.";

/// A reply button handed back to the dialogue framework. The payload is an
/// opaque intent string the framework routes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub payload: String,
}

impl Button {
    pub fn menu() -> Self {
        Button {
            title: "Hasierako menura itzuli".to_string(),
            payload: "/show_menu".to_string(),
        }
    }

    pub fn article_list() -> Self {
        Button {
            title: "Artikuluen zerrenda erakutsi".to_string(),
            payload: "/show_news_menu".to_string(),
        }
    }

    pub fn more_information() -> Self {
        Button {
            title: "Informazio gehiago eman".to_string(),
            payload: "/more_information".to_string(),
        }
    }

    pub fn stop_reminders() -> Self {
        Button {
            title: "Ez bidali mezu gehiago".to_string(),
            payload: "/cancel_show_news_reminder".to_string(),
        }
    }

    /// Button selecting one article. The entity keeps the quotes of the
    /// decorated title but drops the " artikulua" suffix.
    pub fn choose_article(title: &str) -> Self {
        let entity = title.replace(" artikulua", "");
        Button {
            title: title.to_string(),
            payload: format!("/choose_news_with_keywords{{\"article\":{}}}", entity),
        }
    }
}

/// Response text plus button menu, passed through to the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotResponse {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl BotResponse {
    pub fn text(text: impl Into<String>) -> Self {
        BotResponse {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn error() -> Self {
        BotResponse::text(ERROR_MSG)
    }
}

/// Per-sender dialogue state. Replaces the slot store the dialogue
/// framework held in the original design: one explicit object, passed by
/// reference between actions.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Last matched topic
    pub topic: Option<String>,
    /// Articles of the last shown topic, in site order
    pub articles: Vec<Article>,
    /// Last article the user picked
    pub last_article: Option<Article>,
    /// Whether the next article request may range over the whole site
    pub open_question: bool,
    /// Whether inactivity digests are wanted
    pub read_next_news: bool,
    /// Circular topic priority list for the reminder loop
    pub topic_rotation: Vec<String>,
}

impl SessionState {
    pub fn new(topics: Vec<String>) -> Self {
        Self {
            topic: None,
            articles: Vec::new(),
            last_article: None,
            open_question: false,
            read_next_news: true,
            topic_rotation: topics,
        }
    }

    /// Next topic of the rotation; the element taken from the front is
    /// appended to the back so the list stays circular.
    pub fn next_topic(&mut self) -> Option<String> {
        if self.topic_rotation.is_empty() {
            return None;
        }
        let topic = self.topic_rotation.remove(0);
        self.topic_rotation.push(topic.clone());
        Some(topic)
    }
}
