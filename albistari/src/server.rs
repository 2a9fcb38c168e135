use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, routes, State};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;
use tracing::info;

use common::Config;

use crate::dialogue::actions::{self, Deps};
use crate::dialogue::reminder::ReminderHandle;
use crate::dialogue::{BotResponse, SessionState};
use crate::nlp::create_lemmatizer;
use crate::scraping::Scraper;

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub deps: Arc<Deps>,
    pub sessions: Mutex<HashMap<String, Session>>,
}

/// Per-sender session: dialogue state, the active reminder (if any) and
/// the outbox the reminder digests are queued on.
pub struct Session {
    pub state: Arc<Mutex<SessionState>>,
    pub reminder: Option<ReminderHandle>,
    outbox_tx: mpsc::UnboundedSender<BotResponse>,
    outbox_rx: mpsc::UnboundedReceiver<BotResponse>,
}

impl Session {
    fn new(topics: Vec<String>) -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(SessionState::new(topics))),
            reminder: None,
            outbox_tx,
            outbox_rx,
        }
    }
}

/// Action request from the dialogue framework. `value` carries the
/// utterance or entity accompanying the action, when there is one.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub sender_id: String,
    pub action: String,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub responses: Vec<BotResponse>,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    topics: Vec<String>,
    active_sessions: usize,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning simple JSON with uptime and basic config info.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();
    let active_sessions = state.sessions.lock().await.len();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        topics: state.config.topics(),
        active_sessions,
    })
}

/// Action dispatch endpoint. Every request from a sender cancels that
/// sender's pending reminder (user input kills the inactivity loop).
#[post("/webhook", format = "json", data = "<request>")]
async fn webhook(
    state: &State<AppState>,
    request: Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, Status> {
    let request = request.into_inner();
    info!(sender = %request.sender_id, action = %request.action, "webhook request");

    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(request.sender_id.clone())
        .or_insert_with(|| Session::new(state.config.topics()));

    if let Some(reminder) = session.reminder.take() {
        reminder.cancel();
    }

    let deps = state.deps.clone();
    let session_arc = session.state.clone();
    let mut dialogue = session_arc.lock().await;
    let value = request.value.as_deref().unwrap_or_default();

    let response = match request.action.as_str() {
        "action_answer_open_question" => Some(actions::answer_open_question(&mut dialogue)),
        "action_show_topic_news" => {
            Some(actions::show_topic_news(&deps, &mut dialogue, value).await)
        }
        "action_return_news_title" => {
            Some(actions::return_news_title(&deps, &mut dialogue, value).await)
        }
        "action_return_url" => Some(actions::return_url(&dialogue)),
        "action_show_last_topic_news" => Some(actions::show_last_topic_news(&dialogue)),
        "action_cancel_news_reminder" => Some(actions::cancel_news_reminder(&mut dialogue)),
        "action_set_news_reminder" => {
            let armed = dialogue.read_next_news;
            drop(dialogue);
            if armed {
                let interval = Duration::from_secs(state.config.reminder_interval_seconds());
                session.reminder = Some(ReminderHandle::spawn(
                    deps,
                    session.state.clone(),
                    session.outbox_tx.clone(),
                    interval,
                ));
                info!(sender = %request.sender_id, "news reminder scheduled");
            }
            None
        }
        _ => return Err(Status::UnprocessableEntity),
    };

    Ok(Json(WebhookResponse {
        responses: response.into_iter().collect(),
    }))
}

/// Drain the reminder digests queued for a sender.
#[get("/api/v1/outbox/<sender_id>")]
async fn outbox(state: &State<AppState>, sender_id: &str) -> Json<WebhookResponse> {
    let mut sessions = state.sessions.lock().await;
    let mut responses = Vec::new();
    if let Some(session) = sessions.get_mut(sender_id) {
        while let Ok(response) = session.outbox_rx.try_recv() {
            responses.push(response);
        }
    }
    Json(WebhookResponse { responses })
}

/// Build the shared collaborators from configuration.
pub fn build_deps(config: &Config) -> Result<Arc<Deps>> {
    let scraper = Scraper::new(&config.scraper)?;
    let lemmatizer = create_lemmatizer(config.lemmatizer.as_ref())?;
    Ok(Arc::new(Deps {
        scraper,
        lemmatizer,
        topics: config.topics(),
    }))
}

/// Launch the Rocket server. Address and port come from the `[server]`
/// config section when present, otherwise Rocket's defaults apply.
pub async fn launch_rocket(config: Arc<Config>) -> Result<()> {
    let deps = build_deps(&config)?;

    let state = AppState {
        started_at: Utc::now(),
        config: config.clone(),
        deps,
        sessions: Mutex::new(HashMap::new()),
    };

    let mut fig = rocket::Config::figment();
    if let Some(server) = &config.server {
        if let Some(address) = &server.address {
            fig = fig.merge(("address", address.clone()));
        }
        if let Some(port) = server.port {
            fig = fig.merge(("port", port));
        }
    }

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![health, status, webhook, outbox])
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}
