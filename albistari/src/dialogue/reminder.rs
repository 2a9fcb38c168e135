use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info};

use super::actions::{self, Deps};
use super::{BotResponse, SessionState};

/// A scheduled inactivity digest: every `interval` the task rotates the
/// session's topic list, builds that topic's headline digest and pushes it
/// into the outbox, then reschedules itself. Any user input cancels it.
pub struct ReminderHandle {
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ReminderHandle {
    pub fn spawn(
        deps: Arc<Deps>,
        session: Arc<Mutex<SessionState>>,
        outbox: mpsc::UnboundedSender<BotResponse>,
        interval: Duration,
    ) -> Self {
        let cancel = Arc::new(Notify::new());
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let mut state = session.lock().await;
                        if !state.read_next_news {
                            debug!("digests disabled, reminder loop exiting");
                            break;
                        }
                        let response = actions::react_reminder(&deps, &mut state).await;
                        drop(state);

                        if outbox.send(response).is_err() {
                            debug!("outbox closed, reminder loop exiting");
                            break;
                        }
                        // Loop again: fired reminders reschedule themselves
                    }
                    _ = task_cancel.notified() => {
                        info!("reminder cancelled");
                        break;
                    }
                }
            }
        });

        Self { cancel, task }
    }

    /// Ask the task to stop. The permit is stored, so a cancel issued while
    /// a digest is being built still lands. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
