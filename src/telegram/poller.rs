use crate::bot::flow::{Inbound, SellFlow};
use crate::bot::transport::ChatId;
use crate::config::TelegramCfg;
use crate::telegram::api::TelegramApi;
use crate::telegram::models::Update;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One queued update for a chat worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub event: Inbound,
    pub callback_query_id: Option<String>,
}

/// Maps an update to the chat it belongs to. Callbacks are keyed by the chat
/// of the message that carries the keyboard; updates with neither text nor a
/// usable callback are dropped.
pub fn route(update: Update) -> Option<(ChatId, Job)> {
    if let Some(cb) = update.callback_query {
        let msg = cb.message.as_ref()?;
        return Some((
            msg.chat.id,
            Job {
                event: Inbound::Callback {
                    data: cb.data.unwrap_or_default(),
                    message_id: Some(msg.message_id),
                },
                callback_query_id: Some(cb.id),
            },
        ));
    }
    let msg = update.message?;
    let text = msg.text?;
    Some((msg.chat.id, Job { event: Inbound::Text(text), callback_query_id: None }))
}

/// What a chat worker does with its jobs.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, chat: ChatId, job: Job);

    /// Runs once when a worker retires after sitting idle.
    async fn retire(&self, _chat: ChatId) {}
}

/// One unbounded queue and worker task per chat. Dispatch never waits, so a
/// chat whose handler is stuck only delays itself.
pub struct ChatQueues {
    handler: Arc<dyn JobHandler>,
    idle: Duration,
    workers: HashMap<ChatId, mpsc::UnboundedSender<Job>>,
}

impl ChatQueues {
    pub fn new(handler: Arc<dyn JobHandler>, idle: Duration) -> Self {
        Self { handler, idle, workers: HashMap::new() }
    }

    pub fn dispatch(&mut self, chat: ChatId, job: Job) {
        let job = match self.workers.get(&chat) {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                // worker retired; start a fresh one below
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        let tx = self.spawn_worker(chat);
        if tx.send(job).is_err() {
            tracing::error!(chat, "chat worker closed immediately");
        }
        self.workers.insert(chat, tx);
    }

    /// Forgets retired workers and returns how many are still running.
    pub fn prune(&mut self) -> usize {
        self.workers.retain(|_, tx| !tx.is_closed());
        self.workers.len()
    }

    fn spawn_worker(&self, chat: ChatId) -> mpsc::UnboundedSender<Job> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let handler = self.handler.clone();
        let idle = self.idle;
        tokio::spawn(async move {
            loop {
                match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(job)) => handler.handle(chat, job).await,
                    Ok(None) => break,
                    Err(_) => {
                        // refuse new jobs, then drain what slipped in before the close
                        rx.close();
                        while let Some(job) = rx.recv().await {
                            handler.handle(chat, job).await;
                        }
                        break;
                    }
                }
            }
            tracing::debug!(chat, "chat worker retired");
            handler.retire(chat).await;
        });
        tx
    }
}

/// Acknowledges callbacks, then hands the event to the sell flow.
struct FlowHandler {
    api: Arc<TelegramApi>,
    flow: Arc<SellFlow>,
}

#[async_trait]
impl JobHandler for FlowHandler {
    async fn handle(&self, chat: ChatId, job: Job) {
        if let Some(id) = job.callback_query_id.as_deref() {
            if let Err(e) = self.api.answer_callback_query(id).await {
                tracing::warn!(chat, error = ?e, "answerCallbackQuery failed");
            }
        }
        if let Err(e) = self.flow.handle(chat, job.event).await {
            tracing::error!(chat, error = ?e, "update handling failed");
        }
    }

    async fn retire(&self, chat: ChatId) {
        if self.flow.release(chat).await {
            tracing::debug!(chat, "idle session dropped");
        }
    }
}

/// Long-polls Telegram and feeds every chat's updates, in order, to its own worker.
pub struct Poller {
    api: Arc<TelegramApi>,
    cfg: TelegramCfg,
    queues: ChatQueues,
}

impl Poller {
    pub fn new(api: Arc<TelegramApi>, flow: Arc<SellFlow>, cfg: TelegramCfg) -> Self {
        let handler = Arc::new(FlowHandler { api: api.clone(), flow });
        let queues = ChatQueues::new(handler, Duration::from_secs(cfg.worker_idle_sec));
        Self { api, cfg, queues }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut offset = 0i64;
        tracing::info!("telegram polling started");
        loop {
            let updates = match self.api.get_updates(offset, self.cfg.poll_timeout_sec).await {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!(error = ?e, "getUpdates failed");
                    tokio::time::sleep(Duration::from_millis(self.cfg.retry_delay_ms)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let update_id = update.update_id;
                match route(update) {
                    Some((chat, job)) => self.queues.dispatch(chat, job),
                    None => tracing::debug!(update_id, "update without text or callback skipped"),
                }
            }
            self.queues.prune();
        }
    }
}
