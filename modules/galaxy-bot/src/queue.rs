//! Ordered per-chat work queues.
//!
//! Each chat gets one worker task fed by an unbounded channel, so updates of
//! one chat are handled in submission order while other chats proceed. A
//! worker stops after sitting idle and is recreated by the next submission.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_IDLE: Duration = Duration::from_secs(300);

/// Processes one queued item of a chat.
#[async_trait]
pub trait TurnHandler<T: Send + 'static>: Send + Sync + 'static {
    async fn handle(&self, chat_id: i64, item: T);
}

type Senders<T> = Arc<Mutex<HashMap<i64, UnboundedSender<T>>>>;

pub struct ChatQueues<T: Send + 'static> {
    handler: Arc<dyn TurnHandler<T>>,
    senders: Senders<T>,
    idle: Duration,
}

impl<T: Send + 'static> Clone for ChatQueues<T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            senders: self.senders.clone(),
            idle: self.idle,
        }
    }
}

impl<T: Send + 'static> ChatQueues<T> {
    pub fn new(handler: Arc<dyn TurnHandler<T>>) -> Self {
        Self {
            handler,
            senders: Arc::default(),
            idle: DEFAULT_IDLE,
        }
    }

    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Queue `item` behind everything already submitted for `chat_id`.
    pub async fn submit(&self, chat_id: i64, item: T) {
        let mut senders = self.senders.lock().await;
        let item = match senders.get(&chat_id) {
            Some(tx) => match tx.send(item) {
                Ok(()) => return,
                // Worker died; start a new one with the item
                Err(mpsc::error::SendError(item)) => item,
            },
            None => item,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        senders.insert(chat_id, tx);
        tokio::spawn(run_worker(
            chat_id,
            item,
            rx,
            self.handler.clone(),
            self.senders.clone(),
            self.idle,
        ));
    }

    /// Chats with a live worker.
    pub async fn active(&self) -> usize {
        self.senders.lock().await.len()
    }
}

async fn run_worker<T: Send + 'static>(
    chat_id: i64,
    first: T,
    mut rx: UnboundedReceiver<T>,
    handler: Arc<dyn TurnHandler<T>>,
    senders: Senders<T>,
    idle: Duration,
) {
    handler.handle(chat_id, first).await;
    loop {
        let item = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(item)) => item,
            Ok(None) => return,
            Err(_) => {
                // Submissions hold the map lock, so nothing can slip in
                // between the emptiness check and the removal.
                let mut senders = senders.lock().await;
                match rx.try_recv() {
                    Ok(item) => item,
                    Err(_) => {
                        senders.remove(&chat_id);
                        debug!(chat_id, "Chat worker idle, stopping");
                        return;
                    }
                }
            }
        };
        handler.handle(chat_id, item).await;
    }
}
