use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use teloxide::types::ChatId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per chat.
///
/// Handlers read the dialogue state, talk to Telegram and write the state
/// back. Holding the chat's lock across that whole span keeps a delayed
/// advance and a `/restart` from overwriting each other.
#[derive(Debug, Clone, Default)]
pub struct ChatLocks {
    chats: Arc<Mutex<HashMap<ChatId, Arc<AsyncMutex<()>>>>>,
}

impl ChatLocks {
    pub async fn lock(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut chats = self.chats.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(chats.entry(chat_id).or_default())
        };
        lock.lock_owned().await
    }
}
