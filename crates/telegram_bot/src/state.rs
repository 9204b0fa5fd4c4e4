use std::{
    collections::HashMap,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

use engine::ConversationState;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Explicit conversation state of every chat. Lost on restart, which only
/// sends users back to the main menu.
#[derive(Clone, Default)]
pub(crate) struct ConversationStore {
    inner: Arc<Mutex<HashMap<i64, ConversationState>>>,
}

impl ConversationStore {
    pub(crate) async fn get(&self, chat_id: i64) -> ConversationState {
        let guard = self.inner.lock().await;
        guard.get(&chat_id).cloned().unwrap_or_default()
    }

    pub(crate) async fn set(&self, chat_id: i64, state: ConversationState) {
        let mut guard = self.inner.lock().await;
        if state == ConversationState::NoFlow {
            guard.remove(&chat_id);
        } else {
            guard.insert(chat_id, state);
        }
    }

    pub(crate) async fn update<F>(&self, chat_id: i64, f: F) -> ConversationState
    where
        F: FnOnce(ConversationState) -> ConversationState,
    {
        let mut guard = self.inner.lock().await;
        let current = guard.remove(&chat_id).unwrap_or_default();
        let next = f(current);
        if next != ConversationState::NoFlow {
            guard.insert(chat_id, next.clone());
        }
        next
    }
}

/// One async mutex per chat. Deliveries of the same chat run one at a time,
/// different chats do not wait on each other. An entry lives only while a
/// delivery of that chat holds or waits for it.
#[derive(Clone, Default)]
pub(crate) struct ChatLocks {
    inner: Arc<SyncMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl ChatLocks {
    pub(crate) async fn acquire(&self, chat_id: i64) -> ChatTurn {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(chat_id).or_default().clone()
        };
        ChatTurn {
            guard: Some(lock.lock_owned().await),
            chat_id,
            locks: self.inner.clone(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive turn of a chat. Dropping it releases the chat and forgets the
/// chat's mutex when nobody else is waiting on it.
pub(crate) struct ChatTurn {
    guard: Option<OwnedMutexGuard<()>>,
    chat_id: i64,
    locks: Arc<SyncMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl Drop for ChatTurn {
    fn drop(&mut self) {
        // The guard holds a reference to the mutex; release it before counting.
        drop(self.guard.take());
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if map
            .get(&self.chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.chat_id);
        }
    }
}
