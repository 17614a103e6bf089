// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use moka::future::Cache;
use retail_hub_core::analyst::Analyst;
use retail_hub_core::chat::ChatSession;
use retail_hub_db::Database;
use tokio::sync::Mutex;

/// Most chat sessions held at once; the least recently used go first.
pub const MAX_CHAT_SESSIONS: u64 = 10_000;
/// A session untouched for this long is dropped.
pub const CHAT_IDLE_TTL: Duration = Duration::from_secs(4 * 3600);

pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Chat histories keyed by the client-chosen session id.
///
/// Bounded in count and idle time. Handlers never hold a session's lock
/// across the analyst call.
#[derive(Clone)]
pub struct ChatSessions {
    sessions: Cache<String, SharedSession>,
}

impl ChatSessions {
    pub fn new(max_sessions: u64, idle_ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle_ttl)
                .build(),
        }
    }

    /// Start (or restart) `id` with an empty history.
    pub async fn create(&self, id: &str) {
        self.sessions
            .insert(id.to_owned(), Arc::new(Mutex::new(ChatSession::new())))
            .await;
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).await
    }

    pub async fn get_or_create(&self, id: &str) -> SharedSession {
        self.sessions
            .get_with(id.to_owned(), async { Arc::new(Mutex::new(ChatSession::new())) })
            .await
    }

    /// Sessions currently held, after pending evictions are applied.
    pub async fn count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::new(MAX_CHAT_SESSIONS, CHAT_IDLE_TTL)
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Warehouse handle; owns the query cache.
    pub db: Database,
    /// Hosted analyst behind the assistant page.
    pub analyst: Arc<dyn Analyst>,
    pub chats: ChatSessions,
    /// Pins "today" for default report windows. `None` uses the local date.
    pub as_of: Option<NaiveDate>,
}

impl AppState {
    pub fn new(db: Database, analyst: Arc<dyn Analyst>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            analyst,
            chats: ChatSessions::default(),
            as_of: None,
        })
    }

    /// Same as [`AppState::new`] with a fixed reference date.
    pub fn pinned(db: Database, analyst: Arc<dyn Analyst>, as_of: NaiveDate) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            analyst,
            chats: ChatSessions::default(),
            as_of: Some(as_of),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_hub_core::chat::ChatMessage;

    #[tokio::test]
    async fn test_session_count_is_bounded() {
        let chats = ChatSessions::new(2, CHAT_IDLE_TTL);
        for i in 0..20 {
            chats.get_or_create(&format!("client-{i}")).await;
        }
        assert!(chats.count().await <= 2);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let chats = ChatSessions::new(10, Duration::from_millis(50));
        chats.create("idle").await;
        assert!(chats.get("idle").await.is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(chats.get("idle").await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_share_history_by_id() {
        let chats = ChatSessions::default();
        chats.get_or_create("a").await.lock().await.push(ChatMessage::user("hi"));
        let again = chats.get_or_create("a").await;
        assert_eq!(again.lock().await.messages().len(), 1);

        chats.create("a").await;
        assert!(chats.get("a").await.unwrap().lock().await.is_empty());
    }
}
