//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! The in-memory stores are authoritative for reads. When a database pool
//! is configured every mutation is written through to Postgres, and the
//! stores are hydrated from it on startup (see [`AppState::hydrate_from_db`]).
//! Without a pool the service runs in-memory only, seeded from fixtures.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;
use tracker_core::{
    Expediture, ExpeditureId, MediaInfo, MediaInfoId, Snapshot, Ticket, TicketId, Topic,
    TopicId, TrackerUser, Transaction, TransactionId, UserId,
};

use crate::messages::MessageQueue;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because we never hold the lock across `.await` points.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, T: Clone> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching a predicate.
    pub fn filter(&self, f: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| f(v)).cloned().collect()
    }

    /// First record matching a predicate.
    pub fn find(&self, f: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| f(v)).cloned()
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`. The write lock is held for the whole closure.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Insert `value` unless another record matches `conflicts`.
    ///
    /// The check and the insert share one write lock. Returns whether the
    /// value was stored.
    pub fn insert_unless(&self, id: K, value: T, conflicts: impl Fn(&T) -> bool) -> bool {
        let mut data = self.data.write();
        if data.iter().any(|(k, v)| *k != id && conflicts(v)) {
            return false;
        }
        data.insert(id, value);
        true
    }

    /// Run `f` with exclusive access to every record.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut HashMap<K, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &K) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, T: Clone> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Default currency label shown next to amounts.
pub const DEFAULT_CURRENCY: &str = "CZK";

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, the secret check is disabled and
    /// the username in the bearer token is trusted as-is.
    pub auth_token: Option<String>,
    /// Currency label for reporting pages.
    pub currency: String,
}

impl AppConfig {
    /// Read configuration from `PORT`, `AUTH_TOKEN` and `TRACKER_CURRENCY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let auth_token = std::env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty());
        let currency = std::env::var("TRACKER_CURRENCY")
            .ok()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(defaults.currency);
        Self {
            port,
            auth_token,
            currency,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("currency", &self.currency)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub users: Store<UserId, TrackerUser>,
    pub topics: Store<TopicId, Topic>,
    pub tickets: Store<TicketId, Ticket>,
    pub media: Store<MediaInfoId, MediaInfo>,
    pub expeditures: Store<ExpeditureId, Expediture>,
    pub transactions: Store<TransactionId, Transaction>,

    /// Pending flash messages per user.
    pub messages: MessageQueue,

    /// PostgreSQL connection pool for write-through persistence.
    /// When `None`, the API operates in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// Create an empty in-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create an empty state with the given configuration and optional pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            users: Store::new(),
            topics: Store::new(),
            tickets: Store::new(),
            media: Store::new(),
            expeditures: Store::new(),
            transactions: Store::new(),
            messages: MessageQueue::new(),
            db_pool,
            config,
        }
    }

    /// Look up a user by login name.
    pub fn user_by_username(&self, username: &str) -> Option<TrackerUser> {
        self.users.find(|u| u.username == username)
    }

    /// Media entries of a ticket, in description order.
    pub fn media_for(&self, ticket: TicketId) -> Vec<MediaInfo> {
        let mut items = self.media.filter(|m| m.ticket == ticket);
        items.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
        items
    }

    /// Expense entries of a ticket, in description order.
    pub fn expeditures_for(&self, ticket: TicketId) -> Vec<Expediture> {
        let mut items = self.expeditures.filter(|e| e.ticket == ticket);
        items.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
        items
    }

    /// Copy every record the reports read.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tickets: self.tickets.list(),
            media: self.media.list(),
            expeditures: self.expeditures.list(),
            transactions: self.transactions.list(),
            users: self.users.list(),
        }
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let users = crate::db::users::load_all(pool).await?;
        let user_count = users.len();
        for record in users {
            self.users.insert(record.id, record);
        }

        let topics = crate::db::topics::load_all(pool).await?;
        let topic_count = topics.len();
        for record in topics {
            self.topics.insert(record.id, record);
        }

        let tickets = crate::db::tickets::load_all(pool).await?;
        let ticket_count = tickets.len();
        for record in tickets {
            self.tickets.insert(record.id, record);
        }

        let media = crate::db::line_items::load_all_media(pool).await?;
        let media_count = media.len();
        for record in media {
            self.media.insert(record.id, record);
        }

        let expeditures = crate::db::line_items::load_all_expeditures(pool).await?;
        let expediture_count = expeditures.len();
        for record in expeditures {
            self.expeditures.insert(record.id, record);
        }

        let transactions = crate::db::transactions::load_all(pool).await?;
        let transaction_count = transactions.len();
        for record in transactions {
            self.transactions.insert(record.id, record);
        }

        tracing::info!(
            users = user_count,
            topics = topic_count,
            tickets = ticket_count,
            media = media_count,
            expeditures = expediture_count,
            transactions = transaction_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
