//! # Startup Bootstrap
//!
//! Builds the application state the server starts with.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Hydrate**: load every store from Postgres when a pool is configured.
//! 2. **Load Fixtures**: when `TRACKER_FIXTURES` names a YAML file, parse it
//!    and resolve its cross references (ticket topics and requesters,
//!    transaction counterparties) by name.
//! 3. **Seed**: insert the fixture records into the stores and write them
//!    through to the database. Skipped when the database already holds
//!    users or topics, so restarting with the same file does not duplicate.
//! 4. **Log**: a structured startup line with store sizes.
//!
//! ## Fixture Format
//!
//! ```yaml
//! users:
//!   - username: jana
//!     first_name: Jana
//!     is_staff: true
//! topics:
//!   - name: Photography
//!     ticket_media: true
//!     ticket_expenses: true
//! tickets:
//!   - topic: Photography
//!     requested_user: jana
//!     summary: Castle photos
//!     event_date: 2026-03-14
//!     state: expenses filed
//!     rating_percentage: 80
//!     media:
//!       - { description: Castle, count: 12 }
//!     expeditures:
//!       - { description: Train, amount: "120.50" }
//! transactions:
//!   - { date: 2026-04-01, other: jana, amount: "96.40", description: refund }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::line_item::DESCRIPTION_MAX;
use tracker_core::{
    Expediture, MediaInfo, Money, Review, Ticket, TicketDraft, TicketState, Topic, TrackerUser,
    Transaction,
};

use crate::forms::FormsetChanges;
use crate::state::{AppConfig, AppState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Fixture file not found at the given path.
    #[error("fixture file not found: {path}")]
    FixturesNotFound { path: String },

    /// Fixture file failed to parse or references unknown records.
    #[error("invalid fixtures: {errors:?}")]
    InvalidFixtures { errors: Vec<String> },

    /// Database hydration or fixture write-through failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error during bootstrap.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Fixture file
// ---------------------------------------------------------------------------

/// Parsed fixture file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub topics: Vec<TopicFixture>,
    #[serde(default)]
    pub tickets: Vec<TicketFixture>,
    #[serde(default)]
    pub transactions: Vec<TransactionFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserFixture {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicFixture {
    pub name: String,
    #[serde(default)]
    pub grant: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub form_description: String,
    #[serde(default = "default_open")]
    pub open_for_tickets: bool,
    #[serde(default)]
    pub ticket_media: bool,
    #[serde(default)]
    pub ticket_expenses: bool,
}

fn default_open() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketFixture {
    /// Topic name.
    pub topic: String,
    /// Requester's username.
    pub requested_user: Option<String>,
    #[serde(default)]
    pub requested_text: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub event_date: Option<NaiveDate>,
    pub state: Option<TicketState>,
    #[serde(default)]
    pub custom_state: String,
    pub rating_percentage: Option<i64>,
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub media: Vec<MediaFixture>,
    #[serde(default)]
    pub expeditures: Vec<ExpeditureFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaFixture {
    pub description: String,
    pub url: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpeditureFixture {
    pub description: String,
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionFixture {
    pub date: NaiveDate,
    /// Counterparty's username.
    pub other: Option<String>,
    #[serde(default)]
    pub other_text: String,
    pub amount: Money,
    #[serde(default)]
    pub description: String,
}

/// Records built from a fixture file, in insertion order.
#[derive(Debug, Default)]
pub struct Seeded {
    pub users: Vec<TrackerUser>,
    pub topics: Vec<Topic>,
    pub tickets: Vec<(Ticket, Vec<MediaInfo>, Vec<Expediture>)>,
    pub transactions: Vec<Transaction>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Build the startup state, reading the fixture path from `TRACKER_FIXTURES`.
pub async fn bootstrap(
    config: AppConfig,
    db_pool: Option<sqlx::PgPool>,
) -> Result<AppState, BootstrapError> {
    let fixtures = std::env::var("TRACKER_FIXTURES")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    bootstrap_with(config, db_pool, fixtures.as_deref()).await
}

/// Build the startup state from an explicit fixture path.
pub async fn bootstrap_with(
    config: AppConfig,
    db_pool: Option<sqlx::PgPool>,
    fixtures: Option<&Path>,
) -> Result<AppState, BootstrapError> {
    let state = AppState::with_config(config, db_pool);
    state.hydrate_from_db().await?;

    if let Some(path) = fixtures {
        if !state.users.is_empty() || !state.topics.is_empty() {
            tracing::info!(path = %path.display(), "database already populated; fixtures skipped");
        } else {
            let parsed = load_fixtures(path)?;
            let seeded = build_records(parsed)?;
            insert_records(&state, &seeded);
            if let Some(pool) = &state.db_pool {
                write_through(pool, &seeded).await?;
            }
            tracing::info!(
                path = %path.display(),
                users = seeded.users.len(),
                topics = seeded.topics.len(),
                tickets = seeded.tickets.len(),
                transactions = seeded.transactions.len(),
                "fixtures loaded"
            );
        }
    }

    tracing::info!(
        port = state.config.port,
        currency = %state.config.currency,
        persistent = state.db_pool.is_some(),
        users = state.users.len(),
        topics = state.topics.len(),
        tickets = state.tickets.len(),
        "tracker state ready"
    );
    Ok(state)
}

// ---------------------------------------------------------------------------
// Phase 2: Load Fixtures
// ---------------------------------------------------------------------------

/// Parse a fixture file.
pub fn load_fixtures(path: &Path) -> Result<Fixtures, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::FixturesNotFound {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|e| BootstrapError::InvalidFixtures {
        errors: vec![format!("YAML parse error: {e}")],
    })
}

/// Turn parsed fixtures into records, resolving names to ids.
///
/// Every problem is collected so one run reports them all.
pub fn build_records(fixtures: Fixtures) -> Result<Seeded, BootstrapError> {
    let now = Utc::now();
    let mut errors = Vec::new();
    let mut seeded = Seeded::default();

    let mut users_by_name: HashMap<String, TrackerUser> = HashMap::new();
    for (i, f) in fixtures.users.into_iter().enumerate() {
        match TrackerUser::new(f.username.trim()) {
            Ok(mut user) if !users_by_name.contains_key(&user.username) => {
                if let Err(e) = user.set_name(&f.first_name, &f.last_name) {
                    errors.push(format!("users[{i}]: {e}"));
                    continue;
                }
                user.is_staff = f.is_staff;
                users_by_name.insert(user.username.clone(), user.clone());
                seeded.users.push(user);
            }
            Ok(user) => errors.push(format!("users[{i}]: duplicate username {}", user.username)),
            Err(e) => errors.push(format!("users[{i}]: {e}")),
        }
    }

    let mut topics_by_name: HashMap<String, Topic> = HashMap::new();
    for (i, f) in fixtures.topics.into_iter().enumerate() {
        match Topic::new(f.name) {
            Ok(mut topic) if !topics_by_name.contains_key(&topic.name) => {
                topic.grant = f.grant;
                topic.description = f.description;
                topic.form_description = f.form_description;
                topic.open_for_tickets = f.open_for_tickets;
                topic.ticket_media = f.ticket_media;
                topic.ticket_expenses = f.ticket_expenses;
                topics_by_name.insert(topic.name.clone(), topic.clone());
                seeded.topics.push(topic);
            }
            Ok(topic) => errors.push(format!("topics[{i}]: duplicate topic name {}", topic.name)),
            Err(e) => errors.push(format!("topics[{i}]: {e}")),
        }
    }

    for (i, f) in fixtures.tickets.into_iter().enumerate() {
        let Some(topic) = topics_by_name.get(f.topic.trim()) else {
            errors.push(format!("tickets[{i}]: unknown topic {}", f.topic));
            continue;
        };
        let requester = match f.requested_user.as_deref().map(str::trim) {
            Some(name) => match users_by_name.get(name) {
                Some(user) => Some(user.id),
                None => {
                    errors.push(format!("tickets[{i}]: unknown user {name}"));
                    continue;
                }
            },
            None => None,
        };
        let summary = f.summary.trim().to_string();
        if summary.is_empty() {
            errors.push(format!("tickets[{i}]: summary must not be empty"));
            continue;
        }

        let mut ticket = Ticket::file(
            TicketDraft {
                topic: topic.id,
                event_date: f.event_date,
                summary,
                description: f.description,
            },
            requester,
            now,
        );
        ticket.requested_text = f.requested_text.trim().to_string();
        if f.state.is_some() || f.rating_percentage.is_some() || f.amount_paid.is_some() {
            let review = Review {
                state: f.state.unwrap_or_default(),
                custom_state: f.custom_state,
                rating_percentage: f.rating_percentage,
                amount_paid: f.amount_paid,
            };
            if let Err(e) = ticket.review(review, now) {
                errors.push(format!("tickets[{i}]: {e}"));
                continue;
            }
        }

        let mut item_errors = Vec::new();
        let media = f
            .media
            .into_iter()
            .enumerate()
            .filter_map(|(j, m)| match check_description(&m.description) {
                Ok(description) => Some(MediaInfo::new(ticket.id, description, m.url, m.count)),
                Err(e) => {
                    item_errors.push(format!("tickets[{i}].media[{j}]: {e}"));
                    None
                }
            })
            .collect();
        let expeditures = f
            .expeditures
            .into_iter()
            .enumerate()
            .filter_map(|(j, e)| match check_description(&e.description) {
                Ok(description) => Some(Expediture::new(ticket.id, description, e.amount)),
                Err(msg) => {
                    item_errors.push(format!("tickets[{i}].expeditures[{j}]: {msg}"));
                    None
                }
            })
            .collect();
        if item_errors.is_empty() {
            seeded.tickets.push((ticket, media, expeditures));
        } else {
            errors.extend(item_errors);
        }
    }

    for (i, f) in fixtures.transactions.into_iter().enumerate() {
        let other = match f.other.as_deref().map(str::trim) {
            Some(name) => match users_by_name.get(name) {
                Some(user) => Some(user.id),
                None => {
                    errors.push(format!("transactions[{i}]: unknown user {name}"));
                    continue;
                }
            },
            None => None,
        };
        match Transaction::new(f.date, other, f.other_text, f.amount, f.description) {
            Ok(tx) => seeded.transactions.push(tx),
            Err(e) => errors.push(format!("transactions[{i}]: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(seeded)
    } else {
        Err(BootstrapError::InvalidFixtures { errors })
    }
}

fn check_description(raw: &str) -> Result<String, String> {
    let description = raw.trim();
    if description.is_empty() {
        return Err("description must not be empty".to_string());
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(format!("description exceeds {DESCRIPTION_MAX} characters"));
    }
    Ok(description.to_string())
}

// ---------------------------------------------------------------------------
// Phase 3: Seed
// ---------------------------------------------------------------------------

fn insert_records(state: &AppState, seeded: &Seeded) {
    for user in &seeded.users {
        state.users.insert(user.id, user.clone());
    }
    for topic in &seeded.topics {
        state.topics.insert(topic.id, topic.clone());
    }
    for (ticket, media, expeditures) in &seeded.tickets {
        state.tickets.insert(ticket.id, ticket.clone());
        for item in media {
            state.media.insert(item.id, item.clone());
        }
        for item in expeditures {
            state.expeditures.insert(item.id, item.clone());
        }
    }
    for tx in &seeded.transactions {
        state.transactions.insert(tx.id, tx.clone());
    }
}

async fn write_through(pool: &sqlx::PgPool, seeded: &Seeded) -> Result<(), sqlx::Error> {
    for user in &seeded.users {
        crate::db::users::upsert(pool, user).await?;
    }
    for topic in &seeded.topics {
        crate::db::topics::upsert(pool, topic).await?;
    }
    for (ticket, media, expeditures) in &seeded.tickets {
        let media = FormsetChanges {
            created: media.clone(),
            ..FormsetChanges::default()
        };
        let expeditures = FormsetChanges {
            created: expeditures.clone(),
            ..FormsetChanges::default()
        };
        crate::db::tickets::save_with_items(pool, ticket, &media, &expeditures).await?;
    }
    for tx in &seeded.transactions {
        crate::db::transactions::insert(pool, tx).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Create a temporary fixtures.yaml for testing.
    fn write_temp_fixtures(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("fixtures.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const FIXTURES: &str = r#"
users:
  - username: jana
    first_name: Jana
    last_name: Dvořáková
    is_staff: true
  - username: petr
topics:
  - name: Photography
    form_description: Say what you shot.
    ticket_media: true
    ticket_expenses: true
  - name: Old grant
    open_for_tickets: false
tickets:
  - topic: Photography
    requested_user: petr
    summary: Castle photos
    event_date: 2026-03-14
    state: expenses filed
    rating_percentage: 80
    media:
      - { description: Castle, url: "https://example.org/castle", count: 12 }
    expeditures:
      - { description: Train, amount: "120.50" }
  - topic: Old grant
    requested_text: Someone offline
    summary: Archive scans
transactions:
  - { date: 2026-04-01, other: petr, amount: "96.40", description: refund }
  - { date: 2026-04-02, other_text: Print shop, amount: "-20.00" }
"#;

    #[test]
    fn load_fixtures_with_valid_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_temp_fixtures(tmp.path(), FIXTURES);
        let fixtures = load_fixtures(&path).unwrap();
        assert_eq!(fixtures.users.len(), 2);
        assert_eq!(fixtures.topics.len(), 2);
        assert!(!fixtures.topics[1].open_for_tickets);
        assert!(fixtures.topics[0].open_for_tickets);
        assert_eq!(fixtures.tickets[0].state, Some(TicketState::ExpensesFiled));
        assert_eq!(fixtures.tickets[0].expeditures[0].amount, Money::from_cents(12_050));
    }

    #[test]
    fn load_fixtures_file_not_found_returns_error() {
        let result = load_fixtures(Path::new("/nonexistent/path/fixtures.yaml"));
        match result.unwrap_err() {
            BootstrapError::FixturesNotFound { path } => assert!(path.contains("nonexistent")),
            other => panic!("expected FixturesNotFound, got: {other}"),
        }
    }

    #[test]
    fn load_fixtures_rejects_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_temp_fixtures(tmp.path(), "topics:\n  - name: X\n    media: true\n");
        assert!(matches!(
            load_fixtures(&path),
            Err(BootstrapError::InvalidFixtures { .. })
        ));
    }

    #[test]
    fn build_records_resolves_names() {
        let fixtures: Fixtures = serde_yaml::from_str(FIXTURES).unwrap();
        let seeded = build_records(fixtures).unwrap();
        let petr = seeded.users.iter().find(|u| u.username == "petr").unwrap();

        let (ticket, media, expeditures) = &seeded.tickets[0];
        assert_eq!(ticket.requested_user, Some(petr.id));
        assert_eq!(ticket.topic, seeded.topics[0].id);
        assert_eq!(ticket.rating_percentage, Some(80));
        assert_eq!(media[0].count, Some(12));
        assert_eq!(expeditures[0].ticket, ticket.id);

        let (unassigned, _, _) = &seeded.tickets[1];
        assert_eq!(unassigned.requested_user, None);
        assert_eq!(unassigned.requested_text, "Someone offline");
        assert_eq!(unassigned.state, TicketState::ForConsideration);

        assert_eq!(seeded.transactions[0].other, Some(petr.id));
        assert_eq!(seeded.transactions[1].other, None);
    }

    #[test]
    fn build_records_collects_every_problem() {
        let yaml = r#"
users:
  - username: jana
  - username: jana
tickets:
  - { topic: Missing, summary: x }
transactions:
  - { date: 2026-04-01, other: nobody, amount: "1.00" }
  - { date: 2026-04-01, amount: "1.00" }
"#;
        let fixtures: Fixtures = serde_yaml::from_str(yaml).unwrap();
        match build_records(fixtures).unwrap_err() {
            BootstrapError::InvalidFixtures { errors } => {
                assert_eq!(errors.len(), 4, "errors: {errors:?}");
                assert!(errors[0].contains("duplicate username"));
                assert!(errors[1].contains("unknown topic Missing"));
                assert!(errors[2].contains("unknown user nobody"));
            }
            other => panic!("expected InvalidFixtures, got: {other}"),
        }
    }

    #[test]
    fn build_records_bounds_user_names() {
        let yaml = format!(
            "users:\n  - {{ username: jana, first_name: {} }}\n  - {{ username: petr, last_name: Novák }}\n",
            "J".repeat(31)
        );
        let fixtures: Fixtures = serde_yaml::from_str(&yaml).unwrap();
        match build_records(fixtures).unwrap_err() {
            BootstrapError::InvalidFixtures { errors } => {
                assert_eq!(errors.len(), 1, "errors: {errors:?}");
                assert!(errors[0].starts_with("users[0]:"));
                assert!(errors[0].contains("first_name"));
            }
            other => panic!("expected InvalidFixtures, got: {other}"),
        }
    }

    #[test]
    fn build_records_validates_reviews() {
        let yaml = r#"
topics:
  - name: Photography
tickets:
  - { topic: Photography, summary: x, rating_percentage: 140 }
"#;
        let fixtures: Fixtures = serde_yaml::from_str(yaml).unwrap();
        assert!(build_records(fixtures).is_err());
    }

    #[tokio::test]
    async fn bootstrap_without_fixtures_is_empty() {
        let state = bootstrap_with(AppConfig::default(), None, None).await.unwrap();
        assert!(state.users.is_empty());
        assert!(state.tickets.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_seeds_stores_from_fixtures() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_temp_fixtures(tmp.path(), FIXTURES);
        let state = bootstrap_with(AppConfig::default(), None, Some(&path))
            .await
            .unwrap();
        assert_eq!(state.users.len(), 2);
        assert_eq!(state.topics.len(), 2);
        assert_eq!(state.tickets.len(), 2);
        assert_eq!(state.media.len(), 1);
        assert_eq!(state.expeditures.len(), 1);
        assert_eq!(state.transactions.len(), 2);
        assert!(state.user_by_username("jana").unwrap().is_staff);
    }

    #[tokio::test]
    async fn bootstrap_fails_on_bad_fixtures() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_temp_fixtures(tmp.path(), "tickets:\n  - { topic: Nope, summary: x }\n");
        let err = bootstrap_with(AppConfig::default(), None, Some(&path))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidFixtures { .. }));
    }
}
