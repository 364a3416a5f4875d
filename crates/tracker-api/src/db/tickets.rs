//! Ticket persistence operations on the `tickets` table.
//!
//! A ticket and the line-item changes of the same form post are written in
//! one database transaction, so a reader never sees a ticket without the
//! items it was saved with.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use tracker_core::{
    ClusterId, Expediture, MediaInfo, Money, Ticket, TicketId, TicketState, TopicId, UserId,
};
use uuid::Uuid;

use super::line_items;
use crate::forms::FormsetChanges;

async fn upsert(conn: &mut PgConnection, ticket: &Ticket) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tickets (id, created_at, updated_at, sort_date, requested_user, requested_text,
                              topic_id, event_date, summary, description, state, custom_state,
                              rating_percentage, amount_paid_cents, cluster_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         ON CONFLICT (id) DO UPDATE SET
             updated_at = EXCLUDED.updated_at,
             sort_date = EXCLUDED.sort_date,
             requested_user = EXCLUDED.requested_user,
             requested_text = EXCLUDED.requested_text,
             topic_id = EXCLUDED.topic_id,
             event_date = EXCLUDED.event_date,
             summary = EXCLUDED.summary,
             description = EXCLUDED.description,
             state = EXCLUDED.state,
             custom_state = EXCLUDED.custom_state,
             rating_percentage = EXCLUDED.rating_percentage,
             amount_paid_cents = EXCLUDED.amount_paid_cents,
             cluster_id = EXCLUDED.cluster_id",
    )
    .bind(*ticket.id.as_uuid())
    .bind(ticket.created)
    .bind(ticket.updated)
    .bind(ticket.sort_date)
    .bind(ticket.requested_user.map(|u| *u.as_uuid()))
    .bind(&ticket.requested_text)
    .bind(*ticket.topic.as_uuid())
    .bind(ticket.event_date)
    .bind(&ticket.summary)
    .bind(&ticket.description)
    .bind(ticket.state.as_str())
    .bind(&ticket.custom_state)
    .bind(ticket.rating_percentage.map(i16::from))
    .bind(ticket.amount_paid.map(|m| m.cents()))
    .bind(ticket.cluster.map(|c| *c.as_uuid()))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write a ticket on its own (staff review, fixtures).
pub async fn save(pool: &PgPool, ticket: &Ticket) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    upsert(&mut conn, ticket).await
}

/// Write a ticket together with the line-item changes of its form post.
pub async fn save_with_items(
    pool: &PgPool,
    ticket: &Ticket,
    media: &FormsetChanges<MediaInfo>,
    expeditures: &FormsetChanges<Expediture>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    upsert(&mut tx, ticket).await?;
    line_items::apply_media(&mut tx, media).await?;
    line_items::apply_expeditures(&mut tx, expeditures).await?;
    tx.commit().await?;
    Ok(())
}

/// Load all tickets on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Ticket>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TicketRow>(
        "SELECT id, created_at, updated_at, sort_date, requested_user, requested_text, topic_id,
                event_date, summary, description, state, custom_state, rating_percentage,
                amount_paid_cents, cluster_id
         FROM tickets ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TicketRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sort_date: NaiveDate,
    requested_user: Option<Uuid>,
    requested_text: String,
    topic_id: Uuid,
    event_date: Option<NaiveDate>,
    summary: String,
    description: String,
    state: String,
    custom_state: String,
    rating_percentage: Option<i16>,
    amount_paid_cents: Option<i64>,
    cluster_id: Option<Uuid>,
}

impl TicketRow {
    fn into_record(self) -> Ticket {
        let state = self.state.parse::<TicketState>().unwrap_or_else(|e| {
            tracing::warn!(
                id = %self.id,
                state = %self.state,
                error = %e,
                "unknown ticket state in database, defaulting to 'for consideration'"
            );
            TicketState::ForConsideration
        });
        let rating_percentage = self
            .rating_percentage
            .and_then(|pct| u8::try_from(pct).ok())
            .filter(|pct| *pct <= 100);

        Ticket {
            id: TicketId::from_uuid(self.id),
            created: self.created_at,
            updated: self.updated_at,
            sort_date: self.sort_date,
            requested_user: self.requested_user.map(UserId::from_uuid),
            requested_text: self.requested_text,
            topic: TopicId::from_uuid(self.topic_id),
            event_date: self.event_date,
            summary: self.summary,
            description: self.description,
            state,
            custom_state: self.custom_state,
            rating_percentage,
            amount_paid: self.amount_paid_cents.map(Money::from_cents),
            cluster: self.cluster_id.map(ClusterId::from_uuid),
        }
    }
}
