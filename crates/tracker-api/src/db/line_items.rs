//! Line-item persistence on the `media_info` and `expeditures` tables.
//!
//! Rows are only ever written as part of a ticket save; see
//! [`super::tickets::save_with_items`].

use sqlx::{PgConnection, PgPool};
use tracker_core::{Expediture, ExpeditureId, MediaInfo, MediaInfoId, Money, TicketId};
use uuid::Uuid;

use crate::forms::FormsetChanges;

/// Apply media changes inside the caller's transaction.
pub async fn apply_media(
    conn: &mut PgConnection,
    changes: &FormsetChanges<MediaInfo>,
) -> Result<(), sqlx::Error> {
    for item in changes.created.iter().chain(&changes.updated) {
        sqlx::query(
            "INSERT INTO media_info (id, ticket_id, description, url, count)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                 description = EXCLUDED.description,
                 url = EXCLUDED.url,
                 count = EXCLUDED.count",
        )
        .bind(*item.id.as_uuid())
        .bind(*item.ticket.as_uuid())
        .bind(&item.description)
        .bind(&item.url)
        .bind(item.count.map(i64::from))
        .execute(&mut *conn)
        .await?;
    }
    for item in &changes.deleted {
        sqlx::query("DELETE FROM media_info WHERE id = $1")
            .bind(*item.id.as_uuid())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Apply expense changes inside the caller's transaction.
pub async fn apply_expeditures(
    conn: &mut PgConnection,
    changes: &FormsetChanges<Expediture>,
) -> Result<(), sqlx::Error> {
    for item in changes.created.iter().chain(&changes.updated) {
        sqlx::query(
            "INSERT INTO expeditures (id, ticket_id, description, amount_cents)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                 description = EXCLUDED.description,
                 amount_cents = EXCLUDED.amount_cents",
        )
        .bind(*item.id.as_uuid())
        .bind(*item.ticket.as_uuid())
        .bind(&item.description)
        .bind(item.amount.cents())
        .execute(&mut *conn)
        .await?;
    }
    for item in &changes.deleted {
        sqlx::query("DELETE FROM expeditures WHERE id = $1")
            .bind(*item.id.as_uuid())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Load all media entries on startup.
pub async fn load_all_media(pool: &PgPool) -> Result<Vec<MediaInfo>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MediaRow>(
        "SELECT id, ticket_id, description, url, count FROM media_info",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MediaRow::into_record).collect())
}

/// Load all expense entries on startup.
pub async fn load_all_expeditures(pool: &PgPool) -> Result<Vec<Expediture>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExpeditureRow>(
        "SELECT id, ticket_id, description, amount_cents FROM expeditures",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ExpeditureRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    ticket_id: Uuid,
    description: String,
    url: Option<String>,
    count: Option<i64>,
}

impl MediaRow {
    fn into_record(self) -> MediaInfo {
        MediaInfo {
            id: MediaInfoId::from_uuid(self.id),
            ticket: TicketId::from_uuid(self.ticket_id),
            description: self.description,
            url: self.url,
            count: self.count.and_then(|c| u32::try_from(c).ok()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ExpeditureRow {
    id: Uuid,
    ticket_id: Uuid,
    description: String,
    amount_cents: i64,
}

impl ExpeditureRow {
    fn into_record(self) -> Expediture {
        Expediture {
            id: ExpeditureId::from_uuid(self.id),
            ticket: TicketId::from_uuid(self.ticket_id),
            description: self.description,
            amount: Money::from_cents(self.amount_cents),
        }
    }
}
