//! Topic persistence operations on the `topics` table.

use sqlx::PgPool;
use tracker_core::{Topic, TopicId};
use uuid::Uuid;

/// Insert a topic, or overwrite it if the id already exists.
pub async fn upsert(pool: &PgPool, topic: &Topic) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO topics (id, name, grant_name, description, form_description,
                             open_for_tickets, ticket_media, ticket_expenses)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
             name = EXCLUDED.name,
             grant_name = EXCLUDED.grant_name,
             description = EXCLUDED.description,
             form_description = EXCLUDED.form_description,
             open_for_tickets = EXCLUDED.open_for_tickets,
             ticket_media = EXCLUDED.ticket_media,
             ticket_expenses = EXCLUDED.ticket_expenses",
    )
    .bind(*topic.id.as_uuid())
    .bind(&topic.name)
    .bind(&topic.grant)
    .bind(&topic.description)
    .bind(&topic.form_description)
    .bind(topic.open_for_tickets)
    .bind(topic.ticket_media)
    .bind(topic.ticket_expenses)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all topics on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Topic>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TopicRow>(
        "SELECT id, name, grant_name, description, form_description,
                open_for_tickets, ticket_media, ticket_expenses
         FROM topics ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TopicRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: Uuid,
    name: String,
    grant_name: String,
    description: String,
    form_description: String,
    open_for_tickets: bool,
    ticket_media: bool,
    ticket_expenses: bool,
}

impl TopicRow {
    fn into_record(self) -> Topic {
        Topic {
            id: TopicId::from_uuid(self.id),
            name: self.name,
            grant: self.grant_name,
            description: self.description,
            form_description: self.form_description,
            open_for_tickets: self.open_for_tickets,
            ticket_media: self.ticket_media,
            ticket_expenses: self.ticket_expenses,
        }
    }
}
