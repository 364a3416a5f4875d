//! User persistence operations on the `tracker_users` table.

use sqlx::PgPool;
use tracker_core::{TrackerUser, UserId};
use uuid::Uuid;

/// Insert a user, or refresh its profile fields if the id already exists.
pub async fn upsert(pool: &PgPool, user: &TrackerUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tracker_users (id, username, first_name, last_name, is_staff)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
             username = EXCLUDED.username,
             first_name = EXCLUDED.first_name,
             last_name = EXCLUDED.last_name,
             is_staff = EXCLUDED.is_staff",
    )
    .bind(*user.id.as_uuid())
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_staff)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all users on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<TrackerUser>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, first_name, last_name, is_staff FROM tracker_users ORDER BY username",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    first_name: String,
    last_name: String,
    is_staff: bool,
}

impl UserRow {
    fn into_record(self) -> TrackerUser {
        TrackerUser {
            id: UserId::from_uuid(self.id),
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            is_staff: self.is_staff,
        }
    }
}
