//! Sector database operations

use sqlx::{Executor, Sqlite};
use stagedirect_common::db::Sector;
use stagedirect_common::Result;

pub async fn list_sectors<'e, E>(executor: E) -> Result<Vec<Sector>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sectors = sqlx::query_as::<_, Sector>("SELECT id, label FROM sectors ORDER BY label")
        .fetch_all(executor)
        .await?;

    Ok(sectors)
}

/// Insert a sector; duplicate labels fail with a unique violation
pub async fn insert_sector<'e, E>(executor: E, label: &str) -> Result<Sector>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO sectors (label) VALUES (?)")
        .bind(label)
        .execute(executor)
        .await?;

    Ok(Sector {
        id: result.last_insert_rowid(),
        label: label.to_string(),
    })
}
