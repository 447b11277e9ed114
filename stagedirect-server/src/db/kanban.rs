//! Kanban card storage

use sqlx::{Executor, Sqlite, SqliteConnection};
use stagedirect_common::db::KanbanCard;
use stagedirect_common::kanban::Placement;
use stagedirect_common::Result;

const SELECT_CARD: &str =
    "SELECT id, owner, lane, position, title, notes, company_id FROM kanban_cards";

/// Whole board of one owner, lane by lane in display order
pub async fn list_board<'e, E>(executor: E, owner: &str) -> Result<Vec<KanbanCard>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE owner = ? ORDER BY lane, position, id", SELECT_CARD);
    let cards = sqlx::query_as::<_, KanbanCard>(&sql)
        .bind(owner)
        .fetch_all(executor)
        .await?;

    Ok(cards)
}

pub async fn load_card<'e, E>(executor: E, owner: &str, id: i64) -> Result<Option<KanbanCard>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE owner = ? AND id = ?", SELECT_CARD);
    let card = sqlx::query_as::<_, KanbanCard>(&sql)
        .bind(owner)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(card)
}

/// Insert a card at `position` (callers pass the lane's next position)
pub async fn insert_card<'e, E>(
    executor: E,
    owner: &str,
    lane: &str,
    position: i64,
    title: &str,
    notes: Option<&str>,
    company_id: Option<i64>,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO kanban_cards (owner, lane, position, title, notes, company_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(owner)
    .bind(lane)
    .bind(position)
    .bind(title)
    .bind(notes)
    .bind(company_id)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Write a move plan; run inside a transaction so the lane never shows gaps
pub async fn apply_placements(conn: &mut SqliteConnection, placements: &[Placement]) -> Result<()> {
    for placement in placements {
        sqlx::query("UPDATE kanban_cards SET lane = ?, position = ? WHERE id = ?")
            .bind(&placement.lane)
            .bind(placement.position)
            .bind(placement.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Delete a card and close the gap it leaves in its lane
pub async fn delete_card(conn: &mut SqliteConnection, owner: &str, id: i64) -> Result<bool> {
    let card = match load_card(&mut *conn, owner, id).await? {
        Some(card) => card,
        None => return Ok(false),
    };

    sqlx::query("DELETE FROM kanban_cards WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "UPDATE kanban_cards SET position = position - 1 WHERE owner = ? AND lane = ? AND position > ?",
    )
    .bind(owner)
    .bind(&card.lane)
    .bind(card.position)
    .execute(&mut *conn)
    .await?;

    Ok(true)
}
