//! Internship database operations

use sqlx::{Executor, Sqlite};
use stagedirect_common::db::{Internship, InternshipFields};
use stagedirect_common::Result;

const SELECT_INTERNSHIP: &str = r#"
    SELECT id, student_name, student_email, subject, company_id, contact_id,
           start_date, end_date, status, created_at
    FROM internships
"#;

pub async fn load_internship<'e, E>(executor: E, id: i64) -> Result<Option<Internship>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", SELECT_INTERNSHIP);
    let internship = sqlx::query_as::<_, Internship>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(internship)
}

/// List internships, newest first, optionally for one company
pub async fn list_internships<'e, E>(executor: E, company_id: Option<i64>) -> Result<Vec<Internship>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{} WHERE (?1 IS NULL OR company_id = ?1) ORDER BY start_date DESC, id DESC",
        SELECT_INTERNSHIP
    );
    let internships = sqlx::query_as::<_, Internship>(&sql)
        .bind(company_id)
        .fetch_all(executor)
        .await?;

    Ok(internships)
}

pub async fn insert_internship<'e, E>(executor: E, fields: &InternshipFields) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO internships (
            student_name, student_email, subject, company_id, contact_id,
            start_date, end_date, status
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fields.student_name)
    .bind(&fields.student_email)
    .bind(&fields.subject)
    .bind(fields.company_id)
    .bind(fields.contact_id)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.status)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_internship<'e, E>(
    executor: E,
    id: i64,
    fields: &InternshipFields,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE internships SET
            student_name = ?, student_email = ?, subject = ?, company_id = ?,
            contact_id = ?, start_date = ?, end_date = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.student_name)
    .bind(&fields.student_email)
    .bind(&fields.subject)
    .bind(fields.company_id)
    .bind(fields.contact_id)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.status)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_internship<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM internships WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
