//! Contact database operations
//!
//! Contacts relate to companies through the `company_contacts` link table.

use sqlx::{Executor, Sqlite, SqliteConnection};
use stagedirect_common::db::{Contact, ContactFields};
use stagedirect_common::Result;

/// Load one contact
pub async fn load_contact<'e, E>(executor: E, id: i64) -> Result<Option<Contact>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let contact = sqlx::query_as::<_, Contact>(
        "SELECT id, name, phone, email FROM contacts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(contact)
}

/// List all contacts ordered by name
pub async fn list_contacts<'e, E>(executor: E) -> Result<Vec<Contact>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let contacts = sqlx::query_as::<_, Contact>(
        "SELECT id, name, phone, email FROM contacts ORDER BY name, id",
    )
    .fetch_all(executor)
    .await?;

    Ok(contacts)
}

/// Contacts linked to a company
pub async fn list_company_contacts<'e, E>(executor: E, company_id: i64) -> Result<Vec<Contact>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT c.id, c.name, c.phone, c.email
        FROM contacts c
        JOIN company_contacts cc ON cc.contact_id = c.id
        WHERE cc.company_id = ?
        ORDER BY c.name, c.id
        "#,
    )
    .bind(company_id)
    .fetch_all(executor)
    .await?;

    Ok(contacts)
}

pub async fn insert_contact<'e, E>(executor: E, fields: &ContactFields) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO contacts (name, phone, email) VALUES (?, ?, ?)")
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_contact<'e, E>(executor: E, id: i64, fields: &ContactFields) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE contacts SET name = ?, phone = ?, email = ? WHERE id = ?")
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a contact; its company links cascade
pub async fn delete_contact<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Link a contact to a company (no-op when already linked)
pub async fn link_contact<'e, E>(executor: E, company_id: i64, contact_id: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT OR IGNORE INTO company_contacts (company_id, contact_id) VALUES (?, ?)")
        .bind(company_id)
        .bind(contact_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Remove a company/contact link; false when there was none
pub async fn unlink_contact<'e, E>(executor: E, company_id: i64, contact_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result =
        sqlx::query("DELETE FROM company_contacts WHERE company_id = ? AND contact_id = ?")
            .bind(company_id)
            .bind(contact_id)
            .execute(executor)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Ids of the companies a contact is linked to
pub async fn linked_company_ids<'e, E>(executor: E, contact_id: i64) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids = sqlx::query_scalar(
        "SELECT company_id FROM company_contacts WHERE contact_id = ? ORDER BY company_id",
    )
    .bind(contact_id)
    .fetch_all(executor)
    .await?;

    Ok(ids)
}

/// Replace a contact's company links with exactly `company_ids`
pub async fn set_linked_companies(
    conn: &mut SqliteConnection,
    contact_id: i64,
    company_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM company_contacts WHERE contact_id = ?")
        .bind(contact_id)
        .execute(&mut *conn)
        .await?;

    for company_id in company_ids {
        link_contact(&mut *conn, *company_id, contact_id).await?;
    }

    Ok(())
}

/// Rows re-pointed from a merged-away contact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reassigned {
    pub primary_contact_of: u64,
    pub tutored_internships: u64,
}

/// Re-point companies and internships that name `from` as their contact
pub async fn reassign_contact_references(
    conn: &mut SqliteConnection,
    from: i64,
    to: i64,
) -> Result<Reassigned> {
    let primary_contact_of = sqlx::query("UPDATE companies SET contact_id = ? WHERE contact_id = ?")
        .bind(to)
        .bind(from)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let tutored_internships =
        sqlx::query("UPDATE internships SET contact_id = ? WHERE contact_id = ?")
            .bind(to)
            .bind(from)
            .execute(&mut *conn)
            .await?
            .rows_affected();

    Ok(Reassigned {
        primary_contact_of,
        tutored_internships,
    })
}
