//! Company database operations
//!
//! Read/write helpers are generic over the executor so the same query runs
//! against the pool or inside a merge transaction.

use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqliteConnection};
use stagedirect_common::db::{Company, CompanyFields};
use stagedirect_common::Result;

const SELECT_COMPANY: &str = r#"
    SELECT id, name, street, postal_code, city, country, department, phone, fax,
           email, size, sector_id, contact_id, validated, created_at, updated_at
    FROM companies
"#;

/// Optional filters for the company directory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFilter {
    pub validated: Option<bool>,
    pub sector_id: Option<i64>,
    pub city: Option<String>,
}

/// Load one company
pub async fn load_company<'e, E>(executor: E, id: i64) -> Result<Option<Company>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", SELECT_COMPANY);
    let company = sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(company)
}

/// List companies ordered by name
pub async fn list_companies<'e, E>(executor: E, filter: &CompanyFilter) -> Result<Vec<Company>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{} WHERE (?1 IS NULL OR validated = ?1)
              AND (?2 IS NULL OR sector_id = ?2)
              AND (?3 IS NULL OR city = ?3 COLLATE NOCASE)
            ORDER BY name, id",
        SELECT_COMPANY
    );
    let companies = sqlx::query_as::<_, Company>(&sql)
        .bind(filter.validated)
        .bind(filter.sector_id)
        .bind(filter.city.as_deref())
        .fetch_all(executor)
        .await?;

    Ok(companies)
}

/// Insert a company, returning its new id
pub async fn insert_company<'e, E>(executor: E, fields: &CompanyFields) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO companies (
            name, street, postal_code, city, country, department, phone, fax,
            email, size, sector_id, contact_id, validated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.street)
    .bind(&fields.postal_code)
    .bind(&fields.city)
    .bind(&fields.country)
    .bind(&fields.department)
    .bind(&fields.phone)
    .bind(&fields.fax)
    .bind(&fields.email)
    .bind(&fields.size)
    .bind(fields.sector_id)
    .bind(fields.contact_id)
    .bind(fields.validated)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replace every mutable field of a company
///
/// Returns false when no row has this id.
pub async fn update_company<'e, E>(executor: E, id: i64, fields: &CompanyFields) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE companies SET
            name = ?, street = ?, postal_code = ?, city = ?, country = ?,
            department = ?, phone = ?, fax = ?, email = ?, size = ?,
            sector_id = ?, contact_id = ?, validated = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.street)
    .bind(&fields.postal_code)
    .bind(&fields.city)
    .bind(&fields.country)
    .bind(&fields.department)
    .bind(&fields.phone)
    .bind(&fields.fax)
    .bind(&fields.email)
    .bind(&fields.size)
    .bind(fields.sector_id)
    .bind(fields.contact_id)
    .bind(fields.validated)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a company as approved
pub async fn set_validated<'e, E>(executor: E, id: i64, validated: bool) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE companies SET validated = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(validated)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a company
///
/// Fails with a foreign key violation while internships still reference it.
pub async fn delete_company<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM companies WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Rows re-pointed from a merged-away company
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reassigned {
    pub contact_links: u64,
    pub internships: u64,
    pub kanban_cards: u64,
}

/// Re-point everything that references `from` to `to`
///
/// Contact links are unioned (duplicates dropped) rather than moved one by one.
pub async fn reassign_company_references(
    conn: &mut SqliteConnection,
    from: i64,
    to: i64,
) -> Result<Reassigned> {
    let contact_links = sqlx::query(
        r#"
        INSERT OR IGNORE INTO company_contacts (company_id, contact_id)
        SELECT ?, contact_id FROM company_contacts WHERE company_id = ?
        "#,
    )
    .bind(to)
    .bind(from)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM company_contacts WHERE company_id = ?")
        .bind(from)
        .execute(&mut *conn)
        .await?;

    let internships = sqlx::query("UPDATE internships SET company_id = ? WHERE company_id = ?")
        .bind(to)
        .bind(from)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let kanban_cards = sqlx::query("UPDATE kanban_cards SET company_id = ? WHERE company_id = ?")
        .bind(to)
        .bind(from)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(Reassigned {
        contact_links,
        internships,
        kanban_cards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagedirect_common::db::init_in_memory;

    async fn setup() -> sqlx::SqlitePool {
        let pool = init_in_memory().await.expect("in-memory database");
        sqlx::query("INSERT INTO sectors (id, label) VALUES (1, 'Informatique'), (2, 'Bâtiment')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_and_load_company() {
        let pool = setup().await;

        let mut fields = CompanyFields::new("TechCo", "Paris", 1);
        fields.phone = Some("01 23 45 67 89".to_string());
        let id = insert_company(&pool, &fields).await.unwrap();

        let loaded = load_company(&pool, id).await.unwrap().expect("company exists");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.fields, fields);
        assert_eq!(loaded.fields.country, "France");
        assert!(!loaded.fields.validated);
    }

    #[tokio::test]
    async fn test_load_missing_company_is_none() {
        let pool = setup().await;
        assert!(load_company(&pool, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = setup().await;
        let mut validated = CompanyFields::new("Bâtisseurs", "Lyon", 2);
        validated.validated = true;
        insert_company(&pool, &validated).await.unwrap();
        insert_company(&pool, &CompanyFields::new("Atelier", "Paris", 1)).await.unwrap();
        insert_company(&pool, &CompanyFields::new("Code Factory", "lyon", 1)).await.unwrap();

        let all = list_companies(&pool, &CompanyFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.fields.name.as_str()).collect();
        assert_eq!(names, vec!["Atelier", "Bâtisseurs", "Code Factory"]);

        let pending = CompanyFilter {
            validated: Some(false),
            ..Default::default()
        };
        assert_eq!(list_companies(&pool, &pending).await.unwrap().len(), 2);

        let in_lyon = CompanyFilter {
            city: Some("LYON".to_string()),
            ..Default::default()
        };
        assert_eq!(list_companies(&pool, &in_lyon).await.unwrap().len(), 2);

        let sector_one_in_lyon = CompanyFilter {
            sector_id: Some(1),
            city: Some("Lyon".to_string()),
            ..Default::default()
        };
        let found = list_companies(&pool, &sector_one_in_lyon).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fields.name, "Code Factory");
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let pool = setup().await;
        let fields = CompanyFields::new("Ghost", "Nice", 1);

        assert!(!update_company(&pool, 99, &fields).await.unwrap());
        assert!(!delete_company(&pool, 99).await.unwrap());
        assert!(!set_validated(&pool, 99, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_internship() {
        let pool = setup().await;
        let id = insert_company(&pool, &CompanyFields::new("Host", "Paris", 1)).await.unwrap();
        sqlx::query("INSERT INTO internships (student_name, company_id) VALUES ('Léa', ?)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let err = delete_company(&pool, id).await.unwrap_err();
        assert!(err.is_foreign_key_violation(), "unexpected error: {}", err);
    }
}
