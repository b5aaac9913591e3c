use chrono::Utc;

use crate::{
    db::{models::Company, Database},
    error::{AppError, Result},
    policy::{self, Action, Actor},
};

/// Hard system-wide cap on tenants.
pub const MAX_COMPANIES: i64 = 7;

pub async fn create_company(db: &Database, actor: &Actor, name: &str) -> Result<Company> {
    policy::require(actor, Action::CreateCompany)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }

    let _guard = db.write_guard().await;

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies")
        .fetch_one(&db.pool)
        .await?;
    if count >= MAX_COMPANIES {
        return Err(AppError::LimitExceeded(format!(
            "At most {MAX_COMPANIES} companies may exist"
        )));
    }

    // Exact, case-sensitive match
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies WHERE name = ?")
        .bind(name)
        .fetch_one(&db.pool)
        .await?;
    if exists > 0 {
        return Err(AppError::Conflict("Company name already exists".to_string()));
    }

    let company = Company {
        id: super::new_id(),
        name: name.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO companies (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&company.id)
        .bind(&company.name)
        .bind(company.created_at)
        .execute(&db.pool)
        .await?;

    Ok(company)
}

/// Company names are public: the login form needs them before any actor exists.
pub async fn list_companies(db: &Database) -> Result<Vec<Company>> {
    let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name ASC")
        .fetch_all(&db.pool)
        .await?;
    Ok(companies)
}
