use crate::error::CoreError;
use crate::models::{NewSiteData, Site, SiteUpdate};
use crate::repository::{short_id_pattern, SiteRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

fn validate_site_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("site name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

#[async_trait]
impl SiteRepository for SqliteRepository {
    async fn add_site(&self, user_id: &str, data: NewSiteData) -> Result<Site, CoreError> {
        let site = Site {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            name: validate_site_name(&data.name)?,
            light: data.light,
            location: data.location,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO sites (id, user_id, name, light, location, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(site.id)
        .bind(&site.user_id)
        .bind(&site.name)
        .bind(site.light)
        .bind(site.location)
        .bind(site.created_at)
        .execute(self.pool())
        .await?;

        tracing::info!(site_id = %site.id, user_id, name = %site.name, "site added");
        Ok(site)
    }

    async fn find_site(&self, id: Uuid, user_id: &str) -> Result<Option<Site>, CoreError> {
        let site = sqlx::query_as("SELECT * FROM sites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(site)
    }

    async fn find_sites(&self, user_id: &str) -> Result<Vec<Site>, CoreError> {
        let sites = sqlx::query_as("SELECT * FROM sites WHERE user_id = $1 ORDER BY name, id")
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(sites)
    }

    async fn find_sites_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<Site>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let sites = sqlx::query_as(
            "SELECT * FROM sites WHERE user_id = $1 AND lower(hex(id)) LIKE $2 ORDER BY id",
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(sites)
    }

    async fn update_site(&self, id: Uuid, user_id: &str, data: SiteUpdate) -> Result<Site, CoreError> {
        let name = data.name.as_deref().map(validate_site_name).transpose()?;

        if data.is_empty() {
            return self
                .find_site(id, user_id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Site {} not found", id)));
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE sites SET ");
        let mut fields = qb.separated(", ");
        if let Some(name) = name {
            fields.push("name = ");
            fields.push_bind_unseparated(name);
        }
        if let Some(light) = data.light {
            fields.push("light = ");
            fields.push_bind_unseparated(light);
        }
        if let Some(location) = data.location {
            fields.push("location = ");
            fields.push_bind_unseparated(location);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND user_id = ");
        qb.push_bind(user_id);
        qb.push(" RETURNING *");

        let site: Site = qb
            .build_query_as()
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Site {} not found", id)))?;

        tracing::info!(site_id = %id, name = %site.name, "site updated");
        Ok(site)
    }

    async fn delete_site(&self, id: Uuid, user_id: &str) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let unplaced = sqlx::query("UPDATE owned_items SET site_id = NULL WHERE site_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM sites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Site {} not found", id)));
        }

        tx.commit().await?;

        tracing::info!(site_id = %id, unplaced = unplaced.rows_affected(), "site deleted");
        Ok(())
    }
}
