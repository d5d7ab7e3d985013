use crate::error::CoreError;
use crate::models::{ItemDetail, ItemKind, ItemUpdate, NewItemData, Occurrence, OwnedItem, RecurrenceRule};
use crate::repository::{short_id_pattern, ItemRepository, SiteRepository, SqliteRepository};
use crate::timezone::local_date;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

#[async_trait]
impl ItemRepository for SqliteRepository {
    async fn add_item(&self, user_id: &str, data: NewItemData) -> Result<OwnedItem, CoreError> {
        if user_id.trim().is_empty() {
            return Err(CoreError::Validation("user id must not be empty".to_string()));
        }

        let item = OwnedItem {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            kind: data.kind,
            nickname: data.nickname.filter(|n| !n.trim().is_empty()),
            species: data.species.filter(|s| !s.trim().is_empty()),
            added_at: Utc::now(),
            site_id: data.site_id,
            birth_date: data.birth_date,
        };
        self.validate_item(&item)?;

        // A site is only accepted when it belongs to the same user
        let inserted = sqlx::query(
            r#"INSERT INTO owned_items (id, user_id, kind, nickname, species, added_at, site_id, birth_date)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE $7 IS NULL OR EXISTS (SELECT 1 FROM sites WHERE id = $7 AND user_id = $2)
            "#,
        )
        .bind(item.id)
        .bind(&item.user_id)
        .bind(item.kind)
        .bind(&item.nickname)
        .bind(&item.species)
        .bind(item.added_at)
        .bind(item.site_id)
        .bind(item.birth_date)
        .execute(self.pool())
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(site_not_found(item.site_id));
        }

        tracing::info!(item_id = %item.id, user_id, kind = %item.kind, "owned item added");
        Ok(item)
    }

    async fn find_item(&self, id: Uuid, user_id: &str) -> Result<Option<OwnedItem>, CoreError> {
        let item = sqlx::query_as("SELECT * FROM owned_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(item)
    }

    async fn find_items(&self, user_id: &str) -> Result<Vec<OwnedItem>, CoreError> {
        let items = sqlx::query_as("SELECT * FROM owned_items WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(items)
    }

    async fn find_items_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<OwnedItem>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let items = sqlx::query_as(
            "SELECT * FROM owned_items WHERE user_id = $1 AND lower(hex(id)) LIKE $2 ORDER BY id",
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(items)
    }

    async fn item_detail(&self, id: Uuid, user_id: &str) -> Result<ItemDetail, CoreError> {
        let item = self
            .find_item(id, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Item {} not found", id)))?;

        let rules: Vec<RecurrenceRule> =
            sqlx::query_as("SELECT * FROM recurrence_rules WHERE item_id = $1 ORDER BY id")
                .bind(id)
                .fetch_all(self.pool())
                .await?;

        let mut occurrences: Vec<Occurrence> = sqlx::query_as(
            r#"SELECT o.* FROM occurrences o
            INNER JOIN recurrence_rules r ON r.id = o.rule_id
            WHERE r.item_id = $1"#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;
        occurrences.sort_by_key(|o| o.due_date);

        let site = match item.site_id {
            Some(site_id) => self.find_site(site_id, user_id).await?,
            None => None,
        };

        Ok(ItemDetail {
            item,
            site,
            rules,
            occurrences,
        })
    }

    async fn update_item(&self, id: Uuid, user_id: &str, data: ItemUpdate) -> Result<OwnedItem, CoreError> {
        if data.is_empty() {
            return self
                .find_item(id, user_id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Item {} not found", id)));
        }

        let mut tx = self.pool().begin().await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE owned_items SET ");
        let mut fields = qb.separated(", ");
        if let Some(nickname) = &data.nickname {
            fields.push("nickname = ");
            fields.push_bind_unseparated(nickname.clone().filter(|n| !n.trim().is_empty()));
        }
        if let Some(species) = &data.species {
            fields.push("species = ");
            fields.push_bind_unseparated(species.clone().filter(|s| !s.trim().is_empty()));
        }
        if let Some(site_id) = data.site_id {
            fields.push("site_id = ");
            fields.push_bind_unseparated(site_id);
        }
        if let Some(birth_date) = data.birth_date {
            fields.push("birth_date = ");
            fields.push_bind_unseparated(birth_date);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND user_id = ");
        qb.push_bind(user_id);
        qb.push(" RETURNING *");

        // Dropping the transaction on any error below rolls the update back
        let item: OwnedItem = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Item {} not found", id)))?;
        self.validate_item(&item)?;

        if let Some(Some(site_id)) = data.site_id {
            let owned_site: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM sites WHERE id = $1 AND user_id = $2")
                    .bind(site_id)
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if owned_site.is_none() {
                return Err(site_not_found(Some(site_id)));
            }
        }

        tx.commit().await?;

        tracing::info!(item_id = %id, site_id = ?item.site_id, "owned item updated");
        Ok(item)
    }

    async fn delete_item(&self, id: Uuid, user_id: &str) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        // Dependents first so nothing is left pointing at a deleted row. Every
        // statement is scoped to the owner, so a foreign item is left untouched.
        let occurrences = sqlx::query(
            r#"DELETE FROM occurrences WHERE rule_id IN (
                SELECT r.id FROM recurrence_rules r
                INNER JOIN owned_items i ON i.id = r.item_id
                WHERE i.id = $1 AND i.user_id = $2
            )"#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let rules = sqlx::query(
            "DELETE FROM recurrence_rules WHERE item_id IN (SELECT id FROM owned_items WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let items = sqlx::query("DELETE FROM owned_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if items.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Item {} not found", id)));
        }

        tx.commit().await?;

        tracing::info!(
            item_id = %id,
            rules = rules.rows_affected(),
            occurrences = occurrences.rows_affected(),
            "owned item deleted"
        );
        Ok(())
    }
}

impl SqliteRepository {
    /// Kind-specific rules for sites and birth dates.
    fn validate_item(&self, item: &OwnedItem) -> Result<(), CoreError> {
        if item.site_id.is_some() && item.kind != ItemKind::Plant {
            return Err(CoreError::Validation(
                "only plants can be placed at a site".to_string(),
            ));
        }
        if let Some(birth_date) = item.birth_date {
            if item.kind != ItemKind::Pet {
                return Err(CoreError::Validation(
                    "only pets have a birth date".to_string(),
                ));
            }
            if birth_date > local_date(Utc::now(), &self.config.timezone) {
                return Err(CoreError::Validation(
                    "birth date cannot be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn site_not_found(site_id: Option<Uuid>) -> CoreError {
    match site_id {
        Some(site_id) => CoreError::NotFound(format!("Site {} not found", site_id)),
        None => CoreError::NotFound("Site not found".to_string()),
    }
}
