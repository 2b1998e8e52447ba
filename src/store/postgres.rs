use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::{debug, info};

use super::{
    ensure_id, upsert_seed, Collection, Document, DocumentStore, Filter, UpdateOptions,
    UpdateOutcome,
};

/// Documents kept as JSONB rows in a single `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        info!("document store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, coll: Collection, mut doc: Document) -> anyhow::Result<String> {
        let id = ensure_id(&mut doc);
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(coll.as_str())
        .bind(&id)
        .bind(Json(Value::Object(doc)))
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert into {}", coll.as_str()))?;
        debug!(collection = coll.as_str(), %id, "document inserted");
        Ok(id)
    }

    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
              FROM documents
             WHERE collection = $1 AND body @> $2
             ORDER BY created_at ASC
            "#,
        )
        .bind(coll.as_str())
        .bind(Json(Value::Object(filter)))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("find in {}", coll.as_str()))?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(&self, coll: Collection, filter: Filter) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
              FROM documents
             WHERE collection = $1 AND body @> $2
             ORDER BY created_at ASC
             LIMIT 1
            "#,
        )
        .bind(coll.as_str())
        .bind(Json(Value::Object(filter)))
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("find_one in {}", coll.as_str()))?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn update(
        &self,
        coll: Collection,
        filter: Filter,
        patch: Document,
        opts: UpdateOptions,
    ) -> anyhow::Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET body = body || $3, updated_at = now()
             WHERE collection = $1 AND body @> $2
            "#,
        )
        .bind(coll.as_str())
        .bind(Json(Value::Object(filter.clone())))
        .bind(Json(Value::Object(patch.clone())))
        .execute(&self.pool)
        .await
        .with_context(|| format!("update in {}", coll.as_str()))?;

        let matched_count = result.rows_affected();
        if matched_count == 0 && opts.upsert {
            // Two racing upserts can both land here; the store does not arbitrate.
            let id = self.insert(coll, upsert_seed(filter, patch)).await?;
            return Ok(UpdateOutcome {
                matched_count: 0,
                upserted_id: Some(id),
            });
        }
        Ok(UpdateOutcome {
            matched_count,
            upserted_id: None,
        })
    }

    async fn delete(&self, coll: Collection, filter: Filter) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
             WHERE collection = $1 AND body @> $2
            "#,
        )
        .bind(coll.as_str())
        .bind(Json(Value::Object(filter)))
        .execute(&self.pool)
        .await
        .with_context(|| format!("delete from {}", coll.as_str()))?;
        Ok(result.rows_affected())
    }
}
