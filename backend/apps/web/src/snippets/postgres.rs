//! PostgreSQL Snippet Repository

use chrono::{DateTime, Utc};
use kernel::error::domain::DomainError;
use kernel::id::SnippetId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::SnippetResult;
use crate::snippets::entity::{NewSnippet, Snippet};
use crate::snippets::repository::SnippetRepository;

#[derive(Clone)]
pub struct PgSnippetRepository {
    pool: PgPool,
}

impl PgSnippetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SnippetRepository for PgSnippetRepository {
    async fn insert(&self, snippet: &NewSnippet) -> SnippetResult<SnippetId> {
        let snippet = snippet.clone().into_snippet();

        sqlx::query(
            r#"
            INSERT INTO snippets (id, title, content, created, expires)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(snippet.id.as_uuid())
        .bind(&snippet.title)
        .bind(&snippet.content)
        .bind(snippet.created)
        .bind(snippet.expires)
        .execute(&self.pool)
        .await?;

        Ok(snippet.id)
    }

    async fn get(&self, id: &SnippetId) -> SnippetResult<Snippet> {
        let row = sqlx::query_as::<_, SnippetRow>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now() AND id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SnippetRow::into_snippet)
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn latest(&self, limit: usize) -> SnippetResult<Vec<Snippet>> {
        let rows = sqlx::query_as::<_, SnippetRow>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now()
            ORDER BY created DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SnippetRow::into_snippet).collect())
    }
}

#[derive(sqlx::FromRow)]
struct SnippetRow {
    id: Uuid,
    title: String,
    content: String,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
}

impl SnippetRow {
    fn into_snippet(self) -> Snippet {
        Snippet {
            id: SnippetId::from_uuid(self.id),
            title: self.title,
            content: self.content,
            created: self.created,
            expires: self.expires,
        }
    }
}
