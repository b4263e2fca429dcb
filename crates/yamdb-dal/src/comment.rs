use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Executor;
use time::OffsetDateTime;
use tracing::debug;
use yamdb_types::claim::Authored;

use crate::{Batch, ChosenDB, Error, ListingParams, error::Result};

const VALID_ORDER_FIELDS: &[&str] = &["id", "pub_date"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateComment {
    #[garde(length(chars, min = 1, max = 5000))]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateComment {
    #[garde(length(chars, min = 1, max = 5000))]
    pub text: Option<String>,
}

impl UpdateComment {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub author: String,
    #[serde(skip)]
    pub author_id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

const SELECT_COMMENT: &str = r#"
    SELECT c.id AS id, c.review_id, u.username AS author, c.author_id, c.text, c.pub_date AS pub_date
    FROM comment c
    JOIN users u ON c.author_id = u.id
    "#;

pub type CommentRepository = CommentRepositoryImpl<sqlx::Pool<ChosenDB>>;

/// Comments of one review
pub struct CommentRepositoryImpl<E> {
    executor: E,
    review_id: i64,
}

impl<'c, E> CommentRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E, review_id: i64) -> Self {
        Self {
            executor,
            review_id,
        }
    }

    pub async fn create(&self, author_id: i64, payload: CreateComment) -> Result<Comment> {
        let result = sqlx::query(
            "INSERT INTO comment (review_id, author_id, text, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(self.review_id)
        .bind(author_id)
        .bind(&payload.text)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await?;
        let id = result.last_insert_rowid();
        debug!("User {author_id} commented review {} as {id}", self.review_id);
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENT} WHERE c.id = ? AND c.review_id = ?"
        ))
        .bind(id)
        .bind(self.review_id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::not_found("Comment"))
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM comment WHERE review_id = ?")
            .bind(self.review_id)
            .fetch_one(&self.executor)
            .await?;
        let order = params.ordering_or(VALID_ORDER_FIELDS, "pub_date")?;
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENT} WHERE c.review_id = ? ORDER BY {order}, c.id LIMIT ? OFFSET ?"
        ))
        .bind(self.review_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.executor)
        .await?;
        Ok(Batch::new(&params, total, comments))
    }

    pub async fn update(&self, id: i64, payload: UpdateComment) -> Result<Comment> {
        if let Some(text) = payload.text {
            let res = sqlx::query("UPDATE comment SET text = ? WHERE id = ? AND review_id = ?")
                .bind(text)
                .bind(id)
                .bind(self.review_id)
                .execute(&self.executor)
                .await?;
            if res.rows_affected() == 0 {
                return Err(Error::not_found("Comment"));
            }
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM comment WHERE id = ? AND review_id = ?")
            .bind(id)
            .bind(self.review_id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::not_found("Comment"))
        } else {
            Ok(())
        }
    }
}
