use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder};
use time::OffsetDateTime;
use tracing::debug;
use yamdb_types::claim::Authored;

use crate::{Batch, ChosenDB, Error, ListingParams, error::Result};

pub const MAX_TEXT_LEN: usize = 5000;

const VALID_ORDER_FIELDS: &[&str] = &["id", "score", "pub_date"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateReview {
    #[garde(length(chars, min = 1, max = 5000))]
    pub text: String,
    #[garde(range(min = 1, max = 10))]
    pub score: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateReview {
    #[garde(length(chars, min = 1, max = 5000))]
    pub text: Option<String>,
    #[garde(range(min = 1, max = 10))]
    pub score: Option<i64>,
}

impl UpdateReview {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.score.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Review {
    pub id: i64,
    pub title_id: i64,
    /// Username of author
    pub author: String,
    #[serde(skip)]
    pub author_id: i64,
    pub text: String,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
}

impl Authored for Review {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

const SELECT_REVIEW: &str = r#"
    SELECT r.id AS id, r.title_id, u.username AS author, r.author_id, r.text, r.score AS score, r.pub_date AS pub_date
    FROM review r
    JOIN users u ON r.author_id = u.id
    "#;

pub type ReviewRepository = ReviewRepositoryImpl<sqlx::Pool<ChosenDB>>;

/// Reviews of one title
pub struct ReviewRepositoryImpl<E> {
    executor: E,
    title_id: i64,
}

impl<'c, E> ReviewRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E, title_id: i64) -> Self {
        Self { executor, title_id }
    }

    pub async fn create(&self, author_id: i64, payload: CreateReview) -> Result<Review> {
        let result = sqlx::query(
            "INSERT INTO review (title_id, author_id, text, score, pub_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.title_id)
        .bind(author_id)
        .bind(&payload.text)
        .bind(payload.score)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await
        .map_err(|e| Error::on_unique_violation(e, "You have already reviewed this title"))?;

        let id = result.last_insert_rowid();
        debug!("User {author_id} reviewed title {} as {id}", self.title_id);
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEW} WHERE r.id = ? AND r.title_id = ?"
        ))
        .bind(id)
        .bind(self.title_id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::not_found("Review"))
    }

    pub async fn exists_for_author(&self, author_id: i64) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM review WHERE title_id = ? AND author_id = ?")
                .bind(self.title_id)
                .bind(author_id)
                .fetch_optional(&self.executor)
                .await?;
        Ok(found.is_some())
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Review>> {
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM review WHERE title_id = ?")
            .bind(self.title_id)
            .fetch_one(&self.executor)
            .await?;
        let order = params.ordering_or(VALID_ORDER_FIELDS, "pub_date")?;
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEW} WHERE r.title_id = ? ORDER BY {order}, r.id LIMIT ? OFFSET ?"
        ))
        .bind(self.title_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.executor)
        .await?;
        Ok(Batch::new(&params, total, reviews))
    }

    pub async fn update(&self, id: i64, payload: UpdateReview) -> Result<Review> {
        if !payload.is_empty() {
            let mut query = QueryBuilder::<ChosenDB>::new("UPDATE review SET ");
            let mut fields = query.separated(", ");
            if let Some(text) = payload.text {
                fields.push("text = ");
                fields.push_bind_unseparated(text);
            }
            if let Some(score) = payload.score {
                fields.push("score = ");
                fields.push_bind_unseparated(score);
            }
            query.push(" WHERE id = ");
            query.push_bind(id);
            query.push(" AND title_id = ");
            query.push_bind(self.title_id);
            let result = query.build().execute(&self.executor).await?;
            if result.rows_affected() == 0 {
                return Err(Error::not_found("Review"));
            }
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM review WHERE id = ? AND title_id = ?")
            .bind(id)
            .bind(self.title_id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::not_found("Review"))
        } else {
            Ok(())
        }
    }
}
