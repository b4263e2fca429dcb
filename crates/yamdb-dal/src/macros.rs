/// Generates payload, entity and repository for simple catalog values,
/// which are identified by unique slug.
macro_rules! slug_entity {
    ($entity:ident, $table:literal) => {
        paste::paste! {
            #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, garde::Validate)]
            #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
            pub struct [<Create $entity>] {
                #[garde(length(min = 1, max = 256))]
                pub name: String,
                #[garde(length(min = 1, max = 50), pattern(r"^[-a-zA-Z0-9_]+$"))]
                pub slug: String,
            }

            #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
            #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
            pub struct $entity {
                #[serde(skip)]
                pub id: i64,
                pub name: String,
                pub slug: String,
            }

            const VALID_ORDER_FIELDS: &[&str] = &["id", "name", "slug"];

            pub type [<$entity Repository>] = [<$entity RepositoryImpl>]<sqlx::Pool<crate::ChosenDB>>;

            pub struct [<$entity RepositoryImpl>]<E> {
                executor: E,
            }

            impl<'c, E> [<$entity RepositoryImpl>]<E>
            where
                for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
            {
                pub fn new(executor: E) -> Self {
                    Self { executor }
                }

                pub async fn create(&self, payload: [<Create $entity>]) -> crate::error::Result<$entity> {
                    let result = sqlx::query(concat!("INSERT INTO ", $table, " (name, slug) VALUES (?, ?)"))
                        .bind(&payload.name)
                        .bind(&payload.slug)
                        .execute(&self.executor)
                        .await
                        .map_err(|e| {
                            crate::Error::on_unique_violation(
                                e,
                                format!("{} with slug {} already exists", stringify!($entity), payload.slug),
                            )
                        })?;

                    let id = result.last_insert_rowid();
                    tracing::debug!("Created {} {} with id {}", $table, payload.slug, id);
                    Ok($entity {
                        id,
                        name: payload.name,
                        slug: payload.slug,
                    })
                }

                pub async fn list(&self, params: crate::ListingParams) -> crate::error::Result<crate::Batch<$entity>> {
                    let search = params.search.as_deref().map(crate::contains_pattern);
                    let total: i64 = sqlx::query_scalar(concat!(
                        "SELECT count(*) FROM ", $table,
                        " WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\'"
                    ))
                    .bind(search.clone())
                    .fetch_one(&self.executor)
                    .await?;

                    let order = params.ordering_or(VALID_ORDER_FIELDS, "name")?;
                    let rows = sqlx::query_as::<_, $entity>(&format!(
                        concat!(
                            "SELECT id, name, slug FROM ", $table,
                            " WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\' ORDER BY {} LIMIT ?2 OFFSET ?3"
                        ),
                        order
                    ))
                    .bind(search)
                    .bind(params.limit)
                    .bind(params.offset)
                    .fetch_all(&self.executor)
                    .await?;

                    Ok(crate::Batch::new(&params, total, rows))
                }

                pub async fn list_all(&self) -> crate::error::Result<Vec<$entity>> {
                    self.list(crate::ListingParams::default()).await.map(|b| b.rows)
                }

                pub async fn get_by_slug(&self, slug: &str) -> crate::error::Result<$entity> {
                    sqlx::query_as::<_, $entity>(concat!("SELECT id, name, slug FROM ", $table, " WHERE slug = ?"))
                        .bind(slug)
                        .fetch_optional(&self.executor)
                        .await?
                        .ok_or_else(|| crate::Error::not_found(stringify!($entity)))
                }

                pub async fn delete_by_slug(&self, slug: &str) -> crate::error::Result<()> {
                    let res = sqlx::query(concat!("DELETE FROM ", $table, " WHERE slug = ?"))
                        .bind(slug)
                        .execute(&self.executor)
                        .await?;

                    if res.rows_affected() == 0 {
                        Err(crate::Error::not_found(stringify!($entity)))
                    } else {
                        Ok(())
                    }
                }
            }
        }
    };
}
