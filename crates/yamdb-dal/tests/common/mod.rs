#![allow(dead_code)]

use futures::TryStreamExt as _;
use sqlx::Executor;
use yamdb_dal::user::{CreateUser, UserRepository};
use yamdb_types::claim::Role;

const TEST_DATA: &str = r#"
INSERT INTO category (id, name, slug) VALUES (1, 'Films', 'film');
INSERT INTO category (id, name, slug) VALUES (2, 'Books', 'book');

INSERT INTO genre (id, name, slug) VALUES (1, 'Drama', 'drama');
INSERT INTO genre (id, name, slug) VALUES (2, 'Sci-Fi', 'sci-fi');
INSERT INTO genre (id, name, slug) VALUES (3, 'Comedy', 'comedy');
"#;

pub async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    yamdb_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

pub async fn create_user(pool: &sqlx::Pool<sqlx::Sqlite>, username: &str, role: Role) -> i64 {
    let repo = UserRepository::new(pool.clone());
    let mut payload = CreateUser::new(
        username.parse().unwrap(),
        format!("{username}@example.com").parse().unwrap(),
    );
    payload.role = role;
    let (user, _code) = repo.create(payload).await.unwrap();
    user.id
}
