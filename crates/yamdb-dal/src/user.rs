use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use garde::Validate;
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, QueryBuilder, Row as _};
use tracing::debug;
use yamdb_types::{
    claim::Role,
    general::{ValidEmail, ValidUsername},
};

use crate::{Batch, ChosenDB, ChosenRow, Error, ListingParams, error::Result};

pub const CONFIRMATION_CODE_LEN: usize = 6;

const VALID_ORDER_FIELDS: &[&str] = &["id", "username", "email", "role", "date_joined"];

fn hash_code(code: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let code_hash = argon2.hash_password(code.as_bytes(), &salt)?.to_string();
    Ok(code_hash)
}

fn verify_code(code: &str, code_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(code_hash)?;
    let res = Argon2::default().verify_password(code.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid confirmation code, error {e}");
    }
    Ok(res.is_ok())
}

/// Random numeric code, which is delivered to user out of band
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CONFIRMATION_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateUser {
    #[garde(dive)]
    pub username: ValidUsername,
    #[garde(dive)]
    pub email: ValidEmail,
    #[serde(default)]
    #[garde(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[garde(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[garde(length(max = 5000))]
    pub bio: String,
    #[serde(default)]
    #[garde(skip)]
    pub role: Role,
    #[serde(skip)]
    #[garde(skip)]
    pub is_staff: bool,
}

impl CreateUser {
    pub fn new(username: ValidUsername, email: ValidEmail) -> Self {
        Self {
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: Role::User,
            is_staff: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateUser {
    #[garde(dive)]
    pub username: Option<ValidUsername>,
    #[garde(dive)]
    pub email: Option<ValidEmail>,
    #[garde(inner(length(max = 150)))]
    pub first_name: Option<String>,
    #[garde(inner(length(max = 150)))]
    pub last_name: Option<String>,
    #[garde(inner(length(max = 5000)))]
    pub bio: Option<String>,
    #[garde(skip)]
    pub role: Option<Role>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    #[serde(skip)]
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    #[serde(skip)]
    pub is_staff: bool,
}

impl sqlx::FromRow<'_, ChosenRow> for User {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<Role>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            bio: row.try_get("bio")?,
            role,
            is_staff: row.try_get("is_staff")?,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, is_staff";
const TAKEN_MSG: &str = "User with this username or email already exists";

pub type UserRepository = UserRepositoryImpl<Pool<ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates user account and returns it with new confirmation code
    pub async fn create(&self, payload: CreateUser) -> Result<(User, String)> {
        let code = generate_code();
        let code_hash = hash_code(&code)?;
        let result = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, bio, role, is_staff, confirmation_code, date_joined)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(payload.username.as_ref())
        .bind(payload.email.as_ref())
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.bio)
        .bind(payload.role.as_str())
        .bind(payload.is_staff)
        .bind(&code_hash)
        .bind(time::OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await
        .map_err(|e| Error::on_unique_violation(e, TAKEN_MSG))?;

        let id = result.last_insert_rowid();
        debug!("Created user {} with id {id}", payload.username);
        let user = self.get(id).await?;
        Ok((user, code))
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<User>> {
        let search = params.search.as_deref().map(crate::contains_pattern);
        let total: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM users WHERE ?1 IS NULL OR username LIKE ?1 ESCAPE '\\'",
        )
        .bind(search.clone())
        .fetch_one(&self.executor)
        .await?;

        let order = params.ordering_or(VALID_ORDER_FIELDS, "username")?;
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ?1 IS NULL OR username LIKE ?1 ESCAPE '\\'
            ORDER BY {order} LIMIT ?2 OFFSET ?3"
        ))
        .bind(search)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.executor)
        .await?;
        Ok(Batch::new(&params, total, users))
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::not_found("User"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::not_found("User"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::not_found("User"))
    }

    pub async fn update(&self, id: i64, payload: UpdateUser) -> Result<User> {
        if payload.is_empty() {
            return self.get(id).await;
        }
        let mut query = QueryBuilder::<ChosenDB>::new("UPDATE users SET ");
        let mut fields = query.separated(", ");
        if let Some(username) = payload.username {
            fields.push("username = ");
            fields.push_bind_unseparated(username.as_ref().to_string());
        }
        if let Some(email) = payload.email {
            fields.push("email = ");
            fields.push_bind_unseparated(email.as_ref().to_string());
        }
        if let Some(first_name) = payload.first_name {
            fields.push("first_name = ");
            fields.push_bind_unseparated(first_name);
        }
        if let Some(last_name) = payload.last_name {
            fields.push("last_name = ");
            fields.push_bind_unseparated(last_name);
        }
        if let Some(bio) = payload.bio {
            fields.push("bio = ");
            fields.push_bind_unseparated(bio);
        }
        if let Some(role) = payload.role {
            fields.push("role = ");
            fields.push_bind_unseparated(role.as_str());
        }
        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(&self.executor)
            .await
            .map_err(|e| Error::on_unique_violation(e, TAKEN_MSG))?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("User"));
        }
        self.get(id).await
    }

    pub async fn set_staff(&self, id: i64, is_staff: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
            .bind(is_staff)
            .bind(id)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            Err(Error::not_found("User"))
        } else {
            Ok(())
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            Err(Error::not_found("User"))
        } else {
            Ok(())
        }
    }

    /// Replaces confirmation code of existing user, returns the new code
    pub async fn issue_code(&self, id: i64) -> Result<String> {
        let code = generate_code();
        let code_hash = hash_code(&code)?;
        let result = sqlx::query("UPDATE users SET confirmation_code = ? WHERE id = ?")
            .bind(&code_hash)
            .bind(id)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            Err(Error::not_found("User"))
        } else {
            Ok(code)
        }
    }

    /// Returns user if the confirmation code matches, code stays valid
    pub async fn check_code(&self, username: &str, code: &str) -> Result<User> {
        let (id, code_hash): (i64, Option<String>) =
            sqlx::query_as("SELECT id, confirmation_code FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.executor)
                .await?
                .ok_or_else(|| Error::not_found("User"))?;
        if let Some(code_hash) = code_hash {
            if verify_code(code, &code_hash).unwrap_or(false) {
                return self.get(id).await;
            }
        }
        Err(Error::InvalidCredentials)
    }
}
