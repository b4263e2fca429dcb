use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use rand::Rng as _;
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::json;
use tempfile::TempDir;
use tracing::debug;
use yamdb_dal::{
    Pool,
    user::{CreateUser, UpdateUser, UserRepository},
};
use yamdb_server::config::{Parser, ServerConfig};
use yamdb_types::{
    claim::Role,
    general::{ValidEmail, ValidUsername},
};

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let mail_dir = tmp_data_dir
        .path()
        .join("outbox")
        .to_string_lossy()
        .to_string();
    let port = random_port()?.to_string();
    let args = &[
        "yamdb-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--mail-dir",
        &mail_dir,
        "--default-page-size",
        "10",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Test configuration with migrated empty database
pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir().join("yamdb-e2e");
    tokio::fs::create_dir_all(&base_dir).await?;
    let (args, guard) = test_config(test_name, &base_dir)?;
    let pool = open_db(&args).await?;
    pool.close().await;
    Ok((args, guard))
}

pub async fn open_db(args: &ServerConfig) -> Result<Pool> {
    let pool = yamdb_dal::new_pool(&args.database_url()).await?;
    yamdb_dal::migrate(&pool).await?;
    Ok(pool)
}

/// Root of versioned API, ends with slash, so relative paths can be joined
pub fn api_url(args: &ServerConfig) -> Url {
    Url::parse(&format!("http://127.0.0.1:{}/v1/", args.port)).expect("Valid base URL")
}

pub fn extend_url(url: &Url, segment: impl std::fmt::Display) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("Base URL")
        .pop_if_empty()
        .push(&segment.to_string());
    url
}

pub fn mail_dir(args: &ServerConfig) -> PathBuf {
    args.mail_dir.clone().expect("Test config has mail dir")
}

/// Runs server in background and waits until it responds to health check
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let health_url = format!("http://127.0.0.1:{}/health", args.port);
    tokio::spawn(async move {
        if let Err(e) = yamdb_server::run::run(args).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(std::time::Duration::from_millis(100)).await,
        }
    }
    Err(anyhow!("Server did not start"))
}

/// Finds confirmation code in the newest message sent to given address
pub async fn read_code(mail_dir: &Path, email: &str) -> Result<String> {
    let suffix = format!("-{email}.eml");
    let mut newest: Option<PathBuf> = None;
    let mut entries = tokio::fs::read_dir(mail_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(&suffix) && newest.as_ref().is_none_or(|n| path > *n) {
            newest = Some(path);
        }
    }
    let path = newest.ok_or_else(|| anyhow!("No mail for {email}"))?;
    let content = tokio::fs::read_to_string(&path).await?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("Your API confirmation code: "))
        .map(|code| code.trim().to_string())
        .ok_or_else(|| anyhow!("No code in mail {path:?}"))
}

pub fn email_of(username: &str) -> String {
    format!("{username}@example.com")
}

fn new_account(username: &str, role: Role) -> CreateUser {
    CreateUser {
        role,
        ..CreateUser::new(
            ValidUsername::cheat(username.to_string()),
            ValidEmail::cheat(email_of(username)),
        )
    }
}

async fn create_account(args: &ServerConfig, payload: CreateUser) -> Result<String> {
    let pool = open_db(args).await?;
    let (_, code) = UserRepository::new(pool.clone()).create(payload).await?;
    pool.close().await;
    Ok(code)
}

/// Creates account directly in database, returns its confirmation code
pub async fn create_user(args: &ServerConfig, username: &str, role: Role) -> Result<String> {
    create_account(args, new_account(username, role)).await
}

pub async fn create_staff_user(args: &ServerConfig, username: &str, role: Role) -> Result<String> {
    let payload = CreateUser {
        is_staff: true,
        ..new_account(username, role)
    };
    create_account(args, payload).await
}

/// Changes account behind the running server's back
pub async fn modify_user(args: &ServerConfig, username: &str, update: UpdateUser) -> Result<()> {
    let pool = open_db(args).await?;
    let repository = UserRepository::new(pool.clone());
    let user = repository.find_by_username(username).await?;
    repository.update(user.id, update).await?;
    pool.close().await;
    Ok(())
}

pub async fn delete_user(args: &ServerConfig, username: &str) -> Result<()> {
    let pool = open_db(args).await?;
    let repository = UserRepository::new(pool.clone());
    let user = repository.find_by_username(username).await?;
    repository.delete(user.id).await?;
    pool.close().await;
    Ok(())
}

pub async fn obtain_token(api: &Url, username: &str, code: &str) -> Result<String> {
    let response = reqwest::Client::new()
        .post(api.join("auth/token")?)
        .json(&json!({"username": username, "confirmation_code": code}))
        .send()
        .await?;
    if response.status() != reqwest::StatusCode::CREATED {
        return Err(anyhow!("Token request failed: {}", response.status()));
    }
    let body: serde_json::Value = response.json().await?;
    body["token"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| anyhow!("Token missing in response"))
}

pub fn authorized_client(token: &str) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}"))?,
    );
    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

/// Creates account with role and returns client authenticated as that account
pub async fn login_as(args: &ServerConfig, username: &str, role: Role) -> Result<reqwest::Client> {
    let code = create_user(args, username, role).await?;
    let token = obtain_token(&api_url(args), username, &code).await?;
    debug!("User {username} logged in");
    authorized_client(&token)
}

#[derive(Debug, Clone, Copy)]
pub enum TestUser {
    Admin,
    Moderator,
    User,
}

impl TestUser {
    pub fn username(&self) -> &'static str {
        match self {
            TestUser::Admin => "admin",
            TestUser::Moderator => "moderator",
            TestUser::User => "critic",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            TestUser::Admin => Role::Admin,
            TestUser::Moderator => Role::Moderator,
            TestUser::User => Role::User,
        }
    }
}

/// Starts server and returns client logged in as test user, together with API root
pub async fn launch_env(args: ServerConfig, user: TestUser) -> Result<(reqwest::Client, Url)> {
    let api = api_url(&args);
    let login_args = args.clone();
    spawn_server(args).await?;
    let client = login_as(&login_args, user.username(), user.role()).await?;
    Ok((client, api))
}
