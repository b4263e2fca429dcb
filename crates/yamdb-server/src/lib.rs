pub mod config;
pub mod error;
pub mod run;

use std::path::Path;

use config::ServerConfig;
pub use error::{Error, Result};
use tokio::{fs, io::AsyncWriteExt as _};
use tracing::info;
use yamdb_app::{
    mail::Mailer,
    state::{AppConfig, AppState},
};
use yamdb_auth::token::TokenManager;

const SECRET_LEN: usize = 32;

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            default_page_size: config.default_page_size,
            mail_from: config.mail_from.clone(),
        }
    }
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {data_dir:?}");
    }

    let mailer = match &config.mail_dir {
        Some(dir) => {
            fs::create_dir_all(dir).await?;
            Mailer::Outbox(dir.clone())
        }
        None => Mailer::Log,
    };

    let pool = yamdb_dal::new_pool(&config.database_url()).await?;
    yamdb_dal::migrate(&pool).await?;

    let secret = read_secret(&data_dir).await?;
    let tokens = TokenManager::new(&secret, config.token_validity)?;
    Ok(AppState::new(config.into(), pool, tokens, mailer))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; SECRET_LEN]>();
        #[cfg(unix)]
        let mut file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            {
                // Only the current user can read the secret
                let _f = OpenOptions::new()
                    .mode(0o600)
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&secret_file)?;
            }
            fs::File::options().write(true).open(&secret_file).await?
        };
        #[cfg(not(unix))]
        let mut file = fs::File::create(&secret_file).await?;

        file.write_all(&random_bytes).await?;
        random_bytes.as_ref().to_vec()
    };
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_secret_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let first = read_secret(dir.path()).await.unwrap();
        assert_eq!(first.len(), SECRET_LEN);
        let second = read_secret(dir.path()).await.unwrap();
        assert_eq!(first, second);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(dir.path().join("secret")).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }
}
