use yamdb_dal::Pool;
use yamdb_types::config::BackendConfig;

pub mod create_user;
pub mod issue_code;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens database of the backend, schema is created if missing
pub(crate) async fn open_db(backend: &BackendConfig) -> anyhow::Result<Pool> {
    let data_dir = backend.data_dir();
    if !data_dir.is_dir() {
        tokio::fs::create_dir_all(&data_dir).await?;
    }
    let pool = yamdb_dal::new_pool(&backend.database_url()).await?;
    yamdb_dal::migrate(&pool).await?;
    Ok(pool)
}
