use clap::Parser;
use std::path::PathBuf;

/// Storage settings shared by the server and command line tools
#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "YAMDB_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/yamdb.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "YAMDB_DATA_DIR",
        help = "Data directory (database, token secret, mail outbox), default is system default like ~/.local/share/yamdb",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

pub fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("yamdb"))
        .unwrap_or_else(|| PathBuf::from("yamdb"))
        .to_string_lossy()
        .to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/yamdb.db", self.data_dir))
    }
}
