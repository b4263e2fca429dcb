use clap::Parser;
use yamdb_dal::user::UserRepository;
use yamdb_types::config::BackendConfig;

use crate::commands::{open_db, Executor};

/// Replaces confirmation code of existing user and prints it
#[derive(Parser, Debug)]
pub struct IssueCodeCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User name")]
    pub username: String,
}

impl Executor for IssueCodeCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_db(&self.backend).await?;
        let repository = UserRepository::new(pool);
        let user = repository.find_by_username(&self.username).await?;
        let code = repository.issue_code(user.id).await?;
        println!("{code}");

        Ok(())
    }
}
