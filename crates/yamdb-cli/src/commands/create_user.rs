use clap::Parser;
use tracing::info;
use yamdb_dal::user::{CreateUser, UserRepository};
use yamdb_types::{
    claim::Role,
    config::BackendConfig,
    general::{ValidEmail, ValidUsername},
};

use crate::commands::{open_db, Executor};

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User name")]
    pub username: ValidUsername,
    #[arg(short, long, help = "User email, confirmation codes are sent there")]
    pub email: ValidEmail,
    #[arg(short, long, default_value = "user", help = "Role of the user: user, moderator or admin")]
    pub role: Role,
    #[arg(long, help = "Staff account can manage users regardless of role")]
    pub staff: bool,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_db(&self.backend).await?;
        let repository = UserRepository::new(pool);
        let new_user = CreateUser {
            role: self.role,
            is_staff: self.staff,
            ..CreateUser::new(self.username, self.email)
        };
        let (user, code) = repository.create(new_user).await?;
        info!("Created user {} with role {}", user.username, user.role);
        println!("{code}");

        Ok(())
    }
}
