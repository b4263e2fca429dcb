use clap::{Parser, Subcommand};

use crate::commands::{create_user::CreateUserCmd, issue_code::IssueCodeCmd};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for yamdb - manages user accounts directly in the database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    IssueCode(IssueCodeCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::IssueCode(cmd) => cmd.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_user() {
        let config = CliConfig::try_parse_from([
            "yamdb-cli",
            "create-user",
            "--data-dir",
            "/tmp/yamdb",
            "--username",
            "boss",
            "--email",
            "boss@example.com",
            "--role",
            "admin",
            "--staff",
        ])
        .unwrap();
        assert!(matches!(config.command, Command::CreateUser(_)));
    }

    #[test]
    fn test_invalid_role() {
        let res = CliConfig::try_parse_from([
            "yamdb-cli",
            "create-user",
            "--username",
            "boss",
            "--email",
            "boss@example.com",
            "--role",
            "superuser",
        ]);
        assert!(res.is_err());
    }
}
