use std::path::PathBuf;

use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn confirmation_code(from: &str, username: &str, email: &str, code: &str) -> Self {
        Message {
            from: from.to_string(),
            to: email.to_string(),
            subject: "YaMDb confirmation code".to_string(),
            body: format!("Hello, {username}!\nYour API confirmation code: {code}\n"),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.from, self.to, self.subject, self.body
        )
    }
}

/// Out of band delivery of messages to users
#[derive(Debug, Clone)]
pub enum Mailer {
    /// Message is only written to log
    Log,
    /// Each message is stored as .eml file in given directory
    Outbox(PathBuf),
}

impl Mailer {
    pub async fn send(&self, message: &Message) -> std::io::Result<()> {
        match self {
            Mailer::Log => {
                info!(
                    to = %message.to,
                    subject = %message.subject,
                    "Mail delivered to log:\n{}",
                    message.body
                );
                Ok(())
            }
            Mailer::Outbox(dir) => {
                let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
                let file_name = format!("{stamp}-{}.eml", file_safe(&message.to));
                let path = dir.join(file_name);
                fs::write(&path, message.render()).await?;
                debug!("Mail for {} stored in {path:?}", message.to);
                Ok(())
            }
        }
    }
}

fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[tokio::test]
    #[traced_test]
    async fn test_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Mailer::Outbox(dir.path().to_path_buf());
        let msg = Message::confirmation_code(
            "admin@yamdb.local",
            "critic",
            "critic@example.com",
            "123456",
        );
        mailer.send(&msg).await.unwrap();

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        assert!(name.ends_with("critic@example.com.eml"));
        let content = std::fs::read_to_string(entry.path()).unwrap();
        assert!(content.contains("To: critic@example.com"));
        assert!(content.contains("123456"));
    }

    #[test]
    fn test_file_safe() {
        assert_eq!(file_safe("a b/c@d.e"), "a_b_c@d.e");
    }
}
