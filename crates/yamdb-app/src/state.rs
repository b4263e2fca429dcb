use std::sync::Arc;

use yamdb_auth::token::TokenManager;
use yamdb_dal::Pool;

use crate::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, tokens: TokenManager, mailer: Mailer) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                tokens,
                app_config,
                mailer,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }

    pub fn mailer(&self) -> &Mailer {
        &self.state.mailer
    }
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    app_config: AppConfig,
    mailer: Mailer,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_page_size: u32,
    /// Sender address of outgoing mail
    pub mail_from: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            mail_from: "noreply@yamdb.local".to_string(),
        }
    }
}
