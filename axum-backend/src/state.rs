use std::sync::Arc;

use dxf_generator::DxfGenerator;

use crate::auth::Credentials;
use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::session::SessionStore;

/// Shared by every handler through `State<Arc<AppState>>`
pub struct AppState {
    pub config: AppConfig,
    pub generator: DxfGenerator,
    pub history: Arc<dyn HistoryStore>,
    pub sessions: SessionStore,
    pub credentials: Credentials,
}

impl AppState {
    /// Creates the upload/output directories and hashes the account password
    pub fn new(
        config: AppConfig,
        generator: DxfGenerator,
        history: Arc<dyn HistoryStore>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.uploads_dir())?;
        std::fs::create_dir_all(config.converted_dir())?;

        let credentials = Credentials::new(config.admin_username.clone(), &config.admin_password)?;
        let sessions = SessionStore::new(config.session_idle_timeout);

        Ok(Self {
            config,
            generator,
            history,
            sessions,
            credentials,
        })
    }
}
