use std::sync::Arc;
use crate::domain::ports::{SessionExceptionRepository, SessionRepository};
use crate::domain::services::session_service::SessionService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
}

impl AppState {
    pub fn new(
        config: &Config,
        session_repo: Arc<dyn SessionRepository>,
        exception_repo: Arc<dyn SessionExceptionRepository>,
    ) -> Self {
        Self {
            session_service: Arc::new(SessionService::new(session_repo, exception_repo, config)),
        }
    }
}
