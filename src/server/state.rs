use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::postgres::PostgresPool;
use crate::template::EmailTemplateStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub template_store: Arc<dyn EmailTemplateStore>,
    pub postgres_pool: Option<Arc<PostgresPool>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        template_store: Arc<dyn EmailTemplateStore>,
        postgres_pool: Option<Arc<PostgresPool>>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            template_store,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
