use crate::config::ScraperConfig;
use crate::job::JobController;
use std::sync::Arc;

/// State shared by every request handler.
pub struct AppState {
    /// Settings the server was started with
    pub config: ScraperConfig,
    /// The single scrape job and the region catalog it resolves against
    pub controller: Arc<JobController>,
}

impl AppState {
    pub fn new(config: ScraperConfig, controller: JobController) -> Self {
        Self {
            config,
            controller: Arc::new(controller),
        }
    }
}
