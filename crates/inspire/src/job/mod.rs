//! The scrape job controller.
//!
//! There is exactly one job per process. It is started by a request, runs in
//! the background, and is polled for progress; starting while it runs is
//! rejected rather than queued.
mod bundle;
mod error;
mod runner;
mod types;

pub use bundle::DownloadBundle;
pub use error::{DownloadError, JobError, StartError};
pub use types::{
    DistrictFailure, DistrictSelection, JobSnapshot, JobStatus, Progress, StartAccepted,
    StartRequest,
};

use crate::catalog::{self, Region, RegionCatalog};
use crate::config::ScraperConfig;
use crate::portal::{Portal, RetryPolicy};
use rand::Rng;
use runner::JobRun;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::Job;

/// Owns the single scrape job and its lifecycle.
pub struct JobController {
    portal: Arc<dyn Portal>,
    catalog: Arc<RegionCatalog>,
    retry: RetryPolicy,
    output_dir: PathBuf,
    job: Arc<RwLock<Job>>,
}

impl JobController {
    /// Creates an idle controller.
    pub fn new(portal: Arc<dyn Portal>, catalog: Arc<RegionCatalog>, config: &ScraperConfig) -> Self {
        Self {
            portal,
            catalog,
            retry: RetryPolicy::new(config.max_retries, config.rate_limit_delay()),
            output_dir: config.output_dir.clone(),
            job: Arc::new(RwLock::new(Job::default())),
        }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Districts of a state, discovering them from the portal if needed.
    pub async fn districts(&self, state: &Region) -> Result<Vec<Region>, crate::portal::FetchError> {
        self.catalog
            .districts(state, self.portal.as_ref(), &self.retry)
            .await
    }

    /// Validates a start request and launches the run in the background.
    ///
    /// # Returns
    /// * `Ok(StartAccepted)` - The run was spawned
    /// * `Err(StartError)` - The request was rejected; the job is unchanged
    pub async fn start(&self, request: StartRequest) -> Result<StartAccepted, StartError> {
        if self.job.read().await.status.is_running() {
            return Err(StartError::AlreadyRunning);
        }

        let state = self
            .catalog
            .state(&request.state_id)
            .cloned()
            .ok_or_else(|| StartError::InvalidState {
                state: request.state_id.clone(),
            })?;

        let selection = match request.district_ids {
            None => return Err(StartError::NoDistricts),
            Some(DistrictSelection::Only(keys)) if keys.is_empty() => {
                return Err(StartError::NoDistricts)
            }
            Some(selection) => selection,
        };

        let all = self
            .districts(&state)
            .await
            .map_err(|e| StartError::CatalogUnavailable {
                state: state.name.clone(),
                message: e.to_string(),
            })?;

        let districts = match selection {
            DistrictSelection::All => all,
            DistrictSelection::Only(keys) => catalog::select_districts(&all, &keys).map_err(
                |district| StartError::InvalidDistrict {
                    district,
                    state: state.name.clone(),
                },
            )?,
        };
        if districts.is_empty() {
            return Err(StartError::NoDistricts);
        }

        let run_id = generate_run_id();
        let cancel = CancellationToken::new();
        {
            // Re-check under the write lock: another start may have won while
            // the districts were being resolved.
            let mut job = self.job.write().await;
            if job.status.is_running() {
                return Err(StartError::AlreadyRunning);
            }
            *job = Job::begin(state.clone(), districts.clone(), cancel.clone());
        }

        info!(
            run_id = %run_id,
            state = %state.name,
            districts = districts.len(),
            "Scrape job accepted"
        );

        let accepted = StartAccepted {
            accepted: true,
            run_id: run_id.clone(),
            state: state.name.clone(),
            districts: districts.len(),
        };

        tokio::spawn(runner::supervise(JobRun {
            run_id,
            portal: self.portal.clone(),
            retry: self.retry,
            output_dir: self.output_dir.clone(),
            job: self.job.clone(),
            cancel,
            state,
            districts,
        }));

        Ok(accepted)
    }

    /// Current job state.
    pub async fn status(&self) -> JobSnapshot {
        self.job.read().await.snapshot()
    }

    /// Asks a running job to stop after the school it is working on.
    ///
    /// # Returns
    /// `true` if a running job was signalled, `false` if nothing was running.
    pub async fn cancel(&self) -> bool {
        let mut job = self.job.write().await;
        if !job.status.is_running() {
            return false;
        }

        job.cancel.cancel();
        job.cancel_requested = true;
        job.message = "Stopping after current school...".to_string();
        info!("Stop requested for running scrape");
        true
    }

    /// The output of the last finished job.
    ///
    /// Completed and cancelled jobs can be downloaded as long as they wrote at
    /// least one file.
    pub async fn download(&self) -> Result<DownloadBundle, DownloadError> {
        let (state_name, files) = {
            let job = self.job.read().await;
            match job.status {
                JobStatus::Running => return Err(DownloadError::NotReady),
                JobStatus::Completed | JobStatus::Cancelled if !job.files.is_empty() => (
                    job.state.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
                    job.files.clone(),
                ),
                _ => return Err(DownloadError::NoOutput),
            }
        };

        let output_dir = self.output_dir.clone();
        tokio::task::spawn_blocking(move || bundle::build(&output_dir, &state_name, &files))
            .await
            .map_err(|e| {
                warn!(error = %e, "Download packaging task failed");
                DownloadError::Io(std::io::Error::other(e.to_string()))
            })?
    }
}

/// Generates a short id tagging every log line of one run.
fn generate_run_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
