//! The background scrape run.
//!
//! A run walks the targeted districts in catalog order on one portal session:
//! select district → submit each school → extract contacts → append to the
//! district file. One request is in flight at a time.

use super::error::JobError;
use super::types::{DistrictFailure, Job, JobStatus};
use crate::catalog::Region;
use crate::portal::{Portal, PortalSession, RetryPolicy};
use crate::records::{district_file_path, extract_contacts, CsvSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RunOutcome {
    Completed,
    Cancelled,
}

/// Everything a run needs, owned so it can move into its task.
pub(super) struct JobRun {
    pub run_id: String,
    pub portal: Arc<dyn Portal>,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
    pub job: Arc<RwLock<Job>>,
    pub cancel: CancellationToken,
    pub state: Region,
    pub districts: Vec<Region>,
}

/// Runs the job in its own task and records how it ended.
///
/// Errors and panics inside the run both end up as a `failed` job.
pub(super) async fn supervise(run: JobRun) {
    let job_state = run.job.clone();
    let run_id = run.run_id.clone();
    let start = Instant::now();

    let outcome = tokio::spawn(run.execute()).await;

    let mut job = job_state.write().await;
    let files = job.files.len();
    let cancel_requested = job.cancel_requested;
    let outcome = outcome.map(|r| r.map(|o| settle(o, cancel_requested)));
    match outcome {
        Ok(Ok(RunOutcome::Completed)) => {
            info!(
                run_id = %run_id,
                records = job.records_written,
                files,
                failed_districts = job.failed_districts.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Scrape completed"
            );
            let message = format!("Scraping completed! {} files generated.", files);
            job.finish(JobStatus::Completed, message, None);
        }
        Ok(Ok(RunOutcome::Cancelled)) => {
            info!(
                run_id = %run_id,
                records = job.records_written,
                files,
                "Scrape cancelled"
            );
            let message = format!("Scraping stopped. {} files saved.", files);
            job.finish(JobStatus::Cancelled, message, None);
        }
        Ok(Err(e)) => {
            error!(run_id = %run_id, error = %e, "Scrape failed");
            job.finish(JobStatus::Failed, format!("Error: {}", e), Some(e.to_string()));
        }
        Err(e) => {
            error!(run_id = %run_id, error = %e, "Scrape task aborted");
            let reason = "Scrape task aborted unexpectedly".to_string();
            job.finish(JobStatus::Failed, format!("Error: {}", reason), Some(reason));
        }
    }
}

/// A stop acknowledged after the last school but before the job was marked
/// finished still ends the job as cancelled.
fn settle(outcome: RunOutcome, cancel_requested: bool) -> RunOutcome {
    if cancel_requested {
        RunOutcome::Cancelled
    } else {
        outcome
    }
}

impl JobRun {
    async fn update(&self, f: impl FnOnce(&mut Job)) {
        let mut job = self.job.write().await;
        f(&mut job);
    }

    async fn execute(self) -> Result<RunOutcome, JobError> {
        info!(
            run_id = %self.run_id,
            state = %self.state.name,
            districts = self.districts.len(),
            "Starting scrape"
        );

        let portal = self.portal.as_ref();
        let session = self
            .retry
            .run("open session", move || portal.connect())
            .await
            .map_err(|source| JobError::Session {
                step: "initialize scraper",
                source,
            })?;
        let session = session.as_ref();

        let state_name = self.state.name.as_str();
        self.update(|job| job.message = format!("Processing state: {}", state_name))
            .await;

        // Selecting the state moves the portal's form to the district level
        // even though the district list is already known.
        let state_id = self.state.id.as_str();
        self.retry
            .run("select state", move || session.select_state(state_id))
            .await
            .map_err(|source| JobError::Session {
                step: "select state",
                source,
            })?;

        for district in &self.districts {
            if self.cancel.is_cancelled() {
                info!(run_id = %self.run_id, "Stop requested, skipping remaining districts");
                return Ok(RunOutcome::Cancelled);
            }

            if self.scrape_district(session, district).await? == RunOutcome::Cancelled {
                return Ok(RunOutcome::Cancelled);
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Scrapes one district into its own file.
    ///
    /// A district whose school list can't be fetched is recorded as failed
    /// and skipped; a school whose contacts can't be fetched is counted and
    /// skipped. Only write errors abort the run.
    async fn scrape_district(
        &self,
        session: &dyn PortalSession,
        district: &Region,
    ) -> Result<RunOutcome, JobError> {
        self.update(|job| {
            job.current_district = Some(district.name.clone());
            job.current_school = None;
            job.schools_done = 0;
            job.schools_total = 0;
            job.message = format!("Processing district: {}", district.name);
        })
        .await;

        let state_id = self.state.id.as_str();
        let district_id = district.id.as_str();
        let schools = match self
            .retry
            .run("select district", move || {
                session.select_district(state_id, district_id)
            })
            .await
        {
            Ok(schools) => schools,
            Err(e) => {
                warn!(
                    run_id = %self.run_id,
                    district = %district.name,
                    error = %e,
                    "Failed to get schools, skipping district"
                );
                self.update(|job| {
                    job.failed_districts.push(DistrictFailure {
                        district: district.name.clone(),
                        error: e.to_string(),
                    });
                    job.districts_done += 1;
                })
                .await;
                return Ok(RunOutcome::Completed);
            }
        };

        let mut sink = CsvSink::create(&self.output_dir, &self.state.name, &district.name)
            .map_err(|source| JobError::Write {
                path: district_file_path(&self.output_dir, &self.state.name, &district.name)
                    .display()
                    .to_string(),
                source,
            })?;

        let total = schools.len();
        self.update(|job| {
            job.schools_total = total;
            job.files.push(sink.path().to_path_buf());
        })
        .await;

        for (index, school) in schools.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    run_id = %self.run_id,
                    district = %district.name,
                    rows = sink.rows(),
                    "Stop requested, keeping rows written so far"
                );
                return Ok(RunOutcome::Cancelled);
            }

            self.update(|job| {
                job.current_school = Some(school.name.clone());
                job.message = format!("Scraping school {}/{}: {}", index + 1, total, school.name);
            })
            .await;

            let school_id = school.id.as_str();
            let text = match self
                .retry
                .run("fetch contacts", move || {
                    session.fetch_contacts(state_id, district_id, school_id)
                })
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        run_id = %self.run_id,
                        school = %school.name,
                        error = %e,
                        "Failed to scrape school"
                    );
                    self.update(|job| {
                        job.failed_schools += 1;
                        job.schools_done = index + 1;
                    })
                    .await;
                    continue;
                }
            };

            let records = extract_contacts(&text, &self.state.name, &district.name, &school.name);
            for record in &records {
                sink.append(record).map_err(|source| JobError::Write {
                    path: sink.path().display().to_string(),
                    source,
                })?;
            }

            let written = records.len() as u64;
            self.update(|job| {
                job.records_written += written;
                job.schools_done = index + 1;
            })
            .await;
        }

        info!(
            run_id = %self.run_id,
            district = %district.name,
            schools = total,
            rows = sink.rows(),
            path = %sink.path().display(),
            "District finished"
        );
        self.update(|job| job.districts_done += 1).await;

        Ok(RunOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledged_stop_wins_over_completion() {
        assert_eq!(settle(RunOutcome::Completed, true), RunOutcome::Cancelled);
        assert_eq!(settle(RunOutcome::Cancelled, true), RunOutcome::Cancelled);
        assert_eq!(settle(RunOutcome::Completed, false), RunOutcome::Completed);
    }
}
