//! HTTP implementation of [`Portal`] on top of `reqwest`.

use super::error::FetchError;
use super::form::{self, FormState, EVENT_VALIDATION, VIEWSTATE, VIEWSTATE_GENERATOR};
use super::retry::RateLimiter;
use super::{Portal, PortalSession, DISTRICT_DROPDOWN_ID, SCHOOL_DROPDOWN_ID};
use crate::catalog::Region;
use crate::config::ScraperConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, RequestBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

const MODE_FIELD: &str = "ctl00$ContentPlaceHolder1$rblSelect";
const MODE_TARGET: &str = "ctl00$ContentPlaceHolder1$rblSelect$2";
const SCHOOL_MODE: &str = "2";
const STATE_FIELD: &str = "ctl00$ContentPlaceHolder1$ddlState";
const DISTRICT_FIELD: &str = "ctl00$ContentPlaceHolder1$ddlDist";
const SCHOOL_FIELD: &str = "ctl00$ContentPlaceHolder1$ddlSchool";
const SUBMIT_TARGET: &str = "ctl00$ContentPlaceHolder1$btnSubmit";

/// Opens sessions against the live portal. All sessions share one rate limiter.
pub struct InspireClient {
    base_url: String,
    user_agent: String,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
}

impl InspireClient {
    /// Creates a client from the scraper configuration.
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout(),
            limiter: Arc::new(RateLimiter::new(config.rate_limit_delay())),
        }
    }

    fn build_http_client(&self) -> Result<Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        Client::builder()
            .cookie_store(true)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10).min(self.timeout))
            .timeout(self.timeout)
            .build()
            .map_err(|e| FetchError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })
    }
}

#[async_trait]
impl Portal for InspireClient {
    async fn connect(&self) -> Result<Box<dyn PortalSession>, FetchError> {
        let session = InspireSession {
            client: self.build_http_client()?,
            base_url: self.base_url.clone(),
            limiter: self.limiter.clone(),
            form: Mutex::new(FormState::default()),
        };

        info!(url = %self.base_url, "Opening portal session");
        let page = session.send(session.client.get(&session.base_url)).await?;
        session.set_form_state(FormState::from_html(&page)?);

        let delta = session.postback(MODE_TARGET, &[]).await?;
        session.set_form_state(FormState::from_delta(&delta)?);
        debug!("Switched portal to school details mode");

        Ok(Box::new(session))
    }
}

/// A live portal session. Holds the cookie jar and the latest form state.
struct InspireSession {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    form: Mutex<FormState>,
}

impl InspireSession {
    fn form_state(&self) -> FormState {
        self.form
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_form_state(&self, state: FormState) {
        *self
            .form
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Sends one request after waiting for the rate limiter.
    async fn send(&self, request: RequestBuilder) -> Result<String, FetchError> {
        self.limiter.acquire().await;

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Sends an async postback carrying the current form state plus `fields`.
    async fn postback(
        &self,
        event_target: &str,
        fields: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let state = self.form_state();

        let mut payload: Vec<(&str, &str)> = vec![
            ("__EVENTTARGET", event_target),
            ("__EVENTARGUMENT", ""),
            (VIEWSTATE, state.viewstate.as_str()),
            (VIEWSTATE_GENERATOR, state.viewstate_generator.as_str()),
            (EVENT_VALIDATION, state.event_validation.as_str()),
            ("__ASYNCPOST", "true"),
            (MODE_FIELD, SCHOOL_MODE),
        ];
        payload.extend_from_slice(fields);

        self.send(self.client.post(&self.base_url).form(&payload))
            .await
    }
}

#[async_trait]
impl PortalSession for InspireSession {
    async fn select_state(&self, state_id: &str) -> Result<Vec<Region>, FetchError> {
        let delta = self
            .postback(STATE_FIELD, &[(STATE_FIELD, state_id)])
            .await?;
        self.set_form_state(FormState::from_delta(&delta)?);

        let districts = form::dropdown_options(&delta, DISTRICT_DROPDOWN_ID);
        debug!(state_id, districts = districts.len(), "Selected state");
        Ok(districts)
    }

    async fn select_district(
        &self,
        state_id: &str,
        district_id: &str,
    ) -> Result<Vec<Region>, FetchError> {
        let delta = self
            .postback(
                DISTRICT_FIELD,
                &[(STATE_FIELD, state_id), (DISTRICT_FIELD, district_id)],
            )
            .await?;
        self.set_form_state(FormState::from_delta(&delta)?);

        let schools = form::dropdown_options(&delta, SCHOOL_DROPDOWN_ID);
        debug!(state_id, district_id, schools = schools.len(), "Selected district");
        Ok(schools)
    }

    async fn fetch_contacts(
        &self,
        state_id: &str,
        district_id: &str,
        school_id: &str,
    ) -> Result<String, FetchError> {
        // The submit response is not used to advance the form state: every
        // school of a district is submitted against the district's state.
        self.postback(
            SUBMIT_TARGET,
            &[
                (STATE_FIELD, state_id),
                (DISTRICT_FIELD, district_id),
                (SCHOOL_FIELD, school_id),
            ],
        )
        .await
    }
}
