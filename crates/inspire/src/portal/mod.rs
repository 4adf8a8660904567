//! Access to the INSPIRE awards portal.
//!
//! The contact details page is an ASP.NET WebForms page. A [`PortalSession`]
//! walks it the way a browser would:
//! 1. GET the page and read the initial form state
//! 2. Post back the "School Details" radio button
//! 3. Post back a state to get its district dropdown
//! 4. Post back a district to get its school dropdown
//! 5. Submit a school to get its contact grid
//!
//! Every postback echoes the form state returned by the previous one, so a
//! session is strictly sequential.

mod client;
mod error;
pub mod form;
pub mod retry;

pub use client::InspireClient;
pub use error::FetchError;
pub use retry::{RateLimiter, RetryPolicy};

use crate::catalog::Region;
use async_trait::async_trait;

/// Element id of the district dropdown in postback responses.
pub const DISTRICT_DROPDOWN_ID: &str = "ctl00_ContentPlaceHolder1_ddlDist";
/// Element id of the school dropdown in postback responses.
pub const SCHOOL_DROPDOWN_ID: &str = "ctl00_ContentPlaceHolder1_ddlSchool";
/// Element id of the contact grid in submit responses.
pub const CONTACT_GRID_ID: &str = "ctl00_ContentPlaceHolder1_grdContactDtl";

/// Something that can open scraping sessions against the portal.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Opens a fresh session with its own cookies, already switched to
    /// school-details mode.
    async fn connect(&self) -> Result<Box<dyn PortalSession>, FetchError>;
}

/// One browser-like session on the contact details page.
#[async_trait]
pub trait PortalSession: Send + Sync {
    /// Selects a state and returns its districts in dropdown order.
    async fn select_state(&self, state_id: &str) -> Result<Vec<Region>, FetchError>;

    /// Selects a district of the currently selected state and returns its
    /// schools in dropdown order.
    async fn select_district(
        &self,
        state_id: &str,
        district_id: &str,
    ) -> Result<Vec<Region>, FetchError>;

    /// Submits a school and returns the raw response holding its contact grid.
    async fn fetch_contacts(
        &self,
        state_id: &str,
        district_id: &str,
        school_id: &str,
    ) -> Result<String, FetchError>;
}
