//! Scraper and web API for the public school contact details published on
//! the INSPIRE awards portal.
//!
//! A single background job walks the portal's state → district → school
//! dropdowns and writes one CSV file per district under the output directory.

pub mod catalog;
pub mod config;
pub mod job;
pub mod portal;
pub mod records;
pub mod server;
pub mod types;
