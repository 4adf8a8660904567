//! State and district catalog.
//!
//! States are fixed. District lists come from the portal's own dropdown and
//! are cached per state for the life of the process; they can also be seeded
//! from a JSON file so the server works without a first round-trip.
mod states;

use crate::portal::{FetchError, Portal, RetryPolicy};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// A state or a district: the portal's option value and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// True if `key` is this region's id, or its name ignoring case.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        self.id == key || self.name.eq_ignore_ascii_case(key)
    }
}

/// Errors raised while seeding the catalog from a file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only state table plus a lazily filled district cache.
pub struct RegionCatalog {
    states: Vec<Region>,
    districts: DashMap<String, Vec<Region>>,
}

impl RegionCatalog {
    /// Creates a catalog of all portal states with no districts cached yet.
    pub fn new() -> Self {
        Self {
            states: states::STATES
                .iter()
                .map(|(id, name)| Region::new(*id, *name))
                .collect(),
            districts: DashMap::new(),
        }
    }

    /// Seeds district lists from a JSON file mapping state ids to
    /// `[{id, name}]` arrays. Unknown state ids are skipped.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of states whose districts were loaded
    pub fn load_districts_file(&self, path: &Path) -> Result<usize, CatalogError> {
        let content = fs::read_to_string(path)?;
        let entries: HashMap<String, Vec<Region>> = serde_json::from_str(&content)?;

        let mut loaded = 0;
        for (state_id, districts) in entries {
            let Some(state) = self.state(&state_id) else {
                warn!(state_id = %state_id, "Skipping districts for unknown state");
                continue;
            };
            self.insert_districts(&state.id, districts);
            loaded += 1;
        }

        info!(states = loaded, path = %path.display(), "Seeded district catalog");
        Ok(loaded)
    }

    /// All states in portal order.
    pub fn states(&self) -> &[Region] {
        &self.states
    }

    /// Looks a state up by id or by name.
    pub fn state(&self, key: &str) -> Option<&Region> {
        self.states.iter().find(|s| s.matches(key))
    }

    /// Districts of a state, if they are already known.
    pub fn cached_districts(&self, state_id: &str) -> Option<Vec<Region>> {
        self.districts.get(state_id).map(|d| d.clone())
    }

    pub fn insert_districts(&self, state_id: &str, districts: Vec<Region>) {
        self.districts.insert(state_id.to_string(), districts);
    }

    /// Districts of a state, asking the portal on a cache miss.
    ///
    /// An empty answer from the portal is returned but not cached, so the
    /// next call asks again.
    pub async fn districts(
        &self,
        state: &Region,
        portal: &dyn Portal,
        retry: &RetryPolicy,
    ) -> Result<Vec<Region>, FetchError> {
        if let Some(cached) = self.cached_districts(&state.id) {
            return Ok(cached);
        }

        info!(state = %state.name, "Discovering districts from portal");
        let session = retry.run("open session", move || portal.connect()).await?;
        let session = session.as_ref();
        let state_id = state.id.as_str();
        let districts = retry
            .run("select state", move || session.select_state(state_id))
            .await?;

        if !districts.is_empty() {
            self.insert_districts(&state.id, districts.clone());
        }
        Ok(districts)
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the districts named by `keys` (ids or names) out of `all`, keeping
/// catalog order.
///
/// # Returns
/// * `Ok(Vec<Region>)` - The selected districts
/// * `Err(String)` - The first key that matches no district
pub fn select_districts(all: &[Region], keys: &[String]) -> Result<Vec<Region>, String> {
    if let Some(unknown) = keys.iter().find(|k| !all.iter().any(|d| d.matches(k))) {
        return Err(unknown.clone());
    }

    Ok(all
        .iter()
        .filter(|d| keys.iter().any(|k| d.matches(k)))
        .cloned()
        .collect())
}
