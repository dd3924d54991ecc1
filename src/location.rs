//! Last-known client location.

use std::sync::RwLock;

use tracing::info;

use crate::error::StoreError;
use crate::models::Location;

// ---

#[derive(Debug, Default)]
pub struct LocationStore {
    inner: RwLock<Location>,
}

impl LocationStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite both coordinates in one write and return the stored value.
    pub fn update(&self, latitude: f64, longitude: f64) -> Result<Location, StoreError> {
        // ---
        let mut current = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("location"))?;
        *current = Location::new(latitude, longitude);
        info!(latitude, longitude, "User location updated");
        Ok(*current)
    }

    pub fn get(&self) -> Result<Location, StoreError> {
        self.inner
            .read()
            .map(|loc| *loc)
            .map_err(|_| StoreError::LockPoisoned("location"))
    }
}
