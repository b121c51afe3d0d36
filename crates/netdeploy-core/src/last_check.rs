use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// In-memory time of the last successful update check.
///
/// Starts at construction time and only moves forward. Nothing is persisted
/// across process restarts.
#[derive(Debug)]
pub struct LastCheck {
    at: Mutex<DateTime<Utc>>,
}

impl LastCheck {
    #[must_use]
    pub fn starting_now() -> Self {
        Self::starting_at(Utc::now())
    }

    #[must_use]
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self { at: Mutex::new(at) }
    }

    #[must_use]
    pub fn get(&self) -> DateTime<Utc> {
        *self.at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_success(&self) {
        self.record_success_at(Utc::now());
    }

    pub fn record_success_at(&self, at: DateTime<Utc>) {
        let mut current = self.at.lock().unwrap_or_else(PoisonError::into_inner);
        if at > *current {
            *current = at;
        }
    }
}

impl Default for LastCheck {
    fn default() -> Self {
        Self::starting_now()
    }
}
