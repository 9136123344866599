//! Source of "today" for streaks and challenge rotation.

use std::sync::Mutex;

use chrono::{Days, Local, NaiveDate};

/// Supplies the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// The local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A manually advanced clock.
#[derive(Debug)]
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Create a clock stuck at `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    /// Move to another date.
    pub fn set(&self, date: NaiveDate) {
        *self
            .date
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = date;
    }

    /// Move forward by `days`.
    pub fn advance(&self, days: u64) {
        let mut date = self
            .date
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(next) = date.checked_add_days(Days::new(days)) {
            *date = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self
            .date
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
