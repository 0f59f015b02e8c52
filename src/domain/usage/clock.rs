use chrono::{Local, NaiveDate};
use std::sync::Mutex;

/// Source of "today" for daily window comparisons
pub trait DateProvider: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date of the machine evaluating the request
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDateProvider;

impl DateProvider for LocalDateProvider {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable date, used to drive day rollovers deterministically
#[derive(Debug)]
pub struct FixedDateProvider {
    date: Mutex<NaiveDate>,
}

impl FixedDateProvider {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }
}

impl DateProvider for FixedDateProvider {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}
