use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "today" for the store.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in the local time zone at the moment of the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_KEY_FORMAT)
        .map_err(|_| anyhow!("Could not parse date key: {}", input))
}
