use chrono::{Local, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today" for stamping PDFs and the announcement.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn today_string(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
