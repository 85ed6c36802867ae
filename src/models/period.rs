use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Query window and truncation ceiling for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl Period {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if start > end {
            return Err(Error::Configuration(format!(
                "period start {} is after period end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}
