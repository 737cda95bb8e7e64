//! The month or year being viewed on the dashboard.

use serde::Deserialize;
use time::{Date, Month};

use crate::endpoints;

/// The years that can be viewed, the range of [Date].
pub const YEARS: std::ops::RangeInclusive<i32> = Date::MIN.year()..=Date::MAX.year();

/// Whether the dashboard shows a single month or a whole year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One calendar month.
    #[default]
    Month,
    /// One calendar year.
    Year,
}

impl Granularity {
    /// The value used for the `mode` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

/// A calendar month or year.
///
/// The month is kept for yearly periods so that switching back to the monthly
/// view returns to the same month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub granularity: Granularity,
    pub year: i32,
    pub month: Month,
}

impl Period {
    /// The period of `granularity` that contains `date`.
    pub fn containing(date: Date, granularity: Granularity) -> Self {
        Self {
            granularity,
            year: date.year(),
            month: date.month(),
        }
    }

    /// The prefix shared by the ISO dates in this period, "YYYY-MM" for a month or "YYYY" for a year.
    pub fn key(&self) -> String {
        match self.granularity {
            Granularity::Month => format!("{:04}-{:02}", self.year, self.month as u8),
            Granularity::Year => format!("{:04}", self.year),
        }
    }

    /// Whether `date` falls in this period, i.e. its "YYYY-MM-DD" form starts with [Period::key].
    pub fn contains(&self, date: Date) -> bool {
        match self.granularity {
            Granularity::Month => date.year() == self.year && date.month() == self.month,
            Granularity::Year => date.year() == self.year,
        }
    }

    /// The period `delta` months or years away from this one.
    ///
    /// Returns the period unchanged if the result would fall outside [YEARS].
    pub fn shift(&self, delta: i32) -> Self {
        let shifted = match self.granularity {
            Granularity::Month => {
                let months = i64::from(self.year) * 12
                    + (self.month as i64 - 1)
                    + i64::from(delta);

                i32::try_from(months.div_euclid(12))
                    .ok()
                    .map(|year| Self {
                        year,
                        month: Month::January.nth_next(months.rem_euclid(12) as u8),
                        ..*self
                    })
            }
            Granularity::Year => self
                .year
                .checked_add(delta)
                .map(|year| Self { year, ..*self }),
        };

        shifted
            .filter(|period| YEARS.contains(&period.year))
            .unwrap_or(*self)
    }

    /// The same month or year at a different granularity.
    pub fn with_granularity(&self, granularity: Granularity) -> Self {
        Self {
            granularity,
            ..*self
        }
    }

    /// The period as shown in the period selector, e.g. "2026年 10月" or "2026年".
    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Month => format!("{}年 {}月", self.year, self.month as u8),
            Granularity::Year => format!("{}年", self.year),
        }
    }

    /// How many monthly budgets fit in the period.
    pub fn budget_multiplier(&self) -> i64 {
        match self.granularity {
            Granularity::Month => 1,
            Granularity::Year => 12,
        }
    }

    /// The dashboard URL for this period.
    pub fn href(&self) -> String {
        format!(
            "{}?mode={}&year={}&month={}",
            endpoints::DASHBOARD_VIEW,
            self.granularity.as_str(),
            self.year,
            self.month as u8
        )
    }
}
