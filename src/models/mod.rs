use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub mod category;
pub mod report;

pub use category::{
    CategoryAggregate, CategoryAggregateRow, CategoryPartnerPair, Domain, EventRecord,
    PartnerCategoryUsage, RecommendationEntry,
};
pub use report::{CategoryOverview, PartnerList, RecommendationReport, ReportStatus, Summary};

/// Closed calendar window `[start, end]`, inclusive on both ends
///
/// Can only be built through [`DateRange::new`], so every value in
/// circulation satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `days` days ending on `end`
    pub fn trailing(end: NaiveDate, days: u32) -> AppResult<Self> {
        let start = end
            .checked_sub_days(chrono::Days::new(u64::from(days)))
            .ok_or_else(|| AppError::InvalidInput(format!("window of {} days underflows", days)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Window selection as sent by clients; either bound may be omitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl WindowParams {
    /// Fills missing bounds relative to `today` and validates the result
    ///
    /// A missing end defaults to `today`; a missing start defaults to
    /// `default_days` before the end.
    pub fn resolve(&self, today: NaiveDate, default_days: u32) -> AppResult<DateRange> {
        let end = self.end.unwrap_or(today);
        match self.start {
            Some(start) => DateRange::new(start, end),
            None => DateRange::trailing(end, default_days),
        }
    }
}

/// Ratio that is undefined when the denominator is zero
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Rounds to two decimal places for display and export
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
