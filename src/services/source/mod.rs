//! Event data source abstraction
//!
//! The recommendation engine never talks to a database directly. It consumes
//! the four windowed aggregate reads below, which the Postgres store and the
//! in-memory store both implement with identical semantics.

use std::collections::BTreeSet;

use crate::{
    error::AppResult,
    models::{CategoryAggregateRow, CategoryPartnerPair, DateRange, PartnerCategoryUsage},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEventSource;
pub use postgres::PgEventSource;

/// Read-only aggregate queries over the event table
///
/// Every query only considers rows inside the inclusive window with
/// strictly positive earnings. Implementations must not keep state between
/// calls; the four reads are independent and may run concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Aggregates grouped by (category, conceptual group), ordered by total
    /// earnings descending
    async fn category_aggregates(&self, range: DateRange) -> AppResult<Vec<CategoryAggregateRow>>;

    /// Distinct (category, partner) pairs
    async fn category_partner_pairs(&self, range: DateRange)
        -> AppResult<Vec<CategoryPartnerPair>>;

    /// Summed earnings per non-null category for one partner, keeping only
    /// strictly positive sums
    async fn partner_category_usage(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<Vec<PartnerCategoryUsage>>;

    /// Distinct non-null conceptual groups for one partner
    async fn partner_conceptual_groups(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<BTreeSet<String>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}
