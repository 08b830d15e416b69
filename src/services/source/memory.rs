use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{
        safe_ratio, CategoryAggregateRow, CategoryPartnerPair, DateRange, EventRecord,
        PartnerCategoryUsage,
    },
    services::source::EventSource,
};

/// Event source that aggregates a fixed set of event records in memory
///
/// Mirrors the SQL contract of [`super::PgEventSource`]: groups keep the
/// order in which they first appear, and the earnings sort is stable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSource {
    events: Vec<EventRecord>,
}

impl InMemoryEventSource {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    fn earning_events(&self, range: DateRange) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |e| range.contains(e.event_date) && e.est_earnings > 0.0)
    }

    fn partner_events<'a>(
        &'a self,
        range: DateRange,
        partner: &'a str,
    ) -> impl Iterator<Item = &'a EventRecord> {
        self.earning_events(range).filter(move |e| e.partner == partner)
    }
}

#[derive(Default)]
struct Totals {
    earnings: f64,
    rows: usize,
    impressions: i64,
    clicks: i64,
}

#[async_trait::async_trait]
impl EventSource for InMemoryEventSource {
    async fn category_aggregates(&self, range: DateRange) -> AppResult<Vec<CategoryAggregateRow>> {
        let mut order: Vec<(Option<&str>, Option<&str>)> = Vec::new();
        let mut totals: HashMap<(Option<&str>, Option<&str>), Totals> = HashMap::new();

        for event in self.earning_events(range) {
            let key = (event.category.as_deref(), event.conceptual_group.as_deref());
            let entry = totals.entry(key).or_insert_with(|| {
                order.push(key);
                Totals::default()
            });
            entry.earnings += event.est_earnings;
            entry.rows += 1;
            entry.impressions += event.uniq_impr;
            entry.clicks += event.paid_clicks;
        }

        let mut rows: Vec<CategoryAggregateRow> = order
            .into_iter()
            .filter_map(|key| totals.remove(&key).map(|t| (key, t)))
            .map(|((category, group), t)| CategoryAggregateRow {
                conceptual_group: group.map(str::to_string),
                category: category.map(str::to_string),
                total_earnings: Some(t.earnings),
                avg_earnings: Some(t.earnings / t.rows as f64),
                total_impressions: t.impressions,
                total_clicks: t.clicks,
                epi: safe_ratio(t.earnings, t.impressions as f64),
                ctr: safe_ratio(t.clicks as f64, t.impressions as f64),
            })
            .collect();

        rows.sort_by(|a, b| {
            let a = a.total_earnings.unwrap_or(0.0);
            let b = b.total_earnings.unwrap_or(0.0);
            b.total_cmp(&a)
        });

        Ok(rows)
    }

    async fn category_partner_pairs(
        &self,
        range: DateRange,
    ) -> AppResult<Vec<CategoryPartnerPair>> {
        let mut seen = HashSet::new();
        let pairs = self
            .earning_events(range)
            .map(|e| CategoryPartnerPair {
                category: e.category.clone(),
                partner: e.partner.clone(),
            })
            .filter(|pair| seen.insert(pair.clone()))
            .collect();
        Ok(pairs)
    }

    async fn partner_category_usage(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<Vec<PartnerCategoryUsage>> {
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for event in self.partner_events(range, partner) {
            if let Some(category) = event.category.as_deref() {
                *sums.entry(category).or_insert(0.0) += event.est_earnings;
            }
        }

        let mut usage: Vec<PartnerCategoryUsage> = sums
            .into_iter()
            .filter(|(_, total)| *total > 0.0)
            .map(|(category, total_earnings)| PartnerCategoryUsage {
                category: category.to_string(),
                total_earnings,
            })
            .collect();
        usage.sort_by(|a, b| {
            b.total_earnings
                .total_cmp(&a.total_earnings)
                .then_with(|| a.category.cmp(&b.category))
        });

        Ok(usage)
    }

    async fn partner_conceptual_groups(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<BTreeSet<String>> {
        Ok(self
            .partner_events(range, partner)
            .filter_map(|e| e.conceptual_group.clone())
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
