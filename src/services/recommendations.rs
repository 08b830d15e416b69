use std::collections::{BTreeSet, HashSet};

use crate::{
    models::{CategoryAggregate, CategoryAggregateRow, PartnerCategoryUsage, RecommendationEntry},
    services::domain::classify,
};

/// Number of top-earning categories considered when looking for gaps
pub const DEFAULT_TOP_N: usize = 30;

/// Placeholder category value emitted upstream for unattributed traffic
const NONE_CATEGORY: &str = "none";

/// Drops rows that cannot be ranked or recommended
///
/// Rows without a category or total earnings are removed, as are rows whose
/// category is the literal "none" in any casing. Order is preserved.
pub fn clean_categories(rows: Vec<CategoryAggregateRow>) -> Vec<CategoryAggregate> {
    rows.into_iter()
        .filter_map(|row| {
            let category = row.category?;
            let total_earnings = row.total_earnings?;
            if category.eq_ignore_ascii_case(NONE_CATEGORY) {
                return None;
            }
            Some(CategoryAggregate {
                conceptual_group: row.conceptual_group,
                category,
                total_earnings,
                avg_earnings: row.avg_earnings,
                total_impressions: row.total_impressions,
                total_clicks: row.total_clicks,
                epi: row.epi,
                ctr: row.ctr,
            })
        })
        .collect()
}

/// Categories the partner already earns on
pub fn used_categories(usage: &[PartnerCategoryUsage]) -> HashSet<&str> {
    usage.iter().map(|u| u.category.as_str()).collect()
}

/// The `top_n` rows with the highest total earnings
///
/// The sort is stable, so rows with equal earnings keep the order the
/// source returned them in.
pub fn top_categories(categories: &[CategoryAggregate], top_n: usize) -> Vec<&CategoryAggregate> {
    let mut ranked: Vec<&CategoryAggregate> = categories.iter().collect();
    ranked.sort_by(|a, b| b.total_earnings.total_cmp(&a.total_earnings));
    ranked.truncate(top_n);
    ranked
}

/// Computes the domain-aware gap set for a partner
///
/// Takes the top `top_n` categories by total earnings, removes every
/// category in `used`, and labels what is left against the partner's
/// conceptual groups. The result keeps descending earnings order and is
/// empty when the partner already covers every top category.
pub fn recommend(
    categories: &[CategoryAggregate],
    used: &HashSet<&str>,
    partner_groups: &BTreeSet<String>,
    top_n: usize,
) -> Vec<RecommendationEntry> {
    top_categories(categories, top_n)
        .into_iter()
        .filter(|aggregate| !used.contains(aggregate.category.as_str()))
        .map(|aggregate| RecommendationEntry {
            domain: classify(aggregate.conceptual_group.as_deref(), partner_groups),
            aggregate: aggregate.clone(),
        })
        .collect()
}
