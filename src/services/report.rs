use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{
        round2, CategoryAggregate, CategoryOverview, CategoryPartnerPair, Domain, PartnerList,
        RecommendationReport, ReportStatus, Summary, WindowParams,
    },
    services::{
        recommendations::{self, DEFAULT_TOP_N},
        source::EventSource,
    },
};

/// Knobs shared by every report
#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub top_n: usize,
    pub default_window_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            default_window_days: 7,
        }
    }
}

/// Window plus optional partner, as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub partner: Option<String>,
}

impl ReportParams {
    pub fn window(&self) -> WindowParams {
        WindowParams {
            start: self.start,
            end: self.end,
        }
    }

    fn partner(&self) -> AppResult<Option<&str>> {
        match self.partner.as_deref().map(str::trim) {
            Some("") => Err(AppError::InvalidInput(
                "partner cannot be empty".to_string(),
            )),
            other => Ok(other),
        }
    }
}

/// Sorted distinct partners seen in the window
fn distinct_partners(pairs: &[CategoryPartnerPair]) -> Vec<String> {
    pairs
        .iter()
        .map(|p| p.partner.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn summarize(categories: &[CategoryAggregate], partner_count: usize) -> Summary {
    Summary {
        total_earnings: round2(categories.iter().map(|c| c.total_earnings).sum()),
        total_impressions: categories.iter().map(|c| c.total_impressions).sum(),
        partner_count,
    }
}

/// Partner selection list for the window
pub async fn partner_list(
    source: &dyn EventSource,
    window: &WindowParams,
    settings: &ReportSettings,
    today: NaiveDate,
) -> AppResult<PartnerList> {
    let range = window.resolve(today, settings.default_window_days)?;
    let pairs = source.category_partner_pairs(range).await?;
    let partners = distinct_partners(&pairs);

    tracing::info!(
        range = %range,
        source = source.name(),
        partners = partners.len(),
        "Partner list loaded"
    );

    Ok(PartnerList { range, partners })
}

/// Category-level performance table and headline figures for the window
pub async fn category_overview(
    source: &dyn EventSource,
    window: &WindowParams,
    settings: &ReportSettings,
    today: NaiveDate,
) -> AppResult<CategoryOverview> {
    let range = window.resolve(today, settings.default_window_days)?;
    let (rows, pairs) = tokio::try_join!(
        source.category_aggregates(range),
        source.category_partner_pairs(range)
    )?;

    let categories = recommendations::clean_categories(rows);
    let status = if categories.is_empty() {
        tracing::info!(range = %range, "No category data for window");
        ReportStatus::NoData
    } else {
        ReportStatus::Ready
    };

    Ok(CategoryOverview {
        range,
        status,
        summary: summarize(&categories, distinct_partners(&pairs).len()),
        categories: categories.iter().map(CategoryAggregate::rounded).collect(),
    })
}

/// Domain-aware recommendations for one partner
///
/// The window is validated before any query is issued. When no partner is
/// requested, the first partner of the window in sorted order is used. The
/// four aggregate reads run concurrently; any data source failure aborts
/// the whole report.
pub async fn recommendation_report(
    source: &dyn EventSource,
    params: &ReportParams,
    settings: &ReportSettings,
    today: NaiveDate,
) -> AppResult<RecommendationReport> {
    let range = params
        .window()
        .resolve(today, settings.default_window_days)?;
    let requested = params.partner()?;
    let top_n = settings.top_n;
    let started = Instant::now();

    tracing::info!(
        range = %range,
        partner = ?requested,
        top_n,
        source = source.name(),
        "Building recommendation report"
    );

    let (rows, pairs, partner, usage, groups) = match requested {
        Some(partner) => {
            let (rows, pairs, usage, groups) = tokio::try_join!(
                source.category_aggregates(range),
                source.category_partner_pairs(range),
                source.partner_category_usage(range, partner),
                source.partner_conceptual_groups(range, partner)
            )?;
            (rows, pairs, Some(partner.to_string()), usage, groups)
        }
        None => {
            let (rows, pairs) = tokio::try_join!(
                source.category_aggregates(range),
                source.category_partner_pairs(range)
            )?;
            match distinct_partners(&pairs).into_iter().next() {
                Some(partner) => {
                    let (usage, groups) = tokio::try_join!(
                        source.partner_category_usage(range, &partner),
                        source.partner_conceptual_groups(range, &partner)
                    )?;
                    (rows, pairs, Some(partner), usage, groups)
                }
                None => (rows, pairs, None, Vec::new(), BTreeSet::new()),
            }
        }
    };

    let categories = recommendations::clean_categories(rows);
    if categories.is_empty() {
        tracing::info!(range = %range, "No category data for window");
        return Ok(RecommendationReport::no_data(range, partner, top_n));
    }

    let partners = distinct_partners(&pairs);
    let partner = match partner {
        Some(p) if partners.binary_search(&p).is_ok() => p,
        Some(p) => return Err(AppError::UnknownPartner(p)),
        None => return Ok(RecommendationReport::no_data(range, None, top_n)),
    };

    if groups.is_empty() {
        tracing::warn!(partner = %partner, range = %range, "No conceptual groups found for partner");
    }

    let used = recommendations::used_categories(&usage);
    let entries = recommendations::recommend(&categories, &used, &groups, top_n);

    let status = if entries.is_empty() {
        tracing::info!(partner = %partner, "Partner already uses all top categories");
        ReportStatus::Saturated
    } else {
        ReportStatus::Ready
    };

    let in_domain_count = entries
        .iter()
        .filter(|e| e.domain == Domain::InDomain)
        .count();
    let out_of_domain_count = entries.len() - in_domain_count;

    tracing::info!(
        partner = %partner,
        recommendations = entries.len(),
        in_domain = in_domain_count,
        out_of_domain = out_of_domain_count,
        processing_time_ms = started.elapsed().as_millis(),
        "Recommendation report built"
    );

    Ok(RecommendationReport {
        range,
        status,
        top_n,
        summary: summarize(&categories, partners.len()),
        recommendations: entries.iter().map(|e| e.rounded()).collect(),
        in_domain_count,
        out_of_domain_count,
        partner_usage: usage.iter().map(|u| u.rounded()).collect(),
        groups_found: !groups.is_empty(),
        partner_groups: groups.into_iter().collect(),
        partner: Some(partner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryAggregateRow, PartnerCategoryUsage};
    use crate::services::source::MockEventSource;
    use tokio_test::{assert_err, assert_ok};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn params(start: u32, end: u32, partner: Option<&str>) -> ReportParams {
        ReportParams {
            start: Some(date(start)),
            end: Some(date(end)),
            partner: partner.map(str::to_string),
        }
    }

    fn row(category: &str, group: &str, earnings: f64) -> CategoryAggregateRow {
        CategoryAggregateRow {
            conceptual_group: Some(group.to_string()),
            category: Some(category.to_string()),
            total_earnings: Some(earnings),
            avg_earnings: Some(earnings / 2.0),
            total_impressions: 100,
            total_clicks: 3,
            epi: Some(earnings / 100.0),
            ctr: Some(0.03),
        }
    }

    fn pair(category: &str, partner: &str) -> CategoryPartnerPair {
        CategoryPartnerPair {
            category: Some(category.to_string()),
            partner: partner.to_string(),
        }
    }

    fn usage(category: &str, earnings: f64) -> PartnerCategoryUsage {
        PartnerCategoryUsage {
            category: category.to_string(),
            total_earnings: earnings,
        }
    }

    /// Mock with every query answered from fixed data
    fn populated_source(groups: &'static [&'static str]) -> MockEventSource {
        let mut source = MockEventSource::new();
        source.expect_name().return_const("mock");
        source.expect_category_aggregates().returning(|_| {
            Ok(vec![
                row("Loans", "Finance", 100.0),
                row("Hotels", "Travel", 80.0),
                row("none", "Misc", 70.0),
                row("Insurance", "Finance", 50.0),
            ])
        });
        source.expect_category_partner_pairs().returning(|_| {
            Ok(vec![
                pair("Loans", "globex"),
                pair("Loans", "acme"),
                pair("Hotels", "globex"),
            ])
        });
        source
            .expect_partner_category_usage()
            .returning(|_, _| Ok(vec![usage("Loans", 40.0)]));
        source
            .expect_partner_conceptual_groups()
            .returning(move |_, _| Ok(groups.iter().map(|g| g.to_string()).collect()));
        source
    }

    #[tokio::test]
    async fn test_invalid_range_issues_no_query() {
        // No expectations: any query would panic the mock.
        let source = MockEventSource::new();
        let settings = ReportSettings::default();

        let result =
            recommendation_report(&source, &params(10, 1, Some("acme")), &settings, date(20))
                .await;
        assert!(matches!(result, Err(AppError::InvalidRange { .. })));

        let window = params(10, 1, None).window();
        assert_err!(category_overview(&source, &window, &settings, date(20)).await);
        assert_err!(partner_list(&source, &window, &settings, date(20)).await);
    }

    #[tokio::test]
    async fn test_empty_partner_is_rejected_before_io() {
        let source = MockEventSource::new();
        let result = recommendation_report(
            &source,
            &params(1, 10, Some("  ")),
            &ReportSettings::default(),
            date(20),
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_report_for_partner() {
        let source = populated_source(&["Finance"]);
        let report = assert_ok!(
            recommendation_report(
                &source,
                &params(1, 10, Some("acme")),
                &ReportSettings::default(),
                date(20),
            )
            .await
        );

        assert_eq!(report.status, ReportStatus::Ready);
        assert_eq!(report.partner.as_deref(), Some("acme"));
        let names: Vec<&str> = report
            .recommendations
            .iter()
            .map(|e| e.aggregate.category.as_str())
            .collect();
        assert_eq!(names, vec!["Hotels", "Insurance"]);
        assert_eq!(report.recommendations[0].domain, Domain::OutOfDomain);
        assert_eq!(report.recommendations[1].domain, Domain::InDomain);
        assert_eq!(report.in_domain_count, 1);
        assert_eq!(report.out_of_domain_count, 1);
        assert_eq!(report.summary.total_earnings, 230.0);
        assert_eq!(report.summary.partner_count, 2);
        assert!(report.groups_found);
    }

    #[tokio::test]
    async fn test_missing_partner_defaults_to_first_sorted() {
        let source = populated_source(&[]);
        let report = assert_ok!(
            recommendation_report(
                &source,
                &params(1, 10, None),
                &ReportSettings::default(),
                date(20),
            )
            .await
        );
        assert_eq!(report.partner.as_deref(), Some("acme"));
        assert!(!report.groups_found);
        assert!(report
            .recommendations
            .iter()
            .all(|e| e.domain == Domain::OutOfDomain));
    }

    #[tokio::test]
    async fn test_unknown_partner_is_an_error() {
        let source = populated_source(&["Finance"]);
        let result = recommendation_report(
            &source,
            &params(1, 10, Some("initech")),
            &ReportSettings::default(),
            date(20),
        )
        .await;
        assert!(matches!(result, Err(AppError::UnknownPartner(p)) if p == "initech"));
    }

    #[tokio::test]
    async fn test_saturated_partner_status() {
        let source = populated_source(&["Finance"]);
        let settings = ReportSettings {
            top_n: 1,
            default_window_days: 7,
        };
        let report = assert_ok!(
            recommendation_report(&source, &params(1, 10, Some("acme")), &settings, date(20))
                .await
        );
        assert_eq!(report.status, ReportStatus::Saturated);
        assert!(report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_reports_no_data() {
        let mut source = MockEventSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_category_aggregates()
            .returning(|_| Ok(Vec::new()));
        source
            .expect_category_partner_pairs()
            .returning(|_| Ok(Vec::new()));
        source
            .expect_partner_category_usage()
            .returning(|_, _| Ok(Vec::new()));
        source
            .expect_partner_conceptual_groups()
            .returning(|_, _| Ok(BTreeSet::new()));

        let report = assert_ok!(
            recommendation_report(
                &source,
                &params(1, 10, Some("acme")),
                &ReportSettings::default(),
                date(20),
            )
            .await
        );
        assert_eq!(report.status, ReportStatus::NoData);
        assert!(report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_data_source_failure_propagates() {
        let mut source = MockEventSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_category_aggregates()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        source
            .expect_category_partner_pairs()
            .returning(|_| Ok(Vec::new()));
        source
            .expect_partner_category_usage()
            .returning(|_, _| Ok(Vec::new()));
        source
            .expect_partner_conceptual_groups()
            .returning(|_, _| Ok(BTreeSet::new()));

        let err = recommendation_report(
            &source,
            &params(1, 10, Some("acme")),
            &ReportSettings::default(),
            date(20),
        )
        .await
        .unwrap_err();
        assert!(err.is_data_source_failure());
    }

    #[tokio::test]
    async fn test_category_overview_rounds_and_summarizes() {
        let mut source = MockEventSource::new();
        source.expect_category_aggregates().returning(|_| {
            Ok(vec![
                row("Loans", "Finance", 10.126),
                CategoryAggregateRow {
                    category: None,
                    ..row("x", "Misc", 5.0)
                },
            ])
        });
        source
            .expect_category_partner_pairs()
            .returning(|_| Ok(vec![pair("Loans", "acme")]));

        let overview = assert_ok!(
            category_overview(
                &source,
                &params(1, 10, None).window(),
                &ReportSettings::default(),
                date(20),
            )
            .await
        );
        assert_eq!(overview.status, ReportStatus::Ready);
        assert_eq!(overview.categories.len(), 1);
        assert_eq!(overview.categories[0].total_earnings, 10.13);
        assert_eq!(overview.summary.partner_count, 1);
    }

    #[tokio::test]
    async fn test_partner_list_is_sorted_and_distinct() {
        let mut source = MockEventSource::new();
        source.expect_name().return_const("mock");
        source.expect_category_partner_pairs().returning(|_| {
            Ok(vec![
                pair("Loans", "globex"),
                pair("Hotels", "acme"),
                pair("Loans", "acme"),
            ])
        });

        let list = assert_ok!(
            partner_list(
                &source,
                &params(1, 10, None).window(),
                &ReportSettings::default(),
                date(20),
            )
            .await
        );
        assert_eq!(list.partners, vec!["acme", "globex"]);
    }
}
