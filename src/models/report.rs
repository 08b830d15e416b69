use serde::Serialize;

use super::{CategoryAggregate, DateRange, PartnerCategoryUsage, RecommendationEntry};

/// Outcome of a report, distinguishing the valid empty states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Results are available
    Ready,
    /// No category data exists for the window
    NoData,
    /// The partner already uses every top category
    Saturated,
}

/// Headline figures over the cleaned category table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_earnings: f64,
    pub total_impressions: i64,
    pub partner_count: usize,
}

/// Partner selection list for a window
#[derive(Debug, Clone, Serialize)]
pub struct PartnerList {
    pub range: DateRange,
    pub partners: Vec<String>,
}

/// Category-level performance for a window
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOverview {
    pub range: DateRange,
    pub status: ReportStatus,
    pub summary: Summary,
    pub categories: Vec<CategoryAggregate>,
}

/// Domain-aware recommendations for one partner
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub range: DateRange,
    pub partner: Option<String>,
    pub status: ReportStatus,
    pub top_n: usize,
    pub summary: Summary,
    pub recommendations: Vec<RecommendationEntry>,
    pub in_domain_count: usize,
    pub out_of_domain_count: usize,
    pub partner_usage: Vec<PartnerCategoryUsage>,
    pub partner_groups: Vec<String>,
    /// False when the partner has no conceptual groups in the window
    pub groups_found: bool,
}

impl RecommendationReport {
    /// Report for a window without any category data
    pub fn no_data(range: DateRange, partner: Option<String>, top_n: usize) -> Self {
        Self {
            range,
            partner,
            status: ReportStatus::NoData,
            top_n,
            summary: Summary::default(),
            recommendations: Vec::new(),
            in_domain_count: 0,
            out_of_domain_count: 0,
            partner_usage: Vec::new(),
            partner_groups: Vec::new(),
            groups_found: false,
        }
    }
}
