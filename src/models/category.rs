use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::round2;

/// One row of the `team_block_stats` event table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_date: NaiveDate,
    pub category: Option<String>,
    pub conceptual_group: Option<String>,
    pub partner: String,
    pub est_earnings: f64,
    pub uniq_impr: i64,
    pub paid_clicks: i64,
}

/// Per (category, conceptual group) aggregate as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CategoryAggregateRow {
    pub conceptual_group: Option<String>,
    pub category: Option<String>,
    pub total_earnings: Option<f64>,
    pub avg_earnings: Option<f64>,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub epi: Option<f64>,
    pub ctr: Option<f64>,
}

/// Category aggregate after cleaning: category and earnings are known
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub conceptual_group: Option<String>,
    pub category: String,
    pub total_earnings: f64,
    pub avg_earnings: Option<f64>,
    pub total_impressions: i64,
    pub total_clicks: i64,
    /// Earnings per impression, `None` when there were no impressions
    pub epi: Option<f64>,
    /// Click-through rate, `None` when there were no impressions
    pub ctr: Option<f64>,
}

impl CategoryAggregate {
    /// Copy with every fractional figure rounded to two decimals
    pub fn rounded(&self) -> Self {
        Self {
            total_earnings: round2(self.total_earnings),
            avg_earnings: self.avg_earnings.map(round2),
            epi: self.epi.map(round2),
            ctr: self.ctr.map(round2),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, sqlx::FromRow)]
pub struct CategoryPartnerPair {
    pub category: Option<String>,
    pub partner: String,
}

/// Earnings a single partner made on one category
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PartnerCategoryUsage {
    pub category: String,
    pub total_earnings: f64,
}

impl PartnerCategoryUsage {
    pub fn rounded(&self) -> Self {
        Self {
            category: self.category.clone(),
            total_earnings: round2(self.total_earnings),
        }
    }
}

/// Whether a category sits inside the partner's existing conceptual groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "In-Domain")]
    InDomain,
    #[serde(rename = "Out-of-Domain")]
    OutOfDomain,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::InDomain => "In-Domain",
            Domain::OutOfDomain => "Out-of-Domain",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-ranked category the partner does not use yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    #[serde(flatten)]
    pub aggregate: CategoryAggregate,
    pub domain: Domain,
}

impl RecommendationEntry {
    pub fn rounded(&self) -> Self {
        Self {
            aggregate: self.aggregate.rounded(),
            domain: self.domain,
        }
    }
}
