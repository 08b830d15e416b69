use sqlx::PgPool;
use std::collections::BTreeSet;

use crate::{
    error::AppResult,
    models::{CategoryAggregateRow, CategoryPartnerPair, DateRange, PartnerCategoryUsage},
    services::source::EventSource,
};

// All statements bind their parameters; nothing user-supplied is spliced
// into SQL text. Ratios are computed in double precision so integer
// columns do not truncate.

const CATEGORY_AGGREGATES_SQL: &str = r#"
    SELECT conceptual_group,
           category,
           SUM(est_earnings)::FLOAT8 AS total_earnings,
           AVG(est_earnings)::FLOAT8 AS avg_earnings,
           COALESCE(SUM(uniq_impr), 0)::INT8 AS total_impressions,
           COALESCE(SUM(paid_clicks), 0)::INT8 AS total_clicks,
           SUM(est_earnings)::FLOAT8 / NULLIF(SUM(uniq_impr), 0)::FLOAT8 AS epi,
           SUM(paid_clicks)::FLOAT8 / NULLIF(SUM(uniq_impr), 0)::FLOAT8 AS ctr
    FROM team_block_stats
    WHERE eventdate BETWEEN $1 AND $2
      AND est_earnings > 0
    GROUP BY category, conceptual_group
    ORDER BY total_earnings DESC
"#;

const CATEGORY_PARTNER_PAIRS_SQL: &str = r#"
    SELECT DISTINCT category, partner
    FROM team_block_stats
    WHERE eventdate BETWEEN $1 AND $2
      AND est_earnings > 0
"#;

const PARTNER_CATEGORY_USAGE_SQL: &str = r#"
    SELECT category,
           SUM(est_earnings)::FLOAT8 AS total_earnings
    FROM team_block_stats
    WHERE eventdate BETWEEN $1 AND $2
      AND partner = $3
      AND est_earnings > 0
      AND category IS NOT NULL
    GROUP BY category
    HAVING SUM(est_earnings) > 0
    ORDER BY total_earnings DESC, category
"#;

const PARTNER_CONCEPTUAL_GROUPS_SQL: &str = r#"
    SELECT DISTINCT conceptual_group
    FROM team_block_stats
    WHERE eventdate BETWEEN $1 AND $2
      AND partner = $3
      AND est_earnings > 0
      AND conceptual_group IS NOT NULL
"#;

/// Event source backed by the `team_block_stats` table in PostgreSQL
///
/// Each query checks a connection out of the pool for its own duration;
/// the pool takes it back whether the query succeeds or fails.
#[derive(Clone)]
pub struct PgEventSource {
    pool: PgPool,
}

impl PgEventSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventSource for PgEventSource {
    async fn category_aggregates(&self, range: DateRange) -> AppResult<Vec<CategoryAggregateRow>> {
        let rows = sqlx::query_as::<_, CategoryAggregateRow>(CATEGORY_AGGREGATES_SQL)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(range = %range, rows = rows.len(), "Fetched category aggregates");
        Ok(rows)
    }

    async fn category_partner_pairs(
        &self,
        range: DateRange,
    ) -> AppResult<Vec<CategoryPartnerPair>> {
        let rows = sqlx::query_as::<_, CategoryPartnerPair>(CATEGORY_PARTNER_PAIRS_SQL)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(range = %range, rows = rows.len(), "Fetched category/partner pairs");
        Ok(rows)
    }

    async fn partner_category_usage(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<Vec<PartnerCategoryUsage>> {
        let rows = sqlx::query_as::<_, PartnerCategoryUsage>(PARTNER_CATEGORY_USAGE_SQL)
            .bind(range.start())
            .bind(range.end())
            .bind(partner)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            range = %range,
            partner = %partner,
            rows = rows.len(),
            "Fetched partner category usage"
        );
        Ok(rows)
    }

    async fn partner_conceptual_groups(
        &self,
        range: DateRange,
        partner: &str,
    ) -> AppResult<BTreeSet<String>> {
        let groups = sqlx::query_scalar::<_, String>(PARTNER_CONCEPTUAL_GROUPS_SQL)
            .bind(range.start())
            .bind(range.end())
            .bind(partner)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            range = %range,
            partner = %partner,
            groups = groups.len(),
            "Fetched partner conceptual groups"
        );
        Ok(groups.into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_are_parameterized() {
        for sql in [
            CATEGORY_AGGREGATES_SQL,
            CATEGORY_PARTNER_PAIRS_SQL,
            PARTNER_CATEGORY_USAGE_SQL,
            PARTNER_CONCEPTUAL_GROUPS_SQL,
        ] {
            assert!(sql.contains("BETWEEN $1 AND $2"));
            assert!(sql.contains("est_earnings > 0"));
            assert!(!sql.contains('\''));
        }
        assert!(PARTNER_CATEGORY_USAGE_SQL.contains("partner = $3"));
        assert!(PARTNER_CONCEPTUAL_GROUPS_SQL.contains("partner = $3"));
    }

    #[test]
    fn test_ratios_use_null_safe_division() {
        assert_eq!(
            CATEGORY_AGGREGATES_SQL.matches("NULLIF(SUM(uniq_impr), 0)").count(),
            2
        );
    }
}
