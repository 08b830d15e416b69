use crate::{
    error::{AppError, AppResult},
    models::{round2, CategoryAggregate, PartnerCategoryUsage, RecommendationEntry},
};

const CATEGORY_HEADERS: [&str; 7] = [
    "Conceptual_Group",
    "category",
    "total_earnings",
    "avg_earnings",
    "total_impressions",
    "EPI",
    "CTR",
];

fn number(value: f64) -> String {
    round2(value).to_string()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

fn category_fields(aggregate: &CategoryAggregate) -> Vec<String> {
    vec![
        aggregate.conceptual_group.clone().unwrap_or_default(),
        aggregate.category.clone(),
        number(aggregate.total_earnings),
        optional_number(aggregate.avg_earnings),
        aggregate.total_impressions.to_string(),
        optional_number(aggregate.epi),
        optional_number(aggregate.ctr),
    ]
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))
}

/// Category performance table, one row per (category, conceptual group)
pub fn categories_csv(categories: &[CategoryAggregate]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CATEGORY_HEADERS)?;
    for aggregate in categories {
        writer.write_record(category_fields(aggregate))?;
    }
    finish(writer)
}

/// Recommendations table: the category columns followed by `Domain`
pub fn recommendations_csv(entries: &[RecommendationEntry]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CATEGORY_HEADERS.into_iter().chain(["Domain"]))?;
    for entry in entries {
        let mut fields = category_fields(&entry.aggregate);
        fields.push(entry.domain.to_string());
        writer.write_record(fields)?;
    }
    finish(writer)
}

/// Per-category earnings for one partner
pub fn usage_csv(usage: &[PartnerCategoryUsage]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["category", "total_earnings"])?;
    for row in usage {
        writer.write_record([row.category.as_str(), &number(row.total_earnings)])?;
    }
    finish(writer)
}
