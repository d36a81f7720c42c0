//! Quality aggregations over stored manufacturing documents.
//!
//! Every report takes the documents already loaded from the store and a
//! [`QueryFilter`]; none of them touch storage. An empty selection is
//! [`AacError::NotFound`].

mod reports;

pub use reports::{
    batch_quality, mould_performance, rejection_trends, segregation_analysis, BatchDefectRate,
    BatchQualityStats, DefectTypeTotals, MouldPerformance, RejectionSummary, SegregationStats,
    TrendPeriod,
};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entity::{BatchDocument, CuttingStage};
use crate::error::{AacError, Result};

/// Cutting fields that mark a whole batch as rejected. Wire breaks are
/// counted per type but do not reject a batch on their own.
const BATCH_REJECTION_FIELDS: [&str; 7] = [
    "tiltingCraneRejection",
    "chippingRejection",
    "sideCutterRejection",
    "joinedRejection",
    "trimmingRejection",
    "rejectedDueToHC",
    "rejectedDueToVC",
];

/// Readable label for a cutting rejection field.
pub fn rejection_label(field: &str) -> &'static str {
    match field {
        "tiltingCraneRejection" => "Tilting Crane",
        "chippingRejection" => "Chipping",
        "sideCutterRejection" => "Side Cutter",
        "joinedRejection" => "Joined",
        "trimmingRejection" => "Trimming",
        "wireBrokenHC" => "Wire Broken HC",
        "wireBrokenVC" => "Wire Broken VC",
        "rejectedDueToHC" => "Rejected Due To HC",
        "rejectedDueToVC" => "Rejected Due To VC",
        _ => "Other",
    }
}

/// Cutting rejection fields with a non-zero count.
pub(crate) fn rejection_hits(cutting: &CuttingStage) -> impl Iterator<Item = &'static str> {
    cutting
        .rejections()
        .into_iter()
        .filter(|(_, value)| value.is_some_and(|n| n > 0))
        .map(|(field, _)| field)
}

pub fn is_rejected(doc: &BatchDocument) -> bool {
    doc.process_steps
        .cutting
        .as_ref()
        .is_some_and(|c| rejection_hits(c).any(|f| BATCH_REJECTION_FIELDS.contains(&f)))
}

pub(crate) fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Date range and mould selection shared by every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mould_id: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AacError::validation(field, format!("Invalid {} format. Use YYYY-MM-DD", field))
            }),
    }
}

impl QueryFilter {
    /// Build a filter from raw query parameters.
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        mould_id: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            start_date: parse_date("start_date", start_date)?,
            end_date: parse_date("end_date", end_date)?,
            mould_id: mould_id
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        })
    }

    pub fn matches(&self, doc: &BatchDocument) -> bool {
        self.start_date.map_or(true, |start| doc.date >= start)
            && self.end_date.map_or(true, |end| doc.date <= end)
            && self.mould_id.as_deref().map_or(true, |m| doc.mould_id == m)
    }

    /// Documents passing the filter; `NotFound` when none do.
    pub fn select<'a>(&self, docs: &'a [BatchDocument]) -> Result<Vec<&'a BatchDocument>> {
        let selected: Vec<_> = docs.iter().filter(|d| self.matches(d)).collect();
        if selected.is_empty() {
            return Err(AacError::NotFound(
                "No batches found matching the criteria".to_string(),
            ));
        }
        Ok(selected)
    }
}

/// Trend bucket size. Weeks start on Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// First day of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            GroupBy::Day => date,
            GroupBy::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            GroupBy::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupBy::Day => write!(f, "day"),
            GroupBy::Week => write!(f, "week"),
            GroupBy::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            "month" => Ok(GroupBy::Month),
            _ => Err("Invalid group_by parameter. Use day, week, or month".to_string()),
        }
    }
}
