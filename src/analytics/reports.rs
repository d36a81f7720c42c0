use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    is_rejected, percent, rejection_hits, rejection_label, round2, GroupBy, QueryFilter,
    BATCH_REJECTION_FIELDS,
};
use crate::entity::{BatchDocument, CuttingStage, DefectCounts};
use crate::error::Result;

const WORST_BATCH_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionSummary {
    pub rejection_type: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQualityStats {
    pub total_batches: u32,
    pub rejected_batches: u32,
    pub rejection_rate: f64,
    pub rejection_by_type: Vec<RejectionSummary>,
    pub most_common_rejection: String,
}

/// Batches per cutting rejection field, in field order.
fn rejection_counts(docs: &[&BatchDocument]) -> Vec<(&'static str, u32)> {
    let mut counts: Vec<(&'static str, u32)> = CuttingStage::default()
        .rejections()
        .iter()
        .map(|(field, _)| (*field, 0))
        .collect();

    for cutting in docs.iter().filter_map(|d| d.process_steps.cutting.as_ref()) {
        for hit in rejection_hits(cutting) {
            if let Some(slot) = counts.iter_mut().find(|(field, _)| *field == hit) {
                slot.1 += 1;
            }
        }
    }
    counts
}

/// Overall rejection rate and the rejection types behind it.
pub fn batch_quality(docs: &[BatchDocument], filter: &QueryFilter) -> Result<BatchQualityStats> {
    let selected = filter.select(docs)?;
    let total = selected.len() as u32;
    let rejected = selected.iter().filter(|d| is_rejected(d)).count() as u32;

    let mut most_common: Option<(&str, u32)> = None;
    let mut by_type = Vec::new();
    for (field, count) in rejection_counts(&selected) {
        if count == 0 {
            continue;
        }
        let label = rejection_label(field);
        if most_common.map_or(true, |(_, max)| count > max) {
            most_common = Some((label, count));
        }
        by_type.push(RejectionSummary {
            rejection_type: label.to_string(),
            count,
            percentage: percent(count, total),
        });
    }
    by_type.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(BatchQualityStats {
        total_batches: total,
        rejected_batches: rejected,
        rejection_rate: percent(rejected, total),
        rejection_by_type: by_type,
        most_common_rejection: most_common
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| "None".to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPeriod {
    /// First day of the period.
    pub period: NaiveDate,
    pub total_batches: u32,
    pub rejected_batches: u32,
    pub rejection_rate: f64,
    /// Rejected batches per rejection field.
    pub rejections: BTreeMap<String, u32>,
    /// `rejections` as a percentage of `total_batches`.
    pub rates: BTreeMap<String, f64>,
}

/// Rejection figures per day, week or month, oldest period first.
pub fn rejection_trends(
    docs: &[BatchDocument],
    filter: &QueryFilter,
    group_by: GroupBy,
) -> Result<Vec<TrendPeriod>> {
    let selected = filter.select(docs)?;

    let mut periods: BTreeMap<NaiveDate, Vec<&BatchDocument>> = BTreeMap::new();
    for doc in selected {
        periods
            .entry(group_by.period_start(doc.date))
            .or_default()
            .push(doc);
    }

    let trends = periods
        .into_iter()
        .map(|(period, batch)| {
            let total = batch.len() as u32;
            let rejected = batch.iter().filter(|d| is_rejected(d)).count() as u32;

            let rejections: BTreeMap<String, u32> = rejection_counts(&batch)
                .into_iter()
                .filter(|(field, _)| BATCH_REJECTION_FIELDS.contains(field))
                .map(|(field, count)| (field.to_string(), count))
                .collect();
            let rates = rejections
                .iter()
                .map(|(field, count)| (field.clone(), percent(*count, total)))
                .collect();

            TrendPeriod {
                period,
                total_batches: total,
                rejected_batches: rejected,
                rejection_rate: percent(rejected, total),
                rejections,
                rates,
            }
        })
        .collect();

    Ok(trends)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouldPerformance {
    pub mould_id: String,
    pub total_batches: u32,
    pub rejected_batches: u32,
    pub rejection_rate: f64,
}

/// Per-mould rejection rates, worst mould first.
///
/// The filter's mould selection is ignored.
pub fn mould_performance(
    docs: &[BatchDocument],
    filter: &QueryFilter,
) -> Result<Vec<MouldPerformance>> {
    let filter = QueryFilter {
        mould_id: None,
        ..filter.clone()
    };
    let selected = filter.select(docs)?;

    let mut moulds: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for doc in selected {
        let entry = moulds.entry(doc.mould_id.as_str()).or_default();
        entry.0 += 1;
        if is_rejected(doc) {
            entry.1 += 1;
        }
    }

    let mut performance: Vec<MouldPerformance> = moulds
        .into_iter()
        .map(|(mould, (total, rejected))| MouldPerformance {
            mould_id: mould.to_string(),
            total_batches: total,
            rejected_batches: rejected,
            rejection_rate: percent(rejected, total),
        })
        .collect();
    performance.sort_by(|a, b| b.rejection_rate.total_cmp(&a.rejection_rate));

    Ok(performance)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectTypeTotals {
    pub rain_cracks_cuts: u64,
    pub corner_cracks_cuts: u64,
    pub corner_damage: u64,
    pub chipped_blocks: u64,
}

impl DefectTypeTotals {
    fn add(&mut self, counts: &DefectCounts) {
        self.rain_cracks_cuts += u64::from(counts.rain_cracks_cuts);
        self.corner_cracks_cuts += u64::from(counts.corner_cracks_cuts);
        self.corner_damage += u64::from(counts.corner_damage);
        self.chipped_blocks += u64::from(counts.chipped_blocks);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDefectRate {
    pub batch_id: String,
    pub mould_id: String,
    pub total_blocks: u32,
    pub total_defects: u32,
    pub defect_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegregationStats {
    pub inspected_batches: u32,
    pub total_blocks: u64,
    pub total_defects: u64,
    pub defect_rate: f64,
    pub defects_by_type: DefectTypeTotals,
    /// Defects per inspection position, "1" through "6".
    pub defects_by_position: BTreeMap<String, u64>,
    pub worst_batches: Vec<BatchDefectRate>,
}

/// Defect totals from segregation inspections.
///
/// Only batches that reached segregation count; if none in the selection
/// did, the result is `NotFound`.
pub fn segregation_analysis(
    docs: &[BatchDocument],
    filter: &QueryFilter,
) -> Result<SegregationStats> {
    let inspected: Vec<_> = filter
        .select(docs)?
        .into_iter()
        .filter_map(|d| d.process_steps.segregation.as_ref().map(|s| (d, s)))
        .collect();

    if inspected.is_empty() {
        return Err(crate::error::AacError::NotFound(
            "No segregation records found matching the criteria".to_string(),
        ));
    }

    let mut by_type = DefectTypeTotals::default();
    let mut by_position: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_blocks = 0u64;
    let mut total_defects = 0u64;
    let mut rates = Vec::with_capacity(inspected.len());

    for (doc, seg) in &inspected {
        total_blocks += u64::from(seg.total_blocks);
        total_defects += u64::from(seg.total_defects);
        for (position, counts) in &seg.defects {
            by_type.add(counts);
            *by_position.entry(position.clone()).or_default() += u64::from(counts.total());
        }
        if seg.total_blocks > 0 {
            rates.push(BatchDefectRate {
                batch_id: doc.batch_id.clone(),
                mould_id: doc.mould_id.clone(),
                total_blocks: seg.total_blocks,
                total_defects: seg.total_defects,
                defect_rate: percent(seg.total_defects, seg.total_blocks),
            });
        }
    }

    rates.sort_by(|a, b| b.defect_rate.total_cmp(&a.defect_rate));
    rates.truncate(WORST_BATCH_LIMIT);

    Ok(SegregationStats {
        inspected_batches: inspected.len() as u32,
        total_blocks,
        total_defects,
        defect_rate: if total_blocks == 0 {
            0.0
        } else {
            round2(total_defects as f64 / total_blocks as f64 * 100.0)
        },
        defects_by_type: by_type,
        defects_by_position: by_position,
        worst_batches: rates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{
        BatchStatus, BatchingStage, DocumentSteps, RecordMetadata, SegregationStage,
    };
    use crate::error::AacError;
    use chrono::Utc;

    fn doc(batch: &str, mould: &str, date: &str, cutting: Option<CuttingStage>) -> BatchDocument {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        BatchDocument {
            id: format!("batch_{}_{}", batch, date.format("%Y%m%d")),
            batch_id: batch.to_string(),
            mould_id: mould.to_string(),
            status: BatchStatus::Completed,
            date,
            process_steps: DocumentSteps {
                batching: BatchingStage::default(),
                ferry_carts: None,
                tilting_crane: None,
                cutting,
                autoclave: None,
                segregation: None,
            },
            metadata: RecordMetadata::new("migration_script", Utc::now()),
        }
    }

    fn chipped(n: u32) -> Option<CuttingStage> {
        Some(CuttingStage {
            chipping_rejection: Some(n),
            ..Default::default()
        })
    }

    fn sample() -> Vec<BatchDocument> {
        vec![
            doc("1", "3", "2025-04-07", chipped(2)),
            doc("2", "3", "2025-04-08", chipped(0)),
            doc(
                "3",
                "4",
                "2025-04-10",
                Some(CuttingStage {
                    wire_broken_hc: Some(1),
                    ..Default::default()
                }),
            ),
            doc("4", "4", "2025-04-14", None),
        ]
    }

    #[test]
    fn test_batch_quality() {
        let stats = batch_quality(&sample(), &QueryFilter::default()).unwrap();
        assert_eq!(stats.total_batches, 4);
        // A wire break alone does not reject the batch.
        assert_eq!(stats.rejected_batches, 1);
        assert_eq!(stats.rejection_rate, 25.0);
        assert_eq!(stats.rejection_by_type.len(), 2);
        assert_eq!(stats.rejection_by_type[0].rejection_type, "Chipping");
        assert_eq!(stats.rejection_by_type[0].percentage, 25.0);
        assert_eq!(stats.most_common_rejection, "Chipping");
    }

    #[test]
    fn test_batch_quality_without_rejections() {
        let docs = vec![doc("1", "3", "2025-04-07", None)];
        let stats = batch_quality(&docs, &QueryFilter::default()).unwrap();
        assert_eq!(stats.rejected_batches, 0);
        assert!(stats.rejection_by_type.is_empty());
        assert_eq!(stats.most_common_rejection, "None");
    }

    #[test]
    fn test_filters_and_not_found() {
        let filter = QueryFilter::parse(Some("2025-04-08"), Some("2025-04-10"), None).unwrap();
        assert_eq!(batch_quality(&sample(), &filter).unwrap().total_batches, 2);

        let filter = QueryFilter::parse(None, None, Some("4")).unwrap();
        assert_eq!(batch_quality(&sample(), &filter).unwrap().total_batches, 2);

        let filter = QueryFilter::parse(Some("2030-01-01"), None, None).unwrap();
        assert!(matches!(
            batch_quality(&sample(), &filter),
            Err(AacError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejection_trends_by_week() {
        let trends = rejection_trends(&sample(), &QueryFilter::default(), GroupBy::Week).unwrap();
        assert_eq!(trends.len(), 2);

        let first = &trends[0];
        assert_eq!(first.period, NaiveDate::from_ymd_opt(2025, 4, 7).unwrap());
        assert_eq!(first.total_batches, 3);
        assert_eq!(first.rejected_batches, 1);
        assert_eq!(first.rejection_rate, 33.33);
        assert_eq!(first.rejections["chippingRejection"], 1);
        assert_eq!(first.rates["chippingRejection"], 33.33);
        assert!(!first.rejections.contains_key("wireBrokenHC"));

        assert_eq!(trends[1].period, NaiveDate::from_ymd_opt(2025, 4, 14).unwrap());
        assert_eq!(trends[1].rejected_batches, 0);
    }

    #[test]
    fn test_rejection_trends_by_day_and_month() {
        let days = rejection_trends(&sample(), &QueryFilter::default(), GroupBy::Day).unwrap();
        assert_eq!(days.len(), 4);

        let months = rejection_trends(&sample(), &QueryFilter::default(), GroupBy::Month).unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].period, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
    }

    #[test]
    fn test_mould_performance_sorted_by_rate() {
        let mut docs = sample();
        docs.push(doc("5", "7", "2025-04-09", chipped(1)));

        let moulds = mould_performance(&docs, &QueryFilter::default()).unwrap();
        assert_eq!(moulds.len(), 3);
        assert_eq!(moulds[0].mould_id, "7");
        assert_eq!(moulds[0].rejection_rate, 100.0);
        assert_eq!(moulds[1].mould_id, "3");
        assert_eq!(moulds[1].rejection_rate, 50.0);
        assert_eq!(moulds[2].rejection_rate, 0.0);
    }

    #[test]
    fn test_segregation_analysis() {
        let mut docs = sample();
        let mut defects = BTreeMap::new();
        defects.insert(
            "1".to_string(),
            DefectCounts {
                rain_cracks_cuts: 2,
                chipped_blocks: 1,
                ..Default::default()
            },
        );
        defects.insert(
            "6".to_string(),
            DefectCounts {
                corner_damage: 3,
                ..Default::default()
            },
        );
        docs[0].process_steps.segregation = Some(SegregationStage {
            shift: "Day".to_string(),
            total_blocks: 200,
            size: "600x200x100".to_string(),
            inspection_shift: None,
            defects,
            total_defects: 6,
        });

        let stats = segregation_analysis(&docs, &QueryFilter::default()).unwrap();
        assert_eq!(stats.inspected_batches, 1);
        assert_eq!(stats.total_blocks, 200);
        assert_eq!(stats.defect_rate, 3.0);
        assert_eq!(stats.defects_by_type.rain_cracks_cuts, 2);
        assert_eq!(stats.defects_by_position["6"], 3);
        assert_eq!(stats.worst_batches[0].batch_id, "1");

        assert!(matches!(
            segregation_analysis(&sample(), &QueryFilter::default()),
            Err(AacError::NotFound(_))
        ));
    }

    #[test]
    fn test_segregation_totals_exceed_u32() {
        let mut docs = sample();
        for doc in docs.iter_mut().take(2) {
            let mut defects = BTreeMap::new();
            defects.insert(
                "1".to_string(),
                DefectCounts {
                    rain_cracks_cuts: u32::MAX,
                    ..Default::default()
                },
            );
            doc.process_steps.segregation = Some(SegregationStage {
                shift: "Night".to_string(),
                total_blocks: u32::MAX,
                size: "600x200x100".to_string(),
                inspection_shift: None,
                defects,
                total_defects: u32::MAX,
            });
        }

        let stats = segregation_analysis(&docs, &QueryFilter::default()).unwrap();
        let expected = 2 * u64::from(u32::MAX);
        assert_eq!(stats.total_blocks, expected);
        assert_eq!(stats.total_defects, expected);
        assert_eq!(stats.defects_by_type.rain_cracks_cuts, expected);
        assert_eq!(stats.defects_by_position["1"], expected);
        assert_eq!(stats.defect_rate, 100.0);
    }
}
