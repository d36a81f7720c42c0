// src/entity/batch.rs
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLOCK_SIZE: &str = "600x200x100";

/// Segregation inspection positions, keyed "1" through "6" in `defects`.
pub const SEGREGATION_POSITIONS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BatchStatus {
    #[default]
    #[serde(rename = "In Progress", alias = "in-progress")]
    InProgress,
    #[serde(rename = "Completed", alias = "completed")]
    Completed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::InProgress => write!(f, "in-progress"),
            BatchStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "in-progress" | "inprogress" => Ok(BatchStatus::InProgress),
            "completed" | "complete" => Ok(BatchStatus::Completed),
            _ => Err(format!("Invalid batch status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMaterials {
    pub fresh_slurry: f64,
    pub waste_slurry: f64,
    pub cement: f64,
    pub lime: f64,
    pub gypsum: f64,
    pub aluminum_powder: f64,
    pub dc_powder: f64,
    pub water: f64,
    pub solution_oil: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcess {
    /// Decimal hours.
    pub mixing_time: f64,
    pub discharge_time: String,
    pub discharge_temp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchingStage {
    pub shift: String,
    pub materials: BatchMaterials,
    pub process: BatchProcess,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryCartMeasurements {
    pub flow: f64,
    pub temp: f64,
    pub height: f64,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryCartStage {
    pub shift: String,
    pub measurements: FerryCartMeasurements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiltingCraneMeasurements {
    /// "Less", "Over" or "Ok".
    pub rising_quality: String,
    pub temp: f64,
    pub time: String,
    pub hardness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiltingCraneStage {
    pub shift: String,
    pub measurements: TiltingCraneMeasurements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuttingStage {
    pub cutting_time: String,
    pub block_size: String,
    pub tilting_crane_rejection: Option<u32>,
    pub chipping_rejection: Option<u32>,
    pub side_cutter_rejection: Option<u32>,
    pub joined_rejection: Option<u32>,
    pub trimming_rejection: Option<u32>,
    #[serde(rename = "wireBrokenHC")]
    pub wire_broken_hc: Option<u32>,
    #[serde(rename = "wireBrokenVC")]
    pub wire_broken_vc: Option<u32>,
    #[serde(rename = "rejectedDueToHC")]
    pub rejected_due_to_hc: Option<u32>,
    #[serde(rename = "rejectedDueToVC")]
    pub rejected_due_to_vc: Option<u32>,
    pub dimension_check: Option<String>,
}

impl Default for CuttingStage {
    fn default() -> Self {
        Self {
            cutting_time: String::new(),
            block_size: DEFAULT_BLOCK_SIZE.to_string(),
            tilting_crane_rejection: None,
            chipping_rejection: None,
            side_cutter_rejection: None,
            joined_rejection: None,
            trimming_rejection: None,
            wire_broken_hc: None,
            wire_broken_vc: None,
            rejected_due_to_hc: None,
            rejected_due_to_vc: None,
            dimension_check: None,
        }
    }
}

impl CuttingStage {
    /// Rejection fields as `(document field name, value)` pairs.
    pub fn rejections(&self) -> [(&'static str, Option<u32>); 9] {
        [
            ("tiltingCraneRejection", self.tilting_crane_rejection),
            ("chippingRejection", self.chipping_rejection),
            ("sideCutterRejection", self.side_cutter_rejection),
            ("joinedRejection", self.joined_rejection),
            ("trimmingRejection", self.trimming_rejection),
            ("wireBrokenHC", self.wire_broken_hc),
            ("wireBrokenVC", self.wire_broken_vc),
            ("rejectedDueToHC", self.rejected_due_to_hc),
            ("rejectedDueToVC", self.rejected_due_to_vc),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoclaveStage {
    pub autoclave_number: String,
    pub shift: String,
    pub processed_at: DateTime<Utc>,
    pub door_open_time: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectCounts {
    pub rain_cracks_cuts: u32,
    pub corner_cracks_cuts: u32,
    pub corner_damage: u32,
    pub chipped_blocks: u32,
}

impl DefectCounts {
    /// Sum of all four counts, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.rain_cracks_cuts
            .saturating_add(self.corner_cracks_cuts)
            .saturating_add(self.corner_damage)
            .saturating_add(self.chipped_blocks)
    }

    /// Saturating sum of `total()` over several positions.
    pub fn sum_totals<'a>(counts: impl IntoIterator<Item = &'a DefectCounts>) -> u32 {
        counts
            .into_iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.total()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegregationStage {
    pub shift: String,
    pub total_blocks: u32,
    pub size: String,
    /// Shift as picked by the inspector, kept verbatim (e.g. "Morning").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_shift: Option<String>,
    /// Keyed by inspection position, "1" through "6".
    pub defects: BTreeMap<String, DefectCounts>,
    pub total_defects: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSteps {
    pub batching: BatchingStage,
    pub ferry_carts: FerryCartStage,
    pub tilting_crane: TiltingCraneStage,
    pub cutting: CuttingStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoclave: Option<AutoclaveStage>,
    pub segregation: SegregationStage,
}

impl ProcessSteps {
    /// Zero-valued sub-objects for every stage. Segregation records its own
    /// shift when it is entered, so it starts blank.
    pub fn with_shift(shift: &str) -> Self {
        Self {
            batching: BatchingStage {
                shift: shift.to_string(),
                ..Default::default()
            },
            ferry_carts: FerryCartStage {
                shift: shift.to_string(),
                ..Default::default()
            },
            tilting_crane: TiltingCraneStage {
                shift: shift.to_string(),
                ..Default::default()
            },
            cutting: CuttingStage::default(),
            autoclave: None,
            segregation: SegregationStage::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl RecordMetadata {
    pub fn new(created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            created_by: created_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub batch_id: String,
    pub mould_id: String,
    pub status: BatchStatus,
    pub date: NaiveDate,
    pub process_steps: ProcessSteps,
    pub metadata: RecordMetadata,
}
