use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::batch::{
    AutoclaveStage, BatchRecord, BatchStatus, BatchingStage, CuttingStage, FerryCartStage,
    RecordMetadata, SegregationStage, TiltingCraneStage,
};

/// Stage data as stored in the manufacturing collection.
///
/// Unlike [`super::ProcessSteps`], a stage without data is absent rather
/// than zero-valued: the importer only knows about rows it found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSteps {
    pub batching: BatchingStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ferry_carts: Option<FerryCartStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilting_crane: Option<TiltingCraneStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutting: Option<CuttingStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoclave: Option<AutoclaveStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segregation: Option<SegregationStage>,
}

/// A batch as stored in the `ManufacturingProcess` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub batch_id: String,
    pub mould_id: String,
    pub status: BatchStatus,
    pub date: NaiveDate,
    pub process_steps: DocumentSteps,
    pub metadata: RecordMetadata,
}

impl From<BatchRecord> for BatchDocument {
    fn from(record: BatchRecord) -> Self {
        let steps = record.process_steps;
        Self {
            id: record.id,
            batch_id: record.batch_id,
            mould_id: record.mould_id,
            status: record.status,
            date: record.date,
            process_steps: DocumentSteps {
                batching: steps.batching,
                ferry_carts: Some(steps.ferry_carts),
                tilting_crane: Some(steps.tilting_crane),
                cutting: Some(steps.cutting),
                autoclave: steps.autoclave,
                segregation: Some(steps.segregation),
            },
            metadata: record.metadata,
        }
    }
}
