mod autoclave;
mod batch;
mod document;
mod stage;

pub use autoclave::AutoclaveRecord;
pub use batch::{
    AutoclaveStage, BatchMaterials, BatchProcess, BatchRecord, BatchStatus, BatchingStage,
    CuttingStage, DefectCounts, FerryCartMeasurements, FerryCartStage, ProcessSteps,
    RecordMetadata, SegregationStage, TiltingCraneMeasurements, TiltingCraneStage,
    DEFAULT_BLOCK_SIZE, SEGREGATION_POSITIONS,
};
pub use document::{BatchDocument, DocumentSteps};
pub use stage::{BatchStages, StageName, StageStatus};

use chrono::NaiveDate;

/// `batch_{batchNumber}_{YYYYMMDD}`, the document key shared by the app and the importer.
pub fn batch_document_id(batch_number: &str, date: NaiveDate) -> String {
    format!("batch_{}_{}", batch_number, date.format("%Y%m%d"))
}
