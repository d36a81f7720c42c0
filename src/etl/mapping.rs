//! Plant report sheets to stored documents.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, warn};

use super::workbook::{
    cell_count, cell_duration, cell_minutes, cell_number, cell_optional_number, cell_text,
    cell_time, Row, Workbook,
};
use crate::entity::{
    batch_document_id, AutoclaveRecord, BatchDocument, BatchMaterials, BatchProcess, BatchStatus,
    BatchingStage, CuttingStage, DefectCounts, DocumentSteps, FerryCartMeasurements,
    FerryCartStage, RecordMetadata, SegregationStage, TiltingCraneMeasurements,
    TiltingCraneStage, DEFAULT_BLOCK_SIZE, SEGREGATION_POSITIONS,
};
use crate::time::Shift;

pub const BATCHING_SHEET: &str = "1. Batching ";
pub const FERRY_CART_SHEET: &str = "2.Ferry Cart ";
pub const TILTING_CRANE_SHEET: &str = "3.Tilting Crane";
pub const CUTTING_SHEET: &str = "4.Cutting Report";
pub const AUTOCLAVE_SHEET: &str = "5.Autoclave";
pub const SEGREGATION_SHEET: &str = "6.Segregation Report";

pub const BATCH_NO: &str = "Batch No.";
pub const MOULD_NO: &str = "Mould No.";

/// Creator tag on imported documents.
pub const MIGRATION_USER: &str = "migration_script";

/// Rows of one sheet keyed by `(batch, mould)`.
///
/// When a pair appears more than once the first row wins. Rows missing
/// either key are not indexed.
pub struct RowIndex<'a> {
    rows: HashMap<(String, String), &'a Row>,
}

impl<'a> RowIndex<'a> {
    pub fn build(rows: &'a [Row]) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            let (Some(batch), Some(mould)) = (cell_text(row, BATCH_NO), cell_text(row, MOULD_NO))
            else {
                continue;
            };
            index.entry((batch, mould)).or_insert(row);
        }
        Self { rows: index }
    }

    pub fn empty() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    pub fn get(&self, batch: &str, mould: &str) -> Option<&'a Row> {
        self.rows
            .get(&(batch.to_string(), mould.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn index_sheet<'a>(workbook: &'a Workbook, name: &str) -> RowIndex<'a> {
    match workbook.sheet(name) {
        Some(rows) => RowIndex::build(rows),
        None => {
            warn!(sheet = name.trim(), "sheet missing from workbook");
            RowIndex::empty()
        }
    }
}

/// Shift for a stage measured at `column`. Rows without a readable time
/// are booked to the day shift.
fn shift_from_time(row: &Row, column: &str) -> String {
    cell_minutes(row, column)
        .and_then(|m| chrono::NaiveTime::from_num_seconds_from_midnight_opt(m as u32 * 60, 0))
        .map(Shift::at)
        .unwrap_or(Shift::Day)
        .to_string()
}

fn batching_stage(row: &Row) -> BatchingStage {
    BatchingStage {
        shift: shift_from_time(row, "Discharge Time"),
        materials: BatchMaterials {
            fresh_slurry: cell_number(row, "Fresh Slurry Kg"),
            waste_slurry: cell_number(row, "Waste Slurry Kg"),
            cement: cell_number(row, "Cement Kg"),
            lime: cell_number(row, "Lime Kg"),
            gypsum: cell_number(row, "Gypsum Kg"),
            aluminum_powder: cell_number(row, "Aluminum  Powder GM"),
            dc_powder: cell_number(row, "D C Powder GM"),
            water: cell_number(row, "Water Kg"),
            solution_oil: cell_number(row, "Solu. Oil Litre"),
        },
        process: BatchProcess {
            mixing_time: cell_number(row, "Mixing Time"),
            discharge_time: cell_time(row, "Discharge Time"),
            discharge_temp: cell_number(row, "Discharge Temp."),
        },
    }
}

fn ferry_cart_stage(row: &Row) -> FerryCartStage {
    FerryCartStage {
        shift: shift_from_time(row, "Time"),
        measurements: FerryCartMeasurements {
            flow: cell_number(row, "Flow"),
            temp: cell_number(row, "Temp."),
            height: cell_number(row, "Height"),
            time: cell_time(row, "Time"),
        },
    }
}

fn tilting_crane_stage(row: &Row) -> TiltingCraneStage {
    TiltingCraneStage {
        shift: shift_from_time(row, "Time"),
        measurements: TiltingCraneMeasurements {
            rising_quality: cell_text(row, "Rising   Less / Over / Ok").unwrap_or_default(),
            temp: cell_number(row, "Temp."),
            time: cell_time(row, "Time"),
            hardness: cell_number(row, "Hardness"),
        },
    }
}

fn cutting_stage(row: &Row) -> CuttingStage {
    CuttingStage {
        cutting_time: cell_time(row, "Cutting Time"),
        block_size: cell_text(row, "Block Size").unwrap_or_else(|| DEFAULT_BLOCK_SIZE.to_string()),
        tilting_crane_rejection: cell_count(row, "Tilting Crane Rejection"),
        chipping_rejection: cell_count(row, "Chipping Rejection"),
        side_cutter_rejection: cell_count(row, "Side Cutter Rejection"),
        joined_rejection: cell_count(row, "Joined Rejection"),
        trimming_rejection: cell_count(row, "Trimming Rejection"),
        wire_broken_hc: cell_count(row, "Wire Broken HC"),
        wire_broken_vc: cell_count(row, "Wire Broken VC"),
        rejected_due_to_hc: cell_count(row, "Rejected Due to HC"),
        rejected_due_to_vc: cell_count(row, "Rejected Due to VC"),
        dimension_check: cell_text(row, "Dimension Check"),
    }
}

fn segregation_stage(row: &Row) -> SegregationStage {
    let count = |column: String| cell_count(row, &column).unwrap_or(0);

    let defects: BTreeMap<String, DefectCounts> = (1..=SEGREGATION_POSITIONS)
        .map(|n| {
            let counts = DefectCounts {
                rain_cracks_cuts: count(format!("{}-RainCracks/Cuts", n)),
                corner_cracks_cuts: count(format!("{}-CornerCracks/Cuts", n)),
                corner_damage: count(format!("{}-CornerDemage", n)),
                chipped_blocks: count(format!("{}-ChippedBlocks", n)),
            };
            (n.to_string(), counts)
        })
        .collect();

    let total_defects = cell_count(row, "Total Defects")
        .unwrap_or_else(|| DefectCounts::sum_totals(defects.values()));

    SegregationStage {
        shift: cell_text(row, "Shift")
            .and_then(|s| s.parse::<Shift>().ok())
            .unwrap_or(Shift::Day)
            .to_string(),
        total_blocks: cell_count(row, "Total Blocks").unwrap_or(0),
        size: cell_text(row, "Size").unwrap_or_default(),
        inspection_shift: cell_text(row, "Shift"),
        defects,
        total_defects,
    }
}

/// One completed-batch document per batching row with a batch number.
///
/// Other sheets contribute their stage when a row with the same batch and
/// mould number exists; otherwise that stage is left out.
pub fn manufacturing_documents(
    workbook: &Workbook,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<BatchDocument> {
    let Some(batching_rows) = workbook.sheet(BATCHING_SHEET) else {
        error!(sheet = BATCHING_SHEET.trim(), "batching sheet not found");
        return Vec::new();
    };

    let ferry_carts = index_sheet(workbook, FERRY_CART_SHEET);
    let tilting_cranes = index_sheet(workbook, TILTING_CRANE_SHEET);
    let cutting = index_sheet(workbook, CUTTING_SHEET);
    let segregation = index_sheet(workbook, SEGREGATION_SHEET);

    let docs: Vec<BatchDocument> = batching_rows
        .iter()
        .filter_map(|row| {
            let batch_id = cell_text(row, BATCH_NO)?;
            let mould_id = cell_text(row, MOULD_NO).unwrap_or_default();

            Some(BatchDocument {
                id: batch_document_id(&batch_id, date),
                status: BatchStatus::Completed,
                date,
                process_steps: DocumentSteps {
                    batching: batching_stage(row),
                    ferry_carts: ferry_carts.get(&batch_id, &mould_id).map(ferry_cart_stage),
                    tilting_crane: tilting_cranes
                        .get(&batch_id, &mould_id)
                        .map(tilting_crane_stage),
                    cutting: cutting.get(&batch_id, &mould_id).map(cutting_stage),
                    autoclave: None,
                    segregation: segregation.get(&batch_id, &mould_id).map(segregation_stage),
                },
                metadata: RecordMetadata::new(MIGRATION_USER, now),
                batch_id,
                mould_id,
            })
        })
        .collect();

    debug!(
        rows = batching_rows.len(),
        documents = docs.len(),
        "mapped batching sheet"
    );
    docs
}

fn autoclave_record(row: &Row) -> AutoclaveRecord {
    AutoclaveRecord {
        id: uuid::Uuid::new_v4().to_string(),
        autoclave_id: cell_count(row, "Autoclave Id").unwrap_or(0),
        shift: cell_text(row, "Shift").unwrap_or_default(),
        batches_processed: cell_text(row, "Batches Processed").unwrap_or_default(),
        previous_door_open_time: cell_time(row, "Previous Door Open Time"),
        previous_door_open_pressure: cell_optional_number(row, "Previous Door Open Pressure"),
        door_close_time: cell_time(row, "Door Close Time"),
        door_close_pressure: cell_optional_number(row, "Door Close Pressure"),
        vacuum_finish_time: cell_time(row, "Vacuum Finish Time"),
        vacuum_finish_pressure: cell_optional_number(row, "Vacuum Finish Pressure"),
        slow_steam_start_time: cell_time(row, "Slow Steam Start Time"),
        slow_steam_start_pressure: cell_optional_number(row, "Slow Steam Start Pressure"),
        fast_steam_start_time: cell_time(row, "Fast Steam Start Time"),
        fast_steam_start_pressure: cell_optional_number(row, "Fast Steam Start  Pressure"),
        max_pressure_time: cell_time(row, "Max Pressure Time"),
        max_pressure: cell_optional_number(row, "Max Pressure"),
        release_start_time: cell_time(row, "Release start Time"),
        release_start_pressure: cell_optional_number(row, "Release start  Pressure"),
        door_open_time: cell_time(row, "Door Open Time"),
        door_open_pressure: cell_optional_number(row, "Door Open  Pressure"),
        door_close_duration: cell_duration(row, "Door Close Duration"),
        vacuum_finish_duration: cell_duration(row, "Vaccum Finish Duration"),
        slow_steam_duration: cell_duration(row, "Slow Steam Duration"),
        fast_steam_duration: cell_duration(row, "Fast Steam Duration"),
        max_pressure_duration: cell_duration(row, "Max Pressure Duration"),
        release_start_duration: cell_duration(row, "Release start Duration"),
        door_open_duration: cell_duration(row, "Door Open  Duration"),
    }
}

/// One document per autoclave sheet row. A workbook without the sheet
/// yields nothing.
pub fn autoclave_documents(workbook: &Workbook) -> Vec<AutoclaveRecord> {
    match workbook.sheet(AUTOCLAVE_SHEET) {
        Some(rows) => rows.iter().map(autoclave_record).collect(),
        None => {
            error!(sheet = AUTOCLAVE_SHEET, "autoclave sheet not found");
            Vec::new()
        }
    }
}
