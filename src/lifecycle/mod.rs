//! Batch creation and per-stage record updates.
//!
//! Every update helper takes the current record by reference and returns a
//! new record with exactly one stage sub-object replaced. The stage's shift
//! is taken from the time of recording and `metadata.updatedAt` is
//! refreshed; `_id` and `metadata.createdAt` are carried over untouched.
//!
//! The `*_at` variants take the recording time explicitly; the plain
//! variants use the local clock.

mod coerce;
mod forms;

pub use coerce::{parse_count_or_zero, parse_measurement_or_zero};
pub use forms::{
    AutoclaveForm, BatchForm, BatchIngredientForm, CuttingForm, FerryCartForm, MixingTime,
    PositionDefectsForm, SegregationForm, TiltingCraneForm,
};

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};

use crate::entity::{
    batch_document_id, AutoclaveRecord, AutoclaveStage, BatchMaterials, BatchProcess, BatchRecord,
    BatchStatus, BatchingStage, CuttingStage, DefectCounts, FerryCartMeasurements, FerryCartStage,
    ProcessSteps, RecordMetadata, SegregationStage, TiltingCraneMeasurements, TiltingCraneStage,
    DEFAULT_BLOCK_SIZE,
};
use crate::time::{calculate_time_difference, Shift};

/// Creator tag for records entered on the shop floor.
pub const APP_USER: &str = "app_user";

fn shift_at(now: DateTime<Local>) -> String {
    Shift::at(now.time()).to_string()
}

/// Copy of `batch` with `updatedAt` set to `now`.
fn touched(batch: &BatchRecord, now: DateTime<Local>) -> BatchRecord {
    let mut updated = batch.clone();
    updated.metadata.updated_at = now.with_timezone(&Utc);
    updated
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn create_new_batch(batch_number: &str, mould_number: &str) -> BatchRecord {
    create_new_batch_at(batch_number, mould_number, APP_USER, Local::now())
}

/// New in-progress record with zero-valued data for every stage.
pub fn create_new_batch_at(
    batch_number: &str,
    mould_number: &str,
    created_by: &str,
    now: DateTime<Local>,
) -> BatchRecord {
    let date = now.date_naive();

    BatchRecord {
        id: batch_document_id(batch_number, date),
        batch_id: batch_number.to_string(),
        mould_id: mould_number.to_string(),
        status: BatchStatus::InProgress,
        date,
        process_steps: ProcessSteps::with_shift(&shift_at(now)),
        metadata: RecordMetadata::new(created_by, now.with_timezone(&Utc)),
    }
}

pub fn update_batch_ingredients(batch: &BatchRecord, form: &BatchIngredientForm) -> BatchRecord {
    update_batch_ingredients_at(batch, form, Local::now())
}

pub fn update_batch_ingredients_at(
    batch: &BatchRecord,
    form: &BatchIngredientForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);

    let hours = parse_count_or_zero(&form.mixing_time.hours) as f64;
    let minutes = parse_count_or_zero(&form.mixing_time.minutes) as f64;

    updated.process_steps.batching = BatchingStage {
        shift: shift_at(now),
        materials: BatchMaterials {
            fresh_slurry: parse_measurement_or_zero(&form.fresh_slurry),
            waste_slurry: parse_measurement_or_zero(&form.waste_slurry),
            cement: parse_measurement_or_zero(&form.cement),
            lime: parse_measurement_or_zero(&form.lime),
            gypsum: parse_measurement_or_zero(&form.gypsum),
            aluminum_powder: parse_measurement_or_zero(&form.aluminum_powder),
            dc_powder: parse_measurement_or_zero(&form.dc_powder),
            water: parse_measurement_or_zero(&form.water),
            solution_oil: parse_measurement_or_zero(&form.solu_oil),
        },
        process: BatchProcess {
            mixing_time: hours + minutes / 60.0,
            discharge_time: form.discharge_time.clone(),
            discharge_temp: parse_measurement_or_zero(&form.discharge_temp),
        },
    };

    updated
}

pub fn update_batch_ferry_cart_data(batch: &BatchRecord, form: &FerryCartForm) -> BatchRecord {
    update_batch_ferry_cart_data_at(batch, form, Local::now())
}

pub fn update_batch_ferry_cart_data_at(
    batch: &BatchRecord,
    form: &FerryCartForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);

    updated.process_steps.ferry_carts = FerryCartStage {
        shift: shift_at(now),
        measurements: FerryCartMeasurements {
            flow: parse_measurement_or_zero(&form.flow),
            temp: parse_measurement_or_zero(&form.temp),
            height: parse_measurement_or_zero(&form.height),
            time: form.time.clone(),
        },
    };

    updated
}

pub fn update_batch_tilting_crane_data(
    batch: &BatchRecord,
    form: &TiltingCraneForm,
) -> BatchRecord {
    update_batch_tilting_crane_data_at(batch, form, Local::now())
}

pub fn update_batch_tilting_crane_data_at(
    batch: &BatchRecord,
    form: &TiltingCraneForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);

    updated.process_steps.tilting_crane = TiltingCraneStage {
        shift: shift_at(now),
        measurements: TiltingCraneMeasurements {
            rising_quality: form.rising_quality.clone(),
            temp: parse_measurement_or_zero(&form.temp),
            time: form.time.clone(),
            hardness: parse_measurement_or_zero(&form.hardness),
        },
    };

    updated
}

pub fn update_batch_cutting_data(batch: &BatchRecord, form: &CuttingForm) -> BatchRecord {
    update_batch_cutting_data_at(batch, form, Local::now())
}

/// Once cutting is recorded every rejection count is present; blank fields
/// count as zero rejections.
pub fn update_batch_cutting_data_at(
    batch: &BatchRecord,
    form: &CuttingForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);
    let count = |value: &str| Some(parse_count_or_zero(value));

    updated.process_steps.cutting = CuttingStage {
        cutting_time: form.cutting_time.clone(),
        block_size: non_empty(&form.block_size).unwrap_or_else(|| DEFAULT_BLOCK_SIZE.to_string()),
        tilting_crane_rejection: count(&form.tilting_crane_rejection),
        chipping_rejection: count(&form.chipping_rejection),
        side_cutter_rejection: count(&form.side_cutter_rejection),
        joined_rejection: count(&form.joined_rejection),
        trimming_rejection: count(&form.trimming_rejection),
        wire_broken_hc: count(&form.wire_broken_hc),
        wire_broken_vc: count(&form.wire_broken_vc),
        rejected_due_to_hc: count(&form.rejected_due_to_hc),
        rejected_due_to_vc: count(&form.rejected_due_to_vc),
        dimension_check: non_empty(&form.dimension_check),
    };

    updated
}

pub fn update_batch_autoclave_data(batch: &BatchRecord, form: &AutoclaveForm) -> BatchRecord {
    update_batch_autoclave_data_at(batch, form, Local::now())
}

pub fn update_batch_autoclave_data_at(
    batch: &BatchRecord,
    form: &AutoclaveForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);

    updated.process_steps.autoclave = Some(AutoclaveStage {
        autoclave_number: form.autoclave_number.trim().to_string(),
        shift: shift_at(now),
        processed_at: now.with_timezone(&Utc),
        door_open_time: form.door_open_time.clone(),
    });

    updated
}

pub fn update_batch_segregation_data(batch: &BatchRecord, form: &SegregationForm) -> BatchRecord {
    update_batch_segregation_data_at(batch, form, Local::now())
}

/// Segregation is the last stage, so recording it completes the batch.
///
/// `shift` follows the recording time like every other stage; the shift the
/// inspector picked on the form is kept as `inspectionShift`.
pub fn update_batch_segregation_data_at(
    batch: &BatchRecord,
    form: &SegregationForm,
    now: DateTime<Local>,
) -> BatchRecord {
    let mut updated = touched(batch, now);

    let defects: BTreeMap<String, DefectCounts> = form
        .positions()
        .iter()
        .enumerate()
        .map(|(idx, position)| {
            let counts = DefectCounts {
                rain_cracks_cuts: parse_count_or_zero(&position.rain_cracks),
                corner_cracks_cuts: parse_count_or_zero(&position.corner_cracks),
                corner_damage: parse_count_or_zero(&position.corner_damage),
                chipped_blocks: parse_count_or_zero(&position.chipped_blocks),
            };
            ((idx + 1).to_string(), counts)
        })
        .collect();
    let total_defects = DefectCounts::sum_totals(defects.values());

    updated.process_steps.segregation = SegregationStage {
        shift: shift_at(now),
        total_blocks: parse_count_or_zero(&form.total_blocks),
        size: form.block_size.clone(),
        inspection_shift: non_empty(&form.shift),
        defects,
        total_defects,
    };
    updated.status = BatchStatus::Completed;

    updated
}

pub fn build_autoclave_record(form: &AutoclaveForm) -> AutoclaveRecord {
    build_autoclave_record_at(form, Local::now())
}

/// Cycle record for an autoclave run, keyed `autoclave_{n}_{YYYYMMDD}`.
///
/// Each step's duration is measured from the step before it.
pub fn build_autoclave_record_at(form: &AutoclaveForm, now: DateTime<Local>) -> AutoclaveRecord {
    let number = form.autoclave_number.trim();
    let pressure = |value: &str| Some(parse_measurement_or_zero(value));

    AutoclaveRecord {
        id: format!("autoclave_{}_{}", number, now.date_naive().format("%Y%m%d")),
        autoclave_id: parse_count_or_zero(number),
        shift: form.shift.clone(),
        batches_processed: form.batches_processed.join(", "),
        previous_door_open_time: form.previous_door_open_time.clone(),
        previous_door_open_pressure: pressure(&form.previous_door_open_pressure),
        door_close_time: form.door_close_time.clone(),
        door_close_pressure: pressure(&form.door_close_pressure),
        vacuum_finish_time: form.vacuum_finish_time.clone(),
        vacuum_finish_pressure: pressure(&form.vacuum_finish_pressure),
        slow_steam_start_time: form.slow_steam_start_time.clone(),
        slow_steam_start_pressure: pressure(&form.slow_steam_start_pressure),
        fast_steam_start_time: form.fast_steam_start_time.clone(),
        fast_steam_start_pressure: pressure(&form.fast_steam_start_pressure),
        max_pressure_time: form.max_pressure_time.clone(),
        max_pressure: pressure(&form.max_pressure),
        release_start_time: form.release_start_time.clone(),
        release_start_pressure: pressure(&form.release_start_pressure),
        door_open_time: form.door_open_time.clone(),
        door_open_pressure: pressure(&form.door_open_pressure),
        door_close_duration: calculate_time_difference(
            &form.previous_door_open_time,
            &form.door_close_time,
        ),
        vacuum_finish_duration: calculate_time_difference(
            &form.door_close_time,
            &form.vacuum_finish_time,
        ),
        slow_steam_duration: calculate_time_difference(
            &form.vacuum_finish_time,
            &form.slow_steam_start_time,
        ),
        fast_steam_duration: calculate_time_difference(
            &form.slow_steam_start_time,
            &form.fast_steam_start_time,
        ),
        max_pressure_duration: calculate_time_difference(
            &form.fast_steam_start_time,
            &form.max_pressure_time,
        ),
        release_start_duration: calculate_time_difference(
            &form.max_pressure_time,
            &form.release_start_time,
        ),
        door_open_duration: calculate_time_difference(
            &form.release_start_time,
            &form.door_open_time,
        ),
    }
}
