//! Stage form payloads.
//!
//! Field values are kept as the strings the operator typed; the update
//! helpers coerce them. Payloads deserialize from the camelCase JSON the
//! data-entry screens submit, and every field defaults to empty.

use serde::{Deserialize, Serialize};

use crate::error::{AacError, Result};

const BATCH_NUMBER_MIN: usize = 3;
const BATCH_NUMBER_MAX: usize = 10;
const MOULD_NUMBER_MAX: usize = 10;

fn is_plant_code(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchForm {
    pub batch_number: String,
    pub mould_number: String,
}

impl BatchForm {
    pub fn new(batch_number: impl Into<String>, mould_number: impl Into<String>) -> Self {
        Self {
            batch_number: batch_number.into(),
            mould_number: mould_number.into(),
        }
    }

    /// Batch numbers are 3-10 characters, mould numbers 1-10, both limited
    /// to uppercase letters, digits and hyphens.
    pub fn validate(&self) -> Result<()> {
        let batch = self.batch_number.as_str();
        if batch.is_empty() {
            return Err(AacError::validation("batchNumber", "Batch number is required"));
        }
        if batch.len() < BATCH_NUMBER_MIN {
            return Err(AacError::validation(
                "batchNumber",
                "Batch number must be at least 3 characters",
            ));
        }
        if batch.len() > BATCH_NUMBER_MAX {
            return Err(AacError::validation(
                "batchNumber",
                "Batch number cannot exceed 10 characters",
            ));
        }
        if !is_plant_code(batch) {
            return Err(AacError::validation(
                "batchNumber",
                "Only uppercase letters, numbers, and hyphens are allowed",
            ));
        }

        let mould = self.mould_number.as_str();
        if mould.is_empty() {
            return Err(AacError::validation("mouldNumber", "Mould number is required"));
        }
        if mould.len() > MOULD_NUMBER_MAX {
            return Err(AacError::validation(
                "mouldNumber",
                "Mould number cannot exceed 10 characters",
            ));
        }
        if !is_plant_code(mould) {
            return Err(AacError::validation(
                "mouldNumber",
                "Only uppercase letters, numbers, and hyphens are allowed",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingTime {
    pub hours: String,
    pub minutes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchIngredientForm {
    pub fresh_slurry: String,
    pub waste_slurry: String,
    pub cement: String,
    pub lime: String,
    pub gypsum: String,
    pub aluminum_powder: String,
    pub dc_powder: String,
    pub water: String,
    pub solu_oil: String,
    pub discharge_temp: String,
    pub mixing_time: MixingTime,
    pub discharge_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FerryCartForm {
    pub flow: String,
    pub temp: String,
    pub height: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TiltingCraneForm {
    pub rising_quality: String,
    pub temp: String,
    pub time: String,
    pub hardness: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CuttingForm {
    pub cutting_time: String,
    pub block_size: String,
    pub tilting_crane_rejection: String,
    pub chipping_rejection: String,
    pub side_cutter_rejection: String,
    pub joined_rejection: String,
    pub trimming_rejection: String,
    #[serde(rename = "wireBrokenHC")]
    pub wire_broken_hc: String,
    #[serde(rename = "wireBrokenVC")]
    pub wire_broken_vc: String,
    #[serde(rename = "rejectedDueToHC")]
    pub rejected_due_to_hc: String,
    #[serde(rename = "rejectedDueToVC")]
    pub rejected_due_to_vc: String,
    pub dimension_check: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoclaveForm {
    pub autoclave_number: String,
    pub shift: String,
    pub batches_processed: Vec<String>,
    pub previous_door_open_time: String,
    pub previous_door_open_pressure: String,
    pub door_close_time: String,
    pub door_close_pressure: String,
    pub vacuum_finish_time: String,
    pub vacuum_finish_pressure: String,
    pub slow_steam_start_time: String,
    pub slow_steam_start_pressure: String,
    pub fast_steam_start_time: String,
    pub fast_steam_start_pressure: String,
    pub max_pressure_time: String,
    pub max_pressure: String,
    pub release_start_time: String,
    pub release_start_pressure: String,
    pub door_open_time: String,
    pub door_open_pressure: String,
}

impl AutoclaveForm {
    pub fn validate(&self) -> Result<()> {
        if self.autoclave_number.is_empty() {
            return Err(AacError::validation(
                "autoclaveNumber",
                "Autoclave number is required",
            ));
        }
        if !self.autoclave_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AacError::validation(
                "autoclaveNumber",
                "Please enter a valid numeric value",
            ));
        }
        if self.shift.trim().is_empty() {
            return Err(AacError::validation("shift", "Shift is required"));
        }
        if self.batches_processed.is_empty() {
            return Err(AacError::validation(
                "batchesProcessed",
                "At least one batch must be selected",
            ));
        }
        for (field, value) in [
            ("previousDoorOpenTime", &self.previous_door_open_time),
            ("doorCloseTime", &self.door_close_time),
            ("doorOpenTime", &self.door_open_time),
        ] {
            if value.trim().is_empty() {
                return Err(AacError::validation(field, "Time is required"));
            }
        }
        Ok(())
    }
}

/// Defect counts entered for one segregation position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionDefectsForm {
    pub rain_cracks: String,
    pub corner_cracks: String,
    pub corner_damage: String,
    pub chipped_blocks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegregationForm {
    pub total_blocks: String,
    pub block_size: String,
    pub shift: String,
    pub stage1: PositionDefectsForm,
    pub stage2: PositionDefectsForm,
    pub stage3: PositionDefectsForm,
    pub stage4: PositionDefectsForm,
    pub stage5: PositionDefectsForm,
    pub stage6: PositionDefectsForm,
}

impl SegregationForm {
    /// Positions 1 through 6, in order.
    pub fn positions(&self) -> [&PositionDefectsForm; 6] {
        [
            &self.stage1,
            &self.stage2,
            &self.stage3,
            &self.stage4,
            &self.stage5,
            &self.stage6,
        ]
    }
}
