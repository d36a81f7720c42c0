use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{
    AutoclaveRecord, BatchRecord, BatchStages, BatchStatus, StageName, StageStatus,
};
use crate::error::{AacError, Result};
use crate::lifecycle::{build_autoclave_record_at, update_batch_autoclave_data_at, AutoclaveForm};

pub const PROJECT_DIR: &str = ".aacneo";
const STORE_FILE: &str = "store.json";

/// On-disk layout of `store.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    batches: Vec<BatchRecord>,
    #[serde(default)]
    autoclaves: Vec<AutoclaveRecord>,
    #[serde(default)]
    stages: HashMap<String, BatchStages>,
}

/// Compact view of a batch for list screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: String,
    pub batch_number: String,
    pub mould_number: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub status: BatchStatus,
    pub stages: BatchStages,
}

/// Batches and autoclave cycles currently known to the plant.
///
/// Constructed empty with [`BatchStore::new`] or loaded from a project
/// directory with [`BatchStore::open`]. Only project-backed stores can
/// [`save`](BatchStore::save).
#[derive(Debug, Default)]
pub struct BatchStore {
    batches: Vec<BatchRecord>,
    autoclaves: Vec<AutoclaveRecord>,
    stages: HashMap<String, BatchStages>,
    path: Option<PathBuf>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a new project under `root`.
    pub fn init(root: &Path) -> Result<Self> {
        let project_dir = root.join(PROJECT_DIR);

        if project_dir.exists() {
            return Err(AacError::AlreadyInitialized);
        }

        fs::create_dir_all(&project_dir)?;

        let store = Self {
            path: Some(project_dir.join(STORE_FILE)),
            ..Self::default()
        };
        store.save()?;

        Ok(store)
    }

    /// Open an existing project under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_DIR).join(STORE_FILE);

        if !path.exists() {
            return Err(AacError::NotInitialized);
        }

        let file: StoreFile = serde_json::from_str(&fs::read_to_string(&path)?)?;
        debug!(
            batches = file.batches.len(),
            autoclaves = file.autoclaves.len(),
            "loaded batch store"
        );

        Ok(Self {
            batches: file.batches,
            autoclaves: file.autoclaves,
            stages: file.stages,
            path: Some(path),
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| AacError::Storage("store has no project directory".to_string()))?;

        let file = StoreFile {
            batches: self.batches.clone(),
            autoclaves: self.autoclaves.clone(),
            stages: self.stages.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn project_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    pub fn batches(&self) -> &[BatchRecord] {
        &self.batches
    }

    pub fn autoclaves(&self) -> &[AutoclaveRecord] {
        &self.autoclaves
    }

    /// Append a batch. Batch numbers are not required to be unique.
    pub fn add_batch(&mut self, batch: BatchRecord) {
        debug!(batch_id = %batch.batch_id, "adding batch");
        self.batches.push(batch);
    }

    /// First batch with the given batch number.
    pub fn get_batch_by_id(&self, batch_id: &str) -> Option<&BatchRecord> {
        self.batches.iter().find(|b| b.batch_id == batch_id)
    }

    fn batch_index(&self, batch_id: &str) -> Result<usize> {
        self.batches
            .iter()
            .position(|b| b.batch_id == batch_id)
            .ok_or_else(|| AacError::NotFound(format!("batch {}", batch_id)))
    }

    /// Replace the whole batch list with `updater(current)`.
    pub fn set_batches<F>(&mut self, updater: F)
    where
        F: FnOnce(Vec<BatchRecord>) -> Vec<BatchRecord>,
    {
        let current = std::mem::take(&mut self.batches);
        self.batches = updater(current);
    }

    /// Swap in an updated record for the first batch with the same number.
    pub fn replace_batch(&mut self, batch: BatchRecord) -> Result<()> {
        let idx = self.batch_index(&batch.batch_id)?;
        self.batches[idx] = batch;
        Ok(())
    }

    /// Set a stage progress flag.
    ///
    /// Completing segregation completes the batch; putting any stage back in
    /// progress reopens it.
    pub fn update_batch_stage(
        &mut self,
        batch_id: &str,
        stage: StageName,
        status: StageStatus,
    ) -> Result<()> {
        let idx = self.batch_index(batch_id)?;

        self.stages
            .entry(batch_id.to_string())
            .or_default()
            .set(stage, status);

        let batch = &mut self.batches[idx];
        if stage == StageName::Segregation && status == StageStatus::Completed {
            batch.status = BatchStatus::Completed;
        } else if status == StageStatus::InProgress {
            batch.status = BatchStatus::InProgress;
        }

        debug!(batch_id, %stage, %status, "stage flag set");
        Ok(())
    }

    pub fn update_batch_status(&mut self, batch_id: &str, status: BatchStatus) -> Result<()> {
        let idx = self.batch_index(batch_id)?;
        self.batches[idx].status = status;
        Ok(())
    }

    /// Stage flags as explicitly set; unset batches report all pending.
    pub fn stage_flags(&self, batch_id: &str) -> BatchStages {
        self.stages.get(batch_id).copied().unwrap_or_default()
    }

    pub fn add_autoclave(&mut self, record: AutoclaveRecord) {
        debug!(id = %record.id, "adding autoclave cycle");
        self.autoclaves.push(record);
    }

    pub fn get_autoclave_by_id(&self, autoclave_id: u32) -> Option<&AutoclaveRecord> {
        self.autoclaves
            .iter()
            .find(|a| a.autoclave_id == autoclave_id)
    }

    /// Autoclave cycles that included `batch_id`.
    pub fn get_autoclave_by_batch_id(&self, batch_id: &str) -> Vec<&AutoclaveRecord> {
        self.autoclaves
            .iter()
            .filter(|a| a.processed_batch(batch_id))
            .collect()
    }

    /// Record an autoclave cycle and stamp its autoclave stage onto every
    /// batch it processed.
    ///
    /// Every listed batch must exist; nothing changes otherwise.
    pub fn record_autoclave_cycle(
        &mut self,
        form: &AutoclaveForm,
        now: DateTime<Local>,
    ) -> Result<AutoclaveRecord> {
        form.validate()?;

        let indices = form
            .batches_processed
            .iter()
            .map(|id| self.batch_index(id.trim()))
            .collect::<Result<Vec<_>>>()?;

        for idx in indices {
            let updated = update_batch_autoclave_data_at(&self.batches[idx], form, now);
            self.stages
                .entry(updated.batch_id.clone())
                .or_default()
                .set(StageName::Autoclave, StageStatus::Completed);
            self.batches[idx] = updated;
        }

        let record = build_autoclave_record_at(form, now);
        self.add_autoclave(record.clone());
        Ok(record)
    }

    /// Stage progress inferred from the data recorded on the batch.
    ///
    /// A stage counts as done once its key measurement is present; the
    /// first stage that is not done is in progress and the rest pending.
    pub fn derived_stages(&self, batch: &BatchRecord) -> BatchStages {
        if batch.status == BatchStatus::Completed {
            return BatchStages::all(StageStatus::Completed);
        }

        let steps = &batch.process_steps;
        let in_autoclave = steps.autoclave.is_some()
            || self
                .autoclaves
                .iter()
                .any(|a| a.processed_batch(&batch.batch_id));

        let done = |stage: StageName| match stage {
            StageName::Batching => !steps.batching.process.discharge_time.is_empty(),
            StageName::FerryCart => !steps.ferry_carts.measurements.time.is_empty(),
            StageName::Tilting => !steps.tilting_crane.measurements.time.is_empty(),
            StageName::Cutting => !steps.cutting.cutting_time.is_empty(),
            StageName::Autoclave => in_autoclave,
            StageName::Segregation => steps.segregation.total_blocks > 0,
        };

        let mut stages = BatchStages::default();
        let mut reached_open_stage = false;
        for stage in StageName::ALL {
            if !reached_open_stage && done(stage) {
                stages.set(stage, StageStatus::Completed);
            } else if !reached_open_stage {
                stages.set(stage, StageStatus::InProgress);
                reached_open_stage = true;
            }
        }
        stages
    }

    pub fn batches_by_status(&self, status: BatchStatus) -> Vec<&BatchRecord> {
        self.batches.iter().filter(|b| b.status == status).collect()
    }

    /// Batches whose derived progress for `stage` equals `status`.
    pub fn batches_by_stage(&self, stage: StageName, status: StageStatus) -> Vec<&BatchRecord> {
        self.batches
            .iter()
            .filter(|b| self.derived_stages(b).get(stage) == status)
            .collect()
    }

    pub fn summaries(&self) -> Vec<BatchSummary> {
        self.batches
            .iter()
            .map(|b| BatchSummary {
                id: b.id.clone(),
                batch_number: b.batch_id.clone(),
                mould_number: b.mould_id.clone(),
                created_at: b.metadata.created_at,
                status: b.status,
                stages: self.derived_stages(b),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{
        create_new_batch_at, update_batch_ferry_cart_data_at, update_batch_ingredients_at,
        BatchIngredientForm, FerryCartForm, APP_USER,
    };
    use chrono::{DateTime, Local, TimeZone};
    use tempfile::TempDir;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 4, 9, 10, 0, 0).unwrap()
    }

    fn store_with(ids: &[&str]) -> BatchStore {
        let mut store = BatchStore::new();
        for id in ids {
            store.add_batch(create_new_batch_at(id, "3", APP_USER, now()));
        }
        store
    }

    #[test]
    fn test_add_and_get_first_match() {
        let mut store = store_with(&["1520"]);
        store.add_batch(create_new_batch_at("1520", "9", APP_USER, now()));

        assert_eq!(store.batches().len(), 2);
        assert_eq!(store.get_batch_by_id("1520").unwrap().mould_id, "3");
        assert!(store.get_batch_by_id("9999").is_none());
    }

    #[test]
    fn test_set_batches_functional_replace() {
        let mut store = store_with(&["1520", "1521", "1522"]);
        store.set_batches(|batches| {
            batches
                .into_iter()
                .filter(|b| b.batch_id != "1521")
                .collect()
        });
        assert_eq!(store.batches().len(), 2);
        assert!(store.get_batch_by_id("1521").is_none());
    }

    #[test]
    fn test_replace_batch() {
        let mut store = store_with(&["1520"]);
        let form = FerryCartForm {
            time: "10:46 PM".to_string(),
            ..Default::default()
        };
        let updated =
            update_batch_ferry_cart_data_at(store.get_batch_by_id("1520").unwrap(), &form, now());
        store.replace_batch(updated).unwrap();

        let batch = store.get_batch_by_id("1520").unwrap();
        assert_eq!(batch.process_steps.ferry_carts.measurements.time, "10:46 PM");

        let stranger = create_new_batch_at("7777", "1", APP_USER, now());
        assert!(matches!(
            store.replace_batch(stranger),
            Err(AacError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_batch_stage_flags_and_status() {
        let mut store = store_with(&["1520"]);

        store
            .update_batch_stage("1520", StageName::Segregation, StageStatus::Completed)
            .unwrap();
        assert_eq!(store.get_batch_by_id("1520").unwrap().status, BatchStatus::Completed);
        assert_eq!(
            store.stage_flags("1520").segregation,
            StageStatus::Completed
        );

        store
            .update_batch_stage("1520", StageName::Cutting, StageStatus::InProgress)
            .unwrap();
        assert_eq!(store.get_batch_by_id("1520").unwrap().status, BatchStatus::InProgress);
        assert_eq!(store.stage_flags("1520").cutting, StageStatus::InProgress);

        let err = store
            .update_batch_stage("404", StageName::Cutting, StageStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, AacError::NotFound(_)));
    }

    #[test]
    fn test_derived_stages_follow_data() {
        let mut store = store_with(&["1520"]);
        let fresh = store.get_batch_by_id("1520").unwrap().clone();

        let stages = store.derived_stages(&fresh);
        assert_eq!(stages.batching, StageStatus::InProgress);
        assert_eq!(stages.ferry_cart, StageStatus::Pending);

        let form = BatchIngredientForm {
            discharge_time: "10:42 PM".to_string(),
            ..Default::default()
        };
        let batched = update_batch_ingredients_at(&fresh, &form, now());
        let stages = store.derived_stages(&batched);
        assert_eq!(stages.batching, StageStatus::Completed);
        assert_eq!(stages.ferry_cart, StageStatus::InProgress);

        store.update_batch_status("1520", BatchStatus::Completed).unwrap();
        let done = store.get_batch_by_id("1520").unwrap();
        assert_eq!(
            store.derived_stages(done),
            BatchStages::all(StageStatus::Completed)
        );
    }

    #[test]
    fn test_autoclave_lookup_by_batch() {
        let mut store = BatchStore::new();
        store.add_autoclave(AutoclaveRecord {
            id: "autoclave_101_20250409".to_string(),
            autoclave_id: 101,
            batches_processed: "1510, 1511".to_string(),
            ..Default::default()
        });

        assert_eq!(store.get_autoclave_by_batch_id("1511").len(), 1);
        assert!(store.get_autoclave_by_batch_id("151").is_empty());
        assert!(store.get_autoclave_by_id(101).is_some());
        assert!(store.get_autoclave_by_id(102).is_none());
    }

    #[test]
    fn test_record_autoclave_cycle() {
        let mut store = store_with(&["1510", "1511"]);
        let form = AutoclaveForm {
            autoclave_number: "101".to_string(),
            shift: "Day".to_string(),
            batches_processed: vec!["1510".to_string(), "1511".to_string()],
            previous_door_open_time: "2:38 AM".to_string(),
            door_close_time: "3:23 AM".to_string(),
            door_open_time: "1:38 PM".to_string(),
            ..Default::default()
        };

        let record = store.record_autoclave_cycle(&form, now()).unwrap();
        assert_eq!(record.id, "autoclave_101_20250409");
        assert_eq!(store.autoclaves().len(), 1);
        for id in ["1510", "1511"] {
            let batch = store.get_batch_by_id(id).unwrap();
            assert_eq!(
                batch.process_steps.autoclave.as_ref().unwrap().autoclave_number,
                "101"
            );
            assert_eq!(store.stage_flags(id).autoclave, StageStatus::Completed);
        }
    }

    #[test]
    fn test_record_autoclave_cycle_unknown_batch_changes_nothing() {
        let mut store = store_with(&["1510"]);
        let form = AutoclaveForm {
            autoclave_number: "101".to_string(),
            shift: "Day".to_string(),
            batches_processed: vec!["1510".to_string(), "9999".to_string()],
            previous_door_open_time: "2:38 AM".to_string(),
            door_close_time: "3:23 AM".to_string(),
            door_open_time: "1:38 PM".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            store.record_autoclave_cycle(&form, now()),
            Err(AacError::NotFound(_))
        ));
        assert!(store.autoclaves().is_empty());
        assert!(store.get_batch_by_id("1510").unwrap().process_steps.autoclave.is_none());
    }

    #[test]
    fn test_filters_and_summaries() {
        let mut store = store_with(&["1520", "1521"]);
        store.update_batch_status("1521", BatchStatus::Completed).unwrap();

        assert_eq!(store.batches_by_status(BatchStatus::Completed).len(), 1);
        assert_eq!(
            store
                .batches_by_stage(StageName::Batching, StageStatus::InProgress)
                .len(),
            1
        );

        let summaries = store.summaries();
        assert_eq!(summaries[0].batch_number, "1520");
        assert_eq!(summaries[1].stages.segregation, StageStatus::Completed);
    }

    #[test]
    fn test_init_open_save() {
        let tmp = TempDir::new().unwrap();

        let mut store = BatchStore::init(tmp.path()).unwrap();
        store.add_batch(create_new_batch_at("1520", "3", APP_USER, now()));
        store.save().unwrap();

        assert!(matches!(
            BatchStore::init(tmp.path()),
            Err(AacError::AlreadyInitialized)
        ));

        let reopened = BatchStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.batches().len(), 1);
        assert_eq!(reopened.batches()[0], store.batches()[0]);
    }

    #[test]
    fn test_open_uninitialized() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            BatchStore::open(tmp.path()),
            Err(AacError::NotInitialized)
        ));
    }

    #[test]
    fn test_in_memory_store_cannot_save() {
        assert!(BatchStore::new().save().is_err());
    }
}
