use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::info;

use super::commands::{PayloadArgs, RecordStage};
use crate::config::AacConfig;
use crate::documents::DocumentStore;
use crate::entity::{AutoclaveRecord, BatchDocument, BatchRecord, BatchStatus, StageName, StageStatus};
use crate::error::{AacError, Result};
use crate::etl::{self, CollectionReport, ImportOptions, UploadReport};
use crate::http::{create_router, AppState};
use crate::lifecycle::{
    create_new_batch_at, update_batch_cutting_data, update_batch_ferry_cart_data,
    update_batch_ingredients, update_batch_segregation_data, update_batch_tilting_crane_data,
    AutoclaveForm, BatchForm,
};
use crate::storage::{BatchStore, PROJECT_DIR};
use crate::time::{calculate_time_difference, minutes_since_midnight};

/// Find the project root by looking for .aacneo/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(PROJECT_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// Read a JSON form payload from `--file`, `--stdin`, or piped stdin.
fn read_payload<T: DeserializeOwned>(payload: &PayloadArgs) -> Result<T> {
    let content = match &payload.file {
        Some(path) => fs::read_to_string(path)?,
        None if payload.stdin || !atty::is(atty::Stream::Stdin) => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        }
        None => {
            return Err(AacError::validation(
                "payload",
                "Provide --file, --stdin, or pipe a JSON payload",
            ))
        }
    };

    serde_json::from_str(&content)
        .map_err(|e| AacError::validation("payload", format!("Invalid JSON payload: {}", e)))
}

fn parse_arg<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|e: String| AacError::validation(field, e))
}

fn open_document_store(root: &Path, config: &AacConfig) -> Result<DocumentStore> {
    DocumentStore::open(&config.database_path(root))
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let _store = BatchStore::init(&root)?;
    let config_path = AacConfig::write_default(&root)?;

    println!("Initialized aacneo project in {}", root.display());
    println!("  config: {}", config_path.display());

    Ok(())
}

fn print_batch_line(batch: &BatchRecord, store: &BatchStore) {
    let stages = store.derived_stages(batch);
    let current = StageName::ALL
        .into_iter()
        .find(|s| stages.get(*s) != StageStatus::Completed)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "done".to_string());
    println!(
        "  {:<10} mould {:<6} [{}] {} ({})",
        batch.batch_id, batch.mould_id, batch.status, batch.date, current
    );
}

pub fn handle_batch_create(batch: String, mould: String, json: bool) -> Result<()> {
    BatchForm::new(batch.as_str(), mould.as_str()).validate()?;

    let root = find_project_root();
    let config = AacConfig::load(&root)?;
    let mut store = BatchStore::open(&root)?;

    let record = create_new_batch_at(&batch, &mould, &config.created_by, Local::now());
    store.add_batch(record.clone());
    store.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Created batch {} (mould {}) - {}", record.batch_id, record.mould_id, record.id);
    }

    Ok(())
}

pub fn handle_batch_list(
    status: Option<String>,
    stage: Option<String>,
    stage_status: Option<String>,
    json: bool,
) -> Result<()> {
    let root = find_project_root();
    let store = BatchStore::open(&root)?;

    let mut batches: Vec<&BatchRecord> = match status {
        Some(s) => store.batches_by_status(parse_arg::<BatchStatus>("status", &s)?),
        None => store.batches().iter().collect(),
    };

    if let (Some(stage), Some(stage_status)) = (stage, stage_status) {
        let stage = parse_arg::<StageName>("stage", &stage)?;
        let stage_status = parse_arg::<StageStatus>("stage_status", &stage_status)?;
        batches.retain(|b| store.derived_stages(b).get(stage) == stage_status);
    }

    if json {
        let ids: Vec<&str> = batches.iter().map(|b| b.batch_id.as_str()).collect();
        let summaries: Vec<_> = store
            .summaries()
            .into_iter()
            .filter(|s| ids.contains(&s.batch_number.as_str()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if batches.is_empty() {
        println!("No batches found.");
    } else {
        println!("Batches:\n");
        for b in batches {
            print_batch_line(b, &store);
        }
    }

    Ok(())
}

pub fn handle_batch_show(batch: String, json: bool) -> Result<()> {
    let root = find_project_root();
    let store = BatchStore::open(&root)?;

    let record = store
        .get_batch_by_id(&batch)
        .ok_or_else(|| AacError::NotFound(format!("batch {}", batch)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    let stages = store.derived_stages(record);
    let flags = store.stage_flags(&record.batch_id);
    let steps = &record.process_steps;

    println!("Batch {} (mould {})", record.batch_id, record.mould_id);
    println!("  id:      {}", record.id);
    println!("  status:  {}", record.status);
    println!("  date:    {}", record.date);
    println!("  created: {} by {}", record.metadata.created_at, record.metadata.created_by);
    println!("  updated: {}", record.metadata.updated_at);
    println!();
    println!("Stages:");
    for stage in StageName::ALL {
        println!("  {:<14} {:<12} (flag: {})", stage, stages.get(stage), flags.get(stage));
    }
    println!();
    println!(
        "  batching:      discharged {} at {} C, mixing {:.2} h",
        steps.batching.process.discharge_time,
        steps.batching.process.discharge_temp,
        steps.batching.process.mixing_time
    );
    println!(
        "  ferry cart:    flow {}, temp {}, height {} at {}",
        steps.ferry_carts.measurements.flow,
        steps.ferry_carts.measurements.temp,
        steps.ferry_carts.measurements.height,
        steps.ferry_carts.measurements.time
    );
    println!(
        "  tilting crane: rising {}, hardness {} at {}",
        steps.tilting_crane.measurements.rising_quality,
        steps.tilting_crane.measurements.hardness,
        steps.tilting_crane.measurements.time
    );
    println!(
        "  cutting:       {} at {}",
        steps.cutting.block_size, steps.cutting.cutting_time
    );
    if let Some(autoclave) = &steps.autoclave {
        println!(
            "  autoclave:     #{} door open {}",
            autoclave.autoclave_number, autoclave.door_open_time
        );
    }
    println!(
        "  segregation:   {} blocks, {} defects",
        steps.segregation.total_blocks, steps.segregation.total_defects
    );

    Ok(())
}

fn print_collection_report(report: &CollectionReport) {
    match &report.error {
        None => println!(
            "  {}: {}/{} inserted",
            report.collection, report.inserted, report.attempted
        ),
        Some(e) => println!(
            "  {}: failed ({} documents): {}",
            report.collection, report.attempted, e
        ),
    }
}

fn insert_failure(report: &CollectionReport) -> Option<AacError> {
    report.error.as_ref().map(|message| AacError::InsertFailure {
        collection: report.collection.clone(),
        message: message.clone(),
    })
}

/// Export batches whose `_id` is not yet in the manufacturing collection.
pub fn handle_batch_export(json: bool) -> Result<()> {
    let root = find_project_root();
    let config = AacConfig::load(&root)?;
    let store = BatchStore::open(&root)?;

    let mut documents = open_document_store(&root, &config)?;
    let exported = match documents.ids(&config.manufacturing_collection) {
        Ok(ids) => ids,
        Err(e) => {
            etl::close_store(documents);
            return Err(e);
        }
    };

    let docs: Vec<BatchDocument> = store
        .batches()
        .iter()
        .filter(|b| !exported.contains(&b.id))
        .cloned()
        .map(Into::into)
        .collect();
    let skipped = store.batches().len() - docs.len();

    let report = etl::insert_collection(&mut documents, &config.manufacturing_collection, &docs);
    etl::close_store(documents);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Exported batches:");
        print_collection_report(&report);
        if skipped > 0 {
            println!("  {} already exported, skipped", skipped);
        }
    }

    match insert_failure(&report) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Apply a stage form to a batch and advance its progress flags.
pub fn handle_record(
    stage: RecordStage,
    batch: String,
    payload: PayloadArgs,
    json: bool,
) -> Result<()> {
    let root = find_project_root();
    let mut store = BatchStore::open(&root)?;

    let current = store
        .get_batch_by_id(&batch)
        .ok_or_else(|| AacError::NotFound(format!("batch {}", batch)))?;

    let (stage_name, updated) = match stage {
        RecordStage::Batching => (
            StageName::Batching,
            update_batch_ingredients(current, &read_payload(&payload)?),
        ),
        RecordStage::FerryCart => (
            StageName::FerryCart,
            update_batch_ferry_cart_data(current, &read_payload(&payload)?),
        ),
        RecordStage::TiltingCrane => (
            StageName::Tilting,
            update_batch_tilting_crane_data(current, &read_payload(&payload)?),
        ),
        RecordStage::Cutting => (
            StageName::Cutting,
            update_batch_cutting_data(current, &read_payload(&payload)?),
        ),
        RecordStage::Segregation => (
            StageName::Segregation,
            update_batch_segregation_data(current, &read_payload(&payload)?),
        ),
    };

    store.replace_batch(updated)?;
    store.update_batch_stage(&batch, stage_name, StageStatus::Completed)?;
    if let Some(next) = stage_name.next() {
        store.update_batch_stage(&batch, next, StageStatus::InProgress)?;
    }
    store.save()?;

    info!(batch = %batch, stage = %stage_name, "stage recorded");

    let record = store
        .get_batch_by_id(&batch)
        .ok_or_else(|| AacError::NotFound(format!("batch {}", batch)))?;
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("Recorded {} for batch {} [{}]", stage_name, batch, record.status);
    }

    Ok(())
}

fn print_autoclave(record: &AutoclaveRecord) {
    println!(
        "  autoclave {} [{}] batches: {}",
        record.autoclave_id, record.shift, record.batches_processed
    );
    println!(
        "      door close {} ({}), door open {} ({})",
        record.door_close_time,
        record.door_close_duration,
        record.door_open_time,
        record.door_open_duration
    );
}

pub fn handle_autoclave_record(payload: PayloadArgs, json: bool) -> Result<()> {
    let form: AutoclaveForm = read_payload(&payload)?;

    let root = find_project_root();
    let mut store = BatchStore::open(&root)?;

    let record = store.record_autoclave_cycle(&form, Local::now())?;
    store.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Recorded autoclave cycle {}", record.id);
        print_autoclave(&record);
    }

    Ok(())
}

pub fn handle_autoclave_list(batch: Option<String>, json: bool) -> Result<()> {
    let root = find_project_root();
    let store = BatchStore::open(&root)?;

    let cycles: Vec<&AutoclaveRecord> = match &batch {
        Some(id) => store.get_autoclave_by_batch_id(id),
        None => store.autoclaves().iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&cycles)?);
    } else if cycles.is_empty() {
        println!("No autoclave cycles found.");
    } else {
        println!("Autoclave cycles:\n");
        for c in cycles {
            print_autoclave(c);
        }
    }

    Ok(())
}

pub fn handle_stage_set(batch: String, stage: String, status: String) -> Result<()> {
    let stage = parse_arg::<StageName>("stage", &stage)?;
    let status = parse_arg::<StageStatus>("status", &status)?;

    let root = find_project_root();
    let mut store = BatchStore::open(&root)?;

    store.update_batch_stage(&batch, stage, status)?;
    store.save()?;

    let record = store
        .get_batch_by_id(&batch)
        .ok_or_else(|| AacError::NotFound(format!("batch {}", batch)))?;
    println!("Batch {}: {} -> {} [{}]", batch, stage, status, record.status);

    Ok(())
}

fn print_upload_report(report: &UploadReport) {
    println!("Upload report:");
    print_collection_report(&report.manufacturing);
    print_collection_report(&report.autoclave);
}

pub fn handle_import(workbook: PathBuf, date: Option<String>, json: bool) -> Result<()> {
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|_| {
            AacError::validation("date", format!("Invalid date '{}'. Use YYYY-MM-DD", d))
        })?,
        None => Local::now().date_naive(),
    };

    let root = find_project_root();
    let config = AacConfig::load(&root)?;
    let options = ImportOptions {
        manufacturing_collection: config.manufacturing_collection.clone(),
        autoclave_collection: config.autoclave_collection.clone(),
        date,
    };

    let store = open_document_store(&root, &config)?;
    let report = etl::import_workbook(&workbook, store, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_upload_report(&report);
    }

    match insert_failure(&report.manufacturing).or_else(|| insert_failure(&report.autoclave)) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn handle_duration(start: String, end: String) -> Result<()> {
    for (field, value) in [("start", &start), ("end", &end)] {
        if minutes_since_midnight(value).is_none() {
            return Err(AacError::validation(
                field,
                format!("Invalid time '{}'. Use H:MM AM/PM or HH:MM", value),
            ));
        }
    }

    println!("{}", calculate_time_difference(&start, &end));
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

pub fn handle_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let root = find_project_root();
    let config = AacConfig::load(&root)?;

    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let store = open_document_store(&root, &config)?;
    let state = AppState::new(store, &config.manufacturing_collection);
    let app = create_router(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
        info!("analytics server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("analytics server stopped");
        Ok::<(), AacError>(())
    })
}
