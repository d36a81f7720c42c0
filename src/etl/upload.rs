use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::mapping::{autoclave_documents, manufacturing_documents};
use super::workbook::Workbook;
use crate::documents::DocumentStore;
use crate::error::Result;

/// Where and how an import lands.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub manufacturing_collection: String,
    pub autoclave_collection: String,
    /// Date stamped into document keys and `date` fields.
    pub date: NaiveDate,
}

/// Outcome of the bulk insert into one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub collection: String,
    pub attempted: usize,
    pub inserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub manufacturing: CollectionReport,
    pub autoclave: CollectionReport,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.manufacturing.error.is_none() && self.autoclave.error.is_none()
    }
}

/// Bulk insert `docs` into `collection`, logging and reporting a failure
/// instead of returning it.
pub fn insert_collection<T: Serialize>(
    store: &mut DocumentStore,
    collection: &str,
    docs: &[T],
) -> CollectionReport {
    info!(collection, count = docs.len(), "uploading documents");

    let mut report = CollectionReport {
        collection: collection.to_string(),
        attempted: docs.len(),
        inserted: 0,
        error: None,
    };
    if docs.is_empty() {
        return report;
    }

    match store.insert_many(collection, docs) {
        Ok(inserted) => {
            info!(collection, inserted, "documents inserted");
            report.inserted = inserted;
        }
        Err(e) => {
            error!(collection, error = %e, "upload failed");
            report.error = Some(e.to_string());
        }
    }
    report
}

/// Map `workbook` and insert the results, manufacturing documents first.
///
/// A failed collection is reported and does not stop the other one. The
/// store is closed before returning.
pub fn upload(mut store: DocumentStore, workbook: &Workbook, options: &ImportOptions) -> UploadReport {
    let manufacturing_docs = manufacturing_documents(workbook, options.date, Utc::now());
    let autoclave_docs = autoclave_documents(workbook);

    let report = UploadReport {
        manufacturing: insert_collection(
            &mut store,
            &options.manufacturing_collection,
            &manufacturing_docs,
        ),
        autoclave: insert_collection(&mut store, &options.autoclave_collection, &autoclave_docs),
    };

    close_store(store);
    report
}

/// Read the workbook at `path` and upload it into `store`.
pub fn import_workbook(
    path: &Path,
    store: DocumentStore,
    options: &ImportOptions,
) -> Result<UploadReport> {
    let workbook = match Workbook::load(path) {
        Ok(wb) => wb,
        Err(e) => {
            close_store(store);
            return Err(e);
        }
    };

    let report = upload(store, &workbook, options);
    if report.is_success() {
        info!("data upload completed");
    } else {
        warn!("data upload completed with errors");
    }
    Ok(report)
}

/// Close `store`, logging a failure rather than returning it.
pub fn close_store(store: DocumentStore) {
    match store.close() {
        Ok(()) => info!("document store closed"),
        Err(e) => error!(error = %e, "failed to close document store"),
    }
}
