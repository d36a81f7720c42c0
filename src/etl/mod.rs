//! Plant report spreadsheet import.
//!
//! The batching sheet drives the import: each of its rows becomes one
//! manufacturing document, joined to the other stage sheets on
//! `(Batch No., Mould No.)`. The autoclave sheet maps row for row to cycle
//! documents.

mod mapping;
mod upload;
mod workbook;

pub use mapping::{
    autoclave_documents, manufacturing_documents, RowIndex, AUTOCLAVE_SHEET, BATCHING_SHEET,
    CUTTING_SHEET, FERRY_CART_SHEET, MIGRATION_USER, SEGREGATION_SHEET, TILTING_CRANE_SHEET,
};
pub use upload::{
    close_store, import_workbook, insert_collection, upload, CollectionReport, ImportOptions,
    UploadReport,
};
pub use workbook::{Row, Workbook};
