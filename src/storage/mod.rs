mod batch_store;

pub use batch_store::{BatchStore, BatchSummary, PROJECT_DIR};
