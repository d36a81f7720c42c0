use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Query for reports filtered by date range and mould.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QualityQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mould_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `day` (default), `week` or `month`.
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
