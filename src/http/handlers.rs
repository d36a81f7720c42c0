use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::{DateRangeQuery, HealthResponse, QualityQuery, TrendsQuery};
use super::error::AppError;
use super::state::AppState;
use crate::analytics::{
    self, BatchQualityStats, GroupBy, MouldPerformance, QueryFilter, SegregationStats, TrendPeriod,
};
use crate::entity::BatchDocument;

pub type HandlerResult<T> = Result<Json<T>, AppError>;

async fn load_documents(state: &AppState) -> Result<Vec<BatchDocument>, AppError> {
    let store = state.store.lock().await;
    Ok(store.find_all(&state.manufacturing_collection)?)
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = match state
        .store
        .lock()
        .await
        .count(&state.manufacturing_collection)
    {
        Ok(n) => format!("connected ({} batches)", n),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    }))
}

/// GET /api/batch-quality
pub async fn batch_quality(
    State(state): State<AppState>,
    Query(query): Query<QualityQuery>,
) -> HandlerResult<BatchQualityStats> {
    let filter = QueryFilter::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.mould_id.as_deref(),
    )?;
    let docs = load_documents(&state).await?;
    Ok(Json(analytics::batch_quality(&docs, &filter)?))
}

/// GET /api/rejection-trends
pub async fn rejection_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> HandlerResult<Vec<TrendPeriod>> {
    let filter = QueryFilter::parse(query.start_date.as_deref(), query.end_date.as_deref(), None)?;
    let group_by = match query.group_by.as_deref() {
        Some(g) => g.parse::<GroupBy>().map_err(AppError::BadRequest)?,
        None => GroupBy::default(),
    };
    let docs = load_documents(&state).await?;
    Ok(Json(analytics::rejection_trends(&docs, &filter, group_by)?))
}

/// GET /api/mould-performance
pub async fn mould_performance(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> HandlerResult<Vec<MouldPerformance>> {
    let filter = QueryFilter::parse(query.start_date.as_deref(), query.end_date.as_deref(), None)?;
    let docs = load_documents(&state).await?;
    Ok(Json(analytics::mould_performance(&docs, &filter)?))
}

/// GET /api/segregation-analysis
pub async fn segregation_analysis(
    State(state): State<AppState>,
    Query(query): Query<QualityQuery>,
) -> HandlerResult<SegregationStats> {
    let filter = QueryFilter::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.mould_id.as_deref(),
    )?;
    let docs = load_documents(&state).await?;
    Ok(Json(analytics::segregation_analysis(&docs, &filter)?))
}
