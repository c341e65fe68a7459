//! Indexing, search and statistics endpoints.

use axum::{
    extract::{Extension, FromRequest, Query, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use search_engine::{SearchQuery, SearchResult, Statistics};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;
use crate::server::routes::error::ApiError;

const DEFAULT_LIMIT: usize = 20;

#[derive(Serialize)]
pub struct OkResponse {
    result: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { result: true })
    }
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    result: bool,
    statistics: Statistics,
}

#[derive(Serialize)]
pub struct SearchResponse {
    result: bool,
    count: usize,
    data: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    site: Option<String>,
    /// Zero-based block index
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IndexPageRequest {
    url: String,
}

pub async fn statistics_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let statistics = state.engine.statistics().await?;
    Ok(Json(StatisticsResponse {
        result: true,
        statistics,
    }))
}

pub async fn start_indexing_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    state.engine.start_indexing().await?;
    Ok(OkResponse::ok())
}

/// Returns once every session has stopped.
pub async fn stop_indexing_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    state.engine.stop_indexing().await?;
    Ok(OkResponse::ok())
}

/// Accepts `url` as a form field or in a JSON body.
pub async fn index_page_handler(
    Extension(state): Extension<AppState>,
    request: Request,
) -> Result<Json<OkResponse>, ApiError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    let body = if is_json {
        Json::<IndexPageRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    } else {
        Form::<IndexPageRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    };

    tracing::info!(url = %body.url, "Index page requested");
    state.engine.index_single_page(&body.url).await?;
    Ok(OkResponse::ok())
}

pub async fn search_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut query = SearchQuery::new(params.query.unwrap_or_default()).with_page(
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    );
    if let Some(site) = params.site.filter(|site| !site.trim().is_empty()) {
        query = query.for_site(site);
    }

    let response = state.engine.search(&query).await?;
    Ok(Json(SearchResponse {
        result: true,
        count: response.count,
        data: response.data,
    }))
}
