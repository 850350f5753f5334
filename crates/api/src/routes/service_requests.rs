//! Service request endpoints.
//!
//! Each HTTP request opens its own repository scope and mediator, so every
//! request is one unit of work.

use std::sync::Arc;

use application::{
    DeleteServiceRequestById, Mediator, QueryAllServiceRequests, QueryServiceRequestById,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::{CorrelationId, EntityId, RequestContext};
use domain::RepositoryFactory;

use crate::dto::{CreateServiceRequestBody, ServiceRequestDto, UpdateServiceRequestBody};
use crate::error::ApiError;

/// Header carrying a caller-supplied correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub repositories: Arc<dyn RepositoryFactory>,
}

impl AppState {
    fn mediator(&self) -> Mediator {
        Mediator::for_scope(self.repositories.as_ref())
    }
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<uuid::Uuid>().ok())
        .map(|uuid| RequestContext::with_correlation_id(CorrelationId::from_uuid(uuid)))
        .unwrap_or_default()
}

fn parse_id(id: &str) -> Result<EntityId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid service request id: {e}")))
}

/// POST /api/servicerequest: create a service request.
#[tracing::instrument(skip(state, headers, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequestBody>,
) -> Result<(StatusCode, Json<ServiceRequestDto>), ApiError> {
    let command = body.into_command()?;
    let created = state
        .mediator()
        .send_with(&request_context(&headers), command)
        .await?;

    Ok((StatusCode::CREATED, Json(ServiceRequestDto::from(&created))))
}

/// GET /api/servicerequest: list every service request, or 204 when there are none.
#[tracing::instrument(skip(state, headers))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let all = state
        .mediator()
        .send_with(&request_context(&headers), QueryAllServiceRequests)
        .await?;

    if all.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let dtos: Vec<ServiceRequestDto> = all.iter().map(ServiceRequestDto::from).collect();
    Ok(Json(dtos).into_response())
}

/// GET /api/servicerequest/{id}: load one service request.
#[tracing::instrument(skip(state, headers))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ServiceRequestDto>, ApiError> {
    let id = parse_id(&id)?;
    let found = state
        .mediator()
        .send_with(&request_context(&headers), QueryServiceRequestById::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Service request {id} not found")))?;

    Ok(Json(ServiceRequestDto::from(&found)))
}

/// PUT /api/servicerequest/{id}: update a service request.
#[tracing::instrument(skip(state, headers, body))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceRequestBody>,
) -> Result<Json<ServiceRequestDto>, ApiError> {
    let id = parse_id(&id)?;
    let command = body.into_command(id)?;
    let updated = state
        .mediator()
        .send_with(&request_context(&headers), command)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Service request {id} not found")))?;

    Ok(Json(ServiceRequestDto::from(&updated)))
}

/// DELETE /api/servicerequest/{id}: delete a service request.
#[tracing::instrument(skip(state, headers))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .mediator()
        .send_with(&request_context(&headers), DeleteServiceRequestById::new(id))
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Service request {id} not found")))
    }
}
