//! HTTP handlers for worker management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::worker::{
    CreateWorkerInput, InviteToken, UpdateWorkerInput, Worker, WorkerService,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WorkerListQuery {
    pub shop_id: Option<Uuid>,
}

/// Create a worker
pub async fn create_worker(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateWorkerInput>,
) -> AppResult<Json<Worker>> {
    let service = WorkerService::new(state.db, &state.config);
    let worker = service.create_worker(&actor, input).await?;
    Ok(Json(worker))
}

/// List workers visible to the caller
pub async fn list_workers(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<WorkerListQuery>,
) -> AppResult<Json<Vec<Worker>>> {
    let service = WorkerService::new(state.db, &state.config);
    let workers = service.list_workers(&actor, query.shop_id).await?;
    Ok(Json(workers))
}

/// Get a worker
pub async fn get_worker(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(worker_id): Path<Uuid>,
) -> AppResult<Json<Worker>> {
    let service = WorkerService::new(state.db, &state.config);
    let worker = service.get_worker(&actor, worker_id).await?;
    Ok(Json(worker))
}

/// Update a worker
pub async fn update_worker(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(worker_id): Path<Uuid>,
    Json(input): Json<UpdateWorkerInput>,
) -> AppResult<Json<Worker>> {
    let service = WorkerService::new(state.db, &state.config);
    let worker = service.update_worker(&actor, worker_id, input).await?;
    Ok(Json(worker))
}

/// Delete a worker
pub async fn delete_worker(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(worker_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = WorkerService::new(state.db, &state.config);
    service.delete_worker(&actor, worker_id).await?;
    Ok(Json(()))
}

/// Issue (or reissue) an invite code for a worker
pub async fn create_invite(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(worker_id): Path<Uuid>,
) -> AppResult<Json<InviteToken>> {
    let service = WorkerService::new(state.db, &state.config);
    let invite = service.create_invite(&actor, worker_id).await?;
    Ok(Json(invite))
}

/// Get the active invite code for a worker
pub async fn get_invite(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(worker_id): Path<Uuid>,
) -> AppResult<Json<InviteToken>> {
    let service = WorkerService::new(state.db, &state.config);
    let invite = service.get_invite(&actor, worker_id).await?;
    Ok(Json(invite))
}
