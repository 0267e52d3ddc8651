//! Axum route handlers for the Worksheet API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::content::{parse_content, ContentItem};
use crate::errors::AppError;
use crate::generation::generator::GenerateRequest;
use crate::models::WorksheetState;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateWorksheetResponse {
    pub worksheet: WorksheetState,
    /// Full list, newest first, so clients can refresh in one round trip.
    pub worksheets: Vec<WorksheetState>,
}

#[derive(Debug, Serialize)]
pub struct WorksheetItemsResponse {
    pub worksheet_id: Uuid,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
pub struct SaveStateRequest {
    pub page_states: Vec<Value>,
}

pub(crate) async fn load_worksheet(state: &AppState, id: Uuid) -> Result<WorksheetState, AppError> {
    state
        .worksheets
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Worksheet {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/worksheets/generate
///
/// Generates worksheet text and stores a new worksheet at the front of the list.
/// Nothing is stored when generation fails.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateWorksheetResponse>), AppError> {
    request.validate()?;

    let generated = state.generator.generate(&request).await?;
    let worksheet = WorksheetState::new(
        request.subject.trim(),
        request.topic.trim(),
        request.grade.trim(),
        generated.content,
    );
    info!(worksheet_id = %worksheet.id, model = %generated.model, "Worksheet created");

    state.worksheets.insert(worksheet.clone()).await;
    let worksheets = state.worksheets.list().await;

    Ok((
        StatusCode::CREATED,
        Json(GenerateWorksheetResponse {
            worksheet,
            worksheets,
        }),
    ))
}

/// POST /api/v1/worksheets/:id/regenerate
///
/// Generates again with the stored inputs and appends the result to the content.
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorksheetState>, AppError> {
    let worksheet = load_worksheet(&state, id).await?;
    let request = GenerateRequest {
        subject: worksheet.subject.clone(),
        topic: worksheet.topic.clone(),
        grade: worksheet.grade.clone(),
    };

    let generated = state.generator.generate(&request).await?;
    // Only the content is written back so page states saved during generation survive.
    let worksheet = state
        .worksheets
        .append_content(id, &generated.content)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Worksheet {id} not found")))?;
    info!(worksheet_id = %id, "Worksheet content regenerated");

    Ok(Json(worksheet))
}

/// GET /api/v1/worksheets
pub async fn handle_list(State(state): State<AppState>) -> Json<Vec<WorksheetState>> {
    Json(state.worksheets.list().await)
}

/// GET /api/v1/worksheets/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorksheetState>, AppError> {
    Ok(Json(load_worksheet(&state, id).await?))
}

/// GET /api/v1/worksheets/:id/items
///
/// Parsed content items, for previewing what auto-layout will place.
pub async fn handle_get_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorksheetItemsResponse>, AppError> {
    let worksheet = load_worksheet(&state, id).await?;
    Ok(Json(WorksheetItemsResponse {
        worksheet_id: id,
        items: parse_content(&worksheet.generated_content),
    }))
}

/// PUT /api/v1/worksheets/:id/state
///
/// Replaces the saved page states. The states are stored without inspection.
pub async fn handle_save_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveStateRequest>,
) -> Result<Json<WorksheetState>, AppError> {
    let worksheet = state
        .worksheets
        .set_page_states(id, request.page_states)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Worksheet {id} not found")))?;
    info!(worksheet_id = %id, pages = worksheet.page_states.len(), "Worksheet state saved");
    Ok(Json(worksheet))
}
